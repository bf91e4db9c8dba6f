use tracing_subscriber::{fmt, EnvFilter};

/// Native: pretty logs on stderr, JSON when `WHITELIST_LOG_JSON=1`.
/// Filter comes from `RUST_LOG`, defaulting to `info`.
#[cfg(feature = "native")]
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var(crate::config::env::LOG_JSON)
        .map(|value| value == "1")
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Browser: plain lines on `console.log`. No env, no clock.
#[cfg(feature = "wasm")]
pub fn init_console_logging() {
    let _ = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::new("info"))
        .with_ansi(false)
        .without_time()
        .with_writer(console::ConsoleWriter::default)
        .try_init();
}

#[cfg(feature = "wasm")]
mod console {
    use std::io;

    /// Buffers one formatted event and flushes it as a single console line.
    #[derive(Default)]
    pub struct ConsoleWriter {
        buf: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.buf.is_empty() {
                return Ok(());
            }
            let line = String::from_utf8_lossy(&self.buf);
            web_sys::console::log_1(&line.trim_end().into());
            self.buf.clear();
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let _ = io::Write::flush(self);
        }
    }
}
