//! whitelist-dapp CLI - drive the whitelist page against a JSON-RPC node
//!
//!   whitelist-dapp status   → connect, refresh, print view + state + cap
//!   whitelist-dapp join     → connect, join the whitelist, print view + state
//!
//! Configuration (flags override env, env overrides `.env`):
//!   --contract   WHITELIST_CONTRACT_ADDRESS
//!   --chain-id   WHITELIST_CHAIN_ID   (name or number, default rinkeby)
//!   --rpc-url    WHITELIST_RPC_URL    (default http://127.0.0.1:8545)
//!                WHITELIST_POLL_MS    (receipt poll interval)
//!
//! Output: pretty JSON, `--json` for a single line. Exit code 1 when the wallet
//! never connected.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::env;
use std::process::ExitCode;
use std::rc::Rc;
use whitelist_dapp::config::env as vars;
use whitelist_dapp::logging::init_logging;
use whitelist_dapp::{DappConfig, Network, Page, RpcProvider, Spawner, StderrNotifier, WhitelistDapp};

#[derive(Debug, Parser)]
#[command(name = "whitelist-dapp", version, about = "Join an on-chain whitelist from the terminal")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Whitelist contract address.
    #[arg(long, global = true)]
    contract: Option<String>,

    /// Network the wallet must be on (name or chain id).
    #[arg(long, global = true)]
    chain_id: Option<String>,

    /// JSON-RPC endpoint with unlocked accounts.
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Single-line JSON output.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect and print the whitelist state.
    Status,
    /// Connect and add the first account to the whitelist.
    Join,
}

fn main() -> ExitCode {
    load_dotenv();
    init_logging();

    let args = Args::parse();
    match run(&args) {
        Ok((output, connected)) => {
            print_output(&output, args.json);
            if connected {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Existing variables win over `.env` entries.
fn load_dotenv() {
    let Ok(contents) = std::fs::read_to_string(".env") else {
        return;
    };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && env::var(key.trim()).is_err() {
                env::set_var(key.trim(), value);
            }
        }
    }
}

fn config_from(args: &Args) -> Result<DappConfig> {
    let mut config = match &args.contract {
        // The address flag makes the env var optional.
        Some(address) => DappConfig::from_lookup(|key| {
            if key == vars::CONTRACT_ADDRESS {
                Some(address.clone())
            } else {
                env::var(key).ok()
            }
        }),
        None => DappConfig::from_env(),
    }
    .context("loading configuration")?;

    if let Some(chain) = &args.chain_id {
        let network: Network = chain.parse().context("--chain-id")?;
        config = config.with_network(network);
    }
    if let Some(url) = &args.rpc_url {
        config = config.with_rpc_url(url.clone());
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(Value, bool)> {
    let config = config_from(args)?;
    tracing::info!(
        contract = %config.contract_address,
        network = %config.target_network.name(),
        rpc = %config.rpc_url,
        "starting"
    );

    let provider = Rc::new(RpcProvider::connect_http(config.rpc_url.clone()));
    // Everything below runs inside the LocalSet.
    let dapp = WhitelistDapp::new(config, provider, Rc::new(StderrNotifier)).with_spawner(Spawner::Local);
    let page = Page::new(dapp);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    let local = tokio::task::LocalSet::new();

    let output = local.block_on(&runtime, async {
        if !page.on_load().await {
            return json!({ "view": page.view(), "state": page.dapp().state() });
        }
        match args.command {
            Command::Status => cmd_status(&page).await,
            Command::Join => cmd_join(&page).await,
        }
    });
    let connected = page.dapp().state().wallet_connected;
    Ok((output, connected))
}

async fn cmd_status(page: &Page) -> Value {
    // The background refresh from connect races with this one; both write the same flags.
    page.on_refresh().await;
    let cap = match page.dapp().whitelist_cap().await {
        Ok(cap) => Some(cap),
        Err(e) => {
            tracing::error!(error = %e, "reading cap failed");
            None
        }
    };
    json!({ "view": page.view(), "state": page.dapp().state(), "cap": cap })
}

async fn cmd_join(page: &Page) -> Value {
    // Membership decides whether the join control is shown at all.
    page.on_refresh().await;
    let submitted = page.on_join_click().await;
    json!({ "submitted": submitted, "view": page.view(), "state": page.dapp().state() })
}

fn print_output(output: &Value, compact: bool) {
    let formatted = if compact {
        serde_json::to_string(output)
    } else {
        serde_json::to_string_pretty(output)
    };
    match formatted {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}
