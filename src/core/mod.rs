//! Platform-independent pieces: contract bindings, wire types, networks, UI state.

pub mod contract;
pub mod network;
pub mod rpc;
pub mod state;
