// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Time-ranged retrieval of archived network status snapshots, packed into a
//! single zip or tar container per request.

mod cli;
mod cli_shared;
pub mod packer;
pub mod request;
pub mod storage;
#[cfg(test)]
mod test_utils;
mod utils;

pub use cli::main::main as archiver_main;
pub use cli_shared::cli::Config;
