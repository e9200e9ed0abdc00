// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod config_cmd;
mod request_cmd;
mod transition_cmd;
mod unpack_cmd;

pub(super) use self::{
    config_cmd::ConfigCommands, request_cmd::RequestCommand, transition_cmd::TransitionCommand,
    unpack_cmd::UnpackCommand,
};
use crate::cli_shared::cli::{CliOpts, Config};

/// Retrieval and packing of archived network status snapshots
#[derive(clap::Parser)]
#[command(name = env!("CARGO_PKG_NAME"), author = env!("CARGO_PKG_AUTHORS"), version = env!("CARGO_PKG_VERSION"), about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(flatten)]
    pub opts: CliOpts,
    #[command(subcommand)]
    pub cmd: Subcommand,
}

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Process request payloads and write the packed results
    Request(RequestCommand),

    /// Show when data of a fetch date is moved into its daily archive
    Transition(TransitionCommand),

    /// Extract a packed container
    Unpack(UnpackCommand),

    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

impl Subcommand {
    pub async fn run(self, config: Config) -> anyhow::Result<()> {
        match self {
            Self::Request(cmd) => cmd.run(config).await,
            Self::Transition(cmd) => cmd.run(&config, &mut std::io::stdout()),
            Self::Unpack(cmd) => cmd.run(),
            Self::Config(cmd) => cmd.run(&config, &mut std::io::stdout()),
        }
    }
}
