// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::io::Write;

use anyhow::Context as _;

use crate::cli_shared::cli::Config;

#[derive(Debug, clap::Subcommand)]
pub enum ConfigCommands {
    /// Dump the effective configuration in TOML
    Dump,
}

impl ConfigCommands {
    pub fn run<W: Write>(self, config: &Config, sink: &mut W) -> anyhow::Result<()> {
        match self {
            Self::Dump => writeln!(
                sink,
                "{}",
                toml::to_string(config).context("failed to serialize the configuration")?
            )
            .context("failed to write the configuration"),
        }
    }
}
