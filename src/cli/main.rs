// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::ffi::OsString;

use clap::Parser;
use tracing::info;

use super::subcommands::Cli;
use crate::cli_shared::{logger, read_config};

pub fn main<ArgT>(args: impl IntoIterator<Item = ArgT>) -> anyhow::Result<()>
where
    ArgT: Into<OsString> + Clone,
{
    // Capture Cli inputs
    let Cli { opts, cmd } = Cli::parse_from(args);
    logger::setup_logger(&opts);

    let (config_path, config) = read_config(opts.config.as_ref())?;
    match &config_path {
        Some(path) => info!("using configuration at {}", path.to_path_buf().display()),
        None => info!("no configuration found, using defaults"),
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(cmd.run(config))
}
