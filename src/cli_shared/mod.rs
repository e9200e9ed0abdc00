// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod cli;
pub mod logger;

use std::path::PathBuf;

use anyhow::Context as _;
use tracing::debug;

use crate::cli_shared::cli::{Config, ConfigPath, find_config_path};
use crate::utils::io::read_toml;

pub fn read_config(
    config_path_opt: Option<&PathBuf>,
) -> anyhow::Result<(Option<ConfigPath>, Config)> {
    let (path, config) = match find_config_path(config_path_opt) {
        Some(path) => {
            // Read from config file
            let toml = std::fs::read_to_string(path.to_path_buf()).with_context(|| {
                format!("failed to read configuration {}", path.to_path_buf().display())
            })?;
            // Parse and return the configuration file
            let config = read_toml(&toml).with_context(|| {
                format!("invalid configuration {}", path.to_path_buf().display())
            })?;
            (Some(path), config)
        }
        None => (None, Config::default()),
    };
    debug!(?path, ?config, "configuration loaded");
    Ok((path, config))
}
