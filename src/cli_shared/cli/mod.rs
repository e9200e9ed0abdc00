// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod config;

use std::path::PathBuf;

use directories::ProjectDirs;

pub use self::config::Config;
use crate::utils::misc::LoggingColor;

/// Environment variable pointing to a configuration file.
pub const CONFIG_PATH_ENV: &str = "ARCHIVER_CONFIG_PATH";

/// CLI options shared by all sub-commands
#[derive(Default, Debug, clap::Args)]
pub struct CliOpts {
    /// A TOML file containing relevant configurations
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Enable or disable colored logging in `stderr`
    #[arg(long, default_value = "auto", global = true)]
    pub color: LoggingColor,
    /// Directory for hourly rotated log files
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigPath {
    Cli(PathBuf),
    Env(PathBuf),
    Project(PathBuf),
}

impl ConfigPath {
    pub fn to_path_buf(&self) -> &PathBuf {
        match self {
            ConfigPath::Cli(path) | ConfigPath::Env(path) | ConfigPath::Project(path) => path,
        }
    }
}

/// Looks up the configuration file, first on the command line, then in
/// [`CONFIG_PATH_ENV`], then in the project configuration directory.
pub fn find_config_path(config: Option<&PathBuf>) -> Option<ConfigPath> {
    if let Some(path) = config {
        return Some(ConfigPath::Cli(path.clone()));
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(ConfigPath::Env(path));
        }
    }
    if let Some(dir) = ProjectDirs::from("org", "vatplanner", "raw-data-archiver") {
        let path = dir.config_dir().join("config.toml");
        if path.exists() {
            return Some(ConfigPath::Project(path));
        }
    }
    None
}
