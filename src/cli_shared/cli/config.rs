// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};

use crate::packer::PackerConfig;
use crate::request::RequestsConfig;
use crate::storage::StorageConfig;

#[derive(Serialize, Deserialize, PartialEq, Default, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub packer: PackerConfig,
    pub requests: RequestsConfig,
}
