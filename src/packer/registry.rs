// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use tracing::debug;

use super::{
    ContainerKind, PackError, Packer, PackerConfig, PackerMethod, Threading,
    tar::TarPacker,
    zip::{ParallelZipPacker, ZipPacker},
};

/// Creates a fresh [`Packer`] for every packing operation.
#[derive(Debug, Clone, Default)]
pub struct PackerRegistry {
    config: PackerConfig,
}

impl PackerRegistry {
    pub fn new(config: PackerConfig) -> Self {
        Self { config }
    }

    /// Resolves `zip/deflate` to a concrete threading variant according to
    /// `auto_select_multi_threading`. Concrete methods resolve to themselves.
    pub fn resolve(&self, method: PackerMethod) -> PackerMethod {
        match method {
            PackerMethod::ZipDeflate if self.config.auto_select_multi_threading => {
                PackerMethod::ZipDeflateMultiThreaded
            }
            PackerMethod::ZipDeflate => PackerMethod::ZipDeflateSingleThreaded,
            concrete => concrete,
        }
    }

    /// Creates the strategy for `method`. Invalid compression settings are
    /// rejected here, before any record is touched.
    pub fn create_packer(&self, method: PackerMethod) -> Result<Box<dyn Packer>, PackError> {
        let concrete = self.resolve(method);
        let level = self
            .config
            .compression_level
            .validated(concrete.compression())?;
        debug!(requested = ?method, resolved = ?concrete, level, "creating packer");

        let packer: Box<dyn Packer> = match (concrete.container(), concrete.threading()) {
            (ContainerKind::Zip, _) if concrete.is_uncompressed() => {
                Box::new(ZipPacker::uncompressed(self.config.zip_uncompressed_ratio))
            }
            (ContainerKind::Zip, Some(Threading::Multi)) => Box::new(ParallelZipPacker::new(
                level,
                self.config.zip_deflate_multi_threaded_ratio,
                self.config.worker_threads.unwrap_or_else(num_cpus::get),
            )),
            (ContainerKind::Zip, _) => {
                Box::new(ZipPacker::deflate(level, self.config.zip_deflate_ratio))
            }
            (ContainerKind::Tar, _) => Box::new(TarPacker::new(concrete, level)),
        };
        Ok(packer)
    }
}
