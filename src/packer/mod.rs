// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Serialization of loaded records into a single container.
//!
//! Every container holds a `meta.json` entry describing the origin of each
//! record, followed by one numbered `.dat` entry per record with its content
//! verbatim.

pub mod index;
pub mod method;
pub mod registry;
pub mod tar;
pub mod unpack;
pub mod zip;

use serde::{Deserialize, Serialize};

use crate::storage::{FetchOrigin, FetchedRecord};

pub use self::index::{FileIndex, IndexError, METADATA_FILE_NAME};
pub use self::method::{Compression, ContainerKind, PackerMethod, Threading};
pub use self::registry::PackerRegistry;
pub use self::unpack::{UnpackError, UnpackedFile, unpack};

/// A single-use packing strategy.
pub trait Packer: Send {
    /// Concrete method implemented by this strategy.
    fn method(&self) -> PackerMethod;

    /// Packs `records` in the given order. Content buffers are released one
    /// by one as soon as their entry has been written.
    fn pack(self: Box<Self>, records: Vec<FetchedRecord>) -> Result<Vec<u8>, PackError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Zip(#[from] ::zip::result::ZipError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("compression worker failed: {0}")]
    Worker(String),
    #[error("compression {compression} does not support level {level}")]
    UnsupportedCompression { compression: Compression, level: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackerConfig {
    /// Resolve `zip/deflate` to the multi-threaded strategy.
    pub auto_select_multi_threading: bool,
    /// Compression threads of the multi-threaded strategy, defaults to the
    /// number of CPUs.
    pub worker_threads: Option<usize>,
    /// Expected output size relative to the content size, used to pre-size
    /// zip buffers.
    pub zip_uncompressed_ratio: f64,
    pub zip_deflate_ratio: f64,
    pub zip_deflate_multi_threaded_ratio: f64,
    pub compression_level: CompressionLevels,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            auto_select_multi_threading: false,
            worker_threads: None,
            zip_uncompressed_ratio: 1.1,
            zip_deflate_ratio: 0.5,
            zip_deflate_multi_threaded_ratio: 0.6,
            compression_level: CompressionLevels::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionLevels {
    pub deflate: u32,
    pub gzip: u32,
    pub bzip2: u32,
    pub xz: u32,
    pub lzma: u32,
}

impl Default for CompressionLevels {
    fn default() -> Self {
        Self {
            deflate: 6,
            gzip: 6,
            bzip2: 9,
            xz: 6,
            lzma: 6,
        }
    }
}

impl CompressionLevels {
    /// Configured level of `compression`, checked against the range the
    /// algorithm supports.
    pub fn validated(&self, compression: Compression) -> Result<u32, PackError> {
        let (level, supported) = match compression {
            Compression::None => (0, 0..=0),
            Compression::Deflate => (self.deflate, 0..=9),
            Compression::Gzip => (self.gzip, 0..=9),
            Compression::Bzip2 => (self.bzip2, 1..=9),
            Compression::Xz => (self.xz, 0..=9),
            Compression::Lzma => (self.lzma, 0..=9),
        };
        if supported.contains(&level) {
            Ok(level)
        } else {
            Err(PackError::UnsupportedCompression { compression, level })
        }
    }
}

/// Separates origins from content, keeping the order of `records`.
fn split_records(records: Vec<FetchedRecord>) -> (Vec<FetchOrigin>, Vec<Vec<u8>>) {
    records.into_iter().map(FetchedRecord::into_parts).unzip()
}
