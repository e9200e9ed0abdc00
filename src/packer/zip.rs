// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::io::{Cursor, Write as _};

use ::zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};
use rayon::prelude::*;
use tracing::debug;

use super::{FileIndex, METADATA_FILE_NAME, PackError, Packer, PackerMethod, split_records};
use crate::storage::FetchedRecord;

/// Fixed allowance per entry for local and central directory headers.
const ENTRY_OVERHEAD: usize = 128;

fn file_options(compression: CompressionMethod, level: Option<i64>) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(compression)
        .compression_level(level)
        .unix_permissions(0o644)
}

/// Initial output buffer size for `contents` compressed at `ratio`.
fn estimate_size(contents: &[Vec<u8>], metadata_len: usize, ratio: f64) -> usize {
    let ratio = if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    };
    let total = contents.iter().map(Vec::len).sum::<usize>();
    (total as f64 * ratio) as usize + metadata_len + ENTRY_OVERHEAD * (contents.len() + 1)
}

/// Zip strategy writing all entries on the calling thread, either stored or
/// deflated.
#[derive(Debug, Clone)]
pub struct ZipPacker {
    method: PackerMethod,
    compression: CompressionMethod,
    level: Option<i64>,
    size_ratio: f64,
}

impl ZipPacker {
    pub fn uncompressed(size_ratio: f64) -> Self {
        Self {
            method: PackerMethod::ZipUncompressed,
            compression: CompressionMethod::Stored,
            level: None,
            size_ratio,
        }
    }

    pub fn deflate(level: u32, size_ratio: f64) -> Self {
        Self {
            method: PackerMethod::ZipDeflateSingleThreaded,
            compression: CompressionMethod::Deflated,
            level: Some(i64::from(level)),
            size_ratio,
        }
    }
}

impl Packer for ZipPacker {
    fn method(&self) -> PackerMethod {
        self.method
    }

    fn pack(self: Box<Self>, records: Vec<FetchedRecord>) -> Result<Vec<u8>, PackError> {
        let (origins, contents) = split_records(records);
        let mut index = FileIndex::default();
        let metadata = index.seal(&origins)?.to_vec();

        let capacity = estimate_size(&contents, metadata.len(), self.size_ratio);
        debug!(method = ?self.method, files = contents.len(), capacity, "packing zip");
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(capacity)));

        writer.start_file(METADATA_FILE_NAME, file_options(self.compression, self.level))?;
        writer.write_all(&metadata)?;
        for (origin, content) in origins.iter().zip(contents) {
            writer.start_file(
                index.file_name(origin)?,
                file_options(self.compression, self.level),
            )?;
            writer.write_all(&content)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}

/// Deflate zip strategy compressing entries on a worker pool.
///
/// Each worker deflates one record into a single-entry zip of its own. The
/// calling thread then copies the compressed entries verbatim into the final
/// container in record order, so the result does not depend on which worker
/// finished first.
#[derive(Debug, Clone)]
pub struct ParallelZipPacker {
    level: i64,
    size_ratio: f64,
    worker_threads: usize,
}

impl ParallelZipPacker {
    pub fn new(level: u32, size_ratio: f64, worker_threads: usize) -> Self {
        Self {
            level: i64::from(level),
            size_ratio,
            worker_threads: worker_threads.max(1),
        }
    }

    fn options(&self) -> SimpleFileOptions {
        file_options(CompressionMethod::Deflated, Some(self.level))
    }

    /// Deflates one entry into a standalone single-entry zip.
    fn compress_entry(&self, name: String, content: Vec<u8>) -> Result<Vec<u8>, PackError> {
        let capacity = estimate_size(std::slice::from_ref(&content), 0, self.size_ratio);
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(capacity)));
        writer.start_file(name, self.options())?;
        writer.write_all(&content)?;
        drop(content);
        Ok(writer.finish()?.into_inner())
    }
}

impl Packer for ParallelZipPacker {
    fn method(&self) -> PackerMethod {
        PackerMethod::ZipDeflateMultiThreaded
    }

    fn pack(self: Box<Self>, records: Vec<FetchedRecord>) -> Result<Vec<u8>, PackError> {
        let (origins, contents) = split_records(records);
        let mut index = FileIndex::default();
        let metadata = index.seal(&origins)?.to_vec();
        // numbering happens here, never on a worker
        let names = origins
            .iter()
            .map(|origin| index.file_name(origin))
            .collect::<Result<Vec<_>, _>>()?;

        let capacity = estimate_size(&contents, metadata.len(), self.size_ratio);
        debug!(
            files = contents.len(),
            capacity,
            workers = self.worker_threads,
            "packing zip in parallel"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .thread_name(|id| format!("zip-deflate-{id}"))
            .num_threads(self.worker_threads)
            .build()
            .map_err(|e| PackError::Worker(e.to_string()))?;
        let compressed = pool.install(|| {
            names
                .into_par_iter()
                .zip(contents)
                .map(|(name, content)| self.compress_entry(name, content))
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(capacity)));
        writer.start_file(METADATA_FILE_NAME, self.options())?;
        writer.write_all(&metadata)?;
        for entry in compressed {
            let mut single = ZipArchive::new(Cursor::new(entry))?;
            writer.raw_copy_file(single.by_index_raw(0)?)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}
