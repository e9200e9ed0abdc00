// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::io::{self, Write};

use tracing::debug;
use xz2::stream::{LzmaOptions, Stream};

use super::{
    Compression, FileIndex, METADATA_FILE_NAME, PackError, Packer, PackerMethod, split_records,
};
use crate::storage::FetchedRecord;

/// Sink of a tar stream, optionally compressed.
enum CompressedWriter {
    Plain(Vec<u8>),
    Deflate(flate2::write::ZlibEncoder<Vec<u8>>),
    Gzip(flate2::write::GzEncoder<Vec<u8>>),
    Bzip2(bzip2::write::BzEncoder<Vec<u8>>),
    Xz(xz2::write::XzEncoder<Vec<u8>>),
}

impl CompressedWriter {
    fn new(compression: Compression, level: u32) -> Result<Self, PackError> {
        let sink = Vec::new();
        Ok(match compression {
            Compression::None => Self::Plain(sink),
            Compression::Deflate => Self::Deflate(flate2::write::ZlibEncoder::new(
                sink,
                flate2::Compression::new(level),
            )),
            Compression::Gzip => Self::Gzip(flate2::write::GzEncoder::new(
                sink,
                flate2::Compression::new(level),
            )),
            Compression::Bzip2 => Self::Bzip2(bzip2::write::BzEncoder::new(
                sink,
                bzip2::Compression::new(level),
            )),
            Compression::Xz => Self::Xz(xz2::write::XzEncoder::new(sink, level)),
            Compression::Lzma => {
                let unsupported = |_| PackError::UnsupportedCompression { compression, level };
                let options = LzmaOptions::new_preset(level).map_err(unsupported)?;
                let stream = Stream::new_lzma_encoder(&options).map_err(unsupported)?;
                Self::Xz(xz2::write::XzEncoder::new_stream(sink, stream))
            }
        })
    }

    fn finish(self) -> io::Result<Vec<u8>> {
        match self {
            Self::Plain(it) => Ok(it),
            Self::Deflate(it) => it.finish(),
            Self::Gzip(it) => it.finish(),
            Self::Bzip2(it) => it.finish(),
            Self::Xz(it) => it.finish(),
        }
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(it) => it.write(buf),
            Self::Deflate(it) => it.write(buf),
            Self::Gzip(it) => it.write(buf),
            Self::Bzip2(it) => it.write(buf),
            Self::Xz(it) => it.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(it) => it.flush(),
            Self::Deflate(it) => it.flush(),
            Self::Gzip(it) => it.flush(),
            Self::Bzip2(it) => it.flush(),
            Self::Xz(it) => it.flush(),
        }
    }
}

/// Tar strategy streaming entries through the configured compressor.
#[derive(Debug, Clone)]
pub struct TarPacker {
    method: PackerMethod,
    level: u32,
}

impl TarPacker {
    /// `method` has to be a tar method, `level` a level valid for its
    /// compression.
    pub fn new(method: PackerMethod, level: u32) -> Self {
        Self { method, level }
    }
}

fn append(
    builder: &mut ::tar::Builder<CompressedWriter>,
    name: &str,
    data: &[u8],
) -> io::Result<()> {
    let mut header = ::tar::Header::new_gnu();
    header.set_entry_type(::tar::EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    builder.append_data(&mut header, name, data)
}

impl Packer for TarPacker {
    fn method(&self) -> PackerMethod {
        self.method
    }

    fn pack(self: Box<Self>, records: Vec<FetchedRecord>) -> Result<Vec<u8>, PackError> {
        let (origins, contents) = split_records(records);
        let mut index = FileIndex::default();
        debug!(method = ?self.method, files = contents.len(), "packing tar");

        let writer = CompressedWriter::new(self.method.compression(), self.level)?;
        let mut builder = ::tar::Builder::new(writer);
        append(&mut builder, METADATA_FILE_NAME, index.seal(&origins)?)?;
        for (origin, content) in origins.iter().zip(contents) {
            append(&mut builder, &index.file_name(origin)?, &content)?;
        }

        Ok(builder.into_inner()?.finish()?)
    }
}
