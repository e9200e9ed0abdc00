// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Decoding of packed containers, the client side of [`super::Packer`].

use std::{
    collections::BTreeMap,
    io::{self, Cursor, Read},
};

use xz2::stream::Stream;

use super::{
    Compression, ContainerKind, METADATA_FILE_NAME, PackerMethod,
    index::{METADATA_FORMAT_VERSION, PackedMetadata},
};
use crate::storage::FetchOrigin;

#[derive(Debug, thiserror::Error)]
pub enum UnpackError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Zip(#[from] ::zip::result::ZipError),
    #[error("container has no meta.json")]
    MissingMetadata,
    #[error("invalid meta.json")]
    Metadata(#[from] serde_json::Error),
    #[error("unsupported metadata format version {0}")]
    UnsupportedFormatVersion(u32),
    #[error("entry {0} is not described by metadata")]
    UndescribedEntry(String),
    #[error("metadata describes {0} but the container does not hold it")]
    MissingEntry(String),
    #[error("entry name {0:?} is not a packed file name")]
    UnexpectedEntryName(String),
}

/// One content entry restored from a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedFile {
    pub name: String,
    pub origin: FetchOrigin,
    pub content: Vec<u8>,
}

/// Decodes a container packed with `method`, returning the content entries
/// ordered by name, which is packing order.
///
/// Only `meta.json` and numbered `.dat` entries are accepted, so every
/// returned name is a plain file name.
pub fn unpack(method: PackerMethod, bytes: &[u8]) -> Result<Vec<UnpackedFile>, UnpackError> {
    let mut entries = match method.container() {
        ContainerKind::Zip => zip_entries(bytes)?,
        ContainerKind::Tar => tar_entries(decoder(method.compression(), bytes)?)?,
    };
    if let Some(name) = entries.keys().find(|it| !is_packed_entry_name(it)) {
        return Err(UnpackError::UnexpectedEntryName(name.clone()));
    }

    let metadata = entries
        .remove(METADATA_FILE_NAME)
        .ok_or(UnpackError::MissingMetadata)?;
    let PackedMetadata {
        format_version,
        mut files,
        ..
    } = serde_json::from_slice(&metadata)?;
    if format_version != METADATA_FORMAT_VERSION {
        return Err(UnpackError::UnsupportedFormatVersion(format_version));
    }

    let unpacked = entries
        .into_iter()
        .map(|(name, content)| match files.remove(&name) {
            Some(file) => Ok(UnpackedFile {
                name,
                origin: file.into(),
                content,
            }),
            None => Err(UnpackError::UndescribedEntry(name)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(name) = files.into_keys().next() {
        return Err(UnpackError::MissingEntry(name));
    }
    Ok(unpacked)
}

fn is_packed_entry_name(name: &str) -> bool {
    name == METADATA_FILE_NAME || lazy_regex::regex_is_match!(r"^\d{8}\.dat$", name)
}

fn zip_entries(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, UnpackError> {
    let mut archive = ::zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let mut content = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        file.read_to_end(&mut content)?;
        entries.insert(file.name().to_owned(), content);
    }
    Ok(entries)
}

fn decoder<'a>(compression: Compression, bytes: &'a [u8]) -> io::Result<Box<dyn Read + 'a>> {
    let reader: Box<dyn Read + 'a> = match compression {
        Compression::None => Box::new(bytes),
        Compression::Deflate => Box::new(flate2::read::ZlibDecoder::new(bytes)),
        Compression::Gzip => Box::new(flate2::read::GzDecoder::new(bytes)),
        Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(bytes)),
        Compression::Xz => Box::new(xz2::read::XzDecoder::new(bytes)),
        Compression::Lzma => Box::new(xz2::read::XzDecoder::new_stream(
            bytes,
            Stream::new_lzma_decoder(u64::MAX).map_err(io::Error::other)?,
        )),
    };
    Ok(reader)
}

fn tar_entries(reader: impl Read) -> Result<BTreeMap<String, Vec<u8>>, UnpackError> {
    let mut archive = ::tar::Archive::new(reader);
    let mut entries = BTreeMap::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path()?.to_string_lossy().into_owned();
        let mut content = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
        entry.read_to_end(&mut content)?;
        entries.insert(name, content);
    }
    Ok(entries)
}
