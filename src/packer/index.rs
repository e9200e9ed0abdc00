// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Numbering of packed records and the `meta.json` document describing them.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::FetchOrigin;

pub const METADATA_FILE_NAME: &str = "meta.json";
pub const CONTENT_FILE_EXTENSION: &str = ".dat";
pub const METADATA_FORMAT_VERSION: u32 = 1;
pub const METADATA_CONTENT_TYPE: &str = "StatusDataFile";

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("metadata has already been generated, no further records can be packed")]
    Sealed,
    #[error("failed to encode metadata")]
    Encode(#[from] serde_json::Error),
}

/// Packed `meta.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedMetadata {
    pub format_version: u32,
    pub content: String,
    pub files: BTreeMap<String, PackedFileMetadata>,
}

/// Origin of one packed content entry. Absent or empty optional fields are
/// left out of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedFileMetadata {
    pub fetch_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_url_requested: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_url_retrieved: Option<String>,
}

impl From<&FetchOrigin> for PackedFileMetadata {
    fn from(origin: &FetchOrigin) -> Self {
        let non_empty = |it: &Option<String>| it.clone().filter(|it| !it.is_empty());
        Self {
            fetch_time: origin.fetch_time,
            fetch_node: non_empty(&origin.fetch_node),
            fetch_url_requested: non_empty(&origin.fetch_url_requested),
            fetch_url_retrieved: non_empty(&origin.fetch_url_retrieved),
        }
    }
}

impl From<PackedFileMetadata> for FetchOrigin {
    fn from(metadata: PackedFileMetadata) -> Self {
        Self {
            fetch_time: metadata.fetch_time,
            fetch_url_requested: metadata.fetch_url_requested,
            fetch_url_retrieved: metadata.fetch_url_retrieved,
            fetch_node: metadata.fetch_node,
        }
    }
}

pub fn content_file_name(number: usize) -> String {
    format!("{number:08}{CONTENT_FILE_EXTENSION}")
}

/// Assigns content file names to the records of one packing operation.
///
/// Records are identified by reference, not by value: two equal origins still
/// get distinct names. Numbers start at 1 in first-seen order. Once
/// [`FileIndex::seal`] produced the metadata, the set of records is frozen
/// and unseen records are rejected with [`IndexError::Sealed`].
#[derive(Debug, Default)]
pub struct FileIndex<'a> {
    numbers: HashMap<*const FetchOrigin, usize>,
    indexed: Vec<&'a FetchOrigin>,
    metadata: Option<Vec<u8>>,
}

impl<'a> FileIndex<'a> {
    pub fn len(&self) -> usize {
        self.indexed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.metadata.is_some()
    }

    /// Name of the packed content entry of `origin`, assigning the next number
    /// on first sight.
    pub fn file_name(&mut self, origin: &'a FetchOrigin) -> Result<String, IndexError> {
        self.number(origin).map(content_file_name)
    }

    fn number(&mut self, origin: &'a FetchOrigin) -> Result<usize, IndexError> {
        let key = std::ptr::from_ref(origin);
        if let Some(number) = self.numbers.get(&key) {
            return Ok(*number);
        }
        if self.is_sealed() {
            return Err(IndexError::Sealed);
        }
        self.indexed.push(origin);
        let number = self.indexed.len();
        self.numbers.insert(key, number);
        Ok(number)
    }

    /// Indexes all given records and returns the encoded metadata describing
    /// every indexed record.
    ///
    /// The document is generated once; later calls return the same bytes as
    /// long as they do not introduce new records.
    pub fn seal(
        &mut self,
        origins: impl IntoIterator<Item = &'a FetchOrigin>,
    ) -> Result<&[u8], IndexError> {
        for origin in origins {
            self.number(origin)?;
        }
        if self.metadata.is_none() {
            self.metadata = Some(serde_json::to_vec(&self.describe())?);
        }
        Ok(self.metadata.as_deref().unwrap_or_default())
    }

    fn describe(&self) -> PackedMetadata {
        PackedMetadata {
            format_version: METADATA_FORMAT_VERSION,
            content: METADATA_CONTENT_TYPE.into(),
            files: self
                .indexed
                .iter()
                .enumerate()
                .map(|(i, origin)| (content_file_name(i + 1), PackedFileMetadata::from(*origin)))
                .collect(),
        }
    }
}
