// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use chrono::{DateTime, Utc};

/// Where and when a snapshot was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchOrigin {
    pub fetch_time: DateTime<Utc>,
    pub fetch_url_requested: Option<String>,
    pub fetch_url_retrieved: Option<String>,
    pub fetch_node: Option<String>,
}

impl FetchOrigin {
    pub fn new(fetch_time: DateTime<Utc>) -> Self {
        Self {
            fetch_time,
            fetch_url_requested: None,
            fetch_url_retrieved: None,
            fetch_node: None,
        }
    }

    pub fn with_url_requested(mut self, url: impl Into<String>) -> Self {
        self.fetch_url_requested = Some(url.into());
        self
    }

    pub fn with_url_retrieved(mut self, url: impl Into<String>) -> Self {
        self.fetch_url_retrieved = Some(url.into());
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.fetch_node = Some(node.into());
        self
    }
}

/// One archived snapshot, keyed by its fetch time.
///
/// The content buffer is owned by the record until [`FetchedRecord::into_parts`]
/// moves it out. Packers consume records that way so every buffer can be
/// dropped as soon as its entry has been written; a released record no longer
/// exists and cannot be read again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRecord {
    origin: FetchOrigin,
    content: Vec<u8>,
}

impl FetchedRecord {
    pub fn new(origin: FetchOrigin, content: Vec<u8>) -> Self {
        Self { origin, content }
    }

    pub fn origin(&self) -> &FetchOrigin {
        &self.origin
    }

    pub fn fetch_time(&self) -> DateTime<Utc> {
        self.origin.fetch_time
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_parts(self) -> (FetchOrigin, Vec<u8>) {
        (self.origin, self.content)
    }
}
