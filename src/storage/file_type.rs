// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use chrono::{DateTime, Utc};

use super::timestamp::format_fetch_time;

/// Role of a stored file, derived from its name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum FileType {
    /// The fetched snapshot itself.
    Content,
    /// Sidecar JSON recorded next to the snapshot.
    Metadata,
}

impl FileType {
    pub fn suffix(self) -> &'static str {
        match self {
            FileType::Content => "vatsim-data.txt",
            FileType::Metadata => "meta.json",
        }
    }

    /// Classifies a file by name. Unrelated names yield [`None`].
    pub fn classify(file_name: &str) -> Option<Self> {
        // metadata first, its suffix is the more specific one
        [FileType::Metadata, FileType::Content]
            .into_iter()
            .find(|it| file_name.ends_with(it.suffix()))
    }

    /// Name under which a file of this type is stored for the given fetch time.
    pub fn file_name(self, fetch_time: &DateTime<Utc>) -> String {
        format!("{}_{}", format_fetch_time(fetch_time), self.suffix())
    }
}
