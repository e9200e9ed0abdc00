// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Read-only access to archived snapshots.
//!
//! Fetched files first live as single files in the transitional directory and
//! are later moved into one `.tar.xz` archive per day below the transitioned
//! directory. [`Loader`] reads both transparently.

pub mod file_type;
pub mod loader;
pub mod record;
pub mod sidecar;
pub mod timestamp;
pub mod transition;
pub mod validation;

use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};

pub use self::file_type::FileType;
pub use self::loader::Loader;
pub use self::record::{FetchOrigin, FetchedRecord};
pub use self::transition::{Clock, FixedClock, SystemClock, TransitionPolicy, TransitionSchedule};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to extract data from archive {}", path.display())]
    CorruptArchive {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("expected archive {} does not exist", path.display())]
    MissingArchive { path: PathBuf },
    #[error("failed to parse metadata {location}")]
    Sidecar {
        location: String,
        source: serde_json::Error,
    },
    #[error(
        "inconsistent data in {location}: fetch time is {sidecar_time} according to metadata but {file_name_time} according to file name"
    )]
    InconsistentFetchTime {
        location: String,
        file_name_time: DateTime<Utc>,
        sidecar_time: DateTime<Utc>,
    },
    #[error("data fetched on {date} is currently being archived")]
    TransitionInProgress { date: NaiveDate },
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Hard ceiling of records returned for a single request.
    pub maximum_data_files_per_request: usize,
    pub transitional_files_base_path: PathBuf,
    pub transitioned_archives_base_path: PathBuf,
    /// Local time of day at which the previous day is archived.
    pub transition_daily_local_time: NaiveTime,
    /// Time zone of the host running the archiving job.
    pub transition_time_zone: Tz,
    #[serde_as(as = "DurationSeconds<i64>")]
    pub transition_prelude: Duration,
    #[serde_as(as = "DurationSeconds<i64>")]
    pub transition_cooldown: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("org", "vatplanner", "raw-data-archiver")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            maximum_data_files_per_request: 5000,
            transitional_files_base_path: data_dir.join("transitional"),
            transitioned_archives_base_path: data_dir.join("transitioned"),
            transition_daily_local_time: NaiveTime::from_hms_opt(0, 10, 0).unwrap_or_default(),
            transition_time_zone: Tz::UTC,
            transition_prelude: Duration::minutes(5),
            transition_cooldown: Duration::minutes(30),
        }
    }
}

impl StorageConfig {
    pub fn transition_schedule(&self) -> TransitionSchedule {
        TransitionSchedule {
            daily_local_time: self.transition_daily_local_time,
            time_zone: self.transition_time_zone,
            prelude: self.transition_prelude,
            cooldown: self.transition_cooldown,
        }
    }
}
