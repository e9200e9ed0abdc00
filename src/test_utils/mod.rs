// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::{fs::File, path::Path, sync::Arc};

use chrono::{DateTime, Datelike as _, NaiveDate, TimeZone as _, Utc};
use tempfile::TempDir;

use crate::storage::{
    FetchOrigin, FetchedRecord, FileType, FixedClock, Loader, StorageConfig, TransitionPolicy,
    sidecar::LocalMetadata, timestamp::format_archive_file_name,
};

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .unwrap()
}

/// Deterministic snapshot content for a fetch time.
pub fn content_of(time: DateTime<Utc>) -> Vec<u8> {
    format!("; snapshot fetched at {time}\n!GENERAL:\nUPDATE = {}\n", time.timestamp())
        .into_bytes()
}

/// Records one minute apart with varying optional origin fields.
pub fn sample_records(count: usize) -> Vec<FetchedRecord> {
    (0..count)
        .map(|i| {
            let time = utc(2023, 4, 10, 12, 0, 0) + chrono::Duration::minutes(i as i64);
            let mut origin = FetchOrigin::new(time);
            if i % 2 == 0 {
                origin = origin.with_url_requested(format!("http://example.com/{i}/vatsim-data.txt"));
            }
            if i % 3 == 0 {
                origin = origin.with_url_retrieved(format!("http://mirror.example.com/{i}"));
            }
            if i % 4 == 1 {
                origin = origin.with_node("fetcher-1");
            }
            FetchedRecord::new(origin, content_of(time).repeat(1 + i % 5))
        })
        .collect()
}

/// Temporary transitional and transitioned storage roots.
pub struct StorageFixture {
    _dir: TempDir,
    pub config: StorageConfig,
}

impl StorageFixture {
    pub const URL: &'static str = "http://status.example.com/vatsim-data.txt";

    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            transitional_files_base_path: dir.path().join("transitional"),
            transitioned_archives_base_path: dir.path().join("transitioned"),
            ..Default::default()
        };
        std::fs::create_dir_all(&config.transitional_files_base_path).unwrap();
        std::fs::create_dir_all(&config.transitioned_archives_base_path).unwrap();
        Self { _dir: dir, config }
    }

    pub fn sidecar(time: DateTime<Utc>) -> Vec<u8> {
        LocalMetadata {
            timestamp: time,
            url: Some(Self::URL.into()),
        }
        .to_vec()
        .unwrap()
    }

    pub fn loader_at(&self, now: DateTime<Utc>) -> Loader {
        Loader::new(
            &self.config,
            TransitionPolicy::new(
                self.config.transition_schedule(),
                Arc::new(FixedClock(now)),
            ),
        )
    }

    pub fn write_transitional_file(&self, name: &str, bytes: &[u8]) {
        std::fs::write(self.config.transitional_files_base_path.join(name), bytes).unwrap();
    }

    /// Writes content and sidecar of one snapshot.
    pub fn write_transitional(&self, time: DateTime<Utc>) {
        self.write_transitional_file(&FileType::Content.file_name(&time), &content_of(time));
        self.write_transitional_file(&FileType::Metadata.file_name(&time), &Self::sidecar(time));
    }

    /// Writes the daily archive of `day` holding content and sidecar of every
    /// given fetch time.
    pub fn write_archive(&self, day: NaiveDate, times: &[DateTime<Utc>]) {
        let files = times
            .iter()
            .flat_map(|time| {
                [
                    (FileType::Content.file_name(time), content_of(*time)),
                    (FileType::Metadata.file_name(time), Self::sidecar(*time)),
                ]
            })
            .collect::<Vec<_>>();
        self.write_archive_files(day, &files);
    }

    pub fn write_archive_files(&self, day: NaiveDate, files: &[(String, Vec<u8>)]) {
        let dir = self
            .config
            .transitioned_archives_base_path
            .join(format!("{:04}", day.year()))
            .join(format!("{:02}", day.month()));
        std::fs::create_dir_all(&dir).unwrap();
        write_tar_xz(&dir.join(format_archive_file_name(day)), files);
    }
}

fn write_tar_xz(path: &Path, files: &[(String, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(xz2::write::XzEncoder::new(file, 1));
    for (name, bytes) in files {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, name, bytes.as_slice())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Uncompressed tar holding `entries` under their names exactly as given,
/// bypassing the path checks of [`tar::Builder::append_data`].
pub fn raw_tar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_old();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, *data).unwrap();
    }
    builder.into_inner().unwrap()
}
