// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use chrono::{DateTime, Datelike as _, Utc};
use tempfile::TempDir;

pub fn archiver() -> Command {
    cargo_bin_cmd!("raw-data-archiver")
}

/// Temporary storage roots with a configuration file pointing at them.
pub struct TestStorage {
    pub dir: TempDir,
    pub config_file: PathBuf,
}

impl TestStorage {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("couldn't create temp dir");
        std::fs::create_dir_all(dir.path().join("transitional")).unwrap();
        std::fs::create_dir_all(dir.path().join("transitioned")).unwrap();

        let config = format!(
            r#"
[storage]
transitional_files_base_path = "{0}/transitional"
transitioned_archives_base_path = "{0}/transitioned"

[packer]
worker_threads = 2
"#,
            dir.path().display()
        );
        let config_file = dir.path().join("config.toml");
        std::fs::write(&config_file, config).expect("couldn't write config");

        Self { dir, config_file }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the daily archive holding a snapshot for every given fetch time.
    pub fn write_archive(&self, times: &[DateTime<Utc>]) {
        let day = times[0].date_naive();
        let dir = self
            .path()
            .join("transitioned")
            .join(format!("{:04}", day.year()))
            .join(format!("{:02}", day.month()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = File::create(dir.join(format!("{}.tar.xz", day.format("%Y%m%d")))).unwrap();

        let mut builder = tar::Builder::new(xz2::write::XzEncoder::new(file, 1));
        for time in times {
            let prefix = time.format("%Y%m%dT%H%M%SZ");
            let sidecar = format!(r#"{{"timestamp":"{}","url":"{URL}"}}"#, time.to_rfc3339());
            for (name, bytes) in [
                (format!("{prefix}_vatsim-data.txt"), content_of(*time)),
                (format!("{prefix}_meta.json"), sidecar.into_bytes()),
            ] {
                let mut header = tar::Header::new_gnu();
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(bytes.len() as u64);
                header.set_mode(0o644);
                builder
                    .append_data(&mut header, name, bytes.as_slice())
                    .unwrap();
            }
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    pub fn write_request(&self, name: &str, method: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(
            &path,
            format!(
                r#"{{
                    "packerMethod": "{method}",
                    "earliestFetchTime": "2023-04-09T23:00:00Z",
                    "latestFetchTime": "2023-04-10T01:00:00Z"
                }}"#
            ),
        )
        .unwrap();
        path
    }
}

pub const URL: &str = "http://status.example.com/vatsim-data.txt";

pub fn content_of(time: DateTime<Utc>) -> Vec<u8> {
    format!("!GENERAL:\nUPDATE = {}\n", time.timestamp()).into_bytes()
}
