// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{BufReader, ErrorKind, Read as _},
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Datelike as _, NaiveDate, Utc};
use tracing::{debug, error, warn};
use xz2::read::XzDecoder;

use super::{
    FetchOrigin, FetchedRecord, FileType, LoadError, StorageConfig, TransitionPolicy,
    sidecar::LocalMetadata,
    timestamp::{
        format_archive_file_name, parse_archive_file_name, parse_fetch_time, parse_month_dir,
        parse_year_dir,
    },
};

/// Loads fetched records from the transitional directory and the daily
/// archives.
#[derive(Debug, Clone)]
pub struct Loader {
    transitional_root: PathBuf,
    transitioned_root: PathBuf,
    maximum_files: usize,
    policy: TransitionPolicy,
}

impl Loader {
    pub fn new(config: &StorageConfig, policy: TransitionPolicy) -> Self {
        Self {
            transitional_root: config.transitional_files_base_path.clone(),
            transitioned_root: config.transitioned_archives_base_path.clone(),
            maximum_files: config.maximum_data_files_per_request,
            policy,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config,
            TransitionPolicy::with_system_clock(config.transition_schedule()),
        )
    }

    /// Loads all records fetched within `earliest..=latest`, ascending by fetch
    /// time.
    ///
    /// At most `min(limit, maximum_data_files_per_request)` records are read
    /// and returned. Any read failure fails the whole call. `wanted_formats` is
    /// accepted for compatibility but does not narrow the result.
    pub fn load(
        &self,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
        limit: usize,
        wanted_formats: &[String],
    ) -> Result<Vec<FetchedRecord>, LoadError> {
        let effective_limit = limit.min(self.maximum_files);
        debug!(
            %earliest,
            %latest,
            requested = limit,
            limit = effective_limit,
            "loading fetched files"
        );
        if !wanted_formats.is_empty() {
            debug!(?wanted_formats, "data file formats are not filtered");
        }
        if effective_limit == 0 || earliest > latest {
            return Ok(vec![]);
        }

        let range = earliest..=latest;
        let mut loaded = self.load_transitioned(&range, effective_limit)?;
        let remaining = effective_limit.saturating_sub(loaded.len());
        if remaining > 0 {
            let archived = loaded
                .iter()
                .map(FetchedRecord::fetch_time)
                .collect::<BTreeSet<_>>();
            loaded.extend(self.load_transitional(&range, remaining, &archived)?);
        }

        loaded.sort_by_key(FetchedRecord::fetch_time);
        loaded.truncate(effective_limit);

        debug!(count = loaded.len(), "loaded fetched files");
        Ok(loaded)
    }

    fn load_transitioned(
        &self,
        range: &RangeInclusive<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<FetchedRecord>, LoadError> {
        let Some(earliest_archived) = self.earliest_transitioned_date()? else {
            return Ok(vec![]);
        };

        let latest_day = range.end().date_naive();
        let mut day = earliest_archived.max(range.start().date_naive());
        let mut loaded = Vec::new();
        while loaded.len() < limit && day <= latest_day && !self.policy.is_still_transitional(day)
        {
            if self.policy.is_in_backoff_window(day) {
                return Err(LoadError::TransitionInProgress { date: day });
            }

            let mut records = self.load_transitioned_day(day, range)?;
            records.truncate(limit - loaded.len());
            loaded.extend(records);

            let Some(next) = day.succ_opt() else {
                break;
            };
            day = next;
        }
        Ok(loaded)
    }

    fn load_transitioned_day(
        &self,
        day: NaiveDate,
        range: &RangeInclusive<DateTime<Utc>>,
    ) -> Result<Vec<FetchedRecord>, LoadError> {
        let path = self.archive_path(day);
        debug!(path = %path.display(), "opening archive");

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LoadError::MissingArchive { path });
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };
        let corrupt = |source| LoadError::CorruptArchive {
            path: path.clone(),
            source,
        };

        let mut archive = tar::Archive::new(XzDecoder::new(BufReader::new(file)));
        let mut pending = PendingRecords::default();
        for entry in archive.entries().map_err(corrupt)? {
            let mut entry = entry.map_err(corrupt)?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let Some(name) = entry
                .path()
                .map_err(corrupt)?
                .file_name()
                .and_then(|it| it.to_str())
                .map(str::to_owned)
            else {
                continue;
            };
            let Some((fetch_time, file_type)) = classify_in_range(&name, range) else {
                continue;
            };

            let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
            entry.read_to_end(&mut bytes).map_err(corrupt)?;
            pending.add(fetch_time, file_type, bytes, || {
                format!("{} of {}", name, path.display())
            })?;
        }
        Ok(pending.into_records())
    }

    fn load_transitional(
        &self,
        range: &RangeInclusive<DateTime<Utc>>,
        limit: usize,
        archived: &BTreeSet<DateTime<Utc>>,
    ) -> Result<Vec<FetchedRecord>, LoadError> {
        let root = &self.transitional_root;
        let io_error = |source| LoadError::Io {
            path: root.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(root).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|it| it.to_str()) {
                files.push((name.to_owned(), path));
            }
        }
        // names start with the fetch time, so this is chronological
        files.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

        let mut pending = PendingRecords::default();
        for (name, path) in files {
            let Some((fetch_time, file_type)) = classify_in_range(&name, range) else {
                continue;
            };
            if archived.contains(&fetch_time) {
                warn!(%fetch_time, name = %name, "fetch time found in both storages, using the archived one");
                continue;
            }
            // sidecars without content are dropped, so only complete records count
            if !pending.contains(&fetch_time) && pending.with_content() >= limit {
                debug!(limit, "file limit reached");
                break;
            }

            let date = fetch_time.date_naive();
            if self.policy.is_in_backoff_window(date) {
                return Err(LoadError::TransitionInProgress { date });
            }

            let bytes = std::fs::read(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            pending.add(fetch_time, file_type, bytes, || path.display().to_string())?;
        }
        Ok(pending.into_records())
    }

    /// Earliest date with an archive, found by descending into the numerically
    /// smallest year and month directories.
    fn earliest_transitioned_date(&self) -> Result<Option<NaiveDate>, LoadError> {
        let root = &self.transitioned_root;
        let Some(year) = child_names(root, true)?
            .and_then(|names| names.iter().filter_map(|it| parse_year_dir(it)).min())
        else {
            warn!(
                path = %root.display(),
                "no year directories found for transitioned data, assuming there is no transitioned data at all"
            );
            return Ok(None);
        };

        let year_dir = root.join(format!("{year:04}"));
        let Some(month) = child_names(&year_dir, true)?
            .and_then(|names| names.iter().filter_map(|it| parse_month_dir(it)).min())
        else {
            error!(
                year,
                "transitioned data is missing month directories, the directory structure is corrupted and data is inaccessible"
            );
            return Ok(None);
        };

        let month_dir = year_dir.join(format!("{month:02}"));
        let Some(date) = child_names(&month_dir, false)?.and_then(|names| {
            names
                .iter()
                .filter_map(|it| parse_archive_file_name(it))
                .filter(|it| it.year() == year && it.month() == month)
                .min()
        }) else {
            error!(
                year,
                month,
                "transitioned data is missing day archives, the directory structure is corrupted and data is inaccessible"
            );
            return Ok(None);
        };

        Ok(Some(date))
    }

    fn archive_path(&self, day: NaiveDate) -> PathBuf {
        self.transitioned_root
            .join(format!("{:04}", day.year()))
            .join(format!("{:02}", day.month()))
            .join(format_archive_file_name(day))
    }
}

/// Names of the sub-directories (or files) of `dir`, [`None`] if `dir` does
/// not exist.
fn child_names(dir: &Path, directories: bool) -> Result<Option<Vec<String>>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %dir.display(), "directory for transitioned data does not exist");
            return Ok(None);
        }
        Err(source) => return Err(io_error(source)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let path = entry.map_err(io_error)?.path();
        let wanted = if directories {
            path.is_dir()
        } else {
            path.is_file()
        };
        if !wanted {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|it| it.to_str()) {
            names.push(name.to_owned());
        }
    }
    Ok(Some(names))
}

fn classify_in_range(
    name: &str,
    range: &RangeInclusive<DateTime<Utc>>,
) -> Option<(DateTime<Utc>, FileType)> {
    let fetch_time = parse_fetch_time(name)?;
    if !range.contains(&fetch_time) {
        return None;
    }
    match FileType::classify(name) {
        Some(file_type) => Some((fetch_time, file_type)),
        None => {
            debug!(name, "skipping unsupported file");
            None
        }
    }
}

struct PendingRecord {
    origin: FetchOrigin,
    content: Option<Vec<u8>>,
}

/// Collects the files of one storage by fetch time until both content and
/// sidecar have been seen.
#[derive(Default)]
struct PendingRecords {
    records: BTreeMap<DateTime<Utc>, PendingRecord>,
    with_content: usize,
}

impl PendingRecords {
    /// Number of fetch times whose content has been seen.
    fn with_content(&self) -> usize {
        self.with_content
    }

    fn contains(&self, fetch_time: &DateTime<Utc>) -> bool {
        self.records.contains_key(fetch_time)
    }

    fn add(
        &mut self,
        fetch_time: DateTime<Utc>,
        file_type: FileType,
        bytes: Vec<u8>,
        location: impl FnOnce() -> String,
    ) -> Result<(), LoadError> {
        let pending = self.records.entry(fetch_time).or_insert_with(|| PendingRecord {
            origin: FetchOrigin::new(fetch_time),
            content: None,
        });
        match file_type {
            FileType::Content => {
                if pending.content.replace(bytes).is_none() {
                    self.with_content += 1;
                }
            }
            FileType::Metadata => {
                let location = location();
                let metadata = match LocalMetadata::from_slice(&bytes) {
                    Ok(it) => it,
                    Err(source) => return Err(LoadError::Sidecar { location, source }),
                };
                if metadata.timestamp != fetch_time {
                    return Err(LoadError::InconsistentFetchTime {
                        location,
                        file_name_time: fetch_time,
                        sidecar_time: metadata.timestamp,
                    });
                }
                pending.origin.fetch_url_requested = metadata.url;
            }
        }
        Ok(())
    }

    fn into_records(self) -> Vec<FetchedRecord> {
        self.records
            .into_values()
            .filter_map(|pending| match pending.content {
                Some(content) => Some(FetchedRecord::new(pending.origin, content)),
                None => {
                    warn!(
                        fetch_time = %pending.origin.fetch_time,
                        "metadata without content, skipping"
                    );
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{StorageFixture, content_of, utc};
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn times(records: &[FetchedRecord]) -> Vec<DateTime<Utc>> {
        records.iter().map(FetchedRecord::fetch_time).collect()
    }

    #[test]
    fn limit_returns_earliest_transitional_files() {
        let fixture = StorageFixture::new();
        let all = (0..5)
            .map(|hour| utc(2023, 4, 10, hour, 0, 0))
            .collect::<Vec<_>>();
        // written in reverse to rule out directory order
        for time in all.iter().rev() {
            fixture.write_transitional(*time);
        }

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let loaded = loader
            .load(utc(2023, 4, 10, 0, 0, 0), utc(2023, 4, 10, 23, 59, 59), 3, &[])
            .unwrap();

        assert_eq!(times(&loaded), all[..3].to_vec());
        for record in &loaded {
            assert_eq!(record.content(), content_of(record.fetch_time()).as_slice());
            assert_eq!(
                record.origin().fetch_url_requested.as_deref(),
                Some(StorageFixture::URL)
            );
        }
    }

    #[test]
    fn merges_transitioned_and_transitional_days() {
        let fixture = StorageFixture::new();
        let archived = [utc(2023, 4, 9, 8, 0, 0), utc(2023, 4, 9, 20, 30, 0)];
        let transitional = [utc(2023, 4, 10, 1, 0, 0), utc(2023, 4, 10, 2, 0, 0)];
        fixture.write_archive(archived[0].date_naive(), &archived);
        for time in transitional {
            fixture.write_transitional(time);
        }

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let loaded = loader
            .load(utc(2023, 4, 9, 0, 0, 0), utc(2023, 4, 10, 23, 0, 0), 100, &[])
            .unwrap();

        let expected = archived.iter().chain(&transitional).copied().collect::<Vec<_>>();
        assert_eq!(times(&loaded), expected);
        for record in &loaded {
            assert_eq!(record.content(), content_of(record.fetch_time()).as_slice());
            assert_eq!(
                record.origin().fetch_url_requested.as_deref(),
                Some(StorageFixture::URL)
            );
        }
    }

    #[test]
    fn limit_is_shared_between_storages() {
        let fixture = StorageFixture::new();
        let archived = [
            utc(2023, 4, 9, 1, 0, 0),
            utc(2023, 4, 9, 2, 0, 0),
            utc(2023, 4, 9, 3, 0, 0),
        ];
        fixture.write_archive(archived[0].date_naive(), &archived);
        fixture.write_transitional(utc(2023, 4, 10, 1, 0, 0));
        fixture.write_transitional(utc(2023, 4, 10, 2, 0, 0));

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let loaded = loader
            .load(utc(2023, 4, 1, 0, 0, 0), utc(2023, 4, 11, 0, 0, 0), 4, &[])
            .unwrap();
        assert_eq!(
            times(&loaded),
            vec![
                archived[0],
                archived[1],
                archived[2],
                utc(2023, 4, 10, 1, 0, 0)
            ]
        );

        let loaded = loader
            .load(utc(2023, 4, 1, 0, 0, 0), utc(2023, 4, 11, 0, 0, 0), 2, &[])
            .unwrap();
        assert_eq!(times(&loaded), archived[..2].to_vec());
    }

    #[test]
    fn limit_is_clamped_to_configured_maximum() {
        let mut fixture = StorageFixture::new();
        fixture.config.maximum_data_files_per_request = 2;
        for minute in 0..4 {
            fixture.write_transitional(utc(2023, 4, 10, 1, minute, 0));
        }

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let loaded = loader
            .load(utc(2023, 4, 10, 0, 0, 0), utc(2023, 4, 10, 23, 0, 0), 1000, &[])
            .unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let fixture = StorageFixture::new();
        for minute in 0..5 {
            fixture.write_transitional(utc(2023, 4, 10, 1, minute, 0));
        }

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let loaded = loader
            .load(utc(2023, 4, 10, 1, 1, 0), utc(2023, 4, 10, 1, 3, 0), 10, &[])
            .unwrap();
        assert_eq!(
            times(&loaded),
            vec![
                utc(2023, 4, 10, 1, 1, 0),
                utc(2023, 4, 10, 1, 2, 0),
                utc(2023, 4, 10, 1, 3, 0)
            ]
        );
    }

    #[test]
    fn empty_results() {
        let fixture = StorageFixture::new();
        fixture.write_transitional(utc(2023, 4, 10, 1, 0, 0));
        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));

        // nothing in range
        let loaded = loader
            .load(utc(2023, 4, 10, 2, 0, 0), utc(2023, 4, 10, 3, 0, 0), 10, &[])
            .unwrap();
        assert!(loaded.is_empty());

        // zero limit
        let loaded = loader
            .load(utc(2023, 4, 10, 0, 0, 0), utc(2023, 4, 10, 3, 0, 0), 0, &[])
            .unwrap();
        assert!(loaded.is_empty());

        // reversed range
        let loaded = loader
            .load(utc(2023, 4, 10, 3, 0, 0), utc(2023, 4, 10, 0, 0, 0), 10, &[])
            .unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn loading_is_idempotent() {
        let fixture = StorageFixture::new();
        let archived = [utc(2023, 4, 8, 5, 0, 0), utc(2023, 4, 9, 6, 0, 0)];
        fixture.write_archive(archived[0].date_naive(), &archived[..1]);
        fixture.write_archive(archived[1].date_naive(), &archived[1..]);
        fixture.write_transitional(utc(2023, 4, 10, 7, 0, 0));

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let earliest = utc(2023, 4, 1, 0, 0, 0);
        let latest = utc(2023, 4, 30, 0, 0, 0);
        let first = loader.load(earliest, latest, 10, &[]).unwrap();
        let second = loader.load(earliest, latest, 10, &[]).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn sidecar_mismatch_fails_transitional_load() {
        let fixture = StorageFixture::new();
        let time = utc(2023, 4, 10, 1, 0, 0);
        fixture.write_transitional(time);
        fixture.write_transitional_file(
            &FileType::Metadata.file_name(&time),
            &StorageFixture::sidecar(time + Duration::seconds(1)),
        );

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let result = loader.load(utc(2023, 4, 10, 0, 0, 0), utc(2023, 4, 10, 2, 0, 0), 10, &[]);
        match result {
            Err(LoadError::InconsistentFetchTime {
                file_name_time,
                sidecar_time,
                ..
            }) => {
                assert_eq!(file_name_time, time);
                assert_eq!(sidecar_time, time + Duration::seconds(1));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn sidecar_mismatch_fails_archive_load() {
        let fixture = StorageFixture::new();
        let time = utc(2023, 4, 9, 1, 0, 0);
        fixture.write_archive_files(
            time.date_naive(),
            &[
                (FileType::Content.file_name(&time), content_of(time)),
                (
                    FileType::Metadata.file_name(&time),
                    StorageFixture::sidecar(utc(2023, 4, 9, 1, 0, 1)),
                ),
            ],
        );

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let result = loader.load(utc(2023, 4, 9, 0, 0, 0), utc(2023, 4, 9, 2, 0, 0), 10, &[]);
        assert!(
            matches!(result, Err(LoadError::InconsistentFetchTime { .. })),
            "{result:?}"
        );
    }

    #[test]
    fn malformed_sidecar_fails_load() {
        let fixture = StorageFixture::new();
        let time = utc(2023, 4, 10, 1, 0, 0);
        fixture.write_transitional_file(&FileType::Content.file_name(&time), b"data");
        fixture.write_transitional_file(&FileType::Metadata.file_name(&time), b"{");

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let result = loader.load(utc(2023, 4, 10, 0, 0, 0), utc(2023, 4, 10, 2, 0, 0), 10, &[]);
        assert!(matches!(result, Err(LoadError::Sidecar { .. })), "{result:?}");
    }

    #[test]
    fn unrelated_files_are_skipped() {
        let fixture = StorageFixture::new();
        let time = utc(2023, 4, 10, 1, 0, 0);
        fixture.write_transitional(time);
        fixture.write_transitional_file("README", b"not a snapshot");
        fixture.write_transitional_file("20230410T013000Z_other.bin", b"unknown role");
        // sidecar without content
        let orphan = utc(2023, 4, 10, 1, 45, 0);
        fixture.write_transitional_file(
            &FileType::Metadata.file_name(&orphan),
            &StorageFixture::sidecar(orphan),
        );

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let loaded = loader
            .load(utc(2023, 4, 10, 0, 0, 0), utc(2023, 4, 10, 2, 0, 0), 10, &[])
            .unwrap();
        assert_eq!(times(&loaded), vec![time]);
    }

    #[test]
    fn archive_entries_are_classified_by_file_name() {
        let fixture = StorageFixture::new();
        let time = utc(2023, 4, 9, 1, 0, 0);
        fixture.write_archive_files(
            time.date_naive(),
            &[
                (
                    format!("20230409/{}", FileType::Content.file_name(&time)),
                    content_of(time),
                ),
                (
                    format!("20230409/{}", FileType::Metadata.file_name(&time)),
                    StorageFixture::sidecar(time),
                ),
            ],
        );

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let loaded = loader
            .load(utc(2023, 4, 9, 0, 0, 0), utc(2023, 4, 9, 2, 0, 0), 10, &[])
            .unwrap();
        assert_eq!(times(&loaded), vec![time]);
        assert_eq!(loaded[0].content(), content_of(time).as_slice());
    }

    #[test]
    fn missing_day_archive_fails_load() {
        let fixture = StorageFixture::new();
        let first = utc(2023, 4, 7, 1, 0, 0);
        let third = utc(2023, 4, 9, 1, 0, 0);
        fixture.write_archive(first.date_naive(), &[first]);
        fixture.write_archive(third.date_naive(), &[third]);

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let result = loader.load(first, third, 10, &[]);
        match result {
            Err(LoadError::MissingArchive { path }) => {
                assert!(path.ends_with("2023/04/20230408.tar.xz"), "{}", path.display());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn walk_starts_at_earliest_archive() {
        let fixture = StorageFixture::new();
        let archived = utc(2023, 4, 9, 1, 0, 0);
        fixture.write_archive(archived.date_naive(), &[archived]);

        // days before the first archive are not looked up
        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let loaded = loader
            .load(utc(2020, 1, 1, 0, 0, 0), utc(2023, 4, 9, 23, 0, 0), 10, &[])
            .unwrap();
        assert_eq!(times(&loaded), vec![archived]);
    }

    #[test]
    fn missing_month_directories_mean_no_transitioned_data() {
        let fixture = StorageFixture::new();
        std::fs::create_dir_all(fixture.config.transitioned_archives_base_path.join("2023"))
            .unwrap();
        let time = utc(2023, 4, 10, 1, 0, 0);
        fixture.write_transitional(time);

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let loaded = loader
            .load(utc(2023, 4, 1, 0, 0, 0), utc(2023, 4, 10, 2, 0, 0), 10, &[])
            .unwrap();
        assert_eq!(times(&loaded), vec![time]);
    }

    #[test]
    fn missing_transitional_directory_fails_load() {
        let fixture = StorageFixture::new();
        std::fs::remove_dir_all(&fixture.config.transitional_files_base_path).unwrap();

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let result = loader.load(utc(2023, 4, 10, 0, 0, 0), utc(2023, 4, 10, 2, 0, 0), 10, &[]);
        assert!(matches!(result, Err(LoadError::Io { .. })), "{result:?}");
    }

    #[test]
    fn corrupt_archive_fails_load() {
        let fixture = StorageFixture::new();
        let day = NaiveDate::from_ymd_opt(2023, 4, 9).unwrap();
        let dir = fixture.config.transitioned_archives_base_path.join("2023/04");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format_archive_file_name(day)), b"definitely not xz").unwrap();

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let result = loader.load(utc(2023, 4, 9, 0, 0, 0), utc(2023, 4, 9, 2, 0, 0), 10, &[]);
        assert!(
            matches!(result, Err(LoadError::CorruptArchive { .. })),
            "{result:?}"
        );
    }

    #[test]
    fn backoff_window_blocks_transitional_reads() {
        let fixture = StorageFixture::new();
        fixture.write_transitional(utc(2023, 4, 9, 23, 50, 0));

        // 5 minutes before the scheduled archiving of 2023-04-09
        let loader = fixture.loader_at(utc(2023, 4, 10, 0, 5, 0));
        let result = loader.load(utc(2023, 4, 9, 0, 0, 0), utc(2023, 4, 10, 0, 5, 0), 10, &[]);
        assert!(
            matches!(result, Err(LoadError::TransitionInProgress { date }) if date == NaiveDate::from_ymd_opt(2023, 4, 9).unwrap()),
            "{result:?}"
        );

        // files of the current day are not affected
        fixture.write_transitional(utc(2023, 4, 10, 0, 1, 0));
        let loaded = loader
            .load(utc(2023, 4, 10, 0, 0, 0), utc(2023, 4, 10, 0, 5, 0), 10, &[])
            .unwrap();
        assert_eq!(times(&loaded), vec![utc(2023, 4, 10, 0, 1, 0)]);
    }

    #[test]
    fn backoff_window_blocks_fresh_archives() {
        let fixture = StorageFixture::new();
        let archived = utc(2023, 4, 9, 1, 0, 0);
        fixture.write_archive(archived.date_naive(), &[archived]);

        // scheduled archiving happened 10 minutes ago, cooldown is 30 minutes
        let loader = fixture.loader_at(utc(2023, 4, 10, 0, 20, 0));
        let result = loader.load(utc(2023, 4, 9, 0, 0, 0), utc(2023, 4, 9, 2, 0, 0), 10, &[]);
        assert!(
            matches!(result, Err(LoadError::TransitionInProgress { .. })),
            "{result:?}"
        );

        let loader = fixture.loader_at(utc(2023, 4, 10, 0, 41, 0));
        let loaded = loader
            .load(utc(2023, 4, 9, 0, 0, 0), utc(2023, 4, 9, 2, 0, 0), 10, &[])
            .unwrap();
        assert_eq!(times(&loaded), vec![archived]);
    }

    #[test]
    fn orphan_sidecars_do_not_count_towards_limit() {
        let fixture = StorageFixture::new();
        let orphan = utc(2023, 4, 10, 0, 30, 0);
        fixture.write_transitional_file(
            &FileType::Metadata.file_name(&orphan),
            &StorageFixture::sidecar(orphan),
        );
        let complete = (1..=4)
            .map(|hour| utc(2023, 4, 10, hour, 0, 0))
            .collect::<Vec<_>>();
        for time in &complete {
            fixture.write_transitional(*time);
        }

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        let loaded = loader
            .load(utc(2023, 4, 10, 0, 0, 0), utc(2023, 4, 10, 5, 0, 0), 3, &[])
            .unwrap();
        assert_eq!(times(&loaded), complete[..3].to_vec());
    }

    #[test]
    fn archived_copy_wins_over_stale_transitional_file() {
        let fixture = StorageFixture::new();
        let duplicate = utc(2023, 4, 9, 1, 0, 0);
        let fresh = utc(2023, 4, 10, 1, 0, 0);
        fixture.write_archive(duplicate.date_naive(), &[duplicate]);
        fixture.write_transitional_file(&FileType::Content.file_name(&duplicate), b"stale");
        fixture.write_transitional_file(
            &FileType::Metadata.file_name(&duplicate),
            &StorageFixture::sidecar(duplicate),
        );
        fixture.write_transitional(fresh);

        let loader = fixture.loader_at(utc(2023, 4, 10, 12, 0, 0));
        for limit in [2, 10] {
            let loaded = loader
                .load(utc(2023, 4, 9, 0, 0, 0), utc(2023, 4, 10, 2, 0, 0), limit, &[])
                .unwrap();
            // the duplicate takes no share of the limit
            assert_eq!(times(&loaded), vec![duplicate, fresh]);
            assert_eq!(loaded[0].content(), content_of(duplicate).as_slice());
        }
    }
}
