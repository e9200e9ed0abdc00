// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Naming conventions of archived files.
//!
//! Every fetched file is named `<YYYYMMDD>T<HHMMSS>Z_<role>` using the UTC
//! fetch time. Daily archives are named `<YYYYMMDD>.tar.xz` and live in
//! `<YYYY>/<MM>/` below the archive root.

use chrono::{DateTime, NaiveDate, Utc};
use lazy_regex::regex_captures;

pub const ARCHIVE_FILE_EXTENSION: &str = ".tar.xz";

/// Extracts the fetch time encoded in a file name prefix. Names not following
/// the convention yield [`None`].
pub fn parse_fetch_time(file_name: &str) -> Option<DateTime<Utc>> {
    let (_, year, month, day, hour, minute, second) = regex_captures!(
        r"^(\d{4})(0[1-9]|1[0-2])(0[1-9]|[12][0-9]|3[01])T([01][0-9]|2[0-3])([0-5][0-9])([0-5][0-9])Z_",
        file_name
    )?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?
        .and_hms_opt(hour.parse().ok()?, minute.parse().ok()?, second.parse().ok()?)
        .map(|it| it.and_utc())
}

/// Formats the file name prefix for a fetch time, without the `_<role>` part.
/// Sub-second precision is dropped.
pub fn format_fetch_time(fetch_time: &DateTime<Utc>) -> String {
    fetch_time.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Parses a daily archive file name such as `20230401.tar.xz`.
pub fn parse_archive_file_name(file_name: &str) -> Option<NaiveDate> {
    let (_, year, month, day) = regex_captures!(
        r"^(\d{4})(0[1-9]|1[0-2])(0[1-9]|[12][0-9]|3[01])\.tar\.xz$",
        file_name
    )?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

pub fn format_archive_file_name(date: NaiveDate) -> String {
    format!("{}{ARCHIVE_FILE_EXTENSION}", date.format("%Y%m%d"))
}

/// Year directories below the archive root are four-digit numbers.
pub fn parse_year_dir(name: &str) -> Option<i32> {
    lazy_regex::regex_is_match!(r"^\d{4}$", name)
        .then(|| name.parse().ok())
        .flatten()
}

/// Month directories are two-digit numbers `01` to `12`.
pub fn parse_month_dir(name: &str) -> Option<u32> {
    lazy_regex::regex_is_match!(r"^(0[1-9]|1[0-2])$", name)
        .then(|| name.parse().ok())
        .flatten()
}
