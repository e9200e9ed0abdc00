// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Predicts whether the data of a fetch date has already been compressed into
//! its daily archive.
//!
//! The compression job runs once a day, shortly after midnight in the time zone
//! of the archiving host, and packs all files of the previous day. Around that
//! moment files disappear from the transitional directory while the archive
//! is still being written, so reads of that date are refused during a back-off
//! window spanning `prelude` before and `cooldown` after the scheduled time.

use std::sync::Arc;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone as _, Utc};
use chrono_tz::Tz;

/// Source of the current time.
pub trait Clock: std::fmt::Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Schedule of the external daily compression job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionSchedule {
    pub daily_local_time: NaiveTime,
    pub time_zone: Tz,
    pub prelude: Duration,
    pub cooldown: Duration,
}

impl TransitionSchedule {
    /// Instant at which the data of `date` is scheduled to be archived, which
    /// is the configured local time on the following day.
    ///
    /// A local time skipped by a daylight saving change is moved forward by
    /// one hour; a repeated local time resolves to its earlier instant.
    pub fn transition_instant(&self, date: NaiveDate) -> DateTime<Utc> {
        let Some(next_day) = date.succ_opt() else {
            return DateTime::<Utc>::MAX_UTC;
        };
        let local = next_day.and_time(self.daily_local_time);
        let resolved = match self.time_zone.from_local_datetime(&local) {
            LocalResult::Single(it) | LocalResult::Ambiguous(it, _) => Some(it),
            LocalResult::None => local
                .checked_add_signed(Duration::hours(1))
                .and_then(|it| self.time_zone.from_local_datetime(&it).earliest()),
        };
        match resolved {
            Some(it) => it.with_timezone(&Utc),
            // only reachable for zones with gaps longer than an hour
            None => local.and_utc(),
        }
    }
}

/// State of one fetch date as reported by [`TransitionPolicy::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionStatus {
    pub date: NaiveDate,
    pub transition_instant: DateTime<Utc>,
    pub still_transitional: bool,
    pub in_backoff_window: bool,
}

#[derive(Debug, Clone)]
pub struct TransitionPolicy {
    schedule: TransitionSchedule,
    clock: Arc<dyn Clock>,
}

impl TransitionPolicy {
    pub fn new(schedule: TransitionSchedule, clock: Arc<dyn Clock>) -> Self {
        Self { schedule, clock }
    }

    pub fn with_system_clock(schedule: TransitionSchedule) -> Self {
        Self::new(schedule, Arc::new(SystemClock))
    }

    pub fn transition_instant(&self, date: NaiveDate) -> DateTime<Utc> {
        self.schedule.transition_instant(date)
    }

    /// Data of `date` is still stored as single files.
    pub fn is_still_transitional(&self, date: NaiveDate) -> bool {
        self.clock.now() < self.transition_instant(date)
    }

    /// Data of `date` may currently be moved into its archive.
    pub fn is_in_backoff_window(&self, date: NaiveDate) -> bool {
        let instant = self.transition_instant(date);
        let start = instant
            .checked_sub_signed(self.schedule.prelude)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = instant
            .checked_add_signed(self.schedule.cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let now = self.clock.now();
        start <= now && now <= end
    }

    pub fn status(&self, date: NaiveDate) -> TransitionStatus {
        TransitionStatus {
            date,
            transition_instant: self.transition_instant(date),
            still_transitional: self.is_still_transitional(date),
            in_backoff_window: self.is_in_backoff_window(date),
        }
    }
}
