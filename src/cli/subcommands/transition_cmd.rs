// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::io::Write;

use chrono::NaiveDate;

use crate::cli_shared::cli::Config;
use crate::storage::TransitionPolicy;

#[derive(Debug, clap::Args)]
pub struct TransitionCommand {
    /// Fetch date (`YYYY-MM-DD`, UTC)
    date: NaiveDate,
}

impl TransitionCommand {
    pub fn run<W: Write>(self, config: &Config, sink: &mut W) -> anyhow::Result<()> {
        let policy = TransitionPolicy::with_system_clock(config.storage.transition_schedule());
        print_status(&policy, self.date, sink)
    }
}

fn print_status<W: Write>(
    policy: &TransitionPolicy,
    date: NaiveDate,
    sink: &mut W,
) -> anyhow::Result<()> {
    let status = policy.status(date);
    writeln!(sink, "Fetch date:          {}", status.date)?;
    writeln!(sink, "Transition instant:  {}", status.transition_instant)?;
    writeln!(sink, "Still transitional:  {}", status.still_transitional)?;
    writeln!(sink, "In back-off window:  {}", status.in_backoff_window)?;
    Ok(())
}
