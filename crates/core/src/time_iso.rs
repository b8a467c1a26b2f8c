// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ISO-8601 timestamp helpers shared across the Store, flow, and engine
//! crates. All persisted timestamps are naive local-time ISO strings,
//! matching the `datetime.now().isoformat()` format used by earlier
//! tooling in this fleet.

use chrono::{Duration, Local, NaiveDateTime};

/// Current local time formatted the same way `datetime.now().isoformat()` does.
pub fn now_iso() -> String {
    Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// `now - seconds` formatted the same way [`now_iso`] is, for building the
/// `older_than_iso` cutoffs purge/staleness operations compare against.
pub fn iso_minus_seconds(seconds: i64) -> String {
    (Local::now().naive_local() - Duration::seconds(seconds))
        .format("%Y-%m-%dT%H:%M:%S%.f")
        .to_string()
}

#[derive(Debug, thiserror::Error)]
#[error("malformed timestamp {0:?}")]
pub struct TimestampError(pub String);

pub fn parse_iso(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| TimestampError(raw.to_string()))
}

/// Seconds elapsed between `raw` (an ISO timestamp) and now. Returns `None`
/// if `raw` cannot be parsed, mirroring callers logging a corruption warning
/// and treating the field as absent rather than aborting.
pub fn seconds_since(raw: &str) -> Option<i64> {
    let parsed = parse_iso(raw).ok()?;
    Some((Local::now().naive_local() - parsed).num_seconds())
}

#[cfg(test)]
#[path = "time_iso_tests.rs"]
mod tests;
