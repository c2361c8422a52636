// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp helpers.
//!
//! All persisted timestamps use millisecond-precision UTC RFC 3339 text
//! (`2026-01-01T00:00:00.000Z`), so lexicographic ordering in SQLite is
//! chronological ordering.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::SwitchboardError;

/// Current time in the canonical storage format.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format an arbitrary instant in the canonical storage format.
pub fn to_rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp back into a `DateTime<Utc>`.
pub fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, SwitchboardError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SwitchboardError::Internal(format!("malformed timestamp {value:?}: {e}")))
}

/// Whole milliseconds elapsed between two stored timestamps, floored at 0.
pub fn elapsed_ms(from: &str, to: DateTime<Utc>) -> Result<i64, SwitchboardError> {
    let start = parse_rfc3339(from)?;
    Ok(to.signed_duration_since(start).num_milliseconds().max(0))
}
