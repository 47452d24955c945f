// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS Center Time Stamp decoding.
//!
//! Carriers stamp messages with `YYMMDDhhmmss`. Some gateways drop trailing
//! zeros, so short codes are right-padded with `0` and long ones truncated
//! to 12 digits before decoding.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

/// Width of a complete SCTS code.
pub const SCTS_DIGITS: usize = 12;

/// Pad or truncate the leading digit run of `raw` to exactly 12 digits.
///
/// Returns `None` when `raw` does not start with a digit.
pub fn canonical_code(raw: &str) -> Option<String> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .take(SCTS_DIGITS)
        .collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!("{digits:0<width$}", width = SCTS_DIGITS))
}

/// Decode an SCTS code interpreted in the carrier's `offset`.
///
/// Returns `None` for codes that do not describe a real calendar instant.
pub fn decode(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let code = canonical_code(raw)?;
    let field = |range: std::ops::Range<usize>| code[range].parse::<u32>().ok();

    let year = 2000 + i32::try_from(field(0..2)?).ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(2..4)?, field(4..6)?)?;
    let naive = date.and_hms_opt(field(6..8)?, field(8..10)?, field(10..12)?)?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
