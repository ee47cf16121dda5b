// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset, NaiveDate};
use scraper::Html;

/// Format a duration in milliseconds as `M:SS` or `H:MM:SS`
///
/// Hours are only shown when the duration reaches one hour and are never
/// padded. Sub-second remainders are truncated.
pub fn format_duration(milliseconds: u64) -> String {
    let total_seconds = milliseconds / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Format an ISO-8601 timestamp as a long date, e.g. `January 5, 2024`
///
/// The date is taken in the timestamp's own offset. Input that cannot be
/// parsed is returned unchanged.
pub fn format_date(iso: &str) -> String {
    match parse_timestamp(iso) {
        Some(dt) => dt.format("%B %-d, %Y").to_string(),
        None => iso.to_string(),
    }
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date
///
/// Plain dates are taken as midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Turn an HTML-bearing description into plain text
///
/// The text is parsed as an HTML fragment, so entities are decoded and a
/// bare `<` that opens no tag stays part of the text.
pub fn strip_html(text: &str) -> String {
    Html::parse_fragment(text)
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}
