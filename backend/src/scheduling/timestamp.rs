//! Timestamp normalization for shift times.
//!
//! Callers send times either as RFC 3339 (with `Z` or a numeric offset, with
//! or without fractional seconds) or as a bare local datetime. Bare datetimes
//! are taken to already be UTC: their wall-clock digits are kept exactly as
//! sent and the server's own zone never enters the picture. Display in the
//! user's zone is the frontend's job.

use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime, UtcOffset,
};

use super::error::ShiftError;

/// Parses `input` into a UTC instant, trying layouts in this order:
///
/// 1. RFC 3339 (`2024-03-01T09:00:00Z`, `2024-03-01T09:00:00.5+10:30`)
/// 2. `YYYY-MM-DDTHH:MM:SS.fff`
/// 3. `YYYY-MM-DD HH:MM:SS.fff`
/// 4. `YYYY-MM-DDTHH:MM:SS`
/// 5. `YYYY-MM-DD HH:MM:SS`
/// 6. `YYYY-MM-DDTHH:MM`
/// 7. `YYYY-MM-DD HH:MM`
///
/// `field` only labels the error.
pub fn parse_timestamp(field: &'static str, input: &str) -> Result<OffsetDateTime, ShiftError> {
    let trimmed = input.trim();
    let invalid = || ShiftError::InvalidTimeFormat {
        field,
        value: input.to_string(),
    };

    if let Ok(t) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        // An offset can push the instant past the representable year range.
        return t.checked_to_offset(UtcOffset::UTC).ok_or_else(invalid);
    }

    let local_layouts = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];

    local_layouts
        .iter()
        .find_map(|layout| PrimitiveDateTime::parse(trimmed, *layout).ok())
        .map(PrimitiveDateTime::assume_utc)
        .ok_or_else(invalid)
}

/// Parses an optional field; `None` stays `None`, bad text is still an error.
pub fn parse_optional(
    field: &'static str,
    input: Option<&str>,
) -> Result<Option<OffsetDateTime>, ShiftError> {
    input.map(|s| parse_timestamp(field, s)).transpose()
}
