//! Shared query parsing helpers for API handlers.
//!
//! Timestamps arrive as raw strings so parse errors become 400s with a
//! useful message instead of axum's generic query rejection.

use pulseboard_core::types::Timestamp;

use crate::error::{AppError, AppResult};

/// Parse an optional RFC 3339 timestamp. Empty strings count as absent.
pub fn parse_timestamp(raw: Option<&str>, field: &str) -> AppResult<Option<Timestamp>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<Timestamp>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid '{field}' timestamp: {v}"))),
    }
}

/// Parse a `from`/`to` pair, rejecting inverted ranges.
pub fn parse_range(
    from: Option<&str>,
    to: Option<&str>,
) -> AppResult<(Option<Timestamp>, Option<Timestamp>)> {
    let from = parse_timestamp(from, "from")?;
    let to = parse_timestamp(to, "to")?;
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(AppError::BadRequest("'from' must not be after 'to'".into()));
        }
    }
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_missing_are_none() {
        assert_eq!(parse_timestamp(None, "from").unwrap(), None);
        assert_eq!(parse_timestamp(Some("  "), "from").unwrap(), None);
    }

    #[test]
    fn test_rfc3339_parses() {
        let ts = parse_timestamp(Some("2026-03-01T12:00:00Z"), "from")
            .unwrap()
            .unwrap();
        assert_eq!(ts.timestamp(), 1_772_366_400);
    }

    #[test]
    fn test_garbage_is_bad_request() {
        let err = parse_timestamp(Some("yesterday"), "to").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("'to'")));
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(parse_range(Some("2026-03-02T00:00:00Z"), Some("2026-03-01T00:00:00Z")).is_err());
        assert!(parse_range(Some("2026-03-01T00:00:00Z"), None).is_ok());
    }
}
