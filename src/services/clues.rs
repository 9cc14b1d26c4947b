//! Pure game policies: timestamp handling, disclosure tiers, attempt warnings,
//! and cleanup of model output.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::error::AppError;

/// How much a suspect lets slip, driven by elapsed game time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisclosureTier {
    Subtle,
    Moderate,
    Explicit,
}

impl DisclosureTier {
    pub fn from_elapsed_minutes(elapsed: f64) -> Self {
        if elapsed < 10.0 {
            DisclosureTier::Subtle
        } else if elapsed < 40.0 {
            DisclosureTier::Moderate
        } else {
            DisclosureTier::Explicit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisclosureTier::Subtle => "subtle clues",
            DisclosureTier::Moderate => "moderate clues",
            DisclosureTier::Explicit => "very explicit clues",
        }
    }
}

impl fmt::Display for DisclosureTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum Timestamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(Timestamp::Aware(dt));
    }
    for format in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(Timestamp::Aware(dt));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Timestamp::Naive(dt));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(Timestamp::Naive)
}

/// Minutes between two ISO-8601 timestamps. Both must carry an offset or
/// neither must.
pub fn elapsed_minutes(start_time: &str, current_time: &str) -> Result<f64, AppError> {
    let invalid = || AppError::BadRequest("start_time/current_time must be ISO 8601".to_string());

    let start = parse_timestamp(start_time).ok_or_else(invalid)?;
    let now = parse_timestamp(current_time).ok_or_else(invalid)?;
    let delta = match (start, now) {
        (Timestamp::Aware(a), Timestamp::Aware(b)) => b - a,
        (Timestamp::Naive(a), Timestamp::Naive(b)) => b - a,
        _ => return Err(invalid()),
    };
    Ok(delta.num_milliseconds() as f64 / 60_000.0)
}

/// Low-attempts warning. The band is `max(1, floor(0.2 * (remaining + 1)))`.
pub fn attempts_warning(remaining: i64) -> Option<String> {
    let threshold = (remaining.saturating_add(1) / 5).max(1);
    (remaining <= threshold)
        .then(|| format!("Careful! You only have {remaining} attempts left."))
}

/// Removes a surrounding Markdown code fence from model output.
///
/// When the trimmed text opens with a fence, the first and last lines are
/// dropped. Anything else comes back trimmed.
pub fn strip_code_fence(raw: &str) -> String {
    let clean = raw.trim();
    if !clean.starts_with("```") {
        return clean.to_string();
    }
    let lines: Vec<&str> = clean.lines().collect();
    if lines.len() < 2 {
        return String::new();
    }
    lines[1..lines.len() - 1].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn tier_boundaries_are_exact() {
        assert_eq!(DisclosureTier::from_elapsed_minutes(-3.0), DisclosureTier::Subtle);
        assert_eq!(DisclosureTier::from_elapsed_minutes(9.99), DisclosureTier::Subtle);
        assert_eq!(DisclosureTier::from_elapsed_minutes(10.0), DisclosureTier::Moderate);
        assert_eq!(DisclosureTier::from_elapsed_minutes(39.99), DisclosureTier::Moderate);
        assert_eq!(DisclosureTier::from_elapsed_minutes(40.0), DisclosureTier::Explicit);
        assert_eq!(DisclosureTier::Explicit.to_string(), "very explicit clues");
    }

    #[test]
    fn warning_band() {
        assert!(attempts_warning(0).is_some());
        assert_eq!(
            attempts_warning(1).as_deref(),
            Some("Careful! You only have 1 attempts left.")
        );
        assert!(attempts_warning(4).is_none());
        assert!(attempts_warning(5).is_none());
        assert!(attempts_warning(6).is_none());
        assert!(attempts_warning(-2).is_some());
        assert!(attempts_warning(i64::MAX).is_none());
        assert!(attempts_warning(i64::MIN).is_some());
    }

    #[test]
    fn elapsed_minutes_for_naive_and_offset_timestamps() {
        let naive = elapsed_minutes("2025-03-01T10:00:00", "2025-03-01T10:05:30").unwrap();
        assert!((naive - 5.5).abs() < 1e-9);

        let aware =
            elapsed_minutes("2025-03-01T10:00:00.000Z", "2025-03-01T12:40:00+02:00").unwrap();
        assert!((aware - 40.0).abs() < 1e-9);

        let micro = elapsed_minutes("2025-03-01 10:00:00.123456", "2025-03-01T10:10").unwrap();
        assert!(micro > 9.99 && micro < 10.0);

        let date_only = elapsed_minutes("2025-03-01", "2025-03-01T01:00:00").unwrap();
        assert!((date_only - 60.0).abs() < 1e-9);

        // The stamped form always carries six digits; the shorter form parses the same.
        let stamped =
            elapsed_minutes("2025-03-01T10:00:00.000000", "2025-03-01T10:40:00").unwrap();
        let short = elapsed_minutes("2025-03-01T10:00:00", "2025-03-01T10:40:00").unwrap();
        assert_eq!(stamped, short);
        assert!((stamped - 40.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_timestamps_are_bad_requests() {
        for (start, now) in [
            ("not-a-date", "2025-03-01T10:00:00"),
            ("2025-03-01T10:00:00", ""),
            ("2025-03-01T10:00:00Z", "2025-03-01T10:00:00"),
        ] {
            let err = elapsed_minutes(start, now).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("ISO 8601")));
        }
    }

    #[test]
    fn fence_stripping_is_idempotent() {
        let clean = r#"{"a": 1}"#;
        assert_eq!(strip_code_fence(clean), clean);
        assert_eq!(strip_code_fence(&strip_code_fence(clean)), clean);

        let fenced = "```json\n{\"a\": 1}\n```";
        let stripped = strip_code_fence(fenced);
        let left: Value = serde_json::from_str(&stripped).unwrap();
        let right: Value = serde_json::from_str(clean).unwrap();
        assert_eq!(left, right);
        assert_eq!(strip_code_fence(&stripped), stripped);
    }

    #[test]
    fn fence_edge_cases() {
        assert_eq!(strip_code_fence("   "), "");
        assert_eq!(strip_code_fence("```"), "");
        assert_eq!(strip_code_fence("\n```\n[1,\n2]\n```\n"), "[1,\n2]");
    }
}
