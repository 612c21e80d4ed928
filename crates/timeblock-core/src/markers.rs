//! Duration inference from free task text.
//!
//! Tasks carry their duration estimate embedded in the title or notes as a
//! free-floating hour/minute token (`1h20m`, `2h`, `45m`, case-insensitive).
//! The older bracketed form (`[45m]`) is still accepted on input and, when
//! present, wins over free-floating tokens: an explicit marker is stronger
//! evidence than prose.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fallback duration used when scheduling a task whose estimate is unknown.
pub const DEFAULT_DURATION_MIN: u32 = 15;

static BRACKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\s*(\d{1,4})\s*m\s*\]").expect("valid bracket marker regex"));

// Groups: 1 = hours, 2 = minutes following hours, 3 = minutes alone.
// Boundary conditions (not preceded by a digit, not followed by an
// alphanumeric) are checked separately since `regex` has no lookarounds.
static FLOATING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,3})\s*h(?:\s*(\d{1,4})\s*m)?|(\d{1,4})\s*m")
        .expect("valid duration token regex")
});

/// Extract a duration in minutes from task title and notes.
///
/// Returns the first contributing match, or `default` when no token is found.
/// A match contributes only when at least one of hours/minutes is present and
/// the computed total is strictly positive. Malformed captures are
/// non-matches, never errors.
pub fn infer_duration(title: &str, notes: Option<&str>, default: Option<u32>) -> Option<u32> {
    let text = match notes {
        Some(notes) => format!("{title} {notes}"),
        None => title.to_string(),
    };

    if let Some(caps) = BRACKET_RE.captures(&text) {
        if let Some(minutes) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
            if minutes > 0 {
                return Some(minutes);
            }
        }
    }

    let bytes = text.as_bytes();
    for caps in FLOATING_RE.captures_iter(&text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        // Reject tokens glued to surrounding digits or letters, so that
        // `45min`, `1h20min` and the tail of a longer number never match.
        if whole.start() > 0 && bytes[whole.start() - 1].is_ascii_digit() {
            continue;
        }
        if whole.end() < bytes.len() && bytes[whole.end()].is_ascii_alphanumeric() {
            continue;
        }

        let hours = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        let minutes = caps
            .get(2)
            .or_else(|| caps.get(3))
            .and_then(|m| m.as_str().parse::<u32>().ok());
        if hours.is_none() && minutes.is_none() {
            continue;
        }

        let total = hours.unwrap_or(0).saturating_mul(60) + minutes.unwrap_or(0);
        if total > 0 {
            return Some(total);
        }
    }

    default
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hour_minute_pair() {
        assert_eq!(infer_duration("Write report 1h20m", None, None), Some(80));
        assert_eq!(infer_duration("WRITE REPORT 1H20M", None, None), Some(80));
    }

    #[test]
    fn minutes_only() {
        assert_eq!(infer_duration("Quick fix 45m", None, None), Some(45));
    }

    #[test]
    fn hours_only() {
        assert_eq!(infer_duration("Deep work 2h", None, None), Some(120));
    }

    #[test]
    fn token_in_notes() {
        assert_eq!(
            infer_duration("Review PR", Some("should take 30m"), None),
            Some(30)
        );
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(infer_duration("Sprint 25m then 50m", None, None), Some(25));
    }

    #[test]
    fn no_token_returns_default() {
        assert_eq!(infer_duration("Call dentist", None, Some(15)), Some(15));
        assert_eq!(infer_duration("Call dentist", Some("urgent"), None), None);
    }

    #[test]
    fn glued_tokens_do_not_match() {
        assert_eq!(infer_duration("wait 45min", None, None), None);
        assert_eq!(infer_duration("wait 1h20min", None, None), None);
        assert_eq!(infer_duration("room 2045m ref", None, Some(10)), Some(2045));
        assert_eq!(infer_duration("id 120450m x", None, Some(10)), Some(10));
    }

    #[test]
    fn zero_total_does_not_contribute() {
        assert_eq!(infer_duration("reset 0m counter", None, Some(15)), Some(15));
        assert_eq!(infer_duration("0h0m placeholder", None, None), None);
    }

    #[test]
    fn bracket_marker_wins_over_floating_token() {
        assert_eq!(infer_duration("[45m] errands for 2h", None, None), Some(45));
        assert_eq!(infer_duration("[ 90 m ] spring cleaning", None, None), Some(90));
    }

    #[test]
    fn empty_bracket_falls_back_to_floating() {
        assert_eq!(infer_duration("[0m] backlog 30m", None, None), Some(30));
    }

    proptest! {
        #[test]
        fn inferred_duration_is_never_zero(title in ".{0,60}", notes in ".{0,60}") {
            if let Some(minutes) = infer_duration(&title, Some(&notes), None) {
                prop_assert!(minutes > 0);
            }
        }

        #[test]
        fn tokenless_text_returns_default(words in "[ a-z.]{0,60}", default in proptest::option::of(1u32..600)) {
            prop_assert_eq!(infer_duration(&words, None, default), default);
        }
    }
}
