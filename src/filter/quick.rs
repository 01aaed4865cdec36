use crate::models::{GrantRecord, QuickFilter, Urgency, UrgencyLevel};
use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Default minimum amount, in euros, for the high-amount quick filter.
pub const DEFAULT_HIGH_AMOUNT_THRESHOLD: f64 = 600_000.0;
/// Default window, in days, for the recent quick filter.
pub const DEFAULT_RECENT_DAYS: i64 = 7;

const AMOUNT_PATTERN: &str = r"(?i)([0-9][0-9.,]*)\s*(%|millones|millón|millon|m€|mil\b|k€)?";

/// Cached regex for numeric tokens inside displayed amounts.
static AMOUNT_REGEX: OnceLock<Regex> = OnceLock::new();

/// Parses a number written with either `.` or `,` as thousands separator.
///
/// A trailing group of one or two digits after the last separator is the decimal part.
fn parse_number(token: &str) -> Option<f64> {
    let token = token.trim_end_matches(['.', ',']);
    let split = token.rfind(['.', ',']);
    let (integer, fraction) = match split {
        Some(pos) if (1..=2).contains(&(token.len() - pos - 1)) => {
            (&token[..pos], Some(&token[pos + 1..]))
        }
        _ => (token, None),
    };
    let digits: String = integer.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let value = match fraction {
        Some(fraction) => format!("{digits}.{fraction}"),
        None => digits,
    };
    value.parse().ok()
}

/// Extracts a euro amount from a displayed amount string.
///
/// Understands Spanish and English separators, `M€`/`millones` and `mil`/`k€`
/// multipliers, and skips percentages. Returns `None` when no monetary figure
/// is present ("Consultar convocatoria", "Hasta 50% del proyecto").
pub fn parse_amount(text: &str) -> Option<f64> {
    let regex = AMOUNT_REGEX.get_or_init(|| {
        Regex::new(AMOUNT_PATTERN).expect("AMOUNT_PATTERN is a valid regex pattern")
    });

    for captures in regex.captures_iter(text) {
        let suffix = captures
            .get(2)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();
        if suffix == "%" {
            continue;
        }
        let Some(value) = captures.get(1).and_then(|m| parse_number(m.as_str())) else {
            continue;
        };
        let multiplier = match suffix.as_str() {
            "millones" | "millón" | "millon" | "m€" => 1_000_000.0,
            "mil" | "k€" => 1_000.0,
            _ => 1.0,
        };
        return Some(value * multiplier);
    }
    None
}

/// Publication window check. Unparseable dates count as published today.
fn is_recent(record: &GrantRecord, today: NaiveDate, recent_days: i64) -> bool {
    let Some(raw) = record.publication_date.as_deref() else {
        return false;
    };
    let published = crate::models::parse_date(raw).unwrap_or(today);
    published > today - Duration::days(recent_days)
}

/// Quick-filter predicate.
pub fn quick_matches(
    record: &GrantRecord,
    quick: QuickFilter,
    today: NaiveDate,
    recent_days: i64,
    high_amount_threshold: f64,
) -> bool {
    match quick {
        QuickFilter::None | QuickFilter::Clear => true,
        QuickFilter::Urgent => record.urgency.is_urgent(),
        QuickFilter::HighAmount => record
            .amount
            .as_deref()
            .and_then(parse_amount)
            .is_some_and(|amount| amount >= high_amount_threshold),
        QuickFilter::Recent => is_recent(record, today, recent_days),
    }
}

/// Urgency dropdown predicate.
pub fn urgency_level_matches(urgency: Urgency, level: UrgencyLevel) -> bool {
    match level {
        UrgencyLevel::All => true,
        UrgencyLevel::Critical => urgency == Urgency::Critical,
        UrgencyLevel::High => urgency.is_urgent(),
        UrgencyLevel::Medium => urgency != Urgency::Low,
        UrgencyLevel::Active => urgency != Urgency::Expired,
    }
}

/// Source dropdown predicate: case-insensitive substring of the record source.
pub fn source_matches(record: &GrantRecord, source: Option<&str>) -> bool {
    match source {
        None => true,
        Some(wanted) => record
            .source
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains(&wanted.to_lowercase())),
    }
}
