use crate::constants::{DATE_FORMAT, DISPLAY_DATE_FORMAT};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Cached regex for the first number-like token of an amount.
static NUMBER_TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

pub fn mb_from_bytes(bytes: u64) -> f64 {
    bytes as f64 / 1_048_576.0
}

pub fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    grouped
}

/// Rewrites the first number of an amount with space-separated thousands.
///
/// Commas are read as thousands separators; a number with a decimal point gets
/// two decimals. Anything that does not parse is returned unchanged, including
/// Spanish-style `1.500.000`.
pub fn format_amount(amount: &str) -> String {
    let regex = NUMBER_TOKEN_REGEX
        .get_or_init(|| Regex::new(r"[0-9.,]+").expect("number token pattern is a valid regex"));
    let Some(token) = regex.find(amount) else {
        return amount.to_string();
    };
    let number = token.as_str().replace(',', "");

    let formatted = if number.contains('.') {
        match number.parse::<f64>() {
            Ok(value) => {
                let fixed = format!("{value:.2}");
                let (integer, fraction) = fixed.split_once('.').unwrap_or((&fixed, "00"));
                format!("{}.{fraction}", group_thousands(integer))
            }
            Err(_) => return amount.to_string(),
        }
    } else {
        match number.parse::<u64>() {
            Ok(value) => group_thousands(&value.to_string()),
            Err(_) => return amount.to_string(),
        }
    };

    amount.replacen(token.as_str(), &formatted, 1)
}

/// Truncates to `length` characters, preferring to cut at the last space when it
/// falls in the final fifth of the allowed length. Appends `...` when cut.
pub fn truncate_smart(text: &str, length: usize) -> String {
    if text.chars().count() <= length {
        return text.to_string();
    }
    let truncated: String = text.chars().take(length).collect();
    match truncated.rfind(' ') {
        Some(space) if truncated[..space].chars().count() as f64 > length as f64 * 0.8 => {
            format!("{}...", &truncated[..space])
        }
        _ => format!("{truncated}..."),
    }
}

/// `YYYY-MM-DD` to `DD/MM/YYYY`; other inputs are returned unchanged.
pub fn format_date(date: &str) -> String {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|_| date.to_string())
}
