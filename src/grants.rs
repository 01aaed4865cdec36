//! Post-processing of raw grant lists: deadline urgency, deduplication,
//! ordering and search statistics.

use crate::models::{GrantRecord, Urgency};
use crate::utils::round_two_decimals;
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;

/// Cached regex for stripping non-word characters from titles.
static NON_WORD_REGEX: OnceLock<Regex> = OnceLock::new();

/// Summary shown above a result list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    pub total_results: usize,
    /// Grants with at least one day left
    pub active_grants: usize,
    /// Critical or high urgency grants
    pub urgent_grants: usize,
    pub search_time_secs: f64,
}

/// Days left until the deadline, clamped at zero.
///
/// Returns `None` when the record has no deadline in `YYYY-MM-DD` form.
pub fn days_remaining(record: &GrantRecord, today: NaiveDate) -> Option<i64> {
    record
        .deadline_date()
        .map(|deadline| (deadline - today).num_days().max(0))
}

/// Maps a deadline to an urgency tag: ≤7 days critical, ≤30 high, ≤60 medium,
/// otherwise low. Past deadlines are expired; unusable ones unknown.
pub fn classify_urgency(deadline: Option<NaiveDate>, today: NaiveDate) -> Urgency {
    let Some(deadline) = deadline else {
        return Urgency::Unknown;
    };
    match (deadline - today).num_days() {
        days if days < 0 => Urgency::Expired,
        0..=7 => Urgency::Critical,
        8..=30 => Urgency::High,
        31..=60 => Urgency::Medium,
        _ => Urgency::Low,
    }
}

/// Fills `days_remaining` and `urgency` on every record and computes the stats.
///
/// Urgency is re-derived only from a parseable deadline; otherwise the loaded tag is kept.
///
/// `started` is the moment the search began; the elapsed time is reported in the stats.
pub fn process_grants(
    mut records: Vec<GrantRecord>,
    today: NaiveDate,
    started: Option<Instant>,
) -> (Vec<GrantRecord>, SearchStats) {
    for record in records.iter_mut() {
        record.days_remaining = days_remaining(record, today);
        if let Some(deadline) = record.deadline_date() {
            record.urgency = classify_urgency(Some(deadline), today);
        }
    }

    let stats = SearchStats {
        total_results: records.len(),
        active_grants: records
            .iter()
            .filter(|r| r.days_remaining.unwrap_or(0) > 0)
            .count(),
        urgent_grants: records.iter().filter(|r| r.urgency.is_urgent()).count(),
        search_time_secs: started
            .map(|s| round_two_decimals(s.elapsed().as_secs_f64()))
            .unwrap_or(0.0),
    };

    (records, stats)
}

/// Identity used for deduplication: source plus identifier, or source plus the
/// normalised title when the identifier is missing or too short to be meaningful.
pub fn dedup_key(record: &GrantRecord) -> String {
    let source = record.source.as_deref().unwrap_or("NO_SOURCE");
    match record.identifier.as_deref() {
        Some(id) if id.chars().count() > 3 => format!("{source}_{id}"),
        _ => {
            let regex = NON_WORD_REGEX.get_or_init(|| {
                Regex::new(r"\W+").expect("non-word pattern is a valid regex")
            });
            let title = regex.replace_all(&record.title.to_lowercase(), "").into_owned();
            format!("{source}_{title}")
        }
    }
}

/// Removes duplicates, orders by publication date (newest first) and keeps at most
/// `max_results` records. Unusable publication dates sort as 1900-01-01.
pub fn dedupe_and_rank(records: Vec<GrantRecord>, max_results: usize) -> Vec<GrantRecord> {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    let mut unique: Vec<GrantRecord> = records
        .into_iter()
        .filter(|record| seen.insert(dedup_key(record)))
        .collect();

    let floor = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
    unique.sort_by_key(|record| std::cmp::Reverse(record.publication().unwrap_or(floor)));
    unique.truncate(max_results);

    info!(
        received = before,
        kept = unique.len(),
        "Deduplicated and ranked grants"
    );
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn with_deadline(deadline: &str) -> GrantRecord {
        let mut record = GrantRecord::new("Ayuda");
        record.deadline = Some(deadline.to_string());
        record
    }

    #[test]
    fn urgency_thresholds() {
        let at = |days: i64| Some(today() + chrono::Duration::days(days));
        assert_eq!(classify_urgency(at(0), today()), Urgency::Critical);
        assert_eq!(classify_urgency(at(7), today()), Urgency::Critical);
        assert_eq!(classify_urgency(at(8), today()), Urgency::High);
        assert_eq!(classify_urgency(at(30), today()), Urgency::High);
        assert_eq!(classify_urgency(at(60), today()), Urgency::Medium);
        assert_eq!(classify_urgency(at(61), today()), Urgency::Low);
        assert_eq!(classify_urgency(at(-1), today()), Urgency::Expired);
        assert_eq!(classify_urgency(None, today()), Urgency::Unknown);
    }

    #[test]
    fn days_remaining_is_clamped() {
        assert_eq!(days_remaining(&with_deadline("2024-06-11"), today()), Some(10));
        assert_eq!(days_remaining(&with_deadline("2024-05-01"), today()), Some(0));
        assert_eq!(days_remaining(&with_deadline("mañana"), today()), None);
    }

    #[test]
    fn process_grants_fills_fields_and_stats() {
        let records = vec![
            with_deadline("2024-06-03"),
            with_deadline("2024-06-20"),
            with_deadline("2024-12-01"),
            with_deadline("2024-01-01"),
        ];
        let (processed, stats) = process_grants(records, today(), None);
        assert_eq!(processed[0].urgency, Urgency::Critical);
        assert_eq!(processed[1].urgency, Urgency::High);
        assert_eq!(processed[2].urgency, Urgency::Low);
        assert_eq!(processed[3].urgency, Urgency::Expired);
        assert_eq!(stats.total_results, 4);
        assert_eq!(stats.active_grants, 3);
        assert_eq!(stats.urgent_grants, 2);
        assert_eq!(stats.search_time_secs, 0.0);
    }

    #[test]
    fn process_grants_keeps_loaded_urgency_without_deadline() {
        let mut tagged = GrantRecord::new("Ayuda etiquetada");
        tagged.urgency = Urgency::Critical;
        let mut overdue = with_deadline("2024-01-01");
        overdue.urgency = Urgency::Critical;

        let (processed, stats) = process_grants(vec![tagged, overdue], today(), None);
        assert_eq!(processed[0].urgency, Urgency::Critical);
        assert_eq!(processed[0].days_remaining, None);
        assert_eq!(processed[1].urgency, Urgency::Expired);
        assert_eq!(stats.urgent_grants, 1);
    }

    #[test]
    fn dedup_key_prefers_identifier() {
        let mut record = GrantRecord::new("Programa NEOTEC 2024");
        record.source = Some("CDTI".to_string());
        record.identifier = Some("CDTI_neotec".to_string());
        assert_eq!(dedup_key(&record), "CDTI_CDTI_neotec");

        record.identifier = Some("id".to_string());
        assert_eq!(dedup_key(&record), "CDTI_programaneotec2024");
    }

    #[test]
    fn dedupe_and_rank_orders_and_limits() {
        let make = |title: &str, date: &str| {
            let mut record = GrantRecord::new(title);
            record.source = Some("BOE".to_string());
            record.publication_date = Some(date.to_string());
            record
        };
        let records = vec![
            make("Antigua", "2024-01-10"),
            make("Nueva", "2024-05-10"),
            make("Nueva", "2024-05-10"),
            make("Sin fecha", "???"),
            make("Media", "2024-03-10"),
        ];
        let ranked = dedupe_and_rank(records, 3);
        let titles: Vec<_> = ranked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Nueva", "Media", "Antigua"]);
    }
}
