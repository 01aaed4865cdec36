use crate::models::{GrantRecord, SortKey};
use std::cmp::Ordering;

/// Orders `Some` before `None`, comparing present values with `cmp`.
fn present_first<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorts records in place. The sort is stable; records with unusable dates go last.
pub fn sort_records(records: &mut [GrantRecord], key: SortKey) {
    match key {
        SortKey::None => {}
        SortKey::Deadline => records.sort_by(|a, b| {
            present_first(a.deadline_date(), b.deadline_date(), |a, b| a.cmp(b))
        }),
        SortKey::Publication => records.sort_by(|a, b| {
            present_first(a.publication(), b.publication(), |a, b| b.cmp(a))
        }),
        SortKey::Alphabetical => {
            records.sort_by_cached_key(|record| record.title.to_lowercase());
        }
    }
}
