use super::keywords::normalize;
use crate::models::GrantRecord;

/// Free-text predicate: case- and accent-insensitive substring of the record's
/// visible text. A blank query matches everything.
pub fn query_matches(record: &GrantRecord, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    normalize(&record.searchable_text()).contains(&normalize(query))
}
