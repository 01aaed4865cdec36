//! Client-side filtering of a grant result list.
//!
//! Visibility is the conjunction of independent predicates: country, region,
//! quick filter, urgency level, source and free-text query. The entry point is
//! [`FilterEvaluator::visible`]; [`FilterSession`] wraps it with the form rules.

mod evaluator;
pub mod keywords;
mod location;
mod quick;
mod search;
mod sort;

// Re-export public API
pub use evaluator::{FilterEvaluator, FilterSession, Visibility};
pub use location::{
    country_matches, is_european_location, is_international_location, is_spanish_location,
    matches_region, region_matches,
};
pub use quick::{
    parse_amount, quick_matches, source_matches, urgency_level_matches,
    DEFAULT_HIGH_AMOUNT_THRESHOLD, DEFAULT_RECENT_DAYS,
};
pub use search::query_matches;
pub use sort::sort_records;
