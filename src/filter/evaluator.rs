use super::location::{country_matches, region_matches};
use super::quick::{
    quick_matches, source_matches, urgency_level_matches, DEFAULT_HIGH_AMOUNT_THRESHOLD,
    DEFAULT_RECENT_DAYS,
};
use super::search::query_matches;
use crate::config::ResolvedConfig;
use crate::models::{Country, FilterState, GrantRecord, QuickFilter, UrgencyLevel};
use chrono::NaiveDate;
use tracing::debug;

/// Pure visibility evaluator.
///
/// Holds the reference date and thresholds; everything else comes from the
/// `FilterState` passed to each call, so identical inputs always give identical
/// outputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterEvaluator {
    today: NaiveDate,
    recent_days: i64,
    high_amount_threshold: f64,
}

impl FilterEvaluator {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            recent_days: DEFAULT_RECENT_DAYS,
            high_amount_threshold: DEFAULT_HIGH_AMOUNT_THRESHOLD,
        }
    }

    pub fn from_config(today: NaiveDate, config: &ResolvedConfig) -> Self {
        Self::new(today)
            .with_recent_days(config.recent_days)
            .with_high_amount_threshold(config.high_amount_threshold)
    }

    pub fn with_recent_days(mut self, days: i64) -> Self {
        self.recent_days = days;
        self
    }

    pub fn with_high_amount_threshold(mut self, threshold: f64) -> Self {
        self.high_amount_threshold = threshold;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Returns whether a record passes every predicate of the state.
    pub fn visible(&self, record: &GrantRecord, state: &FilterState) -> bool {
        country_matches(record, state.country)
            && region_matches(record, state.effective_region())
            && quick_matches(
                record,
                state.quick,
                self.today,
                self.recent_days,
                self.high_amount_threshold,
            )
            && urgency_level_matches(record.urgency, state.urgency)
            && source_matches(record, state.source.as_deref())
            && query_matches(record, &state.query)
    }

    /// Evaluates every record against the state.
    pub fn evaluate(&self, records: &[GrantRecord], state: &FilterState) -> Visibility {
        let flags: Vec<bool> = records.iter().map(|r| self.visible(r, state)).collect();
        let visibility = Visibility { flags };
        debug!(
            shown = visibility.shown(),
            total = visibility.total(),
            country = state.country.display_name(),
            "Filters evaluated"
        );
        visibility
    }
}

/// Per-record visibility flags, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
    flags: Vec<bool>,
}

impl Visibility {
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    pub fn shown(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    pub fn total(&self) -> usize {
        self.flags.len()
    }

    /// Records whose flag is set, in input order.
    pub fn select<'a>(&self, records: &'a [GrantRecord]) -> Vec<&'a GrantRecord> {
        records
            .iter()
            .zip(&self.flags)
            .filter_map(|(record, &shown)| shown.then_some(record))
            .collect()
    }

    /// Text of the results counter.
    pub fn counter_text(&self, state: &FilterState) -> String {
        format!(
            "Mostrando {} de {} subvenciones · Filtrado por: {}",
            self.shown(),
            self.total(),
            state.location_label()
        )
    }
}

/// Filter selection as driven by a form: explicit state plus the rules tying the
/// controls together.
#[derive(Debug, Clone)]
pub struct FilterSession {
    evaluator: FilterEvaluator,
    state: FilterState,
}

impl FilterSession {
    pub fn new(evaluator: FilterEvaluator) -> Self {
        Self {
            evaluator,
            state: FilterState::default(),
        }
    }

    pub fn with_state(evaluator: FilterEvaluator, state: FilterState) -> Self {
        let country = state.country;
        let mut session = Self { evaluator, state };
        session.set_country(country);
        session
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Changing away from Spain resets the region selection.
    pub fn set_country(&mut self, country: Country) {
        self.state.country = country;
        if country != Country::Spain {
            self.state.region = None;
        }
    }

    pub fn set_region(&mut self, region: &str) {
        self.state = std::mem::take(&mut self.state).with_region(region);
    }

    pub fn set_query(&mut self, query: &str) {
        self.state.query = query.to_string();
    }

    pub fn set_quick(&mut self, quick: QuickFilter) {
        self.state.quick = quick;
    }

    pub fn set_urgency(&mut self, urgency: UrgencyLevel) {
        self.state.urgency = urgency;
    }

    pub fn set_source(&mut self, source: &str) {
        self.state = std::mem::take(&mut self.state).with_source(source);
    }

    /// Evaluates the current state. A `Clear` quick filter is consumed: it
    /// evaluates as no quick filter and is reset afterwards.
    pub fn apply(&mut self, records: &[GrantRecord]) -> Visibility {
        let visibility = self.evaluator.evaluate(records, &self.state);
        if self.state.quick == QuickFilter::Clear {
            self.state.quick = QuickFilter::None;
        }
        visibility
    }
}
