//! Retrieval of grants from the official sources.
//!
//! [`GrantSearch`] queries every source concurrently, merges the results through
//! [`dedupe_and_rank`](crate::grants::dedupe_and_rank) and caches them per
//! criteria for a configurable time.

pub mod boe;
pub mod cdti;
mod http;

pub use boe::BoeSource;
pub use cdti::CdtiSource;
pub use http::HttpFetcher;

use crate::config::ResolvedConfig;
use crate::errors::AppResult;
use crate::grants::dedupe_and_rank;
use crate::models::{GrantRecord, SearchCriteria};
use chrono::NaiveDate;
use indicatif::MultiProgress;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct CachedResults {
    grants: Vec<GrantRecord>,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct GrantSearch {
    boe: BoeSource,
    cdti: CdtiSource,
    max_results: usize,
    ttl: Duration,
    cache: HashMap<String, CachedResults>,
}

impl GrantSearch {
    pub fn from_config(config: &ResolvedConfig) -> AppResult<Self> {
        let fetcher = HttpFetcher::from_config(config)?;
        // Both crawls run at once; their bars share one display.
        let progress = MultiProgress::new();
        Ok(Self {
            boe: BoeSource::new(fetcher.clone(), config, progress.clone()),
            cdti: CdtiSource::new(fetcher, config, progress),
            max_results: config.max_results,
            ttl: Duration::from_secs(config.cache_ttl_secs),
            cache: HashMap::new(),
        })
    }

    /// Results cached for these criteria, if still fresh.
    pub fn cached(&self, criteria: &SearchCriteria) -> Option<&[GrantRecord]> {
        self.cache
            .get(&criteria.cache_key())
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.grants.as_slice())
    }

    fn store(&mut self, criteria: &SearchCriteria, grants: Vec<GrantRecord>) {
        self.cache.insert(
            criteria.cache_key(),
            CachedResults {
                grants,
                stored_at: Instant::now(),
            },
        );
    }

    /// Searches every source. A failing source contributes nothing; the search
    /// itself never fails.
    pub async fn search(
        &mut self,
        criteria: &SearchCriteria,
        today: NaiveDate,
    ) -> Vec<GrantRecord> {
        if let Some(grants) = self.cached(criteria) {
            info!(count = grants.len(), "Returning cached results");
            return grants.to_vec();
        }

        let (boe, cdti) = futures::future::join(
            self.boe.search(criteria, today),
            self.cdti.search(criteria, today),
        )
        .await;

        let mut all = or_empty(boe, "BOE");
        all.extend(or_empty(cdti, "CDTI"));

        let grants = dedupe_and_rank(all, self.max_results);
        self.store(criteria, grants.clone());
        info!(count = grants.len(), "Search completed");
        grants
    }
}

fn or_empty(result: AppResult<Vec<GrantRecord>>, source: &str) -> Vec<GrantRecord> {
    result.unwrap_or_else(|e| {
        warn!(source = source, error = %e, "Source failed, continuing without it");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            sector: "Tecnología".to_string(),
            ..SearchCriteria::default()
        }
    }

    #[tokio::test]
    async fn fresh_cache_entry_is_returned_without_fetching() {
        let mut search = GrantSearch::from_config(&ResolvedConfig::default()).unwrap();
        search.store(&criteria(), vec![GrantRecord::new("Programa NEOTEC")]);

        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let grants = search.search(&criteria(), today).await;
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].title, "Programa NEOTEC");
    }

    #[test]
    fn expired_entries_are_ignored() {
        let config = ResolvedConfig {
            cache_ttl_secs: 0,
            ..ResolvedConfig::default()
        };
        let mut search = GrantSearch::from_config(&config).unwrap();
        search.store(&criteria(), vec![GrantRecord::new("Programa NEOTEC")]);
        assert!(search.cached(&criteria()).is_none());
    }

    #[test]
    fn cache_is_keyed_by_criteria() {
        let mut search = GrantSearch::from_config(&ResolvedConfig::default()).unwrap();
        search.store(&criteria(), vec![GrantRecord::new("Programa NEOTEC")]);
        assert!(search.cached(&criteria()).is_some());
        assert!(search.cached(&SearchCriteria::default()).is_none());
    }

    #[test]
    fn failed_source_yields_empty_list() {
        let failed: AppResult<Vec<GrantRecord>> =
            Err(AppError::NetworkError("HTTP 503: unavailable".into()));
        assert!(or_empty(failed, "BOE").is_empty());
        assert_eq!(or_empty(Ok(vec![GrantRecord::new("A")]), "CDTI").len(), 1);
    }
}
