//! subvenciones-cli library
//!
//! This crate provides the core functionality for the `subvenciones-cli` binary.
//! Keep the crate root minimal; implementation and tests live in their modules.
//!
//! ## Overview
//!
//! - [`filter`] - Client-side visibility of grants: country, region, quick filters, free text
//! - [`grants`] - Deadline urgency, deduplication, ordering and statistics
//! - [`sources`] - Retrieval from the BOE daily summaries and the CDTI website
//! - [`favorites`] - Favorite grants persisted as JSON
//! - [`export`] - JSON, CSV and Parquet export
//! - [`debounce`] - Quiet-period debouncer for typed queries
//! - [`cli`] - Command-line interface
//! - [`models`] - Grant records and filter selections
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use subvenciones_cli::filter::FilterEvaluator;
//! use subvenciones_cli::models::{Country, FilterState, GrantRecord, QuickFilter};
//!
//! let mut grant = GrantRecord::new("Ayudas a la digitalización de PYMES");
//! grant.location = Some("Madrid".to_string());
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let state = FilterState::new(Country::Spain).with_quick(QuickFilter::Urgent);
//! let visibility = FilterEvaluator::new(today).evaluate(&[grant], &state);
//! println!("{}", visibility.counter_text(&state));
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod debounce;
pub mod errors;
pub mod export;
pub mod favorites;
pub mod filter;
pub mod grants;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;
