use crate::constants::*;
use crate::errors::{AppError, AppResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Deadline urgency attached to a grant during processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
    Expired,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }

    /// Critical and high grants are the ones the "urgent" quick filter keeps.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

/// One grant or subsidy listing.
///
/// Every field except the title is optional: records come from scraped pages and
/// third-party JSON, and the filters treat missing values explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantRecord {
    pub title: String,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub location: Option<String>,
    pub region: Option<String>,
    pub company_type: Option<String>,
    pub amount: Option<String>,
    /// Application deadline, `YYYY-MM-DD`
    pub deadline: Option<String>,
    /// Publication date, `YYYY-MM-DD`
    pub publication_date: Option<String>,
    pub source: Option<String>,
    pub link: Option<String>,
    pub identifier: Option<String>,
    pub relevance_score: Option<u8>,
    pub urgency: Urgency,
    pub days_remaining: Option<i64>,
}

impl GrantRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Location string, empty when absent.
    pub fn location_text(&self) -> &str {
        self.location.as_deref().unwrap_or("").trim()
    }

    /// Region string, empty when absent.
    pub fn region_text(&self) -> &str {
        self.region.as_deref().unwrap_or("").trim()
    }

    /// Lowercased concatenation of every field shown on a result card.
    pub fn searchable_text(&self) -> String {
        let fields = [
            Some(self.title.as_str()),
            self.description.as_deref(),
            self.sector.as_deref(),
            self.location.as_deref(),
            self.region.as_deref(),
            self.company_type.as_deref(),
            self.amount.as_deref(),
            self.deadline.as_deref(),
            self.publication_date.as_deref(),
            self.source.as_deref(),
        ];
        fields
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    pub fn deadline_date(&self) -> Option<NaiveDate> {
        parse_date(self.deadline.as_deref()?)
    }

    pub fn publication(&self) -> Option<NaiveDate> {
        parse_date(self.publication_date.as_deref()?)
    }
}

/// Parses a `YYYY-MM-DD` date, ignoring surrounding whitespace.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn is_any(value: &str) -> bool {
    ANY_ALIASES.contains(&value.trim().to_lowercase().as_str())
}

/// Country scope selected in the search form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Country {
    #[default]
    All,
    Spain,
    Eu,
    International,
}

impl Country {
    /// Label used by the form and the results counter.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::All => "Todas",
            Self::Spain => "España",
            Self::Eu => "UE",
            Self::International => "Internacional",
        }
    }
}

impl From<&str> for Country {
    fn from(value: &str) -> Self {
        let lower = value.trim().to_lowercase();

        if SPAIN_ALIASES.contains(&lower.as_str()) {
            Self::Spain
        } else if EU_ALIASES.contains(&lower.as_str()) {
            Self::Eu
        } else if INTERNATIONAL_ALIASES.contains(&lower.as_str()) {
            Self::International
        } else {
            // Unknown selections do not narrow the result set.
            Self::All
        }
    }
}

/// One-click preset filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuickFilter {
    #[default]
    None,
    Urgent,
    HighAmount,
    Recent,
    /// Resets the quick filter; evaluates like `None`.
    Clear,
}

impl From<&str> for QuickFilter {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "urgent" | "urgentes" => Self::Urgent,
            "high-amount" | "high_amount" | "montos-altos" => Self::HighAmount,
            "recent" | "recientes" => Self::Recent,
            "clear" | "limpiar" => Self::Clear,
            _ => Self::None,
        }
    }
}

/// Urgency dropdown on the results page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UrgencyLevel {
    #[default]
    All,
    /// Only critical
    Critical,
    /// Critical and high
    High,
    /// Anything but low
    Medium,
    /// Anything but expired
    Active,
}

impl From<&str> for UrgencyLevel {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "active" => Self::Active,
            _ => Self::All,
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    None,
    /// Closest deadline first
    Deadline,
    /// Newest publication first
    Publication,
    /// Case-insensitive title order
    Alphabetical,
}

impl From<&str> for SortKey {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "deadline" => Self::Deadline,
            "publication" => Self::Publication,
            "alphabetical" | "alpha" | "title" => Self::Alphabetical,
            _ => Self::None,
        }
    }
}

/// Output format for exported results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            other => Err(AppError::InvalidInput(format!(
                "Unsupported export format '{other}' (expected json, csv or parquet)"
            ))),
        }
    }
}

/// Complete filter selection applied to a result list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub country: Country,
    /// `None` means every region. Only consulted when `country` is Spain.
    pub region: Option<String>,
    /// Free-text query; empty matches everything.
    pub query: String,
    pub quick: QuickFilter,
    pub urgency: UrgencyLevel,
    /// Case-insensitive source substring; `None` means every source.
    pub source: Option<String>,
}

impl FilterState {
    pub fn new(country: Country) -> Self {
        Self {
            country,
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = (!is_any(region)).then(|| region.trim().to_string());
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    pub fn with_quick(mut self, quick: QuickFilter) -> Self {
        self.quick = quick;
        self
    }

    pub fn with_urgency(mut self, urgency: UrgencyLevel) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = (!is_any(source)).then(|| source.trim().to_string());
        self
    }

    /// Region that actually narrows results: set only for Spain.
    pub fn effective_region(&self) -> Option<&str> {
        match self.country {
            Country::Spain => self.region.as_deref(),
            _ => None,
        }
    }

    /// Location label shown next to the results counter.
    pub fn location_label(&self) -> String {
        match self.effective_region() {
            Some(region) => format!("{region} ({})", self.country.display_name()),
            None => self.country.display_name().to_string(),
        }
    }
}

/// Criteria sent to the official grant sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCriteria {
    pub sector: String,
    pub location: String,
    pub company_type: String,
    pub region: String,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            sector: "Todos".to_string(),
            location: "Todas".to_string(),
            company_type: "Todos".to_string(),
            region: "Todas".to_string(),
        }
    }
}

impl SearchCriteria {
    pub fn any_sector(&self) -> bool {
        is_any(&self.sector)
    }

    pub fn any_location(&self) -> bool {
        is_any(&self.location)
    }

    pub fn any_region(&self) -> bool {
        is_any(&self.region)
    }

    /// Key used by the search cache.
    pub fn cache_key(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.sector, self.location, self.company_type, self.region
        )
    }
}
