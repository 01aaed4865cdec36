use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved configuration with all values filled in (no Options).
///
/// This struct represents the application defaults and can be deserialized by the TOML
/// loader. All fields have concrete values, making it safe to access directly without unwrapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    /// JSON file holding the favorite grant titles
    pub favorites_path: PathBuf,
    /// Directory for exported result files
    pub export_dir: PathBuf,

    // Filtering
    /// Quiet period before a typed query is evaluated
    pub debounce_ms: u64,
    /// Window of the "recent" quick filter, in days
    pub recent_days: i64,
    /// Minimum amount in euros for the "high-amount" quick filter
    pub high_amount_threshold: f64,
    /// Maximum number of results kept after deduplication
    pub max_results: usize,

    // Sources
    /// How long a search result stays cached, in seconds
    pub cache_ttl_secs: u64,
    /// Number of past BOE daily summaries to scan
    pub boe_days_back: u32,
    /// Maximum number of grants taken from the BOE
    pub boe_max_results: usize,
    /// Candidate links followed per CDTI section
    pub cdti_links_per_section: usize,
    /// Maximum number of grants taken from the CDTI
    pub cdti_max_results: usize,
    /// Whether to open each CDTI programme page for description and amount
    pub cdti_fetch_details: bool,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Pause between consecutive requests to the same source
    pub request_delay_ms: u64,
    /// Maximum number of retry attempts for failed requests
    pub max_retries: u32,
    /// Initial delay in milliseconds before the first retry
    pub retry_initial_delay_ms: u64,
    /// Maximum delay in milliseconds between retries
    pub retry_max_delay_ms: u64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            favorites_path: PathBuf::from("data/favorites.json"),
            export_dir: PathBuf::from("data/exports"),
            debounce_ms: 300,
            recent_days: 7,
            high_amount_threshold: 600_000.0,
            max_results: 25,
            cache_ttl_secs: 1800,
            boe_days_back: 15,
            boe_max_results: 10,
            cdti_links_per_section: 15,
            cdti_max_results: 8,
            cdti_fetch_details: true,
            request_timeout_secs: 15,
            request_delay_ms: 300,
            max_retries: 3,
            retry_initial_delay_ms: 1000,
            retry_max_delay_ms: 10000,
        }
    }
}

impl ResolvedConfig {
    fn validate(&self) -> AppResult<()> {
        if self.max_results == 0 {
            return Err(AppError::InvalidInput(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.recent_days <= 0 {
            return Err(AppError::InvalidInput(
                "recent_days must be greater than 0".into(),
            ));
        }
        if !self.high_amount_threshold.is_finite() || self.high_amount_threshold < 0.0 {
            return Err(AppError::InvalidInput(
                "high_amount_threshold must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

/// Filter run that can be loaded from a TOML file.
///
/// Only `input` is required; every filter field defaults to "no restriction" and the
/// pipeline settings are flattened in from [`ResolvedConfig`]. Unknown keys are
/// rejected to catch typos.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolvedConfigFile {
    /// JSON file or directory of JSON files with grant records
    pub input: PathBuf,
    /// `"España"`, `"UE"`, `"Internacional"` or `"Todas"`
    #[serde(default = "default_any")]
    pub country: String,
    /// Autonomous community, only used with Spain
    #[serde(default = "default_any")]
    pub region: String,
    #[serde(default)]
    pub query: String,
    /// `"urgent"`, `"high-amount"`, `"recent"` or empty
    #[serde(default)]
    pub quick: String,
    /// `"critical"`, `"high"`, `"medium"`, `"active"` or empty
    #[serde(default)]
    pub urgency: String,
    /// Source substring, e.g. `"boe"`
    #[serde(default)]
    pub source: String,
    /// `"deadline"`, `"publication"`, `"alphabetical"` or empty
    #[serde(default)]
    pub sort: String,
    /// Export format (`"json"`, `"csv"`, `"parquet"`); no export when absent
    #[serde(default)]
    pub export: Option<String>,
    /// Flattened resolved configuration with pipeline defaults
    #[serde(flatten)]
    pub resolved: ResolvedConfig,
}

impl ResolvedConfigFile {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the TOML is malformed, `input` is missing,
    /// unknown keys are present, or a numeric setting is out of range.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ResolvedConfigFile = toml::from_str(&contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))?;

        config.resolved.validate()?;
        if let Some(format) = &config.export {
            format.parse::<crate::models::ExportFormat>()?;
        }

        Ok(config)
    }
}

fn default_any() -> String {
    "Todas".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_values() {
        let config = ResolvedConfig::default();
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.recent_days, 7);
        assert_eq!(config.high_amount_threshold, 600_000.0);
        assert_eq!(config.max_results, 25);
        assert_eq!(config.cache_ttl_secs, 1800);
        assert!(config.cdti_fetch_details);
    }

    #[test]
    fn minimal_toml_is_parsed_and_defaults_apply() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            input = "data/grants.json"
            "#,
        )
        .unwrap();

        let config = ResolvedConfigFile::from_toml_file(tmp.path()).unwrap();
        assert_eq!(config.input, PathBuf::from("data/grants.json"));
        assert_eq!(config.country, "Todas");
        assert_eq!(config.region, "Todas");
        assert!(config.query.is_empty());
        assert!(config.export.is_none());
        assert_eq!(config.resolved.max_results, 25);
        assert_eq!(config.resolved.max_retries, 3);
    }

    #[test]
    fn filter_fields_and_overrides_are_read() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            input = "grants"
            country = "España"
            region = "Galicia"
            quick = "high-amount"
            export = "csv"
            high_amount_threshold = 1000000.0
            recent_days = 14
            "#,
        )
        .unwrap();

        let config = ResolvedConfigFile::from_toml_file(tmp.path()).unwrap();
        assert_eq!(config.country, "España");
        assert_eq!(config.region, "Galicia");
        assert_eq!(config.quick, "high-amount");
        assert_eq!(config.export.as_deref(), Some("csv"));
        assert_eq!(config.resolved.high_amount_threshold, 1_000_000.0);
        assert_eq!(config.resolved.recent_days, 14);
    }

    #[test]
    fn missing_input_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, r#"country = "UE""#).unwrap();

        assert!(ResolvedConfigFile::from_toml_file(tmp.path()).is_err());
    }

    #[test]
    fn unknown_key_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            input = "grants.json"
            extra_flag = true
            "#,
        )
        .unwrap();

        assert!(ResolvedConfigFile::from_toml_file(tmp.path()).is_err());
    }

    #[test]
    fn unsupported_export_format_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            input = "grants.json"
            export = "excel"
            "#,
        )
        .unwrap();

        assert!(ResolvedConfigFile::from_toml_file(tmp.path()).is_err());
    }

    #[test]
    fn zero_max_results_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            input = "grants.json"
            max_results = 0
            "#,
        )
        .unwrap();

        assert!(ResolvedConfigFile::from_toml_file(tmp.path()).is_err());
    }
}
