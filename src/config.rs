//! Centralized configuration management for ccafinder

use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Result, Context};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite coverage catalog
    pub database_path: PathBuf,
    /// Base URL of the eligibility API used by the client front ends
    pub api_url: String,
    /// Address the API server binds to
    pub bind_addr: String,
    /// City/ZIP directory CSV (uscities.csv layout)
    pub cities_csv: PathBuf,
    /// Eligibility matching configuration
    pub matching: MatchingConfig,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// Eligibility matching configuration
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Minimum city similarity (0-100, exclusive) for a fuzzy match
    pub fuzzy_threshold: f64,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { fuzzy_threshold: 85.0 }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "ccafinder/0.1.0".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "./ccafinder.db".into(),
            api_url: "http://localhost:8000".to_string(),
            bind_addr: "127.0.0.1:8000".to_string(),
            cities_csv: "./uscities.csv".into(),
            matching: MatchingConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let database_path = std::env::var("CCA_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let api_url = std::env::var("CCA_API_URL").unwrap_or(defaults.api_url);

        let bind_addr = std::env::var("CCA_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let cities_csv = std::env::var("CCA_CITIES_CSV")
            .map(PathBuf::from)
            .unwrap_or(defaults.cities_csv);

        let matching = MatchingConfig {
            fuzzy_threshold: parse_env_var("CCA_FUZZY_THRESHOLD")?
                .unwrap_or(defaults.matching.fuzzy_threshold),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("CCA_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            user_agent: std::env::var("CCA_USER_AGENT").unwrap_or(defaults.http.user_agent),
        };

        Ok(Config {
            database_path,
            api_url,
            bind_addr,
            cities_csv,
            matching,
            http,
        })
    }

    /// Get database path as string
    pub fn database_path_str(&self) -> &str {
        self.database_path.to_str().unwrap_or("./ccafinder.db")
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(anyhow::anyhow!(
                    "Database parent directory does not exist: {}",
                    parent.display()
                ));
            }
        }

        reqwest::Url::parse(&self.api_url)
            .with_context(|| format!("Invalid API URL: {}", self.api_url))?;

        if !(0.0..=100.0).contains(&self.matching.fuzzy_threshold) {
            return Err(anyhow::anyhow!(
                "Fuzzy threshold must be between 0 and 100, got {}",
                self.matching.fuzzy_threshold
            ));
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
