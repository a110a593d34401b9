//! Configuration loading for primerwatch.
//! Reads primerwatch.toml from the current directory or path in PRIMERWATCH_CONFIG env var.

use primerwatch_common::entities::BlastParams;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}\nCopy primerwatch.example.toml to primerwatch.toml and edit it.", .0.display())]
    NotFound(PathBuf),
    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub bulk: BulkConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub blast: BlastDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Project URL; RPC lives under `/rest/v1/rpc`, auth under `/auth/v1`.
    pub url: String,
    pub anon_key_secret: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 { 30 }

impl BackendConfig {
    pub fn anon_key(&self) -> Option<SecretString> {
        self.anon_key_secret.clone().map(SecretString::from)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Set the `Secure` attribute on the session cookie.
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_bind()       -> String { "127.0.0.1:3001".to_string() }
fn default_static_dir() -> String { "crates/primerwatch-web/static".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind(), static_dir: default_static_dir(), secure_cookies: false }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_lookback")]
    pub default_lookback_days: i32,
}

fn default_poll_interval() -> u64 { 10 }
fn default_lookback()      -> i32 { 30 }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { poll_interval_secs: default_poll_interval(), default_lookback_days: default_lookback() }
    }
}

impl DashboardConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkConfig {
    /// Maximum number of backend calls in flight for one bulk action.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize { 4 }

impl Default for BulkConfig {
    fn default() -> Self {
        Self { concurrency: default_concurrency() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyConfig {
    #[serde(default = "default_taxonomy_url")]
    pub base_url: String,
    #[serde(default = "default_taxonomy_timeout")]
    pub timeout_secs: u64,
    pub api_key_secret: Option<String>,
}

fn default_taxonomy_url()     -> String { "https://api.ncbi.nlm.nih.gov/datasets/v2".to_string() }
fn default_taxonomy_timeout() -> u64    { 10 }

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            base_url: default_taxonomy_url(),
            timeout_secs: default_taxonomy_timeout(),
            api_key_secret: None,
        }
    }
}

impl TaxonomyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_key(&self) -> Option<SecretString> {
        self.api_key_secret.clone().map(SecretString::from)
    }
}

/// Pre-filled values of the BLAST order form.
#[derive(Debug, Clone, Deserialize)]
pub struct BlastDefaults {
    #[serde(default = "default_identity")]
    pub identity_pct: f64,
    #[serde(default = "default_coverage")]
    pub coverage_pct: f64,
    #[serde(default = "default_match")]
    pub match_score: i32,
    #[serde(default = "default_mismatch")]
    pub mismatch_score: i32,
    #[serde(default = "default_gap_open")]
    pub gap_open: i32,
    #[serde(default = "default_gap_extend")]
    pub gap_extend: i32,
    #[serde(default = "default_min_oligo_coverage")]
    pub min_oligo_coverage_pct: f64,
    #[serde(default = "default_blast_window")]
    pub default_window_days: i64,
}

fn default_identity()           -> f64 { 90.0 }
fn default_coverage()           -> f64 { 90.0 }
fn default_match()              -> i32 { 2 }
fn default_mismatch()           -> i32 { -3 }
fn default_gap_open()           -> i32 { -5 }
fn default_gap_extend()         -> i32 { -2 }
fn default_min_oligo_coverage() -> f64 { 80.0 }
fn default_blast_window()       -> i64 { 365 }

impl Default for BlastDefaults {
    fn default() -> Self {
        Self {
            identity_pct: default_identity(),
            coverage_pct: default_coverage(),
            match_score: default_match(),
            mismatch_score: default_mismatch(),
            gap_open: default_gap_open(),
            gap_extend: default_gap_extend(),
            min_oligo_coverage_pct: default_min_oligo_coverage(),
            default_window_days: default_blast_window(),
        }
    }
}

impl BlastDefaults {
    pub fn params(&self) -> BlastParams {
        BlastParams {
            identity_pct: self.identity_pct,
            coverage_pct: self.coverage_pct,
            match_score: self.match_score,
            mismatch_score: self.mismatch_score,
            gap_open: self.gap_open,
            gap_extend: self.gap_extend,
            min_oligo_coverage_pct: self.min_oligo_coverage_pct,
        }
    }
}


impl Config {
    /// Load configuration from primerwatch.toml.
    /// Checks PRIMERWATCH_CONFIG env var first, then current directory.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("PRIMERWATCH_CONFIG")
            .unwrap_or_else(|_| "primerwatch.toml".to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Secrets and the bind address may come from the environment instead of the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("PRIMERWATCH_ANON_KEY") {
            self.backend.anon_key_secret = Some(key);
        }
        if let Ok(key) = std::env::var("NCBI_API_KEY") {
            self.taxonomy.api_key_secret = Some(key);
        }
        if let Ok(bind) = std::env::var("PRIMERWATCH_BIND") {
            self.server.bind = bind;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, raw) in [("backend.url", &self.backend.url), ("taxonomy.base_url", &self.taxonomy.base_url)] {
            let parsed = url::Url::parse(raw)
                .map_err(|e| ConfigError::Invalid(format!("{} {:?}: {}", label, raw, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(format!("{} must be an http(s) URL", label)));
            }
        }
        if self.backend.anon_key_secret.is_none() {
            tracing::warn!("backend.anon_key_secret is not set; backend calls will likely be rejected");
        }
        if self.dashboard.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("dashboard.poll_interval_secs must be at least 1".into()));
        }
        if self.bulk.concurrency == 0 {
            return Err(ConfigError::Invalid("bulk.concurrency must be at least 1".into()));
        }
        if self.taxonomy.timeout_secs == 0 || self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least 1 second".into()));
        }
        self.blast
            .params()
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("blast: {}", e)))?;
        Ok(())
    }
}
