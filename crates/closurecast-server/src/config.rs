//! Server configuration
//!
//! Values are layered: built-in defaults, then the YAML config file (if it
//! exists), then `CLOSURECAST__*` environment variables, then CLI flags.
//! The Gemini API key falls back to `GEMINI_API_KEY`.

use crate::cli::Cli;
use closurecast_core::RiskTier;
use closurecast_rag::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use closurecast_rag::generation::{DEFAULT_BACKOFF, DEFAULT_MAX_RETRIES};
use closurecast_rag::DEFAULT_TOP_K;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ENV_PREFIX: &str = "CLOSURECAST";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub listen: String,

    /// Listen port
    pub port: u16,

    /// Model artifact path
    pub model_path: String,

    /// Knowledge corpus path
    pub corpus_path: String,

    /// Retrieval settings
    pub retrieval: RetrievalConfig,

    /// Generation backend settings
    pub gemini: GeminiSettings,

    /// CORS settings
    pub cors: CorsConfig,

    /// Localized risk tier labels
    pub labels: TierLabels,
}

impl ServerConfig {
    /// Load configuration from file, environment and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let mut config: ServerConfig = settings.try_deserialize()?;
        config.apply_cli(cli);

        if config.gemini.api_key.is_none() {
            config.gemini.api_key = std::env::var(API_KEY_ENV).ok();
        }

        Ok(config)
    }

    /// Apply CLI overrides
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(model) = &cli.model {
            self.model_path = model.clone();
        }

        if let Some(documents) = &cli.documents {
            self.corpus_path = documents.clone();
        }

        if let Some(listen) = &cli.listen {
            self.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            self.port = port;
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0".to_string(),
            port: 5000,
            model_path: "./model.json".to_string(),
            corpus_path: "./documents.txt".to_string(),
            retrieval: RetrievalConfig::default(),
            gemini: GeminiSettings::default(),
            cors: CorsConfig::default(),
            labels: TierLabels::default(),
        }
    }
}

/// Retrieval and prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Documents used as context per query
    pub top_k: usize,

    /// Leading corpus entries used when nothing matches
    pub fallback_count: usize,

    /// Prompt template override; must contain `{context}` and `{query}`
    pub prompt_template: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            fallback_count: DEFAULT_TOP_K,
            prompt_template: None,
        }
    }
}

/// Gemini backend configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// API key; generation is disabled when absent
    pub api_key: Option<String>,

    /// Model id
    pub model: String,

    /// API root
    pub base_url: String,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Retries after a quota-exhausted response
    pub max_retries: u32,

    /// Fixed wait between retries
    pub backoff_secs: u64,
}

impl GeminiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 120,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_secs: DEFAULT_BACKOFF.as_secs(),
        }
    }
}

impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("backoff_secs", &self.backoff_secs)
            .finish()
    }
}

/// Cross-origin settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. `https://*.example.com` matches any subdomain.
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime
    pub max_age_secs: u64,
}

impl CorsConfig {
    /// Whether `origin` matches any configured pattern
    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|pattern| origin_matches(pattern, origin))
    }
}

/// Match an origin against `*`, an exact origin, or `scheme://*.domain`
fn origin_matches(pattern: &str, origin: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    match pattern.split_once("://*.") {
        Some((scheme, domain)) => origin
            .strip_prefix(scheme)
            .and_then(|rest| rest.strip_prefix("://"))
            .and_then(|host| host.strip_suffix(domain))
            .and_then(|sub| sub.strip_suffix('.'))
            .is_some_and(|sub| !sub.is_empty() && !sub.contains('/')),
        None => pattern.eq_ignore_ascii_case(origin),
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            max_age_secs: 3600,
        }
    }
}

/// Labels returned for each risk tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierLabels {
    pub low: String,
    pub medium: String,
    pub high: String,
}

impl TierLabels {
    pub fn label(&self, tier: RiskTier) -> &str {
        match tier {
            RiskTier::Low => &self.low,
            RiskTier::Medium => &self.medium,
            RiskTier::High => &self.high,
        }
    }
}

impl Default for TierLabels {
    fn default() -> Self {
        Self {
            low: "낮음".to_string(),
            medium: "중간".to_string(),
            high: "높음".to_string(),
        }
    }
}
