use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::models::LlmBackend;
use crate::pipeline::inference::hosted::DEFAULT_ANTHROPIC_URL;
use crate::pipeline::inference::InferenceSettings;
use crate::pipeline::labeling::LabelingConfig;

/// Application-level constants
pub const APP_NAME: &str = "batchlabel";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_BACKFILL_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

const ENV_BIND: &str = "BATCHLABEL_BIND";
const ENV_DB_PATH: &str = "BATCHLABEL_DB_PATH";
const ENV_BACKEND: &str = "BATCHLABEL_LLM_BACKEND";
const ENV_LLM_URL: &str = "BATCHLABEL_LLM_URL";
const ENV_MODEL: &str = "BATCHLABEL_MODEL";
const ENV_MAX_TOKENS: &str = "BATCHLABEL_MAX_TOKENS";
const ENV_TIMEOUT: &str = "BATCHLABEL_LLM_TIMEOUT_SECS";
const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "batchlabel=info,tower_http=info"
}

/// Per-user data directory for the session database.
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn default_db_path() -> PathBuf {
    app_data_dir().join("sessions.db")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub inference: InferenceSettings,
    pub labeling: LabelingConfig,
}

fn parse_var<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind = parse_var(ENV_BIND, get(ENV_BIND), default_bind())?;
        let db_path = get(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let backend = match get(ENV_BACKEND) {
            None => LlmBackend::Anthropic,
            Some(value) => value.parse().map_err(|e: crate::models::InvalidEnumValue| {
                ConfigError::Invalid {
                    var: ENV_BACKEND,
                    value,
                    reason: e.to_string(),
                }
            })?,
        };
        let (default_url, default_model) = match backend {
            LlmBackend::Anthropic => (DEFAULT_ANTHROPIC_URL, DEFAULT_ANTHROPIC_MODEL),
            LlmBackend::Ollama => (DEFAULT_OLLAMA_URL, DEFAULT_OLLAMA_MODEL),
        };

        let max_tokens: u32 = parse_var(ENV_MAX_TOKENS, get(ENV_MAX_TOKENS), DEFAULT_MAX_TOKENS)?;
        if max_tokens == 0 {
            return Err(ConfigError::Invalid {
                var: ENV_MAX_TOKENS,
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }
        let timeout_secs = parse_var(ENV_TIMEOUT, get(ENV_TIMEOUT), DEFAULT_LLM_TIMEOUT_SECS)?;

        Ok(Self {
            bind,
            db_path,
            inference: InferenceSettings {
                backend,
                base_url: get(ENV_LLM_URL).unwrap_or_else(|| default_url.to_string()),
                model: get(ENV_MODEL).unwrap_or_else(|| default_model.to_string()),
                api_key: get(ENV_API_KEY),
                timeout_secs,
            },
            labeling: LabelingConfig {
                max_tokens,
                backfill_max_tokens: DEFAULT_BACKFILL_MAX_TOKENS.min(max_tokens),
                ..LabelingConfig::default()
            },
        })
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}
