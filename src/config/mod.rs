//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `PHRASAL_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_MIN_SCORE, DEFAULT_QUANTIZE_DECIMALS,
    DEFAULT_QUANTIZE_DIM_PREFIX,
};
use crate::cache::{Quantizer, SemanticCacheConfig};
use crate::embedding::{EmbeddingBackendKind, EmbeddingConfig};

/// Largest rounding precision accepted for cache keys (`f32` carries ~7 significant digits).
pub const MAX_QUANTIZE_DECIMALS: usize = 16;

/// Default cache URL used when `PHRASAL_CACHE_URL` is not set.
pub const DEFAULT_CACHE_URL: &str = "redis://localhost:6379";

/// Default embedding service URL used when `PHRASAL_EMBEDDING_URL` is not set.
pub const DEFAULT_EMBEDDING_URL: &str = "http://embedding-service:8000";

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `PHRASAL_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// WebSocket/HTTP server port. Default: `3000`.
    pub port: u16,

    /// IP address to bind to. Default: `0.0.0.0`.
    pub bind_addr: IpAddr,

    /// JSON corpus produced by the offline embedding job. Default: `./vectors.json`.
    pub vectors_path: PathBuf,

    /// Semantic cache backend: `redis://...` or `memory://`.
    pub cache_url: String,

    /// Cache entry lifetime in seconds. Default: `3600`.
    pub cache_ttl_secs: u64,

    /// Per-call cache timeout in milliseconds. Default: `250`.
    pub cache_timeout_ms: u64,

    /// Decimal digits kept per dimension in quantized keys. Default: `2`.
    pub quantize_decimals: usize,

    /// Leading dimensions folded into quantized keys. Default: `8`.
    pub quantize_dim_prefix: usize,

    /// Reserved threshold for the LLM fallback mode. Default: `0.5`.
    pub min_score: f32,

    /// Which embedding backend to construct. Default: `http`.
    pub embedding_backend: EmbeddingBackendKind,

    /// Base URL of the HTTP embedding service.
    pub embedding_url: String,

    /// Model directory for the in-process embedder.
    pub model_path: Option<PathBuf>,

    /// Per-call embedding timeout in milliseconds. Default: `5000`.
    pub embedding_timeout_ms: u64,

    /// Output dimension for the stub embedder (defaults to the corpus dimension).
    pub stub_dim: Option<usize>,

    /// Admission limit on concurrently processed messages (0 = unlimited). Default: `1024`.
    pub max_in_flight: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
            vectors_path: PathBuf::from("./vectors.json"),
            cache_url: DEFAULT_CACHE_URL.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_timeout_ms: 250,
            quantize_decimals: DEFAULT_QUANTIZE_DECIMALS,
            quantize_dim_prefix: DEFAULT_QUANTIZE_DIM_PREFIX,
            min_score: DEFAULT_MIN_SCORE,
            embedding_backend: EmbeddingBackendKind::Http,
            embedding_url: DEFAULT_EMBEDDING_URL.to_string(),
            model_path: None,
            embedding_timeout_ms: 5000,
            stub_dim: None,
            max_in_flight: 1024,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "PHRASAL_PORT";
    const ENV_BIND_ADDR: &'static str = "PHRASAL_BIND_ADDR";
    const ENV_VECTORS_PATH: &'static str = "PHRASAL_VECTORS_PATH";
    const ENV_CACHE_URL: &'static str = "PHRASAL_CACHE_URL";
    const ENV_CACHE_TTL_SECS: &'static str = "PHRASAL_CACHE_TTL_SECS";
    const ENV_CACHE_TIMEOUT_MS: &'static str = "PHRASAL_CACHE_TIMEOUT_MS";
    const ENV_QUANTIZE_DECIMALS: &'static str = "PHRASAL_QUANTIZE_DECIMALS";
    const ENV_QUANTIZE_DIM_PREFIX: &'static str = "PHRASAL_QUANTIZE_DIM_PREFIX";
    const ENV_MIN_SCORE: &'static str = "PHRASAL_MIN_SCORE";
    const ENV_EMBEDDING_BACKEND: &'static str = "PHRASAL_EMBEDDING_BACKEND";
    const ENV_EMBEDDING_URL: &'static str = "PHRASAL_EMBEDDING_URL";
    const ENV_MODEL_PATH: &'static str = "PHRASAL_MODEL_PATH";
    const ENV_EMBEDDING_TIMEOUT_MS: &'static str = "PHRASAL_EMBEDDING_TIMEOUT_MS";
    const ENV_STUB_DIM: &'static str = "PHRASAL_STUB_DIM";
    const ENV_MAX_IN_FLIGHT: &'static str = "PHRASAL_MAX_IN_FLIGHT";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let vectors_path = Self::parse_path_from_env(Self::ENV_VECTORS_PATH, defaults.vectors_path);
        let cache_url = Self::parse_string_from_env(Self::ENV_CACHE_URL, defaults.cache_url);
        let cache_ttl_secs = Self::parse_from_env(Self::ENV_CACHE_TTL_SECS, defaults.cache_ttl_secs)?;
        let cache_timeout_ms =
            Self::parse_from_env(Self::ENV_CACHE_TIMEOUT_MS, defaults.cache_timeout_ms)?;
        let quantize_decimals =
            Self::parse_from_env(Self::ENV_QUANTIZE_DECIMALS, defaults.quantize_decimals)?;
        let quantize_dim_prefix =
            Self::parse_from_env(Self::ENV_QUANTIZE_DIM_PREFIX, defaults.quantize_dim_prefix)?;
        let min_score = Self::parse_from_env(Self::ENV_MIN_SCORE, defaults.min_score)?;
        let embedding_backend = match Self::optional_var(Self::ENV_EMBEDDING_BACKEND) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::UnknownEmbeddingBackend { value })?,
            None => defaults.embedding_backend,
        };
        let embedding_url =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_URL, defaults.embedding_url);
        let model_path = Self::optional_var(Self::ENV_MODEL_PATH).map(PathBuf::from);
        let embedding_timeout_ms =
            Self::parse_from_env(Self::ENV_EMBEDDING_TIMEOUT_MS, defaults.embedding_timeout_ms)?;
        let stub_dim = match Self::optional_var(Self::ENV_STUB_DIM) {
            Some(value) => Some(Self::parse_value(Self::ENV_STUB_DIM, value)?),
            None => None,
        };
        let max_in_flight = Self::parse_from_env(Self::ENV_MAX_IN_FLIGHT, defaults.max_in_flight)?;

        Ok(Self {
            port,
            bind_addr,
            vectors_path,
            cache_url,
            cache_ttl_secs,
            cache_timeout_ms,
            quantize_decimals,
            quantize_dim_prefix,
            min_score,
            embedding_backend,
            embedding_url,
            model_path,
            embedding_timeout_ms,
            stub_dim,
            max_in_flight,
        })
    }

    /// Validates paths and basic invariants (does not touch the network).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_CACHE_TTL_SECS,
            });
        }
        if self.cache_timeout_ms == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_CACHE_TIMEOUT_MS,
            });
        }
        if self.embedding_timeout_ms == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_EMBEDDING_TIMEOUT_MS,
            });
        }
        if self.quantize_dim_prefix == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_QUANTIZE_DIM_PREFIX,
            });
        }
        if self.quantize_decimals > MAX_QUANTIZE_DECIMALS {
            return Err(ConfigError::QuantizeDecimalsTooLarge {
                value: self.quantize_decimals,
                max: MAX_QUANTIZE_DECIMALS,
            });
        }
        if !self.min_score.is_finite() {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_MIN_SCORE,
                value: self.min_score.to_string(),
                reason: "must be a finite number".to_string(),
            });
        }
        if self.stub_dim == Some(0) {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_STUB_DIM,
            });
        }

        if self.embedding_backend == EmbeddingBackendKind::Local {
            let path = self.model_path.as_ref().ok_or(ConfigError::MissingEnvVar {
                name: Self::ENV_MODEL_PATH,
            })?;
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if self.vectors_path.exists() && !self.vectors_path.is_file() {
            return Err(ConfigError::NotAFile {
                path: self.vectors_path.clone(),
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        match self.bind_addr {
            IpAddr::V6(addr) => format!("[{}]:{}", addr, self.port),
            IpAddr::V4(addr) => format!("{}:{}", addr, self.port),
        }
    }

    /// Cache entry lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Per-call cache timeout.
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// Per-call embedding timeout.
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }

    /// Embedding settings; the stub dimension falls back to `corpus_dim`.
    pub fn embedding_config(&self, corpus_dim: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            backend: self.embedding_backend,
            url: self.embedding_url.clone(),
            model_path: self.model_path.clone(),
            timeout: self.embedding_timeout(),
            stub_dim: self.stub_dim.unwrap_or(corpus_dim),
        }
    }

    /// Cache key resolution, TTL and per-call timeout.
    pub fn cache_config(&self) -> SemanticCacheConfig {
        SemanticCacheConfig {
            quantizer: Quantizer::new(self.quantize_decimals, self.quantize_dim_prefix),
            ttl: self.cache_ttl(),
            timeout: self.cache_timeout(),
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        Self::optional_var(var_name)
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        Self::optional_var(var_name).unwrap_or(default)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::optional_var(var_name) {
            Some(value) => Self::parse_value(var_name, value),
            None => Ok(default),
        }
    }

    fn parse_value<T>(var_name: &'static str, value: String) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name: var_name,
            reason: e.to_string(),
            value,
        })
    }

    fn optional_var(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
