use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use config::{Config as ConfigLib, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use crate::utils::error::{Result, AttendanceError};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MIN_TEMPLATE_LEN: usize = 64;
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f32 = 0.90;
pub const DEFAULT_MATCHER: &str = "cosine";
pub const DEFAULT_METRICS_INTERVAL_SECS: u64 = 60;

const KNOWN_MATCHERS: &[&str] = &["cosine", "euclidean"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    pub security: SecurityConfig,
    pub resolution: ResolutionConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// 0 lets actix pick one worker per physical core.
    pub workers: usize,
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    pub log_level: String,
    #[serde(default)]
    pub log_dir: Option<String>,
}

#[derive(Clone, Deserialize)]
pub struct SecurityConfig {
    pub api_key: String,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionConfig {
    pub min_template_len: usize,
    pub acceptance_threshold: f32,
    pub matcher: String,
    pub reject_duplicate_names: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Rocksdb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub metrics_interval_secs: u64,
}

impl Config {
    /// Loads `config/default`, `config/local` and `ATTENDANCE__*` environment
    /// variables on top of the built-in defaults.
    pub fn new() -> Result<Self> {
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g. ATTENDANCE__SECURITY__API_KEY
            .add_source(
                Environment::with_prefix("ATTENDANCE")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("node.allowed_origins")
                    .try_parsing(true),
            );

        Self::from_builder(builder)
    }

    /// Built-in defaults only, with the given API key. Used by tests and
    /// benches that never touch the filesystem or environment.
    pub fn with_api_key(api_key: &str) -> Result<Self> {
        let builder = Self::defaults()?.set_override("security.api_key", api_key)?;
        Self::from_builder(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(ConfigLib::builder()
            .set_default("node.host", DEFAULT_HOST)?
            .set_default("node.port", DEFAULT_PORT as i64)?
            .set_default("node.workers", 0_i64)?
            .set_default("node.request_timeout_ms", DEFAULT_REQUEST_TIMEOUT_MS as i64)?
            .set_default("node.allowed_origins", Vec::<String>::new())?
            .set_default("node.log_level", "info")?
            .set_default("security.api_key", "")?
            .set_default("resolution.min_template_len", DEFAULT_MIN_TEMPLATE_LEN as i64)?
            .set_default("resolution.acceptance_threshold", DEFAULT_ACCEPTANCE_THRESHOLD as f64)?
            .set_default("resolution.matcher", DEFAULT_MATCHER)?
            .set_default("resolution.reject_duplicate_names", true)?
            .set_default("storage.backend", "memory")?
            .set_default("storage.path", "data/attendance")?
            .set_default("monitoring.metrics_interval_secs", DEFAULT_METRICS_INTERVAL_SECS as i64)?)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.node.port == 0 {
            return Err(AttendanceError::Config("Invalid port number".into()));
        }
        if self.node.request_timeout_ms == 0 {
            return Err(AttendanceError::Config("request_timeout_ms must be greater than 0".into()));
        }

        if self.security.api_key.trim().is_empty() {
            return Err(AttendanceError::Config("security.api_key must be set".into()));
        }

        let threshold = self.resolution.acceptance_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(AttendanceError::Config(format!(
                "acceptance_threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        if self.resolution.min_template_len == 0 {
            return Err(AttendanceError::Config("min_template_len must be greater than 0".into()));
        }
        if !KNOWN_MATCHERS.contains(&self.resolution.matcher.as_str()) {
            return Err(AttendanceError::Config(format!(
                "Unknown matcher '{}', expected one of {:?}",
                self.resolution.matcher, KNOWN_MATCHERS
            )));
        }

        if self.storage.backend == StorageBackend::Rocksdb {
            if !cfg!(feature = "rocksdb-store") {
                return Err(AttendanceError::Config(
                    "rocksdb backend requires the rocksdb-store feature".into(),
                ));
            }
            if self.storage.path.is_empty() {
                return Err(AttendanceError::Config("storage.path must be set for rocksdb".into()));
            }
        }

        if self.monitoring.metrics_interval_secs == 0 {
            return Err(AttendanceError::Config("metrics_interval_secs must be greater than 0".into()));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.node.request_timeout_ms)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring.metrics_interval_secs)
    }
}

impl From<ConfigError> for AttendanceError {
    fn from(error: ConfigError) -> Self {
        AttendanceError::Config(error.to_string())
    }
}
