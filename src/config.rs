//! Configuration types for log-export

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Export behavior configuration (paths, worker pool, retention)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExportConfig {
    /// Source log file that exports are sliced from (default: "logs/app.log")
    #[serde(default = "default_source_log")]
    pub source_log: PathBuf,

    /// Directory that export artifacts are written to (default: "logs")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum number of exports running at once (default: 4)
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// How long a task record is kept after submission, in seconds (default: 24h)
    #[serde(default = "default_task_ttl", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub task_ttl: Duration,

    /// Interval between TTL sweeps, in seconds (default: 10 minutes)
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub sweep_interval: Duration,

    /// Delete the artifact of a completed task when its record is swept (default: true)
    #[serde(default = "default_true")]
    pub remove_artifacts_on_sweep: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            source_log: default_source_log(),
            output_dir: default_output_dir(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            task_ttl: default_task_ttl(),
            sweep_interval: default_sweep_interval(),
            remove_artifacts_on_sweep: true,
        }
    }
}

/// Main configuration for ExportService
///
/// - [`export`](ExportConfig): source log, output directory, worker pool, TTL
/// - [`server`](ServerIntegrationConfig): REST API settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Export behavior settings
    #[serde(default)]
    pub export: ExportConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Check settings that would make the service unusable
    pub fn validate(&self) -> Result<()> {
        if self.export.max_concurrent_tasks == 0 {
            return Err(Error::Config {
                message: "max_concurrent_tasks must be at least 1".into(),
                key: Some("max_concurrent_tasks".into()),
            });
        }
        if self.export.task_ttl.is_zero() {
            return Err(Error::Config {
                message: "task_ttl must be greater than zero".into(),
                key: Some("task_ttl".into()),
            });
        }
        if self.export.sweep_interval.is_zero() {
            return Err(Error::Config {
                message: "sweep_interval must be greater than zero".into(),
                key: Some("sweep_interval".into()),
            });
        }
        Ok(())
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["http://localhost:3000"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_source_log() -> PathBuf {
    PathBuf::from("logs/app.log")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_concurrent_tasks() -> usize {
    4
}

fn default_task_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
