use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Shortest interval the dirty-period worker may be scheduled at
pub const MIN_WORKER_INTERVAL_SECONDS: u64 = 60;

/// Application configuration loaded from config.toml or environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub processing: ProcessingConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub default_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Dirty periods claimed per worker batch
    pub batch_size: usize,
    /// Threads used to classify customer states (1 disables the fan-out)
    pub worker_threads: usize,
    pub progress_interval: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            worker_threads: 4,
            progress_interval: 1000,
        }
    }
}

/// Dirty-period reprocessing schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub interval_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
        }
    }
}

impl WorkerConfig {
    /// Interval clamped to the minimum schedule
    pub fn effective_interval_seconds(&self) -> u64 {
        self.interval_seconds.max(MIN_WORKER_INTERVAL_SECONDS)
    }
}

impl AppConfig {
    /// Load configuration from config.toml file and environment variables
    /// Environment variables take precedence over file configuration
    pub fn load() -> Result<Self, ConfigError> {
        let processing = ProcessingConfig::default();
        let worker = WorkerConfig::default();
        let config = Config::builder()
            .set_default("database.default_path", "./output_data/flow_report.db")?
            .set_default("processing.batch_size", processing.batch_size as i64)?
            .set_default("processing.worker_threads", processing.worker_threads as i64)?
            .set_default(
                "processing.progress_interval",
                processing.progress_interval as i64,
            )?
            .set_default("worker.interval_seconds", worker.interval_seconds)?
            // Load from config.toml if it exists
            .add_source(File::with_name("config").required(false))
            // FLOW_REPORT_PROCESSING__BATCH_SIZE style overrides
            .add_source(config::Environment::with_prefix("FLOW_REPORT").separator("__"))
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        if let Ok(db_path) = env::var("FLOW_REPORT_DATABASE_PATH") {
            app_config.database.default_path = PathBuf::from(db_path);
        }

        if app_config.processing.batch_size == 0 {
            return Err(ConfigError::Message(
                "processing.batch_size must be greater than 0".to_string(),
            ));
        }

        Ok(app_config)
    }

    /// Get default config values for CLI argument defaults
    pub fn get_defaults() -> Result<Self, ConfigError> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(_) => Ok(Self::fallback()),
        }
    }

    /// Built-in configuration used when nothing else loads
    pub fn fallback() -> Self {
        Self {
            database: DatabaseConfig {
                default_path: PathBuf::from("./output_data/flow_report.db"),
            },
            processing: ProcessingConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}
