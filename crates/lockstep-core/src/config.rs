use crate::compare::EqualityMode;
use crate::errors::HarnessError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Default suspension timeout: two seconds on the virtual clock.
pub const DEFAULT_ASYNC_TIMEOUT_MS: u64 = 2_000;

pub const DEFAULT_FIXTURE_ID: &str = "main";

pub const DEFAULT_TIMER_STEP_LIMIT: usize = 10_000;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    pub version: u32,

    /// Suite name written into reports.
    pub suite: String,

    /// How long `block` waits before the timeout fires.
    pub async_timeout_ms: u64,

    /// Id of the container whose content is restored after every test.
    pub fixture_id: String,

    /// When set, a hidden pause of this many milliseconds runs before every visible test.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_between_tests_ms: Option<u64>,

    /// Upper bound on timers run back to back by `flush`/`advance_time` while no queued
    /// step runs. Catches self-rescheduling timers.
    pub timer_step_limit: usize,

    pub equality: EqualityMode,

    pub report: ReportConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            suite: "lockstep".to_string(),
            async_timeout_ms: DEFAULT_ASYNC_TIMEOUT_MS,
            fixture_id: DEFAULT_FIXTURE_ID.to_string(),
            pause_between_tests_ms: None,
            timer_step_limit: DEFAULT_TIMER_STEP_LIMIT,
            equality: EqualityMode::default(),
            report: ReportConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Print per-test lines and the summary to stderr.
    pub console: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub junit: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            console: true,
            json: None,
            junit: None,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(HarnessError::config(format!(
                "unsupported config version {} (supported: {})",
                self.version, SUPPORTED_CONFIG_VERSION
            )));
        }
        if self.async_timeout_ms == 0 {
            return Err(HarnessError::config("async_timeout_ms must be > 0"));
        }
        if self.fixture_id.trim().is_empty() {
            return Err(HarnessError::config("fixture_id must not be empty"));
        }
        if self.timer_step_limit == 0 {
            return Err(HarnessError::config("timer_step_limit must be > 0"));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<HarnessConfig, HarnessError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        HarnessError::config(format!("failed to read config {}: {}", path.display(), e))
    })?;
    parse_config(&raw)
}

pub fn parse_config(raw: &str) -> Result<HarnessConfig, HarnessError> {
    let cfg: HarnessConfig = serde_yaml::from_str(raw)
        .map_err(|e| HarnessError::config(format!("failed to parse YAML: {}", e)))?;
    cfg.validate()?;
    Ok(cfg)
}
