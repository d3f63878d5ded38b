//! Scheduler options: the shutdown timeout plus the worker pool it owns.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::pool::WorkerPoolConfig;

/// Shutdown timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

const ENV_TIMEOUT_MS: &str = "BACKGROUND_WORK_TIMEOUT_MS";
const ENV_WORKERS: &str = "BACKGROUND_WORK_WORKERS";
const ENV_STACK_SIZE: &str = "BACKGROUND_WORK_STACK_SIZE";

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerOptions {
    /// Maximum time `stop` waits for running work to finish, in milliseconds.
    pub timeout_ms: u64,
    /// Pool created when the scheduler is not given a shared one.
    pub pool: WorkerPoolConfig,
}

impl SchedulerOptions {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            pool: WorkerPoolConfig::new(),
        }
    }

    /// Set the shutdown timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the worker count of the owned pool.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.pool.worker_count = worker_count;
        self
    }

    /// Replace the owned pool configuration.
    #[must_use]
    pub const fn with_pool(mut self, pool: WorkerPoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Shutdown timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate option values.
    ///
    /// A zero timeout is allowed: `stop` then checks for quiescence once.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        self.pool.validate().map_err(|e| format!("pool invalid: {e}"))
    }

    /// Parse options from a JSON string and validate. Missing fields take
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation error description.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let options: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        options.validate()?;
        Ok(options)
    }

    /// Build options from the environment, loading a `.env` file if present.
    ///
    /// Recognizes `BACKGROUND_WORK_TIMEOUT_MS`, `BACKGROUND_WORK_WORKERS` and
    /// `BACKGROUND_WORK_STACK_SIZE`; unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is not a valid number or the resulting
    /// options fail validation.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build options from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::new();
        if let Some(v) = lookup(ENV_TIMEOUT_MS) {
            options.timeout_ms = parse_var(ENV_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_WORKERS) {
            options.pool.worker_count = parse_var(ENV_WORKERS, &v)?;
        }
        if let Some(v) = lookup(ENV_STACK_SIZE) {
            options.pool.thread_stack_size = parse_var(ENV_STACK_SIZE, &v)?;
        }
        options.validate()?;
        Ok(options)
    }
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{key} must be a non-negative integer, got `{value}`"))
}
