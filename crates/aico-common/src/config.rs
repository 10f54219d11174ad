//! Configuration types and utilities for AICO

use crate::constants::{cache, workflow};
use crate::error::{AicoError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Top-level configuration for a simulated company
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyConfig {
    pub company_name: String,
    pub log_level: String,
    pub workflow: WorkflowConfig,
    pub cache: CacheConfig,
    pub execution: ExecutionConfig,
    pub routing: RoutingConfig,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            company_name: "AI Company".to_string(),
            log_level: "info".to_string(),
            workflow: WorkflowConfig::default(),
            cache: CacheConfig::default(),
            execution: ExecutionConfig::default(),
            routing: RoutingConfig::default(),
        }
    }
}

/// Settings for the workflow engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Upper bound on how long any wait step actually sleeps
    pub max_wait_secs: u64,
    /// Timeout used by wait steps that do not name one
    pub default_wait_timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: workflow::MAX_WAIT,
            default_wait_timeout_secs: workflow::DEFAULT_WAIT_TIMEOUT,
        }
    }
}

/// Settings for the analysis cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: cache::DEFAULT_TTL_SECONDS,
            max_size: cache::DEFAULT_MAX_SIZE,
        }
    }
}

/// Settings for simulated agent work
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Time an agent spends "working" on a task, in milliseconds
    pub simulated_work_millis: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            simulated_work_millis: 250,
        }
    }
}

/// Optional override of the built-in task pattern table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Rules in match order; empty means "use the built-in table"
    pub rules: Vec<RoutingRuleConfig>,
}

/// One regex → roles rule as written in a config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRuleConfig {
    pub pattern: String,
    pub roles: Vec<String>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub complexity: Option<String>,
}

impl CompanyConfig {
    /// Load configuration from a JSON file, falling back to defaults when it does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        let config: CompanyConfig = serde_json::from_str(&raw)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write configuration to a JSON file, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// List every problem with this configuration; empty when valid
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.company_name.trim().is_empty() {
            problems.push("company_name must not be empty".to_string());
        }
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            problems.push(format!("log_level '{}' is not a valid level", self.log_level));
        }
        if self.cache.enabled && self.cache.max_size == 0 {
            problems.push("cache.max_size must be greater than zero".to_string());
        }
        if self.cache.enabled && self.cache.ttl_seconds == 0 {
            problems.push("cache.ttl_seconds must be greater than zero".to_string());
        }
        for (i, rule) in self.routing.rules.iter().enumerate() {
            if rule.pattern.is_empty() {
                problems.push(format!("routing.rules[{}] has an empty pattern", i));
            }
            if rule.roles.is_empty() {
                problems.push(format!("routing.rules[{}] names no roles", i));
            }
        }

        problems
    }

    /// Same as [`validate`](Self::validate) but fails on the first problem
    pub fn ensure_valid(&self) -> Result<()> {
        match self.validate().into_iter().next() {
            Some(problem) => Err(AicoError::Config(problem)),
            None => Ok(()),
        }
    }

    /// Look up a setting by dotted key, e.g. `cache.ttl_seconds`
    pub fn get_setting(&self, key: &str) -> Option<Value> {
        let mut current = serde_json::to_value(self).ok()?;
        for part in key.split('.') {
            current = current.get(part)?.clone();
        }
        Some(current)
    }
}
