//! AICO Common - Shared utilities and types
//!
//! This crate provides common error types, configuration structs,
//! and utility functions used across all AICO components.

pub mod config;
pub mod constants;
pub mod error;
pub mod utils;

// Re-export commonly used items
pub use config::{
    CacheConfig, CompanyConfig, ExecutionConfig, RoutingConfig, RoutingRuleConfig, WorkflowConfig,
};
pub use constants::*;
pub use error::{AicoError, Result};
pub use utils::*;
