//! Common constants used across AICO

/// Agent id used by the task coordinator when it sends messages
pub const COORDINATOR_ID: &str = "task_coordinator";

/// Default sender for messages emitted by workflow steps
pub const WORKFLOW_ENGINE_ID: &str = "workflow_engine";

/// Sender id used by the project manager
pub const PROJECT_MANAGER_ID: &str = "project_manager";

/// Sender id used by the standup manager
pub const STANDUP_MANAGER_ID: &str = "standup_manager";

/// Suffix appended to a role name to form its default agent id
pub const DEFAULT_AGENT_SUFFIX: &str = "_001";

/// Maximum number of keywords extracted from a task description
pub const MAX_KEYWORDS: usize = 10;

/// Characters of a task description kept in a project name
pub const PROJECT_NAME_CHARS: usize = 50;

/// Characters of a task description kept in listings
pub const LISTING_DESCRIPTION_CHARS: usize = 100;

/// Default number of days a templated task is given before its deadline
pub const DEFAULT_TASK_DURATION_DAYS: i64 = 7;

/// Estimated-hours multipliers per complexity level
pub mod hours {
    pub const HIGH: u32 = 8;
    pub const MEDIUM: u32 = 4;
    pub const LOW: u32 = 2;
}

/// Workflow engine defaults in seconds
pub mod workflow {
    pub const DEFAULT_WAIT_TIMEOUT: u64 = 60;
    pub const MAX_WAIT: u64 = 1;
}

/// Cache defaults
pub mod cache {
    pub const DEFAULT_TTL_SECONDS: u64 = 3600;
    pub const DEFAULT_MAX_SIZE: usize = 1000;
}
