//! AICO Core - a simulated company of role agents
//!
//! This crate provides the core functionality for AICO, including:
//! - Role agents and the in-memory hub that routes their messages
//! - Keyword routing of task descriptions to roles
//! - Phase planning and a linear workflow engine
//! - Projects, simulated task execution and daily standups

pub mod agents;
pub mod cache;
pub mod coordinator;
pub mod execution;
pub mod planning;
pub mod projects;
pub mod routing;
pub mod standup;
pub mod workflow;

// Re-export key types for convenience
pub use agents::{
    Agent, AgentConfig, AgentMessage, AgentRole, AgentStatus, CommunicationHub, CompanyBuilder,
    CompanyStatus, Department, MessageResponse, MessageType, Priority, RoleAgent, StandupEntry,
};
pub use cache::{CacheManager, CacheStats};
pub use coordinator::{
    ActiveTaskSummary, Assignment, AssignmentStatus, TaskAcceptance, TaskCoordinator,
    TaskStatusReport, UserTask, UserTaskStatus,
};
pub use execution::{ExecutionState, TaskExecutionManager, TaskReport, WorkCategory};
pub use planning::{DurationEstimate, ExecutionPlan, Phase, PhaseAssignee, create_execution_plan};
pub use projects::{Project, ProjectManager, ProjectSpec, ProjectStatus, Task, TaskStatus, TaskTemplate};
pub use routing::{Complexity, TaskAnalysis, TaskPattern, TaskPatternTable, TaskType};
pub use standup::{StandupManager, StandupReport};
pub use workflow::{ExecutionStatus, Workflow, WorkflowEngine, WorkflowExecution, WorkflowStep};
