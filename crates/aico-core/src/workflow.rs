//! Workflow engine
//!
//! A workflow is a linear list of steps. Triggering one runs every step in
//! order and stops at the first failure. Executions are kept in memory only.

use crate::agents::{AgentMessage, CommunicationHub, MessageType, Priority};
use crate::projects::{ProjectManager, TaskTemplate};
use aico_common::{AicoError, Result, WORKFLOW_ENGINE_ID, WorkflowConfig, generate_id};
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

fn default_sender() -> String {
    WORKFLOW_ENGINE_ID.to_string()
}

fn default_condition() -> Value {
    Value::Bool(true)
}

/// One step of a workflow, tagged by `type` in JSON
///
/// A step whose `type` is not recognized parses as [`WorkflowStep::Unknown`]
/// and keeps the raw tag, so the failure can name it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowStep {
    SendMessage {
        sender: String,
        recipient: String,
        message_type: MessageType,
        content: Value,
        priority: Priority,
    },
    CreateTask {
        /// Falls back to `project_id` in the trigger data
        project_id: Option<String>,
        task_data: TaskTemplate,
    },
    WaitForCompletion {
        /// Seconds; capped by the engine's `max_wait_secs`
        timeout: Option<u64>,
    },
    Conditional {
        condition: Value,
    },
    Unknown {
        step_type: String,
    },
}

impl WorkflowStep {
    pub fn type_name(&self) -> &str {
        match self {
            WorkflowStep::SendMessage { .. } => "send_message",
            WorkflowStep::CreateTask { .. } => "create_task",
            WorkflowStep::WaitForCompletion { .. } => "wait_for_completion",
            WorkflowStep::Conditional { .. } => "conditional",
            WorkflowStep::Unknown { step_type } => step_type,
        }
    }
}

/// Wire form of the step types the engine knows how to run
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownStep {
    SendMessage {
        #[serde(default = "default_sender")]
        sender: String,
        recipient: String,
        message_type: MessageType,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        priority: Priority,
    },
    CreateTask {
        #[serde(default)]
        project_id: Option<String>,
        #[serde(default)]
        task_data: TaskTemplate,
    },
    WaitForCompletion {
        #[serde(default)]
        timeout: Option<u64>,
    },
    Conditional {
        #[serde(default = "default_condition")]
        condition: Value,
    },
}

const KNOWN_STEP_TYPES: [&str; 4] = [
    "send_message",
    "create_task",
    "wait_for_completion",
    "conditional",
];

impl From<KnownStep> for WorkflowStep {
    fn from(step: KnownStep) -> Self {
        match step {
            KnownStep::SendMessage {
                sender,
                recipient,
                message_type,
                content,
                priority,
            } => WorkflowStep::SendMessage {
                sender,
                recipient,
                message_type,
                content,
                priority,
            },
            KnownStep::CreateTask {
                project_id,
                task_data,
            } => WorkflowStep::CreateTask {
                project_id,
                task_data,
            },
            KnownStep::WaitForCompletion { timeout } => WorkflowStep::WaitForCompletion { timeout },
            KnownStep::Conditional { condition } => WorkflowStep::Conditional { condition },
        }
    }
}

impl<'de> Deserialize<'de> for WorkflowStep {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let tag = value.get("type").and_then(Value::as_str).unwrap_or_default();

        if KNOWN_STEP_TYPES.contains(&tag) {
            return KnownStep::deserialize(value)
                .map(WorkflowStep::from)
                .map_err(de::Error::custom);
        }

        // A serialized Unknown step carries its original tag in `step_type`
        let step_type = match value.get("step_type").and_then(Value::as_str) {
            Some(raw) if tag == "unknown" => raw,
            _ => tag,
        };
        Ok(WorkflowStep::Unknown {
            step_type: step_type.to_string(),
        })
    }
}

/// A registered sequence of steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Workflow {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
            triggers: Vec::new(),
            conditions: Vec::new(),
            outputs: Vec::new(),
            created_by: created_by.into(),
            created_at: Utc::now(),
            is_active: true,
        }
    }

    pub fn with_step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

/// Outcome of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_index: usize,
    pub step_type: String,
    pub success: bool,
    pub error: Option<String>,
    /// Step-specific details, e.g. `message_id` or `condition_met`
    pub data: Value,
}

impl StepResult {
    fn ok(step_index: usize, step: &WorkflowStep, data: Value) -> Self {
        Self {
            step_index,
            step_type: step.type_name().to_string(),
            success: true,
            error: None,
            data,
        }
    }

    fn failed(step_index: usize, step: &WorkflowStep, error: impl Into<String>) -> Self {
        Self {
            step_index,
            step_type: step.type_name().to_string(),
            success: false,
            error: Some(error.into()),
            data: Value::Null,
        }
    }
}

/// Record of one workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub id: String,
    pub workflow_id: String,
    pub status: ExecutionStatus,
    pub current_step: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub trigger_data: Value,
    pub step_results: Vec<StepResult>,
    /// Steps not run because a conditional step evaluated false
    pub skipped_steps: usize,
}

/// JSON truthiness: null, false, zero and empty values are false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Runs workflows against the hub and project manager
pub struct WorkflowEngine {
    hub: Arc<CommunicationHub>,
    projects: Arc<ProjectManager>,
    config: WorkflowConfig,
    workflows: RwLock<HashMap<String, Workflow>>,
    executions: RwLock<HashMap<String, WorkflowExecution>>,
}

impl WorkflowEngine {
    pub fn new(
        hub: Arc<CommunicationHub>,
        projects: Arc<ProjectManager>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            hub,
            projects,
            config,
            workflows: RwLock::new(HashMap::new()),
            executions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a workflow, replacing any with the same id
    pub async fn register_workflow(&self, workflow: Workflow) {
        info!("Registered workflow: {}", workflow.name);
        self.workflows
            .write()
            .await
            .insert(workflow.id.clone(), workflow);
    }

    pub async fn get_workflow(&self, workflow_id: &str) -> Result<Workflow> {
        self.workflows
            .read()
            .await
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| AicoError::WorkflowNotFound(workflow_id.to_string()))
    }

    pub async fn list_workflows(&self) -> Vec<Workflow> {
        let mut workflows: Vec<Workflow> = self.workflows.read().await.values().cloned().collect();
        workflows.sort_by(|a, b| a.id.cmp(&b.id));
        workflows
    }

    pub async fn set_active(&self, workflow_id: &str, active: bool) -> Result<()> {
        let mut workflows = self.workflows.write().await;
        let workflow = workflows
            .get_mut(workflow_id)
            .ok_or_else(|| AicoError::WorkflowNotFound(workflow_id.to_string()))?;
        workflow.is_active = active;
        Ok(())
    }

    /// Run a workflow to completion and return the execution id
    ///
    /// Step failures do not make this an error; they are recorded in the
    /// execution, whose status becomes `Failed`.
    pub async fn trigger_workflow(&self, workflow_id: &str, trigger_data: Value) -> Result<String> {
        let workflow = self.get_workflow(workflow_id).await?;
        if !workflow.is_active {
            return Err(AicoError::WorkflowInactive(workflow_id.to_string()));
        }

        let mut execution = WorkflowExecution {
            id: generate_id(),
            workflow_id: workflow_id.to_string(),
            status: ExecutionStatus::Running,
            current_step: 0,
            start_time: Utc::now(),
            end_time: None,
            trigger_data,
            step_results: Vec::new(),
            skipped_steps: 0,
        };
        let execution_id = execution.id.clone();
        self.executions
            .write()
            .await
            .insert(execution_id.clone(), execution.clone());

        self.execute_workflow(&workflow, &mut execution).await;

        self.executions
            .write()
            .await
            .insert(execution_id.clone(), execution);
        Ok(execution_id)
    }

    async fn execute_workflow(&self, workflow: &Workflow, execution: &mut WorkflowExecution) {
        for (index, step) in workflow.steps.iter().enumerate() {
            execution.current_step = index;
            let result = self.execute_step(index, step, &execution.trigger_data).await;
            let success = result.success;
            let halt = matches!(step, WorkflowStep::Conditional { .. })
                && result.data.get("condition_met") == Some(&Value::Bool(false));
            execution.step_results.push(result);

            if !success {
                execution.status = ExecutionStatus::Failed;
                execution.end_time = Some(Utc::now());
                error!("Workflow {} failed at step {}", workflow.name, index);
                return;
            }
            if halt {
                execution.skipped_steps = workflow.steps.len() - index - 1;
                debug!(
                    "Workflow {} condition not met, skipping {} steps",
                    workflow.name, execution.skipped_steps
                );
                break;
            }
        }

        execution.status = ExecutionStatus::Completed;
        execution.end_time = Some(Utc::now());
        info!("Workflow {} completed successfully", workflow.name);
    }

    async fn execute_step(&self, index: usize, step: &WorkflowStep, trigger_data: &Value) -> StepResult {
        match step {
            WorkflowStep::SendMessage {
                sender,
                recipient,
                message_type,
                content,
                priority,
            } => {
                let content = if content.is_null() { json!({}) } else { content.clone() };
                let message = AgentMessage::new(sender.clone(), recipient.clone(), *message_type, content)
                    .with_priority(*priority);
                let message_id = message.id.clone();
                match self.hub.route_message(message).await {
                    Ok(()) => StepResult::ok(index, step, json!({ "message_id": message_id })),
                    Err(e) => StepResult::failed(index, step, e.to_string()),
                }
            }
            WorkflowStep::CreateTask {
                project_id,
                task_data,
            } => {
                let project_id = project_id.clone().or_else(|| {
                    trigger_data
                        .get("project_id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                });
                let Some(project_id) = project_id else {
                    return StepResult::failed(index, step, "create_task step needs a project_id");
                };
                match self
                    .projects
                    .create_task_from_template(&project_id, task_data)
                    .await
                {
                    Ok(task) => StepResult::ok(
                        index,
                        step,
                        json!({ "task_created": true, "task_id": task.id }),
                    ),
                    Err(e) => StepResult::failed(index, step, e.to_string()),
                }
            }
            WorkflowStep::WaitForCompletion { timeout } => {
                let requested = timeout.unwrap_or(self.config.default_wait_timeout_secs);
                let waited = requested.min(self.config.max_wait_secs);
                tokio::time::sleep(Duration::from_secs(waited)).await;
                StepResult::ok(index, step, json!({ "waited": true, "seconds": waited }))
            }
            WorkflowStep::Conditional { condition } => StepResult::ok(
                index,
                step,
                json!({ "condition": condition, "condition_met": is_truthy(condition) }),
            ),
            WorkflowStep::Unknown { step_type } => {
                warn!("Unknown step type '{}' at step {}", step_type, index);
                StepResult::failed(index, step, format!("Unknown step type: {}", step_type))
            }
        }
    }

    pub async fn get_execution(&self, execution_id: &str) -> Result<WorkflowExecution> {
        self.executions
            .read()
            .await
            .get(execution_id)
            .cloned()
            .ok_or_else(|| AicoError::ExecutionNotFound(execution_id.to_string()))
    }

    /// All executions, oldest first
    pub async fn list_executions(&self) -> Vec<WorkflowExecution> {
        let mut executions: Vec<WorkflowExecution> =
            self.executions.read().await.values().cloned().collect();
        executions.sort_by_key(|e| e.start_time);
        executions
    }
}
