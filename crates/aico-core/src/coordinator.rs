//! Task coordinator
//!
//! Entry point for user requests. A request is classified, planned, turned
//! into a project with one task per phase, and handed to the owning agents
//! through a generated workflow.

use crate::agents::{AgentMessage, AgentRole, CommunicationHub, MessageType, Priority};
use crate::cache::{CacheManager, CacheStats};
use crate::execution::{TaskExecutionManager, TaskReport};
use crate::planning::{ExecutionPlan, Phase, create_execution_plan};
use crate::projects::{ProjectManager, ProjectSpec, TaskStatus, TaskTemplate};
use crate::routing::{TaskAnalysis, TaskPatternTable};
use crate::workflow::{ExecutionStatus, Workflow, WorkflowEngine, WorkflowStep};
use aico_common::{
    AicoError, COORDINATOR_ID, CompanyConfig, LISTING_DESCRIPTION_CHARS, PROJECT_NAME_CHARS,
    Result, generate_id, short_id, truncate_with_ellipsis,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Days each phase task is given before its deadline
const PHASE_TASK_DAYS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    Completed,
}

/// One phase task handed to one agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: String,
    pub agent_id: String,
    pub role: AgentRole,
    pub phase: String,
    pub status: AssignmentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserTaskStatus {
    InProgress,
    Completed,
}

/// Everything the coordinator tracks for a user request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTask {
    pub id: String,
    pub description: String,
    pub analysis: TaskAnalysis,
    pub execution_plan: ExecutionPlan,
    pub project_id: String,
    pub assignments: Vec<Assignment>,
    pub execution_id: String,
    pub status: UserTaskStatus,
    pub created_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<Value>,
}

/// Reply to a newly submitted request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAcceptance {
    pub task_id: String,
    pub status: String,
    pub message: String,
    pub agents_assigned: Vec<AgentRole>,
    pub estimated_completion: DateTime<Utc>,
    pub execution_plan: Vec<Phase>,
    pub project_id: String,
    pub workflow_status: ExecutionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentProgress {
    pub agent: String,
    pub phase: String,
    pub status: AssignmentStatus,
    pub active_tasks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusReport {
    pub task_id: String,
    pub description: String,
    pub status: UserTaskStatus,
    pub progress: Vec<AssignmentProgress>,
    pub created_at: DateTime<Utc>,
    pub estimated_completion: DateTime<Utc>,
}

/// Listing entry for an active request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTaskSummary {
    pub task_id: String,
    pub description: String,
    pub status: UserTaskStatus,
    pub agents_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Lowercased with whitespace collapsed, so trivially different phrasings share a cache entry
fn cache_key(description: &str) -> String {
    description
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Coordinates user requests across the company
pub struct TaskCoordinator {
    hub: Arc<CommunicationHub>,
    projects: Arc<ProjectManager>,
    workflows: Arc<WorkflowEngine>,
    executor: Arc<TaskExecutionManager>,
    patterns: TaskPatternTable,
    analysis_cache: Option<CacheManager<TaskAnalysis>>,
    active_tasks: RwLock<HashMap<String, UserTask>>,
    history: RwLock<Vec<UserTask>>,
}

impl TaskCoordinator {
    pub fn new(
        hub: Arc<CommunicationHub>,
        projects: Arc<ProjectManager>,
        workflows: Arc<WorkflowEngine>,
        executor: Arc<TaskExecutionManager>,
        patterns: TaskPatternTable,
        analysis_cache: Option<CacheManager<TaskAnalysis>>,
    ) -> Self {
        Self {
            hub,
            projects,
            workflows,
            executor,
            patterns,
            analysis_cache,
            active_tasks: RwLock::new(HashMap::new()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Wire up a coordinator and its collaborators around an existing hub
    pub fn from_config(hub: Arc<CommunicationHub>, config: &CompanyConfig) -> Result<Self> {
        config.ensure_valid()?;
        let patterns = TaskPatternTable::from_config(&config.routing.rules)?;
        let projects = Arc::new(ProjectManager::new(hub.clone()));
        let workflows = Arc::new(WorkflowEngine::new(
            hub.clone(),
            projects.clone(),
            config.workflow.clone(),
        ));
        let executor = Arc::new(TaskExecutionManager::new(&config.execution));
        let cache = config
            .cache
            .enabled
            .then(|| CacheManager::from_config(&config.cache));

        Ok(Self::new(hub, projects, workflows, executor, patterns, cache))
    }

    pub fn hub(&self) -> &Arc<CommunicationHub> {
        &self.hub
    }

    pub fn projects(&self) -> &Arc<ProjectManager> {
        &self.projects
    }

    pub fn workflows(&self) -> &Arc<WorkflowEngine> {
        &self.workflows
    }

    pub fn executor(&self) -> &Arc<TaskExecutionManager> {
        &self.executor
    }

    /// Classify a description, reusing a cached analysis when one is fresh
    pub async fn analyze_task(&self, description: &str) -> TaskAnalysis {
        let key = cache_key(description);
        if let Some(cache) = &self.analysis_cache {
            if let Some(hit) = cache.get(&key).await {
                debug!("Analysis cache hit for '{}'", key);
                return hit;
            }
        }

        let analysis = self.patterns.analyze(description);
        if let Some(cache) = &self.analysis_cache {
            cache.set(key, analysis.clone(), None).await;
        }
        analysis
    }

    pub async fn cache_stats(&self) -> Option<CacheStats> {
        match &self.analysis_cache {
            Some(cache) => Some(cache.stats().await),
            None => None,
        }
    }

    /// Accept a user request and hand its phases to agents
    pub async fn process_user_task(
        &self,
        description: &str,
        priority: Priority,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<TaskAcceptance> {
        let task_id = generate_id();
        let analysis = self.analyze_task(description).await;
        let plan = create_execution_plan(&analysis, priority, deadline);

        let now = Utc::now();
        let project = self
            .projects
            .create_project(ProjectSpec {
                name: format!(
                    "User Task: {}",
                    truncate_with_ellipsis(description, PROJECT_NAME_CHARS)
                ),
                description: description.to_string(),
                owner: COORDINATOR_ID.to_string(),
                priority,
                start_date: now,
                target_date: plan.estimated_completion,
                budget: None,
                stakeholders: vec![
                    COORDINATOR_ID.to_string(),
                    AgentRole::Ceo.default_agent_id(),
                ],
                dependencies: Vec::new(),
                success_metrics: vec![
                    "Task completed successfully".to_string(),
                    "User satisfaction achieved".to_string(),
                ],
            })
            .await;

        let (assignments, steps) = self
            .assign_phases(&task_id, &project.id, &plan, &analysis)
            .await?;

        let execution_id = self.start_execution(&task_id, &project.id, steps).await?;
        let workflow_status = self.workflows.get_execution(&execution_id).await?.status;
        if workflow_status == ExecutionStatus::Failed {
            warn!("Hand-off workflow for task {} failed", short_id(&task_id));
        }

        let acceptance = TaskAcceptance {
            task_id: task_id.clone(),
            status: "accepted".to_string(),
            message: format!("Task assigned to {} agents", analysis.required_roles.len()),
            agents_assigned: analysis.required_roles.clone(),
            estimated_completion: plan.estimated_completion,
            execution_plan: plan.phases.clone(),
            project_id: project.id.clone(),
            workflow_status,
        };

        self.active_tasks.write().await.insert(
            task_id.clone(),
            UserTask {
                id: task_id.clone(),
                description: description.to_string(),
                analysis,
                execution_plan: plan,
                project_id: project.id,
                assignments,
                execution_id,
                status: UserTaskStatus::InProgress,
                created_at: now,
                deadline,
                completed_at: None,
                result: None,
            },
        );

        info!("Accepted task {}: {}", short_id(&task_id), acceptance.message);
        Ok(acceptance)
    }

    /// Create one project task per owned phase and the message step that delivers it
    async fn assign_phases(
        &self,
        task_id: &str,
        project_id: &str,
        plan: &ExecutionPlan,
        analysis: &TaskAnalysis,
    ) -> Result<(Vec<Assignment>, Vec<WorkflowStep>)> {
        let mut assignments = Vec::new();
        let mut steps = Vec::new();

        for (index, phase) in plan.phases.iter().enumerate() {
            let Some(role) = phase.owner(&analysis.required_roles) else {
                debug!("Phase {} has no single owner, skipping", phase.name);
                continue;
            };
            let agent_id = role.default_agent_id();

            let template = TaskTemplate {
                title: phase.name.clone(),
                description: format!("Complete {} phase of the user task", phase.name),
                priority: plan.priority,
                duration_days: Some(PHASE_TASK_DAYS),
                ..Default::default()
            };
            let task = self
                .projects
                .create_task_from_template(project_id, &template)
                .await?;
            let task = self.projects.set_assignee(&task.id, &agent_id).await?;

            let mut content = serde_json::to_value(&task)?;
            if let Value::Object(fields) = &mut content {
                fields.insert("phase".to_string(), json!(phase.name));
                fields.insert("phase_order".to_string(), json!(index + 1));
                fields.insert("user_task_id".to_string(), json!(task_id));
            }
            steps.push(WorkflowStep::SendMessage {
                sender: COORDINATOR_ID.to_string(),
                recipient: agent_id.clone(),
                message_type: MessageType::TaskAssignment,
                content,
                priority: Priority::High,
            });

            assignments.push(Assignment {
                task_id: task.id,
                agent_id,
                role,
                phase: phase.name.clone(),
                status: AssignmentStatus::Assigned,
            });
        }

        Ok((assignments, steps))
    }

    async fn start_execution(
        &self,
        task_id: &str,
        project_id: &str,
        steps: Vec<WorkflowStep>,
    ) -> Result<String> {
        let mut workflow = Workflow::new(
            format!("user_task_{}", task_id),
            format!("User Task Execution {}", short_id(task_id)),
            "Automated execution of user-assigned task",
            COORDINATOR_ID,
        );
        workflow.steps = steps;
        workflow.triggers = vec![COORDINATOR_ID.to_string()];
        workflow.conditions = vec!["agents_available".to_string()];
        workflow.outputs = vec!["completed_task".to_string()];

        let workflow_id = workflow.id.clone();
        self.workflows.register_workflow(workflow).await;
        self.workflows
            .trigger_workflow(
                &workflow_id,
                json!({ "task_id": task_id, "project_id": project_id }),
            )
            .await
    }

    async fn find_task(&self, task_id: &str) -> Result<UserTask> {
        if let Some(task) = self.active_tasks.read().await.get(task_id) {
            return Ok(task.clone());
        }
        self.history
            .read()
            .await
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
            .ok_or_else(|| AicoError::TaskNotFound(task_id.to_string()))
    }

    /// Progress of a request, per assignment
    pub async fn get_task_status(&self, task_id: &str) -> Result<TaskStatusReport> {
        let task = self.find_task(task_id).await?;

        let mut progress = Vec::new();
        for assignment in &task.assignments {
            if let Some(status) = self.hub.agent_status(&assignment.agent_id).await {
                progress.push(AssignmentProgress {
                    agent: status.name,
                    phase: assignment.phase.clone(),
                    status: assignment.status,
                    active_tasks: status.active_tasks,
                });
            }
        }

        Ok(TaskStatusReport {
            task_id: task.id,
            description: task.description,
            status: task.status,
            progress,
            created_at: task.created_at,
            estimated_completion: task.execution_plan.estimated_completion,
        })
    }

    /// Requests still in progress, oldest first
    pub async fn list_active_tasks(&self) -> Vec<ActiveTaskSummary> {
        let mut active: Vec<ActiveTaskSummary> = self
            .active_tasks
            .read()
            .await
            .values()
            .map(|task| ActiveTaskSummary {
                task_id: task.id.clone(),
                description: truncate_with_ellipsis(&task.description, LISTING_DESCRIPTION_CHARS),
                status: task.status,
                agents_count: task.assignments.len(),
                created_at: task.created_at,
            })
            .collect();
        active.sort_by_key(|t| t.created_at);
        active
    }

    /// Mark a request completed and move it to history
    pub async fn complete_task(&self, task_id: &str, result: Value) -> Result<UserTask> {
        let mut task = self
            .active_tasks
            .write()
            .await
            .remove(task_id)
            .ok_or_else(|| AicoError::TaskNotFound(task_id.to_string()))?;

        task.status = UserTaskStatus::Completed;
        task.completed_at = Some(Utc::now());
        task.result = Some(result);
        self.history.write().await.push(task.clone());
        info!("Task {} completed", short_id(task_id));
        Ok(task)
    }

    /// Have every assigned agent do its phase, then complete the request
    pub async fn run_task(&self, task_id: &str) -> Result<Vec<TaskReport>> {
        let task = self
            .active_tasks
            .read()
            .await
            .get(task_id)
            .cloned()
            .ok_or_else(|| AicoError::TaskNotFound(task_id.to_string()))?;
        let hours = task.analysis.complexity.hours_per_role();

        // Deliver pending assignments before any completion notices
        self.hub.process_all().await;

        let mut reports = Vec::new();
        for (index, assignment) in task.assignments.iter().enumerate() {
            if assignment.status == AssignmentStatus::Completed {
                continue;
            }

            let project_task = self
                .projects
                .update_task_status(&assignment.task_id, TaskStatus::InProgress)
                .await?;
            let report = self
                .executor
                .execute_task(&project_task, &assignment.agent_id, hours)
                .await;
            self.projects
                .update_task_status(&assignment.task_id, TaskStatus::Completed)
                .await?;

            let notice = AgentMessage::new(
                COORDINATOR_ID,
                assignment.agent_id.clone(),
                MessageType::StatusUpdate,
                json!({ "task_id": assignment.task_id, "status": TaskStatus::Completed }),
            );
            if let Err(e) = self.hub.route_message(notice).await {
                warn!("Could not notify {}: {}", assignment.agent_id, e);
            }

            if let Some(active) = self.active_tasks.write().await.get_mut(task_id) {
                active.assignments[index].status = AssignmentStatus::Completed;
            }
            reports.push(report);
        }

        self.hub.process_all().await;

        let summary = json!({
            "reports": reports.iter().map(|r| r.report_id.clone()).collect::<Vec<_>>(),
            "phases_completed": reports.len(),
        });
        self.complete_task(task_id, summary).await?;
        Ok(reports)
    }

    /// Completed requests, oldest first
    pub async fn history(&self) -> Vec<UserTask> {
        self.history.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::CompanyBuilder;
    use crate::projects::ProjectStatus;
    use crate::routing::TaskType;

    async fn coordinator() -> TaskCoordinator {
        let hub = Arc::new(CommunicationHub::new());
        CompanyBuilder::staff(&hub).await.unwrap();
        let mut config = CompanyConfig::default();
        config.workflow.max_wait_secs = 0;
        config.execution.simulated_work_millis = 0;
        TaskCoordinator::from_config(hub, &config).unwrap()
    }

    #[tokio::test]
    async fn test_development_task_is_assigned_per_phase() {
        let coordinator = coordinator().await;
        let acceptance = coordinator
            .process_user_task("Develop a booking platform", Priority::High, None)
            .await
            .unwrap();

        assert_eq!(acceptance.status, "accepted");
        assert_eq!(acceptance.message, "Task assigned to 5 agents");
        assert_eq!(acceptance.execution_plan.len(), 5);
        assert_eq!(acceptance.workflow_status, ExecutionStatus::Completed);

        let tasks = coordinator
            .projects()
            .project_tasks(&acceptance.project_id)
            .await
            .unwrap();
        assert_eq!(tasks.len(), 5);
        assert_eq!(tasks[0].title, "Requirements Analysis");
        assert_eq!(tasks[0].assigned_to.as_deref(), Some("product_manager_001"));
        assert_eq!(tasks[4].assigned_to.as_deref(), Some("devops_engineer_001"));

        let hub = coordinator.hub();
        assert_eq!(
            hub.agent_status("product_manager_001").await.unwrap().pending_messages,
            1
        );
        hub.process_all().await;
        assert_eq!(
            hub.agent_status("product_manager_001").await.unwrap().active_tasks,
            1
        );
    }

    #[tokio::test]
    async fn test_strategic_execution_phase_is_skipped() {
        let coordinator = coordinator().await;
        let acceptance = coordinator
            .process_user_task("Plan the product roadmap", Priority::Medium, None)
            .await
            .unwrap();
        assert_eq!(acceptance.execution_plan.len(), 4);

        let status = coordinator.get_task_status(&acceptance.task_id).await.unwrap();
        let phases: Vec<&str> = status.progress.iter().map(|p| p.phase.as_str()).collect();
        assert_eq!(
            phases,
            vec!["Analysis & Research", "Strategy Formulation", "Implementation Planning"]
        );
    }

    #[tokio::test]
    async fn test_general_task_assigns_execution_to_first_role() {
        let coordinator = coordinator().await;
        let acceptance = coordinator
            .process_user_task("Tidy the break room", Priority::Low, None)
            .await
            .unwrap();
        assert_eq!(acceptance.agents_assigned, vec![AgentRole::Ceo]);

        let tasks = coordinator
            .projects()
            .project_tasks(&acceptance.project_id)
            .await
            .unwrap();
        let owners: Vec<_> = tasks.iter().map(|t| t.assigned_to.clone().unwrap()).collect();
        assert_eq!(owners, vec!["ceo_001", "chro_001", "ceo_001", "ceo_001"]);
    }

    #[tokio::test]
    async fn test_analysis_is_cached() {
        let coordinator = coordinator().await;
        let first = coordinator.analyze_task("Launch a blog").await;
        let second = coordinator.analyze_task("  LAUNCH a   blog ").await;
        assert_eq!(first, second);
        assert_eq!(first.task_type, TaskType::Marketing);

        let stats = coordinator.cache_stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_oversized_cache_ttl_is_accepted() {
        let hub = Arc::new(CommunicationHub::new());
        CompanyBuilder::staff(&hub).await.unwrap();
        let mut config = CompanyConfig::default();
        config.workflow.max_wait_secs = 0;
        config.cache.ttl_seconds = u64::MAX;
        assert!(config.validate().is_empty());

        let coordinator = TaskCoordinator::from_config(hub, &config).unwrap();
        coordinator
            .process_user_task("Launch a blog", Priority::Medium, None)
            .await
            .unwrap();
        coordinator.analyze_task("Launch a blog").await;
        assert_eq!(coordinator.cache_stats().await.unwrap().hits, 1);
    }

    #[tokio::test]
    async fn test_run_task_completes_everything() {
        let coordinator = coordinator().await;
        let acceptance = coordinator
            .process_user_task("Develop a booking platform", Priority::High, None)
            .await
            .unwrap();

        let reports = coordinator.run_task(&acceptance.task_id).await.unwrap();
        assert_eq!(reports.len(), 5);

        let project = coordinator
            .projects()
            .get_project(&acceptance.project_id)
            .await
            .unwrap();
        assert_eq!(project.status, ProjectStatus::Completed);

        let pm = coordinator
            .hub()
            .agent_status("product_manager_001")
            .await
            .unwrap();
        assert_eq!(pm.active_tasks, 0);
        assert_eq!(pm.completed_tasks, 1);

        assert!(coordinator.list_active_tasks().await.is_empty());
        let history = coordinator.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, UserTaskStatus::Completed);
        assert_eq!(
            coordinator
                .get_task_status(&acceptance.task_id)
                .await
                .unwrap()
                .status,
            UserTaskStatus::Completed
        );
        assert_eq!(coordinator.executor().all_reports().await.len(), 5);
    }

    #[tokio::test]
    async fn test_listing_and_completion() {
        let coordinator = coordinator().await;
        let long = "Write a contract ".repeat(10);
        let acceptance = coordinator
            .process_user_task(&long, Priority::Medium, None)
            .await
            .unwrap();

        let listed = coordinator.list_active_tasks().await;
        assert_eq!(listed.len(), 1);
        assert!(listed[0].description.ends_with("..."));
        assert_eq!(listed[0].description.chars().count(), 103);

        coordinator
            .complete_task(&acceptance.task_id, json!({"ok": true}))
            .await
            .unwrap();
        assert!(matches!(
            coordinator.complete_task(&acceptance.task_id, json!({})).await,
            Err(AicoError::TaskNotFound(_))
        ));
        assert!(matches!(
            coordinator.run_task("missing").await,
            Err(AicoError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_agents_fail_the_handoff() {
        let hub = Arc::new(CommunicationHub::new());
        let mut config = CompanyConfig::default();
        config.workflow.max_wait_secs = 0;
        let coordinator = TaskCoordinator::from_config(hub, &config).unwrap();

        let acceptance = coordinator
            .process_user_task("Tidy the break room", Priority::Low, None)
            .await
            .unwrap();
        assert_eq!(acceptance.workflow_status, ExecutionStatus::Failed);
    }
}
