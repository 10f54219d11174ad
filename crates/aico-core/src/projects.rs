//! Projects and tasks
//!
//! The project manager owns every project and task in the company and hands
//! tasks to agents through the communication hub.

use crate::agents::{AgentMessage, CommunicationHub, MessageType, Priority};
use aico_common::{
    AicoError, DEFAULT_TASK_DURATION_DAYS, PROJECT_MANAGER_ID, Result, generate_id,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Blocked,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub target_date: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub stakeholders: Vec<String>,
    /// Task ids in creation order
    pub tasks: Vec<String>,
    pub dependencies: Vec<String>,
    pub success_metrics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A unit of work, possibly assigned to an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub assigned_to: Option<String>,
    pub created_by: String,
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to open a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: String,
    pub description: String,
    pub owner: String,
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub target_date: DateTime<Utc>,
    pub budget: Option<f64>,
    pub stakeholders: Vec<String>,
    pub dependencies: Vec<String>,
    pub success_metrics: Vec<String>,
}

/// Blueprint for a task inside a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskTemplate {
    pub title: String,
    pub description: String,
    /// Agent that receives a task_assignment message once the task exists
    pub assigned_to: Option<String>,
    pub priority: Priority,
    /// Days until the deadline; defaults to a week
    pub duration_days: Option<i64>,
    pub dependencies: Vec<String>,
    pub deliverables: Vec<String>,
}

/// Blueprint for a whole project and its tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTemplate {
    pub name: String,
    pub owner: String,
    pub priority: Priority,
    pub duration_days: i64,
    pub stakeholders: Vec<String>,
    pub success_metrics: Vec<String>,
    pub task_templates: Vec<TaskTemplate>,
}

#[derive(Default)]
struct ProjectState {
    projects: HashMap<String, Project>,
    tasks: HashMap<String, Task>,
    templates: HashMap<String, ProjectTemplate>,
}

/// Manages projects and coordinates work across agents
pub struct ProjectManager {
    state: RwLock<ProjectState>,
    hub: Arc<CommunicationHub>,
}

impl ProjectManager {
    pub fn new(hub: Arc<CommunicationHub>) -> Self {
        Self {
            state: RwLock::new(ProjectState::default()),
            hub,
        }
    }

    /// Create a new project in the planning state
    pub async fn create_project(&self, spec: ProjectSpec) -> Project {
        let now = Utc::now();
        let project = Project {
            id: generate_id(),
            name: spec.name,
            description: spec.description,
            owner: spec.owner,
            status: ProjectStatus::Planning,
            priority: spec.priority,
            start_date: spec.start_date,
            target_date: spec.target_date,
            completion_date: None,
            budget: spec.budget,
            stakeholders: spec.stakeholders,
            tasks: Vec::new(),
            dependencies: spec.dependencies,
            success_metrics: spec.success_metrics,
            created_at: now,
            updated_at: now,
        };

        info!("Created project: {}", project.name);
        self.state
            .write()
            .await
            .projects
            .insert(project.id.clone(), project.clone());
        project
    }

    /// Make a template available to [`create_project_from_template`](Self::create_project_from_template)
    pub async fn register_template(&self, key: impl Into<String>, template: ProjectTemplate) {
        let key = key.into();
        debug!("Registered project template: {}", key);
        self.state.write().await.templates.insert(key, template);
    }

    /// Open a project from a registered template and create its tasks
    pub async fn create_project_from_template(
        &self,
        template_key: &str,
        name: Option<String>,
        description: impl Into<String>,
    ) -> Result<Project> {
        let template = self
            .state
            .read()
            .await
            .templates
            .get(template_key)
            .cloned()
            .ok_or_else(|| AicoError::TemplateNotFound(template_key.to_string()))?;

        // Every assignee must exist before anything is created
        for agent_id in template
            .task_templates
            .iter()
            .filter_map(|t| t.assigned_to.as_deref())
        {
            if !self.hub.has_agent(agent_id).await {
                return Err(AicoError::AgentNotFound(agent_id.to_string()));
            }
        }

        let now = Utc::now();
        let project = self
            .create_project(ProjectSpec {
                name: name.unwrap_or_else(|| template.name.clone()),
                description: description.into(),
                owner: template.owner.clone(),
                priority: template.priority,
                start_date: now,
                target_date: now + Duration::days(template.duration_days),
                budget: None,
                stakeholders: template.stakeholders.clone(),
                dependencies: Vec::new(),
                success_metrics: template.success_metrics.clone(),
            })
            .await;

        for task_template in &template.task_templates {
            self.create_task_from_template(&project.id, task_template)
                .await?;
        }

        self.get_project(&project.id).await
    }

    /// Create a task inside a project; an assignee gets a task_assignment message
    pub async fn create_task_from_template(
        &self,
        project_id: &str,
        template: &TaskTemplate,
    ) -> Result<Task> {
        if let Some(agent_id) = &template.assigned_to {
            if !self.hub.has_agent(agent_id).await {
                return Err(AicoError::AgentNotFound(agent_id.clone()));
            }
        }

        let now = Utc::now();
        let days = template.duration_days.unwrap_or(DEFAULT_TASK_DURATION_DAYS);
        let task = Task {
            id: generate_id(),
            title: template.title.clone(),
            description: template.description.clone(),
            assigned_to: None,
            created_by: PROJECT_MANAGER_ID.to_string(),
            priority: template.priority,
            status: TaskStatus::Pending,
            dependencies: template.dependencies.clone(),
            deliverables: template.deliverables.clone(),
            deadline: Some(now + Duration::days(days)),
            created_at: now,
            updated_at: now,
        };

        {
            let mut state = self.state.write().await;
            let project = state
                .projects
                .get_mut(project_id)
                .ok_or_else(|| AicoError::ProjectNotFound(project_id.to_string()))?;
            project.tasks.push(task.id.clone());
            project.updated_at = now;
            state.tasks.insert(task.id.clone(), task.clone());
        }
        debug!("Created task '{}' in project {}", task.title, project_id);

        if let Some(agent_id) = &template.assigned_to {
            let assigned = self.assign_task_to_agent(&task.id, agent_id).await;
            if assigned.is_err() {
                self.remove_task(project_id, &task.id).await;
            }
            return assigned;
        }
        Ok(task)
    }

    async fn remove_task(&self, project_id: &str, task_id: &str) {
        let mut state = self.state.write().await;
        state.tasks.remove(task_id);
        if let Some(project) = state.projects.get_mut(project_id) {
            project.tasks.retain(|id| id != task_id);
        }
        debug!("Dropped task {} from project {}", task_id, project_id);
    }

    /// Record `agent_id` as the task's owner without notifying it
    pub async fn set_assignee(&self, task_id: &str, agent_id: &str) -> Result<Task> {
        let mut state = self.state.write().await;
        let task = state
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| AicoError::TaskNotFound(task_id.to_string()))?;
        task.assigned_to = Some(agent_id.to_string());
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    /// Assign a task and deliver it to the agent's inbox
    pub async fn assign_task_to_agent(&self, task_id: &str, agent_id: &str) -> Result<Task> {
        let task = self.set_assignee(task_id, agent_id).await?;

        let message = AgentMessage::new(
            PROJECT_MANAGER_ID,
            agent_id,
            MessageType::TaskAssignment,
            serde_json::to_value(&task)?,
        )
        .with_priority(task.priority)
        .requiring_response();
        let message = match task.deadline {
            Some(deadline) => message.with_deadline(deadline),
            None => message,
        };

        self.hub.route_message(message).await?;
        info!("Assigned task {} to {}", task.title, agent_id);
        Ok(task)
    }

    /// Move a task to a new status and roll the project status forward
    pub async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let task = {
            let task = state
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| AicoError::TaskNotFound(task_id.to_string()))?;
            task.status = status;
            task.updated_at = now;
            task.clone()
        };

        let owning_project = state
            .projects
            .values()
            .find(|p| p.tasks.iter().any(|id| id == task_id))
            .map(|p| (p.id.clone(), p.tasks.clone()));

        if let Some((project_id, task_ids)) = owning_project {
            let all_done = task_ids.iter().all(|id| {
                state
                    .tasks
                    .get(id)
                    .map(|t| t.status == TaskStatus::Completed)
                    .unwrap_or(false)
            });
            if let Some(project) = state.projects.get_mut(&project_id) {
                if all_done {
                    project.status = ProjectStatus::Completed;
                    project.completion_date = Some(now);
                    info!("Project {} completed", project.name);
                } else if project.status == ProjectStatus::Planning
                    && status == TaskStatus::InProgress
                {
                    project.status = ProjectStatus::InProgress;
                }
                project.updated_at = now;
            }
        }

        Ok(task)
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.state
            .read()
            .await
            .projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| AicoError::ProjectNotFound(project_id.to_string()))
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.state
            .read()
            .await
            .tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| AicoError::TaskNotFound(task_id.to_string()))
    }

    /// Tasks of a project in creation order
    pub async fn project_tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        let state = self.state.read().await;
        let project = state
            .projects
            .get(project_id)
            .ok_or_else(|| AicoError::ProjectNotFound(project_id.to_string()))?;
        Ok(project
            .tasks
            .iter()
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect())
    }

    pub async fn list_projects(&self) -> Vec<Project> {
        let mut projects: Vec<Project> =
            self.state.read().await.projects.values().cloned().collect();
        projects.sort_by_key(|p| p.created_at);
        projects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentConfig, AgentRole, RoleAgent};

    fn spec(name: &str) -> ProjectSpec {
        let now = Utc::now();
        ProjectSpec {
            name: name.to_string(),
            description: "test project".to_string(),
            owner: "tester".to_string(),
            priority: Priority::High,
            start_date: now,
            target_date: now + Duration::days(10),
            budget: Some(5000.0),
            stakeholders: vec!["ceo_001".to_string()],
            dependencies: vec![],
            success_metrics: vec!["ships".to_string()],
        }
    }

    async fn manager_with_cto() -> (Arc<CommunicationHub>, ProjectManager) {
        let hub = Arc::new(CommunicationHub::new());
        hub.register_agent(Box::new(RoleAgent::new(AgentConfig::for_role(AgentRole::Cto))))
            .await
            .unwrap();
        let manager = ProjectManager::new(hub.clone());
        (hub, manager)
    }

    #[tokio::test]
    async fn test_create_project_starts_in_planning() {
        let (_hub, manager) = manager_with_cto().await;
        let project = manager.create_project(spec("Website")).await;

        assert_eq!(project.status, ProjectStatus::Planning);
        assert_eq!(project.priority, Priority::High);
        assert!(project.tasks.is_empty());
        assert_eq!(manager.list_projects().await.len(), 1);
    }

    #[tokio::test]
    async fn test_task_from_template_defaults_to_week_deadline() {
        let (_hub, manager) = manager_with_cto().await;
        let project = manager.create_project(spec("Website")).await;

        let task = manager
            .create_task_from_template(
                &project.id,
                &TaskTemplate {
                    title: "Landing page".to_string(),
                    description: "Build it".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let days = (task.deadline.unwrap() - task.created_at).num_days();
        assert_eq!(days, 7);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(manager.get_project(&project.id).await.unwrap().tasks, vec![task.id]);
    }

    #[tokio::test]
    async fn test_task_for_unknown_project_fails() {
        let (_hub, manager) = manager_with_cto().await;
        let result = manager
            .create_task_from_template("missing", &TaskTemplate::default())
            .await;
        assert!(matches!(result, Err(AicoError::ProjectNotFound(_))));
    }

    #[tokio::test]
    async fn test_assigned_template_notifies_agent() {
        let (hub, manager) = manager_with_cto().await;
        let project = manager.create_project(spec("Platform")).await;

        let task = manager
            .create_task_from_template(
                &project.id,
                &TaskTemplate {
                    title: "Pick a database".to_string(),
                    assigned_to: Some("cto_001".to_string()),
                    duration_days: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(task.assigned_to.as_deref(), Some("cto_001"));
        assert_eq!(hub.agent_status("cto_001").await.unwrap().pending_messages, 1);

        hub.process_all().await;
        let status = hub.agent_status("cto_001").await.unwrap();
        assert_eq!(status.pending_messages, 0);
        assert_eq!(status.active_tasks, 1);
    }

    #[tokio::test]
    async fn test_assigning_to_missing_agent_fails() {
        let (_hub, manager) = manager_with_cto().await;
        let project = manager.create_project(spec("Platform")).await;
        let result = manager
            .create_task_from_template(
                &project.id,
                &TaskTemplate {
                    title: "Orphan".to_string(),
                    assigned_to: Some("nobody_001".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AicoError::AgentNotFound(_))));

        // The failed task leaves nothing behind
        assert!(manager.project_tasks(&project.id).await.unwrap().is_empty());
        assert!(manager.get_project(&project.id).await.unwrap().tasks.is_empty());
    }

    #[tokio::test]
    async fn test_template_with_missing_assignee_creates_nothing() {
        let (_hub, manager) = manager_with_cto().await;
        manager
            .register_template(
                "broken",
                ProjectTemplate {
                    name: "Broken".to_string(),
                    owner: "cto_001".to_string(),
                    priority: Priority::Medium,
                    duration_days: 5,
                    stakeholders: vec![],
                    success_metrics: vec![],
                    task_templates: vec![
                        TaskTemplate {
                            title: "Fine".to_string(),
                            assigned_to: Some("cto_001".to_string()),
                            ..Default::default()
                        },
                        TaskTemplate {
                            title: "Orphan".to_string(),
                            assigned_to: Some("nobody_001".to_string()),
                            ..Default::default()
                        },
                    ],
                },
            )
            .await;

        let result = manager
            .create_project_from_template("broken", None, "never built")
            .await;
        assert!(matches!(result, Err(AicoError::AgentNotFound(_))));
        assert!(manager.list_projects().await.is_empty());
    }

    #[tokio::test]
    async fn test_status_updates_roll_up_to_project() {
        let (_hub, manager) = manager_with_cto().await;
        let project = manager.create_project(spec("Launch")).await;
        let first = manager
            .create_task_from_template(&project.id, &TaskTemplate::default())
            .await
            .unwrap();
        let second = manager
            .create_task_from_template(&project.id, &TaskTemplate::default())
            .await
            .unwrap();

        manager
            .update_task_status(&first.id, TaskStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(
            manager.get_project(&project.id).await.unwrap().status,
            ProjectStatus::InProgress
        );

        manager
            .update_task_status(&first.id, TaskStatus::Completed)
            .await
            .unwrap();
        manager
            .update_task_status(&second.id, TaskStatus::Completed)
            .await
            .unwrap();

        let done = manager.get_project(&project.id).await.unwrap();
        assert_eq!(done.status, ProjectStatus::Completed);
        assert!(done.completion_date.is_some());
    }

    #[tokio::test]
    async fn test_project_from_template() {
        let (_hub, manager) = manager_with_cto().await;
        manager
            .register_template(
                "launch",
                ProjectTemplate {
                    name: "Product Launch".to_string(),
                    owner: "cmo_001".to_string(),
                    priority: Priority::Urgent,
                    duration_days: 30,
                    stakeholders: vec![],
                    success_metrics: vec![],
                    task_templates: vec![
                        TaskTemplate {
                            title: "Positioning".to_string(),
                            ..Default::default()
                        },
                        TaskTemplate {
                            title: "Launch event".to_string(),
                            ..Default::default()
                        },
                    ],
                },
            )
            .await;

        let project = manager
            .create_project_from_template("launch", None, "Q3 launch")
            .await
            .unwrap();
        assert_eq!(project.name, "Product Launch");
        assert_eq!(project.priority, Priority::Urgent);

        let tasks = manager.project_tasks(&project.id).await.unwrap();
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Positioning", "Launch event"]);

        let missing = manager
            .create_project_from_template("nope", None, "x")
            .await;
        assert!(matches!(missing, Err(AicoError::TemplateNotFound(_))));
    }
}
