//! Role agent implementation

use crate::agents::{
    Agent, AgentConfig, AgentMessage, AgentRole, AgentStatus, MessageResponse, MessageType,
    Priority, StandupEntry,
};
use crate::projects::{Task, TaskStatus};
use aico_common::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// The default agent: keeps an inbox, its assigned tasks and what it has been told
pub struct RoleAgent {
    /// Agent configuration
    config: AgentConfig,

    inbox: VecDeque<AgentMessage>,

    /// Messages composed but not yet picked up by the hub
    outbox: Vec<AgentMessage>,

    messages_sent: usize,

    tasks: Vec<Task>,

    knowledge_base: Map<String, Value>,

    is_active: bool,

    last_activity: DateTime<Utc>,
}

/// Payload of a status_update that targets one of the agent's tasks
#[derive(Debug, Deserialize)]
struct TaskStatusChange {
    task_id: String,
    status: TaskStatus,
}

impl RoleAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            inbox: VecDeque::new(),
            outbox: Vec::new(),
            messages_sent: 0,
            tasks: Vec::new(),
            knowledge_base: Map::new(),
            is_active: true,
            last_activity: Utc::now(),
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn knowledge_base(&self) -> &Map<String, Value> {
        &self.knowledge_base
    }

    /// Total messages this agent has composed
    pub fn messages_sent(&self) -> usize {
        self.messages_sent
    }

    /// Queue an outgoing message; the hub delivers it on its next pass
    pub fn compose(
        &mut self,
        recipient: impl Into<String>,
        message_type: MessageType,
        content: Value,
        priority: Priority,
    ) {
        let message = AgentMessage::new(self.config.agent_id.clone(), recipient, message_type, content)
            .with_priority(priority);
        debug!(
            "{} composed {} for {}",
            self.config.agent_id, message.message_type, message.recipient
        );
        self.outbox.push(message);
        self.messages_sent += 1;
    }

    fn count_tasks(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    fn handle_task_assignment(&mut self, message: &AgentMessage) -> MessageResponse {
        let mut task: Task = match serde_json::from_value(message.content.clone()) {
            Ok(task) => task,
            Err(e) => {
                warn!("{} got a malformed task assignment: {}", self.name(), e);
                return MessageResponse::error(
                    message.id.clone(),
                    format!("Invalid task assignment: {}", e),
                );
            }
        };

        task.status = TaskStatus::InProgress;
        task.updated_at = Utc::now();
        info!("{} received task: {}", self.name(), task.title);

        let task_id = task.id.clone();
        match self.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }

        MessageResponse::success(
            message.id.clone(),
            format!("Task {} accepted", task_id),
            Some(json!({"task_id": task_id, "status": TaskStatus::InProgress})),
        )
    }

    fn handle_status_update(&mut self, message: &AgentMessage) -> MessageResponse {
        if let Ok(change) = serde_json::from_value::<TaskStatusChange>(message.content.clone()) {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == change.task_id) {
                task.status = change.status;
                task.updated_at = Utc::now();
                debug!("{} moved task {} to {}", self.config.name, task.id, change.status);
                return MessageResponse::success(
                    message.id.clone(),
                    format!("Task {} is now {}", change.task_id, change.status),
                    None,
                );
            }
        }

        info!("{} received status update from {}", self.name(), message.sender);
        MessageResponse::success(message.id.clone(), "Status update noted".to_string(), None)
    }

    fn handle_information_share(&mut self, message: &AgentMessage) -> MessageResponse {
        match &message.content {
            Value::Object(entries) => {
                for (key, value) in entries {
                    self.knowledge_base.insert(key.clone(), value.clone());
                }
                info!("{} received information update", self.name());
                MessageResponse::success(
                    message.id.clone(),
                    format!("Stored {} entries", entries.len()),
                    None,
                )
            }
            other => MessageResponse::error(
                message.id.clone(),
                format!("Information share must be an object, got {}", other),
            ),
        }
    }

    fn handle_collaboration_request(&mut self, message: &AgentMessage) -> MessageResponse {
        info!("{} received collaboration request from {}", self.name(), message.sender);
        let reply = json!({
            "collaborator": self.config.agent_id,
            "role": self.config.role,
            "in_reply_to": message.id,
            "available": self.is_active,
        });
        if message.requires_response {
            self.compose(
                message.sender.clone(),
                MessageType::InformationShare,
                reply.clone(),
                message.priority,
            );
        }
        MessageResponse::success(message.id.clone(), "Collaboration accepted".to_string(), Some(reply))
    }

    fn handle_decision_request(&mut self, message: &AgentMessage) -> MessageResponse {
        info!("{} received decision request from {}", self.name(), message.sender);
        if self.config.role != AgentRole::Ceo {
            self.compose(
                AgentRole::Ceo.default_agent_id(),
                MessageType::DecisionRequest,
                message.content.clone(),
                message.priority,
            );
            return MessageResponse::success(
                message.id.clone(),
                "Decision forwarded to the CEO".to_string(),
                None,
            );
        }

        let decision = json!({
            "decision": "approved",
            "decided_by": self.config.agent_id,
            "context": message.content,
        });
        let mut shared = Map::new();
        shared.insert(format!("decision_{}", message.id), decision.clone());
        self.compose(
            message.sender.clone(),
            MessageType::InformationShare,
            Value::Object(shared),
            message.priority,
        );
        MessageResponse::success(message.id.clone(), "Decision made".to_string(), Some(decision))
    }

    fn handle_escalation(&mut self, message: &AgentMessage) -> MessageResponse {
        info!("{} received escalation from {}", self.name(), message.sender);
        if self.config.role != AgentRole::Ceo {
            self.compose(
                AgentRole::Ceo.default_agent_id(),
                MessageType::Escalation,
                message.content.clone(),
                Priority::Urgent,
            );
            return MessageResponse::success(
                message.id.clone(),
                "Escalated to the CEO".to_string(),
                None,
            );
        }
        MessageResponse::success(message.id.clone(), "Escalation acknowledged".to_string(), None)
    }
}

#[async_trait]
impl Agent for RoleAgent {
    fn agent_id(&self) -> &str {
        &self.config.agent_id
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn role(&self) -> AgentRole {
        self.config.role
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn receive(&mut self, message: AgentMessage) {
        self.inbox.push_back(message);
    }

    fn take_inbox(&mut self) -> Vec<AgentMessage> {
        self.inbox.drain(..).collect()
    }

    fn drain_outbox(&mut self) -> Vec<AgentMessage> {
        std::mem::take(&mut self.outbox)
    }

    async fn process_message(&mut self, message: AgentMessage) -> Result<MessageResponse> {
        debug!(
            "Agent {} processing {} from {}",
            self.agent_id(),
            message.message_type,
            message.sender
        );
        self.last_activity = Utc::now();

        let response = match message.message_type {
            MessageType::TaskAssignment => self.handle_task_assignment(&message),
            MessageType::StatusUpdate => self.handle_status_update(&message),
            MessageType::CollaborationRequest => self.handle_collaboration_request(&message),
            MessageType::DecisionRequest => self.handle_decision_request(&message),
            MessageType::InformationShare => self.handle_information_share(&message),
            MessageType::Escalation => self.handle_escalation(&message),
        };
        Ok(response)
    }

    fn status(&self) -> AgentStatus {
        AgentStatus {
            agent_id: self.config.agent_id.clone(),
            role: self.config.role,
            name: self.config.name.clone(),
            is_active: self.is_active,
            last_activity: self.last_activity,
            pending_messages: self.inbox.len(),
            active_tasks: self.count_tasks(TaskStatus::InProgress),
            completed_tasks: self.count_tasks(TaskStatus::Completed),
        }
    }

    async fn daily_standup(&self) -> StandupEntry {
        let mut yesterday = vec!["Processed messages".to_string()];
        yesterday.extend(
            self.tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Completed)
                .map(|t| format!("Completed {}", t.title)),
        );

        let mut today: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .map(|t| format!("Continue {}", t.title))
            .collect();
        if today.is_empty() {
            today.push("Collaborate with team".to_string());
        }

        StandupEntry {
            agent: self.config.name.clone(),
            role: self.config.role,
            yesterday,
            today,
            blockers: self
                .tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Blocked)
                .map(|t| t.title.clone())
                .collect(),
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aico_common::generate_id;

    fn agent(role: AgentRole) -> RoleAgent {
        RoleAgent::new(AgentConfig::for_role(role))
    }

    fn task(title: &str) -> Task {
        let now = Utc::now();
        Task {
            id: generate_id(),
            title: title.to_string(),
            description: String::new(),
            assigned_to: None,
            created_by: "test".to_string(),
            priority: Priority::Medium,
            status: TaskStatus::Pending,
            dependencies: vec![],
            deliverables: vec![],
            deadline: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn message(to: &str, message_type: MessageType, content: Value) -> AgentMessage {
        AgentMessage::new("tester", to, message_type, content)
    }

    #[test]
    fn test_new_agent_status() {
        let cto = agent(AgentRole::Cto);
        let status = cto.status();
        assert_eq!(status.agent_id, "cto_001");
        assert_eq!(status.role, AgentRole::Cto);
        assert_eq!(status.name, "Chief Technology Officer");
        assert!(status.is_active);
        assert_eq!(status.pending_messages, 0);
        assert_eq!(status.active_tasks, 0);
        assert_eq!(status.completed_tasks, 0);
    }

    #[tokio::test]
    async fn test_inbox_is_processed_in_order() {
        let mut cto = agent(AgentRole::Cto);
        cto.receive(message("cto_001", MessageType::InformationShare, json!({"stack": "rust"})));
        cto.receive(message("cto_001", MessageType::InformationShare, json!({"stack": "go"})));
        assert_eq!(cto.status().pending_messages, 2);

        let responses = cto.process_messages().await;
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|r| r.success));
        assert_eq!(cto.status().pending_messages, 0);
        assert_eq!(cto.knowledge_base().get("stack"), Some(&json!("go")));
    }

    #[tokio::test]
    async fn test_task_assignment_then_status_update() {
        let mut qa = agent(AgentRole::QaEngineer);
        let assigned = task("Regression suite");
        let task_id = assigned.id.clone();

        let response = qa
            .process_message(message(
                "qa_engineer_001",
                MessageType::TaskAssignment,
                serde_json::to_value(&assigned).unwrap(),
            ))
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(qa.status().active_tasks, 1);

        qa.process_message(message(
            "qa_engineer_001",
            MessageType::StatusUpdate,
            json!({"task_id": task_id, "status": "completed"}),
        ))
        .await
        .unwrap();
        let status = qa.status();
        assert_eq!(status.active_tasks, 0);
        assert_eq!(status.completed_tasks, 1);
    }

    #[tokio::test]
    async fn test_malformed_assignment_is_rejected() {
        let mut qa = agent(AgentRole::QaEngineer);
        let response = qa
            .process_message(message(
                "qa_engineer_001",
                MessageType::TaskAssignment,
                json!({"task": "no id here"}),
            ))
            .await
            .unwrap();
        assert!(!response.success);
        assert!(qa.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_information_share_requires_object() {
        let mut analyst = agent(AgentRole::DataAnalyst);
        let response = analyst
            .process_message(message("data_analyst_001", MessageType::InformationShare, json!(42)))
            .await
            .unwrap();
        assert!(!response.success);
    }

    #[tokio::test]
    async fn test_non_ceo_forwards_decisions_and_escalations() {
        let mut cfo = agent(AgentRole::Cfo);
        cfo.process_message(message("cfo_001", MessageType::DecisionRequest, json!({"budget": 10})))
            .await
            .unwrap();
        cfo.process_message(message("cfo_001", MessageType::Escalation, json!({"issue": "late"})))
            .await
            .unwrap();

        let outbox = cfo.drain_outbox();
        assert_eq!(outbox.len(), 2);
        assert!(outbox.iter().all(|m| m.recipient == "ceo_001"));
        assert_eq!(outbox[1].priority, Priority::Urgent);
        assert!(cfo.drain_outbox().is_empty());
        assert_eq!(cfo.messages_sent(), 2);
    }

    #[tokio::test]
    async fn test_ceo_decides_and_replies() {
        let mut ceo = agent(AgentRole::Ceo);
        let response = ceo
            .process_message(message("ceo_001", MessageType::DecisionRequest, json!({"hire": 2})))
            .await
            .unwrap();
        assert_eq!(response.data.unwrap()["decision"], json!("approved"));

        let outbox = ceo.drain_outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].recipient, "tester");
        assert_eq!(outbox[0].message_type, MessageType::InformationShare);
    }

    #[tokio::test]
    async fn test_collaboration_reply_only_when_requested() {
        let mut designer = agent(AgentRole::UxDesigner);
        designer
            .process_message(message("ux_designer_001", MessageType::CollaborationRequest, json!({})))
            .await
            .unwrap();
        assert!(designer.drain_outbox().is_empty());

        designer
            .process_message(
                message("ux_designer_001", MessageType::CollaborationRequest, json!({}))
                    .requiring_response(),
            )
            .await
            .unwrap();
        assert_eq!(designer.drain_outbox().len(), 1);
    }

    #[tokio::test]
    async fn test_standup_lists_blockers() {
        let mut ops = agent(AgentRole::OperationsManager);
        let mut blocked = task("Vendor contract");
        blocked.status = TaskStatus::Blocked;
        ops.process_message(message(
            "operations_manager_001",
            MessageType::TaskAssignment,
            serde_json::to_value(&blocked).unwrap(),
        ))
        .await
        .unwrap();
        ops.process_message(message(
            "operations_manager_001",
            MessageType::StatusUpdate,
            json!({"task_id": blocked.id, "status": "blocked"}),
        ))
        .await
        .unwrap();

        let entry = ops.daily_standup().await;
        assert_eq!(entry.blockers, vec!["Vendor contract".to_string()]);
        assert_eq!(entry.role, AgentRole::OperationsManager);
    }
}
