//! Agent module for the simulated company
//!
//! This module provides the core agent abstraction, the roles agents play,
//! and the in-memory communication hub that routes messages between them.

pub mod base_agent;
pub mod communication;
pub mod company;
pub mod hub;
pub mod role;

pub use base_agent::RoleAgent;
pub use communication::{AgentMessage, MessageResponse, MessageType, Priority};
pub use company::CompanyBuilder;
pub use hub::{CommunicationHub, CompanyStatus};
pub use role::{AgentRole, Department};

use aico_common::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Core trait for agents in the company
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique identifier for this agent
    fn agent_id(&self) -> &str;

    /// Human-readable name for this agent
    fn name(&self) -> &str;

    /// Role this agent fills
    fn role(&self) -> AgentRole;

    /// Inactive agents are skipped by standups and counted separately in status
    fn is_active(&self) -> bool;

    /// Queue a message in this agent's inbox
    fn receive(&mut self, message: AgentMessage);

    /// Take every queued inbox message, oldest first
    fn take_inbox(&mut self) -> Vec<AgentMessage>;

    /// Take every message this agent composed since the last call
    fn drain_outbox(&mut self) -> Vec<AgentMessage>;

    /// Handle a single message and produce a response
    async fn process_message(&mut self, message: AgentMessage) -> Result<MessageResponse>;

    /// Handle every queued inbox message in arrival order
    async fn process_messages(&mut self) -> Vec<MessageResponse> {
        let mut responses = Vec::new();
        for message in self.take_inbox() {
            let message_id = message.id.clone();
            match self.process_message(message).await {
                Ok(response) => responses.push(response),
                Err(e) => responses.push(MessageResponse::error(message_id, e.to_string())),
            }
        }
        responses
    }

    /// Snapshot of this agent's workload
    fn status(&self) -> AgentStatus;

    /// Report for the daily standup
    async fn daily_standup(&self) -> StandupEntry;

    /// Downcast helper for inspecting concrete agents
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Configuration for creating an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique agent identifier
    pub agent_id: String,

    /// Human-readable name
    pub name: String,

    pub role: AgentRole,
}

impl AgentConfig {
    /// Config for the first agent filling `role`
    pub fn for_role(role: AgentRole) -> Self {
        Self {
            agent_id: role.default_agent_id(),
            name: role.display_name(),
            role,
        }
    }
}

/// Point-in-time view of an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub agent_id: String,
    pub role: AgentRole,
    pub name: String,
    pub is_active: bool,
    pub last_activity: DateTime<Utc>,
    pub pending_messages: usize,
    pub active_tasks: usize,
    pub completed_tasks: usize,
}

/// One agent's contribution to a daily standup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandupEntry {
    pub agent: String,
    pub role: AgentRole,
    pub yesterday: Vec<String>,
    pub today: Vec<String>,
    pub blockers: Vec<String>,
}
