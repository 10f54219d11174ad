//! Communication hub for registering agents and routing messages between them

use crate::agents::{
    Agent, AgentMessage, AgentStatus, MessageResponse, MessageType, Priority, StandupEntry,
};
use aico_common::{AicoError, Result};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Type alias for agent storage
type AgentHandle = Arc<RwLock<Box<dyn Agent>>>;
type AgentMap = Arc<RwLock<HashMap<String, AgentHandle>>>;

/// Company-wide view of every registered agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyStatus {
    pub total_agents: usize,
    pub active_agents: usize,
    pub pending_messages: usize,
    pub messages_routed: usize,
    /// Sorted by agent id
    pub agents: Vec<AgentStatus>,
}

/// Central hub that owns every agent and delivers messages into their inboxes
pub struct CommunicationHub {
    /// Map of agent_id -> agent
    agents: AgentMap,

    messages_routed: AtomicUsize,
}

impl CommunicationHub {
    /// Create an empty hub
    pub fn new() -> Self {
        CommunicationHub {
            agents: Arc::new(RwLock::new(HashMap::new())),
            messages_routed: AtomicUsize::new(0),
        }
    }

    /// Register a new agent
    pub async fn register_agent(&self, agent: Box<dyn Agent>) -> Result<()> {
        let agent_id = agent.agent_id().to_string();
        let mut agents = self.agents.write().await;
        if agents.contains_key(&agent_id) {
            return Err(AicoError::DuplicateAgent(agent_id));
        }

        info!("Registered agent: {} ({})", agent.name(), agent.role());
        agents.insert(agent_id, Arc::new(RwLock::new(agent)));
        Ok(())
    }

    /// Unregister an agent
    pub async fn unregister_agent(&self, agent_id: &str) -> Result<()> {
        self.agents
            .write()
            .await
            .remove(agent_id)
            .ok_or_else(|| AicoError::AgentNotFound(agent_id.to_string()))?;
        debug!("Unregistered agent: {}", agent_id);
        Ok(())
    }

    /// Check if an agent exists
    pub async fn has_agent(&self, agent_id: &str) -> bool {
        self.agents.read().await.contains_key(agent_id)
    }

    /// Ids of all registered agents, sorted
    pub async fn list_agents(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn handle(&self, agent_id: &str) -> Result<AgentHandle> {
        let agents = self.agents.read().await;
        agents
            .get(agent_id)
            .cloned()
            .ok_or_else(|| AicoError::AgentNotFound(agent_id.to_string()))
    }

    /// Snapshot of handles so no map lock is held while agents work
    async fn handles(&self) -> Vec<AgentHandle> {
        let agents = self.agents.read().await;
        let mut entries: Vec<(&String, &AgentHandle)> = agents.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, handle)| handle.clone()).collect()
    }

    /// Deliver a message into its recipient's inbox
    pub async fn route_message(&self, message: AgentMessage) -> Result<()> {
        let target = match self.handle(&message.recipient).await {
            Ok(target) => target,
            Err(e) => {
                error!("Recipient not found: {}", message.recipient);
                return Err(e);
            }
        };

        debug!(
            "Routing {} from {} to {}",
            message.message_type, message.sender, message.recipient
        );
        target.write().await.receive(message);
        self.messages_routed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Have the recipient handle a message right away and return its response
    pub async fn send_message_and_wait(&self, message: AgentMessage) -> Result<MessageResponse> {
        let target = self.handle(&message.recipient).await?;
        self.messages_routed.fetch_add(1, Ordering::Relaxed);

        let mut agent = target.write().await;
        let response = agent.process_message(message).await?;
        let outgoing = agent.drain_outbox();
        drop(agent);

        self.route_all(outgoing).await;
        Ok(response)
    }

    /// Send the same message to every agent except the sender; returns how many received it
    pub async fn broadcast(
        &self,
        sender: &str,
        message_type: MessageType,
        content: Value,
        priority: Priority,
    ) -> Result<usize> {
        let recipients: Vec<String> = self
            .list_agents()
            .await
            .into_iter()
            .filter(|id| id != sender)
            .collect();

        for recipient in &recipients {
            let message = AgentMessage::new(sender, recipient.clone(), message_type, content.clone())
                .with_priority(priority);
            self.route_message(message).await?;
        }
        Ok(recipients.len())
    }

    /// Let every agent work through its inbox, then deliver whatever they sent
    pub async fn process_all(&self) -> Vec<MessageResponse> {
        let results = join_all(self.handles().await.into_iter().map(|handle| async move {
            let mut agent = handle.write().await;
            let responses = agent.process_messages().await;
            (responses, agent.drain_outbox())
        }))
        .await;

        let mut responses = Vec::new();
        let mut outgoing = Vec::new();
        for (agent_responses, agent_outbox) in results {
            responses.extend(agent_responses);
            outgoing.extend(agent_outbox);
        }

        self.route_all(outgoing).await;
        responses
    }

    async fn route_all(&self, messages: Vec<AgentMessage>) {
        for message in messages {
            if let Err(e) = self.route_message(message).await {
                error!("Failed to deliver agent message: {}", e);
            }
        }
    }

    /// Get agent information
    pub async fn agent_status(&self, agent_id: &str) -> Option<AgentStatus> {
        let handle = self.handle(agent_id).await.ok()?;
        let agent = handle.read().await;
        Some(agent.status())
    }

    /// Run a closure against an agent, e.g. to downcast it
    pub async fn inspect<R>(&self, agent_id: &str, f: impl FnOnce(&dyn Agent) -> R) -> Option<R> {
        let handle = self.handle(agent_id).await.ok()?;
        let agent = handle.read().await;
        Some(f(agent.as_ref()))
    }

    /// Standup entries from every active agent, keyed by agent id
    pub async fn collect_standups(&self) -> Vec<(String, StandupEntry)> {
        let mut entries = Vec::new();
        for handle in self.handles().await {
            let agent = handle.read().await;
            if agent.is_active() {
                entries.push((agent.agent_id().to_string(), agent.daily_standup().await));
            }
        }
        entries
    }

    /// Get overall company status
    pub async fn company_status(&self) -> CompanyStatus {
        let mut agents = Vec::new();
        for handle in self.handles().await {
            agents.push(handle.read().await.status());
        }

        CompanyStatus {
            total_agents: agents.len(),
            active_agents: agents.iter().filter(|a| a.is_active).count(),
            pending_messages: agents.iter().map(|a| a.pending_messages).sum(),
            messages_routed: self.messages_routed.load(Ordering::Relaxed),
            agents,
        }
    }
}

impl Default for CommunicationHub {
    fn default() -> Self {
        Self::new()
    }
}
