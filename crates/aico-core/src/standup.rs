//! Daily standups

use crate::agents::{AgentMessage, AgentRole, CommunicationHub, MessageType, Priority, StandupEntry};
use aico_common::{Result, STANDUP_MANAGER_ID, generate_id};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blocker {
    pub agent: String,
    pub blocker: String,
}

/// Follow-up created for every reported blocker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: String,
    pub description: String,
    pub assigned_to: AgentRole,
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
    pub related_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandupReport {
    pub date: NaiveDate,
    /// Agent ids of everyone who reported
    pub participants: Vec<String>,
    /// Keyed by agent id
    pub summary: BTreeMap<String, StandupEntry>,
    pub blockers: Vec<Blocker>,
    pub action_items: Vec<ActionItem>,
}

/// Collects standup entries and follows up on blockers
pub struct StandupManager {
    hub: Arc<CommunicationHub>,
    /// Latest report per day
    reports: RwLock<HashMap<NaiveDate, StandupReport>>,
}

impl StandupManager {
    pub fn new(hub: Arc<CommunicationHub>) -> Self {
        Self {
            hub,
            reports: RwLock::new(HashMap::new()),
        }
    }

    /// Gather every active agent's standup, file it, and brief leadership
    pub async fn conduct_daily_standup(&self) -> Result<StandupReport> {
        let entries = self.hub.collect_standups().await;

        let mut participants = Vec::with_capacity(entries.len());
        let mut summary = BTreeMap::new();
        let mut blockers = Vec::new();
        for (agent_id, entry) in entries {
            blockers.extend(entry.blockers.iter().map(|b| Blocker {
                agent: agent_id.clone(),
                blocker: b.clone(),
            }));
            participants.push(agent_id.clone());
            summary.insert(agent_id, entry);
        }

        let report = StandupReport {
            date: Utc::now().date_naive(),
            participants,
            summary,
            action_items: Self::generate_action_items(&blockers),
            blockers,
        };

        self.reports.write().await.insert(report.date, report.clone());
        info!(
            "Standup held with {} participants, {} blockers",
            report.participants.len(),
            report.blockers.len()
        );

        self.send_standup_summary(&report).await?;
        Ok(report)
    }

    fn generate_action_items(blockers: &[Blocker]) -> Vec<ActionItem> {
        let due_date = Utc::now() + Duration::days(1);
        blockers
            .iter()
            .map(|b| ActionItem {
                id: generate_id(),
                description: format!("Resolve blocker: {}", b.blocker),
                assigned_to: AgentRole::OperationsManager,
                priority: Priority::High,
                due_date,
                related_agent: b.agent.clone(),
            })
            .collect()
    }

    async fn send_standup_summary(&self, report: &StandupReport) -> Result<()> {
        let content = serde_json::json!({ "standup_report": serde_json::to_value(report)? });
        for role in AgentRole::leadership() {
            let agent_id = role.default_agent_id();
            if !self.hub.has_agent(&agent_id).await {
                continue;
            }
            let message = AgentMessage::new(
                STANDUP_MANAGER_ID,
                agent_id.clone(),
                MessageType::StatusUpdate,
                content.clone(),
            );
            if let Err(e) = self.hub.route_message(message).await {
                warn!("Could not brief {}: {}", agent_id, e);
            }
        }
        Ok(())
    }

    pub async fn report_for(&self, date: NaiveDate) -> Option<StandupReport> {
        self.reports.read().await.get(&date).cloned()
    }

    /// Every filed report, oldest first
    pub async fn reports(&self) -> Vec<StandupReport> {
        let mut reports: Vec<StandupReport> = self.reports.read().await.values().cloned().collect();
        reports.sort_by_key(|r| r.date);
        reports
    }
}
