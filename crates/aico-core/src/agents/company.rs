//! Staffing the company with one agent per role

use crate::agents::{AgentConfig, AgentRole, CommunicationHub, Department, RoleAgent};
use aico_common::Result;
use tracing::info;

/// Builds role agents and registers them with a hub
pub struct CompanyBuilder;

impl CompanyBuilder {
    /// Create the agent for a single role
    pub fn create_agent(role: AgentRole) -> RoleAgent {
        RoleAgent::new(AgentConfig::for_role(role))
    }

    /// Register an agent for every role
    pub async fn staff(hub: &CommunicationHub) -> Result<usize> {
        Self::staff_roles(hub, &AgentRole::ALL).await
    }

    /// Register agents for the given roles; roles already present are skipped
    pub async fn staff_roles(hub: &CommunicationHub, roles: &[AgentRole]) -> Result<usize> {
        let mut created = 0;
        for role in roles {
            if hub.has_agent(&role.default_agent_id()).await {
                continue;
            }
            hub.register_agent(Box::new(Self::create_agent(*role))).await?;
            created += 1;
        }
        info!("Staffed company with {} agents", created);
        Ok(created)
    }

    /// Register agents for every role in a department
    pub async fn staff_department(hub: &CommunicationHub, department: Department) -> Result<usize> {
        let roles: Vec<AgentRole> = AgentRole::ALL
            .into_iter()
            .filter(|r| r.department() == department)
            .collect();
        Self::staff_roles(hub, &roles).await
    }

    /// List every role as (role, display name, department)
    pub fn list_roles() -> Vec<(AgentRole, String, Department)> {
        AgentRole::ALL
            .iter()
            .map(|role| (*role, role.display_name(), role.department()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_staff_whole_company() {
        let hub = CommunicationHub::new();
        assert_eq!(CompanyBuilder::staff(&hub).await.unwrap(), 24);
        assert!(hub.has_agent("ceo_001").await);
        assert!(hub.has_agent("security_specialist_001").await);

        // Staffing again is a no-op
        assert_eq!(CompanyBuilder::staff(&hub).await.unwrap(), 0);
        assert_eq!(hub.company_status().await.total_agents, 24);
    }

    #[tokio::test]
    async fn test_staff_department() {
        let hub = CommunicationHub::new();
        let created = CompanyBuilder::staff_department(&hub, Department::Executive)
            .await
            .unwrap();
        assert_eq!(created, 5);
        assert!(hub.has_agent("chro_001").await);
        assert!(!hub.has_agent("qa_engineer_001").await);
    }

    #[test]
    fn test_list_roles() {
        let roles = CompanyBuilder::list_roles();
        assert_eq!(roles.len(), 24);
        assert_eq!(roles[0].1, "Chief Executive Officer");
        assert_eq!(roles[0].2, Department::Executive);
    }
}
