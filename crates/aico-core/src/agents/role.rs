//! Company roles that agents can fill

use aico_common::{AicoError, DEFAULT_AGENT_SUFFIX, title_case};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Department a role belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Executive,
    ProductDevelopment,
    MarketingSales,
    Operations,
}

/// Every role an agent can play in the company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    // Executive
    Ceo,
    Cto,
    Cmo,
    Cfo,
    Chro,

    // Product development
    ProductManager,
    LeadEngineer,
    FrontendEngineer,
    BackendEngineer,
    DevopsEngineer,
    QaEngineer,
    UxDesigner,
    UiDesigner,

    // Marketing & sales
    MarketingManager,
    ContentCreator,
    SocialMediaManager,
    SeoSpecialist,
    SalesManager,
    CustomerSuccess,

    // Operations
    OperationsManager,
    FinanceAnalyst,
    LegalAdvisor,
    DataAnalyst,
    SecuritySpecialist,
}

impl AgentRole {
    pub const ALL: [AgentRole; 24] = [
        AgentRole::Ceo,
        AgentRole::Cto,
        AgentRole::Cmo,
        AgentRole::Cfo,
        AgentRole::Chro,
        AgentRole::ProductManager,
        AgentRole::LeadEngineer,
        AgentRole::FrontendEngineer,
        AgentRole::BackendEngineer,
        AgentRole::DevopsEngineer,
        AgentRole::QaEngineer,
        AgentRole::UxDesigner,
        AgentRole::UiDesigner,
        AgentRole::MarketingManager,
        AgentRole::ContentCreator,
        AgentRole::SocialMediaManager,
        AgentRole::SeoSpecialist,
        AgentRole::SalesManager,
        AgentRole::CustomerSuccess,
        AgentRole::OperationsManager,
        AgentRole::FinanceAnalyst,
        AgentRole::LegalAdvisor,
        AgentRole::DataAnalyst,
        AgentRole::SecuritySpecialist,
    ];

    /// Roles that receive standup summaries
    pub fn leadership() -> [AgentRole; 5] {
        [
            AgentRole::Ceo,
            AgentRole::Cto,
            AgentRole::Cmo,
            AgentRole::Cfo,
            AgentRole::Chro,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Ceo => "ceo",
            AgentRole::Cto => "cto",
            AgentRole::Cmo => "cmo",
            AgentRole::Cfo => "cfo",
            AgentRole::Chro => "chro",
            AgentRole::ProductManager => "product_manager",
            AgentRole::LeadEngineer => "lead_engineer",
            AgentRole::FrontendEngineer => "frontend_engineer",
            AgentRole::BackendEngineer => "backend_engineer",
            AgentRole::DevopsEngineer => "devops_engineer",
            AgentRole::QaEngineer => "qa_engineer",
            AgentRole::UxDesigner => "ux_designer",
            AgentRole::UiDesigner => "ui_designer",
            AgentRole::MarketingManager => "marketing_manager",
            AgentRole::ContentCreator => "content_creator",
            AgentRole::SocialMediaManager => "social_media_manager",
            AgentRole::SeoSpecialist => "seo_specialist",
            AgentRole::SalesManager => "sales_manager",
            AgentRole::CustomerSuccess => "customer_success",
            AgentRole::OperationsManager => "operations_manager",
            AgentRole::FinanceAnalyst => "finance_analyst",
            AgentRole::LegalAdvisor => "legal_advisor",
            AgentRole::DataAnalyst => "data_analyst",
            AgentRole::SecuritySpecialist => "security_specialist",
        }
    }

    /// Human-readable title, e.g. "Chief Executive Officer"
    pub fn display_name(&self) -> String {
        match self {
            AgentRole::Ceo => "Chief Executive Officer".to_string(),
            AgentRole::Cto => "Chief Technology Officer".to_string(),
            AgentRole::Cmo => "Chief Marketing Officer".to_string(),
            AgentRole::Cfo => "Chief Financial Officer".to_string(),
            AgentRole::Chro => "Chief Human Resources Officer".to_string(),
            AgentRole::QaEngineer => "QA Engineer".to_string(),
            AgentRole::UxDesigner => "UX Designer".to_string(),
            AgentRole::UiDesigner => "UI Designer".to_string(),
            AgentRole::DevopsEngineer => "DevOps Engineer".to_string(),
            AgentRole::SeoSpecialist => "SEO Specialist".to_string(),
            other => title_case(other.as_str()),
        }
    }

    pub fn department(&self) -> Department {
        match self {
            AgentRole::Ceo | AgentRole::Cto | AgentRole::Cmo | AgentRole::Cfo | AgentRole::Chro => {
                Department::Executive
            }
            AgentRole::ProductManager
            | AgentRole::LeadEngineer
            | AgentRole::FrontendEngineer
            | AgentRole::BackendEngineer
            | AgentRole::DevopsEngineer
            | AgentRole::QaEngineer
            | AgentRole::UxDesigner
            | AgentRole::UiDesigner => Department::ProductDevelopment,
            AgentRole::MarketingManager
            | AgentRole::ContentCreator
            | AgentRole::SocialMediaManager
            | AgentRole::SeoSpecialist
            | AgentRole::SalesManager
            | AgentRole::CustomerSuccess => Department::MarketingSales,
            AgentRole::OperationsManager
            | AgentRole::FinanceAnalyst
            | AgentRole::LegalAdvisor
            | AgentRole::DataAnalyst
            | AgentRole::SecuritySpecialist => Department::Operations,
        }
    }

    /// Id of the first agent filling this role, e.g. `ceo_001`
    pub fn default_agent_id(&self) -> String {
        format!("{}{}", self.as_str(), DEFAULT_AGENT_SUFFIX)
    }
}

impl FromStr for AgentRole {
    type Err = AicoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        AgentRole::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == needle)
            .ok_or_else(|| AicoError::UnknownRole(s.to_string()))
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_names() {
        for role in AgentRole::ALL {
            assert_eq!(role.as_str().parse::<AgentRole>().unwrap(), role);
        }
        assert_eq!(" CEO ".parse::<AgentRole>().unwrap(), AgentRole::Ceo);
        assert!(matches!(
            "janitor".parse::<AgentRole>(),
            Err(AicoError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_serde_matches_as_str() {
        let value = serde_json::to_value(AgentRole::SocialMediaManager).unwrap();
        assert_eq!(value, serde_json::json!("social_media_manager"));
    }

    #[test]
    fn test_names_and_departments() {
        assert_eq!(AgentRole::Ceo.default_agent_id(), "ceo_001");
        assert_eq!(AgentRole::LeadEngineer.display_name(), "Lead Engineer");
        assert_eq!(AgentRole::UxDesigner.display_name(), "UX Designer");
        assert_eq!(AgentRole::Cfo.department(), Department::Executive);
        assert_eq!(AgentRole::SeoSpecialist.department(), Department::MarketingSales);
        assert_eq!(AgentRole::DataAnalyst.department(), Department::Operations);
        assert!(AgentRole::leadership().contains(&AgentRole::Chro));
    }
}
