//! Phase planning
//!
//! Turns a [`TaskAnalysis`] into an ordered list of phases taken from a fixed
//! template per task type.

use crate::agents::{AgentRole, Priority};
use crate::routing::{Complexity, TaskAnalysis, TaskType};
use aico_common::AicoError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How long a phase is expected to take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DurationEstimate {
    Days(u32),
    Range(u32, u32),
    Ongoing,
    Varies,
}

impl fmt::Display for DurationEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationEstimate::Days(1) => write!(f, "1 day"),
            DurationEstimate::Days(n) => write!(f, "{} days", n),
            DurationEstimate::Range(low, high) => write!(f, "{}-{} days", low, high),
            DurationEstimate::Ongoing => write!(f, "ongoing"),
            DurationEstimate::Varies => write!(f, "varies"),
        }
    }
}

impl FromStr for DurationEstimate {
    type Err = AicoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AicoError::InvalidPayload(format!("invalid duration '{}'", s));
        match s.trim() {
            "ongoing" => return Ok(DurationEstimate::Ongoing),
            "varies" => return Ok(DurationEstimate::Varies),
            _ => {}
        }

        let amount = s
            .trim()
            .strip_suffix("days")
            .or_else(|| s.trim().strip_suffix("day"))
            .ok_or_else(invalid)?
            .trim();
        match amount.split_once('-') {
            Some((low, high)) => Ok(DurationEstimate::Range(
                low.trim().parse().map_err(|_| invalid())?,
                high.trim().parse().map_err(|_| invalid())?,
            )),
            None => Ok(DurationEstimate::Days(
                amount.parse().map_err(|_| invalid())?,
            )),
        }
    }
}

impl From<DurationEstimate> for String {
    fn from(value: DurationEstimate) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for DurationEstimate {
    type Error = AicoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Who is responsible for a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PhaseAssignee {
    Role(AgentRole),
    /// Every role the analysis picked
    AllRelevant,
    /// Whoever the analysis picked first
    Assigned,
}

impl fmt::Display for PhaseAssignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseAssignee::Role(role) => write!(f, "{}", role),
            PhaseAssignee::AllRelevant => write!(f, "all_relevant"),
            PhaseAssignee::Assigned => write!(f, "assigned_agents"),
        }
    }
}

impl From<PhaseAssignee> for String {
    fn from(value: PhaseAssignee) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for PhaseAssignee {
    type Error = AicoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "all_relevant" => Ok(PhaseAssignee::AllRelevant),
            "assigned_agents" => Ok(PhaseAssignee::Assigned),
            role => Ok(PhaseAssignee::Role(role.parse()?)),
        }
    }
}

/// A named stage of an execution plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub duration: DurationEstimate,
    pub assignees: Vec<PhaseAssignee>,
}

impl Phase {
    fn new(name: &str, duration: DurationEstimate, roles: &[AgentRole]) -> Self {
        Self {
            name: name.to_string(),
            duration,
            assignees: roles.iter().copied().map(PhaseAssignee::Role).collect(),
        }
    }

    fn with_assignee(name: &str, duration: DurationEstimate, assignee: PhaseAssignee) -> Self {
        Self {
            name: name.to_string(),
            duration,
            assignees: vec![assignee],
        }
    }

    /// Role that owns this phase's task, if any
    ///
    /// `AllRelevant` phases have no single owner. `Assigned` resolves to the
    /// first role the analysis picked.
    pub fn owner(&self, required_roles: &[AgentRole]) -> Option<AgentRole> {
        match self.assignees.first()? {
            PhaseAssignee::Role(role) => Some(*role),
            PhaseAssignee::AllRelevant => None,
            PhaseAssignee::Assigned => required_roles.first().copied(),
        }
    }
}

/// Ordered phases plus the aggregate estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub phases: Vec<Phase>,
    pub estimated_completion: DateTime<Utc>,
    pub priority: Priority,
    pub complexity: Complexity,
    pub deadline: Option<DateTime<Utc>>,
    /// e.g. "5 agents, 40 hours"
    pub resource_requirements: String,
}

/// Phase template for a task type
pub fn phase_template(task_type: TaskType) -> Vec<Phase> {
    use AgentRole::*;
    use DurationEstimate::{Days, Ongoing, Range, Varies};

    match task_type {
        TaskType::Development => vec![
            Phase::new("Requirements Analysis", Range(1, 2), &[ProductManager]),
            Phase::new("Technical Design", Range(2, 3), &[LeadEngineer, UxDesigner]),
            Phase::new(
                "Implementation",
                Range(5, 10),
                &[FrontendEngineer, BackendEngineer],
            ),
            Phase::new("Testing & QA", Range(2, 3), &[QaEngineer]),
            Phase::new("Deployment", Days(1), &[DevopsEngineer]),
        ],
        TaskType::Marketing => vec![
            Phase::new("Strategy Development", Range(1, 2), &[Cmo, MarketingManager]),
            Phase::new("Content Creation", Range(3, 5), &[ContentCreator, UiDesigner]),
            Phase::new(
                "Campaign Setup",
                Range(2, 3),
                &[MarketingManager, SocialMediaManager],
            ),
            Phase::new("Launch & Monitor", Ongoing, &[MarketingManager, DataAnalyst]),
        ],
        TaskType::Strategic => vec![
            Phase::new("Analysis & Research", Range(2, 3), &[Ceo, DataAnalyst]),
            Phase::new("Strategy Formulation", Range(2, 3), &[Ceo, Cto, Cmo, Cfo]),
            Phase::new("Implementation Planning", Range(1, 2), &[OperationsManager]),
            Phase::with_assignee("Execution", Varies, PhaseAssignee::AllRelevant),
        ],
        TaskType::General => vec![
            Phase::new("Task Analysis", Days(1), &[Ceo]),
            Phase::new("Resource Assignment", Days(1), &[Chro]),
            Phase::with_assignee("Execution", Range(2, 5), PhaseAssignee::Assigned),
            Phase::new("Review & Completion", Days(1), &[Ceo]),
        ],
    }
}

/// Build the execution plan for an analyzed task
pub fn create_execution_plan(
    analysis: &TaskAnalysis,
    priority: Priority,
    deadline: Option<DateTime<Utc>>,
) -> ExecutionPlan {
    let phases = phase_template(analysis.task_type);

    let base_days = if analysis.complexity == Complexity::High {
        phases.len() * 2
    } else {
        phases.len()
    };

    ExecutionPlan {
        estimated_completion: Utc::now() + Duration::days(base_days as i64),
        priority,
        complexity: analysis.complexity,
        deadline,
        resource_requirements: format!(
            "{} agents, {} hours",
            analysis.required_roles.len(),
            analysis.estimated_hours
        ),
        phases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::TaskPatternTable;
    use serde_json::json;

    #[test]
    fn test_duration_display_and_parse() {
        assert_eq!(DurationEstimate::Days(1).to_string(), "1 day");
        assert_eq!(DurationEstimate::Days(3).to_string(), "3 days");
        assert_eq!(DurationEstimate::Range(5, 10).to_string(), "5-10 days");
        assert_eq!(DurationEstimate::Ongoing.to_string(), "ongoing");

        assert_eq!("1 day".parse::<DurationEstimate>().unwrap(), DurationEstimate::Days(1));
        assert_eq!(
            "2-5 days".parse::<DurationEstimate>().unwrap(),
            DurationEstimate::Range(2, 5)
        );
        assert_eq!("varies".parse::<DurationEstimate>().unwrap(), DurationEstimate::Varies);
        assert!("soon".parse::<DurationEstimate>().is_err());
    }

    #[test]
    fn test_phase_serializes_as_strings() {
        let phase = &phase_template(TaskType::Strategic)[3];
        let value = serde_json::to_value(phase).unwrap();
        assert_eq!(
            value,
            json!({"name": "Execution", "duration": "varies", "assignees": ["all_relevant"]})
        );
        let back: Phase = serde_json::from_value(value).unwrap();
        assert_eq!(&back, phase);
    }

    #[test]
    fn test_templates() {
        let development = phase_template(TaskType::Development);
        let names: Vec<&str> = development.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Requirements Analysis",
                "Technical Design",
                "Implementation",
                "Testing & QA",
                "Deployment"
            ]
        );
        assert_eq!(phase_template(TaskType::Marketing).len(), 4);
        assert_eq!(
            phase_template(TaskType::Marketing)[3].duration,
            DurationEstimate::Ongoing
        );
        assert_eq!(phase_template(TaskType::General)[1].owner(&[]), Some(AgentRole::Chro));
    }

    #[test]
    fn test_phase_owner_resolution() {
        let general = phase_template(TaskType::General);
        assert_eq!(
            general[2].owner(&[AgentRole::SalesManager, AgentRole::Cmo]),
            Some(AgentRole::SalesManager)
        );
        assert_eq!(general[2].owner(&[]), None);

        let strategic = phase_template(TaskType::Strategic);
        assert_eq!(strategic[3].owner(&[AgentRole::Ceo]), None);
        assert_eq!(strategic[1].owner(&[]), Some(AgentRole::Ceo));
    }

    #[test]
    fn test_plan_for_high_complexity_doubles_days() {
        let analysis = TaskPatternTable::builtin().analyze("Develop a new platform");
        let before = Utc::now();
        let plan = create_execution_plan(&analysis, Priority::High, None);

        assert_eq!(plan.phases.len(), 5);
        assert_eq!(plan.complexity, Complexity::High);
        let days = (plan.estimated_completion - before).num_days();
        assert_eq!(days, 10);
        assert_eq!(plan.resource_requirements, "5 agents, 40 hours");
    }

    #[test]
    fn test_plan_for_general_task() {
        let analysis = TaskPatternTable::builtin().analyze("zzz");
        let before = Utc::now();
        let plan = create_execution_plan(&analysis, Priority::Low, None);
        assert_eq!(plan.phases.len(), 4);
        assert_eq!((plan.estimated_completion - before).num_days(), 4);
        assert_eq!(plan.resource_requirements, "1 agents, 4 hours");
    }
}
