//! Task routing
//!
//! Classifies a free-text task description into the roles that should work
//! on it. Classification walks an ordered table of regex rules; every rule
//! that matches contributes its roles, and rules may carry a task type and
//! complexity hint.

use crate::agents::AgentRole;
use aico_common::{AicoError, MAX_KEYWORDS, Result, RoutingRuleConfig, hours};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

const STOP_WORDS: &[&str] = &[
    "this", "that", "with", "from", "they", "have", "will", "been", "were",
];

static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("valid word regex"));

static BUILTIN_TABLE: LazyLock<TaskPatternTable> = LazyLock::new(|| {
    use AgentRole::*;

    let rule = |pattern: &str, roles: &[AgentRole]| {
        TaskPattern::new(pattern, roles.to_vec()).expect("valid built-in routing pattern")
    };

    TaskPatternTable::new(vec![
        rule(
            r"(create|build|develop|implement|code|program).*?(app|application|software|system|platform|website|api)",
            &[ProductManager, LeadEngineer, FrontendEngineer, BackendEngineer],
        )
        .with_task_type(TaskType::Development)
        .with_complexity(Complexity::High),
        rule(
            r"(design|ui|ux|interface|wireframe|mockup|prototype)",
            &[UxDesigner, UiDesigner, ProductManager],
        ),
        rule(r"(test|qa|quality|bug|testing)", &[QaEngineer, LeadEngineer]),
        rule(
            r"(market|marketing|campaign|promote|advertise|social media|content|blog|seo)",
            &[Cmo, MarketingManager, ContentCreator, SocialMediaManager, SeoSpecialist],
        )
        .with_task_type(TaskType::Marketing),
        rule(
            r"(sales|sell|lead|customer|prospect|revenue)",
            &[SalesManager, CustomerSuccess, Cmo],
        ),
        rule(
            r"(budget|finance|financial|cost|money|revenue|profit|investment)",
            &[Cfo, FinanceAnalyst],
        ),
        rule(
            r"(process|operation|optimize|efficiency|workflow|procedure)",
            &[OperationsManager, Chro],
        ),
        rule(
            r"(security|secure|protect|vulnerability|risk)",
            &[SecuritySpecialist, LegalAdvisor],
        ),
        rule(
            r"(data|analytics|analysis|metrics|report)",
            &[DataAnalyst, FinanceAnalyst],
        ),
        rule(
            r"(legal|compliance|contract|terms|policy)",
            &[LegalAdvisor, Chro],
        ),
        rule(
            r"(strategy|strategic|plan|planning|vision|roadmap|decision)",
            &[Ceo, Cto, Cmo, Cfo],
        )
        .with_task_type(TaskType::Strategic)
        .with_complexity(Complexity::High),
        rule(
            r"(hire|hiring|team|staff|employee|hr|human resources)",
            &[Chro, Ceo],
        ),
    ])
});

/// Broad kind of work a task represents; selects the phase template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Development,
    Marketing,
    Strategic,
    #[default]
    General,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Development => "development",
            TaskType::Marketing => "marketing",
            TaskType::Strategic => "strategic",
            TaskType::General => "general",
        }
    }
}

impl FromStr for TaskType {
    type Err = AicoError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" => Ok(TaskType::Development),
            "marketing" => Ok(TaskType::Marketing),
            "strategic" => Ok(TaskType::Strategic),
            "general" => Ok(TaskType::General),
            other => Err(AicoError::Config(format!("unknown task type '{}'", other))),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }

    /// Hours each required role is expected to spend
    pub fn hours_per_role(&self) -> u32 {
        match self {
            Complexity::Low => hours::LOW,
            Complexity::Medium => hours::MEDIUM,
            Complexity::High => hours::HIGH,
        }
    }
}

impl FromStr for Complexity {
    type Err = AicoError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Complexity::Low),
            "medium" => Ok(Complexity::Medium),
            "high" => Ok(Complexity::High),
            other => Err(AicoError::Config(format!("unknown complexity '{}'", other))),
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule of the routing table
#[derive(Debug, Clone)]
pub struct TaskPattern {
    regex: Regex,
    roles: Vec<AgentRole>,
    task_type: Option<TaskType>,
    complexity: Option<Complexity>,
}

impl TaskPattern {
    pub fn new(pattern: &str, roles: Vec<AgentRole>) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| AicoError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            regex,
            roles,
            task_type: None,
            complexity: None,
        })
    }

    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = Some(task_type);
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn roles(&self) -> &[AgentRole] {
        &self.roles
    }

    pub fn task_type(&self) -> Option<TaskType> {
        self.task_type
    }

    pub fn complexity(&self) -> Option<Complexity> {
        self.complexity
    }

    /// Test against an already-lowercased description
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Result of classifying a task description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    pub task_type: TaskType,
    pub complexity: Complexity,
    /// Never empty; ordered by first match
    pub required_roles: Vec<AgentRole>,
    pub estimated_hours: u32,
    pub keywords: Vec<String>,
}

/// Ordered regex → roles table
#[derive(Debug, Clone)]
pub struct TaskPatternTable {
    patterns: Vec<TaskPattern>,
}

impl TaskPatternTable {
    pub fn new(patterns: Vec<TaskPattern>) -> Self {
        Self { patterns }
    }

    /// The built-in routing table
    pub fn builtin() -> &'static TaskPatternTable {
        &BUILTIN_TABLE
    }

    /// Build a table from configured rules; an empty rule list yields the built-in table
    pub fn from_config(rules: &[RoutingRuleConfig]) -> Result<Self> {
        if rules.is_empty() {
            return Ok(Self::builtin().clone());
        }

        let mut patterns = Vec::with_capacity(rules.len());
        for rule in rules {
            let roles = rule
                .roles
                .iter()
                .map(|r| r.parse::<AgentRole>())
                .collect::<Result<Vec<_>>>()?;
            let mut pattern = TaskPattern::new(&rule.pattern, roles)?;
            if let Some(task_type) = &rule.task_type {
                pattern = pattern.with_task_type(task_type.parse()?);
            }
            if let Some(complexity) = &rule.complexity {
                pattern = pattern.with_complexity(complexity.parse()?);
            }
            patterns.push(pattern);
        }
        debug!("Loaded {} routing rules from config", patterns.len());
        Ok(Self::new(patterns))
    }

    pub fn patterns(&self) -> &[TaskPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Classify a task description
    pub fn analyze(&self, description: &str) -> TaskAnalysis {
        let lowered = description.to_lowercase();
        let mut required_roles: Vec<AgentRole> = Vec::new();
        let mut task_type = TaskType::General;
        let mut complexity = Complexity::Medium;

        for pattern in self.patterns.iter().filter(|p| p.is_match(&lowered)) {
            for role in pattern.roles() {
                if !required_roles.contains(role) {
                    required_roles.push(*role);
                }
            }
            if let Some(hint) = pattern.task_type {
                task_type = hint;
            }
            if let Some(hint) = pattern.complexity {
                complexity = complexity.max(hint);
            }
        }

        if required_roles.is_empty() {
            required_roles.push(AgentRole::Ceo);
            task_type = TaskType::General;
        }

        if complexity == Complexity::High && !required_roles.contains(&AgentRole::Ceo) {
            required_roles.push(AgentRole::Ceo);
        }

        let estimated_hours = required_roles.len() as u32 * complexity.hours_per_role();
        debug!(
            "Analyzed task as {} ({}) needing {} roles",
            task_type,
            complexity,
            required_roles.len()
        );

        TaskAnalysis {
            task_type,
            complexity,
            required_roles,
            estimated_hours,
            keywords: extract_keywords(description),
        }
    }
}

impl Default for TaskPatternTable {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

/// First words longer than three characters, skipping common filler
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_REGEX
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(description: &str) -> TaskAnalysis {
        TaskPatternTable::builtin().analyze(description)
    }

    #[test]
    fn test_builtin_table_has_twelve_rules() {
        assert_eq!(TaskPatternTable::builtin().len(), 12);
    }

    #[test]
    fn test_development_task() {
        let analysis = analyze("Develop a mobile app for ordering coffee");
        assert_eq!(analysis.task_type, TaskType::Development);
        assert_eq!(analysis.complexity, Complexity::High);
        assert_eq!(
            analysis.required_roles,
            vec![
                AgentRole::ProductManager,
                AgentRole::LeadEngineer,
                AgentRole::FrontendEngineer,
                AgentRole::BackendEngineer,
                AgentRole::Ceo,
            ]
        );
        assert_eq!(analysis.estimated_hours, 40);
    }

    #[test]
    fn test_marketing_task_keeps_medium_complexity() {
        let analysis = analyze("Launch a social media campaign");
        assert_eq!(analysis.task_type, TaskType::Marketing);
        assert_eq!(analysis.complexity, Complexity::Medium);
        assert_eq!(analysis.required_roles[0], AgentRole::Cmo);
        assert!(!analysis.required_roles.contains(&AgentRole::Ceo));
        assert_eq!(
            analysis.estimated_hours,
            analysis.required_roles.len() as u32 * 4
        );
    }

    #[test]
    fn test_later_hint_wins_and_complexity_never_drops() {
        // development (high) then marketing (no complexity hint)
        let analysis = analyze("Develop a website and a marketing blog");
        assert_eq!(analysis.task_type, TaskType::Marketing);
        assert_eq!(analysis.complexity, Complexity::High);
        assert!(analysis.required_roles.contains(&AgentRole::Ceo));
    }

    #[test]
    fn test_roles_are_unioned_in_first_match_order() {
        let analysis = analyze("Sales revenue budget");
        // rule 5 contributes cmo, rule 6 contributes cfo; revenue matches both
        assert_eq!(
            analysis.required_roles,
            vec![
                AgentRole::SalesManager,
                AgentRole::CustomerSuccess,
                AgentRole::Cmo,
                AgentRole::Cfo,
                AgentRole::FinanceAnalyst,
            ]
        );
    }

    #[test]
    fn test_no_match_falls_back_to_ceo() {
        let analysis = analyze("zzz");
        assert_eq!(analysis.required_roles, vec![AgentRole::Ceo]);
        assert_eq!(analysis.task_type, TaskType::General);
        assert_eq!(analysis.complexity, Complexity::Medium);
        assert_eq!(analysis.estimated_hours, 4);
    }

    #[test]
    fn test_strategic_task_already_has_ceo() {
        let analysis = analyze("Define our product vision");
        assert_eq!(analysis.task_type, TaskType::Strategic);
        assert_eq!(
            analysis
                .required_roles
                .iter()
                .filter(|r| **r == AgentRole::Ceo)
                .count(),
            1
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let analysis = analyze("HIRE A NEW ENGINEER");
        assert_eq!(analysis.required_roles[0], AgentRole::Chro);
    }

    #[test]
    fn test_extract_keywords() {
        let keywords =
            extract_keywords("This plan will cover the Roadmap with data from users that have been waiting");
        assert_eq!(
            keywords,
            vec!["plan", "cover", "roadmap", "data", "users", "waiting"]
        );

        let long = "alpha bravo charlie delta echos foxtrot golfs hotel india juliet kilos lima";
        assert_eq!(extract_keywords(long).len(), 10);
    }

    #[test]
    fn test_table_from_config() {
        let rules = vec![RoutingRuleConfig {
            pattern: r"(deploy|release)".to_string(),
            roles: vec!["devops_engineer".to_string()],
            task_type: Some("development".to_string()),
            complexity: Some("low".to_string()),
        }];
        let table = TaskPatternTable::from_config(&rules).unwrap();
        let analysis = table.analyze("Release version 2");
        assert_eq!(analysis.required_roles, vec![AgentRole::DevopsEngineer]);
        assert_eq!(analysis.task_type, TaskType::Development);
        // a low hint cannot lower the default medium
        assert_eq!(analysis.complexity, Complexity::Medium);

        assert_eq!(TaskPatternTable::from_config(&[]).unwrap().len(), 12);
    }

    #[test]
    fn test_invalid_config_rules() {
        let bad_regex = vec![RoutingRuleConfig {
            pattern: "(unclosed".to_string(),
            roles: vec!["ceo".to_string()],
            task_type: None,
            complexity: None,
        }];
        assert!(matches!(
            TaskPatternTable::from_config(&bad_regex),
            Err(AicoError::InvalidPattern { .. })
        ));

        let bad_role = vec![RoutingRuleConfig {
            pattern: "x".to_string(),
            roles: vec!["wizard".to_string()],
            task_type: None,
            complexity: None,
        }];
        assert!(matches!(
            TaskPatternTable::from_config(&bad_role),
            Err(AicoError::UnknownRole(_))
        ));
    }
}
