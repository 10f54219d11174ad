//! Communication primitives for agent messaging

use aico_common::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Types of messages that can be sent between agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// A unit of work handed to an agent
    TaskAssignment,
    StatusUpdate,
    CollaborationRequest,
    DecisionRequest,
    /// Facts merged into the recipient's knowledge base
    InformationShare,
    Escalation,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::TaskAssignment => "task_assignment",
            MessageType::StatusUpdate => "status_update",
            MessageType::CollaborationRequest => "collaboration_request",
            MessageType::DecisionRequest => "decision_request",
            MessageType::InformationShare => "information_share",
            MessageType::Escalation => "escalation",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message and task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low = 1,
    #[default]
    Medium = 2,
    High = 3,
    Urgent = 4,
}

impl Priority {
    /// Parse a priority name, falling back to `Medium` for anything unrecognized
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Numeric level, 1 (low) through 4 (urgent)
    pub fn level(&self) -> u8 {
        *self as u8
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "1" => Ok(Priority::Low),
            "medium" | "2" => Ok(Priority::Medium),
            "high" | "3" => Ok(Priority::High),
            "urgent" | "4" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message sent between agents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Unique message identifier
    pub id: String,

    /// ID of the sending agent
    pub sender: String,

    /// ID of the receiving agent
    pub recipient: String,

    /// Message type for routing/handling
    pub message_type: MessageType,

    /// Structured message content
    pub content: Value,

    pub priority: Priority,

    /// Timestamp when message was created
    pub timestamp: DateTime<Utc>,

    pub requires_response: bool,

    pub deadline: Option<DateTime<Utc>>,
}

impl AgentMessage {
    /// Create a new message with medium priority
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        message_type: MessageType,
        content: Value,
    ) -> Self {
        Self {
            id: generate_id(),
            sender: sender.into(),
            recipient: recipient.into(),
            message_type,
            content,
            priority: Priority::Medium,
            timestamp: Utc::now(),
            requires_response: false,
            deadline: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn requiring_response(mut self) -> Self {
        self.requires_response = true;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Response to an agent message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// ID of the original message being responded to
    pub in_response_to: String,

    /// Response content
    pub content: String,

    /// Optional structured response data
    pub data: Option<Value>,

    /// Whether the operation was successful
    pub success: bool,

    /// Optional error message if success is false
    pub error: Option<String>,

    /// Timestamp when response was created
    pub timestamp: DateTime<Utc>,
}

impl MessageResponse {
    /// Create a successful response
    pub fn success(in_response_to: String, content: String, data: Option<Value>) -> Self {
        Self {
            in_response_to,
            content,
            data,
            success: true,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Create an error response
    pub fn error(in_response_to: String, error_message: String) -> Self {
        Self {
            in_response_to,
            content: String::new(),
            data: None,
            success: false,
            error: Some(error_message),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_parsing() {
        assert_eq!(Priority::parse_or_default("HIGH"), Priority::High);
        assert_eq!(Priority::parse_or_default(" urgent "), Priority::Urgent);
        assert_eq!(Priority::parse_or_default("low"), Priority::Low);
        assert_eq!(Priority::parse_or_default("whenever"), Priority::Medium);
        assert_eq!(Priority::Urgent.level(), 4);
        assert!(Priority::High > Priority::Medium);
    }

    #[test]
    fn test_message_type_wire_names() {
        let value = serde_json::to_value(MessageType::TaskAssignment).unwrap();
        assert_eq!(value, json!("task_assignment"));
        let parsed: MessageType = serde_json::from_value(json!("information_share")).unwrap();
        assert_eq!(parsed, MessageType::InformationShare);
        assert_eq!(MessageType::Escalation.to_string(), "escalation");
    }

    #[test]
    fn test_message_builder() {
        let message = AgentMessage::new(
            "ceo_001",
            "cto_001",
            MessageType::DecisionRequest,
            json!({"proposal": "migrate"}),
        )
        .with_priority(Priority::High)
        .requiring_response();

        assert_eq!(message.sender, "ceo_001");
        assert_eq!(message.recipient, "cto_001");
        assert_eq!(message.priority, Priority::High);
        assert!(message.requires_response);
        assert!(message.deadline.is_none());
    }

    #[test]
    fn test_responses() {
        let ok = MessageResponse::success("m1".into(), "done".into(), None);
        assert!(ok.success);
        assert!(ok.error.is_none());

        let err = MessageResponse::error("m2".into(), "bad payload".into());
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("bad payload"));
    }
}
