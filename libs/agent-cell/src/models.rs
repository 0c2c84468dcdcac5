use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

// ==============================================================================
// CONVERSATION TURNS
// ==============================================================================

/// A named operation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Correlates the request with its result turn.
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolErrorKind {
    DoctorNotFound,
    SlotUnavailable,
    InvalidDateTime,
    InvalidArguments,
    InvalidQuery,
    ValidationError,
    UnknownTool,
    TransportFailure,
    Internal,
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of one tool call: a success payload or a structured error.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Value),
    Failure { kind: ToolErrorKind, message: String },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    /// The payload fed back to the model. Failures become
    /// `{"error": message, "kind": kind}`.
    pub fn to_value(&self) -> Value {
        match self {
            ToolOutcome::Success(value) => value.clone(),
            ToolOutcome::Failure { kind, message } => json!({
                "error": message,
                "kind": kind,
            }),
        }
    }

    /// Id of a successfully booked appointment carried by this result.
    pub fn appointment_id(&self) -> Option<i64> {
        match self {
            ToolOutcome::Success(value) if value["success"] == true => {
                value["appointment_id"].as_i64()
            }
            _ => None,
        }
    }
}

impl Serialize for ToolOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// One entry of a session's append-only history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    User {
        content: String,
    },
    Model {
        content: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolRequest>,
    },
    Tool {
        call_id: String,
        tool_name: String,
        tool_input: Value,
        tool_output: ToolOutcome,
    },
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Turn::User {
            content: content.into(),
        }
    }

    pub fn model_text(content: impl Into<String>) -> Self {
        Turn::Model {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_result(request: &ToolRequest, outcome: ToolOutcome) -> Self {
        Turn::Tool {
            call_id: request.id.clone(),
            tool_name: request.name.clone(),
            tool_input: request.arguments.clone(),
            tool_output: outcome,
        }
    }
}

// ==============================================================================
// CHAT OUTCOME
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Completed,
    IterationLimitReached,
    TransportFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatOutcome {
    pub response: String,
    pub appointment_id: Option<i64>,
    pub status: TurnStatus,
}

// ==============================================================================
// HTTP MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub appointment_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_serializes_as_error_object() {
        let outcome = ToolOutcome::Failure {
            kind: ToolErrorKind::SlotUnavailable,
            message: "taken".to_string(),
        };
        assert_eq!(outcome.to_value(), json!({ "error": "taken", "kind": "SlotUnavailable" }));
        assert_eq!(serde_json::to_value(&outcome).unwrap(), outcome.to_value());
    }

    #[test]
    fn test_appointment_id_only_from_successful_booking() {
        let booked = ToolOutcome::Success(json!({ "success": true, "appointment_id": 12 }));
        assert_eq!(booked.appointment_id(), Some(12));

        let availability = ToolOutcome::Success(json!({ "available": true, "slots": [] }));
        assert_eq!(availability.appointment_id(), None);

        let failed = ToolOutcome::Failure {
            kind: ToolErrorKind::Internal,
            message: "boom".to_string(),
        };
        assert_eq!(failed.appointment_id(), None);
    }

    #[test]
    fn test_turns_serialize_with_role_tag() {
        let value = serde_json::to_value(Turn::user("hello")).unwrap();
        assert_eq!(value, json!({ "role": "user", "content": "hello" }));

        let value = serde_json::to_value(Turn::model_text("hi")).unwrap();
        assert_eq!(value, json!({ "role": "model", "content": "hi" }));
    }
}
