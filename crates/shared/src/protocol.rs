use serde::{Deserialize, Serialize};

use crate::domain::{DatapointId, FieldContent, FieldNode, Scalar};

/// Inbound webhook payload, after signature verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookRequest {
    pub action: String,
    #[serde(default)]
    pub updated_datapoints: Vec<DatapointId>,
    pub annotation: Annotation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub content: Vec<FieldNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Warning,
    Error,
}

/// Advisory note attached to one datapoint; never changes data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: DatapointId,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
}

impl Message {
    pub fn warning(id: DatapointId, content: impl Into<String>) -> Self {
        Self {
            id,
            kind: MessageKind::Warning,
            content: content.into(),
        }
    }

    pub fn error(id: DatapointId, content: impl Into<String>) -> Self {
        Self {
            id,
            kind: MessageKind::Error,
            content: content.into(),
        }
    }
}

/// Entry of the enum picker attached to a replace operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: Scalar,
    pub label: String,
}

/// Proposed mutation of one datapoint, applied by the platform, not by us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Replace { id: DatapointId, value: ReplaceValue },
}

impl Operation {
    pub fn replace(id: DatapointId, value: ReplaceValue) -> Self {
        Operation::Replace { id, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceValue {
    pub content: FieldContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    pub validation_sources: Vec<String>,
}

/// Outbound webhook payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub messages: Vec<Message>,
    pub operations: Vec<Operation>,
}
