//! Structural operations and mutation context

use serde::{Deserialize, Serialize};

/// Structural edit applied to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Forget everything materialized so far
    ClearAll,
    /// Add a child, or update it if already present
    UpdateOrAppend,
    Remove,
    /// Content of an existing child changed; structure unchanged
    Update,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ClearAll => "clear_all",
            Operation::UpdateOrAppend => "update_or_append",
            Operation::Remove => "remove",
            Operation::Update => "update",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "clear_all" => Some(Operation::ClearAll),
            "update_or_append" => Some(Operation::UpdateOrAppend),
            "remove" => Some(Operation::Remove),
            "update" => Some(Operation::Update),
            _ => None,
        }
    }
}

/// One structural edit keyed by content id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStructure {
    pub operation: Operation,
    #[serde(default)]
    pub content_id: String,
    /// `None` for the root feature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_content_id: Option<String>,
}

impl StreamStructure {
    pub fn add(content_id: impl Into<String>, parent_content_id: Option<&str>) -> Self {
        Self {
            operation: Operation::UpdateOrAppend,
            content_id: content_id.into(),
            parent_content_id: parent_content_id.map(str::to_string),
        }
    }

    pub fn remove(content_id: impl Into<String>, parent_content_id: Option<&str>) -> Self {
        Self {
            operation: Operation::Remove,
            content_id: content_id.into(),
            parent_content_id: parent_content_id.map(str::to_string),
        }
    }

    pub fn update(content_id: impl Into<String>) -> Self {
        Self {
            operation: Operation::Update,
            content_id: content_id.into(),
            parent_content_id: None,
        }
    }

    pub fn clear_all() -> Self {
        Self {
            operation: Operation::ClearAll,
            content_id: String::new(),
            parent_content_id: None,
        }
    }
}

/// Pagination boundary; its content id lives in the session that issued it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamToken {
    pub content_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub next_page_token: String,
}

/// Why a batch of structures is being applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationContext {
    /// Set when the batch is the next page behind a continuation token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<StreamToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requesting_session_id: Option<String>,
}

impl MutationContext {
    pub fn with_token(token: StreamToken) -> Self {
        Self {
            continuation_token: Some(token),
            requesting_session_id: None,
        }
    }
}
