//! Shapes recorded on a span describing which transforms applied to it (§4.3).
//!
//! The matcher/action pipeline itself lives in `tracekit-transform`; this
//! crate only carries the data shape that ends up attached to a [`Span`](crate::Span).

use serde::{Deserialize, Serialize};

/// What kind of action a transform applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformActionKind {
    Redact,
    Mask,
    Replace,
    Drop,
}

/// One applied transform action, appended to `transform_metadata.actions` in
/// configuration order (§4.3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformActionRecord {
    #[serde(rename = "type")]
    pub kind: TransformActionKind,
    pub field: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransformActionRecord {
    pub fn new(kind: TransformActionKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            reason: "transforms".to_string(),
            description: None,
        }
    }
}

/// Record of every transform applied to a span before export.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformMetadata {
    pub actions: Vec<TransformActionRecord>,
}

impl TransformMetadata {
    pub fn push(&mut self, action: TransformActionRecord) {
        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
