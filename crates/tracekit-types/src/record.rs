//! Record entries returned by the replay match service (§3, §4.4).

use serde::{Deserialize, Serialize};

/// How confidently a record was matched against a replay fingerprint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchLevel {
    #[default]
    Unspecified,
    InputValueHash,
    InputValueHashReducedSchema,
    InputSchemaHash,
    InputSchemaHashReducedSchema,
    Fuzzy,
    Fallback,
}

/// The scope a match was resolved within.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchScope {
    #[default]
    Span,
    Trace,
    Global,
}

/// An alternate candidate considered (and rejected) during matching, surfaced
/// for diagnostics when a match is fuzzy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub result: serde_json::Value,
    pub similarity_score: f64,
}

/// A single record retrieved by the replay match service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub result: serde_json::Value,
    pub match_level: MatchLevel,
    pub match_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_scope: Option<MatchScope>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_candidates: Vec<MatchCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
}

impl RecordEntry {
    pub fn exact(result: serde_json::Value) -> Self {
        Self {
            result,
            match_level: MatchLevel::InputValueHash,
            match_description: "exact input value hash match".to_string(),
            match_scope: Some(MatchScope::Span),
            top_candidates: Vec::new(),
            similarity_score: None,
        }
    }
}
