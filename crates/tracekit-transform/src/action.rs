//! Action contract (§4.3): redact, mask, replace, or drop a matched field.

use serde::Deserialize;
use sha2::{Digest, Sha256};

const DEFAULT_REDACT_PREFIX: &str = "REDACTED_";
const DEFAULT_MASK_CHAR: char = '*';

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionConfig {
    Redact {
        #[serde(default, rename = "hashPrefix")]
        hash_prefix: Option<String>,
    },
    Mask {
        #[serde(default, rename = "maskChar")]
        mask_char: Option<char>,
    },
    Replace {
        #[serde(rename = "replaceWith")]
        replace_with: String,
    },
    Drop,
}

#[derive(Clone, Debug)]
pub enum Action {
    Redact { hash_prefix: String },
    Mask { mask_char: char },
    Replace { replace_with: String },
    Drop,
}

impl From<&ActionConfig> for Action {
    fn from(config: &ActionConfig) -> Self {
        match config {
            ActionConfig::Redact { hash_prefix } => Action::Redact {
                hash_prefix: hash_prefix.clone().unwrap_or_else(|| DEFAULT_REDACT_PREFIX.to_string()),
            },
            ActionConfig::Mask { mask_char } => Action::Mask {
                mask_char: mask_char.unwrap_or(DEFAULT_MASK_CHAR),
            },
            ActionConfig::Replace { replace_with } => Action::Replace {
                replace_with: replace_with.clone(),
            },
            ActionConfig::Drop => Action::Drop,
        }
    }
}

impl Action {
    /// Apply this action to a string value, per §4.3's literal rules.
    pub fn apply_str(&self, value: &str) -> String {
        match self {
            Action::Redact { hash_prefix } => {
                let mut hasher = Sha256::new();
                hasher.update(value.as_bytes());
                let digest = hex::encode(hasher.finalize());
                format!("{hash_prefix}{}...", &digest[..12])
            }
            Action::Mask { mask_char } => mask_char.to_string().repeat(value.chars().count()),
            Action::Replace { replace_with } => replace_with.clone(),
            Action::Drop => String::new(),
        }
    }
}
