//! Matcher contract (§4.3): selects a span by direction, method, path, host,
//! and exactly one target field.

use regex::Regex;
use serde::Deserialize;

use crate::jsonpath::{self, Segment};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Raw, user-authored matcher configuration — the wire/config shape before
/// compilation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatcherConfig {
    pub direction: Option<Direction>,
    #[serde(default)]
    pub method: Vec<String>,
    pub path_pattern: Option<String>,
    pub host: Option<String>,

    pub json_path: Option<String>,
    pub query_param: Option<String>,
    pub header_name: Option<String>,
    pub url_path: Option<bool>,
    pub full_body: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("matcher must select exactly one target field, found {0}")]
    WrongTargetCount(usize),
    #[error("invalid pathPattern regex: {0}")]
    InvalidPathPattern(regex::Error),
    #[error("invalid host regex: {0}")]
    InvalidHost(regex::Error),
    #[error("invalid jsonPath: {0}")]
    InvalidJsonPath(#[from] jsonpath::PathError),
    #[error("matcher requires a direction")]
    MissingDirection,
}

/// What part of the span a compiled matcher's action applies to. Each
/// variant keeps the user-authored string alongside any compiled form,
/// since `transform_metadata` records the original (§8's `field` values).
#[derive(Clone, Debug)]
pub enum Target {
    JsonPath { raw: String, segments: Vec<Segment> },
    QueryParam(String),
    HeaderName { raw: String, lower: String },
    UrlPath,
    FullBody,
}

/// A compiled, validated matcher. Construction is the only place regexes
/// are compiled and the single-target rule is enforced (§4.3: "must be
/// enforced at compile time").
#[derive(Clone, Debug)]
pub struct Matcher {
    pub direction: Direction,
    pub methods: Vec<String>,
    pub path_pattern: Option<Regex>,
    pub host: Option<Regex>,
    pub target: Target,
}

impl Matcher {
    pub fn compile(config: &MatcherConfig) -> Result<Self, CompileError> {
        let direction = config.direction.ok_or(CompileError::MissingDirection)?;

        let target_count = [
            config.json_path.is_some(),
            config.query_param.is_some(),
            config.header_name.is_some(),
            config.url_path.unwrap_or(false),
            config.full_body.unwrap_or(false),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if target_count != 1 {
            return Err(CompileError::WrongTargetCount(target_count));
        }

        let target = if let Some(path) = &config.json_path {
            Target::JsonPath {
                raw: path.clone(),
                segments: jsonpath::parse(path)?,
            }
        } else if let Some(param) = &config.query_param {
            Target::QueryParam(param.clone())
        } else if let Some(header) = &config.header_name {
            Target::HeaderName {
                raw: header.clone(),
                lower: header.to_ascii_lowercase(),
            }
        } else if config.url_path.unwrap_or(false) {
            Target::UrlPath
        } else {
            Target::FullBody
        };

        let path_pattern = config
            .path_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(CompileError::InvalidPathPattern)?;
        let host = config
            .host
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(CompileError::InvalidHost)?;

        Ok(Self {
            direction,
            methods: config.method.iter().map(|m| m.to_ascii_uppercase()).collect(),
            path_pattern,
            host,
            target,
        })
    }

    /// Whether this matcher selects the given call.
    pub fn matches(&self, direction: Direction, method: &str, path: &str, host: &str) -> bool {
        if self.direction != direction {
            return false;
        }
        if !self.methods.is_empty() && !self.methods.iter().any(|m| m.eq_ignore_ascii_case(method)) {
            return false;
        }
        if let Some(re) = &self.path_pattern {
            if !re.is_match(path) {
                return false;
            }
        }
        if let Some(re) = &self.host {
            if !re.is_match(host) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> MatcherConfig {
        MatcherConfig {
            direction: Some(Direction::Outbound),
            full_body: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn rejects_zero_targets() {
        let config = MatcherConfig {
            direction: Some(Direction::Outbound),
            ..Default::default()
        };
        assert!(matches!(
            Matcher::compile(&config),
            Err(CompileError::WrongTargetCount(0))
        ));
    }

    #[test]
    fn rejects_multiple_targets() {
        let mut config = base_config();
        config.query_param = Some("token".into());
        assert!(matches!(
            Matcher::compile(&config),
            Err(CompileError::WrongTargetCount(2))
        ));
    }

    #[test]
    fn rejects_invalid_regex_at_compile_time() {
        let mut config = base_config();
        config.path_pattern = Some("(unclosed".into());
        assert!(matches!(
            Matcher::compile(&config),
            Err(CompileError::InvalidPathPattern(_))
        ));
    }

    #[test]
    fn matches_on_method_path_and_host() {
        let config = MatcherConfig {
            direction: Some(Direction::Outbound),
            method: vec!["post".into()],
            path_pattern: Some("^/users/\\d+$".into()),
            host: Some("api\\.example\\.com".into()),
            full_body: Some(true),
            ..Default::default()
        };
        let matcher = Matcher::compile(&config).unwrap();
        assert!(matcher.matches(Direction::Outbound, "POST", "/users/42", "api.example.com"));
        assert!(!matcher.matches(Direction::Outbound, "GET", "/users/42", "api.example.com"));
        assert!(!matcher.matches(Direction::Outbound, "POST", "/orders/42", "api.example.com"));
        assert!(!matcher.matches(Direction::Inbound, "POST", "/users/42", "api.example.com"));
    }

    #[test]
    fn empty_method_list_is_a_wildcard() {
        let matcher = Matcher::compile(&base_config()).unwrap();
        assert!(matcher.matches(Direction::Outbound, "DELETE", "/anything", "anyhost"));
    }
}
