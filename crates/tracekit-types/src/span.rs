//! The span: unit of observation for a single intercepted operation.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::ids::{SpanId, TraceId};
use crate::transform::TransformMetadata;

/// What role a span plays in a call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive, serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SpanKind {
    Server,
    Client,
    Producer,
    Consumer,
    Internal,
    #[default]
    Unspecified,
}

impl SpanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Server => "SERVER",
            SpanKind::Client => "CLIENT",
            SpanKind::Producer => "PRODUCER",
            SpanKind::Consumer => "CONSUMER",
            SpanKind::Internal => "INTERNAL",
            SpanKind::Unspecified => "UNSPECIFIED",
        }
    }
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The family of package an instrumentation is patching (§3).
///
/// Deliberately open-ended: instrumentations are out of scope (§1), so this
/// only needs to round-trip whatever string an instrumentation supplies.
/// The well-known variants cover the source's concrete instrumentations;
/// `Other` carries anything else without losing information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PackageType {
    Http,
    Mysql,
    Pg,
    Graphql,
    Redis,
    Fetch,
    Other(String),
}

impl PackageType {
    pub fn as_str(&self) -> &str {
        match self {
            PackageType::Http => "HTTP",
            PackageType::Mysql => "MYSQL",
            PackageType::Pg => "PG",
            PackageType::Graphql => "GRAPHQL",
            PackageType::Redis => "REDIS",
            PackageType::Fetch => "FETCH",
            PackageType::Other(s) => s,
        }
    }
}

impl FromStr for PackageType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "HTTP" => PackageType::Http,
            "MYSQL" => PackageType::Mysql,
            "PG" => PackageType::Pg,
            "GRAPHQL" => PackageType::Graphql,
            "REDIS" => PackageType::Redis,
            "FETCH" => PackageType::Fetch,
            _ => PackageType::Other(s.to_string()),
        })
    }
}

impl std::fmt::Display for PackageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal status of a span.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStatus {
    pub code: StatusCode,
    pub message: Option<String>,
}

impl SpanStatus {
    pub fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::Error,
            message: Some(message.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
pub enum StatusCode {
    #[default]
    Unset,
    Ok,
    Error,
}

/// Seconds + nanos since the Unix epoch, matching the wire protocol's
/// timestamp shape (§6) rather than a platform `SystemTime`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn from_unix(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }
}

/// Duration as seconds + nanos (§3), always non-negative per the invariant
/// in §8.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanDuration {
    pub seconds: u64,
    pub nanos: u32,
}

impl SpanDuration {
    pub fn from_std(d: Duration) -> Self {
        Self {
            seconds: d.as_secs(),
            nanos: d.subsec_nanos(),
        }
    }

    pub fn as_std(&self) -> Duration {
        Duration::new(self.seconds, self.nanos)
    }
}

/// Inputs an instrumentation supplies when opening a span (§4.1).
#[derive(Clone, Debug, Default)]
pub struct SpanOptions {
    pub name: String,
    pub kind: SpanKind,
    pub submodule_name: Option<String>,
    pub package_name: String,
    pub package_type: PackageType,
    pub instrumentation_name: String,
    pub input_value: serde_json::Value,
    pub is_pre_app_start: bool,
}

impl SpanOptions {
    pub fn new(name: impl Into<String>, kind: SpanKind) -> Self {
        Self {
            name: name.into(),
            kind,
            package_type: PackageType::Other(String::new()),
            ..Default::default()
        }
    }
}

impl Default for PackageType {
    fn default() -> Self {
        PackageType::Other(String::new())
    }
}

/// A single recorded observation (§3).
///
/// Spans are constructed only by the tracing core (`tracekit-core`); every
/// other crate sees an opaque handle (`SpanId` + `TraceId`) rather than a
/// `Span` value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Span {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,

    pub name: String,
    pub kind: SpanKind,
    pub package_name: String,
    pub package_type: PackageType,
    pub submodule_name: Option<String>,
    pub instrumentation_name: String,

    pub input_value: serde_json::Value,
    pub output_value: serde_json::Value,
    pub metadata: serde_json::Value,

    pub input_schema: serde_json::Value,
    pub output_schema: serde_json::Value,
    pub input_schema_hash: String,
    pub output_schema_hash: String,
    pub input_value_hash: String,
    pub output_value_hash: String,

    pub timestamp: Timestamp,
    pub duration: SpanDuration,

    pub is_root_span: bool,
    pub is_pre_app_start: bool,
    pub status: SpanStatus,

    pub transform_metadata: Option<TransformMetadata>,
}

impl Span {
    /// Construct a span from its options and ambient parentage. Hashes and
    /// schemas are left empty — the core fills them in via canonicalization
    /// at creation and again at `end_span` time (§4.1).
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        parent_span_id: Option<SpanId>,
        opts: SpanOptions,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            trace_id,
            span_id,
            parent_span_id,
            name: opts.name,
            kind: opts.kind,
            package_name: opts.package_name,
            package_type: opts.package_type,
            submodule_name: opts.submodule_name,
            instrumentation_name: opts.instrumentation_name,
            input_value: opts.input_value,
            output_value: serde_json::Value::Null,
            metadata: serde_json::Value::Null,
            input_schema: serde_json::Value::Null,
            output_schema: serde_json::Value::Null,
            input_schema_hash: String::new(),
            output_schema_hash: String::new(),
            input_value_hash: String::new(),
            output_value_hash: String::new(),
            timestamp,
            duration: SpanDuration::default(),
            is_root_span: parent_span_id.is_none(),
            is_pre_app_start: opts.is_pre_app_start,
            status: SpanStatus::default(),
            transform_metadata: None,
        }
    }
}
