//! The span wire protocol (§6): hand-written `prost::Message` structs
//! matching the Struct/Value oneof shape, with no `.proto` file or
//! build-time codegen. Field tags are chosen to match the source shape's
//! ordering; they only need to be internally consistent since both ends of
//! this wire format are this crate.

use prost::{Message, Oneof};

use tracekit_types::Span;

/// A structured value, mirroring `google.protobuf.Struct`/`Value`.
#[derive(Clone, PartialEq, Message)]
pub struct Struct {
    #[prost(map = "string, message", tag = "1")]
    pub fields: std::collections::BTreeMap<String, Value>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ListValue {
    #[prost(message, repeated, tag = "1")]
    pub values: Vec<Value>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Value {
    #[prost(oneof = "ValueKind", tags = "1, 2, 3, 4, 5, 6")]
    pub kind: Option<ValueKind>,
}

#[derive(Clone, PartialEq, Oneof)]
pub enum ValueKind {
    #[prost(bool, tag = "1")]
    NullValue(bool),
    #[prost(bool, tag = "2")]
    BoolValue(bool),
    #[prost(double, tag = "3")]
    NumberValue(f64),
    #[prost(string, tag = "4")]
    StringValue(String),
    #[prost(message, tag = "5")]
    ListValue(ListValue),
    #[prost(message, tag = "6")]
    StructValue(Struct),
}

/// Coerce a `serde_json::Value` into the wire `Value` shape. Unknown/
/// unrepresentable JSON types (there are none left after canonicalization)
/// would fall back to their string form; in practice every input has
/// already passed through canonicalization and is one of these six shapes.
pub fn value_from_json(value: &serde_json::Value) -> Value {
    let kind = match value {
        serde_json::Value::Null => ValueKind::NullValue(true),
        serde_json::Value::Bool(b) => ValueKind::BoolValue(*b),
        serde_json::Value::Number(n) => ValueKind::NumberValue(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => ValueKind::StringValue(s.clone()),
        serde_json::Value::Array(items) => ValueKind::ListValue(ListValue {
            values: items.iter().map(value_from_json).collect(),
        }),
        serde_json::Value::Object(map) => ValueKind::StructValue(Struct {
            fields: map.iter().map(|(k, v)| (k.clone(), value_from_json(v))).collect(),
        }),
    };
    Value { kind: Some(kind) }
}

pub fn json_from_value(value: &Value) -> serde_json::Value {
    match &value.kind {
        None | Some(ValueKind::NullValue(_)) => serde_json::Value::Null,
        Some(ValueKind::BoolValue(b)) => serde_json::Value::Bool(*b),
        Some(ValueKind::NumberValue(n)) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(ValueKind::StringValue(s)) => serde_json::Value::String(s.clone()),
        Some(ValueKind::ListValue(list)) => serde_json::Value::Array(list.values.iter().map(json_from_value).collect()),
        Some(ValueKind::StructValue(s)) => {
            serde_json::Value::Object(s.fields.iter().map(|(k, v)| (k.clone(), json_from_value(v))).collect())
        }
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct WireTimestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(uint32, tag = "2")]
    pub nanos: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireDuration {
    #[prost(uint64, tag = "1")]
    pub seconds: u64,
    #[prost(uint32, tag = "2")]
    pub nanos: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireSpan {
    #[prost(string, tag = "1")]
    pub trace_id: String,
    #[prost(string, tag = "2")]
    pub span_id: String,
    #[prost(string, optional, tag = "3")]
    pub parent_span_id: Option<String>,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(string, tag = "5")]
    pub kind: String,
    #[prost(string, tag = "6")]
    pub package_name: String,
    #[prost(string, tag = "7")]
    pub package_type: String,
    #[prost(string, optional, tag = "8")]
    pub submodule_name: Option<String>,
    #[prost(string, tag = "9")]
    pub instrumentation_name: String,
    #[prost(message, optional, tag = "10")]
    pub input_value: Option<Value>,
    #[prost(message, optional, tag = "11")]
    pub output_value: Option<Value>,
    #[prost(message, optional, tag = "12")]
    pub metadata: Option<Value>,
    #[prost(string, tag = "13")]
    pub input_schema_hash: String,
    #[prost(string, tag = "14")]
    pub output_schema_hash: String,
    #[prost(string, tag = "15")]
    pub input_value_hash: String,
    #[prost(string, tag = "16")]
    pub output_value_hash: String,
    #[prost(message, optional, tag = "17")]
    pub timestamp: Option<WireTimestamp>,
    #[prost(message, optional, tag = "18")]
    pub duration: Option<WireDuration>,
    #[prost(bool, tag = "19")]
    pub is_root_span: bool,
    #[prost(bool, tag = "20")]
    pub is_pre_app_start: bool,
    #[prost(string, tag = "21")]
    pub status_code: String,
    #[prost(string, optional, tag = "22")]
    pub status_message: Option<String>,
}

impl From<&Span> for WireSpan {
    fn from(span: &Span) -> Self {
        Self {
            trace_id: span.trace_id.to_string(),
            span_id: span.span_id.to_string(),
            parent_span_id: span.parent_span_id.map(|id| id.to_string()),
            name: span.name.clone(),
            kind: span.kind.as_str().to_string(),
            package_name: span.package_name.clone(),
            package_type: span.package_type.as_str().to_string(),
            submodule_name: span.submodule_name.clone(),
            instrumentation_name: span.instrumentation_name.clone(),
            input_value: Some(value_from_json(&span.input_value)),
            output_value: Some(value_from_json(&span.output_value)),
            metadata: Some(value_from_json(&span.metadata)),
            input_schema_hash: span.input_schema_hash.clone(),
            output_schema_hash: span.output_schema_hash.clone(),
            input_value_hash: span.input_value_hash.clone(),
            output_value_hash: span.output_value_hash.clone(),
            timestamp: Some(WireTimestamp {
                seconds: span.timestamp.seconds,
                nanos: span.timestamp.nanos,
            }),
            duration: Some(WireDuration {
                seconds: span.duration.seconds,
                nanos: span.duration.nanos,
            }),
            is_root_span: span.is_root_span,
            is_pre_app_start: span.is_pre_app_start,
            status_code: format!("{:?}", span.status.code).to_uppercase(),
            status_message: span.status.message.clone(),
        }
    }
}

/// `ExportSpansRequest` (§6).
#[derive(Clone, PartialEq, Message)]
pub struct ExportSpansRequest {
    #[prost(string, tag = "1")]
    pub observable_service_id: String,
    #[prost(string, tag = "2")]
    pub environment: String,
    #[prost(string, tag = "3")]
    pub sdk_version: String,
    #[prost(string, tag = "4")]
    pub sdk_instance_id: String,
    #[prost(message, repeated, tag = "5")]
    pub spans: Vec<WireSpan>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ExportSpansResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, optional, tag = "2")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_value_round_trips_through_wire_value() {
        let input = json!({"a": 1, "b": [true, null, "x"], "c": {"nested": 2.5}});
        let wire = value_from_json(&input);
        let back = json_from_value(&wire);
        assert_eq!(back, input);
    }

    #[test]
    fn wire_span_round_trips_through_prost_encoding() {
        use tracekit_types::{SpanDuration, SpanKind, SpanOptions, Timestamp, TraceId, SpanId};

        let opts = SpanOptions::new("op", SpanKind::Client);
        let mut span = Span::new(TraceId::new(), SpanId::new(), None, opts, Timestamp::from_unix(1, 2));
        span.duration = SpanDuration::from_std(std::time::Duration::from_millis(5));
        span.output_value = json!({"ok": true});

        let wire: WireSpan = (&span).into();
        let bytes = wire.encode_to_vec();
        let decoded = WireSpan::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded.trace_id, span.trace_id.to_string());
        assert_eq!(decoded.name, "op");
    }

    #[test]
    fn export_spans_request_encodes_and_decodes() {
        let request = ExportSpansRequest {
            observable_service_id: "svc".to_string(),
            environment: "test".to_string(),
            sdk_version: "0.1.0".to_string(),
            sdk_instance_id: "inst-1".to_string(),
            spans: Vec::new(),
        };
        let bytes = request.encode_to_vec();
        let decoded = ExportSpansRequest::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded.observable_service_id, "svc");
    }
}
