//! The default remote export adapter (§6): a Twirp-style POST to
//! `<baseUrl>/api/drift/<ServiceName>/<Method>` carrying a protobuf-encoded
//! `ExportSpansRequest`, with both required headers set so the dispatcher
//! classifies this adapter's own traffic as `ignored` (§4.2).

use std::time::Duration;

use async_trait::async_trait;
use prost::Message as _;
use reqwest::Client;
use tracekit_core::{ExportCode, ExportResult, SpanExportAdapter};
use tracekit_types::Span;

use crate::wire::{ExportSpansRequest, ExportSpansResponse, WireSpan};

pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

pub const SKIP_INSTRUMENTATION_HEADER: &str = "x-td-skip-instrumentation";
pub const API_KEY_HEADER: &str = "x-api-key";

pub struct RemoteExportAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    observable_service_id: String,
    environment: String,
    sdk_version: String,
    sdk_instance_id: String,
}

impl RemoteExportAdapter {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        observable_service_id: impl Into<String>,
        environment: impl Into<String>,
        sdk_instance_id: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(DEFAULT_EXPORT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            observable_service_id: observable_service_id.into(),
            environment: environment.into(),
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            sdk_instance_id: sdk_instance_id.into(),
        }
    }

    fn endpoint(&self, service: &str, method: &str) -> String {
        format!("{}/api/drift/{}/{}", self.base_url.trim_end_matches('/'), service, method)
    }
}

#[async_trait]
impl SpanExportAdapter for RemoteExportAdapter {
    fn name(&self) -> &str {
        "remote"
    }

    async fn export_spans(&self, batch: Vec<Span>) -> ExportResult {
        let request = ExportSpansRequest {
            observable_service_id: self.observable_service_id.clone(),
            environment: self.environment.clone(),
            sdk_version: self.sdk_version.clone(),
            sdk_instance_id: self.sdk_instance_id.clone(),
            spans: batch.iter().map(WireSpan::from).collect(),
        };
        let body = request.encode_to_vec();

        let response = self
            .client
            .post(self.endpoint("TraceService", "ExportSpans"))
            .header(API_KEY_HEADER, &self.api_key)
            .header(SKIP_INSTRUMENTATION_HEADER, "true")
            .header("content-type", "application/protobuf")
            .body(body)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(bytes) => match ExportSpansResponse::decode(bytes.as_ref()) {
                    Ok(decoded) if decoded.success => ExportResult {
                        code: ExportCode::Success,
                        error: None,
                    },
                    Ok(decoded) => ExportResult::failed(
                        decoded.message.unwrap_or_else(|| "collector reported failure".to_string()),
                    ),
                    Err(err) => ExportResult::failed(format!("malformed response: {err}")),
                },
                Err(err) => ExportResult::failed(format!("failed to read response body: {err}")),
            },
            Ok(resp) => ExportResult::failed(format!("collector returned HTTP {}", resp.status())),
            Err(err) => ExportResult::failed(format!("request failed: {err}")),
        }
    }
}
