//! JSON-over-HTTP span exporter.
//!
//! Posts batches of finished spans to a collector endpoint as a JSON array.
//! The encoding is an external contract between this exporter and the
//! collector; nothing else in the crate depends on it.

use crate::export::{ExportResult, SpanData, SpanExporter};
use crate::trace::{SpanId, TraceError};
use futures_util::future::BoxFuture;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default collector endpoint, matching a local collector's span intake.
const DEFAULT_COLLECTOR_ENDPOINT: &str = "http://127.0.0.1:4318/v1/spans";

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Exports span batches to a collector endpoint over HTTP.
///
/// Transmission failures (connection errors, non-success status codes) are
/// reported back to the driving processor, which owns the retry budget.
#[derive(Debug)]
pub struct HttpSpanExporter {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpSpanExporter {
    /// Create a builder for an `HttpSpanExporter`.
    pub fn builder() -> HttpSpanExporterBuilder {
        HttpSpanExporterBuilder::default()
    }

    fn send_batch(&self, batch: &[SpanData]) -> ExportResult {
        let records: Vec<SpanRecord<'_>> = batch.iter().map(SpanRecord::from).collect();
        let body = serde_json::to_vec(&records)
            .map_err(|err| TraceError::Other(Box::new(err)))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .map_err(|err| TraceError::ExportFailed(err.to_string()))?;

        if !response.status().is_success() {
            return Err(TraceError::ExportFailed(format!(
                "collector responded with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

impl SpanExporter for HttpSpanExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        let result = self.send_batch(&batch);
        Box::pin(std::future::ready(result))
    }
}

/// Builder for [`HttpSpanExporter`].
#[derive(Debug)]
pub struct HttpSpanExporterBuilder {
    endpoint: String,
    timeout: Duration,
}

impl Default for HttpSpanExporterBuilder {
    fn default() -> Self {
        HttpSpanExporterBuilder {
            endpoint: DEFAULT_COLLECTOR_ENDPOINT.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl HttpSpanExporterBuilder {
    /// Set the collector endpoint address spans are posted to.
    pub fn with_endpoint<T: Into<String>>(mut self, endpoint: T) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the per-request timeout. Keep this well below the driving
    /// processor's flush deadline so the retry budget stays meaningful.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the configured [`HttpSpanExporter`].
    pub fn build(self) -> Result<HttpSpanExporter, TraceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| TraceError::Other(Box::new(err)))?;

        Ok(HttpSpanExporter {
            client,
            endpoint: self.endpoint,
        })
    }
}

/// Wire form of one exported span record.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpanRecord<'a> {
    trace_id: String,
    span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_span_id: Option<String>,
    name: &'a str,
    service_name: &'a str,
    start_time_unix_nano: u64,
    end_time_unix_nano: u64,
    attributes: HashMap<&'a str, String>,
}

impl<'a> From<&'a SpanData> for SpanRecord<'a> {
    fn from(span: &'a SpanData) -> Self {
        let parent_span_id = (span.parent_span_id != SpanId::INVALID)
            .then(|| span.parent_span_id.to_string());

        SpanRecord {
            trace_id: span.span_context.trace_id().to_string(),
            span_id: span.span_context.span_id().to_string(),
            parent_span_id,
            name: &span.name,
            service_name: &span.service_name,
            start_time_unix_nano: unix_nanos(span.start_time),
            end_time_unix_nano: unix_nanos(span.end_time),
            attributes: span
                .attributes
                .iter()
                .map(|kv| (kv.key.as_str(), kv.value.to_string()))
                .collect(),
        }
    }
}

fn unix_nanos(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
