//! Span export.
//!
//! Finished, sampled spans leave the process through a [`SpanExporter`] — the
//! collection-endpoint collaborator. The exporter only has to answer one
//! question per batch: did the transmission succeed or not. Batching,
//! retries, backpressure, and lifecycle all live in the span processors that
//! drive it (see [`crate::trace::BatchSpanProcessor`]).

use crate::trace::{SpanContext, SpanId, TraceError};
use crate::KeyValue;
use futures_util::future::BoxFuture;
use std::borrow::Cow;
use std::fmt::Debug;
use std::time::SystemTime;

#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
mod http;
mod in_memory;

#[cfg(feature = "http")]
pub use http::{HttpSpanExporter, HttpSpanExporterBuilder};
pub use in_memory::InMemorySpanExporter;

/// Describes the result of an export.
pub type ExportResult = Result<(), TraceError>;

/// `SpanExporter` defines the interface that protocol-specific exporters
/// must implement so they can be plugged into the span-processing pipeline.
///
/// The exporter is expected to be a simple encoder and transmitter of span
/// records; resilience (batching, bounded retry, drop accounting) is the
/// processor's job.
pub trait SpanExporter: Send + Sync + Debug {
    /// Exports a batch of finished spans.
    ///
    /// This function is never called concurrently for the same exporter
    /// instance; a batch processor serializes all transmissions. It must not
    /// block indefinitely — an unreachable endpoint should surface as an
    /// `Err` within a bounded time so the caller's retry budget stays
    /// meaningful.
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult>;

    /// Shuts down the exporter. Called once when the owning processor shuts
    /// down; `export` is not called afterwards.
    fn shutdown(&mut self) {}
}

/// `SpanData` contains all the information collected by a finished [`Span`]
/// and is the record handed to exporters.
///
/// Every exported record carries these fields regardless of the transport
/// encoding in use.
///
/// [`Span`]: crate::trace::Span
#[derive(Clone, Debug, PartialEq)]
pub struct SpanData {
    /// Exportable `SpanContext`
    pub span_context: SpanContext,
    /// Span parent id, [`SpanId::INVALID`] for root spans
    pub parent_span_id: SpanId,
    /// Operation name
    pub name: Cow<'static, str>,
    /// Identity label of the service that produced this span
    pub service_name: Cow<'static, str>,
    /// Span start time
    pub start_time: SystemTime,
    /// Span end time
    pub end_time: SystemTime,
    /// Span attributes, keys unique
    pub attributes: Vec<KeyValue>,
}
