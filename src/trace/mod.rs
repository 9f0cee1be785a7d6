//! Tracking the causal path of a single logical request.
//!
//! A trace is a tree of [`Span`]s — timed records of the units of work a
//! request passes through as it flows across services. This module contains
//! the span lifecycle, the [`Tracer`] that creates spans, the processors
//! that batch and ship finished spans, and the [`TracerProvider`] that owns
//! the whole pipeline.
//!
//! # In application code
//!
//! ```
//! use tracewire::export::InMemorySpanExporter;
//! use tracewire::trace::TracerProvider;
//! use tracewire::Context;
//!
//! let provider = TracerProvider::builder()
//!     .with_service_name("payments")
//!     .with_batch_exporter(InMemorySpanExporter::default())
//!     .build();
//! let tracer = provider.tracer();
//!
//! tracer.in_span("charge", &Context::new(), |cx| {
//!     // traced application logic; `cx` carries the "charge" span,
//!     // and nested starts against it become children
//!     tracer.in_span("ledger-write", cx, |_cx| {
//!         // ...
//!     });
//! });
//!
//! provider.shutdown().unwrap();
//! ```

use std::time::Duration;
use thiserror::Error;

mod config;
mod id_generator;
mod provider;
mod sampler;
mod span;
mod span_context;
mod span_processor;
mod tracer;

pub use self::{
    config::Config,
    id_generator::{IdGenerator, RandomIdGenerator, SequentialIdGenerator},
    provider::{TracerProvider, TracerProviderBuilder},
    sampler::{Sampler, SamplingDecision, ShouldSample},
    span::Span,
    span_context::{SpanContext, SpanId, TraceFlags, TraceId},
    span_processor::{
        BatchConfig, BatchConfigBuilder, BatchSpanProcessor, BatchSpanProcessorBuilder,
        SimpleSpanProcessor, SpanProcessor,
    },
    tracer::Tracer,
};

/// Describe the result of operations in the tracing API.
pub type TraceResult<T> = Result<T, TraceError>;

/// Errors returned by the tracing API.
///
/// None of these ever reach application code through the span lifecycle —
/// they surface only from the explicit pipeline operations (`force_flush`,
/// `shutdown`) and inside exporters.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    /// Transmission to the collection endpoint failed.
    #[error("export failed: {0}")]
    ExportFailed(String),

    /// Export failed to finish within the given deadline and the operation
    /// returned with best effort made.
    #[error("exporting timed out after {} seconds", .0.as_secs())]
    ExportTimedOut(Duration),

    /// The pipeline component was already shut down; shutdown is a
    /// once-per-lifecycle operation.
    #[error("already shutdown")]
    AlreadyShutdown,

    /// Other errors propagated from the trace pipeline.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl From<String> for TraceError {
    fn from(err_msg: String) -> Self {
        TraceError::Other(Box::new(Custom(err_msg)))
    }
}

impl From<&'static str> for TraceError {
    fn from(err_msg: &'static str) -> Self {
        TraceError::Other(Box::new(Custom(err_msg.into())))
    }
}

/// Wrap type for string
#[derive(Error, Debug)]
#[error("{0}")]
struct Custom(String);
