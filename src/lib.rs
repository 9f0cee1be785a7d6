//! Trace-context propagation and batched span export for distributed
//! services.
//!
//! `tracewire` records a hierarchy of timed [`Span`]s describing the causal
//! path of a single logical request as it crosses process boundaries, and
//! ships finished spans to a collection endpoint in the background.
//!
//! The crate is built from a handful of small pieces:
//!
//! * [`trace::SpanContext`] — immutable trace identity (trace id, span id,
//!   sampling flags) that travels with a request.
//! * [`propagation`] — encodes a `SpanContext` into a single carrier entry on
//!   the way out and recovers it on the way in.
//! * [`trace::Tracer`] — starts root or child spans, consulting the inbound
//!   context for parentage.
//! * [`export`] — the collection-endpoint collaborator and the records it
//!   receives.
//! * [`trace::TracerProvider`] — explicitly constructed owner of the tracer
//!   configuration and the export pipeline lifecycle.
//!
//! # Getting started
//!
//! ```
//! use tracewire::export::InMemorySpanExporter;
//! use tracewire::trace::TracerProvider;
//! use tracewire::KeyValue;
//!
//! let exporter = InMemorySpanExporter::default();
//! let provider = TracerProvider::builder()
//!     .with_service_name("checkout")
//!     .with_batch_exporter(exporter.clone())
//!     .build();
//!
//! let tracer = provider.tracer();
//! let mut span = tracer.start("charge-card");
//! span.set_attribute(KeyValue::new("amount_cents", 4200_i64));
//! span.end();
//!
//! provider.force_flush()?;
//! assert_eq!(exporter.get_finished_spans()?.len(), 1);
//! provider.shutdown()?;
//! # Ok::<(), tracewire::trace::TraceError>(())
//! ```
//!
//! Tracing must never get in the way of the host application: malformed
//! inbound context degrades to a fresh root span, a full export queue drops
//! spans instead of blocking, and an unreachable collector costs a bounded
//! number of retries before the batch is discarded and counted.
//!
//! [`Span`]: trace::Span
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unused
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
mod macros;

mod common;
mod context;

pub mod export;
pub mod propagation;
pub mod trace;

pub use common::{Key, KeyValue, Value};
pub use context::{Context, SpanRef};

#[cfg(feature = "internal-logs")]
#[doc(hidden)]
pub mod _private {
    pub use tracing::{debug, info, warn};
}
