//! # Span
//!
//! `Span`s represent a single operation within a trace. Spans can be nested
//! to form a trace tree. Each trace contains a root span, which typically
//! describes the end-to-end latency of a request, and one or more child
//! spans for its sub-operations.
//!
//! A span's start time is fixed when the [`Tracer`] creates it. While the
//! span is open its attributes can be changed by the owning operation; once
//! ended it is immutable and belongs to the export pipeline.
//!
//! [`Tracer`]: crate::trace::Tracer

use crate::export::SpanData;
use crate::trace::{SpanContext, SpanId, Tracer};
use crate::KeyValue;
use std::borrow::Cow;
use std::time::SystemTime;

/// Single operation within a trace.
///
/// Every span that is started is ended exactly once: explicitly through
/// [`Span::end`], or implicitly when the span is dropped while still open,
/// so spans are released on error and panic paths too.
#[derive(Debug)]
pub struct Span {
    span_context: SpanContext,
    data: Option<SpanRecording>,
    tracer: Tracer,
}

/// Mutable state of an open span. Taken on end, after which the span no
/// longer records.
#[derive(Clone, Debug)]
pub(crate) struct SpanRecording {
    pub(crate) parent_span_id: SpanId,
    pub(crate) name: Cow<'static, str>,
    pub(crate) start_time: SystemTime,
    pub(crate) attributes: Vec<KeyValue>,
}

impl Span {
    pub(crate) fn new(
        span_context: SpanContext,
        data: Option<SpanRecording>,
        tracer: Tracer,
    ) -> Self {
        Span {
            span_context,
            data,
            tracer,
        }
    }

    /// The `SpanContext` for this span.
    pub fn span_context(&self) -> &SpanContext {
        &self.span_context
    }

    /// Returns `true` while the span is open and recording changes.
    /// Always returns `false` after [`Span::end`].
    pub fn is_recording(&self) -> bool {
        self.data.is_some()
    }

    /// Sets a single attribute on this span.
    ///
    /// Keys are unique within a span; setting an attribute with an existing
    /// key replaces the previous value. Calling this after the span has
    /// ended is a defect in the instrumentation: the call is a no-op and an
    /// internal warning is emitted.
    pub fn set_attribute(&mut self, attribute: KeyValue) {
        match &mut self.data {
            Some(data) => {
                match data
                    .attributes
                    .iter_mut()
                    .find(|kv| kv.key == attribute.key)
                {
                    Some(existing) => existing.value = attribute.value,
                    None => data.attributes.push(attribute),
                }
            }
            None => {
                if self.span_context.is_valid() {
                    sdk_warn!(
                        name: "Span.SetAttributeAfterEnded",
                        key = attribute.key.as_str()
                    );
                }
            }
        }
    }

    /// Signals that the operation described by this span has now ended.
    ///
    /// Fixes the end timestamp and submits the finished record to the span
    /// processors of the owning provider; unsampled spans are ended and
    /// released all the same but never submitted. Ending a span twice is a
    /// defect in the instrumentation: the second call is a no-op and an
    /// internal warning is emitted — it never panics, so an instrumentation
    /// bug cannot crash the host application.
    pub fn end(&mut self) {
        self.end_with_timestamp(SystemTime::now());
    }

    /// Signals that the operation described by this span ended at the given
    /// time. See [`Span::end`].
    pub fn end_with_timestamp(&mut self, timestamp: SystemTime) {
        match self.data.take() {
            Some(data) => self.finish(data, timestamp),
            None => {
                if self.span_context.is_valid() {
                    sdk_warn!(name: "Span.EndedMoreThanOnce");
                }
            }
        }
    }

    fn finish(&self, data: SpanRecording, end_time: SystemTime) {
        let provider = self.tracer.provider();
        let span_data = SpanData {
            span_context: self.span_context.clone(),
            parent_span_id: data.parent_span_id,
            name: data.name,
            service_name: provider.config().service_name.clone(),
            start_time: data.start_time,
            end_time,
            attributes: data.attributes,
        };

        for processor in provider.span_processors() {
            processor.on_end(span_data.clone());
        }
    }
}

impl Drop for Span {
    /// End the span on drop if it is still open, so that every started span
    /// is ended exactly once on every exit path.
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            self.finish(data, SystemTime::now());
        }
    }
}
