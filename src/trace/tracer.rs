//! # Tracer
//!
//! The `Tracer` creates [`Span`]s and decides their place in the trace tree:
//! a span started against a context carrying a valid span context becomes a
//! child of that span; otherwise it becomes the root of a new trace. Span
//! creation is cheap and performs no I/O — the export pipeline only sees a
//! span once it ends.

use crate::trace::span::SpanRecording;
use crate::trace::{
    SamplingDecision, Span, SpanContext, SpanId, TraceFlags, TracerProvider,
};
use crate::Context;
use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;

/// `Tracer` implementation to create and manage spans.
///
/// Tracers are cheap clonable handles onto their provider's shared
/// configuration and processors.
#[derive(Clone)]
pub struct Tracer {
    provider: TracerProvider,
}

impl fmt::Debug for Tracer {
    /// Formats the `Tracer` without its provider to avoid a recursive dump
    /// of the whole pipeline.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").finish()
    }
}

impl Tracer {
    /// Create a new tracer (used internally by the `TracerProvider`).
    pub(crate) fn new(provider: TracerProvider) -> Self {
        Tracer { provider }
    }

    /// The provider this tracer belongs to.
    pub(crate) fn provider(&self) -> &TracerProvider {
        &self.provider
    }

    /// Starts a new root [`Span`].
    ///
    /// The sampler decides once, here, whether the whole trace is sampled;
    /// descendants inherit the decision unchanged.
    pub fn start<T>(&self, name: T) -> Span
    where
        T: Into<Cow<'static, str>>,
    {
        self.start_with_context(name, &Context::new())
    }

    /// Starts a new [`Span`] with a given parent context.
    ///
    /// If `parent_cx` carries a valid span context — local or recovered from
    /// a remote peer — the new span becomes its child: same trace id, same
    /// sampling flags, fresh span id. Otherwise a new root is started. Pair
    /// with [`Context::with_span`] so nested starts see the correct parent.
    pub fn start_with_context<T>(&self, name: T, parent_cx: &Context) -> Span
    where
        T: Into<Cow<'static, str>>,
    {
        // No point starting a span once the provider has shut down.
        if self.provider.is_shutdown() {
            return Span::new(SpanContext::empty_context(), None, self.clone());
        }

        let name = name.into();
        let config = self.provider.config();
        let span_id = config.id_generator.new_span_id();

        let parent = parent_cx
            .has_active_span()
            .then(|| parent_cx.span().span_context().clone())
            .filter(|sc| sc.is_valid());

        let (trace_id, trace_flags, parent_span_id) = match parent {
            Some(psc) => (psc.trace_id(), psc.trace_flags(), psc.span_id()),
            None => {
                let trace_id = config.id_generator.new_trace_id();
                let sampled = config.sampler.should_sample(trace_id, &name)
                    == SamplingDecision::RecordAndSample;
                (
                    trace_id,
                    TraceFlags::default().with_sampled(sampled),
                    SpanId::INVALID,
                )
            }
        };

        Span::new(
            SpanContext::new(trace_id, span_id, trace_flags),
            Some(SpanRecording {
                parent_span_id,
                name,
                start_time: SystemTime::now(),
                attributes: Vec::new(),
            }),
            self.clone(),
        )
    }

    /// Starts a span, runs `f` with a context carrying it, and ends the span
    /// when `f` returns.
    ///
    /// The span is released on every exit path: if `f` panics, the context's
    /// drop ends the span before the panic continues unwinding.
    pub fn in_span<T, F, R>(&self, name: T, parent_cx: &Context, f: F) -> R
    where
        T: Into<Cow<'static, str>>,
        F: FnOnce(&Context) -> R,
    {
        let span = self.start_with_context(name, parent_cx);
        let cx = parent_cx.with_span(span);
        let result = f(&cx);
        cx.span().end();
        result
    }
}
