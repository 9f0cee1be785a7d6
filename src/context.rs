//! Execution-scoped context threading.
//!
//! A [`Context`] is an immutable value carrying the currently active span.
//! It is threaded explicitly through call chains and across `await` points
//! rather than living in hidden process- or thread-wide state: every function
//! that starts spans receives the context of its caller and hands an updated
//! context to its callees, so nested span starts always see the correct
//! parent.

use crate::trace::{Span, SpanContext};
use crate::KeyValue;
use std::fmt;
use std::sync::{Arc, Mutex};

const NOOP_SPAN: ContextSpan = ContextSpan {
    span_context: SpanContext::NONE,
    inner: None,
};

/// The span slot of a [`Context`].
///
/// The span context is readable without locking; the span itself requires
/// synchronization because a context may be cloned across threads.
#[derive(Debug)]
pub(crate) struct ContextSpan {
    span_context: SpanContext,
    inner: Option<Mutex<Span>>,
}

impl From<Span> for ContextSpan {
    fn from(span: Span) -> Self {
        ContextSpan {
            span_context: span.span_context().clone(),
            inner: Some(Mutex::new(span)),
        }
    }
}

impl From<SpanContext> for ContextSpan {
    fn from(span_context: SpanContext) -> Self {
        ContextSpan {
            span_context,
            inner: None,
        }
    }
}

/// An immutable, execution-scoped collection of tracing state.
///
/// Contexts are cheap to clone; write operations return a new context and
/// leave the original untouched.
///
/// # Examples
///
/// ```
/// use tracewire::export::InMemorySpanExporter;
/// use tracewire::trace::TracerProvider;
/// use tracewire::Context;
///
/// let provider = TracerProvider::builder()
///     .with_batch_exporter(InMemorySpanExporter::default())
///     .build();
/// let tracer = provider.tracer();
///
/// let root = tracer.start("parent");
/// let cx = Context::new().with_span(root);
///
/// // anything started against `cx` becomes a child of `parent`
/// let child = tracer.start_with_context("child", &cx);
/// assert_eq!(
///     child.span_context().trace_id(),
///     cx.span().span_context().trace_id()
/// );
/// # drop(child);
/// # cx.span().end();
/// ```
#[derive(Clone, Default)]
pub struct Context {
    pub(crate) span: Option<Arc<ContextSpan>>,
}

impl Context {
    /// Creates an empty `Context`.
    pub fn new() -> Self {
        Context::default()
    }

    /// Returns a copy of this context with the given span set as active.
    ///
    /// The span is owned by the returned context; it can still be operated on
    /// through [`Context::span`], and it is ended when the last clone of the
    /// context is dropped if nothing ended it earlier.
    pub fn with_span(&self, span: Span) -> Self {
        Context {
            span: Some(Arc::new(span.into())),
        }
    }

    /// Returns a copy of this context carrying a span context recovered from
    /// a remote peer.
    ///
    /// The resulting context has no operable span, but spans started against
    /// it parent onto the remote span. This is the extraction half of
    /// propagation.
    pub fn with_remote_span_context(&self, span_context: SpanContext) -> Self {
        Context {
            span: Some(Arc::new(span_context.into())),
        }
    }

    /// A reference to this context's active span, or a no-op span if none has
    /// been set.
    pub fn span(&self) -> SpanRef<'_> {
        match self.span.as_ref() {
            Some(span) => SpanRef(span),
            None => SpanRef(&NOOP_SPAN),
        }
    }

    /// Returns whether an active span has been set.
    pub fn has_active_span(&self) -> bool {
        self.span.is_some()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Context");
        match self.span.as_ref() {
            Some(span) => dbg.field("span", &span.span_context),
            None => dbg.field("span", &"None"),
        }
        .finish()
    }
}

/// A reference to the active span of a [`Context`].
#[derive(Debug)]
pub struct SpanRef<'a>(&'a ContextSpan);

impl SpanRef<'_> {
    fn with_inner_mut<F: FnOnce(&mut Span)>(&self, f: F) {
        if let Some(inner) = &self.0.inner {
            if let Ok(mut span) = inner.lock() {
                f(&mut span)
            }
        }
    }

    /// A reference to the span context of the active span.
    pub fn span_context(&self) -> &SpanContext {
        &self.0.span_context
    }

    /// Returns `true` if the active span is still open and recording.
    pub fn is_recording(&self) -> bool {
        let mut recording = false;
        self.with_inner_mut(|span| recording = span.is_recording());
        recording
    }

    /// Set an attribute on the active span.
    ///
    /// A no-op for remote or already-ended spans.
    pub fn set_attribute(&self, attribute: KeyValue) {
        self.with_inner_mut(|span| span.set_attribute(attribute))
    }

    /// Signals that the operation described by the active span has ended.
    pub fn end(&self) {
        self.with_inner_mut(|span| span.end())
    }
}
