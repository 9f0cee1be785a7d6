//! Versioned single-header trace context propagation.

use crate::propagation::{Extractor, Injector, TextMapPropagator};
use crate::trace::{SpanContext, SpanId, TraceFlags, TraceId};
use crate::Context;

const CONTEXT_HEADER: &str = "trace-context";
const SUPPORTED_VERSION: &str = "v1";

const CONTEXT_HEADER_FIELDS: [&str; 1] = [CONTEXT_HEADER];

/// Propagates a [`SpanContext`] as a single carrier entry under the
/// `trace-context` key.
///
/// The entry value has four `-`-separated fields:
///
/// `v1-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01`
///
///    - version token (literal `v1`)
///    - trace id, 32 lowercase hex digits
///    - span id, 16 lowercase hex digits
///    - flags, 2 lowercase hex digits
///
/// Extraction is strict about the shape of the entry but never fails loudly:
/// any deviation — missing key, unknown version, wrong field length,
/// uppercase or non-hex digits, all-zero ids — yields a context with no span
/// context in it, so the receiving tracer starts a new root instead.
#[derive(Clone, Debug, Default)]
pub struct TraceContextPropagator {
    _private: (),
}

impl TraceContextPropagator {
    /// Create a new `TraceContextPropagator`.
    pub fn new() -> Self {
        TraceContextPropagator { _private: () }
    }

    /// Extract a span context from the carrier entry.
    fn extract_span_context(&self, extractor: &dyn Extractor) -> Result<SpanContext, ()> {
        let header_value = extractor.get(CONTEXT_HEADER).unwrap_or("").trim();
        let parts = header_value.split_terminator('-').collect::<Vec<&str>>();
        if parts.len() != 4 {
            return Err(());
        }

        if parts[0] != SUPPORTED_VERSION {
            return Err(());
        }

        // Field lengths are fixed by the format.
        if parts[1].len() != 32 || parts[2].len() != 16 || parts[3].len() != 2 {
            return Err(());
        }

        // Hex fields must be lowercase on the wire.
        if parts[1..]
            .iter()
            .any(|part| part.chars().any(|c| c.is_ascii_uppercase()))
        {
            return Err(());
        }

        let trace_id = TraceId::from_hex(parts[1]).map_err(|_| ())?;
        let span_id = SpanId::from_hex(parts[2]).map_err(|_| ())?;
        let opts = u8::from_str_radix(parts[3], 16).map_err(|_| ())?;

        // Clear all flag bits other than the supported sampling bit.
        let trace_flags = TraceFlags::new(opts) & TraceFlags::SAMPLED;

        let span_context = SpanContext::new(trace_id, span_id, trace_flags);
        if !span_context.is_valid() {
            return Err(());
        }

        Ok(span_context)
    }
}

impl TextMapPropagator for TraceContextPropagator {
    /// Encodes the values of the active `SpanContext` into the single
    /// carrier entry, overwriting any prior value.
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let span = cx.span();
        let span_context = span.span_context();
        if span_context.is_valid() {
            let header_value = format!(
                "{}-{:032x}-{:016x}-{:02x}",
                SUPPORTED_VERSION,
                span_context.trace_id(),
                span_context.span_id(),
                span_context.trace_flags() & TraceFlags::SAMPLED
            );
            injector.set(CONTEXT_HEADER, header_value);
        }
    }

    /// Retrieves the encoded `SpanContext` from the carrier. If no entry was
    /// found OR the retrieved entry is invalid, the input context is
    /// returned unchanged.
    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        self.extract_span_context(extractor)
            .map(|sc| cx.with_remote_span_context(sc))
            .unwrap_or_else(|_| cx.clone())
    }

    fn fields(&self) -> &'static [&'static str] {
        &CONTEXT_HEADER_FIELDS
    }
}
