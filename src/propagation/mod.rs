//! Carrying trace context across process boundaries.
//!
//! Propagators serialize the active [`SpanContext`] into a carrier — an
//! opaque string-to-string mapping such as transport headers — before a
//! request leaves the process, and recover it on the receiving side to seed
//! that process's tracer.
//!
//! Propagation is deliberately infallible from the caller's perspective: a
//! missing or malformed carrier entry yields a context with no span in it,
//! which downstream tracers treat as "start a new root".
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use tracewire::propagation::{TextMapPropagator, TraceContextPropagator};
//! use tracewire::trace::{SpanContext, SpanId, TraceFlags, TraceId};
//! use tracewire::Context;
//!
//! let propagator = TraceContextPropagator::new();
//! let cx = Context::new().with_remote_span_context(SpanContext::new(
//!     TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736_u128),
//!     SpanId::from(0x00f0_67aa_0ba9_02b7_u64),
//!     TraceFlags::SAMPLED,
//! ));
//!
//! let mut carrier = HashMap::new();
//! propagator.inject_context(&cx, &mut carrier);
//!
//! let restored = propagator.extract(&carrier);
//! assert_eq!(restored.span().span_context(), cx.span().span_context());
//! ```
//!
//! [`SpanContext`]: crate::trace::SpanContext

use crate::Context;
use std::collections::HashMap;
use std::fmt;

mod trace_context;

pub use trace_context::TraceContextPropagator;

/// Injector provides an interface for adding entries to an underlying
/// carrier such as a header map.
pub trait Injector {
    /// Add a key and value to the carrier, replacing any prior value for the
    /// key.
    fn set(&mut self, key: &str, value: String);
}

/// Extractor provides an interface for reading entries from an underlying
/// carrier such as a header map.
pub trait Extractor {
    /// Get a value from the carrier for the given key.
    fn get(&self, key: &str) -> Option<&str>;

    /// Collect all the keys in the carrier.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the HashMap.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_lowercase(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    /// Get a value for a key from the HashMap.
    fn get(&self, key: &str) -> Option<&str> {
        self.get(&key.to_lowercase()).map(|v| v.as_str())
    }

    /// Collect all the keys from the HashMap.
    fn keys(&self) -> Vec<&str> {
        self.keys().map(|k| k.as_str()).collect::<Vec<_>>()
    }
}

/// Stateless codec between a [`Context`] and a textual carrier.
pub trait TextMapPropagator: fmt::Debug {
    /// Encode the active span context of `cx` into the carrier.
    ///
    /// Writes nothing when the context carries no valid span context.
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector);

    /// Decode a span context from the carrier and return `cx` extended with
    /// it, or `cx` unchanged when the carrier holds no usable entry.
    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context;

    /// Decode a span context from the carrier into a fresh [`Context`].
    fn extract(&self, extractor: &dyn Extractor) -> Context {
        self.extract_with_context(&Context::new(), extractor)
    }

    /// The carrier keys this propagator reads and writes.
    fn fields(&self) -> &'static [&'static str];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_map_carrier_is_case_insensitive() {
        let mut carrier = HashMap::new();
        Injector::set(&mut carrier, "HeaderName", "value".to_string());

        assert_eq!(
            Extractor::get(&carrier, "HEADERNAME"),
            Some("value"),
            "case insensitive extraction"
        );
        assert_eq!(Extractor::keys(&carrier), vec!["headername"]);
    }

    #[test]
    fn hash_map_carrier_overwrites() {
        let mut carrier = HashMap::new();
        Injector::set(&mut carrier, "key", "old".to_string());
        Injector::set(&mut carrier, "key", "new".to_string());

        assert_eq!(Extractor::get(&carrier, "key"), Some("new"));
    }
}
