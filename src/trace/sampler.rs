//! Sampling policy.
//!
//! The sampler is consulted exactly once per trace, when its root span is
//! created. The decision is recorded in the root's trace flags and copied
//! unchanged to every descendant, in this process and downstream — a trace
//! is sampled or not, atomically. Sampling gates export only; unsampled
//! spans still carry full identity so the span tree stays correct.

use crate::trace::TraceId;
use std::fmt;

/// The decision taken for a new root span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SamplingDecision {
    /// The trace is recorded and its spans submitted for export.
    RecordAndSample,
    /// The trace is recorded but its spans are never exported.
    Drop,
}

/// The interface for deciding whether a new trace is sampled.
pub trait ShouldSample: Send + Sync + fmt::Debug {
    /// Returns the sampling decision for a trace rooted at a span with the
    /// given name.
    fn should_sample(&self, trace_id: TraceId, name: &str) -> SamplingDecision;
}

/// Built-in samplers.
#[derive(Clone, Debug)]
pub enum Sampler {
    /// Always sample the trace.
    AlwaysOn,
    /// Never sample the trace.
    AlwaysOff,
}

impl ShouldSample for Sampler {
    fn should_sample(&self, _trace_id: TraceId, _name: &str) -> SamplingDecision {
        match self {
            Sampler::AlwaysOn => SamplingDecision::RecordAndSample,
            Sampler::AlwaysOff => SamplingDecision::Drop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_samplers() {
        let trace_id = TraceId::from(1);
        assert_eq!(
            Sampler::AlwaysOn.should_sample(trace_id, "op"),
            SamplingDecision::RecordAndSample
        );
        assert_eq!(
            Sampler::AlwaysOff.should_sample(trace_id, "op"),
            SamplingDecision::Drop
        );
    }
}
