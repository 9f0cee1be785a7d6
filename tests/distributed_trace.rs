//! Cross-service trace scenarios: a client service starts a root span,
//! injects its context into a carrier, and a downstream service extracts it
//! to continue the same trace.

use std::collections::HashMap;

use tracewire::export::{InMemorySpanExporter, SpanData};
use tracewire::propagation::{TextMapPropagator, TraceContextPropagator};
use tracewire::trace::{Sampler, SpanId, TracerProvider};
use tracewire::Context;

struct Service {
    provider: TracerProvider,
    exporter: InMemorySpanExporter,
}

impl Service {
    fn new(name: &'static str) -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_service_name(name)
            .with_batch_exporter(exporter.clone())
            .build();
        Service { provider, exporter }
    }

    fn finished_spans(&self) -> Vec<SpanData> {
        self.provider.force_flush().unwrap();
        self.exporter.get_finished_spans().unwrap()
    }
}

#[test]
fn trace_continues_across_service_boundary() {
    let propagator = TraceContextPropagator::new();
    let service_a = Service::new("service-a");
    let service_b = Service::new("service-b");

    // Service A: root span around the outgoing call, context injected into
    // the request carrier.
    let mut carrier = HashMap::new();
    let tracer_a = service_a.provider.tracer();
    tracer_a.in_span("client-request", &Context::new(), |cx| {
        propagator.inject_context(cx, &mut carrier);
    });

    // Service B: recover the caller's context and handle the request under
    // a child span.
    let tracer_b = service_b.provider.tracer();
    let inbound_cx = propagator.extract(&carrier);
    tracer_b.in_span("handle-request", &inbound_cx, |cx| {
        // nested unit of work inside service B
        tracer_b.in_span("process-data", cx, |_cx| {});
    });

    let spans_a = service_a.finished_spans();
    let spans_b = service_b.finished_spans();
    assert_eq!(spans_a.len(), 1);
    assert_eq!(spans_b.len(), 2);

    let client_request = &spans_a[0];
    let process_data = &spans_b[0];
    let handle_request = &spans_b[1];
    assert_eq!(client_request.name, "client-request");
    assert_eq!(handle_request.name, "handle-request");
    assert_eq!(client_request.service_name, "service-a");
    assert_eq!(handle_request.service_name, "service-b");

    // one trace across both services
    assert_eq!(
        handle_request.span_context.trace_id(),
        client_request.span_context.trace_id()
    );
    assert_eq!(
        handle_request.parent_span_id,
        client_request.span_context.span_id()
    );

    // and the tree continues inside service B
    assert_eq!(
        process_data.span_context.trace_id(),
        client_request.span_context.trace_id()
    );
    assert_eq!(
        process_data.parent_span_id,
        handle_request.span_context.span_id()
    );

    service_a.provider.shutdown().unwrap();
    service_b.provider.shutdown().unwrap();
}

#[test]
fn corrupted_carrier_starts_a_fresh_trace() {
    let propagator = TraceContextPropagator::new();
    let service = Service::new("service-b");

    let mut carrier = HashMap::new();
    carrier.insert(
        "trace-context".to_string(),
        "v1-not-a-real-header".to_string(),
    );

    let inbound_cx = propagator.extract(&carrier);
    let tracer = service.provider.tracer();
    tracer.in_span("handle-request", &inbound_cx, |_cx| {});

    let spans = service.finished_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].parent_span_id, SpanId::INVALID);
    assert!(spans[0].span_context.is_valid());

    service.provider.shutdown().unwrap();
}

#[test]
fn sampling_decision_propagates_across_the_boundary() {
    let propagator = TraceContextPropagator::new();

    // Service A never samples; service B would sample everything it roots.
    let exporter_a = InMemorySpanExporter::default();
    let provider_a = TracerProvider::builder()
        .with_service_name("service-a")
        .with_sampler(Sampler::AlwaysOff)
        .with_batch_exporter(exporter_a.clone())
        .build();
    let service_b = Service::new("service-b");

    let mut carrier = HashMap::new();
    provider_a
        .tracer()
        .in_span("client-request", &Context::new(), |cx| {
            propagator.inject_context(cx, &mut carrier);
        });

    let inbound_cx = propagator.extract(&carrier);
    assert!(inbound_cx.has_active_span());
    assert!(!inbound_cx.span().span_context().is_sampled());

    service_b
        .provider
        .tracer()
        .in_span("handle-request", &inbound_cx, |_cx| {});

    // the trace was decided unsampled at its root; neither side exports
    provider_a.force_flush().unwrap();
    assert!(exporter_a.get_finished_spans().unwrap().is_empty());
    assert!(service_b.finished_spans().is_empty());

    provider_a.shutdown().unwrap();
    service_b.provider.shutdown().unwrap();
}

#[test]
fn spans_survive_shutdown_without_explicit_flush() {
    let exporter = InMemorySpanExporter::default();
    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter.clone())
        .build();

    provider.tracer().start("tail-span").end();
    provider.shutdown().unwrap();

    // shutdown's final flush delivered the buffered span before the
    // exporter was released
    assert_eq!(exporter.get_finished_spans().unwrap().len(), 1);
}
