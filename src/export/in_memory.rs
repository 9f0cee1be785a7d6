use crate::export::{ExportResult, SpanData, SpanExporter};
use crate::trace::{TraceError, TraceResult};
use futures_util::future::BoxFuture;
use std::sync::{Arc, Mutex};

/// A span exporter that stores finished spans in memory.
///
/// Useful as a fake collection endpoint in tests and for debugging: clones
/// share the same storage, so a test can hand one clone to the pipeline and
/// keep another to inspect what arrived.
///
/// # Example
///
/// ```
/// use tracewire::export::InMemorySpanExporter;
/// use tracewire::trace::TracerProvider;
///
/// let exporter = InMemorySpanExporter::default();
/// let provider = TracerProvider::builder()
///     .with_batch_exporter(exporter.clone())
///     .build();
///
/// let tracer = provider.tracer();
/// tracer.start("say hello").end();
///
/// provider.force_flush().unwrap();
/// assert_eq!(exporter.get_finished_spans().unwrap().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemorySpanExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemorySpanExporter {
    /// Returns the finished spans as a vector of [`SpanData`].
    ///
    /// # Errors
    ///
    /// Returns a `TraceError` if the internal lock cannot be acquired.
    pub fn get_finished_spans(&self) -> TraceResult<Vec<SpanData>> {
        self.spans
            .lock()
            .map(|spans_guard| spans_guard.clone())
            .map_err(|_| TraceError::from("InMemorySpanExporter lock poisoned"))
    }

    /// Clears the internal storage of finished spans.
    pub fn reset(&self) {
        let _ = self.spans.lock().map(|mut spans_guard| spans_guard.clear());
    }
}

impl SpanExporter for InMemorySpanExporter {
    fn export(&mut self, mut batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        let result = self
            .spans
            .lock()
            .map(|mut spans_guard| spans_guard.append(&mut batch))
            .map_err(|_| TraceError::from("InMemorySpanExporter lock poisoned"));
        Box::pin(std::future::ready(result))
    }

    // shutdown deliberately keeps the stored spans: tests assert on what a
    // final shutdown flush delivered.
}
