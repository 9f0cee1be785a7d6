//! # Tracer Provider
//!
//! The `TracerProvider` is the explicitly constructed owner of one tracing
//! pipeline: the span processors, the sampler, the id generator, and the
//! service identity label stamped on every exported record. There is no
//! ambient process-wide instance — the embedding application builds a
//! provider, passes it (or tracers derived from it) to whatever needs to
//! start spans, and shuts it down exactly once at teardown.
//!
//! Cloning a `TracerProvider` creates another handle to the same pipeline.
//! Dropping the last handle triggers the same shutdown path as an explicit
//! [`TracerProvider::shutdown`], so buffered spans are flushed on every
//! orderly exit.

use crate::trace::{
    BatchSpanProcessor, Config, IdGenerator, ShouldSample, SimpleSpanProcessor, SpanProcessor,
    TraceError, TraceResult, Tracer,
};
use crate::export::SpanExporter;
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Deadline applied by [`TracerProvider::force_flush`] and
/// [`TracerProvider::shutdown`]; use the `*_with_timeout` variants for a
/// caller-chosen deadline.
const DEFAULT_PIPELINE_TIMEOUT: Duration = Duration::from_secs(5);

/// TracerProvider inner type
#[derive(Debug)]
pub(crate) struct TracerProviderInner {
    processors: Vec<Box<dyn SpanProcessor>>,
    config: Config,
    is_shutdown: AtomicBool,
}

impl TracerProviderInner {
    /// Shut down every processor; called from explicit shutdown and from
    /// `Drop` when the last handle is released.
    fn shutdown(&self, timeout: Duration) -> Vec<TraceResult<()>> {
        let mut results = Vec::with_capacity(self.processors.len());
        for processor in &self.processors {
            let result = processor.shutdown(timeout);
            if let Err(err) = &result {
                sdk_debug!(
                    name: "TracerProvider.ShutdownError",
                    error = format!("{err}")
                );
            }
            results.push(result);
        }
        results
    }
}

impl Drop for TracerProviderInner {
    fn drop(&mut self) {
        if !self.is_shutdown.load(Ordering::Relaxed) {
            let _ = self.shutdown(DEFAULT_PIPELINE_TIMEOUT);
        }
    }
}

/// Creator of [`Tracer`] instances and owner of the export pipeline
/// lifecycle.
///
/// # Examples
///
/// ```
/// use tracewire::export::InMemorySpanExporter;
/// use tracewire::trace::TracerProvider;
///
/// let provider = TracerProvider::builder()
///     .with_service_name("inventory")
///     .with_batch_exporter(InMemorySpanExporter::default())
///     .build();
///
/// let tracer = provider.tracer();
/// tracer.start("list-items").end();
///
/// // flush buffered spans at a checkpoint
/// provider.force_flush().unwrap();
///
/// // exactly once, at process teardown
/// provider.shutdown().unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct TracerProvider {
    inner: Arc<TracerProviderInner>,
}

impl Default for TracerProvider {
    fn default() -> Self {
        TracerProvider::builder().build()
    }
}

impl TracerProvider {
    /// Create a new [`TracerProvider`] builder.
    pub fn builder() -> TracerProviderBuilder {
        TracerProviderBuilder::default()
    }

    /// Returns a new [`Tracer`] backed by this provider.
    pub fn tracer(&self) -> Tracer {
        Tracer::new(self.clone())
    }

    /// Span processors associated with this provider.
    pub(crate) fn span_processors(&self) -> &[Box<dyn SpanProcessor>] {
        &self.inner.processors
    }

    /// Config associated with this provider.
    pub(crate) fn config(&self) -> &Config {
        &self.inner.config
    }

    /// `true` once the provider has been shut down; tracers then produce
    /// no-op spans.
    pub(crate) fn is_shutdown(&self) -> bool {
        self.inner.is_shutdown.load(Ordering::Relaxed)
    }

    /// Force all buffered spans out through the processors, waiting up to
    /// the default deadline.
    pub fn force_flush(&self) -> TraceResult<()> {
        self.force_flush_with_timeout(DEFAULT_PIPELINE_TIMEOUT)
    }

    /// Force all buffered spans out through the processors, waiting at most
    /// `timeout`.
    pub fn force_flush_with_timeout(&self, timeout: Duration) -> TraceResult<()> {
        let results: Vec<_> = self
            .span_processors()
            .iter()
            .map(|processor| processor.force_flush(timeout))
            .collect();
        if results.iter().all(|result| result.is_ok()) {
            Ok(())
        } else {
            Err(TraceError::from(format!(
                "force flush errors: {:?}",
                results
                    .into_iter()
                    .filter_map(Result::err)
                    .collect::<Vec<_>>()
            )))
        }
    }

    /// Shuts down this `TracerProvider` and its processors, waiting up to
    /// the default deadline for the final flush.
    pub fn shutdown(&self) -> TraceResult<()> {
        self.shutdown_with_timeout(DEFAULT_PIPELINE_TIMEOUT)
    }

    /// Shuts down this `TracerProvider`, waiting at most `timeout`.
    ///
    /// Stops span intake, cascades to every processor for a final
    /// best-effort flush, and releases the background resources. A second
    /// call returns [`TraceError::AlreadyShutdown`].
    pub fn shutdown_with_timeout(&self, timeout: Duration) -> TraceResult<()> {
        if self
            .inner
            .is_shutdown
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let results = self.inner.shutdown(timeout);
            if results.iter().all(|result| result.is_ok()) {
                Ok(())
            } else {
                Err(TraceError::from(format!(
                    "shutdown errors: {:?}",
                    results
                        .into_iter()
                        .filter_map(Result::err)
                        .collect::<Vec<_>>()
                )))
            }
        } else {
            Err(TraceError::AlreadyShutdown)
        }
    }
}

/// Builder for [`TracerProvider`].
#[derive(Debug, Default)]
pub struct TracerProviderBuilder {
    processors: Vec<Box<dyn SpanProcessor>>,
    config: Config,
}

impl TracerProviderBuilder {
    /// Adds a [`SimpleSpanProcessor`] with the given exporter to the
    /// pipeline.
    ///
    /// Processors are invoked in the order they are added.
    pub fn with_simple_exporter<T: SpanExporter + 'static>(self, exporter: T) -> Self {
        self.with_span_processor(SimpleSpanProcessor::new(Box::new(exporter)))
    }

    /// Adds a [`BatchSpanProcessor`] with the given exporter and default
    /// batch configuration to the pipeline.
    ///
    /// Processors are invoked in the order they are added.
    pub fn with_batch_exporter<T: SpanExporter + 'static>(self, exporter: T) -> Self {
        self.with_span_processor(BatchSpanProcessor::builder(exporter).build())
    }

    /// Adds a custom [`SpanProcessor`] to the pipeline.
    ///
    /// Processors are invoked in the order they are added.
    pub fn with_span_processor<T: SpanProcessor + 'static>(mut self, processor: T) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Specify the sampler consulted for new root spans.
    pub fn with_sampler<T: ShouldSample + 'static>(mut self, sampler: T) -> Self {
        self.config.sampler = Box::new(sampler);
        self
    }

    /// Specify the id generator for trace and span ids.
    pub fn with_id_generator<T: IdGenerator + 'static>(mut self, id_generator: T) -> Self {
        self.config.id_generator = Box::new(id_generator);
        self
    }

    /// Specify the service identity label attached to every exported span.
    pub fn with_service_name<T: Into<Cow<'static, str>>>(mut self, service_name: T) -> Self {
        self.config.service_name = service_name.into();
        self
    }

    /// Create a new provider from this configuration.
    pub fn build(self) -> TracerProvider {
        TracerProvider {
            inner: Arc::new(TracerProviderInner {
                processors: self.processors,
                config: self.config,
                is_shutdown: AtomicBool::new(false),
            }),
        }
    }
}
