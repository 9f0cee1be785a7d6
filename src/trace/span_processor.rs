//! # Span Processors
//!
//! Span processors receive finished spans from [`Span::end`] and hand them
//! to a [`SpanExporter`]. They are the only hand-off point between the
//! caller's critical path and network transmission: `on_end` is invoked
//! synchronously by the ending span and must never block.
//!
//! [`SimpleSpanProcessor`] forwards each span as it ends, without batching —
//! useful for debugging and tests. [`BatchSpanProcessor`] decouples span
//! completion from transmission with a bounded queue and a dedicated
//! background flusher thread, and is what production pipelines use.
//!
//! ```ascii
//!   +-----+--------------+   +---------------------+   +-----------------+
//!   |     |              |   |                     |   |                 |
//!   |     |              |   | BatchSpanProcessor  |   |  SpanExporter   |
//!   |     |              +---> SimpleSpanProcessor +--->  (collector)    |
//!   |     |              |   |                     |   |                 |
//!   | SDK | Tracer.start()|  +---------------------+   +-----------------+
//!   |     | Span.end()   |
//!   +-----+--------------+
//! ```
//!
//! [`Span::end`]: crate::trace::Span::end

use crate::export::{SpanData, SpanExporter};
use crate::trace::{TraceError, TraceResult};
use futures_executor::block_on;
use std::cmp::min;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Default maximum queue size.
const DEFAULT_MAX_QUEUE_SIZE: usize = 2_048;
/// Default maximum batch size.
const DEFAULT_MAX_EXPORT_BATCH_SIZE: usize = 512;
/// Default maximum time a span may linger in the batch before a flush.
const DEFAULT_MAX_BATCH_LINGER: Duration = Duration::from_secs(5);
/// Default total number of transmission attempts per batch.
const DEFAULT_MAX_EXPORT_ATTEMPTS: usize = 3;
/// Default base delay between transmission attempts.
const DEFAULT_RETRY_BACKOFF_BASE: Duration = Duration::from_millis(100);
/// Default cap on the backoff delay.
const DEFAULT_MAX_RETRY_BACKOFF: Duration = Duration::from_millis(1_600);

/// `SpanProcessor` is the interface invoked when spans end.
///
/// `on_end` is called synchronously within `Span::end`, therefore it must
/// not block or panic.
pub trait SpanProcessor: Send + Sync + std::fmt::Debug {
    /// Called after a span is ended, with its finished record. Unsampled
    /// spans are discarded here — sampling gates export, not span-tree
    /// construction.
    fn on_end(&self, span: SpanData);

    /// Force any buffered spans out to the exporter, waiting at most
    /// `timeout`.
    fn force_flush(&self, timeout: Duration) -> TraceResult<()>;

    /// Shuts down the processor: stop accepting spans, flush what remains
    /// within `timeout`, release resources. Called exactly once, by the
    /// owning provider at teardown.
    fn shutdown(&self, timeout: Duration) -> TraceResult<()>;
}

/// A [`SpanProcessor`] that passes finished spans to the exporter as soon as
/// they end, without batching. Each export happens on the thread that ended
/// the span; use [`BatchSpanProcessor`] for anything latency-sensitive.
#[derive(Debug)]
pub struct SimpleSpanProcessor {
    exporter: Mutex<Box<dyn SpanExporter>>,
}

impl SimpleSpanProcessor {
    /// Create a new [`SimpleSpanProcessor`] using the provided exporter.
    pub fn new(exporter: Box<dyn SpanExporter>) -> Self {
        Self {
            exporter: Mutex::new(exporter),
        }
    }
}

impl SpanProcessor for SimpleSpanProcessor {
    fn on_end(&self, span: SpanData) {
        if !span.span_context.is_sampled() {
            return;
        }

        let result = self
            .exporter
            .lock()
            .map_err(|_| TraceError::from("SimpleSpanProcessor mutex poisoned"))
            .and_then(|mut exporter| block_on(exporter.export(vec![span])));

        if let Err(err) = result {
            sdk_debug!(
                name: "SimpleSpanProcessor.ExportError",
                reason = format!("{err:?}")
            );
        }
    }

    fn force_flush(&self, _timeout: Duration) -> TraceResult<()> {
        // Nothing buffered.
        Ok(())
    }

    fn shutdown(&self, _timeout: Duration) -> TraceResult<()> {
        match self.exporter.lock() {
            Ok(mut exporter) => {
                exporter.shutdown();
                Ok(())
            }
            Err(_) => Err(TraceError::from(
                "SimpleSpanProcessor mutex poisoned at shutdown",
            )),
        }
    }
}

/// Messages exchanged between producers and the flusher thread.
#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
enum BatchMessage {
    ExportSpan(SpanData),
    ForceFlush(SyncSender<TraceResult<()>>),
    Shutdown(SyncSender<TraceResult<()>>),
}

/// A [`SpanProcessor`] with a bounded queue and a dedicated background
/// flusher thread.
///
/// Producers hand spans over with a non-blocking enqueue; when the queue is
/// full the newest span is dropped and counted rather than blocking the
/// caller. The flusher transmits batches when either the batch-size or the
/// batch-linger trigger fires, retrying failed transmissions with bounded
/// exponential backoff. A batch whose retry budget is exhausted is dropped
/// and counted — telemetry is best-effort by design, and an unreachable
/// collector must not grow process memory without bound.
///
/// Both counters are observable via [`dropped_spans`] and
/// [`export_failures`].
///
/// [`dropped_spans`]: BatchSpanProcessor::dropped_spans
/// [`export_failures`]: BatchSpanProcessor::export_failures
#[derive(Debug)]
pub struct BatchSpanProcessor {
    message_sender: SyncSender<BatchMessage>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    is_shutdown: AtomicBool,
    dropped_spans: Arc<AtomicU64>,
    export_failures: Arc<AtomicU64>,
}

impl BatchSpanProcessor {
    /// Creates a new `BatchSpanProcessor` and spawns its flusher thread.
    pub fn new<E>(exporter: E, config: BatchConfig) -> Self
    where
        E: SpanExporter + 'static,
    {
        let (message_sender, message_receiver) = sync_channel(config.max_queue_size);
        let export_failures = Arc::new(AtomicU64::new(0));

        let worker_failures = export_failures.clone();
        let handle = thread::Builder::new()
            .name("tracewire-batch-flusher".to_string())
            .spawn(move || {
                BatchWorker {
                    exporter,
                    config,
                    batch: Vec::new(),
                    batch_deadline: None,
                    export_failures: worker_failures,
                }
                .run(message_receiver)
            })
            .expect("failed to spawn batch flusher thread");

        Self {
            message_sender,
            handle: Mutex::new(Some(handle)),
            is_shutdown: AtomicBool::new(false),
            dropped_spans: Arc::new(AtomicU64::new(0)),
            export_failures,
        }
    }

    /// Create a builder for a `BatchSpanProcessor`.
    pub fn builder<E>(exporter: E) -> BatchSpanProcessorBuilder<E>
    where
        E: SpanExporter + 'static,
    {
        BatchSpanProcessorBuilder {
            exporter,
            config: BatchConfig::default(),
        }
    }

    /// Number of spans dropped because the queue was full or closed.
    pub fn dropped_spans(&self) -> u64 {
        self.dropped_spans.load(Ordering::Relaxed)
    }

    /// Number of batches dropped after exhausting their retry budget.
    /// Retries that eventually succeed are not counted.
    pub fn export_failures(&self) -> u64 {
        self.export_failures.load(Ordering::Relaxed)
    }
}

impl SpanProcessor for BatchSpanProcessor {
    fn on_end(&self, span: SpanData) {
        if self.is_shutdown.load(Ordering::Relaxed) {
            sdk_debug!(name: "BatchSpanProcessor.OnEndAfterShutdown");
            return;
        }
        if !span.span_context.is_sampled() {
            return;
        }

        if self
            .message_sender
            .try_send(BatchMessage::ExportSpan(span))
            .is_err()
        {
            // The first drop is logged; after that only the counter moves,
            // to avoid flooding diagnostics while the flusher catches up.
            if self.dropped_spans.fetch_add(1, Ordering::Relaxed) == 0 {
                sdk_warn!(
                    name: "BatchSpanProcessor.SpanDroppingStarted",
                    message = "span queue full, dropping newest spans"
                );
            }
        }
    }

    fn force_flush(&self, timeout: Duration) -> TraceResult<()> {
        if self.is_shutdown.load(Ordering::Relaxed) {
            return Err(TraceError::AlreadyShutdown);
        }
        let (sender, receiver) = sync_channel(1);
        self.message_sender
            .try_send(BatchMessage::ForceFlush(sender))
            .map_err(|_| TraceError::from("failed to send force-flush message"))?;

        receiver
            .recv_timeout(timeout)
            .map_err(|_| TraceError::ExportTimedOut(timeout))?
    }

    fn shutdown(&self, timeout: Duration) -> TraceResult<()> {
        if self.is_shutdown.swap(true, Ordering::SeqCst) {
            return Err(TraceError::AlreadyShutdown);
        }
        let (sender, receiver) = sync_channel(1);
        self.message_sender
            .try_send(BatchMessage::Shutdown(sender))
            .map_err(|_| TraceError::from("failed to send shutdown message"))?;

        let result = receiver
            .recv_timeout(timeout)
            .map_err(|_| TraceError::ExportTimedOut(timeout))?;

        if let Ok(mut handle) = self.handle.lock() {
            if let Some(handle) = handle.take() {
                let _ = handle.join();
            }
        }
        result
    }
}

/// State owned by the flusher thread.
struct BatchWorker<E> {
    exporter: E,
    config: BatchConfig,
    batch: Vec<SpanData>,
    /// Flush deadline, set when the first span of a batch arrives:
    /// its receive time plus the configured linger.
    batch_deadline: Option<Instant>,
    export_failures: Arc<AtomicU64>,
}

impl<E: SpanExporter> BatchWorker<E> {
    fn run(mut self, receiver: Receiver<BatchMessage>) {
        loop {
            let message = match self.batch_deadline {
                // A batch is open: wait at most until its linger deadline.
                Some(deadline) => {
                    let timeout = deadline.saturating_duration_since(Instant::now());
                    match receiver.recv_timeout(timeout) {
                        Ok(message) => Some(message),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                // Nothing buffered: sleep until work arrives.
                None => match receiver.recv() {
                    Ok(message) => Some(message),
                    Err(_) => break,
                },
            };

            match message {
                Some(BatchMessage::ExportSpan(span)) => {
                    if self.batch.is_empty() {
                        self.batch_deadline =
                            Some(Instant::now() + self.config.max_batch_linger);
                    }
                    self.batch.push(span);
                    if self.batch.len() >= self.config.max_export_batch_size {
                        let _ = self.flush();
                    }
                }
                // Messages are received in enqueue order, so by the time a
                // control message arrives every span enqueued before it is
                // already in `batch` (or flushed).
                Some(BatchMessage::ForceFlush(sender)) => {
                    let result = self.flush();
                    let _ = sender.send(result);
                }
                Some(BatchMessage::Shutdown(sender)) => {
                    let result = self.flush();
                    self.exporter.shutdown();
                    let _ = sender.send(result);
                    return;
                }
                // Linger deadline elapsed.
                None => {
                    let _ = self.flush();
                }
            }
        }

        // All senders disconnected without an explicit shutdown; make a
        // final best-effort flush before the thread exits.
        let _ = self.flush();
        self.exporter.shutdown();
    }

    /// Transmit everything currently buffered, in batch-size chunks.
    fn flush(&mut self) -> TraceResult<()> {
        let mut result = Ok(());
        while !self.batch.is_empty() {
            let rest = self
                .batch
                .split_off(min(self.config.max_export_batch_size, self.batch.len()));
            let chunk = std::mem::replace(&mut self.batch, rest);
            if let Err(err) = self.export_with_retry(chunk) {
                result = Err(err);
            }
        }
        self.batch_deadline = None;
        result
    }

    /// One all-or-nothing transmission of `batch`, retried with bounded
    /// exponential backoff. On exhaustion the batch is dropped and the
    /// failure counter incremented.
    fn export_with_retry(&mut self, batch: Vec<SpanData>) -> TraceResult<()> {
        let mut attempt = 1;
        let mut backoff = self.config.retry_backoff_base;
        loop {
            match block_on(self.exporter.export(batch.clone())) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if attempt >= self.config.max_export_attempts {
                        self.export_failures.fetch_add(1, Ordering::Relaxed);
                        sdk_warn!(
                            name: "BatchSpanProcessor.ExportRetriesExhausted",
                            reason = format!("{err:?}"),
                            dropped_batch_size = batch.len()
                        );
                        return Err(err);
                    }
                    sdk_debug!(
                        name: "BatchSpanProcessor.ExportRetry",
                        attempt = attempt,
                        reason = format!("{err:?}")
                    );
                    thread::sleep(backoff);
                    backoff = min(backoff * 2, self.config.max_retry_backoff);
                    attempt += 1;
                }
            }
        }
    }
}

/// Builder for [`BatchSpanProcessor`].
#[derive(Debug)]
pub struct BatchSpanProcessorBuilder<E>
where
    E: SpanExporter + 'static,
{
    exporter: E,
    config: BatchConfig,
}

impl<E> BatchSpanProcessorBuilder<E>
where
    E: SpanExporter + 'static,
{
    /// Set the [`BatchConfig`] for the processor.
    pub fn with_batch_config(self, config: BatchConfig) -> Self {
        BatchSpanProcessorBuilder { config, ..self }
    }

    /// Build a new [`BatchSpanProcessor`], spawning its flusher thread.
    pub fn build(self) -> BatchSpanProcessor {
        BatchSpanProcessor::new(self.exporter, self.config)
    }
}

/// Batch span processor configuration.
/// Use [`BatchConfigBuilder`] to configure an instance.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Capacity of the queue buffering spans between producers and the
    /// flusher. When full, newest spans are dropped.
    pub(crate) max_queue_size: usize,

    /// Maximum number of spans transmitted in a single batch.
    pub(crate) max_export_batch_size: usize,

    /// Maximum time the oldest un-flushed span may wait before the batch is
    /// transmitted regardless of size. Bounds latency-to-visibility the way
    /// `max_export_batch_size` bounds memory.
    pub(crate) max_batch_linger: Duration,

    /// Total transmission attempts per batch (first try included).
    pub(crate) max_export_attempts: usize,

    /// Delay before the first retry; doubles per attempt.
    pub(crate) retry_backoff_base: Duration,

    /// Upper bound on the retry delay.
    pub(crate) max_retry_backoff: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfigBuilder::default().build()
    }
}

/// A builder for [`BatchConfig`].
#[derive(Clone, Debug)]
pub struct BatchConfigBuilder {
    max_queue_size: usize,
    max_export_batch_size: usize,
    max_batch_linger: Duration,
    max_export_attempts: usize,
    retry_backoff_base: Duration,
    max_retry_backoff: Duration,
}

impl Default for BatchConfigBuilder {
    fn default() -> Self {
        BatchConfigBuilder {
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_export_batch_size: DEFAULT_MAX_EXPORT_BATCH_SIZE,
            max_batch_linger: DEFAULT_MAX_BATCH_LINGER,
            max_export_attempts: DEFAULT_MAX_EXPORT_ATTEMPTS,
            retry_backoff_base: DEFAULT_RETRY_BACKOFF_BASE,
            max_retry_backoff: DEFAULT_MAX_RETRY_BACKOFF,
        }
    }
}

impl BatchConfigBuilder {
    /// Set the queue capacity. Spans arriving while the queue is full are
    /// dropped and counted. The default is 2048.
    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Set the maximum batch size. The default is 512.
    pub fn with_max_export_batch_size(mut self, max_export_batch_size: usize) -> Self {
        self.max_export_batch_size = max_export_batch_size;
        self
    }

    /// Set the maximum batch linger. The default is 5 seconds.
    pub fn with_max_batch_linger(mut self, max_batch_linger: Duration) -> Self {
        self.max_batch_linger = max_batch_linger;
        self
    }

    /// Set the total transmission attempts per batch, first try included.
    /// The default is 3; values below 1 are clamped to 1.
    pub fn with_max_export_attempts(mut self, max_export_attempts: usize) -> Self {
        self.max_export_attempts = max_export_attempts;
        self
    }

    /// Set the base retry delay. The delay doubles per attempt up to the
    /// configured cap. The default is 100 milliseconds.
    pub fn with_retry_backoff_base(mut self, retry_backoff_base: Duration) -> Self {
        self.retry_backoff_base = retry_backoff_base;
        self
    }

    /// Set the cap on the retry delay. The default is 1.6 seconds.
    pub fn with_max_retry_backoff(mut self, max_retry_backoff: Duration) -> Self {
        self.max_retry_backoff = max_retry_backoff;
        self
    }

    /// Builds a [`BatchConfig`], enforcing that the batch size never
    /// exceeds the queue size and that at least one attempt is made.
    pub fn build(self) -> BatchConfig {
        BatchConfig {
            max_queue_size: self.max_queue_size,
            max_export_batch_size: min(self.max_export_batch_size, self.max_queue_size),
            max_batch_linger: self.max_batch_linger,
            max_export_attempts: self.max_export_attempts.max(1),
            retry_backoff_base: self.retry_backoff_base,
            max_retry_backoff: self.max_retry_backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportResult, InMemorySpanExporter};
    use crate::trace::{SpanContext, SpanId, TraceFlags, TraceId};
    use futures_util::future::BoxFuture;
    use std::sync::atomic::AtomicUsize;
    use std::time::SystemTime;

    fn create_test_span(name: &str) -> SpanData {
        SpanData {
            span_context: SpanContext::new(
                TraceId::from(1),
                SpanId::from(1),
                TraceFlags::SAMPLED,
            ),
            parent_span_id: SpanId::INVALID,
            name: name.to_string().into(),
            service_name: "processor-tests".into(),
            start_time: SystemTime::now(),
            end_time: SystemTime::now(),
            attributes: Vec::new(),
        }
    }

    fn create_unsampled_span(name: &str) -> SpanData {
        SpanData {
            span_context: SpanContext::new(
                TraceId::from(1),
                SpanId::from(1),
                TraceFlags::default(),
            ),
            ..create_test_span(name)
        }
    }

    fn quick_retry_config() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
            .with_retry_backoff_base(Duration::from_millis(1))
            .with_max_retry_backoff(Duration::from_millis(4))
    }

    /// Exporter failing a fixed number of attempts before succeeding.
    #[derive(Debug)]
    struct FlakyExporter {
        failures_remaining: AtomicUsize,
        attempts: Arc<AtomicUsize>,
        delivered: Arc<Mutex<Vec<SpanData>>>,
    }

    impl FlakyExporter {
        fn new(failures: usize) -> Self {
            Self {
                failures_remaining: AtomicUsize::new(failures),
                attempts: Arc::new(AtomicUsize::new(0)),
                delivered: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl SpanExporter for FlakyExporter {
        fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let result = if self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                    remaining.checked_sub(1)
                })
                .is_ok()
            {
                Err(TraceError::ExportFailed("collector unreachable".into()))
            } else {
                self.delivered.lock().unwrap().extend(batch);
                Ok(())
            };
            Box::pin(std::future::ready(result))
        }
    }

    /// Exporter that parks on its first export until released, so tests can
    /// hold the flusher off the queue.
    #[derive(Debug)]
    struct BlockingExporter {
        started: SyncSender<()>,
        // Mutex keeps the receiver `Sync`, as `SpanExporter` requires.
        release: Mutex<Receiver<()>>,
        blocked_once: bool,
        exports: Arc<AtomicUsize>,
    }

    impl SpanExporter for BlockingExporter {
        fn export(&mut self, _batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
            if !self.blocked_once {
                self.blocked_once = true;
                let _ = self.started.send(());
                if let Ok(release) = self.release.lock() {
                    let _ = release.recv();
                }
            }
            self.exports.fetch_add(1, Ordering::SeqCst);
            Box::pin(std::future::ready(Ok(())))
        }
    }

    #[test]
    fn simple_processor_on_end_calls_export() {
        let exporter = InMemorySpanExporter::default();
        let processor = SimpleSpanProcessor::new(Box::new(exporter.clone()));
        let span_data = create_test_span("simple");
        processor.on_end(span_data.clone());
        assert_eq!(exporter.get_finished_spans().unwrap()[0], span_data);
    }

    #[test]
    fn simple_processor_skips_unsampled_spans() {
        let exporter = InMemorySpanExporter::default();
        let processor = SimpleSpanProcessor::new(Box::new(exporter.clone()));
        processor.on_end(create_unsampled_span("invisible"));
        assert!(exporter.get_finished_spans().unwrap().is_empty());
    }

    #[test]
    fn batch_config_clamps_batch_size_to_queue_size() {
        let config = BatchConfigBuilder::default()
            .with_max_queue_size(256)
            .with_max_export_batch_size(1024)
            .with_max_export_attempts(0)
            .build();
        assert_eq!(config.max_queue_size, 256);
        assert_eq!(config.max_export_batch_size, 256);
        assert_eq!(config.max_export_attempts, 1);
    }

    #[test]
    fn batch_flushes_when_linger_elapses() {
        let exporter = InMemorySpanExporter::default();
        let config = BatchConfigBuilder::default()
            .with_max_export_batch_size(128)
            .with_max_batch_linger(Duration::from_millis(50))
            .build();
        let processor = BatchSpanProcessor::new(exporter.clone(), config);

        processor.on_end(create_test_span("lingering"));

        thread::sleep(Duration::from_millis(250));
        assert_eq!(exporter.get_finished_spans().unwrap().len(), 1);

        processor.shutdown(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn batch_flushes_when_batch_size_reached() {
        let exporter = InMemorySpanExporter::default();
        let config = BatchConfigBuilder::default()
            .with_max_export_batch_size(2)
            .with_max_batch_linger(Duration::from_secs(3600))
            .build();
        let processor = BatchSpanProcessor::new(exporter.clone(), config);

        processor.on_end(create_test_span("one"));
        processor.on_end(create_test_span("two"));

        // size trigger, not linger: spans must show up promptly
        let deadline = Instant::now() + Duration::from_secs(5);
        while exporter.get_finished_spans().unwrap().len() < 2 {
            assert!(Instant::now() < deadline, "size-triggered flush never ran");
            thread::sleep(Duration::from_millis(10));
        }

        processor.shutdown(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn force_flush_empties_queue_and_delivers_each_span_once() {
        let exporter = InMemorySpanExporter::default();
        let processor =
            BatchSpanProcessor::new(exporter.clone(), BatchConfig::default());

        for i in 0..10 {
            processor.on_end(create_test_span(&format!("span-{i}")));
        }
        processor.force_flush(Duration::from_secs(5)).unwrap();

        let finished = exporter.get_finished_spans().unwrap();
        assert_eq!(finished.len(), 10);

        // a second flush transmits nothing further
        processor.force_flush(Duration::from_secs(5)).unwrap();
        assert_eq!(exporter.get_finished_spans().unwrap().len(), 10);

        processor.shutdown(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn unsampled_spans_are_not_enqueued() {
        let exporter = InMemorySpanExporter::default();
        let processor =
            BatchSpanProcessor::new(exporter.clone(), BatchConfig::default());

        processor.on_end(create_unsampled_span("invisible"));
        processor.force_flush(Duration::from_secs(5)).unwrap();

        assert!(exporter.get_finished_spans().unwrap().is_empty());
        processor.shutdown(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn full_queue_drops_newest_without_blocking() {
        let (started_sender, started_receiver) = sync_channel(1);
        let (release_sender, release_receiver) = sync_channel::<()>(1);
        let exports = Arc::new(AtomicUsize::new(0));
        let exporter = BlockingExporter {
            started: started_sender,
            release: Mutex::new(release_receiver),
            blocked_once: false,
            exports: exports.clone(),
        };

        let capacity = 4;
        let config = BatchConfigBuilder::default()
            .with_max_queue_size(capacity)
            .with_max_export_batch_size(1)
            .build();
        let processor = BatchSpanProcessor::new(exporter, config);

        // First span makes the flusher enter the blocking export.
        processor.on_end(create_test_span("blocker"));
        started_receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("flusher never started exporting");

        // With the flusher parked, burst past the queue capacity.
        let burst = capacity + 3;
        for i in 0..burst {
            processor.on_end(create_test_span(&format!("burst-{i}")));
        }
        assert_eq!(processor.dropped_spans(), (burst - capacity) as u64);

        // Release the flusher and wait for it to drain the queue before
        // shutting down, so the shutdown message finds room in the channel.
        release_sender.send(()).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while exports.load(Ordering::SeqCst) < 1 + capacity {
            assert!(Instant::now() < deadline, "flusher never drained the queue");
            thread::sleep(Duration::from_millis(10));
        }
        processor.shutdown(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn retries_within_budget_are_not_failures() {
        let exporter = FlakyExporter::new(2);
        let attempts = exporter.attempts.clone();
        let delivered = exporter.delivered.clone();

        let config = quick_retry_config().with_max_export_attempts(3).build();
        let processor = BatchSpanProcessor::new(exporter, config);

        processor.on_end(create_test_span("retried"));
        processor.force_flush(Duration::from_secs(5)).unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(delivered.lock().unwrap().len(), 1);
        assert_eq!(processor.export_failures(), 0);

        processor.shutdown(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn exhausted_retries_drop_batch_and_count_one_failure() {
        let exporter = FlakyExporter::new(usize::MAX);
        let attempts = exporter.attempts.clone();
        let delivered = exporter.delivered.clone();

        let config = quick_retry_config().with_max_export_attempts(2).build();
        let processor = BatchSpanProcessor::new(exporter, config);

        processor.on_end(create_test_span("doomed"));
        let result = processor.force_flush(Duration::from_secs(5));
        assert!(result.is_err());

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(delivered.lock().unwrap().is_empty());
        assert_eq!(processor.export_failures(), 1);
        assert_eq!(processor.dropped_spans(), 0);

        // the pipeline keeps accepting and transmitting after a dropped batch
        processor.on_end(create_test_span("subsequent"));
        let _ = processor.force_flush(Duration::from_secs(5));
        assert_eq!(processor.export_failures(), 2);

        processor.shutdown(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn shutdown_flushes_and_is_exactly_once() {
        let exporter = InMemorySpanExporter::default();
        let processor =
            BatchSpanProcessor::new(exporter.clone(), BatchConfig::default());

        processor.on_end(create_test_span("final"));
        processor.shutdown(Duration::from_secs(5)).unwrap();
        assert_eq!(exporter.get_finished_spans().unwrap().len(), 1);

        assert!(matches!(
            processor.shutdown(Duration::from_secs(5)),
            Err(TraceError::AlreadyShutdown)
        ));
        assert!(matches!(
            processor.force_flush(Duration::from_secs(5)),
            Err(TraceError::AlreadyShutdown)
        ));
    }
}
