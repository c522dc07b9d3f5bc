use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::{AppEvent, EventSender};

use super::client::{AnalyzeOutcome, AnalyzerApi};
use super::sampler::FrameSampler;
use super::{normalize_analysis, synthesize_next, AnalyzerPhase, EngagementFeed};

/// Fixed cadence of the analysis loop.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Classroom context sent with the initialize call.
pub const SESSION_CONTEXT: &str = "lecture";

/// Cancellable handle to a running polling session. Cancelling is
/// synchronous: no further analyze results are applied after it returns.
/// Dropping the handle cancels too, so a replaced session can never leak
/// its loop.
pub struct PollerHandle {
    token: CancellationToken,
    _task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Per-session poller state.
struct PollState {
    seq: u64,
    /// A real analyzer sample has been published this session. Once set,
    /// failures keep the last live sample instead of fabricating noise.
    live_seen: bool,
}

/// Start an engagement session: initialize the analyzer, then poll one
/// frame every `POLL_INTERVAL` until cancelled.
pub fn spawn(
    analyzer: Arc<dyn AnalyzerApi>,
    sampler: FrameSampler,
    feed: EngagementFeed,
    event_tx: EventSender,
) -> PollerHandle {
    let token = CancellationToken::new();
    let task = tokio::spawn(run(analyzer, sampler, feed, event_tx, token.clone()));
    PollerHandle { token, _task: task }
}

async fn run(
    analyzer: Arc<dyn AnalyzerApi>,
    sampler: FrameSampler,
    feed: EngagementFeed,
    event_tx: EventSender,
    token: CancellationToken,
) {
    feed.begin_session();

    if !analyzer.check_status().await {
        warn!("Analyzer status probe failed, attempting initialization anyway");
    }
    if token.is_cancelled() {
        feed.set_phase(AnalyzerPhase::Idle);
        return;
    }

    let mut state = PollState {
        seq: 0,
        live_seen: false,
    };

    match analyzer.initialize(SESSION_CONTEXT).await {
        Ok(()) => {
            info!("Engagement analyzer initialized (context: {})", SESSION_CONTEXT);
            feed.set_phase(AnalyzerPhase::Polling);
        }
        Err(message) => {
            warn!("Engagement analyzer initialization failed: {}", message);
            feed.set_phase(AnalyzerPhase::Degraded);
            // Degraded sessions still take the immediate first analysis
            // shot; only the recurring loop stays down.
            if !token.is_cancelled() {
                poll_once(&*analyzer, &sampler, &feed, &event_tx, &token, &mut state).await;
            }
            return;
        }
    }

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // The poll body is awaited inside the arm, so a tick can
            // never start a second analyze request while one is pending.
            _ = ticker.tick() => {
                poll_once(&*analyzer, &sampler, &feed, &event_tx, &token, &mut state).await;
            }
            _ = token.cancelled() => {
                info!("Engagement polling stopped");
                feed.set_phase(AnalyzerPhase::Idle);
                break;
            }
        }
    }
}

async fn poll_once(
    analyzer: &dyn AnalyzerApi,
    sampler: &FrameSampler,
    feed: &EngagementFeed,
    event_tx: &EventSender,
    token: &CancellationToken,
    state: &mut PollState,
) {
    let frame = match sampler.capture() {
        Ok(frame) => frame,
        Err(skip) => {
            debug!("Frame capture skipped: {:?}", skip);
            return;
        }
    };

    let outcome = analyzer.analyze(&frame.data_uri).await;

    // The session may have ended while the request was in flight; a
    // cancelled session must not absorb late results.
    if token.is_cancelled() {
        debug!("Discarding analyze result after cancellation");
        return;
    }

    match outcome {
        AnalyzeOutcome::Success(payload) => {
            state.seq += 1;
            let (sample, history) =
                normalize_analysis(state.seq, &payload, &mut rand::thread_rng());
            state.live_seen = true;
            feed.publish_with_history(sample.clone(), history);
            let _ = event_tx.send(AppEvent::EngagementUpdated(sample));
        }
        AnalyzeOutcome::Failure { message } => {
            if state.live_seen {
                debug!("Analyzer failure ({}), keeping last live sample", message);
            } else {
                warn!("Analyzer unavailable ({}), synthesizing local sample", message);
                state.seq += 1;
                let sample = synthesize_next(
                    state.seq,
                    feed.last_sample().as_ref(),
                    &mut rand::thread_rng(),
                );
                feed.publish_append(sample.clone());
                let _ = event_tx.send(AppEvent::EngagementUpdated(sample));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::client::AnalysisPayload;
    use crate::engagement::sampler::FrameSampler;
    use crate::engagement::{SampleOrigin, HISTORY_CAP, NEUTRAL_SCORE};
    use crate::events::create_event_bus;
    use crate::media::camera::CapturedFrame;
    use crate::media::frame_server::VideoSink;
    use crate::media::ClassSessionState;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::watch;

    struct MockAnalyzer {
        init_ok: bool,
        /// Scripted outcomes consumed front-to-back; afterwards every
        /// call returns `fallback`.
        script: Mutex<VecDeque<AnalyzeOutcome>>,
        fallback: AnalyzeOutcome,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockAnalyzer {
        fn new(init_ok: bool, fallback: AnalyzeOutcome) -> Arc<Self> {
            Arc::new(Self {
                init_ok,
                script: Mutex::new(VecDeque::new()),
                fallback,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }

        fn with_delay(init_ok: bool, fallback: AnalyzeOutcome, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                init_ok,
                script: Mutex::new(VecDeque::new()),
                fallback,
                delay,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }

        fn push(&self, outcome: AnalyzeOutcome) {
            self.script.lock().unwrap().push_back(outcome);
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalyzerApi for MockAnalyzer {
        async fn check_status(&self) -> bool {
            true
        }

        async fn initialize(&self, _context: &str) -> Result<(), String> {
            if self.init_ok {
                Ok(())
            } else {
                Err("initialize refused".to_string())
            }
        }

        async fn analyze(&self, _image: &str) -> AnalyzeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(concurrent, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    fn success(score: f64, history: Option<Vec<f64>>) -> AnalyzeOutcome {
        AnalyzeOutcome::Success(AnalysisPayload {
            engagement_score: Some(score),
            raw_score: Some(score),
            history,
            ..Default::default()
        })
    }

    fn failure() -> AnalyzeOutcome {
        AnalyzeOutcome::Failure {
            message: "service down".to_string(),
        }
    }

    /// Sampler over a sink that already holds one valid frame.
    fn live_sampler() -> (FrameSampler, watch::Sender<ClassSessionState>) {
        let sink = VideoSink::new();
        sink.attach();
        let gray = image::ImageBuffer::from_pixel(4, 4, image::Rgb([0x80u8, 0x80, 0x80]));
        let mut jpeg = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 85);
        image::DynamicImage::ImageRgb8(gray)
            .write_with_encoder(encoder)
            .unwrap();
        sink.push(CapturedFrame {
            jpeg_data: jpeg,
            width: 4,
            height: 4,
        });

        let (tx, rx) = watch::channel(ClassSessionState {
            camera_enabled: true,
            ..Default::default()
        });
        (FrameSampler::new(sink, rx), tx)
    }

    #[tokio::test(start_paused = true)]
    async fn at_most_one_analyze_request_in_flight() {
        let analyzer = MockAnalyzer::with_delay(
            true,
            success(70.0, None),
            Duration::from_secs(7), // slower than the poll interval
        );
        let (sampler, _session_tx) = live_sampler();
        let feed = EngagementFeed::new();
        let (event_tx, _event_rx) = create_event_bus();

        let handle = spawn(analyzer.clone(), sampler, feed, event_tx);

        tokio::time::sleep(Duration::from_secs(30)).await;
        handle.cancel();

        assert!(analyzer.call_count() >= 2);
        assert_eq!(analyzer.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn live_sample_survives_later_failures() {
        let analyzer = MockAnalyzer::new(true, failure());
        analyzer.push(success(82.0, None));
        let (sampler, _session_tx) = live_sampler();
        let feed = EngagementFeed::new();
        let (event_tx, _event_rx) = create_event_bus();

        let handle = spawn(analyzer.clone(), sampler, feed.clone(), event_tx);

        // First (immediate) poll succeeds.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let live = feed.snapshot().sample.expect("live sample");
        assert_eq!(live.engagement_score, 82.0);
        assert_eq!(live.origin, SampleOrigin::Live);

        // Several failing polls later the sample is untouched.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(analyzer.call_count() >= 3);
        assert_eq!(feed.snapshot().sample, Some(live));

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn synthesizes_locally_until_a_live_sample_exists() {
        let analyzer = MockAnalyzer::new(true, failure());
        let (sampler, _session_tx) = live_sampler();
        let feed = EngagementFeed::new();
        let (event_tx, _event_rx) = create_event_bus();

        let handle = spawn(analyzer.clone(), sampler, feed.clone(), event_tx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let snapshot = feed.snapshot();
        let sample = snapshot.sample.expect("synthetic sample");
        assert_eq!(sample.origin, SampleOrigin::Synthesized);
        assert!((sample.engagement_score - NEUTRAL_SCORE).abs() <= 2.0);
        for v in sample.component_scores.values() {
            assert!(*v >= 0.0 && *v <= 1.0);
        }
        assert!(!snapshot.history.is_empty());

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn camera_disable_ends_the_session_cleanly() {
        let analyzer = MockAnalyzer::new(true, success(82.0, Some(Vec::new())));
        let (sampler, _session_tx) = live_sampler();
        let feed = EngagementFeed::new();
        let (event_tx, _event_rx) = create_event_bus();

        let handle = spawn(analyzer.clone(), sampler, feed.clone(), event_tx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.phase, AnalyzerPhase::Polling);
        let sample = snapshot.sample.expect("live sample");
        assert_eq!(sample.engagement_score, 82.0);
        assert_eq!(snapshot.history.len(), HISTORY_CAP);
        assert_eq!(snapshot.history[0], 82.0);

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(feed.snapshot().phase, AnalyzerPhase::Idle);

        // No further analyze calls after cancellation, across several
        // would-be intervals.
        let calls = analyzer.call_count();
        tokio::time::sleep(POLL_INTERVAL * 3 + Duration::from_secs(1)).await;
        assert_eq!(analyzer.call_count(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_initialization_degrades_to_a_single_shot() {
        let analyzer = MockAnalyzer::new(false, success(64.0, None));
        let (sampler, _session_tx) = live_sampler();
        let feed = EngagementFeed::new();
        let (event_tx, _event_rx) = create_event_bus();

        let _handle = spawn(analyzer.clone(), sampler, feed.clone(), event_tx);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(feed.snapshot().phase, AnalyzerPhase::Degraded);
        assert_eq!(analyzer.call_count(), 1);
        let sample = feed.snapshot().sample.expect("single-shot sample");
        assert_eq!(sample.engagement_score, 64.0);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_result_is_discarded_after_cancellation() {
        let analyzer =
            MockAnalyzer::with_delay(true, success(91.0, None), Duration::from_secs(5));
        let (sampler, _session_tx) = live_sampler();
        let feed = EngagementFeed::new();
        let (event_tx, _event_rx) = create_event_bus();

        let handle = spawn(analyzer.clone(), sampler, feed.clone(), event_tx);

        // Let the immediate poll enter its 5s analyze call, then cancel
        // while it is still in flight.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(analyzer.call_count(), 1);
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(feed.snapshot().sample, None);
        assert_eq!(analyzer.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn capture_skips_do_not_call_the_analyzer() {
        let analyzer = MockAnalyzer::new(true, success(70.0, None));
        // Camera flag off: every capture returns a skip reason.
        let sink = VideoSink::new();
        let (_tx, rx) = watch::channel(ClassSessionState::default());
        let sampler = FrameSampler::new(sink, rx);
        let feed = EngagementFeed::new();
        let (event_tx, _event_rx) = create_event_bus();

        let handle = spawn(analyzer.clone(), sampler, feed.clone(), event_tx);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(analyzer.call_count(), 0);
        assert!(feed.snapshot().sample.is_none());

        handle.cancel();
    }
}
