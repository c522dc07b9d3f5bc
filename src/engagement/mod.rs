pub mod client;
pub mod poller;
pub mod sampler;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rand::Rng;
use serde::{Deserialize, Serialize};

use self::client::AnalysisPayload;

/// Score used when the analyzer omits a field and when no sample exists.
pub const NEUTRAL_SCORE: f64 = 75.0;

/// Rolling history length shown in the trend line.
pub const HISTORY_CAP: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

/// Whether a sample came from the analyzer service or was fabricated
/// locally while the service was unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleOrigin {
    Live,
    Synthesized,
}

/// One scored observation, fully populated: consumers never see missing
/// fields regardless of what the analyzer returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSample {
    pub seq: u64,
    pub engagement_score: f64,
    pub raw_score: f64,
    pub component_scores: HashMap<String, f64>,
    pub trend: Trend,
    pub origin: SampleOrigin,
}

/// Lifecycle of the analyzer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerPhase {
    #[default]
    Idle,
    Initializing,
    Polling,
    Degraded,
}

/// Read-only view of the engagement state handed to display surfaces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngagementSnapshot {
    pub phase: AnalyzerPhase,
    pub sample: Option<EngagementSample>,
    pub history: Vec<f64>,
}

/// Shared engagement state. The poller is the only writer; everyone
/// else receives snapshots.
#[derive(Clone, Default)]
pub struct EngagementFeed {
    inner: Arc<RwLock<EngagementSnapshot>>,
}

impl EngagementFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> EngagementSnapshot {
        self.inner.read().unwrap().clone()
    }

    pub fn last_sample(&self) -> Option<EngagementSample> {
        self.inner.read().unwrap().sample.clone()
    }

    /// New analyzer session: history is rebuilt from scratch.
    pub(crate) fn begin_session(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.phase = AnalyzerPhase::Initializing;
        inner.sample = None;
        inner.history.clear();
    }

    pub(crate) fn set_phase(&self, phase: AnalyzerPhase) {
        self.inner.write().unwrap().phase = phase;
    }

    /// Publish a sample together with a freshly derived history.
    pub(crate) fn publish_with_history(&self, sample: EngagementSample, history: Vec<f64>) {
        let mut inner = self.inner.write().unwrap();
        inner.history = history;
        inner.history.truncate(HISTORY_CAP);
        inner.sample = Some(sample);
    }

    /// Publish a sample, appending its score to the rolling history.
    pub(crate) fn publish_append(&self, sample: EngagementSample) {
        let mut inner = self.inner.write().unwrap();
        if inner.history.len() >= HISTORY_CAP {
            inner.history.remove(0);
        }
        inner.history.push(sample.engagement_score);
        inner.sample = Some(sample);
    }
}

/// The fixed neutral component set.
pub fn neutral_components() -> HashMap<String, f64> {
    HashMap::from([
        ("attention".to_string(), 0.8),
        ("emotion".to_string(), 0.7),
        ("posture".to_string(), 0.75),
        ("gaze".to_string(), 0.72),
    ])
}

fn neutral_sample(seq: u64) -> EngagementSample {
    EngagementSample {
        seq,
        engagement_score: NEUTRAL_SCORE,
        raw_score: NEUTRAL_SCORE,
        component_scores: neutral_components(),
        trend: Trend::Stable,
        origin: SampleOrigin::Synthesized,
    }
}

/// Normalize a successful analyzer response into a fully populated
/// sample plus the history to display. Missing fields get the neutral
/// defaults; an empty history is synthesized by jittering the current
/// score for three extra points.
pub fn normalize_analysis<R: Rng>(
    seq: u64,
    payload: &AnalysisPayload,
    rng: &mut R,
) -> (EngagementSample, Vec<f64>) {
    let engagement_score = payload
        .engagement_score
        .unwrap_or(NEUTRAL_SCORE)
        .clamp(0.0, 100.0);
    let raw_score = payload.raw_score.unwrap_or(NEUTRAL_SCORE).clamp(0.0, 100.0);

    let component_scores = match &payload.component_scores {
        Some(scores) if !scores.is_empty() => scores
            .iter()
            .map(|(k, v)| (k.clone(), v.clamp(0.0, 1.0)))
            .collect(),
        _ => neutral_components(),
    };

    let history = match &payload.history {
        Some(history) if !history.is_empty() => {
            // Keep the most recent points.
            let skip = history.len().saturating_sub(HISTORY_CAP);
            history[skip..].to_vec()
        }
        _ => {
            let jitter = |rng: &mut R| rng.gen_range(0..5) as f64;
            vec![
                engagement_score,
                (engagement_score - jitter(rng)).clamp(0.0, 100.0),
                (engagement_score + jitter(rng)).clamp(0.0, 100.0),
                (engagement_score - jitter(rng)).clamp(0.0, 100.0),
            ]
        }
    };

    let sample = EngagementSample {
        seq,
        engagement_score,
        raw_score,
        component_scores,
        trend: payload.trend.unwrap_or_default(),
        origin: SampleOrigin::Live,
    };

    (sample, history)
}

/// Fabricate the next sample as a small bounded random walk from the
/// last one (or the neutral default). Used only while no live sample
/// exists for the session.
pub fn synthesize_next<R: Rng>(
    seq: u64,
    last: Option<&EngagementSample>,
    rng: &mut R,
) -> EngagementSample {
    let base = last.cloned().unwrap_or_else(|| neutral_sample(seq));

    let delta = rng.gen_range(-2i32..=2) as f64;
    let engagement_score = (base.engagement_score + delta).clamp(0.0, 100.0);

    let trend = if delta > 0.0 {
        Trend::Increasing
    } else if delta < 0.0 {
        Trend::Decreasing
    } else {
        Trend::Stable
    };

    let component_scores = base
        .component_scores
        .iter()
        .map(|(k, v)| {
            let nudge = rng.gen_range(-0.02f64..=0.02);
            (k.clone(), (v + nudge).clamp(0.0, 1.0))
        })
        .collect();

    EngagementSample {
        seq,
        engagement_score,
        raw_score: engagement_score,
        component_scores,
        trend,
        origin: SampleOrigin::Synthesized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn rng() -> StepRng {
        StepRng::new(0, 1)
    }

    #[test]
    fn empty_payload_normalizes_to_neutral_defaults() {
        let payload = AnalysisPayload::default();
        let (sample, history) = normalize_analysis(1, &payload, &mut rand::thread_rng());

        assert_eq!(sample.engagement_score, NEUTRAL_SCORE);
        assert_eq!(sample.raw_score, NEUTRAL_SCORE);
        assert_eq!(sample.trend, Trend::Stable);
        assert_eq!(sample.component_scores, neutral_components());
        assert_eq!(sample.origin, SampleOrigin::Live);
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history[0], NEUTRAL_SCORE);
    }

    #[test]
    fn synthesized_history_starts_with_the_score_and_stays_near_it() {
        let payload = AnalysisPayload {
            engagement_score: Some(82.0),
            ..Default::default()
        };
        let (sample, history) = normalize_analysis(1, &payload, &mut rand::thread_rng());

        assert_eq!(sample.engagement_score, 82.0);
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history[0], 82.0);
        for point in &history {
            assert!((point - 82.0).abs() < 5.0, "history point {} too far", point);
        }
    }

    #[test]
    fn provided_history_is_kept_and_bounded() {
        let payload = AnalysisPayload {
            engagement_score: Some(60.0),
            history: Some(vec![40.0, 45.0, 50.0, 55.0, 58.0, 60.0]),
            ..Default::default()
        };
        let (_, history) = normalize_analysis(1, &payload, &mut rand::thread_rng());
        assert_eq!(history, vec![50.0, 55.0, 58.0, 60.0]);
    }

    #[test]
    fn out_of_range_fields_are_clamped() {
        let payload = AnalysisPayload {
            engagement_score: Some(140.0),
            raw_score: Some(-3.0),
            component_scores: Some(HashMap::from([("attention".to_string(), 1.7)])),
            ..Default::default()
        };
        let (sample, _) = normalize_analysis(1, &payload, &mut rand::thread_rng());
        assert_eq!(sample.engagement_score, 100.0);
        assert_eq!(sample.raw_score, 0.0);
        assert_eq!(sample.component_scores["attention"], 1.0);
    }

    #[test]
    fn synthesis_walks_within_bounds_and_derives_trend() {
        let mut sample = synthesize_next(1, None, &mut rng());
        assert!(sample.engagement_score >= NEUTRAL_SCORE - 2.0);
        assert!(sample.engagement_score <= NEUTRAL_SCORE + 2.0);
        assert_eq!(sample.origin, SampleOrigin::Synthesized);

        for seq in 2..50 {
            let next = synthesize_next(seq, Some(&sample), &mut rand::thread_rng());
            assert!((next.engagement_score - sample.engagement_score).abs() <= 2.0);
            assert!(next.engagement_score >= 0.0 && next.engagement_score <= 100.0);
            for v in next.component_scores.values() {
                assert!(*v >= 0.0 && *v <= 1.0);
            }
            let delta = next.engagement_score - sample.engagement_score;
            let expected = if delta > 0.0 {
                Trend::Increasing
            } else if delta < 0.0 {
                Trend::Decreasing
            } else {
                // Clamping can zero the applied delta; either label is
                // consistent with the walk.
                next.trend
            };
            assert_eq!(next.trend, expected);
            sample = next;
        }
    }

    #[test]
    fn feed_history_append_is_bounded() {
        let feed = EngagementFeed::new();
        feed.begin_session();
        for seq in 1..=6 {
            let mut sample = neutral_sample(seq);
            sample.engagement_score = seq as f64;
            feed.publish_append(sample);
        }
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.history, vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(snapshot.sample.unwrap().seq, 6);
    }
}
