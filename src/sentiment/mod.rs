//! Comment sentiment classification
//!
//! A [`SentimentScorer`] turns text into a signed score; the
//! [`SentimentClassifier`] wraps a scorer with the empty-comment guard, the
//! labelling thresholds and failure fallback. Classification runs once, at
//! ingestion time.

pub mod lexicon;

pub use lexicon::LexiconScorer;

use std::sync::Arc;

use crate::config::SentimentConfig;
use crate::types::{Sentiment, SentimentLabel};

/// Errors a scorer may report. The classifier never propagates them.
#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("scorer unavailable: {0}")]
    Unavailable(String),
    #[error("scoring failed: {0}")]
    Failed(String),
}

/// Pluggable text → score function.
///
/// Implementations must be thread-safe; one instance is shared by every
/// request handler.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<f64, ScorerError>;

    /// Scorer name for logging.
    fn name(&self) -> &'static str;
}

/// Label boundaries. Both are exclusive: a score equal to a bound is neutral.
///
/// Records are not relabelled when the bounds change, so across a store the
/// label is a function of the score only while the bounds stay fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub positive_above: f64,
    pub negative_below: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            positive_above: 2.0,
            negative_below: -2.0,
        }
    }
}

impl From<&SentimentConfig> for Thresholds {
    fn from(cfg: &SentimentConfig) -> Self {
        Self {
            positive_above: cfg.positive_above,
            negative_below: cfg.negative_below,
        }
    }
}

impl Thresholds {
    pub fn label_for(&self, score: f64) -> SentimentLabel {
        if score > self.positive_above {
            SentimentLabel::Positive
        } else if score < self.negative_below {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// Scorer plus thresholds. Cheap to clone.
#[derive(Clone)]
pub struct SentimentClassifier {
    scorer: Arc<dyn SentimentScorer>,
    thresholds: Thresholds,
}

impl std::fmt::Debug for SentimentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentClassifier")
            .field("scorer", &self.scorer.name())
            .field("thresholds", &self.thresholds)
            .finish()
    }
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        Self::new(Arc::new(LexiconScorer::new()), Thresholds::default())
    }
}

impl SentimentClassifier {
    pub fn new(scorer: Arc<dyn SentimentScorer>, thresholds: Thresholds) -> Self {
        Self { scorer, thresholds }
    }

    /// Lexicon classifier with the configured overrides and thresholds.
    pub fn from_config(config: &SentimentConfig) -> Self {
        let scorer = LexiconScorer::new().with_overrides(
            config
                .lexicon_overrides
                .iter()
                .map(|(word, score)| (word.as_str(), *score)),
        );
        Self::new(Arc::new(scorer), Thresholds::from(config))
    }

    pub const fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Classify a comment.
    ///
    /// Blank comments short-circuit to a neutral zero score without touching
    /// the scorer. A failing scorer degrades to the same neutral result.
    pub fn classify(&self, comment: &str) -> Sentiment {
        let text = comment.trim();
        if text.is_empty() {
            return Sentiment::NEUTRAL;
        }

        match self.scorer.score(text) {
            Ok(score) if score.is_finite() => Sentiment {
                score,
                label: self.thresholds.label_for(score),
            },
            Ok(score) => {
                tracing::warn!(
                    scorer = self.scorer.name(),
                    score,
                    "Scorer returned a non-finite score, treating comment as neutral"
                );
                Sentiment::NEUTRAL
            }
            Err(e) => {
                tracing::warn!(
                    scorer = self.scorer.name(),
                    error = %e,
                    "Sentiment scoring failed, treating comment as neutral"
                );
                Sentiment::NEUTRAL
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedScorer(f64);

    impl SentimentScorer for FixedScorer {
        fn score(&self, _text: &str) -> Result<f64, ScorerError> {
            Ok(self.0)
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingScorer;

    impl SentimentScorer for FailingScorer {
        fn score(&self, _text: &str) -> Result<f64, ScorerError> {
            Err(ScorerError::Failed("boom".to_string()))
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[derive(Default)]
    struct CountingScorer(AtomicUsize);

    impl SentimentScorer for CountingScorer {
        fn score(&self, _text: &str) -> Result<f64, ScorerError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(1.0)
        }
        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn with_score(score: f64) -> SentimentClassifier {
        SentimentClassifier::new(Arc::new(FixedScorer(score)), Thresholds::default())
    }

    #[test]
    fn test_blank_comment_is_neutral_without_scoring() {
        let counter = Arc::new(CountingScorer::default());
        let classifier = SentimentClassifier::new(counter.clone(), Thresholds::default());

        assert_eq!(classifier.classify(""), Sentiment::NEUTRAL);
        assert_eq!(classifier.classify("   \n\t"), Sentiment::NEUTRAL);
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);

        classifier.classify("fine");
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_threshold_boundaries_are_exclusive() {
        assert_eq!(with_score(2.0).classify("x").label, SentimentLabel::Neutral);
        assert_eq!(with_score(-2.0).classify("x").label, SentimentLabel::Neutral);
        assert_eq!(with_score(2.5).classify("x").label, SentimentLabel::Positive);
        assert_eq!(with_score(3.0).classify("x").label, SentimentLabel::Positive);
        assert_eq!(with_score(-3.0).classify("x").label, SentimentLabel::Negative);
        assert_eq!(with_score(0.0).classify("x").label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_label_is_function_of_score() {
        for raw in -12..=12 {
            let score = f64::from(raw) / 2.0;
            let s = with_score(score).classify("some text");
            assert_eq!(s.score, score);
            let expected = if score > 2.0 {
                SentimentLabel::Positive
            } else if score < -2.0 {
                SentimentLabel::Negative
            } else {
                SentimentLabel::Neutral
            };
            assert_eq!(s.label, expected, "score {score}");
        }
    }

    #[test]
    fn test_failing_scorer_degrades_to_neutral() {
        let classifier = SentimentClassifier::new(Arc::new(FailingScorer), Thresholds::default());
        assert_eq!(classifier.classify("terrible awful"), Sentiment::NEUTRAL);
    }

    #[test]
    fn test_non_finite_score_degrades_to_neutral() {
        assert_eq!(with_score(f64::NAN).classify("x"), Sentiment::NEUTRAL);
        assert_eq!(with_score(f64::INFINITY).classify("x"), Sentiment::NEUTRAL);
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier = SentimentClassifier::new(
            Arc::new(FixedScorer(0.3)),
            Thresholds {
                positive_above: 0.25,
                negative_below: -0.25,
            },
        );
        assert_eq!(classifier.classify("x").label, SentimentLabel::Positive);
    }

    #[test]
    fn test_from_config_applies_overrides() {
        let mut config = SentimentConfig::default();
        config.lexicon_overrides.insert("soggy".to_string(), -4);
        let classifier = SentimentClassifier::from_config(&config);
        let s = classifier.classify("soggy fries");
        assert_eq!(s.score, -4.0);
        assert_eq!(s.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_default_classifier_uses_lexicon() {
        let classifier = SentimentClassifier::default();
        let s = classifier.classify("The food was amazing and the staff were wonderful, loved it!");
        assert_eq!(s.label, SentimentLabel::Positive);
        let s = classifier.classify("Terrible service, cold food, awful experience.");
        assert_eq!(s.label, SentimentLabel::Negative);
        let s = classifier.classify("Wow, fabulous desserts!");
        assert_eq!((s.score, s.label), (8.0, SentimentLabel::Positive));
        let s = classifier.classify("Unhappy, I dislike this crap");
        assert_eq!((s.score, s.label), (-7.0, SentimentLabel::Negative));
    }
}
