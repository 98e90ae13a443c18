//! Sentiment classification.
//!
//! A [`SentimentScorer`] turns text into a polarity/subjectivity pair; the
//! [`Classifier`] maps polarity onto one of three labels with fixed
//! thresholds. The classifier is built once at startup and shared between
//! requests.

mod lexicon;

pub use lexicon::LexiconScorer;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::Sentiment;

/// Polarity strictly below this is negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.1;
/// Polarity strictly above this is positive.
pub const POSITIVE_THRESHOLD: f64 = 0.1;

/// Raw output of a scorer: polarity in [-1, 1], subjectivity in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub polarity: f64,
    pub subjectivity: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("scorer produced an invalid score (polarity {polarity}, subjectivity {subjectivity})")]
    InvalidScore { polarity: f64, subjectivity: f64 },
    #[error("scorer failed: {0}")]
    Backend(String),
}

/// Computes polarity and subjectivity for a piece of text.
///
/// Implementations must be deterministic for identical input.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<SentimentScore, ScorerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    pub polarity: f64,
    pub subjectivity: f64,
}

/// Maps a polarity onto a label. Both thresholds belong to `Neutral`.
pub fn label_for(polarity: f64) -> Sentiment {
    if polarity < NEGATIVE_THRESHOLD {
        Sentiment::Negative
    } else if polarity > POSITIVE_THRESHOLD {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

#[derive(Clone)]
pub struct Classifier {
    scorer: Arc<dyn SentimentScorer>,
}

impl Classifier {
    pub fn new(scorer: impl SentimentScorer + 'static) -> Self {
        Self {
            scorer: Arc::new(scorer),
        }
    }

    pub fn classify(&self, text: &str) -> Result<SentimentAnalysis, ScorerError> {
        let SentimentScore {
            polarity,
            subjectivity,
        } = self.scorer.score(text)?;
        if !polarity.is_finite() || !subjectivity.is_finite() {
            return Err(ScorerError::InvalidScore {
                polarity,
                subjectivity,
            });
        }
        let sentiment = label_for(polarity);
        tracing::debug!(%sentiment, polarity, subjectivity, "classified review text");
        Ok(SentimentAnalysis {
            sentiment,
            polarity,
            subjectivity,
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(LexiconScorer::default())
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl SentimentScorer for Fixed {
        fn score(&self, _text: &str) -> Result<SentimentScore, ScorerError> {
            Ok(SentimentScore {
                polarity: self.0,
                subjectivity: 0.5,
            })
        }
    }

    struct Broken;

    impl SentimentScorer for Broken {
        fn score(&self, _text: &str) -> Result<SentimentScore, ScorerError> {
            Err(ScorerError::Backend("model unavailable".into()))
        }
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(label_for(-0.1), Sentiment::Neutral);
        assert_eq!(label_for(0.1), Sentiment::Neutral);
        assert_eq!(label_for(0.0), Sentiment::Neutral);
        assert_eq!(label_for(-0.1000001), Sentiment::Negative);
        assert_eq!(label_for(0.1000001), Sentiment::Positive);
        assert_eq!(label_for(-1.0), Sentiment::Negative);
        assert_eq!(label_for(1.0), Sentiment::Positive);
    }

    #[test]
    fn classify_uses_scorer_output() {
        let analysis = Classifier::new(Fixed(-0.4)).classify("whatever").unwrap();
        assert_eq!(analysis.sentiment, Sentiment::Negative);
        assert_eq!(analysis.polarity, -0.4);
        assert_eq!(analysis.subjectivity, 0.5);
    }

    #[test]
    fn classify_propagates_scorer_failure() {
        let err = Classifier::new(Broken).classify("text").unwrap_err();
        assert!(matches!(err, ScorerError::Backend(_)));
    }

    #[test]
    fn classify_rejects_non_finite_scores() {
        let err = Classifier::new(Fixed(f64::NAN)).classify("text").unwrap_err();
        assert!(matches!(err, ScorerError::InvalidScore { .. }));
    }

    #[test]
    fn default_classifier_labels_obvious_text() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify("terrible, worst purchase ever").unwrap().sentiment,
            Sentiment::Negative
        );
        assert_eq!(
            classifier.classify("amazing, highly recommend").unwrap().sentiment,
            Sentiment::Positive
        );
        assert_eq!(
            classifier.classify("The package arrived on Tuesday.").unwrap().sentiment,
            Sentiment::Neutral
        );
    }
}
