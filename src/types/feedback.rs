//! Feedback records and the rating vocabulary they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Restaurant id used when a submission does not name one.
pub const DEFAULT_RESTAURANT_ID: &str = "default";

// ============================================================================
// Ratings
// ============================================================================

/// A single category rating on the 3-point face scale.
///
/// Display glyphs (😊 😐 😞) belong to the presentation layer; on the wire the
/// symbolic names are used, with the glyphs accepted as input aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "positive_face", alias = "😊")]
    Positive,
    #[serde(rename = "neutral_face", alias = "😐")]
    Neutral,
    #[serde(rename = "negative_face", alias = "😞")]
    Negative,
}

impl Rating {
    pub const ALL: [Self; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    /// Ordinal score: positive 3, neutral 2, negative 1.
    pub const fn score(self) -> u8 {
        match self {
            Self::Positive => 3,
            Self::Neutral => 2,
            Self::Negative => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive_face",
            Self::Neutral => "neutral_face",
            Self::Negative => "negative_face",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the rating values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid rating (expected positive_face, neutral_face or negative_face)")]
pub struct InvalidRating(pub String);

impl FromStr for Rating {
    type Err = InvalidRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive_face" | "😊" => Ok(Self::Positive),
            "neutral_face" | "😐" => Ok(Self::Neutral),
            "negative_face" | "😞" => Ok(Self::Negative),
            other => Err(InvalidRating(other.to_string())),
        }
    }
}

/// The rated categories of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Service,
    Atmosphere,
}

impl Category {
    pub const ALL: [Self; 3] = [Self::Food, Self::Service, Self::Atmosphere];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Service => "service",
            Self::Atmosphere => "atmosphere",
        }
    }
}

/// The required rating triple. All three are present by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub food: Rating,
    pub service: Rating,
    pub atmosphere: Rating,
}

impl Ratings {
    pub const fn new(food: Rating, service: Rating, atmosphere: Rating) -> Self {
        Self {
            food,
            service,
            atmosphere,
        }
    }

    pub const fn get(&self, category: Category) -> Rating {
        match category {
            Category::Food => self.food,
            Category::Service => self.service,
            Category::Atmosphere => self.atmosphere,
        }
    }

    /// Mean ordinal score across the three categories (1.0 ..= 3.0).
    pub fn mean_score(&self) -> f64 {
        let total = u32::from(self.food.score())
            + u32::from(self.service.score())
            + u32::from(self.atmosphere.score());
        f64::from(total) / 3.0
    }
}

// ============================================================================
// Sentiment
// ============================================================================

/// Coarse three-way classification of a comment's tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(format!("unknown sentiment label '{other}'")),
        }
    }
}

/// Classifier output: the raw score and the label derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sentiment {
    pub score: f64,
    pub label: SentimentLabel,
}

impl Sentiment {
    /// Score for absent or blank comments.
    pub const NEUTRAL: Self = Self {
        score: 0.0,
        label: SentimentLabel::Neutral,
    };
}

// ============================================================================
// Records
// ============================================================================

/// A validated submission, ready to be persisted.
///
/// The store turns this into a [`FeedbackRecord`] by assigning `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub restaurant_id: String,
    pub ratings: Ratings,
    pub comment: String,
    pub sentiment: Sentiment,
}

/// A persisted feedback entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: String,
    pub restaurant_id: String,
    pub ratings: Ratings,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default)]
    pub sentiment_label: SentimentLabel,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn from_new(new: NewFeedback, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            restaurant_id: new.restaurant_id,
            ratings: new.ratings,
            comment: new.comment,
            sentiment_score: new.sentiment.score,
            sentiment_label: new.sentiment.label,
            created_at,
        }
    }

    /// Whether the record carries a non-blank comment.
    pub fn has_comment(&self) -> bool {
        !self.comment.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_scores() {
        assert_eq!(Rating::Positive.score(), 3);
        assert_eq!(Rating::Neutral.score(), 2);
        assert_eq!(Rating::Negative.score(), 1);
    }

    #[test]
    fn test_rating_accepts_glyph_aliases() {
        let r: Rating = serde_json::from_str("\"😊\"").unwrap();
        assert_eq!(r, Rating::Positive);
        let r: Rating = serde_json::from_str("\"negative_face\"").unwrap();
        assert_eq!(r, Rating::Negative);
        assert_eq!("😐".parse::<Rating>().unwrap(), Rating::Neutral);
        assert!("5 stars".parse::<Rating>().is_err());
    }

    #[test]
    fn test_rating_is_matched_exactly() {
        assert!(" 😊 ".parse::<Rating>().is_err());
        assert!("positive_face\n".parse::<Rating>().is_err());
        assert!("Positive_Face".parse::<Rating>().is_err());
        assert!(serde_json::from_str::<Rating>("\" neutral_face\"").is_err());
    }

    #[test]
    fn test_rating_serializes_symbolic_name() {
        let json = serde_json::to_string(&Rating::Neutral).unwrap();
        assert_eq!(json, "\"neutral_face\"");
    }

    #[test]
    fn test_mean_score() {
        let r = Ratings::new(Rating::Positive, Rating::Positive, Rating::Neutral);
        assert!((r.mean_score() - 8.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_wire_shape_is_camel_case() {
        let record = FeedbackRecord {
            id: "abc".to_string(),
            restaurant_id: DEFAULT_RESTAURANT_ID.to_string(),
            ratings: Ratings::new(Rating::Positive, Rating::Neutral, Rating::Negative),
            comment: "ok".to_string(),
            sentiment_score: 0.0,
            sentiment_label: SentimentLabel::Neutral,
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["restaurantId"], "default");
        assert_eq!(v["sentimentLabel"], "neutral");
        assert_eq!(v["ratings"]["atmosphere"], "negative_face");
        assert!(v.get("createdAt").is_some());
    }
}
