// src/models/review.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{round_amount, Priority, RefundStatus};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

text_enum!(Sentiment, "sentiment", {
    Negative => "negative",
    Neutral => "neutral",
    Positive => "positive",
});

/// A stored review. Reviews are never updated after insert.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Review {
    pub id: i64,
    pub customer_id: String,
    pub review_text: String,
    pub sentiment: Sentiment,
    pub polarity: f64,
    pub subjectivity: f64,
    pub created_at: DateTime<Utc>,
}

/// A review as listed by `GET /reviews`, joined with the refund it triggered (if any).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReviewRow {
    #[serde(flatten)]
    pub review: Review,
    pub transaction_id: Option<i64>,
    pub amount: Option<f64>,
    pub refund_status: Option<RefundStatus>,
    pub priority: Option<Priority>,
}

/// Values needed to insert a review; id and timestamp are assigned by the database layer.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub customer_id: String,
    pub review_text: String,
    pub sentiment: Sentiment,
    pub polarity: f64,
    pub subjectivity: f64,
}

/// Body of `POST /submit_review`, sent either as JSON or as a urlencoded form.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SubmitReviewRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub review: Option<String>,
    // Number or string; anything unparsable falls back to 0.
    #[serde(default)]
    pub amount: Option<Value>,
}

impl SubmitReviewRequest {
    /// Trimmed review text, or `None` when missing or blank.
    pub fn review_text(&self) -> Option<&str> {
        self.review
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// The supplied customer id, or a freshly generated one.
    pub fn customer_id_or_generate(&self) -> String {
        match self.customer_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("customer_{}", uuid::Uuid::new_v4().simple()),
        }
    }

    /// Refund amount, parsed leniently: negatives are kept as given, while
    /// missing, empty, non-numeric or non-finite values become 0.
    pub fn amount(&self) -> f64 {
        let parsed = match &self.amount {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        // Rounding overflows to infinity near f64::MAX
        match parsed.map(round_amount).filter(|amount| amount.is_finite()) {
            Some(amount) => amount,
            None => {
                if self.amount.is_some() {
                    tracing::warn!("[API] Unparsable amount {:?}, defaulting to 0", self.amount);
                }
                0.0
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmitReviewResponse {
    pub review_id: i64,
    pub sentiment: Sentiment,
    pub polarity: f64,
    pub subjectivity: f64,
    pub refund_triggered: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transaction_id: Option<i64>,
}
