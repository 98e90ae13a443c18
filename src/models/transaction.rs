use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Sentiment;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
}

text_enum!(TransactionStatus, "status", {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
});

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    NotInitiated,
    Expedited,
    Processed,
}

text_enum!(RefundStatus, "refund_status", {
    NotInitiated => "not_initiated",
    Expedited => "expedited",
    Processed => "processed",
});

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
}

text_enum!(Priority, "priority", {
    Normal => "normal",
    High => "high",
});

/// A refund transaction.
///
/// The only automatic producer is a negative review, which creates the row as
/// `processing` / `expedited` / `high`. The manual refund action moves it to
/// `completed` / `processed` and stamps `processed_at`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub customer_id: String,
    pub amount: f64,
    pub status: TransactionStatus,
    pub refund_status: RefundStatus,
    pub review_id: Option<i64>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Values needed to insert a transaction; the database layer links it to a review.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub customer_id: String,
    pub amount: f64,
    pub status: TransactionStatus,
    pub refund_status: RefundStatus,
    pub priority: Priority,
}

impl NewTransaction {
    /// The refund opened automatically for a negative review.
    pub fn expedited_refund(customer_id: impl Into<String>, amount: f64) -> Self {
        Self {
            customer_id: customer_id.into(),
            amount,
            status: TransactionStatus::Processing,
            refund_status: RefundStatus::Expedited,
            priority: Priority::High,
        }
    }
}

/// A transaction as listed by `GET /transactions`, joined with its originating review.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionRow {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub review_text: Option<String>,
    pub sentiment: Option<Sentiment>,
}
