use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Sentiment;

/// Aggregate counters served by `GET /stats`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Stats {
    pub total_reviews: i64,
    /// Only labels with at least one review appear here.
    pub sentiment_distribution: BTreeMap<Sentiment, i64>,
    pub total_transactions: i64,
    /// Transactions with `priority = high`.
    pub expedited_refunds: i64,
    /// Transactions whose refund has not been processed yet.
    pub pending_refunds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_serializes_with_label_keys() {
        let mut stats = Stats {
            total_reviews: 3,
            ..Default::default()
        };
        stats.sentiment_distribution.insert(Sentiment::Negative, 2);
        stats.sentiment_distribution.insert(Sentiment::Positive, 1);

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["sentiment_distribution"]["negative"], 2);
        assert_eq!(value["sentiment_distribution"]["positive"], 1);
        assert!(value["sentiment_distribution"].get("neutral").is_none());
    }
}
