use crate::config::AppConfig;
use crate::models::{
    NewReview, NewTransaction, RefundStatus, Review, ReviewRow, Sentiment, Stats, Transaction,
    TransactionRow, TransactionStatus,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Error, Row};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Ids assigned when a review (and possibly its refund) is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedReview {
    pub review_id: i64,
    pub transaction_id: Option<i64>,
}

// Define a struct to represent a database connection
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    // Open (or create) the database at `db_path`
    pub fn new(db_path: &str) -> Result<Self, Error> {
        Self::from_connection(Connection::open(db_path)?, db_path)
    }

    // Open the configured database, applying the configured busy timeout
    pub fn open(config: &AppConfig) -> Result<Self, Error> {
        let settings = &config.database;
        debug!(
            "[DB] Opening database '{}' (host: {}, user: {}, password set: {})",
            settings.name,
            settings.host,
            settings.user,
            !settings.password.is_empty()
        );
        let path = settings.path();
        let conn = Connection::open(&path)?;
        conn.busy_timeout(settings.busy_timeout)?;
        Self::from_connection(conn, &path)
    }

    fn from_connection(conn: Connection, db_path: &str) -> Result<Self, Error> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        info!("Database connection established at: {}", db_path);
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // Create the database schema
    pub async fn create_schema(&self) -> Result<(), Error> {
        let conn = self.conn.lock().await;

        // 1. Reviews table
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id TEXT NOT NULL,
                review_text TEXT NOT NULL,
                sentiment TEXT NOT NULL
                    CHECK (sentiment IN ('negative', 'neutral', 'positive')),
                polarity REAL NOT NULL,
                subjectivity REAL NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_reviews_sentiment ON reviews (sentiment);
            CREATE INDEX IF NOT EXISTS idx_reviews_created_at ON reviews (created_at);",
        )
        .map_err(|e| {
            tracing::error!("Failed creating reviews table: {}", e);
            e
        })?;

        // 2. Transactions table. Deleting a review only unlinks its refund.
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id TEXT NOT NULL,
                amount REAL NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'pending',
                refund_status TEXT NOT NULL DEFAULT 'not_initiated',
                review_id INTEGER REFERENCES reviews (id) ON DELETE SET NULL,
                priority TEXT NOT NULL DEFAULT 'normal',
                created_at TEXT NOT NULL,
                processed_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_transactions_status ON transactions (status);
            CREATE INDEX IF NOT EXISTS idx_transactions_refund_status ON transactions (refund_status);
            CREATE INDEX IF NOT EXISTS idx_transactions_priority ON transactions (priority);
            CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions (created_at);",
        )
        .map_err(|e| {
            tracing::error!("Failed creating transactions table: {}", e);
            e
        })?;
        Ok(())
    }

    /// Stores a review and, when given, the refund it triggers. Both rows are
    /// written in one transaction: either both commit or neither does.
    pub async fn insert_review(
        &self,
        review: &NewReview,
        refund: Option<&NewTransaction>,
    ) -> Result<RecordedReview, Error> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let now = Utc::now();

        tx.execute(
            "INSERT INTO reviews (customer_id, review_text, sentiment, polarity, subjectivity, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                review.customer_id,
                review.review_text,
                review.sentiment,
                review.polarity,
                review.subjectivity,
                now,
            ],
        )?;
        let review_id = tx.last_insert_rowid();
        debug!("[DB] Inserted review {} ({})", review_id, review.sentiment);

        let transaction_id = match refund {
            Some(refund) => {
                tx.execute(
                    "INSERT INTO transactions
                        (customer_id, amount, status, refund_status, review_id, priority, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        refund.customer_id,
                        refund.amount,
                        refund.status,
                        refund.refund_status,
                        review_id,
                        refund.priority,
                        now,
                    ],
                )?;
                let id = tx.last_insert_rowid();
                debug!("[DB] Inserted transaction {} for review {}", id, review_id);
                Some(id)
            }
            None => None,
        };

        tx.commit()?;
        Ok(RecordedReview {
            review_id,
            transaction_id,
        })
    }

    // Newest reviews first, each with the refund it triggered (if any)
    pub async fn list_reviews(&self, limit: u32) -> Result<Vec<ReviewRow>, Error> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT r.id, r.customer_id, r.review_text, r.sentiment, r.polarity,
                    r.subjectivity, r.created_at,
                    t.id AS transaction_id, t.amount, t.refund_status, t.priority
             FROM reviews r
             LEFT JOIN transactions t ON t.review_id = r.id
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            Ok(ReviewRow {
                review: review_from_row(row)?,
                transaction_id: row.get("transaction_id")?,
                amount: row.get("amount")?,
                refund_status: row.get("refund_status")?,
                priority: row.get("priority")?,
            })
        })?;
        let result = rows.collect::<Result<Vec<_>, _>>()?;
        debug!("[DB] Fetched {} reviews", result.len());
        Ok(result)
    }

    // Newest transactions first, each with its originating review's text and label
    pub async fn list_transactions(&self, limit: u32) -> Result<Vec<TransactionRow>, Error> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT t.id, t.customer_id, t.amount, t.status, t.refund_status, t.review_id,
                    t.priority, t.created_at, t.processed_at,
                    r.review_text, r.sentiment
             FROM transactions t
             LEFT JOIN reviews r ON t.review_id = r.id
             ORDER BY t.created_at DESC, t.id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            Ok(TransactionRow {
                transaction: transaction_from_row(row)?,
                review_text: row.get("review_text")?,
                sentiment: row.get("sentiment")?,
            })
        })?;
        let result = rows.collect::<Result<Vec<_>, _>>()?;
        debug!("[DB] Fetched {} transactions", result.len());
        Ok(result)
    }

    pub async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>, Error> {
        let conn = self.conn.lock().await;
        match conn.query_row(
            "SELECT id, customer_id, amount, status, refund_status, review_id, priority,
                    created_at, processed_at
             FROM transactions WHERE id = ?1",
            [id],
            transaction_from_row,
        ) {
            Ok(transaction) => Ok(Some(transaction)),
            Err(Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Marks a refund as completed and returns the number of rows touched
    /// (0 for an unknown id). `processed_at` is stamped on every call.
    pub async fn complete_refund(&self, id: i64, at: DateTime<Utc>) -> Result<usize, Error> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE transactions
             SET status = ?1, refund_status = ?2, processed_at = ?3
             WHERE id = ?4",
            params![
                TransactionStatus::Completed,
                RefundStatus::Processed,
                at,
                id
            ],
        )?;
        debug!("[DB] Refund completion for transaction {} touched {} rows", id, changed);
        Ok(changed)
    }

    pub async fn stats(&self) -> Result<Stats, Error> {
        let conn = self.conn.lock().await;
        let count = |sql: &str| conn.query_row(sql, [], |row| row.get::<_, i64>(0));

        let total_reviews = count("SELECT COUNT(*) FROM reviews")?;
        let total_transactions = count("SELECT COUNT(*) FROM transactions")?;
        let expedited_refunds = count("SELECT COUNT(*) FROM transactions WHERE priority = 'high'")?;
        let pending_refunds =
            count("SELECT COUNT(*) FROM transactions WHERE refund_status != 'processed'")?;

        let mut stmt =
            conn.prepare("SELECT sentiment, COUNT(*) FROM reviews GROUP BY sentiment")?;
        let sentiment_distribution = stmt
            .query_map([], |row| Ok((row.get::<_, Sentiment>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Stats {
            total_reviews,
            sentiment_distribution,
            total_transactions,
            expedited_refunds,
            pending_refunds,
        })
    }
}

fn review_from_row(row: &Row<'_>) -> Result<Review, Error> {
    Ok(Review {
        id: row.get("id")?,
        customer_id: row.get("customer_id")?,
        review_text: row.get("review_text")?,
        sentiment: row.get("sentiment")?,
        polarity: row.get("polarity")?,
        subjectivity: row.get("subjectivity")?,
        created_at: row.get("created_at")?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> Result<Transaction, Error> {
    Ok(Transaction {
        id: row.get("id")?,
        customer_id: row.get("customer_id")?,
        amount: row.get("amount")?,
        status: row.get("status")?,
        refund_status: row.get("refund_status")?,
        review_id: row.get("review_id")?,
        priority: row.get("priority")?,
        created_at: row.get("created_at")?,
        processed_at: row.get("processed_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    // Helper function to create test database
    async fn create_test_db() -> Database {
        let db = Database::new(":memory:").unwrap();
        db.create_schema().await.unwrap();
        db
    }

    fn review(text: &str, sentiment: Sentiment, polarity: f64) -> NewReview {
        NewReview {
            customer_id: "customer_1".into(),
            review_text: text.into(),
            sentiment,
            polarity,
            subjectivity: 0.5,
        }
    }

    #[tokio::test]
    async fn test_schema_creation() {
        let db = create_test_db().await;
        // Creating twice is harmless
        db.create_schema().await.unwrap();

        let conn = db.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"reviews".to_string()));
        assert!(tables.contains(&"transactions".to_string()));
    }

    #[tokio::test]
    async fn test_review_with_refund() {
        let db = create_test_db().await;
        let refund = NewTransaction::expedited_refund("customer_1", 150.0);
        let recorded = db
            .insert_review(&review("awful", Sentiment::Negative, -1.0), Some(&refund))
            .await
            .unwrap();
        let transaction_id = recorded.transaction_id.expect("refund should be created");

        let stored = db.get_transaction(transaction_id).await.unwrap().unwrap();
        assert_eq!(stored.review_id, Some(recorded.review_id));
        assert_eq!(stored.status, TransactionStatus::Processing);
        assert_eq!(stored.refund_status, RefundStatus::Expedited);
        assert_eq!(stored.priority, Priority::High);
        assert_eq!(stored.amount, 150.0);
        assert!(stored.processed_at.is_none());

        let reviews = db.list_reviews(100).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review.review_text, "awful");
        assert_eq!(reviews[0].transaction_id, Some(transaction_id));
        assert_eq!(reviews[0].refund_status, Some(RefundStatus::Expedited));
        assert_eq!(reviews[0].priority, Some(Priority::High));

        let transactions = db.list_transactions(100).await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].review_text.as_deref(), Some("awful"));
        assert_eq!(transactions[0].sentiment, Some(Sentiment::Negative));
    }

    #[tokio::test]
    async fn test_review_without_refund() {
        let db = create_test_db().await;
        let recorded = db
            .insert_review(&review("lovely", Sentiment::Positive, 0.8), None)
            .await
            .unwrap();
        assert!(recorded.transaction_id.is_none());

        let reviews = db.list_reviews(100).await.unwrap();
        assert_eq!(reviews[0].transaction_id, None);
        assert_eq!(reviews[0].amount, None);
        assert_eq!(reviews[0].refund_status, None);
        assert!(db.list_transactions(100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refund_rolls_back_review() {
        let db = create_test_db().await;
        {
            let conn = db.conn.lock().await;
            conn.execute_batch(
                "CREATE TRIGGER reject_refunds BEFORE INSERT ON transactions
                 BEGIN SELECT RAISE(ABORT, 'refund rejected'); END;",
            )
            .unwrap();
        }

        let refund = NewTransaction::expedited_refund("customer_1", 10.0);
        let result = db
            .insert_review(&review("awful", Sentiment::Negative, -1.0), Some(&refund))
            .await;
        assert!(result.is_err());

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.total_transactions, 0);
    }

    #[tokio::test]
    async fn test_lists_are_newest_first_and_limited() {
        let db = create_test_db().await;
        for i in 0..5 {
            let refund = NewTransaction::expedited_refund("customer_1", i as f64);
            db.insert_review(
                &review(&format!("review {i}"), Sentiment::Negative, -0.5),
                Some(&refund),
            )
            .await
            .unwrap();
        }

        let reviews = db.list_reviews(3).await.unwrap();
        let texts: Vec<_> = reviews.iter().map(|r| r.review.review_text.as_str()).collect();
        assert_eq!(texts, ["review 4", "review 3", "review 2"]);

        let transactions = db.list_transactions(2).await.unwrap();
        let amounts: Vec<_> = transactions.iter().map(|t| t.transaction.amount).collect();
        assert_eq!(amounts, [4.0, 3.0]);
    }

    #[tokio::test]
    async fn test_complete_refund() {
        let db = create_test_db().await;
        let refund = NewTransaction::expedited_refund("customer_1", 20.0);
        let recorded = db
            .insert_review(&review("bad", Sentiment::Negative, -0.7), Some(&refund))
            .await
            .unwrap();
        let id = recorded.transaction_id.unwrap();

        let first = Utc::now();
        assert_eq!(db.complete_refund(id, first).await.unwrap(), 1);
        let stored = db.get_transaction(id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Completed);
        assert_eq!(stored.refund_status, RefundStatus::Processed);
        assert_eq!(stored.processed_at, Some(first));

        // Repeating leaves the state alone and restamps the completion time
        let later = first + chrono::Duration::seconds(30);
        assert_eq!(db.complete_refund(id, later).await.unwrap(), 1);
        let again = db.get_transaction(id).await.unwrap().unwrap();
        assert_eq!(again.status, TransactionStatus::Completed);
        assert_eq!(again.refund_status, RefundStatus::Processed);
        assert_eq!(again.processed_at, Some(later));
        assert!(again.processed_at >= stored.processed_at);
    }

    #[tokio::test]
    async fn test_complete_refund_unknown_id() {
        let db = create_test_db().await;
        assert_eq!(db.complete_refund(999, Utc::now()).await.unwrap(), 0);
        assert!(db.get_transaction(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleting_review_unlinks_refund() {
        let db = create_test_db().await;
        let refund = NewTransaction::expedited_refund("customer_1", 5.0);
        let recorded = db
            .insert_review(&review("broken", Sentiment::Negative, -0.4), Some(&refund))
            .await
            .unwrap();
        {
            let conn = db.conn.lock().await;
            conn.execute("DELETE FROM reviews WHERE id = ?1", [recorded.review_id])
                .unwrap();
        }

        let stored = db
            .get_transaction(recorded.transaction_id.unwrap())
            .await
            .unwrap()
            .expect("transaction must survive review deletion");
        assert_eq!(stored.review_id, None);

        let rows = db.list_transactions(100).await.unwrap();
        assert_eq!(rows[0].review_text, None);
        assert_eq!(rows[0].sentiment, None);
    }

    #[tokio::test]
    async fn test_stats() {
        let db = create_test_db().await;
        let stats = db.stats().await.unwrap();
        assert_eq!(stats, Stats::default());

        let refund = NewTransaction::expedited_refund("customer_1", 1.0);
        let negative = db
            .insert_review(&review("bad", Sentiment::Negative, -0.7), Some(&refund))
            .await
            .unwrap();
        db.insert_review(&review("worse", Sentiment::Negative, -0.4), Some(&refund))
            .await
            .unwrap();
        db.insert_review(&review("good", Sentiment::Positive, 0.7), None)
            .await
            .unwrap();
        db.complete_refund(negative.transaction_id.unwrap(), Utc::now())
            .await
            .unwrap();

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.sentiment_distribution.get(&Sentiment::Negative), Some(&2));
        assert_eq!(stats.sentiment_distribution.get(&Sentiment::Positive), Some(&1));
        assert_eq!(stats.sentiment_distribution.get(&Sentiment::Neutral), None);
        assert_eq!(
            stats.sentiment_distribution.values().sum::<i64>(),
            stats.total_reviews
        );
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(stats.expedited_refunds, 2);
        assert_eq!(stats.pending_refunds, 1);
    }
}
