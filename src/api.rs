use actix_web::error::{JsonPayloadError, UrlencodedError};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Database;
use crate::error::ServiceError;
use crate::models::{NewReview, NewTransaction, Sentiment, SubmitReviewRequest, SubmitReviewResponse};
use crate::sentiment::Classifier;

/// Maximum number of rows returned by the list endpoints.
pub const LIST_LIMIT: u32 = 100;

/// Largest request body accepted by `POST /submit_review`, JSON or form.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

const REFUND_MESSAGE: &str = "Refund expedited due to negative review";
const PROCESSED_MESSAGE: &str = "Review processed successfully";

const INDEX_HTML: &str = "<!DOCTYPE html>
<html>
<head><title>SwiftRefund</title></head>
<body>
<h1>SwiftRefund</h1>
<p>Submit reviews with <code>POST /submit_review</code>.</p>
</body>
</html>";

const DASHBOARD_HTML: &str = "<!DOCTYPE html>
<html>
<head><title>SwiftRefund Dashboard</title></head>
<body>
<h1>Dashboard</h1>
<p>See <code>/reviews</code>, <code>/transactions</code> and <code>/stats</code>.</p>
</body>
</html>";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RefundProcessed {
    pub message: String,
    pub transaction_id: i64,
}

/// Registers every route of the service along with the body extractor limits.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
        .app_data(
            web::JsonConfig::default()
                .limit(MAX_BODY_BYTES)
                .error_handler(json_error),
        )
        .app_data(
            web::FormConfig::default()
                .limit(MAX_BODY_BYTES)
                .error_handler(form_error),
        );

    cfg.route("/", web::get().to(index))
        .route("/dashboard", web::get().to(dashboard))
        .route("/submit_review", web::post().to(submit_review))
        .route("/reviews", web::get().to(list_reviews))
        .route("/transactions", web::get().to(list_transactions))
        .route("/process_refund/{id}", web::post().to(process_refund))
        .route("/stats", web::get().to(stats));
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ServiceError::InvalidBody {
        status: err.status_code(),
        message: err.to_string(),
    }
    .into()
}

fn form_error(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    ServiceError::InvalidBody {
        status: err.status_code(),
        message: err.to_string(),
    }
    .into()
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

pub async fn dashboard() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(DASHBOARD_HTML)
}

// Classify a review and open an expedited refund when it is negative
pub async fn submit_review(
    db: web::Data<Database>,
    classifier: web::Data<Classifier>,
    body: web::Either<web::Json<SubmitReviewRequest>, web::Form<SubmitReviewRequest>>,
) -> Result<HttpResponse, ServiceError> {
    let request = match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    };
    let review_text = request
        .review_text()
        .ok_or_else(|| ServiceError::Validation("Review text is required".into()))?;
    let customer_id = request.customer_id_or_generate();

    let analysis = classifier.classify(review_text)?;
    let refund = (analysis.sentiment == Sentiment::Negative)
        .then(|| NewTransaction::expedited_refund(customer_id.clone(), request.amount()));

    let review = NewReview {
        customer_id,
        review_text: review_text.to_string(),
        sentiment: analysis.sentiment,
        polarity: analysis.polarity,
        subjectivity: analysis.subjectivity,
    };
    let recorded = db.insert_review(&review, refund.as_ref()).await?;

    let refund_triggered = recorded.transaction_id.is_some();
    info!(
        "[API] Review {} from {} classified {} (refund: {:?})",
        recorded.review_id, review.customer_id, analysis.sentiment, recorded.transaction_id
    );

    Ok(HttpResponse::Ok().json(SubmitReviewResponse {
        review_id: recorded.review_id,
        sentiment: analysis.sentiment,
        polarity: analysis.polarity,
        subjectivity: analysis.subjectivity,
        refund_triggered,
        message: if refund_triggered {
            REFUND_MESSAGE
        } else {
            PROCESSED_MESSAGE
        }
        .to_string(),
        transaction_id: recorded.transaction_id,
    }))
}

pub async fn list_reviews(db: web::Data<Database>) -> Result<HttpResponse, ServiceError> {
    let reviews = db.list_reviews(LIST_LIMIT).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

pub async fn list_transactions(db: web::Data<Database>) -> Result<HttpResponse, ServiceError> {
    let transactions = db.list_transactions(LIST_LIMIT).await?;
    Ok(HttpResponse::Ok().json(transactions))
}

/// Completes a refund. Unknown ids are not an error: nothing changes and the
/// response is the same as for a real transaction.
pub async fn process_refund(
    db: web::Data<Database>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let transaction_id = id.into_inner();
    let changed = db.complete_refund(transaction_id, Utc::now()).await?;
    if changed == 0 {
        info!("[API] Refund requested for unknown transaction {}", transaction_id);
    } else {
        info!("[API] Refund processed for transaction {}", transaction_id);
    }
    Ok(HttpResponse::Ok().json(RefundProcessed {
        message: "Refund processed successfully".to_string(),
        transaction_id,
    }))
}

pub async fn stats(db: web::Data<Database>) -> Result<HttpResponse, ServiceError> {
    let stats = db.stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
