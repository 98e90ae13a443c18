//! SwiftRefund: records customer reviews, classifies their sentiment and
//! opens an expedited refund for every negative one.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod sentiment;
pub mod utils;

pub use config::AppConfig;
pub use db::Database;
pub use error::ServiceError;
pub use sentiment::Classifier;
