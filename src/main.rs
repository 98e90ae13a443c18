use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use swiftrefund::{api, utils, AppConfig, Classifier, Database};
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so a RUST_LOG from .env reaches the subscriber
    let config = AppConfig::from_env()?;
    utils::logging::init()?;
    utils::panic_hook::init();

    // Initialize the database
    let db = Database::open(&config)?;
    db.create_schema().await?; // Ensure the schema is created
    info!("Schema created successfully!");

    let db = web::Data::new(db);
    let classifier = web::Data::new(Classifier::default());

    let (host, port) = config.bind_addr();
    info!("listening on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(classifier.clone())
            .configure(api::configure)
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
