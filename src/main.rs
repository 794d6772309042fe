use actix_files::Files;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;

mod api;
mod config;
mod db;
mod error;
mod services;

use services::llm::{HttpLlmClient, LlmClient};
use services::trends::TrendsService;
use services::upload_assembler::UploadAssembler;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if it exists
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    // Load configuration
    let config = config::AppConfig::new().expect("Failed to load configuration");
    let config = Arc::new(config);

    log::info!(
        "Starting server on {}:{}",
        config.server.host,
        config.server.port
    );

    // Create storage directories if they don't exist
    tokio::fs::create_dir_all(&config.storage.upload_path)
        .await
        .expect("Failed to create upload directory");
    tokio::fs::create_dir_all(&config.storage.processed_path)
        .await
        .expect("Failed to create processed directory");

    // Create DB pool
    let pool = db::create_pool(&config.database.url, config.database.max_connections).await;

    let assembler = web::Data::new(UploadAssembler::new(
        config.storage.upload_path.clone(),
        config.storage.max_file_size,
        Duration::from_secs(config.upload.stale_after_secs),
    ));
    let trends = web::Data::new(TrendsService::from_config(&config));
    let llm: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::from_config(&config));
    let llm = web::Data::from(llm);

    let upload_path = config.storage.upload_path.clone();
    let c = config.clone();
    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .service(Files::new("/uploads", upload_path.clone()))
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(c.clone()))
            .app_data(assembler.clone())
            .app_data(trends.clone())
            .app_data(llm.clone())
            .wrap(actix_cors::Cors::permissive()) // Configure properly in production
            .configure(api::configure)
    })
    .bind((config.server.host.clone(), config.server.port))?
    .run()
    .await
}
