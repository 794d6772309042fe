// src/api/mod.rs
pub mod chat;
pub mod director;
pub mod health;
pub mod shared;
pub mod suggestions;
pub mod trends;
pub mod videos;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(videos::configure)
            .configure(suggestions::configure)
            .configure(chat::configure)
            .configure(trends::configure)
            .configure(director::configure)
            .configure(health::configure),
    );
}
