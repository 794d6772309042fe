use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health_check)));
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "trendle-backend",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "features": {
            "chunked_upload": true,
            "video_analysis": true,
            "director_workflow": true,
            "trends": true,
        }
    }))
}
