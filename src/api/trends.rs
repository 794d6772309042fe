use crate::error::AppError;
use crate::services::trends::TrendsService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trends")
            .route("/current", web::get().to(current_trends))
            .route("/hashtags", web::get().to(trending_hashtags))
            .route("/formats", web::get().to(trending_formats))
            .route("/refresh", web::post().to(refresh_trends)),
    );
}

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    #[serde(default = "default_limit")]
    pub hashtag_limit: usize,
    #[serde(default = "default_include_formats")]
    pub include_formats: bool,
}

fn default_limit() -> usize {
    20
}

fn default_include_formats() -> bool {
    true
}

pub async fn current_trends(
    query: web::Query<TrendsQuery>,
    trends: web::Data<TrendsService>,
) -> Result<HttpResponse, AppError> {
    let limit = query.hashtag_limit.clamp(5, 50);
    let hashtags = trends.get_hashtags(limit).await;
    let formats = if query.include_formats {
        trends.get_formats().await
    } else {
        Vec::new()
    };

    Ok(HttpResponse::Ok().json(json!({
        "trending_hashtags": hashtags,
        "trending_formats": formats,
        "last_updated": trends.last_updated().await,
        "data_source": if trends.is_cached().await { "cached" } else { "fresh" },
    })))
}

#[derive(Debug, Deserialize)]
pub struct HashtagsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

pub async fn trending_hashtags(
    query: web::Query<HashtagsQuery>,
    trends: web::Data<TrendsService>,
) -> Result<HttpResponse, AppError> {
    let hashtags = trends.get_hashtags(query.limit.clamp(5, 50)).await;
    Ok(HttpResponse::Ok().json(json!({
        "hashtags": &hashtags,
        "count": hashtags.len(),
    })))
}

pub async fn trending_formats(
    trends: web::Data<TrendsService>,
) -> Result<HttpResponse, AppError> {
    let formats = trends.get_formats().await;
    Ok(HttpResponse::Ok().json(json!({
        "formats": &formats,
        "count": formats.len(),
    })))
}

pub async fn refresh_trends(
    trends: web::Data<TrendsService>,
) -> Result<HttpResponse, AppError> {
    let (hashtags_count, formats_count) = trends.force_refresh().await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Trends cache refreshed",
        "hashtags_count": hashtags_count,
        "formats_count": formats_count,
    })))
}
