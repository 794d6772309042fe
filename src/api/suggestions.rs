use crate::db::DbPool;
use crate::error::{pool_error, AppError};
use crate::services::export::{format_export, ExportTarget};
use crate::services::suggestion_store::{self, SuggestionAction};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/suggestions")
            .route("/action", web::post().to(suggestion_action))
            .route("/status/{video_id}", web::get().to(suggestions_status))
            .route("/export/{video_id}", web::get().to(export_suggestions))
            .route("/{video_id}", web::get().to(list_suggestions)),
    );
}

pub async fn list_suggestions(
    path: web::Path<Uuid>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let conn = &mut pool.get().await.map_err(pool_error)?;
    let items = suggestion_store::list_for_video(conn, path.into_inner()).await?;

    if items.is_empty() {
        return Err(AppError::NotFound("suggestions for this video".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "suggestions": &items,
        "count": items.len(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct SuggestionActionRequest {
    pub suggestion_id: Uuid,
    pub action: String,
    pub feedback: Option<String>,
}

pub async fn suggestion_action(
    body: web::Json<SuggestionActionRequest>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let action = SuggestionAction::parse(&body.action)?;
    let conn = &mut pool.get().await.map_err(pool_error)?;

    let updated =
        suggestion_store::record_action(conn, body.suggestion_id, action, body.feedback.clone())
            .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Suggestion {}ed successfully", action.as_str()),
        "updated_suggestion": updated,
    })))
}

pub async fn suggestions_status(
    path: web::Path<Uuid>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let video_id = path.into_inner();
    let conn = &mut pool.get().await.map_err(pool_error)?;
    let items = suggestion_store::list_for_video(conn, video_id).await?;

    if items.is_empty() {
        return Err(AppError::NotFound("suggestions for this video".into()));
    }

    let summary = suggestion_store::summarize_items(&items);
    Ok(HttpResponse::Ok().json(json!({
        "video_id": video_id,
        "total_suggestions": summary.total(),
        "status_summary": {
            "pending": summary.pending,
            "accepted": summary.accepted,
            "rejected": summary.rejected,
        },
        "suggestions": items,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_target")]
    pub target: String,
    /// When true only accepted suggestions are exported.
    #[serde(default)]
    pub accepted_only: bool,
}

fn default_target() -> String {
    "generic".to_string()
}

pub async fn export_suggestions(
    path: web::Path<Uuid>,
    query: web::Query<ExportQuery>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let target: ExportTarget = query.target.parse()?;
    let conn = &mut pool.get().await.map_err(pool_error)?;

    let mut items = suggestion_store::list_for_video(conn, path.into_inner()).await?;
    if query.accepted_only {
        items.retain(|s| s.status == "accepted");
    }

    let rendered = format_export(&items, target);
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(rendered))
}
