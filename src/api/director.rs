use crate::config::AppConfig;
use crate::db::DbPool;
use crate::error::{pool_error, AppError};
use crate::services::director;
use crate::services::llm::LlmClient;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/director")
            .route("/project", web::post().to(create_project))
            .route("/message", web::post().to(project_message))
            .route("/upload-segment", web::post().to(upload_segment))
            .route("/project/{id}", web::get().to(get_project)),
    );
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub user_goal: String,
    pub product_type: String,
    pub target_platform: String,
}

pub async fn create_project(
    body: web::Json<CreateProjectRequest>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    if body.user_goal.is_empty() || body.target_platform.is_empty() {
        return Err(AppError::Validation(
            "user_goal and target_platform are required".into(),
        ));
    }

    let conn = &mut pool.get().await.map_err(pool_error)?;
    let (project, messages) = director::create_project(
        conn,
        &body.user_goal,
        &body.product_type,
        &body.target_platform,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "project": project,
        "messages": messages,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ProjectMessageRequest {
    pub project_id: Uuid,
    pub message: String,
}

pub async fn project_message(
    body: web::Json<ProjectMessageRequest>,
    pool: web::Data<DbPool>,
    llm: web::Data<dyn LlmClient>,
    config: web::Data<Arc<AppConfig>>,
) -> Result<HttpResponse, AppError> {
    if body.message.is_empty() {
        return Err(AppError::Validation("message is required".into()));
    }

    let conn = &mut pool.get().await.map_err(pool_error)?;
    let (project, reply) = director::handle_message(
        conn,
        llm.get_ref(),
        config.as_ref(),
        body.project_id,
        &body.message,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "project": &project,
        "response": reply,
        "current_step": project.current_step,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UploadSegmentRequest {
    pub project_id: Uuid,
    pub video_id: Uuid,
    pub shot_index: Option<usize>,
}

pub async fn upload_segment(
    body: web::Json<UploadSegmentRequest>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let conn = &mut pool.get().await.map_err(pool_error)?;
    let project =
        director::upload_segment(conn, body.project_id, body.video_id, body.shot_index).await?;

    Ok(HttpResponse::Ok().json(json!({
        "project": &project,
        "current_step": project.current_step,
    })))
}

pub async fn get_project(
    path: web::Path<Uuid>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let conn = &mut pool.get().await.map_err(pool_error)?;
    let project = director::get_project(conn, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}
