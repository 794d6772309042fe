use crate::config::AppConfig;
use crate::db::models::Video;
use crate::db::schema::videos;
use crate::db::DbPool;
use crate::error::{pool_error, AppError};
use crate::services::llm::LlmClient;
use crate::services::suggestion_store;
use crate::services::trends::TrendsService;
use crate::services::upload_assembler::{ChunkOutcome, UploadAssembler};
use crate::services::{analysis, media_tools};
use actix_web::{web, HttpResponse};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/videos")
            .route("/upload-chunk", web::post().to(upload_chunk))
            .route("/analyze", web::post().to(analyze_video))
            .route("/list/{session_id}", web::get().to(list_videos))
            .route("/{id}", web::get().to(get_video))
            .route("/{id}", web::delete().to(delete_video)),
    );
}

#[derive(Debug, Deserialize)]
pub struct ChunkUploadRequest {
    pub session_id: String,
    pub filename: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub chunk_data: String,
}

pub async fn upload_chunk(
    body: web::Json<ChunkUploadRequest>,
    assembler: web::Data<UploadAssembler>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    if body.session_id.is_empty() || body.filename.is_empty() {
        return Err(AppError::Validation(
            "session_id and filename are required".into(),
        ));
    }

    let outcome = assembler
        .submit_chunk(
            &body.session_id,
            &body.filename,
            body.chunk_index,
            body.total_chunks,
            &body.chunk_data,
        )
        .await?;

    match outcome {
        ChunkOutcome::InProgress { received, total } => Ok(HttpResponse::Ok().json(json!({
            "status": "in_progress",
            "chunks_received": received,
            "total_chunks": total,
            "message": format!("Chunk {}/{} received", body.chunk_index + 1, total),
        }))),
        ChunkOutcome::Completed { file_path, file_size } => {
            let duration = media_tools::probe_duration(&file_path).await.ok();

            let video = Video {
                id: Uuid::new_v4(),
                session_id: body.session_id.clone(),
                filename: body.filename.clone(),
                file_path: file_path.display().to_string(),
                file_size: file_size as i64,
                mime_type: "video/mp4".to_string(),
                duration,
                status: "complete".to_string(),
                analysis_status: "pending".to_string(),
                uploaded_at: chrono::Utc::now().naive_utc(),
            };

            let conn = &mut pool.get().await.map_err(pool_error)?;
            diesel::insert_into(videos::table)
                .values(&video)
                .execute(conn)
                .await?;

            log::info!("video uploaded and saved: {}", video.id);

            Ok(HttpResponse::Ok().json(json!({
                "status": "completed",
                "video_id": video.id,
                "video": video,
                "message": "Upload completed successfully",
            })))
        }
    }
}

pub async fn list_videos(
    path: web::Path<String>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let session = path.into_inner();
    let conn = &mut pool.get().await.map_err(pool_error)?;

    let video_list = videos::table
        .filter(videos::session_id.eq(&session))
        .order_by(videos::uploaded_at.asc())
        .load::<Video>(conn)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "videos": &video_list,
        "count": video_list.len(),
    })))
}

pub async fn get_video(
    path: web::Path<Uuid>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let conn = &mut pool.get().await.map_err(pool_error)?;
    let video = find_video(conn, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(video))
}

#[derive(Debug, Deserialize)]
pub struct VideoAnalysisRequest {
    pub video_id: Uuid,
    pub user_context: Option<String>,
    #[serde(default = "default_platform")]
    pub target_platform: String,
    pub target_audience: Option<String>,
}

fn default_platform() -> String {
    "TikTok".to_string()
}

pub async fn analyze_video(
    body: web::Json<VideoAnalysisRequest>,
    pool: web::Data<DbPool>,
    llm: web::Data<dyn LlmClient>,
    trends: web::Data<TrendsService>,
) -> Result<HttpResponse, AppError> {
    let conn = &mut pool.get().await.map_err(pool_error)?;
    let video = find_video(conn, body.video_id).await?;

    let mut user_context = body
        .user_context
        .clone()
        .unwrap_or_else(|| "Content creator looking to optimize a short-form video".to_string());
    if let Some(audience) = &body.target_audience {
        user_context.push_str(&format!(" | Target audience: {}", audience));
    }

    let hashtags = trends.get_hashtags(20).await;

    log::info!("starting analysis for video {}", video.id);
    let outcome = analysis::analyze_video(
        conn,
        llm.get_ref(),
        &video,
        &user_context,
        &body.target_platform,
        body.target_audience.as_deref(),
        &hashtags,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "video_id": video.id,
        "recommended_format": outcome.format.format,
        "format_reasoning": outcome.format.reasoning,
        "format_score": outcome.format.score,
        "suggestions": outcome.suggestions,
        "trending_hashtags_used": hashtags.iter().take(10).collect::<Vec<_>>(),
    })))
}

pub async fn delete_video(
    path: web::Path<Uuid>,
    pool: web::Data<DbPool>,
    config: web::Data<std::sync::Arc<AppConfig>>,
) -> Result<HttpResponse, AppError> {
    let video_id = path.into_inner();
    let conn = &mut pool.get().await.map_err(pool_error)?;
    let video = find_video(conn, video_id).await?;

    // File first, then rows; a dangling file is worse than a dangling row.
    let path = std::path::Path::new(&video.file_path);
    if path.starts_with(&config.storage.upload_path) && path.exists() {
        tokio::fs::remove_file(path).await?;
    }

    suggestion_store::delete_for_video(conn, video_id).await?;
    diesel::delete(videos::table.filter(videos::id.eq(video_id)))
        .execute(conn)
        .await?;

    log::info!("video {} deleted", video_id);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Video deleted successfully",
    })))
}

pub async fn find_video(
    conn: &mut diesel_async::AsyncPgConnection,
    video_id: Uuid,
) -> Result<Video, AppError> {
    videos::table
        .filter(videos::id.eq(video_id))
        .first::<Video>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::NotFound("video".into()))
}
