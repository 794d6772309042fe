use crate::db::models::ChatMessage;
use crate::db::schema::chat_messages;
use crate::db::DbPool;
use crate::error::{pool_error, AppError};
use crate::services::analysis;
use crate::services::llm::LlmClient;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/chat")
            .route("/message", web::post().to(send_message))
            .route("/history/{session_id}", web::get().to(get_history))
            .route("/history/{session_id}", web::delete().to(clear_history)),
    );
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    pub video_id: Option<Uuid>,
}

pub async fn send_message(
    body: web::Json<ChatRequest>,
    pool: web::Data<DbPool>,
    llm: web::Data<dyn LlmClient>,
) -> Result<HttpResponse, AppError> {
    if body.session_id.is_empty() || body.message.is_empty() {
        return Err(AppError::Validation(
            "session_id and message are required".into(),
        ));
    }

    let conn = &mut pool.get().await.map_err(pool_error)?;

    let video = match body.video_id {
        Some(id) => crate::db::schema::videos::table
            .filter(crate::db::schema::videos::id.eq(id))
            .first::<crate::db::models::Video>(conn)
            .await
            .optional()?,
        None => None,
    };

    let user_message = ChatMessage {
        id: Uuid::new_v4(),
        session_id: body.session_id.clone(),
        role: "user".to_string(),
        content: body.message.clone(),
        video_id: body.video_id,
        created_at: Utc::now().naive_utc(),
    };
    diesel::insert_into(chat_messages::table)
        .values(&user_message)
        .execute(conn)
        .await?;

    let reply = analysis::chat_reply(
        conn,
        llm.get_ref(),
        &body.session_id,
        &body.message,
        video.as_ref(),
    )
    .await?;

    let assistant_message = ChatMessage {
        id: Uuid::new_v4(),
        session_id: body.session_id.clone(),
        role: "assistant".to_string(),
        content: reply.clone(),
        video_id: body.video_id,
        created_at: Utc::now().naive_utc(),
    };
    diesel::insert_into(chat_messages::table)
        .values(&assistant_message)
        .execute(conn)
        .await?;

    log::info!("chat message processed for session {}", body.session_id);

    Ok(HttpResponse::Ok().json(json!({
        "message_id": assistant_message.id,
        "response": reply,
        "timestamp": assistant_message.created_at,
    })))
}

pub async fn get_history(
    path: web::Path<String>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let session = path.into_inner();
    let conn = &mut pool.get().await.map_err(pool_error)?;

    let messages = chat_messages::table
        .filter(chat_messages::session_id.eq(&session))
        .order_by(chat_messages::created_at.asc())
        .load::<ChatMessage>(conn)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "session_id": session,
        "messages": &messages,
        "count": messages.len(),
    })))
}

pub async fn clear_history(
    path: web::Path<String>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let session = path.into_inner();
    let conn = &mut pool.get().await.map_err(pool_error)?;

    let deleted = diesel::delete(chat_messages::table.filter(chat_messages::session_id.eq(&session)))
        .execute(conn)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Deleted {} messages", deleted),
        "deleted_count": deleted,
    })))
}
