use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Queryable, Insertable, Clone)]
#[diesel(table_name = crate::db::schema::videos)]
pub struct Video {
    pub id: Uuid,
    pub session_id: String,
    pub filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub duration: Option<f64>,
    pub status: String,
    pub analysis_status: String,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Queryable, Insertable, Clone)]
#[diesel(table_name = crate::db::schema::suggestions)]
pub struct Suggestion {
    pub id: Uuid,
    pub video_id: Uuid,
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub reasoning: String,
    #[serde(rename = "confidence_score")]
    pub confidence: f64,
    pub status: String,
    pub feedback: Option<String>,
    #[serde(rename = "timestamp")]
    pub timestamp_secs: Option<f64>,
    #[serde(rename = "action")]
    pub edit_action: Option<String>,
    pub video_url: Option<String>,
    pub creator: Option<String>,
    pub metrics: Option<String>,
    #[serde(skip)]
    pub position: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Queryable, Insertable, Clone)]
#[diesel(table_name = crate::db::schema::suggestion_events)]
pub struct SuggestionEvent {
    pub id: Uuid,
    pub suggestion_id: Uuid,
    pub action: String,
    pub feedback: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Queryable, Insertable, Clone)]
#[diesel(table_name = crate::db::schema::chat_messages)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub video_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Queryable, Insertable, AsChangeset, Clone)]
#[diesel(table_name = crate::db::schema::director_projects)]
pub struct DirectorProject {
    pub id: Uuid,
    pub user_goal: String,
    pub product_type: String,
    pub target_platform: String,
    pub matched_format: Option<serde_json::Value>,
    pub shot_list: Option<serde_json::Value>,
    pub uploaded_segments: serde_json::Value,
    pub current_step: String,
    pub edited_path: Option<String>,
    pub exported_path: Option<String>,
    pub updated_at: NaiveDateTime,
}
