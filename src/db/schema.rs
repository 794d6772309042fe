diesel::table! {
    videos (id) {
        id -> Uuid,
        session_id -> Varchar,
        filename -> Varchar,
        file_path -> Varchar,
        file_size -> Int8,
        mime_type -> Varchar,
        duration -> Nullable<Float8>,
        status -> Varchar,
        analysis_status -> Varchar,
        uploaded_at -> Timestamp,
    }
}

diesel::table! {
    suggestions (id) {
        id -> Uuid,
        video_id -> Uuid,
        session_id -> Varchar,
        kind -> Varchar,
        title -> Varchar,
        description -> Text,
        content -> Text,
        reasoning -> Text,
        confidence -> Float8,
        status -> Varchar,
        feedback -> Nullable<Text>,
        timestamp_secs -> Nullable<Float8>,
        edit_action -> Nullable<Varchar>,
        video_url -> Nullable<Varchar>,
        creator -> Nullable<Varchar>,
        metrics -> Nullable<Varchar>,
        position -> Int4,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    suggestion_events (id) {
        id -> Uuid,
        suggestion_id -> Uuid,
        action -> Varchar,
        feedback -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    chat_messages (id) {
        id -> Uuid,
        session_id -> Varchar,
        role -> Varchar,
        content -> Text,
        video_id -> Nullable<Uuid>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    director_projects (id) {
        id -> Uuid,
        user_goal -> Text,
        product_type -> Varchar,
        target_platform -> Varchar,
        matched_format -> Nullable<Jsonb>,
        shot_list -> Nullable<Jsonb>,
        uploaded_segments -> Jsonb,
        current_step -> Varchar,
        edited_path -> Nullable<Varchar>,
        exported_path -> Nullable<Varchar>,
        updated_at -> Timestamp,
    }
}

diesel::joinable!(suggestions -> videos (video_id));
diesel::joinable!(suggestion_events -> suggestions (suggestion_id));

diesel::allow_tables_to_appear_in_same_query!(
    videos,
    suggestions,
    suggestion_events,
    chat_messages,
    director_projects,
);
