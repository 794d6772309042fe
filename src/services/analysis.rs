use chrono::Utc;
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::{ChatMessage, Suggestion, Video};
use crate::db::schema::{chat_messages, videos};
use crate::error::AppError;
use crate::services::format_matcher::{match_format, FormatMatch};
use crate::services::llm::LlmClient;
use crate::services::suggestion_store;
use crate::services::trends::TrendingHashtag;

const ANALYST_SYSTEM_PROMPT: &str = "You are a personal director helping content creators make viral short-form videos. \
You provide advice on: 1) What content to create, 2) Where to cut (pauses, filler words like 'um', 'uh', awkward silences), \
3) Which trending audio to use, 4) How to structure their footage. \
Your advice is practical, specific, and focused on maximizing engagement. \
Always structure your suggestions as JSON with clear reasoning.";

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub format: FormatMatch,
    pub suggestions: Vec<Suggestion>,
}

/// Shape the model is asked to reply with. Optional everywhere: a partially
/// well-formed reply still yields usable suggestions.
#[derive(Debug, Deserialize)]
struct ParsedAnalysis {
    #[serde(default)]
    suggestions: Vec<ParsedSuggestion>,
}

#[derive(Debug, Deserialize)]
struct ParsedSuggestion {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    confidence_score: Option<f64>,
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    creator: Option<String>,
    #[serde(default)]
    metrics: Option<String>,
}

/// One-shot analysis: match a format, ask the model for suggestions once,
/// persist the batch. The video's analysis_status tracks the attempt.
pub async fn analyze_video(
    conn: &mut AsyncPgConnection,
    llm: &dyn LlmClient,
    video: &Video,
    user_context: &str,
    target_platform: &str,
    target_audience: Option<&str>,
    hashtags: &[TrendingHashtag],
) -> Result<AnalysisOutcome, AppError> {
    diesel::update(videos::table)
        .filter(videos::id.eq(video.id))
        .set(videos::analysis_status.eq("analyzing"))
        .execute(conn)
        .await?;

    let matched = match_format(user_context, target_audience.unwrap_or(""), target_platform);
    let prompt = build_analysis_prompt(video, user_context, target_platform, &matched, hashtags);

    let reply = match llm.complete(ANALYST_SYSTEM_PROMPT, &prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            diesel::update(videos::table)
                .filter(videos::id.eq(video.id))
                .set(videos::analysis_status.eq("failed"))
                .execute(conn)
                .await?;
            return Err(e);
        }
    };

    let parsed = parse_suggestions(&reply);
    let items = materialize_suggestions(video, parsed);

    suggestion_store::insert_batch(conn, &items).await?;

    diesel::update(videos::table)
        .filter(videos::id.eq(video.id))
        .set(videos::analysis_status.eq("completed"))
        .execute(conn)
        .await?;

    log::info!(
        "analysis completed for video {}: {} suggestions, format {}",
        video.id,
        items.len(),
        matched.format.format_id
    );

    Ok(AnalysisOutcome {
        format: matched,
        suggestions: items,
    })
}

fn build_analysis_prompt(
    video: &Video,
    user_context: &str,
    target_platform: &str,
    matched: &FormatMatch,
    hashtags: &[TrendingHashtag],
) -> String {
    let hashtag_summary = hashtags
        .iter()
        .take(10)
        .map(|h| h.hashtag.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let structure_summary = matched
        .format
        .structure
        .iter()
        .map(|s| format!("- {} ({}s): {}", s.segment, s.duration, s.script_template))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are analyzing a video for content optimization.\n\n\
**USER'S CONTEXT:** {user_context}\n\n\
**VIDEO INFO:**\n- Filename: {filename}\n- Duration: {duration} seconds\n- Target platform: {platform}\n\n\
**MATCHED FORMAT:** {format_name} - {format_description}\n{structure}\n\n\
**TRENDING HASHTAGS:** {hashtags}\n\n\
**YOUR TASK:**\n\
Act as their personal director and produce specific, actionable editing suggestions.\n\
Prioritize 4-6 timestamp-based cut suggestions (pauses, filler words, pacing), then audio/bgm picks, \
example videos worth studying, extra shots to film, and script or text-overlay improvements.\n\n\
Each suggestion must include a reasoning and a confidence score in [0, 1].\n\
For timestamp suggestions include \"timestamp\" (seconds) and \"action\" \
(CUT, TRIM, ADD_TEXT, TRANSITION or EMPHASIS).\n\
For example videos include \"video_url\", \"creator\" and \"metrics\".\n\n\
Respond with exactly this JSON shape and nothing else:\n\
{{\"suggestions\": [{{\"type\": \"audio|bgm|example_video|script|text_overlay|shot|timestamp|format\", \
\"title\": \"...\", \"description\": \"...\", \"content\": \"...\", \"reasoning\": \"...\", \
\"confidence_score\": 0.85, \"timestamp\": 12.5, \"action\": \"CUT\", \
\"video_url\": \"...\", \"creator\": \"...\", \"metrics\": \"...\"}}]}}\n\n\
Provide 10-14 diverse suggestions.",
        user_context = user_context,
        filename = video.filename,
        duration = video
            .duration
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown".into()),
        platform = target_platform,
        format_name = matched.format.name,
        format_description = matched.format.description,
        structure = structure_summary,
        hashtags = hashtag_summary,
    )
}

/// The model tends to wrap its JSON in prose; take the outermost object.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn parse_suggestions(reply: &str) -> Vec<ParsedSuggestion> {
    if let Some(json) = extract_json(reply) {
        match serde_json::from_str::<ParsedAnalysis>(json) {
            Ok(parsed) if !parsed.suggestions.is_empty() => return parsed.suggestions,
            Ok(_) => log::warn!("llm reply parsed but contained no suggestions, using fallback"),
            Err(e) => log::warn!("failed to parse llm reply as JSON ({}), using fallback", e),
        }
    } else {
        log::warn!("llm reply contained no JSON object, using fallback");
    }
    fallback_suggestions()
}

/// Deterministic stand-ins when the model reply is unusable. Never an empty
/// list presented as a completed analysis.
fn fallback_suggestions() -> Vec<ParsedSuggestion> {
    vec![
        ParsedSuggestion {
            kind: Some("script".into()),
            title: Some("Add Hook".into()),
            description: Some("Start with an attention-grabbing statement".into()),
            content: Some("Open with 'Stop scrolling!' or a surprising fact".into()),
            reasoning: Some("The first 3 seconds determine if viewers keep watching".into()),
            confidence_score: Some(0.85),
            timestamp: None,
            action: None,
            video_url: None,
            creator: None,
            metrics: None,
        },
        ParsedSuggestion {
            kind: Some("text_overlay".into()),
            title: Some("Add Key Points".into()),
            description: Some("Overlay text for the main message".into()),
            content: Some("Use bold text at 0:05, 0:15, 0:25".into()),
            reasoning: Some("80% of short-form video is watched without sound".into()),
            confidence_score: Some(0.9),
            timestamp: None,
            action: None,
            video_url: None,
            creator: None,
            metrics: None,
        },
    ]
}

fn materialize_suggestions(video: &Video, parsed: Vec<ParsedSuggestion>) -> Vec<Suggestion> {
    let now = Utc::now().naive_utc();
    parsed
        .into_iter()
        .enumerate()
        .map(|(i, p)| Suggestion {
            id: Uuid::new_v4(),
            video_id: video.id,
            session_id: video.session_id.clone(),
            kind: p.kind.unwrap_or_else(|| "unknown".into()),
            title: p.title.unwrap_or_default(),
            description: p.description.unwrap_or_default(),
            content: p.content.unwrap_or_default(),
            reasoning: p.reasoning.unwrap_or_default(),
            confidence: p.confidence_score.unwrap_or(0.5).clamp(0.0, 1.0),
            status: "pending".into(),
            feedback: None,
            timestamp_secs: p.timestamp,
            edit_action: p.action,
            video_url: p.video_url,
            creator: p.creator,
            metrics: p.metrics,
            position: i as i32,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

/// Conversational reply with accumulated context: recent history plus the
/// video being discussed, one model call per inbound message.
pub async fn chat_reply(
    conn: &mut AsyncPgConnection,
    llm: &dyn LlmClient,
    session_id: &str,
    message: &str,
    video: Option<&Video>,
) -> Result<String, AppError> {
    let history = recent_history(conn, session_id, 20).await?;

    let mut prompt = String::new();
    if let Some(video) = video {
        prompt.push_str(&format!(
            "[Context: the user is working on video '{}']\n\n",
            video.filename
        ));
    }
    for msg in &history {
        prompt.push_str(&format!("{}: {}\n", msg.role, msg.content));
    }
    prompt.push_str(&format!("user: {}", message));

    llm.complete(ANALYST_SYSTEM_PROMPT, &prompt).await
}

async fn recent_history(
    conn: &mut AsyncPgConnection,
    session: &str,
    limit: i64,
) -> Result<Vec<ChatMessage>, AppError> {
    let mut messages = chat_messages::table
        .filter(chat_messages::session_id.eq(session))
        .order_by(chat_messages::created_at.desc())
        .limit(limit)
        .load::<ChatMessage>(conn)
        .await?;
    messages.reverse(); // chronological
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_object_from_surrounding_prose() {
        let reply = "Sure! Here are my suggestions:\n{\"suggestions\": []}\nHope that helps.";
        assert_eq!(extract_json(reply), Some("{\"suggestions\": []}"));
    }

    #[test]
    fn well_formed_reply_parses_into_suggestions() {
        let reply = r#"{"suggestions": [
            {"type": "timestamp", "title": "Cut filler", "description": "Remove the um",
             "content": "Cut 'um' at 12.5s", "reasoning": "Pacing", "confidence_score": 0.9,
             "timestamp": 12.5, "action": "CUT"}
        ]}"#;
        let parsed = parse_suggestions(reply);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].kind.as_deref(), Some("timestamp"));
        assert_eq!(parsed[0].timestamp, Some(12.5));
        assert_eq!(parsed[0].action.as_deref(), Some("CUT"));
    }

    #[test]
    fn garbage_reply_degrades_to_fallback_set() {
        let parsed = parse_suggestions("I have no idea what you mean.");
        assert!(!parsed.is_empty());
        assert!(parsed.iter().all(|p| p.kind.is_some()));
    }

    #[test]
    fn truncated_json_also_degrades_to_fallback_set() {
        let parsed = parse_suggestions("{\"suggestions\": [{\"type\": \"scr");
        assert!(!parsed.is_empty());
    }

    #[test]
    fn materialized_suggestions_start_pending_with_stable_positions() {
        let video = Video {
            id: Uuid::new_v4(),
            session_id: "s1".into(),
            filename: "clip.mp4".into(),
            file_path: "uploads/clip.mp4".into(),
            file_size: 1,
            mime_type: "video/mp4".into(),
            duration: Some(30.0),
            status: "complete".into(),
            analysis_status: "pending".into(),
            uploaded_at: Utc::now().naive_utc(),
        };
        let items = materialize_suggestions(&video, fallback_suggestions());
        assert!(items.iter().all(|s| s.status == "pending"));
        let positions: Vec<i32> = items.iter().map(|s| s.position).collect();
        assert_eq!(positions, (0..items.len() as i32).collect::<Vec<_>>());
        assert!(items.iter().all(|s| (0.0..=1.0).contains(&s.confidence)));
    }
}
