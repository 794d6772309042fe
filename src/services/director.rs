use std::path::PathBuf;

use chrono::Utc;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::models::{ChatMessage, DirectorProject, Video};
use crate::db::schema::{chat_messages, director_projects, videos};
use crate::error::AppError;
use crate::services::format_catalog::ViralFormatTemplate;
use crate::services::format_matcher::match_format;
use crate::services::llm::LlmClient;
use crate::services::media_tools;

const DIRECTOR_SYSTEM_PROMPT: &str = "You are a Director AI for Trendle, a video creation platform. \
You guide users from a stated goal to a matched viral format, a shot list, recording guidance, and a final export. \
Be encouraging, clear, and strategic. Break complex tasks into simple steps.";

/// Workflow position. Every inbound message advances at most one step; the
/// dispatch in `handle_message` is a single match, so a second transition
/// per call is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Start,
    FormatMatched,
    ScriptPlanned,
    RecordingGuided,
    SegmentsUploaded,
    Edited,
    Exported,
}

impl WorkflowStep {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStep::Start => "start",
            WorkflowStep::FormatMatched => "format_matched",
            WorkflowStep::ScriptPlanned => "script_planned",
            WorkflowStep::RecordingGuided => "recording_guided",
            WorkflowStep::SegmentsUploaded => "segments_uploaded",
            WorkflowStep::Edited => "edited",
            WorkflowStep::Exported => "exported",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "start" => Ok(WorkflowStep::Start),
            "format_matched" => Ok(WorkflowStep::FormatMatched),
            "script_planned" => Ok(WorkflowStep::ScriptPlanned),
            "recording_guided" => Ok(WorkflowStep::RecordingGuided),
            "segments_uploaded" => Ok(WorkflowStep::SegmentsUploaded),
            "edited" => Ok(WorkflowStep::Edited),
            "exported" => Ok(WorkflowStep::Exported),
            other => Err(AppError::Validation(format!(
                "unknown workflow step '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotPlan {
    pub segment_name: String,
    pub duration: u32,
    pub script: String,
    pub visual_guide: String,
    pub required: bool,
    pub uploaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRef {
    pub shot_index: usize,
    pub video_id: Uuid,
    pub file_path: String,
}

/// Derive the concrete shot list from a matched template.
pub fn build_shot_list(template: &ViralFormatTemplate) -> Vec<ShotPlan> {
    template
        .structure
        .iter()
        .map(|seg| ShotPlan {
            segment_name: seg.segment.clone(),
            duration: seg.duration,
            script: seg.script_template.clone(),
            visual_guide: seg.visual_guide.clone(),
            required: seg.required,
            uploaded: false,
        })
        .collect()
}

pub fn next_pending_shot(shots: &[ShotPlan]) -> Option<(usize, &ShotPlan)> {
    shots.iter().enumerate().find(|(_, s)| !s.uploaded)
}

pub fn all_required_uploaded(shots: &[ShotPlan]) -> bool {
    shots.iter().filter(|s| s.required).all(|s| s.uploaded)
}

fn shot_list_message(shots: &[ShotPlan]) -> String {
    let mut lines = vec!["Here's your complete shot list:".to_string(), String::new()];
    for (i, shot) in shots.iter().enumerate() {
        lines.push(format!(
            "{}. {} ({}s)\n   Script: {}\n   Visual: {}",
            i + 1,
            shot.segment_name,
            shot.duration,
            shot.script,
            shot.visual_guide
        ));
    }
    let total: u32 = shots.iter().map(|s| s.duration).sum();
    lines.push(String::new());
    lines.push(format!(
        "Total duration: ~{} seconds. I'll guide you through recording each segment. Ready to start?",
        total
    ));
    lines.join("\n")
}

fn guidance_message(index: usize, shot: &ShotPlan) -> String {
    format!(
        "Let's record segment {}: {}\n\n\
Duration: {} seconds\n\
Script: {}\n\
How to film it: {}\n\n\
Tips: film in good lighting, hold the camera steady, speak with energy, \
and keep it within {} seconds. Upload the clip when you're ready.",
        index + 1,
        shot.segment_name,
        shot.duration,
        shot.script,
        shot.visual_guide,
        shot.duration
    )
}

fn parse_shots(project: &DirectorProject) -> Result<Vec<ShotPlan>, AppError> {
    match &project.shot_list {
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| AppError::Validation(format!("corrupt shot list: {}", e))),
        None => Ok(Vec::new()),
    }
}

fn parse_segments(project: &DirectorProject) -> Result<Vec<SegmentRef>, AppError> {
    serde_json::from_value(project.uploaded_segments.clone())
        .map_err(|e| AppError::Validation(format!("corrupt segment list: {}", e)))
}

pub async fn create_project(
    conn: &mut AsyncPgConnection,
    user_goal: &str,
    product_type: &str,
    target_platform: &str,
) -> Result<(DirectorProject, Vec<String>), AppError> {
    let matched = match_format(user_goal, product_type, target_platform);
    let shots = build_shot_list(matched.format);

    // Format matching and script planning collapse into one call: no extra
    // round trip between two steps the user never acts between.
    let project = DirectorProject {
        id: Uuid::new_v4(),
        user_goal: user_goal.to_string(),
        product_type: product_type.to_string(),
        target_platform: target_platform.to_string(),
        matched_format: Some(
            serde_json::to_value(matched.format)
                .map_err(|e| AppError::Validation(e.to_string()))?,
        ),
        shot_list: Some(
            serde_json::to_value(&shots).map_err(|e| AppError::Validation(e.to_string()))?,
        ),
        uploaded_segments: serde_json::Value::Array(Vec::new()),
        current_step: WorkflowStep::ScriptPlanned.as_str().to_string(),
        edited_path: None,
        exported_path: None,
        updated_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(director_projects::table)
        .values(&project)
        .execute(conn)
        .await?;

    let format_message = format!(
        "I found the ideal format for your video: {}. {} {}",
        matched.format.name, matched.format.description, matched.reasoning
    );
    let plan_message = shot_list_message(&shots);

    save_message(conn, &project.id.to_string(), "assistant", &format_message).await?;
    save_message(conn, &project.id.to_string(), "assistant", &plan_message).await?;

    log::info!(
        "director project {} created with format {}",
        project.id,
        matched.format.format_id
    );

    Ok((project, vec![format_message, plan_message]))
}

pub async fn get_project(
    conn: &mut AsyncPgConnection,
    project_id: Uuid,
) -> Result<DirectorProject, AppError> {
    director_projects::table
        .filter(director_projects::id.eq(project_id))
        .first::<DirectorProject>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::NotFound("project".into()))
}

/// Advance the workflow for one inbound user message. At most one step
/// transition and at most one LLM call happen per invocation.
pub async fn handle_message(
    conn: &mut AsyncPgConnection,
    llm: &dyn LlmClient,
    config: &AppConfig,
    project_id: Uuid,
    message: &str,
) -> Result<(DirectorProject, String), AppError> {
    let mut project = get_project(conn, project_id).await?;
    let step = WorkflowStep::parse(&project.current_step)?;
    let session = project.id.to_string();

    save_message(conn, &session, "user", message).await?;

    let mut shots = parse_shots(&project)?;
    let (next_step, reply) = match step {
        WorkflowStep::Start | WorkflowStep::FormatMatched => {
            // Projects created through the API land at script_planned; a row
            // stuck earlier gets its plan rebuilt here.
            let matched = match_format(
                &project.user_goal,
                &project.product_type,
                &project.target_platform,
            );
            shots = build_shot_list(matched.format);
            project.matched_format = Some(
                serde_json::to_value(matched.format)
                    .map_err(|e| AppError::Validation(e.to_string()))?,
            );
            (WorkflowStep::ScriptPlanned, shot_list_message(&shots))
        }
        WorkflowStep::ScriptPlanned => match next_pending_shot(&shots) {
            Some((index, shot)) => (WorkflowStep::RecordingGuided, guidance_message(index, shot)),
            None => (
                WorkflowStep::SegmentsUploaded,
                "All segments are recorded. Send another message and I'll edit them together."
                    .to_string(),
            ),
        },
        WorkflowStep::RecordingGuided => {
            let reply = director_reply(conn, llm, &project, message).await?;
            (WorkflowStep::RecordingGuided, reply)
        }
        WorkflowStep::SegmentsUploaded => {
            let segments = parse_segments(&project)?;
            let files: Vec<PathBuf> = segments.iter().map(|s| PathBuf::from(&s.file_path)).collect();
            let merged = media_tools::merge_segments(
                &files,
                std::path::Path::new(&config.storage.processed_path),
                project.id,
            )
            .await
            .map_err(|e| AppError::MediaTool(e.to_string()))?;
            project.edited_path = Some(merged.display().to_string());
            (
                WorkflowStep::Edited,
                format!(
                    "Video editing complete: merged {} segments. Send another message and I'll optimize the result for {}.",
                    segments.len(),
                    project.target_platform
                ),
            )
        }
        WorkflowStep::Edited => {
            let edited = project
                .edited_path
                .clone()
                .ok_or_else(|| AppError::Validation("project has no edited video".into()))?;
            let exported = media_tools::optimize_for_platform(
                std::path::Path::new(&edited),
                std::path::Path::new(&config.storage.processed_path),
                project.id,
                &project.target_platform,
                &config.ffmpeg.preset,
            )
            .await
            .map_err(|e| AppError::MediaTool(e.to_string()))?;
            project.exported_path = Some(exported.display().to_string());
            (
                WorkflowStep::Exported,
                format!(
                    "Your video is ready, optimized for {}: {}",
                    project.target_platform,
                    exported.display()
                ),
            )
        }
        WorkflowStep::Exported => {
            let reply = director_reply(conn, llm, &project, message).await?;
            (WorkflowStep::Exported, reply)
        }
    };

    project.current_step = next_step.as_str().to_string();
    project.shot_list =
        Some(serde_json::to_value(&shots).map_err(|e| AppError::Validation(e.to_string()))?);
    project.updated_at = Utc::now().naive_utc();
    persist(conn, &project).await?;

    save_message(conn, &session, "assistant", &reply).await?;

    Ok((project, reply))
}

/// Register an uploaded segment against a shot. When every required shot has
/// footage the workflow moves to `segments_uploaded`.
pub async fn upload_segment(
    conn: &mut AsyncPgConnection,
    project_id: Uuid,
    video_id: Uuid,
    shot_index: Option<usize>,
) -> Result<DirectorProject, AppError> {
    let mut project = get_project(conn, project_id).await?;
    let step = WorkflowStep::parse(&project.current_step)?;

    let video = videos::table
        .filter(videos::id.eq(video_id))
        .first::<Video>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::NotFound("video".into()))?;

    let mut shots = parse_shots(&project)?;
    if shots.is_empty() {
        return Err(AppError::Validation(
            "project has no shot list yet".into(),
        ));
    }

    let index = match shot_index {
        Some(index) if index < shots.len() => index,
        Some(index) => {
            return Err(AppError::Validation(format!(
                "shot_index {} out of range for {} shots",
                index,
                shots.len()
            )))
        }
        None => {
            next_pending_shot(&shots)
                .map(|(i, _)| i)
                .ok_or_else(|| AppError::Validation("all shots already have footage".into()))?
        }
    };

    shots[index].uploaded = true;

    let mut segments = parse_segments(&project)?;
    segments.retain(|s| s.shot_index != index); // re-upload replaces
    segments.push(SegmentRef {
        shot_index: index,
        video_id,
        file_path: video.file_path.clone(),
    });
    segments.sort_by_key(|s| s.shot_index);

    if all_required_uploaded(&shots)
        && matches!(step, WorkflowStep::ScriptPlanned | WorkflowStep::RecordingGuided)
    {
        project.current_step = WorkflowStep::SegmentsUploaded.as_str().to_string();
    }

    project.shot_list =
        Some(serde_json::to_value(&shots).map_err(|e| AppError::Validation(e.to_string()))?);
    project.uploaded_segments =
        serde_json::to_value(&segments).map_err(|e| AppError::Validation(e.to_string()))?;
    project.updated_at = Utc::now().naive_utc();
    persist(conn, &project).await?;

    Ok(project)
}

async fn director_reply(
    conn: &mut AsyncPgConnection,
    llm: &dyn LlmClient,
    project: &DirectorProject,
    message: &str,
) -> Result<String, AppError> {
    let shots = parse_shots(project)?;
    let uploaded = shots.iter().filter(|s| s.uploaded).count();

    let format_name = project
        .matched_format
        .as_ref()
        .and_then(|f| f.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown");

    let history = chat_messages::table
        .filter(chat_messages::session_id.eq(project.id.to_string()))
        .order_by(chat_messages::created_at.desc())
        .limit(10)
        .load::<ChatMessage>(conn)
        .await?;

    let mut prompt = format!(
        "Current step: {}\nUser goal: {}\nFormat: {}\nRecording progress: {}/{} segments\n\n",
        project.current_step,
        project.user_goal,
        format_name,
        uploaded,
        shots.len()
    );
    for msg in history.iter().rev() {
        prompt.push_str(&format!("{}: {}\n", msg.role, msg.content));
    }
    prompt.push_str(&format!("user: {}", message));

    llm.complete(DIRECTOR_SYSTEM_PROMPT, &prompt).await
}

async fn persist(conn: &mut AsyncPgConnection, project: &DirectorProject) -> Result<(), AppError> {
    diesel::update(director_projects::table)
        .filter(director_projects::id.eq(project.id))
        .set(project)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn save_message(
    conn: &mut AsyncPgConnection,
    session_id: &str,
    role: &str,
    content: &str,
) -> Result<ChatMessage, AppError> {
    let message = ChatMessage {
        id: Uuid::new_v4(),
        session_id: session_id.to_string(),
        role: role.to_string(),
        content: content.to_string(),
        video_id: None,
        created_at: Utc::now().naive_utc(),
    };
    diesel::insert_into(chat_messages::table)
        .values(&message)
        .execute(conn)
        .await?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::format_catalog::catalog;

    #[test]
    fn step_names_round_trip() {
        for step in [
            WorkflowStep::Start,
            WorkflowStep::FormatMatched,
            WorkflowStep::ScriptPlanned,
            WorkflowStep::RecordingGuided,
            WorkflowStep::SegmentsUploaded,
            WorkflowStep::Edited,
            WorkflowStep::Exported,
        ] {
            assert_eq!(WorkflowStep::parse(step.as_str()).unwrap(), step);
        }
        assert!(WorkflowStep::parse("rewinding").is_err());
    }

    #[test]
    fn shot_list_mirrors_template_structure() {
        let template = &catalog()[0];
        let shots = build_shot_list(template);
        assert_eq!(shots.len(), template.structure.len());
        assert!(shots.iter().all(|s| !s.uploaded));
        assert_eq!(shots[0].segment_name, template.structure[0].segment);
    }

    #[test]
    fn next_pending_shot_walks_in_order() {
        let template = &catalog()[0];
        let mut shots = build_shot_list(template);
        assert_eq!(next_pending_shot(&shots).unwrap().0, 0);
        shots[0].uploaded = true;
        assert_eq!(next_pending_shot(&shots).unwrap().0, 1);
        for shot in &mut shots {
            shot.uploaded = true;
        }
        assert!(next_pending_shot(&shots).is_none());
    }

    #[test]
    fn optional_shots_do_not_block_completion() {
        // cluely_launch carries an optional social_proof segment.
        let template = catalog()
            .iter()
            .find(|f| f.format_id == "cluely_launch")
            .unwrap();
        let mut shots = build_shot_list(template);
        for shot in &mut shots {
            if shot.required {
                shot.uploaded = true;
            }
        }
        assert!(all_required_uploaded(&shots));
        assert!(next_pending_shot(&shots).is_some()); // the optional one
    }

    #[test]
    fn guidance_message_carries_script_and_duration() {
        let template = &catalog()[0];
        let shots = build_shot_list(template);
        let text = guidance_message(0, &shots[0]);
        assert!(text.contains(&shots[0].script));
        assert!(text.contains(&format!("{} seconds", shots[0].duration)));
    }
}
