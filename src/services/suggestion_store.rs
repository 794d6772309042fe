use chrono::Utc;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use uuid::Uuid;

use crate::db::models::{Suggestion, SuggestionEvent};
use crate::db::schema::{suggestion_events, suggestions};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionAction {
    Accept,
    Reject,
}

impl SuggestionAction {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "accept" => Ok(SuggestionAction::Accept),
            "reject" => Ok(SuggestionAction::Reject),
            other => Err(AppError::Validation(format!(
                "action must be 'accept' or 'reject', got '{}'",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionAction::Accept => "accept",
            SuggestionAction::Reject => "reject",
        }
    }

    /// Target status. Every transition is an overwrite; there is no path
    /// back to `pending`.
    pub fn target_status(self) -> &'static str {
        match self {
            SuggestionAction::Accept => "accepted",
            SuggestionAction::Reject => "rejected",
        }
    }
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct SuggestionSummary {
    pub pending: i64,
    pub accepted: i64,
    pub rejected: i64,
}

impl SuggestionSummary {
    pub fn total(&self) -> i64 {
        self.pending + self.accepted + self.rejected
    }
}

/// What an action does to a suggestion in `current_status`: `None` when the
/// call is an idempotent repeat (same status, no new feedback), otherwise the
/// status to write. Accepted and rejected overwrite each other; nothing maps
/// back to `pending`.
pub fn resolve_transition(
    current_status: &str,
    action: SuggestionAction,
    feedback: Option<&str>,
) -> Option<&'static str> {
    if current_status == action.target_status() && feedback.is_none() {
        None
    } else {
        Some(action.target_status())
    }
}

/// Count statuses with one pass over the items.
pub fn summarize_items(items: &[Suggestion]) -> SuggestionSummary {
    let mut summary = SuggestionSummary::default();
    for item in items {
        match item.status.as_str() {
            "accepted" => summary.accepted += 1,
            "rejected" => summary.rejected += 1,
            _ => summary.pending += 1,
        }
    }
    summary
}

/// All suggestions for a video in insertion order.
pub async fn list_for_video(
    conn: &mut AsyncPgConnection,
    video: Uuid,
) -> Result<Vec<Suggestion>, AppError> {
    let items = suggestions::table
        .filter(suggestions::video_id.eq(video))
        .order_by(suggestions::position.asc())
        .load::<Suggestion>(conn)
        .await?;
    Ok(items)
}

pub async fn insert_batch(
    conn: &mut AsyncPgConnection,
    items: &[Suggestion],
) -> Result<(), AppError> {
    diesel::insert_into(suggestions::table)
        .values(items)
        .execute(conn)
        .await?;
    Ok(())
}

/// Apply an accept/reject action. Idempotent: re-applying the current status
/// returns the record unchanged. Accepted and rejected overwrite each other
/// (last write wins). Every call appends an audit event.
pub async fn record_action(
    conn: &mut AsyncPgConnection,
    suggestion_id: Uuid,
    action: SuggestionAction,
    feedback: Option<String>,
) -> Result<Suggestion, AppError> {
    let existing = suggestions::table
        .filter(suggestions::id.eq(suggestion_id))
        .first::<Suggestion>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::NotFound("suggestion".into()))?;

    let event = SuggestionEvent {
        id: Uuid::new_v4(),
        suggestion_id,
        action: action.as_str().to_string(),
        feedback: feedback.clone(),
        created_at: Utc::now().naive_utc(),
    };
    diesel::insert_into(suggestion_events::table)
        .values(&event)
        .execute(conn)
        .await?;

    let next_status = match resolve_transition(&existing.status, action, feedback.as_deref()) {
        Some(status) => status,
        None => return Ok(existing),
    };

    let updated = diesel::update(suggestions::table)
        .filter(suggestions::id.eq(suggestion_id))
        .set((
            suggestions::status.eq(next_status),
            suggestions::feedback.eq(feedback.or(existing.feedback)),
            suggestions::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result::<Suggestion>(conn)
        .await?;

    log::info!(
        "suggestion {} {}ed",
        suggestion_id,
        action.as_str()
    );
    Ok(updated)
}

pub async fn delete_for_video(
    conn: &mut AsyncPgConnection,
    video: Uuid,
) -> Result<(), AppError> {
    let ids: Vec<Uuid> = suggestions::table
        .filter(suggestions::video_id.eq(video))
        .select(suggestions::id)
        .load::<Uuid>(conn)
        .await?;

    diesel::delete(suggestion_events::table.filter(suggestion_events::suggestion_id.eq_any(&ids)))
        .execute(conn)
        .await?;
    diesel::delete(suggestions::table.filter(suggestions::video_id.eq(video)))
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(status: &str) -> Suggestion {
        Suggestion {
            id: Uuid::new_v4(),
            video_id: Uuid::new_v4(),
            session_id: "s".into(),
            kind: "script".into(),
            title: String::new(),
            description: String::new(),
            content: String::new(),
            reasoning: String::new(),
            confidence: 0.5,
            status: status.into(),
            feedback: None,
            timestamp_secs: None,
            edit_action: None,
            video_url: None,
            creator: None,
            metrics: None,
            position: 0,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn summary_counts_partition_the_items() {
        let items = vec![
            item("pending"),
            item("accepted"),
            item("accepted"),
            item("rejected"),
        ];
        let summary = summarize_items(&items);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.total(), items.len() as i64);
    }

    #[test]
    fn unknown_status_counts_as_pending() {
        let summary = summarize_items(&[item("weird")]);
        assert_eq!(summary.pending, 1);
    }

    #[test]
    fn action_parsing_rejects_unknown_verbs() {
        assert!(SuggestionAction::parse("accept").is_ok());
        assert!(SuggestionAction::parse("reject").is_ok());
        assert!(matches!(
            SuggestionAction::parse("maybe"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn actions_map_onto_terminal_statuses() {
        assert_eq!(SuggestionAction::Accept.target_status(), "accepted");
        assert_eq!(SuggestionAction::Reject.target_status(), "rejected");
    }

    #[test]
    fn repeated_accept_is_a_no_op() {
        assert_eq!(
            resolve_transition("accepted", SuggestionAction::Accept, None),
            None
        );
        assert_eq!(
            resolve_transition("rejected", SuggestionAction::Reject, None),
            None
        );
    }

    #[test]
    fn repeat_with_new_feedback_still_writes() {
        assert_eq!(
            resolve_transition("accepted", SuggestionAction::Accept, Some("nice")),
            Some("accepted")
        );
    }

    #[test]
    fn accepted_and_rejected_overwrite_each_other() {
        assert_eq!(
            resolve_transition("accepted", SuggestionAction::Reject, None),
            Some("rejected")
        );
        assert_eq!(
            resolve_transition("rejected", SuggestionAction::Accept, None),
            Some("accepted")
        );
    }

    #[test]
    fn pending_moves_to_the_action_status() {
        assert_eq!(
            resolve_transition("pending", SuggestionAction::Accept, None),
            Some("accepted")
        );
        assert_eq!(
            resolve_transition("pending", SuggestionAction::Reject, None),
            Some("rejected")
        );
    }
}
