use std::str::FromStr;

use crate::db::models::Suggestion;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    CapCut,
    IMovie,
    PremierePro,
    Generic,
}

impl FromStr for ExportTarget {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "capcut" => Ok(ExportTarget::CapCut),
            "imovie" => Ok(ExportTarget::IMovie),
            "premierepro" => Ok(ExportTarget::PremierePro),
            "generic" => Ok(ExportTarget::Generic),
            other => Err(AppError::Validation(format!(
                "unknown export target '{}'",
                other
            ))),
        }
    }
}

impl ExportTarget {
    fn header(self) -> &'static str {
        match self {
            ExportTarget::CapCut => "CapCut Edit Instructions",
            ExportTarget::IMovie => "iMovie Edit Instructions",
            ExportTarget::PremierePro => "Premiere Pro Edit Instructions",
            ExportTarget::Generic => "Edit Instructions",
        }
    }

    fn step_hint(self) -> &'static str {
        match self {
            ExportTarget::CapCut => "Open your clip in CapCut and apply each step on the timeline:",
            ExportTarget::IMovie => "Open your project in iMovie and apply each step:",
            ExportTarget::PremierePro => {
                "Open your sequence in Premiere Pro and apply each step:"
            }
            ExportTarget::Generic => "Apply each step in your editor of choice:",
        }
    }
}

/// Seconds as M:SS, the way editor timelines display positions.
fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Pure, deterministic rendering of timestamp suggestions into a paste-able
/// instruction sheet. Suggestions are sorted by timestamp ascending so two
/// invocations over the same set are byte-identical.
pub fn format_export(suggestions: &[Suggestion], target: ExportTarget) -> String {
    let mut timeline: Vec<&Suggestion> = suggestions
        .iter()
        .filter(|s| s.timestamp_secs.is_some())
        .collect();
    timeline.sort_by(|a, b| {
        a.timestamp_secs
            .partial_cmp(&b.timestamp_secs)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = String::new();
    out.push_str(target.header());
    out.push_str("\n\n");
    out.push_str(target.step_hint());
    out.push('\n');

    if timeline.is_empty() {
        out.push_str("\n(no timestamped edits)\n");
        return out;
    }

    for (i, s) in timeline.iter().enumerate() {
        let at = format_timestamp(s.timestamp_secs.unwrap_or(0.0));
        let action = s.edit_action.as_deref().unwrap_or("EDIT");
        out.push_str(&format!("\n{}. [{}] {} - {}\n", i + 1, at, action, s.title));
        if !s.content.is_empty() {
            out.push_str(&format!("   {}\n", s.content));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn ts_suggestion(title: &str, at: Option<f64>, action: Option<&str>) -> Suggestion {
        Suggestion {
            id: Uuid::new_v4(),
            video_id: Uuid::new_v4(),
            session_id: "s".into(),
            kind: "timestamp".into(),
            title: title.into(),
            description: String::new(),
            content: format!("do {}", title),
            reasoning: String::new(),
            confidence: 0.8,
            status: "pending".into(),
            feedback: None,
            timestamp_secs: at,
            edit_action: action.map(String::from),
            video_url: None,
            creator: None,
            metrics: None,
            position: 0,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn timestamps_render_as_minutes_and_padded_seconds() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(5.4), "0:05");
        assert_eq!(format_timestamp(65.0), "1:05");
        assert_eq!(format_timestamp(600.0), "10:00");
    }

    #[test]
    fn export_sorts_by_timestamp_ascending() {
        let items = vec![
            ts_suggestion("late", Some(90.0), Some("CUT")),
            ts_suggestion("early", Some(5.0), Some("TRIM")),
            ts_suggestion("middle", Some(30.0), Some("CUT")),
        ];
        let out = format_export(&items, ExportTarget::Generic);
        let early = out.find("early").unwrap();
        let middle = out.find("middle").unwrap();
        let late = out.find("late").unwrap();
        assert!(early < middle && middle < late);
    }

    #[test]
    fn export_is_deterministic() {
        let items = vec![
            ts_suggestion("a", Some(12.5), Some("CUT")),
            ts_suggestion("b", Some(3.0), None),
        ];
        let first = format_export(&items, ExportTarget::CapCut);
        let second = format_export(&items, ExportTarget::CapCut);
        assert_eq!(first, second);
        assert!(first.starts_with("CapCut Edit Instructions"));
    }

    #[test]
    fn untimestamped_suggestions_are_excluded() {
        let items = vec![
            ts_suggestion("keep", Some(1.0), Some("CUT")),
            ts_suggestion("skip", None, None),
        ];
        let out = format_export(&items, ExportTarget::IMovie);
        assert!(out.contains("keep"));
        assert!(!out.contains("skip"));
    }

    #[test]
    fn unknown_target_is_a_validation_error() {
        assert!(matches!(
            "finalcut".parse::<ExportTarget>(),
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            "premierepro".parse::<ExportTarget>().unwrap(),
            ExportTarget::PremierePro
        );
    }
}
