use serde::Serialize;

use crate::services::format_catalog::{catalog, ViralFormatTemplate};

/// Weighted contributions. Platform fit dominates, product-type tags are
/// secondary, goal-text overlap and historical viral score trail behind.
const PLATFORM_POINTS: f64 = 40.0;
const TAG_POINTS_EACH: f64 = 10.0;
const TAG_POINTS_MAX: f64 = 30.0;
const KEYWORD_POINTS_EACH: f64 = 4.0;
const KEYWORD_POINTS_MAX: f64 = 20.0;
const VIRAL_POINTS_MAX: f64 = 10.0;

#[derive(Debug, Clone, Serialize)]
pub struct FormatMatch {
    pub format: &'static ViralFormatTemplate,
    pub score: f64,
    pub reasoning: String,
}

/// Pick the best-fitting template for the user's goal. Deterministic for
/// identical inputs; ties break to catalog insertion order.
pub fn match_format(goal_text: &str, product_type: &str, target_platform: &str) -> FormatMatch {
    let mut best: Option<FormatMatch> = None;

    for format in catalog() {
        let candidate = score_format(goal_text, product_type, target_platform, format);
        match &best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }

    best.expect("format catalog is never empty")
}

fn score_format(
    goal_text: &str,
    product_type: &str,
    target_platform: &str,
    format: &'static ViralFormatTemplate,
) -> FormatMatch {
    let mut score = 0.0;
    let mut signals: Vec<String> = Vec::new();

    let platform_hit = format
        .platform_fit
        .iter()
        .any(|p| p.eq_ignore_ascii_case(target_platform));
    if platform_hit {
        score += PLATFORM_POINTS;
        signals.push(format!("fits {}", target_platform));
    }

    let product_words = lowercase_words(product_type);
    let tag_hits: Vec<&str> = format
        .tags
        .iter()
        .map(String::as_str)
        .filter(|tag| product_words.iter().any(|w| w == tag))
        .collect();
    if !tag_hits.is_empty() {
        score += (tag_hits.len() as f64 * TAG_POINTS_EACH).min(TAG_POINTS_MAX);
        signals.push(format!("matches product tags: {}", tag_hits.join(", ")));
    }

    let goal_words = lowercase_words(goal_text);
    let descriptive = format!(
        "{} {} {}",
        format.name.to_lowercase(),
        format.description.to_lowercase(),
        format.tags.join(" ")
    );
    let descriptive_words = lowercase_words(&descriptive);
    let keyword_hits = goal_words
        .iter()
        .filter(|w| w.len() > 3 && descriptive_words.contains(w))
        .count();
    if keyword_hits > 0 {
        score += (keyword_hits as f64 * KEYWORD_POINTS_EACH).min(KEYWORD_POINTS_MAX);
        signals.push(format!("{} goal keywords overlap", keyword_hits));
    }

    score += format.viral_score as f64 / 100.0 * VIRAL_POINTS_MAX;

    let reasoning = if signals.is_empty() {
        format!(
            "{} is the strongest general-purpose fallback (viral score {}/100).",
            format.name, format.viral_score
        )
    } else {
        format!(
            "{} scored highest because it {} (viral score {}/100).",
            format.name,
            signals.join("; "),
            format.viral_score
        )
    };

    FormatMatch {
        format,
        score,
        reasoning,
    }
}

fn lowercase_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::format_catalog::catalog;

    #[test]
    fn matcher_is_deterministic() {
        let a = match_format("app demo for students", "consumer app", "TikTok");
        let b = match_format("app demo for students", "consumer app", "TikTok");
        assert_eq!(a.format.format_id, b.format.format_id);
        assert_eq!(a.score, b.score);
        assert_eq!(a.reasoning, b.reasoning);
    }

    #[test]
    fn platform_and_product_match_beats_templates_without_platform_fit() {
        // Scenario: TikTok consumer-app goal must select a TikTok template
        // with a consumer tag, scoring above every non-TikTok template.
        let m = match_format(
            "TikTok app demo for college students",
            "consumer app",
            "TikTok",
        );
        assert!(m.format.platform_fit.iter().any(|p| p == "TikTok"));
        assert!(m.format.tags.iter().any(|t| t == "consumer"));

        for fmt in catalog() {
            if !fmt.platform_fit.iter().any(|p| p == "TikTok") {
                let other = score_format(
                    "TikTok app demo for college students",
                    "consumer app",
                    "TikTok",
                    fmt,
                );
                assert!(
                    m.score > other.score,
                    "{} should not outscore the platform match",
                    fmt.format_id
                );
            }
        }
    }

    #[test]
    fn ties_break_to_catalog_order() {
        // A goal with no usable signal leaves only the viral-score term;
        // the winner must then be the highest-viral-score template, and for
        // equal scores the earlier catalog entry.
        let m = match_format("", "", "MySpace");
        let top = catalog()
            .iter()
            .max_by(|a, b| a.viral_score.cmp(&b.viral_score))
            .unwrap();
        assert_eq!(m.format.format_id, top.format_id);
    }

    #[test]
    fn reasoning_cites_matched_signals() {
        let m = match_format("product launch video", "consumer", "TikTok");
        assert!(m.reasoning.contains("TikTok"));
    }
}
