use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// A reusable structural pattern that successful short-form videos follow.
/// Read-only reference data, seeded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViralFormatTemplate {
    pub format_id: String,
    pub name: String,
    pub description: String,
    pub platform_fit: Vec<String>,
    pub duration_range: (u32, u32),
    pub structure: Vec<SegmentTemplate>,
    pub tags: Vec<String>,
    pub viral_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentTemplate {
    pub segment: String,
    pub duration: u32,
    pub script_template: String,
    pub visual_guide: String,
    pub required: bool,
}

fn seg(segment: &str, duration: u32, script: &str, visual: &str, required: bool) -> SegmentTemplate {
    SegmentTemplate {
        segment: segment.to_string(),
        duration,
        script_template: script.to_string(),
        visual_guide: visual.to_string(),
        required,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn catalog() -> &'static [ViralFormatTemplate] {
    static CATALOG: OnceLock<Vec<ViralFormatTemplate>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

fn build_catalog() -> Vec<ViralFormatTemplate> {
    vec![
        ViralFormatTemplate {
            format_id: "yc_demo_classic".into(),
            name: "YC Demo Day Classic".into(),
            description:
                "The classic Y Combinator demo video format - problem, solution, demo, traction"
                    .into(),
            platform_fit: strings(&["YouTube", "LinkedIn", "Twitter"]),
            duration_range: (60, 180),
            structure: vec![
                seg(
                    "hook",
                    5,
                    "We're [Company Name] and we're [solving X problem] for [Y audience]",
                    "Founder speaking directly to camera, simple background",
                    true,
                ),
                seg(
                    "problem",
                    15,
                    "Today, [target audience] struggle with [specific problem]. This costs them [quantifiable impact]",
                    "Show the problem - screen recordings, statistics, user testimonials",
                    true,
                ),
                seg(
                    "solution",
                    10,
                    "We built [product name] to solve this. Here's how it works...",
                    "Product logo, quick overview shot",
                    true,
                ),
                seg(
                    "demo",
                    30,
                    "Let me show you... [walk through 2-3 key features]",
                    "Screen recording of product in action, narrated walkthrough",
                    true,
                ),
                seg(
                    "traction",
                    10,
                    "We've helped [X users/companies] achieve [Y result]",
                    "Show metrics, testimonials, growth charts",
                    true,
                ),
                seg(
                    "call_to_action",
                    5,
                    "Try [product] at [website] and [specific CTA]",
                    "Simple card with website and CTA",
                    true,
                ),
            ],
            tags: strings(&["b2b", "saas", "startup", "demo", "professional"]),
            viral_score: 85,
        },
        ViralFormatTemplate {
            format_id: "cluely_launch".into(),
            name: "Cluely Launch Style".into(),
            description:
                "Fast-paced, personality-driven product launch video with quick cuts and energy"
                    .into(),
            platform_fit: strings(&["TikTok", "Instagram", "Twitter"]),
            duration_range: (30, 60),
            structure: vec![
                seg(
                    "hook",
                    3,
                    "POV: You just launched [product] and...",
                    "Energetic opener, founder with personality, quick zoom",
                    true,
                ),
                seg(
                    "problem_callout",
                    5,
                    "Everyone knows [common pain point] is broken",
                    "Fast cuts showing frustration, relatable moments",
                    true,
                ),
                seg(
                    "solution_reveal",
                    7,
                    "So we built [product] - it's [one-liner description]",
                    "Product reveal with visual flair, logo animation",
                    true,
                ),
                seg(
                    "key_features",
                    20,
                    "You can [feature 1], [feature 2], and [feature 3]",
                    "Rapid screen recordings, text overlays highlighting features",
                    true,
                ),
                seg(
                    "social_proof",
                    5,
                    "[X] people are already using it",
                    "Show user count, testimonials, or usage clips",
                    false,
                ),
                seg(
                    "cta",
                    5,
                    "Link in bio / Go to [website]",
                    "End card with clear CTA and website",
                    true,
                ),
            ],
            tags: strings(&["consumer", "fast-paced", "personality", "viral", "short-form"]),
            viral_score: 92,
        },
        ViralFormatTemplate {
            format_id: "educational_tutorial".into(),
            name: "Educational Tutorial Format".into(),
            description: "Step-by-step tutorial format for teaching skills or product usage".into(),
            platform_fit: strings(&["YouTube", "Instagram", "TikTok"]),
            duration_range: (45, 120),
            structure: vec![
                seg(
                    "hook",
                    5,
                    "Want to [achieve X]? Here's how in [Y] steps",
                    "Show end result, create curiosity",
                    true,
                ),
                seg(
                    "intro",
                    5,
                    "I'm [name] and I'll show you exactly how to [do X]",
                    "Quick self-intro, establish credibility",
                    true,
                ),
                seg(
                    "step_1",
                    15,
                    "Step 1: [First step] - Here's why this matters...",
                    "Screen recording or demo of step 1",
                    true,
                ),
                seg(
                    "step_2",
                    15,
                    "Step 2: [Second step] - Pro tip: [insider advice]",
                    "Screen recording or demo of step 2",
                    true,
                ),
                seg(
                    "step_3",
                    15,
                    "Step 3: [Final step] - This is where most people mess up",
                    "Screen recording or demo of step 3",
                    true,
                ),
                seg(
                    "recap",
                    10,
                    "Quick recap: [1, 2, 3]. Now you can [achieve result]",
                    "Quick cuts of all steps",
                    true,
                ),
                seg(
                    "cta",
                    5,
                    "Save this for later, follow for more [niche] content",
                    "Subscribe/follow prompt",
                    true,
                ),
            ],
            tags: strings(&["educational", "tutorial", "how-to", "step-by-step"]),
            viral_score: 78,
        },
        ViralFormatTemplate {
            format_id: "before_after_transformation".into(),
            name: "Before/After Transformation".into(),
            description:
                "Show dramatic transformation or improvement using your product/method".into(),
            platform_fit: strings(&["TikTok", "Instagram", "YouTube"]),
            duration_range: (15, 60),
            structure: vec![
                seg(
                    "hook",
                    2,
                    "This is [before state]",
                    "Show problematic before state",
                    true,
                ),
                seg(
                    "before_context",
                    8,
                    "I was struggling with [problem] and nothing worked until...",
                    "More before footage, build empathy",
                    true,
                ),
                seg(
                    "transformation",
                    15,
                    "Then I tried [solution/product] and here's what happened",
                    "Show the process, product in action",
                    true,
                ),
                seg(
                    "after_reveal",
                    5,
                    "Now look at this [after state]",
                    "Dramatic after reveal",
                    true,
                ),
                seg("cta", 5, "Get [product] at [link]", "Product link and CTA", true),
            ],
            tags: strings(&["transformation", "before-after", "results", "testimonial"]),
            viral_score: 89,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<_> = catalog().iter().map(|f| f.format_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn every_template_has_a_required_hook() {
        for fmt in catalog() {
            assert!(
                fmt.structure.iter().any(|s| s.segment == "hook" && s.required),
                "{} is missing a hook segment",
                fmt.format_id
            );
        }
    }
}
