use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingHashtag {
    pub hashtag: String,
    pub video_count: u64,
    pub engagement_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFormat {
    pub id: String,
    pub name: String,
    pub description: String,
    pub structure: String,
    pub examples: Vec<String>,
    pub best_practices: Vec<String>,
}

#[derive(Default)]
struct TrendsCache {
    hashtags: Vec<TrendingHashtag>,
    formats: Vec<ContentFormat>,
    last_updated: Option<DateTime<Utc>>,
}

/// Trend data is advisory: a failed fetch degrades to the static dataset
/// instead of failing the request. Cached values are served until they age
/// past the configured threshold.
pub struct TrendsService {
    cache: RwLock<TrendsCache>,
    ttl: Duration,
    feed_url: Option<String>,
    http: reqwest::Client,
}

impl TrendsService {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            cache: RwLock::new(TrendsCache::default()),
            ttl: Duration::from_secs(config.trends.cache_ttl_hours * 3600),
            feed_url: config.trends.feed_url.clone(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn get_hashtags(&self, limit: usize) -> Vec<TrendingHashtag> {
        {
            let cache = self.cache.read().await;
            if cache_is_fresh(cache.last_updated, self.ttl, Utc::now()) {
                return cache.hashtags.iter().take(limit).cloned().collect();
            }
        }
        self.refresh().await;
        let cache = self.cache.read().await;
        cache.hashtags.iter().take(limit).cloned().collect()
    }

    pub async fn get_formats(&self) -> Vec<ContentFormat> {
        {
            let cache = self.cache.read().await;
            if cache_is_fresh(cache.last_updated, self.ttl, Utc::now()) {
                return cache.formats.clone();
            }
        }
        self.refresh().await;
        self.cache.read().await.formats.clone()
    }

    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.cache.read().await.last_updated
    }

    pub async fn is_cached(&self) -> bool {
        cache_is_fresh(self.cache.read().await.last_updated, self.ttl, Utc::now())
    }

    /// Drop the cache and fetch fresh data. Reads always degrade to the
    /// curated dataset, but an explicit refresh against a configured feed
    /// that cannot be reached is reported as an error.
    pub async fn force_refresh(&self) -> Result<(usize, usize), AppError> {
        {
            let mut cache = self.cache.write().await;
            cache.last_updated = None;
        }
        let remote_ok = self.refresh().await;
        if self.feed_url.is_some() && !remote_ok {
            return Err(AppError::TrendsUnavailable(
                "trends feed unreachable, serving curated dataset".into(),
            ));
        }
        let cache = self.cache.read().await;
        Ok((cache.hashtags.len(), cache.formats.len()))
    }

    /// Returns whether the remote feed supplied the data.
    async fn refresh(&self) -> bool {
        let (hashtags, remote_ok) = match self.fetch_remote_hashtags().await {
            Some(fetched) if !fetched.is_empty() => {
                log::info!("fetched {} trending hashtags from feed", fetched.len());
                (fetched, true)
            }
            _ => {
                log::info!("using curated trending hashtags dataset");
                (fallback_hashtags(), false)
            }
        };

        let mut cache = self.cache.write().await;
        cache.hashtags = hashtags;
        cache.formats = curated_formats();
        cache.last_updated = Some(Utc::now());
        remote_ok
    }

    async fn fetch_remote_hashtags(&self) -> Option<Vec<TrendingHashtag>> {
        let url = self.feed_url.as_ref()?;
        match self
            .http
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
        {
            Ok(response) => match response.json::<Vec<TrendingHashtag>>().await {
                Ok(hashtags) => Some(hashtags),
                Err(e) => {
                    log::warn!("trends feed returned unreadable payload: {}", e);
                    None
                }
            },
            Err(e) => {
                log::warn!("trends feed fetch failed: {}", e);
                None
            }
        }
    }
}

fn cache_is_fresh(last_updated: Option<DateTime<Utc>>, ttl: Duration, now: DateTime<Utc>) -> bool {
    match last_updated {
        Some(at) => {
            let age = now.signed_duration_since(at);
            age.num_seconds() >= 0 && (age.num_seconds() as u64) < ttl.as_secs()
        }
        None => false,
    }
}

fn hashtag(name: &str, count: u64, score: f64) -> TrendingHashtag {
    TrendingHashtag {
        hashtag: name.to_string(),
        video_count: count,
        engagement_score: score,
    }
}

/// Static fallback dataset, served whenever no live feed is reachable.
fn fallback_hashtags() -> Vec<TrendingHashtag> {
    vec![
        hashtag("fyp", 15_000_000, 0.92),
        hashtag("viral", 12_000_000, 0.89),
        hashtag("trending", 10_000_000, 0.87),
        hashtag("contentcreator", 8_500_000, 0.85),
        hashtag("tiktokmademebuyit", 7_200_000, 0.83),
        hashtag("tutorial", 6_800_000, 0.82),
        hashtag("howto", 6_500_000, 0.81),
        hashtag("entrepreneurship", 5_900_000, 0.79),
        hashtag("startup", 5_500_000, 0.78),
        hashtag("productivity", 5_200_000, 0.77),
        hashtag("motivation", 4_800_000, 0.76),
        hashtag("tech", 4_500_000, 0.75),
        hashtag("ai", 4_200_000, 0.74),
        hashtag("appdev", 3_900_000, 0.73),
        hashtag("languagelearning", 3_600_000, 0.72),
        hashtag("edtech", 3_300_000, 0.71),
        hashtag("innovation", 3_100_000, 0.70),
        hashtag("pitchdeck", 2_800_000, 0.69),
        hashtag("demo", 2_500_000, 0.68),
        hashtag("producthunt", 2_200_000, 0.67),
    ]
}

fn curated_formats() -> Vec<ContentFormat> {
    fn fmt(
        id: &str,
        name: &str,
        description: &str,
        structure: &str,
        examples: &[&str],
        best_practices: &[&str],
    ) -> ContentFormat {
        ContentFormat {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            structure: structure.to_string(),
            examples: examples.iter().map(|s| s.to_string()).collect(),
            best_practices: best_practices.iter().map(|s| s.to_string()).collect(),
        }
    }

    vec![
        fmt(
            "hook-problem-solution",
            "Hook-Problem-Solution",
            "Start with an attention-grabbing hook, present a problem, offer the solution in 15-60 seconds",
            "0-3s: Hook | 3-20s: Problem | 20-60s: Solution/Demo",
            &[
                "'Stop doing X!' -> 'Here's why it's wrong' -> 'Do this instead'",
                "'I wasted $10k on this' -> 'Here's what failed' -> 'This worked instead'",
            ],
            &[
                "Hook must be under 3 seconds",
                "Use a pattern interrupt (surprising statement)",
                "Demo should show a visible before/after",
                "End with a clear CTA",
            ],
        ),
        fmt(
            "day-in-the-life",
            "Day in the Life",
            "Behind-the-scenes look at building or using your product",
            "0-5s: Morning hook | 5-30s: Key moments | 30-60s: Results/Takeaway",
            &[
                "'6am: Building my AI startup' -> three key moments -> end with a milestone",
                "'Testing my app with 100 users' -> reactions -> reveal metrics",
            ],
            &[
                "Time-lapse for repetitive tasks",
                "Show authentic struggles",
                "Fast-paced editing (3-5s per clip)",
            ],
        ),
        fmt(
            "transformation",
            "Before -> After Transformation",
            "Show a clear transformation of your product or user experience",
            "0-5s: 'Before' state | 5-15s: The change | 15-30s: 'After' results",
            &[
                "'My app before feedback' -> 'Changes made' -> 'New version'",
                "'User struggling with X' -> 'Tries my app' -> 'Problem solved'",
            ],
            &[
                "Make the contrast dramatic and obvious",
                "Use side-by-side comparisons",
                "Keep the before state relatable",
            ],
        ),
        fmt(
            "listicle",
            "Quick Tips Listicle",
            "'3 ways to X' or '5 mistakes with Y' format",
            "0-3s: Hook with number | 3-50s: Rapid-fire tips | 50-60s: CTA",
            &[
                "'3 features that made my app go viral'",
                "'5 mistakes I made launching on TikTok'",
            ],
            &[
                "3-5 items is optimal",
                "Each tip: 8-12 seconds max",
                "Most surprising tip goes last",
            ],
        ),
        fmt(
            "pov-story",
            "POV Storytelling",
            "'POV: You're...' narrative style content",
            "0-2s: 'POV:' setup | 2-40s: Story unfolds | 40-60s: Twist/punchline",
            &[
                "'POV: You launched your app and this happened...'",
                "'POV: Your first user gave this feedback'",
            ],
            &[
                "Make the scenario highly relatable",
                "Build tension throughout",
                "Use trending audio",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn empty_cache_is_stale() {
        assert!(!cache_is_fresh(None, Duration::from_secs(3600), Utc::now()));
    }

    #[test]
    fn cache_expires_after_ttl() {
        let now = Utc::now();
        let ttl = Duration::from_secs(6 * 3600);
        let fresh = now - TimeDelta::hours(1);
        let stale = now - TimeDelta::hours(7);
        assert!(cache_is_fresh(Some(fresh), ttl, now));
        assert!(!cache_is_fresh(Some(stale), ttl, now));
    }

    #[test]
    fn fallback_dataset_is_nonempty_and_scored() {
        let tags = fallback_hashtags();
        assert!(tags.len() >= 20);
        assert!(tags
            .iter()
            .all(|h| (0.0..=1.0).contains(&h.engagement_score)));
    }

    #[tokio::test]
    async fn service_without_feed_serves_fallback() {
        let cache = TrendsService {
            cache: RwLock::new(TrendsCache::default()),
            ttl: Duration::from_secs(3600),
            feed_url: None,
            http: reqwest::Client::new(),
        };
        let tags = cache.get_hashtags(5).await;
        assert_eq!(tags.len(), 5);
        assert!(cache.is_cached().await);
    }

    #[tokio::test]
    async fn refresh_without_feed_serves_curated_data() {
        let service = TrendsService {
            cache: RwLock::new(TrendsCache::default()),
            ttl: Duration::from_secs(3600),
            feed_url: None,
            http: reqwest::Client::new(),
        };
        let (hashtags, formats) = service.force_refresh().await.unwrap();
        assert!(hashtags >= 20);
        assert_eq!(formats, 5);
    }
}
