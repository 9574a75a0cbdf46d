pub mod analysis;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod rules;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use analysis::{
    analyze_posts, AnalysisConfig, GroupStats, Insights, LengthBand, PatternAnalysis,
    WinningPatternReport,
};
pub use error::{Result, XboostError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostFormat {
    Text,
    Thread,
    Image,
    Video,
    Poll,
    Link,
}

impl PostFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "plain" => Some(PostFormat::Text),
            "thread" => Some(PostFormat::Thread),
            "image" | "photo" | "gif" => Some(PostFormat::Image),
            "video" => Some(PostFormat::Video),
            "poll" => Some(PostFormat::Poll),
            "link" | "url" => Some(PostFormat::Link),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PostFormat::Text => "text",
            PostFormat::Thread => "thread",
            PostFormat::Image => "image",
            PostFormat::Video => "video",
            PostFormat::Poll => "poll",
            PostFormat::Link => "link",
        }
    }

    /// Best guess for posts imported without a format tag. `media` holds the
    /// X API attachment types (`photo`, `video`, `animated_gif`).
    pub fn infer(text: &str, media: &[String], has_poll: bool) -> Self {
        if has_poll {
            return PostFormat::Poll;
        }
        if media.iter().any(|kind| kind == "video") {
            return PostFormat::Video;
        }
        if media
            .iter()
            .any(|kind| kind == "photo" || kind == "animated_gif")
        {
            return PostFormat::Image;
        }

        let lowercase = text.to_lowercase();
        let trimmed = lowercase.trim_start();
        if lowercase.contains('🧵')
            || lowercase.contains("thread")
            || trimmed.starts_with("1/")
        {
            return PostFormat::Thread;
        }
        if ["http://", "https://", "www."]
            .iter()
            .any(|needle| lowercase.contains(needle))
        {
            return PostFormat::Link;
        }
        PostFormat::Text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Educational,
    Story,
    Opinion,
    Question,
    Announcement,
    Promotional,
    Humor,
    Other,
}

impl ContentType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "educational" | "education" | "tips" => Some(ContentType::Educational),
            "story" | "personal" => Some(ContentType::Story),
            "opinion" | "hot_take" => Some(ContentType::Opinion),
            "question" => Some(ContentType::Question),
            "announcement" | "news" => Some(ContentType::Announcement),
            "promotional" | "promo" => Some(ContentType::Promotional),
            "humor" | "meme" => Some(ContentType::Humor),
            "other" => Some(ContentType::Other),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentType::Educational => "educational",
            ContentType::Story => "story",
            ContentType::Opinion => "opinion",
            ContentType::Question => "question",
            ContentType::Announcement => "announcement",
            ContentType::Promotional => "promotional",
            ContentType::Humor => "humor",
            ContentType::Other => "other",
        }
    }

    /// Keyword heuristic for posts imported without a content-type tag.
    /// Checked in priority order; the first matching bucket wins.
    pub fn infer(text: &str) -> Self {
        let lowercase = text.to_lowercase();
        let has_any = |needles: &[&str]| needles.iter().any(|needle| lowercase.contains(needle));

        if has_any(&[
            "% off",
            "discount",
            "promo code",
            "link in bio",
            "sign up",
            "buy now",
            "sale",
        ]) {
            ContentType::Promotional
        } else if has_any(&[
            "announcing",
            "introducing",
            "just launched",
            "excited to share",
            "we're live",
        ]) {
            ContentType::Announcement
        } else if has_any(&[
            "how to",
            "tips",
            "guide",
            "lesson",
            "step ",
            "here's how",
            "framework",
            "learned",
        ]) {
            ContentType::Educational
        } else if has_any(&[
            "unpopular opinion",
            "hot take",
            "i think",
            "i believe",
            "overrated",
            "underrated",
        ]) {
            ContentType::Opinion
        } else if has_any(&[
            "years ago",
            "story",
            "when i was",
            "i remember",
            "last week i",
        ]) {
            ContentType::Story
        } else if has_any(&["lol", "lmao", "😂", "🤣"]) {
            ContentType::Humor
        } else if lowercase.trim_end().ends_with('?')
            || has_any(&["what do you think", "thoughts?"])
        {
            ContentType::Question
        } else {
            ContentType::Other
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub retweets: u64,
    #[serde(default)]
    pub replies: u64,
    #[serde(default)]
    pub quotes: u64,
    pub format: PostFormat,
    pub content_type: ContentType,
    #[serde(default)]
    pub viral_threshold: Option<u64>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            impressions: 0,
            likes: 0,
            retweets: 0,
            replies: 0,
            quotes: 0,
            format: PostFormat::Text,
            content_type: ContentType::Other,
            viral_threshold: None,
            posted_at: None,
        }
    }

    pub fn total_engagements(&self) -> u64 {
        self.likes
            .saturating_add(self.retweets)
            .saturating_add(self.replies)
            .saturating_add(self.quotes)
    }

    pub fn age_hours(&self, now: DateTime<Utc>) -> Option<f64> {
        self.posted_at
            .map(|posted_at| (now - posted_at).num_seconds().max(0) as f64 / 3600.0)
    }
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as i64;
    let mut chars: Vec<char> = rounded.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
