use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xboost::{
    AnalysisConfig, ContentType, Insights, PatternAnalysis, Post, PostFormat, Result,
    WinningPatternReport, XboostError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPost {
    pub id: Option<String>,
    #[serde(alias = "text")]
    pub content: String,
    pub impressions: Option<u64>,
    pub likes: Option<u64>,
    #[serde(alias = "reposts")]
    pub retweets: Option<u64>,
    pub replies: Option<u64>,
    pub quotes: Option<u64>,
    pub format: Option<String>,
    pub content_type: Option<String>,
    pub viral_threshold: Option<u64>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl ApiPost {
    /// Explicit tags must parse; missing tags are inferred from the text.
    /// Returns whether any tag had to be inferred.
    pub fn into_post(self, index: usize) -> Result<(Post, bool)> {
        let mut inferred = false;
        let format = match self.format.as_deref() {
            Some(value) => PostFormat::parse(value).ok_or_else(|| {
                XboostError::InvalidRequest(format!("post {}: invalid format: {}", index, value))
            })?,
            None => {
                inferred = true;
                PostFormat::infer(&self.content, &[], false)
            }
        };
        let content_type = match self.content_type.as_deref() {
            Some(value) => ContentType::parse(value).ok_or_else(|| {
                XboostError::InvalidRequest(format!(
                    "post {}: invalid content_type: {}",
                    index, value
                ))
            })?,
            None => {
                inferred = true;
                ContentType::infer(&self.content)
            }
        };

        let id = self
            .id
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| format!("post-{}", index));
        let mut post = Post::new(id, self.content);
        post.impressions = self.impressions.unwrap_or(0);
        post.likes = self.likes.unwrap_or(0);
        post.retweets = self.retweets.unwrap_or(0);
        post.replies = self.replies.unwrap_or(0);
        post.quotes = self.quotes.unwrap_or(0);
        post.format = format;
        post.content_type = content_type;
        post.viral_threshold = self.viral_threshold;
        post.posted_at = self.posted_at;
        Ok((post, inferred))
    }
}

pub fn into_posts(posts: Vec<ApiPost>) -> Result<(Vec<Post>, Vec<String>)> {
    let mut converted = Vec::with_capacity(posts.len());
    let mut inferred = 0usize;
    for (index, post) in posts.into_iter().enumerate() {
        let (post, was_inferred) = post.into_post(index)?;
        if was_inferred {
            inferred += 1;
        }
        converted.push(post);
    }

    let mut warnings = Vec::new();
    if inferred > 0 {
        warnings.push(format!(
            "{} post(s) had no format or content_type tag; inferred from text",
            inferred
        ));
    }
    Ok((converted, warnings))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub posts: Vec<ApiPost>,
    pub viral_threshold: Option<u64>,
    pub sample_hook_limit: Option<usize>,
}

impl AnalyzeRequest {
    pub fn into_parts(
        self,
        defaults: &AnalysisConfig,
    ) -> Result<(Vec<Post>, AnalysisConfig, Vec<String>)> {
        let config = analysis_config(defaults, self.viral_threshold, self.sample_hook_limit)?;
        let (posts, warnings) = into_posts(self.posts)?;
        Ok((posts, config, warnings))
    }
}

pub fn analysis_config(
    defaults: &AnalysisConfig,
    viral_threshold: Option<u64>,
    sample_hook_limit: Option<usize>,
) -> Result<AnalysisConfig> {
    let mut config = defaults.clone();
    if let Some(threshold) = viral_threshold {
        if threshold == 0 {
            return Err(XboostError::InvalidRequest(
                "viral_threshold must be positive".to_string(),
            ));
        }
        config.viral_threshold = threshold;
    }
    if let Some(limit) = sample_hook_limit {
        config.sample_hook_limit = limit.min(50);
    }
    Ok(config)
}

/// X handles are 1-15 ASCII letters, digits or underscores. A leading `@`
/// is accepted and stripped.
pub fn parse_username(raw: &str) -> Result<&str> {
    let username = raw.trim().trim_start_matches('@');
    let valid = (1..=15).contains(&username.len())
        && username
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if valid {
        Ok(username)
    } else {
        Err(XboostError::InvalidRequest(format!("invalid X username: {}", raw)))
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis: PatternAnalysis,
    pub insights: Insights,
    pub warnings: Vec<String>,
}

impl AnalyzeResponse {
    pub fn from_report(report: WinningPatternReport, warnings: Vec<String>) -> Self {
        Self {
            analysis: report.analysis,
            insights: report.insights,
            warnings,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub limit: Option<usize>,
    pub viral_threshold: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RulesQuery {
    pub account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub account_id: String,
    pub posts: Vec<ApiPost>,
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub topic: String,
    #[serde(default)]
    pub posts: Vec<ApiPost>,
    pub viral_threshold: Option<u64>,
}
