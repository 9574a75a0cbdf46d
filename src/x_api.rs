use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use xboost::{ContentType, Post, PostFormat, Result, XboostError};

#[derive(Clone)]
pub struct XApiClient {
    client: reqwest::Client,
    api_base: String,
    auth: XApiAuth,
}

#[derive(Clone)]
enum XApiAuth {
    Bearer(String),
    ClientCredentials {
        client_id: String,
        client_secret: String,
        token_url: String,
        token_cache: Arc<Mutex<Option<CachedToken>>>,
    },
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl XApiClient {
    pub fn from_env() -> Option<Self> {
        let api_base =
            env::var("X_API_BASE").unwrap_or_else(|_| "https://api.twitter.com/2".to_string());
        let client = reqwest::Client::new();

        if let Ok(bearer_token) = env::var("X_API_BEARER_TOKEN") {
            return Some(Self {
                client,
                api_base,
                auth: XApiAuth::Bearer(decode_bearer(bearer_token)),
            });
        }

        let (client_id, client_secret) = match (
            env::var("X_OAUTH_CLIENT_ID"),
            env::var("X_OAUTH_CLIENT_SECRET"),
        ) {
            (Ok(id), Ok(secret)) => (id, secret),
            _ => return None,
        };
        let token_url = env::var("X_OAUTH_TOKEN_URL")
            .unwrap_or_else(|_| "https://api.twitter.com/2/oauth2/token".to_string());

        Some(Self {
            client,
            api_base,
            auth: XApiAuth::ClientCredentials {
                client_id,
                client_secret,
                token_url,
                token_cache: Arc::new(Mutex::new(None)),
            },
        })
    }

    /// Reads the account's most recent original posts (no retweets or
    /// replies) with their public metrics.
    pub async fn fetch_recent_posts(&self, username: &str, limit: usize) -> Result<Vec<Post>> {
        let token = self.bearer_token().await?;
        let user: XUserResponse = self
            .get_json(
                &format!("users/by/username/{}", urlencoding::encode(username)),
                &[],
                &token,
            )
            .await?;
        let user = user
            .data
            .ok_or_else(|| XboostError::Upstream(format!("X user not found: {}", username)))?;

        let max_results = limit.clamp(5, 100).to_string();
        let timeline: XTimelineResponse = self
            .get_json(
                &format!("users/{}/tweets", user.id),
                &[
                    ("max_results", max_results.as_str()),
                    ("exclude", "retweets,replies"),
                    ("tweet.fields", "public_metrics,created_at,attachments"),
                    ("expansions", "attachments.media_keys,attachments.poll_ids"),
                    ("media.fields", "type"),
                ],
                &token,
            )
            .await?;

        let media_types: HashMap<String, String> = timeline
            .includes
            .map(|includes| includes.media)
            .unwrap_or_default()
            .into_iter()
            .map(|media| (media.media_key, media.kind))
            .collect();

        let posts = timeline
            .data
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(|tweet| tweet.into_post(&media_types))
            .collect::<Vec<_>>();
        tracing::info!(username, count = posts.len(), "fetched recent posts");
        Ok(posts)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: &str,
    ) -> Result<T> {
        let response = self
            .client
            .get(format!("{}/{}", self.api_base.trim_end_matches('/'), path))
            .query(query)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|err| XboostError::Upstream(format!("X API request failed: {}", err)))?;

        let response = check_status(response, "X API error").await?;
        response
            .json()
            .await
            .map_err(|err| XboostError::Upstream(format!("X API response parse failed: {}", err)))
    }

    async fn bearer_token(&self) -> Result<String> {
        match &self.auth {
            XApiAuth::Bearer(token) => Ok(token.clone()),
            XApiAuth::ClientCredentials {
                client_id,
                client_secret,
                token_url,
                token_cache,
            } => {
                let mut guard = token_cache.lock().await;
                if let Some(cached) = guard.as_ref() {
                    if Instant::now() < cached.expires_at {
                        return Ok(cached.access_token.clone());
                    }
                }

                let response = self
                    .client
                    .post(token_url)
                    .basic_auth(client_id, Some(client_secret))
                    .form(&[("grant_type", "client_credentials")])
                    .send()
                    .await
                    .map_err(|err| {
                        XboostError::Upstream(format!("X OAuth token request failed: {}", err))
                    })?;
                let response = check_status(response, "X OAuth token error").await?;
                let body: OAuthTokenResponse = response.json().await.map_err(|err| {
                    XboostError::Upstream(format!("X OAuth token parse failed: {}", err))
                })?;

                let expires_in = body.expires_in.unwrap_or(3600);
                let token = CachedToken {
                    access_token: body.access_token,
                    expires_at: Instant::now() + Duration::from_secs(expires_in.saturating_sub(30)),
                };
                let access_token = token.access_token.clone();
                *guard = Some(token);
                Ok(access_token)
            }
        }
    }
}

async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = body.trim();
    if detail.is_empty() {
        Err(XboostError::Upstream(format!("{}: {}", context, status)))
    } else {
        Err(XboostError::Upstream(format!("{}: {} {}", context, status, detail)))
    }
}

fn decode_bearer(value: String) -> String {
    if !value.contains('%') {
        return value;
    }
    match urlencoding::decode(&value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value,
    }
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct XUserResponse {
    data: Option<XUser>,
}

#[derive(Deserialize)]
struct XUser {
    id: String,
}

#[derive(Deserialize)]
struct XTimelineResponse {
    data: Option<Vec<XTweet>>,
    includes: Option<XIncludes>,
}

#[derive(Deserialize)]
struct XIncludes {
    #[serde(default)]
    media: Vec<XMedia>,
}

#[derive(Deserialize)]
struct XMedia {
    media_key: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct XTweet {
    id: String,
    text: String,
    created_at: Option<DateTime<Utc>>,
    public_metrics: Option<XTweetMetrics>,
    attachments: Option<XAttachments>,
}

#[derive(Deserialize, Default)]
struct XTweetMetrics {
    #[serde(default)]
    impression_count: u64,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
    #[serde(default)]
    quote_count: u64,
}

#[derive(Deserialize, Default)]
struct XAttachments {
    #[serde(default)]
    media_keys: Vec<String>,
    #[serde(default)]
    poll_ids: Vec<String>,
}

impl XTweet {
    fn into_post(self, media_types: &HashMap<String, String>) -> Post {
        let metrics = self.public_metrics.unwrap_or_default();
        let attachments = self.attachments.unwrap_or_default();
        let media: Vec<String> = attachments
            .media_keys
            .iter()
            .filter_map(|key| media_types.get(key).cloned())
            .collect();

        let mut post = Post::new(self.id, self.text);
        post.impressions = metrics.impression_count;
        post.likes = metrics.like_count;
        post.retweets = metrics.retweet_count;
        post.replies = metrics.reply_count;
        post.quotes = metrics.quote_count;
        post.format = PostFormat::infer(&post.content, &media, !attachments.poll_ids.is_empty());
        post.content_type = ContentType::infer(&post.content);
        post.posted_at = self.created_at;
        post
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_payload_maps_to_posts() {
        let payload = r#"{
            "data": [{
                "id": "1",
                "text": "How to grow on X: 3 tips",
                "created_at": "2026-01-05T10:00:00.000Z",
                "public_metrics": {
                    "impression_count": 120000, "like_count": 900,
                    "retweet_count": 80, "reply_count": 40, "quote_count": 5
                },
                "attachments": { "media_keys": ["3_1"] }
            }],
            "includes": { "media": [{ "media_key": "3_1", "type": "video" }] }
        }"#;
        let timeline: XTimelineResponse = serde_json::from_str(payload).unwrap();
        let media: HashMap<String, String> = timeline
            .includes
            .unwrap()
            .media
            .into_iter()
            .map(|m| (m.media_key, m.kind))
            .collect();
        let post = timeline.data.unwrap().remove(0).into_post(&media);

        assert_eq!(post.impressions, 120_000);
        assert_eq!(post.total_engagements(), 1_025);
        assert_eq!(post.format, PostFormat::Video);
        assert_eq!(post.content_type, ContentType::Educational);
        assert!(post.posted_at.is_some());
    }

    #[test]
    fn token_payload_without_expiry_parses() {
        let body: OAuthTokenResponse =
            serde_json::from_str(r#"{"token_type": "bearer", "access_token": "abc"}"#).unwrap();
        assert_eq!(body.access_token, "abc");
        assert_eq!(body.expires_in, None);
    }

    #[test]
    fn percent_encoded_bearer_is_decoded() {
        assert_eq!(decode_bearer("abc%3Ddef".to_string()), "abc=def");
        assert_eq!(decode_bearer("plain".to_string()), "plain");
    }
}
