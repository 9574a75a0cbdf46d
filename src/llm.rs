use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::env;
use xboost::{ContentType, Insights, PostFormat, Result, XboostError};

#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDraft {
    pub content: String,
    pub format: PostFormat,
    pub content_type: ContentType,
    pub rationale: String,
    pub model: String,
}

#[derive(Deserialize)]
struct RawDraft {
    content: String,
    format: Option<String>,
    content_type: Option<String>,
    #[serde(default)]
    rationale: String,
}

impl LlmClient {
    pub fn from_env(model_override: Option<String>) -> Option<Self> {
        let api_key = env::var("AI_API_KEY").ok()?;
        let api_base =
            env::var("AI_API_BASE").unwrap_or_else(|_| "https://api.x.ai/v1".to_string());
        let model = model_override
            .or_else(|| env::var("AI_MODEL").ok())
            .unwrap_or_else(|| "grok-2-latest".to_string());
        Some(Self {
            client: reqwest::Client::new(),
            api_key,
            api_base,
            model,
        })
    }

    pub async fn draft_post(&self, topic: &str, insights: &Insights) -> Result<PostDraft> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: 0.7,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(topic, insights),
                },
            ],
        };

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|err| XboostError::Upstream(format!("AI request failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(XboostError::Upstream(
                format!("AI API error: {} {}", status, detail.trim())
                    .trim_end()
                    .to_string(),
            ));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| XboostError::Upstream(format!("AI response parse failed: {}", err)))?;
        let content = body
            .choices
            .first()
            .ok_or_else(|| XboostError::Upstream("AI response missing choices".to_string()))?
            .message
            .content
            .trim()
            .to_string();

        let draft = parse_draft(&content, insights)?;
        tracing::debug!(model = %self.model, chars = draft.content.chars().count(), "drafted post");
        Ok(PostDraft {
            model: self.model.clone(),
            ..draft
        })
    }
}

const SYSTEM_PROMPT: &str = r#"You write posts for X (Twitter) and answer with JSON only.
Return a single JSON object with these fields:
- content (the post text, line breaks as \n)
- format (one of: text, thread, image, video, poll, link)
- content_type (one of: educational, story, opinion, question, announcement, promotional, humor, other)
- rationale (one sentence)
Rules:
- Output JSON only, no markdown or commentary.
- Open with a strong hook in the first line.
"#;

fn user_prompt(topic: &str, insights: &Insights) -> String {
    let mut prompt = format!("Topic: {}\n", topic.trim());
    if let Some(format) = insights.best_format {
        prompt.push_str(&format!("Best performing format: {}\n", format.label()));
    }
    if let Some(content_type) = insights.best_content_type {
        prompt.push_str(&format!("Best performing content type: {}\n", content_type.label()));
    }
    if let Some(band) = insights.optimal_length {
        prompt.push_str(&format!(
            "Target length: {:.0} to {:.0} lines\n",
            band.min.floor().max(1.0),
            band.max.ceil().max(1.0)
        ));
    }
    if !insights.sample_hooks.is_empty() {
        prompt.push_str("Hooks that went viral before:\n");
        for hook in &insights.sample_hooks {
            prompt.push_str(&format!("- {}\n", hook.replace('\n', " / ")));
        }
    }
    prompt
}

/// Unknown or missing tags fall back to the winning pattern.
fn parse_draft(content: &str, insights: &Insights) -> Result<PostDraft> {
    let json = extract_json(content)
        .ok_or_else(|| XboostError::Upstream("AI response missing JSON".to_string()))?;
    let raw: RawDraft = serde_json::from_str(json)
        .map_err(|err| XboostError::Upstream(format!("AI JSON parse failed: {}", err)))?;
    if raw.content.trim().is_empty() {
        return Err(XboostError::Upstream("AI returned an empty draft".to_string()));
    }

    let format = raw
        .format
        .as_deref()
        .and_then(PostFormat::parse)
        .or(insights.best_format)
        .unwrap_or(PostFormat::Text);
    let content_type = raw
        .content_type
        .as_deref()
        .and_then(ContentType::parse)
        .or(insights.best_content_type)
        .unwrap_or(ContentType::Other);

    Ok(PostDraft {
        content: raw.content.trim().to_string(),
        format,
        content_type,
        rationale: raw.rationale.trim().to_string(),
        model: String::new(),
    })
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use xboost::{analyze_posts, AnalysisConfig, Post};

    fn insights() -> Insights {
        let mut post = Post::new("1", "Stop writing long intros.\nDo this instead.");
        post.impressions = 200_000;
        post.format = PostFormat::Thread;
        post.content_type = ContentType::Educational;
        analyze_posts(&[post], &AnalysisConfig::default()).insights
    }

    #[test]
    fn draft_is_parsed_from_fenced_reply() {
        let reply = "```json\n{\"content\": \"Hook line\\nBody\", \"format\": \"Thread\", \"content_type\": \"opinion\", \"rationale\": \"fits\"}\n```";
        let draft = parse_draft(reply, &insights()).unwrap();
        assert_eq!(draft.content, "Hook line\nBody");
        assert_eq!(draft.format, PostFormat::Thread);
        assert_eq!(draft.content_type, ContentType::Opinion);
    }

    #[test]
    fn unknown_tags_fall_back_to_winning_pattern() {
        let reply = r#"{"content": "gm", "format": "carousel"}"#;
        let draft = parse_draft(reply, &insights()).unwrap();
        assert_eq!(draft.format, PostFormat::Thread);
        assert_eq!(draft.content_type, ContentType::Educational);
    }

    #[test]
    fn prompt_carries_hooks() {
        let prompt = user_prompt("rust tips", &insights());
        assert!(prompt.contains("Best performing format: thread"));
        assert!(prompt.contains("Stop writing long intros. / Do this instead."));
    }

    #[test]
    fn reply_without_json_is_rejected() {
        assert!(parse_draft("no json here", &insights()).is_err());
    }
}
