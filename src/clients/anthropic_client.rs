use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ModelSettings;
use crate::error::InterpretError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub fn messages_url(api_base: &str) -> String {
    let base = api_base.trim_end_matches('/');
    if base.ends_with("/messages") {
        return base.to_string();
    }
    if base.ends_with("/v1") {
        return format!("{base}/messages");
    }
    format!("{base}/v1/messages")
}

pub fn build_http_client(settings: &ModelSettings) -> Result<reqwest::Client, InterpretError> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = settings.timeout_secs.filter(|secs| *secs > 0) {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Single best-effort request; no retry, no streaming.
pub async fn query_anthropic(
    client: &reqwest::Client,
    settings: &ModelSettings,
    api_key: &str,
    prompt: &str,
) -> Result<String, InterpretError> {
    let request = AnthropicRequest {
        model: &settings.model,
        max_tokens: settings.max_tokens,
        messages: vec![AnthropicMessage {
            role: "user",
            content: prompt,
        }],
    };

    let response = client
        .post(messages_url(&settings.api_base))
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        warn!(status = status.as_u16(), body = %text, "model request rejected");
        return Err(InterpretError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    reply_text(&text)
}

/// Joins the text blocks of a messages API response body.
pub fn reply_text(body: &str) -> Result<String, InterpretError> {
    let parsed: AnthropicResponse =
        serde_json::from_str(body).map_err(InterpretError::Envelope)?;
    let reply: String = parsed
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");

    if reply.trim().is_empty() {
        debug!(body = %body, "model reply had no text block");
        return Err(InterpretError::EmptyReply);
    }
    Ok(reply)
}
