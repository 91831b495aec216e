use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    conf::settings,
    prelude::{Error, Result},
};

/// Chat client for any OpenAI-compatible completions endpoint. The
/// provider, endpoint and model come from [`settings`], so the same code
/// talks to ollama, OpenAI or Gemini.
#[derive(Debug, Clone)]
pub struct AiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl AiClient {
    pub fn from_settings() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(AiClient {
            http,
            endpoint: settings.ai_endpoint.trim_end_matches('/').to_string(),
            model: settings.ai_model.clone(),
            api_key: settings.ai_key.clone(),
        })
    }

    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
        };
        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Ai(format!("AI API error: {status}: {body}")));
        }
        if body.trim().is_empty() {
            return Err(Error::Ai(
                "Failed to analyze resume - no response from AI".into(),
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|_| Error::Ai("Invalid response structure from AI".into()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::Ai("Invalid response structure from AI".into()))?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = ChatRequest {
            model: "gemma3:12b",
            messages: vec![ChatMessage {
                role: "user",
                content: "rate this resume",
            }],
            temperature: 0.2,
        };
        let body = serde_json::to_string(&request).unwrap();
        assert!(body.contains("\"model\":\"gemma3:12b\""));
        assert!(body.contains("\"role\":\"user\""));
        assert!(body.contains("\"content\":\"rate this resume\""));
    }

    #[test]
    fn test_response_content_extraction() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"overallScore\": 80}"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        assert_eq!(content.as_deref(), Some("{\"overallScore\": 80}"));
    }

    #[test]
    fn test_response_without_choices_parses_to_empty() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
