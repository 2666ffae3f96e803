//! Gemini `generateContent` client

use crate::config::ModelConfig;
use crate::model::prompt::{build_prompt, parse_response};
use crate::model::{Answer, ModelError, ModelQuery};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Harm categories the safety threshold applies to
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Calls a Gemini model over its REST API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: ModelConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(client: Client, config: ModelConfig, api_key: impl Into<String>) -> Self {
        Self {
            client,
            config,
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(&self, prompt: &str, max_output_tokens: u32) -> Value {
        let safety_settings: Vec<Value> = HARM_CATEGORIES
            .iter()
            .map(|category| {
                json!({ "category": category, "threshold": self.config.safety_threshold })
            })
            .collect();

        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "topP": self.config.top_p,
                "topK": self.config.top_k,
                "maxOutputTokens": max_output_tokens
            },
            "safetySettings": safety_settings
        })
    }
}

/// Pulls the first candidate's text out of a `generateContent` response
fn extract_text(body: &Value) -> Option<&str> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

#[async_trait]
impl ModelQuery for GeminiClient {
    async fn generate_answer(
        &self,
        question: &str,
        context: &str,
        max_output_tokens: u32,
    ) -> Result<Answer, ModelError> {
        let prompt = build_prompt(question, context, self.config.context_chars);
        let preview: String = prompt.chars().take(100).collect();
        tracing::info!("Sending request to Gemini API with prompt: {}...", preview);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(&prompt, max_output_tokens))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        let text = extract_text(&body).ok_or(ModelError::EmptyResponse)?;
        tracing::debug!("Generated response: {}", text);

        Ok(parse_response(text))
    }
}
