//! External model boundary
//!
//! One trait for the hosted text/vision completion calls the pipeline makes,
//! with a reqwest-backed implementation against an OpenAI-compatible chat
//! completions API and a scripted mock for tests. Errors are typed so stages
//! can tell "call failed" apart from "model answered with nothing".

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::PipelineConfig;

/// Failure modes of a completion call
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("transport error calling model API: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model API returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("model returned an empty completion")]
    EmptyCompletion,
    #[error("model API response had no message content")]
    MalformedResponse,
}

/// Boundary object for hosted completion calls
///
/// Each call is a single request/response exchange: no streaming, no
/// multi-turn state.
#[async_trait]
pub trait ExternalGenerator: Send + Sync {
    /// Text completion for a single prompt
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError>;

    /// Vision completion for a prompt plus one PNG image
    async fn complete_vision(
        &self,
        prompt: &str,
        image_png: &[u8],
    ) -> Result<String, GeneratorError>;
}

/// Chat-completions client for the Groq API (OpenAI-compatible)
pub struct GroqGenerator {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    text_model: String,
    vision_model: String,
    temperature: f32,
}

impl GroqGenerator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            text_model: config.text_model.clone(),
            vision_model: config.vision_model.clone(),
            temperature: config.temperature,
        }
    }

    async fn chat(&self, model: &str, content: Value, temperature: f32) -> Result<String, GeneratorError> {
        let body = json!({
            "model": model,
            "messages": [{"role": "user", "content": content}],
            "temperature": temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: Value = response.json().await?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(GeneratorError::MalformedResponse)?;
        if content.trim().is_empty() {
            return Err(GeneratorError::EmptyCompletion);
        }
        Ok(content.to_string())
    }
}

#[async_trait]
impl ExternalGenerator for GroqGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError> {
        self.chat(&self.text_model, json!(prompt), self.temperature)
            .await
    }

    async fn complete_vision(
        &self,
        prompt: &str,
        image_png: &[u8],
    ) -> Result<String, GeneratorError> {
        let encoded = BASE64.encode(image_png);
        let content = json!([
            {"type": "text", "text": prompt},
            {"type": "image_url", "image_url": {"url": format!("data:image/png;base64,{}", encoded)}}
        ]);
        // Diagrams want lower variance than prose
        self.chat(&self.vision_model, content, 0.2).await
    }
}

/// Scripted generator for tests and offline runs
///
/// Answers extraction prompts with a canned requirements object and every
/// other prompt with a short generated-source placeholder.
pub struct MockGenerator {
    /// Reply for extraction prompts (anything asking for STRICT JSON)
    pub spec_json: String,
    /// Reply for vision prompts
    pub vision_json: String,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self {
            spec_json: sample_spec_reply(),
            vision_json: sample_vision_reply(),
        }
    }
}

#[async_trait]
impl ExternalGenerator for MockGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError> {
        if prompt.contains("STRICT JSON") {
            Ok(self.spec_json.clone())
        } else {
            Ok(format!(
                "```python\n# generated by mock\ndef handler():\n    pass\n```\n\nprompt bytes: {}",
                prompt.len()
            ))
        }
    }

    async fn complete_vision(
        &self,
        _prompt: &str,
        _image_png: &[u8],
    ) -> Result<String, GeneratorError> {
        Ok(self.vision_json.clone())
    }
}

fn sample_spec_reply() -> String {
    r#"Here is the extraction:
{
  "api_endpoints": [
    {
      "method": "GET",
      "path": "/users",
      "description": "Retrieve all users",
      "parameters": [{"name": "page", "type": "int", "required": false}]
    },
    {
      "method": "POST",
      "path": "/users/{id}",
      "description": "Update one user",
      "parameters": [{"name": "id", "type": "int", "required": true}]
    }
  ],
  "backend_logic": ["Users must be filtered by active status."],
  "database_schema": {
    "tables": {
      "users": {
        "columns": {"id": "integer", "name": "string"},
        "primary_key": "id",
        "foreign_keys": []
      }
    }
  },
  "authentication": {
    "type": "JWT",
    "roles": ["admin", "user"],
    "rules": ["Admins can access all routes"]
  }
}"#
    .to_string()
}

fn sample_vision_reply() -> String {
    r#"{
  "database_schema": {
    "tables": {
      "sessions": {
        "columns": {"id": "integer", "user_id": "integer"},
        "primary_key": "id",
        "foreign_keys": [{"column": "user_id", "references": "users(id)"}]
      }
    }
  }
}"#
    .to_string()
}
