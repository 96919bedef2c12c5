use std::time::Duration;

use async_trait::async_trait;
use leadflow_core::adapters::Personalizer;
use leadflow_core::config::OpenAiConfig;
use leadflow_core::{LeadflowError, Result};
use serde::{Deserialize, Serialize};

use crate::http::{check_status, client, request_error};

const ADAPTER: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Outreach copy from the chat completions API.
pub struct OpenAiPersonalizer {
    http: reqwest::Client,
    config: OpenAiConfig,
    sender_name: String,
    timeout: Duration,
}

impl OpenAiPersonalizer {
    pub fn new(config: OpenAiConfig, sender_name: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: client(ADAPTER, timeout)?,
            config,
            sender_name,
            timeout,
        })
    }

    pub fn prompt(&self, name: &str, company: &str, industry: &str) -> String {
        format!(
            "Write a highly personalized email introduction for {name}, who works at \
             {company} in the {industry} industry. The email should be professional, \
             engaging, and under 100 words. Use the recipient's name at the beginning. \
             End the email with: Best regards,\n{}",
            self.sender_name
        )
    }
}

#[async_trait]
impl Personalizer for OpenAiPersonalizer {
    async fn generate(&self, name: &str, company: &str, industry: &str) -> Result<String> {
        let prompt = self.prompt(name, company, industry);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.config.api_base))
            .bearer_auth(self.config.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(ADAPTER, self.timeout, e))?;
        let body: ChatResponse = check_status(ADAPTER, resp)
            .await?
            .json()
            .await
            .map_err(|e| request_error(ADAPTER, self.timeout, e))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(LeadflowError::bad_response(ADAPTER, "empty completion"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::config::Secret;
    use mockito::Matcher;
    use serde_json::json;

    fn personalizer(base: &str) -> OpenAiPersonalizer {
        OpenAiPersonalizer::new(
            OpenAiConfig {
                api_key: Secret::new("sk-test"),
                model: "gpt-4".into(),
                api_base: base.into(),
                max_tokens: 150,
                temperature: 0.7,
            },
            "Sam Rivera".into(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn prompt_names_lead_and_signs_off() {
        let p = personalizer("http://unused").prompt("Ana", "Acme", "logistics");
        assert!(p.starts_with("Write a highly personalized email introduction for Ana"));
        assert!(p.contains("works at Acme in the logistics industry"));
        assert!(p.ends_with("Best regards,\nSam Rivera"));
    }

    #[tokio::test]
    async fn generate_sends_bounded_request_and_trims_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4",
                "max_tokens": 150,
                "messages": [{ "role": "user" }]
            })))
            .with_status(200)
            .with_body(
                json!({
                    "choices": [{ "message": { "role": "assistant", "content": "  Hi Ana,\nwelcome.  " } }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let text = personalizer(&server.url())
            .generate("Ana", "Acme", "logistics")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Hi Ana,\nwelcome.");
    }

    #[tokio::test]
    async fn empty_choices_is_bad_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = personalizer(&server.url())
            .generate("Ana", "Acme", "logistics")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty completion"));
    }

    #[tokio::test]
    async fn forbidden_is_auth_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(403)
            .create_async()
            .await;

        let err = personalizer(&server.url())
            .generate("Ana", "Acme", "logistics")
            .await
            .unwrap_err();
        assert!(matches!(err, LeadflowError::AdapterAuthFailure("openai")));
    }
}
