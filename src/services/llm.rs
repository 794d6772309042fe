use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::AppError;

/// Capability interface over the external language model. The orchestration
/// code never sees a provider or model name; configuration decides both.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AppError>;
}

/// OpenAI-compatible chat-completions client with a fixed per-call timeout
/// and a single fallback-model attempt. No infinite retry: two failures
/// surface to the caller.
pub struct HttpLlmClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    fallback_model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn<'a>>,
}

#[derive(Serialize)]
struct ChatTurn<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl HttpLlmClient {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.llm.api_url.clone(),
            api_key: config.llm.api_key.clone(),
            model: config.llm.model.clone(),
            fallback_model: config.llm.fallback_model.clone(),
            timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }

    async fn complete_with_model(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<String, AppError> {
        let body = ChatCompletionRequest {
            model,
            messages: vec![
                ChatTurn {
                    role: "system",
                    content: system,
                },
                ChatTurn {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::UpstreamTimeout(format!("model {} timed out", model))
                } else {
                    AppError::AnalysisFailed(format!("llm request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(AppError::AnalysisFailed(format!(
                "llm returned status {}",
                response.status()
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::AnalysisFailed(format!("unreadable llm response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::AnalysisFailed("llm response had no choices".into()))
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AppError> {
        match self.complete_with_model(&self.model, system, prompt).await {
            Ok(text) => Ok(text),
            Err(primary_err) => {
                log::warn!(
                    "primary model {} failed ({}), trying fallback {}",
                    self.model,
                    primary_err,
                    self.fallback_model
                );
                self.complete_with_model(&self.fallback_model, system, prompt)
                    .await
                    .map_err(|fallback_err| {
                        log::error!("fallback model also failed: {}", fallback_err);
                        fallback_err
                    })
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Scripted client for tests: pops queued replies in order, errors when
    /// the script runs dry.
    pub struct ScriptedLlm {
        replies: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        pub fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().map(String::from).collect()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, AppError> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AppError::AnalysisFailed("scripted llm exhausted".into()))
        }
    }
}
