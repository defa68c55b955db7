//! Sole point of contact with the text-generation service.
//!
//! Failure policy: no credential, network errors, and non-2xx statuses all
//! resolve to the deterministic offline answer, with zero retries. Callers
//! never block on absent configuration and the paid endpoint is never
//! hammered.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::sync::{mpsc, Mutex};
use std::time::Duration;

use crate::config::GatewayConfig;

use super::fallback::offline_answer;
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart, GenerateOptions,
    MessageContent, StreamChunk,
};
use super::GatewayError;

/// End-of-stream sentinel on the streaming wire protocol.
const STREAM_DONE: &str = "[DONE]";

/// The generation seam every pipeline component takes (allows mocking).
pub trait ChatModel {
    fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<String, GatewayError>;

    /// Incremental variant: tokens are forwarded to `token_tx` as they
    /// arrive; the full concatenated text is returned at end of stream.
    fn generate_streaming(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
        token_tx: mpsc::Sender<String>,
    ) -> Result<String, GatewayError>;
}

/// HTTP client for an OpenAI-compatible chat completion endpoint.
pub struct CompletionClient {
    config: GatewayConfig,
    http: reqwest::blocking::Client,
}

impl CompletionClient {
    pub fn new(config: GatewayConfig) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self { config, http }
    }

    pub fn from_env() -> Self {
        Self::new(GatewayConfig::from_env())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Vision-capable calls (any image part present) go to the vision model.
    fn model_for(&self, messages: &[ChatMessage]) -> &str {
        let has_images = messages.iter().any(|m| match &m.content {
            MessageContent::Parts(parts) => parts
                .iter()
                .any(|p| matches!(p, ContentPart::ImageUrl { .. })),
            MessageContent::Text(_) => false,
        });
        if has_images {
            &self.config.vision_model
        } else {
            &self.config.chat_model
        }
    }

    fn post_completion(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
        stream: bool,
    ) -> Result<reqwest::blocking::Response, GatewayError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GatewayError::MissingCredential)?;

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = ChatCompletionRequest {
            model: self.model_for(messages),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl ChatModel for CompletionClient {
    fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<String, GatewayError> {
        let response = match self.post_completion(messages, options, false) {
            Ok(response) => response,
            Err(GatewayError::MissingCredential) => {
                tracing::warn!("no API credential configured — answering offline");
                return Ok(offline_answer(messages));
            }
            Err(e) => {
                tracing::warn!(error = %e, "completion call failed — answering offline");
                return Ok(offline_answer(messages));
            }
        };

        let parsed: ChatCompletionResponse = match response.json() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable completion body — answering offline");
                return Ok(offline_answer(messages));
            }
        };

        if let Some(usage) = &parsed.usage {
            tracing::debug!(total_tokens = usage.total_tokens, "completion received");
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_else(|| "No response generated.".to_string());
        Ok(content)
    }

    fn generate_streaming(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
        token_tx: mpsc::Sender<String>,
    ) -> Result<String, GatewayError> {
        let response = match self.post_completion(messages, options, true) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "stream open failed — answering offline");
                let answer = offline_answer(messages);
                let _ = token_tx.send(answer.clone());
                return Ok(answer);
            }
        };

        let mut full = String::new();
        let reader = BufReader::new(response);
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "stream read error — returning partial text");
                    break;
                }
            };
            let Some((_, payload)) = line.split_once("data:") else {
                continue;
            };
            let payload = payload.trim();
            if payload.is_empty() {
                continue;
            }
            if payload == STREAM_DONE {
                break;
            }
            // Malformed chunks are skipped, never fatal to the stream
            let Ok(chunk) = serde_json::from_str::<StreamChunk>(payload) else {
                continue;
            };
            if let Some(token) = chunk.token() {
                full.push_str(&token);
                if token_tx.send(token).is_err() {
                    // Receiver hung up; caller abandoned the stream
                    tracing::debug!("stream consumer dropped — stopping read");
                    break;
                }
            }
        }

        if full.is_empty() {
            let answer = offline_answer(messages);
            let _ = token_tx.send(answer.clone());
            return Ok(answer);
        }
        Ok(full)
    }
}

/// Mock model for testing; replays scripted responses in order.
pub struct MockChatModel {
    responses: Mutex<VecDeque<String>>,
    repeat_last: bool,
    calls: Mutex<Vec<String>>,
}

impl MockChatModel {
    /// A mock that returns the same response for every call.
    pub fn new(response: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([response.to_string()])),
            repeat_last: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A mock that replays `responses` in order, then errors when exhausted.
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat_last: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A mock whose every call fails like a dead network.
    pub fn failing() -> Self {
        Self::scripted(vec![])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// The prompt texts of every call so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn next_response(&self, messages: &[ChatMessage]) -> Result<String, GatewayError> {
        let prompt = messages
            .iter()
            .map(|m| m.text())
            .collect::<Vec<_>>()
            .join("\n");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(prompt);
        }

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| GatewayError::Network("mock lock poisoned".into()))?;
        if self.repeat_last && responses.len() == 1 {
            return Ok(responses[0].clone());
        }
        responses
            .pop_front()
            .ok_or_else(|| GatewayError::Network("mock responses exhausted".into()))
    }
}

impl ChatModel for MockChatModel {
    fn generate(
        &self,
        messages: &[ChatMessage],
        _options: &GenerateOptions,
    ) -> Result<String, GatewayError> {
        self.next_response(messages)
    }

    fn generate_streaming(
        &self,
        messages: &[ChatMessage],
        _options: &GenerateOptions,
        token_tx: mpsc::Sender<String>,
    ) -> Result<String, GatewayError> {
        let full = self.next_response(messages)?;
        for token in full.split_inclusive(' ') {
            let _ = token_tx.send(token.to_string());
        }
        Ok(full)
    }
}
