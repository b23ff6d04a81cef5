//! Lesson Generation Service
//!
//! This module turns a [`LessonRequest`] into a single chat-completions call
//! against an OpenAI-compatible API and turns the answer back into a fully
//! populated [`GeneratedLesson`]. It is the only place in the system that
//! talks to the model.

use crate::{
    error::{GenerationError, LessonError},
    lesson::{GeneratedLesson, LessonRequest, RawLesson, normalize},
    prompt::{CHAT_MODEL, MAX_TOKENS, SYSTEM_PROMPT, TEMPERATURE, lesson_prompt},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Base URL of the OpenAI API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Upper bound on a single generation call, including reading the body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Defines the contract for any service that can generate a lesson.
///
/// Implementations make at most one remote call per invocation and never
/// retry. On success every field of the returned lesson is populated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LessonService: Send + Sync {
    /// Generates a lesson for the given request.
    ///
    /// # Errors
    ///
    /// * [`LessonError::EmptyTopic`] if the topic is blank; no call is made.
    /// * [`LessonError::GenerationFailed`] for any remote or parsing failure.
    async fn generate_lesson(&self, request: &LessonRequest)
    -> Result<GeneratedLesson, LessonError>;
}

// --- Wire types ---

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Debug)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// An implementation of `LessonService` for any OpenAI-compatible API.
pub struct OpenAILessonService {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAILessonService {
    /// Creates a service against the OpenAI API with the default timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_options(api_key, DEFAULT_API_BASE, DEFAULT_TIMEOUT)
    }

    /// Creates a service against an arbitrary OpenAI-compatible base URL.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer credential sent with every call. It is used as
    ///   given; the service never validates or refreshes it.
    /// * `api_base` - Base URL, e.g. `https://api.openai.com/v1`.
    /// * `timeout` - Limit for the whole request.
    pub fn with_options(
        api_key: impl Into<String>,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    fn build_request(request: &LessonRequest) -> ChatRequest<'static> {
        ChatRequest {
            model: CHAT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: lesson_prompt(request),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }

    /// Performs the remote call and keeps the detailed failure.
    #[instrument(name = "generate_lesson", skip_all, fields(topic = %request.topic))]
    async fn request_lesson(
        &self,
        request: &LessonRequest,
    ) -> Result<GeneratedLesson, GenerationError> {
        info!("Generating lesson");
        let body = Self::build_request(request);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::RemoteService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::RemoteService(status.to_string()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::RemoteService(e.to_string()))?;
        let raw = parse_lesson_payload(&text)?;
        let lesson = normalize(raw, request);

        debug!(steps = lesson.steps.len(), "Lesson generated");
        Ok(lesson)
    }
}

#[async_trait]
impl LessonService for OpenAILessonService {
    async fn generate_lesson(
        &self,
        request: &LessonRequest,
    ) -> Result<GeneratedLesson, LessonError> {
        if !request.has_topic() {
            return Err(LessonError::EmptyTopic);
        }

        self.request_lesson(request).await.map_err(|err| {
            error!(topic = %request.topic, error = %err, "Error generating lesson");
            LessonError::from(err)
        })
    }
}

/// Extracts the lesson payload from a chat-completions envelope.
fn parse_lesson_payload(body: &str) -> Result<RawLesson, GenerationError> {
    let envelope: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(format!("envelope: {}", e)))?;

    let content = envelope
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::MalformedResponse("no choices in response".into()))?
        .message
        .content
        .ok_or_else(|| GenerationError::MalformedResponse("no content in response".into()))?;

    serde_json::from_str(strip_code_fence(&content))
        .map_err(|e| GenerationError::MalformedResponse(format!("lesson: {}", e)))
}

/// Removes a single markdown code fence wrapped around the whole content.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    // The opening fence line may carry a language tag.
    match inner.find('\n') {
        Some(idx) => inner[idx + 1..].trim(),
        None => inner.trim(),
    }
}
