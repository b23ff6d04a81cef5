//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests for lesson
//! generation, step navigation and API key management.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use lesson_core::{
    LessonError,
    credentials::CredentialError,
    shell::{self, LessonShell, ShellError},
};
use std::sync::Arc;
use tracing::error;

use crate::{
    models::{
        ApiKeyPayload, CreateLessonPayload, CredentialStatus, ErrorResponse, LessonView,
        SelectStepPayload,
    },
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    PreconditionRequired(String),
    BadGateway(String),
    InternalServerError(anyhow::Error),
}

impl ApiError {
    fn from_shell(err: ShellError) -> Self {
        match err {
            ShellError::Lesson(LessonError::EmptyTopic) | ShellError::StepOutOfRange { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            ShellError::Lesson(LessonError::GenerationFailed) => {
                ApiError::BadGateway(err.to_string())
            }
            ShellError::GenerationInProgress => ApiError::Conflict(err.to_string()),
            ShellError::NoLesson => ApiError::NotFound(err.to_string()),
        }
    }

    fn from_credentials(err: CredentialError) -> Self {
        match err {
            CredentialError::EmptyKey => ApiError::BadRequest(err.to_string()),
            other => ApiError::InternalServerError(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::PreconditionRequired(message) => {
                (StatusCode::PRECONDITION_REQUIRED, message)
            }
            ApiError::BadGateway(message) => (StatusCode::BAD_GATEWAY, message),
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

fn no_lesson() -> ApiError {
    ApiError::from_shell(ShellError::NoLesson)
}

/// Applies `action` to the shell and returns the resulting view.
async fn update_shell<F>(state: &AppState, action: F) -> Result<Json<LessonView>, ApiError>
where
    F: FnOnce(&mut LessonShell) -> Result<(), ShellError>,
{
    let mut shell = state.shell.lock().await;
    action(&mut shell).map_err(ApiError::from_shell)?;
    LessonView::from_shell(&shell).map(Json).ok_or_else(no_lesson)
}

/// Generate a new lesson for a topic and make it the current lesson.
#[utoipa::path(
    post,
    path = "/lessons",
    request_body = CreateLessonPayload,
    responses(
        (status = 201, description = "Lesson generated", body = LessonView),
        (status = 400, description = "Topic is empty", body = ErrorResponse),
        (status = 409, description = "A lesson is already being generated", body = ErrorResponse),
        (status = 428, description = "No API key configured", body = ErrorResponse),
        (status = 502, description = "The AI service failed to produce a lesson", body = ErrorResponse)
    )
)]
pub async fn create_lesson(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLessonPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let request = payload.into_request();
    if !request.has_topic() {
        return Err(ApiError::from_shell(LessonError::EmptyTopic.into()));
    }

    let service = state.lesson_service().await.ok_or_else(|| {
        ApiError::PreconditionRequired(
            "An AI API key must be configured before generating lessons.".to_string(),
        )
    })?;

    let lesson = shell::search(&state.shell, service.as_ref(), request)
        .await
        .map_err(ApiError::from_shell)?;

    Ok((StatusCode::CREATED, Json(LessonView::fresh(lesson))))
}

/// Get the current lesson and the learner's position in it.
#[utoipa::path(
    get,
    path = "/lesson",
    responses(
        (status = 200, description = "Current lesson", body = LessonView),
        (status = 404, description = "No lesson loaded", body = ErrorResponse)
    )
)]
pub async fn get_lesson(State(state): State<Arc<AppState>>) -> Result<Json<LessonView>, ApiError> {
    let shell = state.shell.lock().await;
    LessonView::from_shell(&shell).map(Json).ok_or_else(no_lesson)
}

/// Discard the current lesson to start a new search.
#[utoipa::path(
    delete,
    path = "/lesson",
    responses((status = 204, description = "Lesson discarded"))
)]
pub async fn reset_lesson(State(state): State<Arc<AppState>>) -> StatusCode {
    state.shell.lock().await.reset();
    StatusCode::NO_CONTENT
}

/// Complete the current step and advance to the next one.
#[utoipa::path(
    post,
    path = "/lesson/next",
    responses(
        (status = 200, description = "Moved forward", body = LessonView),
        (status = 404, description = "No lesson loaded", body = ErrorResponse)
    )
)]
pub async fn next_step(State(state): State<Arc<AppState>>) -> Result<Json<LessonView>, ApiError> {
    update_shell(&state, |shell| shell.next_step().map(drop)).await
}

/// Go back to the previous step.
#[utoipa::path(
    post,
    path = "/lesson/previous",
    responses(
        (status = 200, description = "Moved back", body = LessonView),
        (status = 404, description = "No lesson loaded", body = ErrorResponse)
    )
)]
pub async fn previous_step(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LessonView>, ApiError> {
    update_shell(&state, |shell| shell.previous_step().map(drop)).await
}

/// Mark the current step as completed.
#[utoipa::path(
    post,
    path = "/lesson/complete",
    responses(
        (status = 200, description = "Step marked complete", body = LessonView),
        (status = 404, description = "No lesson loaded", body = ErrorResponse)
    )
)]
pub async fn complete_step(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LessonView>, ApiError> {
    update_shell(&state, |shell| shell.mark_complete()).await
}

/// Jump to a specific step.
#[utoipa::path(
    put,
    path = "/lesson/current-step",
    request_body = SelectStepPayload,
    responses(
        (status = 200, description = "Step selected", body = LessonView),
        (status = 400, description = "Step index out of range", body = ErrorResponse),
        (status = 404, description = "No lesson loaded", body = ErrorResponse)
    )
)]
pub async fn select_step(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SelectStepPayload>,
) -> Result<Json<LessonView>, ApiError> {
    update_shell(&state, |shell| shell.select_step(payload.index).map(drop)).await
}

/// Report whether lesson generation has an API key.
#[utoipa::path(
    get,
    path = "/credentials",
    responses((status = 200, description = "Credential status", body = CredentialStatus))
)]
pub async fn get_credentials(State(state): State<Arc<AppState>>) -> Json<CredentialStatus> {
    Json(CredentialStatus {
        configured: state.lesson_service().await.is_some(),
    })
}

/// Store a new API key and use it for subsequent lessons.
#[utoipa::path(
    put,
    path = "/credentials",
    request_body = ApiKeyPayload,
    responses(
        (status = 204, description = "API key stored"),
        (status = 400, description = "API key is empty", body = ErrorResponse)
    )
)]
pub async fn set_credentials(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ApiKeyPayload>,
) -> Result<StatusCode, ApiError> {
    state
        .credentials
        .store(&payload.api_key)
        .map_err(ApiError::from_credentials)?;
    state.use_api_key(payload.api_key.trim()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove the stored API key.
#[utoipa::path(
    delete,
    path = "/credentials",
    responses((status = 204, description = "API key removed"))
)]
pub async fn clear_credentials(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.credentials.clear().map_err(ApiError::from_credentials)?;
    state.forget_api_key().await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::{config::Config, router::create_router, state::AppState};
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use httpmock::prelude::*;
    use lesson_core::credentials::{CredentialStore, MemoryCredentialStore};
    use serde_json::{Value, json};
    use std::{path::PathBuf, sync::Arc, time::Duration};
    use tower::ServiceExt;
    use tracing::Level;

    const GUITAR_LESSON: &str = r#"{"title":"Guitar 101","steps":[{"title":"Tuning"},{"title":"Chords","examples":["E minor"]},{"title":"Strumming"}]}"#;

    fn test_config(api_base: String) -> Config {
        Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            openai_api_key: None,
            api_base,
            request_timeout: Duration::from_secs(5),
            credentials_path: PathBuf::from("unused.json"),
            log_level: Level::INFO,
        }
    }

    fn app(api_base: String, api_key: Option<&str>) -> (Router, Arc<AppState>) {
        let store = match api_key {
            Some(key) => MemoryCredentialStore::with_key(key).unwrap(),
            None => MemoryCredentialStore::new(),
        };
        let credentials: Arc<dyn CredentialStore> = Arc::new(store);
        let state = Arc::new(AppState::new(test_config(api_base), credentials).unwrap());
        (create_router(state.clone()), state)
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn completion(content: &str) -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[tokio::test]
    async fn test_create_lesson_requires_api_key() {
        let (router, _) = app("http://127.0.0.1:9".to_string(), None);
        let (status, body) = send(
            &router,
            Method::POST,
            "/lessons",
            Some(json!({ "topic": "Guitar Basics" })),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
        assert!(body["message"].as_str().unwrap().contains("API key"));
    }

    #[tokio::test]
    async fn test_credentials_lifecycle() {
        let (router, state) = app("http://127.0.0.1:9".to_string(), None);

        let (status, body) = send(&router, Method::GET, "/credentials", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "configured": false }));

        let (status, _) = send(&router, Method::PUT, "/credentials", Some(json!({ "apiKey": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&router, Method::PUT, "/credentials", Some(json!({ "apiKey": " sk-new " }))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.credentials.load().unwrap(), Some("sk-new".to_string()));
        let (_, body) = send(&router, Method::GET, "/credentials", None).await;
        assert_eq!(body, json!({ "configured": true }));

        let (status, _) = send(&router, Method::DELETE, "/credentials", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.credentials.load().unwrap(), None);
        let (_, body) = send(&router, Method::GET, "/credentials", None).await;
        assert_eq!(body, json!({ "configured": false }));
    }

    #[tokio::test]
    async fn test_lesson_flow() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test");
                then.status(200).json_body(completion(GUITAR_LESSON));
            })
            .await;
        let (router, _) = app(server.base_url(), Some("sk-test"));

        let (status, body) = send(
            &router,
            Method::POST,
            "/lessons",
            Some(json!({ "topic": "Guitar Basics" })),
        )
        .await;
        mock.assert_async().await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["lesson"]["title"], "Guitar 101");
        assert_eq!(body["lesson"]["topic"], "Guitar Basics");
        assert_eq!(body["lesson"]["difficulty"], "beginner");
        assert_eq!(body["lesson"]["estimatedTime"], "15-20 minutes");
        assert_eq!(body["lesson"]["steps"][1]["examples"], json!(["E minor"]));
        assert_eq!(body["currentStep"], 0);
        assert_eq!(body["progress"]["percent"], 33);

        let (status, body) = send(&router, Method::POST, "/lesson/next", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentStep"], 1);
        assert_eq!(body["completedSteps"], json!([0]));

        let (status, body) = send(&router, Method::POST, "/lesson/previous", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentStep"], 0);

        let (status, body) = send(
            &router,
            Method::PUT,
            "/lesson/current-step",
            Some(json!({ "index": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress"]["percent"], 100);

        let (status, body) = send(&router, Method::POST, "/lesson/complete", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["completedSteps"], json!([0, 2]));

        let (status, _) = send(
            &router,
            Method::PUT,
            "/lesson/current-step",
            Some(json!({ "index": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&router, Method::DELETE, "/lesson", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&router, Method::GET, "/lesson", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_previous_lesson() {
        let server = MockServer::start_async().await;
        let mut ok = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(completion(GUITAR_LESSON));
            })
            .await;
        let (router, _) = app(server.base_url(), Some("sk-test"));

        let (status, first) = send(&router, Method::POST, "/lessons", Some(json!({ "topic": "Guitar" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        ok.delete_async().await;

        let failing = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(500);
            })
            .await;

        let (status, body) = send(&router, Method::POST, "/lessons", Some(json!({ "topic": "Piano" }))).await;
        failing.assert_hits_async(1).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"], "Failed to generate lesson. Please try again.");

        let (status, current) = send(&router, Method::GET, "/lesson", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(current["lesson"]["id"], first["lesson"]["id"]);
        assert_eq!(current["isLoading"], false);
    }

    #[tokio::test]
    async fn test_malformed_content_is_bad_gateway() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(completion("I cannot help with that."));
            })
            .await;
        let (router, _) = app(server.base_url(), Some("sk-test"));

        let (status, body) = send(&router, Method::POST, "/lessons", Some(json!({ "topic": "Guitar" }))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"], "Failed to generate lesson. Please try again.");
    }

    #[tokio::test]
    async fn test_blank_topic_is_rejected_without_calling_service() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(completion(GUITAR_LESSON));
            })
            .await;
        let (router, _) = app(server.base_url(), Some("sk-test"));

        let (status, _) = send(&router, Method::POST, "/lessons", Some(json!({ "topic": "   " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_navigation_without_lesson_is_not_found() {
        let (router, _) = app("http://127.0.0.1:9".to_string(), None);
        for uri in ["/lesson/next", "/lesson/previous", "/lesson/complete"] {
            let (status, _) = send(&router, Method::POST, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
        let (status, _) = send(&router, Method::GET, "/lesson", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_new_lesson_view_starts_fresh() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(completion(GUITAR_LESSON));
            })
            .await;
        let (router, _) = app(server.base_url(), Some("sk-test"));

        let (_, first) = send(&router, Method::POST, "/lessons", Some(json!({ "topic": "Guitar" }))).await;
        send(&router, Method::POST, "/lesson/next", None).await;
        send(&router, Method::POST, "/lesson/next", None).await;

        let (status, second) = send(&router, Method::POST, "/lessons", Some(json!({ "topic": "Guitar" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_ne!(second["lesson"]["id"], first["lesson"]["id"]);
        assert_eq!(second["currentStep"], 0);
        assert_eq!(second["completedSteps"], json!([]));
        assert_eq!(second["progress"]["percent"], 33);
        assert_eq!(second["isLoading"], false);

        let (_, current) = send(&router, Method::GET, "/lesson", None).await;
        assert_eq!(current, second);
    }
}
