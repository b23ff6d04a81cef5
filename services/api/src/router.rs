//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        ApiKeyPayload, CreateLessonPayload, CredentialStatus, ErrorResponse, LessonView,
        SelectStepPayload,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_lesson,
        handlers::get_lesson,
        handlers::reset_lesson,
        handlers::next_step,
        handlers::previous_step,
        handlers::complete_step,
        handlers::select_step,
        handlers::get_credentials,
        handlers::set_credentials,
        handlers::clear_credentials,
    ),
    components(
        schemas(CreateLessonPayload, SelectStepPayload, ApiKeyPayload, CredentialStatus, LessonView, ErrorResponse)
    ),
    tags(
        (name = "Lesson API", description = "AI-generated lessons with step-by-step navigation")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/lessons", post(handlers::create_lesson))
        .route(
            "/lesson",
            get(handlers::get_lesson).delete(handlers::reset_lesson),
        )
        .route("/lesson/next", post(handlers::next_step))
        .route("/lesson/previous", post(handlers::previous_step))
        .route("/lesson/complete", post(handlers::complete_step))
        .route("/lesson/current-step", put(handlers::select_step))
        .route(
            "/credentials",
            get(handlers::get_credentials)
                .put(handlers::set_credentials)
                .delete(handlers::clear_credentials),
        )
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
