//! Error types for lesson generation.

/// Detailed failure inside the generator. Never leaves the generator; it is
/// logged and collapsed into [`LessonError::GenerationFailed`].
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Transport failure or non-success status from the remote service.
    #[error("AI API error: {0}")]
    RemoteService(String),
    /// The call succeeded but the payload could not be parsed into a lesson.
    #[error("Malformed lesson payload: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced by a `LessonService`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LessonError {
    #[error("A topic is required to generate a lesson.")]
    EmptyTopic,
    #[error("Failed to generate lesson. Please try again.")]
    GenerationFailed,
}

impl From<GenerationError> for LessonError {
    fn from(_: GenerationError) -> Self {
        LessonError::GenerationFailed
    }
}
