//! API Models
//!
//! Request payloads and response bodies for the REST API, annotated with
//! `utoipa` for the generated OpenAPI document.

use lesson_core::{
    lesson::{Difficulty, LearningStyle, Lesson, LessonRequest},
    shell::{LessonShell, Progress},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonPayload {
    #[schema(example = "Guitar Basics")]
    pub topic: String,
    #[schema(value_type = Option<String>, example = "beginner")]
    pub difficulty: Option<Difficulty>,
    #[schema(value_type = Option<String>, example = "practical")]
    pub learning_style: Option<LearningStyle>,
}

impl CreateLessonPayload {
    pub fn into_request(self) -> LessonRequest {
        LessonRequest {
            difficulty: self.difficulty,
            learning_style: self.learning_style,
            ..LessonRequest::new(self.topic)
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct SelectStepPayload {
    /// 0-based index of the step to show.
    #[schema(example = 2)]
    pub index: usize,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyPayload {
    #[schema(example = "sk-...")]
    pub api_key: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
pub struct CredentialStatus {
    pub configured: bool,
}

/// Everything a client needs to render the current lesson.
#[derive(Serialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LessonView {
    #[schema(value_type = Object)]
    pub lesson: Lesson,
    /// 0-based index of the active step.
    pub current_step: usize,
    pub completed_steps: Vec<usize>,
    #[schema(value_type = Object)]
    pub progress: Progress,
    pub is_loading: bool,
}

impl LessonView {
    /// Snapshot of the shell, or `None` when no lesson is loaded.
    pub fn from_shell(shell: &LessonShell) -> Option<Self> {
        Some(Self {
            lesson: shell.lesson()?.clone(),
            current_step: shell.current_step(),
            completed_steps: shell.completed_steps(),
            progress: shell.progress()?,
            is_loading: shell.is_loading(),
        })
    }

    /// View of a lesson that was just installed: first step active, nothing
    /// completed.
    pub fn fresh(lesson: Lesson) -> Self {
        let progress = Progress::at(0, lesson.steps.len(), 0);
        Self {
            lesson,
            current_step: 0,
            completed_steps: Vec::new(),
            progress,
            is_loading: false,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::lesson::{GeneratedLesson, GeneratedStep};

    #[test]
    fn test_create_payload_into_request() {
        let payload: CreateLessonPayload = serde_json::from_str(
            r#"{"topic":"  Guitar Basics ","difficulty":"advanced","learningStyle":"practical"}"#,
        )
        .unwrap();
        let request = payload.into_request();
        assert_eq!(request.topic, "Guitar Basics");
        assert_eq!(request.difficulty, Some(Difficulty::Advanced));
        assert_eq!(request.learning_style, Some(LearningStyle::Practical));
    }

    #[test]
    fn test_create_payload_optional_fields() {
        let payload: CreateLessonPayload = serde_json::from_str(r#"{"topic":"Chess"}"#).unwrap();
        let request = payload.into_request();
        assert_eq!(request.difficulty, None);
        assert_eq!(request.learning_style, None);
    }

    #[test]
    fn test_lesson_view_from_shell() {
        let mut shell = LessonShell::new();
        assert!(LessonView::from_shell(&shell).is_none());

        let request = LessonRequest::new("Chess");
        shell.begin_search(&request).unwrap();
        shell.complete_search(
            &request,
            GeneratedLesson {
                title: "Chess".into(),
                description: "Openings".into(),
                difficulty: Difficulty::Beginner,
                estimated_time: "15-20 minutes".into(),
                steps: vec![GeneratedStep {
                    title: "Pawns".into(),
                    content: "They move forward.".into(),
                    key_points: vec![],
                    examples: vec![],
                }],
            },
        );

        let view = LessonView::from_shell(&shell).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["currentStep"], 0);
        assert_eq!(json["isLoading"], false);
        assert_eq!(json["progress"]["percent"], 100);
        assert_eq!(json["lesson"]["steps"][0]["id"], "step-1");
        assert_eq!(json["lesson"]["estimatedTime"], "15-20 minutes");
    }

    #[test]
    fn test_fresh_view_starts_at_first_step() {
        let mut shell = LessonShell::new();
        let request = LessonRequest::new("Chess");
        shell.begin_search(&request).unwrap();
        let lesson = shell
            .complete_search(
                &request,
                GeneratedLesson {
                    title: "Chess".into(),
                    description: "Openings".into(),
                    difficulty: Difficulty::Beginner,
                    estimated_time: "15-20 minutes".into(),
                    steps: ["Pawns", "Knights"]
                        .iter()
                        .map(|t| GeneratedStep {
                            title: t.to_string(),
                            content: String::new(),
                            key_points: vec![],
                            examples: vec![],
                        })
                        .collect(),
                },
            )
            .clone();
        shell.reset();

        let json = serde_json::to_value(LessonView::fresh(lesson)).unwrap();
        assert_eq!(json["currentStep"], 0);
        assert_eq!(json["completedSteps"], serde_json::json!([]));
        assert_eq!(json["progress"]["percent"], 50);
        assert_eq!(json["lesson"]["steps"][1]["id"], "step-2");
    }
}
