//! Core of the lesson assistant: the lesson data model, the generator that
//! asks an OpenAI-compatible model for a lesson, credential storage and the
//! presentation shell shared by the HTTP and terminal front ends.

pub mod credentials;
pub mod error;
pub mod generator;
pub mod lesson;
pub mod prompt;
pub mod shell;

pub use error::LessonError;
pub use generator::{LessonService, OpenAILessonService};
pub use lesson::{Difficulty, GeneratedLesson, LearningStyle, Lesson, LessonRequest};
pub use shell::{LessonShell, ShellError};
