//! Lesson Data Model
//!
//! This module defines the request and lesson shapes exchanged between the
//! presentation layer and the lesson generator, along with the wire payload
//! returned by the model and the normalization that turns it into a fully
//! populated lesson.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fallback estimated duration when the model does not provide one.
pub const DEFAULT_ESTIMATED_TIME: &str = "15-20 minutes";

/// Placeholder body for a step the model returned without content.
pub const PLACEHOLDER_CONTENT: &str = "Content will be generated...";

/// How demanding the generated lesson should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// The learner's preferred style. Carried with the request but not yet used
/// when formatting the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    Visual,
    Practical,
    Theoretical,
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearningStyle::Visual => write!(f, "visual"),
            LearningStyle::Practical => write!(f, "practical"),
            LearningStyle::Theoretical => write!(f, "theoretical"),
        }
    }
}

impl FromStr for LearningStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "visual" => Ok(LearningStyle::Visual),
            "practical" => Ok(LearningStyle::Practical),
            "theoretical" => Ok(LearningStyle::Theoretical),
            other => Err(format!("unknown learning style '{}'", other)),
        }
    }
}

/// Input to the lesson generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRequest {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_style: Option<LearningStyle>,
}

impl LessonRequest {
    /// Creates a request for `topic` with no difficulty or style preference.
    /// Surrounding whitespace is stripped from the topic.
    pub fn new(topic: impl AsRef<str>) -> Self {
        Self {
            topic: topic.as_ref().trim().to_string(),
            difficulty: None,
            learning_style: None,
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn with_learning_style(mut self, style: LearningStyle) -> Self {
        self.learning_style = Some(style);
        self
    }

    /// The requested difficulty, or `beginner` when none was given.
    pub fn effective_difficulty(&self) -> Difficulty {
        self.difficulty.unwrap_or_default()
    }

    pub fn has_topic(&self) -> bool {
        !self.topic.trim().is_empty()
    }
}

/// One page of generated instructional content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedStep {
    pub title: String,
    pub content: String,
    pub key_points: Vec<String>,
    pub examples: Vec<String>,
}

/// A normalized lesson as produced by the generator. Carries no identifiers;
/// those are assigned when the lesson is installed by the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLesson {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_time: String,
    pub steps: Vec<GeneratedStep>,
}

/// The lesson payload exactly as the model returned it. Every field may be
/// missing or null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLesson {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub estimated_time: Option<String>,
    pub steps: Option<Vec<RawStep>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStep {
    pub title: Option<String>,
    pub content: Option<String>,
    pub key_points: Option<Vec<String>>,
    pub examples: Option<Vec<String>>,
}

/// Returns the value when present and non-blank.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fills every missing field of `raw` with a default derived from `request`.
///
/// The result is always fully populated. Step order is kept as received, and
/// a payload without a `steps` array yields an empty step list.
pub fn normalize(raw: RawLesson, request: &LessonRequest) -> GeneratedLesson {
    let topic = &request.topic;

    let difficulty = raw
        .difficulty
        .as_deref()
        .and_then(|d| d.parse::<Difficulty>().ok())
        .unwrap_or_else(|| request.effective_difficulty());

    let steps = raw
        .steps
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, step)| GeneratedStep {
            title: present(step.title).unwrap_or_else(|| format!("Step {}", index + 1)),
            content: present(step.content).unwrap_or_else(|| PLACEHOLDER_CONTENT.to_string()),
            key_points: step.key_points.unwrap_or_default(),
            examples: step.examples.unwrap_or_default(),
        })
        .collect();

    GeneratedLesson {
        title: present(raw.title).unwrap_or_else(|| format!("Learn {}", topic)),
        description: present(raw.description)
            .unwrap_or_else(|| format!("Master {} with this AI-generated lesson", topic)),
        difficulty,
        estimated_time: present(raw.estimated_time)
            .unwrap_or_else(|| DEFAULT_ESTIMATED_TIME.to_string()),
        steps,
    }
}

/// A step of an installed lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStep {
    pub id: String,
    pub title: String,
    pub content: String,
    pub key_points: Vec<String>,
    pub examples: Vec<String>,
}

/// The lesson held by the shell, with identity layered on top of the
/// generated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub topic: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_time: String,
    pub steps: Vec<LessonStep>,
    pub created_at: DateTime<Utc>,
}

impl Lesson {
    /// Assigns a fresh lesson id, 1-based step ids and a creation timestamp.
    pub fn assemble(request: &LessonRequest, generated: GeneratedLesson) -> Self {
        let steps = generated
            .steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| LessonStep {
                id: format!("step-{}", index + 1),
                title: step.title,
                content: step.content,
                key_points: step.key_points,
                examples: step.examples,
            })
            .collect();

        Self {
            id: format!("lesson-{}", Uuid::new_v4()),
            topic: request.topic.clone(),
            title: generated.title,
            description: generated.description,
            difficulty: generated.difficulty,
            estimated_time: generated.estimated_time,
            steps,
            created_at: Utc::now(),
        }
    }
}
