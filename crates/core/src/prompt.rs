//! Prompt Construction
//!
//! Fixed generation parameters and the instruction text sent to the model.

use crate::lesson::LessonRequest;

/// Model identifier used for every generation call.
pub const CHAT_MODEL: &str = "gpt-4";

/// Upper bound on the size of the model's answer.
pub const MAX_TOKENS: u32 = 4000;

/// Sampling temperature for lesson generation.
pub const TEMPERATURE: f32 = 0.7;

/// System framing sent ahead of every lesson instruction.
pub const SYSTEM_PROMPT: &str = "You are an expert teacher who creates comprehensive, step-by-step learning lessons. Always respond with valid JSON in the exact format specified.";

/// Builds the user instruction for a lesson request.
///
/// The instruction embeds the topic and the effective difficulty, spells out
/// the JSON shape the model must return and lists the authoring constraints.
pub fn lesson_prompt(request: &LessonRequest) -> String {
    let topic = &request.topic;
    let difficulty = request.effective_difficulty();

    format!(
        r#"Create a comprehensive step-by-step learning lesson about "{topic}" for {difficulty} level.

Structure the response as JSON with this exact format:
{{
  "title": "Complete Guide to [Topic]",
  "description": "Brief description of what they'll learn",
  "difficulty": "{difficulty}",
  "estimatedTime": "X-Y minutes",
  "steps": [
    {{
      "title": "Step title",
      "content": "Detailed explanation (2-3 paragraphs)",
      "keyPoints": ["Key point 1", "Key point 2", "Key point 3"],
      "examples": ["Example 1", "Example 2"]
    }}
  ]
}}

Requirements:
- Create 4-6 logical learning steps
- Each step should build upon the previous one
- Include practical examples and key takeaways
- Make it engaging and easy to understand
- Focus on practical application
- Provide real-world context

Topic: {topic}
Difficulty: {difficulty}"#
    )
}
