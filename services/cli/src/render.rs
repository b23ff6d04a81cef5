//! Plain-text rendering of lessons for the terminal.

use lesson_core::{
    lesson::{Lesson, LessonStep},
    shell::{LessonShell, Progress},
};
use std::fmt::Write;

const BAR_WIDTH: usize = 20;

/// Lesson header: title, description and badges.
pub fn overview(lesson: &Lesson) -> String {
    format!(
        "{}\n{}\n[{}] [{}] [{} steps]\n",
        lesson.title,
        lesson.description,
        lesson.difficulty,
        lesson.estimated_time,
        lesson.steps.len()
    )
}

fn bullets(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}:", heading);
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}

/// A single step with its key points and examples.
pub fn step(step: &LessonStep, number: usize, total: usize, completed: bool) -> String {
    let mut out = String::new();
    let mark = if completed { " (completed)" } else { "" };
    let _ = writeln!(out, "Step {} of {}: {}{}", number, total, step.title, mark);
    let _ = writeln!(out, "\n{}", step.content);
    bullets(&mut out, "Key points", &step.key_points);
    bullets(&mut out, "Examples", &step.examples);
    out
}

/// The active step of the shell's lesson.
pub fn current_step(shell: &LessonShell) -> String {
    let Some(lesson) = shell.lesson() else {
        return "No lesson loaded.\n".to_string();
    };
    match shell.current_step_data() {
        Some(data) => step(
            data,
            shell.current_step() + 1,
            lesson.steps.len(),
            shell.is_completed(shell.current_step()),
        ),
        None => "This lesson has no steps.\n".to_string(),
    }
}

pub fn progress_bar(progress: &Progress) -> String {
    let filled = BAR_WIDTH * progress.percent as usize / 100;
    format!(
        "[{}{}] {}% (step {} of {}, {} completed)",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        progress.percent,
        progress.current,
        progress.total,
        progress.completed
    )
}

/// Step list with the current position and completed steps marked.
pub fn outline(shell: &LessonShell) -> String {
    let Some(lesson) = shell.lesson() else {
        return "No lesson loaded.\n".to_string();
    };
    let mut out = String::new();
    if let Some(progress) = shell.progress() {
        let _ = writeln!(out, "{}", progress_bar(&progress));
    }
    for (index, item) in lesson.steps.iter().enumerate() {
        let marker = if index == shell.current_step() {
            '>'
        } else if shell.is_completed(index) {
            'x'
        } else {
            ' '
        };
        let _ = writeln!(out, " {} {}. {}", marker, index + 1, item.title);
    }
    out
}
