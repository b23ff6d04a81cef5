//! Lesson Shell
//!
//! This module holds the presentation state shared by every front end: the
//! current lesson (or none), the active step, the loading flag and which
//! steps the learner has completed. Front ends route user actions through
//! it; it is the only place where a generated lesson receives identifiers.

use crate::{
    error::LessonError,
    generator::LessonService,
    lesson::{GeneratedLesson, Lesson, LessonRequest, LessonStep},
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShellError {
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error("A lesson is already being generated.")]
    GenerationInProgress,
    #[error("No lesson is loaded.")]
    NoLesson,
    #[error("Step {index} is out of range for a lesson with {len} steps.")]
    StepOutOfRange { index: usize, len: usize },
}

/// Position of the learner within the current lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// 1-based number of the active step, 0 when the lesson has no steps.
    pub current: usize,
    pub total: usize,
    /// Rounded share of the lesson reached, from 0 to 100.
    pub percent: u8,
    pub completed: usize,
}

/// Presentation state for a single learner.
#[derive(Debug, Default)]
pub struct LessonShell {
    lesson: Option<Lesson>,
    current_step: usize,
    /// Shared with the guard of the search in flight, which clears it if
    /// that search is dropped before finishing.
    loading: Arc<AtomicBool>,
    completed: BTreeSet<usize>,
}

impl LessonShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lesson(&self) -> Option<&Lesson> {
        self.lesson.as_ref()
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Indices of completed steps in ascending order.
    pub fn completed_steps(&self) -> Vec<usize> {
        self.completed.iter().copied().collect()
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    pub fn current_step_data(&self) -> Option<&LessonStep> {
        self.lesson.as_ref()?.steps.get(self.current_step)
    }

    /// Marks a search as outstanding.
    ///
    /// Blank topics are rejected, and so is a second search while one is
    /// still in flight.
    pub fn begin_search(&mut self, request: &LessonRequest) -> Result<(), ShellError> {
        if !request.has_topic() {
            return Err(LessonError::EmptyTopic.into());
        }
        if self.loading.swap(true, Ordering::SeqCst) {
            return Err(ShellError::GenerationInProgress);
        }
        Ok(())
    }

    fn start_search(&mut self, request: &LessonRequest) -> Result<LoadingGuard, ShellError> {
        self.begin_search(request)?;
        Ok(LoadingGuard {
            loading: Arc::clone(&self.loading),
            armed: true,
        })
    }

    /// Installs a freshly generated lesson, replacing any previous one in full.
    pub fn complete_search(
        &mut self,
        request: &LessonRequest,
        generated: GeneratedLesson,
    ) -> &Lesson {
        self.loading.store(false, Ordering::SeqCst);
        self.current_step = 0;
        self.completed.clear();
        self.lesson.insert(Lesson::assemble(request, generated))
    }

    /// Ends a failed search. Whatever was shown before stays in place.
    pub fn fail_search(&mut self) {
        self.loading.store(false, Ordering::SeqCst);
    }

    /// Discards the current lesson so a new search can start.
    pub fn reset(&mut self) {
        self.lesson = None;
        self.current_step = 0;
        self.completed.clear();
    }

    fn step_count(&self) -> Result<usize, ShellError> {
        self.lesson
            .as_ref()
            .map(|lesson| lesson.steps.len())
            .ok_or(ShellError::NoLesson)
    }

    /// Completes the active step and moves forward. Stays put on the last step.
    pub fn next_step(&mut self) -> Result<usize, ShellError> {
        let len = self.step_count()?;
        if self.current_step + 1 < len {
            self.completed.insert(self.current_step);
            self.current_step += 1;
        }
        Ok(self.current_step)
    }

    /// Moves back one step. Stays put on the first step.
    pub fn previous_step(&mut self) -> Result<usize, ShellError> {
        self.step_count()?;
        self.current_step = self.current_step.saturating_sub(1);
        Ok(self.current_step)
    }

    /// Jumps to the step at `index` (0-based).
    pub fn select_step(&mut self, index: usize) -> Result<usize, ShellError> {
        let len = self.step_count()?;
        if index >= len {
            return Err(ShellError::StepOutOfRange { index, len });
        }
        self.current_step = index;
        Ok(index)
    }

    /// Marks the active step as completed.
    pub fn mark_complete(&mut self) -> Result<(), ShellError> {
        let len = self.step_count()?;
        if self.current_step < len {
            self.completed.insert(self.current_step);
        }
        Ok(())
    }

    pub fn progress(&self) -> Option<Progress> {
        let total = self.lesson.as_ref()?.steps.len();
        Some(Progress::at(self.current_step, total, self.completed.len()))
    }
}

impl Progress {
    /// Progress with the step at `index` (0-based) active.
    pub fn at(index: usize, total: usize, completed: usize) -> Self {
        if total == 0 {
            return Self {
                current: 0,
                total: 0,
                percent: 0,
                completed: 0,
            };
        }
        let current = index + 1;
        let percent = ((current as f64 / total as f64) * 100.0).round() as u8;
        Self {
            current,
            total,
            percent,
            completed,
        }
    }
}

/// Clears the loading flag when a search is abandoned mid-flight.
struct LoadingGuard {
    loading: Arc<AtomicBool>,
    armed: bool,
}

impl LoadingGuard {
    /// Hands the flag back to the shell. Call with the shell lock held.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.armed {
            self.loading.store(false, Ordering::SeqCst);
            warn!("Lesson search dropped before it finished");
        }
    }
}

/// Runs one search against `service` and installs the result.
///
/// The shell lock is released while the generator call is outstanding, so
/// navigation on the previous lesson keeps working; a concurrent search is
/// rejected with [`ShellError::GenerationInProgress`]. On failure the
/// previous lesson is left untouched. Dropping the returned future while the
/// call is outstanding ends the search as if it had failed.
pub async fn search(
    shell: &Mutex<LessonShell>,
    service: &dyn LessonService,
    request: LessonRequest,
) -> Result<Lesson, ShellError> {
    let guard = shell.lock().await.start_search(&request)?;
    let result = service.generate_lesson(&request).await;

    let mut state = shell.lock().await;
    guard.disarm();
    match result {
        Ok(generated) => {
            let lesson = state.complete_search(&request, generated).clone();
            info!(lesson_id = %lesson.id, steps = lesson.steps.len(), "Lesson installed");
            Ok(lesson)
        }
        Err(err) => {
            state.fail_search();
            warn!(topic = %request.topic, error = %err, "Lesson search failed");
            Err(err.into())
        }
    }
}
