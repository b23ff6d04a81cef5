//! Interactive study session.
//!
//! Reads one command per line and drives the lesson shell: step navigation,
//! completion, progress and starting over on a new topic.

use crate::render;
use lesson_core::{
    generator::LessonService,
    lesson::LessonRequest,
    shell::{self, LessonShell, ShellError},
};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;

pub const HELP: &str = "\
Commands:
  n, next          complete this step and go to the next one
  p, prev          go back one step
  c, complete      mark this step as completed
  g, goto <n>      jump to step n
  s, status        show progress and the step list
  new <topic>      discard this lesson and generate a new one
  h, help          show this help
  q, quit          leave";

/// Commands that act on the loaded lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Next,
    Previous,
    Complete,
    /// 1-based step number as typed by the learner.
    Goto(usize),
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Move(Move),
    New(String),
    Help,
    Quit,
}

pub fn parse_action(line: &str) -> Result<Action, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "n" | "next" => Ok(Action::Move(Move::Next)),
        "p" | "prev" | "previous" => Ok(Action::Move(Move::Previous)),
        "c" | "complete" => Ok(Action::Move(Move::Complete)),
        "s" | "status" => Ok(Action::Move(Move::Status)),
        "h" | "help" | "?" => Ok(Action::Help),
        "q" | "quit" | "exit" => Ok(Action::Quit),
        "g" | "goto" => match rest.parse::<usize>() {
            Ok(number) if number >= 1 => Ok(Action::Move(Move::Goto(number))),
            _ => Err(format!("'{}' is not a step number.", rest)),
        },
        "new" if !rest.is_empty() => Ok(Action::New(rest.to_string())),
        "new" => Err("Usage: new <topic>".to_string()),
        "" => Err("Type 'h' for help.".to_string()),
        other => Err(format!("Unknown command '{}'. Type 'h' for help.", other)),
    }
}

/// An interactive session over one lesson shell.
pub struct Session<'a> {
    shell: Mutex<LessonShell>,
    service: &'a dyn LessonService,
    template: LessonRequest,
}

impl<'a> Session<'a> {
    /// `template` supplies the difficulty and style for later `new` searches.
    pub fn new(service: &'a dyn LessonService, template: LessonRequest) -> Self {
        Self {
            shell: Mutex::new(LessonShell::new()),
            service,
            template,
        }
    }

    #[cfg(test)]
    pub fn shell(&self) -> &Mutex<LessonShell> {
        &self.shell
    }

    /// Generates a lesson and shows its first step. On failure the previous
    /// lesson, if any, stays in place.
    pub async fn search<W: Write>(
        &self,
        request: LessonRequest,
        out: &mut W,
    ) -> anyhow::Result<bool> {
        writeln!(out, "Preparing your lesson on \"{}\"...", request.topic)?;
        match shell::search(&self.shell, self.service, request).await {
            Ok(lesson) => {
                writeln!(out, "\n{}", render::overview(&lesson))?;
                write!(out, "{}", render::current_step(&*self.shell.lock().await))?;
                Ok(true)
            }
            Err(err) => {
                writeln!(out, "{}", err)?;
                Ok(false)
            }
        }
    }

    /// Applies one action. Returns `false` when the learner quits.
    pub async fn apply<W: Write>(&self, action: Action, out: &mut W) -> anyhow::Result<bool> {
        match action {
            Action::Move(step) => self.navigate(step, out).await?,
            Action::New(topic) => {
                let request = LessonRequest {
                    topic,
                    ..self.template.clone()
                };
                self.search(request, out).await?;
            }
            Action::Help => writeln!(out, "{}", HELP)?,
            Action::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn navigate<W: Write>(&self, step: Move, out: &mut W) -> anyhow::Result<()> {
        let mut shell = self.shell.lock().await;
        let before = shell.current_step();
        let result = match step {
            Move::Next => shell.next_step().map(|after| {
                if after == before {
                    "You're on the final step. Use 'c' to mark it complete.\n".to_string()
                } else {
                    render::current_step(&shell)
                }
            }),
            Move::Previous => shell.previous_step().map(|after| {
                if after == before {
                    "You're already on the first step.\n".to_string()
                } else {
                    render::current_step(&shell)
                }
            }),
            Move::Complete => shell
                .mark_complete()
                .map(|_| format!("Step {} marked complete.\n", shell.current_step() + 1)),
            Move::Goto(number) => match number.checked_sub(1) {
                Some(index) => shell
                    .select_step(index)
                    .map(|_| render::current_step(&shell)),
                None => Err(match shell.lesson() {
                    Some(lesson) => ShellError::StepOutOfRange {
                        index: 0,
                        len: lesson.steps.len(),
                    },
                    None => ShellError::NoLesson,
                }),
            },
            Move::Status => Ok(render::outline(&shell)),
        };

        match result {
            Ok(text) => write!(out, "{}", text)?,
            Err(ShellError::StepOutOfRange { len, .. }) => {
                writeln!(out, "Pick a step between 1 and {}.", len)?
            }
            Err(err) => writeln!(out, "{}", err)?,
        }
        Ok(())
    }

    /// Reads commands until `quit` or end of input.
    pub async fn run<R, W>(&self, input: R, out: &mut W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        loop {
            write!(out, "\n> ")?;
            out.flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match parse_action(&line) {
                Ok(action) => {
                    if !self.apply(action, out).await? {
                        break;
                    }
                }
                Err(message) => writeln!(out, "{}", message)?,
            }
        }
        writeln!(out)?;
        Ok(())
    }
}
