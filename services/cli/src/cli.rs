//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use lesson_core::{
    generator::DEFAULT_API_BASE,
    lesson::{Difficulty, LearningStyle, LessonRequest},
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "lesson")]
#[command(about = "Generate step-by-step lessons on any topic with an AI model")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// API key; overrides the stored key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "AI_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,

    /// Request timeout in seconds
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    pub timeout: u64,

    /// Credential file; defaults to the platform config directory
    #[arg(long, env = "LESSON_CREDENTIALS_PATH", global = true)]
    pub credentials: Option<PathBuf>,
}

impl ConnectionArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.credentials.clone().unwrap_or_else(default_credentials_path)
    }
}

/// `<config dir>/lesson-assistant/credentials.json`, or a file in the
/// working directory when no config directory exists.
pub fn default_credentials_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("lesson-assistant").join("credentials.json"))
        .unwrap_or_else(|| PathBuf::from(".lesson-credentials.json"))
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Generate a lesson and print it
    Generate {
        #[command(flatten)]
        lesson: LessonArgs,

        /// Print the lesson as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a lesson and study it step by step
    Learn {
        #[command(flatten)]
        lesson: LessonArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyAction {
    /// Store an API key
    Set { key: String },
    /// Show the stored key, masked
    Show,
    /// Remove the stored key
    Clear,
}

#[derive(Args, Debug)]
pub struct LessonArgs {
    /// What to learn about
    #[arg(required = true, num_args = 1..)]
    pub topic: Vec<String>,

    /// beginner, intermediate or advanced
    #[arg(short, long)]
    pub difficulty: Option<Difficulty>,

    /// visual, practical or theoretical
    #[arg(short, long)]
    pub style: Option<LearningStyle>,
}

impl LessonArgs {
    pub fn to_request(&self) -> LessonRequest {
        LessonRequest {
            difficulty: self.difficulty,
            learning_style: self.style,
            ..LessonRequest::new(self.topic.join(" "))
        }
    }
}
