//! `lesson` command-line client.
//!
//! Generates lessons directly against an OpenAI-compatible API and lets the
//! learner walk through them in the terminal.

mod cli;
mod learn;
mod render;

use anyhow::{Context, anyhow};
use clap::Parser;
use cli::{Cli, Command, ConnectionArgs, KeyAction, LessonArgs};
use learn::Session;
use lesson_core::{
    credentials::{CredentialError, CredentialStore, FileCredentialStore, mask_key},
    generator::OpenAILessonService,
    shell::{self, LessonShell},
};
use std::io::Write;
use tokio::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
}

fn run_key(store: &FileCredentialStore, action: KeyAction) -> anyhow::Result<()> {
    match action {
        KeyAction::Set { key } => match store.store(&key) {
            Ok(()) => println!("API key saved to {}", store.path().display()),
            Err(CredentialError::EmptyKey) => {
                return Err(anyhow!("The API key must not be empty."));
            }
            Err(err) => return Err(err).context("Failed to save the API key"),
        },
        KeyAction::Show => match store.load().context("Failed to read the credential file")? {
            Some(key) => println!("{}", mask_key(&key)),
            None => println!("No API key stored."),
        },
        KeyAction::Clear => {
            store.clear().context("Failed to clear the API key")?;
            println!("API key removed.");
        }
    }
    Ok(())
}

fn build_service(
    connection: &ConnectionArgs,
    store: &FileCredentialStore,
) -> anyhow::Result<OpenAILessonService> {
    let api_key = match connection.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => store
            .load()
            .context("Failed to read the credential file")?
            .ok_or_else(|| anyhow!("No API key configured. Run `lesson key set <KEY>` first."))?,
    };
    debug!(api_base = %connection.api_base, timeout_secs = connection.timeout, "Building lesson generator");
    OpenAILessonService::with_options(api_key, &connection.api_base, connection.timeout())
        .context("Failed to build the HTTP client")
}

async fn run_generate(
    service: &OpenAILessonService,
    lesson: LessonArgs,
    json: bool,
) -> anyhow::Result<()> {
    let request = lesson.to_request();
    let shell = Mutex::new(LessonShell::new());
    info!(topic = %request.topic, "Generating lesson");
    let lesson = shell::search(&shell, service, request).await?;

    let mut stdout = std::io::stdout().lock();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&lesson)?)?;
        return Ok(());
    }

    writeln!(stdout, "{}", render::overview(&lesson))?;
    let total = lesson.steps.len();
    for (index, step) in lesson.steps.iter().enumerate() {
        writeln!(stdout, "{}", render::step(step, index + 1, total, false))?;
    }
    Ok(())
}

async fn run_learn(service: &OpenAILessonService, lesson: LessonArgs) -> anyhow::Result<()> {
    let request = lesson.to_request();
    let session = Session::new(service, request.clone());
    let mut stdout = std::io::stdout();

    session.search(request, &mut stdout).await?;
    writeln!(stdout, "\nType 'h' for a list of commands.")?;
    session
        .run(tokio::io::BufReader::new(tokio::io::stdin()), &mut stdout)
        .await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = FileCredentialStore::new(cli.connection.credentials_path());

    match cli.command {
        Command::Key { action } => run_key(&store, action),
        Command::Generate { lesson, json } => {
            let service = build_service(&cli.connection, &store)?;
            run_generate(&service, lesson, json).await
        }
        Command::Learn { lesson } => {
            let service = build_service(&cli.connection, &store)?;
            run_learn(&service, lesson).await
        }
    }
}
