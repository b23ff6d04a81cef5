//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the presentation
//! shell, the credential store and the lesson generator built from the
//! current API key.

use crate::config::Config;
use anyhow::Context;
use lesson_core::{
    credentials::CredentialStore,
    generator::{LessonService, OpenAILessonService},
    shell::LessonShell,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub shell: Mutex<LessonShell>,
    pub credentials: Arc<dyn CredentialStore>,
    pub config: Arc<Config>,
    lesson_service: RwLock<Option<Arc<dyn LessonService>>>,
}

impl AppState {
    /// Builds the state, constructing a generator if a key is available.
    ///
    /// A key from the environment wins over one in the credential store.
    pub fn new(config: Config, credentials: Arc<dyn CredentialStore>) -> anyhow::Result<Self> {
        let api_key = match &config.openai_api_key {
            Some(key) => Some(key.clone()),
            None => credentials
                .load()
                .context("Failed to read the credential store")?,
        };

        let lesson_service = match api_key {
            Some(key) => {
                info!("API key found. Lesson generation enabled.");
                Some(build_service(&config, &key)?)
            }
            None => {
                info!("No API key configured. Lesson generation disabled until one is set.");
                None
            }
        };

        Ok(Self {
            shell: Mutex::new(LessonShell::new()),
            credentials,
            config: Arc::new(config),
            lesson_service: RwLock::new(lesson_service),
        })
    }

    /// The generator for the current key, if one is configured.
    pub async fn lesson_service(&self) -> Option<Arc<dyn LessonService>> {
        self.lesson_service.read().await.clone()
    }

    /// Rebuilds the generator for `api_key`. The key must already be stored.
    pub async fn use_api_key(&self, api_key: &str) -> anyhow::Result<()> {
        let service = build_service(&self.config, api_key)?;
        *self.lesson_service.write().await = Some(service);
        info!("API key updated.");
        Ok(())
    }

    /// Disables lesson generation until a new key is set.
    pub async fn forget_api_key(&self) {
        *self.lesson_service.write().await = None;
        info!("API key removed.");
    }
}

fn build_service(config: &Config, api_key: &str) -> anyhow::Result<Arc<dyn LessonService>> {
    let service =
        OpenAILessonService::with_options(api_key, &config.api_base, config.request_timeout)
            .context("Failed to build HTTP client for the AI API")?;
    Ok(Arc::new(service))
}
