//! mm-backend
//!
//! A small HTTP service that answers chat completion requests by handing the
//! last message of a conversation to an external text generation service.

pub mod api;
pub mod config;
pub mod error;
pub mod generator;

pub use error::{AppError, Result};

use std::sync::Arc;

use generator::GeneratorProvider;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub generator: Arc<dyn GeneratorProvider>,
}

impl AppState {
    pub fn new(settings: config::Settings, generator: Arc<dyn GeneratorProvider>) -> Self {
        Self {
            settings: Arc::new(settings),
            generator,
        }
    }

    /// Build the state, creating the generator from `settings.generator`
    pub fn from_settings(settings: config::Settings) -> Result<Self> {
        let generator = generator::create_generator(&settings.generator)?;
        Ok(Self::new(settings, generator))
    }
}
