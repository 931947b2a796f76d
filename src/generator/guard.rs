//! Scoped acquisition of generator sessions

use tracing::debug;

use crate::error::{AppError, Result};
use crate::generator::traits::{GeneratorProvider, GeneratorSession};

/// Owns a [`GeneratorSession`] and closes it exactly once, either on
/// [`release`](Self::release) or when dropped (error return, panic, or a
/// cancelled request future).
pub struct GeneratorGuard {
    session: Option<Box<dyn GeneratorSession>>,
    generator: String,
}

impl GeneratorGuard {
    /// Acquire a session from `provider`
    pub async fn acquire(provider: &dyn GeneratorProvider) -> Result<Self> {
        let session = provider.acquire().await?;
        debug!(generator = %provider.name(), "Generator session acquired");
        Ok(Self::new(provider.name(), session))
    }

    /// Wrap an already opened session
    pub fn new(generator: impl Into<String>, session: Box<dyn GeneratorSession>) -> Self {
        Self {
            session: Some(session),
            generator: generator.into(),
        }
    }

    /// Forward to [`GeneratorSession::generate_answer`]
    pub async fn generate_answer(&mut self, content: &str) -> Result<Option<String>> {
        match self.session.as_mut() {
            Some(session) => session.generate_answer(content).await,
            None => Err(AppError::Internal(format!(
                "Generator '{}' session already released",
                self.generator
            ))),
        }
    }

    /// Whether the session is still open
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Close the session now instead of at end of scope
    pub fn release(mut self) {
        self.close_session();
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
            debug!(generator = %self.generator, "Generator session released");
        }
    }
}

impl Drop for GeneratorGuard {
    fn drop(&mut self) {
        self.close_session();
    }
}
