//! Traits describing the external text generation service

use async_trait::async_trait;

use crate::error::Result;

/// Factory for per-request generator sessions
#[async_trait]
pub trait GeneratorProvider: Send + Sync {
    /// Name of the configured generator
    fn name(&self) -> &str;

    /// Wire protocol, for logging
    fn protocol(&self) -> &str;

    /// Open a session scoped to a single request.
    ///
    /// Callers should wrap the result in a [`GeneratorGuard`](super::GeneratorGuard)
    /// so that [`GeneratorSession::close`] runs on every exit path.
    async fn acquire(&self) -> Result<Box<dyn GeneratorSession>>;
}

/// A generator handle that lives for one request
#[async_trait]
pub trait GeneratorSession: Send {
    /// Produce an answer for `content`. `Ok(None)` means the service had nothing to say.
    async fn generate_answer(&mut self, content: &str) -> Result<Option<String>>;

    /// Release the session. Called exactly once by the guard.
    fn close(&mut self);
}
