//! In-process generator for local development and testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::generator::traits::{GeneratorProvider, GeneratorSession};

/// What a [`MockGenerator`] session answers
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// `"Mock response for: {content}"`
    Echo,
    /// Always the same answer, whatever the prompt
    Fixed(String),
    /// No answer at all
    Empty,
    /// Fail every generation with a backend error
    Fail(String),
}

/// Counters shared by a mock generator and all of its sessions
#[derive(Debug, Default)]
pub struct MockStats {
    acquired: AtomicUsize,
    released: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockStats {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Every prompt received, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

/// Mock generation service.
pub struct MockGenerator {
    name: String,
    behavior: MockBehavior,
    stats: Arc<MockStats>,
}

impl MockGenerator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self::named("mock", behavior)
    }

    pub fn named(name: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            stats: Arc::new(MockStats::default()),
        }
    }

    /// Shared counters, readable after the generator has been moved into app state
    pub fn stats(&self) -> Arc<MockStats> {
        self.stats.clone()
    }
}

#[async_trait]
impl GeneratorProvider for MockGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> &str {
        "mock"
    }

    async fn acquire(&self) -> Result<Box<dyn GeneratorSession>> {
        self.stats.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            behavior: self.behavior.clone(),
            stats: self.stats.clone(),
        }))
    }
}

struct MockSession {
    behavior: MockBehavior,
    stats: Arc<MockStats>,
}

#[async_trait]
impl GeneratorSession for MockSession {
    async fn generate_answer(&mut self, content: &str) -> Result<Option<String>> {
        self.stats.prompts.lock().push(content.to_string());

        match &self.behavior {
            MockBehavior::Echo => Ok(Some(format!("Mock response for: {}", content))),
            MockBehavior::Fixed(answer) => Ok(Some(answer.clone())),
            MockBehavior::Empty => Ok(None),
            MockBehavior::Fail(message) => Err(AppError::BackendError(message.clone())),
        }
    }

    fn close(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}
