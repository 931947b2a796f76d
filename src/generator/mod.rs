//! Generator module - the external text generation service and its clients

pub mod guard;
pub mod http_generator;
pub mod mock;
pub mod traits;

pub use guard::GeneratorGuard;
pub use http_generator::{GeneratorEndpoint, HttpGenerator};
pub use mock::{MockBehavior, MockGenerator, MockStats};
pub use traits::{GeneratorProvider, GeneratorSession};

use std::sync::Arc;
use tracing::info;

use crate::config::{GeneratorConfig, ProtocolType};
use crate::error::Result;

/// Create the generator described by configuration
pub fn create_generator(config: &GeneratorConfig) -> Result<Arc<dyn GeneratorProvider>> {
    let generator: Arc<dyn GeneratorProvider> = match config.protocol {
        ProtocolType::Http | ProtocolType::OpenAI => Arc::new(HttpGenerator::new(config)?),
        ProtocolType::Mock => Arc::new(MockGenerator::named(config.name.clone(), MockBehavior::Echo)),
    };

    info!(
        name = %generator.name(),
        protocol = %generator.protocol(),
        endpoints = config.endpoints.len(),
        "Generator configured"
    );

    Ok(generator)
}
