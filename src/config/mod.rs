//! Configuration loading

pub mod settings;

pub use settings::{
    CorsConfig, GeneratorAuth, GeneratorConfig, LoggingConfig, ProtocolType, ServerConfig,
    Settings,
};
