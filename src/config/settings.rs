//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default location of the settings file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/mm-backend.yaml";

/// Prefix for environment overrides, e.g. `MM_BACKEND__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "MM_BACKEND";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
    pub generator: GeneratorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Cross-origin configuration. Permissive by default; not meant for production.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Allowed origins; empty or `"*"` allows every origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_credentials: bool,
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

impl CorsConfig {
    /// Whether every origin is allowed
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allow_credentials: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Wire protocol spoken by the generation service
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolType {
    /// `POST {endpoint}{generate_path}` with `{"content"}`, answers `{"answer"}`
    Http,
    /// OpenAI compatible `/chat/completions`
    OpenAI,
    /// In-process echo generator, no network
    #[default]
    Mock,
}

impl std::fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolType::Http => write!(f, "http"),
            ProtocolType::OpenAI => write!(f, "openai"),
            ProtocolType::Mock => write!(f, "mock"),
        }
    }
}

/// Credentials for the generation service
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GeneratorAuth {
    /// Environment variable holding the token; wins over `api_key`
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Custom header name (e.g. `x-api-key`); defaults to `Authorization: Bearer`
    #[serde(default)]
    pub header_name: Option<String>,
}

impl GeneratorAuth {
    /// Resolve the token, reading `token_env` if configured
    pub fn resolve_token(&self) -> Option<String> {
        match &self.token_env {
            Some(var) => std::env::var(var).ok(),
            None => self.api_key.clone(),
        }
    }
}

/// Generation service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_generator_name")]
    pub name: String,

    #[serde(default)]
    pub protocol: ProtocolType,

    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Model name sent to OpenAI compatible services
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_generate_path")]
    pub generate_path: String,

    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub auth: GeneratorAuth,
}

fn default_generator_name() -> String {
    "mm-llm".to_string()
}

fn default_generate_path() -> String {
    "/generate".to_string()
}

fn default_timeout() -> u64 {
    60000
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: default_generator_name(),
            protocol: ProtocolType::default(),
            endpoints: vec![],
            model: None,
            generate_path: default_generate_path(),
            timeout_ms: default_timeout(),
            auth: GeneratorAuth::default(),
        }
    }
}

impl Settings {
    /// Load settings from the default file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load settings from a YAML or TOML file (optional) overlaid by environment variables
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let format = if path.extension().map_or(false, |ext| ext == "toml") {
            FileFormat::Toml
        } else {
            FileFormat::Yaml
        };

        let mut config_builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("cors.allowed_origins", default_allowed_origins())?
            .set_default("cors.allow_credentials", true)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .set_default("generator.name", default_generator_name())?
            .set_default("generator.protocol", ProtocolType::default().to_string())?
            .set_default("generator.endpoints", Vec::<String>::new())?
            .set_default("generator.generate_path", default_generate_path())?
            .set_default("generator.timeout_ms", default_timeout() as i64)?;

        if path.exists() {
            config_builder = config_builder.add_source(File::from(path).format(format));
        }

        config_builder = config_builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("generator.endpoints")
                .with_list_parse_key("cors.allowed_origins")
                .try_parsing(true),
        );

        let config = config_builder.build()?;
        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => {
                return Err(invalid(format!(
                    "Unknown logging format '{}', expected 'json' or 'pretty'",
                    other
                )))
            }
        }

        let generator = &self.generator;
        if generator.name.is_empty() {
            return Err(invalid("Generator name cannot be empty"));
        }

        if generator.protocol != ProtocolType::Mock && generator.endpoints.is_empty() {
            return Err(invalid(format!(
                "Generator '{}' must have at least one endpoint",
                generator.name
            )));
        }

        if generator.protocol == ProtocolType::OpenAI && generator.model.is_none() {
            return Err(invalid(format!(
                "Generator '{}' uses the openai protocol and needs a model",
                generator.name
            )));
        }

        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Config(config::ConfigError::Message(message.into()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            cors: CorsConfig::default(),
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            generator: GeneratorConfig::default(),
        }
    }
}
