//! HTTP client for a remote generation service.
//! Speaks either the native `{content} -> {answer}` protocol or the
//! OpenAI compatible `/chat/completions` protocol (OpenAI, Ollama, vLLM, etc.)

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use crate::config::{GeneratorConfig, ProtocolType};
use crate::error::{AppError, Result};
use crate::generator::traits::{GeneratorProvider, GeneratorSession};

/// Consecutive failures before an endpoint is taken out of rotation
const UNHEALTHY_THRESHOLD: u32 = 3;

/// How long an unhealthy endpoint sits out before it is tried again
const RETRY_AFTER: Duration = Duration::from_secs(30);

/// Native generation request body
#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    content: &'a str,
}

/// Native generation response body
#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    answer: Option<String>,
}

/// Chat message in the OpenAI compatible format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChatResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

/// Generation endpoint status
#[derive(Debug, Clone)]
pub struct GeneratorEndpoint {
    pub url: String,
    pub healthy: bool,
    pub last_check: Option<Instant>,
    pub consecutive_failures: u32,
}

impl GeneratorEndpoint {
    pub fn new(url: String) -> Self {
        Self {
            url,
            healthy: true,
            last_check: None,
            consecutive_failures: 0,
        }
    }

    pub fn mark_healthy(&mut self) {
        self.healthy = true;
        self.last_check = Some(Instant::now());
        self.consecutive_failures = 0;
    }

    pub fn mark_unhealthy(&mut self) {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= UNHEALTHY_THRESHOLD {
            self.healthy = false;
        }
        self.last_check = Some(Instant::now());
    }

    /// Healthy, or unhealthy long enough to deserve another attempt
    fn is_available(&self, now: Instant) -> bool {
        self.healthy
            || self
                .last_check
                .map_or(true, |checked| now.duration_since(checked) >= RETRY_AFTER)
    }
}

/// State shared between the provider and its sessions
struct HttpGeneratorInner {
    name: String,
    protocol: ProtocolType,
    client: Client,
    endpoints: RwLock<Vec<GeneratorEndpoint>>,
    current_endpoint_index: RwLock<usize>,
    model: Option<String>,
    generate_path: String,
    auth_token: Option<String>,
    auth_header_name: Option<String>,
}

/// Remote generation service reached over HTTP
pub struct HttpGenerator {
    inner: Arc<HttpGeneratorInner>,
}

impl HttpGenerator {
    /// Create a new HTTP generator from configuration
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        if config.endpoints.is_empty() {
            return Err(AppError::Internal(format!(
                "Generator '{}' has no endpoints",
                config.name
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let endpoints = config
            .endpoints
            .iter()
            .map(|url| GeneratorEndpoint::new(url.clone()))
            .collect();

        Ok(Self {
            inner: Arc::new(HttpGeneratorInner {
                name: config.name.clone(),
                protocol: config.protocol,
                client,
                endpoints: RwLock::new(endpoints),
                current_endpoint_index: RwLock::new(0),
                model: config.model.clone(),
                generate_path: config.generate_path.clone(),
                auth_token: config.auth.resolve_token(),
                auth_header_name: config.auth.header_name.clone(),
            }),
        })
    }

    /// Snapshot of endpoint health
    pub fn endpoints(&self) -> Vec<GeneratorEndpoint> {
        self.inner.endpoints.read().clone()
    }
}

impl HttpGeneratorInner {
    /// Get headers with authentication
    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &self.auth_token {
            match &self.auth_header_name {
                Some(header_name) => {
                    if let (Ok(name), Ok(value)) = (
                        HeaderName::from_bytes(header_name.as_bytes()),
                        HeaderValue::from_str(token),
                    ) {
                        headers.insert(name, value);
                    }
                }
                None => {
                    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                        headers.insert(AUTHORIZATION, value);
                    }
                }
            }
        }

        headers
    }

    /// Get the next available endpoint, round robin
    fn get_next_endpoint(&self) -> Option<String> {
        let now = Instant::now();
        let endpoints = self.endpoints.read();
        let available: Vec<_> = endpoints.iter().filter(|e| e.is_available(now)).collect();

        if available.is_empty() {
            return None;
        }

        let mut index = self.current_endpoint_index.write();
        let url = available[*index % available.len()].url.clone();
        *index = index.wrapping_add(1);
        Some(url)
    }

    fn mark_endpoint_healthy(&self, url: &str) {
        let mut endpoints = self.endpoints.write();
        if let Some(endpoint) = endpoints.iter_mut().find(|e| e.url == url) {
            endpoint.mark_healthy();
        }
    }

    fn mark_endpoint_unhealthy(&self, url: &str) {
        let mut endpoints = self.endpoints.write();
        if let Some(endpoint) = endpoints.iter_mut().find(|e| e.url == url) {
            endpoint.mark_unhealthy();
            warn!(
                generator = %self.name,
                url = %url,
                failures = endpoint.consecutive_failures,
                "Generator endpoint failed"
            );
        }
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .headers(self.get_headers())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                self.mark_endpoint_unhealthy(endpoint);
                AppError::HttpClient(e)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            self.mark_endpoint_unhealthy(endpoint);
        }

        Err(AppError::BackendError(format!(
            "Generator returned {}: {}",
            status, body
        )))
    }

    async fn generate_native(&self, endpoint: &str, content: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/{}",
            endpoint.trim_end_matches('/'),
            self.generate_path.trim_start_matches('/')
        );

        let response = self
            .post_json(endpoint, &url, &GenerateRequest { content })
            .await?;

        let result = response.json::<GenerateResponse>().await.map_err(|e| {
            error!(generator = %self.name, error = %e, "Failed to parse generation response");
            AppError::BackendError(format!("Failed to parse response: {}", e))
        })?;

        Ok(result.answer)
    }

    async fn generate_openai(&self, endpoint: &str, content: &str) -> Result<Option<String>> {
        let model = self.model.as_deref().ok_or_else(|| {
            AppError::Internal(format!("Generator '{}' has no model configured", self.name))
        })?;

        let url = format!("{}/chat/completions", endpoint.trim_end_matches('/'));
        let request = OpenAIChatRequest {
            model,
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: Some(content.to_string()),
            }],
        };

        let response = self.post_json(endpoint, &url, &request).await?;

        let result = response.json::<OpenAIChatResponse>().await.map_err(|e| {
            error!(generator = %self.name, error = %e, "Failed to parse chat completion response");
            AppError::BackendError(format!("Failed to parse response: {}", e))
        })?;

        Ok(result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[async_trait]
impl GeneratorProvider for HttpGenerator {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn protocol(&self) -> &str {
        match self.inner.protocol {
            ProtocolType::OpenAI => "openai",
            _ => "http",
        }
    }

    async fn acquire(&self) -> Result<Box<dyn GeneratorSession>> {
        let endpoint = self
            .inner
            .get_next_endpoint()
            .ok_or_else(|| AppError::NoHealthyBackends(self.inner.name.clone()))?;

        Ok(Box::new(HttpGeneratorSession {
            inner: self.inner.clone(),
            endpoint,
            opened_at: Instant::now(),
            generations: 0,
        }))
    }
}

/// One request's view of the remote service, pinned to a single endpoint
pub struct HttpGeneratorSession {
    inner: Arc<HttpGeneratorInner>,
    endpoint: String,
    opened_at: Instant,
    generations: u32,
}

#[async_trait]
impl GeneratorSession for HttpGeneratorSession {
    async fn generate_answer(&mut self, content: &str) -> Result<Option<String>> {
        debug!(
            generator = %self.inner.name,
            endpoint = %self.endpoint,
            prompt_len = content.len(),
            "Sending generation request"
        );

        self.generations += 1;
        let answer = match self.inner.protocol {
            ProtocolType::OpenAI => self.inner.generate_openai(&self.endpoint, content).await?,
            _ => self.inner.generate_native(&self.endpoint, content).await?,
        };

        self.inner.mark_endpoint_healthy(&self.endpoint);
        Ok(answer)
    }

    fn close(&mut self) {
        debug!(
            generator = %self.inner.name,
            endpoint = %self.endpoint,
            generations = self.generations,
            elapsed_ms = self.opened_at.elapsed().as_millis() as u64,
            "Closing generator session"
        );
    }
}
