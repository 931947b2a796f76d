//! HTTP generator integration tests against a mocked generation service

use mm_backend::config::{GeneratorConfig, ProtocolType};
use mm_backend::error::AppError;
use mm_backend::generator::{create_generator, GeneratorGuard, GeneratorProvider, HttpGenerator};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn native_config(endpoints: Vec<String>) -> GeneratorConfig {
    GeneratorConfig {
        name: "test-generator".to_string(),
        protocol: ProtocolType::Http,
        endpoints,
        ..Default::default()
    }
}

fn openai_config(endpoint: String) -> GeneratorConfig {
    GeneratorConfig {
        name: "test-openai".to_string(),
        protocol: ProtocolType::OpenAI,
        endpoints: vec![endpoint],
        model: Some("llama3".to_string()),
        ..Default::default()
    }
}

async fn generate(generator: &HttpGenerator, content: &str) -> Result<Option<String>, AppError> {
    let mut guard = GeneratorGuard::acquire(generator).await?;
    guard.generate_answer(content).await
}

#[tokio::test]
async fn test_native_protocol_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_json(json!({ "content": "What is Rust?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "A language." })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = HttpGenerator::new(&native_config(vec![server.uri()])).unwrap();
    let answer = generate(&generator, "What is Rust?").await.unwrap();

    assert_eq!(answer.as_deref(), Some("A language."));
}

#[tokio::test]
async fn test_native_protocol_custom_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = native_config(vec![format!("{}/", server.uri())]);
    config.generate_path = "/v1/answer".to_string();
    let generator = HttpGenerator::new(&config).unwrap();

    assert_eq!(generate(&generator, "hi").await.unwrap().as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_native_protocol_null_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": null })))
        .mount(&server)
        .await;

    let generator = HttpGenerator::new(&native_config(vec![server.uri()])).unwrap();

    assert_eq!(generate(&generator, "anything").await.unwrap(), None);
}

#[tokio::test]
async fn test_openai_protocol_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_json(json!({
            "model": "llama3",
            "messages": [{ "role": "user", "content": "Hello" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Hi!" },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = openai_config(server.uri());
    config.auth.api_key = Some("secret-token".to_string());
    let generator = create_generator(&config).unwrap();
    assert_eq!(generator.protocol(), "openai");

    let mut guard = GeneratorGuard::acquire(generator.as_ref()).await.unwrap();
    let answer = guard.generate_answer("Hello").await.unwrap();

    assert_eq!(answer.as_deref(), Some("Hi!"));
}

#[tokio::test]
async fn test_openai_protocol_without_choices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let generator = HttpGenerator::new(&openai_config(server.uri())).unwrap();

    assert_eq!(generate(&generator, "Hello").await.unwrap(), None);
}

#[tokio::test]
async fn test_server_error_is_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let generator = HttpGenerator::new(&native_config(vec![server.uri()])).unwrap();
    let err = generate(&generator, "hi").await.unwrap_err();

    match err {
        AppError::BackendError(message) => assert!(message.contains("model not loaded")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(generator.endpoints()[0].consecutive_failures, 1);
}

#[tokio::test]
async fn test_client_error_does_not_mark_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad prompt"))
        .mount(&server)
        .await;

    let generator = HttpGenerator::new(&native_config(vec![server.uri()])).unwrap();

    assert!(matches!(
        generate(&generator, "hi").await,
        Err(AppError::BackendError(_))
    ));
    assert_eq!(generator.endpoints()[0].consecutive_failures, 0);
}

#[tokio::test]
async fn test_unparseable_response_is_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let generator = HttpGenerator::new(&native_config(vec![server.uri()])).unwrap();

    assert!(matches!(
        generate(&generator, "hi").await,
        Err(AppError::BackendError(_))
    ));
}

#[tokio::test]
async fn test_repeated_failures_take_endpoint_out_of_rotation() {
    let failing = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&failing)
        .await;

    let generator = HttpGenerator::new(&native_config(vec![failing.uri()])).unwrap();
    for _ in 0..3 {
        assert!(generate(&generator, "hi").await.is_err());
    }

    assert!(!generator.endpoints()[0].healthy);
    assert!(matches!(
        generator.acquire().await,
        Err(AppError::NoHealthyBackends(_))
    ));
}

#[tokio::test]
async fn test_rotation_prefers_healthy_endpoint() {
    let failing = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&failing)
        .await;

    let healthy = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "ok" })))
        .mount(&healthy)
        .await;

    let generator =
        HttpGenerator::new(&native_config(vec![failing.uri(), healthy.uri()])).unwrap();

    // Alternate until the failing endpoint has been marked down
    let mut failures = 0;
    for _ in 0..6 {
        if generate(&generator, "hi").await.is_err() {
            failures += 1;
        }
    }
    assert_eq!(failures, 3);

    for _ in 0..4 {
        assert_eq!(generate(&generator, "hi").await.unwrap().as_deref(), Some("ok"));
    }
}

#[tokio::test]
async fn test_connection_refused_is_http_client_error() {
    // Port 1 is never listening
    let generator =
        HttpGenerator::new(&native_config(vec!["http://127.0.0.1:1".to_string()])).unwrap();

    assert!(matches!(
        generate(&generator, "hi").await,
        Err(AppError::HttpClient(_))
    ));
}
