#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Ollama client behaviour against a mocked server

use kb_recommend::KbError;
use kb_recommend::config::OllamaConfig;
use kb_recommend::embeddings::{Embedder, OllamaClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OllamaClient {
    let config = OllamaConfig {
        host: "127.0.0.1".to_string(),
        port: server.address().port(),
        model: "llama3.2:1b".to_string(),
        batch_size: 2,
        timeout_seconds: 2,
        retry_attempts: 1,
        ..OllamaConfig::default()
    };
    OllamaClient::new(&config).expect("Failed to create Ollama client")
}

async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task completes")
}

#[tokio::test(flavor = "multi_thread")]
async fn health_check_finds_configured_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "nomic-embed-text:latest" },
                { "name": "llama3.2:1b", "size": 1321098329_u64 }
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (health, models) = blocking(move || (client.health_check(), client.list_models())).await;

    assert!(health.is_ok(), "health check should pass: {:?}", health);
    let models = models.expect("models listed");
    assert_eq!(models.len(), 2);
    assert_eq!(models[1].size, Some(1321098329));
}

#[tokio::test(flavor = "multi_thread")]
async fn health_check_rejects_missing_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{ "name": "mistral:7b" }]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = blocking(move || client.validate_model()).await;

    let err = result.expect_err("model is not served");
    assert!(format!("{err:#}").contains("llama3.2:1b"));
}

#[tokio::test(flavor = "multi_thread")]
async fn single_embedding_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({
            "model": "llama3.2:1b",
            "input": "printer offline"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2:1b",
            "embeddings": [[0.25, -0.5, 1.0]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let vector = blocking(move || client.embed("printer offline")).await;

    assert_eq!(vector.expect("embedding succeeds"), vec![0.25, -0.5, 1.0]);
}

#[tokio::test(flavor = "multi_thread")]
async fn batches_are_split_by_batch_size() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({ "input": ["a", "b"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0], [0.0, 1.0]]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({ "input": "c" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 1.0]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let vectors = blocking(move || client.embed_batch(&texts)).await;

    assert_eq!(
        vectors.expect("batch succeeds"),
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_count_mismatch_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let texts = vec!["a".to_string(), "b".to_string()];
    let result = blocking(move || client.embed_batch(&texts)).await;

    assert!(matches!(result, Err(KbError::EmbeddingService(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "model \"llama3.2:1b\" not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).with_retry_attempts(3);
    let result = blocking(move || client.embed("test")).await;

    let err = result.expect_err("404 is a failure");
    assert!(matches!(err, KbError::EmbeddingService(_)));
    assert!(err.to_string().contains("404"));
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server).with_retry_attempts(2);
    let result = blocking(move || client.embed("test")).await;

    assert!(matches!(result, Err(KbError::EmbeddingService(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_response_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = blocking(move || client.embed("test")).await;

    assert!(matches!(result, Err(KbError::EmbeddingService(_))));
}
