//! Integration tests for the routing engine
//!
//! The classification backend is a real model client talking to a mock
//! server, so these tests cover the full HTTP path of the model pass.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

use switchyard_engine::config::ModelEndpointConfig;
use switchyard_engine::llm::{ModelBackend, ModelClient};
use switchyard_engine::routing::{RouteDefinition, RoutingEngine};

fn routes() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::new(
            "electricalarch",
            ["wiring", "harness", "ECU"],
            "Electrical architecture cost optimization",
        ),
        RouteDefinition::new("catchall", Vec::<String>::new(), "Any automotive component"),
    ]
}

fn classifier(server: &MockServer) -> Arc<dyn ModelBackend> {
    let config = ModelEndpointConfig::new("openai_compatible", "router-model")
        .with_api_key("sk-test")
        .with_base_url(server.uri());
    Arc::new(ModelClient::from_config(&config).unwrap())
}

fn completion(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"content": text}}]
    }))
}

#[tokio::test]
async fn test_keyword_route_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("catchall"))
        .expect(0)
        .mount(&server)
        .await;

    let engine = RoutingEngine::new(routes(), classifier(&server), Duration::from_secs(5)).unwrap();

    assert_eq!(engine.choose_agent("Consolidate two ecus").await, "electricalarch");
    assert_eq!(engine.choose_agent("New WIRING layout").await, "electricalarch");
}

#[tokio::test]
async fn test_classification_request_and_substring_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"temperature": 0.1, "max_tokens": 50})))
        .respond_with(completion("I think ElectricalArch fits"))
        .expect(1)
        .mount(&server)
        .await;

    let engine = RoutingEngine::new(routes(), classifier(&server), Duration::from_secs(5)).unwrap();
    assert_eq!(
        engine.choose_agent("Lower the cost of the power distribution").await,
        "electricalarch"
    );

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    let messages = body["messages"].as_array().unwrap();

    assert_eq!(messages.len(), 2);
    let system = messages[0]["content"].as_str().unwrap();
    assert!(system.contains("1. **electricalarch**: Electrical architecture cost optimization"));
    assert!(system.contains("Keywords: wiring, harness, ECU"));
    assert!(system.contains("2. **catchall**: Any automotive component\n   Keywords: (default fallback)"));
    assert_eq!(
        messages[1]["content"],
        "Objective: Lower the cost of the power distribution"
    );
}

#[tokio::test]
async fn test_server_error_falls_back_to_catch_all() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let engine = RoutingEngine::new(routes(), classifier(&server), Duration::from_secs(5)).unwrap();
    assert_eq!(engine.choose_agent("Improve seat comfort").await, "catchall");
}

#[tokio::test]
async fn test_slow_classifier_falls_back_to_catch_all() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("electricalarch").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let engine =
        RoutingEngine::new(routes(), classifier(&server), Duration::from_millis(100)).unwrap();
    assert_eq!(engine.choose_agent("Improve seat comfort").await, "catchall");
}

#[tokio::test]
async fn test_gibberish_answer_falls_back_to_catch_all() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("The seating team should handle it."))
        .mount(&server)
        .await;

    let engine = RoutingEngine::new(routes(), classifier(&server), Duration::from_secs(5)).unwrap();
    assert_eq!(engine.choose_agent("Improve seat comfort").await, "catchall");
}
