//! End-to-end tests against mocked chat and places providers.

use places_chat::client::{GOOGLE_PLACES, OPENAI};
use places_chat::providers::google_places::GooglePlacesProvider;
use places_chat::{places_from_payload, Client, Error, PlacesProvider, Role, DEFAULT_LOCATION};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT_PATH: &str = "/v1/chat/completions";
const PLACES_PATH: &str = "/maps/api/place/textsearch/json";

fn client(server: &MockServer) -> Client {
    Client::builder()
        .api_key(OPENAI, "test-key")
        .api_key(GOOGLE_PLACES, "places-key")
        .base_url(OPENAI, server.uri())
        .base_url(GOOGLE_PLACES, server.uri())
        .build()
        .unwrap()
}

fn places_body(count: usize) -> Value {
    let results: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "business_status": "OPERATIONAL",
                "formatted_address": format!("{i} Connaught Place, New Delhi"),
                "geometry": {"location": {"lat": 28.63 + i as f64 / 100.0, "lng": 77.21}},
                "name": format!("Coffee {i}"),
                "place_id": format!("place_{i}"),
                "rating": 4.2,
                "types": ["cafe"]
            })
        })
        .collect();
    json!({"html_attributions": [], "results": results, "status": "OK"})
}

fn chat_text(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 40, "completion_tokens": 12, "total_tokens": 52}
    })
}

fn chat_tool_call(arguments: &Value) -> Value {
    json!({
        "id": "chatcmpl-0",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_places_1",
                    "type": "function",
                    "function": {"name": "googlePlaces", "arguments": arguments.to_string()}
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 90, "completion_tokens": 20, "total_tokens": 110}
    })
}

#[tokio::test]
async fn test_places_search_scenario() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PLACES_PATH))
        .and(query_param("query", "coffee shop"))
        .and(query_param("location", "28.6139,77.209"))
        .and(query_param("radius", "1000"))
        .and(query_param("key", "places-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(places_body(3)))
        .expect(1)
        .mount(&server)
        .await;

    let places = GooglePlacesProvider::new(reqwest::Client::new(), "places-key")
        .with_base_url(server.uri());
    let records = places
        .search("coffee shop", DEFAULT_LOCATION, 1000)
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].name, "Coffee 0");
    assert_eq!(records[2].place_id, "place_2");
    assert_eq!(records[1].address, "1 Connaught Place, New Delhi");
}

#[tokio::test]
async fn test_places_http_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PLACES_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let places =
        GooglePlacesProvider::new(reqwest::Client::new(), "k").with_base_url(server.uri());
    let err = places
        .search("cafe", DEFAULT_LOCATION, 500)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Server(503)));
}

#[tokio::test]
async fn test_places_missing_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PLACES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
        .mount(&server)
        .await;

    let places =
        GooglePlacesProvider::new(reqwest::Client::new(), "k").with_base_url(server.uri());
    let err = places
        .search("cafe", DEFAULT_LOCATION, 500)
        .await
        .unwrap_err();
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_direct_answer_makes_one_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", "Bearer test-key"))
        .and(body_string_contains("\"tool_choice\":\"auto\""))
        .and(body_string_contains("googlePlaces"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_text("The capital of India is New Delhi.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server)
        .run("What's the capital of India?", DEFAULT_LOCATION)
        .await
        .unwrap();

    assert_eq!(
        outcome.answer.as_deref(),
        Some("The capital of India is New Delhi.")
    );
    assert_eq!(outcome.rounds, 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "What's the capital of India?");
}

#[tokio::test]
async fn test_tool_call_flow() {
    let server = MockServer::start().await;

    let arguments = json!({"query": "coffee shop", "location": DEFAULT_LOCATION});
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_tool_call(&arguments)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_string_contains("\"tool_call_id\":\"call_places_1\""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_text("Coffee 0 is the best rated option nearby.")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PLACES_PATH))
        .and(query_param("query", "coffee shop"))
        .and(query_param("radius", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(places_body(3)))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server)
        .run("Find me the best coffee shops nearby", DEFAULT_LOCATION)
        .await
        .unwrap();

    assert_eq!(
        outcome.answer.as_deref(),
        Some("Coffee 0 is the best rated option nearby.")
    );
    assert_eq!(outcome.rounds, 2);
    assert_eq!(outcome.tool_calls, 1);
    assert_eq!(outcome.usage.input_tokens, 130);

    let tool_message = outcome
        .conversation
        .messages()
        .iter()
        .find(|m| m.role == Role::Tool)
        .unwrap();
    let records = places_from_payload(tool_message.content.as_deref().unwrap()).unwrap();
    assert_eq!(records.len(), 3);

    let requests = server.received_requests().await.unwrap();
    let second: Value = requests
        .iter()
        .filter(|r| r.url.path() == CHAT_PATH)
        .nth(1)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .unwrap();
    let messages = second["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2]["tool_calls"][0]["id"], "call_places_1");
    assert!(messages[2]["content"].is_null());
    assert_eq!(messages[3]["role"], "tool");
}

#[tokio::test]
async fn test_chat_unauthorized_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .run("Find pizza", DEFAULT_LOCATION)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
}

#[tokio::test]
async fn test_chat_bad_request_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid schema for function 'googlePlaces'"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .run("Find pizza", DEFAULT_LOCATION)
        .await
        .unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid schema for function 'googlePlaces'");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_chat_without_choices_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"model": "gpt-4o-mini", "choices": []})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .run("hello", DEFAULT_LOCATION)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn test_chat_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .run("Find pizza", DEFAULT_LOCATION)
        .await
        .unwrap_err();
    match err {
        Error::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(3)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_chat_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .run("Find pizza", DEFAULT_LOCATION)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Server(502)));
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_chat_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_text("too late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = Client::builder()
        .api_key(OPENAI, "test-key")
        .base_url(OPENAI, server.uri())
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let err = client
        .run("Find pizza", DEFAULT_LOCATION)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout));
}

#[tokio::test]
async fn test_missing_chat_key_skips_network() {
    let server = MockServer::start().await;

    let result = Client::builder()
        .api_key(GOOGLE_PLACES, "places-key")
        .base_url(OPENAI, server.uri())
        .base_url(GOOGLE_PLACES, server.uri())
        .build();

    assert!(matches!(result, Err(Error::MissingApiKey(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}
