//! Integration tests for the schema and test/activate workflow endpoints.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

use provider_gate::config::schema::SlotConfig;
use provider_gate::{ApiServer, GateConfig, Shutdown};

mod common;

const API_KEY: &str = "test-key";

fn base_config(api_addr: SocketAddr) -> GateConfig {
    let mut config = GateConfig::default();
    config.listener.bind_address = api_addr.to_string();
    config.api.api_key = API_KEY.to_string();
    config.observability.metrics_enabled = false;
    config
}

async fn boot(config: GateConfig) -> Shutdown {
    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = ApiServer::new(config).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    shutdown
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn schema_endpoint_returns_fields_and_render_plan() {
    let api_addr: SocketAddr = "127.0.0.1:29101".parse().unwrap();
    let shutdown = boot(base_config(api_addr)).await;

    let res = client()
        .get(format!("http://{}/api/schemas/telephony-trunk", api_addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["provider_type"], "telephony-trunk");

    let fields = body["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 5);
    assert_eq!(fields[0]["key"], "account_sid");
    assert_eq!(fields[1]["type"], "secret");

    let form = body["form"].as_array().unwrap();
    assert_eq!(form.len(), 5);
    assert_eq!(form[0]["control"], "input-text");
    assert_eq!(form[1]["control"], "input-password");
    assert_eq!(form[3]["control"], "select");

    shutdown.trigger();
}

#[tokio::test]
async fn unknown_provider_type_yields_empty_schema() {
    let api_addr: SocketAddr = "127.0.0.1:29102".parse().unwrap();
    let shutdown = boot(base_config(api_addr)).await;

    let res = client()
        .get(format!("http://{}/api/schemas/fax-modem", api_addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["fields"].as_array().unwrap().len(), 0);
    assert_eq!(body["form"].as_array().unwrap().len(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let api_addr: SocketAddr = "127.0.0.1:29103".parse().unwrap();
    let shutdown = boot(base_config(api_addr)).await;

    let res = client()
        .get(format!("http://{}/api/status", api_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client()
        .get(format!("http://{}/api/status", api_addr))
        .bearer_auth("wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client()
        .get(format!("http://{}/api/status", api_addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    shutdown.trigger();
}

#[tokio::test]
async fn draft_test_failure_does_not_trip_the_breaker() {
    let provider_addr: SocketAddr = "127.0.0.1:29111".parse().unwrap();
    let api_addr: SocketAddr = "127.0.0.1:29112".parse().unwrap();

    common::start_mock_provider(provider_addr, 503, "maintenance").await;

    let mut config = base_config(api_addr);
    config.slots.push(SlotConfig {
        name: "voice".into(),
        provider_type: "voice-gateway".into(),
        probe_url: format!("http://{}/probe", provider_addr),
        backup: None,
    });
    let shutdown = boot(config).await;

    let res = client()
        .post(format!("http://{}/api/slots/voice/test", api_addr))
        .bearer_auth(API_KEY)
        .json(&json!({ "draft": { "api_key": "sk-1", "voice_id": "aria" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let report: Value = res.json().await.unwrap();
    assert_eq!(report["success"], false);
    assert!(report["error"].as_str().is_some());

    // A failed pre-activation check is not a call outcome.
    let res = client()
        .get(format!("http://{}/api/slots/voice/health", api_addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    let health: Value = res.json().await.unwrap();
    assert_eq!(health["circuit_breaker_state"], "CLOSED");
    assert_eq!(health["is_healthy"], true);
    assert_eq!(health["error_count"], 0);

    shutdown.trigger();
}

#[tokio::test]
async fn save_activates_and_roundtrips() {
    let provider_addr: SocketAddr = "127.0.0.1:29121".parse().unwrap();
    let api_addr: SocketAddr = "127.0.0.1:29122".parse().unwrap();

    common::start_mock_provider(provider_addr, 200, "ok").await;

    let mut config = base_config(api_addr);
    config.slots.push(SlotConfig {
        name: "voice".into(),
        provider_type: "voice-gateway".into(),
        probe_url: format!("http://{}/probe", provider_addr),
        backup: None,
    });
    let shutdown = boot(config).await;

    // Nothing activated yet.
    let res = client()
        .get(format!("http://{}/api/slots/voice/config", api_addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let draft = json!({ "api_key": "sk-live-1", "voice_id": "aria", "sample_rate": 16000 });
    let res = client()
        .post(format!("http://{}/api/slots/voice/config", api_addr))
        .bearer_auth(API_KEY)
        .json(&draft)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let saved: Value = res.json().await.unwrap();
    assert_eq!(saved["voice_id"], "aria");

    let res = client()
        .get(format!("http://{}/api/slots/voice/config", api_addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let active: Value = res.json().await.unwrap();
    assert_eq!(active, saved);

    let res = client()
        .get(format!("http://{}/api/slots/voice/health", api_addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    let health: Value = res.json().await.unwrap();
    assert_eq!(health["circuit_breaker_state"], "CLOSED");

    shutdown.trigger();
}

#[tokio::test]
async fn save_with_missing_required_field_is_rejected() {
    let api_addr: SocketAddr = "127.0.0.1:29131".parse().unwrap();

    let mut config = base_config(api_addr);
    config.slots.push(SlotConfig {
        name: "voice".into(),
        provider_type: "voice-gateway".into(),
        probe_url: "http://127.0.0.1:29132/probe".into(),
        backup: None,
    });
    let shutdown = boot(config).await;

    let res = client()
        .post(format!("http://{}/api/slots/voice/config", api_addr))
        .bearer_auth(API_KEY)
        .json(&json!({ "voice_id": "not-a-voice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_failed");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"api_key"));
    assert!(fields.contains(&"voice_id"));

    // The rejected draft must not have been activated.
    let res = client()
        .get(format!("http://{}/api/slots/voice/config", api_addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    shutdown.trigger();
}

#[tokio::test]
async fn unknown_slot_is_404() {
    let api_addr: SocketAddr = "127.0.0.1:29141".parse().unwrap();
    let shutdown = boot(base_config(api_addr)).await;

    let res = client()
        .get(format!("http://{}/api/slots/ghost/health", api_addr))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client()
        .post(format!("http://{}/api/slots/ghost/test", api_addr))
        .bearer_auth(API_KEY)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    shutdown.trigger();
}

#[tokio::test]
async fn sdk_client_end_to_end() {
    let provider_addr: SocketAddr = "127.0.0.1:29151".parse().unwrap();
    let api_addr: SocketAddr = "127.0.0.1:29152".parse().unwrap();

    common::start_mock_provider(provider_addr, 200, "ok").await;

    let mut config = base_config(api_addr);
    config.slots.push(SlotConfig {
        name: "trunk".into(),
        provider_type: "telephony-trunk".into(),
        probe_url: format!("http://{}/probe", provider_addr),
        backup: None,
    });
    let shutdown = boot(config).await;

    let sdk = sdk_rust::GateClient::new(&format!("http://{}", api_addr), API_KEY);

    let schema = sdk.schema("telephony-trunk").await.unwrap();
    assert_eq!(schema.fields.len(), 5);

    let draft = json!({
        "account_sid": "AC123",
        "auth_token": "tok",
        "trunk_domain": "sip.example.com",
        "region": "us-east",
    });
    let result = sdk.test_draft("trunk", &draft).await.unwrap();
    assert!(result.success);

    sdk.save("trunk", &draft).await.unwrap();

    let health = sdk.health("trunk").await.unwrap();
    assert_eq!(health.circuit_breaker_state, "CLOSED");
    assert!(health.is_healthy);

    let all = sdk.health_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].slot, "trunk");

    shutdown.trigger();
}
