#![allow(clippy::unwrap_used)]
// Integration tests for `CloudClient` using wiremock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use openmotics_api::models::{PresetConfig, PresetTemperatures};
use openmotics_api::{CloudClient, ErrorKind};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CloudClient) {
    let server = MockServer::start().await;
    let client = CloudClient::builder("test-token")
        .base_url(server.uri())
        .installation_id(5)
        .build();
    (server, client)
}

fn installation_path(suffix: &str) -> String {
    format!("/base/installations/5{suffix}")
}

fn ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"data": {}}))
}

// ── Installations ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_installations() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/base/installations"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 5, "name": "Home", "_version": 1.0, "_acl": {"control": {"allowed": true}}},
                {"id": 9, "name": "Office"}
            ]
        })))
        .mount(&server)
        .await;

    let installations = client.installations().list(None).await.unwrap();
    assert_eq!(installations.len(), 2);
    assert_eq!(installations[0].name, "Home");
    assert_eq!(installations[1].id, 9);
}

#[tokio::test]
async fn test_get_installation() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/base/installations/9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"id": 9, "name": "Office", "gateway_model": "openmotics"}})),
        )
        .mount(&server)
        .await;

    let installation = client.installations().get(9).await.unwrap();
    assert_eq!(installation.gateway_model.as_deref(), Some("openmotics"));
}

// ── Outputs ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_outputs_keeps_order_and_fills_zombie_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(installation_path("/outputs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 18, "name": "Pond", "type": "OUTLET", "status": {"on": false, "locked": false}},
                {"id": 3, "name": "Hall", "type": "LIGHT", "status": {"on": true, "value": 70}},
                {"id": 7, "name": "Dead", "type": "OUTLET", "status": null}
            ]
        })))
        .mount(&server)
        .await;

    let outputs = client.outputs().list(None).await.unwrap();
    let ids: Vec<u64> = outputs.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![18, 3, 7]);
    assert_eq!(outputs[1].status.value, Some(70));
    assert!(outputs[2].status.is_zombie());
}

#[tokio::test]
async fn test_filter_is_forwarded() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(installation_path("/outputs")))
        .and(query_param("filter", r#"{"usage":"CONTROL"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let outputs = client
        .outputs()
        .list(Some(r#"{"usage":"CONTROL"}"#))
        .await
        .unwrap();
    assert!(outputs.is_empty());
}

#[tokio::test]
async fn test_turn_on_clamps_dimmer_value() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(installation_path("/outputs/3/turn_on")))
        .and(body_json(json!({"value": 100})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    client.outputs().turn_on(3, Some(250)).await.unwrap();
}

#[tokio::test]
async fn test_turn_off_all_outputs() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(installation_path("/outputs/turn_off")))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    client.outputs().turn_off(None).await.unwrap();
}

#[tokio::test]
async fn test_lights_use_their_own_resource() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(installation_path("/lights/4/toggle")))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    client.lights().toggle(4).await.unwrap();
}

// ── Shutters / group actions / thermostats ──────────────────────────

#[tokio::test]
async fn test_shutter_actions_map_to_endpoints() {
    let (server, client) = setup().await;

    for action in ["open", "close", "stop", "lock", "unlock", "move"] {
        Mock::given(method("POST"))
            .and(path(installation_path(&format!("/shutters/2/{action}"))))
            .respond_with(ok())
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path(installation_path("/shutters/2/change_position")))
        .and(body_json(json!({"position": 40})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(installation_path("/shutters/2/preset")))
        .and(body_json(json!({"position": 60})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    let shutters = client.shutters();
    shutters.move_up(2).await.unwrap();
    shutters.move_down(2).await.unwrap();
    shutters.stop(2).await.unwrap();
    shutters.lock(2).await.unwrap();
    shutters.unlock(2).await.unwrap();
    shutters.move_to_preset(2).await.unwrap();
    shutters.change_position(2, 40).await.unwrap();
    shutters.set_preset(2, 60).await.unwrap();
}

#[tokio::test]
async fn test_scenes_query_usage_in_upper_case() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(installation_path("/groupactions")))
        .and(query_param("usage", "SCENE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1, "name": "Movie night", "actions": [1, 2]}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let scenes = client.groupactions().scenes().await.unwrap();
    assert_eq!(scenes[0].name, "Movie night");

    let by_usage = client.groupactions().by_usage("scene").await.unwrap();
    assert_eq!(by_usage.len(), 1);
}

#[tokio::test]
async fn test_thermostat_unit_preset_config() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(installation_path("/thermostats/units/1/preset/config")))
        .and(body_json(json!({
            "heating": {"AWAY": 16.0, "VACATION": 14.0, "PARTY": 22.0},
            "cooling": {"AWAY": 27.0, "VACATION": 30.0, "PARTY": 24.0}
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(installation_path("/thermostats/units/1/setpoint")))
        .and(body_json(json!({"temperature": 21.5})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    let units = client.thermostats().units();
    units
        .set_preset_config(
            1,
            PresetConfig {
                heating: PresetTemperatures {
                    away: 16.0,
                    vacation: 14.0,
                    party: 22.0,
                },
                cooling: PresetTemperatures {
                    away: 27.0,
                    vacation: 30.0,
                    party: 24.0,
                },
            },
        )
        .await
        .unwrap();
    units.set_temperature(1, 21.5).await.unwrap();
}

#[tokio::test]
async fn test_thermostat_mode_is_installation_wide() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(installation_path("/thermostats/mode")))
        .and(body_json(json!({"mode": "COOLING"})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    client.thermostats().set_mode("COOLING").await.unwrap();
}

// ── Installation scope / token ──────────────────────────────────────

#[tokio::test]
async fn test_installation_scoped_call_without_installation_is_generic() {
    let server = MockServer::start().await;
    let client = CloudClient::builder("test-token")
        .base_url(server.uri())
        .build();

    let err = client.sensors().list(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Generic);
}

#[tokio::test]
async fn test_switching_installation_changes_paths() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/base/installations/9/inputs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1, "name": "Doorbell", "status": {"on": true}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_installation_id(9);
    let inputs = client.inputs().list(None).await.unwrap();
    assert_eq!(inputs[0].status.on, Some(true));
}

#[tokio::test]
async fn test_token_refresh_runs_before_every_request() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let client = CloudClient::builder("stale-token")
        .base_url(server.uri())
        .installation_id(5)
        .token_refresh(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(SecretString::from("fresh-token"))
            }
        })
        .build();

    Mock::given(method("GET"))
        .and(path(installation_path("/sensors")))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(2)
        .mount(&server)
        .await;

    client.sensors().list(None).await.unwrap();
    client.sensors().list(None).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
