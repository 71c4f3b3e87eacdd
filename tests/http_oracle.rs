// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the REST state oracle using wiremock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use hass_rules::error::OracleError;
use hass_rules::oracle::{HttpStateOracle, OracleConfig, StateOracle};
use hass_rules::{Engine, EngineConfig, EntityListener, ListenerRegistry};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn oracle_for(server: &MockServer) -> HttpStateOracle {
    HttpStateOracle::new(server.uri(), TOKEN).unwrap()
}

// ============================================================================
// HttpStateOracle Tests
// ============================================================================

mod http_state_oracle {
    use super::*;

    #[tokio::test]
    async fn get_state_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/states/input_boolean.away"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "entity_id": "input_boolean.away",
                "state": "on",
                "attributes": {"friendly_name": "Away"},
                "last_changed": "2024-01-15T10:30:00+00:00",
                "last_updated": "2024-01-15T10:30:00+00:00",
                "context": {"id": "01HM", "parent_id": null, "user_id": null}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let state = oracle_for(&mock_server)
            .get_state("input_boolean.away")
            .await
            .unwrap();

        assert_eq!(state.entity_id, "input_boolean.away");
        assert_eq!(state.state, "on");
        assert_eq!(state.attributes["friendly_name"], "Away");
        assert!(state.last_changed.is_some());
    }

    #[tokio::test]
    async fn get_state_unauthorized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let result = oracle_for(&mock_server).get_state("light.pantry").await;
        assert!(matches!(result, Err(OracleError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn get_state_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/states/light.missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Entity not found."
            })))
            .mount(&mock_server)
            .await;

        let result = oracle_for(&mock_server).get_state("light.missing").await;
        match result {
            Err(OracleError::NotFound(entity)) => assert_eq!(entity, "light.missing"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_state_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = oracle_for(&mock_server).get_state("light.pantry").await;
        match result {
            Err(OracleError::RequestFailed(message)) => {
                assert_eq!(message, "HTTP 500 - Internal Server Error");
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_state_invalid_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
            .mount(&mock_server)
            .await;

        let result = oracle_for(&mock_server).get_state("light.pantry").await;
        assert!(matches!(result, Err(OracleError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn get_state_request_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"state": "on"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let oracle =
            HttpStateOracle::with_timeout(mock_server.uri(), TOKEN, Duration::from_millis(200))
                .unwrap();
        let result = oracle.get_state("light.pantry").await;

        match result {
            Err(OracleError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn config_into_oracle_targets_server() {
        let mock_server = MockServer::start().await;
        let address = mock_server.address();

        Mock::given(method("GET"))
            .and(path("/api/states/sun.sun"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "entity_id": "sun.sun",
                "state": "above_horizon"
            })))
            .mount(&mock_server)
            .await;

        let oracle = OracleConfig::new(address.ip().to_string(), TOKEN)
            .with_port(address.port())
            .into_oracle()
            .unwrap();

        let state = oracle.get_state("sun.sun").await.unwrap();
        assert_eq!(state.state, "above_horizon");
    }
}

// ============================================================================
// Engine with HttpStateOracle
// ============================================================================

mod engine_gates {
    use super::*;

    fn state_changed(entity_id: &str, old: &str, new: &str) -> String {
        serde_json::json!({
            "type": "event",
            "event": {
                "event_type": "state_changed",
                "data": {
                    "entity_id": entity_id,
                    "old_state": {"entity_id": entity_id, "state": old, "attributes": {}},
                    "new_state": {"entity_id": entity_id, "state": new, "attributes": {}}
                }
            }
        })
        .to_string()
    }

    async fn wait_for(count: &AtomicU32, expected: u32) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while count.load(Ordering::SeqCst) < expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn enabled_when_queries_rest_api() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/states/input_boolean.guest_mode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "entity_id": "input_boolean.guest_mode",
                "state": "on"
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);

        let mut registry = ListenerRegistry::new();
        registry.register_entity_listener(
            EntityListener::builder()
                .entity_ids(["light.guest_room"])
                .call(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .enabled_when("input_boolean.guest_mode", "on", false)
                .build()
                .unwrap(),
        );
        let engine = Engine::new(registry, oracle_for(&mock_server));

        engine
            .handle_message(&state_changed("light.guest_room", "off", "on"))
            .await;
        engine
            .handle_message(&state_changed("light.guest_room", "on", "off"))
            .await;

        wait_for(&count, 2).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_rest_api_uses_network_error_policy() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"state": "on"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let blocked = Arc::new(AtomicU32::new(0));
        let allowed = Arc::new(AtomicU32::new(0));
        let b = Arc::clone(&blocked);
        let a = Arc::clone(&allowed);

        let mut registry = ListenerRegistry::new();
        registry.register_entity_listener(
            EntityListener::builder()
                .entity_ids(["switch.heater"])
                .call(move |_| {
                    b.fetch_add(1, Ordering::SeqCst);
                })
                .enabled_when("input_boolean.winter", "on", false)
                .build()
                .unwrap(),
        );
        registry.register_entity_listener(
            EntityListener::builder()
                .entity_ids(["switch.heater"])
                .call(move |_| {
                    a.fetch_add(1, Ordering::SeqCst);
                })
                .disabled_when("input_boolean.vacation", "on", true)
                .build()
                .unwrap(),
        );

        let engine = Engine::new(registry, oracle_for(&mock_server))
            .with_config(EngineConfig::new().with_oracle_timeout(Duration::from_millis(200)));

        engine
            .handle_message(&state_changed("switch.heater", "off", "on"))
            .await;

        wait_for(&allowed, 1).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(blocked.load(Ordering::SeqCst), 0);
        assert_eq!(allowed.load(Ordering::SeqCst), 1);
    }
}
