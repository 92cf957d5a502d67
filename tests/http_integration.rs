// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for overlay model polling using wiremock.

use std::sync::Arc;
use std::time::Duration;

use fpp_mqtt_bridge::command::CommandResolver;
use fpp_mqtt_bridge::error::{FetchError, ParseError};
use fpp_mqtt_bridge::poller::{Poller, poll_device};
use fpp_mqtt_bridge::protocol::{HttpConfig, HttpFetcher, OverlayFetcher, OverlayModel};
use fpp_mqtt_bridge::slug::slug;
use fpp_mqtt_bridge::state::{LightState, StateObserver, StateStore};
use fpp_mqtt_bridge::types::{PowerState, RgbColor};
use parking_lot::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(String, LightState)>>,
}

impl Recorder {
    fn take(&self) -> Vec<(String, LightState)> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl StateObserver for Recorder {
    fn on_state_changed(&self, slug: &str, state: &LightState) {
        self.events.lock().push((slug.to_string(), state.clone()));
    }
}

fn device_of(server: &MockServer) -> String {
    server.uri().replace("http://", "")
}

async fn mount_models(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/overlays/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ============================================================================
// HttpFetcher Tests
// ============================================================================

mod http_fetcher {
    use super::*;

    #[tokio::test]
    async fn fetches_and_parses_models() {
        let mock_server = MockServer::start().await;
        mount_models(
            &mock_server,
            serde_json::json!([
                {"name": "Wall", "isActive": 0, "type": "channel", "width": 50},
                {"name": "Tree", "isActive": 2}
            ]),
        )
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let models = fetcher.fetch_models(&device_of(&mock_server)).await.unwrap();

        assert_eq!(
            models,
            vec![OverlayModel::new("Wall", 0), OverlayModel::new("Tree", 2)]
        );
        assert!(!models[0].is_on());
        assert!(models[1].is_on());
    }

    #[tokio::test]
    async fn missing_is_active_means_off() {
        let mock_server = MockServer::start().await;
        mount_models(&mock_server, serde_json::json!([{"name": "Wall"}])).await;

        let fetcher = HttpFetcher::new().unwrap();
        let models = fetcher.fetch_models(&device_of(&mock_server)).await.unwrap();

        assert_eq!(models, vec![OverlayModel::new("Wall", 0)]);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/overlays/models"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch_models(&device_of(&mock_server))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { code: 503, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/overlays/models"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch_models(&device_of(&mock_server))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Malformed(ParseError::Json(_))));
    }

    #[tokio::test]
    async fn explicit_scheme_is_used_as_is() {
        let mock_server = MockServer::start().await;
        mount_models(&mock_server, serde_json::json!([])).await;

        let fetcher = HttpConfig::new()
            .with_port(1)
            .into_fetcher()
            .unwrap();
        // A device with its own scheme ignores the configured port
        let models = fetcher.fetch_models(&mock_server.uri()).await.unwrap();

        assert!(models.is_empty());
    }

    #[tokio::test]
    async fn unreachable_device_is_reported() {
        let fetcher = HttpConfig::new()
            .with_timeout(Duration::from_secs(2))
            .into_fetcher()
            .unwrap();
        let err = fetcher.fetch_models("127.0.0.1:1").await.unwrap_err();

        assert!(matches!(err, FetchError::Http(_)));
    }
}

// ============================================================================
// Polling Tests
// ============================================================================

mod polling {
    use super::*;

    #[tokio::test]
    async fn poll_device_feeds_store() {
        let mock_server = MockServer::start().await;
        let device = device_of(&mock_server);
        let recorder = Arc::new(Recorder::default());
        let store = StateStore::new().with_observer(Arc::clone(&recorder) as Arc<dyn StateObserver>);
        let fetcher = HttpFetcher::new().unwrap();

        mount_models(&mock_server, serde_json::json!([{"name": "Wall", "isActive": 0}])).await;

        let count = poll_device(&fetcher, &store, &device, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(count, 1);

        let wall = slug(&device, "Wall");
        let state = store.get(&wall).unwrap();
        assert!(!state.is_on());
        assert_eq!(state.name(), "Wall");
        // A new light that is off matches the zero state
        assert!(recorder.take().is_empty());

        mock_server.reset().await;
        mount_models(&mock_server, serde_json::json!([{"name": "Wall", "isActive": 5}])).await;

        poll_device(&fetcher, &store, &device, Duration::from_secs(1))
            .await
            .unwrap();

        let events = recorder.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, wall);
        assert!(events[0].1.is_on());
        assert_eq!(events[0].1.color(), None);

        // Same listing again is silent
        poll_device(&fetcher, &store, &device, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(recorder.take().is_empty());
    }

    #[tokio::test]
    async fn polling_keeps_cached_color() {
        let mock_server = MockServer::start().await;
        let device = device_of(&mock_server);
        let store = StateStore::new();
        let fetcher = HttpFetcher::new().unwrap();
        let wall = slug(&device, "Wall");

        store.update(&wall, "Wall", false, Some(RgbColor::new(255, 0, 0)));
        mount_models(&mock_server, serde_json::json!([{"name": "Wall", "isActive": 1}])).await;

        poll_device(&fetcher, &store, &device, Duration::from_secs(1))
            .await
            .unwrap();

        let state = store.get(&wall).unwrap();
        assert!(state.is_on());
        assert_eq!(state.color(), Some(RgbColor::new(255, 0, 0)));
    }

    #[tokio::test]
    async fn slow_device_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/overlays/models"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"name": "Wall", "isActive": 1}]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let store = StateStore::new();
        let fetcher = HttpFetcher::new().unwrap();
        let err = poll_device(
            &fetcher,
            &store,
            &device_of(&mock_server),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, FetchError::Timeout(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn poller_keeps_healthy_devices_flowing() {
        let healthy = MockServer::start().await;
        let broken = MockServer::start().await;
        mount_models(&healthy, serde_json::json!([{"name": "Tree", "isActive": 1}])).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&broken)
            .await;

        let store = Arc::new(StateStore::new());
        let mut poller = Poller::new(Arc::new(HttpFetcher::new().unwrap()))
            .with_devices([device_of(&broken), device_of(&healthy)])
            .with_interval(Duration::from_secs(1))
            .with_store(Arc::clone(&store));

        poller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1800)).await;
        poller.stop();

        let tree = store.get(&slug(&device_of(&healthy), "Tree")).unwrap();
        assert!(tree.is_on());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn external_command_then_poll() {
        let mock_server = MockServer::start().await;
        let device = device_of(&mock_server);
        let recorder = Arc::new(Recorder::default());
        let store = Arc::new(
            StateStore::new().with_observer(Arc::clone(&recorder) as Arc<dyn StateObserver>),
        );
        let fetcher = HttpFetcher::new().unwrap();
        let resolver = CommandResolver::new(Arc::clone(&store));
        let wall = slug(&device, "Wall");

        mount_models(&mock_server, serde_json::json!([{"name": "Wall", "isActive": 0}])).await;
        poll_device(&fetcher, &store, &device, Duration::from_secs(1))
            .await
            .unwrap();

        let outcome = resolver.resolve_set(
            &device,
            &wall,
            PowerState::On,
            Some(RgbColor::new(10, 0, 0)),
        );
        let command = outcome.command().unwrap();
        assert_eq!(
            command.to_json().unwrap(),
            r##"{"command":"Overlay Model Fill","args":["Wall","1","#0a0000"]}"##
        );
        assert_eq!(recorder.take().len(), 1);

        // The device confirms the fill on the next poll; nothing changes
        mock_server.reset().await;
        mount_models(&mock_server, serde_json::json!([{"name": "Wall", "isActive": 1}])).await;
        poll_device(&fetcher, &store, &device, Duration::from_secs(1))
            .await
            .unwrap();

        assert!(recorder.take().is_empty());
        let state = store.get(&wall).unwrap();
        assert!(state.is_on());
        assert_eq!(state.color(), Some(RgbColor::new(10, 0, 0)));
    }
}
