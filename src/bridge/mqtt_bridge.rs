// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT connection for the bridge.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use fpp_mqtt_bridge::bridge::MqttBridge;
//! use fpp_mqtt_bridge::command::CommandResolver;
//! use fpp_mqtt_bridge::state::StateStore;
//!
//! # async fn example() -> fpp_mqtt_bridge::Result<()> {
//! let bridge = MqttBridge::builder()
//!     .host("192.168.1.50")
//!     .credentials("user", "password")
//!     .topic_prefix("home/fpp")
//!     .build()
//!     .await?;
//!
//! // Status updates go out through the bridge
//! let store = Arc::new(StateStore::new().with_observer(Arc::new(bridge.status_publisher())));
//!
//! // Set requests are resolved against the same store
//! bridge.attach(CommandResolver::new(Arc::clone(&store)));
//!
//! bridge.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::sync::oneshot;

use crate::command::{CommandResolver, OutboundCommand, SetOutcome, SetRequest};
use crate::error::{ConfigError, Error, ProtocolError};

use super::{Route, StatusPublisher, forward_status, route_topic};

/// Delay before polling the event loop again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the client request queue.
const REQUEST_CAPACITY: usize = 64;

/// Configuration for the bridge's MQTT connection.
#[derive(Debug, Clone)]
pub struct MqttBridgeConfig {
    host: String,
    port: u16,
    client_id: String,
    credentials: Option<(String, String)>,
    topic_prefix: String,
    keep_alive: Duration,
    connection_timeout: Duration,
}

impl Default for MqttBridgeConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            client_id: Self::DEFAULT_CLIENT_ID.to_string(),
            credentials: None,
            topic_prefix: Self::DEFAULT_TOPIC_PREFIX.to_string(),
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

impl MqttBridgeConfig {
    /// Client id used when none is configured.
    pub const DEFAULT_CLIENT_ID: &str = "fpp-mqtt-bridge";

    /// Topic prefix used when none is configured.
    pub const DEFAULT_TOPIC_PREFIX: &str = "fpp-mqtt-bridge";

    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the topic prefix.
    #[must_use]
    pub fn topic_prefix(&self) -> &str {
        &self.topic_prefix
    }

    fn subscription(&self) -> String {
        format!("{}/#", self.topic_prefix.trim_end_matches('/'))
    }
}

/// MQTT connection that carries set requests in and commands and status out.
///
/// `MqttBridge` is cheaply cloneable (via `Arc`).
#[derive(Clone)]
pub struct MqttBridge {
    inner: Arc<MqttBridgeInner>,
}

struct MqttBridgeInner {
    client: AsyncClient,
    config: MqttBridgeConfig,
    connected: AtomicBool,
    shutdown: AtomicBool,
    status: StatusPublisher,
    /// Set once the store exists; set requests before that are dropped.
    resolver: OnceLock<CommandResolver>,
}

impl MqttBridge {
    /// Creates a new builder for configuring the connection.
    #[must_use]
    pub fn builder() -> MqttBridgeBuilder {
        MqttBridgeBuilder::default()
    }

    /// Returns whether the broker connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the configuration in use.
    #[must_use]
    pub fn config(&self) -> &MqttBridgeConfig {
        &self.inner.config
    }

    /// Returns an observer that publishes state changes as status messages.
    #[must_use]
    pub fn status_publisher(&self) -> StatusPublisher {
        self.inner.status.clone()
    }

    /// Starts handling set requests with `resolver`.
    ///
    /// Returns `false` if a resolver was already attached.
    pub fn attach(&self, resolver: CommandResolver) -> bool {
        self.inner.resolver.set(resolver).is_ok()
    }

    /// Publishes a device command.
    ///
    /// # Errors
    ///
    /// Returns error if the command cannot be encoded or queued.
    pub async fn publish_command(&self, command: &OutboundCommand) -> Result<(), ProtocolError> {
        let payload = command.to_json()?;

        self.inner
            .client
            .publish(command.topic(), QoS::AtMostOnce, false, payload)
            .await
            .map_err(ProtocolError::Mqtt)
    }

    /// Disconnects from the broker and stops the event loop.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        self.inner.shutdown.store(true, Ordering::Release);
        self.inner
            .client
            .disconnect()
            .await
            .map_err(ProtocolError::Mqtt)?;

        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }

    /// Subscribes to everything under the prefix. Called on each ConnAck.
    fn subscribe(&self) {
        let filter = self.inner.config.subscription();
        // Queued without waiting: the event loop that drains the queue is
        // the caller.
        match self.inner.client.try_subscribe(&filter, QoS::AtMostOnce) {
            Ok(()) => tracing::debug!(filter = %filter, "Subscribed to light commands"),
            Err(e) => tracing::error!(filter = %filter, error = %e, "Could not subscribe"),
        }
    }

    /// Routes one inbound message.
    fn route_message(&self, topic: &str, payload: &[u8]) {
        let route = match route_topic(&self.inner.config.topic_prefix, topic) {
            Ok(route) => route,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring message");
                return;
            }
        };

        let light = match route {
            Route::Set { light } => light.to_string(),
            Route::Status { .. } => return,
            Route::Other { method, .. } => {
                tracing::debug!(method = %method, "Skipping unknown message method");
                return;
            }
        };

        let request: SetRequest = match serde_json::from_slice(payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(topic = %topic, error = %e, "Dropping malformed set request");
                return;
            }
        };

        let bridge = self.clone();
        tokio::spawn(async move {
            bridge.handle_set(&light, &request).await;
        });
    }

    async fn handle_set(&self, light: &str, request: &SetRequest) {
        let Some(resolver) = self.inner.resolver.get() else {
            tracing::debug!(light = %light, "No resolver attached; dropping set request");
            return;
        };

        let SetOutcome::Command(command) = resolver.handle(light, request) else {
            return;
        };

        if let Err(e) = self.publish_command(&command).await {
            tracing::warn!(
                device = %command.device(),
                light = %command.light_name(),
                error = %e,
                "Could not publish device command"
            );
        }
    }
}

impl std::fmt::Debug for MqttBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBridge")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("topic_prefix", &self.inner.config.topic_prefix)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Builder for the bridge's MQTT connection.
///
/// # Examples
///
/// ```no_run
/// use fpp_mqtt_bridge::bridge::MqttBridge;
/// use std::time::Duration;
///
/// # async fn example() -> fpp_mqtt_bridge::Result<()> {
/// let bridge = MqttBridge::builder()
///     .host("192.168.1.50")
///     .port(1883)
///     .client_id("fpp-bridge-garage")
///     .keep_alive(Duration::from_secs(60))
///     .connection_timeout(Duration::from_secs(5))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MqttBridgeBuilder {
    config: MqttBridgeConfig,
}

impl MqttBridgeBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the client id (default: `fpp-mqtt-bridge`).
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = client_id.into();
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the topic prefix (default: `fpp-mqtt-bridge`).
    #[must_use]
    pub fn topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.topic_prefix = prefix.into();
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Connects to the broker.
    ///
    /// Returns once the broker has acknowledged the connection. The event
    /// loop keeps running in the background and reconnects on failure.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host or client id is empty
    /// - The broker does not acknowledge within the connection timeout
    pub async fn build(self) -> Result<MqttBridge, Error> {
        if self.config.host.is_empty() {
            return Err(ConfigError::MissingBrokerHost.into());
        }
        if self.config.client_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "client id".to_string(),
                message: "must not be empty".to_string(),
            }
            .into());
        }

        let mut mqtt_options =
            MqttOptions::new(&self.config.client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CAPACITY);

        let (status, status_rx) = StatusPublisher::channel(&self.config.topic_prefix);
        tokio::spawn(forward_status(client.clone(), status_rx));

        let bridge = MqttBridge {
            inner: Arc::new(MqttBridgeInner {
                client,
                config: self.config.clone(),
                connected: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
                status,
                resolver: OnceLock::new(),
            }),
        };

        let (connack_tx, connack_rx) = oneshot::channel();

        tokio::spawn(handle_bridge_events(event_loop, bridge.clone(), connack_tx));

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    "Connected to MQTT broker"
                );
                Ok(bridge)
            }
            Ok(Err(_)) => Err(ProtocolError::ConnectionFailed(
                "MQTT event loop terminated unexpectedly".to_string(),
            )
            .into()),
            Err(_) => {
                bridge.inner.shutdown.store(true, Ordering::Release);
                Err(ProtocolError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                ))
                .into())
            }
        }
    }
}

/// Drives the MQTT event loop until shutdown.
async fn handle_bridge_events(
    mut event_loop: EventLoop,
    bridge: MqttBridge,
    connack_tx: oneshot::Sender<()>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = Some(connack_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                bridge.inner.connected.store(true, Ordering::Release);
                bridge.subscribe();
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                tracing::debug!(topic = %publish.topic, "MQTT message received");
                bridge.route_message(&publish.topic, &publish.payload);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                bridge.inner.connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                bridge.inner.connected.store(false, Ordering::Release);
                if bridge.inner.shutdown.load(Ordering::Acquire) {
                    tracing::debug!("MQTT event loop stopped");
                    break;
                }
                tracing::warn!(error = %e, "Disconnected from MQTT host; retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
