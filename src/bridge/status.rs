// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Retained status messages for each light.

use serde::{Deserialize, Serialize};

use crate::state::LightState;
use crate::types::{PowerState, RgbColor};

/// Payload published on `<prefix>/<slug>/status`.
///
/// # Examples
///
/// ```
/// use fpp_mqtt_bridge::bridge::StatusMessage;
/// use fpp_mqtt_bridge::state::LightState;
/// use fpp_mqtt_bridge::types::RgbColor;
///
/// let mut state = LightState::new("d1-wall", "Wall");
/// assert_eq!(StatusMessage::from(&state).to_json().unwrap(), r#"{"state":"off"}"#);
///
/// state.apply("", true, Some(RgbColor::new(10, 0, 0)));
/// assert_eq!(
///     StatusMessage::from(&state).to_json().unwrap(),
///     r#"{"state":"on","color":[10,0,0]}"#
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Power state.
    pub state: PowerState,
    /// Last known color, omitted when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<RgbColor>,
}

impl StatusMessage {
    /// Serializes the message to JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&LightState> for StatusMessage {
    fn from(state: &LightState) -> Self {
        Self {
            state: state.power(),
            color: state.color(),
        }
    }
}

/// Returns the status topic for a light.
#[must_use]
pub fn status_topic(prefix: &str, slug: &str) -> String {
    format!("{}/{slug}/status", prefix.trim_end_matches('/'))
}

#[cfg(feature = "mqtt")]
pub use publisher::StatusPublisher;
#[cfg(feature = "mqtt")]
pub(crate) use publisher::forward_status;

#[cfg(feature = "mqtt")]
mod publisher {
    use rumqttc::{AsyncClient, QoS};
    use tokio::sync::mpsc;

    use super::{StatusMessage, status_topic};
    use crate::state::{LightState, StateObserver};

    /// One encoded status message waiting to be published.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct PendingStatus {
        pub(crate) topic: String,
        pub(crate) payload: String,
    }

    /// Publishes every state change as a retained status message.
    ///
    /// Notifications are queued without bound and never block
    /// [`StateStore::update`](crate::state::StateStore::update). A single
    /// task started by the bridge publishes them in order, waiting for room
    /// in the client queue, so a burst of changes or a broker outage delays
    /// status messages instead of losing them.
    #[derive(Debug, Clone)]
    pub struct StatusPublisher {
        tx: mpsc::UnboundedSender<PendingStatus>,
        topic_prefix: String,
    }

    impl StatusPublisher {
        /// Creates a publisher and the receiving end of its queue.
        pub(crate) fn channel(
            topic_prefix: impl Into<String>,
        ) -> (Self, mpsc::UnboundedReceiver<PendingStatus>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let publisher = Self {
                tx,
                topic_prefix: topic_prefix.into(),
            };
            (publisher, rx)
        }
    }

    impl StateObserver for StatusPublisher {
        fn on_state_changed(&self, slug: &str, state: &LightState) {
            let payload = match StatusMessage::from(state).to_json() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(slug = %slug, error = %e, "Could not encode light status");
                    return;
                }
            };
            let topic = status_topic(&self.topic_prefix, slug);

            tracing::info!(light = %state.name(), topic = %topic, "Publishing light update");

            if self.tx.send(PendingStatus { topic, payload }).is_err() {
                tracing::warn!(slug = %slug, "Status forwarding has stopped; dropping light status");
            }
        }
    }

    /// Publishes queued status messages until every publisher is dropped or
    /// the client's event loop is gone.
    pub(crate) async fn forward_status(
        client: AsyncClient,
        mut rx: mpsc::UnboundedReceiver<PendingStatus>,
    ) {
        while let Some(PendingStatus { topic, payload }) = rx.recv().await {
            if let Err(e) = client.publish(&topic, QoS::AtMostOnce, true, payload).await {
                tracing::debug!(topic = %topic, error = %e, "Stopping status forwarding");
                return;
            }
        }
    }

}
