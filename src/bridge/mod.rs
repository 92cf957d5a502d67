// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Message bus side of the bridge.
//!
//! Topics under the configured prefix:
//!
//! | Topic | Direction | Payload |
//! |-------|-----------|---------|
//! | `<prefix>/<light>/set` | inbound | [`SetRequest`](crate::command::SetRequest) |
//! | `<prefix>/<slug>/status` | outbound, retained | [`StatusMessage`] |
//! | `falcon/player/<device>/set/command` | outbound | [`FalconMessage`](crate::command::FalconMessage) |
//!
//! # Architecture
//!
//! ```text
//! <prefix>/<light>/set
//!         ↓
//!   MqttBridge event loop → route_topic()
//!         ↓
//!   CommandResolver.handle()  ──→ StateStore.update() ──→ StatusPublisher
//!         ↓                                                    ↓
//!   falcon/player/<device>/set/command          <prefix>/<slug>/status
//! ```

#[cfg(feature = "mqtt")]
mod mqtt_bridge;
mod status;
mod topic;

#[cfg(feature = "mqtt")]
pub use mqtt_bridge::{MqttBridge, MqttBridgeBuilder, MqttBridgeConfig};
#[cfg(feature = "mqtt")]
pub use status::StatusPublisher;
#[cfg(feature = "mqtt")]
use status::forward_status;
pub use status::{StatusMessage, status_topic};
pub use topic::{Route, route_topic};
