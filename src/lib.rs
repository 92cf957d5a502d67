// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! FPP MQTT Bridge - two-way state sync between Falcon Player overlay models
//! and an MQTT bus.
//!
//! The bridge polls each configured controller's overlay model listing over
//! HTTP, caches the on/off state and color of every model, and publishes
//! changes to the bus. Set requests arriving on the bus are merged with the
//! cached state and sent back to the controller as "Overlay Model Fill"
//! commands.
//!
//! # Modules
//!
//! - [`state`]: concurrent per-light cache with change notification
//! - [`poller`]: periodic fetch loop feeding the cache
//! - [`protocol`]: overlay model listing and its HTTP fetcher
//! - [`command`]: set request resolution and outbound commands
//! - [`bridge`]: MQTT connection, topic routing and status publishing
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fpp_mqtt_bridge::bridge::MqttBridge;
//! use fpp_mqtt_bridge::command::CommandResolver;
//! use fpp_mqtt_bridge::poller::Poller;
//! use fpp_mqtt_bridge::protocol::HttpFetcher;
//! use fpp_mqtt_bridge::state::StateStore;
//!
//! #[tokio::main]
//! async fn main() -> fpp_mqtt_bridge::Result<()> {
//!     let bridge = MqttBridge::builder().host("192.168.1.50").build().await?;
//!
//!     let store = Arc::new(StateStore::new().with_observer(Arc::new(bridge.status_publisher())));
//!     bridge.attach(CommandResolver::new(Arc::clone(&store)));
//!
//!     let mut poller = Poller::new(Arc::new(HttpFetcher::new()?))
//!         .with_devices(["fpp-garage"])
//!         .with_interval(Duration::from_secs(1))
//!         .with_store(store);
//!     poller.start()?;
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     poller.stop();
//!     bridge.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Light Identity
//!
//! Each light is keyed by a slug built from the controller and the model
//! name, so two controllers may expose models with the same name:
//!
//! ```
//! use fpp_mqtt_bridge::slug::slug;
//!
//! assert_eq!(slug("fpp-garage.lan", "Wall Left"), "fpp_garage-wall_left");
//! ```

pub mod bridge;
pub mod command;
pub mod config;
pub mod error;
pub mod poller;
pub mod protocol;
pub mod slug;
pub mod state;
pub mod types;

#[cfg(feature = "mqtt")]
pub use bridge::{MqttBridge, MqttBridgeBuilder, StatusPublisher};
pub use command::{CommandResolver, OutboundCommand, SetOutcome, SetRequest};
pub use config::BridgeConfig;
pub use error::{ConfigError, Error, FetchError, ParseError, ProtocolError, Result};
pub use poller::Poller;
#[cfg(feature = "http")]
pub use protocol::{HttpConfig, HttpFetcher};
pub use protocol::{OverlayFetcher, OverlayModel};
pub use state::{LightState, StateObserver, StateStore};
pub use types::{PowerState, RgbColor};
