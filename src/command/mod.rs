// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Turning bus requests into device commands.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`SetRequest`] | Body of an inbound `<prefix>/<light>/set` message |
//! | [`CommandResolver`] | Merges a request with cached state |
//! | [`SetOutcome`] | A command to send, or the reason nothing is sent |
//! | [`OutboundCommand`] | An "Overlay Model Fill" command for one device |
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use fpp_mqtt_bridge::command::{CommandResolver, SetOutcome, SetRequest};
//! use fpp_mqtt_bridge::state::StateStore;
//!
//! let store = Arc::new(StateStore::new());
//! store.update("fpp_1-wall", "Wall", false, None);
//!
//! let resolver = CommandResolver::new(Arc::clone(&store));
//! let request: SetRequest =
//!     serde_json::from_str(r#"{"controller":"fpp-1","state":"ON"}"#).unwrap();
//!
//! let SetOutcome::Command(command) = resolver.handle("fpp_1-wall", &request) else {
//!     panic!("expected a command");
//! };
//! assert_eq!(command.topic(), "falcon/player/fpp-1/set/command");
//! assert_eq!(command.args(), ["Wall", "1", "#ffffff"]);
//! ```

mod outbound;
mod resolver;

pub use outbound::{FalconMessage, OVERLAY_MODEL_FILL, OutboundCommand};
pub use resolver::{CommandResolver, SetOutcome, SetRequest};
