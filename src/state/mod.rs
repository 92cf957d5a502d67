// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory light state with change notification.
//!
//! The [`StateStore`] keeps one [`LightState`] per slug and calls its
//! [`StateObserver`] whenever a light's power state or color actually
//! changes. Nothing is persisted; the store is rebuilt from the next poll
//! after a restart.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use fpp_mqtt_bridge::state::{LightState, StateStore};
//! use fpp_mqtt_bridge::types::RgbColor;
//!
//! let store = StateStore::new().with_observer(Arc::new(|slug: &str, state: &LightState| {
//!     println!("{slug}: {} {:?}", state.power(), state.color());
//! }));
//!
//! // Notifies: first observation of a light that is on
//! store.update("d1-wall", "Wall", true, None);
//! // Silent: nothing observable changed
//! store.update("d1-wall", "Wall", true, None);
//! // Notifies: new color
//! store.update("d1-wall", "", true, Some(RgbColor::new(255, 0, 0)));
//! ```

mod light_state;
mod observer;
mod store;

pub use light_state::LightState;
pub use observer::StateObserver;
pub use store::StateStore;
