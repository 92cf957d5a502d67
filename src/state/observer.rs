// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change notification seam between the store and its sink.

use super::LightState;

/// Receives a notification each time a light's power state or color changes.
///
/// Called synchronously from [`StateStore::update`](super::StateStore::update)
/// after the store's locks have been released. Implementations that talk to
/// the network should hand the work off rather than wait on it.
///
/// Any `Fn(&str, &LightState)` closure is an observer:
///
/// ```
/// use std::sync::Arc;
/// use fpp_mqtt_bridge::state::{LightState, StateStore};
///
/// let store = StateStore::new().with_observer(Arc::new(|slug: &str, state: &LightState| {
///     println!("{slug} is now {}", state.power());
/// }));
/// store.update("d1-wall", "Wall", true, None);
/// ```
pub trait StateObserver: Send + Sync {
    /// Called with the slug and the record that was just stored.
    fn on_state_changed(&self, slug: &str, state: &LightState);
}

impl<F> StateObserver for F
where
    F: Fn(&str, &LightState) + Send + Sync,
{
    fn on_state_changed(&self, slug: &str, state: &LightState) {
        self(slug, state);
    }
}
