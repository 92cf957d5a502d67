// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Last known state of one overlay model.

use crate::types::{PowerState, RgbColor};

/// Last known state of one controllable light.
///
/// A record is identified by its slug, which never changes. The display name
/// may be refreshed, the power state is always overwritten, and the color is
/// only replaced by a complete triple.
///
/// # Examples
///
/// ```
/// use fpp_mqtt_bridge::state::LightState;
/// use fpp_mqtt_bridge::types::RgbColor;
///
/// let mut state = LightState::new("d1-wall", "Wall");
///
/// // Apply returns true if an observable field changed
/// assert!(state.apply("", true, None));
/// assert!(!state.apply("", true, None));
///
/// // A missing color leaves the cached one untouched
/// assert!(state.apply("", true, Some(RgbColor::new(10, 20, 30))));
/// assert!(!state.apply("", true, None));
/// assert_eq!(state.color(), Some(RgbColor::new(10, 20, 30)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightState {
    slug: String,
    name: String,
    on: bool,
    color: Option<RgbColor>,
}

impl LightState {
    /// Creates a record in the zero state: off, no known color.
    #[must_use]
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            on: false,
            color: None,
        }
    }

    /// Returns the slug identifying this light.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the light is on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Returns the power state as a bus token.
    #[must_use]
    pub fn power(&self) -> PowerState {
        PowerState::from(self.on)
    }

    /// Returns the last known color, if any.
    #[must_use]
    pub fn color(&self) -> Option<RgbColor> {
        self.color
    }

    /// Applies an observed or requested update in place.
    ///
    /// - `name` replaces the display name unless it is empty
    /// - `on` always replaces the power state
    /// - `color` replaces the cached color only when present
    ///
    /// Returns `true` if the power state or color changed. A name change
    /// alone is not observable and returns `false`.
    pub fn apply(&mut self, name: &str, on: bool, color: Option<RgbColor>) -> bool {
        let previous_on = self.on;
        let previous_color = self.color;

        if !name.is_empty() {
            self.name = name.to_string();
        }
        self.on = on;
        if let Some(color) = color {
            self.color = Some(color);
        }

        self.on != previous_on || self.color != previous_color
    }
}
