// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power state token used in bus messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Power state of an overlay model as carried on the bus.
///
/// # Examples
///
/// ```
/// use fpp_mqtt_bridge::types::PowerState;
///
/// assert_eq!(PowerState::from_token("ON"), PowerState::On);
/// assert_eq!(PowerState::from_token("off"), PowerState::Off);
/// // Anything that is not "on" means off.
/// assert_eq!(PowerState::from_token("dim"), PowerState::Off);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    /// Light is off.
    #[default]
    Off,
    /// Light is on.
    On,
}

impl PowerState {
    /// Maps a requested state token to a power state.
    ///
    /// Matching is case-insensitive and lenient: only `"on"` turns a light
    /// on, every other value is treated as off.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("on") {
            Self::On
        } else {
            Self::Off
        }
    }

    /// Returns the bus token (`"on"` or `"off"`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }

    /// Returns the flag used in device commands (`"1"` or `"0"`).
    #[must_use]
    pub const fn as_flag(&self) -> &'static str {
        match self {
            Self::Off => "0",
            Self::On => "1",
        }
    }

    /// Returns `true` for [`PowerState::On`].
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for PowerState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl From<PowerState> for bool {
    fn from(value: PowerState) -> Self {
        value.is_on()
    }
}
