// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB color triple.

use std::fmt;

use serde::{Deserialize, Serialize};

/// RGB color with 8-bit channels (0-255).
///
/// An `RgbColor` is always complete: it has exactly three channels. Partial
/// or out-of-range input is rejected by [`RgbColor::from_channels`], which
/// is how a color that should not replace a cached one is represented
/// (as `None`).
///
/// Serializes as a JSON array `[r, g, b]`.
///
/// # Examples
///
/// ```
/// use fpp_mqtt_bridge::types::RgbColor;
///
/// let color = RgbColor::new(255, 128, 0);
/// assert_eq!(color.to_hex(), "#ff8000");
///
/// assert_eq!(RgbColor::from_channels(&[10, 20, 30]), Some(RgbColor::new(10, 20, 30)));
/// assert_eq!(RgbColor::from_channels(&[10, 20]), None);
/// assert_eq!(RgbColor::from_channels(&[10, 20, 300]), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct RgbColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RgbColor {
    /// Number of channels in a complete color.
    pub const CHANNELS: usize = 3;

    /// Creates a new RGB color.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Builds a color from loosely typed channel values.
    ///
    /// Returns `None` unless there are exactly three values, each in
    /// `0..=255`.
    #[must_use]
    pub fn from_channels(channels: &[i64]) -> Option<Self> {
        let [r, g, b] = channels else {
            return None;
        };
        Some(Self::new(
            u8::try_from(*r).ok()?,
            u8::try_from(*g).ok()?,
            u8::try_from(*b).ok()?,
        ))
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Returns the channels in red, green, blue order.
    #[must_use]
    pub const fn channels(&self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }

    /// Returns the color as a lowercase `#rrggbb` string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// Creates a white color.
    #[must_use]
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::white()
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 3]> for RgbColor {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self::new(red, green, blue)
    }
}

impl From<RgbColor> for [u8; 3] {
    fn from(color: RgbColor) -> Self {
        color.channels()
    }
}

impl From<(u8, u8, u8)> for RgbColor {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}
