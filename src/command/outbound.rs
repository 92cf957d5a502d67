// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Commands sent to devices over the bus.

use serde::{Deserialize, Serialize};

use crate::types::{PowerState, RgbColor};

/// Name of the device command that fills an overlay model with a color.
pub const OVERLAY_MODEL_FILL: &str = "Overlay Model Fill";

/// Wire form of a device command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FalconMessage {
    /// Command name.
    pub command: String,
    /// Positional command arguments.
    pub args: Vec<String>,
}

/// A fully resolved "Overlay Model Fill" command for one light.
///
/// # Examples
///
/// ```
/// use fpp_mqtt_bridge::command::OutboundCommand;
/// use fpp_mqtt_bridge::types::{PowerState, RgbColor};
///
/// let command = OutboundCommand::new("fpp-1", "Wall", PowerState::On, RgbColor::new(10, 0, 0));
/// assert_eq!(command.topic(), "falcon/player/fpp-1/set/command");
/// assert_eq!(
///     command.to_json().unwrap(),
///     r##"{"command":"Overlay Model Fill","args":["Wall","1","#0a0000"]}"##
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCommand {
    device: String,
    light_name: String,
    power: PowerState,
    color: RgbColor,
}

impl OutboundCommand {
    /// Creates a command addressed to the device token `device`.
    #[must_use]
    pub fn new(
        device: impl Into<String>,
        light_name: impl Into<String>,
        power: PowerState,
        color: RgbColor,
    ) -> Self {
        Self {
            device: device.into(),
            light_name: light_name.into(),
            power,
            color,
        }
    }

    /// Returns the short device token the command is addressed to.
    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Returns the overlay model name as known by the device.
    #[must_use]
    pub fn light_name(&self) -> &str {
        &self.light_name
    }

    /// Returns the requested power state.
    #[must_use]
    pub fn power(&self) -> PowerState {
        self.power
    }

    /// Returns the fill color.
    #[must_use]
    pub fn color(&self) -> RgbColor {
        self.color
    }

    /// Returns the bus topic the device listens on.
    #[must_use]
    pub fn topic(&self) -> String {
        format!("falcon/player/{}/set/command", self.device)
    }

    /// Returns the command arguments: name, on flag, color.
    #[must_use]
    pub fn args(&self) -> [String; 3] {
        [
            self.light_name.clone(),
            self.power.as_flag().to_string(),
            self.color.to_hex(),
        ]
    }

    /// Returns the wire message.
    #[must_use]
    pub fn message(&self) -> FalconMessage {
        FalconMessage {
            command: OVERLAY_MODEL_FILL.to_string(),
            args: self.args().to_vec(),
        }
    }

    /// Serializes the wire message to JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_command_args() {
        let command = OutboundCommand::new("fpp", "Tree", PowerState::Off, RgbColor::white());
        assert_eq!(command.args(), ["Tree", "0", "#ffffff"]);
    }

    #[test]
    fn message_round_trips_through_json() {
        let command =
            OutboundCommand::new("fpp", "Tree", PowerState::On, RgbColor::new(1, 2, 3));
        let message: FalconMessage = serde_json::from_str(&command.to_json().unwrap()).unwrap();
        assert_eq!(message.command, "Overlay Model Fill");
        assert_eq!(message.args, vec!["Tree", "1", "#010203"]);
    }

    #[test]
    fn accessors() {
        let command =
            OutboundCommand::new("fpp", "Tree", PowerState::On, RgbColor::new(1, 2, 3));
        assert_eq!(command.device(), "fpp");
        assert_eq!(command.light_name(), "Tree");
        assert_eq!(command.power(), PowerState::On);
        assert_eq!(command.color(), RgbColor::new(1, 2, 3));
    }
}
