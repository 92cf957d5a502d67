// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolution of set requests against cached light state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::slug::{device_token, slug};
use crate::state::StateStore;
use crate::types::{PowerState, RgbColor};

use super::OutboundCommand;

/// Body of an inbound set message.
///
/// ```json
/// {"controller": "fpp-garage", "state": "on", "color": [255, 0, 0]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRequest {
    /// Device that owns the light. Requests without one are skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// Requested state; `"on"` in any case turns the light on.
    #[serde(default)]
    pub state: String,
    /// Requested color; only used when it is a complete triple.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Vec<i64>>,
}

impl SetRequest {
    /// Returns the requested color if it is a complete, in-range triple.
    #[must_use]
    pub fn complete_color(&self) -> Option<RgbColor> {
        self.color.as_deref().and_then(RgbColor::from_channels)
    }
}

/// Result of resolving a set request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// A command to send to the device.
    Command(OutboundCommand),
    /// The request named no device.
    SkippedNoDevice,
    /// The light has never been observed, so there is no baseline to
    /// merge with.
    SkippedNoCache,
}

impl SetOutcome {
    /// Returns the command, if one was produced.
    #[must_use]
    pub fn command(&self) -> Option<&OutboundCommand> {
        match self {
            Self::Command(command) => Some(command),
            Self::SkippedNoDevice | Self::SkippedNoCache => None,
        }
    }
}

/// Merges requested changes with cached state to build device commands.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    store: Arc<StateStore>,
}

impl CommandResolver {
    /// Creates a resolver reading from and writing to `store`.
    #[must_use]
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    /// Returns the store in use.
    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Resolves a parsed set message for the light named by `light`.
    pub fn handle(&self, light: &str, request: &SetRequest) -> SetOutcome {
        self.resolve_set(
            request.controller.as_deref().unwrap_or_default(),
            light,
            PowerState::from_token(&request.state),
            request.complete_color(),
        )
    }

    /// Resolves a set request into a device command.
    ///
    /// `light` is looked up as a slug first, then as a model name on
    /// `device`. The color is taken from the request, else from the cache,
    /// else white. The command names the light by its cached display name
    /// and is addressed to the device's short token.
    ///
    /// On success the store is updated right away with the resolved power
    /// state and the requested color (if any), keeping the cached name.
    pub fn resolve_set(
        &self,
        device: &str,
        light: &str,
        power: PowerState,
        color: Option<RgbColor>,
    ) -> SetOutcome {
        if device.is_empty() {
            tracing::debug!(light = %light, "Skipping set with no controller specified");
            return SetOutcome::SkippedNoDevice;
        }

        let Some(cached) = self
            .store
            .get(light)
            .or_else(|| self.store.get(&slug(device, light)))
        else {
            tracing::debug!(light = %light, device = %device, "Skipping set with no cache available");
            return SetOutcome::SkippedNoCache;
        };

        let resolved_color = color.or(cached.color()).unwrap_or_else(RgbColor::white);
        let command = OutboundCommand::new(
            device_token(device),
            cached.name(),
            power,
            resolved_color,
        );

        tracing::info!(light = %cached.name(), device = %command.device(), "Updating light");

        self.store.update(cached.slug(), "", power.is_on(), color);

        SetOutcome::Command(command)
    }
}
