// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading overlay model state from devices.
//!
//! The poller talks to devices through the [`OverlayFetcher`] trait so it can
//! be driven by a fake in tests. [`HttpFetcher`] is the real implementation,
//! reading `GET /api/overlays/models` from a Falcon Player.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpFetcher};

use std::future::Future;

use serde::Deserialize;

use crate::error::{FetchError, ParseError};

/// Path of the overlay model listing on a device.
pub const OVERLAY_MODELS_PATH: &str = "/api/overlays/models";

/// One entry of a device's overlay model listing.
///
/// Devices report more fields than these; the rest are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OverlayModel {
    /// Model name as configured on the device.
    pub name: String,
    /// Number of active effects or fills on the model.
    #[serde(rename = "isActive", default)]
    pub is_active: i64,
}

impl OverlayModel {
    /// Creates an overlay model entry.
    #[must_use]
    pub fn new(name: impl Into<String>, is_active: i64) -> Self {
        Self {
            name: name.into(),
            is_active,
        }
    }

    /// Returns `true` if anything is currently active on the model.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.is_active > 0
    }
}

/// Parses an overlay model listing.
///
/// # Errors
///
/// Returns `ParseError::Json` if the body is not a JSON array of models.
pub fn parse_overlay_models(body: &str) -> Result<Vec<OverlayModel>, ParseError> {
    serde_json::from_str(body).map_err(Into::into)
}

/// Source of overlay model listings for a device.
pub trait OverlayFetcher: Send + Sync + 'static {
    /// Fetches the current overlay model listing of `device`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the device cannot be reached, answers with an
    /// error status, or returns a body that does not parse.
    fn fetch_models(
        &self,
        device: &str,
    ) -> impl Future<Output = Result<Vec<OverlayModel>, FetchError>> + Send;
}
