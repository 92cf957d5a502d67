// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! Only [`ConfigError`] is meant to stop the process. [`FetchError`] is
//! reported per device and per tick, and the polling loop carries on.
//! Skipped commands are not errors at all; see
//! [`SetOutcome`](crate::command::SetOutcome).

use std::time::Duration;

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid startup configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Fetching overlay state from a device failed.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Message bus communication failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The poller was started while already running.
    #[error("poller is already running")]
    AlreadyRunning,
}

/// Configuration problems detected before anything is started.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No devices were configured for polling.
    #[error("empty device list")]
    EmptyDeviceList,

    /// The polling interval is below one second.
    #[error("interval too short: {0:?} (minimum is 1s)")]
    IntervalTooShort(Duration),

    /// No state store was bound to the poller.
    #[error("missing state sink")]
    MissingStateSink,

    /// The message bus host was not set.
    #[error("MQTT broker host is required")]
    MissingBrokerHost,

    /// A configuration value could not be used.
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// Why it was rejected.
        message: String,
    },
}

/// A failed fetch of one device's overlay models.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request itself failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The device answered with a non-success status.
    #[error("HTTP {code} - {reason}")]
    Status {
        /// Numeric status code.
        code: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// The device did not answer within the polling interval.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The response body could not be parsed.
    #[error("malformed response: {0}")]
    Malformed(#[from] ParseError),
}

/// Errors related to parsing device responses and bus messages.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A bus topic did not have the expected shape.
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
}

/// Errors related to the message bus connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT client request failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// An outbound payload could not be encoded.
    #[error("cannot encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
