// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command line and environment configuration.
//!
//! Every option can also be given through an environment variable, so a
//! `.env`-style deployment works without any flags.

use std::time::Duration;

use clap::Parser;
use tracing::Level;

/// Startup configuration for the bridge.
#[derive(Debug, Clone, Parser)]
#[command(version, about = "Bridge Falcon Player overlay models to MQTT")]
pub struct BridgeConfig {
    /// Comma separated list of controllers to poll.
    #[arg(long = "controllers", env = "CONTROLLER_LIST", default_value = "")]
    controller_list: String,

    /// Seconds between polls.
    #[arg(long, env = "QUERY_INTERVAL_SECONDS", default_value_t = 1)]
    query_interval_seconds: u64,

    /// MQTT broker host.
    #[arg(long, env = "MQTT_HOST", default_value = "")]
    mqtt_host: String,

    /// MQTT broker port.
    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    mqtt_port: u16,

    /// MQTT client id.
    #[arg(long, env = "MQTT_CLIENT_ID", default_value = "fpp-mqtt-bridge")]
    mqtt_client_id: String,

    /// MQTT username.
    #[arg(long, env = "MQTT_USERNAME")]
    mqtt_username: Option<String>,

    /// MQTT password.
    #[arg(long, env = "MQTT_PASSWORD", hide_env_values = true)]
    mqtt_password: Option<String>,

    /// Prefix for light topics.
    #[arg(long, env = "MQTT_TOPIC_PREFIX", default_value = "fpp-mqtt-bridge")]
    mqtt_topic_prefix: String,

    /// Increase log verbosity (-v warn, -vv info, -vvv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl BridgeConfig {
    /// Returns the controllers to poll, with spaces removed and empty
    /// entries dropped.
    #[must_use]
    pub fn controllers(&self) -> Vec<String> {
        self.controller_list
            .split(',')
            .map(|entry| entry.replace(' ', ""))
            .filter(|entry| !entry.is_empty())
            .collect()
    }

    /// Returns the polling interval.
    #[must_use]
    pub fn query_interval(&self) -> Duration {
        Duration::from_secs(self.query_interval_seconds)
    }

    /// Returns the broker host; empty when not configured.
    #[must_use]
    pub fn mqtt_host(&self) -> &str {
        &self.mqtt_host
    }

    /// Returns the topic prefix.
    #[must_use]
    pub fn topic_prefix(&self) -> &str {
        &self.mqtt_topic_prefix
    }

    /// Returns the log level selected by `-v`.
    #[must_use]
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    /// Returns a bridge builder carrying the MQTT settings.
    #[cfg(feature = "mqtt")]
    #[must_use]
    pub fn mqtt_builder(&self) -> crate::bridge::MqttBridgeBuilder {
        let builder = crate::bridge::MqttBridge::builder()
            .host(&self.mqtt_host)
            .port(self.mqtt_port)
            .client_id(&self.mqtt_client_id)
            .topic_prefix(&self.mqtt_topic_prefix);

        match (&self.mqtt_username, &self.mqtt_password) {
            (Some(username), password) => {
                builder.credentials(username, password.as_deref().unwrap_or_default())
            }
            (None, _) => builder,
        }
    }
}
