// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound topic routing.

use crate::error::ParseError;

/// Where an inbound message under the prefix should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// A set request for the named light.
    Set {
        /// Slug or model name taken from the topic.
        light: &'a str,
    },
    /// A status message, normally our own retained echo.
    Status {
        /// Slug taken from the topic.
        light: &'a str,
    },
    /// Any other method.
    Other {
        /// Light segment of the topic.
        light: &'a str,
        /// Method segment of the topic.
        method: &'a str,
    },
}

/// Splits `<prefix>/<light>/<method>` into a [`Route`].
///
/// The prefix may span several levels. Methods match case-insensitively.
///
/// # Errors
///
/// Returns `ParseError::InvalidTopic` if the topic is outside the prefix or
/// does not have exactly two non-empty levels after it.
///
/// # Examples
///
/// ```
/// use fpp_mqtt_bridge::bridge::{Route, route_topic};
///
/// let route = route_topic("home/fpp", "home/fpp/fpp_1-wall/SET").unwrap();
/// assert_eq!(route, Route::Set { light: "fpp_1-wall" });
///
/// assert!(route_topic("home/fpp", "home/fpp/fpp_1-wall").is_err());
/// ```
pub fn route_topic<'a>(prefix: &str, topic: &'a str) -> Result<Route<'a>, ParseError> {
    let invalid = || ParseError::InvalidTopic(topic.to_string());

    let rest = topic
        .strip_prefix(prefix.trim_end_matches('/'))
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(invalid)?;

    let mut levels = rest.split('/');
    let (Some(light), Some(method), None) = (levels.next(), levels.next(), levels.next()) else {
        return Err(invalid());
    };
    if light.is_empty() || method.is_empty() {
        return Err(invalid());
    }

    Ok(if method.eq_ignore_ascii_case("set") {
        Route::Set { light }
    } else if method.eq_ignore_ascii_case("status") {
        Route::Status { light }
    } else {
        Route::Other { light, method }
    })
}
