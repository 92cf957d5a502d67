// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stable identity keys for overlay models.
//!
//! A slug names one (device, overlay model) pair. It is built from the
//! device's short token and the model name, both reduced to lower snake
//! form and joined with a hyphen:
//!
//! ```
//! use fpp_mqtt_bridge::slug::slug;
//!
//! assert_eq!(slug("fpp-garage.local", "Wall Light"), "fpp_garage-wall_light");
//! assert_eq!(slug("fpp-garage", "  WALL   light "), "fpp_garage-wall_light");
//! ```
//!
//! Names that differ only in case, spacing or punctuation map to the same
//! slug and are therefore treated as the same light.

use std::net::IpAddr;

/// Separator placed between the device part and the name part of a slug.
const SLUG_SEPARATOR: char = '-';

/// Derives the slug for an overlay model on a device.
///
/// Pure and deterministic: the same inputs always give the same slug.
#[must_use]
pub fn slug(device: &str, name: &str) -> String {
    format!(
        "{}{SLUG_SEPARATOR}{}",
        canonicalize(device_token(device)),
        canonicalize(name)
    )
}

/// Reduces a device identifier to the short token used to address it on
/// the bus.
///
/// Any URL scheme, path and port are dropped. A qualified host name is cut
/// down to its first label (`fpp-1.lan.example` becomes `fpp-1`). IP
/// addresses are kept whole since their leading octet is not an identity.
///
/// ```
/// use fpp_mqtt_bridge::slug::device_token;
///
/// assert_eq!(device_token("fpp-1.lan.example"), "fpp-1");
/// assert_eq!(device_token("http://fpp-1:8080/api"), "fpp-1");
/// assert_eq!(device_token("192.168.1.20"), "192.168.1.20");
/// assert_eq!(device_token("[fe80::1]:8080"), "fe80::1");
/// ```
#[must_use]
pub fn device_token(device: &str) -> &str {
    let host = device.trim();
    let host = host
        .strip_prefix("http://")
        .or_else(|| host.strip_prefix("https://"))
        .unwrap_or(host);
    let host = host.split('/').next().unwrap_or(host);
    let host = strip_port(host);

    if host.parse::<IpAddr>().is_ok() {
        return host;
    }

    host.split('.').next().unwrap_or(host)
}

/// Normalizes a raw name into lower snake form.
///
/// Every run of non-alphanumeric characters becomes a single underscore,
/// leading and trailing separators are dropped, letters are lowercased.
#[must_use]
pub fn canonicalize(raw: &str) -> String {
    raw.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 authority, with or without a port
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split_once(']').map_or(rest, |(addr, _)| addr);
    }

    match host.rsplit_once(':') {
        // Only a single colon means host:port; more than one is IPv6.
        Some((name, port))
            if !name.contains(':') && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            name
        }
        _ => host,
    }
}
