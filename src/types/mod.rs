// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the store, the resolver and the bus.
//!
//! - [`RgbColor`] - A complete 8-bit color triple
//! - [`PowerState`] - The on/off token used on the bus

mod power;
mod rgb_color;

pub use power::PowerState;
pub use rgb_color::RgbColor;
