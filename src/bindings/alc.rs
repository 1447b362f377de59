/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The `ALC` module: devices, contexts and capture devices.

pub mod capture;
pub mod context;
pub mod device;

pub use capture::CaptureDevice;
pub use context::Context;
pub use device::Device;

use super::parse_specifier;
use crate::abi::{ConstantExports, List};
use crate::native::Driver;
use openal_script_sys::alc_types::ALCenum;
use openal_script_sys::*;

/// Enumerate devices with one of the specifier queries. [None] if the
/// library returned a null pointer.
///
/// The default device queries return a single name rather than a list, so
/// they give at most one entry.
pub fn specifiers(driver: &dyn Driver, param: ALCenum) -> Option<Vec<String>> {
    match param {
        ALC_DEFAULT_DEVICE_SPECIFIER | ALC_CAPTURE_DEFAULT_DEVICE_SPECIFIER => driver
            .alc_get_string(None, param)
            .map(|name| (!name.is_empty()).then_some(name).into_iter().collect()),
        _ => driver
            .alc_get_string_list(param)
            .map(|list| parse_specifier(&list)),
    }
}

fn specifier_list(driver: &dyn Driver, param: ALCenum) -> Option<List<String>> {
    specifiers(driver, param).map(List)
}

pub const CONSTANTS: ConstantExports = &[
    ("ALC::FORMAT_MONO8", AL_FORMAT_MONO8 as i64),
    ("ALC::FORMAT_MONO16", AL_FORMAT_MONO16 as i64),
    ("ALC::FORMAT_STEREO8", AL_FORMAT_STEREO8 as i64),
    ("ALC::FORMAT_STEREO16", AL_FORMAT_STEREO16 as i64),
    ("ALC::NO_ERROR", ALC_NO_ERROR as i64),
    ("ALC::INVALID_DEVICE", ALC_INVALID_DEVICE as i64),
    ("ALC::INVALID_CONTEXT", ALC_INVALID_CONTEXT as i64),
    ("ALC::INVALID_ENUM", ALC_INVALID_ENUM as i64),
    ("ALC::INVALID_VALUE", ALC_INVALID_VALUE as i64),
    ("ALC::OUT_OF_MEMORY", ALC_OUT_OF_MEMORY as i64),
    ("ALC::DEVICE_SPECIFIER", ALC_DEVICE_SPECIFIER as i64),
    ("ALC::DEFAULT_DEVICE_SPECIFIER", ALC_DEFAULT_DEVICE_SPECIFIER as i64),
    ("ALC::CAPTURE_DEVICE_SPECIFIER", ALC_CAPTURE_DEVICE_SPECIFIER as i64),
    (
        "ALC::CAPTURE_DEFAULT_DEVICE_SPECIFIER",
        ALC_CAPTURE_DEFAULT_DEVICE_SPECIFIER as i64,
    ),
    ("ALC::CAPTURE_SAMPLES", ALC_CAPTURE_SAMPLES as i64),
    ("ALC::EXTENSIONS", ALC_EXTENSIONS as i64),
    ("ALC::FREQUENCY", ALC_FREQUENCY as i64),
    ("ALC::REFRESH", ALC_REFRESH as i64),
    ("ALC::SYNC", ALC_SYNC as i64),
    ("ALC::MONO_SOURCES", ALC_MONO_SOURCES as i64),
    ("ALC::STEREO_SOURCES", ALC_STEREO_SOURCES as i64),
    ("ALC::MAJOR_VERSION", ALC_MAJOR_VERSION as i64),
    ("ALC::MINOR_VERSION", ALC_MINOR_VERSION as i64),
];
