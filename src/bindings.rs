/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Script-visible entry points and constants.
//!
//! Each child module covers one part of the API and exports a `FUNCTIONS`
//! list (and usually a `CONSTANTS` list) that [crate::Environment] registers
//! at startup. Entry points are named the way a script refers to them:
//! `AL::Source#play` is a method (the receiver is the first argument),
//! `AL::Buffer.hello_world` a class function and `AL.get_error` a module
//! function.
//!
//! Resources:
//! - [OpenAL 1.1 specification](https://www.openal.org/documentation/openal-1.1-specification.pdf)
//! - [freealut reference](https://github.com/vancegroup/freealut/blob/master/doc/alut.html)

pub mod al;
pub mod alc;
pub mod alut;
pub mod common;
mod specifier;

pub use specifier::parse_specifier;

use crate::abi::{ConstantExports, FunctionExports};
use crate::native::{DeviceHandle, Driver};
use crate::Error;
use openal_script_sys::al_types::ALenum;
use openal_script_sys::alc_types::ALCenum;
use openal_script_sys::{ALC_NO_ERROR, AL_NO_ERROR};

/// All the lists of functions that the environment registers.
pub const FUNCTION_LISTS: &[FunctionExports] = &[
    al::FUNCTIONS,
    al::buffer::FUNCTIONS,
    al::source::FUNCTIONS,
    al::listener::FUNCTIONS,
    alc::device::FUNCTIONS,
    alc::context::FUNCTIONS,
    alc::capture::FUNCTIONS,
    alut::FUNCTIONS,
    common::FUNCTIONS,
];

/// All the lists of constants that the environment registers.
pub const CONSTANT_LISTS: &[ConstantExports] = &[
    al::CONSTANTS,
    al::buffer::CONSTANTS,
    al::source::CONSTANTS,
    alc::CONSTANTS,
    alut::CONSTANTS,
];

fn al_error_string(driver: &dyn Driver, code: ALenum) -> String {
    driver
        .get_string(code)
        .unwrap_or_else(|| format!("AL error {:#x}", code))
}

fn alc_error_string(driver: &dyn Driver, device: Option<DeviceHandle>, code: ALCenum) -> String {
    driver
        .alc_get_string(device, code)
        .unwrap_or_else(|| format!("ALC error {:#x}", code))
}

/// Raise the pending AL error, if there is one. Call right after the native
/// call that may have failed.
pub(crate) fn check_al(driver: &dyn Driver) -> Result<(), Error> {
    match driver.get_error() {
        AL_NO_ERROR => Ok(()),
        code => Err(Error::Al(al_error_string(driver, code))),
    }
}

/// Raise the pending ALC error for `device` (or the global one), if there is
/// one.
pub(crate) fn check_alc(driver: &dyn Driver, device: Option<DeviceHandle>) -> Result<(), Error> {
    match driver.alc_get_error(device) {
        ALC_NO_ERROR => Ok(()),
        code => Err(Error::Alc(alc_error_string(driver, device, code))),
    }
}

/// For release paths, which can't raise: fetch the AL error so it doesn't
/// leak into the next check, and log it.
pub(crate) fn log_release_error(driver: &dyn Driver, what: &str) {
    if let Err(e) = check_al(driver) {
        log!("Warning: releasing {} failed: {}", what, e);
    }
}
