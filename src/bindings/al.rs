/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The `AL` module: global state, plus buffers, sources and the listener in
//! the child modules.

pub mod buffer;
pub mod listener;
pub mod source;

pub use buffer::{Buffer, Buffers};
pub use source::{Source, Sources};

use super::check_al;
use crate::abi::{ConstantExports, FunctionExports};
use crate::native::to_c_string;
use crate::{Environment, Error};
use openal_script_sys::al_types::*;
use openal_script_sys::*;

fn get_error(env: &mut Environment) -> Result<ALenum, Error> {
    Ok(env.driver().get_error())
}

/// The setters in this module report failure by returning `false` rather
/// than raising, so a script can poll `AL.get_error` itself if it cares.
fn succeeded(env: &Environment) -> bool {
    env.driver().get_error() == AL_NO_ERROR
}

fn enable(env: &mut Environment, capability: ALenum) -> Result<bool, Error> {
    env.driver().enable(capability);
    Ok(succeeded(env))
}

fn disable(env: &mut Environment, capability: ALenum) -> Result<bool, Error> {
    env.driver().disable(capability);
    Ok(succeeded(env))
}

fn is_enabled(env: &mut Environment, capability: ALenum) -> Result<bool, Error> {
    let driver = env.driver();
    let enabled = driver.is_enabled(capability);
    check_al(&*driver)?;
    Ok(enabled)
}

fn get_boolean(env: &mut Environment, param: ALenum) -> Result<bool, Error> {
    let driver = env.driver();
    let value = driver.get_boolean(param);
    check_al(&*driver)?;
    Ok(value)
}

fn get_integer(env: &mut Environment, param: ALenum) -> Result<ALint, Error> {
    let driver = env.driver();
    let value = driver.get_integer(param);
    check_al(&*driver)?;
    Ok(value)
}

fn get_float(env: &mut Environment, param: ALenum) -> Result<ALfloat, Error> {
    let driver = env.driver();
    let value = driver.get_float(param);
    check_al(&*driver)?;
    Ok(value)
}

fn get_string(env: &mut Environment, param: ALenum) -> Result<Option<String>, Error> {
    let driver = env.driver();
    let value = driver.get_string(param);
    check_al(&*driver)?;
    Ok(value)
}

fn set_doppler_factor(env: &mut Environment, value: ALfloat) -> Result<bool, Error> {
    env.driver().doppler_factor(value);
    Ok(succeeded(env))
}

fn set_doppler_velocity(env: &mut Environment, value: ALfloat) -> Result<bool, Error> {
    env.driver().doppler_velocity(value);
    Ok(succeeded(env))
}

fn set_speed_of_sound(env: &mut Environment, value: ALfloat) -> Result<bool, Error> {
    env.driver().speed_of_sound(value);
    Ok(succeeded(env))
}

fn set_distance_model(env: &mut Environment, model: ALenum) -> Result<bool, Error> {
    env.driver().distance_model(model);
    Ok(succeeded(env))
}

fn is_extension_present(env: &mut Environment, name: String) -> Result<bool, Error> {
    let name = to_c_string(&name)?;
    let driver = env.driver();
    let present = driver.is_extension_present(&name);
    check_al(&*driver)?;
    Ok(present)
}

fn enum_value(env: &mut Environment, name: String) -> Result<ALenum, Error> {
    let name = to_c_string(&name)?;
    let driver = env.driver();
    let value = driver.get_enum_value(&name);
    check_al(&*driver)?;
    Ok(value)
}

pub const FUNCTIONS: FunctionExports = &[
    export_fn!("AL.get_error", get_error()),
    export_fn!("AL.enable", enable(_)),
    export_fn!("AL.disable", disable(_)),
    export_fn!("AL.enabled?", is_enabled(_)),
    export_fn!("AL.boolean", get_boolean(_)),
    export_fn!("AL.integer", get_integer(_)),
    export_fn!("AL.float", get_float(_)),
    export_fn!("AL.string", get_string(_)),
    export_fn!("AL.doppler_factor=", set_doppler_factor(_)),
    export_fn!("AL.doppler_velocity=", set_doppler_velocity(_)),
    export_fn!("AL.speed_of_sound=", set_speed_of_sound(_)),
    export_fn!("AL.distance_model=", set_distance_model(_)),
    export_fn!("AL.extension_present?", is_extension_present(_)),
    export_fn!("AL.enum_value", enum_value(_)),
];

pub const CONSTANTS: ConstantExports = &[
    ("AL::NONE", AL_NONE as i64),
    ("AL::NO_ERROR", AL_NO_ERROR as i64),
    ("AL::INVALID_NAME", AL_INVALID_NAME as i64),
    ("AL::INVALID_ENUM", AL_INVALID_ENUM as i64),
    ("AL::INVALID_VALUE", AL_INVALID_VALUE as i64),
    ("AL::INVALID_OPERATION", AL_INVALID_OPERATION as i64),
    ("AL::OUT_OF_MEMORY", AL_OUT_OF_MEMORY as i64),
    ("AL::VENDOR", AL_VENDOR as i64),
    ("AL::VERSION", AL_VERSION as i64),
    ("AL::RENDERER", AL_RENDERER as i64),
    ("AL::EXTENSIONS", AL_EXTENSIONS as i64),
    ("AL::DOPPLER_FACTOR", AL_DOPPLER_FACTOR as i64),
    ("AL::DOPPLER_VELOCITY", AL_DOPPLER_VELOCITY as i64),
    ("AL::SPEED_OF_SOUND", AL_SPEED_OF_SOUND as i64),
    ("AL::DISTANCE_MODEL", AL_DISTANCE_MODEL as i64),
    ("AL::INVERSE_DISTANCE", AL_INVERSE_DISTANCE as i64),
    ("AL::INVERSE_DISTANCE_CLAMPED", AL_INVERSE_DISTANCE_CLAMPED as i64),
    ("AL::LINEAR_DISTANCE", AL_LINEAR_DISTANCE as i64),
    ("AL::LINEAR_DISTANCE_CLAMPED", AL_LINEAR_DISTANCE_CLAMPED as i64),
    ("AL::EXPONENT_DISTANCE", AL_EXPONENT_DISTANCE as i64),
    ("AL::EXPONENT_DISTANCE_CLAMPED", AL_EXPONENT_DISTANCE_CLAMPED as i64),
    ("AL::FORMAT_MONO8", AL_FORMAT_MONO8 as i64),
    ("AL::FORMAT_MONO16", AL_FORMAT_MONO16 as i64),
    ("AL::FORMAT_STEREO8", AL_FORMAT_STEREO8 as i64),
    ("AL::FORMAT_STEREO16", AL_FORMAT_STEREO16 as i64),
];
