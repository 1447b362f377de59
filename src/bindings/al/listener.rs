/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! `AL::Listener`. There is one listener per context, so these are module
//! functions rather than methods.

use crate::abi::{Floats, FunctionExports};
use crate::bindings::check_al;
use crate::{Environment, Error};
use openal_script_sys::al_types::*;
use openal_script_sys::{AL_GAIN, AL_ORIENTATION, AL_POSITION, AL_VELOCITY};

fn get_vector<const N: usize>(env: &Environment, param: ALenum) -> Result<[ALfloat; N], Error> {
    let driver = env.driver();
    let mut values = [0.0; N];
    driver.get_listener_fv(param, &mut values);
    check_al(&*driver)?;
    Ok(values)
}

fn set_vector<const N: usize>(
    env: &Environment,
    param: ALenum,
    values: Floats<N>,
) -> Result<[ALfloat; N], Error> {
    let driver = env.driver();
    driver.listener_fv(param, &values.0);
    check_al(&*driver)?;
    Ok(values.0)
}

fn gain(env: &mut Environment) -> Result<ALfloat, Error> {
    let driver = env.driver();
    let value = driver.get_listener_f(AL_GAIN);
    check_al(&*driver)?;
    Ok(value)
}

fn gain_set(env: &mut Environment, value: ALfloat) -> Result<ALfloat, Error> {
    let driver = env.driver();
    driver.listener_f(AL_GAIN, value);
    check_al(&*driver)?;
    Ok(value)
}

fn position(env: &mut Environment) -> Result<[ALfloat; 3], Error> {
    get_vector(env, AL_POSITION)
}

fn position_set(env: &mut Environment, value: Floats<3>) -> Result<[ALfloat; 3], Error> {
    set_vector(env, AL_POSITION, value)
}

fn velocity(env: &mut Environment) -> Result<[ALfloat; 3], Error> {
    get_vector(env, AL_VELOCITY)
}

fn velocity_set(env: &mut Environment, value: Floats<3>) -> Result<[ALfloat; 3], Error> {
    set_vector(env, AL_VELOCITY, value)
}

/// The "at" vector followed by the "up" vector.
fn orientation(env: &mut Environment) -> Result<[ALfloat; 6], Error> {
    get_vector(env, AL_ORIENTATION)
}

fn orientation_set(env: &mut Environment, value: Floats<6>) -> Result<[ALfloat; 6], Error> {
    set_vector(env, AL_ORIENTATION, value)
}

pub const FUNCTIONS: FunctionExports = &[
    export_fn!("AL::Listener.gain", gain()),
    export_fn!("AL::Listener.gain=", gain_set(_)),
    export_fn!("AL::Listener.position", position()),
    export_fn!("AL::Listener.position=", position_set(_)),
    export_fn!("AL::Listener.velocity", velocity()),
    export_fn!("AL::Listener.velocity=", velocity_set(_)),
    export_fn!("AL::Listener.orientation", orientation()),
    export_fn!("AL::Listener.orientation=", orientation_set(_)),
];
