/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The `ALUT` module, and the buffer constructors ALUT provides.
//!
//! ALUT is optional: if it couldn't be loaded, every entry point here raises.

use super::al::Buffer;
use crate::abi::{ConstantExports, FunctionExports};
use crate::native::{to_c_string, AlutDriver, Driver};
use crate::objects::Obj;
use crate::{Environment, Error};
use openal_script_sys::al_types::*;
use openal_script_sys::*;
use std::rc::Rc;

/// Run `f` with the ALUT driver, or raise if there isn't one.
fn with_alut<R>(env: &Environment, f: impl FnOnce(&dyn AlutDriver) -> R) -> Result<R, Error> {
    let driver = env.driver();
    let alut = driver
        .alut()
        .ok_or_else(|| Error::Library("ALUT library is not loaded.".to_string()))?;
    Ok(f(alut))
}

fn init(env: &mut Environment) -> Result<bool, Error> {
    with_alut(env, |alut| alut.init())
}

fn init_without_context(env: &mut Environment) -> Result<bool, Error> {
    with_alut(env, |alut| alut.init_without_context())
}

fn exit(env: &mut Environment) -> Result<bool, Error> {
    with_alut(env, |alut| alut.exit())
}

/// Blocks the calling thread.
fn sleep(env: &mut Environment, seconds: ALfloat) -> Result<bool, Error> {
    with_alut(env, |alut| alut.sleep(seconds))
}

fn error(env: &mut Environment) -> Result<ALenum, Error> {
    with_alut(env, |alut| alut.get_error())
}

fn error_string(env: &mut Environment, code: ALenum) -> Result<String, Error> {
    with_alut(env, |alut| alut.get_error_string(code))
}

fn major_version(env: &mut Environment) -> Result<ALint, Error> {
    with_alut(env, |alut| alut.major_version())
}

fn minor_version(env: &mut Environment) -> Result<ALint, Error> {
    with_alut(env, |alut| alut.minor_version())
}

/// Wrap the result of one of the `alutCreateBuffer*` functions. Zero with no
/// pending ALUT error means there is nothing to wrap.
fn created_buffer(
    driver: Rc<dyn Driver>,
    alut: &dyn AlutDriver,
    name: ALuint,
) -> Result<Option<Buffer>, Error> {
    if name != 0 {
        log_dbg!("ALUT created buffer {}", name);
        return Ok(Some(Buffer::owning(driver, name)));
    }
    match alut.get_error() {
        ALUT_ERROR_NO_ERROR => Ok(None),
        code => Err(Error::Al(alut.get_error_string(code))),
    }
}

/// Create a buffer with one of the ALUT constructors and register it.
fn create_buffer(
    env: &mut Environment,
    create: impl FnOnce(&dyn AlutDriver) -> ALuint,
) -> Result<Option<Obj<Buffer>>, Error> {
    let driver = env.driver();
    let alut = driver
        .alut()
        .ok_or_else(|| Error::Library("ALUT library is not loaded.".to_string()))?;
    let name = create(alut);
    let buffer = created_buffer(driver.clone(), alut, name)?;
    Ok(buffer.map(|buffer| env.objects.alloc(buffer)))
}

fn buffer_hello_world(env: &mut Environment) -> Result<Option<Obj<Buffer>>, Error> {
    create_buffer(env, |alut| alut.create_buffer_hello_world())
}

fn buffer_from_file(env: &mut Environment, path: String) -> Result<Option<Obj<Buffer>>, Error> {
    let path = to_c_string(&path)?;
    create_buffer(env, |alut| alut.create_buffer_from_file(&path))
}

fn buffer_waveform(
    env: &mut Environment,
    shape: ALenum,
    frequency: ALfloat,
    phase: ALfloat,
    duration: ALfloat,
) -> Result<Option<Obj<Buffer>>, Error> {
    create_buffer(env, |alut| {
        alut.create_buffer_waveform(shape, frequency, phase, duration)
    })
}

pub const FUNCTIONS: FunctionExports = &[
    export_fn!("ALUT.init", init()),
    export_fn!("ALUT.init_without_context", init_without_context()),
    export_fn!("ALUT.exit", exit()),
    export_fn!("ALUT.sleep", sleep(_)),
    export_fn!("ALUT.error", error()),
    export_fn!("ALUT.error_string", error_string(_)),
    export_fn!("ALUT.major_version", major_version()),
    export_fn!("ALUT.minor_version", minor_version()),
    export_fn!("AL::Buffer.hello_world", buffer_hello_world()),
    export_fn!("AL::Buffer.from_file", buffer_from_file(_)),
    export_fn!("AL::Buffer.waveform", buffer_waveform(_, _, _, _)),
];

pub const CONSTANTS: ConstantExports = &[
    ("ALUT::API_MAJOR_VERSION", ALUT_API_MAJOR_VERSION as i64),
    ("ALUT::API_MINOR_VERSION", ALUT_API_MINOR_VERSION as i64),
    ("ALUT::ERROR_NO_ERROR", ALUT_ERROR_NO_ERROR as i64),
    ("ALUT::ERROR_OUT_OF_MEMORY", ALUT_ERROR_OUT_OF_MEMORY as i64),
    ("ALUT::ERROR_INVALID_ENUM", ALUT_ERROR_INVALID_ENUM as i64),
    ("ALUT::ERROR_INVALID_VALUE", ALUT_ERROR_INVALID_VALUE as i64),
    ("ALUT::ERROR_INVALID_OPERATION", ALUT_ERROR_INVALID_OPERATION as i64),
    ("ALUT::ERROR_NO_CURRENT_CONTEXT", ALUT_ERROR_NO_CURRENT_CONTEXT as i64),
    ("ALUT::ERROR_AL_ERROR_ON_ENTRY", ALUT_ERROR_AL_ERROR_ON_ENTRY as i64),
    ("ALUT::ERROR_ALC_ERROR_ON_ENTRY", ALUT_ERROR_ALC_ERROR_ON_ENTRY as i64),
    ("ALUT::ERROR_OPEN_DEVICE", ALUT_ERROR_OPEN_DEVICE as i64),
    ("ALUT::ERROR_CLOSE_DEVICE", ALUT_ERROR_CLOSE_DEVICE as i64),
    ("ALUT::ERROR_CREATE_CONTEXT", ALUT_ERROR_CREATE_CONTEXT as i64),
    ("ALUT::ERROR_MAKE_CONTEXT_CURRENT", ALUT_ERROR_MAKE_CONTEXT_CURRENT as i64),
    ("ALUT::ERROR_DESTROY_CONTEXT", ALUT_ERROR_DESTROY_CONTEXT as i64),
    ("ALUT::ERROR_GEN_BUFFERS", ALUT_ERROR_GEN_BUFFERS as i64),
    ("ALUT::ERROR_BUFFER_DATA", ALUT_ERROR_BUFFER_DATA as i64),
    ("ALUT::ERROR_IO_ERROR", ALUT_ERROR_IO_ERROR as i64),
    ("ALUT::ERROR_UNSUPPORTED_FILE_TYPE", ALUT_ERROR_UNSUPPORTED_FILE_TYPE as i64),
    (
        "ALUT::ERROR_UNSUPPORTED_FILE_SUBTYPE",
        ALUT_ERROR_UNSUPPORTED_FILE_SUBTYPE as i64,
    ),
    (
        "ALUT::ERROR_CORRUPT_OR_TRUNCATED_DATA",
        ALUT_ERROR_CORRUPT_OR_TRUNCATED_DATA as i64,
    ),
];
