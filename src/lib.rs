/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! openal_script exposes the OpenAL 3D audio API (core AL, ALC and the ALUT
//! utility layer) to an embeddable scripting runtime.
//!
//! In various places, the terms "script" and "host" are used to distinguish
//! between the scripting runtime's side and this crate's side. For example:
//! - A "script value" is a [Value], which is all a script can hold.
//! - A "host object" is a Rust object (a buffer, a device...) that a script
//!   refers to by [ObjectId].
//! - An "entry point" is a Rust function a script can call by name, see
//!   [Environment::call].
//!
//! The native libraries are loaded at runtime, so the crate builds without
//! OpenAL headers or import libraries.

// The documentation for this crate is intended to include private items.
#![allow(rustdoc::private_intra_doc_links)]

#[macro_use]
mod log;
#[macro_use]
pub mod abi;
pub mod bindings;
mod environment;
mod error;
pub mod native;
pub mod objects;
pub mod options;
pub mod value;

pub use environment::Environment;
pub use error::Error;
pub use value::{ObjectId, Value};

use options::Options;
use std::time::Duration;

/// Set up an [Environment] with every entry point registered. This is what
/// an interpreter calls once at startup.
pub fn init(options: Options) -> Result<Environment, Error> {
    Environment::new(options)
}

const USAGE: &str = "\
Usage:
    openal_script [options] COMMAND [ARGS...]

Commands:
    devices
        List playback and capture devices.

    sine [SECONDS]
        Play a 440 Hz sine wave (default: 1 second).

    hello
        Play ALUT's \"Hello, world!\" sample.

    play FILE
        Play a sound file (whatever ALUT can load, usually WAV).

    capture SECONDS FILE
        Record from the default capture device into a WAV file.

Special options:
    --help
        Display this help text.
";

/// Format an error the way a script would see it.
fn describe(err: Error) -> String {
    format!("{}: {}", err.class_name(), err)
}

/// Call an entry point, for the demos.
fn call(env: &mut Environment, name: &str, args: &[Value]) -> Result<Value, String> {
    env.call(name, args).map_err(describe)
}

fn constant(env: &Environment, name: &str) -> Result<Value, String> {
    env.constant(name)
        .map(Value::Int)
        .ok_or_else(|| format!("No constant {}", name))
}

fn print_list(title: &str, list: &Value) {
    echo!("{}:", title);
    match list.as_list() {
        Some(names) if !names.is_empty() => {
            for name in names {
                echo!("- {}", name.as_str().unwrap_or("(unnamed)"));
            }
        }
        Some(_) => echo!("  (none)"),
        None => echo!("  (not supported)"),
    }
}

fn list_devices(env: &mut Environment) -> Result<(), String> {
    let playback = call(env, "ALC::Device.device_specifier", &[])?;
    print_list("Playback devices", &playback);
    let default = call(env, "ALC::Device.default_device_specifier", &[])?;
    print_list("Default playback device", &default);
    let capture = call(env, "ALC::CaptureDevice.device_specifier", &[])?;
    print_list("Capture devices", &capture);
    Ok(())
}

/// Open the configured device and make a context on it current.
fn open_playback(env: &mut Environment) -> Result<(Value, Value), String> {
    let name = env
        .options
        .device
        .clone()
        .map_or(Value::Nil, Value::Str);
    let device = call(env, "ALC::Device.new", &[name])?;
    let context = call(env, "ALC::Context.new", &[device.clone()])?;
    call(env, "ALC::Context.current=", &[context.clone()])?;
    let renderer = constant(env, "AL::RENDERER")?;
    if let Some(renderer) = call(env, "AL.string", &[renderer])?.as_str() {
        echo!("Using {}", renderer);
    }
    Ok((device, context))
}

/// Length of a buffer's sound, from its size and format.
fn buffer_duration(env: &mut Environment, buffer: &Value) -> Result<Duration, String> {
    let mut get = |name: &str| -> Result<f64, String> {
        let value = call(env, name, &[buffer.clone()])?;
        value
            .as_float()
            .ok_or_else(|| format!("{} returned {:?}", name, value))
    };
    let size = get("AL::Buffer#size")?;
    let frame = get("AL::Buffer#channels")? * get("AL::Buffer#bits")? / 8.0;
    let frequency = get("AL::Buffer#frequency")?;
    if frame <= 0.0 || frequency <= 0.0 {
        return Ok(Duration::ZERO);
    }
    Ok(Duration::from_secs_f64(size / frame / frequency))
}

/// Play a buffer on a new source and wait until it's done.
fn play_buffer(env: &mut Environment, buffer: Value) -> Result<(), String> {
    let duration = buffer_duration(env, &buffer)?;
    let source = call(env, "AL::Source.new", &[])?;
    call(env, "AL::Source#buffer=", &[source.clone(), buffer])?;
    call(env, "AL::Source#play", &[source.clone()])?;
    echo!("Playing {:.2} seconds of sound", duration.as_secs_f64());
    if env.options.headless {
        echo!("(headless, so there is nothing to hear)");
    } else {
        let step = Duration::from_millis(50);
        let mut waited = Duration::ZERO;
        // The margin covers the device's own latency.
        while waited < duration + Duration::from_secs(1) {
            if !call(env, "AL::Source#playing?", &[source.clone()])?.is_truthy() {
                break;
            }
            std::thread::sleep(step);
            waited += step;
        }
    }
    call(env, "AL::Source#playing=", &[source.clone(), Value::Bool(false)])?;
    env.release(&source);
    Ok(())
}

/// Run `f` with ALUT initialized on a fresh device and context.
fn with_playback<F>(env: &mut Environment, f: F) -> Result<(), String>
where
    F: FnOnce(&mut Environment) -> Result<Value, String>,
{
    let (device, context) = open_playback(env)?;
    call(env, "ALUT.init_without_context", &[])?;
    let result = f(env).and_then(|buffer| {
        if buffer.is_nil() {
            return Err("No buffer was created".to_string());
        }
        let result = play_buffer(env, buffer.clone());
        // Buffers must go before the context does.
        env.release(&buffer);
        result
    });
    call(env, "ALUT.exit", &[])?;
    call(env, "ALC::Context.current=", &[Value::Nil])?;
    call(env, "ALC::Context#destroy", &[context])?;
    call(env, "ALC::Device#close", &[device])?;
    result
}

fn capture(env: &mut Environment, seconds: f64, path: &str) -> Result<(), String> {
    const FREQUENCY: i64 = 22050;
    let format = constant(env, "ALC::FORMAT_MONO16")?;
    let frames = (seconds * FREQUENCY as f64).ceil() as i64;
    let device = call(
        env,
        "ALC::CaptureDevice.new",
        &[
            Value::Nil,
            Value::Int(FREQUENCY),
            format.clone(),
            Value::Int(frames),
        ],
    )?;
    call(env, "ALC::CaptureDevice#start", &[device.clone()])?;
    echo!("Recording for {} seconds...", seconds);
    if !env.options.headless {
        std::thread::sleep(Duration::from_secs_f64(seconds));
    }
    call(env, "ALC::CaptureDevice#stop", &[device.clone()])?;
    let available = call(env, "ALC::CaptureDevice#available_samples", &[device.clone()])?;
    let available = available.as_int().unwrap_or(0);
    let samples = call(env, "AL::SampleBuffer.new", &[Value::Int(available * 2)])?;
    call(
        env,
        "ALC::CaptureDevice#samples",
        &[device.clone(), samples.clone(), Value::Int(available)],
    )?;
    call(
        env,
        "AL::SampleBuffer#write_wav",
        &[samples, Value::from(path), format, Value::Int(FREQUENCY)],
    )?;
    call(env, "ALC::CaptureDevice#close", &[device])?;
    echo!("Wrote {} samples to {}", available, path);
    Ok(())
}

fn parse_seconds(arg: &str) -> Result<f64, String> {
    arg.parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .ok_or_else(|| format!("Invalid duration {:?}", arg))
}

pub fn main<T: Iterator<Item = String>>(mut args: T) -> Result<(), String> {
    let _ = args.next(); // skip argv[0]

    let mut options = Options::new();
    options.apply_env()?;

    let mut command = Vec::new();
    for arg in args {
        if arg == "--help" {
            echo!("{}", USAGE);
            echo!("{}", options::DOCUMENTATION);
            return Ok(());
        } else if command.is_empty() && options.parse_argument(&arg)? {
            continue;
        } else {
            command.push(arg);
        }
    }

    let Some((name, command_args)) = command.split_first() else {
        echo!("{}", USAGE);
        return Err("No command specified.".to_string());
    };

    let mut env = init(options).map_err(describe)?;
    match (name.as_str(), command_args) {
        ("devices", []) => list_devices(&mut env),
        ("sine", [] | [_]) => {
            let seconds = match command_args.first() {
                Some(seconds) => parse_seconds(seconds)?,
                None => 1.0,
            };
            with_playback(&mut env, |env| {
                let shape = constant(env, "AL::Buffer::WAVEFORM_SINE")?;
                call(
                    env,
                    "AL::Buffer.waveform",
                    &[
                        shape,
                        Value::Float(440.0),
                        Value::Float(0.0),
                        Value::Float(seconds),
                    ],
                )
            })
        }
        ("hello", []) => with_playback(&mut env, |env| call(env, "AL::Buffer.hello_world", &[])),
        ("play", [file]) => {
            let file = Value::from(file.as_str());
            with_playback(&mut env, |env| call(env, "AL::Buffer.from_file", &[file]))
        }
        ("capture", [seconds, path]) => {
            let seconds = parse_seconds(seconds)?;
            capture(&mut env, seconds, path)
        }
        _ => {
            echo!("{}", USAGE);
            Err(format!("Unexpected command: {:?}", command))
        }
    }
}
