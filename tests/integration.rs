/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Tests that go through the script-facing entry points, using the headless
//! driver so no audio hardware or native library is needed.

use openal_script::native::HeadlessDriver;
use openal_script::options::Options;
use openal_script::{Environment, Value};
use std::env;
use std::path::PathBuf;
use std::process::Command;
use std::rc::Rc;

// adapted from `assert_cmd` crate
fn target_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .map(|mut path| {
            path.pop();
            if path.ends_with("deps") {
                path.pop();
            }
            path
        })
        .unwrap()
}

fn headless_env(driver: HeadlessDriver) -> (Rc<HeadlessDriver>, Environment) {
    let driver = Rc::new(driver);
    let mut options = Options::new();
    options.headless = true;
    let env = Environment::with_driver(driver.clone(), options);
    (driver, env)
}

fn call(env: &mut Environment, name: &str, args: &[Value]) -> Value {
    env.call(name, args)
        .unwrap_or_else(|e| panic!("{} raised {}: {}", name, e.class_name(), e))
}

/// Class name of the error `name` raises, and its message.
fn call_err(env: &mut Environment, name: &str, args: &[Value]) -> (&'static str, String) {
    match env.call(name, args) {
        Ok(value) => panic!("{} returned {:?} instead of raising", name, value),
        Err(e) => (e.class_name(), e.to_string()),
    }
}

fn constant(env: &Environment, name: &str) -> Value {
    Value::Int(env.constant(name).unwrap())
}

/// Open the headless device and make a new context on it current.
fn open_playback(env: &mut Environment) -> (Value, Value) {
    let device = call(env, "ALC::Device.new", &[Value::Nil]);
    let context = call(env, "ALC::Context.new", &[device.clone()]);
    assert_eq!(
        call(env, "ALC::Context.current=", &[context.clone()]),
        Value::Bool(true)
    );
    (device, context)
}

#[test]
fn buffers_are_deleted_exactly_once() {
    let (driver, mut env) = headless_env(HeadlessDriver::new());

    let buffer = call(&mut env, "AL::Buffer.new", &[]);
    let buffers = call(&mut env, "AL::Buffers.new", &[Value::Int(3)]);
    assert_eq!(driver.live_buffers(), 4);
    assert_eq!(env.class_of(&buffers), Some("AL::Buffers"));
    assert_eq!(call(&mut env, "AL::Buffers#size", &[buffers.clone()]), Value::Int(3));

    // Views never delete anything.
    let view = call(&mut env, "AL::Buffers#[]", &[buffers.clone(), Value::Int(1)]);
    assert_eq!(env.class_of(&view), Some("AL::Buffer"));
    assert!(env.release(&view));
    assert_eq!(driver.live_buffers(), 4);

    assert!(env.release(&buffers));
    assert_eq!(driver.live_buffers(), 1);
    assert!(!env.release(&buffers));
    assert_eq!(driver.live_buffers(), 1);

    assert!(env.release(&buffer));
    assert_eq!(driver.live_buffers(), 0);
}

#[test]
fn collections_list_their_names() {
    let (driver, mut env) = headless_env(HeadlessDriver::new());

    let sources = call(&mut env, "AL::Sources.new", &[Value::Int(3)]);
    assert_eq!(driver.live_sources(), 3);
    let views = call(&mut env, "AL::Sources#to_a", &[sources.clone()]);
    let views = views.as_list().unwrap().to_vec();
    assert_eq!(views.len(), 3);

    let mut ids: Vec<i64> = views
        .iter()
        .map(|view| call(&mut env, "AL::Source#id", &[view.clone()]).as_int().unwrap())
        .collect();
    ids.dedup();
    assert_eq!(ids.len(), 3);
    for view in &views {
        assert_eq!(call(&mut env, "AL::Source#valid?", &[view.clone()]), Value::Bool(true));
    }

    env.release(&sources);
    assert_eq!(driver.live_sources(), 0);
    // The views outlive the names they refer to.
    assert_eq!(
        call(&mut env, "AL::Source#valid?", &[views[0].clone()]),
        Value::Bool(false)
    );

    // A zero-sized collection is fine.
    let empty = call(&mut env, "AL::Buffers.new", &[Value::Int(0)]);
    assert_eq!(call(&mut env, "AL::Buffers#to_a", &[empty]), Value::List(vec![]));
}

#[test]
fn out_of_range_indices_make_no_native_calls() {
    let (driver, mut env) = headless_env(HeadlessDriver::new());
    let buffers = call(&mut env, "AL::Buffers.new", &[Value::Int(2)]);

    let calls = driver.native_calls();
    for index in [2, 3, -1] {
        let (class, message) = call_err(
            &mut env,
            "AL::Buffers#[]",
            &[buffers.clone(), Value::Int(index)],
        );
        assert_eq!(class, "IndexError");
        assert_eq!(message, "index is out of buffers.");
    }
    assert_eq!(driver.native_calls(), calls);
}

#[test]
fn queueing_checks_ranges_first() {
    let (driver, mut env) = headless_env(HeadlessDriver::new());
    let source = call(&mut env, "AL::Source.new", &[]);
    let buffers = call(&mut env, "AL::Buffers.new", &[Value::Int(2)]);

    let calls = driver.native_calls();
    let (class, message) = call_err(
        &mut env,
        "AL::Source#queue_buffers",
        &[source.clone(), buffers.clone(), Value::Int(2)],
    );
    assert_eq!((class, message.as_str()), ("IndexError", "offset is out of buffers."));
    let (class, message) = call_err(
        &mut env,
        "AL::Source#queue_buffers",
        &[source.clone(), buffers.clone(), Value::Int(1), Value::Int(2)],
    );
    assert_eq!((class, message.as_str()), ("IndexError", "count is out of buffers."));
    assert_eq!(driver.native_calls(), calls);

    let single = call(&mut env, "AL::Buffer.new", &[]);
    let (class, _) = call_err(
        &mut env,
        "AL::Source#queue_buffers",
        &[source.clone(), single, Value::Int(0)],
    );
    assert_eq!(class, "ArgumentError");
    let (class, _) = call_err(
        &mut env,
        "AL::Source#queue_buffers",
        &[source.clone(), Value::Int(7)],
    );
    assert_eq!(class, "TypeError");

    call(&mut env, "AL::Source#queue_buffers", &[source.clone(), buffers.clone()]);
    assert_eq!(
        call(&mut env, "AL::Source#buffers_queued", &[source.clone()]),
        Value::Int(2)
    );
    assert_eq!(
        call(&mut env, "AL::Source#type", &[source.clone()]),
        constant(&env, "AL::Source::STREAMING")
    );

    // Once everything has played, the buffers can be taken back.
    call(&mut env, "AL::Source#play", &[source.clone()]);
    call(&mut env, "AL::Source#stop", &[source.clone()]);
    assert_eq!(
        call(&mut env, "AL::Source#buffers_processed", &[source.clone()]),
        Value::Int(2)
    );
    call(
        &mut env,
        "AL::Source#unqueue_buffers",
        &[source.clone(), buffers.clone(), Value::Int(0), Value::Int(2)],
    );
    assert_eq!(
        call(&mut env, "AL::Source#buffers_queued", &[source.clone()]),
        Value::Int(0)
    );

    // Nothing is attached any more, so everything can be deleted.
    env.shutdown();
    assert_eq!(driver.live_buffers(), 0);
    assert_eq!(driver.live_sources(), 0);
}

#[test]
fn source_properties() {
    let (_driver, mut env) = headless_env(HeadlessDriver::new());
    let source = call(&mut env, "AL::Source.new", &[]);

    assert_eq!(call(&mut env, "AL::Source#gain", &[source.clone()]), Value::Float(1.0));
    assert_eq!(
        call(&mut env, "AL::Source#gain=", &[source.clone(), Value::Float(0.5)]),
        Value::Float(0.5)
    );
    assert_eq!(call(&mut env, "AL::Source#gain", &[source.clone()]), Value::Float(0.5));

    let position = Value::List(vec![Value::Float(1.0), Value::Float(2.0), Value::Float(-3.0)]);
    call(&mut env, "AL::Source#position=", &[source.clone(), position.clone()]);
    assert_eq!(call(&mut env, "AL::Source#position", &[source.clone()]), position);

    call(&mut env, "AL::Source#looping=", &[source.clone(), Value::Bool(true)]);
    assert_eq!(
        call(&mut env, "AL::Source#looping?", &[source.clone()]),
        Value::Bool(true)
    );

    // Out of range for AL, so it comes back as an AL error.
    let (class, _) = call_err(
        &mut env,
        "AL::Source#gain=",
        &[source.clone(), Value::Float(-1.0)],
    );
    assert_eq!(class, "AL::ALError");
    let (class, _) = call_err(
        &mut env,
        "AL::Source#gain=",
        &[source.clone(), Value::from("loud")],
    );
    assert_eq!(class, "TypeError");
    let (class, _) = call_err(&mut env, "AL::Source#gain", &[Value::Nil]);
    assert_eq!(class, "TypeError");
    let (class, message) = call_err(
        &mut env,
        "AL::Source#type=",
        &[source.clone(), Value::Int(1 << 40)],
    );
    assert_eq!(class, "RangeError");
    assert_eq!(message, "integer 1099511627776 too big to convert to int");
}

#[test]
fn unqueueing_never_moves_names_between_buffers() {
    let (driver, mut env) = headless_env(HeadlessDriver::new());
    let first = call(&mut env, "AL::Buffer.new", &[]);
    let second = call(&mut env, "AL::Buffer.new", &[]);
    let source = call(&mut env, "AL::Source.new", &[]);
    let first_id = call(&mut env, "AL::Buffer#id", &[first.clone()]);
    let second_id = call(&mut env, "AL::Buffer#id", &[second.clone()]);
    assert_ne!(first_id, second_id);

    call(&mut env, "AL::Source#queue_buffers", &[source.clone(), first.clone()]);
    call(&mut env, "AL::Source#queue_buffers", &[source.clone(), second.clone()]);
    call(&mut env, "AL::Source#play", &[source.clone()]);
    call(&mut env, "AL::Source#stop", &[source.clone()]);

    // The oldest processed buffer comes off first, and it isn't `second`.
    let (class, message) = call_err(
        &mut env,
        "AL::Source#unqueue_buffers",
        &[source.clone(), second.clone()],
    );
    assert_eq!(class, "AL::ALError");
    assert_eq!(message, "unqueued buffers do not match the given buffers.");
    assert_eq!(call(&mut env, "AL::Buffer#id", &[first.clone()]), first_id);
    assert_eq!(call(&mut env, "AL::Buffer#id", &[second.clone()]), second_id);

    call(&mut env, "AL::Source#unqueue_buffers", &[source.clone(), second.clone()]);
    assert_eq!(
        call(&mut env, "AL::Source#buffers_queued", &[source.clone()]),
        Value::Int(0)
    );
    assert_eq!(call(&mut env, "AL::Buffer#id", &[second.clone()]), second_id);

    assert!(env.release(&source));
    assert!(env.release(&first));
    assert!(env.release(&second));
    assert_eq!(driver.live_buffers(), 0);
    assert_eq!(driver.live_sources(), 0);
}

#[test]
fn playing_setter() {
    let (_driver, mut env) = headless_env(HeadlessDriver::new());
    let source = call(&mut env, "AL::Source.new", &[]);
    let buffer = call(&mut env, "AL::Buffer.new", &[]);

    assert_eq!(call(&mut env, "AL::Source#buffer", &[source.clone()]), Value::Nil);
    assert_eq!(
        call(&mut env, "AL::Source#buffer=", &[source.clone(), buffer.clone()]),
        buffer
    );
    let attached = call(&mut env, "AL::Source#buffer", &[source.clone()]);
    assert_eq!(
        call(&mut env, "AL::Buffer#id", &[attached]),
        call(&mut env, "AL::Buffer#id", &[buffer.clone()])
    );
    assert_eq!(
        call(&mut env, "AL::Source#state", &[source.clone()]),
        constant(&env, "AL::Source::INITIAL")
    );

    assert_eq!(
        call(&mut env, "AL::Source#playing=", &[source.clone(), Value::Bool(true)]),
        Value::Bool(true)
    );
    assert_eq!(
        call(&mut env, "AL::Source#state", &[source.clone()]),
        constant(&env, "AL::Source::PLAYING")
    );
    assert_eq!(
        call(&mut env, "AL::Source#playing=", &[source.clone(), Value::Bool(false)]),
        Value::Bool(false)
    );
    assert_eq!(
        call(&mut env, "AL::Source#state", &[source.clone()]),
        constant(&env, "AL::Source::STOPPED")
    );
}

#[test]
fn context_lifecycle() {
    let (driver, mut env) = headless_env(HeadlessDriver::new());
    let (device, context) = open_playback(&mut env);
    assert_eq!(call(&mut env, "ALC::Device#opened?", &[device.clone()]), Value::Bool(true));
    assert_eq!(driver.live_contexts(), 1);

    let current = call(&mut env, "ALC::Context.current", &[]);
    assert_eq!(env.class_of(&current), Some("ALC::Context"));

    // Views of the device can't close it.
    let device_view = call(&mut env, "ALC::Context#device", &[context.clone()]);
    let (class, _) = call_err(&mut env, "ALC::Device#close", &[device_view]);
    assert_eq!(class, "ArgumentError");
    let (class, _) = call_err(&mut env, "ALC::Context#destroy", &[current]);
    assert_eq!(class, "ArgumentError");

    call(&mut env, "ALC::Context#destroy", &[context.clone()]);
    assert_eq!(
        call(&mut env, "ALC::Context#destroyed?", &[context.clone()]),
        Value::Bool(true)
    );
    call(&mut env, "ALC::Context#destroy", &[context.clone()]);
    assert_eq!(driver.live_contexts(), 0);
    assert_eq!(call(&mut env, "ALC::Context.current", &[]), Value::Nil);

    let (class, message) = call_err(&mut env, "ALC::Context.current=", &[context.clone()]);
    assert_eq!(class, "ALC::ALCError");
    assert_eq!(message, "context has already been destroyed.");

    call(&mut env, "ALC::Device#close", &[device.clone()]);
    assert_eq!(call(&mut env, "ALC::Device#opened?", &[device.clone()]), Value::Bool(false));
    assert_eq!(driver.open_devices(), 0);
    // Closing again is harmless.
    call(&mut env, "ALC::Device#close", &[device]);
}

#[test]
fn contexts_keep_their_device_open() {
    let (driver, mut env) = headless_env(HeadlessDriver::new());
    let device = call(&mut env, "ALC::Device.new", &[Value::Nil]);
    let context = call(&mut env, "ALC::Context.new", &[device.clone()]);

    // Finalizers can run in any order.
    assert!(env.release(&device));
    assert_eq!(driver.open_devices(), 1);
    assert_eq!(driver.live_contexts(), 1);
    assert!(env.release(&context));
    assert_eq!(driver.live_contexts(), 0);
    assert_eq!(driver.open_devices(), 0);

    // Destroying the context explicitly works the same way.
    let device = call(&mut env, "ALC::Device.new", &[Value::Nil]);
    let context = call(&mut env, "ALC::Context.new", &[device.clone()]);
    assert!(env.release(&device));
    call(&mut env, "ALC::Context#destroy", &[context.clone()]);
    assert_eq!(driver.open_devices(), 0);
    assert!(env.release(&context));
    assert_eq!(driver.open_devices(), 0);

    // A device that's still in use can't be closed explicitly.
    let device = call(&mut env, "ALC::Device.new", &[Value::Nil]);
    let context = call(&mut env, "ALC::Context.new", &[device.clone()]);
    let (class, _) = call_err(&mut env, "ALC::Device#close", &[device.clone()]);
    assert_eq!(class, "ALC::ALCError");
    assert_eq!(call(&mut env, "ALC::Device#opened?", &[device.clone()]), Value::Bool(true));
    call(&mut env, "ALC::Context#destroy", &[context]);
    call(&mut env, "ALC::Device#close", &[device.clone()]);
    assert_eq!(driver.open_devices(), 0);
    assert!(env.release(&device));
    assert_eq!(driver.open_devices(), 0);
}

#[test]
fn unknown_devices_raise() {
    let (driver, mut env) = headless_env(HeadlessDriver::new());
    let (class, message) = call_err(&mut env, "ALC::Device.new", &[Value::from("Nope")]);
    assert_eq!(class, "ALC::ALCError");
    assert!(message.contains("Nope"), "{}", message);
    assert_eq!(driver.open_devices(), 0);

    let device = call(&mut env, "ALC::Device.new", &[]);
    assert_eq!(call(&mut env, "ALC::Device#opened?", &[device.clone()]), Value::Bool(false));
    call(&mut env, "ALC::Device#open", &[device.clone(), Value::from("Headless Playback")]);
    let (class, _) = call_err(&mut env, "ALC::Device#open", &[device]);
    assert_eq!(class, "ALC::ALCError");
}

#[test]
fn shutdown_releases_newest_first() {
    let (driver, mut env) = headless_env(HeadlessDriver::new());
    open_playback(&mut env);
    let buffer = call(&mut env, "AL::Buffer.new", &[]);
    let source = call(&mut env, "AL::Source.new", &[]);
    call(&mut env, "AL::Source#buffer=", &[source, buffer]);

    // The device can't be closed while its context lives, nor the buffer
    // deleted while the source uses it, so this only works newest first.
    env.shutdown();
    assert_eq!(driver.live_buffers(), 0);
    assert_eq!(driver.live_sources(), 0);
    assert_eq!(driver.live_contexts(), 0);
    assert_eq!(driver.open_devices(), 0);
    assert!(env.objects.is_empty());
}

#[test]
fn capture_into_sample_buffer() {
    let (driver, mut env) = headless_env(HeadlessDriver::new());
    let format = constant(&env, "ALC::FORMAT_MONO16");
    let device = call(
        &mut env,
        "ALC::CaptureDevice.new",
        &[Value::Nil, Value::Int(8000), format.clone(), Value::Int(16)],
    );
    assert_eq!(call(&mut env, "ALC::CaptureDevice#format", &[device.clone()]), format);
    assert_eq!(
        call(&mut env, "ALC::CaptureDevice#frequency", &[device.clone()]),
        Value::Int(8000)
    );
    call(&mut env, "ALC::CaptureDevice#start", &[device.clone()]);
    assert_eq!(
        call(&mut env, "ALC::CaptureDevice#available_samples", &[device.clone()]),
        Value::Int(16)
    );

    // Eight bytes hold four 16-bit samples.
    let samples = call(&mut env, "AL::SampleBuffer.new", &[Value::Int(8)]);
    let (class, message) = call_err(
        &mut env,
        "ALC::CaptureDevice#samples",
        &[device.clone(), samples.clone(), Value::Int(5)],
    );
    assert_eq!(class, "ArgumentError");
    assert_eq!(message, "too many sampling count is supplied.");

    call(
        &mut env,
        "ALC::CaptureDevice#samples",
        &[device.clone(), samples.clone(), Value::Int(4)],
    );
    assert_eq!(call(&mut env, "AL::SampleBuffer#size", &[samples.clone()]), Value::Int(8));
    assert_eq!(
        call(&mut env, "AL::SampleBuffer#bytes", &[samples.clone()]),
        Value::Bytes(vec![0; 8])
    );

    call(&mut env, "AL::SampleBuffer#reset", &[samples.clone(), Value::Int(2)]);
    assert_eq!(call(&mut env, "AL::SampleBuffer#size", &[samples.clone()]), Value::Int(0));
    assert_eq!(
        call(&mut env, "AL::SampleBuffer#capacity", &[samples]),
        Value::Int(2)
    );

    call(&mut env, "ALC::CaptureDevice#stop", &[device.clone()]);
    call(&mut env, "ALC::CaptureDevice#close", &[device.clone()]);
    assert_eq!(
        call(&mut env, "ALC::CaptureDevice#opened?", &[device]),
        Value::Bool(false)
    );
    assert_eq!(driver.open_devices(), 0);
}

#[test]
fn capture_device_arguments_are_all_or_nothing() {
    let (_driver, mut env) = headless_env(HeadlessDriver::new());
    let (class, message) = call_err(
        &mut env,
        "ALC::CaptureDevice.new",
        &[Value::Nil, Value::Int(8000)],
    );
    assert_eq!(class, "ArgumentError");
    assert_eq!(message, "wrong number of arguments.");

    let device = call(&mut env, "ALC::CaptureDevice.new", &[]);
    assert_eq!(
        call(&mut env, "ALC::CaptureDevice#opened?", &[device.clone()]),
        Value::Bool(false)
    );
    let format = constant(&env, "ALC::FORMAT_STEREO8");
    call(
        &mut env,
        "ALC::CaptureDevice#open",
        &[device.clone(), Value::Nil, Value::Int(11025), format, Value::Int(64)],
    );
    assert_eq!(
        call(&mut env, "ALC::CaptureDevice#buffer_size", &[device]),
        Value::Int(64)
    );
}

#[test]
fn device_specifiers() {
    let (_driver, mut env) = headless_env(HeadlessDriver::new());
    let playback = Value::List(vec![Value::from("Headless Playback")]);
    let capture = Value::List(vec![Value::from("Headless Capture")]);
    assert_eq!(call(&mut env, "ALC::Device.device_specifier", &[]), playback);
    assert_eq!(call(&mut env, "ALC::Device.default_device_specifier", &[]), playback);
    assert_eq!(call(&mut env, "ALC::CaptureDevice.device_specifier", &[]), capture);
    assert_eq!(
        call(&mut env, "ALC::CaptureDevice.default_device_specifier", &[]),
        capture
    );
}

#[test]
fn alut_buffers_from_wav_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..200 {
        writer.write_sample(i as i16).unwrap();
    }
    writer.finalize().unwrap();

    let (driver, mut env) = headless_env(HeadlessDriver::new());
    assert_eq!(call(&mut env, "ALUT.init", &[]), Value::Bool(true));
    let path = Value::from(path.to_str().unwrap());
    let buffer = call(&mut env, "AL::Buffer.from_file", &[path]);
    assert_eq!(env.class_of(&buffer), Some("AL::Buffer"));
    assert_eq!(call(&mut env, "AL::Buffer#size", &[buffer.clone()]), Value::Int(400));
    assert_eq!(call(&mut env, "AL::Buffer#channels", &[buffer.clone()]), Value::Int(2));
    assert_eq!(call(&mut env, "AL::Buffer#bits", &[buffer.clone()]), Value::Int(16));
    assert_eq!(
        call(&mut env, "AL::Buffer#frequency", &[buffer.clone()]),
        Value::Int(22050)
    );

    let missing = Value::from(dir.path().join("missing.wav").to_str().unwrap());
    let (class, _) = call_err(&mut env, "AL::Buffer.from_file", &[missing]);
    assert_eq!(class, "AL::ALError");

    env.release(&buffer);
    assert_eq!(driver.live_buffers(), 0);
    assert_eq!(call(&mut env, "ALUT.exit", &[]), Value::Bool(true));
    assert_eq!(driver.open_devices(), 0);
}

#[test]
fn alut_sleep_blocks() {
    let (_driver, mut env) = headless_env(HeadlessDriver::new());
    let start = std::time::Instant::now();
    assert_eq!(call(&mut env, "ALUT.sleep", &[Value::Float(0.06)]), Value::Bool(true));
    assert!(start.elapsed() >= std::time::Duration::from_millis(50));

    assert_eq!(call(&mut env, "ALUT.sleep", &[Value::Float(-1.0)]), Value::Bool(false));
    assert_eq!(
        call(&mut env, "ALUT.error", &[]),
        constant(&env, "ALUT::ERROR_INVALID_VALUE")
    );
}

#[test]
fn missing_alut_raises() {
    let (_driver, mut env) = headless_env(HeadlessDriver::without_alut());
    for name in ["ALUT.init", "ALUT.major_version", "AL::Buffer.hello_world"] {
        let (class, message) = call_err(&mut env, name, &[]);
        assert_eq!(class, "RuntimeError");
        assert_eq!(message, "ALUT library is not loaded.");
    }
    // The rest of the bindings still work.
    call(&mut env, "AL::Buffer.new", &[]);
}

#[test]
fn global_state_and_lookups() {
    let (_driver, mut env) = headless_env(HeadlessDriver::new());
    assert_eq!(call(&mut env, "AL.get_error", &[]), constant(&env, "AL::NO_ERROR"));
    assert_eq!(
        call(&mut env, "AL.speed_of_sound=", &[Value::Float(100.0)]),
        Value::Bool(true)
    );
    let param = constant(&env, "AL::SPEED_OF_SOUND");
    assert_eq!(call(&mut env, "AL.float", &[param]), Value::Float(100.0));

    let orientation = Value::List(
        [0.0, 0.0, 1.0, 0.0, 1.0, 0.0]
            .into_iter()
            .map(Value::Float)
            .collect(),
    );
    call(&mut env, "AL::Listener.orientation=", &[orientation.clone()]);
    assert_eq!(call(&mut env, "AL::Listener.orientation", &[]), orientation);

    let (class, _) = call_err(&mut env, "AL::Nothing.new", &[]);
    assert_eq!(class, "NoMethodError");
    let (class, _) = call_err(&mut env, "AL::Buffer.new", &[Value::Int(1)]);
    assert_eq!(class, "ArgumentError");
    assert_eq!(env.constant("AL::Source::PLAYING"), Some(0x1012));
    assert!(env.has_function("ALC::Context.current="));
}

#[test]
fn released_objects_raise() {
    let (_driver, mut env) = headless_env(HeadlessDriver::new());
    let buffer = call(&mut env, "AL::Buffer.new", &[]);
    env.release(&buffer);
    let (class, message) = call_err(&mut env, "AL::Buffer#size", &[buffer]);
    assert_eq!(class, "ArgumentError");
    assert_eq!(message, "AL::Buffer has already been released");
}

fn run_binary(args: &[&str]) -> std::process::Output {
    Command::new(target_dir().join(format!("openal_script{}", env::consts::EXE_SUFFIX)))
        .args(args)
        .env_remove("OPENAL_SCRIPT_OPTIONS")
        .output()
        .expect("failed to execute openal_script process")
}

#[test]
fn binary_lists_headless_devices() {
    let output = run_binary(&["--headless", "devices"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{}", stderr);
    assert!(stderr.contains("Headless Playback"), "{}", stderr);
    assert!(stderr.contains("Headless Capture"), "{}", stderr);
}

#[test]
fn binary_plays_and_captures_headless() {
    let output = run_binary(&["--headless", "sine", "0.25"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.wav");
    let output = run_binary(&["--headless", "capture", "0.01", path.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().sample_rate, 22050);
    assert!(reader.len() > 0);

    let output = run_binary(&["--headless", "bogus"]);
    assert!(!output.status.success());
}
