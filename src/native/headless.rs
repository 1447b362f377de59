/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! A [Driver] that produces no sound.
//!
//! This keeps the same books an OpenAL implementation does (names, parameter
//! values, source states and queues, devices and contexts, the sticky error
//! codes) and follows the OpenAL 1.1 rules for when a call is an error, but it
//! never mixes anything. Unlike a real implementation, AL calls don't require
//! a current context: there is one global set of AL objects.
//!
//! ALUT is emulated on top of the same state. `alutCreateBufferFromFile` only
//! understands WAV files, which are read with `hound` to get the metadata.

use super::{format_layout, AlutDriver, ContextHandle, DeviceHandle, Driver};
use openal_script_sys::al_types::*;
use openal_script_sys::alc_types::*;
use openal_script_sys::*;
use std::cell::{Cell, RefCell, RefMut};
use std::collections::HashMap;
use std::ffi::CStr;
use std::path::Path;
use std::time::Duration;

pub const PLAYBACK_DEVICE_NAME: &str = "Headless Playback";
pub const CAPTURE_DEVICE_NAME: &str = "Headless Capture";
const OUTPUT_FREQUENCY: ALCint = 44100;
/// Sample rate of buffers made by the ALUT constructors.
const ALUT_FREQUENCY: ALint = 44100;

/// `AL_SOURCE_DISTANCE_MODEL`, the only capability OpenAL Soft knows.
const AL_SOURCE_DISTANCE_MODEL: ALenum = 0x200;

const SOURCE_FLOAT_DEFAULTS: &[(ALenum, ALfloat)] = &[
    (AL_PITCH, 1.0),
    (AL_GAIN, 1.0),
    (AL_MIN_GAIN, 0.0),
    (AL_MAX_GAIN, 1.0),
    (AL_REFERENCE_DISTANCE, 1.0),
    (AL_ROLLOFF_FACTOR, 1.0),
    (AL_MAX_DISTANCE, ALfloat::MAX),
    (AL_CONE_INNER_ANGLE, 360.0),
    (AL_CONE_OUTER_ANGLE, 360.0),
    (AL_CONE_OUTER_GAIN, 0.0),
    (AL_SEC_OFFSET, 0.0),
    (AL_SAMPLE_OFFSET, 0.0),
    (AL_BYTE_OFFSET, 0.0),
];

const AL_ENUM_NAMES: &[(&str, ALenum)] = &[
    ("AL_SOURCE_RELATIVE", AL_SOURCE_RELATIVE),
    ("AL_PITCH", AL_PITCH),
    ("AL_POSITION", AL_POSITION),
    ("AL_DIRECTION", AL_DIRECTION),
    ("AL_VELOCITY", AL_VELOCITY),
    ("AL_LOOPING", AL_LOOPING),
    ("AL_BUFFER", AL_BUFFER),
    ("AL_GAIN", AL_GAIN),
    ("AL_ORIENTATION", AL_ORIENTATION),
    ("AL_SOURCE_STATE", AL_SOURCE_STATE),
    ("AL_PLAYING", AL_PLAYING),
    ("AL_STOPPED", AL_STOPPED),
    ("AL_FORMAT_MONO8", AL_FORMAT_MONO8),
    ("AL_FORMAT_MONO16", AL_FORMAT_MONO16),
    ("AL_FORMAT_STEREO8", AL_FORMAT_STEREO8),
    ("AL_FORMAT_STEREO16", AL_FORMAT_STEREO16),
    ("AL_SOURCE_DISTANCE_MODEL", AL_SOURCE_DISTANCE_MODEL),
    ("AL_INVERSE_DISTANCE_CLAMPED", AL_INVERSE_DISTANCE_CLAMPED),
];

const ALC_ENUM_NAMES: &[(&str, ALCenum)] = &[
    ("ALC_FREQUENCY", ALC_FREQUENCY),
    ("ALC_REFRESH", ALC_REFRESH),
    ("ALC_SYNC", ALC_SYNC),
    ("ALC_MONO_SOURCES", ALC_MONO_SOURCES),
    ("ALC_STEREO_SOURCES", ALC_STEREO_SOURCES),
    ("ALC_DEFAULT_DEVICE_SPECIFIER", ALC_DEFAULT_DEVICE_SPECIFIER),
    ("ALC_DEVICE_SPECIFIER", ALC_DEVICE_SPECIFIER),
    ("ALC_EXTENSIONS", ALC_EXTENSIONS),
    ("ALC_CAPTURE_SAMPLES", ALC_CAPTURE_SAMPLES),
    ("ALC_INVALID_ENUM", ALC_INVALID_ENUM),
];

const ALC_EXTENSION_NAMES: &[&str] = &["ALC_ENUMERATION_EXT", "ALC_EXT_CAPTURE"];

struct BufferState {
    frequency: ALint,
    bits: ALint,
    channels: ALint,
    size: ALint,
}

impl Default for BufferState {
    fn default() -> Self {
        BufferState {
            frequency: 0,
            bits: 16,
            channels: 1,
            size: 0,
        }
    }
}

struct SourceState {
    floats: HashMap<ALenum, ALfloat>,
    vectors: HashMap<ALenum, [ALfloat; 3]>,
    relative: bool,
    looping: bool,
    source_type: ALenum,
    state: ALenum,
    queue: Vec<ALuint>,
    processed: usize,
}

impl SourceState {
    fn new() -> Self {
        SourceState {
            floats: SOURCE_FLOAT_DEFAULTS.iter().copied().collect(),
            vectors: [AL_POSITION, AL_VELOCITY, AL_DIRECTION]
                .into_iter()
                .map(|param| (param, [0.0; 3]))
                .collect(),
            relative: false,
            looping: false,
            source_type: AL_UNDETERMINED,
            state: AL_INITIAL,
            queue: Vec::new(),
            processed: 0,
        }
    }

    fn is_active(&self) -> bool {
        self.state == AL_PLAYING || self.state == AL_PAUSED
    }
}

struct Capture {
    format: ALCenum,
    buffer_size: usize,
    capturing: bool,
    /// Samples left over after capture was stopped.
    leftover: usize,
}

impl Capture {
    /// While capturing, the ring buffer is always full of silence.
    fn available(&self) -> usize {
        if self.capturing {
            self.buffer_size
        } else {
            self.leftover
        }
    }
}

struct Device {
    name: &'static str,
    error: ALCenum,
    capture: Option<Capture>,
}

struct AlutSession {
    device: Option<DeviceHandle>,
    context: Option<ContextHandle>,
}

struct State {
    al_error: ALenum,
    alc_error: ALCenum,
    alut_error: ALenum,
    alut_session: Option<AlutSession>,
    next_name: ALuint,
    next_handle: usize,
    buffers: HashMap<ALuint, BufferState>,
    sources: HashMap<ALuint, SourceState>,
    listener_gain: ALfloat,
    listener_position: [ALfloat; 3],
    listener_velocity: [ALfloat; 3],
    listener_orientation: [ALfloat; 6],
    source_distance_model: bool,
    doppler_factor: ALfloat,
    doppler_velocity: ALfloat,
    speed_of_sound: ALfloat,
    distance_model: ALenum,
    devices: HashMap<DeviceHandle, Device>,
    contexts: HashMap<ContextHandle, DeviceHandle>,
    current: Option<ContextHandle>,
}

impl State {
    fn new() -> State {
        State {
            al_error: AL_NO_ERROR,
            alc_error: ALC_NO_ERROR,
            alut_error: ALUT_ERROR_NO_ERROR,
            alut_session: None,
            next_name: 1,
            next_handle: 0x1000,
            buffers: HashMap::new(),
            sources: HashMap::new(),
            listener_gain: 1.0,
            listener_position: [0.0; 3],
            listener_velocity: [0.0; 3],
            listener_orientation: [0.0, 0.0, -1.0, 0.0, 1.0, 0.0],
            source_distance_model: false,
            doppler_factor: 1.0,
            doppler_velocity: 1.0,
            speed_of_sound: 343.3,
            distance_model: AL_INVERSE_DISTANCE_CLAMPED,
            devices: HashMap::new(),
            contexts: HashMap::new(),
            current: None,
        }
    }

    /// Only the first error is kept until it is fetched.
    fn al_error(&mut self, error: ALenum) {
        if self.al_error == AL_NO_ERROR {
            self.al_error = error;
        }
    }

    fn alc_error(&mut self, device: Option<DeviceHandle>, error: ALCenum) {
        let slot = match device.and_then(|device| self.devices.get_mut(&device)) {
            Some(device) => &mut device.error,
            None => &mut self.alc_error,
        };
        if *slot == ALC_NO_ERROR {
            *slot = error;
        }
    }

    fn alut_error(&mut self, error: ALenum) {
        if self.alut_error == ALUT_ERROR_NO_ERROR {
            self.alut_error = error;
        }
    }

    fn gen_names(&mut self, count: usize) -> Vec<ALuint> {
        let first = self.next_name;
        self.next_name += count as ALuint;
        (first..self.next_name).collect()
    }

    fn new_handle(&mut self) -> usize {
        self.next_handle += 0x10;
        self.next_handle
    }

    fn playback_device(&self, device: DeviceHandle) -> bool {
        matches!(self.devices.get(&device), Some(d) if d.capture.is_none())
    }

    fn capture(&mut self, device: DeviceHandle) -> Option<&mut Capture> {
        self.devices
            .get_mut(&device)
            .and_then(|device| device.capture.as_mut())
    }

    fn buffer_in_use(&self, name: ALuint) -> bool {
        self.sources.values().any(|source| source.queue.contains(&name))
    }

    fn set_source_float(&mut self, name: ALuint, param: ALenum, value: ALfloat) {
        let Some(source) = self.source(name) else {
            return;
        };
        if !source.floats.contains_key(&param) {
            return self.al_error(AL_INVALID_ENUM);
        }
        if !valid_source_float(param, value) {
            return self.al_error(AL_INVALID_VALUE);
        }
        source.floats.insert(param, value);
    }

    fn source(&mut self, name: ALuint) -> Option<&mut SourceState> {
        if !self.sources.contains_key(&name) {
            self.al_error(AL_INVALID_NAME);
        }
        self.sources.get_mut(&name)
    }

    fn open_device(&mut self, name: Option<&CStr>) -> Option<DeviceHandle> {
        if !name_matches(name, PLAYBACK_DEVICE_NAME) {
            self.alc_error(None, ALC_INVALID_VALUE);
            return None;
        }
        let handle = DeviceHandle::from_bits(self.new_handle())?;
        self.devices.insert(
            handle,
            Device {
                name: PLAYBACK_DEVICE_NAME,
                error: ALC_NO_ERROR,
                capture: None,
            },
        );
        Some(handle)
    }

    fn close_device(&mut self, device: DeviceHandle) -> bool {
        if !self.playback_device(device) {
            self.alc_error(None, ALC_INVALID_DEVICE);
            return false;
        }
        if self.contexts.values().any(|&owner| owner == device) {
            self.alc_error(Some(device), ALC_INVALID_DEVICE);
            return false;
        }
        self.devices.remove(&device);
        true
    }

    fn create_context(&mut self, device: DeviceHandle) -> Option<ContextHandle> {
        if !self.playback_device(device) {
            self.alc_error(None, ALC_INVALID_DEVICE);
            return None;
        }
        let handle = ContextHandle::from_bits(self.new_handle())?;
        self.contexts.insert(handle, device);
        Some(handle)
    }

    fn destroy_context(&mut self, context: ContextHandle) {
        if self.contexts.remove(&context).is_none() {
            self.alc_error(None, ALC_INVALID_CONTEXT);
            return;
        }
        if self.current == Some(context) {
            self.current = None;
        }
    }

    fn make_context_current(&mut self, context: Option<ContextHandle>) -> bool {
        match context {
            Some(context) if !self.contexts.contains_key(&context) => {
                self.alc_error(None, ALC_INVALID_CONTEXT);
                false
            }
            _ => {
                self.current = context;
                true
            }
        }
    }

    fn alut_buffer(&mut self, buffer: BufferState) -> ALuint {
        if self.alut_session.is_none() {
            self.alut_error(ALUT_ERROR_INVALID_OPERATION);
            return 0;
        }
        if self.current.is_none() {
            self.alut_error(ALUT_ERROR_NO_CURRENT_CONTEXT);
            return 0;
        }
        let name = self.gen_names(1)[0];
        self.buffers.insert(name, buffer);
        name
    }
}

fn name_matches(name: Option<&CStr>, expected: &str) -> bool {
    name.map_or(true, |name| name.to_bytes() == expected.as_bytes())
}

fn lookup<T: Copy>(table: &[(&str, T)], name: &CStr) -> Option<T> {
    let name = name.to_str().ok()?;
    table
        .iter()
        .find(|&&(candidate, _)| candidate == name)
        .map(|&(_, value)| value)
}

fn valid_source_float(param: ALenum, value: ALfloat) -> bool {
    if !value.is_finite() {
        return false;
    }
    match param {
        AL_CONE_INNER_ANGLE | AL_CONE_OUTER_ANGLE => (0.0..=360.0).contains(&value),
        AL_MIN_GAIN | AL_MAX_GAIN | AL_CONE_OUTER_GAIN => (0.0..=1.0).contains(&value),
        _ => value >= 0.0,
    }
}

fn wav_metadata(path: &Path) -> Result<BufferState, ALenum> {
    let reader = hound::WavReader::open(path).map_err(|e| match e {
        hound::Error::IoError(_) => ALUT_ERROR_IO_ERROR,
        hound::Error::FormatError(_) => ALUT_ERROR_UNSUPPORTED_FILE_TYPE,
        hound::Error::Unsupported => ALUT_ERROR_UNSUPPORTED_FILE_SUBTYPE,
        _ => ALUT_ERROR_CORRUPT_OR_TRUNCATED_DATA,
    })?;
    let spec = reader.spec();
    if !matches!(spec.bits_per_sample, 8 | 16)
        || !matches!(spec.channels, 1 | 2)
        || spec.sample_format != hound::SampleFormat::Int
    {
        return Err(ALUT_ERROR_UNSUPPORTED_FILE_SUBTYPE);
    }
    let bytes = u64::from(reader.len()) * u64::from(spec.bits_per_sample / 8);
    Ok(BufferState {
        frequency: spec.sample_rate as ALint,
        bits: spec.bits_per_sample.into(),
        channels: spec.channels.into(),
        size: ALint::try_from(bytes).map_err(|_| ALUT_ERROR_OUT_OF_MEMORY)?,
    })
}

/// See the module documentation.
pub struct HeadlessDriver {
    state: RefCell<State>,
    calls: Cell<usize>,
    alut: bool,
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDriver {
    pub fn new() -> HeadlessDriver {
        HeadlessDriver {
            state: RefCell::new(State::new()),
            calls: Cell::new(0),
            alut: true,
        }
    }

    /// As if the ALUT library couldn't be found.
    pub fn without_alut() -> HeadlessDriver {
        HeadlessDriver {
            alut: false,
            ..HeadlessDriver::new()
        }
    }

    /// Number of [Driver] and [AlutDriver] calls made so far.
    pub fn native_calls(&self) -> usize {
        self.calls.get()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_sources(&self) -> usize {
        self.state.borrow().sources.len()
    }

    /// Open playback and capture devices.
    pub fn open_devices(&self) -> usize {
        self.state.borrow().devices.len()
    }

    pub fn live_contexts(&self) -> usize {
        self.state.borrow().contexts.len()
    }

    fn state(&self) -> RefMut<'_, State> {
        self.calls.set(self.calls.get() + 1);
        self.state.borrow_mut()
    }
}

impl Driver for HeadlessDriver {
    fn get_error(&self) -> ALenum {
        std::mem::replace(&mut self.state().al_error, AL_NO_ERROR)
    }
    fn get_string(&self, param: ALenum) -> Option<String> {
        let string = match param {
            AL_VENDOR => "openal_script",
            AL_VERSION => "1.1 headless",
            AL_RENDERER => "Headless",
            AL_EXTENSIONS => "",
            AL_NO_ERROR => "No Error",
            AL_INVALID_NAME => "Invalid Name",
            AL_INVALID_ENUM => "Invalid Enum",
            AL_INVALID_VALUE => "Invalid Value",
            AL_INVALID_OPERATION => "Invalid Operation",
            AL_OUT_OF_MEMORY => "Out of Memory",
            _ => {
                self.state().al_error(AL_INVALID_ENUM);
                return None;
            }
        };
        self.calls.set(self.calls.get() + 1);
        Some(string.to_string())
    }
    fn enable(&self, capability: ALenum) {
        let mut state = self.state();
        match capability {
            AL_SOURCE_DISTANCE_MODEL => state.source_distance_model = true,
            _ => state.al_error(AL_INVALID_ENUM),
        }
    }
    fn disable(&self, capability: ALenum) {
        let mut state = self.state();
        match capability {
            AL_SOURCE_DISTANCE_MODEL => state.source_distance_model = false,
            _ => state.al_error(AL_INVALID_ENUM),
        }
    }
    fn is_enabled(&self, capability: ALenum) -> bool {
        let mut state = self.state();
        match capability {
            AL_SOURCE_DISTANCE_MODEL => state.source_distance_model,
            _ => {
                state.al_error(AL_INVALID_ENUM);
                false
            }
        }
    }
    fn get_boolean(&self, param: ALenum) -> bool {
        self.get_float(param) != 0.0
    }
    fn get_integer(&self, param: ALenum) -> ALint {
        let mut state = self.state();
        match param {
            AL_DISTANCE_MODEL => state.distance_model,
            AL_DOPPLER_FACTOR => state.doppler_factor as ALint,
            AL_DOPPLER_VELOCITY => state.doppler_velocity as ALint,
            AL_SPEED_OF_SOUND => state.speed_of_sound as ALint,
            _ => {
                state.al_error(AL_INVALID_ENUM);
                0
            }
        }
    }
    fn get_float(&self, param: ALenum) -> ALfloat {
        let mut state = self.state();
        match param {
            AL_DISTANCE_MODEL => state.distance_model as ALfloat,
            AL_DOPPLER_FACTOR => state.doppler_factor,
            AL_DOPPLER_VELOCITY => state.doppler_velocity,
            AL_SPEED_OF_SOUND => state.speed_of_sound,
            _ => {
                state.al_error(AL_INVALID_ENUM);
                0.0
            }
        }
    }
    fn is_extension_present(&self, _name: &CStr) -> bool {
        self.calls.set(self.calls.get() + 1);
        false
    }
    fn get_enum_value(&self, name: &CStr) -> ALenum {
        self.calls.set(self.calls.get() + 1);
        lookup(AL_ENUM_NAMES, name).unwrap_or(AL_NONE)
    }
    fn doppler_factor(&self, value: ALfloat) {
        let mut state = self.state();
        if value >= 0.0 && value.is_finite() {
            state.doppler_factor = value;
        } else {
            state.al_error(AL_INVALID_VALUE);
        }
    }
    fn doppler_velocity(&self, value: ALfloat) {
        let mut state = self.state();
        if value > 0.0 && value.is_finite() {
            state.doppler_velocity = value;
        } else {
            state.al_error(AL_INVALID_VALUE);
        }
    }
    fn speed_of_sound(&self, value: ALfloat) {
        let mut state = self.state();
        if value > 0.0 && value.is_finite() {
            state.speed_of_sound = value;
        } else {
            state.al_error(AL_INVALID_VALUE);
        }
    }
    fn distance_model(&self, model: ALenum) {
        let mut state = self.state();
        if model == AL_NONE || (AL_INVERSE_DISTANCE..=AL_EXPONENT_DISTANCE_CLAMPED).contains(&model)
        {
            state.distance_model = model;
        } else {
            state.al_error(AL_INVALID_VALUE);
        }
    }

    fn listener_f(&self, param: ALenum, value: ALfloat) {
        let mut state = self.state();
        match param {
            AL_GAIN if value >= 0.0 && value.is_finite() => state.listener_gain = value,
            AL_GAIN => state.al_error(AL_INVALID_VALUE),
            _ => state.al_error(AL_INVALID_ENUM),
        }
    }
    fn listener_fv(&self, param: ALenum, values: &[ALfloat]) {
        let mut state = self.state();
        let target: &mut [ALfloat] = match param {
            AL_POSITION => &mut state.listener_position,
            AL_VELOCITY => &mut state.listener_velocity,
            AL_ORIENTATION => &mut state.listener_orientation,
            AL_GAIN => {
                match values.first() {
                    Some(&gain) if gain >= 0.0 && gain.is_finite() => state.listener_gain = gain,
                    _ => state.al_error(AL_INVALID_VALUE),
                }
                return;
            }
            _ => return state.al_error(AL_INVALID_ENUM),
        };
        if values.len() < target.len() || values.iter().any(|v| !v.is_finite()) {
            return state.al_error(AL_INVALID_VALUE);
        }
        let len = target.len();
        target.copy_from_slice(&values[..len]);
    }
    fn get_listener_f(&self, param: ALenum) -> ALfloat {
        let mut state = self.state();
        match param {
            AL_GAIN => state.listener_gain,
            _ => {
                state.al_error(AL_INVALID_ENUM);
                0.0
            }
        }
    }
    fn get_listener_fv(&self, param: ALenum, values: &mut [ALfloat]) {
        let mut state = self.state();
        let gain = [state.listener_gain];
        let source: &[ALfloat] = match param {
            AL_POSITION => &state.listener_position,
            AL_VELOCITY => &state.listener_velocity,
            AL_ORIENTATION => &state.listener_orientation,
            AL_GAIN => &gain,
            _ => return state.al_error(AL_INVALID_ENUM),
        };
        for (value, &stored) in values.iter_mut().zip(source) {
            *value = stored;
        }
    }

    fn gen_buffers(&self, names: &mut [ALuint]) {
        let mut state = self.state();
        let generated = state.gen_names(names.len());
        for (name, generated) in names.iter_mut().zip(generated) {
            state.buffers.insert(generated, BufferState::default());
            *name = generated;
        }
    }
    fn delete_buffers(&self, names: &[ALuint]) {
        let mut state = self.state();
        for &name in names.iter().filter(|&&name| name != 0) {
            if !state.buffers.contains_key(&name) {
                return state.al_error(AL_INVALID_NAME);
            }
            if state.buffer_in_use(name) {
                return state.al_error(AL_INVALID_OPERATION);
            }
        }
        for name in names {
            state.buffers.remove(name);
        }
    }
    fn is_buffer(&self, name: ALuint) -> bool {
        name == 0 || self.state().buffers.contains_key(&name)
    }
    fn buffer_data(&self, name: ALuint, format: ALenum, data: &[u8], frequency: ALsizei) {
        let mut state = self.state();
        if !state.buffers.contains_key(&name) {
            return state.al_error(AL_INVALID_NAME);
        }
        let Some((channels, bits)) = format_layout(format) else {
            return state.al_error(AL_INVALID_ENUM);
        };
        let frame = usize::from(channels * bits / 8);
        if frequency <= 0 || data.len() % frame != 0 {
            return state.al_error(AL_INVALID_VALUE);
        }
        if state.buffer_in_use(name) {
            return state.al_error(AL_INVALID_OPERATION);
        }
        state.buffers.insert(
            name,
            BufferState {
                frequency,
                bits: bits.into(),
                channels: channels.into(),
                size: data.len() as ALint,
            },
        );
    }
    fn get_buffer_i(&self, name: ALuint, param: ALenum) -> ALint {
        let mut state = self.state();
        let Some(buffer) = state.buffers.get(&name) else {
            state.al_error(AL_INVALID_NAME);
            return 0;
        };
        match param {
            AL_FREQUENCY => buffer.frequency,
            AL_BITS => buffer.bits,
            AL_CHANNELS => buffer.channels,
            AL_SIZE => buffer.size,
            _ => {
                state.al_error(AL_INVALID_ENUM);
                0
            }
        }
    }

    fn gen_sources(&self, names: &mut [ALuint]) {
        let mut state = self.state();
        let generated = state.gen_names(names.len());
        for (name, generated) in names.iter_mut().zip(generated) {
            state.sources.insert(generated, SourceState::new());
            *name = generated;
        }
    }
    fn delete_sources(&self, names: &[ALuint]) {
        let mut state = self.state();
        if names.iter().any(|name| !state.sources.contains_key(name)) {
            return state.al_error(AL_INVALID_NAME);
        }
        for name in names {
            state.sources.remove(name);
        }
    }
    fn is_source(&self, name: ALuint) -> bool {
        self.state().sources.contains_key(&name)
    }
    fn source_f(&self, name: ALuint, param: ALenum, value: ALfloat) {
        self.state().set_source_float(name, param, value)
    }
    fn source_fv(&self, name: ALuint, param: ALenum, values: &[ALfloat]) {
        let mut state = self.state();
        let Some(source) = state.source(name) else {
            return;
        };
        if let Some(vector) = source.vectors.get_mut(&param) {
            if values.len() < 3 || values[..3].iter().any(|v| !v.is_finite()) {
                return state.al_error(AL_INVALID_VALUE);
            }
            vector.copy_from_slice(&values[..3]);
        } else if source.floats.contains_key(&param) {
            match values.first() {
                Some(&value) => state.set_source_float(name, param, value),
                None => state.al_error(AL_INVALID_VALUE),
            }
        } else {
            state.al_error(AL_INVALID_ENUM);
        }
    }
    fn source_i(&self, name: ALuint, param: ALenum, value: ALint) {
        let mut state = self.state();
        if !state.sources.contains_key(&name) {
            return state.al_error(AL_INVALID_NAME);
        }
        match param {
            AL_SOURCE_RELATIVE | AL_LOOPING if value != 0 && value != 1 => {
                state.al_error(AL_INVALID_VALUE)
            }
            AL_BUFFER => {
                let buffer = value as ALuint;
                if buffer != 0 && !state.buffers.contains_key(&buffer) {
                    return state.al_error(AL_INVALID_VALUE);
                }
                let Some(source) = state.sources.get_mut(&name) else {
                    return;
                };
                if source.is_active() {
                    return state.al_error(AL_INVALID_OPERATION);
                }
                source.processed = 0;
                if buffer == 0 {
                    source.queue.clear();
                    source.source_type = AL_UNDETERMINED;
                } else {
                    source.queue = vec![buffer];
                    source.source_type = AL_STATIC;
                }
            }
            AL_SOURCE_STATE | AL_SOURCE_TYPE | AL_BUFFERS_QUEUED | AL_BUFFERS_PROCESSED => {
                state.al_error(AL_INVALID_OPERATION)
            }
            AL_SOURCE_RELATIVE | AL_LOOPING => {
                if let Some(source) = state.sources.get_mut(&name) {
                    if param == AL_LOOPING {
                        source.looping = value == 1;
                    } else {
                        source.relative = value == 1;
                    }
                }
            }
            _ => state.set_source_float(name, param, value as ALfloat),
        }
    }
    fn get_source_f(&self, name: ALuint, param: ALenum) -> ALfloat {
        let mut state = self.state();
        let Some(source) = state.source(name) else {
            return 0.0;
        };
        match source.floats.get(&param) {
            Some(&value) => value,
            None => {
                state.al_error(AL_INVALID_ENUM);
                0.0
            }
        }
    }
    fn get_source_fv(&self, name: ALuint, param: ALenum, values: &mut [ALfloat]) {
        let mut state = self.state();
        let Some(source) = state.source(name) else {
            return;
        };
        if let Some(vector) = source.vectors.get(&param) {
            for (value, &stored) in values.iter_mut().zip(vector) {
                *value = stored;
            }
        } else if let Some(&stored) = source.floats.get(&param) {
            if let Some(value) = values.first_mut() {
                *value = stored;
            }
        } else {
            state.al_error(AL_INVALID_ENUM);
        }
    }
    fn get_source_i(&self, name: ALuint, param: ALenum) -> ALint {
        let mut state = self.state();
        let Some(source) = state.source(name) else {
            return 0;
        };
        match param {
            AL_SOURCE_RELATIVE => source.relative.into(),
            AL_LOOPING => source.looping.into(),
            AL_BUFFER => source.queue.first().map_or(0, |&buffer| buffer as ALint),
            AL_SOURCE_STATE => source.state,
            AL_SOURCE_TYPE => source.source_type,
            AL_BUFFERS_QUEUED => source.queue.len() as ALint,
            AL_BUFFERS_PROCESSED => source.processed as ALint,
            _ => match source.floats.get(&param) {
                Some(&value) => value as ALint,
                None => {
                    state.al_error(AL_INVALID_ENUM);
                    0
                }
            },
        }
    }
    fn source_play(&self, name: ALuint) {
        if let Some(source) = self.state().source(name) {
            if source.state != AL_PAUSED {
                source.processed = 0;
            }
            source.state = AL_PLAYING;
        }
    }
    fn source_pause(&self, name: ALuint) {
        if let Some(source) = self.state().source(name) {
            if source.state == AL_PLAYING {
                source.state = AL_PAUSED;
            }
        }
    }
    fn source_stop(&self, name: ALuint) {
        if let Some(source) = self.state().source(name) {
            if source.state != AL_INITIAL {
                source.state = AL_STOPPED;
                source.processed = source.queue.len();
            }
        }
    }
    fn source_rewind(&self, name: ALuint) {
        if let Some(source) = self.state().source(name) {
            source.state = AL_INITIAL;
            source.processed = 0;
        }
    }
    fn source_queue_buffers(&self, name: ALuint, buffers: &[ALuint]) {
        let mut state = self.state();
        if !state.sources.contains_key(&name) {
            return state.al_error(AL_INVALID_NAME);
        }
        if buffers
            .iter()
            .any(|buffer| *buffer != 0 && !state.buffers.contains_key(buffer))
        {
            return state.al_error(AL_INVALID_NAME);
        }
        let Some(source) = state.sources.get_mut(&name) else {
            return;
        };
        if source.source_type == AL_STATIC {
            return state.al_error(AL_INVALID_OPERATION);
        }
        source.queue.extend_from_slice(buffers);
        if !source.queue.is_empty() {
            source.source_type = AL_STREAMING;
        }
    }
    fn source_unqueue_buffers(&self, name: ALuint, buffers: &mut [ALuint]) {
        let mut state = self.state();
        let Some(source) = state.source(name) else {
            return;
        };
        if source.source_type != AL_STREAMING && !buffers.is_empty() {
            return state.al_error(AL_INVALID_VALUE);
        }
        let count = buffers.len();
        if count > source.processed {
            return state.al_error(AL_INVALID_VALUE);
        }
        for (slot, unqueued) in buffers.iter_mut().zip(source.queue.drain(..count)) {
            *slot = unqueued;
        }
        source.processed -= count;
        if source.queue.is_empty() {
            source.source_type = AL_UNDETERMINED;
        }
    }

    fn open_device(&self, name: Option<&CStr>) -> Option<DeviceHandle> {
        self.state().open_device(name)
    }
    fn close_device(&self, device: DeviceHandle) -> bool {
        self.state().close_device(device)
    }
    fn create_context(&self, device: DeviceHandle, attributes: &[ALCint]) -> Option<ContextHandle> {
        let mut state = self.state();
        if attributes.last() != Some(&0) {
            state.alc_error(Some(device), ALC_INVALID_VALUE);
            return None;
        }
        state.create_context(device)
    }
    fn destroy_context(&self, context: ContextHandle) {
        self.state().destroy_context(context)
    }
    fn process_context(&self, context: ContextHandle) {
        let mut state = self.state();
        if !state.contexts.contains_key(&context) {
            state.alc_error(None, ALC_INVALID_CONTEXT);
        }
    }
    fn suspend_context(&self, context: ContextHandle) {
        self.process_context(context)
    }
    fn make_context_current(&self, context: Option<ContextHandle>) -> bool {
        self.state().make_context_current(context)
    }
    fn current_context(&self) -> Option<ContextHandle> {
        self.state().current
    }
    fn contexts_device(&self, context: ContextHandle) -> Option<DeviceHandle> {
        let mut state = self.state();
        let device = state.contexts.get(&context).copied();
        if device.is_none() {
            state.alc_error(None, ALC_INVALID_CONTEXT);
        }
        device
    }
    fn alc_get_error(&self, device: Option<DeviceHandle>) -> ALCenum {
        let mut state = self.state();
        let state = &mut *state;
        let slot = match device {
            Some(device) => match state.devices.get_mut(&device) {
                Some(device) => &mut device.error,
                None => return ALC_INVALID_DEVICE,
            },
            None => &mut state.alc_error,
        };
        std::mem::replace(slot, ALC_NO_ERROR)
    }
    fn alc_get_string(&self, device: Option<DeviceHandle>, param: ALCenum) -> Option<String> {
        let mut state = self.state();
        let device_name = device
            .and_then(|device| state.devices.get(&device))
            .map(|device| device.name);
        let string = match param {
            ALC_NO_ERROR => "No Error",
            ALC_INVALID_DEVICE => "Invalid Device",
            ALC_INVALID_CONTEXT => "Invalid Context",
            ALC_INVALID_ENUM => "Invalid Enum",
            ALC_INVALID_VALUE => "Invalid Value",
            ALC_OUT_OF_MEMORY => "Out of Memory",
            ALC_DEFAULT_DEVICE_SPECIFIER => PLAYBACK_DEVICE_NAME,
            ALC_CAPTURE_DEFAULT_DEVICE_SPECIFIER => CAPTURE_DEVICE_NAME,
            ALC_DEVICE_SPECIFIER | ALC_CAPTURE_DEVICE_SPECIFIER if device_name.is_some() => {
                device_name.unwrap_or_default()
            }
            ALC_EXTENSIONS => "ALC_ENUMERATION_EXT ALC_EXT_CAPTURE",
            _ => {
                state.alc_error(device, ALC_INVALID_ENUM);
                return None;
            }
        };
        Some(string.to_string())
    }
    fn alc_get_string_list(&self, param: ALCenum) -> Option<Vec<u8>> {
        let name = match param {
            ALC_DEVICE_SPECIFIER => PLAYBACK_DEVICE_NAME,
            ALC_CAPTURE_DEVICE_SPECIFIER => CAPTURE_DEVICE_NAME,
            _ => {
                self.state().alc_error(None, ALC_INVALID_ENUM);
                return None;
            }
        };
        self.calls.set(self.calls.get() + 1);
        let mut list = name.as_bytes().to_vec();
        list.extend_from_slice(b"\0\0");
        Some(list)
    }
    fn alc_get_integers(&self, device: Option<DeviceHandle>, param: ALCenum, values: &mut [ALCint]) {
        let mut state = self.state();
        let Some(slot) = values.first_mut() else {
            return state.alc_error(device, ALC_INVALID_VALUE);
        };
        let known_device = device.filter(|device| state.devices.contains_key(device));
        *slot = match (param, known_device) {
            (ALC_MAJOR_VERSION | ALC_MINOR_VERSION, _) => 1,
            (ALC_CAPTURE_SAMPLES, Some(device)) => match state.capture(device) {
                Some(capture) => capture.available() as ALCint,
                None => return state.alc_error(Some(device), ALC_INVALID_DEVICE),
            },
            (ALC_FREQUENCY, Some(_)) => OUTPUT_FREQUENCY,
            (ALC_REFRESH, Some(_)) => 50,
            (ALC_SYNC, Some(_)) => 0,
            (ALC_MONO_SOURCES, Some(_)) => 255,
            (ALC_STEREO_SOURCES, Some(_)) => 1,
            (ALC_FREQUENCY | ALC_REFRESH | ALC_SYNC | ALC_MONO_SOURCES | ALC_STEREO_SOURCES, None) => {
                return state.alc_error(None, ALC_INVALID_DEVICE)
            }
            _ => return state.alc_error(device, ALC_INVALID_ENUM),
        };
    }
    fn alc_is_extension_present(&self, _device: Option<DeviceHandle>, name: &CStr) -> bool {
        self.calls.set(self.calls.get() + 1);
        let name = name.to_string_lossy();
        ALC_EXTENSION_NAMES
            .iter()
            .any(|extension| extension.eq_ignore_ascii_case(&name))
    }
    fn alc_get_enum_value(&self, device: Option<DeviceHandle>, name: &CStr) -> ALCenum {
        let mut state = self.state();
        match lookup(ALC_ENUM_NAMES, name) {
            Some(value) => value,
            None => {
                state.alc_error(device, ALC_INVALID_VALUE);
                0
            }
        }
    }

    fn capture_open_device(
        &self,
        name: Option<&CStr>,
        frequency: ALCuint,
        format: ALCenum,
        buffer_size: ALCsizei,
    ) -> Option<DeviceHandle> {
        let mut state = self.state();
        if !name_matches(name, CAPTURE_DEVICE_NAME) || frequency == 0 || buffer_size <= 0 {
            state.alc_error(None, ALC_INVALID_VALUE);
            return None;
        }
        if format_layout(format).is_none() {
            state.alc_error(None, ALC_INVALID_ENUM);
            return None;
        }
        let handle = DeviceHandle::from_bits(state.new_handle())?;
        state.devices.insert(
            handle,
            Device {
                name: CAPTURE_DEVICE_NAME,
                error: ALC_NO_ERROR,
                capture: Some(Capture {
                    format,
                    buffer_size: buffer_size as usize,
                    capturing: false,
                    leftover: 0,
                }),
            },
        );
        Some(handle)
    }
    fn capture_close_device(&self, device: DeviceHandle) -> bool {
        let mut state = self.state();
        if state.capture(device).is_none() {
            state.alc_error(None, ALC_INVALID_DEVICE);
            return false;
        }
        state.devices.remove(&device);
        true
    }
    fn capture_start(&self, device: DeviceHandle) {
        let mut state = self.state();
        match state.capture(device) {
            Some(capture) => capture.capturing = true,
            None => state.alc_error(None, ALC_INVALID_DEVICE),
        }
    }
    fn capture_stop(&self, device: DeviceHandle) {
        let mut state = self.state();
        match state.capture(device) {
            Some(capture) => {
                if capture.capturing {
                    capture.leftover = capture.buffer_size;
                }
                capture.capturing = false;
            }
            None => state.alc_error(None, ALC_INVALID_DEVICE),
        }
    }
    fn capture_samples(&self, device: DeviceHandle, buffer: &mut [u8], samples: ALCsizei) {
        let mut state = self.state();
        let Some(capture) = state.capture(device) else {
            return state.alc_error(None, ALC_INVALID_DEVICE);
        };
        let Some((channels, bits)) = format_layout(capture.format) else {
            return;
        };
        let count = usize::try_from(samples).unwrap_or(usize::MAX);
        let bytes = count.saturating_mul(usize::from(channels * bits / 8));
        if count > capture.available() || bytes > buffer.len() {
            return state.alc_error(Some(device), ALC_INVALID_VALUE);
        }
        if !capture.capturing {
            capture.leftover -= count;
        }
        // Silence: unsigned 8-bit PCM is centred on 128.
        let silence = if bits == 8 { 0x80 } else { 0 };
        buffer[..bytes].fill(silence);
    }

    fn alut(&self) -> Option<&dyn AlutDriver> {
        self.alut.then_some(self as &dyn AlutDriver)
    }
}

impl AlutDriver for HeadlessDriver {
    fn init(&self) -> bool {
        let mut state = self.state();
        if state.alut_session.is_some() {
            state.alut_error(ALUT_ERROR_INVALID_OPERATION);
            return false;
        }
        let Some(device) = state.open_device(None) else {
            state.alut_error(ALUT_ERROR_OPEN_DEVICE);
            return false;
        };
        let Some(context) = state.create_context(device) else {
            state.close_device(device);
            state.alut_error(ALUT_ERROR_CREATE_CONTEXT);
            return false;
        };
        state.make_context_current(Some(context));
        state.alut_session = Some(AlutSession {
            device: Some(device),
            context: Some(context),
        });
        true
    }
    fn init_without_context(&self) -> bool {
        let mut state = self.state();
        if state.alut_session.is_some() {
            state.alut_error(ALUT_ERROR_INVALID_OPERATION);
            return false;
        }
        state.alut_session = Some(AlutSession {
            device: None,
            context: None,
        });
        true
    }
    fn exit(&self) -> bool {
        let mut state = self.state();
        let Some(session) = state.alut_session.take() else {
            state.alut_error(ALUT_ERROR_INVALID_OPERATION);
            return false;
        };
        if let Some(context) = session.context {
            if state.current == Some(context) {
                state.current = None;
            }
            state.destroy_context(context);
        }
        if let Some(device) = session.device {
            if !state.close_device(device) {
                state.alut_error(ALUT_ERROR_CLOSE_DEVICE);
                return false;
            }
        }
        true
    }
    fn sleep(&self, duration: ALfloat) -> bool {
        let mut state = self.state();
        if !duration.is_finite() || duration < 0.0 {
            state.alut_error(ALUT_ERROR_INVALID_VALUE);
            return false;
        }
        drop(state);
        std::thread::sleep(Duration::from_secs_f32(duration));
        true
    }
    fn get_error(&self) -> ALenum {
        std::mem::replace(&mut self.state().alut_error, ALUT_ERROR_NO_ERROR)
    }
    fn get_error_string(&self, error: ALenum) -> String {
        self.calls.set(self.calls.get() + 1);
        match error {
            ALUT_ERROR_NO_ERROR => "No ALUT error found",
            ALUT_ERROR_OUT_OF_MEMORY => "ALUT ran out of memory",
            ALUT_ERROR_INVALID_ENUM => "ALUT was given an invalid enumeration token",
            ALUT_ERROR_INVALID_VALUE => "ALUT was given an invalid value",
            ALUT_ERROR_INVALID_OPERATION => "The operation was invalid in the current ALUT state",
            ALUT_ERROR_NO_CURRENT_CONTEXT => "There is no current AL context",
            ALUT_ERROR_AL_ERROR_ON_ENTRY => {
                "There was already an AL error on entry to an ALUT function"
            }
            ALUT_ERROR_ALC_ERROR_ON_ENTRY => {
                "There was already an ALC error on entry to an ALUT function"
            }
            ALUT_ERROR_OPEN_DEVICE => "There was an error opening the ALC device",
            ALUT_ERROR_CLOSE_DEVICE => "There was an error closing the ALC device",
            ALUT_ERROR_CREATE_CONTEXT => "There was an error creating an ALC context",
            ALUT_ERROR_MAKE_CONTEXT_CURRENT => "Could not change the current ALC context",
            ALUT_ERROR_DESTROY_CONTEXT => "There was an error destroying the ALC context",
            ALUT_ERROR_GEN_BUFFERS => "There was an error generating an AL buffer",
            ALUT_ERROR_BUFFER_DATA => "There was an error passing data to an AL buffer",
            ALUT_ERROR_IO_ERROR => "I/O error",
            ALUT_ERROR_UNSUPPORTED_FILE_TYPE => "Unsupported file type",
            ALUT_ERROR_UNSUPPORTED_FILE_SUBTYPE => {
                "Unsupported mode within an otherwise usable file type"
            }
            ALUT_ERROR_CORRUPT_OR_TRUNCATED_DATA => "The sound data was corrupt or truncated",
            _ => "An impossible ALUT error condition was reported?",
        }
        .to_string()
    }
    fn major_version(&self) -> ALint {
        self.calls.set(self.calls.get() + 1);
        ALUT_API_MAJOR_VERSION
    }
    fn minor_version(&self) -> ALint {
        self.calls.set(self.calls.get() + 1);
        ALUT_API_MINOR_VERSION
    }
    fn create_buffer_hello_world(&self) -> ALuint {
        // One second of 16-bit mono.
        self.state().alut_buffer(BufferState {
            frequency: ALUT_FREQUENCY,
            bits: 16,
            channels: 1,
            size: ALUT_FREQUENCY * 2,
        })
    }
    fn create_buffer_from_file(&self, path: &CStr) -> ALuint {
        let mut state = self.state();
        let metadata = path
            .to_str()
            .map_err(|_| ALUT_ERROR_IO_ERROR)
            .and_then(|path| wav_metadata(Path::new(path)));
        match metadata {
            Ok(buffer) => state.alut_buffer(buffer),
            Err(error) => {
                state.alut_error(error);
                0
            }
        }
    }
    fn create_buffer_waveform(
        &self,
        shape: ALenum,
        frequency: ALfloat,
        _phase: ALfloat,
        duration: ALfloat,
    ) -> ALuint {
        let mut state = self.state();
        if !(ALUT_WAVEFORM_SINE..=ALUT_WAVEFORM_IMPULSE).contains(&shape) {
            state.alut_error(ALUT_ERROR_INVALID_ENUM);
            return 0;
        }
        if frequency.is_nan() || frequency <= 0.0 || duration.is_nan() || duration < 0.0 {
            state.alut_error(ALUT_ERROR_INVALID_VALUE);
            return 0;
        }
        let samples = (duration * ALUT_FREQUENCY as ALfloat).round() as ALint;
        state.alut_buffer(BufferState {
            frequency: ALUT_FREQUENCY,
            bits: 16,
            channels: 1,
            size: samples.saturating_mul(2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_sticky_until_fetched() {
        let driver = HeadlessDriver::new();
        driver.source_play(1234);
        driver.enable(0x1234);
        assert_eq!(Driver::get_error(&driver), AL_INVALID_NAME);
        assert_eq!(Driver::get_error(&driver), AL_NO_ERROR);
    }

    #[test]
    fn source_state_machine() {
        let driver = HeadlessDriver::new();
        let mut names = [0; 1];
        driver.gen_sources(&mut names);
        let source = names[0];
        assert_eq!(driver.get_source_i(source, AL_SOURCE_STATE), AL_INITIAL);
        driver.source_stop(source);
        assert_eq!(driver.get_source_i(source, AL_SOURCE_STATE), AL_INITIAL);
        driver.source_play(source);
        driver.source_pause(source);
        assert_eq!(driver.get_source_i(source, AL_SOURCE_STATE), AL_PAUSED);
        driver.source_stop(source);
        assert_eq!(driver.get_source_i(source, AL_SOURCE_STATE), AL_STOPPED);
        driver.source_rewind(source);
        assert_eq!(driver.get_source_i(source, AL_SOURCE_STATE), AL_INITIAL);
        assert_eq!(Driver::get_error(&driver), AL_NO_ERROR);
    }

    #[test]
    fn attached_buffers_cannot_be_deleted() {
        let driver = HeadlessDriver::new();
        let mut buffer = [0; 1];
        let mut source = [0; 1];
        driver.gen_buffers(&mut buffer);
        driver.gen_sources(&mut source);
        driver.source_i(source[0], AL_BUFFER, buffer[0] as ALint);
        driver.delete_buffers(&buffer);
        assert_eq!(Driver::get_error(&driver), AL_INVALID_OPERATION);
        driver.delete_sources(&source);
        driver.delete_buffers(&buffer);
        assert_eq!(Driver::get_error(&driver), AL_NO_ERROR);
        assert_eq!(driver.live_buffers(), 0);
    }

    #[test]
    fn devices_with_contexts_stay_open() {
        let driver = HeadlessDriver::new();
        let device = driver.open_device(None).unwrap();
        let context = driver.create_context(device, &[0]).unwrap();
        assert!(!driver.close_device(device));
        assert_eq!(driver.alc_get_error(Some(device)), ALC_INVALID_DEVICE);
        driver.destroy_context(context);
        assert!(driver.close_device(device));
        assert_eq!(driver.open_devices(), 0);
    }

    #[test]
    fn unknown_device_names_fail() {
        let driver = HeadlessDriver::new();
        let name = std::ffi::CString::new("Nonexistent").unwrap();
        assert_eq!(driver.open_device(Some(&name)), None);
        assert_eq!(driver.alc_get_error(None), ALC_INVALID_VALUE);
    }
}
