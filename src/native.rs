/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The seam between the bindings and the native OpenAL implementation.
//!
//! The bindings never touch `openal_script_sys` directly. Everything goes
//! through the [Driver] trait, which is a safe, slice-based restatement of
//! the C API. [LoadedDriver] forwards to the real libraries; [HeadlessDriver]
//! keeps track of handles and parameters in-process so scripts can run with
//! no audio hardware (and so the bindings can be tested).

mod headless;

pub use headless::HeadlessDriver;

use crate::options::Options;
use crate::Error;
use openal_script_sys::al_types::*;
use openal_script_sys::alc_types::*;
use openal_script_sys::{Alut, OpenAl, AL_TRUE, ALC_TRUE};
use std::ffi::{c_char, CStr, CString};
use std::ptr::{null, null_mut};

/// Opaque native device handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceHandle(usize);

/// Opaque native context handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContextHandle(usize);

impl DeviceHandle {
    pub fn from_bits(bits: usize) -> Option<Self> {
        (bits != 0).then_some(DeviceHandle(bits))
    }
    pub fn to_bits(self) -> usize {
        self.0
    }
    fn from_ptr(ptr: *mut ALCdevice) -> Option<Self> {
        Self::from_bits(ptr as usize)
    }
    fn as_ptr(self) -> *mut ALCdevice {
        self.0 as *mut ALCdevice
    }
}

impl ContextHandle {
    pub fn from_bits(bits: usize) -> Option<Self> {
        (bits != 0).then_some(ContextHandle(bits))
    }
    pub fn to_bits(self) -> usize {
        self.0
    }
    fn from_ptr(ptr: *mut ALCcontext) -> Option<Self> {
        Self::from_bits(ptr as usize)
    }
    fn as_ptr(self) -> *mut ALCcontext {
        self.0 as *mut ALCcontext
    }
}

fn device_ptr(device: Option<DeviceHandle>) -> *mut ALCdevice {
    device.map_or(null_mut(), DeviceHandle::as_ptr)
}

/// The AL, ALC and capture API, minus the raw pointers.
///
/// Slices stand in for pointer/count pairs. String results are copied out
/// immediately, since the library owns that memory.
pub trait Driver {
    // === AL global state ===

    fn get_error(&self) -> ALenum;
    fn get_string(&self, param: ALenum) -> Option<String>;
    fn enable(&self, capability: ALenum);
    fn disable(&self, capability: ALenum);
    fn is_enabled(&self, capability: ALenum) -> bool;
    fn get_boolean(&self, param: ALenum) -> bool;
    fn get_integer(&self, param: ALenum) -> ALint;
    fn get_float(&self, param: ALenum) -> ALfloat;
    fn is_extension_present(&self, name: &CStr) -> bool;
    fn get_enum_value(&self, name: &CStr) -> ALenum;
    fn doppler_factor(&self, value: ALfloat);
    fn doppler_velocity(&self, value: ALfloat);
    fn speed_of_sound(&self, value: ALfloat);
    fn distance_model(&self, model: ALenum);

    // === Listener ===

    fn listener_f(&self, param: ALenum, value: ALfloat);
    fn listener_fv(&self, param: ALenum, values: &[ALfloat]);
    fn get_listener_f(&self, param: ALenum) -> ALfloat;
    fn get_listener_fv(&self, param: ALenum, values: &mut [ALfloat]);

    // === Buffers ===

    fn gen_buffers(&self, names: &mut [ALuint]);
    fn delete_buffers(&self, names: &[ALuint]);
    fn is_buffer(&self, name: ALuint) -> bool;
    fn buffer_data(&self, name: ALuint, format: ALenum, data: &[u8], frequency: ALsizei);
    fn get_buffer_i(&self, name: ALuint, param: ALenum) -> ALint;

    // === Sources ===

    fn gen_sources(&self, names: &mut [ALuint]);
    fn delete_sources(&self, names: &[ALuint]);
    fn is_source(&self, name: ALuint) -> bool;
    fn source_f(&self, name: ALuint, param: ALenum, value: ALfloat);
    fn source_fv(&self, name: ALuint, param: ALenum, values: &[ALfloat]);
    fn source_i(&self, name: ALuint, param: ALenum, value: ALint);
    fn get_source_f(&self, name: ALuint, param: ALenum) -> ALfloat;
    fn get_source_fv(&self, name: ALuint, param: ALenum, values: &mut [ALfloat]);
    fn get_source_i(&self, name: ALuint, param: ALenum) -> ALint;
    fn source_play(&self, name: ALuint);
    fn source_pause(&self, name: ALuint);
    fn source_stop(&self, name: ALuint);
    fn source_rewind(&self, name: ALuint);
    fn source_queue_buffers(&self, name: ALuint, buffers: &[ALuint]);
    fn source_unqueue_buffers(&self, name: ALuint, buffers: &mut [ALuint]);

    // === ALC ===

    fn open_device(&self, name: Option<&CStr>) -> Option<DeviceHandle>;
    fn close_device(&self, device: DeviceHandle) -> bool;
    /// `attributes` must already end with the zero sentinel.
    fn create_context(&self, device: DeviceHandle, attributes: &[ALCint]) -> Option<ContextHandle>;
    fn destroy_context(&self, context: ContextHandle);
    fn process_context(&self, context: ContextHandle);
    fn suspend_context(&self, context: ContextHandle);
    fn make_context_current(&self, context: Option<ContextHandle>) -> bool;
    fn current_context(&self) -> Option<ContextHandle>;
    fn contexts_device(&self, context: ContextHandle) -> Option<DeviceHandle>;
    fn alc_get_error(&self, device: Option<DeviceHandle>) -> ALCenum;
    fn alc_get_string(&self, device: Option<DeviceHandle>, param: ALCenum) -> Option<String>;
    /// Like [Driver::alc_get_string], but for the specifier list queries that
    /// return several null-terminated names followed by an empty one. The
    /// raw bytes are returned, including every terminator.
    fn alc_get_string_list(&self, param: ALCenum) -> Option<Vec<u8>>;
    fn alc_get_integers(&self, device: Option<DeviceHandle>, param: ALCenum, values: &mut [ALCint]);
    fn alc_is_extension_present(&self, device: Option<DeviceHandle>, name: &CStr) -> bool;
    fn alc_get_enum_value(&self, device: Option<DeviceHandle>, name: &CStr) -> ALCenum;

    // === Capture ===

    fn capture_open_device(
        &self,
        name: Option<&CStr>,
        frequency: ALCuint,
        format: ALCenum,
        buffer_size: ALCsizei,
    ) -> Option<DeviceHandle>;
    fn capture_close_device(&self, device: DeviceHandle) -> bool;
    fn capture_start(&self, device: DeviceHandle);
    fn capture_stop(&self, device: DeviceHandle);
    /// `buffer` must hold at least `samples` frames of the device's format.
    fn capture_samples(&self, device: DeviceHandle, buffer: &mut [u8], samples: ALCsizei);

    /// The ALUT utility layer, if it was loaded.
    fn alut(&self) -> Option<&dyn AlutDriver>;
}

/// The ALUT API, minus the raw pointers.
pub trait AlutDriver {
    fn init(&self) -> bool;
    fn init_without_context(&self) -> bool;
    fn exit(&self) -> bool;
    fn sleep(&self, duration: ALfloat) -> bool;
    fn get_error(&self) -> ALenum;
    fn get_error_string(&self, error: ALenum) -> String;
    fn major_version(&self) -> ALint;
    fn minor_version(&self) -> ALint;
    fn create_buffer_hello_world(&self) -> ALuint;
    fn create_buffer_from_file(&self, path: &CStr) -> ALuint;
    fn create_buffer_waveform(
        &self,
        shape: ALenum,
        frequency: ALfloat,
        phase: ALfloat,
        duration: ALfloat,
    ) -> ALuint;
}

/// Pick and set up the driver the options ask for.
pub fn driver_for_options(options: &Options) -> Result<Box<dyn Driver>, Error> {
    if options.headless {
        log_dbg!("Using headless driver");
        return Ok(Box::new(if options.alut {
            HeadlessDriver::new()
        } else {
            HeadlessDriver::without_alut()
        }));
    }
    Ok(Box::new(LoadedDriver::load(options)?))
}

/// Driver for a runtime-loaded OpenAL implementation (usually OpenAL Soft),
/// plus freealut if available.
pub struct LoadedDriver {
    al: OpenAl,
    alut: Option<LoadedAlut>,
}

struct LoadedAlut(Alut);

impl LoadedDriver {
    pub fn load(options: &Options) -> Result<LoadedDriver, Error> {
        let al = OpenAl::load(options.openal_library.as_deref())?;
        log_dbg!("Loaded OpenAL from {}", al.path().display());
        let alut = if options.alut {
            match Alut::load(options.alut_library.as_deref()) {
                Ok(alut) => {
                    log_dbg!("Loaded ALUT from {}", alut.path().display());
                    Some(LoadedAlut(alut))
                }
                // ALUT is optional, but asking for a specific one and not
                // getting it is an error.
                Err(e) if options.alut_library.is_some() => return Err(e.into()),
                Err(e) => {
                    log!("Warning: {}. ALUT functions will be unavailable.", e);
                    None
                }
            }
        } else {
            None
        };
        Ok(LoadedDriver { al, alut })
    }
}

/// Clamp a slice length to what fits in an `ALsizei`. Callers pass the clamped
/// count together with the slice pointer, so the library never sees more
/// elements than the slice has.
fn sizei(len: usize) -> ALsizei {
    len.min(ALsizei::MAX as usize) as ALsizei
}

/// Copy a library-owned C string.
///
/// Safety: `ptr` must be null or point to a null-terminated string.
unsafe fn copy_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Copy a library-owned specifier list, including all of its terminators.
///
/// Safety: `ptr` must be null or point to a list of null-terminated strings
/// ended by an empty string.
unsafe fn copy_string_list(ptr: *const c_char) -> Option<Vec<u8>> {
    if ptr.is_null() {
        return None;
    }
    let mut bytes = Vec::new();
    let mut cursor = ptr;
    loop {
        let entry = CStr::from_ptr(cursor);
        bytes.extend_from_slice(entry.to_bytes_with_nul());
        let len = entry.to_bytes().len();
        if len == 0 {
            break;
        }
        cursor = cursor.add(len + 1);
    }
    Some(bytes)
}

fn c_str_ptr(name: Option<&CStr>) -> *const c_char {
    name.map_or(null(), CStr::as_ptr)
}

// Safety (applies to every block below): the function pointers come from a
// successfully loaded library with the signatures in alc.h/al.h, and every
// pointer passed is either null where the API allows it or derived from a
// slice whose length is passed alongside it.
impl Driver for LoadedDriver {
    fn get_error(&self) -> ALenum {
        unsafe { (self.al.alGetError)() }
    }
    fn get_string(&self, param: ALenum) -> Option<String> {
        unsafe { copy_string((self.al.alGetString)(param)) }
    }
    fn enable(&self, capability: ALenum) {
        unsafe { (self.al.alEnable)(capability) }
    }
    fn disable(&self, capability: ALenum) {
        unsafe { (self.al.alDisable)(capability) }
    }
    fn is_enabled(&self, capability: ALenum) -> bool {
        unsafe { (self.al.alIsEnabled)(capability) == AL_TRUE }
    }
    fn get_boolean(&self, param: ALenum) -> bool {
        unsafe { (self.al.alGetBoolean)(param) == AL_TRUE }
    }
    fn get_integer(&self, param: ALenum) -> ALint {
        unsafe { (self.al.alGetInteger)(param) }
    }
    fn get_float(&self, param: ALenum) -> ALfloat {
        unsafe { (self.al.alGetFloat)(param) }
    }
    fn is_extension_present(&self, name: &CStr) -> bool {
        unsafe { (self.al.alIsExtensionPresent)(name.as_ptr()) == AL_TRUE }
    }
    fn get_enum_value(&self, name: &CStr) -> ALenum {
        unsafe { (self.al.alGetEnumValue)(name.as_ptr()) }
    }
    fn doppler_factor(&self, value: ALfloat) {
        unsafe { (self.al.alDopplerFactor)(value) }
    }
    fn doppler_velocity(&self, value: ALfloat) {
        unsafe { (self.al.alDopplerVelocity)(value) }
    }
    fn speed_of_sound(&self, value: ALfloat) {
        unsafe { (self.al.alSpeedOfSound)(value) }
    }
    fn distance_model(&self, model: ALenum) {
        unsafe { (self.al.alDistanceModel)(model) }
    }

    fn listener_f(&self, param: ALenum, value: ALfloat) {
        unsafe { (self.al.alListenerf)(param, value) }
    }
    fn listener_fv(&self, param: ALenum, values: &[ALfloat]) {
        unsafe { (self.al.alListenerfv)(param, values.as_ptr()) }
    }
    fn get_listener_f(&self, param: ALenum) -> ALfloat {
        let mut value = 0.0;
        unsafe { (self.al.alGetListenerf)(param, &mut value) };
        value
    }
    fn get_listener_fv(&self, param: ALenum, values: &mut [ALfloat]) {
        unsafe { (self.al.alGetListenerfv)(param, values.as_mut_ptr()) }
    }

    fn gen_buffers(&self, names: &mut [ALuint]) {
        unsafe { (self.al.alGenBuffers)(sizei(names.len()), names.as_mut_ptr()) }
    }
    fn delete_buffers(&self, names: &[ALuint]) {
        unsafe { (self.al.alDeleteBuffers)(sizei(names.len()), names.as_ptr()) }
    }
    fn is_buffer(&self, name: ALuint) -> bool {
        unsafe { (self.al.alIsBuffer)(name) == AL_TRUE }
    }
    fn buffer_data(&self, name: ALuint, format: ALenum, data: &[u8], frequency: ALsizei) {
        unsafe {
            (self.al.alBufferData)(
                name,
                format,
                data.as_ptr().cast(),
                sizei(data.len()),
                frequency,
            )
        }
    }
    fn get_buffer_i(&self, name: ALuint, param: ALenum) -> ALint {
        let mut value = 0;
        unsafe { (self.al.alGetBufferi)(name, param, &mut value) };
        value
    }

    fn gen_sources(&self, names: &mut [ALuint]) {
        unsafe { (self.al.alGenSources)(sizei(names.len()), names.as_mut_ptr()) }
    }
    fn delete_sources(&self, names: &[ALuint]) {
        unsafe { (self.al.alDeleteSources)(sizei(names.len()), names.as_ptr()) }
    }
    fn is_source(&self, name: ALuint) -> bool {
        unsafe { (self.al.alIsSource)(name) == AL_TRUE }
    }
    fn source_f(&self, name: ALuint, param: ALenum, value: ALfloat) {
        unsafe { (self.al.alSourcef)(name, param, value) }
    }
    fn source_fv(&self, name: ALuint, param: ALenum, values: &[ALfloat]) {
        unsafe { (self.al.alSourcefv)(name, param, values.as_ptr()) }
    }
    fn source_i(&self, name: ALuint, param: ALenum, value: ALint) {
        unsafe { (self.al.alSourcei)(name, param, value) }
    }
    fn get_source_f(&self, name: ALuint, param: ALenum) -> ALfloat {
        let mut value = 0.0;
        unsafe { (self.al.alGetSourcef)(name, param, &mut value) };
        value
    }
    fn get_source_fv(&self, name: ALuint, param: ALenum, values: &mut [ALfloat]) {
        unsafe { (self.al.alGetSourcefv)(name, param, values.as_mut_ptr()) }
    }
    fn get_source_i(&self, name: ALuint, param: ALenum) -> ALint {
        let mut value = 0;
        unsafe { (self.al.alGetSourcei)(name, param, &mut value) };
        value
    }
    fn source_play(&self, name: ALuint) {
        unsafe { (self.al.alSourcePlay)(name) }
    }
    fn source_pause(&self, name: ALuint) {
        unsafe { (self.al.alSourcePause)(name) }
    }
    fn source_stop(&self, name: ALuint) {
        unsafe { (self.al.alSourceStop)(name) }
    }
    fn source_rewind(&self, name: ALuint) {
        unsafe { (self.al.alSourceRewind)(name) }
    }
    fn source_queue_buffers(&self, name: ALuint, buffers: &[ALuint]) {
        unsafe { (self.al.alSourceQueueBuffers)(name, sizei(buffers.len()), buffers.as_ptr()) }
    }
    fn source_unqueue_buffers(&self, name: ALuint, buffers: &mut [ALuint]) {
        unsafe {
            (self.al.alSourceUnqueueBuffers)(name, sizei(buffers.len()), buffers.as_mut_ptr())
        }
    }

    fn open_device(&self, name: Option<&CStr>) -> Option<DeviceHandle> {
        DeviceHandle::from_ptr(unsafe { (self.al.alcOpenDevice)(c_str_ptr(name)) })
    }
    fn close_device(&self, device: DeviceHandle) -> bool {
        unsafe { (self.al.alcCloseDevice)(device.as_ptr()) == ALC_TRUE }
    }
    fn create_context(&self, device: DeviceHandle, attributes: &[ALCint]) -> Option<ContextHandle> {
        debug_assert_eq!(attributes.last(), Some(&0));
        ContextHandle::from_ptr(unsafe {
            (self.al.alcCreateContext)(device.as_ptr(), attributes.as_ptr())
        })
    }
    fn destroy_context(&self, context: ContextHandle) {
        unsafe { (self.al.alcDestroyContext)(context.as_ptr()) }
    }
    fn process_context(&self, context: ContextHandle) {
        unsafe { (self.al.alcProcessContext)(context.as_ptr()) }
    }
    fn suspend_context(&self, context: ContextHandle) {
        unsafe { (self.al.alcSuspendContext)(context.as_ptr()) }
    }
    fn make_context_current(&self, context: Option<ContextHandle>) -> bool {
        let ptr = context.map_or(null_mut(), ContextHandle::as_ptr);
        unsafe { (self.al.alcMakeContextCurrent)(ptr) == ALC_TRUE }
    }
    fn current_context(&self) -> Option<ContextHandle> {
        ContextHandle::from_ptr(unsafe { (self.al.alcGetCurrentContext)() })
    }
    fn contexts_device(&self, context: ContextHandle) -> Option<DeviceHandle> {
        DeviceHandle::from_ptr(unsafe { (self.al.alcGetContextsDevice)(context.as_ptr()) })
    }
    fn alc_get_error(&self, device: Option<DeviceHandle>) -> ALCenum {
        unsafe { (self.al.alcGetError)(device_ptr(device)) }
    }
    fn alc_get_string(&self, device: Option<DeviceHandle>, param: ALCenum) -> Option<String> {
        unsafe { copy_string((self.al.alcGetString)(device_ptr(device), param)) }
    }
    fn alc_get_string_list(&self, param: ALCenum) -> Option<Vec<u8>> {
        unsafe { copy_string_list((self.al.alcGetString)(null_mut(), param)) }
    }
    fn alc_get_integers(&self, device: Option<DeviceHandle>, param: ALCenum, values: &mut [ALCint]) {
        unsafe {
            (self.al.alcGetIntegerv)(
                device_ptr(device),
                param,
                sizei(values.len()),
                values.as_mut_ptr(),
            )
        }
    }
    fn alc_is_extension_present(&self, device: Option<DeviceHandle>, name: &CStr) -> bool {
        unsafe { (self.al.alcIsExtensionPresent)(device_ptr(device), name.as_ptr()) == ALC_TRUE }
    }
    fn alc_get_enum_value(&self, device: Option<DeviceHandle>, name: &CStr) -> ALCenum {
        unsafe { (self.al.alcGetEnumValue)(device_ptr(device), name.as_ptr()) }
    }

    fn capture_open_device(
        &self,
        name: Option<&CStr>,
        frequency: ALCuint,
        format: ALCenum,
        buffer_size: ALCsizei,
    ) -> Option<DeviceHandle> {
        DeviceHandle::from_ptr(unsafe {
            (self.al.alcCaptureOpenDevice)(c_str_ptr(name), frequency, format, buffer_size)
        })
    }
    fn capture_close_device(&self, device: DeviceHandle) -> bool {
        unsafe { (self.al.alcCaptureCloseDevice)(device.as_ptr()) == ALC_TRUE }
    }
    fn capture_start(&self, device: DeviceHandle) {
        unsafe { (self.al.alcCaptureStart)(device.as_ptr()) }
    }
    fn capture_stop(&self, device: DeviceHandle) {
        unsafe { (self.al.alcCaptureStop)(device.as_ptr()) }
    }
    fn capture_samples(&self, device: DeviceHandle, buffer: &mut [u8], samples: ALCsizei) {
        unsafe { (self.al.alcCaptureSamples)(device.as_ptr(), buffer.as_mut_ptr().cast(), samples) }
    }

    fn alut(&self) -> Option<&dyn AlutDriver> {
        self.alut.as_ref().map(|alut| alut as &dyn AlutDriver)
    }
}

impl AlutDriver for LoadedAlut {
    fn init(&self) -> bool {
        unsafe { (self.0.alutInit)(null_mut(), null_mut()) == AL_TRUE }
    }
    fn init_without_context(&self) -> bool {
        unsafe { (self.0.alutInitWithoutContext)(null_mut(), null_mut()) == AL_TRUE }
    }
    fn exit(&self) -> bool {
        unsafe { (self.0.alutExit)() == AL_TRUE }
    }
    fn sleep(&self, duration: ALfloat) -> bool {
        unsafe { (self.0.alutSleep)(duration) == AL_TRUE }
    }
    fn get_error(&self) -> ALenum {
        unsafe { (self.0.alutGetError)() }
    }
    fn get_error_string(&self, error: ALenum) -> String {
        unsafe { copy_string((self.0.alutGetErrorString)(error)) }.unwrap_or_default()
    }
    fn major_version(&self) -> ALint {
        unsafe { (self.0.alutGetMajorVersion)() }
    }
    fn minor_version(&self) -> ALint {
        unsafe { (self.0.alutGetMinorVersion)() }
    }
    fn create_buffer_hello_world(&self) -> ALuint {
        unsafe { (self.0.alutCreateBufferHelloWorld)() }
    }
    fn create_buffer_from_file(&self, path: &CStr) -> ALuint {
        unsafe { (self.0.alutCreateBufferFromFile)(path.as_ptr()) }
    }
    fn create_buffer_waveform(
        &self,
        shape: ALenum,
        frequency: ALfloat,
        phase: ALfloat,
        duration: ALfloat,
    ) -> ALuint {
        unsafe { (self.0.alutCreateBufferWaveform)(shape, frequency, phase, duration) }
    }
}

/// Channel count and bits per sample of a PCM format, for the four formats
/// core AL defines.
pub fn format_layout(format: ALenum) -> Option<(u16, u16)> {
    use openal_script_sys::{
        AL_FORMAT_MONO16, AL_FORMAT_MONO8, AL_FORMAT_STEREO16, AL_FORMAT_STEREO8,
    };
    match format {
        AL_FORMAT_MONO8 => Some((1, 8)),
        AL_FORMAT_MONO16 => Some((1, 16)),
        AL_FORMAT_STEREO8 => Some((2, 8)),
        AL_FORMAT_STEREO16 => Some((2, 16)),
        _ => None,
    }
}

/// Bytes per sample frame of a PCM format.
pub fn frame_size(format: ALenum) -> Option<usize> {
    format_layout(format).map(|(channels, bits)| usize::from(channels * bits / 8))
}

/// Convert a script string for a native call.
pub fn to_c_string(string: &str) -> Result<CString, Error> {
    CString::new(string).map_err(|_| Error::Argument("string contains null byte".to_string()))
}
