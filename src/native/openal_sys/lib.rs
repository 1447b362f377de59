/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! OpenAL and ALUT C ABI declarations, loaded at runtime.
//!
//! See `AL/al.h`, `AL/alc.h` and `AL/alut.h` for the headers this should
//! mirror.
//!
//! This is separated out into its own package so that the raw ABI surface
//! (which is all `unsafe`) is kept apart from the bindings built on top of it.
//! Nothing is linked at build time: [OpenAl::load] and [Alut::load] open the
//! shared libraries with [libloading] and resolve every symbol up front, so a
//! missing symbol is reported once instead of crashing on first use.

// Symbol fields keep the C names so they can be grepped for.
#![allow(non_snake_case)]

use libloading::Library;
use std::path::{Path, PathBuf};

// === alc.h ===

#[allow(dead_code)]
pub mod alc_types {
    use std::ffi;

    /// Opaque type.
    pub type ALCdevice = ffi::c_void;
    /// Opaque type.
    pub type ALCcontext = ffi::c_void;

    pub type ALCboolean = ffi::c_char;
    pub type ALCchar = ffi::c_char;
    pub type ALCint = ffi::c_int;
    pub type ALCuint = ffi::c_uint;
    pub type ALCsizei = ffi::c_int;
    pub type ALCenum = ffi::c_int;
    pub type ALCvoid = ffi::c_void;
}
use alc_types::*;

pub const ALC_FALSE: ALCboolean = 0;
pub const ALC_TRUE: ALCboolean = 1;

pub const ALC_NO_ERROR: ALCenum = 0;
pub const ALC_INVALID_DEVICE: ALCenum = 0xA001;
pub const ALC_INVALID_CONTEXT: ALCenum = 0xA002;
pub const ALC_INVALID_ENUM: ALCenum = 0xA003;
pub const ALC_INVALID_VALUE: ALCenum = 0xA004;
pub const ALC_OUT_OF_MEMORY: ALCenum = 0xA005;

pub const ALC_MAJOR_VERSION: ALCenum = 0x1000;
pub const ALC_MINOR_VERSION: ALCenum = 0x1001;
pub const ALC_ATTRIBUTES_SIZE: ALCenum = 0x1002;
pub const ALC_ALL_ATTRIBUTES: ALCenum = 0x1003;
pub const ALC_DEFAULT_DEVICE_SPECIFIER: ALCenum = 0x1004;
pub const ALC_DEVICE_SPECIFIER: ALCenum = 0x1005;
pub const ALC_EXTENSIONS: ALCenum = 0x1006;
pub const ALC_FREQUENCY: ALCenum = 0x1007;
pub const ALC_REFRESH: ALCenum = 0x1008;
pub const ALC_SYNC: ALCenum = 0x1009;
pub const ALC_MONO_SOURCES: ALCenum = 0x1010;
pub const ALC_STEREO_SOURCES: ALCenum = 0x1011;

pub const ALC_CAPTURE_DEVICE_SPECIFIER: ALCenum = 0x310;
pub const ALC_CAPTURE_DEFAULT_DEVICE_SPECIFIER: ALCenum = 0x311;
pub const ALC_CAPTURE_SAMPLES: ALCenum = 0x312;

// === al.h ===

#[allow(dead_code)]
pub mod al_types {
    use std::ffi;

    pub type ALboolean = ffi::c_char;
    pub type ALchar = ffi::c_char;
    pub type ALint = ffi::c_int;
    pub type ALuint = ffi::c_uint;
    pub type ALsizei = ffi::c_int;
    pub type ALenum = ffi::c_int;
    pub type ALfloat = ffi::c_float;
    pub type ALdouble = ffi::c_double;
    pub type ALvoid = ffi::c_void;
}
use al_types::*;

pub const AL_NONE: ALenum = 0;
pub const AL_FALSE: ALboolean = 0;
pub const AL_TRUE: ALboolean = 1;

pub const AL_SOURCE_RELATIVE: ALenum = 0x202;
pub const AL_CONE_INNER_ANGLE: ALenum = 0x1001;
pub const AL_CONE_OUTER_ANGLE: ALenum = 0x1002;
pub const AL_PITCH: ALenum = 0x1003;
pub const AL_POSITION: ALenum = 0x1004;
pub const AL_DIRECTION: ALenum = 0x1005;
pub const AL_VELOCITY: ALenum = 0x1006;
pub const AL_LOOPING: ALenum = 0x1007;
pub const AL_BUFFER: ALenum = 0x1009;
pub const AL_GAIN: ALenum = 0x100A;
pub const AL_MIN_GAIN: ALenum = 0x100D;
pub const AL_MAX_GAIN: ALenum = 0x100E;
pub const AL_ORIENTATION: ALenum = 0x100F;

pub const AL_SOURCE_STATE: ALenum = 0x1010;
pub const AL_INITIAL: ALenum = 0x1011;
pub const AL_PLAYING: ALenum = 0x1012;
pub const AL_PAUSED: ALenum = 0x1013;
pub const AL_STOPPED: ALenum = 0x1014;

pub const AL_BUFFERS_QUEUED: ALenum = 0x1015;
pub const AL_BUFFERS_PROCESSED: ALenum = 0x1016;

pub const AL_REFERENCE_DISTANCE: ALenum = 0x1020;
pub const AL_ROLLOFF_FACTOR: ALenum = 0x1021;
pub const AL_CONE_OUTER_GAIN: ALenum = 0x1022;
pub const AL_MAX_DISTANCE: ALenum = 0x1023;
pub const AL_SEC_OFFSET: ALenum = 0x1024;
pub const AL_SAMPLE_OFFSET: ALenum = 0x1025;
pub const AL_BYTE_OFFSET: ALenum = 0x1026;

pub const AL_SOURCE_TYPE: ALenum = 0x1027;
pub const AL_STATIC: ALenum = 0x1028;
pub const AL_STREAMING: ALenum = 0x1029;
pub const AL_UNDETERMINED: ALenum = 0x1030;

pub const AL_FORMAT_MONO8: ALenum = 0x1100;
pub const AL_FORMAT_MONO16: ALenum = 0x1101;
pub const AL_FORMAT_STEREO8: ALenum = 0x1102;
pub const AL_FORMAT_STEREO16: ALenum = 0x1103;

pub const AL_FREQUENCY: ALenum = 0x2001;
pub const AL_BITS: ALenum = 0x2002;
pub const AL_CHANNELS: ALenum = 0x2003;
pub const AL_SIZE: ALenum = 0x2004;

pub const AL_NO_ERROR: ALenum = 0;
pub const AL_INVALID_NAME: ALenum = 0xA001;
pub const AL_INVALID_ENUM: ALenum = 0xA002;
pub const AL_INVALID_VALUE: ALenum = 0xA003;
pub const AL_INVALID_OPERATION: ALenum = 0xA004;
pub const AL_OUT_OF_MEMORY: ALenum = 0xA005;

pub const AL_VENDOR: ALenum = 0xB001;
pub const AL_VERSION: ALenum = 0xB002;
pub const AL_RENDERER: ALenum = 0xB003;
pub const AL_EXTENSIONS: ALenum = 0xB004;

pub const AL_DOPPLER_FACTOR: ALenum = 0xC000;
pub const AL_DOPPLER_VELOCITY: ALenum = 0xC001;
pub const AL_SPEED_OF_SOUND: ALenum = 0xC003;

pub const AL_DISTANCE_MODEL: ALenum = 0xD000;
pub const AL_INVERSE_DISTANCE: ALenum = 0xD001;
pub const AL_INVERSE_DISTANCE_CLAMPED: ALenum = 0xD002;
pub const AL_LINEAR_DISTANCE: ALenum = 0xD003;
pub const AL_LINEAR_DISTANCE_CLAMPED: ALenum = 0xD004;
pub const AL_EXPONENT_DISTANCE: ALenum = 0xD005;
pub const AL_EXPONENT_DISTANCE_CLAMPED: ALenum = 0xD006;

// === alut.h ===

pub const ALUT_API_MAJOR_VERSION: ALint = 1;
pub const ALUT_API_MINOR_VERSION: ALint = 1;

pub const ALUT_ERROR_NO_ERROR: ALenum = 0;
pub const ALUT_ERROR_OUT_OF_MEMORY: ALenum = 0x200;
pub const ALUT_ERROR_INVALID_ENUM: ALenum = 0x201;
pub const ALUT_ERROR_INVALID_VALUE: ALenum = 0x202;
pub const ALUT_ERROR_INVALID_OPERATION: ALenum = 0x203;
pub const ALUT_ERROR_NO_CURRENT_CONTEXT: ALenum = 0x204;
pub const ALUT_ERROR_AL_ERROR_ON_ENTRY: ALenum = 0x205;
pub const ALUT_ERROR_ALC_ERROR_ON_ENTRY: ALenum = 0x206;
pub const ALUT_ERROR_OPEN_DEVICE: ALenum = 0x207;
pub const ALUT_ERROR_CLOSE_DEVICE: ALenum = 0x208;
pub const ALUT_ERROR_CREATE_CONTEXT: ALenum = 0x209;
pub const ALUT_ERROR_MAKE_CONTEXT_CURRENT: ALenum = 0x20A;
pub const ALUT_ERROR_DESTROY_CONTEXT: ALenum = 0x20B;
pub const ALUT_ERROR_GEN_BUFFERS: ALenum = 0x20C;
pub const ALUT_ERROR_BUFFER_DATA: ALenum = 0x20D;
pub const ALUT_ERROR_IO_ERROR: ALenum = 0x20E;
pub const ALUT_ERROR_UNSUPPORTED_FILE_TYPE: ALenum = 0x20F;
pub const ALUT_ERROR_UNSUPPORTED_FILE_SUBTYPE: ALenum = 0x210;
pub const ALUT_ERROR_CORRUPT_OR_TRUNCATED_DATA: ALenum = 0x211;

pub const ALUT_WAVEFORM_SINE: ALenum = 0x100;
pub const ALUT_WAVEFORM_SQUARE: ALenum = 0x101;
pub const ALUT_WAVEFORM_SAWTOOTH: ALenum = 0x102;
pub const ALUT_WAVEFORM_WHITENOISE: ALenum = 0x103;
pub const ALUT_WAVEFORM_IMPULSE: ALenum = 0x104;

// === loading ===

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not load {what} (tried {tried})")]
    NotFound { what: &'static str, tried: String },
    #[error("missing symbol {0} in {1}")]
    MissingSymbol(&'static str, String),
}

#[cfg(windows)]
const OPENAL_CANDIDATES: &[&str] = &["OpenAL32.dll", "soft_oal.dll"];
#[cfg(target_os = "macos")]
const OPENAL_CANDIDATES: &[&str] = &[
    "libopenal.1.dylib",
    "libopenal.dylib",
    "/System/Library/Frameworks/OpenAL.framework/OpenAL",
];
#[cfg(not(any(windows, target_os = "macos")))]
const OPENAL_CANDIDATES: &[&str] = &["libopenal.so.1", "libopenal.so"];

#[cfg(windows)]
const ALUT_CANDIDATES: &[&str] = &["alut.dll", "libalut.dll"];
#[cfg(target_os = "macos")]
const ALUT_CANDIDATES: &[&str] = &["libalut.0.dylib", "libalut.dylib"];
#[cfg(not(any(windows, target_os = "macos")))]
const ALUT_CANDIDATES: &[&str] = &["libalut.so.0", "libalut.so"];

/// Try an explicit path, or otherwise each of the platform's usual names.
fn open_library(
    what: &'static str,
    explicit: Option<&Path>,
    candidates: &[&str],
) -> Result<(Library, PathBuf), LoadError> {
    let paths: Vec<PathBuf> = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => candidates.iter().map(PathBuf::from).collect(),
    };
    for path in &paths {
        // Safety: loading runs the library's initialisers. OpenAL Soft and
        // freealut have no unusual requirements there.
        if let Ok(lib) = unsafe { Library::new(path) } {
            return Ok((lib, path.clone()));
        }
    }
    Err(LoadError::NotFound {
        what,
        tried: paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Declares a struct of function pointers resolved from one [Library].
macro_rules! symbol_table {
    (
        $(#[$meta:meta])*
        pub struct $table:ident ($what:literal, $candidates:ident) {
            $($name:ident: fn($($arg:ty),*) $(-> $ret:ty)?;)*
        }
    ) => {
        $(#[$meta])*
        pub struct $table {
            path: PathBuf,
            $(pub $name: unsafe extern "C" fn($($arg),*) $(-> $ret)?,)*
            // Must stay alive for as long as the pointers above are used.
            _lib: Library,
        }

        impl $table {
            /// Open the library (at `path`, or under its usual names) and
            /// resolve every symbol.
            pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
                let (lib, path) = open_library($what, path, $candidates)?;
                $(
                    // Safety: the signature matches the C header.
                    let $name = unsafe {
                        *lib.get::<unsafe extern "C" fn($($arg),*) $(-> $ret)?>(
                            concat!(stringify!($name), "\0").as_bytes(),
                        )
                        .map_err(|_| LoadError::MissingSymbol(
                            stringify!($name),
                            path.display().to_string(),
                        ))?
                    };
                )*
                Ok($table { path, $($name,)* _lib: lib })
            }

            /// Where the library was loaded from.
            pub fn path(&self) -> &Path {
                &self.path
            }
        }
    };
}

symbol_table! {
    /// Core AL and ALC entry points.
    pub struct OpenAl("OpenAL", OPENAL_CANDIDATES) {
        alcOpenDevice: fn(*const ALCchar) -> *mut ALCdevice;
        alcCloseDevice: fn(*mut ALCdevice) -> ALCboolean;
        alcCreateContext: fn(*mut ALCdevice, *const ALCint) -> *mut ALCcontext;
        alcDestroyContext: fn(*mut ALCcontext);
        alcProcessContext: fn(*mut ALCcontext);
        alcSuspendContext: fn(*mut ALCcontext);
        alcMakeContextCurrent: fn(*mut ALCcontext) -> ALCboolean;
        alcGetCurrentContext: fn() -> *mut ALCcontext;
        alcGetContextsDevice: fn(*mut ALCcontext) -> *mut ALCdevice;
        alcGetError: fn(*mut ALCdevice) -> ALCenum;
        alcGetString: fn(*mut ALCdevice, ALCenum) -> *const ALCchar;
        alcGetIntegerv: fn(*mut ALCdevice, ALCenum, ALCsizei, *mut ALCint);
        alcIsExtensionPresent: fn(*mut ALCdevice, *const ALCchar) -> ALCboolean;
        alcGetEnumValue: fn(*mut ALCdevice, *const ALCchar) -> ALCenum;
        alcCaptureOpenDevice: fn(*const ALCchar, ALCuint, ALCenum, ALCsizei) -> *mut ALCdevice;
        alcCaptureCloseDevice: fn(*mut ALCdevice) -> ALCboolean;
        alcCaptureStart: fn(*mut ALCdevice);
        alcCaptureStop: fn(*mut ALCdevice);
        alcCaptureSamples: fn(*mut ALCdevice, *mut ALCvoid, ALCsizei);

        alGetError: fn() -> ALenum;
        alGetString: fn(ALenum) -> *const ALchar;
        alEnable: fn(ALenum);
        alDisable: fn(ALenum);
        alIsEnabled: fn(ALenum) -> ALboolean;
        alGetBoolean: fn(ALenum) -> ALboolean;
        alGetInteger: fn(ALenum) -> ALint;
        alGetFloat: fn(ALenum) -> ALfloat;
        alIsExtensionPresent: fn(*const ALchar) -> ALboolean;
        alGetEnumValue: fn(*const ALchar) -> ALenum;
        alDopplerFactor: fn(ALfloat);
        alDopplerVelocity: fn(ALfloat);
        alSpeedOfSound: fn(ALfloat);
        alDistanceModel: fn(ALenum);

        alListenerf: fn(ALenum, ALfloat);
        alListenerfv: fn(ALenum, *const ALfloat);
        alGetListenerf: fn(ALenum, *mut ALfloat);
        alGetListenerfv: fn(ALenum, *mut ALfloat);

        alGenBuffers: fn(ALsizei, *mut ALuint);
        alDeleteBuffers: fn(ALsizei, *const ALuint);
        alIsBuffer: fn(ALuint) -> ALboolean;
        alBufferData: fn(ALuint, ALenum, *const ALvoid, ALsizei, ALsizei);
        alGetBufferi: fn(ALuint, ALenum, *mut ALint);

        alGenSources: fn(ALsizei, *mut ALuint);
        alDeleteSources: fn(ALsizei, *const ALuint);
        alIsSource: fn(ALuint) -> ALboolean;
        alSourcef: fn(ALuint, ALenum, ALfloat);
        alSourcefv: fn(ALuint, ALenum, *const ALfloat);
        alSourcei: fn(ALuint, ALenum, ALint);
        alGetSourcef: fn(ALuint, ALenum, *mut ALfloat);
        alGetSourcefv: fn(ALuint, ALenum, *mut ALfloat);
        alGetSourcei: fn(ALuint, ALenum, *mut ALint);
        alSourcePlay: fn(ALuint);
        alSourcePause: fn(ALuint);
        alSourceStop: fn(ALuint);
        alSourceRewind: fn(ALuint);
        alSourceQueueBuffers: fn(ALuint, ALsizei, *const ALuint);
        alSourceUnqueueBuffers: fn(ALuint, ALsizei, *mut ALuint);
    }
}

symbol_table! {
    /// The freealut utility library.
    pub struct Alut("ALUT", ALUT_CANDIDATES) {
        alutInit: fn(*mut std::ffi::c_int, *mut *mut std::ffi::c_char) -> ALboolean;
        alutInitWithoutContext: fn(*mut std::ffi::c_int, *mut *mut std::ffi::c_char) -> ALboolean;
        alutExit: fn() -> ALboolean;
        alutGetError: fn() -> ALenum;
        alutGetErrorString: fn(ALenum) -> *const std::ffi::c_char;
        alutCreateBufferFromFile: fn(*const std::ffi::c_char) -> ALuint;
        alutCreateBufferHelloWorld: fn() -> ALuint;
        alutCreateBufferWaveform: fn(ALenum, ALfloat, ALfloat, ALfloat) -> ALuint;
        alutGetMajorVersion: fn() -> ALint;
        alutGetMinorVersion: fn() -> ALint;
        alutSleep: fn(ALfloat) -> ALboolean;
    }
}
