/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The error type raised into scripts.

use openal_script_sys::LoadError;

/// An error raised by an entry point. Every variant corresponds to one
/// scripting error class, see [Error::class_name].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// An AL (or ALUT) error code, with the library's description of it.
    #[error("{0}")]
    Al(String),
    /// An ALC error code, with the library's description of it.
    #[error("{0}")]
    Alc(String),
    #[error("insufficient memory.")]
    NoMemory,
    #[error("{0}")]
    Argument(String),
    #[error("{0}")]
    Type(String),
    #[error("{0}")]
    Index(String),
    /// An integer that doesn't fit the native parameter type.
    #[error("{0}")]
    Range(String),
    #[error("undefined method '{0}'")]
    NoMethod(String),
    #[error("{0}")]
    Io(String),
    /// A native library couldn't be loaded or lacks a symbol.
    #[error("{0}")]
    Library(String),
}

impl Error {
    /// Name of the scripting error class this is raised as.
    pub fn class_name(&self) -> &'static str {
        match self {
            Error::Al(_) => "AL::ALError",
            Error::Alc(_) => "ALC::ALCError",
            Error::NoMemory | Error::Library(_) => "RuntimeError",
            Error::Argument(_) => "ArgumentError",
            Error::Type(_) => "TypeError",
            Error::Index(_) => "IndexError",
            Error::Range(_) => "RangeError",
            Error::NoMethod(_) => "NoMethodError",
            Error::Io(_) => "IOError",
        }
    }

    pub(crate) fn arity(given: usize, expected: &str) -> Error {
        Error::Argument(format!(
            "wrong number of arguments (given {}, expected {})",
            given, expected
        ))
    }
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Error {
        Error::Library(err.to_string())
    }
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Error {
        Error::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names() {
        assert_eq!(Error::Al("Invalid Name".into()).class_name(), "AL::ALError");
        assert_eq!(Error::Alc("Invalid Device".into()).class_name(), "ALC::ALCError");
        assert_eq!(Error::NoMemory.class_name(), "RuntimeError");
        assert_eq!(Error::NoMemory.to_string(), "insufficient memory.");
        assert_eq!(Error::Index("x".into()).class_name(), "IndexError");
        assert_eq!(Error::Range("x".into()).class_name(), "RangeError");
    }
}
