/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Parsing and management of user-configurable options, e.g. which native
//! libraries to load.

use std::path::PathBuf;

/// Name of the environment variable read by [Options::apply_env].
pub const ENV_VAR: &str = "OPENAL_SCRIPT_OPTIONS";

pub const DOCUMENTATION: &str = "\
Native library options:
    --openal-library=...
        Path of the OpenAL shared library to load. By default the usual name
        for the platform is tried (e.g. libopenal.so.1 on Linux, OpenAL32.dll
        on Windows), so this is only needed for a library outside the system
        search path.

    --alut-library=...
        Path of the ALUT (freealut) shared library to load. As above, the
        platform's usual names are tried by default.

    --no-alut
        Don't try to load ALUT at all. The ALUT functions and the convenience
        buffer constructors (AL::Buffer.hello_world and friends) will raise an
        error when called.

    --headless
        Don't load any native library. Handles are tracked in-process and no
        sound is produced. Useful for checking scripts on machines without an
        audio device, and in CI.

Device options:
    --device=...
        Name of the playback device to open, as listed by
        ALC::Device.device_specifier. The default device is used if this is
        not given.

Options can also be given in the OPENAL_SCRIPT_OPTIONS environment variable,
separated by whitespace. Command-line options take precedence.
";

/// Struct containing all user-configurable options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    pub openal_library: Option<PathBuf>,
    pub alut_library: Option<PathBuf>,
    pub alut: bool,
    pub headless: bool,
    pub device: Option<String>,
}

impl Options {
    pub fn new() -> Options {
        Options {
            alut: true,
            ..Default::default()
        }
    }

    /// Parse the command-line argument syntax for an option. Returns `Ok(true)`
    /// if the option was valid and has been applied, and `Ok(false)` if the
    /// option was not recognized.
    pub fn parse_argument(&mut self, arg: &str) -> Result<bool, String> {
        fn parse_path(value: &str, name: &str) -> Result<PathBuf, String> {
            if value.is_empty() {
                return Err(format!("Value for {} is empty", name));
            }
            Ok(PathBuf::from(value))
        }

        if let Some(value) = arg.strip_prefix("--openal-library=") {
            self.openal_library = Some(parse_path(value, "OpenAL library")?);
        } else if let Some(value) = arg.strip_prefix("--alut-library=") {
            self.alut_library = Some(parse_path(value, "ALUT library")?);
        } else if arg == "--no-alut" {
            self.alut = false;
        } else if arg == "--headless" {
            self.headless = true;
        } else if let Some(value) = arg.strip_prefix("--device=") {
            if value.is_empty() {
                return Err("Device name is empty".to_string());
            }
            self.device = Some(value.to_string());
        } else {
            return Ok(false);
        };
        Ok(true)
    }

    /// Apply options from a whitespace-separated string, as found in the
    /// [ENV_VAR] environment variable.
    pub fn apply_string(&mut self, options: &str) -> Result<(), String> {
        for option_arg in options.split_ascii_whitespace() {
            match self.parse_argument(option_arg) {
                Ok(true) => (),
                Ok(false) => return Err(format!("Unknown option {:?}", option_arg)),
                Err(err) => return Err(format!("Invalid option {:?}: {}", option_arg, err)),
            }
        }
        Ok(())
    }

    /// Apply options from the [ENV_VAR] environment variable, if it is set.
    pub fn apply_env(&mut self) -> Result<(), String> {
        match std::env::var(ENV_VAR) {
            Ok(options) => {
                log_dbg!("Using options from {}: {}", ENV_VAR, options);
                self.apply_string(&options)
            }
            Err(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::new();
        assert!(options.alut);
        assert!(!options.headless);
        assert_eq!(options.openal_library, None);
        assert_eq!(options.device, None);
    }

    #[test]
    fn parse() {
        let mut options = Options::new();
        assert_eq!(options.parse_argument("--headless"), Ok(true));
        assert_eq!(options.parse_argument("--no-alut"), Ok(true));
        assert_eq!(
            options.parse_argument("--openal-library=/opt/al/libopenal.so"),
            Ok(true)
        );
        assert_eq!(options.parse_argument("--device=OpenAL Soft"), Ok(true));
        assert_eq!(options.parse_argument("some/script"), Ok(false));

        assert!(options.headless);
        assert!(!options.alut);
        assert_eq!(
            options.openal_library,
            Some(PathBuf::from("/opt/al/libopenal.so"))
        );
        assert_eq!(options.device.as_deref(), Some("OpenAL Soft"));
    }

    #[test]
    fn parse_errors() {
        let mut options = Options::new();
        assert!(options.parse_argument("--alut-library=").is_err());
        assert!(options.parse_argument("--device=").is_err());
        assert!(options.apply_string("--headless --bogus").is_err());
        // Options before the bad one were still applied.
        assert!(options.headless);
    }
}
