/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Macros for diagnostics and terminal output.

/// Write a diagnostic tagged with the calling module's path. Always printed,
/// so keep it for warnings and failures scripts can't see, e.g. a native
/// release that failed inside a finalizer.
macro_rules! log {
    ($($arg:tt)+) => {
        echo!("{}: {}", module_path!(), format_args!($($arg)+));
    }
}

/// [log], but silent unless the calling module is listed in
/// [ENABLED_MODULES]. Meant for chatty tracing such as every entry point call
/// or every native name generated.
macro_rules! log_dbg {
    ($($arg:tt)+) => {
        if $crate::log::ENABLED_MODULES.contains(&module_path!()) {
            log!($($arg)*);
        }
    }
}

/// Print a line to stderr. Everything this crate prints goes through here, so
/// stdout is left to the script.
macro_rules! echo {
    ($($arg:tt)+) => {
        eprintln!($($arg)+)
    };
    () => {
        eprintln!()
    };
}

/// Modules [log_dbg] is enabled for, e.g. "openal_script::abi" to trace
/// every entry point call with its arguments and result.
pub const ENABLED_MODULES: &[&str] = &[];
