/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The [Environment]: the registered entry points, the object table and the
//! native driver, bound together.
//!
//! Unlike its siblings, this module should be considered private and only used
//! via the re-exports one level up.

use crate::abi::CallFromScript;
use crate::native::{self, Driver};
use crate::objects::Objects;
use crate::options::Options;
use crate::value::Value;
use crate::{bindings, Error};
use std::collections::HashMap;
use std::rc::Rc;

/// Everything the entry points need. A scripting runtime holds one of these
/// for as long as scripts may call into the bindings.
pub struct Environment {
    pub options: Options,
    pub objects: Objects,
    driver: Rc<dyn Driver>,
    functions: HashMap<&'static str, &'static dyn CallFromScript>,
    constants: HashMap<&'static str, i64>,
}

impl Environment {
    /// Load the native libraries the options ask for (or set up the headless
    /// driver) and register everything.
    pub fn new(options: Options) -> Result<Environment, Error> {
        let driver: Rc<dyn Driver> = Rc::from(native::driver_for_options(&options)?);
        Ok(Environment::with_driver(driver, options))
    }

    /// Like [Environment::new], but with a driver supplied by the caller.
    pub fn with_driver(driver: Rc<dyn Driver>, options: Options) -> Environment {
        let mut functions = HashMap::new();
        for &list in bindings::FUNCTION_LISTS {
            for &(name, function) in list {
                let previous = functions.insert(name, function);
                debug_assert!(previous.is_none(), "{} registered twice", name);
            }
        }
        let mut constants = HashMap::new();
        for &list in bindings::CONSTANT_LISTS {
            for &(name, value) in list {
                let previous = constants.insert(name, value);
                debug_assert!(previous.is_none(), "{} registered twice", name);
            }
        }
        log_dbg!(
            "Registered {} functions and {} constants",
            functions.len(),
            constants.len()
        );
        Environment {
            options,
            objects: Objects::new(),
            driver,
            functions,
            constants,
        }
    }

    pub fn driver(&self) -> Rc<dyn Driver> {
        self.driver.clone()
    }

    /// Call an entry point by name, e.g. `AL::Source#play`. For methods, the
    /// receiver is the first argument.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, Error> {
        let Some(&function) = self.functions.get(name) else {
            return Err(Error::NoMethod(name.to_string()));
        };
        function.call_from_script(self, args)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Names of all entry points, in no particular order.
    pub fn function_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }

    /// Look up a constant, e.g. `AL::Source::PLAYING`.
    pub fn constant(&self, name: &str) -> Option<i64> {
        self.constants.get(name).copied()
    }

    /// Class name of an object value, e.g. `AL::Buffer`.
    pub fn class_of(&self, value: &Value) -> Option<&'static str> {
        value.as_object().and_then(|id| self.objects.class_name(id))
    }

    /// Finalize an object: drop it, releasing its native resource if it owns
    /// one. Returns `false` (and does nothing) if the value isn't a live
    /// object.
    pub fn release(&mut self, value: &Value) -> bool {
        match value.as_object() {
            Some(id) => self.objects.release(id),
            None => false,
        }
    }

    /// Release every remaining object, newest first. The environment stays
    /// usable afterwards.
    pub fn shutdown(&mut self) {
        if !self.objects.is_empty() {
            log_dbg!("Shutting down with {} live objects", self.objects.len());
        }
        self.objects.release_all();
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        self.shutdown();
    }
}
