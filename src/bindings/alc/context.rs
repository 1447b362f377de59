/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! `ALC::Context`.

use super::device::{Device, OpenDevice};
use crate::abi::{FunctionExports, Nullable};
use crate::bindings::check_alc;
use crate::native::{ContextHandle, Driver};
use crate::objects::{HostObject, Obj};
use crate::{Environment, Error};
use openal_script_sys::alc_types::ALCint;
use std::rc::Rc;

/// A context. Once destroyed, the wrapper stays around (so `destroyed?`
/// works) but refuses everything else.
pub struct Context {
    driver: Rc<dyn Driver>,
    handle: Option<ContextHandle>,
    /// Keeps the device open until the context is gone.
    device: Option<Rc<OpenDevice>>,
    owned: bool,
}
impl HostObject for Context {
    const CLASS_NAME: &'static str = "ALC::Context";
}

fn destroyed() -> Error {
    Error::Alc("context has already been destroyed.".to_string())
}

impl Context {
    /// Create a context on an open device. `attributes` are key/value pairs,
    /// without the terminating zero.
    pub fn new(device: &Device, attributes: &[ALCint]) -> Result<Context, Error> {
        let driver = device.driver();
        let handle = device.opened_handle()?;
        let mut list = Vec::new();
        list.try_reserve_exact(attributes.len() + 1)
            .map_err(|_| Error::NoMemory)?;
        list.extend_from_slice(attributes);
        list.push(0);
        let Some(context) = driver.create_context(handle, &list) else {
            check_alc(&*driver, Some(handle))?;
            return Err(Error::Alc("cannot create context.".to_string()));
        };
        log_dbg!(
            "Created context {:#x} on device {:#x}",
            context.to_bits(),
            handle.to_bits()
        );
        Ok(Context {
            driver,
            handle: Some(context),
            device: device.close_share(),
            owned: true,
        })
    }

    pub fn view(driver: Rc<dyn Driver>, handle: ContextHandle) -> Context {
        Context {
            driver,
            handle: Some(handle),
            device: None,
            owned: false,
        }
    }

    pub fn handle(&self) -> Option<ContextHandle> {
        self.handle
    }

    pub fn is_destroyed(&self) -> bool {
        self.handle.is_none()
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    fn live_handle(&self) -> Result<ContextHandle, Error> {
        self.handle.ok_or_else(destroyed)
    }

    /// Destroy the context. Destroying it again does nothing.
    pub fn destroy(&mut self) -> Result<(), Error> {
        if !self.owned {
            return Err(Error::Argument("cannot destroy a context view".to_string()));
        }
        if let Some(handle) = self.handle.take() {
            release(&*self.driver, handle);
        }
        self.device = None;
        Ok(())
    }

    /// View of the device the context was created on.
    pub fn device(&self) -> Result<Device, Error> {
        let handle = self.live_handle()?;
        match self.driver.contexts_device(handle) {
            Some(device) => Ok(Device::view(self.driver.clone(), device)),
            None => {
                check_alc(&*self.driver, None)?;
                Err(destroyed())
            }
        }
    }

    pub fn process(&self) -> Result<(), Error> {
        self.driver.process_context(self.live_handle()?);
        check_alc(&*self.driver, None)
    }

    pub fn suspend(&self) -> Result<(), Error> {
        self.driver.suspend_context(self.live_handle()?);
        check_alc(&*self.driver, None)
    }

    pub fn make_current(&self) -> Result<bool, Error> {
        Ok(self.driver.make_context_current(Some(self.live_handle()?)))
    }
}

/// Destroy a context, making sure it isn't current first.
fn release(driver: &dyn Driver, handle: ContextHandle) {
    if driver.current_context() == Some(handle) {
        log!(
            "Warning: destroying context {:#x} while it is current",
            handle.to_bits()
        );
        driver.make_context_current(None);
    }
    log_dbg!("Destroying context {:#x}", handle.to_bits());
    driver.destroy_context(handle);
    let code = driver.alc_get_error(None);
    if code != openal_script_sys::ALC_NO_ERROR {
        log!(
            "Warning: destroying context {:#x} failed with ALC error {:#x}",
            handle.to_bits(),
            code
        );
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.filter(|_| self.owned) {
            release(&*self.driver, handle);
        }
        // The device share is dropped after this, so the device can close.
    }
}

fn context_new(
    env: &mut Environment,
    device: Obj<Device>,
    attributes: Option<Vec<ALCint>>,
) -> Result<Obj<Context>, Error> {
    let context = Context::new(
        env.objects.borrow(device)?,
        attributes.as_deref().unwrap_or_default(),
    )?;
    Ok(env.objects.alloc(context))
}

fn context_destroy(env: &mut Environment, this: Obj<Context>) -> Result<(), Error> {
    env.objects.borrow_mut(this)?.destroy()
}

fn context_is_destroyed(env: &mut Environment, this: Obj<Context>) -> Result<bool, Error> {
    Ok(env.objects.borrow(this)?.is_destroyed())
}

fn context_device(env: &mut Environment, this: Obj<Context>) -> Result<Obj<Device>, Error> {
    let device = env.objects.borrow(this)?.device()?;
    Ok(env.objects.alloc(device))
}

fn context_process(env: &mut Environment, this: Obj<Context>) -> Result<(), Error> {
    env.objects.borrow(this)?.process()
}

fn context_suspend(env: &mut Environment, this: Obj<Context>) -> Result<(), Error> {
    env.objects.borrow(this)?.suspend()
}

fn context_current(env: &mut Environment) -> Result<Option<Obj<Context>>, Error> {
    let driver = env.driver();
    let Some(handle) = driver.current_context() else {
        return Ok(None);
    };
    Ok(Some(env.objects.alloc(Context::view(driver, handle))))
}

fn context_current_set(env: &mut Environment, context: Nullable<Obj<Context>>) -> Result<bool, Error> {
    match context.0 {
        Some(context) => env.objects.borrow(context)?.make_current(),
        None => Ok(env.driver().make_context_current(None)),
    }
}

pub const FUNCTIONS: FunctionExports = &[
    export_fn!("ALC::Context.new", context_new(_, _)),
    export_fn!("ALC::Context#destroy", context_destroy(_)),
    export_fn!("ALC::Context#destroyed?", context_is_destroyed(_)),
    export_fn!("ALC::Context#device", context_device(_)),
    export_fn!("ALC::Context#process", context_process(_)),
    export_fn!("ALC::Context#suspend", context_suspend(_)),
    export_fn!("ALC::Context.current", context_current()),
    export_fn!("ALC::Context.current=", context_current_set(_)),
];
