/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! `ALC::Device`, a playback device.

use super::specifier_list;
use crate::abi::{FunctionExports, List};
use crate::bindings::check_alc;
use crate::native::{to_c_string, DeviceHandle, Driver};
use crate::objects::{HostObject, Obj};
use crate::value::Value;
use crate::{Environment, Error};
use openal_script_sys::alc_types::*;
use openal_script_sys::{ALC_DEFAULT_DEVICE_SPECIFIER, ALC_DEVICE_SPECIFIER, ALC_INVALID_ENUM};
use std::cell::Cell;
use std::rc::Rc;

/// The duty of closing an open device. The owning [Device] and every
/// [super::Context] created through it hold a share, and the device is closed
/// when the last share goes, unless it was closed explicitly before.
pub(crate) struct OpenDevice {
    driver: Rc<dyn Driver>,
    handle: DeviceHandle,
    closed: Cell<bool>,
}

impl OpenDevice {
    fn close(&self) -> bool {
        if self.closed.get() {
            return true;
        }
        let closed = self.driver.close_device(self.handle);
        self.closed.set(closed);
        closed
    }
}

impl Drop for OpenDevice {
    fn drop(&mut self) {
        if self.closed.get() {
            return;
        }
        log_dbg!("Closing device {:#x}", self.handle.to_bits());
        if !self.close() {
            let code = self.driver.alc_get_error(Some(self.handle));
            log!(
                "Warning: closing device {:#x} failed with ALC error {:#x}",
                self.handle.to_bits(),
                code
            );
        }
    }
}

pub struct Device {
    driver: Rc<dyn Driver>,
    handle: Option<DeviceHandle>,
    /// [None] for views and for devices that aren't open.
    open: Option<Rc<OpenDevice>>,
    owned: bool,
}
impl HostObject for Device {
    const CLASS_NAME: &'static str = "ALC::Device";
}

fn not_opened() -> Error {
    Error::Alc("device is not opened.".to_string())
}

impl Device {
    /// A wrapper with no device open yet.
    pub fn unopened(driver: Rc<dyn Driver>) -> Device {
        Device {
            driver,
            handle: None,
            open: None,
            owned: true,
        }
    }

    /// Open the named device, or the default one for [None].
    pub fn open_new(driver: Rc<dyn Driver>, name: Option<&str>) -> Result<Device, Error> {
        let mut device = Device::unopened(driver);
        device.open(name)?;
        Ok(device)
    }

    /// A device owned by someone else, e.g. the one a context was made on.
    pub fn view(driver: Rc<dyn Driver>, handle: DeviceHandle) -> Device {
        Device {
            driver,
            handle: Some(handle),
            open: None,
            owned: false,
        }
    }

    pub fn handle(&self) -> Option<DeviceHandle> {
        self.handle
    }

    pub(crate) fn driver(&self) -> Rc<dyn Driver> {
        self.driver.clone()
    }

    pub fn is_opened(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub(crate) fn opened_handle(&self) -> Result<DeviceHandle, Error> {
        self.handle.ok_or_else(not_opened)
    }

    /// A share in closing the device, for contexts created on it.
    pub(crate) fn close_share(&self) -> Option<Rc<OpenDevice>> {
        self.open.clone()
    }

    pub fn open(&mut self, name: Option<&str>) -> Result<(), Error> {
        if self.handle.is_some() {
            return Err(Error::Alc("device has already opened.".to_string()));
        }
        let c_name = name.map(to_c_string).transpose()?;
        let Some(handle) = self.driver.open_device(c_name.as_deref()) else {
            let code = self.driver.alc_get_error(None);
            log_dbg!("alcOpenDevice({:?}) failed with {:#x}", name, code);
            return Err(Error::Alc(format!(
                "cannot open device ({}).",
                name.unwrap_or_default()
            )));
        };
        log_dbg!("Opened device {:?} as {:#x}", name, handle.to_bits());
        self.handle = Some(handle);
        self.open = Some(Rc::new(OpenDevice {
            driver: self.driver.clone(),
            handle,
            closed: Cell::new(false),
        }));
        Ok(())
    }

    /// Close the device. Does nothing if it isn't open.
    pub fn close(&mut self) -> Result<(), Error> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        if !self.owned {
            return Err(Error::Argument("cannot close a device view".to_string()));
        }
        let closed = match &self.open {
            Some(open) => open.close(),
            None => self.driver.close_device(handle),
        };
        if !closed {
            check_alc(&*self.driver, Some(handle))?;
            return Err(Error::Alc("cannot close device.".to_string()));
        }
        log_dbg!("Closed device {:#x}", handle.to_bits());
        self.handle = None;
        self.open = None;
        Ok(())
    }

    /// `alcGetError` for this device.
    pub fn error(&self) -> Result<ALCenum, Error> {
        Ok(self.driver.alc_get_error(Some(self.opened_handle()?)))
    }

    pub fn string(&self, param: ALCenum) -> Result<Option<String>, Error> {
        let handle = self.opened_handle()?;
        let string = self.driver.alc_get_string(Some(handle), param);
        check_alc(&*self.driver, Some(handle))?;
        Ok(string)
    }

    pub fn integer(&self, param: ALCenum) -> Result<ALCint, Error> {
        let handle = self.opened_handle()?;
        let mut value = [0];
        self.driver.alc_get_integers(Some(handle), param, &mut value);
        check_alc(&*self.driver, Some(handle))?;
        Ok(value[0])
    }

    pub fn is_extension_present(&self, name: &str) -> Result<bool, Error> {
        let name = to_c_string(name)?;
        let present = self.driver.alc_is_extension_present(self.handle, &name);
        check_alc(&*self.driver, self.handle)?;
        Ok(present)
    }

    pub fn enum_value(&self, name: &str) -> Result<ALCenum, Error> {
        let c_name = to_c_string(name)?;
        let value = self.driver.alc_get_enum_value(self.handle, &c_name);
        check_alc(&*self.driver, self.handle)?;
        if value == ALC_INVALID_ENUM {
            return Err(Error::Alc(format!(
                "no specified enum value ({}) is found.",
                name
            )));
        }
        Ok(value)
    }
}

/// Device names can be given as any string-like value; `nil` means the
/// default device.
fn device_name(name: &Value) -> Result<Option<String>, Error> {
    match name {
        Value::Nil => Ok(None),
        Value::Str(name) => Ok(Some(name.clone())),
        Value::Int(name) => Ok(Some(name.to_string())),
        Value::Float(name) => Ok(Some(name.to_string())),
        _ => Err(Error::Type(
            "given argument cannot be converted to string.".to_string(),
        )),
    }
}

fn device_new(env: &mut Environment, name: Option<Value>) -> Result<Obj<Device>, Error> {
    let device = match name {
        None => Device::unopened(env.driver()),
        Some(name) => Device::open_new(env.driver(), device_name(&name)?.as_deref())?,
    };
    Ok(env.objects.alloc(device))
}

fn device_open(env: &mut Environment, this: Obj<Device>, name: Option<Value>) -> Result<Obj<Device>, Error> {
    let name = match name {
        Some(name) => device_name(&name)?,
        None => None,
    };
    env.objects.borrow_mut(this)?.open(name.as_deref())?;
    Ok(this)
}

fn device_close(env: &mut Environment, this: Obj<Device>) -> Result<Obj<Device>, Error> {
    env.objects.borrow_mut(this)?.close()?;
    Ok(this)
}

fn device_is_opened(env: &mut Environment, this: Obj<Device>) -> Result<bool, Error> {
    Ok(env.objects.borrow(this)?.is_opened())
}

fn device_error(env: &mut Environment, this: Obj<Device>) -> Result<ALCenum, Error> {
    env.objects.borrow(this)?.error()
}

fn device_string(env: &mut Environment, this: Obj<Device>, param: ALCenum) -> Result<Option<String>, Error> {
    env.objects.borrow(this)?.string(param)
}

fn device_integer(env: &mut Environment, this: Obj<Device>, param: ALCenum) -> Result<ALCint, Error> {
    env.objects.borrow(this)?.integer(param)
}

fn device_is_extension_present(env: &mut Environment, this: Obj<Device>, name: String) -> Result<bool, Error> {
    env.objects.borrow(this)?.is_extension_present(&name)
}

fn device_enum_value(env: &mut Environment, this: Obj<Device>, name: String) -> Result<ALCenum, Error> {
    env.objects.borrow(this)?.enum_value(&name)
}

fn device_specifier(env: &mut Environment) -> Result<Option<List<String>>, Error> {
    Ok(specifier_list(&*env.driver(), ALC_DEVICE_SPECIFIER))
}

fn default_device_specifier(env: &mut Environment) -> Result<Option<List<String>>, Error> {
    Ok(specifier_list(&*env.driver(), ALC_DEFAULT_DEVICE_SPECIFIER))
}

pub const FUNCTIONS: FunctionExports = &[
    export_fn!("ALC::Device.new", device_new(_)),
    export_fn!("ALC::Device#open", device_open(_, _)),
    export_fn!("ALC::Device#close", device_close(_)),
    export_fn!("ALC::Device#opened?", device_is_opened(_)),
    export_fn!("ALC::Device#error", device_error(_)),
    export_fn!("ALC::Device#string", device_string(_, _)),
    export_fn!("ALC::Device#integer", device_integer(_, _)),
    export_fn!("ALC::Device#extension_present?", device_is_extension_present(_, _)),
    export_fn!("ALC::Device#enum_value", device_enum_value(_, _)),
    export_fn!("ALC::Device.device_specifier", device_specifier()),
    export_fn!("ALC::Device.default_device_specifier", default_device_specifier()),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_names() {
        assert_eq!(device_name(&Value::Nil), Ok(None));
        assert_eq!(device_name(&Value::from("Speakers")), Ok(Some("Speakers".to_string())));
        assert_eq!(device_name(&Value::Int(2)), Ok(Some("2".to_string())));
        assert!(device_name(&Value::List(vec![])).is_err());
    }
}
