/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! `ALC::CaptureDevice`, a recording device.

use super::specifier_list;
use crate::abi::{FunctionExports, List, Nullable};
use crate::bindings::check_alc;
use crate::bindings::common::SampleBuffer;
use crate::native::{frame_size, to_c_string, DeviceHandle, Driver};
use crate::objects::{HostObject, Obj};
use crate::{Environment, Error};
use openal_script_sys::alc_types::*;
use openal_script_sys::{
    ALC_CAPTURE_DEFAULT_DEVICE_SPECIFIER, ALC_CAPTURE_DEVICE_SPECIFIER, ALC_CAPTURE_SAMPLES,
};
use std::rc::Rc;

/// A capture device, with the parameters it was opened with.
pub struct CaptureDevice {
    driver: Rc<dyn Driver>,
    handle: Option<DeviceHandle>,
    frequency: ALCuint,
    format: ALCenum,
    /// Size of the device's ring buffer, in sample frames.
    buffer_size: ALCsizei,
}
impl HostObject for CaptureDevice {
    const CLASS_NAME: &'static str = "ALC::CaptureDevice";
}

fn no_device() -> Error {
    Error::Alc("no device is opened.".to_string())
}

impl CaptureDevice {
    pub fn unopened(driver: Rc<dyn Driver>) -> CaptureDevice {
        CaptureDevice {
            driver,
            handle: None,
            frequency: 0,
            format: 0,
            buffer_size: 0,
        }
    }

    pub fn open_new(
        driver: Rc<dyn Driver>,
        name: Option<&str>,
        frequency: ALCuint,
        format: ALCenum,
        buffer_size: ALCsizei,
    ) -> Result<CaptureDevice, Error> {
        let mut device = CaptureDevice::unopened(driver);
        device.open(name, frequency, format, buffer_size)?;
        Ok(device)
    }

    pub fn handle(&self) -> Option<DeviceHandle> {
        self.handle
    }
    pub fn is_opened(&self) -> bool {
        self.handle.is_some()
    }
    pub fn frequency(&self) -> ALCuint {
        self.frequency
    }
    pub fn format(&self) -> ALCenum {
        self.format
    }
    pub fn buffer_size(&self) -> ALCsizei {
        self.buffer_size
    }

    fn opened_handle(&self) -> Result<DeviceHandle, Error> {
        self.handle.ok_or_else(no_device)
    }

    pub fn open(
        &mut self,
        name: Option<&str>,
        frequency: ALCuint,
        format: ALCenum,
        buffer_size: ALCsizei,
    ) -> Result<(), Error> {
        if self.handle.is_some() {
            return Err(Error::Alc(
                "capture device has already been opened.".to_string(),
            ));
        }
        let c_name = name.map(to_c_string).transpose()?;
        let handle = self
            .driver
            .capture_open_device(c_name.as_deref(), frequency, format, buffer_size);
        let Some(handle) = handle else {
            let code = self.driver.alc_get_error(None);
            log_dbg!("alcCaptureOpenDevice({:?}) failed with {:#x}", name, code);
            return Err(Error::Alc(format!(
                "cannot open capture device ({}).",
                name.unwrap_or_default()
            )));
        };
        log_dbg!(
            "Opened capture device {:?} as {:#x} ({} Hz, format {:#x}, {} samples)",
            name,
            handle.to_bits(),
            frequency,
            format,
            buffer_size
        );
        self.handle = Some(handle);
        self.frequency = frequency;
        self.format = format;
        self.buffer_size = buffer_size;
        Ok(())
    }

    /// Close the device. Does nothing if it isn't open.
    pub fn close(&mut self) -> Result<(), Error> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        if !self.driver.capture_close_device(handle) {
            check_alc(&*self.driver, Some(handle))?;
            return Err(Error::Alc("cannot close capture device.".to_string()));
        }
        log_dbg!("Closed capture device {:#x}", handle.to_bits());
        self.handle = None;
        Ok(())
    }

    pub fn start(&self) -> Result<(), Error> {
        let handle = self.opened_handle()?;
        self.driver.capture_start(handle);
        check_alc(&*self.driver, Some(handle))
    }

    pub fn stop(&self) -> Result<(), Error> {
        let handle = self.opened_handle()?;
        self.driver.capture_stop(handle);
        check_alc(&*self.driver, Some(handle))
    }

    /// Number of sample frames ready to be pulled.
    pub fn available_samples(&self) -> Result<ALCint, Error> {
        let handle = self.opened_handle()?;
        let mut value = [0];
        self.driver
            .alc_get_integers(Some(handle), ALC_CAPTURE_SAMPLES, &mut value);
        check_alc(&*self.driver, Some(handle))?;
        Ok(value[0])
    }

    pub fn error(&self) -> Result<ALCenum, Error> {
        Ok(self.driver.alc_get_error(Some(self.opened_handle()?)))
    }

    /// Pull captured samples into `buffer`; see [pull_samples].
    pub fn samples(&self, buffer: &mut SampleBuffer, count: Option<usize>) -> Result<usize, Error> {
        pull_samples(&*self.driver, self.opened_handle()?, self.format, buffer, count)
    }
}

/// Pull `count` sample frames (by default, as many as fit) into `buffer`,
/// replacing its contents. Returns the number of bytes now filled.
fn pull_samples(
    driver: &dyn Driver,
    handle: DeviceHandle,
    format: ALCenum,
    buffer: &mut SampleBuffer,
    count: Option<usize>,
) -> Result<usize, Error> {
    let bytes_per_sample = frame_size(format).ok_or_else(|| {
        Error::Alc("capture device is opened as unsupported format.".to_string())
    })?;
    let fits = buffer.capacity() / bytes_per_sample;
    let count = match count {
        Some(count) if count > fits => {
            return Err(Error::Argument(
                "too many sampling count is supplied.".to_string(),
            ))
        }
        Some(count) => count,
        None => fits,
    };
    let native_count = ALCsizei::try_from(count)
        .map_err(|_| Error::Argument("too many sampling count is supplied.".to_string()))?;
    driver.capture_samples(handle, buffer.storage_mut(), native_count);
    check_alc(driver, Some(handle))?;
    let size = count * bytes_per_sample;
    buffer.set_filled(size);
    Ok(size)
}

impl Drop for CaptureDevice {
    fn drop(&mut self) {
        let Some(handle) = self.handle else {
            return;
        };
        log_dbg!("Closing capture device {:#x}", handle.to_bits());
        if !self.driver.capture_close_device(handle) {
            let code = self.driver.alc_get_error(Some(handle));
            log!(
                "Warning: closing capture device {:#x} failed with ALC error {:#x}",
                handle.to_bits(),
                code
            );
        }
    }
}

fn to_frequency(frequency: i64) -> Result<ALCuint, Error> {
    ALCuint::try_from(frequency)
        .map_err(|_| Error::Argument(format!("invalid frequency ({})", frequency)))
}

fn capture_new(
    env: &mut Environment,
    name: Option<Nullable<String>>,
    frequency: Option<i64>,
    format: Option<ALCenum>,
    buffer_size: Option<ALCsizei>,
) -> Result<Obj<CaptureDevice>, Error> {
    let device = match (name, frequency, format, buffer_size) {
        (None, None, None, None) => CaptureDevice::unopened(env.driver()),
        (Some(name), Some(frequency), Some(format), Some(buffer_size)) => {
            CaptureDevice::open_new(
                env.driver(),
                name.0.as_deref(),
                to_frequency(frequency)?,
                format,
                buffer_size,
            )?
        }
        _ => return Err(Error::Argument("wrong number of arguments.".to_string())),
    };
    Ok(env.objects.alloc(device))
}

fn capture_open(
    env: &mut Environment,
    this: Obj<CaptureDevice>,
    name: Nullable<String>,
    frequency: i64,
    format: ALCenum,
    buffer_size: ALCsizei,
) -> Result<Obj<CaptureDevice>, Error> {
    let frequency = to_frequency(frequency)?;
    env.objects
        .borrow_mut(this)?
        .open(name.0.as_deref(), frequency, format, buffer_size)?;
    Ok(this)
}

fn capture_close(env: &mut Environment, this: Obj<CaptureDevice>) -> Result<Obj<CaptureDevice>, Error> {
    env.objects.borrow_mut(this)?.close()?;
    Ok(this)
}

fn capture_start(env: &mut Environment, this: Obj<CaptureDevice>) -> Result<Obj<CaptureDevice>, Error> {
    env.objects.borrow(this)?.start()?;
    Ok(this)
}

fn capture_stop(env: &mut Environment, this: Obj<CaptureDevice>) -> Result<Obj<CaptureDevice>, Error> {
    env.objects.borrow(this)?.stop()?;
    Ok(this)
}

fn capture_samples(
    env: &mut Environment,
    this: Obj<CaptureDevice>,
    buffer: Obj<SampleBuffer>,
    count: Option<usize>,
) -> Result<Obj<CaptureDevice>, Error> {
    // Copied out, since the sample buffer has to be borrowed mutably.
    let (driver, handle, format) = {
        let device = env.objects.borrow(this)?;
        (device.driver.clone(), device.opened_handle()?, device.format)
    };
    let buffer = env.objects.borrow_mut(buffer)?;
    pull_samples(&*driver, handle, format, buffer, count)?;
    Ok(this)
}

fn capture_available_samples(env: &mut Environment, this: Obj<CaptureDevice>) -> Result<ALCint, Error> {
    env.objects.borrow(this)?.available_samples()
}

fn capture_frequency(env: &mut Environment, this: Obj<CaptureDevice>) -> Result<ALCuint, Error> {
    Ok(env.objects.borrow(this)?.frequency())
}

fn capture_format(env: &mut Environment, this: Obj<CaptureDevice>) -> Result<ALCenum, Error> {
    Ok(env.objects.borrow(this)?.format())
}

fn capture_buffer_size(env: &mut Environment, this: Obj<CaptureDevice>) -> Result<ALCsizei, Error> {
    Ok(env.objects.borrow(this)?.buffer_size())
}

fn capture_is_opened(env: &mut Environment, this: Obj<CaptureDevice>) -> Result<bool, Error> {
    Ok(env.objects.borrow(this)?.is_opened())
}

fn capture_error(env: &mut Environment, this: Obj<CaptureDevice>) -> Result<ALCenum, Error> {
    env.objects.borrow(this)?.error()
}

fn capture_device_specifier(env: &mut Environment) -> Result<Option<List<String>>, Error> {
    Ok(specifier_list(&*env.driver(), ALC_CAPTURE_DEVICE_SPECIFIER))
}

fn capture_default_device_specifier(env: &mut Environment) -> Result<Option<List<String>>, Error> {
    Ok(specifier_list(
        &*env.driver(),
        ALC_CAPTURE_DEFAULT_DEVICE_SPECIFIER,
    ))
}

pub const FUNCTIONS: FunctionExports = &[
    export_fn!("ALC::CaptureDevice.new", capture_new(_, _, _, _)),
    export_fn!("ALC::CaptureDevice#open", capture_open(_, _, _, _, _)),
    export_fn!("ALC::CaptureDevice#close", capture_close(_)),
    export_fn!("ALC::CaptureDevice#start", capture_start(_)),
    export_fn!("ALC::CaptureDevice#stop", capture_stop(_)),
    export_fn!("ALC::CaptureDevice#samples", capture_samples(_, _, _)),
    export_fn!("ALC::CaptureDevice#available_samples", capture_available_samples(_)),
    export_fn!("ALC::CaptureDevice#frequency", capture_frequency(_)),
    export_fn!("ALC::CaptureDevice#format", capture_format(_)),
    export_fn!("ALC::CaptureDevice#buffer_size", capture_buffer_size(_)),
    export_fn!("ALC::CaptureDevice#opened?", capture_is_opened(_)),
    export_fn!("ALC::CaptureDevice#error", capture_error(_)),
    export_fn!("ALC::CaptureDevice.device_specifier", capture_device_specifier()),
    export_fn!(
        "ALC::CaptureDevice.default_device_specifier",
        capture_default_device_specifier()
    ),
];
