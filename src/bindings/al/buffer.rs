/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! `AL::Buffer` and `AL::Buffers`.

use crate::abi::{ConstantExports, FunctionExports, List};
use crate::bindings::common::SampleBuffer;
use crate::bindings::{check_al, log_release_error};
use crate::native::Driver;
use crate::objects::{HostObject, Obj};
use crate::{Environment, Error};
use openal_script_sys::al_types::*;
use openal_script_sys::*;
use std::rc::Rc;

/// One AL buffer name. Owning buffers delete the name when dropped; views
/// (from `Buffers#[]`, `Source#buffer` and so on) never do.
pub struct Buffer {
    driver: Rc<dyn Driver>,
    name: ALuint,
    owned: bool,
}
impl HostObject for Buffer {
    const CLASS_NAME: &'static str = "AL::Buffer";
}

impl Buffer {
    /// Generate a new buffer name.
    pub fn new(driver: Rc<dyn Driver>) -> Result<Buffer, Error> {
        let mut name = 0;
        driver.gen_buffers(std::slice::from_mut(&mut name));
        check_al(&*driver)?;
        log_dbg!("Generated buffer {}", name);
        Ok(Buffer::owning(driver, name))
    }

    /// Take ownership of a name generated elsewhere (e.g. by ALUT).
    pub(crate) fn owning(driver: Rc<dyn Driver>, name: ALuint) -> Buffer {
        Buffer {
            driver,
            name,
            owned: true,
        }
    }

    pub fn view(driver: Rc<dyn Driver>, name: ALuint) -> Buffer {
        Buffer {
            driver,
            name,
            owned: false,
        }
    }

    pub fn name(&self) -> ALuint {
        self.name
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    fn get_i(&self, param: ALenum) -> Result<ALint, Error> {
        let value = self.driver.get_buffer_i(self.name, param);
        check_al(&*self.driver)?;
        Ok(value)
    }

    /// Size of the sample data in bytes.
    pub fn size(&self) -> Result<ALint, Error> {
        self.get_i(AL_SIZE)
    }
    pub fn frequency(&self) -> Result<ALint, Error> {
        self.get_i(AL_FREQUENCY)
    }
    pub fn channels(&self) -> Result<ALint, Error> {
        self.get_i(AL_CHANNELS)
    }
    pub fn bits(&self) -> Result<ALint, Error> {
        self.get_i(AL_BITS)
    }

    pub fn is_valid(&self) -> bool {
        self.driver.is_buffer(self.name)
    }

    /// Upload PCM data. `data` must be whole sample frames of `format`.
    pub fn set_data(&self, format: ALenum, data: &[u8], frequency: ALsizei) -> Result<(), Error> {
        self.driver.buffer_data(self.name, format, data, frequency);
        check_al(&*self.driver)
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.owned {
            log_dbg!("Deleting buffer {}", self.name);
            self.driver.delete_buffers(&[self.name]);
            log_release_error(&*self.driver, "buffer");
        }
    }
}

/// A batch of buffer names generated (and later deleted) in one call.
pub struct Buffers {
    driver: Rc<dyn Driver>,
    names: Vec<ALuint>,
}
impl HostObject for Buffers {
    const CLASS_NAME: &'static str = "AL::Buffers";
}

impl Buffers {
    pub fn new(driver: Rc<dyn Driver>, count: usize) -> Result<Buffers, Error> {
        let mut names = Vec::new();
        names.try_reserve_exact(count).map_err(|_| Error::NoMemory)?;
        names.resize(count, 0);
        driver.gen_buffers(&mut names);
        check_al(&*driver)?;
        log_dbg!("Generated buffers {:?}", names);
        Ok(Buffers { driver, names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[ALuint] {
        &self.names
    }

    /// View of the buffer at `index`.
    pub fn get(&self, index: usize) -> Option<Buffer> {
        let &name = self.names.get(index)?;
        Some(Buffer::view(self.driver.clone(), name))
    }

    /// Views of every buffer, in generation order.
    pub fn iter(&self) -> impl Iterator<Item = Buffer> + '_ {
        self.names
            .iter()
            .map(|&name| Buffer::view(self.driver.clone(), name))
    }
}

impl Drop for Buffers {
    fn drop(&mut self) {
        log_dbg!("Deleting buffers {:?}", self.names);
        self.driver.delete_buffers(&self.names);
        log_release_error(&*self.driver, "buffers");
    }
}

/// Turn a script index into a collection index, without wrapping negative
/// indices around.
pub(crate) fn checked_index(index: i64, len: usize, what: &str) -> Result<usize, Error> {
    usize::try_from(index)
        .ok()
        .filter(|&index| index < len)
        .ok_or_else(|| Error::Index(format!("index is out of {}.", what)))
}

fn buffer_new(env: &mut Environment) -> Result<Obj<Buffer>, Error> {
    let buffer = Buffer::new(env.driver())?;
    Ok(env.objects.alloc(buffer))
}

fn buffer_size(env: &mut Environment, this: Obj<Buffer>) -> Result<ALint, Error> {
    env.objects.borrow(this)?.size()
}

fn buffer_frequency(env: &mut Environment, this: Obj<Buffer>) -> Result<ALint, Error> {
    env.objects.borrow(this)?.frequency()
}

fn buffer_channels(env: &mut Environment, this: Obj<Buffer>) -> Result<ALint, Error> {
    env.objects.borrow(this)?.channels()
}

fn buffer_bits(env: &mut Environment, this: Obj<Buffer>) -> Result<ALint, Error> {
    env.objects.borrow(this)?.bits()
}

fn buffer_id(env: &mut Environment, this: Obj<Buffer>) -> Result<ALuint, Error> {
    Ok(env.objects.borrow(this)?.name())
}

fn buffer_is_valid(env: &mut Environment, this: Obj<Buffer>) -> Result<bool, Error> {
    Ok(env.objects.borrow(this)?.is_valid())
}

fn buffer_set_data(
    env: &mut Environment,
    this: Obj<Buffer>,
    format: ALenum,
    samples: Obj<SampleBuffer>,
    frequency: ALsizei,
) -> Result<Obj<Buffer>, Error> {
    let buffer = env.objects.borrow(this)?;
    let samples = env.objects.borrow(samples)?;
    buffer.set_data(format, samples.filled(), frequency)?;
    Ok(this)
}

fn buffers_new(env: &mut Environment, count: Option<usize>) -> Result<Obj<Buffers>, Error> {
    let buffers = Buffers::new(env.driver(), count.unwrap_or(1))?;
    Ok(env.objects.alloc(buffers))
}

fn buffers_size(env: &mut Environment, this: Obj<Buffers>) -> Result<usize, Error> {
    Ok(env.objects.borrow(this)?.len())
}

fn buffers_index(env: &mut Environment, this: Obj<Buffers>, index: i64) -> Result<Obj<Buffer>, Error> {
    let buffers = env.objects.borrow(this)?;
    let index = checked_index(index, buffers.len(), "buffers")?;
    let view = Buffer::view(buffers.driver.clone(), buffers.names[index]);
    Ok(env.objects.alloc(view))
}

fn buffers_to_a(env: &mut Environment, this: Obj<Buffers>) -> Result<List<Obj<Buffer>>, Error> {
    let views: Vec<Buffer> = env.objects.borrow(this)?.iter().collect();
    Ok(List(
        views
            .into_iter()
            .map(|view| env.objects.alloc(view))
            .collect(),
    ))
}

pub const FUNCTIONS: FunctionExports = &[
    export_fn!("AL::Buffer.new", buffer_new()),
    export_fn!("AL::Buffer#size", buffer_size(_)),
    export_fn!("AL::Buffer#frequency", buffer_frequency(_)),
    export_fn!("AL::Buffer#channels", buffer_channels(_)),
    export_fn!("AL::Buffer#bits", buffer_bits(_)),
    export_fn!("AL::Buffer#id", buffer_id(_)),
    export_fn!("AL::Buffer#valid?", buffer_is_valid(_)),
    export_fn!("AL::Buffer#set_data", buffer_set_data(_, _, _, _)),
    export_fn!("AL::Buffers.new", buffers_new(_)),
    export_fn!("AL::Buffers#size", buffers_size(_)),
    export_fn!("AL::Buffers#[]", buffers_index(_, _)),
    export_fn!("AL::Buffers#to_a", buffers_to_a(_)),
];

pub const CONSTANTS: ConstantExports = &[
    ("AL::Buffer::WAVEFORM_SINE", ALUT_WAVEFORM_SINE as i64),
    ("AL::Buffer::WAVEFORM_SQUARE", ALUT_WAVEFORM_SQUARE as i64),
    ("AL::Buffer::WAVEFORM_SAWTOOTH", ALUT_WAVEFORM_SAWTOOTH as i64),
    ("AL::Buffer::WAVEFORM_WHITENOISE", ALUT_WAVEFORM_WHITENOISE as i64),
    ("AL::Buffer::WAVEFORM_IMPULSE", ALUT_WAVEFORM_IMPULSE as i64),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_dont_wrap() {
        assert_eq!(checked_index(0, 2, "buffers"), Ok(0));
        assert_eq!(checked_index(1, 2, "buffers"), Ok(1));
        assert_eq!(
            checked_index(2, 2, "buffers"),
            Err(Error::Index("index is out of buffers.".to_string()))
        );
        assert!(checked_index(-1, 2, "buffers").is_err());
        assert!(checked_index(0, 0, "sources").is_err());
    }
}
