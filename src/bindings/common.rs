/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! `AL::SampleBuffer`: a fixed-capacity byte store that capture devices fill
//! and buffers upload from.

use crate::abi::FunctionExports;
use crate::native::format_layout;
use crate::objects::{HostObject, Obj};
use crate::{Environment, Error};
use openal_script_sys::al_types::ALenum;
use std::path::Path;

pub struct SampleBuffer {
    storage: Vec<u8>,
    size: usize,
}
impl HostObject for SampleBuffer {
    const CLASS_NAME: &'static str = "AL::SampleBuffer";
}

fn allocate(capacity: usize) -> Result<Vec<u8>, Error> {
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(capacity)
        .map_err(|_| Error::NoMemory)?;
    storage.resize(capacity, 0);
    Ok(storage)
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Result<SampleBuffer, Error> {
        Ok(SampleBuffer {
            storage: allocate(capacity)?,
            size: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of bytes filled by the last pull.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The filled part.
    pub fn filled(&self) -> &[u8] {
        &self.storage[..self.size]
    }

    /// Reallocate with a new capacity. The contents are discarded.
    pub fn reset(&mut self, capacity: usize) -> Result<(), Error> {
        self.storage = allocate(capacity)?;
        self.size = 0;
        Ok(())
    }

    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.storage
    }

    pub(crate) fn set_filled(&mut self, size: usize) {
        debug_assert!(size <= self.capacity());
        self.size = size;
    }

    /// Write the filled part to a PCM WAV file. Any trailing partial frame is
    /// left out.
    pub fn write_wav(&self, path: &Path, format: ALenum, frequency: u32) -> Result<(), Error> {
        let (channels, bits) = format_layout(format)
            .ok_or_else(|| Error::Argument(format!("unsupported format ({:#x})", format)))?;
        let spec = hound::WavSpec {
            channels,
            sample_rate: frequency,
            bits_per_sample: bits,
            sample_format: hound::SampleFormat::Int,
        };
        let frame = usize::from(channels * bits / 8);
        let data = self.filled();
        let data = &data[..data.len() - data.len() % frame];

        let mut writer = hound::WavWriter::create(path, spec)?;
        if bits == 8 {
            // AL's 8-bit PCM is unsigned, hound wants it signed.
            for &sample in data {
                writer.write_sample((i16::from(sample) - 128) as i8)?;
            }
        } else {
            for sample in data.chunks_exact(2) {
                writer.write_sample(i16::from_le_bytes([sample[0], sample[1]]))?;
            }
        }
        writer.finalize()?;
        log_dbg!(
            "Wrote {} bytes of samples to {}",
            data.len(),
            path.display()
        );
        Ok(())
    }
}

fn sample_buffer_new(env: &mut Environment, capacity: usize) -> Result<Obj<SampleBuffer>, Error> {
    let buffer = SampleBuffer::new(capacity)?;
    Ok(env.objects.alloc(buffer))
}

fn sample_buffer_capacity(env: &mut Environment, this: Obj<SampleBuffer>) -> Result<usize, Error> {
    Ok(env.objects.borrow(this)?.capacity())
}

fn sample_buffer_size(env: &mut Environment, this: Obj<SampleBuffer>) -> Result<usize, Error> {
    Ok(env.objects.borrow(this)?.size())
}

fn sample_buffer_reset(
    env: &mut Environment,
    this: Obj<SampleBuffer>,
    capacity: usize,
) -> Result<Obj<SampleBuffer>, Error> {
    env.objects.borrow_mut(this)?.reset(capacity)?;
    Ok(this)
}

fn sample_buffer_bytes(env: &mut Environment, this: Obj<SampleBuffer>) -> Result<Vec<u8>, Error> {
    Ok(env.objects.borrow(this)?.filled().to_vec())
}

fn sample_buffer_write_wav(
    env: &mut Environment,
    this: Obj<SampleBuffer>,
    path: String,
    format: ALenum,
    frequency: i64,
) -> Result<Obj<SampleBuffer>, Error> {
    let frequency = u32::try_from(frequency)
        .ok()
        .filter(|&frequency| frequency > 0)
        .ok_or_else(|| Error::Argument(format!("invalid frequency ({})", frequency)))?;
    env.objects
        .borrow(this)?
        .write_wav(Path::new(&path), format, frequency)?;
    Ok(this)
}

pub const FUNCTIONS: FunctionExports = &[
    export_fn!("AL::SampleBuffer.new", sample_buffer_new(_)),
    export_fn!("AL::SampleBuffer#capacity", sample_buffer_capacity(_)),
    export_fn!("AL::SampleBuffer#size", sample_buffer_size(_)),
    export_fn!("AL::SampleBuffer#reset", sample_buffer_reset(_, _)),
    export_fn!("AL::SampleBuffer#bytes", sample_buffer_bytes(_)),
    export_fn!("AL::SampleBuffer#write_wav", sample_buffer_write_wav(_, _, _, _)),
];

#[cfg(test)]
mod tests {
    use super::*;
    use openal_script_sys::{AL_FORMAT_MONO16, AL_FORMAT_STEREO8};

    #[test]
    fn reset_discards_contents() {
        let mut buffer = SampleBuffer::new(8).unwrap();
        buffer.storage_mut()[0] = 1;
        buffer.set_filled(4);
        assert_eq!(buffer.filled(), &[1, 0, 0, 0]);
        buffer.reset(16).unwrap();
        assert_eq!(buffer.capacity(), 16);
        assert_eq!(buffer.size(), 0);
        assert!(buffer.filled().is_empty());
    }

    #[test]
    fn wav_round_trip_16_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono16.wav");
        let mut buffer = SampleBuffer::new(6).unwrap();
        buffer
            .storage_mut()
            .copy_from_slice(&[0x00, 0x80, 0xff, 0x7f, 0x01, 0x00]);
        buffer.set_filled(6);
        buffer.write_wav(&path, AL_FORMAT_MONO16, 8000).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.samples().map(Result::unwrap).collect();
        assert_eq!(samples, vec![i16::MIN, i16::MAX, 1]);
    }

    #[test]
    fn wav_8_bit_is_unsigned_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo8.wav");
        let mut buffer = SampleBuffer::new(5).unwrap();
        buffer
            .storage_mut()
            .copy_from_slice(&[0x80, 0xff, 0x00, 0x80, 0x42]);
        buffer.set_filled(5);
        buffer.write_wav(&path, AL_FORMAT_STEREO8, 11025).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().bits_per_sample, 8);
        // The odd byte is half a frame, so it's dropped.
        let samples: Vec<i8> = reader.samples().map(Result::unwrap).collect();
        assert_eq!(samples, vec![0, 127, -128, 0]);
    }

    #[test]
    fn unknown_formats_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = SampleBuffer::new(4).unwrap();
        let err = buffer
            .write_wav(&dir.path().join("x.wav"), 0x1234, 8000)
            .unwrap_err();
        assert_eq!(err.class_name(), "ArgumentError");
    }
}
