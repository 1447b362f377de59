/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! `AL::Source` and `AL::Sources`.
//!
//! Most of a source is a list of parameters, each read and written with
//! `alGetSource*`/`alSource*` followed by an error check. The float ones are
//! generated by `float_property!`.

use super::buffer::{checked_index, Buffer, Buffers};
use crate::abi::{ConstantExports, Floats, FunctionExports, List, Nullable};
use crate::bindings::{check_al, log_release_error};
use crate::native::Driver;
use crate::objects::{HostObject, Obj};
use crate::value::Value;
use crate::{Environment, Error};
use openal_script_sys::al_types::*;
use openal_script_sys::*;
use std::ops::Range;
use std::rc::Rc;

/// One AL source name. As with [Buffer], only owning sources delete their
/// name when dropped.
pub struct Source {
    driver: Rc<dyn Driver>,
    name: ALuint,
    owned: bool,
}
impl HostObject for Source {
    const CLASS_NAME: &'static str = "AL::Source";
}

impl Source {
    pub fn new(driver: Rc<dyn Driver>) -> Result<Source, Error> {
        let mut name = 0;
        driver.gen_sources(std::slice::from_mut(&mut name));
        check_al(&*driver)?;
        log_dbg!("Generated source {}", name);
        Ok(Source {
            driver,
            name,
            owned: true,
        })
    }

    pub fn view(driver: Rc<dyn Driver>, name: ALuint) -> Source {
        Source {
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

    pub fn is_valid(&self) -> bool {
        self.driver.is_source(self.name)
    }

    pub fn get_f(&self, param: ALenum) -> Result<ALfloat, Error> {
        let value = self.driver.get_source_f(self.name, param);
        check_al(&*self.driver)?;
        Ok(value)
    }
    pub fn set_f(&self, param: ALenum, value: ALfloat) -> Result<(), Error> {
        self.driver.source_f(self.name, param, value);
        check_al(&*self.driver)
    }

    pub fn get_i(&self, param: ALenum) -> Result<ALint, Error> {
        let value = self.driver.get_source_i(self.name, param);
        check_al(&*self.driver)?;
        Ok(value)
    }
    pub fn set_i(&self, param: ALenum, value: ALint) -> Result<(), Error> {
        self.driver.source_i(self.name, param, value);
        check_al(&*self.driver)
    }

    pub fn get_3f(&self, param: ALenum) -> Result<[ALfloat; 3], Error> {
        let mut values = [0.0; 3];
        self.driver.get_source_fv(self.name, param, &mut values);
        check_al(&*self.driver)?;
        Ok(values)
    }
    pub fn set_3f(&self, param: ALenum, values: [ALfloat; 3]) -> Result<(), Error> {
        self.driver.source_fv(self.name, param, &values);
        check_al(&*self.driver)
    }

    /// `AL_INITIAL`, `AL_PLAYING`, `AL_PAUSED` or `AL_STOPPED`.
    pub fn state(&self) -> Result<ALenum, Error> {
        self.get_i(AL_SOURCE_STATE)
    }

    pub fn is_playing(&self) -> Result<bool, Error> {
        Ok(self.state()? == AL_PLAYING)
    }

    pub fn play(&self) -> Result<(), Error> {
        self.driver.source_play(self.name);
        check_al(&*self.driver)
    }
    pub fn pause(&self) -> Result<(), Error> {
        self.driver.source_pause(self.name);
        check_al(&*self.driver)
    }
    pub fn stop(&self) -> Result<(), Error> {
        self.driver.source_stop(self.name);
        check_al(&*self.driver)
    }
    pub fn rewind(&self) -> Result<(), Error> {
        self.driver.source_rewind(self.name);
        check_al(&*self.driver)
    }

    pub fn queue_buffers(&self, names: &[ALuint]) -> Result<(), Error> {
        self.driver.source_queue_buffers(self.name, names);
        check_al(&*self.driver)
    }

    /// Unqueue the `names.len()` oldest processed buffers, writing their
    /// names into `names`.
    pub fn unqueue_buffers(&self, names: &mut [ALuint]) -> Result<(), Error> {
        self.driver.source_unqueue_buffers(self.name, names);
        check_al(&*self.driver)
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        if self.owned {
            log_dbg!("Deleting source {}", self.name);
            self.driver.delete_sources(&[self.name]);
            log_release_error(&*self.driver, "source");
        }
    }
}

/// A batch of source names generated (and later deleted) in one call.
pub struct Sources {
    driver: Rc<dyn Driver>,
    names: Vec<ALuint>,
}
impl HostObject for Sources {
    const CLASS_NAME: &'static str = "AL::Sources";
}

impl Sources {
    pub fn new(driver: Rc<dyn Driver>, count: usize) -> Result<Sources, Error> {
        let mut names = Vec::new();
        names.try_reserve_exact(count).map_err(|_| Error::NoMemory)?;
        names.resize(count, 0);
        driver.gen_sources(&mut names);
        check_al(&*driver)?;
        log_dbg!("Generated sources {:?}", names);
        Ok(Sources { driver, names })
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

    pub fn get(&self, index: usize) -> Option<Source> {
        let &name = self.names.get(index)?;
        Some(Source::view(self.driver.clone(), name))
    }

    pub fn iter(&self) -> impl Iterator<Item = Source> + '_ {
        self.names
            .iter()
            .map(|&name| Source::view(self.driver.clone(), name))
    }
}

impl Drop for Sources {
    fn drop(&mut self) {
        log_dbg!("Deleting sources {:?}", self.names);
        self.driver.delete_sources(&self.names);
        log_release_error(&*self.driver, "sources");
    }
}

/// The part of a [Buffers] collection a queue operation applies to: the
/// whole of it, everything from `offset`, or `count` buffers from `offset`.
fn queue_range(len: usize, offset: Option<i64>, count: Option<i64>) -> Result<Range<usize>, Error> {
    let Some(offset) = offset else {
        return Ok(0..len);
    };
    let start = usize::try_from(offset)
        .ok()
        .filter(|&start| start < len)
        .ok_or_else(|| Error::Index("offset is out of buffers.".to_string()))?;
    let Some(count) = count else {
        return Ok(start..len);
    };
    usize::try_from(count)
        .ok()
        .and_then(|count| start.checked_add(count))
        .filter(|&end| end <= len)
        .map(|end| start..end)
        .ok_or_else(|| Error::Index("count is out of buffers.".to_string()))
}

/// What a queue operation was given: a single buffer, or a range of a
/// collection.
enum QueueTarget {
    Single(Obj<Buffer>),
    Range(Obj<Buffers>, Range<usize>),
}

fn queue_target(
    env: &Environment,
    buffers: &Value,
    offset: Option<i64>,
    count: Option<i64>,
) -> Result<QueueTarget, Error> {
    let Some(id) = buffers.as_object() else {
        return Err(Error::Type(format!(
            "wrong argument type {} (expected AL::Buffer or AL::Buffers)",
            buffers.type_name()
        )));
    };
    if let Ok(buffer) = env.objects.downcast_id::<Buffer>(id) {
        if offset.is_some() || count.is_some() {
            return Err(Error::Argument(
                "offset and count can only be given with AL::Buffers.".to_string(),
            ));
        }
        return Ok(QueueTarget::Single(buffer));
    }
    let collection = env.objects.downcast_id::<Buffers>(id)?;
    let range = queue_range(env.objects.borrow(collection)?.len(), offset, count)?;
    Ok(QueueTarget::Range(collection, range))
}

fn source_new(env: &mut Environment) -> Result<Obj<Source>, Error> {
    let source = Source::new(env.driver())?;
    Ok(env.objects.alloc(source))
}

fn source_id(env: &mut Environment, this: Obj<Source>) -> Result<ALuint, Error> {
    Ok(env.objects.borrow(this)?.name())
}

fn source_is_valid(env: &mut Environment, this: Obj<Source>) -> Result<bool, Error> {
    Ok(env.objects.borrow(this)?.is_valid())
}

fn source_is_relative(env: &mut Environment, this: Obj<Source>) -> Result<bool, Error> {
    Ok(env.objects.borrow(this)?.get_i(AL_SOURCE_RELATIVE)? != 0)
}

fn source_relative_set(env: &mut Environment, this: Obj<Source>, relative: bool) -> Result<bool, Error> {
    env.objects
        .borrow(this)?
        .set_i(AL_SOURCE_RELATIVE, relative.into())?;
    Ok(relative)
}

fn source_type(env: &mut Environment, this: Obj<Source>) -> Result<ALenum, Error> {
    env.objects.borrow(this)?.get_i(AL_SOURCE_TYPE)
}

fn source_type_set(env: &mut Environment, this: Obj<Source>, kind: ALenum) -> Result<ALenum, Error> {
    env.objects.borrow(this)?.set_i(AL_SOURCE_TYPE, kind)?;
    Ok(kind)
}

fn source_is_looping(env: &mut Environment, this: Obj<Source>) -> Result<bool, Error> {
    Ok(env.objects.borrow(this)?.get_i(AL_LOOPING)? != 0)
}

fn source_looping_set(env: &mut Environment, this: Obj<Source>, looping: bool) -> Result<bool, Error> {
    env.objects.borrow(this)?.set_i(AL_LOOPING, looping.into())?;
    Ok(looping)
}

fn source_buffer(env: &mut Environment, this: Obj<Source>) -> Result<Option<Obj<Buffer>>, Error> {
    let source = env.objects.borrow(this)?;
    let name = source.get_i(AL_BUFFER)? as ALuint;
    if name == 0 {
        return Ok(None);
    }
    let view = Buffer::view(source.driver.clone(), name);
    Ok(Some(env.objects.alloc(view)))
}

fn source_buffer_set(
    env: &mut Environment,
    this: Obj<Source>,
    buffer: Nullable<Obj<Buffer>>,
) -> Result<Option<Obj<Buffer>>, Error> {
    let name = match buffer.0 {
        Some(buffer) => env.objects.borrow(buffer)?.name(),
        None => 0,
    };
    env.objects.borrow(this)?.set_i(AL_BUFFER, name as ALint)?;
    Ok(buffer.0)
}

fn source_buffers_queued(env: &mut Environment, this: Obj<Source>) -> Result<ALint, Error> {
    env.objects.borrow(this)?.get_i(AL_BUFFERS_QUEUED)
}

fn source_buffers_processed(env: &mut Environment, this: Obj<Source>) -> Result<ALint, Error> {
    env.objects.borrow(this)?.get_i(AL_BUFFERS_PROCESSED)
}

/// Define a getter and a setter entry point for a float source parameter.
/// Setters return the value they were given.
macro_rules! float_property {
    ($getter:ident, $setter:ident, $param:expr) => {
        fn $getter(env: &mut Environment, this: Obj<Source>) -> Result<ALfloat, Error> {
            env.objects.borrow(this)?.get_f($param)
        }
        fn $setter(env: &mut Environment, this: Obj<Source>, value: ALfloat) -> Result<ALfloat, Error> {
            env.objects.borrow(this)?.set_f($param, value)?;
            Ok(value)
        }
    };
}

float_property!(source_gain, source_gain_set, AL_GAIN);
float_property!(source_min_gain, source_min_gain_set, AL_MIN_GAIN);
float_property!(source_max_gain, source_max_gain_set, AL_MAX_GAIN);
float_property!(source_reference_distance, source_reference_distance_set, AL_REFERENCE_DISTANCE);
float_property!(source_rolloff_factor, source_rolloff_factor_set, AL_ROLLOFF_FACTOR);
float_property!(source_max_distance, source_max_distance_set, AL_MAX_DISTANCE);
float_property!(source_pitch, source_pitch_set, AL_PITCH);
float_property!(source_cone_inner_angle, source_cone_inner_angle_set, AL_CONE_INNER_ANGLE);
float_property!(source_cone_outer_angle, source_cone_outer_angle_set, AL_CONE_OUTER_ANGLE);
float_property!(source_cone_outer_gain, source_cone_outer_gain_set, AL_CONE_OUTER_GAIN);
float_property!(source_sec_offset, source_sec_offset_set, AL_SEC_OFFSET);
float_property!(source_sample_offset, source_sample_offset_set, AL_SAMPLE_OFFSET);
float_property!(source_byte_offset, source_byte_offset_set, AL_BYTE_OFFSET);

/// Same as [float_property], for three-float vectors.
macro_rules! vector_property {
    ($getter:ident, $setter:ident, $param:expr) => {
        fn $getter(env: &mut Environment, this: Obj<Source>) -> Result<[ALfloat; 3], Error> {
            env.objects.borrow(this)?.get_3f($param)
        }
        fn $setter(
            env: &mut Environment,
            this: Obj<Source>,
            value: Floats<3>,
        ) -> Result<[ALfloat; 3], Error> {
            env.objects.borrow(this)?.set_3f($param, value.0)?;
            Ok(value.0)
        }
    };
}

vector_property!(source_position, source_position_set, AL_POSITION);
vector_property!(source_velocity, source_velocity_set, AL_VELOCITY);
vector_property!(source_direction, source_direction_set, AL_DIRECTION);

fn source_state(env: &mut Environment, this: Obj<Source>) -> Result<ALenum, Error> {
    env.objects.borrow(this)?.state()
}

fn source_is_playing(env: &mut Environment, this: Obj<Source>) -> Result<bool, Error> {
    env.objects.borrow(this)?.is_playing()
}

fn source_playing_set(env: &mut Environment, this: Obj<Source>, playing: bool) -> Result<bool, Error> {
    let source = env.objects.borrow(this)?;
    if playing {
        source.play()?;
    } else {
        source.stop()?;
    }
    source.is_playing()
}

fn source_play(env: &mut Environment, this: Obj<Source>) -> Result<(), Error> {
    env.objects.borrow(this)?.play()
}

fn source_pause(env: &mut Environment, this: Obj<Source>) -> Result<(), Error> {
    env.objects.borrow(this)?.pause()
}

fn source_stop(env: &mut Environment, this: Obj<Source>) -> Result<(), Error> {
    env.objects.borrow(this)?.stop()
}

fn source_rewind(env: &mut Environment, this: Obj<Source>) -> Result<(), Error> {
    env.objects.borrow(this)?.rewind()
}

fn source_queue_buffers(
    env: &mut Environment,
    this: Obj<Source>,
    buffers: Value,
    offset: Option<i64>,
    count: Option<i64>,
) -> Result<Obj<Source>, Error> {
    let target = queue_target(env, &buffers, offset, count)?;
    let source = env.objects.borrow(this)?;
    match target {
        QueueTarget::Single(buffer) => {
            source.queue_buffers(&[env.objects.borrow(buffer)?.name()])?;
        }
        QueueTarget::Range(collection, range) => {
            source.queue_buffers(&env.objects.borrow(collection)?.names()[range])?;
        }
    }
    Ok(this)
}

fn source_unqueue_buffers(
    env: &mut Environment,
    this: Obj<Source>,
    buffers: Value,
    offset: Option<i64>,
    count: Option<i64>,
) -> Result<Obj<Source>, Error> {
    let expected = match queue_target(env, &buffers, offset, count)? {
        QueueTarget::Single(buffer) => vec![env.objects.borrow(buffer)?.name()],
        QueueTarget::Range(collection, range) => {
            env.objects.borrow(collection)?.names()[range].to_vec()
        }
    };
    let mut unqueued = Vec::new();
    unqueued
        .try_reserve_exact(expected.len())
        .map_err(|_| Error::NoMemory)?;
    unqueued.resize(expected.len(), 0);
    env.objects.borrow(this)?.unqueue_buffers(&mut unqueued)?;
    // The names belong to their wrappers, so they're compared, never copied
    // into them.
    if unqueued != expected {
        log_dbg!("Unqueued {:?} where {:?} were given", unqueued, expected);
        return Err(Error::Al(
            "unqueued buffers do not match the given buffers.".to_string(),
        ));
    }
    Ok(this)
}

fn sources_new(env: &mut Environment, count: Option<usize>) -> Result<Obj<Sources>, Error> {
    let sources = Sources::new(env.driver(), count.unwrap_or(1))?;
    Ok(env.objects.alloc(sources))
}

fn sources_size(env: &mut Environment, this: Obj<Sources>) -> Result<usize, Error> {
    Ok(env.objects.borrow(this)?.len())
}

fn sources_index(env: &mut Environment, this: Obj<Sources>, index: i64) -> Result<Obj<Source>, Error> {
    let sources = env.objects.borrow(this)?;
    let index = checked_index(index, sources.len(), "sources")?;
    let view = Source::view(sources.driver.clone(), sources.names[index]);
    Ok(env.objects.alloc(view))
}

fn sources_to_a(env: &mut Environment, this: Obj<Sources>) -> Result<List<Obj<Source>>, Error> {
    let views: Vec<Source> = env.objects.borrow(this)?.iter().collect();
    Ok(List(
        views
            .into_iter()
            .map(|view| env.objects.alloc(view))
            .collect(),
    ))
}

pub const FUNCTIONS: FunctionExports = &[
    export_fn!("AL::Source.new", source_new()),
    export_fn!("AL::Source#id", source_id(_)),
    export_fn!("AL::Source#valid?", source_is_valid(_)),
    export_fn!("AL::Source#relative?", source_is_relative(_)),
    export_fn!("AL::Source#relative=", source_relative_set(_, _)),
    export_fn!("AL::Source#type", source_type(_)),
    export_fn!("AL::Source#type=", source_type_set(_, _)),
    export_fn!("AL::Source#looping?", source_is_looping(_)),
    export_fn!("AL::Source#looping=", source_looping_set(_, _)),
    export_fn!("AL::Source#buffer", source_buffer(_)),
    export_fn!("AL::Source#buffer=", source_buffer_set(_, _)),
    export_fn!("AL::Source#buffers_queued", source_buffers_queued(_)),
    export_fn!("AL::Source#buffers_processed", source_buffers_processed(_)),
    export_fn!("AL::Source#gain", source_gain(_)),
    export_fn!("AL::Source#gain=", source_gain_set(_, _)),
    export_fn!("AL::Source#min_gain", source_min_gain(_)),
    export_fn!("AL::Source#min_gain=", source_min_gain_set(_, _)),
    export_fn!("AL::Source#max_gain", source_max_gain(_)),
    export_fn!("AL::Source#max_gain=", source_max_gain_set(_, _)),
    export_fn!("AL::Source#reference_distance", source_reference_distance(_)),
    export_fn!("AL::Source#reference_distance=", source_reference_distance_set(_, _)),
    export_fn!("AL::Source#rolloff_factor", source_rolloff_factor(_)),
    export_fn!("AL::Source#rolloff_factor=", source_rolloff_factor_set(_, _)),
    export_fn!("AL::Source#max_distance", source_max_distance(_)),
    export_fn!("AL::Source#max_distance=", source_max_distance_set(_, _)),
    export_fn!("AL::Source#pitch", source_pitch(_)),
    export_fn!("AL::Source#pitch=", source_pitch_set(_, _)),
    export_fn!("AL::Source#position", source_position(_)),
    export_fn!("AL::Source#position=", source_position_set(_, _)),
    export_fn!("AL::Source#velocity", source_velocity(_)),
    export_fn!("AL::Source#velocity=", source_velocity_set(_, _)),
    export_fn!("AL::Source#direction", source_direction(_)),
    export_fn!("AL::Source#direction=", source_direction_set(_, _)),
    export_fn!("AL::Source#cone_inner_angle", source_cone_inner_angle(_)),
    export_fn!("AL::Source#cone_inner_angle=", source_cone_inner_angle_set(_, _)),
    export_fn!("AL::Source#cone_outer_angle", source_cone_outer_angle(_)),
    export_fn!("AL::Source#cone_outer_angle=", source_cone_outer_angle_set(_, _)),
    export_fn!("AL::Source#cone_outer_gain", source_cone_outer_gain(_)),
    export_fn!("AL::Source#cone_outer_gain=", source_cone_outer_gain_set(_, _)),
    export_fn!("AL::Source#sec_offset", source_sec_offset(_)),
    export_fn!("AL::Source#sec_offset=", source_sec_offset_set(_, _)),
    export_fn!("AL::Source#sample_offset", source_sample_offset(_)),
    export_fn!("AL::Source#sample_offset=", source_sample_offset_set(_, _)),
    export_fn!("AL::Source#byte_offset", source_byte_offset(_)),
    export_fn!("AL::Source#byte_offset=", source_byte_offset_set(_, _)),
    export_fn!("AL::Source#state", source_state(_)),
    export_fn!("AL::Source#playing?", source_is_playing(_)),
    export_fn!("AL::Source#playing=", source_playing_set(_, _)),
    export_fn!("AL::Source#play", source_play(_)),
    export_fn!("AL::Source#pause", source_pause(_)),
    export_fn!("AL::Source#stop", source_stop(_)),
    export_fn!("AL::Source#rewind", source_rewind(_)),
    export_fn!("AL::Source#queue_buffers", source_queue_buffers(_, _, _, _)),
    export_fn!("AL::Source#unqueue_buffers", source_unqueue_buffers(_, _, _, _)),
    export_fn!("AL::Sources.new", sources_new(_)),
    export_fn!("AL::Sources#size", sources_size(_)),
    export_fn!("AL::Sources#[]", sources_index(_, _)),
    export_fn!("AL::Sources#to_a", sources_to_a(_)),
];

pub const CONSTANTS: ConstantExports = &[
    ("AL::Source::UNDETERMINED", AL_UNDETERMINED as i64),
    ("AL::Source::STATIC", AL_STATIC as i64),
    ("AL::Source::STREAMING", AL_STREAMING as i64),
    ("AL::Source::INITIAL", AL_INITIAL as i64),
    ("AL::Source::PLAYING", AL_PLAYING as i64),
    ("AL::Source::PAUSED", AL_PAUSED as i64),
    ("AL::Source::STOPPED", AL_STOPPED as i64),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_ranges() {
        assert_eq!(queue_range(4, None, None), Ok(0..4));
        assert_eq!(queue_range(4, Some(1), None), Ok(1..4));
        assert_eq!(queue_range(4, Some(1), Some(3)), Ok(1..4));
        assert_eq!(queue_range(4, Some(3), Some(0)), Ok(3..3));
        assert!(queue_range(4, Some(4), None).is_err());
        assert!(queue_range(4, Some(-1), None).is_err());
        assert!(queue_range(4, Some(1), Some(4)).is_err());
        assert!(queue_range(4, Some(0), Some(-1)).is_err());
        assert!(queue_range(0, Some(0), None).is_err());
    }
}
