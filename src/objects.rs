/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The table of host objects that scripts hold references to.
//!
//! A script only ever sees an [ObjectId]. The object itself (a buffer, a
//! device, a sample buffer...) lives here as a [HostObject] trait object, and
//! releasing it means dropping it: wrappers that own a native handle free it
//! in their [Drop] implementation, views don't.

use crate::value::ObjectId;
use crate::Error;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// Type for host objects.
pub trait HostObject: Any + 'static {
    /// Scripting class name, e.g. `AL::Buffer`.
    const CLASS_NAME: &'static str;
}

/// Trait wrapping [HostObject] with a blanket implementation to make
/// downcasting work. Don't implement it yourself.
///
/// This is a workaround for it not being possible to directly cast
/// `&'a dyn HostObject` to `&'a dyn Any`.
pub trait AnyHostObject {
    fn as_any(&self) -> &(dyn Any + 'static);
    fn as_any_mut(&mut self) -> &mut (dyn Any + 'static);
    fn class_name(&self) -> &'static str;
}
impl<T: HostObject> AnyHostObject for T {
    fn as_any(&self) -> &(dyn Any + 'static) {
        self
    }
    fn as_any_mut(&mut self) -> &mut (dyn Any + 'static) {
        self
    }
    fn class_name(&self) -> &'static str {
        T::CLASS_NAME
    }
}

/// Typed reference to a host object of class `T`. This is what entry points
/// take and return; the class has already been checked when one is made from
/// a script value.
pub struct Obj<T> {
    id: ObjectId,
    _class: PhantomData<fn() -> T>,
}
impl<T> Obj<T> {
    pub(crate) fn from_id(id: ObjectId) -> Self {
        Obj {
            id,
            _class: PhantomData,
        }
    }
    pub fn id(self) -> ObjectId {
        self.id
    }
}
impl<T> Clone for Obj<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Obj<T> {}
impl<T> PartialEq for Obj<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T: HostObject> fmt::Debug for Obj<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", T::CLASS_NAME, self.id.0)
    }
}

pub struct Objects {
    next_id: u64,
    objects: BTreeMap<ObjectId, Box<dyn AnyHostObject>>,
}

impl Default for Objects {
    fn default() -> Self {
        Self::new()
    }
}

impl Objects {
    pub fn new() -> Objects {
        Objects {
            next_id: 1,
            objects: BTreeMap::new(),
        }
    }

    pub fn alloc<T: HostObject>(&mut self, object: T) -> Obj<T> {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, Box::new(object));
        Obj::from_id(id)
    }

    /// Class name of a live object.
    pub fn class_name(&self, id: ObjectId) -> Option<&'static str> {
        self.objects.get(&id).map(|object| object.class_name())
    }

    pub fn is_live(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Check that `id` is a live object of class `T`.
    pub fn downcast_id<T: HostObject>(&self, id: ObjectId) -> Result<Obj<T>, Error> {
        match self.objects.get(&id) {
            Some(object) if object.as_any().is::<T>() => Ok(Obj::from_id(id)),
            Some(object) => Err(Error::Type(format!(
                "wrong argument type {} (expected {})",
                object.class_name(),
                T::CLASS_NAME
            ))),
            None => Err(released::<T>()),
        }
    }

    pub fn borrow<T: HostObject>(&self, obj: Obj<T>) -> Result<&T, Error> {
        self.objects
            .get(&obj.id)
            .and_then(|object| object.as_any().downcast_ref())
            .ok_or_else(released::<T>)
    }

    pub fn borrow_mut<T: HostObject>(&mut self, obj: Obj<T>) -> Result<&mut T, Error> {
        self.objects
            .get_mut(&obj.id)
            .and_then(|object| object.as_any_mut().downcast_mut())
            .ok_or_else(released::<T>)
    }

    /// Drop an object. Returns `false` if it was already released (or never
    /// existed), in which case nothing happens.
    pub fn release(&mut self, id: ObjectId) -> bool {
        self.objects.remove(&id).is_some()
    }

    /// Drop every object, newest first, so things are released before the
    /// things they were created from.
    pub fn release_all(&mut self) {
        while let Some((id, object)) = self.objects.pop_last() {
            log_dbg!("Releasing {} {}", object.class_name(), id.0);
            drop(object);
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn released<T: HostObject>() -> Error {
    Error::Argument(format!("{} has already been released", T::CLASS_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Tracked(u32, Rc<RefCell<Vec<u32>>>);
    impl HostObject for Tracked {
        const CLASS_NAME: &'static str = "Tracked";
    }
    impl Drop for Tracked {
        fn drop(&mut self) {
            self.1.borrow_mut().push(self.0);
        }
    }

    struct Other;
    impl HostObject for Other {
        const CLASS_NAME: &'static str = "Other";
    }

    #[test]
    fn release_is_idempotent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut objects = Objects::new();
        let a = objects.alloc(Tracked(1, log.clone()));
        assert!(objects.release(a.id()));
        assert!(!objects.release(a.id()));
        assert_eq!(*log.borrow(), vec![1]);
        assert!(objects.borrow(a).is_err());
    }

    #[test]
    fn release_all_goes_newest_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut objects = Objects::new();
        for i in 1..=3 {
            objects.alloc(Tracked(i, log.clone()));
        }
        objects.release_all();
        assert_eq!(*log.borrow(), vec![3, 2, 1]);
        assert!(objects.is_empty());
    }

    #[test]
    fn downcast_checks_class() {
        let mut objects = Objects::new();
        let other = objects.alloc(Other);
        let err = objects.downcast_id::<Tracked>(other.id()).unwrap_err();
        assert_eq!(err.class_name(), "TypeError");
        assert!(objects.downcast_id::<Other>(other.id()).is_ok());
    }
}
