// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Latest-value channels keyed by route.
//!
//! ## Overview
//!
//! A [`LatestValue`] holds a single `Option<T>` slot. Writers replace the slot and every attached
//! observer is called with the new value. An observer attaching later is called once with the
//! current value on attach, so a value written before anyone listened is not lost; nothing older
//! than the current slot is kept.
//!
//! The dispatcher keeps one channel per route string, created on first read or write and never
//! removed. A screen returning a result writes into the channel of the route it returns to, and
//! that route's screen reads it when it is shown again.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, type_name};
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::observe::Observation;
use crate::types::ListenerKey;

/// A route channel was used with a value type other than the one it was created with.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The channel for `route` does not carry `expected`.
    #[error("channel for route `{route}` does not carry values of type `{expected}`")]
    TypeMismatch {
        /// Route the channel is keyed by.
        route: String,
        /// Type name requested by the caller.
        expected: &'static str,
    },
}

type ValueObserver<T> = Rc<dyn Fn(&Option<T>)>;

struct Slot<T> {
    value: RefCell<Option<T>>,
    observers: RefCell<Vec<(ListenerKey, ValueObserver<T>)>>,
    next_key: Cell<u64>,
}

/// Single-slot, replay-of-one, multi-observer value holder.
///
/// Handles are cheap to clone and all clones share the slot.
pub struct LatestValue<T> {
    slot: Rc<Slot<T>>,
}

impl<T> Clone for LatestValue<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LatestValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatestValue")
            .field("value", &self.slot.value.borrow())
            .field("observers", &self.slot.observers.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static> LatestValue<T> {
    pub(crate) fn new(initial: Option<T>) -> Self {
        Self {
            slot: Rc::new(Slot {
                value: RefCell::new(initial),
                observers: RefCell::new(Vec::new()),
                next_key: Cell::new(0),
            }),
        }
    }

    /// The current value.
    pub fn get(&self) -> Option<T> {
        self.slot.value.borrow().clone()
    }

    pub(crate) fn set(&self, value: Option<T>) {
        *self.slot.value.borrow_mut() = value;
        let current = self.get();
        let observers: Vec<ValueObserver<T>> = self
            .slot
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer(&current);
        }
    }

    /// Attach an observer. It is called at once with the current value, then after every write,
    /// until the returned observation is dropped.
    pub fn observe(&self, on_value: impl Fn(&Option<T>) + 'static) -> Observation {
        let key = ListenerKey(self.slot.next_key.get());
        self.slot.next_key.set(key.0 + 1);
        let observer: ValueObserver<T> = Rc::new(on_value);
        self.slot
            .observers
            .borrow_mut()
            .push((key, Rc::clone(&observer)));
        observer(&self.get());

        let slot = Rc::downgrade(&self.slot);
        Observation::new(move || {
            if let Some(slot) = slot.upgrade() {
                slot.observers.borrow_mut().retain(|(k, _)| *k != key);
            }
        })
    }

    /// Number of attached observers.
    pub fn observer_count(&self) -> usize {
        self.slot.observers.borrow().len()
    }

    /// Whether both handles share one slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

/// Route-keyed channels with heterogeneous value types.
#[derive(Default)]
pub(crate) struct ChannelRegistry {
    slots: RefCell<BTreeMap<String, Box<dyn Any>>>,
}

impl ChannelRegistry {
    /// The channel for `route`, created with `initial` if absent.
    pub(crate) fn channel<T: Clone + 'static>(
        &self,
        route: &str,
        initial: impl FnOnce() -> Option<T>,
    ) -> Result<LatestValue<T>, ChannelError> {
        let mut slots = self.slots.borrow_mut();
        if let Some(slot) = slots.get(route) {
            return slot
                .downcast_ref::<LatestValue<T>>()
                .cloned()
                .ok_or_else(|| ChannelError::TypeMismatch {
                    route: String::from(route),
                    expected: type_name::<T>(),
                });
        }
        let channel = LatestValue::new(initial());
        slots.insert(String::from(route), Box::new(channel.clone()));
        tracing::trace!(route, value_type = type_name::<T>(), "created route channel");
        Ok(channel)
    }

    /// Store `value` in the channel for `route`, creating it if absent.
    pub(crate) fn write<T: Clone + 'static>(&self, route: &str, value: T) -> Result<(), ChannelError> {
        let channel = self.channel(route, || None)?;
        channel.set(Some(value));
        Ok(())
    }

    pub(crate) fn contains(&self, route: &str) -> bool {
        self.slots.borrow().contains_key(route)
    }
}

impl fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.slots.borrow().keys()).finish()
    }
}
