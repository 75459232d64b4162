// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped subscriptions.
//!
//! ## Overview
//!
//! Every registration this crate makes with a collaborator is held by an [`Observation`].
//! Dropping the observation (or calling [`Observation::cancel`]) undoes the registration, so a
//! screen that goes away cannot leave a listener or interceptor behind.
//!
//! Observations hold the collaborator weakly: if the host is destroyed first, cancelling is a no-op.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_navigation::headless::HeadlessNavHost;
//! use understory_navigation::observe::observe_destinations;
//!
//! let host = Rc::new(HeadlessNavHost::new());
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let observation = {
//!     let seen = Rc::clone(&seen);
//!     observe_destinations(&host, move |change| {
//!         seen.borrow_mut().push(change.destination.route().to_string());
//!     })
//! };
//! host.navigate("home");
//! drop(observation);
//! host.navigate("detail");
//! assert_eq!(*seen.borrow(), ["home"]);
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

use crate::host::{Lifecycle, LifecycleObserver, NavHost};
use crate::types::DestinationChange;

/// A live registration that is undone when dropped.
#[must_use = "dropping an Observation cancels it immediately"]
pub struct Observation {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Observation {
    /// Wrap a teardown closure. It runs exactly once: on [`cancel`](Self::cancel) or on drop.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Undo the registration now.
    pub fn cancel(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Observation {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observation")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Observe destination changes of `host` until the returned observation is dropped.
pub fn observe_destinations<H>(
    host: &Rc<H>,
    on_change: impl Fn(&DestinationChange) + 'static,
) -> Observation
where
    H: NavHost + ?Sized + 'static,
{
    let key = host.add_destination_listener(Rc::new(on_change));
    let host = Rc::downgrade(host);
    Observation::new(move || {
        if let Some(host) = host.upgrade() {
            host.remove_destination_listener(key);
        }
    })
}

/// Observe lifecycle transitions until the returned observation is dropped.
pub fn observe_lifecycle<L>(lifecycle: &Rc<L>, observer: Rc<dyn LifecycleObserver>) -> Observation
where
    L: Lifecycle + ?Sized + 'static,
{
    let key = lifecycle.add_observer(observer);
    let lifecycle = Rc::downgrade(lifecycle);
    Observation::new(move || {
        if let Some(lifecycle) = lifecycle.upgrade() {
            lifecycle.remove_observer(key);
        }
    })
}
