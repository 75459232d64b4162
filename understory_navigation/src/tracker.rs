// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-dispatcher destination tracking and full-stack clears.
//!
//! ## Overview
//!
//! One [`DestinationTracker`] is created by the application's composition root and shared (behind
//! an `Rc`) with every dispatcher and screen-level back handler. It records:
//!
//! - the root route: the first route observed since construction or since the last
//!   [`clear_stack`](DestinationTracker::clear_stack);
//! - the last-action route: the most recently observed route across all hosts;
//! - whether a full-stack clear is running.
//!
//! While a clear is running, screen-level interceptors disarm themselves instead of handling the
//! synthetic back events (see [`ScreenBackHandler`](crate::screen::ScreenBackHandler)).
//!
//! ```
//! use std::rc::Rc;
//! use understory_navigation::headless::HeadlessBackDispatcher;
//! use understory_navigation::tracker::DestinationTracker;
//!
//! let tracker = Rc::new(DestinationTracker::new("login"));
//! tracker.record("home");
//! tracker.record("profile");
//! assert!(tracker.has_navigated_away_from_root());
//!
//! let back = HeadlessBackDispatcher::new();
//! assert_eq!(tracker.clear_stack(&back), "home");
//! assert_eq!(tracker.root_route(), None);
//! ```

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::{Cell, RefCell};

use crate::channel::LatestValue;
use crate::host::{BackDispatcher, NavHost};
use crate::observe::{Observation, observe_destinations};
use crate::types::Destination;

/// Shared record of the root and last-observed routes.
#[derive(Debug)]
pub struct DestinationTracker {
    start_route: String,
    root: RefCell<Option<String>>,
    last_action: LatestValue<String>,
    clear_in_progress: Cell<bool>,
}

impl DestinationTracker {
    /// Create a tracker. `start_route` is the graph's configured start route, returned by
    /// [`clear_stack`](Self::clear_stack) when no root was ever recorded.
    pub fn new(start_route: impl Into<String>) -> Self {
        Self {
            start_route: start_route.into(),
            root: RefCell::new(None),
            last_action: LatestValue::new(None),
            clear_in_progress: Cell::new(false),
        }
    }

    /// The configured start route.
    pub fn start_route(&self) -> &str {
        &self.start_route
    }

    /// Record an observed route: it becomes the root if none is set, and always the last action.
    pub fn record(&self, route: &str) {
        {
            let mut root = self.root.borrow_mut();
            if root.is_none() {
                tracing::trace!(route, "recorded root route");
                *root = Some(String::from(route));
            }
        }
        self.last_action.set(Some(String::from(route)));
    }

    /// The first route observed in the current clear cycle.
    pub fn root_route(&self) -> Option<String> {
        self.root.borrow().clone()
    }

    /// The most recently observed route.
    pub fn last_action_route(&self) -> Option<String> {
        self.last_action.get()
    }

    /// Observe the last-action route. The observer is called at once with the current value.
    pub fn observe_last_route(&self, on_route: impl Fn(Option<&str>) + 'static) -> Observation {
        self.last_action
            .observe(move |route| on_route(route.as_deref()))
    }

    /// Whether a [`clear_stack`](Self::clear_stack) is running.
    pub fn is_clear_in_progress(&self) -> bool {
        self.clear_in_progress.get()
    }

    /// Whether the last observed route differs from the recorded root.
    ///
    /// `false` while no root is recorded.
    pub fn has_navigated_away_from_root(&self) -> bool {
        let root = self.root.borrow();
        root.is_some() && self.last_action.get() != *root
    }

    /// Drain every active interceptor of `back` by delivering back events until none is active,
    /// then forget the root.
    ///
    /// Returns the root that was recorded before the clear, or the configured start route when none
    /// was. Interceptors that never disable or remove themselves keep this loop running.
    pub fn clear_stack<B: BackDispatcher + ?Sized>(&self, back: &B) -> String {
        let root = self.root_route();
        let mut delivered = 0_usize;
        {
            let _clearing = ClearGuard::enter(&self.clear_in_progress);
            while back.has_active_interceptors() {
                back.trigger_back();
                delivered += 1;
            }
        }
        self.root.borrow_mut().take();
        let route = root.unwrap_or_else(|| self.start_route.clone());
        tracing::debug!(delivered, root = %route, "cleared navigation stack");
        route
    }

    /// Record every destination change of `host` and forward it to `on_change`, until the returned
    /// observation is dropped.
    pub fn listen<H>(
        self: &Rc<Self>,
        host: &Rc<H>,
        on_change: impl Fn(&Destination) + 'static,
    ) -> Observation
    where
        H: NavHost + ?Sized + 'static,
    {
        let tracker = Rc::downgrade(self);
        observe_destinations(host, move |change| {
            if let Some(tracker) = tracker.upgrade() {
                tracker.record(change.destination.route());
            }
            on_change(&change.destination);
        })
    }
}

/// Holds the clear-in-progress flag up until dropped, including on unwind.
struct ClearGuard<'a>(&'a Cell<bool>);

impl<'a> ClearGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for ClearGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
