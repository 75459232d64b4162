// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator traits: the navigation host, the platform back dispatcher, the lifecycle, and
//! paged views.
//!
//! ## Re-entrancy
//!
//! Every method takes `&self`; implementations are handles with interior mutability, driven from a
//! single UI thread. Notifications are synchronous, and a listener may call back into the
//! collaborator that notified it (a back interceptor removing itself, a destination listener popping
//! the stack). Implementations must release their internal borrows before invoking a listener,
//! observer, or interceptor.
//!
//! [`headless`](crate::headless) has in-memory implementations of every trait here.

use alloc::rc::Rc;

use crate::types::{Destination, DestinationChange, DestinationId, ListenerKey, OwnerId};

/// Callback registered with [`NavHost::add_destination_listener`].
pub type DestinationListener = Rc<dyn Fn(&DestinationChange)>;

/// The screen-transition host that owns the back stack.
pub trait NavHost {
    /// The destination on top of the stack, if any.
    fn current_destination(&self) -> Option<Destination>;

    /// The entry directly below the top, if any.
    fn previous_destination(&self) -> Option<Destination>;

    /// The most recent back-stack entry with `route`, if it is still reachable.
    fn back_stack_entry(&self, route: &str) -> Option<Destination>;

    /// Pop entries until the most recent entry with `id` is on top, and pop that entry too when
    /// `inclusive` is set.
    ///
    /// Returns `false` when no entry with `id` exists or nothing was popped.
    fn pop_back_stack(&self, id: DestinationId, inclusive: bool) -> bool;

    /// Register a listener for current-destination changes.
    fn add_destination_listener(&self, listener: DestinationListener) -> ListenerKey;

    /// Remove a listener registered with [`add_destination_listener`](Self::add_destination_listener).
    fn remove_destination_listener(&self, key: ListenerKey);
}

/// One entry in the platform's back-interceptor chain.
pub trait BackInterceptor {
    /// Whether this interceptor currently takes part in the chain.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Handle a back event.
    fn handle_back(&self);
}

/// The platform-level back-signal dispatcher.
///
/// The most recently added enabled interceptor receives each back event.
pub trait BackDispatcher {
    /// Add an interceptor on behalf of `owner`.
    fn add_interceptor(&self, owner: OwnerId, interceptor: Rc<dyn BackInterceptor>) -> ListenerKey;

    /// Remove an interceptor. Unknown keys are ignored.
    fn remove_interceptor(&self, key: ListenerKey);

    /// Whether any added interceptor is enabled.
    fn has_active_interceptors(&self) -> bool;

    /// Deliver one back event to the interceptor chain.
    fn trigger_back(&self);
}

/// Receives lifecycle transitions of an owner. All methods default to doing nothing.
pub trait LifecycleObserver {
    /// The owner became visible.
    fn on_start(&self, _owner: OwnerId) {}

    /// The owner became active and receives input.
    fn on_resume(&self, _owner: OwnerId) {}

    /// The owner stopped receiving input.
    fn on_pause(&self, _owner: OwnerId) {}

    /// The owner is no longer visible.
    fn on_stop(&self, _owner: OwnerId) {}
}

/// A source of lifecycle transitions.
pub trait Lifecycle {
    /// Register an observer.
    fn add_observer(&self, observer: Rc<dyn LifecycleObserver>) -> ListenerKey;

    /// Remove an observer registered with [`add_observer`](Self::add_observer).
    fn remove_observer(&self, key: ListenerKey);
}

/// Callback registered with [`Pager::add_page_listener`]. Receives the page the view settled on.
pub type PageChangeListener = Rc<dyn Fn(usize)>;

/// A horizontally paged sub-view.
pub trait Pager {
    /// Index of the current page.
    fn current_page(&self) -> usize;

    /// Whether a scroll animation is in flight.
    fn is_scroll_in_progress(&self) -> bool;

    /// Start an animated scroll to `page`. Returns without waiting for the animation.
    fn animate_scroll_to_page(&self, page: usize);

    /// Register a listener called whenever the view settles on a different page, by swipe or at
    /// the end of an animated scroll.
    fn add_page_listener(&self, listener: PageChangeListener) -> ListenerKey;

    /// Remove a listener registered with [`add_page_listener`](Self::add_page_listener).
    fn remove_page_listener(&self, key: ListenerKey);
}
