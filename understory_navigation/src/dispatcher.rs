// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-host navigation dispatcher.
//!
//! ## Overview
//!
//! A [`NavigationDispatcher`] wraps one navigation host and coordinates back handling for it:
//!
//! - It mirrors the host's start, current and previous destinations, and counts how many times the
//!   start route has been entered going forward (its *occupancy*), so the root screen can tell a
//!   "back to root" from a fresh arrival.
//! - It resolves back presses through the [`BackChain`]: veto hooks, then a bound pager, then a pop
//!   through the platform back dispatcher.
//! - It keeps one [`LatestValue`] channel per route for passing results backward.
//! - While its lifecycle owner is resumed it keeps exactly one interceptor registered with the
//!   platform back dispatcher, ahead of everything registered before it.
//!
//! Hooks and the pager binding belong to the screen that set them: every destination change clears
//! them.
//!
//! ## Epochs
//!
//! An arrival with no entry below it (the bottom of the stack) starts a new epoch: the start
//! destination is reset to that arrival and occupancy restarts at 1. Forward arrivals on the start
//! route increment occupancy; backward pops issued by the dispatcher while the start route is
//! current decrement it.
//!
//! ## Minimal example
//!
//! ```
//! use std::rc::Rc;
//! use understory_navigation::NavigationDispatcher;
//! use understory_navigation::headless::{HeadlessBackDispatcher, HeadlessLifecycle, HeadlessNavHost};
//! use understory_navigation::tracker::DestinationTracker;
//! use understory_navigation::types::OwnerId;
//!
//! let host = Rc::new(HeadlessNavHost::new());
//! let back = Rc::new(HeadlessBackDispatcher::new());
//! let _system = host.intercept_back(&back, OwnerId(0));
//! let lifecycle = Rc::new(HeadlessLifecycle::new(OwnerId(1)));
//! lifecycle.resume();
//!
//! let tracker = Rc::new(DestinationTracker::new("home"));
//! let nav = NavigationDispatcher::new(&lifecycle, Rc::clone(&host), Rc::clone(&back), tracker);
//!
//! host.navigate("home");
//! host.navigate("detail");
//! nav.write_to_back_channel("saved".to_string()).unwrap();
//! assert_eq!(host.routes(), ["home"]);
//!
//! let result = nav.read_channel::<String>(None).unwrap();
//! assert_eq!(result.get().as_deref(), Some("saved"));
//! ```

use alloc::collections::BTreeSet;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::back::{BackChain, BackDecision, BackVeto, ForcedBackVeto};
use crate::channel::{ChannelError, ChannelRegistry, LatestValue};
use crate::host::{BackDispatcher, BackInterceptor, Lifecycle, LifecycleObserver, NavHost, Pager};
use crate::observe::{Observation, observe_destinations, observe_lifecycle};
use crate::tracker::DestinationTracker;
use crate::types::{Destination, DestinationChange, OwnerId};

/// Callback for pager page changes: `(page, is_back)`.
pub type PageListener = Rc<dyn Fn(usize, bool)>;

struct PagerBinding {
    pager: Rc<dyn Pager>,
    enabled: bool,
    skip: BTreeSet<usize>,
    last_observed_page: usize,
    page_listener: Option<PageListener>,
    _page_subscription: Observation,
}

/// Everything a screen installs that a destination change clears.
#[expect(dead_code, reason = "held only so the closures drop after the state borrow ends")]
struct ScreenScope {
    pager: Option<PagerBinding>,
    veto: Option<BackVeto>,
    forced_veto: Option<ForcedBackVeto>,
}

struct DispatcherState {
    start: Option<Destination>,
    current: Option<Destination>,
    back: Option<Destination>,
    first_destination_count: usize,
    is_back: bool,
    pager: Option<PagerBinding>,
    veto: Option<BackVeto>,
    forced_veto: Option<ForcedBackVeto>,
    interception_enabled: bool,
    owner: Option<OwnerId>,
}

impl DispatcherState {
    fn new() -> Self {
        Self {
            start: None,
            current: None,
            back: None,
            first_destination_count: 0,
            is_back: false,
            pager: None,
            veto: None,
            forced_veto: None,
            interception_enabled: true,
            owner: None,
        }
    }

    /// Detach screen-scoped state. The caller drops it after releasing the borrow.
    fn take_screen_scope(&mut self) -> ScreenScope {
        self.interception_enabled = true;
        ScreenScope {
            pager: self.pager.take(),
            veto: self.veto.take(),
            forced_veto: self.forced_veto.take(),
        }
    }

    fn reset_epoch(&mut self) {
        self.start = None;
        self.first_destination_count = 0;
        self.is_back = false;
    }

    fn on_start_route(&self) -> bool {
        self.start.as_ref().map(Destination::route) == self.current.as_ref().map(Destination::route)
    }

    /// Mark the next destination change as backward.
    fn begin_backward(&mut self) -> bool {
        self.is_back = true;
        let leaving_start = self.on_start_route() && self.first_destination_count > 0;
        if leaving_start {
            self.first_destination_count -= 1;
        }
        leaving_start
    }

    fn cancel_backward(&mut self, decremented: bool) {
        self.is_back = false;
        if decremented {
            self.first_destination_count += 1;
        }
    }
}

struct Inner<H, B> {
    host: Rc<H>,
    back: Rc<B>,
    tracker: Rc<DestinationTracker>,
    state: RefCell<DispatcherState>,
    channels: ChannelRegistry,
    interceptor: RefCell<Option<Observation>>,
    subscriptions: RefCell<Vec<Observation>>,
}

/// Back-press coordinator for one navigation host.
///
/// Handles are cheap to clone and share state. The host listener and the lifecycle observer
/// installed by [`new`](Self::new) stay registered until [`detach`](Self::detach) is called or the
/// last handle is dropped.
pub struct NavigationDispatcher<H, B> {
    inner: Rc<Inner<H, B>>,
}

impl<H, B> Clone for NavigationDispatcher<H, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: NavHost + 'static, B: BackDispatcher + 'static> NavigationDispatcher<H, B> {
    /// Create a dispatcher for `host`, subscribed to its destination changes and to `lifecycle`.
    ///
    /// If `lifecycle` is already resumed the back interceptor is registered before this returns.
    pub fn new<L>(
        lifecycle: &Rc<L>,
        host: Rc<H>,
        back: Rc<B>,
        tracker: Rc<DestinationTracker>,
    ) -> Self
    where
        L: Lifecycle + ?Sized + 'static,
    {
        let dispatcher = Self {
            inner: Rc::new(Inner {
                host,
                back,
                tracker,
                state: RefCell::new(DispatcherState::new()),
                channels: ChannelRegistry::default(),
                interceptor: RefCell::new(None),
                subscriptions: RefCell::new(Vec::new()),
            }),
        };

        let weak = Rc::downgrade(&dispatcher.inner);
        let destinations = observe_destinations(&dispatcher.inner.host, move |change| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.on_destination_changed(change);
            }
        });
        dispatcher.inner.subscriptions.borrow_mut().push(destinations);

        let observer: Rc<dyn LifecycleObserver> = Rc::new(DispatcherLifecycle {
            inner: Rc::downgrade(&dispatcher.inner),
        });
        let lifecycle = observe_lifecycle(lifecycle, observer);
        dispatcher.inner.subscriptions.borrow_mut().push(lifecycle);

        dispatcher
    }

    /// The wrapped host.
    pub fn host(&self) -> &Rc<H> {
        &self.inner.host
    }

    /// The platform back dispatcher.
    pub fn back_dispatcher(&self) -> &Rc<B> {
        &self.inner.back
    }

    /// The shared tracker.
    pub fn tracker(&self) -> &Rc<DestinationTracker> {
        &self.inner.tracker
    }

    /// The first destination of the current epoch.
    pub fn start_destination(&self) -> Option<Destination> {
        self.inner.state.borrow().start.clone()
    }

    /// The last destination observed.
    pub fn current_destination(&self) -> Option<Destination> {
        self.inner.state.borrow().current.clone()
    }

    /// The destination observed before the current one.
    pub fn back_destination(&self) -> Option<Destination> {
        self.inner.state.borrow().back.clone()
    }

    /// Occupancy of the start route in the current epoch.
    pub fn first_destination_count(&self) -> usize {
        self.inner.state.borrow().first_destination_count
    }

    /// The resumed lifecycle owner, if any.
    pub fn lifecycle_owner(&self) -> Option<OwnerId> {
        self.inner.state.borrow().owner
    }

    /// Whether the dispatcher's interceptor is registered with the back dispatcher.
    pub fn is_interceptor_installed(&self) -> bool {
        self.inner.interceptor.borrow().is_some()
    }

    fn current_route(&self) -> Option<String> {
        self.inner
            .state
            .borrow()
            .current
            .as_ref()
            .map(|d| String::from(d.route()))
    }

    fn on_destination_changed(&self, change: &DestinationChange) {
        let destination = &change.destination;
        let released = {
            let mut state = self.inner.state.borrow_mut();
            if change.is_stack_bottom() {
                state.reset_epoch();
            }
            if state.start.is_none() {
                state.start = Some(destination.clone());
                state.first_destination_count = 0;
            }
            let is_start_route = state
                .start
                .as_ref()
                .is_some_and(|start| start.route() == destination.route());
            if is_start_route && !state.is_back {
                state.first_destination_count += 1;
            }
            let released = state.take_screen_scope();
            state.back = state.current.replace(destination.clone());
            tracing::debug!(
                %destination,
                backward = state.is_back,
                occupancy = state.first_destination_count,
                "destination changed"
            );
            state.is_back = false;
            released
        };
        drop(released);
        self.inner.tracker.record(destination.route());
    }

    fn resume(&self, owner: OwnerId) {
        self.inner.state.borrow_mut().owner = Some(owner);
        self.install_interceptor(owner);
    }

    fn pause(&self) {
        self.inner.state.borrow_mut().owner = None;
        let removed = self.inner.interceptor.borrow_mut().take();
        drop(removed);
    }

    fn install_interceptor(&self, owner: OwnerId) {
        let interceptor: Rc<dyn BackInterceptor> = Rc::new(DispatcherInterceptor {
            inner: Rc::downgrade(&self.inner),
        });
        let key = self.inner.back.add_interceptor(owner, interceptor);
        let back = Rc::downgrade(&self.inner.back);
        let registration = Observation::new(move || {
            if let Some(back) = back.upgrade() {
                back.remove_interceptor(key);
            }
        });
        let previous = self.inner.interceptor.replace(Some(registration));
        drop(previous);
        tracing::trace!(owner = owner.0, "installed dispatcher back interceptor");
    }

    fn back_chain(&self) -> BackChain {
        let state = self.inner.state.borrow();
        let mut chain = BackChain::new();
        if let Some(veto) = &state.veto {
            chain = chain.with_veto(Rc::clone(veto));
        }
        if let Some(veto) = &state.forced_veto {
            chain = chain.with_forced_veto(Rc::clone(veto));
        }
        if let Some(current) = &state.current {
            chain = chain.with_destination(current.clone());
        }
        if let Some(binding) = &state.pager {
            chain = chain.with_pager(Rc::clone(&binding.pager), binding.enabled, binding.skip.clone());
        }
        chain
    }

    /// Resolve one back press and carry out the decision.
    pub fn on_back_pressed(&self) -> BackDecision {
        let chain = self.back_chain();
        let decision = chain.evaluate();
        tracing::debug!(?decision, "back pressed");
        match decision {
            BackDecision::ScrollTo(page) => {
                if let Some(pager) = chain.pager() {
                    pager.animate_scroll_to_page(page);
                }
            }
            BackDecision::Pop => self.pop_via_platform(),
            BackDecision::Consumed(_) | BackDecision::Debounced => {}
        }
        decision
    }

    /// Return a result: store `value` in the channel of the back destination (the screen being
    /// returned to), then resolve a back press.
    ///
    /// With no destination below, the value is dropped and the back press still happens.
    pub fn write_to_back_channel<T: Clone + 'static>(
        &self,
        value: T,
    ) -> Result<BackDecision, ChannelError> {
        let back_route = self
            .inner
            .state
            .borrow()
            .back
            .as_ref()
            .map(|d| String::from(d.route()));
        match back_route {
            Some(route) => self.inner.channels.write(&route, value)?,
            None => tracing::debug!("no back destination to return a value to"),
        }
        Ok(self.on_back_pressed())
    }

    /// Pop back to the most recent entry with `route` and store `value` in its channel.
    ///
    /// Returns `Ok(false)` and leaves the stack alone when no such entry is on the stack, or when it
    /// is already on top.
    pub fn on_back_pressed_to<T: Clone + 'static>(
        &self,
        route: &str,
        value: T,
    ) -> Result<bool, ChannelError> {
        let Some(target) = self.inner.host.back_stack_entry(route) else {
            tracing::debug!(route, "no back stack entry to return to");
            return Ok(false);
        };
        let channel = self.inner.channels.channel::<T>(route, || None)?;
        let decremented = self.inner.state.borrow_mut().begin_backward();
        if !self.inner.host.pop_back_stack(target.id(), false) {
            self.inner.state.borrow_mut().cancel_backward(decremented);
            return Ok(false);
        }
        channel.set(Some(value));
        Ok(true)
    }

    /// Drop every hook and the pager binding, then resolve a back press.
    pub fn on_back_pressed_with_clear(&self) -> BackDecision {
        let released = self.inner.state.borrow_mut().take_screen_scope();
        drop(released);
        self.on_back_pressed()
    }

    /// Pop by handing one back event to the platform back dispatcher.
    ///
    /// The dispatcher's own interceptor is unregistered for the duration so the event reaches the
    /// next handler in the chain. If that handler changes no destination, the backward mark and the
    /// occupancy are rolled back.
    fn pop_via_platform(&self) {
        let decremented = self.inner.state.borrow_mut().begin_backward();
        let removed = self.inner.interceptor.borrow_mut().take();
        drop(removed);
        self.inner.back.trigger_back();
        let owner = {
            let mut state = self.inner.state.borrow_mut();
            if state.is_back {
                tracing::trace!("back event changed no destination");
                state.cancel_backward(decremented);
            }
            state.owner
        };
        if let Some(owner) = owner {
            self.install_interceptor(owner);
        }
    }

    /// Whether a back press would do anything here.
    ///
    /// `true` while an enabled pager is past its first page. `false` on the start route with an
    /// occupancy of at most one. Otherwise, whether the platform back dispatcher has an enabled
    /// interceptor.
    pub fn has_enabled_callbacks(&self) -> bool {
        let (pager, at_root) = {
            let state = self.inner.state.borrow();
            let pager = state
                .pager
                .as_ref()
                .filter(|binding| binding.enabled)
                .map(|binding| Rc::clone(&binding.pager));
            (pager, state.on_start_route() && state.first_destination_count <= 1)
        };
        if pager.is_some_and(|pager| pager.current_page() > 0) {
            return true;
        }
        if at_root {
            return false;
        }
        self.inner.back.has_active_interceptors()
    }

    /// The channel of the current route.
    ///
    /// `initial` seeds a channel that does not exist yet and is ignored otherwise. Before any
    /// destination is observed the channel is keyed by the empty route.
    pub fn read_channel<T: Clone + 'static>(
        &self,
        initial: Option<T>,
    ) -> Result<LatestValue<T>, ChannelError> {
        let route = self.current_route().unwrap_or_default();
        self.read_channel_for(&route, initial)
    }

    /// The channel of `route`, created with `initial` if absent.
    pub fn read_channel_for<T: Clone + 'static>(
        &self,
        route: &str,
        initial: Option<T>,
    ) -> Result<LatestValue<T>, ChannelError> {
        self.inner.channels.channel(route, || initial)
    }

    /// Store `value` in the channel of `route`.
    pub fn write_to_channel<T: Clone + 'static>(
        &self,
        route: &str,
        value: T,
    ) -> Result<(), ChannelError> {
        self.inner.channels.write(route, value)
    }

    /// Whether a channel exists for `route`.
    pub fn has_channel(&self, route: &str) -> bool {
        self.inner.channels.contains(route)
    }

    /// Pop the current destination and run `action`, typically a navigation to a replacement.
    ///
    /// Returns `false` without running `action` before any destination is observed.
    pub fn pop_to_and_run(&self, action: impl FnOnce()) -> bool {
        let Some(current) = self.current_destination() else {
            return false;
        };
        self.inner.host.pop_back_stack(current.id(), true);
        action();
        true
    }

    /// Pop every entry of the current epoch, reset the epoch, then run `actions` in order.
    ///
    /// Does nothing and returns `false` when `actions` is empty.
    pub fn pop_all_to_root_and_run<I, F>(&self, actions: I) -> bool
    where
        I: IntoIterator<Item = F>,
        F: FnOnce(),
    {
        let actions: Vec<F> = actions.into_iter().collect();
        if actions.is_empty() {
            return false;
        }
        let (start, count) = {
            let state = self.inner.state.borrow();
            (state.start.clone(), state.first_destination_count)
        };
        if let Some(start) = &start {
            for _ in 0..=count {
                self.inner.host.pop_back_stack(start.id(), true);
            }
        }
        let released = {
            let mut state = self.inner.state.borrow_mut();
            state.reset_epoch();
            state.take_screen_scope()
        };
        drop(released);
        tracing::debug!(pops = count + 1, actions = actions.len(), "popped to root");
        for action in actions {
            action();
        }
        true
    }

    /// Install the simple veto hook, replacing any previous one.
    pub fn set_back_veto(&self, veto: impl Fn() -> bool + 'static) {
        let previous = self.inner.state.borrow_mut().veto.replace(Rc::new(veto));
        drop(previous);
    }

    /// Remove the simple veto hook.
    pub fn remove_back_veto(&self) {
        let previous = self.inner.state.borrow_mut().veto.take();
        drop(previous);
    }

    /// Whether a simple veto hook is installed.
    pub fn has_back_veto(&self) -> bool {
        self.inner.state.borrow().veto.is_some()
    }

    /// Install the forced veto hook, replacing any previous one.
    pub fn set_forced_back_veto(&self, veto: impl Fn(Option<&Destination>) -> bool + 'static) {
        let previous = self
            .inner
            .state
            .borrow_mut()
            .forced_veto
            .replace(Rc::new(veto));
        drop(previous);
    }

    /// Remove the forced veto hook.
    pub fn remove_forced_back_veto(&self) {
        let previous = self.inner.state.borrow_mut().forced_veto.take();
        drop(previous);
    }

    /// Whether a forced veto hook is installed.
    pub fn has_forced_back_veto(&self) -> bool {
        self.inner.state.borrow().forced_veto.is_some()
    }

    /// Take the dispatcher's interceptor out of the chain (or back in) until the next destination
    /// change, without unregistering it.
    pub fn set_back_interception_enabled(&self, enabled: bool) {
        self.inner.state.borrow_mut().interception_enabled = enabled;
    }

    /// See [`set_back_interception_enabled`](Self::set_back_interception_enabled).
    pub fn is_back_interception_enabled(&self) -> bool {
        self.inner.state.borrow().interception_enabled
    }

    /// Bind a paged view to the current screen. Pages in `skip` are jumped over on back.
    ///
    /// Ignored, returning `false`, while a pager is already bound.
    pub fn set_pager<P: Pager + 'static>(
        &self,
        pager: Rc<P>,
        skip: impl IntoIterator<Item = usize>,
    ) -> bool {
        if self.has_pager() {
            return false;
        }
        let pager: Rc<dyn Pager> = pager;
        let page_subscription = self.follow_pager(&pager);
        let last_observed_page = pager.current_page();
        self.inner.state.borrow_mut().pager = Some(PagerBinding {
            pager,
            enabled: true,
            skip: skip.into_iter().collect(),
            last_observed_page,
            page_listener: None,
            _page_subscription: page_subscription,
        });
        true
    }

    /// Feed the pager's settled pages into [`notify_page_changed`](Self::notify_page_changed)
    /// until the returned observation is dropped.
    fn follow_pager(&self, pager: &Rc<dyn Pager>) -> Observation {
        let inner = Rc::downgrade(&self.inner);
        let key = pager.add_page_listener(Rc::new(move |page| {
            if let Some(inner) = inner.upgrade() {
                NavigationDispatcher { inner }.notify_page_changed(page);
            }
        }));
        let pager = Rc::downgrade(pager);
        Observation::new(move || {
            if let Some(pager) = pager.upgrade() {
                pager.remove_page_listener(key);
            }
        })
    }

    /// Unbind the paged view.
    pub fn remove_pager(&self) {
        let previous = self.inner.state.borrow_mut().pager.take();
        drop(previous);
    }

    /// Whether a paged view is bound.
    pub fn has_pager(&self) -> bool {
        self.inner.state.borrow().pager.is_some()
    }

    /// Let back presses step the bound pager. No-op without a pager.
    pub fn enable_pager(&self) {
        self.set_pager_enabled(true);
    }

    /// Let back presses pop past the bound pager. No-op without a pager.
    pub fn disable_pager(&self) {
        self.set_pager_enabled(false);
    }

    fn set_pager_enabled(&self, enabled: bool) {
        match self.inner.state.borrow_mut().pager.as_mut() {
            Some(binding) => binding.enabled = enabled,
            None => tracing::trace!(enabled, "no pager bound"),
        }
    }

    /// Whether the bound pager steps on back; `None` without a pager.
    pub fn is_pager_enabled(&self) -> Option<bool> {
        self.inner
            .state
            .borrow()
            .pager
            .as_ref()
            .map(|binding| binding.enabled)
    }

    /// Observe page changes of the bound pager as `(page, is_back)`.
    ///
    /// The listener is called at once with the current page. Ignored, returning `false`, without a
    /// pager.
    pub fn set_page_listener(&self, listener: impl Fn(usize, bool) + 'static) -> bool {
        let pager = {
            let mut state = self.inner.state.borrow_mut();
            let Some(binding) = state.pager.as_mut() else {
                return false;
            };
            binding.page_listener = Some(Rc::new(listener));
            Rc::clone(&binding.pager)
        };
        self.notify_page_changed(pager.current_page());
        true
    }

    /// Report that the bound pager settled on `page`.
    ///
    /// The binding calls this on its own for every page the pager reports through
    /// [`Pager::add_page_listener`]. `is_back` is passed to the page listener when `page` is lower
    /// than the last reported page.
    pub fn notify_page_changed(&self, page: usize) {
        let (listener, is_back) = {
            let mut state = self.inner.state.borrow_mut();
            let Some(binding) = state.pager.as_mut() else {
                return;
            };
            let is_back = binding.last_observed_page > page;
            binding.last_observed_page = page;
            (binding.page_listener.clone(), is_back)
        };
        if let Some(listener) = listener {
            listener(page, is_back);
        }
    }

    /// Cancel the host subscription, the lifecycle subscription, and the back interceptor.
    pub fn detach(&self) {
        let interceptor = self.inner.interceptor.borrow_mut().take();
        let subscriptions = core::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        drop(interceptor);
        drop(subscriptions);
        self.inner.state.borrow_mut().owner = None;
    }
}

impl<H, B> fmt::Debug for NavigationDispatcher<H, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("NavigationDispatcher")
            .field("start", &state.start)
            .field("current", &state.current)
            .field("back", &state.back)
            .field("first_destination_count", &state.first_destination_count)
            .field("owner", &state.owner)
            .field("channels", &self.inner.channels)
            .finish_non_exhaustive()
    }
}

struct DispatcherInterceptor<H, B> {
    inner: Weak<Inner<H, B>>,
}

impl<H: NavHost + 'static, B: BackDispatcher + 'static> BackInterceptor
    for DispatcherInterceptor<H, B>
{
    fn is_enabled(&self) -> bool {
        self.inner.upgrade().is_some_and(|inner| {
            inner.state.borrow().interception_enabled && !inner.tracker.is_clear_in_progress()
        })
    }

    fn handle_back(&self) {
        if let Some(inner) = self.inner.upgrade() {
            NavigationDispatcher { inner }.on_back_pressed();
        }
    }
}

struct DispatcherLifecycle<H, B> {
    inner: Weak<Inner<H, B>>,
}

impl<H: NavHost + 'static, B: BackDispatcher + 'static> LifecycleObserver
    for DispatcherLifecycle<H, B>
{
    fn on_resume(&self, owner: OwnerId) {
        if let Some(inner) = self.inner.upgrade() {
            NavigationDispatcher { inner }.resume(owner);
        }
    }

    fn on_pause(&self, _owner: OwnerId) {
        if let Some(inner) = self.inner.upgrade() {
            NavigationDispatcher { inner }.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use core::cell::Cell;

    use crate::back::BackStage;
    use crate::headless::{HeadlessBackDispatcher, HeadlessLifecycle, HeadlessNavHost, HeadlessPager};
    use crate::screen::ScreenBackHandler;

    type Nav = NavigationDispatcher<HeadlessNavHost, HeadlessBackDispatcher>;

    struct Fixture {
        host: Rc<HeadlessNavHost>,
        back: Rc<HeadlessBackDispatcher>,
        lifecycle: Rc<HeadlessLifecycle>,
        tracker: Rc<DestinationTracker>,
        nav: Nav,
        _system: Observation,
    }

    fn fixture() -> Fixture {
        let host = Rc::new(HeadlessNavHost::new());
        let back = Rc::new(HeadlessBackDispatcher::new());
        let system = host.intercept_back(&back, OwnerId(0));
        let lifecycle = Rc::new(HeadlessLifecycle::new(OwnerId(1)));
        lifecycle.resume();
        let tracker = Rc::new(DestinationTracker::new("home"));
        let nav = NavigationDispatcher::new(
            &lifecycle,
            Rc::clone(&host),
            Rc::clone(&back),
            Rc::clone(&tracker),
        );
        Fixture {
            host,
            back,
            lifecycle,
            tracker,
            nav,
            _system: system,
        }
    }

    fn route(destination: Option<Destination>) -> Option<String> {
        destination.map(|d| String::from(d.route()))
    }

    #[test]
    fn first_arrival_sets_start() {
        let f = fixture();
        f.host.navigate("home");
        assert_eq!(route(f.nav.start_destination()).as_deref(), Some("home"));
        assert_eq!(route(f.nav.current_destination()).as_deref(), Some("home"));
        assert_eq!(f.nav.back_destination(), None);
        assert_eq!(f.nav.first_destination_count(), 1);
        assert_eq!(f.tracker.root_route().as_deref(), Some("home"));
    }

    #[test]
    fn occupancy_counts_forward_entries_to_start() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("detail");
        f.host.navigate("home");
        assert_eq!(f.nav.first_destination_count(), 2);
        assert_eq!(route(f.nav.back_destination()).as_deref(), Some("detail"));

        f.nav.on_back_pressed();
        assert_eq!(f.host.routes(), ["home", "detail"]);
        assert_eq!(f.nav.first_destination_count(), 1);

        f.nav.on_back_pressed();
        assert_eq!(f.host.routes(), ["home"]);
        assert_eq!(f.nav.first_destination_count(), 1);
    }

    #[test]
    fn repeated_start_then_detail() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("home");
        assert_eq!(f.nav.first_destination_count(), 2);
        f.host.navigate("detail");
        assert_eq!(f.nav.first_destination_count(), 2);
        assert_eq!(route(f.nav.current_destination()).as_deref(), Some("detail"));
        assert_eq!(route(f.nav.back_destination()).as_deref(), Some("home"));
    }

    #[test]
    fn late_observer_sees_returned_value() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("picker");
        f.nav.write_to_back_channel(42_i32).unwrap();
        let seen = Rc::new(Cell::new(None));
        let _observation = {
            let seen = Rc::clone(&seen);
            f.nav
                .read_channel::<i32>(None)
                .unwrap()
                .observe(move |v| seen.set(*v))
        };
        assert_eq!(seen.get(), Some(42));
    }

    #[test]
    fn skipped_page_is_jumped_on_back() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("tabs");
        let pager = Rc::new(HeadlessPager::with_page(3, 2));
        f.nav.set_pager(Rc::clone(&pager), [1]);
        assert_eq!(f.nav.on_back_pressed(), BackDecision::ScrollTo(0));
        assert_eq!(pager.finish_scroll(), Some(0));
        assert_eq!(f.host.depth(), 2);
    }

    #[test]
    fn root_has_no_enabled_callbacks() {
        let f = fixture();
        f.host.navigate("home");
        assert!(!f.nav.has_enabled_callbacks());
        f.host.navigate("detail");
        assert!(f.nav.has_enabled_callbacks());
        f.nav.on_back_pressed();
        assert!(!f.nav.has_enabled_callbacks());
    }

    #[test]
    fn result_reaches_previous_screen() {
        let f = fixture();
        f.host.navigate("list");
        f.host.navigate("editor");
        let decision = f.nav.write_to_back_channel(7_u32).unwrap();
        assert_eq!(decision, BackDecision::Pop);
        assert_eq!(f.host.routes(), ["list"]);
        let channel = f.nav.read_channel::<u32>(None).unwrap();
        assert_eq!(channel.get(), Some(7));
    }

    #[test]
    fn result_without_back_destination_is_dropped() {
        let f = fixture();
        f.host.navigate("home");
        assert_eq!(f.nav.write_to_back_channel(1_u8).unwrap(), BackDecision::Pop);
        assert!(!f.nav.has_channel("home"));
        assert_eq!(f.host.depth(), 1);
    }

    #[test]
    fn mismatched_result_type_does_not_navigate() {
        let f = fixture();
        f.host.navigate("list");
        f.nav.read_channel::<u32>(None).unwrap();
        f.host.navigate("editor");
        assert!(f.nav.write_to_back_channel("text").is_err());
        assert_eq!(f.host.routes(), ["list", "editor"]);
    }

    #[test]
    fn back_to_named_route_pops_and_delivers() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("search");
        f.host.navigate("results");
        f.host.navigate("item");
        assert_eq!(f.nav.on_back_pressed_to("search", "picked"), Ok(true));
        assert_eq!(f.host.routes(), ["home", "search"]);
        let channel = f.nav.read_channel::<&str>(None).unwrap();
        assert_eq!(channel.get(), Some("picked"));
        assert_eq!(f.nav.first_destination_count(), 1);
    }

    #[test]
    fn back_to_missing_route_is_noop() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("item");
        assert_eq!(f.nav.on_back_pressed_to("search", 1_i32), Ok(false));
        assert_eq!(f.host.routes(), ["home", "item"]);
        assert!(!f.nav.has_channel("search"));
    }

    #[test]
    fn back_to_current_route_changes_nothing() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("home");
        assert_eq!(f.nav.on_back_pressed_to("home", 1_i32), Ok(false));
        assert_eq!(f.nav.first_destination_count(), 2);
        f.host.navigate("detail");
        f.host.navigate("home");
        assert_eq!(f.nav.first_destination_count(), 3);
    }

    #[test]
    fn veto_consumes_before_forced_veto() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("form");
        let forced_calls = Rc::new(Cell::new(0));
        f.nav.set_back_veto(|| true);
        {
            let forced_calls = Rc::clone(&forced_calls);
            f.nav.set_forced_back_veto(move |_| {
                forced_calls.set(forced_calls.get() + 1);
                true
            });
        }
        assert_eq!(f.nav.on_back_pressed(), BackDecision::Consumed(BackStage::Veto));
        assert_eq!(forced_calls.get(), 0);
        assert_eq!(f.host.depth(), 2);

        f.nav.remove_back_veto();
        assert_eq!(
            f.nav.on_back_pressed(),
            BackDecision::Consumed(BackStage::ForcedVeto)
        );
        assert_eq!(forced_calls.get(), 1);
    }

    #[test]
    fn forced_veto_receives_current_destination() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("form");
        f.nav.set_forced_back_veto(|d| d.is_some_and(|d| d.route() == "form"));
        assert_eq!(
            f.nav.on_back_pressed(),
            BackDecision::Consumed(BackStage::ForcedVeto)
        );
    }

    #[test]
    fn declined_vetoes_pop() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("form");
        f.nav.set_back_veto(|| false);
        f.nav.set_forced_back_veto(|_| false);
        assert_eq!(f.nav.on_back_pressed(), BackDecision::Pop);
        assert_eq!(f.host.routes(), ["home"]);
    }

    #[test]
    fn destination_change_clears_screen_scope() {
        let f = fixture();
        f.host.navigate("home");
        f.nav.set_back_veto(|| true);
        f.nav.set_forced_back_veto(|_| true);
        f.nav.set_pager(Rc::new(HeadlessPager::new(3)), []);
        f.nav.set_back_interception_enabled(false);
        f.host.navigate("detail");
        assert!(!f.nav.has_back_veto());
        assert!(!f.nav.has_forced_back_veto());
        assert!(!f.nav.has_pager());
        assert!(f.nav.is_back_interception_enabled());
    }

    #[test]
    fn with_clear_drops_hooks_then_pops() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("form");
        f.nav.set_back_veto(|| true);
        assert_eq!(f.nav.on_back_pressed_with_clear(), BackDecision::Pop);
        assert_eq!(f.host.routes(), ["home"]);
    }

    #[test]
    fn pager_steps_back_with_skip() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("wizard");
        let pager = Rc::new(HeadlessPager::with_page(4, 3));
        assert!(f.nav.set_pager(Rc::clone(&pager), [2]));
        assert!(!f.nav.set_pager(Rc::new(HeadlessPager::new(2)), []));

        assert_eq!(f.nav.on_back_pressed(), BackDecision::ScrollTo(1));
        assert_eq!(pager.pending_target(), Some(1));
        assert_eq!(f.nav.on_back_pressed(), BackDecision::Debounced);
        assert_eq!(pager.pending_target(), Some(1));

        pager.finish_scroll();
        assert_eq!(f.nav.on_back_pressed(), BackDecision::ScrollTo(0));
        pager.finish_scroll();
        assert_eq!(f.nav.on_back_pressed(), BackDecision::Pop);
        assert_eq!(f.host.routes(), ["home"]);
    }

    #[test]
    fn disabled_pager_falls_through() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("wizard");
        let pager = Rc::new(HeadlessPager::with_page(3, 2));
        f.nav.set_pager(Rc::clone(&pager), []);
        f.nav.disable_pager();
        assert_eq!(f.nav.is_pager_enabled(), Some(false));
        assert_eq!(f.nav.on_back_pressed(), BackDecision::Pop);
        assert_eq!(pager.current_page(), 2);
    }

    #[test]
    fn pager_past_first_page_enables_callbacks_on_root() {
        let f = fixture();
        f.host.navigate("home");
        let pager = Rc::new(HeadlessPager::with_page(3, 1));
        f.nav.set_pager(Rc::clone(&pager), []);
        assert!(f.nav.has_enabled_callbacks());
        f.nav.disable_pager();
        assert!(!f.nav.has_enabled_callbacks());
        f.nav.enable_pager();
        pager.scroll_to_page(0);
        assert!(!f.nav.has_enabled_callbacks());
    }

    #[test]
    fn page_listener_reports_direction() {
        let f = fixture();
        f.host.navigate("home");
        let seen = Rc::new(RefCell::new(Vec::new()));
        assert!(!f.nav.set_page_listener(|_, _| {}));
        f.nav.set_pager(Rc::new(HeadlessPager::with_page(4, 1)), []);
        {
            let seen = Rc::clone(&seen);
            assert!(f.nav.set_page_listener(move |page, is_back| {
                seen.borrow_mut().push((page, is_back));
            }));
        }
        f.nav.notify_page_changed(3);
        f.nav.notify_page_changed(2);
        assert_eq!(*seen.borrow(), vec![(1, false), (3, false), (2, true)]);
    }

    #[test]
    fn page_listener_follows_pager() {
        let f = fixture();
        f.host.navigate("home");
        let pager = Rc::new(HeadlessPager::with_page(3, 2));
        assert!(f.nav.set_pager(Rc::clone(&pager), []));
        assert_eq!(pager.listener_count(), 1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = Rc::clone(&seen);
            assert!(f.nav.set_page_listener(move |page, is_back| {
                seen.borrow_mut().push((page, is_back));
            }));
        }
        assert_eq!(f.nav.on_back_pressed(), BackDecision::ScrollTo(1));
        assert_eq!(seen.borrow().len(), 1);
        pager.finish_scroll();
        pager.scroll_to_page(2);
        assert_eq!(*seen.borrow(), vec![(2, false), (1, true), (2, false)]);
        f.host.navigate("a");
        assert_eq!(pager.listener_count(), 0);
    }

    #[test]
    fn pop_to_and_run_replaces_current() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("login");
        let host = Rc::clone(&f.host);
        assert!(f.nav.pop_to_and_run(move || {
            host.navigate("profile");
        }));
        assert_eq!(f.host.routes(), ["home", "profile"]);
    }

    #[test]
    fn pop_to_and_run_needs_a_destination() {
        let f = fixture();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        assert!(!f.nav.pop_to_and_run(move || flag.set(true)));
        assert!(!ran.get());
    }

    #[test]
    fn pop_all_to_root_unwinds_epoch() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("detail");
        f.host.navigate("home");
        f.host.navigate("settings");
        assert_eq!(f.nav.first_destination_count(), 2);

        let host = Rc::clone(&f.host);
        let order = Rc::new(RefCell::new(Vec::new()));
        let actions: Vec<Box<dyn FnOnce()>> = vec![
            {
                let order = Rc::clone(&order);
                Box::new(move || order.borrow_mut().push("first"))
            },
            {
                let order = Rc::clone(&order);
                Box::new(move || {
                    order.borrow_mut().push("second");
                    host.navigate("login");
                })
            },
        ];
        assert!(f.nav.pop_all_to_root_and_run(actions));
        assert_eq!(*order.borrow(), ["first", "second"]);
        assert_eq!(f.host.routes(), ["login"]);
        // The replacement root opened a new epoch.
        assert_eq!(route(f.nav.start_destination()).as_deref(), Some("login"));
        assert_eq!(f.nav.first_destination_count(), 1);
    }

    #[test]
    fn pop_all_to_root_with_no_actions_is_noop() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("detail");
        assert!(!f.nav.pop_all_to_root_and_run(Vec::<fn()>::new()));
        assert_eq!(f.host.depth(), 2);
    }

    #[test]
    fn interceptor_follows_lifecycle() {
        let f = fixture();
        assert!(f.nav.is_interceptor_installed());
        assert_eq!(f.nav.lifecycle_owner(), Some(OwnerId(1)));
        assert_eq!(f.back.owners(), [OwnerId(0), OwnerId(1)]);
        f.lifecycle.pause();
        assert!(!f.nav.is_interceptor_installed());
        assert_eq!(f.back.owners(), [OwnerId(0)]);
        f.lifecycle.resume();
        assert_eq!(f.back.owners(), [OwnerId(0), OwnerId(1)]);
    }

    #[test]
    fn platform_back_routes_through_dispatcher() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("form");
        f.nav.set_back_veto(|| true);
        f.back.trigger_back();
        assert_eq!(f.host.depth(), 2);
        f.nav.remove_back_veto();
        f.back.trigger_back();
        assert_eq!(f.host.routes(), ["home"]);
        // Reinstalled after the pop.
        assert_eq!(f.back.interceptor_count(), 2);
    }

    #[test]
    fn interception_can_be_switched_off() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("form");
        f.nav.set_back_veto(|| true);
        f.nav.set_back_interception_enabled(false);
        f.back.trigger_back();
        assert_eq!(f.host.routes(), ["home"]);
    }

    #[test]
    fn pop_hands_event_to_screen_handler_below() {
        let f = fixture();
        f.host.navigate("home");
        let emitted = Rc::new(Cell::new(0));
        let handler = {
            let emitted = Rc::clone(&emitted);
            ScreenBackHandler::install(&f.back, OwnerId(2), Rc::clone(&f.tracker), true, move || {
                emitted.set(emitted.get() + 1);
            })
        };
        // The dispatcher re-registers above the screen handler when the lifecycle resumes again.
        f.lifecycle.pause();
        f.lifecycle.resume();
        f.nav.on_back_pressed();
        assert_eq!(emitted.get(), 1);
        assert_eq!(f.host.depth(), 1);
        assert_eq!(f.nav.first_destination_count(), 1);
        drop(handler);
    }

    #[test]
    fn back_at_root_keeps_occupancy() {
        let f = fixture();
        f.host.navigate("home");
        assert_eq!(f.nav.on_back_pressed(), BackDecision::Pop);
        assert_eq!(f.host.depth(), 1);
        assert_eq!(f.nav.first_destination_count(), 1);
        f.host.navigate("home");
        assert_eq!(f.host.routes(), ["home", "home"]);
        assert_eq!(f.nav.first_destination_count(), 2);
        assert!(f.nav.has_enabled_callbacks());
    }

    #[test]
    fn consumed_platform_back_keeps_occupancy() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("home");
        let handler =
            ScreenBackHandler::install(&f.back, OwnerId(2), Rc::clone(&f.tracker), true, || {});
        f.lifecycle.pause();
        f.lifecycle.resume();
        f.nav.on_back_pressed();
        assert_eq!(f.host.depth(), 2);
        assert_eq!(f.nav.first_destination_count(), 2);
        f.host.navigate("home");
        assert_eq!(f.nav.first_destination_count(), 3);
        assert!(f.nav.has_enabled_callbacks());
        drop(handler);
    }

    #[test]
    fn clear_stack_skips_dispatcher_interceptor() {
        let f = fixture();
        f.host.navigate("home");
        f.host.navigate("a");
        f.host.navigate("b");
        let root = f.tracker.clear_stack(&*f.back);
        assert_eq!(root, "home");
        assert_eq!(f.host.routes(), ["home"]);
        assert!(f.nav.is_interceptor_installed());
    }

    #[test]
    fn new_epoch_after_reaching_empty_stack() {
        let f = fixture();
        f.host.navigate("home");
        f.host.pop();
        f.host.navigate("login");
        assert_eq!(route(f.nav.start_destination()).as_deref(), Some("login"));
        assert_eq!(f.nav.first_destination_count(), 1);
    }

    #[test]
    fn detach_unregisters_everything() {
        let f = fixture();
        f.nav.detach();
        assert_eq!(f.back.owners(), [OwnerId(0)]);
        assert_eq!(f.host.listener_count(), 0);
        assert_eq!(f.lifecycle.observer_count(), 0);
        f.host.navigate("home");
        assert_eq!(f.nav.current_destination(), None);
    }

    #[test]
    fn dropping_last_handle_releases_registrations() {
        let f = fixture();
        let clone = f.nav.clone();
        drop(clone);
        assert_eq!(f.host.listener_count(), 1);
        let Fixture {
            host, back, nav, ..
        } = f;
        drop(nav);
        assert_eq!(host.listener_count(), 0);
        assert_eq!(back.owners(), [OwnerId(0)]);
    }

    #[test]
    fn channels_are_per_route() {
        let f = fixture();
        f.host.navigate("home");
        f.nav.write_to_channel("detail", 3_u16).unwrap();
        let home = f.nav.read_channel::<u16>(Some(1)).unwrap();
        let detail = f.nav.read_channel_for::<u16>("detail", Some(9)).unwrap();
        assert_eq!(home.get(), Some(1));
        assert_eq!(detail.get(), Some(3));
    }
}
