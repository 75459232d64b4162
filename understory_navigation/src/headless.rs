// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory collaborators for tests, demos, and benchmarks.
//!
//! ## Overview
//!
//! - [`HeadlessNavHost`]: a plain back stack of routes. Each route gets one id the first time it is
//!   navigated to, and popping by id pops to the most recent entry with it.
//! - [`HeadlessBackDispatcher`]: delivers each back event to the most recently added enabled
//!   interceptor, or to an optional fallback.
//! - [`HeadlessLifecycle`]: a single owner driven through start, resume, pause and stop by hand.
//! - [`HeadlessPager`]: a page index whose animations finish only when told to.
//!
//! None of these hold a `RefCell` borrow while calling out, so listeners and interceptors can call
//! back into them.
//!
//! ```
//! use std::rc::Rc;
//! use understory_navigation::headless::{HeadlessBackDispatcher, HeadlessNavHost};
//! use understory_navigation::host::BackDispatcher;
//! use understory_navigation::types::OwnerId;
//!
//! let host = Rc::new(HeadlessNavHost::new());
//! let back = Rc::new(HeadlessBackDispatcher::new());
//! let _system = host.intercept_back(&back, OwnerId(0));
//!
//! host.navigate("home");
//! host.navigate("detail");
//! back.trigger_back();
//! assert_eq!(host.routes(), ["home"]);
//! // The last entry is never popped by the system interceptor.
//! back.trigger_back();
//! assert_eq!(host.depth(), 1);
//! ```

use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::host::{
    BackDispatcher, BackInterceptor, DestinationListener, Lifecycle, LifecycleObserver, NavHost,
    PageChangeListener, Pager,
};
use crate::observe::Observation;
use crate::types::{Destination, DestinationChange, DestinationId, ListenerKey, OwnerId};

#[derive(Default)]
struct HostState {
    stack: Vec<Destination>,
    ids: BTreeMap<String, DestinationId>,
    listeners: Vec<(ListenerKey, DestinationListener)>,
    next_key: u64,
}

impl HostState {
    fn top_change(&self) -> Option<DestinationChange> {
        let (destination, below) = self.stack.split_last()?;
        Some(DestinationChange {
            destination: destination.clone(),
            previous: below.last().cloned(),
        })
    }

    fn listeners(&self) -> Vec<DestinationListener> {
        self.listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }
}

/// An in-memory navigation host.
#[derive(Default)]
pub struct HeadlessNavHost {
    state: RefCell<HostState>,
}

impl HeadlessNavHost {
    /// An empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `route` and notify listeners.
    pub fn navigate(&self, route: &str) -> Destination {
        let (destination, change, listeners) = {
            let mut state = self.state.borrow_mut();
            let next_id = DestinationId(state.ids.len() as u64);
            let id = *state.ids.entry(String::from(route)).or_insert(next_id);
            let destination = Destination::new(id, route);
            state.stack.push(destination.clone());
            (destination, state.top_change(), state.listeners())
        };
        tracing::trace!(%destination, "navigated");
        Self::notify(change, listeners);
        destination
    }

    /// Pop the top entry. Returns `false` on an empty stack.
    pub fn pop(&self) -> bool {
        let (change, listeners) = {
            let mut state = self.state.borrow_mut();
            if state.stack.pop().is_none() {
                return false;
            }
            (state.top_change(), state.listeners())
        };
        Self::notify(change, listeners);
        true
    }

    /// Number of entries on the stack.
    pub fn depth(&self) -> usize {
        self.state.borrow().stack.len()
    }

    /// A copy of the stack, bottom first.
    pub fn back_stack(&self) -> Vec<Destination> {
        self.state.borrow().stack.clone()
    }

    /// The routes on the stack, bottom first.
    pub fn routes(&self) -> Vec<String> {
        self.state
            .borrow()
            .stack
            .iter()
            .map(|d| String::from(d.route()))
            .collect()
    }

    /// Number of registered destination listeners.
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Register the host's own back handling with `back`: pop while more than one entry remains.
    ///
    /// This stands in for the system-level handler a real host installs. Add it before any
    /// dispatcher so that dispatchers sit above it in the chain.
    pub fn intercept_back<B>(self: &Rc<Self>, back: &Rc<B>, owner: OwnerId) -> Observation
    where
        B: BackDispatcher + ?Sized + 'static,
    {
        let key = back.add_interceptor(
            owner,
            Rc::new(HostInterceptor {
                host: Rc::downgrade(self),
            }),
        );
        let back = Rc::downgrade(back);
        Observation::new(move || {
            if let Some(back) = back.upgrade() {
                back.remove_interceptor(key);
            }
        })
    }

    fn notify(change: Option<DestinationChange>, listeners: Vec<DestinationListener>) {
        let Some(change) = change else {
            return;
        };
        for listener in listeners {
            listener(&change);
        }
    }
}

impl NavHost for HeadlessNavHost {
    fn current_destination(&self) -> Option<Destination> {
        self.state.borrow().stack.last().cloned()
    }

    fn previous_destination(&self) -> Option<Destination> {
        let state = self.state.borrow();
        let depth = state.stack.len();
        depth
            .checked_sub(2)
            .and_then(|index| state.stack.get(index))
            .cloned()
    }

    fn back_stack_entry(&self, route: &str) -> Option<Destination> {
        self.state
            .borrow()
            .stack
            .iter()
            .rev()
            .find(|d| d.route() == route)
            .cloned()
    }

    fn pop_back_stack(&self, id: DestinationId, inclusive: bool) -> bool {
        let (change, listeners) = {
            let mut state = self.state.borrow_mut();
            let Some(index) = state.stack.iter().rposition(|d| d.id() == id) else {
                return false;
            };
            let keep = if inclusive { index } else { index + 1 };
            if keep >= state.stack.len() {
                return false;
            }
            state.stack.truncate(keep);
            (state.top_change(), state.listeners())
        };
        Self::notify(change, listeners);
        true
    }

    fn add_destination_listener(&self, listener: DestinationListener) -> ListenerKey {
        let (key, change) = {
            let mut state = self.state.borrow_mut();
            let key = ListenerKey(state.next_key);
            state.next_key += 1;
            state.listeners.push((key, Rc::clone(&listener)));
            (key, state.top_change())
        };
        if let Some(change) = change {
            listener(&change);
        }
        key
    }

    fn remove_destination_listener(&self, key: ListenerKey) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|(k, _)| *k != key);
    }
}

impl fmt::Debug for HeadlessNavHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("HeadlessNavHost")
            .field("stack", &state.stack)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

struct HostInterceptor {
    host: Weak<HeadlessNavHost>,
}

impl BackInterceptor for HostInterceptor {
    fn is_enabled(&self) -> bool {
        self.host.upgrade().is_some_and(|host| host.depth() > 1)
    }

    fn handle_back(&self) {
        if let Some(host) = self.host.upgrade() {
            host.pop();
        }
    }
}

struct Registered {
    key: ListenerKey,
    owner: OwnerId,
    interceptor: Rc<dyn BackInterceptor>,
}

/// An in-memory back dispatcher.
#[derive(Default)]
pub struct HeadlessBackDispatcher {
    interceptors: RefCell<Vec<Registered>>,
    fallback: RefCell<Option<Rc<dyn Fn()>>>,
    next_key: Cell<u64>,
    triggered: Cell<usize>,
}

impl HeadlessBackDispatcher {
    /// A dispatcher with no interceptors and no fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for back events no enabled interceptor takes.
    pub fn set_fallback(&self, fallback: impl Fn() + 'static) {
        *self.fallback.borrow_mut() = Some(Rc::new(fallback));
    }

    /// Number of back events delivered so far.
    pub fn triggered(&self) -> usize {
        self.triggered.get()
    }

    /// Number of registered interceptors, enabled or not.
    pub fn interceptor_count(&self) -> usize {
        self.interceptors.borrow().len()
    }

    /// Owners of the registered interceptors, oldest first.
    pub fn owners(&self) -> Vec<OwnerId> {
        self.interceptors.borrow().iter().map(|r| r.owner).collect()
    }

    /// Remove every interceptor added on behalf of `owner`.
    pub fn remove_owner(&self, owner: OwnerId) {
        self.interceptors.borrow_mut().retain(|r| r.owner != owner);
    }

    fn snapshot(&self) -> Vec<Rc<dyn BackInterceptor>> {
        self.interceptors
            .borrow()
            .iter()
            .map(|r| Rc::clone(&r.interceptor))
            .collect()
    }
}

impl BackDispatcher for HeadlessBackDispatcher {
    fn add_interceptor(&self, owner: OwnerId, interceptor: Rc<dyn BackInterceptor>) -> ListenerKey {
        let key = ListenerKey(self.next_key.get());
        self.next_key.set(key.0 + 1);
        self.interceptors.borrow_mut().push(Registered {
            key,
            owner,
            interceptor,
        });
        key
    }

    fn remove_interceptor(&self, key: ListenerKey) {
        self.interceptors.borrow_mut().retain(|r| r.key != key);
    }

    fn has_active_interceptors(&self) -> bool {
        self.snapshot().iter().any(|i| i.is_enabled())
    }

    fn trigger_back(&self) {
        self.triggered.set(self.triggered.get() + 1);
        let target = self.snapshot().into_iter().rev().find(|i| i.is_enabled());
        match target {
            Some(interceptor) => interceptor.handle_back(),
            None => {
                let fallback = self.fallback.borrow().clone();
                if let Some(fallback) = fallback {
                    fallback();
                }
            }
        }
    }
}

impl fmt::Debug for HeadlessBackDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessBackDispatcher")
            .field("owners", &self.owners())
            .field("fallback", &self.fallback.borrow().is_some())
            .field("triggered", &self.triggered.get())
            .finish()
    }
}

/// Lifecycle state of a [`HeadlessLifecycle`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Not visible.
    Created,
    /// Visible, not receiving input.
    Started,
    /// Visible and receiving input.
    Resumed,
}

/// A hand-driven lifecycle for one owner.
///
/// Observers added to a started or resumed lifecycle are brought up to the current state at once.
pub struct HeadlessLifecycle {
    owner: OwnerId,
    state: Cell<LifecycleState>,
    observers: RefCell<Vec<(ListenerKey, Rc<dyn LifecycleObserver>)>>,
    next_key: Cell<u64>,
}

impl HeadlessLifecycle {
    /// A created (not started) lifecycle.
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            state: Cell::new(LifecycleState::Created),
            observers: RefCell::new(Vec::new()),
            next_key: Cell::new(0),
        }
    }

    /// The owner reported to observers.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// The current state.
    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Created to started.
    pub fn start(&self) {
        if self.state.get() == LifecycleState::Created {
            self.state.set(LifecycleState::Started);
            self.each(|o, owner| o.on_start(owner));
        }
    }

    /// Up to resumed, starting first when needed.
    pub fn resume(&self) {
        self.start();
        if self.state.get() == LifecycleState::Started {
            self.state.set(LifecycleState::Resumed);
            self.each(|o, owner| o.on_resume(owner));
        }
    }

    /// Resumed to started.
    pub fn pause(&self) {
        if self.state.get() == LifecycleState::Resumed {
            self.state.set(LifecycleState::Started);
            self.each(|o, owner| o.on_pause(owner));
        }
    }

    /// Down to created, pausing first when needed.
    pub fn stop(&self) {
        self.pause();
        if self.state.get() == LifecycleState::Started {
            self.state.set(LifecycleState::Created);
            self.each(|o, owner| o.on_stop(owner));
        }
    }

    fn each(&self, event: impl Fn(&dyn LifecycleObserver, OwnerId)) {
        let observers: Vec<Rc<dyn LifecycleObserver>> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, o)| Rc::clone(o))
            .collect();
        for observer in observers {
            event(&*observer, self.owner);
        }
    }
}

impl Lifecycle for HeadlessLifecycle {
    fn add_observer(&self, observer: Rc<dyn LifecycleObserver>) -> ListenerKey {
        let key = ListenerKey(self.next_key.get());
        self.next_key.set(key.0 + 1);
        self.observers
            .borrow_mut()
            .push((key, Rc::clone(&observer)));
        let state = self.state.get();
        if state >= LifecycleState::Started {
            observer.on_start(self.owner);
        }
        if state == LifecycleState::Resumed {
            observer.on_resume(self.owner);
        }
        key
    }

    fn remove_observer(&self, key: ListenerKey) {
        self.observers.borrow_mut().retain(|(k, _)| *k != key);
    }
}

impl fmt::Debug for HeadlessLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessLifecycle")
            .field("owner", &self.owner)
            .field("state", &self.state.get())
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// A paged view whose animated scrolls complete on [`finish_scroll`](Self::finish_scroll).
pub struct HeadlessPager {
    page_count: usize,
    current: Cell<usize>,
    target: Cell<Option<usize>>,
    listeners: RefCell<Vec<(ListenerKey, PageChangeListener)>>,
    next_key: Cell<u64>,
}

impl HeadlessPager {
    /// A pager on page 0.
    pub fn new(page_count: usize) -> Self {
        Self::with_page(page_count, 0)
    }

    /// A pager on `page`, clamped to the last page.
    pub fn with_page(page_count: usize, page: usize) -> Self {
        let pager = Self {
            page_count,
            current: Cell::new(0),
            target: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
            next_key: Cell::new(0),
        };
        pager.current.set(pager.clamp(page));
        pager
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Jump to `page` without animating, as a user swipe would. Cancels a running animation.
    pub fn scroll_to_page(&self, page: usize) {
        self.target.set(None);
        self.settle(self.clamp(page));
    }

    /// Target of the running animation.
    pub fn pending_target(&self) -> Option<usize> {
        self.target.get()
    }

    /// Complete the running animation. Returns the page it landed on.
    pub fn finish_scroll(&self) -> Option<usize> {
        let page = self.target.take()?;
        self.settle(page);
        Some(page)
    }

    /// Number of registered page listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn clamp(&self, page: usize) -> usize {
        page.min(self.page_count.saturating_sub(1))
    }

    fn settle(&self, page: usize) {
        if self.current.replace(page) == page {
            return;
        }
        let listeners: Vec<PageChangeListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(page);
        }
    }
}

impl fmt::Debug for HeadlessPager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessPager")
            .field("page_count", &self.page_count)
            .field("current", &self.current.get())
            .field("target", &self.target.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Pager for HeadlessPager {
    fn current_page(&self) -> usize {
        self.current.get()
    }

    fn is_scroll_in_progress(&self) -> bool {
        self.target.get().is_some()
    }

    fn animate_scroll_to_page(&self, page: usize) {
        self.target.set(Some(self.clamp(page)));
    }

    fn add_page_listener(&self, listener: PageChangeListener) -> ListenerKey {
        let key = ListenerKey(self.next_key.get());
        self.next_key.set(key.0 + 1);
        self.listeners.borrow_mut().push((key, listener));
        key
    }

    fn remove_page_listener(&self, key: ListenerKey) {
        self.listeners.borrow_mut().retain(|(k, _)| *k != key);
    }
}
