// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen-level back handlers.
//!
//! ## Overview
//!
//! A [`ScreenBackHandler`] registers one interceptor with the platform back dispatcher on behalf of
//! a screen and calls the screen's `emit` closure for each back event it receives. The interceptor
//! stays registered until the handler is dropped.
//!
//! During a [`DestinationTracker::clear_stack`](crate::tracker::DestinationTracker::clear_stack) the
//! interceptor does not emit. It unregisters itself instead, so the clear can drain the chain.
//!
//! The pager variant stays in the chain while its pager is scrolling (so that back presses during
//! the animation are swallowed) and never emits mid-scroll.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::host::{BackDispatcher, BackInterceptor, Pager};
use crate::observe::Observation;
use crate::tracker::DestinationTracker;
use crate::types::OwnerId;

struct ScreenInterceptor {
    tracker: Rc<DestinationTracker>,
    enabled: Cell<bool>,
    pager: Option<Rc<dyn Pager>>,
    emit: Box<dyn Fn()>,
    registration: RefCell<Option<Observation>>,
}

impl ScreenInterceptor {
    fn scrolling(&self) -> bool {
        self.pager
            .as_ref()
            .is_some_and(|pager| pager.is_scroll_in_progress())
    }

    fn disarm(&self) {
        let registration = self.registration.borrow_mut().take();
        drop(registration);
    }
}

impl BackInterceptor for ScreenInterceptor {
    fn is_enabled(&self) -> bool {
        self.enabled.get() || self.scrolling()
    }

    fn handle_back(&self) {
        if self.tracker.is_clear_in_progress() {
            tracing::trace!("screen back handler disarmed by stack clear");
            self.disarm();
            return;
        }
        if self.scrolling() {
            return;
        }
        (self.emit)();
    }
}

/// A screen's registration in the platform back chain.
pub struct ScreenBackHandler {
    interceptor: Rc<ScreenInterceptor>,
}

impl ScreenBackHandler {
    /// Register a handler that calls `emit` on back while `enabled`.
    pub fn install<B>(
        back: &Rc<B>,
        owner: OwnerId,
        tracker: Rc<DestinationTracker>,
        enabled: bool,
        emit: impl Fn() + 'static,
    ) -> Self
    where
        B: BackDispatcher + ?Sized + 'static,
    {
        Self::register(back, owner, tracker, None, enabled, Box::new(emit))
    }

    /// Register a handler tied to a paged view.
    ///
    /// It takes part in the chain while `enabled` or while `pager` is scrolling, and only emits when
    /// the pager is at rest.
    pub fn install_for_pager<B, P>(
        back: &Rc<B>,
        owner: OwnerId,
        tracker: Rc<DestinationTracker>,
        pager: Rc<P>,
        enabled: bool,
        emit: impl Fn() + 'static,
    ) -> Self
    where
        B: BackDispatcher + ?Sized + 'static,
        P: Pager + 'static,
    {
        let pager: Rc<dyn Pager> = pager;
        Self::register(back, owner, tracker, Some(pager), enabled, Box::new(emit))
    }

    fn register<B>(
        back: &Rc<B>,
        owner: OwnerId,
        tracker: Rc<DestinationTracker>,
        pager: Option<Rc<dyn Pager>>,
        enabled: bool,
        emit: Box<dyn Fn()>,
    ) -> Self
    where
        B: BackDispatcher + ?Sized + 'static,
    {
        let interceptor = Rc::new(ScreenInterceptor {
            tracker,
            enabled: Cell::new(enabled),
            pager,
            emit,
            registration: RefCell::new(None),
        });
        let key = back.add_interceptor(owner, interceptor.clone());
        let back = Rc::downgrade(back);
        *interceptor.registration.borrow_mut() = Some(Observation::new(move || {
            if let Some(back) = back.upgrade() {
                back.remove_interceptor(key);
            }
        }));
        tracing::trace!(owner = owner.0, enabled, "installed screen back handler");
        Self { interceptor }
    }

    /// Turn emitting on or off without leaving the chain.
    pub fn set_enabled(&self, enabled: bool) {
        self.interceptor.enabled.set(enabled);
    }

    /// The enabled flag.
    pub fn is_enabled(&self) -> bool {
        self.interceptor.enabled.get()
    }

    /// Whether the interceptor is still registered. A stack clear disarms it.
    pub fn is_armed(&self) -> bool {
        self.interceptor.registration.borrow().is_some()
    }
}

impl Drop for ScreenBackHandler {
    fn drop(&mut self) {
        self.interceptor.disarm();
    }
}

impl fmt::Debug for ScreenBackHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenBackHandler")
            .field("enabled", &self.is_enabled())
            .field("armed", &self.is_armed())
            .field("pager", &self.interceptor.pager.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::headless::{HeadlessBackDispatcher, HeadlessPager};

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let emit = {
            let count = Rc::clone(&count);
            move || count.set(count.get() + 1)
        };
        (count, emit)
    }

    #[test]
    fn emits_while_enabled() {
        let back = Rc::new(HeadlessBackDispatcher::new());
        let tracker = Rc::new(DestinationTracker::new("home"));
        let (count, emit) = counter();
        let handler = ScreenBackHandler::install(&back, OwnerId(1), tracker, true, emit);
        back.trigger_back();
        handler.set_enabled(false);
        assert!(!back.has_active_interceptors());
        back.trigger_back();
        assert_eq!(count.get(), 1);
        assert!(handler.is_armed());
    }

    #[test]
    fn drop_unregisters() {
        let back = Rc::new(HeadlessBackDispatcher::new());
        let tracker = Rc::new(DestinationTracker::new("home"));
        let handler = ScreenBackHandler::install(&back, OwnerId(1), tracker, true, || {});
        assert_eq!(back.interceptor_count(), 1);
        drop(handler);
        assert_eq!(back.interceptor_count(), 0);
    }

    #[test]
    fn pager_variant_swallows_back_while_scrolling() {
        let back = Rc::new(HeadlessBackDispatcher::new());
        let tracker = Rc::new(DestinationTracker::new("home"));
        let pager = Rc::new(HeadlessPager::with_page(3, 2));
        let (count, emit) = counter();
        let _handler = ScreenBackHandler::install_for_pager(
            &back,
            OwnerId(1),
            tracker,
            Rc::clone(&pager),
            false,
            emit,
        );
        assert!(!back.has_active_interceptors());
        pager.animate_scroll_to_page(1);
        assert!(back.has_active_interceptors());
        back.trigger_back();
        assert_eq!(count.get(), 0);
        pager.finish_scroll();
        assert!(!back.has_active_interceptors());
    }

    #[test]
    fn pager_variant_emits_at_rest() {
        let back = Rc::new(HeadlessBackDispatcher::new());
        let tracker = Rc::new(DestinationTracker::new("home"));
        let pager = Rc::new(HeadlessPager::new(2));
        let (count, emit) = counter();
        let _handler =
            ScreenBackHandler::install_for_pager(&back, OwnerId(1), tracker, pager, true, emit);
        back.trigger_back();
        assert_eq!(count.get(), 1);
    }
}
