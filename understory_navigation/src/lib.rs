// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Navigation: back-press coordination for stack-based UI navigation.
//!
//! This crate sits between a screen-transition host (which owns the back stack) and the platform's
//! back-signal dispatcher, and decides what each back press does.
//!
//! ## Overview
//!
//! - [`NavigationDispatcher`] wraps one host. It tracks the start, current and previous destinations,
//!   resolves back presses through an ordered chain (veto hooks, then a bound pager, then a pop),
//!   and carries typed results backward through per-route [`LatestValue`](channel::LatestValue)
//!   channels.
//! - [`DestinationTracker`] is shared by every dispatcher of an application. It records the root and
//!   the last observed route, and drains all back interceptors on
//!   [`clear_stack`](DestinationTracker::clear_stack).
//! - [`ScreenBackHandler`](screen::ScreenBackHandler) is a screen's own entry in the back chain, which
//!   steps aside during a stack clear.
//!
//! The host, back dispatcher, lifecycle, and paged views are reached through the traits in [`host`].
//! [`headless`] implements them in memory.
//!
//! Everything here is single-threaded: handles are `Rc`-based and callbacks run synchronously on
//! the thread that drives the host.
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use understory_navigation::{DestinationTracker, NavigationDispatcher};
//! use understory_navigation::back::{BackDecision, BackStage};
//! use understory_navigation::headless::{HeadlessBackDispatcher, HeadlessLifecycle, HeadlessNavHost};
//! use understory_navigation::types::OwnerId;
//!
//! let host = Rc::new(HeadlessNavHost::new());
//! let back = Rc::new(HeadlessBackDispatcher::new());
//! let _system = host.intercept_back(&back, OwnerId(0));
//! let lifecycle = Rc::new(HeadlessLifecycle::new(OwnerId(1)));
//! lifecycle.resume();
//! let tracker = Rc::new(DestinationTracker::new("home"));
//! let nav = NavigationDispatcher::new(&lifecycle, Rc::clone(&host), Rc::clone(&back), tracker);
//!
//! host.navigate("home");
//! assert!(!nav.has_enabled_callbacks());
//!
//! host.navigate("form");
//! nav.set_back_veto(|| true);
//! assert_eq!(nav.on_back_pressed(), BackDecision::Consumed(BackStage::Veto));
//!
//! nav.remove_back_veto();
//! assert_eq!(nav.on_back_pressed(), BackDecision::Pop);
//! assert_eq!(host.routes(), ["home"]);
//! ```
//!
//! With default features off this crate is `no_std` and uses `alloc`. The default `std` feature
//! links `std` and forwards it to `tracing` and `thiserror`; no API depends on it.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod back;
pub mod channel;
pub mod dispatcher;
pub mod headless;
pub mod host;
pub mod observe;
pub mod screen;
pub mod tracker;
pub mod types;

pub use back::{BackDecision, BackStage};
pub use channel::{ChannelError, LatestValue};
pub use dispatcher::NavigationDispatcher;
pub use observe::Observation;
pub use tracker::DestinationTracker;
pub use types::{Destination, DestinationChange, DestinationId, ListenerKey, OwnerId};
