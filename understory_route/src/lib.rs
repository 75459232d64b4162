// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Route: typed route templates for screen navigation.
//!
//! ## Overview
//!
//! A navigation host addresses screens by a route string such as `user/{id}`.
//! A [`RouteTemplate`] pairs that static route with the ordered names of its placeholders and produces
//! concrete routes by substitution.
//!
//! The placeholder count is part of the type (`RouteTemplate<'a, N>`, `N` from 0 to 5), so call sites
//! pass exactly `N` arguments and a mismatch is a compile error rather than a malformed route.
//!
//! ## Resolution
//!
//! - Placeholders are substituted left to right, in declaration order.
//!   Level `k` resolves the output of level `k - 1` with one more substitution.
//! - A `None` argument substitutes the empty string. Resolution never fails.
//! - [`RouteTemplate::resolve_under_root`] prefixes the result with `root/`, for screens reused under
//!   several nested graphs.
//!
//! [`RouteTemplate::validate`] is available for checking a template against its route string
//! (for example in a unit test next to the route constants); it is never consulted while resolving.
//!
//! ## Minimal usage
//!
//! ```
//! use understory_route::RouteTemplate;
//!
//! const USER: RouteTemplate<'static, 1> = RouteTemplate::new("user/{id}").with_placeholder("id");
//! const THREAD: RouteTemplate<'static, 2> =
//!     RouteTemplate::with_placeholders("chat/{room}/{message}", ["room", "message"]);
//!
//! assert_eq!(USER.resolve([Some("42")]), "user/42");
//! assert_eq!(USER.resolve_under_root("app", [Some("42")]), "app/user/42");
//! assert_eq!(THREAD.resolve([Some("general"), None]), "chat/general/");
//! assert!(THREAD.validate().is_ok());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod template;

pub use error::TemplateError;
pub use template::{MAX_PLACEHOLDERS, RouteTemplate};
