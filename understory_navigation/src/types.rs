// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: destinations, change notifications, and registration keys.
//!
//! ## Overview
//!
//! Destinations are owned by the navigation host. This crate only holds clones of the
//! host-assigned identity and the route string, which are cheap to copy around.

use alloc::rc::Rc;
use core::fmt;

/// Host-assigned identity used to address pop operations.
///
/// Two entries with the same route may share an id (the host pops to the most recent one) or not;
/// that choice belongs to the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DestinationId(pub u64);

/// One navigable screen instance as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Destination {
    id: DestinationId,
    route: Rc<str>,
}

impl Destination {
    /// Create a destination from its host identity and route.
    pub fn new(id: DestinationId, route: impl Into<Rc<str>>) -> Self {
        Self {
            id,
            route: route.into(),
        }
    }

    /// The host identity.
    pub fn id(&self) -> DestinationId {
        self.id
    }

    /// The route string.
    pub fn route(&self) -> &str {
        &self.route
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.route, self.id.0)
    }
}

/// Payload of a host "current destination changed" notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DestinationChange {
    /// The destination now on top of the stack.
    pub destination: Destination,
    /// The entry directly below it, or `None` when `destination` is the bottom of the stack.
    pub previous: Option<Destination>,
}

impl DestinationChange {
    /// Whether the new destination is the bottom of the host's stack.
    pub fn is_stack_bottom(&self) -> bool {
        self.previous.is_none()
    }
}

/// Identity of a lifecycle owner (a screen, an activity, a window).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerId(pub u64);

/// Key returned when registering a listener, observer, or interceptor with a collaborator.
///
/// Pass it back to the matching `remove_*` call. Keys are only meaningful to the collaborator that
/// issued them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerKey(pub u64);
