// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Route templates and placeholder substitution.

use alloc::format;
use alloc::string::String;
use core::fmt;

use crate::TemplateError;

/// Largest number of placeholders a [`RouteTemplate`] can declare.
pub const MAX_PLACEHOLDERS: usize = 5;

/// A destination's static route plus the ordered names of its `{placeholders}`.
///
/// `N` is the number of placeholders. Templates are immutable values and are usually declared as
/// `const` items next to the screen they address.
///
/// Build one with [`RouteTemplate::new`] and up to five [`with_placeholder`](Self::with_placeholder)
/// calls, or all at once with [`RouteTemplate::with_placeholders`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteTemplate<'a, const N: usize = 0> {
    route: &'a str,
    placeholders: [&'a str; N],
}

impl<'a> RouteTemplate<'a, 0> {
    /// Create a template without placeholders.
    pub const fn new(route: &'a str) -> Self {
        Self {
            route,
            placeholders: [],
        }
    }
}

impl<'a, const N: usize> RouteTemplate<'a, N> {
    /// Create a template declaring all of its placeholders at once.
    ///
    /// Declaring more than [`MAX_PLACEHOLDERS`] fails to compile.
    pub const fn with_placeholders(route: &'a str, placeholders: [&'a str; N]) -> Self {
        const { assert!(N <= MAX_PLACEHOLDERS, "a route template declares at most five placeholders") };
        Self {
            route,
            placeholders,
        }
    }

    /// The static route, placeholders included.
    pub const fn route(&self) -> &'a str {
        self.route
    }

    /// Placeholder names in declaration order.
    pub fn placeholders(&self) -> &[&'a str] {
        &self.placeholders
    }

    /// The static route nested under `root`, as `root/route`.
    pub fn configure_route(&self, root: &str) -> String {
        format!("{root}/{}", self.route)
    }

    /// Substitute `args` into the route, one placeholder per argument.
    ///
    /// Each step resolves the previous step's output, so an argument may itself produce a later
    /// placeholder token. `None` substitutes the empty string.
    pub fn resolve(&self, args: [Option<&str>; N]) -> String {
        self.placeholders
            .iter()
            .zip(args)
            .fold(String::from(self.route), |resolved, (name, arg)| {
                substitute(&resolved, name, arg)
            })
    }

    /// [`resolve`](Self::resolve) nested under `root`, as `root/resolved`.
    pub fn resolve_under_root(&self, root: &str, args: [Option<&str>; N]) -> String {
        format!("{root}/{}", self.resolve(args))
    }

    /// Check the declared placeholders against the route string.
    pub fn validate(&self) -> Result<(), TemplateError> {
        for (index, name) in self.placeholders.iter().enumerate() {
            if name.is_empty() {
                return Err(TemplateError::EmptyPlaceholder { index });
            }
            if self.placeholders[..index].contains(name) {
                return Err(TemplateError::DuplicatePlaceholder {
                    name: String::from(*name),
                });
            }
            if !self.route.contains(&format!("{{{name}}}")) {
                return Err(TemplateError::MissingPlaceholder {
                    route: String::from(self.route),
                    name: String::from(*name),
                });
            }
        }
        if let Some(token) =
            placeholder_tokens(self.route).find(|token| !self.placeholders.contains(token))
        {
            return Err(TemplateError::UndeclaredPlaceholder {
                route: String::from(self.route),
                name: String::from(token),
            });
        }
        Ok(())
    }
}

macro_rules! impl_with_placeholder {
    ($n:literal => $next:literal $(, $held:ident)*) => {
        impl<'a> RouteTemplate<'a, $n> {
            /// Declare one more placeholder, resolved after the ones already declared.
            pub const fn with_placeholder(self, name: &'a str) -> RouteTemplate<'a, $next> {
                let [$($held),*] = self.placeholders;
                RouteTemplate {
                    route: self.route,
                    placeholders: [$($held,)* name],
                }
            }
        }
    };
}

impl_with_placeholder!(0 => 1);
impl_with_placeholder!(1 => 2, a);
impl_with_placeholder!(2 => 3, a, b);
impl_with_placeholder!(3 => 4, a, b, c);
impl_with_placeholder!(4 => 5, a, b, c, d);

impl<const N: usize> fmt::Display for RouteTemplate<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route)
    }
}

fn substitute(resolved: &str, name: &str, arg: Option<&str>) -> String {
    resolved.replace(&format!("{{{name}}}"), arg.unwrap_or(""))
}

/// Names of every `{token}` in `route`, in order of appearance.
fn placeholder_tokens(route: &str) -> impl Iterator<Item = &str> {
    route
        .split('{')
        .skip(1)
        .filter_map(|tail| tail.split_once('}').map(|(name, _)| name))
}
