// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;

/// A mismatch between a template's declared placeholders and its route string.
///
/// Returned by [`RouteTemplate::validate`](crate::RouteTemplate::validate).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The placeholder at `index` has an empty name.
    #[error("placeholder #{index} has an empty name")]
    EmptyPlaceholder {
        /// Position of the placeholder in declaration order.
        index: usize,
    },
    /// The same placeholder name is declared twice.
    #[error("placeholder `{name}` is declared more than once")]
    DuplicatePlaceholder {
        /// The repeated name.
        name: String,
    },
    /// A declared placeholder does not occur in the route as `{name}`.
    #[error("placeholder `{name}` does not occur in route `{route}`")]
    MissingPlaceholder {
        /// The template's route string.
        route: String,
        /// The declared name.
        name: String,
    },
    /// The route contains a `{name}` token that was never declared.
    #[error("route `{route}` contains undeclared placeholder `{name}`")]
    UndeclaredPlaceholder {
        /// The template's route string.
        route: String,
        /// The token found in the route.
        name: String,
    },
}
