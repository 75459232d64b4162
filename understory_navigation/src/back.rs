// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The back-press decision chain.
//!
//! ## Overview
//!
//! A back press is resolved by walking [`BackStage::ORDER`] and stopping at the first stage that
//! decides:
//!
//! 1. [`BackStage::Veto`]: a screen-supplied hook returning `true` consumes the press.
//! 2. [`BackStage::ForcedVeto`]: a hook that also receives the current destination; `true` consumes.
//! 3. [`BackStage::Pager`]: when a paged view is bound, step it back one page (see [`pager_step`]).
//!
//! When no stage decides, the press pops the navigation stack.
//!
//! [`BackChain`] only computes the [`BackDecision`]. The
//! [`NavigationDispatcher`](crate::dispatcher::NavigationDispatcher) carries it out.
//!
//! ```
//! use std::collections::BTreeSet;
//! use understory_navigation::back::{BackDecision, BackStage, pager_step};
//!
//! // Page 2 of 3, page 1 is transitional: back lands directly on page 0.
//! let skip = BTreeSet::from([1]);
//! assert_eq!(pager_step(2, false, true, &skip), BackDecision::ScrollTo(0));
//! assert_eq!(pager_step(0, false, true, &skip), BackDecision::Pop);
//! assert_eq!(pager_step(2, true, true, &skip), BackDecision::Debounced);
//! assert_eq!(BackStage::ORDER[0], BackStage::Veto);
//! ```

use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use core::fmt;

use crate::host::Pager;
use crate::types::Destination;

/// Screen-supplied hook; `true` consumes the back press.
pub type BackVeto = Rc<dyn Fn() -> bool>;

/// Screen-supplied hook given the current destination; `true` consumes the back press.
pub type ForcedBackVeto = Rc<dyn Fn(Option<&Destination>) -> bool>;

/// A stage of the back-press chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackStage {
    /// The simple veto hook.
    Veto,
    /// The forced veto hook.
    ForcedVeto,
    /// The bound paged view.
    Pager,
}

impl BackStage {
    /// Evaluation order. Earlier stages short-circuit later ones.
    pub const ORDER: [Self; 3] = [Self::Veto, Self::ForcedVeto, Self::Pager];
}

/// The outcome of one back press.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackDecision {
    /// A veto hook in the given stage consumed the press.
    Consumed(BackStage),
    /// The pager is already scrolling; the press is dropped rather than queued.
    Debounced,
    /// Animate the pager to this page.
    ScrollTo(usize),
    /// Pop the navigation stack.
    Pop,
}

/// Step a paged view back by one page.
///
/// - While a scroll is in flight the press is [`Debounced`](BackDecision::Debounced).
/// - On page 0, or with paging disabled, the press falls through to [`Pop`](BackDecision::Pop).
/// - Otherwise the target is the previous page, unless that page is in `skip` and has a page
///   before it, in which case the target is the page before it.
pub fn pager_step(
    current_page: usize,
    scrolling: bool,
    enabled: bool,
    skip: &BTreeSet<usize>,
) -> BackDecision {
    if scrolling {
        return BackDecision::Debounced;
    }
    if current_page == 0 || !enabled {
        return BackDecision::Pop;
    }
    let target = current_page - 1;
    if skip.contains(&target) && target >= 1 {
        BackDecision::ScrollTo(target - 1)
    } else {
        BackDecision::ScrollTo(target)
    }
}

struct PagerStage {
    pager: Rc<dyn Pager>,
    enabled: bool,
    skip: BTreeSet<usize>,
}

/// The inputs of one back-press decision.
///
/// Stages without an input (no hook, no pager) pass.
#[derive(Default)]
pub struct BackChain {
    veto: Option<BackVeto>,
    forced_veto: Option<ForcedBackVeto>,
    destination: Option<Destination>,
    pager: Option<PagerStage>,
}

impl BackChain {
    /// An empty chain; it decides [`BackDecision::Pop`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the simple veto hook.
    pub fn with_veto(mut self, veto: BackVeto) -> Self {
        self.veto = Some(veto);
        self
    }

    /// Set the forced veto hook.
    pub fn with_forced_veto(mut self, veto: ForcedBackVeto) -> Self {
        self.forced_veto = Some(veto);
        self
    }

    /// Set the destination handed to the forced veto hook.
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Bind a paged view.
    pub fn with_pager(mut self, pager: Rc<dyn Pager>, enabled: bool, skip: BTreeSet<usize>) -> Self {
        self.pager = Some(PagerStage {
            pager,
            enabled,
            skip,
        });
        self
    }

    /// The bound paged view, if any.
    pub fn pager(&self) -> Option<&Rc<dyn Pager>> {
        self.pager.as_ref().map(|stage| &stage.pager)
    }

    /// Run a single stage. `None` means the stage passed.
    pub fn run_stage(&self, stage: BackStage) -> Option<BackDecision> {
        match stage {
            BackStage::Veto => {
                let veto = self.veto.as_ref()?;
                veto().then_some(BackDecision::Consumed(BackStage::Veto))
            }
            BackStage::ForcedVeto => {
                let veto = self.forced_veto.as_ref()?;
                veto(self.destination.as_ref()).then_some(BackDecision::Consumed(BackStage::ForcedVeto))
            }
            BackStage::Pager => {
                let stage = self.pager.as_ref()?;
                Some(pager_step(
                    stage.pager.current_page(),
                    stage.pager.is_scroll_in_progress(),
                    stage.enabled,
                    &stage.skip,
                ))
            }
        }
    }

    /// Walk [`BackStage::ORDER`] and return the first decision, or [`BackDecision::Pop`].
    pub fn evaluate(&self) -> BackDecision {
        BackStage::ORDER
            .into_iter()
            .find_map(|stage| self.run_stage(stage))
            .unwrap_or(BackDecision::Pop)
    }
}

impl fmt::Debug for BackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackChain")
            .field("veto", &self.veto.is_some())
            .field("forced_veto", &self.forced_veto.is_some())
            .field("destination", &self.destination)
            .field("pager", &self.pager.as_ref().map(|stage| (stage.enabled, &stage.skip)))
            .finish()
    }
}
