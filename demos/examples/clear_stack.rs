// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clearing the whole stack across screens.
//!
//! Each screen installs its own back handler. A "log out" clears the stack through the shared
//! tracker: screen handlers step aside instead of emitting, the host pops down to its root, and the
//! tracker reports the root to navigate from.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example clear_stack`

use std::rc::Rc;

use tracing_subscriber::EnvFilter;
use understory_navigation::headless::{HeadlessBackDispatcher, HeadlessLifecycle, HeadlessNavHost};
use understory_navigation::screen::ScreenBackHandler;
use understory_navigation::{DestinationTracker, NavigationDispatcher, OwnerId};
use understory_route::RouteTemplate;

const FEED: RouteTemplate<'static> = RouteTemplate::new("feed");
const POST: RouteTemplate<'static, 1> = RouteTemplate::new("post/{id}").with_placeholder("id");
const LOGIN: RouteTemplate<'static> = RouteTemplate::new("login");

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let host = Rc::new(HeadlessNavHost::new());
    let back = Rc::new(HeadlessBackDispatcher::new());
    let _system = host.intercept_back(&back, OwnerId(0));
    let lifecycle = Rc::new(HeadlessLifecycle::new(OwnerId(1)));
    lifecycle.resume();
    let tracker = Rc::new(DestinationTracker::new(LOGIN.route()));
    let _nav = NavigationDispatcher::new(&lifecycle, Rc::clone(&host), Rc::clone(&back), Rc::clone(&tracker));

    let _last_route = tracker.observe_last_route(|route| {
        tracing::info!(route = route.unwrap_or("<none>"), "last route");
    });

    host.navigate(FEED.route());
    let handlers: Vec<ScreenBackHandler> = ["1", "2", "3"]
        .into_iter()
        .enumerate()
        .map(|(screen, id)| {
            host.navigate(&POST.resolve([Some(id)]));
            ScreenBackHandler::install(&back, OwnerId(10 + screen as u64), Rc::clone(&tracker), true, move || {
                println!("post {id} handles back");
            })
        })
        .collect();
    println!("before clear: {:?}", host.routes());

    let root = tracker.clear_stack(&*back);
    println!(
        "after clear: {:?}, root {root}, handlers armed: {}",
        host.routes(),
        handlers.iter().filter(|h| h.is_armed()).count()
    );

    host.pop();
    host.navigate(LOGIN.route());
    println!("new root: {:?}", tracker.root_route());
}
