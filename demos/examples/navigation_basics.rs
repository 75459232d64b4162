// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Navigation basics.
//!
//! Drives a headless host through a few screens, shows start-route occupancy, a veto hook, and the
//! pager stage of the back chain.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example navigation_basics`

use std::rc::Rc;

use tracing_subscriber::EnvFilter;
use understory_navigation::headless::{
    HeadlessBackDispatcher, HeadlessLifecycle, HeadlessNavHost, HeadlessPager,
};
use understory_navigation::host::Pager;
use understory_navigation::{DestinationTracker, NavigationDispatcher, OwnerId};
use understory_route::RouteTemplate;

const HOME: RouteTemplate<'static> = RouteTemplate::new("home");
const USER: RouteTemplate<'static, 1> = RouteTemplate::new("user/{id}").with_placeholder("id");
const ONBOARDING: RouteTemplate<'static> = RouteTemplate::new("onboarding");

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
    let tracker = Rc::new(DestinationTracker::new(HOME.route()));
    let nav = NavigationDispatcher::new(&lifecycle, Rc::clone(&host), Rc::clone(&back), tracker);

    println!("== Occupancy ==");
    host.navigate(HOME.route());
    host.navigate(&USER.resolve([Some("7")]));
    host.navigate(HOME.route());
    println!(
        "stack {:?}, home entered {} times, back does something: {}",
        host.routes(),
        nav.first_destination_count(),
        nav.has_enabled_callbacks()
    );
    while nav.has_enabled_callbacks() {
        let decision = nav.on_back_pressed();
        println!("back -> {decision:?}, stack {:?}", host.routes());
    }

    println!("== Veto ==");
    host.navigate(&USER.resolve([Some("8")]));
    nav.set_back_veto(|| {
        println!("unsaved changes, staying");
        true
    });
    println!("back -> {:?}", nav.on_back_pressed());
    nav.remove_back_veto();
    println!("back -> {:?}, stack {:?}", nav.on_back_pressed(), host.routes());

    println!("== Pager ==");
    host.navigate(ONBOARDING.route());
    let pager = Rc::new(HeadlessPager::with_page(5, 4));
    nav.set_pager(Rc::clone(&pager), [2]);
    loop {
        let decision = nav.on_back_pressed();
        println!("page {} back -> {decision:?}", pager.current_page());
        if pager.finish_scroll().is_none() {
            break;
        }
    }
    println!("stack {:?}", host.routes());
}
