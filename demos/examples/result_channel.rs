// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Returning results to earlier screens.
//!
//! A list screen observes its route channel; an editor pushed on top returns a value through
//! `write_to_back_channel`, and a deeper picker jumps straight back to the list with
//! `on_back_pressed_to`.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p understory_demos --example result_channel`

use std::rc::Rc;

use tracing_subscriber::EnvFilter;
use understory_navigation::headless::{HeadlessBackDispatcher, HeadlessLifecycle, HeadlessNavHost};
use understory_navigation::{DestinationTracker, NavigationDispatcher, OwnerId};
use understory_route::RouteTemplate;

const LIST: RouteTemplate<'static> = RouteTemplate::new("notes");
const EDITOR: RouteTemplate<'static, 1> = RouteTemplate::new("notes/{note}").with_placeholder("note");
const PICKER: RouteTemplate<'static> = RouteTemplate::new("notes/color");

#[derive(Clone, Debug)]
enum NoteResult {
    Saved(String),
    Recolored(&'static str),
}

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
    let tracker = Rc::new(DestinationTracker::new(LIST.route()));
    let nav = NavigationDispatcher::new(&lifecycle, Rc::clone(&host), Rc::clone(&back), tracker);

    host.navigate(LIST.route());
    let results = match nav.read_channel::<NoteResult>(None) {
        Ok(channel) => channel,
        Err(err) => {
            tracing::error!(%err, "list channel unavailable");
            return;
        }
    };
    let _observation = results.observe(|result| match result {
        Some(NoteResult::Saved(text)) => println!("list: note saved as {text:?}"),
        Some(NoteResult::Recolored(color)) => println!("list: note recolored {color}"),
        None => tracing::info!("list has no result yet"),
    });

    host.navigate(&EDITOR.resolve([Some("groceries")]));
    if let Err(err) = nav.write_to_back_channel(NoteResult::Saved("milk, eggs".into())) {
        tracing::error!(%err, "could not return the edit");
    }
    println!("after save: {:?}", host.routes());

    host.navigate(&EDITOR.resolve([Some("groceries")]));
    host.navigate(PICKER.route());
    match nav.on_back_pressed_to(LIST.route(), NoteResult::Recolored("teal")) {
        Ok(true) => println!("after recolor: {:?}", host.routes()),
        Ok(false) => println!("list is not on the stack"),
        Err(err) => tracing::error!(%err, "could not return the color"),
    }

    // A channel keeps one value type for its whole life.
    if let Err(err) = nav.write_to_channel(LIST.route(), 3_u32) {
        println!("rejected: {err}");
    }
}
