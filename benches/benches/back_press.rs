// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::rc::Rc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_navigation::headless::{
    HeadlessBackDispatcher, HeadlessLifecycle, HeadlessNavHost, HeadlessPager,
};
use understory_navigation::{
    BackDecision, DestinationTracker, NavigationDispatcher, Observation, OwnerId,
};

type Nav = NavigationDispatcher<HeadlessNavHost, HeadlessBackDispatcher>;

struct World {
    host: Rc<HeadlessNavHost>,
    back: Rc<HeadlessBackDispatcher>,
    tracker: Rc<DestinationTracker>,
    nav: Nav,
    _lifecycle: Rc<HeadlessLifecycle>,
    _system: Observation,
}

fn world(depth: usize) -> World {
    let host = Rc::new(HeadlessNavHost::new());
    let back = Rc::new(HeadlessBackDispatcher::new());
    let system = host.intercept_back(&back, OwnerId(0));
    let lifecycle = Rc::new(HeadlessLifecycle::new(OwnerId(1)));
    lifecycle.resume();
    let tracker = Rc::new(DestinationTracker::new("home"));
    let nav = NavigationDispatcher::new(
        &lifecycle,
        Rc::clone(&host),
        Rc::clone(&back),
        Rc::clone(&tracker),
    );
    host.navigate("home");
    for i in 1..depth {
        host.navigate(if i % 4 == 0 { "home" } else { "screen" });
    }
    World {
        host,
        back,
        tracker,
        nav,
        _lifecycle: lifecycle,
        _system: system,
    }
}

fn bench_unwind(c: &mut Criterion) {
    let mut group = c.benchmark_group("unwind");
    for &depth in &[8_usize, 64] {
        group.bench_function(format!("dispatcher_pops_depth{}", depth), |b| {
            b.iter_batched(
                || world(depth),
                |w| {
                    while w.nav.has_enabled_callbacks() {
                        black_box(w.nav.on_back_pressed());
                    }
                    w
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("clear_stack_depth{}", depth), |b| {
            b.iter_batched(
                || world(depth),
                |w| {
                    black_box(w.tracker.clear_stack(&*w.back));
                    w
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_pager(c: &mut Criterion) {
    c.bench_function("pager_step_back", |b| {
        b.iter_batched(
            || {
                let w = world(2);
                let pager = Rc::new(HeadlessPager::with_page(16, 15));
                w.nav.set_pager(Rc::clone(&pager), [3, 7, 11]);
                (w, pager)
            },
            |(w, pager)| {
                while let BackDecision::ScrollTo(page) = black_box(w.nav.on_back_pressed()) {
                    assert_eq!(pager.finish_scroll(), Some(page));
                }
                assert_eq!(w.host.depth(), 1);
                (w, pager)
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_unwind, bench_pager);
criterion_main!(benches);
