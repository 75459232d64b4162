// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use understory_route::RouteTemplate;

const PLAIN: RouteTemplate<'static> = RouteTemplate::new("settings/account");
const ONE: RouteTemplate<'static, 1> = RouteTemplate::new("user/{id}").with_placeholder("id");
const FIVE: RouteTemplate<'static, 5> = RouteTemplate::with_placeholders(
    "org/{org}/team/{team}/repo/{repo}/pr/{pr}/file/{file}",
    ["org", "team", "repo", "pr", "file"],
);

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    group.bench_function("no_placeholders", |b| {
        b.iter(|| black_box(PLAIN).resolve([]));
    });
    group.bench_function("one_placeholder", |b| {
        b.iter(|| black_box(ONE).resolve([Some(black_box("4711"))]));
    });
    group.bench_function("five_placeholders", |b| {
        b.iter(|| {
            black_box(FIVE).resolve([
                Some("linebender"),
                Some("ui"),
                Some("understory"),
                Some("42"),
                None,
            ])
        });
    });
    group.bench_function("five_under_root", |b| {
        b.iter(|| {
            black_box(FIVE).resolve_under_root(
                "main",
                [Some("a"), Some("b"), Some("c"), Some("d"), Some("e")],
            )
        });
    });
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    c.bench_function("validate_five", |b| {
        b.iter(|| black_box(FIVE).validate());
    });
}

criterion_group!(benches, bench_resolve, bench_validate);
criterion_main!(benches);
