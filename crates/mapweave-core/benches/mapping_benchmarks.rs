//! Benchmarks for compiling and running mappings
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mapweave_core::definition::path::parse;
use mapweave_core::{MapTransform, Options, Value};
use serde_json::{json, Value as Json};

fn article_definition() -> Json {
    json!(["data.items[]", {
        "$iterate": true,
        "id": "key",
        "title": "headline",
        "author": { "$alt": ["meta.writer", "meta.editor"] },
        "tags": "meta.keywords[]",
        "published": ["status", { "$transform": "compare", "path": ".", "match": "P" }]
    }])
}

fn create_articles(count: usize) -> Json {
    let items: Vec<Json> = (0..count)
        .map(|i| {
            json!({
                "key": format!("a{}", i),
                "headline": format!("Article {}", i),
                "meta": { "writer": "ann", "keywords": ["news", "local", "sport"] },
                "status": if i % 2 == 0 { "P" } else { "D" }
            })
        })
        .collect();
    json!({ "data": { "items": items } })
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    let paths = vec![
        "title",
        "data.items[].meta.keywords[]",
        ">items[-1]",
        "^.^.meta.tags[]",
        "content\\.type.value/1",
    ];

    for path in paths {
        group.bench_with_input(BenchmarkId::new("parse", path), path, |b, path| {
            b.iter(|| parse(black_box(path)))
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let definition = article_definition();
    c.bench_function("compile_article", |b| {
        b.iter(|| MapTransform::new(black_box(&definition), Options::default()))
    });
}

fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("run");
    let mapping = match MapTransform::new(&article_definition(), Options::default()) {
        Ok(mapping) => mapping,
        Err(e) => panic!("benchmark definition should compile: {}", e),
    };

    for count in [1, 100, 1000] {
        let source = Value::from(create_articles(count));
        let target = mapping.forward(source.clone()).unwrap_or_default();

        group.bench_with_input(BenchmarkId::new("forward", count), &source, |b, source| {
            b.iter(|| mapping.forward(black_box(source.clone())))
        });
        group.bench_with_input(BenchmarkId::new("reverse", count), &target, |b, target| {
            b.iter(|| mapping.reverse(black_box(target.clone())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_compile, bench_run);
criterion_main!(benches);
