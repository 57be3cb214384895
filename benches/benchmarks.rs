//! Benchmarks for request parsing and statement building

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use issue_tracker::request::parse_filters;
use issue_tracker::{IssueUpdate, QueryBuilder, RequestFields};

fn pairs(raw: &[(&str, &str)]) -> RequestFields {
    RequestFields::new(
        raw.iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect(),
    )
}

fn bench_filter_simple(c: &mut Criterion) {
    let fields = pairs(&[("issue_title", "Title")]);
    c.bench_function("filter_simple", |b| {
        b.iter(|| {
            let filters = parse_filters(black_box(&fields)).unwrap();
            QueryBuilder::select_issues(black_box("apitest"), &filters)
        });
    });
}

fn bench_filter_complex(c: &mut Criterion) {
    let fields = pairs(&[
        ("issue_title", "Title"),
        ("issue_text", "Text"),
        ("open", "true"),
        ("created_on", "2024-01-01T00:00:00Z"),
        ("assigned_to", "Joe"),
    ]);
    c.bench_function("filter_complex", |b| {
        b.iter(|| {
            let filters = parse_filters(black_box(&fields)).unwrap();
            QueryBuilder::select_issues(black_box("apitest"), &filters)
        });
    });
}

fn bench_update(c: &mut Criterion) {
    let fields = pairs(&[
        ("_id", "5b0c7f4e-1f7a-4a53-9c63-1f0f3d7a9b10"),
        ("issue_title", "Changed"),
        ("open", "false"),
    ]);
    let now = chrono::Utc::now();
    c.bench_function("update", |b| {
        b.iter(|| {
            let update = IssueUpdate::from_fields(black_box(&fields)).unwrap();
            QueryBuilder::update_issue(&update, now)
        });
    });
}

criterion_group!(benches, bench_filter_simple, bench_filter_complex, bench_update);
criterion_main!(benches);
