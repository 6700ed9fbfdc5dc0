//! Parsing throughput benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use shapeguard::{array, email, int, object, string, union, ObjectSchema, SchemaExt, Value};

fn order() -> ObjectSchema {
    object()
        .field("id", int().positive())
        .field("email", email())
        .field(
            "items",
            array(
                object()
                    .field("sku", string().min(3).max(12))
                    .field("qty", int().min(1)),
            )
            .nonempty(),
        )
        .field("note", string().optional())
}

fn bench_leaf(c: &mut Criterion) {
    let schema = string().min(2).max(64).trim();
    c.bench_function("string_with_checks", |b| {
        b.iter(|| schema.parse(black_box("  hello world  ")))
    });

    let coerced = int().coerce().min(0);
    c.bench_function("int_coerced", |b| b.iter(|| coerced.parse(black_box("1234"))));
}

fn bench_object(c: &mut Criterion) {
    let schema = order();
    let valid = Value::from(json!({
        "id": 7,
        "email": "buyer@example.com",
        "items": [{"sku": "ABC-1", "qty": 2}, {"sku": "XYZ-22", "qty": 1}]
    }));
    let invalid = Value::from(json!({
        "id": -1,
        "email": "nope",
        "items": [{"sku": "A", "qty": 0}]
    }));

    c.bench_function("object_valid", |b| b.iter(|| schema.parse(black_box(valid.clone()))));
    c.bench_function("object_invalid", |b| {
        b.iter(|| schema.parse(black_box(invalid.clone())))
    });
}

fn bench_union(c: &mut Criterion) {
    let schema = union(vec![
        int().into_ref(),
        string().email().into_ref(),
        string().uuid().into_ref(),
        string().into_ref(),
    ]);
    c.bench_function("union_last_branch", |b| b.iter(|| schema.parse(black_box("plain"))));
}

criterion_group!(benches, bench_leaf, bench_object, bench_union);
criterion_main!(benches);
