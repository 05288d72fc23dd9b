use criterion::{criterion_group, criterion_main, Criterion};

use telemetry_toolkit::{validate_span_name, NameKind, SpanContext, SpanStack};

fn benchmark_validate_root(c: &mut Criterion) {
    c.bench_function("validate_root_name", move |b| {
        b.iter(|| validate_span_name("user.creation.create", NameKind::Root))
    });
}

fn benchmark_validate_action(c: &mut Criterion) {
    c.bench_function("validate_action_name", move |b| {
        b.iter(|| validate_span_name("validate", NameKind::Action))
    });
}

fn benchmark_stack_compose(c: &mut Criterion) {
    c.bench_function("stack_push_compose_pop", move |b| {
        b.iter(|| {
            let stack = SpanStack::new();
            stack
                .push_root("user.creation.create", SpanContext::default())
                .unwrap();
            stack
                .push_action("validate", SpanContext::default())
                .unwrap();
            stack.pop();
            stack.pop();
        })
    });
}

criterion_group!(
    benches,
    benchmark_validate_root,
    benchmark_validate_action,
    benchmark_stack_compose
);
criterion_main!(benches);
