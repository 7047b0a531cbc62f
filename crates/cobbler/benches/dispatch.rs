// Dispatch benchmarks
//
// This benchmark suite measures:
// - Virtual sends resolved in the receiver's own table
// - Sends inherited from deeper in the hierarchy
// - Super-call chains (constructor cost by depth)
// - Static sends

use cobbler::runtime::{Arg, Class, ClassBuilder, Message, Object, Primitive, Shape, send_static};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::alloc::Layout;

fn bench_method(_msg: &Message<'_>, _args: &[Arg]) -> cobbler::Result<Arg> {
    Ok(Arg::Nil)
}

fn chain_create(msg: &Message<'_>, args: &[Arg]) -> cobbler::Result<Arg> {
    msg.super_call(args)
}

/// Builds `depth` classes below the root; only the topmost defines `work`.
fn build_chain(prefix: &str, depth: usize) -> Class {
    let mut class = ClassBuilder::with_layout(&format!("{prefix}0"), Primitive::class(), Layout::new::<u64>())
        .method("work", bench_method)
        .method("create", chain_create)
        .register()
        .unwrap();
    for level in 1..depth {
        class = ClassBuilder::with_layout(&format!("{prefix}{level}"), class, Layout::new::<u64>())
            .method("create", chain_create)
            .register()
            .unwrap();
    }
    class
}

fn bench_own_method(c: &mut Criterion) {
    let class = build_chain("BenchOwn", 1);
    let object = Object::create(class, &[]).unwrap().unwrap();

    c.bench_function("send_own_method", |b| {
        b.iter(|| black_box(object.send(black_box("work"), &[]).unwrap()))
    });
}

fn bench_inherited_method(c: &mut Criterion) {
    let mut group = c.benchmark_group("send_inherited");
    for depth in [2, 5, 10] {
        let leaf = build_chain(&format!("BenchInherit{depth}_"), depth);
        let object = Object::create(leaf, &[]).unwrap().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| black_box(object.send("work", &[]).unwrap()))
        });
    }
    group.finish();
}

fn bench_create_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_chain");
    for depth in [1, 5, 10] {
        let leaf = build_chain(&format!("BenchCreate{depth}_"), depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| black_box(Object::create(leaf, &[]).unwrap()))
        });
    }
    group.finish();
}

fn bench_static_send(c: &mut Criterion) {
    let leaf = build_chain("BenchStatic", 3);
    let root = leaf.hierarchy()[2];
    let object = Object::create(leaf, &[]).unwrap().unwrap();

    c.bench_function("send_static", |b| {
        b.iter(|| black_box(send_static(root, &object, "work", &[]).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_own_method,
    bench_inherited_method,
    bench_create_chain,
    bench_static_send
);
criterion_main!(benches);
