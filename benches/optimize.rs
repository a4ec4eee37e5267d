use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trigger_compiler::parse::parse;
use trigger_compiler::serial::serialize;
use trigger_compiler::{bit, byte, compile, once, word, CompileOptions, Condition, Trigger};

/// A chain of `n` byte filters, each paired with a looser duplicate bound so
/// the optimizer has redundancies to remove.
fn build_filters(n: u32) -> Condition {
    let mut condition = byte(0x1000).gt(0).and(byte(0x1000).gt(1));
    for i in 1..n {
        let address = 0x1000 + i;
        condition = condition
            .and(byte(address).gt(0))
            .and(byte(address).gt(1));
    }
    condition
}

/// `n` alternates sharing a common filter, plus one bit group per alternate.
fn build_alternates(n: u32) -> Condition {
    let mut alternates = byte(0x2000).eq(1).and(bit(0, 0x3000).eq(1));
    for i in 1..n {
        let alternate = byte(0x2000)
            .eq(1)
            .and(bit(0, 0x3000 + i).eq(1))
            .and(bit(1, 0x3000 + i).eq(0));
        alternates = alternates.or(alternate);
    }
    once(word(0x10).eq(5)).and(alternates)
}

fn lowered(condition: &Condition) -> Trigger {
    compile(condition, &CompileOptions::default().with_optimize(false)).unwrap()
}

fn bench_optimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize");

    for &n in &[5, 20, 50] {
        let trigger = lowered(&build_filters(n));
        group.bench_function(&format!("{n}_filters"), |b| {
            b.iter(|| black_box(trigger.clone()).optimized());
        });

        let trigger = lowered(&build_alternates(n));
        group.bench_function(&format!("{n}_alternates"), |b| {
            b.iter(|| black_box(trigger.clone()).optimized());
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    let options = CompileOptions::default();

    for &n in &[5, 20] {
        let condition = build_alternates(n);
        group.bench_function(&format!("{n}_alternates"), |b| {
            b.iter(|| compile(black_box(&condition), &options).unwrap());
        });
    }

    group.finish();
}

fn bench_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire");
    let text = serialize(&compile(&build_alternates(20), &CompileOptions::default()).unwrap());

    group.bench_function("parse", |b| {
        b.iter(|| parse(black_box(&text)).unwrap());
    });

    let trigger = parse(&text).unwrap();
    group.bench_function("serialize", |b| {
        b.iter(|| serialize(black_box(&trigger)));
    });

    group.finish();
}

criterion_group!(benches, bench_optimize, bench_compile, bench_wire);
criterion_main!(benches);
