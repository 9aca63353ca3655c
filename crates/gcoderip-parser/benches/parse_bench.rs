//! Criterion benchmarks for program parsing and expression evaluation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gcoderip_core::ProgramUnits;
use gcoderip_parser::{evaluate, parse, ParseOptions, VarRef, VarTable};

fn generate_program(n: usize) -> String {
    let mut program = String::from("G20 G90 G17\n#<depth> = -0.05\nG0 Z0.25\n");
    for i in 0..n {
        let x = (i % 100) as f64 * 0.1;
        let y = (i / 100) as f64 * 0.1;
        match i % 4 {
            0 => program.push_str(&format!("G0 X{x:.4} Y{y:.4}\n")),
            1 => program.push_str("G1 Z#<depth> F10 (plunge)\n"),
            2 => program.push_str(&format!("G2 X{:.4} Y{y:.4} I0.05 J0 F20\n", x + 0.1)),
            _ => program.push_str("G0 Z[0.25 * 1]\n"),
        }
    }
    program.push_str("M2\n");
    program
}

fn bench_parse(c: &mut Criterion) {
    let small = generate_program(100);
    let large = generate_program(10_000);
    let units = ProgramUnits::default();
    let linearize = ParseOptions {
        arc_to_line: true,
        ..ParseOptions::default()
    };

    let mut group = c.benchmark_group("parse");
    group.bench_function("small", |b| {
        b.iter(|| parse(black_box(&small), units, &ParseOptions::default(), None))
    });
    group.bench_function("large", |b| {
        b.iter(|| parse(black_box(&large), units, &ParseOptions::default(), None))
    });
    group.bench_function("large_arc_to_line", |b| {
        b.iter(|| parse(black_box(&large), units, &linearize, None))
    });
    group.finish();
}

fn bench_expressions(c: &mut Criterion) {
    let mut vars = VarTable::new();
    vars.set(VarRef::Numbered(1), 2.5);
    vars.set(VarRef::named("radius"), 0.75);

    c.bench_function("evaluate", |b| {
        b.iter(|| {
            evaluate(
                black_box("[SIN[30] * #1 + SQRT[#<radius> ** 2] - 7 MOD 3]"),
                &vars,
            )
        })
    });
}

criterion_group!(benches, bench_parse, bench_expressions);
criterion_main!(benches);
