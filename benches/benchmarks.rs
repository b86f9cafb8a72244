use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use grawk::{
    compile, prepare_matcher, run_substitution, scan, BackendChoice, LiteralMatcher, Matcher,
    Options,
};

fn log_input(lines: usize) -> Vec<u8> {
    (0..lines)
        .map(|i| {
            if i % 10 == 0 {
                format!("error: request {} failed with status {}\n", i, i % 7)
            } else {
                format!("info: request {} completed in {}ms\n", i, i % 250)
            }
        })
        .collect::<String>()
        .into_bytes()
}

// ============ Byte-Scan Benchmarks ============

fn bench_newline_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("newline_scan");

    for size in [1_000, 100_000] {
        let input = log_input(size / 40);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("find_all", size), &input, |b, input| {
            b.iter(|| {
                let mut pos = 0;
                let mut count = 0;
                while pos < input.len() {
                    pos = grawk::simd::find_next_newline(black_box(input), pos) + 1;
                    count += 1;
                }
                count
            })
        });
    }

    group.finish();
}

// ============ Literal Matcher Benchmarks ============

fn bench_literal(c: &mut Criterion) {
    let mut group = c.benchmark_group("literal");

    let input = log_input(2_000);
    let matcher = LiteralMatcher::new(b"status", false).unwrap();
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("bmh_scan", |b| {
        b.iter(|| matcher.find(black_box(&input)))
    });

    let folded = LiteralMatcher::new(b"STATUS", true).unwrap();
    group.bench_function("bmh_scan_case_insensitive", |b| {
        b.iter(|| folded.find(black_box(&input)))
    });

    group.finish();
}

// ============ Regex Benchmarks ============

fn bench_regex(c: &mut Criterion) {
    let mut group = c.benchmark_group("regex");

    group.bench_function("compile_alternation", |b| {
        b.iter(|| compile(black_box(b"error|warn|fatal"), false).unwrap())
    });

    group.bench_function("compile_classes", |b| {
        b.iter(|| compile(black_box(b"[0-9]+ms [a-z_]+"), false).unwrap())
    });

    let line = b"info: request 4821 completed in 93ms";
    let digits = compile(b"[0-9]+", false).unwrap();
    group.bench_function("exec_digits", |b| {
        b.iter(|| grawk::regex::find(black_box(&digits), black_box(line), 0))
    });

    let anchored = compile(b"^error", false).unwrap();
    group.bench_function("exec_anchored_miss", |b| {
        b.iter(|| grawk::regex::find(black_box(&anchored), black_box(line), 0))
    });

    group.finish();
}

// ============ Engine Benchmarks ============

fn bench_scan_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    for lines in [100, 1_000, 10_000] {
        let input = log_input(lines);
        group.throughput(Throughput::Bytes(input.len() as u64));

        group.bench_with_input(BenchmarkId::new("literal", lines), &input, |b, input| {
            let matcher = prepare_matcher(b"error", &Options::new()).unwrap();
            b.iter(|| scan(black_box(input), &matcher, &Options::new()).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("regex", lines), &input, |b, input| {
            let matcher = prepare_matcher(b"[0-9]+ms", &Options::new()).unwrap();
            b.iter(|| scan(black_box(input), &matcher, &Options::new()).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("fields", lines), &input, |b, input| {
            let matcher = Matcher::Empty;
            let options = Options::new().extract_fields(true);
            b.iter(|| scan(black_box(input), &matcher, &options).unwrap())
        });
    }

    group.finish();
}

// ============ Substitution Benchmarks ============

fn bench_substitution(c: &mut Criterion) {
    let mut group = c.benchmark_group("substitution");

    let input = log_input(2_000);
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("literal_global", |b| {
        let options = Options::new().global_substitution(true);
        b.iter(|| run_substitution(black_box(&input), b"request", b"call", &options).unwrap())
    });

    group.bench_function("regex_global", |b| {
        let options = Options::new().global_substitution(true);
        b.iter(|| run_substitution(black_box(&input), b"[0-9]+", b"#", &options).unwrap())
    });

    group.finish();
}

// ============ Dispatcher Benchmarks ============

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    let input = log_input(1_000);
    group.bench_function("auto_cpu", |b| {
        b.iter(|| {
            grawk::run_scan(
                black_box(&input),
                b"error",
                &Options::new(),
                BackendChoice::Auto,
            )
            .unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_newline_scan,
    bench_literal,
    bench_regex,
    bench_scan_throughput,
    bench_substitution,
    bench_dispatch,
);

criterion_main!(benches);
