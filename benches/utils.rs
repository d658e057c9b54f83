//! 工具函数性能基准测试

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use decaylink::storage::ThreadRngSource;
use decaylink::storage::token::generate_token;
use decaylink::utils::{is_valid_token, parse_duration, validate_url};
use std::hint::black_box;

// ============== is_valid_token 基准测试 ==============

fn bench_is_valid_token(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/is_valid_token");

    group.bench_function("valid_short", |b| {
        b.iter(|| {
            assert!(is_valid_token(black_box("Ab_-")));
        });
    });

    // 无效 token
    group.bench_function("invalid_special_chars", |b| {
        b.iter(|| {
            assert!(!is_valid_token(black_box("'; DROP TABLE--")));
        });
    });

    let too_long = "a".repeat(129);
    group.bench_function("invalid_too_long", |b| {
        b.iter(|| {
            assert!(!is_valid_token(black_box(&too_long)));
        });
    });

    group.finish();
}

// ============== generate_token 基准测试 ==============

fn bench_generate_token(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/generate_token");

    for bytes in [3usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(bytes), &bytes, |b, &bytes| {
            b.iter(|| generate_token(&ThreadRngSource, black_box(bytes)).unwrap());
        });
    }

    group.finish();
}

// ============== validate_url 基准测试 ==============

fn bench_validate_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/validate_url");
    let schemes = vec!["https".to_string()];

    group.bench_function("accepted", |b| {
        b.iter(|| validate_url(black_box("https://example.com/path?q=1"), &schemes).unwrap());
    });

    group.bench_function("rejected_scheme", |b| {
        b.iter(|| validate_url(black_box("http://example.com/"), &schemes).unwrap_err());
    });

    group.finish();
}

// ============== parse_duration 基准测试 ==============

fn bench_parse_duration(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/parse_duration");

    for input in ["60", "7d", "1w2d3h4m5s"] {
        group.bench_with_input(BenchmarkId::from_parameter(input), &input, |b, &input| {
            b.iter(|| parse_duration(black_box(input)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_is_valid_token,
    bench_generate_token,
    bench_validate_url,
    bench_parse_duration
);
criterion_main!(benches);
