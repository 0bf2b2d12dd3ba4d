//! Scanner benchmarks

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use escscan::{ScanOptions, scan, scan_with, strip_ansi};

fn bench_plain_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner");

    let plain_text = "Hello, World! ".repeat(1000);
    group.throughput(Throughput::Bytes(plain_text.len() as u64));
    group.bench_function("plain_text", |b| b.iter(|| scan(black_box(&plain_text))));

    group.finish();
}

fn bench_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner");

    // Typical colored shell output with a title update per line
    let mixed =
        "\x1b]0;user@host\x07Line: \x1b[32mOK\x1b[0m\r\n\x1b(B\x1b[1;31mERROR\x1b[m\r\n".repeat(500);
    group.throughput(Throughput::Bytes(mixed.len() as u64));
    group.bench_function("mixed_scan", |b| {
        b.iter(|| scan_with(black_box(&mixed), ScanOptions::default()))
    });
    group.bench_function("mixed_strip", |b| b.iter(|| strip_ansi(black_box(&mixed))));

    group.finish();
}

fn bench_unterminated(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner");

    // Every ESC starts an OSC that never ends
    let broken = "\x1b]abc ".repeat(200);
    group.throughput(Throughput::Bytes(broken.len() as u64));
    group.bench_function("unterminated_osc", |b| b.iter(|| scan(black_box(&broken))));

    group.finish();
}

criterion_group!(benches, bench_plain_text, bench_mixed, bench_unterminated);
criterion_main!(benches);
