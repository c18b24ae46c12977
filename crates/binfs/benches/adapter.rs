//! Benchmarks for the asset filesystem adapter.
//!
//! Measures path lookup, sequential reads and full HTTP handling over
//! embedded trees of various sizes.
//!
//! # Run Benchmarks
//!
//! ```bash
//! cargo bench --bench adapter
//! ```

use binfs::{Asset, AssetFs, Directory, FileSystem, Runtime, StaticFiles};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use http::Request;
use std::hint::black_box;
use std::time::SystemTime;

fn tree(file_count: usize, file_size: usize) -> Directory {
    let assets = (0..file_count).map(|i| {
        Asset::new(
            format!("file{i}.css"),
            format!("static/file{i}.css"),
            vec![b'x'; file_size],
            0o644,
            SystemTime::UNIX_EPOCH,
        )
    });
    Directory::builder("static", "static")
        .assets(assets)
        .build()
        .unwrap()
}

/// Benchmark opening a file as the tree grows.
fn bench_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("open_by_file_count");
    let runtime = Runtime::production();

    for file_count in [10, 100, 1_000] {
        let root = tree(file_count, 64);
        let fs = AssetFs::new(&root, &runtime);
        let path = format!("/file{}.css", file_count / 2);

        group.bench_with_input(BenchmarkId::from_parameter(file_count), &path, |b, path| {
            b.iter(|| fs.open(black_box(path)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark reading a whole file in fixed-size chunks.
fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_by_file_size");
    let runtime = Runtime::production();

    for file_size in [1_024, 64 * 1_024, 1_024 * 1_024] {
        let root = tree(1, file_size);
        let fs = AssetFs::new(&root, &runtime);
        group.throughput(Throughput::Bytes(file_size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(file_size), &fs, |b, fs| {
            let mut buf = vec![0u8; 8 * 1_024];
            b.iter(|| {
                let mut file = fs.open("/file0.css").unwrap();
                let mut total = 0;
                while let Ok(n) = file.read(&mut buf) {
                    total += n;
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

/// Benchmark a full GET through the HTTP handler.
fn bench_handle(c: &mut Criterion) {
    let runtime = Runtime::production();
    let root = tree(100, 4 * 1_024);
    let files = StaticFiles::new(AssetFs::new(&root, &runtime), &runtime);
    let request = Request::get("/file50.css").body(()).unwrap();

    c.bench_function("handle_get", |b| {
        b.iter(|| black_box(files.handle(black_box(&request))));
    });
}

criterion_group!(benches, bench_open, bench_read, bench_handle);
criterion_main!(benches);
