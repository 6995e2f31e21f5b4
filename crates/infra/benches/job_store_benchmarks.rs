use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use jobboard_core::NewJob;
use jobboard_infra::job_store::{InMemoryJobStore, JobStore, PageRequest};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build bench runtime")
}

fn batch(prefix: &str, size: usize) -> Vec<NewJob> {
    (0..size)
        .map(|i| NewJob::new(format!("Job {i}"), format!("https://bench.example/{prefix}/{i}")))
        .collect()
}

fn bench_bulk_insert_throughput(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("bulk_insert_throughput");

    for batch_size in [1usize, 10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));

        group.bench_with_input(BenchmarkId::new("fresh_urls", batch_size), batch_size, |b, &size| {
            let store = InMemoryJobStore::new();
            let mut round = 0u64;
            b.iter(|| {
                round += 1;
                let jobs = batch(&round.to_string(), size);
                black_box(rt.block_on(store.bulk_insert(jobs)).unwrap());
            });
        });

        // Every URL already stored: measures the pure dedup path.
        group.bench_with_input(BenchmarkId::new("all_duplicates", batch_size), batch_size, |b, &size| {
            let store = InMemoryJobStore::new();
            rt.block_on(store.bulk_insert(batch("seed", size))).unwrap();
            b.iter(|| {
                black_box(rt.block_on(store.bulk_insert(batch("seed", size))).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_list_pages(c: &mut Criterion) {
    let rt = runtime();
    let store = InMemoryJobStore::new();
    rt.block_on(store.bulk_insert(batch("list", 10_000))).unwrap();

    let mut group = c.benchmark_group("list_pages");
    for page in [1i64, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::new("limit_100", page), page, |b, &page| {
            b.iter(|| {
                black_box(rt.block_on(store.list(PageRequest::new(Some(page), Some(100)))).unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_bulk_insert_throughput, bench_list_pages);
criterion_main!(benches);
