use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use shopmap::{
    Bounds, ClusterConfig, ManualClock, Point, QueryConfig, ShopIndex, ShopPoint, TrackerConfig,
    ViewportEvent, ViewportTracker, query_clusters,
};
use std::time::Duration;

fn scattered(n: usize) -> Vec<ShopPoint> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 1_000_000) as f64 / 1_000_000.0
    };

    (0..n)
        .map(|i| {
            ShopPoint::new(
                format!("shop {}", i),
                "zabka",
                "",
                49.0 + next() * 5.8,
                14.2 + next() * 9.8,
            )
        })
        .collect()
}

fn benchmark_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    group.sample_size(20);

    for size in [1_000, 10_000, 50_000] {
        let shops = scattered(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &shops, |b, shops| {
            b.iter(|| ShopIndex::build(black_box(shops.clone()), &ClusterConfig::default()))
        });
    }

    group.finish();
}

fn benchmark_cluster_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster_queries");
    let index = ShopIndex::build(scattered(50_000), &ClusterConfig::default());
    let query = QueryConfig::default();

    let poland = Bounds::new(14.0, 49.0, 24.2, 55.0);
    let warsaw = Bounds::new(20.85, 52.10, 21.27, 52.37);

    for zoom in [5.0, 8.0, 11.0, 14.0, 16.0] {
        group.bench_with_input(BenchmarkId::new("poland", zoom), &zoom, |b, &zoom| {
            b.iter(|| query_clusters(&index, black_box(&poland), zoom, &query).len())
        });
        group.bench_with_input(BenchmarkId::new("warsaw", zoom), &zoom, |b, &zoom| {
            b.iter(|| query_clusters(&index, black_box(&warsaw), zoom, &query).len())
        });
    }

    let ids: Vec<_> = index
        .clusters(&poland, 6.0)
        .iter()
        .filter_map(|f| f.cluster_id())
        .take(50)
        .collect();
    group.bench_function("expansion_zoom_50", |b| {
        b.iter(|| {
            ids.iter()
                .filter_map(|&id| index.expansion_zoom(black_box(id)).ok())
                .count()
        })
    });

    group.finish();
}

fn benchmark_tracker(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewport_tracker");

    group.bench_function("settle_burst_100", |b| {
        b.iter(|| {
            let clock = ManualClock::new();
            let mut tracker = ViewportTracker::with_clock(TrackerConfig::default(), clock.clone());
            for i in 0..100 {
                let center = Point::new(21.0 + i as f64 * 0.01, 52.2);
                let event = ViewportEvent::new(center, Bounds::around(center, 0.1, 0.1), 13.0);
                tracker.on_settle(black_box(&event));
                clock.advance(Duration::from_millis(10));
                tracker.poll();
            }
            clock.advance(Duration::from_millis(500));
            tracker.poll()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_index_build,
    benchmark_cluster_queries,
    benchmark_tracker
);
criterion_main!(benches);
