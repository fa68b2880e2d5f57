//! Benchmarks for 2D nesting operations.
//!
//! Measures outside/inside NFP computation and full ticks of the run loop
//! at various scales.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polynest_d2::nfp::{inside_nfp, outside_nfp};
use polynest_d2::{Clipper, Config, Nester, PartInput, Point};

fn l_shape(size: f64) -> Vec<Point> {
    let t = size / 3.0;
    PartInput::from_tuples(&[
        (0.0, 0.0),
        (size, 0.0),
        (size, t),
        (t, t),
        (t, size),
        (0.0, size),
    ])
    .points
}

fn circle(radius: f64, segments: usize) -> Vec<Point> {
    (0..segments)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / segments as f64;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn bench_outside_nfp(c: &mut Criterion) {
    let clipper = Clipper::new(&Config::default());
    let mut group = c.benchmark_group("outside_nfp");

    for &segments in &[8, 32, 64] {
        let a = circle(20.0, segments);
        let b = circle(10.0, segments);
        group.bench_with_input(BenchmarkId::new("convex", segments), &(a, b), |bench, (a, b)| {
            bench.iter(|| outside_nfp(black_box(a), black_box(b), &clipper, false))
        });
    }

    let a = l_shape(30.0);
    let b = l_shape(12.0);
    group.bench_function("concave", |bench| {
        bench.iter(|| outside_nfp(black_box(&a), black_box(&b), &clipper, false))
    });
    group.bench_function("concave_explore", |bench| {
        bench.iter(|| outside_nfp(black_box(&a), black_box(&b), &clipper, true))
    });
    group.finish();
}

fn bench_inside_nfp(c: &mut Criterion) {
    let clipper = Clipper::new(&Config::default());
    let mut group = c.benchmark_group("inside_nfp");

    let rect = PartInput::rectangle(0.0, 0.0, 200.0, 100.0).points;
    let part = l_shape(20.0);
    group.bench_function("rectangle", |bench| {
        bench.iter(|| inside_nfp(black_box(&rect), black_box(&part), &clipper, false))
    });

    let container = l_shape(200.0);
    group.bench_function("concave_container", |bench| {
        bench.iter(|| inside_nfp(black_box(&container), black_box(&part), &clipper, false))
    });
    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("nester_tick");
    group.sample_size(10);

    for &n in &[5, 10, 20] {
        let parts: Vec<PartInput> = (0..n)
            .map(|i| {
                let w = 20.0 + (i as f64 * 3.0) % 30.0;
                let h = 15.0 + (i as f64 * 7.0) % 25.0;
                PartInput::rectangle(i as f64 * 100.0, 0.0, w, h)
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("rectangles", n), &parts, |bench, parts| {
            bench.iter(|| {
                let mut nester = Nester::new(Config::default().with_seed(1));
                nester.set_container(PartInput::rectangle(0.0, 0.0, 200.0, 200.0));
                nester.set_parts(parts.clone());
                black_box(nester.tick())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_outside_nfp, bench_inside_nfp, bench_tick);
criterion_main!(benches);
