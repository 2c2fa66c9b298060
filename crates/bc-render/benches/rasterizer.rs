//! Coût du rendu d'un beat (tracé 800×600 puis réduction 224×224).
//!
//! Run with: cargo bench -p bc-render --bench rasterizer

use bc_core::beat::{Beat, BeatWindow};
use bc_core::config::RenderConfig;
use bc_core::record::Record;
use bc_render::BeatRenderer;
use bc_render::rasterizer::{LineRasterizer, PlotStyle};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn synthetic(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = i as f32 / 360.0;
            (t * 7.0).sin() * 0.2 + (-(t * 40.0 - 10.0).powi(2)).exp()
        })
        .collect()
}

fn bench_plot(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_plot");
    let rasterizer = LineRasterizer::new(PlotStyle::default()).unwrap_or_else(|e| panic!("{e}"));
    for n in [100usize, 300, 1000] {
        let samples = synthetic(n);
        group.bench_with_input(BenchmarkId::new("plot", n), &samples, |b, s| {
            b.iter(|| rasterizer.plot(black_box(s)));
        });
    }
    group.finish();
}

fn bench_render_image(c: &mut Criterion) {
    let mut renderer =
        BeatRenderer::new(&RenderConfig::default()).unwrap_or_else(|e| panic!("{e}"));
    let record = Record {
        id: "bench".into(),
        samples: synthetic(2000),
        annotations: Vec::new(),
    };
    let beat = Beat {
        record_id: "bench".into(),
        index: 0,
        window: BeatWindow { start: 200, end: 500 },
        label: "N".into(),
    };
    c.bench_function("render_image_300", |b| {
        b.iter(|| renderer.render_image(black_box(&record), black_box(&beat)));
    });
}

criterion_group!(benches, bench_plot, bench_render_image);
criterion_main!(benches);
