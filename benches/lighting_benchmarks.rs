//! Benchmarks for the lighting mapper and the full refresh cycle

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mood_lighting::{
    color::ColorTable,
    emotion::{Detection, Emotion},
    lighting::{LightingMapper, TransitionConfig},
    pipeline::Pipeline,
    session_log::SessionLogger,
    smoothing::create_smoother,
};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(66);

fn benchmark_mapper(c: &mut Criterion) {
    let mut group = c.benchmark_group("lighting_mapper");

    group.bench_function("update_alpha", |b| {
        let mut mapper = LightingMapper::new(ColorTable::default(), TransitionConfig::default()).with_power(true);
        let mut i = 0;
        b.iter(|| {
            let emotion = Emotion::ALL[(i / 20) % Emotion::ALL.len()];
            i += 1;
            black_box(mapper.update(Some(black_box(emotion)), TICK))
        });
    });

    group.bench_function("update_time_constant", |b| {
        let transition = TransitionConfig {
            time_constant: Some(Duration::from_millis(300)),
            ..TransitionConfig::default()
        };
        let mut mapper = LightingMapper::new(ColorTable::default(), transition).with_power(true);
        let mut i = 0;
        b.iter(|| {
            let emotion = Emotion::ALL[(i / 20) % Emotion::ALL.len()];
            i += 1;
            black_box(mapper.update(Some(black_box(emotion)), TICK))
        });
    });

    group.finish();
}

fn benchmark_pipeline(c: &mut Criterion) {
    let detections: Vec<Detection> = (0..300)
        .map(|i| Detection::new(Emotion::ALL[(i / 30) % Emotion::ALL.len()], 0.8, Utc::now()))
        .collect();

    c.bench_function("pipeline_300_cycles", |b| {
        b.iter(|| {
            let mut pipeline = Pipeline::new(
                create_smoother("majority:10").unwrap(),
                LightingMapper::default().with_power(true),
                SessionLogger::new(),
            );
            for d in &detections {
                black_box(pipeline.process(Some(d.clone()), TICK));
            }
        });
    });
}

criterion_group!(benches, benchmark_mapper, benchmark_pipeline);
criterion_main!(benches);
