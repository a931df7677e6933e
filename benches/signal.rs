use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use waveform_analysis::analysis::{density_histogram, envelope};
use waveform_analysis::resample::resample;
use waveform_analysis::test_fixtures::generate_voiced_tone;

fn benchmark_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    group.sample_size(20);

    let samples = generate_voiced_tone(5.0, 44_100);
    group.throughput(Throughput::Elements(samples.len() as u64));

    for target in [22_050u32, 16_000] {
        group.bench_with_input(BenchmarkId::new("44100_to", target), &target, |b, &target| {
            b.iter(|| {
                let out = resample(black_box(&samples), 44_100, target).unwrap();
                black_box(out.len());
            });
        });
    }

    group.finish();
}

fn benchmark_plot_prep(c: &mut Criterion) {
    let mut group = c.benchmark_group("plot_prep");

    // One minute at 44.1 kHz, the size of a typical dataset clip.
    let samples = generate_voiced_tone(60.0, 44_100);
    group.throughput(Throughput::Elements(samples.len() as u64));

    group.bench_function("envelope_20k", |b| {
        b.iter(|| black_box(envelope(black_box(&samples), 20_000).len()));
    });

    group.bench_function("density_histogram_50", |b| {
        b.iter(|| black_box(density_histogram(black_box(&samples), 50).len()));
    });

    group.finish();
}

criterion_group!(benches, benchmark_resample, benchmark_plot_prep);
criterion_main!(benches);
