use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use progression_player::audio::graph::RenderGraph;
use progression_player::synth::envelope::GainEnvelope;
use progression_player::synth::oscillator::{ToneGenerator, Waveform};
use progression_player::{Chord, ChordProgression, Note, OutputContext, PlaybackScheduler};

const SAMPLE_RATE: f32 = 48000.0;
const BUFFER_SIZE: usize = 512;

/// Benchmark tone generation (one generator per sounding note)
fn bench_tone_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("tone_generator");

    for waveform in [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ] {
        let mut tone = ToneGenerator::new(waveform, SAMPLE_RATE);
        tone.set_frequency(440.0);
        tone.start_at(0);
        let mut frame = 0_u64;

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", waveform)),
            &BUFFER_SIZE,
            |b, &size| {
                b.iter(|| {
                    for _ in 0..size {
                        black_box(tone.next_sample(frame));
                        frame += 1;
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark envelope evaluation during the decay ramp
fn bench_envelope(c: &mut Criterion) {
    let mut envelope = GainEnvelope::default();
    envelope
        .set_value_at_time(0.0001, 0.1)
        .exponential_ramp_to_value_at_time(0.3, 0.12)
        .exponential_ramp_to_value_at_time(0.0001, 1.9);

    c.bench_function("envelope_value_at", |b| {
        b.iter(|| {
            for i in 0..BUFFER_SIZE {
                black_box(envelope.value_at(0.5 + i as f64 / SAMPLE_RATE as f64));
            }
        });
    });
}

/// Benchmark graph mixing with growing chord sizes
fn bench_graph_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_mix");

    for notes in [1, 3, 4, 8] {
        let mut graph = RenderGraph::new(SAMPLE_RATE);
        let gain = graph.create_gain();
        graph.connect_to_destination(gain).unwrap();
        for i in 0..notes {
            let tone = graph.create_tone(Waveform::Sine);
            graph.set_frequency(tone, 220.0 * (i + 1) as f64).unwrap();
            graph.connect(tone, gain).unwrap();
            graph.start(tone, 0.0).unwrap();
        }
        let mut frame = 0_u64;

        group.bench_with_input(BenchmarkId::from_parameter(notes), &BUFFER_SIZE, |b, &size| {
            b.iter(|| {
                for _ in 0..size {
                    black_box(graph.next_sample(frame));
                    frame += 1;
                }
            });
        });
    }
    group.finish();
}

/// Benchmark scheduling a long progression (node creation + envelopes)
fn bench_schedule_progression(c: &mut Criterion) {
    let chord = Chord::new(
        "C Major",
        vec![Note::new("C", 4), Note::new("E", 4), Note::new("G", 4)],
    );
    let progression = ChordProgression::new(vec![chord; 64]);
    let ctx = OutputContext::offline(SAMPLE_RATE);
    let mut scheduler = PlaybackScheduler::new();

    c.bench_function("schedule_64_chords", |b| {
        b.iter(|| {
            scheduler
                .play(black_box(&progression), &ctx, 120.0, |_| {}, || {})
                .unwrap();
            scheduler.stop_all(Some(&ctx));
        });
    });
}

criterion_group!(
    benches,
    bench_tone_generation,
    bench_envelope,
    bench_graph_mix,
    bench_schedule_progression
);
criterion_main!(benches);
