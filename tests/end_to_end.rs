//! End-to-end playback: notifications on the wall clock and rendered audio
//! on an offline context.

use progression_player::{
    ChordProgression, OutputContext, PlaybackScheduler, PlaybackState, ProgressionExporter,
    ExportSettings,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

const SAMPLE_RATE: f32 = 8000.0;

const C_MAJOR_G7: &str = r#"[
    {"name": "C Major", "notes": [
        {"name": "C", "octave": 4}, {"name": "E", "octave": 4}, {"name": "G", "octave": 4}
    ]},
    {"name": "G7", "notes": [
        {"name": "G", "octave": 4}, {"name": "B", "octave": 4},
        {"name": "D", "octave": 5}, {"name": "F", "octave": 5}
    ]}
]"#;

fn render(ctx: &OutputContext, seconds: f64) -> Vec<f32> {
    let frames = (seconds * SAMPLE_RATE as f64).round() as usize;
    let mut buffer = vec![0.0; frames];
    ctx.render_offline(&mut buffer).unwrap();
    buffer
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0, |acc, s| acc.max(s.abs()))
}

/// Notes whose octave puts them outside the f64 range render as silence,
/// never as NaN or infinity
#[test]
fn test_extreme_octaves_render_finite_audio() {
    let progression = ChordProgression::from_json(
        r#"[{"name": "Out of range", "notes": [
            {"name": "A", "octave": 4},
            {"name": "A", "octave": 2000},
            {"name": "C", "octave": 2147483647},
            {"name": "Cb", "octave": -2147483648}
        ]}]"#,
    )
    .unwrap();
    let ctx = OutputContext::offline(SAMPLE_RATE);
    let mut scheduler = PlaybackScheduler::new();
    scheduler
        .play(&progression, &ctx, 120.0, |_| {}, || {})
        .unwrap();

    let samples = render(&ctx, 2.0);
    assert!(samples.iter().all(|s| s.is_finite()));
    assert!(peak(&samples) > 0.01, "the A4 still sounds");
    assert_eq!(scheduler.active_resource_count(), 2);
}

/// Two chords at 120 BPM: chord 0, chord 1, then finish after about 4.1 s
#[test]
fn test_c_major_g7_at_120_bpm() {
    let progression = ChordProgression::from_json(C_MAJOR_G7).unwrap();
    let ctx = OutputContext::offline(SAMPLE_RATE);
    let mut scheduler = PlaybackScheduler::new();
    let log: Rc<RefCell<Vec<(String, Duration)>>> = Rc::new(RefCell::new(Vec::new()));

    let started = Instant::now();
    let chord_log = Rc::clone(&log);
    let finish_log = Rc::clone(&log);
    scheduler
        .play(
            &progression,
            &ctx,
            120.0,
            move |index| {
                chord_log
                    .borrow_mut()
                    .push((format!("chord {}", index), started.elapsed()))
            },
            move || {
                finish_log
                    .borrow_mut()
                    .push(("finish".to_string(), started.elapsed()))
            },
        )
        .unwrap();

    assert!(scheduler.wait_until_finished(Duration::from_secs(10)));

    let log = log.borrow();
    let labels: Vec<&str> = log.iter().map(|(label, _)| label.as_str()).collect();
    assert_eq!(labels, ["chord 0", "chord 1", "finish"]);

    let at = |i: usize| log[i].1.as_secs_f64();
    assert!(at(0) >= 0.1 && at(0) < 0.6, "chord 0 at {}", at(0));
    assert!(at(1) >= 2.1 && at(1) < 2.6, "chord 1 at {}", at(1));
    assert!(at(2) >= 4.1 && at(2) < 4.6, "finish at {}", at(2));

    assert_eq!(scheduler.state(), PlaybackState::Finished);
    assert_eq!(ctx.node_count(), 0);
}

#[test]
fn test_rendered_audio_follows_schedule() {
    let progression = ChordProgression::from_json(C_MAJOR_G7).unwrap();
    let ctx = OutputContext::offline(SAMPLE_RATE);
    let mut scheduler = PlaybackScheduler::new();
    scheduler.play(&progression, &ctx, 120.0, |_| {}, || {}).unwrap();

    let lead_in = render(&ctx, 0.1);
    let first_chord = render(&ctx, 1.8);
    let first_gap = render(&ctx, 0.2);
    let second_chord = render(&ctx, 1.8);
    let tail = render(&ctx, 0.5);

    assert_eq!(peak(&lead_in), 0.0);
    assert!(peak(&first_chord) > 0.1, "first chord peak {}", peak(&first_chord));
    assert_eq!(peak(&first_gap), 0.0);
    assert!(peak(&second_chord) > 0.1, "second chord peak {}", peak(&second_chord));
    assert_eq!(peak(&tail), 0.0);

    // Envelope tops out at 0.3 per chord
    assert!(peak(&first_chord) <= 0.3 * 3.0 + 1e-3);
    assert!(peak(&second_chord) <= 0.3 * 4.0 + 1e-3);
}

#[test]
fn test_stop_silences_immediately() {
    let progression = ChordProgression::from_json(C_MAJOR_G7).unwrap();
    let ctx = OutputContext::offline(SAMPLE_RATE);
    let mut scheduler = PlaybackScheduler::new();
    scheduler.play(&progression, &ctx, 120.0, |_| {}, || {}).unwrap();

    let sounding = render(&ctx, 0.5);
    assert!(peak(&sounding) > 0.1);

    scheduler.stop_all(Some(&ctx));
    let after_stop = render(&ctx, 4.0);
    assert_eq!(peak(&after_stop), 0.0);
}

#[test]
fn test_superseded_session_does_not_overlap() {
    let progression = ChordProgression::from_json(C_MAJOR_G7).unwrap();
    let ctx = OutputContext::offline(SAMPLE_RATE);
    let mut scheduler = PlaybackScheduler::new();

    scheduler.play(&progression, &ctx, 120.0, |_| {}, || {}).unwrap();
    render(&ctx, 1.0);

    let single_note = ChordProgression::from_json(
        r#"[{"name": "A", "notes": [{"name": "A", "octave": 4}]}]"#,
    )
    .unwrap();
    scheduler.play(&single_note, &ctx, 120.0, |_| {}, || {}).unwrap();

    // The old chord is gone before the new lead-in ends
    let lead_in = render(&ctx, 0.1);
    assert_eq!(peak(&lead_in), 0.0);

    // A single tone under a 0.3 envelope can never exceed 0.3
    let new_chord = render(&ctx, 1.8);
    assert!(peak(&new_chord) > 0.1);
    assert!(peak(&new_chord) <= 0.3 + 1e-3);
}

#[test]
fn test_export_matches_progression_length() {
    let progression = ChordProgression::from_json(C_MAJOR_G7).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("c_major_g7.wav");

    let exporter = ProgressionExporter::new(ExportSettings {
        sample_rate: 8000,
        bit_depth: 24,
        channels: 1,
    });
    let summary = exporter.export(&progression, 120.0, &path).unwrap();

    assert!((summary.duration_seconds - 4.1).abs() < 1e-9);
    assert_eq!(summary.frames, 32800);

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().bits_per_sample, 24);
    assert_eq!(reader.duration(), 32800);
}
