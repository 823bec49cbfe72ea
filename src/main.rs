use clap::{Parser, Subcommand};
use progression_player::audio::device::OutputDeviceManager;
use progression_player::{
    Chord, ChordProgression, ExportSettings, MusicTheoryInfo, Note, OutputContextManager,
    PlaybackError, PlaybackScheduler, PlayerConfig, ProgressionExporter,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How often the event loop wakes up to check the output context
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Progression Player - play chord progressions on the audio output
#[derive(Parser, Debug)]
#[command(name = "progression_player")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Play or render chord progressions", long_about = None)]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a progression through the audio output
    Play {
        /// JSON progression or scale/chord description (built-in demo if omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Tempo in beats per minute
        #[arg(short, long)]
        tempo: Option<f64>,

        /// Output device name
        #[arg(short, long)]
        device: Option<String>,

        /// Master volume, 0.0 to 1.0
        #[arg(long)]
        volume: Option<f32>,
    },

    /// Render a progression to a WAV file
    Export {
        /// JSON progression or scale/chord description (built-in demo if omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Output WAV file
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        /// Tempo in beats per minute
        #[arg(short, long)]
        tempo: Option<f64>,
    },

    /// List audio output devices
    Devices,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), PlaybackError> {
    let config = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::load_or_default()?,
    };

    match args.command {
        Commands::Play {
            file,
            tempo,
            device,
            volume,
        } => {
            let mut config = config;
            if device.is_some() {
                config.output_device = device;
            }
            if let Some(volume) = volume {
                config.master_volume = volume;
            }
            let tempo = tempo.unwrap_or(config.default_tempo_bpm);
            let progression = load_progression(file.as_deref())?;
            play(config, &progression, tempo)
        }
        Commands::Export {
            file,
            output,
            tempo,
        } => {
            let tempo = tempo.unwrap_or(config.default_tempo_bpm);
            let progression = load_progression(file.as_deref())?;
            export(config.export, &progression, tempo, &output)
        }
        Commands::Devices => list_devices(),
    }
}

fn play(config: PlayerConfig, progression: &ChordProgression, tempo: f64) -> Result<(), PlaybackError> {
    let mut manager = OutputContextManager::new(config);
    let mut scheduler = PlaybackScheduler::new();

    let ctx = manager.acquire()?;
    let names: Vec<String> = progression.iter().map(|chord| chord.name.clone()).collect();

    println!("Playing {} chords at {} BPM", progression.len(), tempo);
    scheduler.play(
        progression,
        ctx,
        tempo,
        move |index| {
            let name = names.get(index).map(String::as_str).unwrap_or("?");
            println!("  [{}] {}", index + 1, name);
        },
        || println!("Done."),
    )?;

    while scheduler.state().is_active() {
        scheduler.wait_for_event(EVENT_POLL_INTERVAL);

        for notification in ctx.drain_notifications() {
            notification.log();
        }
        if ctx.is_closed() {
            scheduler.stop_all(Some(&*ctx));
            return Err(PlaybackError::ContextClosed);
        }
    }

    manager.release();
    Ok(())
}

fn export(
    settings: ExportSettings,
    progression: &ChordProgression,
    tempo: f64,
    output: &Path,
) -> Result<(), PlaybackError> {
    let exporter = ProgressionExporter::new(settings);
    let summary = exporter.export(progression, tempo, output)?;
    println!(
        "Exported {:.2}s ({} frames) to {}",
        summary.duration_seconds,
        summary.frames,
        summary.path.display()
    );
    Ok(())
}

fn list_devices() -> Result<(), PlaybackError> {
    let devices = OutputDeviceManager::new().list_output_devices()?;
    if devices.is_empty() {
        println!("No output devices found");
    }
    for device in devices {
        let marker = if device.is_default { " (default)" } else { "" };
        println!("{}{}", device.name, marker);
    }
    Ok(())
}

/// Read a progression file. Accepts a chord list or a single scale/chord
/// description.
fn load_progression(path: Option<&Path>) -> Result<ChordProgression, PlaybackError> {
    let Some(path) = path else {
        return Ok(demo_progression());
    };

    let text = fs::read_to_string(path)?;
    match ChordProgression::from_json(&text) {
        Ok(progression) => Ok(progression),
        Err(progression_err) => match MusicTheoryInfo::from_json(&text) {
            Ok(info) => Ok(info.to_progression()),
            Err(_) => Err(progression_err),
        },
    }
}

fn demo_progression() -> ChordProgression {
    ChordProgression::new(vec![
        Chord::new(
            "C Major",
            vec![Note::new("C", 4), Note::new("E", 4), Note::new("G", 4)],
        ),
        Chord::new(
            "G7",
            vec![
                Note::new("G", 4),
                Note::new("B", 4),
                Note::new("D", 5),
                Note::new("F", 5),
            ],
        ),
    ])
}
