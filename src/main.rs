//! stacksynth: a monophonic stacking synthesizer.
//!
//! Usage:
//!   stacksynth play --config synth.toml
//!   stacksynth render out.wav --note 57 --hold 1.5
//!   stacksynth devices
//!   stacksynth midi-ports

use clap::{Parser, Subcommand};
use ss_engine::note_to_frequency;
use ss_master::{render_note, render_note_seeded, Controller, Frame, SynthConfig};
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(all(feature = "alloc_check", debug_assertions))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

#[derive(Parser)]
#[command(version, about = "A monophonic stacking synthesizer.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plays through the default audio device, driven by MIDI input.
    Play {
        /// Path to a TOML synth config.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// MIDI input port index, overriding the config.
        #[arg(short, long)]
        midi_port: Option<usize>,
        /// Don't open MIDI input.
        #[arg(long)]
        no_midi: bool,
        /// MIDI notes to hold from the start.
        #[arg(short, long)]
        note: Vec<u8>,
        /// Stop after this many seconds instead of running until killed.
        #[arg(short, long)]
        duration: Option<f32>,
    },
    /// Renders a single note to a WAV file.
    Render {
        /// Output WAV path.
        output: PathBuf,
        /// Path to a TOML synth config.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// MIDI note number to render.
        #[arg(short, long, default_value_t = 69)]
        note: u8,
        /// Seconds to hold the note.
        #[arg(long, default_value_t = 1.0)]
        hold: f32,
        /// Seconds to keep rendering after release.
        #[arg(long, default_value_t = 1.0)]
        tail: f32,
        /// Fixed random seed for reproducible drift.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Lists the available audio output devices.
    Devices,
    /// Lists the available MIDI input ports.
    MidiPorts,
    /// Prints the effective configuration as TOML.
    Config {
        /// Path to a TOML synth config.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config,
            midi_port,
            no_midi,
            note,
            duration,
        } => play(load_config(config.as_deref())?, midi_port, no_midi, &note, duration)?,
        Commands::Render {
            output,
            config,
            note,
            hold,
            tail,
            seed,
        } => {
            let config = load_config(config.as_deref())?;
            let frequency = note_to_frequency(note.min(127));
            info!(note, frequency, hold, tail, "rendering");

            let frames = match seed {
                Some(seed) => render_note_seeded(&config, frequency, hold, tail, seed),
                None => render_note(&config, frequency, hold, tail),
            };
            let mut file = std::io::BufWriter::new(std::fs::File::create(&output)?);
            ss_master::write_wav(&mut file, &frames, config.effective_sample_rate())?;
            file.flush()?;
            println!("Wrote {} frames to {}", frames.len(), output.display());
        }
        Commands::Devices => {
            let devices = ss_audio::list_output_devices()?;
            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }
            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::MidiPorts => {
            let ports = ss_midi::list_ports()?;
            if ports.is_empty() {
                println!("No MIDI input ports found.");
                return Ok(());
            }
            println!("MIDI input ports:");
            for port in ports {
                let marker = if ss_midi::is_virtual_port(&port.name) {
                    " (virtual)"
                } else {
                    ""
                };
                println!("{:>3}: {}{}", port.index, port.name, marker);
            }
        }
        Commands::Config { config } => {
            print!("{}", load_config(config.as_deref())?.to_toml_string()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SynthConfig, ss_master::ConfigError> {
    match path {
        Some(path) => SynthConfig::load(path),
        None => Ok(SynthConfig::default()),
    }
}

fn play(
    config: SynthConfig,
    midi_port: Option<usize>,
    no_midi: bool,
    notes: &[u8],
    duration: Option<f32>,
) -> Result<(), Box<dyn Error>> {
    let mut controller = Controller::new(config);
    controller.play()?;

    if !no_midi {
        match controller.connect_midi(midi_port) {
            Ok(name) => println!("MIDI input: {}", name),
            Err(e) => warn!(error = %e, "continuing without MIDI"),
        }
    }

    for &note in notes {
        controller.trigger(note_to_frequency(note.min(127)));
    }

    let started = Instant::now();
    let limit = duration.and_then(|secs| Duration::try_from_secs_f32(secs.max(0.0)).ok());
    let mut scope = vec![Frame::silence(); 1024];
    let tap = controller.tap();

    while controller.is_playing() {
        if limit.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }

        let status = controller.status();
        let copied = tap.copy_latest(&mut scope, 1024);
        let peak = scope[..copied].iter().map(|f| f.peak()).fold(0.0, f32::max);
        print!(
            "\rNotes: {:>3} | Freq: {:>8.2} Hz | Cutoff: {:>8.1} Hz | Level: {:<20}",
            status.active_notes,
            if status.gate { status.frequency } else { 0.0 },
            status.low_pass_cutoff,
            meter(peak),
        );
        let _ = std::io::stdout().flush();
        std::thread::sleep(Duration::from_millis(30));
    }

    controller.disconnect_midi();
    controller.stop();
    println!("\rDone.{:<80}", "");
    Ok(())
}

fn meter(peak: f32) -> String {
    let width = (peak.clamp(0.0, 1.0) * 20.0).round() as usize;
    "#".repeat(width)
}
