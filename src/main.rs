// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::Level;

use scales_trainer::audio::TracingPlayer;
use scales_trainer::config::{validate_config, ConfigWatcher, Selection, TrainerConfig};
use scales_trainer::music::{
    finger_name, pitch_class, Accidental, Direction, Hand, Key, Mode, Note, Pitch, Scale,
    ScaleShape,
};
use scales_trainer::playback::{CancelToken, PlaybackDriver, PlaybackEvent, PlaybackPlan};
use scales_trainer::session::{AttemptEnd, DisplayState, Session};
use scales_trainer::timing::{ManualClock, Metronome, TICKS_PER_BEAT};

fn print_usage() {
    println!("Scales Trainer - piano scale practice and grading");
    println!();
    println!("Usage: scales-trainer [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --list-scales             List every key and shape");
    println!("  --show <KEY> <SHAPE> [--left]");
    println!("                            Show the notes and fingering of a scale");
    println!("  --play <KEY> <SHAPE> [BPM]");
    println!("                            Play a scale demonstration (default 60 BPM)");
    println!("  --demo [CONFIG]           Run a simulated exam attempt");
    println!("  --random                  Pick a random scale to practise");
    println!("  --watch <CONFIG>          Follow a config file and apply each edit");
    println!("  --verbose                 Enable debug logging");
    println!("  --help                    Show this help message");
}

fn note_name(pitch: Pitch, key: &Key) -> &'static str {
    Note::from_pitch_class(pitch_class(pitch)).spelled(key.accidental())
}

fn parse_selection(key: &str, shape: &str, hand: Hand) -> Result<Selection> {
    let shape = ScaleShape::parse(shape)?;
    let mode = match shape.kind().key_mode() {
        Mode::Major => "major",
        Mode::Minor => "minor",
    };
    let key = Key::parse(key, mode)?;
    Ok(Selection { key, shape, hand })
}

fn list_scales() {
    for shape in ScaleShape::catalog() {
        println!("{}:", shape);
        let names: Vec<&str> = Note::ALL
            .iter()
            .map(|&tonic| Key::new(tonic, shape.kind().key_mode(), key_accidental(tonic)).name())
            .collect();
        println!("  {}", names.join(" "));
    }
}

/// Black-key tonics are listed with their more common spelling
fn key_accidental(tonic: Note) -> Accidental {
    match tonic {
        Note::Cs | Note::Fs => Accidental::Sharp,
        _ => Accidental::Flat,
    }
}

fn show_scale(selection: &Selection) {
    let scale = Scale::new(selection.key, selection.shape, selection.hand);
    println!("{} ({:?} hand)", scale, selection.hand);
    println!();
    for pitch in scale.pitches(Direction::Ascending) {
        let finger = scale.finger_at(pitch).map(finger_name).unwrap_or("-");
        let marker = if scale.required_finger_at(pitch).is_some() {
            "*"
        } else {
            ""
        };
        println!(
            "  {:>3}  {:<3} {}{}",
            pitch,
            note_name(pitch, &selection.key),
            finger,
            marker
        );
    }
    println!();
    println!("* finger must be chosen by the player");
}

async fn play_scale(selection: Selection, bpm: u32) -> Result<()> {
    let config = TrainerConfig::default();
    let mut session = Session::new(
        selection.key,
        selection.shape,
        selection.hand,
        config.session_options()?,
        config.clock(),
    );
    let mut options = config.playback_options()?;
    options.tempo = bpm;

    let plan = PlaybackPlan::for_scale(
        session.scale(),
        &session.keyboard().pitches(),
        options.direction,
        options.octaves,
    );
    let driver = PlaybackDriver::new(Arc::new(TracingPlayer));
    session.start_playback();
    println!("Playing {} at {} BPM...", session.scale(), bpm);

    let mut handle = driver.play_scale(plan, &options, CancelToken::new(), |_| {}, |_| {})?;
    while let Some(event) = handle.events().recv().await {
        match event {
            PlaybackEvent::NotePlayed(pitch) => {
                session.show_played_note(pitch);
                println!("  {}", note_name(pitch, &selection.key));
            }
            PlaybackEvent::Completed { played, .. } => {
                println!("Played {} notes", played);
                break;
            }
        }
    }
    handle.join().await?;
    session.finish_playback();
    Ok(())
}

fn run_demo(config: &TrainerConfig) -> Result<()> {
    let selection = config.selection()?;
    let options = config.session_options()?;
    let direction = options.direction;
    let mut session = Session::new(
        selection.key,
        selection.shape,
        selection.hand,
        options,
        ManualClock::new(config.timing.tempo),
    );
    println!("Exam: {} ({:?} hand, {:?})", session.scale(), selection.hand, direction);

    let mut notes = session.scale().pitches(direction);
    if direction == Direction::Descending {
        notes.reverse();
    }

    session.start_exam();
    let t0 = Instant::now();
    let beat = u64::from(TICKS_PER_BEAT);
    for (i, &pitch) in notes.iter().enumerate() {
        // One skipped note and one rushed note
        if i == 3 {
            continue;
        }
        let ticks = if i == 6 { beat / 2 } else { beat };
        session.metronome_mut().advance(ticks);
        session.record_tap(pitch, t0 + Duration::from_millis(300 * i as u64));
    }
    // No-op when the final note already ended the attempt
    session.end_attempt(AttemptEnd::TimedOut);

    println!();
    for (pitch, status) in session.statuses() {
        if status == DisplayState::NoShow {
            continue;
        }
        let explanation = session.explain(pitch).unwrap_or_default();
        println!(
            "  {:>3}  {:<3} {:<13} {}",
            pitch,
            note_name(pitch, &selection.key),
            status.to_string(),
            explanation
        );
    }
    println!();
    match session.exam_summary() {
        Some(summary) => println!("{}", summary),
        None => println!("No exam result"),
    }
    Ok(())
}

fn watch_config(path: &str) -> Result<()> {
    let config = validate_config(path)?;
    let selection = config.selection()?;
    let mut session = Session::new(
        selection.key,
        selection.shape,
        selection.hand,
        config.session_options()?,
        config.clock(),
    );
    let watcher = ConfigWatcher::new(path).with_context(|| format!("Failed to watch {}", path))?;
    println!("Practising {} ({:?} hand)", session.scale(), session.scale().hand());
    println!("Watching {} (press Ctrl+C to stop)...", path);

    while let Some(event) = watcher.recv() {
        match event.apply_to(&mut session) {
            Ok(changed) if changed.is_empty() => {
                println!("Reloaded: {} at {} BPM", session.scale(), session.metronome().tempo())
            }
            Ok(_) => println!(
                "Now practising {} ({:?} hand, {:?}) at {} BPM",
                session.scale(),
                session.scale().hand(),
                session.options().direction,
                session.metronome().tempo()
            ),
            Err(e) => println!("Kept {}: {}", session.scale(), e),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    args.retain(|a| a != "--verbose" && a != "-v");

    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .init();

    if args.len() < 2 {
        println!("Scales Trainer - piano scale practice and grading");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--list-scales" => {
            list_scales();
        }
        "--show" => {
            if args.len() < 4 {
                eprintln!("Error: --show requires a key and a shape");
                eprintln!("Use --list-scales to see available scales");
                std::process::exit(1);
            }
            let hand = if args.iter().any(|a| a == "--left") {
                Hand::Left
            } else {
                Hand::Right
            };
            let selection = parse_selection(&args[2], &args[3], hand)?;
            show_scale(&selection);
        }
        "--play" => {
            if args.len() < 4 {
                eprintln!("Error: --play requires a key and a shape");
                std::process::exit(1);
            }
            let selection = parse_selection(&args[2], &args[3], Hand::Right)?;
            let bpm: u32 = if args.len() >= 5 {
                args[4]
                    .parse()
                    .map_err(|_| anyhow!("Invalid tempo: {}", args[4]))?
            } else {
                60
            };
            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime.block_on(play_scale(selection, bpm))?;
        }
        "--demo" => {
            let config = match args.get(2) {
                Some(path) => TrainerConfig::load(path)?,
                None => TrainerConfig::default(),
            };
            run_demo(&config)?;
        }
        "--random" => {
            let selection = Selection::random(&mut rand::thread_rng());
            show_scale(&selection);
        }
        "--watch" => {
            if args.len() < 3 {
                eprintln!("Error: --watch requires a config file path");
                std::process::exit(1);
            }
            watch_config(&args[2])?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
