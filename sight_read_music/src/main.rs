// Sight-Read Exercise Generator: CLI entry point.
//
// Generates one exercise and prints its ABC text to stdout. Optionally writes
// the exercise metadata as JSON and the exercise itself as a MIDI file.
//
// Usage:
//   cargo run -p sight_read_music -- --level 5 [--bars N] [--bars-per-line N]
//     [--seed N] [--config FILE] [--output FILE] [--json FILE] [--midi FILE]
//     [--trace FILTER]
//
// Logs go to stderr, so the score on stdout can be piped straight into an
// ABC renderer.

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sight_read_music::config::GeneratorConfig;
use sight_read_music::exercise::{ExerciseRequest, generate_exercise};
use sight_read_music::midi::write_midi;
use std::path::PathBuf;
use std::process::ExitCode;

/// Generate a two-staff sight-reading exercise as ABC notation.
#[derive(Debug, Parser)]
#[command(about, version)]
struct Cli {
    /// Difficulty level (1-8). Out-of-range values are clamped.
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    level: i64,

    /// Number of bars. Defaults to the config value.
    #[arg(short, long, allow_negative_numbers = true)]
    bars: Option<i64>,

    /// Bars per system. Defaults to the config value.
    #[arg(long, allow_negative_numbers = true)]
    bars_per_line: Option<i64>,

    /// RNG seed for reproducible output.
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON generator config.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the ABC text here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write exercise metadata (key, tempo, meter) as JSON.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write the exercise as a Standard MIDI File.
    #[arg(long)]
    midi: Option<PathBuf>,

    /// Tracing filter, e.g. `debug` or `sight_read_music::melody=trace`.
    #[arg(long = "trace", alias = "log", default_value = "warn")]
    trace_filter: tracing_subscriber::filter::Targets,
}

fn main() -> ExitCode {
    use tracing_subscriber::prelude::*;

    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .with(cli.trace_filter.clone())
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };

    let mut rng = match cli.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };

    let request = ExerciseRequest {
        level: cli.level,
        total_bars: cli.bars,
        bars_per_line: cli.bars_per_line,
    };
    let exercise = generate_exercise(&request, &config, &mut rng);

    match &cli.output {
        Some(path) => std::fs::write(path, exercise.score.as_str())?,
        None => println!("{}", exercise.score),
    }

    if let Some(path) = &cli.json {
        let json = serde_json::to_string_pretty(&exercise.metadata())?;
        std::fs::write(path, json)?;
    }

    if let Some(path) = &cli.midi {
        write_midi(&exercise, path)?;
    }

    let meta = exercise.metadata();
    tracing::info!(
        level = meta.level,
        key = %meta.key,
        tempo_bpm = meta.tempo_bpm,
        meter = %format!("{}/{}", meta.meter_numerator, meta.meter_denominator),
        "done"
    );
    Ok(())
}
