use std::path::PathBuf;
use std::process;

use clap::Parser;

use praatfan_fricatives::{CorpusRunner, ExtractionConfig, LogObserver};

/// Measure every fricative in a directory of audio files with aligned TextGrids.
#[derive(Parser)]
#[command(name = "fricatives")]
struct Cli {
    /// Directory holding the audio and TextGrid files.
    input_dir: Option<PathBuf>,

    /// Tab-separated output file (replaced if it exists).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON settings file; flags given here override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Text appended to the audio file name to find its TextGrid.
    #[arg(long)]
    suffix: Option<String>,

    /// Audio file extension, without the dot.
    #[arg(long)]
    audio_ext: Option<String>,

    /// Annotation file extension, without the dot.
    #[arg(long)]
    annotation_ext: Option<String>,

    /// Position of the word tier (1-based).
    #[arg(long)]
    word_tier: Option<usize>,

    /// Position of the phoneme tier (1-based).
    #[arg(long)]
    phoneme_tier: Option<usize>,

    /// Fricative labels (comma-separated).
    #[arg(long, value_delimiter = ',')]
    fricatives: Option<Vec<String>>,

    /// Pause label.
    #[arg(long)]
    pause: Option<String>,

    /// Exponent for the spectral centre of gravity.
    #[arg(long)]
    cog_power: Option<f64>,

    /// Number of files processed in parallel.
    #[arg(short, long)]
    jobs: Option<usize>,
}

fn main() {
    env_logger::init();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Returns whether at least one file (or no file at all) was processed.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(cli)?;

    let runner = CorpusRunner::new(config)?;
    let summary = runner.run_to_output(LogObserver::new)?;

    log::info!(
        "{} file(s) processed, {} failed, {} record(s) written, {} fricative(s) skipped -> {}",
        summary.files_processed,
        summary.files_failed,
        summary.records_written,
        summary.fricatives_skipped,
        runner.config().output.display()
    );

    Ok(summary.files_processed > 0 || summary.files_failed == 0)
}

fn build_config(cli: Cli) -> Result<ExtractionConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ExtractionConfig::from_json_file(path)?,
        None => ExtractionConfig::default(),
    };

    if let Some(input_dir) = cli.input_dir {
        config.input_dir = input_dir;
    }
    if let Some(output) = cli.output {
        config.output = output;
    }
    if let Some(suffix) = cli.suffix {
        config.annotation_suffix = suffix;
    }
    if let Some(ext) = cli.audio_ext {
        config.audio_extension = ext.trim_start_matches('.').to_string();
    }
    if let Some(ext) = cli.annotation_ext {
        config.annotation_extension = ext.trim_start_matches('.').to_string();
    }
    if let Some(tier) = cli.word_tier {
        config.word_tier = tier;
    }
    if let Some(tier) = cli.phoneme_tier {
        config.phoneme_tier = tier;
    }
    if let Some(fricatives) = cli.fricatives {
        config.fricatives = fricatives.into_iter().map(|f| f.trim().to_string()).collect();
    }
    if let Some(pause) = cli.pause {
        config.pause = pause;
    }
    if let Some(power) = cli.cog_power {
        config.cog_power = power;
    }
    if let Some(jobs) = cli.jobs {
        config.workers = jobs;
    }

    if !config.input_dir.is_dir() {
        return Err(format!("input directory not found: {}", config.input_dir.display()).into());
    }
    Ok(config)
}
