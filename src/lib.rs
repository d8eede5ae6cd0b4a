//! praatfan-fricatives: per-fricative feature extraction from aligned speech corpora
//!
//! For every fricative interval on the phoneme tier of a TextGrid, this crate
//! measures the matching stretch of audio and combines the measurements with
//! positional context taken from the phoneme and word tiers.
//!
//! # Core Types
//!
//! - [`Sound`] - Audio samples with sample rate
//! - [`Spectrum`] - Single-frame FFT spectrum with centre of gravity
//! - [`AcousticAnalyzer`] - Mean intensity and centre of gravity of a slice
//! - [`AnnotationGrid`] - Word and phoneme interval tiers over one timeline
//! - [`ContextScanner`] - Forward search for the next fricative
//! - [`WordLocator`] - Position of a fricative inside its enclosing word
//! - [`FeatureRecord`] - One output row per fricative occurrence
//! - [`FricativeExtractor`] - Per-file traversal tying the above together

pub mod sound;
pub mod spectrum;
pub mod acoustics;
pub mod textgrid;
pub mod grid;
pub mod symbols;
pub mod context;
pub mod word;
pub mod record;
pub mod observer;
pub mod extractor;
pub mod corpus;
pub mod config;

pub mod utils;

// Re-export main types at crate root
pub use sound::Sound;
pub use spectrum::Spectrum;
pub use acoustics::{AcousticAnalyzer, AcousticMeasures};
pub use textgrid::{Interval, TextGrid, Tier, TierContent};
pub use grid::{AnnotationGrid, TierKind};
pub use symbols::SymbolSet;
pub use context::{ContextScanner, NextFricative};
pub use word::{WordLocator, WordPosition};
pub use record::{FeatureRecord, RecordBuilder, UNDEFINED_MARKER};
pub use observer::{LogObserver, NullObserver, ProgressObserver};
pub use extractor::{FileReport, FricativeExtractor};
pub use corpus::{BatchSummary, CorpusRunner, FilePair};
pub use config::ExtractionConfig;

use thiserror::Error;

/// Errors that can occur while extracting fricative features
#[derive(Error, Debug)]
pub enum FricativeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV decoding error: {0}")]
    WavDecode(#[from] hound::Error),

    #[error("Audio decoding error: {0}")]
    AudioDecode(String),

    #[error("TextGrid parse error at line {line}: {reason}")]
    TextGrid { line: usize, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Alignment assumption violated at {time} s: {reason}")]
    AlignmentAssumptionViolation { time: f64, reason: String },

    #[error("Cannot measure [{start}, {end}): {reason}")]
    Computation { start: f64, end: f64, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FricativeError>;
