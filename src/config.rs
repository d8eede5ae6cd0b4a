//! Extraction settings
//!
//! Every field has a default, so a JSON settings file only needs to name
//! what differs. Command-line flags are applied on top by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::acoustics::DEFAULT_COG_POWER;
use crate::symbols::{SymbolSet, DEFAULT_FRICATIVES, DEFAULT_PAUSE};
use crate::{FricativeError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Directory holding the audio and annotation files
    pub input_dir: PathBuf,
    /// Tab-separated output file
    pub output: PathBuf,
    /// Extension of audio files, without the dot
    pub audio_extension: String,
    /// Extension of annotation files, without the dot
    pub annotation_extension: String,
    /// Appended to the audio file stem to name its annotation file
    pub annotation_suffix: String,
    /// 1-based tier position of the word tier
    pub word_tier: usize,
    /// 1-based tier position of the phoneme tier
    pub phoneme_tier: usize,
    pub fricatives: Vec<String>,
    pub pause: String,
    /// Exponent applied to spectral magnitudes for the centre of gravity
    pub cog_power: f64,
    /// Files processed concurrently
    pub workers: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output: PathBuf::from("fricatives.tsv"),
            audio_extension: "wav".to_string(),
            annotation_extension: "TextGrid".to_string(),
            annotation_suffix: String::new(),
            word_tier: 1,
            phoneme_tier: 2,
            fricatives: DEFAULT_FRICATIVES.iter().map(|s| s.to_string()).collect(),
            pause: DEFAULT_PAUSE.to_string(),
            cog_power: DEFAULT_COG_POWER,
            workers: 1,
        }
    }
}

impl ExtractionConfig {
    /// Load settings from a JSON file; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| FricativeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Check settings that would make every file fail
    pub fn validate(&self) -> Result<()> {
        if self.word_tier == 0 || self.phoneme_tier == 0 {
            return Err(FricativeError::Config("tier positions start at 1".to_string()));
        }
        if self.word_tier == self.phoneme_tier {
            return Err(FricativeError::Config(format!(
                "word and phoneme tiers are both tier {}",
                self.word_tier
            )));
        }
        if self.audio_extension.is_empty() || self.annotation_extension.is_empty() {
            return Err(FricativeError::Config("file extensions may not be empty".to_string()));
        }
        if !(self.cog_power > 0.0 && self.cog_power.is_finite()) {
            return Err(FricativeError::Config(format!(
                "centre of gravity power must be positive, got {}",
                self.cog_power
            )));
        }
        if self.workers == 0 {
            return Err(FricativeError::Config("at least one worker is required".to_string()));
        }
        self.symbol_set().map(|_| ())
    }

    pub fn symbol_set(&self) -> Result<SymbolSet> {
        SymbolSet::new(self.fricatives.iter().cloned(), self.pause.clone())
            .map_err(|e| FricativeError::Config(e.to_string()))
    }

    /// Annotation file for an audio file: stem + suffix + annotation extension
    pub fn annotation_path_for(&self, audio: &Path) -> PathBuf {
        let stem = audio.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        let name = format!("{}{}.{}", stem, self.annotation_suffix, self.annotation_extension);
        audio.with_file_name(name)
    }
}
