//! Per-file extraction: walk the phoneme tier and build one record per fricative
//!
//! Records come out in phoneme-tier order. A fricative that cannot be
//! measured or placed in a word is reported to the observer and left out;
//! the rest of the file is still processed.

use crate::acoustics::AcousticAnalyzer;
use crate::context::ContextScanner;
use crate::grid::{AnnotationGrid, TierKind};
use crate::observer::ProgressObserver;
use crate::record::{FeatureRecord, RecordBuilder};
use crate::symbols::SymbolSet;
use crate::textgrid::Interval;
use crate::word::WordLocator;
use crate::{Result, Sound};

/// Outcome of extracting one file pair
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub sound_name: String,
    pub records: Vec<FeatureRecord>,
    /// Fricatives left out because of an occurrence-level error
    pub skipped: usize,
}

pub struct FricativeExtractor {
    symbols: SymbolSet,
    analyzer: AcousticAnalyzer,
}

impl FricativeExtractor {
    pub fn new(symbols: SymbolSet, cog_power: f64) -> Result<Self> {
        Ok(Self {
            symbols,
            analyzer: AcousticAnalyzer::new(cog_power)?,
        })
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    /// Extract records for every fricative on the phoneme tier of `grid`
    ///
    /// # Arguments
    /// * `sound_name` - Name written in the `SoundName` column
    /// * `grid` - Word and phoneme tiers of the file
    /// * `sound` - Signal the tiers are aligned to
    /// * `observer` - Receives a measured or skipped event per fricative
    ///
    /// # Returns
    /// Records in phoneme-tier order, plus the number of fricatives skipped
    /// because they could not be measured or placed in a word
    pub fn extract(
        &mut self,
        sound_name: &str,
        grid: &AnnotationGrid,
        sound: &Sound,
        observer: &mut dyn ProgressObserver,
    ) -> FileReport {
        let mut records = Vec::new();
        let mut skipped = 0;

        for (offset, interval) in grid.intervals(TierKind::Phonemes).iter().enumerate() {
            if !self.symbols.is_fricative(&interval.label) {
                continue;
            }

            match self.extract_one(sound_name, grid, sound, offset + 1, interval) {
                Ok(record) => {
                    observer.fricative_measured(&record);
                    records.push(record);
                }
                Err(err) => {
                    observer.fricative_skipped(sound_name, interval, &err);
                    skipped += 1;
                }
            }
        }

        FileReport {
            sound_name: sound_name.to_string(),
            records,
            skipped,
        }
    }

    fn extract_one(
        &mut self,
        sound_name: &str,
        grid: &AnnotationGrid,
        sound: &Sound,
        index: usize,
        fricative: &Interval,
    ) -> Result<FeatureRecord> {
        let measures = self.analyzer.measure(sound, fricative.start, fricative.end)?;
        let next = ContextScanner::new(&self.symbols).scan(grid, index, fricative.end);
        let word = WordLocator::new(&self.symbols).locate(grid, fricative)?;

        Ok(RecordBuilder::build(sound_name, fricative, measures, next, word))
    }
}

impl Default for FricativeExtractor {
    fn default() -> Self {
        Self {
            symbols: SymbolSet::default(),
            analyzer: AcousticAnalyzer::default(),
        }
    }
}
