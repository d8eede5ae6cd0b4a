//! Forward search from a fricative to the next one on the phoneme tier
//!
//! Pauses are stepped over without being counted. When no later fricative
//! exists the count is reported as 0 and the gap as undefined, since a
//! distance to a fricative that does not exist has no meaning.

use crate::grid::{AnnotationGrid, TierKind};
use crate::symbols::SymbolSet;

/// What lies between a fricative and the next fricative in the file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextFricative {
    /// Non-pause phonemes strictly between the two fricatives
    pub phoneme_count: usize,
    /// Next fricative's start minus this fricative's end, in seconds
    pub gap: Option<f64>,
}

impl NextFricative {
    fn none() -> Self {
        Self {
            phoneme_count: 0,
            gap: None,
        }
    }
}

/// Scans the phoneme tier forward using a configured symbol set
#[derive(Debug, Clone, Copy)]
pub struct ContextScanner<'a> {
    symbols: &'a SymbolSet,
}

impl<'a> ContextScanner<'a> {
    pub fn new(symbols: &'a SymbolSet) -> Self {
        Self { symbols }
    }

    /// Look for the first fricative after phoneme `index` (1-based)
    ///
    /// `end` is the end time of the fricative at `index`.
    pub fn scan(&self, grid: &AnnotationGrid, index: usize, end: f64) -> NextFricative {
        let phonemes = grid.intervals(TierKind::Phonemes);
        let mut phoneme_count = 0;

        for interval in phonemes.iter().skip(index) {
            if self.symbols.is_fricative(&interval.label) {
                return NextFricative {
                    phoneme_count,
                    gap: Some(interval.start - end),
                };
            }
            if !self.symbols.is_pause(&interval.label) {
                phoneme_count += 1;
            }
        }

        NextFricative::none()
    }
}
