//! Position of a fricative inside its enclosing word
//!
//! The word is the word-tier interval containing the fricative's midpoint.
//! Its phonemes are the phoneme intervals lying within the word's span, minus
//! pauses at either edge of the word. A pause between two phonemes of the
//! same word breaks the alignment assumption and is reported as such.
//!
//! The fricative is found among those phonemes by its exact (label, start,
//! end) triple, so a word containing the same symbol twice resolves to the
//! right occurrence.

use crate::grid::{AnnotationGrid, TierKind};
use crate::symbols::SymbolSet;
use crate::textgrid::Interval;
use crate::{FricativeError, Result};

/// Where a fricative sits in its word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPosition {
    /// Label of the enclosing word interval
    pub word: String,
    /// Number of phonemes in the word
    pub length: usize,
    /// 1-based position of the fricative among them
    pub position: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct WordLocator<'a> {
    symbols: &'a SymbolSet,
}

impl<'a> WordLocator<'a> {
    pub fn new(symbols: &'a SymbolSet) -> Self {
        Self { symbols }
    }

    /// Resolve the word around `fricative`, a phoneme-tier interval of `grid`
    pub fn locate(&self, grid: &AnnotationGrid, fricative: &Interval) -> Result<WordPosition> {
        let midpoint = fricative.midpoint();
        let violation = |reason: String| FricativeError::AlignmentAssumptionViolation {
            time: midpoint,
            reason,
        };

        let word = grid
            .interval_containing_time(TierKind::Words, midpoint)
            .and_then(|index| grid.interval_at(TierKind::Words, index))
            .ok_or_else(|| violation("no word interval contains the fricative midpoint".to_string()))?;

        let range = grid.phonemes_within(word.start, word.end);
        let all = &grid.intervals(TierKind::Phonemes)[range.start - 1..range.end - 1];

        let is_pause = |p: &Interval| self.symbols.is_pause(&p.label);
        let leading = all.iter().take_while(|p| is_pause(*p)).count();
        let trailing = all[leading..].iter().rev().take_while(|p| is_pause(*p)).count();
        let phonemes = &all[leading..all.len() - trailing];

        if let Some(pause) = phonemes.iter().find(|p| is_pause(*p)) {
            return Err(violation(format!(
                "word \"{}\" [{}, {}] contains a pause at {}",
                word.label, word.start, word.end, pause.start
            )));
        }

        let position = phonemes
            .iter()
            .position(|p| p.label == fricative.label && p.start == fricative.start && p.end == fricative.end)
            .ok_or_else(|| {
                violation(format!(
                    "\"{}\" [{}, {}] is not one of the phonemes of word \"{}\" [{}, {}]",
                    fricative.label, fricative.start, fricative.end, word.label, word.start, word.end
                ))
            })?;

        Ok(WordPosition {
            word: word.label.clone(),
            length: phonemes.len(),
            position: position + 1,
        })
    }
}
