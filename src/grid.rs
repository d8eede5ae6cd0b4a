//! Word and phoneme tiers over one timeline
//!
//! Intervals are addressed by 1-based index, as Praat does. Time lookup uses
//! the left-closed, right-open convention `start <= t < end`, except that the
//! last interval of a tier also owns its right edge.

use crate::textgrid::{Interval, TextGrid};
use crate::{FricativeError, Result};

/// Which of the two tiers a query addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    Words,
    Phonemes,
}

/// A word tier and a phoneme tier sharing one timeline
#[derive(Debug, Clone)]
pub struct AnnotationGrid {
    words: Vec<Interval>,
    phonemes: Vec<Interval>,
}

impl AnnotationGrid {
    /// Build a grid from two interval lists
    ///
    /// Each tier must be time-ordered with `start < end` for every interval
    /// and no overlap between neighbours. Agreement between word and phoneme
    /// boundaries is not checked here.
    pub fn new(words: Vec<Interval>, phonemes: Vec<Interval>) -> Result<Self> {
        check_ordered(&words, TierKind::Words)?;
        check_ordered(&phonemes, TierKind::Phonemes)?;
        Ok(Self { words, phonemes })
    }

    /// Select the word and phoneme tiers of a TextGrid by 1-based position
    pub fn from_textgrid(textgrid: &TextGrid, word_tier: usize, phoneme_tier: usize) -> Result<Self> {
        let words = textgrid.interval_tier(word_tier)?.to_vec();
        let phonemes = textgrid.interval_tier(phoneme_tier)?.to_vec();
        Self::new(words, phonemes)
    }

    fn tier(&self, tier: TierKind) -> &[Interval] {
        match tier {
            TierKind::Words => &self.words,
            TierKind::Phonemes => &self.phonemes,
        }
    }

    pub fn intervals(&self, tier: TierKind) -> &[Interval] {
        self.tier(tier)
    }

    /// Interval at a 1-based index, `None` if out of range
    pub fn interval_at(&self, tier: TierKind, index: usize) -> Option<&Interval> {
        index.checked_sub(1).and_then(|i| self.tier(tier).get(i))
    }

    pub fn interval_count(&self, tier: TierKind) -> usize {
        self.tier(tier).len()
    }

    /// 1-based index of the interval containing `time`
    pub fn interval_containing_time(&self, tier: TierKind, time: f64) -> Option<usize> {
        let intervals = self.tier(tier);
        let candidate = intervals.partition_point(|interval| interval.end <= time);

        match intervals.get(candidate) {
            Some(interval) if interval.start <= time => Some(candidate + 1),
            Some(_) => None,
            None => match intervals.last() {
                Some(last) if time == last.end => Some(intervals.len()),
                _ => None,
            },
        }
    }

    /// 1-based indices of the phoneme intervals lying inside `[start, end]`
    pub fn phonemes_within(&self, start: f64, end: f64) -> std::ops::Range<usize> {
        let first = self.phonemes.partition_point(|p| p.start < start);
        let last = self.phonemes.partition_point(|p| p.end <= end);
        let last = last.max(first);
        (first + 1)..(last + 1)
    }
}

fn check_ordered(intervals: &[Interval], tier: TierKind) -> Result<()> {
    for (i, interval) in intervals.iter().enumerate() {
        if !(interval.start < interval.end) {
            return Err(FricativeError::InvalidParameter(format!(
                "{:?} interval {} (\"{}\") has start {} not before end {}",
                tier,
                i + 1,
                interval.label,
                interval.start,
                interval.end
            )));
        }
        if let Some(previous) = i.checked_sub(1).map(|p| &intervals[p]) {
            if interval.start < previous.end {
                return Err(FricativeError::InvalidParameter(format!(
                    "{:?} interval {} (\"{}\") starts at {} before the previous one ends at {}",
                    tier,
                    i + 1,
                    interval.label,
                    interval.start,
                    previous.end
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> AnnotationGrid {
        let words = vec![Interval::new("bas", 0.0, 0.3), Interval::new("atS", 0.3, 0.7)];
        let phonemes = vec![
            Interval::new("b", 0.0, 0.1),
            Interval::new("a", 0.1, 0.2),
            Interval::new("s", 0.2, 0.3),
            Interval::new("<p:>", 0.3, 0.4),
            Interval::new("a", 0.4, 0.5),
            Interval::new("t", 0.5, 0.6),
            Interval::new("S", 0.6, 0.7),
        ];
        AnnotationGrid::new(words, phonemes).unwrap()
    }

    #[test]
    fn test_index_access_is_one_based() {
        let grid = grid();

        assert_eq!(grid.interval_count(TierKind::Phonemes), 7);
        assert_eq!(grid.interval_count(TierKind::Words), 2);
        assert_eq!(grid.interval_at(TierKind::Phonemes, 1).unwrap().label, "b");
        assert_eq!(grid.interval_at(TierKind::Phonemes, 7).unwrap().label, "S");
        assert!(grid.interval_at(TierKind::Phonemes, 0).is_none());
        assert!(grid.interval_at(TierKind::Phonemes, 8).is_none());
    }

    #[test]
    fn test_time_lookup_is_left_closed() {
        let grid = grid();

        assert_eq!(grid.interval_containing_time(TierKind::Words, 0.0), Some(1));
        assert_eq!(grid.interval_containing_time(TierKind::Words, 0.25), Some(1));
        // A boundary belongs to the interval starting there
        assert_eq!(grid.interval_containing_time(TierKind::Words, 0.3), Some(2));
        assert_eq!(grid.interval_containing_time(TierKind::Phonemes, 0.2), Some(3));
    }

    #[test]
    fn test_time_lookup_last_edge_and_outside() {
        let grid = grid();

        assert_eq!(grid.interval_containing_time(TierKind::Words, 0.7), Some(2));
        assert_eq!(grid.interval_containing_time(TierKind::Phonemes, 0.7), Some(7));
        assert_eq!(grid.interval_containing_time(TierKind::Words, 0.71), None);
        assert_eq!(grid.interval_containing_time(TierKind::Words, -0.01), None);
    }

    #[test]
    fn test_time_lookup_in_gap() {
        let grid = AnnotationGrid::new(
            vec![Interval::new("a", 0.0, 0.1), Interval::new("b", 0.2, 0.3)],
            vec![],
        )
        .unwrap();
        assert_eq!(grid.interval_containing_time(TierKind::Words, 0.15), None);
        assert_eq!(grid.interval_containing_time(TierKind::Phonemes, 0.15), None);
    }

    #[test]
    fn test_phonemes_within_word() {
        let grid = grid();

        assert_eq!(grid.phonemes_within(0.0, 0.3), 1..4);
        assert_eq!(grid.phonemes_within(0.3, 0.7), 4..8);
        assert_eq!(grid.phonemes_within(0.35, 0.38).len(), 0);
    }

    #[test]
    fn test_rejects_unordered_tiers() {
        let overlapping = vec![Interval::new("a", 0.0, 0.2), Interval::new("b", 0.1, 0.3)];
        assert!(AnnotationGrid::new(vec![], overlapping).is_err());

        let reversed = vec![Interval::new("a", 0.2, 0.1)];
        assert!(AnnotationGrid::new(reversed, vec![]).is_err());
    }

    #[test]
    fn test_from_textgrid_selects_tiers() {
        let text = "\"ooTextFile\"\n\"TextGrid\"\n0\n0.3\n<exists>\n2\n\
            \"IntervalTier\"\n\"phones\"\n0\n0.3\n2\n0\n0.1\n\"s\"\n0.1\n0.3\n\"a\"\n\
            \"IntervalTier\"\n\"words\"\n0\n0.3\n1\n0\n0.3\n\"sa\"\n";
        let textgrid = TextGrid::parse(text).unwrap();

        let grid = AnnotationGrid::from_textgrid(&textgrid, 2, 1).unwrap();
        assert_eq!(grid.interval_at(TierKind::Words, 1).unwrap().label, "sa");
        assert_eq!(grid.interval_count(TierKind::Phonemes), 2);
        assert!(AnnotationGrid::from_textgrid(&textgrid, 3, 1).is_err());
    }
}
