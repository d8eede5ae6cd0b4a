//! Progress reporting for extraction runs
//!
//! The extractor reports what it does through [`ProgressObserver`] so that
//! callers decide where progress goes (log lines, a GUI, nowhere) without
//! the extraction code knowing about it.

use crate::record::FeatureRecord;
use crate::textgrid::Interval;
use crate::FricativeError;

/// Receives per-file and per-fricative progress events.
pub trait ProgressObserver: Send {
    /// A file pair is about to be processed.
    fn file_started(&mut self, sound_name: &str);

    /// A fricative was measured and produced a record.
    fn fricative_measured(&mut self, record: &FeatureRecord);

    /// A fricative could not be measured and was left out.
    fn fricative_skipped(&mut self, sound_name: &str, fricative: &Interval, error: &FricativeError);

    /// A file pair was fully processed.
    fn file_finished(&mut self, sound_name: &str, records: usize, skipped: usize);

    /// A file pair failed as a whole; the batch goes on.
    fn file_failed(&mut self, sound_name: &str, error: &FricativeError);
}

/// Silent observer that discards all events.
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn file_started(&mut self, _sound_name: &str) {}
    fn fricative_measured(&mut self, _record: &FeatureRecord) {}
    fn fricative_skipped(&mut self, _sound_name: &str, _fricative: &Interval, _error: &FricativeError) {}
    fn file_finished(&mut self, _sound_name: &str, _records: usize, _skipped: usize) {}
    fn file_failed(&mut self, _sound_name: &str, _error: &FricativeError) {}
}

/// Observer that writes through the `log` crate.
///
/// File-level events go to `info`/`warn`, per-fricative values to `debug`.
#[derive(Default)]
pub struct LogObserver {
    files_seen: usize,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressObserver for LogObserver {
    fn file_started(&mut self, sound_name: &str) {
        self.files_seen += 1;
        log::info!("[{}] processing {}", self.files_seen, sound_name);
    }

    fn fricative_measured(&mut self, record: &FeatureRecord) {
        let gap = record
            .duration_to_next_fricative
            .map(|gap| format!("{:.3} s", gap))
            .unwrap_or_else(|| "undefined".to_string());
        log::debug!(
            "{}: {} at {:.3} s, {:.1} ms, {:.1} dB, CoG {:.0} Hz, next fricative after {} phoneme(s) / {}, word \"{}\" {}/{}",
            record.sound_name,
            record.fricative,
            record.middle_time,
            record.duration_ms,
            record.mean_intensity_db,
            record.centre_of_gravity_hz,
            record.phonemes_to_next_fricative,
            gap,
            record.word,
            record.position_in_word,
            record.word_length
        );
    }

    fn fricative_skipped(&mut self, sound_name: &str, fricative: &Interval, error: &FricativeError) {
        log::warn!(
            "{}: skipping \"{}\" [{:.3}, {:.3}]: {}",
            sound_name,
            fricative.label,
            fricative.start,
            fricative.end,
            error
        );
    }

    fn file_finished(&mut self, sound_name: &str, records: usize, skipped: usize) {
        if skipped > 0 {
            log::info!("{}: {} fricative(s), {} skipped", sound_name, records, skipped);
        } else {
            log::info!("{}: {} fricative(s)", sound_name, records);
        }
    }

    fn file_failed(&mut self, sound_name: &str, error: &FricativeError) {
        log::error!("{}: {}", sound_name, error);
    }
}
