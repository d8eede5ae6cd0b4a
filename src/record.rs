//! One feature row per fricative occurrence, and its tab-separated form

use std::io::Write;

use crate::acoustics::AcousticMeasures;
use crate::context::NextFricative;
use crate::textgrid::Interval;
use crate::word::WordPosition;
use crate::Result;

/// Written in place of the gap to the next fricative when there is none
pub const UNDEFINED_MARKER: &str = "--undefined--";

/// Column names, in output order
pub const HEADER: [&str; 11] = [
    "SoundName",
    "Fricative(SAMPA)",
    "MiddleTime(s)",
    "Duration(ms)",
    "MeanIntensity(dB)",
    "CentreOfGravity(Hz)",
    "PhonemesToNextFricative",
    "DurationToNextFricative(s)",
    "InWord",
    "WordLength",
    "FricativePositionInWord",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub sound_name: String,
    pub fricative: String,
    /// Midpoint of the fricative interval (s)
    pub middle_time: f64,
    pub duration_ms: f64,
    pub mean_intensity_db: f64,
    pub centre_of_gravity_hz: f64,
    pub phonemes_to_next_fricative: usize,
    /// `None` for the last fricative of a file
    pub duration_to_next_fricative: Option<f64>,
    pub word: String,
    pub word_length: usize,
    pub position_in_word: usize,
}

impl FeatureRecord {
    /// Tab-separated fields in [`HEADER`] order, without a line terminator
    pub fn to_tsv_row(&self) -> String {
        let gap = match self.duration_to_next_fricative {
            Some(gap) => format!("{:.6}", gap),
            None => UNDEFINED_MARKER.to_string(),
        };
        [
            sanitize(&self.sound_name),
            sanitize(&self.fricative),
            format!("{:.6}", self.middle_time),
            format!("{:.3}", self.duration_ms),
            format!("{:.3}", self.mean_intensity_db),
            format!("{:.3}", self.centre_of_gravity_hz),
            self.phonemes_to_next_fricative.to_string(),
            gap,
            sanitize(&self.word),
            self.word_length.to_string(),
            self.position_in_word.to_string(),
        ]
        .join("\t")
    }
}

/// Labels are free text; tabs and newlines would break the row structure
fn sanitize(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

/// Assembles a record from the per-fricative measurements
pub struct RecordBuilder;

impl RecordBuilder {
    pub fn build(
        sound_name: &str,
        fricative: &Interval,
        measures: AcousticMeasures,
        next: NextFricative,
        word: WordPosition,
    ) -> FeatureRecord {
        FeatureRecord {
            sound_name: sound_name.to_string(),
            fricative: fricative.label.clone(),
            middle_time: fricative.midpoint(),
            duration_ms: fricative.duration() * 1000.0,
            mean_intensity_db: measures.intensity_db,
            centre_of_gravity_hz: measures.centre_of_gravity,
            phonemes_to_next_fricative: next.phoneme_count,
            duration_to_next_fricative: next.gap,
            word: word.word,
            word_length: word.length,
            position_in_word: word.position,
        }
    }
}

/// Writes a header line followed by one line per record
pub struct RecordWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    /// Wrap `out` and write the header line
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "{}", HEADER.join("\t"))?;
        Ok(Self { out, written: 0 })
    }

    pub fn write(&mut self, record: &FeatureRecord) -> Result<()> {
        writeln!(self.out, "{}", record.to_tsv_row())?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
