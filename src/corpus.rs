//! Batch processing of a directory of audio + TextGrid pairs
//!
//! Layout: `discover → [worker × N: load, extract] → in-order writer`
//!
//! Each file pair is independent, so several can be extracted at once. The
//! writer re-orders finished files by discovery position, which keeps the
//! output identical whatever the worker count. A file that fails is reported
//! and counted; the batch goes on with the next one.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::config::ExtractionConfig;
use crate::extractor::{FileReport, FricativeExtractor};
use crate::grid::AnnotationGrid;
use crate::observer::ProgressObserver;
use crate::record::RecordWriter;
use crate::symbols::SymbolSet;
use crate::textgrid::TextGrid;
use crate::{FricativeError, Result, Sound};

/// An audio file and the annotation file that goes with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    /// Audio file name without extension; written as `SoundName`
    pub sound_name: String,
    pub audio: PathBuf,
    pub annotation: PathBuf,
}

/// Totals for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub records_written: usize,
    pub fricatives_skipped: usize,
    /// Set when the run stopped early on request
    pub cancelled: bool,
}

type Outcome = (usize, Result<FileReport>);

pub struct CorpusRunner {
    config: ExtractionConfig,
    symbols: SymbolSet,
    cancelled: Arc<AtomicBool>,
}

impl CorpusRunner {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        let symbols = config.symbol_set()?;
        Ok(Self {
            config,
            symbols,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Flag that stops the batch before the next file when set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Audio files in the input directory with their annotation paths,
    /// sorted by file name
    pub fn discover(&self) -> Result<Vec<FilePair>> {
        let mut audio_files = Vec::new();
        for entry in fs::read_dir(&self.config.input_dir)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.config.audio_extension))
                .unwrap_or(false);
            if matches && path.is_file() {
                audio_files.push(path);
            }
        }
        audio_files.sort();

        Ok(audio_files
            .into_iter()
            .map(|audio| FilePair {
                sound_name: audio
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                annotation: self.config.annotation_path_for(&audio),
                audio,
            })
            .collect())
    }

    pub fn new_extractor(&self) -> Result<FricativeExtractor> {
        FricativeExtractor::new(self.symbols.clone(), self.config.cog_power)
    }

    /// Load one pair and extract its records, reporting to `observer`
    pub fn process_pair(
        &self,
        extractor: &mut FricativeExtractor,
        pair: &FilePair,
        observer: &mut dyn ProgressObserver,
    ) -> Result<FileReport> {
        observer.file_started(&pair.sound_name);

        match self.load_and_extract(extractor, pair, observer) {
            Ok(report) => {
                observer.file_finished(&pair.sound_name, report.records.len(), report.skipped);
                Ok(report)
            }
            Err(err) => {
                observer.file_failed(&pair.sound_name, &err);
                Err(err)
            }
        }
    }

    fn load_and_extract(
        &self,
        extractor: &mut FricativeExtractor,
        pair: &FilePair,
        observer: &mut dyn ProgressObserver,
    ) -> Result<FileReport> {
        if !pair.annotation.is_file() {
            return Err(FricativeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("annotation file not found: {}", pair.annotation.display()),
            )));
        }
        let textgrid = TextGrid::from_file(&pair.annotation)?;
        let grid = AnnotationGrid::from_textgrid(&textgrid, self.config.word_tier, self.config.phoneme_tier)?;
        let sound = Sound::from_file(&pair.audio)?;

        Ok(extractor.extract(&pair.sound_name, &grid, &sound, observer))
    }

    /// Discover the input directory and write all records to the configured output file
    pub fn run_to_output<O, F>(&self, make_observer: F) -> Result<BatchSummary>
    where
        O: ProgressObserver,
        F: Fn() -> O + Sync,
    {
        let pairs = self.discover()?;
        if pairs.is_empty() {
            log::warn!(
                "no .{} files found in {}",
                self.config.audio_extension,
                self.config.input_dir.display()
            );
        }
        let out = create_output(&self.config.output)?;
        self.run(&pairs, out, make_observer)
    }

    /// Extract every pair and write the records to `out`
    ///
    /// # Arguments
    /// * `pairs` - Files to process; output follows this order
    /// * `out` - Destination of the header and one line per record
    /// * `make_observer` - Called once per worker to build its observer
    ///
    /// # Returns
    /// Totals for the run. A file that fails is counted, not returned as an
    /// error; errors are only for writing `out` or an unusable setting.
    pub fn run<W, O, F>(&self, pairs: &[FilePair], out: W, make_observer: F) -> Result<BatchSummary>
    where
        W: Write,
        O: ProgressObserver,
        F: Fn() -> O + Sync,
    {
        let mut sink = BatchSink {
            writer: RecordWriter::new(out)?,
            summary: BatchSummary::default(),
        };

        let workers = self.config.workers.min(pairs.len()).max(1);
        if workers == 1 {
            self.run_sequential(pairs, &mut sink, make_observer())?;
        } else {
            self.run_parallel(pairs, &mut sink, workers, &make_observer)?;
        }

        sink.summary.cancelled = self.is_cancelled()
            && sink.summary.files_processed + sink.summary.files_failed < pairs.len();
        sink.writer.finish()?;
        Ok(sink.summary)
    }

    fn run_sequential<W: Write, O: ProgressObserver>(
        &self,
        pairs: &[FilePair],
        sink: &mut BatchSink<W>,
        mut observer: O,
    ) -> Result<()> {
        let mut extractor = self.new_extractor()?;
        for pair in pairs {
            if self.is_cancelled() {
                break;
            }
            let outcome = self.process_pair(&mut extractor, pair, &mut observer);
            sink.accept(outcome)?;
        }
        Ok(())
    }

    fn run_parallel<W, O, F>(
        &self,
        pairs: &[FilePair],
        sink: &mut BatchSink<W>,
        workers: usize,
        make_observer: &F,
    ) -> Result<()>
    where
        W: Write,
        O: ProgressObserver,
        F: Fn() -> O + Sync,
    {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, &FilePair)>();
        for job in pairs.iter().enumerate() {
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);

        // FFT planners are not Send, so each worker builds its own extractor;
        // a bad setting is reported here, before any worker starts.
        self.new_extractor()?;
        let (result_tx, result_rx) = crossbeam_channel::bounded::<Outcome>(2 * workers);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || self.work(make_observer(), job_rx, result_tx));
            }
            drop(result_tx);
            collect_in_order(result_rx, sink)
        })
    }

    fn work<O: ProgressObserver>(&self, mut observer: O, jobs: Receiver<(usize, &FilePair)>, results: Sender<Outcome>) {
        let mut extractor = match self.new_extractor() {
            Ok(extractor) => extractor,
            Err(err) => {
                log::error!("worker not started: {}", err);
                return;
            }
        };
        for (index, pair) in jobs.iter() {
            if self.is_cancelled() {
                break;
            }
            let outcome = self.process_pair(&mut extractor, pair, &mut observer);
            if results.send((index, outcome)).is_err() {
                break;
            }
        }
    }
}

/// Writes file reports in discovery order as they arrive out of order.
///
/// Takes the receiver by value so that returning early drops it and lets
/// blocked workers give up.
fn collect_in_order<W: Write>(results: Receiver<Outcome>, sink: &mut BatchSink<W>) -> Result<()> {
    let mut pending = BTreeMap::new();
    let mut next = 0;

    for (index, outcome) in results.iter() {
        pending.insert(index, outcome);
        while let Some(outcome) = pending.remove(&next) {
            sink.accept(outcome)?;
            next += 1;
        }
    }

    // Gaps only occur after cancellation; keep whatever finished
    for (_, outcome) in pending {
        sink.accept(outcome)?;
    }
    Ok(())
}

struct BatchSink<W: Write> {
    writer: RecordWriter<W>,
    summary: BatchSummary,
}

impl<W: Write> BatchSink<W> {
    fn accept(&mut self, outcome: Result<FileReport>) -> Result<()> {
        match outcome {
            Ok(report) => {
                for record in &report.records {
                    self.writer.write(record)?;
                }
                self.summary.files_processed += 1;
                self.summary.records_written += report.records.len();
                self.summary.fricatives_skipped += report.skipped;
            }
            Err(_) => self.summary.files_failed += 1,
        }
        Ok(())
    }
}

/// Create the output file (and its directory), replacing any existing file
pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_discover_pairs_sorted_with_suffix() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.wav");
        touch(dir.path(), "a.WAV");
        touch(dir.path(), "a_mau.TextGrid");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("sub.wav")).unwrap();

        let config = ExtractionConfig {
            input_dir: dir.path().to_path_buf(),
            annotation_suffix: "_mau".to_string(),
            ..Default::default()
        };
        let pairs = CorpusRunner::new(config).unwrap().discover().unwrap();

        let names: Vec<&str> = pairs.iter().map(|p| p.sound_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(pairs[0].annotation, dir.path().join("a_mau.TextGrid"));
        assert_eq!(pairs[1].annotation, dir.path().join("b_mau.TextGrid"));
    }

    #[test]
    fn test_missing_annotation_fails_only_that_file() {
        let dir = tempfile::tempdir().unwrap();
        let pair = FilePair {
            sound_name: "lonely".to_string(),
            audio: dir.path().join("lonely.wav"),
            annotation: dir.path().join("lonely.TextGrid"),
        };
        let config = ExtractionConfig {
            input_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let runner = CorpusRunner::new(config).unwrap();

        let mut out = Vec::new();
        let summary = runner.run(&[pair.clone(), pair], &mut out, || NullObserver).unwrap();

        assert_eq!(summary.files_failed, 2);
        assert_eq!(summary.files_processed, 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractionConfig {
            input_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let runner = CorpusRunner::new(config).unwrap();
        runner.cancel_handle().store(true, Ordering::Relaxed);

        let pair = FilePair {
            sound_name: "x".to_string(),
            audio: dir.path().join("x.wav"),
            annotation: dir.path().join("x.TextGrid"),
        };
        let summary = runner.run(&[pair], Vec::new(), || NullObserver).unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.files_failed + summary.files_processed, 0);
    }

    /// Requests cancellation as soon as the first file is done
    struct StopAfterFirstFile {
        cancel: Arc<AtomicBool>,
    }

    impl ProgressObserver for StopAfterFirstFile {
        fn file_started(&mut self, _sound_name: &str) {}
        fn fricative_measured(&mut self, _record: &crate::FeatureRecord) {}
        fn fricative_skipped(&mut self, _sound_name: &str, _fricative: &crate::Interval, _error: &FricativeError) {}
        fn file_finished(&mut self, _sound_name: &str, _records: usize, _skipped: usize) {
            self.cancel.store(true, Ordering::Relaxed);
        }
        fn file_failed(&mut self, _sound_name: &str, _error: &FricativeError) {
            self.cancel.store(true, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_cancel_stops_between_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractionConfig {
            input_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let runner = CorpusRunner::new(config).unwrap();
        let pairs: Vec<FilePair> = ["x", "y", "z"]
            .iter()
            .map(|name| FilePair {
                sound_name: name.to_string(),
                audio: dir.path().join(format!("{name}.wav")),
                annotation: dir.path().join(format!("{name}.TextGrid")),
            })
            .collect();

        let cancel = runner.cancel_handle();
        let summary = runner
            .run(&pairs, Vec::new(), || StopAfterFirstFile { cancel: cancel.clone() })
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.files_processed, 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ExtractionConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(CorpusRunner::new(config).is_err());
    }

    #[test]
    fn test_create_output_makes_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.tsv");
        let mut out = create_output(&path).unwrap();
        out.write_all(b"x").unwrap();
        drop(out);
        assert_eq!(fs::read(&path).unwrap(), b"x");
    }
}
