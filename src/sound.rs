//! Mono waveform loaded from an audio file
//!
//! Intervals in a TextGrid are measured against this signal. A sample
//! belongs to an interval when its centre time falls inside it, so slices
//! for adjacent intervals never share a sample.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::{FricativeError, Result};

#[derive(Debug, Clone)]
pub struct Sound {
    /// Mono samples in [-1, 1], read as air pressure in Pa
    samples: Vec<f64>,
    sample_rate: f64,
    /// Left edge of the first sample on the original timeline
    start_time: f64,
}

impl Sound {
    /// ```
    /// use praatfan_fricatives::Sound;
    ///
    /// let sound = Sound::from_samples(&[0.0, 0.5, -0.5, 0.0], 16000.0);
    /// assert_eq!(sound.num_samples(), 4);
    /// ```
    pub fn from_samples(samples: &[f64], sample_rate: f64) -> Self {
        Self::from_samples_owned(samples.to_vec(), sample_rate)
    }

    pub fn from_samples_owned(samples: Vec<f64>, sample_rate: f64) -> Self {
        Self {
            samples,
            sample_rate,
            start_time: 0.0,
        }
    }

    /// Decode an audio file, averaging channels down to mono.
    ///
    /// Any container symphonia can probe is accepted. WAV files it rejects
    /// are retried with hound.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(FricativeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("audio file not found: {}", path.display()),
            )));
        }

        let decoded = decode_with_symphonia(path).or_else(|err| {
            let is_wav = path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("wav"));
            if !is_wav {
                return Err(err);
            }
            log::debug!("{}: {}; reading with hound instead", path.display(), err);
            decode_with_hound(path)
        })?;

        Ok(Self::from_samples_owned(
            downmix(decoded.interleaved, decoded.channels),
            decoded.sample_rate,
        ))
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration()
    }

    /// Centre time of sample `index`
    pub fn index_to_time(&self, index: usize) -> f64 {
        self.start_time + (index as f64 + 0.5) / self.sample_rate
    }

    /// Index of the first sample whose centre lies at or after `time`,
    /// clamped to `0..=num_samples`.
    fn first_index_at_or_after(&self, time: f64) -> usize {
        let position = ((time - self.start_time) * self.sample_rate - 0.5).ceil();
        if position <= 0.0 {
            0
        } else {
            (position as usize).min(self.samples.len())
        }
    }

    /// Samples whose centres lie in `[start_time, end_time)`
    ///
    /// The part keeps absolute times: its `start_time()` is the left edge of
    /// its first sample on the original timeline. A range that covers no
    /// sample centre yields an empty sound.
    pub fn extract_part(&self, start_time: f64, end_time: f64) -> Sound {
        let first = self.first_index_at_or_after(start_time);
        let last = self.first_index_at_or_after(end_time).max(first);

        Sound {
            samples: self.samples[first..last].to_vec(),
            sample_rate: self.sample_rate,
            start_time: self.start_time + first as f64 / self.sample_rate,
        }
    }

    /// Sine of the given frequency starting at phase zero
    pub fn sine(frequency: f64, amplitude: f64, duration: f64, sample_rate: f64) -> Sound {
        let step = 2.0 * std::f64::consts::PI * frequency / sample_rate;
        let samples = (0..sample_count(duration, sample_rate))
            .map(|i| amplitude * (step * i as f64).sin())
            .collect();
        Self::from_samples_owned(samples, sample_rate)
    }

    pub fn silence(duration: f64, sample_rate: f64) -> Sound {
        Self::from_samples_owned(vec![0.0; sample_count(duration, sample_rate)], sample_rate)
    }

    /// Root-mean-square amplitude, `None` for an empty sound
    pub fn rms(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let energy: f64 = self.samples.iter().map(|s| s * s).sum();
        Some((energy / self.samples.len() as f64).sqrt())
    }
}

fn sample_count(duration: f64, sample_rate: f64) -> usize {
    (duration * sample_rate).round() as usize
}

struct Decoded {
    interleaved: Vec<f64>,
    channels: usize,
    sample_rate: f64,
}

fn decode_with_symphonia(path: &Path) -> Result<Decoded> {
    let audio_error = |what: &str, err: SymphoniaError| FricativeError::AudioDecode(format!("{}: {}", what, err));

    let source = MediaSourceStream::new(Box::new(File::open(path)?), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let mut reader = symphonia::default::get_probe()
        .format(&hint, source, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| audio_error("unrecognised audio format", e))?
        .format;

    let track = reader
        .default_track()
        .ok_or_else(|| FricativeError::AudioDecode("file has no audio track".to_string()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| FricativeError::AudioDecode("sample rate not stated".to_string()))?;
    let mut channels = params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| audio_error("no decoder for codec", e))?;

    let mut interleaved = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(audio_error("cannot read packet", e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let buffer = match decoder.decode(&packet) {
            Ok(buffer) => buffer,
            // Corrupt packet: drop it and keep going
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(audio_error("cannot decode packet", e)),
        };
        channels = buffer.spec().channels.count().max(1);

        let mut converted = SampleBuffer::<f32>::new(buffer.frames() as u64, *buffer.spec());
        converted.copy_interleaved_ref(buffer);
        interleaved.extend(converted.samples().iter().map(|&s| f64::from(s)));
    }

    Ok(Decoded {
        interleaved,
        channels,
        sample_rate: f64::from(sample_rate),
    })
}

fn decode_with_hound(path: &Path) -> Result<Decoded> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = f64::from(1u32 << (spec.bits_per_sample.clamp(1, 32) - 1));
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / full_scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(Decoded {
        interleaved,
        channels: usize::from(spec.channels).max(1),
        sample_rate: f64::from(spec.sample_rate),
    })
}

/// Average each frame of `channels` interleaved samples into one
fn downmix(interleaved: Vec<f64>, channels: usize) -> Vec<f64> {
    if channels <= 1 {
        return interleaved;
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}
