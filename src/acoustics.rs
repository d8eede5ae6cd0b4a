//! Acoustic descriptors of a fricative slice
//!
//! Two numbers are measured on the part of the signal under a fricative:
//! - mean intensity, the RMS amplitude in dB re the air-pressure reference
//! - spectral centre of gravity of the whole slice (no framing, no window)

use crate::spectrum::Spectrum;
use crate::utils::Fft;
use crate::{FricativeError, Result, Sound};

/// Reference pressure for dB SPL calculation (2×10⁻⁵ Pa)
/// Samples are taken to be in Pascal, as Praat does.
pub const REFERENCE_PRESSURE: f64 = 2e-5;

/// Default exponent for spectral weighting (power spectrum)
pub const DEFAULT_COG_POWER: f64 = 2.0;

/// Measurements of one slice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcousticMeasures {
    /// Mean intensity in dB
    pub intensity_db: f64,
    /// Spectral centre of gravity in Hz
    pub centre_of_gravity: f64,
}

/// Computes intensity and centre of gravity, reusing FFT plans between calls
pub struct AcousticAnalyzer {
    cog_power: f64,
    fft: Fft,
}

impl AcousticAnalyzer {
    /// Create an analyzer weighting spectral bins by `|X|^cog_power`
    pub fn new(cog_power: f64) -> Result<Self> {
        if !(cog_power > 0.0 && cog_power.is_finite()) {
            return Err(FricativeError::InvalidParameter(format!(
                "centre of gravity power must be positive, got {}",
                cog_power
            )));
        }
        Ok(Self {
            cog_power,
            fft: Fft::new(),
        })
    }

    pub fn cog_power(&self) -> f64 {
        self.cog_power
    }

    /// Measure the part of `sound` lying in `[start, end)`
    ///
    /// # Arguments
    /// * `sound` - Whole signal of the file
    /// * `start` - Fricative start time in seconds
    /// * `end` - Fricative end time in seconds
    ///
    /// # Returns
    /// Mean intensity in dB and centre of gravity in Hz, or a
    /// `Computation` error when the slice is empty or silent
    pub fn measure(&mut self, sound: &Sound, start: f64, end: f64) -> Result<AcousticMeasures> {
        let slice = sound.extract_part(start, end);
        let intensity_db = mean_intensity_db(&slice).ok_or_else(|| FricativeError::Computation {
            start,
            end,
            reason: "slice contains no samples".to_string(),
        })?;
        let centre_of_gravity = self
            .centre_of_gravity(&slice)
            .ok_or_else(|| FricativeError::Computation {
                start,
                end,
                reason: "slice has zero energy".to_string(),
            })?;

        Ok(AcousticMeasures {
            intensity_db,
            centre_of_gravity,
        })
    }

    /// Centre of gravity of an already extracted slice; `None` for silence
    pub fn centre_of_gravity(&mut self, slice: &Sound) -> Option<f64> {
        Spectrum::from_sound(slice, &mut self.fft, true).get_center_of_gravity(self.cog_power)
    }
}

impl Default for AcousticAnalyzer {
    fn default() -> Self {
        Self {
            cog_power: DEFAULT_COG_POWER,
            fft: Fft::new(),
        }
    }
}

/// Mean intensity of a slice in dB: `10·log10(mean(x²) / P_ref²)`
///
/// `None` for an empty slice. An all-zero slice gives negative infinity.
pub fn mean_intensity_db(slice: &Sound) -> Option<f64> {
    let rms = slice.rms()?;
    let mean_square = rms * rms;
    if mean_square > 0.0 {
        Some(10.0 * (mean_square / (REFERENCE_PRESSURE * REFERENCE_PRESSURE)).log10())
    } else {
        Some(f64::NEG_INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_intensity_of_unit_square_wave() {
        // mean(x²) = 1 Pa² → 10·log10(1 / 4e-10) ≈ 93.98 dB
        let samples: Vec<f64> = (0..1000).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let sound = Sound::from_samples_owned(samples, 10000.0);

        let db = mean_intensity_db(&sound).unwrap();
        assert_relative_eq!(db, 93.9794, epsilon = 1e-3);
    }

    #[test]
    fn test_intensity_halving_amplitude_drops_six_db() {
        let loud = Sound::sine(440.0, 0.5, 0.1, 16000.0);
        let soft = Sound::sine(440.0, 0.25, 0.1, 16000.0);

        let diff = mean_intensity_db(&loud).unwrap() - mean_intensity_db(&soft).unwrap();
        assert_relative_eq!(diff, 20.0 * 2.0_f64.log10(), epsilon = 1e-9);
    }

    #[test]
    fn test_intensity_edge_cases() {
        assert!(mean_intensity_db(&Sound::from_samples(&[], 16000.0)).is_none());
        let silent = mean_intensity_db(&Sound::silence(0.01, 16000.0)).unwrap();
        assert!(silent.is_infinite() && silent < 0.0);
    }

    #[test]
    fn test_measure_tone_slice() {
        let sound = Sound::sine(4000.0, 0.3, 1.0, 16000.0);
        let mut analyzer = AcousticAnalyzer::default();

        let measures = analyzer.measure(&sound, 0.2, 0.3).unwrap();
        assert!((measures.centre_of_gravity - 4000.0).abs() < 200.0);
        let expected_db = 10.0 * ((0.3_f64 * 0.3 / 2.0) / 4e-10).log10();
        assert_relative_eq!(measures.intensity_db, expected_db, epsilon = 0.05);
    }

    #[test]
    fn test_measure_empty_slice_fails() {
        let sound = Sound::sine(4000.0, 0.3, 0.1, 16000.0);
        let mut analyzer = AcousticAnalyzer::default();

        let err = analyzer.measure(&sound, 0.5, 0.6).unwrap_err();
        assert!(matches!(err, FricativeError::Computation { .. }));
    }

    #[test]
    fn test_measure_silent_slice_fails() {
        let sound = Sound::silence(0.5, 16000.0);
        let mut analyzer = AcousticAnalyzer::default();

        let err = analyzer.measure(&sound, 0.1, 0.2).unwrap_err();
        assert!(matches!(err, FricativeError::Computation { ref reason, .. } if reason.contains("zero energy")));
    }

    #[test]
    fn test_rejects_non_positive_power() {
        assert!(AcousticAnalyzer::new(0.0).is_err());
        assert!(AcousticAnalyzer::new(f64::NAN).is_err());
        assert_eq!(AcousticAnalyzer::new(1.0).unwrap().cog_power(), 1.0);
    }
}
