//! Single-frame spectrum analysis
//!
//! This module computes the FFT spectrum of a whole sound (no windowing,
//! no framing) and its spectral centre of gravity.

use num_complex::Complex;

use crate::utils::Fft;
use crate::Sound;

/// Single-frame spectrum representation
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Complex values of the bins from 0 Hz to Nyquist
    bins: Vec<Complex<f64>>,
    /// Frequency resolution (Hz per bin)
    df: f64,
    /// Maximum frequency (Nyquist)
    max_frequency: f64,
}

impl Spectrum {
    /// Transform the whole sound as one frame, without a window
    ///
    /// With `fast` the samples are zero-padded to the next power of two.
    pub fn from_sound(sound: &Sound, fft: &mut Fft, fast: bool) -> Self {
        let samples = sound.samples();
        let n = samples.len();

        if n == 0 {
            return Self {
                bins: Vec::new(),
                df: 0.0,
                max_frequency: 0.0,
            };
        }

        let fft_size = if fast { n.next_power_of_two() } else { n };
        let bins = fft.positive_spectrum(samples, fft_size);

        Self {
            bins,
            df: sound.sample_rate() / fft_size as f64,
            max_frequency: sound.sample_rate() / 2.0,
        }
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// Get the frequency of a specific bin
    pub fn get_frequency_from_bin(&self, bin: usize) -> f64 {
        bin as f64 * self.df
    }

    /// Hz per bin
    pub fn df(&self) -> f64 {
        self.df
    }

    pub fn max_frequency(&self) -> f64 {
        self.max_frequency
    }

    pub fn get_magnitude(&self, bin: usize) -> Option<f64> {
        self.bins.get(bin).map(|c| c.norm())
    }

    /// Compute spectral center of gravity (centroid)
    ///
    /// The center of gravity is the weighted mean frequency:
    /// CoG = Σ(f × |X(f)|^power) / Σ(|X(f)|^power)
    ///
    /// Returns `None` when the spectrum carries no energy.
    pub fn get_center_of_gravity(&self, power: f64) -> Option<f64> {
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;

        for (bin, c) in self.bins.iter().enumerate() {
            let energy = c.norm_sqr();
            let weight = if power == 2.0 { energy } else { energy.powf(power / 2.0) };

            weighted_sum += self.get_frequency_from_bin(bin) * weight;
            weight_sum += weight;
        }

        if weight_sum > 0.0 && weight_sum.is_finite() {
            Some(weighted_sum / weight_sum)
        } else {
            None
        }
    }
}

impl Sound {
    /// Compute the spectrum of this sound
    pub fn to_spectrum(&self, fast: bool) -> Spectrum {
        Spectrum::from_sound(self, &mut Fft::new(), fast)
    }
}
