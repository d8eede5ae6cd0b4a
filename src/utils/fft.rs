//! FFT wrapper for spectral analysis
//!
//! Thin layer over rustfft that owns a planner, so repeated transforms of the
//! same size (fricatives of similar duration) reuse their plans.

use num_complex::Complex;
use rustfft::FftPlanner;

pub struct Fft {
    planner: FftPlanner<f64>,
}

impl Fft {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Forward transform of `input`, zero-padded to `output_size` points
    /// (never fewer than `input.len()`)
    pub fn real_fft(&mut self, input: &[f64], output_size: usize) -> Vec<Complex<f64>> {
        let fft_size = output_size.max(input.len());
        if fft_size == 0 {
            return Vec::new();
        }
        let fft = self.planner.plan_fft_forward(fft_size);

        let mut buffer: Vec<Complex<f64>> = input
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
            .take(fft_size)
            .collect();

        fft.process(&mut buffer);
        buffer
    }

    /// Bins from DC up to and including Nyquist (`fft_size / 2 + 1` of them)
    pub fn positive_spectrum(&mut self, input: &[f64], fft_size: usize) -> Vec<Complex<f64>> {
        let mut spectrum = self.real_fft(input, fft_size);
        let n_bins = spectrum.len() / 2 + 1;
        spectrum.truncate(n_bins.min(spectrum.len()));
        spectrum
    }
}

impl Default for Fft {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_fft_dc() {
        let mut fft = Fft::new();
        let input = vec![1.0; 8];
        let spectrum = fft.real_fft(&input, 8);

        assert_relative_eq!(spectrum[0].re, 8.0, epsilon = 1e-10);
        for c in &spectrum[1..] {
            assert_relative_eq!(c.norm(), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_fft_sine() {
        let mut fft = Fft::new();
        let n = 64;
        let input: Vec<f64> = (0..n).map(|i| (2.0 * PI * 4.0 * i as f64 / n as f64).sin()).collect();
        let spectrum = fft.positive_spectrum(&input, n);

        assert_eq!(spectrum.len(), n / 2 + 1);
        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .map(|(bin, _)| bin);
        assert_eq!(peak, Some(4));
    }

    #[test]
    fn test_zero_padding() {
        let mut fft = Fft::new();
        let spectrum = fft.positive_spectrum(&[1.0, 1.0, 1.0], 8);
        assert_eq!(spectrum.len(), 5);
        assert_relative_eq!(spectrum[0].re, 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_empty_input() {
        let mut fft = Fft::new();
        assert!(fft.positive_spectrum(&[], 0).is_empty());
    }
}
