use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::config::AnalysisConfig;

/// Frequency analysis node.
///
/// Exposes a fixed number of frequency bins and fills a byte array with one
/// magnitude per bin on demand: Hann-windowed forward FFT, amplitude
/// normalization, per-bin exponential smoothing, then a decibel range mapped
/// onto 0..=255. Magnitudes at or below `min_db` come out as 0, at or above
/// `max_db` as 255.
pub struct Analyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
}

impl Analyser {
    pub fn new(config: &AnalysisConfig) -> Self {
        let fft_size = config.fft_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        // Hann window for smoother frequency response
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (fft_size - 1) as f32).cos())
            })
            .collect();

        Self {
            fft,
            fft_size,
            window,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            smoothing: config.smoothing.clamp(0.0, 1.0),
            min_db: config.min_db,
            max_db: config.max_db,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins (half the FFT size).
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Refresh the spectrum from `samples` (the most recent analysis window)
    /// and write byte magnitudes into `out`. Fills at most
    /// `frequency_bin_count()` entries; a shorter `out` receives the low end.
    pub fn read_byte_frequency_data(&mut self, samples: &[f32], out: &mut [u8]) {
        for i in 0..self.fft_size {
            let s = samples.get(i).copied().unwrap_or(0.0);
            self.buffer[i] = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        // 2/N puts a full-scale sine near 0 dB before windowing loss
        let norm = 2.0 / self.fft_size as f32;
        let db_range = self.max_db - self.min_db;
        let n = out.len().min(self.smoothed.len());

        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.buffer[k].norm() * norm;
            *smoothed = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;
            if k < n {
                let db = 20.0 * smoothed.max(1e-12).log10();
                let scaled = ((db - self.min_db) / db_range).clamp(0.0, 1.0);
                out[k] = (scaled * 255.0).round() as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyser(smoothing: f32) -> Analyser {
        Analyser::new(&AnalysisConfig {
            smoothing,
            ..AnalysisConfig::default()
        })
    }

    #[test]
    fn bin_count_is_half_the_fft_size() {
        let a = analyser(0.0);
        assert_eq!(a.fft_size(), 2048);
        assert_eq!(a.frequency_bin_count(), 1024);
    }

    #[test]
    fn silence_reads_as_zero() {
        let mut a = analyser(0.0);
        let samples = vec![0.0f32; 2048];
        let mut out = vec![1u8; a.frequency_bin_count()];
        a.read_byte_frequency_data(&samples, &mut out);
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn sine_peaks_at_the_expected_bin() {
        let mut a = analyser(0.0);
        let sample_rate = 44100.0f32;
        let freq = 1000.0f32;
        let samples: Vec<f32> = (0..2048)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect();
        let mut out = vec![0u8; a.frequency_bin_count()];
        a.read_byte_frequency_data(&samples, &mut out);

        let peak = out
            .iter()
            .enumerate()
            .max_by_key(|(_, &v)| v)
            .map(|(i, _)| i)
            .unwrap();
        let expected = (freq * 2048.0 / sample_rate).round() as usize;
        assert!(
            peak.abs_diff(expected) <= 2,
            "peak bin {} too far from expected {}",
            peak,
            expected
        );
        assert!(out[peak] > 200);
    }

    #[test]
    fn smoothing_lags_behind_a_step_change() {
        let mut smooth = analyser(0.8);
        let mut instant = analyser(0.0);
        let tone: Vec<f32> = (0..2048)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let mut out_smooth = vec![0u8; 1024];
        let mut out_instant = vec![0u8; 1024];
        smooth.read_byte_frequency_data(&tone, &mut out_smooth);
        instant.read_byte_frequency_data(&tone, &mut out_instant);

        let peak = out_instant
            .iter()
            .enumerate()
            .max_by_key(|(_, &v)| v)
            .map(|(i, _)| i)
            .unwrap();
        assert!(out_smooth[peak] < out_instant[peak]);
    }
}
