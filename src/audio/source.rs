use std::time::Instant;

use super::DecodedAudio;

/// Playback-position cursor over a decoded buffer.
///
/// Audible output is the platform's business; this source only answers "which
/// samples are playing right now" against a wall clock, which is all the
/// analyser needs.
pub struct BufferSource {
    samples: Vec<f32>,
    sample_rate: u32,
    started: Instant,
}

impl BufferSource {
    pub fn start(audio: DecodedAudio, now: Instant) -> Self {
        Self {
            samples: audio.samples,
            sample_rate: audio.sample_rate.max(1),
            started: now,
        }
    }

    /// Playback position in samples, clamped to the end of the buffer.
    pub fn position(&self, now: Instant) -> usize {
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        let pos = (elapsed * self.sample_rate as f64) as usize;
        pos.min(self.samples.len())
    }

    pub fn finished(&self, now: Instant) -> bool {
        self.position(now) >= self.samples.len()
    }

    /// Fill `out` with the most recent `out.len()` samples ending at the
    /// playback position, zero-padded at the start while the buffer is
    /// shorter than the window.
    pub fn fill_window(&self, now: Instant, out: &mut [f32]) {
        let pos = self.position(now);
        let start = pos.saturating_sub(out.len());
        let available = &self.samples[start..pos];
        let pad = out.len() - available.len();
        out[..pad].fill(0.0);
        out[pad..].copy_from_slice(available);
    }
}
