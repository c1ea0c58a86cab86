mod analyzer;
mod decode;
mod source;

pub use analyzer::Analyser;
pub use decode::{AudioDecoder, DecodedAudio, WavDecoder};
pub use source::BufferSource;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error};

use crate::config::AnalysisConfig;
use crate::error::{Result, VizError};

/// Explicitly constructed audio capability, owned by whoever composes a
/// session and passed in wherever decoding happens.
#[derive(Clone)]
pub struct AudioEnvironment {
    decoders: Vec<Arc<dyn AudioDecoder>>,
}

impl AudioEnvironment {
    /// Build the environment with every decoder this build supports.
    pub fn detect() -> Result<Self> {
        Self::from_decoders(vec![Arc::new(WavDecoder)])
    }

    /// Build from an explicit decoder set. An empty set is the
    /// unsupported-environment case: reported once here, and every audio
    /// feature is inoperable afterwards.
    pub fn from_decoders(decoders: Vec<Arc<dyn AudioDecoder>>) -> Result<Self> {
        if decoders.is_empty() {
            let err = VizError::UnsupportedEnvironment("no audio decoders available".into());
            error!("{}", err);
            return Err(err);
        }
        Ok(Self { decoders })
    }

    /// Try each registered decoder in order; the first one that accepts the
    /// buffer wins.
    pub fn decode(&self, encoded: &[u8]) -> Result<DecodedAudio> {
        let mut last_err = None;
        for decoder in &self.decoders {
            match decoder.decode(encoded) {
                Ok(audio) => {
                    debug!(decoder = decoder.name(), duration = ?audio.duration, "decoded audio");
                    return Ok(audio);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| VizError::Decode("no decoder accepted the buffer".into())))
    }
}

/// Source → analyser chain, created once at RUNNING-entry and living for the
/// session's duration.
pub struct AudioGraph {
    source: BufferSource,
    analyser: Analyser,
    window: Vec<f32>,
}

impl AudioGraph {
    pub fn connect(audio: DecodedAudio, config: &AnalysisConfig, now: Instant) -> Self {
        let analyser = Analyser::new(config);
        let window = vec![0.0; analyser.fft_size()];
        Self {
            source: BufferSource::start(audio, now),
            analyser,
            window,
        }
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.analyser.frequency_bin_count()
    }

    pub fn finished(&self, now: Instant) -> bool {
        self.source.finished(now)
    }

    /// Snapshot the spectrum at the current playback position. Synchronous,
    /// no buffering across frames.
    pub fn read_byte_frequency_data(&mut self, now: Instant, out: &mut [u8]) {
        self.source.fill_window(now, &mut self.window);
        self.analyser.read_byte_frequency_data(&self.window, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_environment_is_unsupported() {
        let err = match AudioEnvironment::from_decoders(Vec::new()) {
            Ok(_) => panic!("empty decoder set must be rejected"),
            Err(e) => e,
        };
        assert!(matches!(err, VizError::UnsupportedEnvironment(_)));
    }

    #[test]
    fn detect_decodes_wav() {
        let env = AudioEnvironment::detect().unwrap();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buf, spec).unwrap();
            for _ in 0..16 {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        let audio = env.decode(&buf.into_inner()).unwrap();
        assert_eq!(audio.samples.len(), 16);
    }

    #[test]
    fn graph_reads_bin_count_bytes() {
        let audio = DecodedAudio {
            samples: vec![0.5; 8192],
            sample_rate: 44100,
            channels: 1,
            duration: std::time::Duration::from_secs(1),
        };
        let t0 = Instant::now();
        let mut graph = AudioGraph::connect(audio, &AnalysisConfig::default(), t0);
        assert_eq!(graph.frequency_bin_count(), 1024);
        let mut out = vec![0u8; graph.frequency_bin_count()];
        graph.read_byte_frequency_data(t0 + std::time::Duration::from_millis(100), &mut out);
    }
}
