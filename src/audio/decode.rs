use std::io::Cursor;
use std::time::Duration;

use hound::SampleFormat;

use crate::error::{Result, VizError};

/// A decoded, analyzable audio buffer. Samples are mono f32 in -1.0..=1.0;
/// multi-channel input is averaged down at decode time.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration: Duration,
}

/// Decode service seam: turns an encoded buffer into playable, analyzable
/// audio or rejects it.
pub trait AudioDecoder: Send + Sync {
    fn name(&self) -> &'static str;
    fn decode(&self, encoded: &[u8]) -> Result<DecodedAudio>;
}

/// WAV decoder backed by hound.
pub struct WavDecoder;

impl AudioDecoder for WavDecoder {
    fn name(&self) -> &'static str {
        "wav"
    }

    fn decode(&self, encoded: &[u8]) -> Result<DecodedAudio> {
        let mut reader = hound::WavReader::new(Cursor::new(encoded))
            .map_err(|e| VizError::Decode(e.to_string()))?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| VizError::Decode(e.to_string()))?,
            (SampleFormat::Int, bits @ 1..=32) => {
                let scale = (1i64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| VizError::Decode(e.to_string()))?
            }
            (format, bits) => {
                return Err(VizError::Decode(format!(
                    "unsupported WAV sample format: {:?} {} bit",
                    format, bits
                )))
            }
        };

        let channels = spec.channels.max(1);
        let samples: Vec<f32> = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks(channels as usize)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        let duration = Duration::from_secs_f64(samples.len() as f64 / spec.sample_rate as f64);
        Ok(DecodedAudio {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buf, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn decodes_mono_i16() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, &[0, i16::MAX, i16::MIN, 0]);
        let audio = WavDecoder.decode(&bytes).unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.samples.len(), 4);
        assert!((audio.samples[1] - 1.0).abs() < 1e-3);
        assert!((audio.samples[2] + 1.0).abs() < 1e-3);
        assert!((audio.duration.as_secs_f64() - 4.0 / 8000.0).abs() < 1e-9);
    }

    #[test]
    fn mixes_stereo_down_to_mono() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        // L = 16384, R = 0 per frame; mono mixdown is the average
        let bytes = wav_bytes(spec, &[16384, 0, 16384, 0]);
        let audio = WavDecoder.decode(&bytes).unwrap();
        assert_eq!(audio.samples.len(), 2);
        for s in &audio.samples {
            assert!((s - 0.25).abs() < 1e-3);
        }
    }

    #[test]
    fn rejects_non_wav_bytes() {
        let err = WavDecoder.decode(b"definitely not a wav").unwrap_err();
        assert!(matches!(err, VizError::Decode(_)));
    }
}
