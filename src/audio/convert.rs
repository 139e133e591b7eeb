// Channel remapping and sample rate conversion between decoder and output

use rubato::{
    FastFixedIn, PolynomialDegree, ResampleError, Resampler, ResamplerConstructionError,
};
use thiserror::Error;

const CHUNK_FRAMES: usize = 1024;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported channel layout: {from} -> {to}")]
    Channels { from: usize, to: usize },
    #[error("failed to create resampler: {0}")]
    Construction(#[from] ResamplerConstructionError),
    #[error("resampling failed: {0}")]
    Resample(#[from] ResampleError),
}

/// Copy interleaved frames from `from` channels to `to` channels.
///
/// Missing output channels repeat the last input channel, surplus input channels are dropped.
pub fn remap_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        for ch in 0..to {
            out.push(frame[ch.min(from - 1)]);
        }
    }
    out
}

/// Turns decoder output into samples the sink can play as-is
pub struct Converter {
    in_channels: usize,
    out_channels: usize,
    resampler: Option<Resampling>,
}

struct Resampling {
    inner: FastFixedIn<f32>,
    ratio: f64,
    pending: Vec<Vec<f32>>,
    frames_in: u64,
    frames_out: u64,
}

impl Converter {
    pub fn new(
        in_rate: u32,
        in_channels: usize,
        out_rate: u32,
        out_channels: usize,
    ) -> Result<Self, ConvertError> {
        if in_channels == 0 || out_channels == 0 {
            return Err(ConvertError::Channels {
                from: in_channels,
                to: out_channels,
            });
        }

        let resampler = if in_rate != out_rate {
            let ratio = out_rate as f64 / in_rate as f64;
            Some(Resampling {
                inner: FastFixedIn::<f32>::new(
                    ratio,
                    1.0,
                    PolynomialDegree::Cubic,
                    CHUNK_FRAMES,
                    out_channels,
                )?,
                ratio,
                pending: vec![Vec::new(); out_channels],
                frames_in: 0,
                frames_out: 0,
            })
        } else {
            None
        };

        Ok(Self {
            in_channels,
            out_channels,
            resampler,
        })
    }

    /// Convert one block of interleaved decoder samples
    pub fn push(&mut self, samples: &[f32]) -> Result<Vec<f32>, ConvertError> {
        let remapped = remap_channels(samples, self.in_channels, self.out_channels);
        let Some(resampling) = self.resampler.as_mut() else {
            return Ok(remapped);
        };

        for frame in remapped.chunks_exact(self.out_channels) {
            for (ch, sample) in frame.iter().enumerate() {
                resampling.pending[ch].push(*sample);
            }
        }
        resampling.frames_in += (remapped.len() / self.out_channels) as u64;

        let mut out = Vec::new();
        while resampling.pending[0].len() >= resampling.inner.input_frames_next() {
            let needed = resampling.inner.input_frames_next();
            let chunk: Vec<Vec<f32>> = resampling
                .pending
                .iter_mut()
                .map(|channel| channel.drain(..needed).collect())
                .collect();
            let processed = resampling.inner.process(&chunk, None)?;
            resampling.append_interleaved(&processed, &mut out);
        }
        Ok(out)
    }

    /// Flush whatever the resampler still holds at end of stream
    pub fn finish(&mut self) -> Result<Vec<f32>, ConvertError> {
        let Some(resampling) = self.resampler.as_mut() else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        if !resampling.pending[0].is_empty() {
            let rest = std::mem::replace(
                &mut resampling.pending,
                vec![Vec::new(); self.out_channels],
            );
            let processed = resampling.inner.process_partial(Some(rest.as_slice()), None)?;
            resampling.append_interleaved(&processed, &mut out);
        }
        let tail = resampling.inner.process_partial::<Vec<f32>>(None, None)?;
        resampling.append_interleaved(&tail, &mut out);
        Ok(out)
    }
}

impl Resampling {
    /// Interleave resampler output, never emitting more frames than the rate ratio allows
    fn append_interleaved(&mut self, planes: &[Vec<f32>], out: &mut Vec<f32>) {
        let expected = (self.frames_in as f64 * self.ratio).round() as u64;
        let available = planes.first().map(|p| p.len()).unwrap_or(0) as u64;
        let frames = available.min(expected.saturating_sub(self.frames_out)) as usize;

        for frame in 0..frames {
            for plane in planes {
                out.push(plane[frame]);
            }
        }
        self.frames_out += frames as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_to_stereo_duplicates() {
        assert_eq!(
            remap_channels(&[0.1, 0.2, 0.3], 1, 2),
            vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3]
        );
    }

    #[test]
    fn test_surplus_channels_are_dropped() {
        assert_eq!(
            remap_channels(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 3, 2),
            vec![0.1, 0.2, 0.4, 0.5]
        );
    }

    #[test]
    fn test_same_rate_passes_through() {
        let mut converter = Converter::new(48000, 2, 48000, 2).unwrap();
        let block = vec![0.25; 64];
        assert_eq!(converter.push(&block).unwrap(), block);
        assert!(converter.finish().unwrap().is_empty());
    }

    #[test]
    fn test_resampling_produces_expected_frame_count() {
        let mut converter = Converter::new(24000, 1, 48000, 2).unwrap();
        let mut out = Vec::new();
        for _ in 0..10 {
            out.extend(converter.push(&vec![0.0; 1000]).unwrap());
        }
        out.extend(converter.finish().unwrap());

        let frames = out.len() / 2;
        assert_eq!(out.len() % 2, 0);
        assert!(frames <= 20000, "{} frames", frames);
        assert!(frames >= 19000, "{} frames", frames);
    }

    #[test]
    fn test_zero_channels_rejected() {
        assert!(matches!(
            Converter::new(44100, 0, 48000, 2),
            Err(ConvertError::Channels { .. })
        ));
    }
}
