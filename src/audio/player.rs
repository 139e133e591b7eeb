// Blocking clip playback
use embedded_hal::delay::DelayNs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::convert::{ConvertError, Converter};
use super::decoder::{AudioDecoder, DecoderError, SampleSource};
use super::output::AudioSink;

/// Wait between attempts to push into a full sink buffer
const FEED_RETRY_MS: u32 = 1;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Decoder(#[from] DecoderError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// What a finished playback amounted to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackReport {
    pub frames: u64,
    pub duration: Duration,
}

pub struct Player<S: AudioSink, D: DelayNs> {
    sink: S,
    delay: D,
    status_poll_ms: u32,
}

impl<S: AudioSink, D: DelayNs> Player<S, D> {
    pub fn new(sink: S, delay: D, status_poll_ms: u32) -> Self {
        Self {
            sink,
            delay,
            status_poll_ms: status_poll_ms.max(1),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Play a file and block until the sink has played it out.
    ///
    /// On failure the decoder is dropped and the sink buffer cleared before returning.
    pub fn play(&mut self, path: &Path) -> Result<PlaybackReport, PlaybackError> {
        let mut decoder = match AudioDecoder::open(path) {
            Ok(decoder) => decoder,
            Err(e) => {
                self.sink.clear();
                return Err(e.into());
            }
        };
        if let Some(ms) = decoder.duration_ms() {
            debug!(?path, duration_ms = ms, "opened clip");
        }
        self.play_source(&mut decoder)
    }

    /// Stream any sample source into the sink and wait for it to drain.
    ///
    /// Anything already queued is dropped from the sink if the source fails part way.
    pub fn play_source<Src: SampleSource>(
        &mut self,
        source: &mut Src,
    ) -> Result<PlaybackReport, PlaybackError> {
        let outcome = self.stream(source);
        if outcome.is_err() {
            self.sink.clear();
        }
        outcome
    }

    fn stream<Src: SampleSource>(
        &mut self,
        source: &mut Src,
    ) -> Result<PlaybackReport, PlaybackError> {
        let mut converter = Converter::new(
            source.sample_rate(),
            source.channels(),
            self.sink.sample_rate(),
            self.sink.channels(),
        )?;
        let mut samples: u64 = 0;

        while let Some(block) = source.next_block()? {
            let converted = converter.push(&block)?;
            samples += self.feed(&converted);
        }
        let tail = converter.finish()?;
        samples += self.feed(&tail);

        while self.sink.is_playing() {
            self.delay.delay_ms(self.status_poll_ms);
        }

        let frames = samples / self.sink.channels() as u64;
        let report = PlaybackReport {
            frames,
            duration: Duration::from_secs_f64(frames as f64 / self.sink.sample_rate() as f64),
        };
        info!(frames, duration = ?report.duration, "playback finished");
        Ok(report)
    }

    /// Write every sample, sleeping whenever the sink is full
    fn feed(&mut self, mut remaining: &[f32]) -> u64 {
        let total = remaining.len() as u64;
        while !remaining.is_empty() {
            let written = self.sink.write(remaining);
            if written > 0 {
                remaining = &remaining[written..];
            } else {
                self.delay.delay_ms(FEED_RETRY_MS);
            }
        }
        total
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::audio::decoder::tests::wav_bytes;
    use std::cell::Cell;
    use std::fs;

    /// Sink that accepts a bounded amount per write and "plays" one chunk per status check
    pub(crate) struct FakeSink {
        pub rate: u32,
        pub channels: usize,
        pub per_write: usize,
        pub written: Vec<f32>,
        pub queued: Cell<usize>,
        pub clears: usize,
        pub volume: f32,
    }

    impl FakeSink {
        pub(crate) fn new(rate: u32, channels: usize) -> Self {
            Self {
                rate,
                channels,
                per_write: 4096,
                written: Vec::new(),
                queued: Cell::new(0),
                clears: 0,
                volume: 1.0,
            }
        }
    }

    impl AudioSink for FakeSink {
        fn sample_rate(&self) -> u32 {
            self.rate
        }

        fn channels(&self) -> usize {
            self.channels
        }

        fn write(&mut self, samples: &[f32]) -> usize {
            if self.queued.get() >= self.per_write {
                // Full: pretend the device consumed it while we were away
                self.queued.set(0);
                return 0;
            }
            let n = samples.len().min(self.per_write);
            self.written.extend_from_slice(&samples[..n]);
            self.queued.set(self.queued.get() + n);
            n
        }

        fn is_playing(&self) -> bool {
            let queued = self.queued.get();
            self.queued.set(queued.saturating_sub(self.per_write / 2));
            queued > 0
        }

        fn clear(&mut self) {
            self.queued.set(0);
            self.clears += 1;
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
        }
    }

    #[derive(Default, Clone)]
    pub(crate) struct CountingDelay {
        pub calls: usize,
        pub total_ms: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.calls += 1;
            self.total_ms += u64::from(ns / 1_000_000);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.calls += 1;
            self.total_ms += u64::from(ms);
        }
    }

    fn write_wav(dir: &Path, name: &str, frames: usize) -> std::path::PathBuf {
        let path = dir.join(name);
        let samples: Vec<i16> = (0..frames * 2).map(|i| (i % 100) as i16 * 100).collect();
        fs::write(&path, wav_bytes(8000, 2, &samples)).unwrap();
        path
    }

    #[test]
    fn test_plays_whole_file_and_waits_for_drain() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav(dir.path(), "clip.wav", 8000);
        let mut player = Player::new(FakeSink::new(8000, 2), CountingDelay::default(), 100);

        let report = player.play(&path).unwrap();

        assert_eq!(report.frames, 8000);
        assert_eq!(report.duration, Duration::from_secs(1));
        assert_eq!(player.sink.written.len(), 16000);
        assert!(!player.sink.is_playing());
        assert!(player.delay.total_ms >= 100);
        assert_eq!(player.sink.clears, 0);
    }

    #[test]
    fn test_mono_source_is_widened_for_stereo_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        fs::write(&path, wav_bytes(8000, 1, &[8192; 400])).unwrap();
        let mut player = Player::new(FakeSink::new(8000, 2), CountingDelay::default(), 10);

        let report = player.play(&path).unwrap();

        assert_eq!(report.frames, 400);
        assert_eq!(player.sink.written.len(), 800);
        assert!((player.sink.written[0] - 0.25).abs() < 1e-4);
        assert_eq!(player.sink.written[0], player.sink.written[1]);
    }

    #[test]
    fn test_failure_clears_sink_and_next_play_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.mp3");
        fs::write(&broken, b"not an mp3 at all").unwrap();
        let good = write_wav(dir.path(), "good.wav", 800);
        let mut player = Player::new(FakeSink::new(8000, 2), CountingDelay::default(), 10);

        assert!(player.play(&broken).is_err());
        assert_eq!(player.sink.clears, 1);

        assert!(player.play(&dir.path().join("missing.mp3")).is_err());
        assert_eq!(player.sink.clears, 2);

        let report = player.play(&good).unwrap();
        assert_eq!(report.frames, 800);
    }

    /// Yields one block of silence, then a decode error
    struct FailsAfterOneBlock {
        blocks: usize,
    }

    impl SampleSource for FailsAfterOneBlock {
        fn sample_rate(&self) -> u32 {
            8000
        }

        fn channels(&self) -> usize {
            2
        }

        fn next_block(&mut self) -> Result<Option<Vec<f32>>, DecoderError> {
            self.blocks += 1;
            if self.blocks == 1 {
                Ok(Some(vec![0.0; 512]))
            } else {
                Err(DecoderError::Decode(
                    symphonia::core::errors::Error::DecodeError("corrupt frame"),
                ))
            }
        }
    }

    #[test]
    fn test_mid_stream_failure_clears_queued_samples() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_wav(dir.path(), "good.wav", 800);
        let mut player = Player::new(FakeSink::new(8000, 2), CountingDelay::default(), 10);

        let result = player.play_source(&mut FailsAfterOneBlock { blocks: 0 });

        assert!(matches!(
            result,
            Err(PlaybackError::Decoder(DecoderError::Decode(_)))
        ));
        assert_eq!(player.sink.written.len(), 512);
        assert_eq!(player.sink.clears, 1);
        assert_eq!(player.sink.queued.get(), 0);

        let report = player.play(&good).unwrap();
        assert_eq!(report.frames, 800);
        assert_eq!(player.sink.clears, 1);
    }

    #[test]
    fn test_volume_is_forwarded_to_sink() {
        let mut player = Player::new(FakeSink::new(8000, 2), CountingDelay::default(), 10);
        player.set_volume(1.7);
        assert_eq!(player.sink().volume, 1.0);
        player.set_volume(0.3);
        assert_eq!(player.sink().volume, 0.3);
    }
}
