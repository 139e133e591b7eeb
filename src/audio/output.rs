// Audio output using cpal
// Handles cross-platform audio output with a ring buffer

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use parking_lot::Mutex;
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

const RING_BUFFER_SIZE: usize = 48000 * 2 / 4; // ~250ms of stereo audio at 48kHz

type RingProducer = ringbuf::HeapProd<f32>;
type RingConsumer = ringbuf::HeapCons<f32>;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no output device available")]
    NoDevice,
    #[error("failed to get default output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build output stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(SampleFormat),
}

/// The audio peripheral the player streams into
pub trait AudioSink {
    fn sample_rate(&self) -> u32;
    fn channels(&self) -> usize;
    /// Queue interleaved samples, returns how many were accepted
    fn write(&mut self, samples: &[f32]) -> usize;
    /// True while queued samples have not been played out yet
    fn is_playing(&self) -> bool;
    /// Drop everything queued
    fn clear(&mut self);
    /// Set the output volume (0.0 to 1.0)
    fn set_volume(&mut self, volume: f32);
}

/// Sample queue shared between the playback loop and the audio callback
#[derive(Clone)]
struct SampleRing {
    producer: Arc<Mutex<RingProducer>>,
    consumer: Arc<Mutex<RingConsumer>>,
}

impl SampleRing {
    fn new(capacity: usize) -> Self {
        let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
        Self {
            producer: Arc::new(Mutex::new(producer)),
            consumer: Arc::new(Mutex::new(consumer)),
        }
    }

    fn push(&self, samples: &[f32]) -> usize {
        // A full ring takes nothing, the caller retries with the remainder
        self.producer.lock().push_slice(samples)
    }

    fn queued(&self) -> usize {
        self.producer.lock().occupied_len()
    }

    /// Drop queued samples right away, before anything else can be pushed
    fn clear(&self) {
        let mut consumer = self.consumer.lock();
        while consumer.try_pop().is_some() {}
    }

    /// Fill a device buffer, padding with silence once the ring runs dry
    fn fill<T: cpal::SizedSample + cpal::FromSample<f32>>(&self, data: &mut [T], volume: f32) {
        let mut consumer = self.consumer.lock();
        for sample in data.iter_mut() {
            let value = consumer.try_pop().unwrap_or(0.0) * volume;
            *sample = T::from_sample(value);
        }
    }
}

pub struct AudioOutput {
    _stream: Stream,
    ring: SampleRing,
    sample_rate: u32,
    channels: u16,
    volume: Arc<Mutex<f32>>,
}

impl AudioOutput {
    /// Create a new audio output with default device
    pub fn new() -> Result<Self, OutputError> {
        let host = cpal::default_host();

        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;

        let config = device.default_output_config()?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let ring = SampleRing::new(RING_BUFFER_SIZE);
        let volume = Arc::new(Mutex::new(1.0f32));

        let stream_config: StreamConfig = config.config();
        let stream = match config.sample_format() {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &stream_config, ring.clone(), volume.clone())?
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &stream_config, ring.clone(), volume.clone())?
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &stream_config, ring.clone(), volume.clone())?
            }
            format => return Err(OutputError::UnsupportedFormat(format)),
        };

        stream.play()?;

        Ok(Self {
            _stream: stream,
            ring,
            sample_rate,
            channels,
            volume,
        })
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &StreamConfig,
        ring: SampleRing,
        volume: Arc<Mutex<f32>>,
    ) -> Result<Stream, OutputError> {
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let vol = *volume.lock();
                ring.fill(data, vol);
            },
            move |err| {
                error!("audio output error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}

impl AudioSink for AudioOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> usize {
        self.channels as usize
    }

    fn write(&mut self, samples: &[f32]) -> usize {
        self.ring.push(samples)
    }

    fn is_playing(&self) -> bool {
        self.ring.queued() > 0
    }

    fn clear(&mut self) {
        self.ring.clear();
    }

    fn set_volume(&mut self, volume: f32) {
        *self.volume.lock() = volume.clamp(0.0, 1.0);
    }
}
