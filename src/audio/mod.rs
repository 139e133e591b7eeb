// Audio playback module
// Uses Symphonia for decoding, rubato for rate conversion and cpal for output

pub mod convert;
pub mod decoder;
pub mod output;
pub mod player;

pub use decoder::{AudioDecoder, DecoderError, SampleSource};
pub use output::{AudioOutput, AudioSink, OutputError};
pub use player::{PlaybackError, PlaybackReport, Player};
