// Button input module
// Debounced trigger events from a single pulled-up pin

pub mod button;
pub mod debounce;

pub use button::Button;
pub use debounce::{DebounceState, Debouncer, Trigger};
