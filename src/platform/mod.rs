// Host stand-ins for the board services the controller expects
// A terminal key plays the role of the button pin, thread sleep the role of the delay timer

mod delay;
mod keyboard;

pub use delay::HostDelay;
pub use keyboard::KeyboardPin;
