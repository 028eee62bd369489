pub mod clock;
pub mod controller;
pub mod display_context;
pub mod input_adapter;
pub mod timer;

pub use clock::Clock;
pub use controller::{InputEvent, PointerButton, PointerInput, TouchPhase};
pub use display_context::Viewport;
pub use input_adapter::WinitInputAdapter;
pub use timer::{Accumulator, Countdown, EveryNTicks};
