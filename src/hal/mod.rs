pub mod power;
pub mod timer;

// Re-export commonly used types
pub use power::{DelayIdle, Idle, NoIdle};
pub use timer::PolledTick;
