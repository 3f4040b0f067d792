pub mod app;
pub mod color;
pub mod engine;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod key;
pub mod loader;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use color::Color;
pub use engine::{Engine, LogicalKey};
pub use error::{ConfigError, LoadError, LoadRejected};
pub use framebuffer::{FrameBuffer, Surface};
pub use input::InputForwarder;
pub use key::Key;
pub use loader::{ProgramImage, ProgramLoader};
pub use scheduler::{CadenceConfig, FrameClock, Iteration, RefreshQueue, RunToken, Scheduler};
