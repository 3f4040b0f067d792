use crate::error::LoadRejected;
use crate::framebuffer::Surface;

/// Index into the engine's virtual keypad.
pub type LogicalKey = u8;

/// The interpreter driven by the scheduler.
///
/// The harness never looks inside an engine: it resets it, hands it a
/// program, and then pumps `step`/`decay_timers`/`render` at the cadence
/// fixed by [`CadenceConfig`](crate::CadenceConfig). Key transitions arrive
/// independently of that cadence.
pub trait Engine {
    /// Return to power-on state.
    fn reset(&mut self);

    /// Install a program image. Ownership of the bytes passes to the engine.
    fn load(&mut self, image: Vec<u8>) -> Result<(), LoadRejected>;

    /// Execute one logical instruction.
    fn step(&mut self);

    /// Decrement the real-time countdown timers by one unit.
    fn decay_timers(&mut self);

    /// Draw the current frame buffer, each engine pixel covering a
    /// `scale x scale` block of `surface`.
    fn render(&self, scale: u32, surface: &mut dyn Surface);

    fn key_transition(&mut self, key: LogicalKey, pressed: bool);

    fn width(&self) -> u32;
    fn height(&self) -> u32;
}
