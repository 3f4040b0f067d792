use std::fmt;
use std::num::NonZeroUsize;

use crate::engine::Engine;
use crate::error::{ConfigError, LoadRejected};
use crate::framebuffer::Surface;
use crate::loader::ProgramImage;


/// Identifies one scheduled loop instance.
///
/// Tokens are minted from a counter owned by the [`Scheduler`] and are never
/// reused, so a continuation that captured an old token can always tell it
/// has been superseded.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct RunToken(u64);

impl RunToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// How much logical work happens per rendered frame.
///
/// Timers always decay exactly once per frame, so `steps_per_frame` only
/// changes the instruction rate, never the real-time rate of the timers.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CadenceConfig {
    steps_per_frame: NonZeroUsize,
}

impl CadenceConfig {
    pub const DEFAULT_STEPS_PER_FRAME: usize = 10;

    pub fn new(steps_per_frame: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(steps_per_frame)
            .map(|steps_per_frame| Self { steps_per_frame })
            .ok_or(ConfigError::ZeroStepsPerFrame)
    }

    pub fn steps_per_frame(&self) -> usize {
        self.steps_per_frame.get()
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            steps_per_frame: NonZeroUsize::new(Self::DEFAULT_STEPS_PER_FRAME)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// The display-refresh primitive the loop reschedules itself on.
pub trait FrameClock {
    /// Arrange for an iteration of `token` on the next display refresh.
    fn schedule(&mut self, token: RunToken);

    /// Drop the pending continuation, if any.
    fn cancel(&mut self);
}

/// Single-slot clock drained by a host that owns its own vsync loop.
#[derive(Debug, Default)]
pub struct RefreshQueue {
    pending: Option<RunToken>,
}

impl RefreshQueue {
    /// Take the continuation due on this refresh.
    pub fn take_due(&mut self) -> Option<RunToken> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl FrameClock for RefreshQueue {
    fn schedule(&mut self, token: RunToken) {
        self.pending = Some(token);
    }

    fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Outcome of one scheduled iteration.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Iteration {
    /// Steps, timer decay and render all ran; the next iteration is scheduled.
    Ran,
    /// The token is no longer live; nothing touched the engine.
    Superseded,
}

/// Drives an [`Engine`] at a fixed cadence, one iteration per display refresh.
///
/// The scheduler is the only writer of the live [`RunToken`]. Starting a new
/// run invalidates the previous token before the engine is reset, so an
/// iteration of the old run that was already queued finds its token stale
/// and does nothing.
pub struct Scheduler<E, C> {
    engine: E,
    clock: C,
    cadence: CadenceConfig,
    scale: u32,
    live: Option<RunToken>,
    generation: u64,
}

impl<E: Engine, C: FrameClock> Scheduler<E, C> {
    pub fn new(engine: E, clock: C, cadence: CadenceConfig) -> Self {
        Self {
            engine,
            clock,
            cadence,
            scale: 1,
            live: None,
            generation: 0,
        }
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        debug_assert!(scale >= 1, "render scale must be positive");
        self.scale = scale.max(1);
        self
    }

    /// Replace whatever is running with `image`.
    ///
    /// On `Err` no run is live and nothing is scheduled: the previous run
    /// stays cancelled rather than being resumed.
    pub fn restart(&mut self, image: ProgramImage) -> Result<RunToken, LoadRejected> {
        if let Some(previous) = self.live.take() {
            log::info!("Cancelling {}", previous);
        }
        self.clock.cancel();

        self.engine.reset();
        let len = image.len();
        if let Err(err) = self.engine.load(image.into_bytes()) {
            log::warn!("{}; no program is running", err);
            return Err(err);
        }

        self.generation += 1;
        let token = RunToken(self.generation);
        self.live = Some(token);
        self.clock.schedule(token);
        log::info!(
            "Started {} with a {} byte image at {} steps per frame",
            token,
            len,
            self.cadence.steps_per_frame()
        );
        Ok(token)
    }

    /// One display refresh worth of work for `token`.
    ///
    /// Called by the refresh mechanism, never by user code. A stale token is
    /// a no-op, which is how cancelled continuations are retired.
    pub fn run_iteration(&mut self, token: RunToken, surface: &mut dyn Surface) -> Iteration {
        if self.live != Some(token) {
            log::debug!("Skipping iteration of superseded {}", token);
            return Iteration::Superseded;
        }

        for _ in 0..self.cadence.steps_per_frame() {
            self.engine.step();
        }
        self.engine.decay_timers();
        self.engine.render(self.scale, surface);

        self.clock.schedule(token);
        Iteration::Ran
    }

    /// Explicit teardown: cancels the pending continuation and invalidates
    /// the live token. The engine keeps its state until the next restart.
    pub fn shutdown(&mut self) {
        self.clock.cancel();
        if let Some(token) = self.live.take() {
            log::info!("Stopped {}", token);
        }
    }

    pub fn live_token(&self) -> Option<RunToken> {
        self.live
    }

    pub fn is_running(&self) -> bool {
        self.live.is_some()
    }

    pub fn cadence(&self) -> CadenceConfig {
        self.cadence
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

impl<E: Engine> Scheduler<E, RefreshQueue> {
    /// Run whatever iteration is due on this refresh.
    pub fn pump(&mut self, surface: &mut dyn Surface) -> Option<Iteration> {
        let token = self.clock.take_due()?;
        Some(self.run_iteration(token, surface))
    }
}
