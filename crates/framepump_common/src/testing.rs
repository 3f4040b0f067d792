//! Recording engine shared by the unit tests of this crate.

use std::cell::RefCell;

use crate::color::Color;
use crate::engine::{Engine, LogicalKey};
use crate::error::LoadRejected;
use crate::framebuffer::Surface;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Reset,
    Load(Vec<u8>),
    Step,
    DecayTimers,
    Render(u32),
    Key(LogicalKey, bool),
}

/// Records every call. `steps_against` remembers which image each step ran
/// against so tests can spot interleaved programs.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    log: RefCell<Vec<Call>>,
    loaded: Option<Vec<u8>>,
    pub steps_against: Vec<Vec<u8>>,
    pub reject_next: bool,
}

impl RecordingEngine {
    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn clear(&mut self) {
        self.log.get_mut().clear();
        self.steps_against.clear();
    }

    pub fn count(&self, call: &Call) -> usize {
        self.log.borrow().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl Engine for RecordingEngine {
    fn reset(&mut self) {
        self.loaded = None;
        self.record(Call::Reset);
    }

    fn load(&mut self, image: Vec<u8>) -> Result<(), LoadRejected> {
        if std::mem::take(&mut self.reject_next) {
            return Err(LoadRejected::new("test rejection"));
        }
        self.record(Call::Load(image.clone()));
        self.loaded = Some(image);
        Ok(())
    }

    fn step(&mut self) {
        self.record(Call::Step);
        let image = self.loaded.clone().unwrap_or_default();
        self.steps_against.push(image);
    }

    fn decay_timers(&mut self) {
        self.record(Call::DecayTimers);
    }

    fn render(&self, scale: u32, surface: &mut dyn Surface) {
        self.record(Call::Render(scale));
        surface.fill_rect(0, 0, scale, scale, Color::WHITE);
    }

    fn key_transition(&mut self, key: LogicalKey, pressed: bool) {
        self.record(Call::Key(key, pressed));
    }

    fn width(&self) -> u32 {
        1
    }

    fn height(&self) -> u32 {
        1
    }
}
