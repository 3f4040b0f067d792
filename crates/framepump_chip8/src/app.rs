use std::path::Path;

use framepump_common::app::App;
use framepump_common::{
    CadenceConfig, Color, Engine, FrameBuffer, InputForwarder, Key, LoadError, ProgramLoader,
    RefreshQueue, Scheduler, Surface,
};

use crate::emulator::Emulator;
use crate::keypad::keypad_index;
use crate::SCREEN_SCALE;

/// Desktop-facing wrapper that lets a vsync-driven frontend pump the
/// CHIP-8 engine through the frame scheduler.
pub struct Chip8App {
    should_exit: bool,
    pub scheduler: Scheduler<Emulator, RefreshQueue>,
    forwarder: InputForwarder,
}

impl Default for Chip8App {
    fn default() -> Self {
        Self::new(CadenceConfig::default(), SCREEN_SCALE)
    }
}

impl Chip8App {
    pub fn new(cadence: CadenceConfig, scale: u32) -> Self {
        Self {
            should_exit: false,
            scheduler: Scheduler::new(Emulator::default(), RefreshQueue::default(), cadence)
                .with_scale(scale),
            forwarder: InputForwarder::new(keypad_index),
        }
    }
}

impl App for Chip8App {
    fn init(&mut self) {
        log::info!(
            "Chip-8 init: {} steps per frame, scale {}",
            self.scheduler.cadence().steps_per_frame(),
            self.scheduler.scale()
        );
        if !self.scheduler.is_running() {
            log::info!("No program loaded, drop a ROM onto the window to start");
        }
    }

    fn update(&mut self, screen: &mut FrameBuffer) {
        if self.scheduler.pump(screen).is_none() && !self.scheduler.is_running() {
            // A rejected load cancels the old run; don't leave its frame up.
            screen.clear(Color::BLACK);
        }
    }

    fn handle_key_event(&mut self, key: Key, is_down: bool) {
        if key == Key::Escape {
            self.should_exit = true;
            return;
        }
        self.forwarder.forward(&mut self.scheduler, key, is_down);
    }

    fn load_program(&mut self, path: Option<&Path>) -> Result<(), LoadError> {
        ProgramLoader::load(&mut self.scheduler, path).map(|_| ())
    }

    fn should_exit(&self) -> bool {
        self.should_exit
    }

    fn exit(&mut self) {
        self.scheduler.shutdown();
        log::info!("Chip-8 exit");
    }

    fn width(&self) -> u32 {
        self.scheduler.engine().width()
    }

    fn height(&self) -> u32 {
        self.scheduler.engine().height()
    }

    fn scale(&self) -> u32 {
        self.scheduler.scale()
    }

    fn title(&self) -> String {
        "FramePump Chip-8".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framepump_common::Iteration;

    fn screen(app: &Chip8App) -> FrameBuffer {
        FrameBuffer::new(app.width() * app.scale(), app.height() * app.scale())
    }

    #[test]
    fn idle_until_a_program_is_loaded() {
        let mut app = Chip8App::new(CadenceConfig::new(1).unwrap(), 1);
        let mut fb = screen(&app);
        app.update(&mut fb);
        assert_eq!(app.scheduler.engine().pc(), crate::START_ADDRESS);
        assert!(matches!(app.load_program(None), Err(LoadError::NoFileSelected)));
    }

    #[test]
    fn escape_requests_exit_and_is_not_forwarded() {
        let mut app = Chip8App::default();
        app.handle_key_event(Key::Escape, true);
        assert!(app.should_exit());
        app.exit();
        assert!(!app.scheduler.is_running());
    }

    #[test]
    fn keys_reach_the_keypad() {
        let mut app = Chip8App::default();
        app.handle_key_event(Key::V, true);
        assert!(app.scheduler.engine().is_key_pressed(0xF));
        app.handle_key_event(Key::V, false);
        assert!(!app.scheduler.engine().is_key_pressed(0xF));
    }

    #[test]
    fn each_refresh_runs_one_iteration() {
        // I = glyph 0; DRW V0, V0, 5; JP 0x204
        let rom = vec![0xA0, 0x00, 0xD0, 0x05, 0x12, 0x04];
        let mut app = Chip8App::new(CadenceConfig::new(2).unwrap(), 2);
        ProgramLoader::load_bytes(&mut app.scheduler, rom).unwrap();

        let mut fb = screen(&app);
        app.update(&mut fb);
        assert_eq!(app.scheduler.engine().pc(), crate::START_ADDRESS + 4);
        assert_eq!(fb.pixel(0, 0), Some(Color::WHITE));

        app.update(&mut fb);
        assert_eq!(app.scheduler.engine().pc(), crate::START_ADDRESS + 4);
        assert_eq!(app.scheduler.pump(&mut fb), Some(Iteration::Ran));
    }

    #[test]
    fn rejected_load_blanks_the_screen() {
        let mut app = Chip8App::new(CadenceConfig::new(2).unwrap(), 1);
        // I = glyph 0; DRW V0, V0, 5; JP 0x204
        ProgramLoader::load_bytes(&mut app.scheduler, vec![0xA0, 0x00, 0xD0, 0x05, 0x12, 0x04])
            .unwrap();
        let mut fb = screen(&app);
        app.update(&mut fb);
        assert_eq!(fb.pixel(0, 0), Some(Color::WHITE));

        let path = std::env::temp_dir().join(format!(
            "framepump-app-oversized-{}.ch8",
            std::process::id()
        ));
        std::fs::write(&path, vec![0u8; crate::MAX_PROGRAM_SIZE + 1]).unwrap();
        let result = app.load_program(Some(&path));
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(LoadError::LoadRejected(_))));
        assert!(!app.scheduler.is_running());
        app.update(&mut fb);
        assert_eq!(fb.pixel(0, 0), Some(Color::BLACK));
    }
}
