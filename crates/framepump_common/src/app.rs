use std::path::Path;

use crate::error::LoadError;
use crate::framebuffer::FrameBuffer;
use crate::key::Key;

/// What a frontend drives. `update` is called once per display refresh.
pub trait App {
    fn init(&mut self);
    fn update(&mut self, screen: &mut FrameBuffer);
    fn handle_key_event(&mut self, key: Key, is_down: bool);
    /// A file was picked (or the pick was abandoned, `None`).
    fn load_program(&mut self, path: Option<&Path>) -> Result<(), LoadError>;
    fn should_exit(&self) -> bool;
    fn exit(&mut self);

    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn scale(&self) -> u32;
    fn title(&self) -> String;
}
