use std::path::Path;

use anyhow::{anyhow, Result};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::messagebox::{show_simple_message_box, MessageBoxFlag};
use sdl2::pixels::PixelFormatEnum;
use sdl2::video::Window;
use typed_builder::TypedBuilder;

pub use framepump_common;
pub use framepump_common::app::App;
pub use sdl2;

use framepump_common::{FrameBuffer, Key, LoadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    RGB24,
}

#[derive(TypedBuilder)]
pub struct SdlInitInfo {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub title: String,
    #[builder(default = PixelFormat::RGB24)]
    pub pixel_format: PixelFormat,
}

pub struct SdlContext;

impl SdlContext {
    /// Open the window and pump `app` once per vsync until it asks to exit
    /// or the window is closed.
    pub fn run(sdl_init_info: SdlInitInfo, mut app: impl App) -> Result<()> {
        let SdlInitInfo {
            width,
            height,
            scale,
            title,
            pixel_format,
        } = sdl_init_info;
        // The engine draws at output resolution, so the texture is already scaled.
        let (out_width, out_height) = (width * scale, height * scale);

        let sdl_context = sdl2::init().map_err(|e| anyhow!(e))?;
        let video_subsystem = sdl_context.video().map_err(|e| anyhow!(e))?;
        let window = video_subsystem
            .window(&title, out_width, out_height)
            .position_centered()
            .build()?;
        let mut canvas = window.into_canvas().present_vsync().build()?;
        let creator = canvas.texture_creator();
        let mut texture = creator
            .create_texture_streaming(map_pixel_format(pixel_format), out_width, out_height)
            .map_err(|e| anyhow!(e.to_string()))?;

        let mut screen = FrameBuffer::new(out_width, out_height);
        debug_assert_eq!(
            screen.pitch(),
            (out_width * map_pixel_format_size(pixel_format)) as usize
        );
        let mut event_pump = sdl_context.event_pump().map_err(|e| anyhow!(e))?;

        app.init();
        loop {
            if app.should_exit() {
                app.exit();
                break;
            }

            for event in event_pump.poll_iter() {
                match event {
                    Event::Quit { .. } => {
                        app.exit();
                        return Ok(());
                    }
                    Event::KeyDown {
                        keycode: Some(keycode),
                        repeat: false,
                        ..
                    } => app.handle_key_event(map_keycode(keycode), true),
                    Event::KeyUp {
                        keycode: Some(keycode),
                        ..
                    } => app.handle_key_event(map_keycode(keycode), false),
                    Event::DropFile { filename, .. } => {
                        let path = Path::new(&filename);
                        if let Err(err) = app.load_program(Some(path)) {
                            report_load_error(&title, &err, canvas.window());
                        }
                    }
                    _ => {}
                }
            }

            app.update(&mut screen);

            texture
                .update(None, screen.pixels(), screen.pitch())
                .map_err(|e| anyhow!(e.to_string()))?;
            canvas.copy(&texture, None, None).map_err(|e| anyhow!(e))?;
            // Blocks until the next vertical blank.
            canvas.present();
        }

        Ok(())
    }
}

/// Load failures are reported to the user and otherwise ignored.
pub fn report_load_error(title: &str, err: &LoadError, window: &Window) {
    log::warn!("{}", err);
    if let Err(e) = show_simple_message_box(MessageBoxFlag::WARNING, title, &err.to_string(), window)
    {
        log::error!("Could not show message box: {}", e);
    }
}

pub fn map_pixel_format(pixel_format: PixelFormat) -> PixelFormatEnum {
    match pixel_format {
        PixelFormat::RGB24 => PixelFormatEnum::RGB24,
    }
}

pub fn map_pixel_format_size(pixel_format: PixelFormat) -> u32 {
    match pixel_format {
        PixelFormat::RGB24 => FrameBuffer::BYTES_PER_PIXEL,
    }
}

pub fn map_keycode(keycode: Keycode) -> Key {
    match keycode {
        Keycode::Num1 | Keycode::Kp1 => Key::Num1,
        Keycode::Num2 | Keycode::Kp2 => Key::Num2,
        Keycode::Num3 | Keycode::Kp3 => Key::Num3,
        Keycode::Num4 | Keycode::Kp4 => Key::Num4,
        Keycode::Q => Key::Q,
        Keycode::W => Key::W,
        Keycode::E => Key::E,
        Keycode::R => Key::R,
        Keycode::A => Key::A,
        Keycode::S => Key::S,
        Keycode::D => Key::D,
        Keycode::F => Key::F,
        Keycode::Z => Key::Z,
        Keycode::X => Key::X,
        Keycode::C => Key::C,
        Keycode::V => Key::V,
        Keycode::Escape => Key::Escape,
        _ => Key::None,
    }
}
