use std::cell::RefCell;
use std::rc::{Rc, Weak};

use framepump_common::{
    CadenceConfig, Color, FrameClock, InputForwarder, Key, LoadError, ProgramLoader, RunToken,
    Scheduler, Surface,
};
use js_sys::{ArrayBuffer, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, FileReader, HtmlCanvasElement, HtmlInputElement,
    KeyboardEvent, Window,
};

use crate::keypad::keypad_index;
use crate::{Emulator, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Browser harness: canvas output, `<input type="file">` loading and
/// `requestAnimationFrame` pacing.
#[wasm_bindgen]
pub struct WebHarness {
    inner: Rc<RefCell<Harness>>,
}

#[wasm_bindgen]
impl WebHarness {
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        input_id: &str,
        steps_per_frame: usize,
        scale: u32,
    ) -> Result<WebHarness, JsValue> {
        let cadence = CadenceConfig::new(steps_per_frame).map_err(to_js)?;
        let scale = scale.max(1);
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let canvas: HtmlCanvasElement = element(&document, canvas_id)?;
        canvas.set_width(SCREEN_WIDTH as u32 * scale);
        canvas.set_height(SCREEN_HEIGHT as u32 * scale);
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<Harness>>| {
            let clock = AnimationFrameClock {
                window: window.clone(),
                harness: weak.clone(),
                frame_id: None,
            };
            RefCell::new(Harness {
                scheduler: Scheduler::new(Emulator::default(), clock, cadence).with_scale(scale),
                forwarder: InputForwarder::new(keypad_index),
                window: window.clone(),
                ctx,
            })
        });

        {
            let harness = inner.borrow();
            canvas_surface(&harness.ctx, scale).clear(Color::BLACK);
        }

        // Resolve every element before any listener is leaked onto the page.
        let input: HtmlInputElement = element(&document, input_id)?;
        listen_keys(&document, &inner)?;
        listen_file_input(&input, &inner)?;

        Ok(WebHarness { inner })
    }

    /// Start `data` as a new run, superseding whatever is running.
    pub fn load(&self, data: Uint8Array) -> Result<(), JsValue> {
        self.inner.borrow_mut().load_bytes(data.to_vec()).map(|_| ()).map_err(to_js)
    }

    pub fn shutdown(&self) {
        self.inner.borrow_mut().scheduler.shutdown();
    }
}

struct Harness {
    scheduler: Scheduler<Emulator, AnimationFrameClock>,
    forwarder: InputForwarder,
    window: Window,
    ctx: CanvasRenderingContext2d,
}

impl Harness {
    fn on_frame(&mut self, token: RunToken) {
        let mut surface = canvas_surface(&self.ctx, self.scheduler.scale());
        self.scheduler.run_iteration(token, &mut surface);
    }

    fn load_bytes(&mut self, bytes: Vec<u8>) -> Result<RunToken, LoadError> {
        ProgramLoader::load_bytes(&mut self.scheduler, bytes)
    }

    fn report(&self, err: &LoadError) {
        log::warn!("{}", err);
        if self.window.alert_with_message(&err.to_string()).is_err() {
            log::error!("Could not show alert");
        }
    }
}

/// Each scheduled frame is a one-shot callback carrying its token.
struct AnimationFrameClock {
    window: Window,
    harness: Weak<RefCell<Harness>>,
    frame_id: Option<i32>,
}

impl FrameClock for AnimationFrameClock {
    fn schedule(&mut self, token: RunToken) {
        let harness = self.harness.clone();
        let callback = Closure::once_into_js(move || {
            if let Some(harness) = harness.upgrade() {
                harness.borrow_mut().on_frame(token);
            }
        });
        match self
            .window
            .request_animation_frame(callback.unchecked_ref())
        {
            Ok(id) => self.frame_id = Some(id),
            Err(err) => log::error!("requestAnimationFrame failed: {:?}", err),
        }
    }

    fn cancel(&mut self) {
        if let Some(id) = self.frame_id.take() {
            if let Err(err) = self.window.cancel_animation_frame(id) {
                log::warn!("cancelAnimationFrame failed: {:?}", err);
            }
        }
    }
}

struct CanvasSurface<'a> {
    ctx: &'a CanvasRenderingContext2d,
    width: u32,
    height: u32,
}

fn canvas_surface(ctx: &CanvasRenderingContext2d, scale: u32) -> CanvasSurface<'_> {
    CanvasSurface {
        ctx,
        width: SCREEN_WIDTH as u32 * scale,
        height: SCREEN_HEIGHT as u32 * scale,
    }
}

impl Surface for CanvasSurface<'_> {
    fn clear(&mut self, color: Color) {
        self.ctx.set_fill_style(&JsValue::from_str(&color.to_css()));
        self.ctx
            .fill_rect(0.0, 0.0, self.width as f64, self.height as f64);
    }

    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Color) {
        self.ctx.set_fill_style(&JsValue::from_str(&color.to_css()));
        self.ctx
            .fill_rect(x as f64, y as f64, width as f64, height as f64);
    }
}

fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id '{}'", id)))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element '{}' has the wrong type", id)))
}

fn listen_keys(document: &Document, harness: &Rc<RefCell<Harness>>) -> Result<(), JsValue> {
    for (event, pressed) in [("keydown", true), ("keyup", false)] {
        let harness = Rc::clone(harness);
        let callback = Closure::<dyn FnMut(KeyboardEvent)>::new(move |evt: KeyboardEvent| {
            if evt.repeat() {
                return;
            }
            let mut harness = harness.borrow_mut();
            let Harness {
                scheduler,
                forwarder,
                ..
            } = &mut *harness;
            forwarder.forward(scheduler, dom_key(&evt.key()), pressed);
        });
        document.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        // Listeners live as long as the page.
        callback.forget();
    }
    Ok(())
}

fn listen_file_input(
    input: &HtmlInputElement,
    harness: &Rc<RefCell<Harness>>,
) -> Result<(), JsValue> {
    let harness = Rc::clone(harness);
    let target = input.clone();
    let callback = Closure::<dyn FnMut()>::new(move || {
        let file = target.files().and_then(|files| files.get(0));
        let Some(file) = file else {
            harness.borrow().report(&LoadError::NoFileSelected);
            return;
        };
        let reader = match FileReader::new() {
            Ok(reader) => reader,
            Err(err) => {
                log::error!("FileReader unavailable: {:?}", err);
                return;
            }
        };

        let harness = Rc::clone(&harness);
        let done = reader.clone();
        let onload = Closure::once_into_js(move || {
            let bytes = done
                .result()
                .ok()
                .and_then(|result| result.dyn_into::<ArrayBuffer>().ok())
                .map(|buffer| Uint8Array::new(&buffer).to_vec());
            let outcome = match bytes {
                Some(bytes) => harness.borrow_mut().load_bytes(bytes).map(|_| ()),
                None => Err(LoadError::EmptyOrUnreadableFile {
                    path: None,
                    source: None,
                }),
            };
            if let Err(err) = outcome {
                harness.borrow().report(&err);
            }
        });
        reader.set_onload(Some(onload.unchecked_ref()));
        if let Err(err) = reader.read_as_array_buffer(&file) {
            log::error!("Could not read selected file: {:?}", err);
        }
    });
    input.add_event_listener_with_callback("change", callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

fn dom_key(key: &str) -> Key {
    match key {
        "1" => Key::Num1,
        "2" => Key::Num2,
        "3" => Key::Num3,
        "4" => Key::Num4,
        "q" | "Q" => Key::Q,
        "w" | "W" => Key::W,
        "e" | "E" => Key::E,
        "r" | "R" => Key::R,
        "a" | "A" => Key::A,
        "s" | "S" => Key::S,
        "d" | "D" => Key::D,
        "f" | "F" => Key::F,
        "z" | "Z" => Key::Z,
        "x" | "X" => Key::X,
        "c" | "C" => Key::C,
        "v" | "V" => Key::V,
        "Escape" => Key::Escape,
        _ => Key::None,
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
