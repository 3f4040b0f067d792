use crate::color::Color;

/// Something an engine can draw its frame onto.
pub trait Surface {
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Color);
}

/// RGB24 pixel buffer, the layout the SDL2 frontend streams into its texture.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    pub const BYTES_PER_PIXEL: u32 = 3;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; (width * height * Self::BYTES_PER_PIXEL) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row, as expected by `Texture::update`.
    pub fn pitch(&self) -> usize {
        (self.width * Self::BYTES_PER_PIXEL) as usize
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        Some(Color::new_rgb(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
        ))
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        ((y * self.width + x) * Self::BYTES_PER_PIXEL) as usize
    }
}

impl Surface for FrameBuffer {
    fn clear(&mut self, color: Color) {
        for chunk in self.pixels.chunks_exact_mut(Self::BYTES_PER_PIXEL as usize) {
            chunk[0] = color.r;
            chunk[1] = color.g;
            chunk[2] = color.b;
        }
    }

    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Color) {
        // Clip against the buffer so oversized scales never index out of bounds.
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for py in y..y_end {
            for px in x..x_end {
                let idx = self.index(px, py);
                self.pixels[idx] = color.r;
                self.pixels[idx + 1] = color.g;
                self.pixels[idx + 2] = color.b;
            }
        }
    }
}
