//! The rendering surface shared across reloads.
//!
//! A [`Surface`] is a plain RGB frame buffer. The platform opens it once,
//! presents it every tick and the engine hands the same [`SurfaceHandle`] to
//! each new program instance, so a reload never flickers or resets the
//! window.

use std::cell::RefCell;
use std::rc::Rc;

use crate::program::ProgramConfig;

/// Shared, single-threaded handle to the surface.
pub type SurfaceHandle = Rc<RefCell<Surface>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    caption: String,
    pixels: Vec<Color>,
}

impl Surface {
    /// Create a black surface sized from `config`.
    pub fn new(config: &ProgramConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            caption: config.caption.clone(),
            pixels: vec![Color::BLACK; config.width as usize * config.height as usize],
        }
    }

    /// Wrap a new surface in a shareable handle.
    pub fn open(config: &ProgramConfig) -> SurfaceHandle {
        Rc::new(RefCell::new(Self::new(config)))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    /// Row-major pixels.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Fill `rect`, clipped to the surface.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let x0 = rect.x.max(0) as i64;
        let y0 = rect.y.max(0) as i64;
        let x1 = (rect.x as i64 + rect.width as i64).min(self.width as i64);
        let y1 = (rect.y as i64 + rect.height as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for y in y0..y1 {
            let start = self.index(x0 as u32, y as u32);
            let end = start + (x1 - x0) as usize;
            self.pixels[start..end].fill(color);
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Surface {
        Surface::new(&ProgramConfig::default().with_size(4, 3))
    }

    #[test]
    fn test_new_surface_from_config() {
        let surface = Surface::new(&ProgramConfig::default());
        assert_eq!(surface.width(), 800);
        assert_eq!(surface.height(), 600);
        assert_eq!(surface.caption(), "Game");
        assert_eq!(surface.pixels().len(), 800 * 600);
    }

    #[test]
    fn test_fill_rect_is_clipped() {
        let mut surface = small();
        surface.fill_rect(Rect::new(-1, 1, 3, 10), Color::WHITE);

        assert_eq!(surface.pixel(0, 0), Some(Color::BLACK));
        assert_eq!(surface.pixel(0, 1), Some(Color::WHITE));
        assert_eq!(surface.pixel(1, 2), Some(Color::WHITE));
        assert_eq!(surface.pixel(2, 1), Some(Color::BLACK));
        assert_eq!(surface.pixel(4, 0), None);
    }

    #[test]
    fn test_fill_rect_outside_is_noop() {
        let mut surface = small();
        surface.fill_rect(Rect::new(10, 10, 5, 5), Color::WHITE);
        assert!(surface.pixels().iter().all(|p| *p == Color::BLACK));
    }

    #[test]
    fn test_fill() {
        let mut surface = small();
        surface.fill(Color::rgb(1, 2, 3));
        assert!(surface.pixels().iter().all(|p| *p == Color::rgb(1, 2, 3)));
    }
}
