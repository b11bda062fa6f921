//! Drawing seam between the simulation and whatever paints it.

use glam::Vec2;

/// Minimal 2D painter the scene draws through. Coordinates are CSS pixels.
pub trait Surface {
    fn set_fill_style(&mut self, style: &str);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
}

/// Canvas size in CSS pixels plus the device pixel ratio of the backing store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            device_pixel_ratio: if device_pixel_ratio > 0.0 {
                device_pixel_ratio
            } else {
                1.0
            },
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.width * 0.5) as f32, (self.height * 0.5) as f32)
    }

    /// Backing-store size in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        (
            ((self.width * self.device_pixel_ratio) as u32).max(1),
            ((self.height * self.device_pixel_ratio) as u32).max(1),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PaintOp {
    FillStyle(String),
    Rect { x: f64, y: f64, w: f64, h: f64 },
}

/// In-memory surface that records every call.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<PaintOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn rect_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PaintOp::Rect { .. }))
            .count()
    }

    pub fn fill_styles(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            PaintOp::FillStyle(s) => Some(s.as_str()),
            PaintOp::Rect { .. } => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn set_fill_style(&mut self, style: &str) {
        self.ops.push(PaintOp::FillStyle(style.to_owned()));
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ops.push(PaintOp::Rect { x, y, w, h });
    }
}
