use heart_core::Surface;
use web_sys as web;

/// `Surface` over a 2D canvas context. Skips redundant fill-style writes,
/// which are comparatively expensive across the JS boundary.
pub struct CanvasSurface {
    ctx: web::CanvasRenderingContext2d,
    current_fill: String,
}

impl CanvasSurface {
    pub fn new(ctx: web::CanvasRenderingContext2d) -> Self {
        Self {
            ctx,
            current_fill: String::new(),
        }
    }

    pub fn context(&self) -> &web::CanvasRenderingContext2d {
        &self.ctx
    }

    /// Forget the cached style; the canvas resets its state on resize.
    pub fn invalidate(&mut self) {
        self.current_fill.clear();
    }
}

impl Surface for CanvasSurface {
    fn set_fill_style(&mut self, style: &str) {
        if self.current_fill != style {
            self.ctx.set_fill_style_str(style);
            self.current_fill.clear();
            self.current_fill.push_str(style);
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.fill_rect(x, y, w, h);
    }
}
