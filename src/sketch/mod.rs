pub mod crop;
pub mod pointer;

pub use crop::{CropRegion, SketchImage};
pub use pointer::PointerMap;

use std::time::Instant;

use crate::config::Config;

/// Running min/max extent of the ink, in canvas pixels.
/// Every fold is expanded by the brush radius so the box covers painted
/// pixels, not just stroke centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    fn around(x: f64, y: f64, radius: f64) -> Self {
        Self {
            min_x: x - radius,
            min_y: y - radius,
            max_x: x + radius,
            max_y: y + radius,
        }
    }

    fn fold(&mut self, x: f64, y: f64, radius: f64) {
        self.min_x = self.min_x.min(x - radius);
        self.min_y = self.min_y.min(y - radius);
        self.max_x = self.max_x.max(x + radius);
        self.max_y = self.max_y.max(y + radius);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// The drawing surface: ink raster, stroke polylines for rendering, the
/// running bounding box, and the per-target drawing clock.
///
/// Moves are throttled to one per quantum, and the clock advances by exactly
/// one quantum per processed move, so the clock is a count of processed moves.
#[derive(Debug, Clone)]
pub struct SketchPad {
    size: u32,
    brush_radius: f64,
    margin: f64,
    throttle_ms: u64,
    crop_pad: f64,
    ink: Vec<u8>,
    strokes: Vec<Vec<(f64, f64)>>,
    bounding_box: Option<BoundingBox>,
    drawing: bool,
    time_spent_ms: u64,
    last_processed: Option<Instant>,
}

impl SketchPad {
    pub fn new(cfg: &Config) -> Self {
        Self {
            size: cfg.canvas_px,
            brush_radius: cfg.brush_radius(),
            margin: cfg.margin_px(),
            throttle_ms: cfg.throttle_ms,
            crop_pad: cfg.crop_pad_px as f64,
            ink: vec![0; (cfg.canvas_px * cfg.canvas_px) as usize],
            strokes: Vec::new(),
            bounding_box: None,
            drawing: false,
            time_spent_ms: 0,
            last_processed: None,
        }
    }

    /// Begin a stroke. Points inside the edge margin are dropped (glitchy
    /// coordinates near the canvas border). Returns true when the sketch
    /// changed.
    pub fn pen_down(&mut self, x: f64, y: f64) -> bool {
        if self.near_edge(x, y) {
            return false;
        }
        self.drawing = true;
        self.strokes.push(vec![(x, y)]);
        self.stamp(x, y);
        match self.bounding_box.as_mut() {
            Some(b) => b.fold(x, y, self.brush_radius),
            None => self.bounding_box = Some(BoundingBox::around(x, y, self.brush_radius)),
        }
        true
    }

    pub fn pen_move(&mut self, x: f64, y: f64) -> bool {
        self.pen_move_at(x, y, Instant::now())
    }

    /// Extend the active stroke. At most one move per throttle quantum is
    /// processed; each processed move advances the drawing clock by one
    /// quantum even when the point then falls inside the edge margin.
    /// Returns true when the geometry changed.
    pub fn pen_move_at(&mut self, x: f64, y: f64, now: Instant) -> bool {
        if !self.drawing {
            return false;
        }
        if let Some(last) = self.last_processed {
            if now.duration_since(last).as_millis() < self.throttle_ms as u128 {
                return false;
            }
        }
        self.last_processed = Some(now);
        self.time_spent_ms += self.throttle_ms;
        if self.near_edge(x, y) {
            return false;
        }
        let prev = self.strokes.last().and_then(|s| s.last().copied());
        match prev {
            Some((px, py)) => self.stamp_segment(px, py, x, y),
            None => self.stamp(x, y),
        }
        if let Some(stroke) = self.strokes.last_mut() {
            stroke.push((x, y));
        }
        if let Some(b) = self.bounding_box.as_mut() {
            b.fold(x, y, self.brush_radius);
        }
        true
    }

    /// End the active stroke (idempotent)
    pub fn pen_up(&mut self) {
        self.drawing = false;
    }

    /// Wipe the ink. The drawing clock survives unless `reset_timer` is set;
    /// the in-game clear action keeps it so wiping is never a stalling move.
    pub fn clear(&mut self, reset_timer: bool) {
        self.ink.fill(0);
        self.strokes.clear();
        self.bounding_box = None;
        self.drawing = false;
        if reset_timer {
            self.time_spent_ms = 0;
            self.last_processed = None;
        }
    }

    /// The square, padded crop around the ink, or `None` when nothing has
    /// been drawn since the last clear.
    pub fn cropped_image(&self) -> Option<SketchImage> {
        self.bounding_box.map(|b| {
            let region = CropRegion::from_box(&b, self.crop_pad);
            crop::extract(&self.ink, self.size, region)
        })
    }

    pub fn time_spent_ms(&self) -> u64 {
        self.time_spent_ms
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    pub fn strokes(&self) -> &[Vec<(f64, f64)>] {
        &self.strokes
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn ink(&self) -> &[u8] {
        &self.ink
    }

    fn near_edge(&self, x: f64, y: f64) -> bool {
        let limit = self.size as f64 - self.margin;
        x < self.margin || y < self.margin || x > limit || y > limit
    }

    fn stamp(&mut self, x: f64, y: f64) {
        let r = self.brush_radius;
        let size = self.size as i64;
        let lo_x = (x - r).floor() as i64;
        let hi_x = (x + r).ceil() as i64;
        let lo_y = (y - r).floor() as i64;
        let hi_y = (y + r).ceil() as i64;
        for py in lo_y..=hi_y {
            for px in lo_x..=hi_x {
                if px < 0 || py < 0 || px >= size || py >= size {
                    continue;
                }
                let dx = px as f64 + 0.5 - x;
                let dy = py as f64 + 0.5 - y;
                if dx * dx + dy * dy <= r * r {
                    self.ink[(py as u32 * self.size + px as u32) as usize] = 255;
                }
            }
        }
    }

    fn stamp_segment(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        let dist = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        let steps = ((dist / (self.brush_radius.max(1.0) / 2.0)).ceil() as usize).max(1);
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            self.stamp(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
        }
    }
}
