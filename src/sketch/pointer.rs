/// Maps terminal cell coordinates onto the square logical canvas.
///
/// The whole frame is the drawing surface; a cell maps to the canvas point
/// under its center, so strokes stay put through resizes (the mapping is
/// refreshed on every resize event).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerMap {
    cols: u16,
    rows: u16,
    canvas_px: u32,
}

impl PointerMap {
    pub fn new(cols: u16, rows: u16, canvas_px: u32) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            canvas_px,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols.max(1);
        self.rows = rows.max(1);
    }

    pub fn to_canvas(&self, column: u16, row: u16) -> (f64, f64) {
        let x = (column as f64 + 0.5) / self.cols as f64 * self.canvas_px as f64;
        let y = (row as f64 + 0.5) / self.rows as f64 * self.canvas_px as f64;
        (x, y)
    }
}
