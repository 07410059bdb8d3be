use crate::config::GridDims;
use crate::driver::FloatPos;

/// Columns reserved on the left for the debug panel.
pub(crate) const DEBUG_PANEL_W: u16 = 34;

/// Placement of the glyph block inside the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    /// Area the block floats in: x range [view_x, view_x + view_w), rows [0, view_h).
    pub(crate) view_x: u16,
    pub(crate) view_w: u16,
    pub(crate) view_h: u16,
    pub(crate) grid: GridDims,
}

impl Layout {
    /// Recomputed on every terminal resize and debug panel toggle. The last
    /// row is kept free for the key hint line.
    pub(crate) fn compute(term_cols: u16, term_rows: u16, grid: GridDims, debug_panel: bool) -> Self {
        let panel = if debug_panel {
            DEBUG_PANEL_W.min(term_cols / 2)
        } else {
            0
        };
        Self {
            view_x: panel,
            view_w: term_cols - panel,
            view_h: term_rows.saturating_sub(1),
            grid,
        }
    }

    /// Top-left corner of the block whose centre sits at `pos` (percent of the
    /// view), pulled back inside the view when it would overhang. Blocks larger
    /// than the view are centred instead.
    pub(crate) fn block_origin(&self, pos: FloatPos) -> (i32, i32) {
        let place = |pct: f64, view: u16, size: u16| -> i32 {
            let (view, size) = (view as i32, size as i32);
            if size >= view {
                return (view - size) / 2;
            }
            let centre = (pct / 100.0 * view as f64).round() as i32;
            (centre - size / 2).clamp(0, view - size)
        };
        (
            self.view_x as i32 + place(pos.x_pct, self.view_w, self.grid.cols),
            place(pos.y_pct, self.view_h, self.grid.rows),
        )
    }
}
