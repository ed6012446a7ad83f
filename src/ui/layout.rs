//! Window layout
//!
//! Places the plot canvas and the four parameter rows inside the client area.
//! Kept free of Win32 so resizing behaviour can be unit tested.

use crate::config::parameters::ParameterId;
use crate::domain::core::Rect;

/// Unscaled layout metrics, in logical pixels
const MARGIN: i32 = 10;
const ROW_HEIGHT: i32 = 28;
const ROW_GAP: i32 = 4;
const LABEL_WIDTH: i32 = 120;
const ENTRY_WIDTH: i32 = 80;
const COLUMN_GAP: i32 = 6;
const CONTROL_HEIGHT: i32 = 24;
const CONTROL_FONT_POINTS: f32 = 9.0;

/// Initial client size in logical pixels
pub const INITIAL_CLIENT_WIDTH: i32 = 640;
pub const INITIAL_CLIENT_HEIGHT: i32 = 560;

/// Placement of one label / slider / entry row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub id: ParameterId,
    pub label: Rect,
    pub slider: Rect,
    pub entry: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLayout {
    pub canvas: Rect,
    pub rows: Vec<RowLayout>,
}

impl WindowLayout {
    /// Computes the layout for a client area at the given DPI scale
    pub fn compute(client: Rect, dpi_scale: f32) -> Self {
        let px = |logical: i32| ((logical as f32) * dpi_scale.max(0.5)).round() as i32;

        let content = client.inset(px(MARGIN));
        let row_count = ParameterId::ALL.len() as i32;
        let controls_height = row_count * px(ROW_HEIGHT) + (row_count - 1) * px(ROW_GAP);
        let (upper, controls) = content.split_bottom(controls_height);
        let canvas = Rect::new(upper.x, upper.y, upper.w, (upper.h - px(MARGIN)).max(0));

        let rows = ParameterId::ALL
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let y = controls.y + index as i32 * (px(ROW_HEIGHT) + px(ROW_GAP));
                let row = Rect::new(controls.x, y, controls.w, px(ROW_HEIGHT));
                let (label, rest) = row.split_left(px(LABEL_WIDTH));
                let (slider, entry) = rest.split_right(px(ENTRY_WIDTH));
                let slider = Rect::new(
                    slider.x + px(COLUMN_GAP),
                    slider.y,
                    (slider.w - 2 * px(COLUMN_GAP)).max(0),
                    slider.h,
                );
                RowLayout {
                    id: *id,
                    label: center_vertically(label, px(CONTROL_HEIGHT)),
                    slider,
                    entry: center_vertically(entry, px(CONTROL_HEIGHT)),
                }
            })
            .collect();

        Self { canvas, rows }
    }
}

fn center_vertically(rect: Rect, height: i32) -> Rect {
    let height = height.min(rect.h);
    Rect::new(rect.x, rect.y + (rect.h - height) / 2, rect.w, height)
}

/// Character height for `CreateFontW` of the control font at `dpi_scale`
///
/// Negative, so GDI matches the em height rather than the cell height.
pub fn control_font_height(dpi_scale: f32) -> i32 {
    -(CONTROL_FONT_POINTS * 96.0 / 72.0 * dpi_scale.max(0.5)).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initial_client() -> Rect {
        Rect::new(0, 0, INITIAL_CLIENT_WIDTH, INITIAL_CLIENT_HEIGHT)
    }

    #[test]
    fn one_row_per_parameter_in_order() {
        let layout = WindowLayout::compute(initial_client(), 1.0);
        let ids: Vec<ParameterId> = layout.rows.iter().map(|row| row.id).collect();
        assert_eq!(ids, ParameterId::ALL.to_vec());
    }

    #[test]
    fn canvas_sits_above_controls() {
        let layout = WindowLayout::compute(initial_client(), 1.0);
        assert!(!layout.canvas.is_empty());
        for row in &layout.rows {
            assert!(row.label.y >= layout.canvas.bottom());
        }
        assert!(layout.rows.windows(2).all(|pair| pair[0].slider.y < pair[1].slider.y));
    }

    #[test]
    fn control_font_follows_dpi() {
        assert_eq!(control_font_height(1.0), -12);
        assert_eq!(control_font_height(1.5), -18);
        assert_eq!(control_font_height(2.0), -24);
        assert!(control_font_height(0.0) < 0);
    }

    #[test]
    fn row_columns_do_not_overlap() {
        let layout = WindowLayout::compute(initial_client(), 1.0);
        for row in &layout.rows {
            assert!(row.label.right() <= row.slider.x);
            assert!(row.slider.right() <= row.entry.x);
            assert!(row.entry.right() <= INITIAL_CLIENT_WIDTH);
        }
    }

    #[test]
    fn slider_stretches_with_width() {
        let narrow = WindowLayout::compute(initial_client(), 1.0);
        let wide = WindowLayout::compute(Rect::new(0, 0, 1200, INITIAL_CLIENT_HEIGHT), 1.0);
        assert!(wide.rows[0].slider.w > narrow.rows[0].slider.w);
        assert_eq!(wide.rows[0].entry.w, narrow.rows[0].entry.w);
        assert!(wide.canvas.w > narrow.canvas.w);
    }

    #[test]
    fn dpi_scale_grows_rows() {
        let normal = WindowLayout::compute(Rect::new(0, 0, 1280, 1120), 1.0);
        let scaled = WindowLayout::compute(Rect::new(0, 0, 1280, 1120), 2.0);
        assert_eq!(scaled.rows[0].entry.w, 2 * normal.rows[0].entry.w);
    }

    #[test]
    fn tiny_client_collapses_canvas() {
        let layout = WindowLayout::compute(Rect::new(0, 0, 100, 60), 1.0);
        assert!(layout.canvas.is_empty());
        assert_eq!(layout.rows.len(), 4);
        assert!(layout.rows.iter().all(|row| row.slider.w >= 0 && row.entry.w >= 0));
    }
}
