//! Plot rasterization
//!
//! Renders a pre-calculated [`PlotLayout`] with tiny-skia. Text goes through
//! the optional [`TextRasterizer`]; without a font the chart is still drawn,
//! just unlabeled.

use tiny_skia::{
    LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Rect as SkiaRect,
    Stroke, Transform,
};
use tracing::warn;

use crate::ui::plot::{Bounds, HAlign, Line, PlotLayout, Series, TextLabel, VAlign};
use crate::ui::text::TextRasterizer;

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create {width}x{height} pixmap for rendering")]
    PixmapCreationFailed { width: u32, height: u32 },

    #[error("Invalid canvas dimensions: {width}x{height}")]
    InvalidCanvasDimensions { width: f32, height: f32 },
}

/// Software renderer for the roofline chart
#[derive(Debug)]
pub struct PlotRenderer {
    text: Option<TextRasterizer>,
    warned_missing_font: bool,
}

impl PlotRenderer {
    pub fn new(text: Option<TextRasterizer>) -> Self {
        Self {
            text,
            warned_missing_font: false,
        }
    }

    /// Creates a renderer with the first available system font
    pub fn with_system_font() -> Self {
        match TextRasterizer::from_system() {
            Ok(text) => Self::new(Some(text)),
            Err(err) => {
                warn!(%err, "plot text disabled");
                Self {
                    text: None,
                    warned_missing_font: true,
                }
            }
        }
    }

    /// Render a plot layout to a new pixmap
    pub fn render_layout(&mut self, layout: &PlotLayout) -> Result<Pixmap, RendererError> {
        if !(layout.canvas_width >= 1.0 && layout.canvas_height >= 1.0) {
            return Err(RendererError::InvalidCanvasDimensions {
                width: layout.canvas_width,
                height: layout.canvas_height,
            });
        }

        let width = layout.canvas_width as u32;
        let height = layout.canvas_height as u32;
        let mut pixmap = Pixmap::new(width, height)
            .ok_or(RendererError::PixmapCreationFailed { width, height })?;
        pixmap.fill(layout.background);

        self.render_lines(&mut pixmap, &layout.gridlines);
        for series in &layout.series {
            self.render_series(&mut pixmap, series);
        }
        self.render_lines(&mut pixmap, &layout.axes);
        self.render_lines(&mut pixmap, &layout.tick_marks);
        self.render_legend(&mut pixmap, layout);
        self.render_labels(&mut pixmap, &layout.labels);

        Ok(pixmap)
    }

    fn render_lines(&self, pixmap: &mut Pixmap, lines: &[Line]) {
        for line in lines {
            let mut path_builder = PathBuilder::new();
            path_builder.move_to(line.x1, line.y1);
            path_builder.line_to(line.x2, line.y2);

            if let Some(path) = path_builder.finish() {
                let mut paint = Paint::default();
                paint.set_color(line.color);
                paint.anti_alias = true;

                let stroke = Stroke {
                    width: line.width,
                    ..Stroke::default()
                };

                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
    }

    fn render_series(&self, pixmap: &mut Pixmap, series: &Series) {
        let mut paint = Paint::default();
        paint.set_color(series.color);
        paint.anti_alias = true;

        let stroke = Stroke {
            width: series.width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        for segment in &series.segments {
            let mut points = segment.iter();
            let Some(&(x0, y0)) = points.next() else {
                continue;
            };
            let mut path_builder = PathBuilder::new();
            path_builder.move_to(x0, y0);
            for &(x, y) in points {
                path_builder.line_to(x, y);
            }
            if let Some(path) = path_builder.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
    }

    fn render_legend(&mut self, pixmap: &mut Pixmap, layout: &PlotLayout) {
        let legend = &layout.legend;
        if let Some(rect) = to_skia_rect(legend.frame) {
            let mut fill = Paint::default();
            fill.set_color(legend.fill);
            pixmap.fill_rect(rect, &fill, Transform::identity(), None);

            let path = PathBuilder::from_rect(rect);
            let mut border = Paint::default();
            border.set_color(legend.border);
            let stroke = Stroke {
                width: 1.0,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &border, &stroke, Transform::identity(), None);
        }

        for entry in &legend.entries {
            self.render_lines(pixmap, std::slice::from_ref(&entry.swatch));
        }
        let texts: Vec<TextLabel> = legend.entries.iter().map(|e| e.text.clone()).collect();
        self.render_labels(pixmap, &texts);
    }

    fn render_labels(&mut self, pixmap: &mut Pixmap, labels: &[TextLabel]) {
        let Some(text) = self.text.as_ref() else {
            if !self.warned_missing_font && !labels.is_empty() {
                warn!("no font loaded; plot labels are skipped");
                self.warned_missing_font = true;
            }
            return;
        };

        for label in labels {
            let Some(glyphs) = text.rasterize(&label.text, label.size, label.color) else {
                continue;
            };
            let (w, h) = (glyphs.width() as f32, glyphs.height() as f32);
            // Extent of the placed box, which swaps axes for rotated text
            let (box_w, box_h) = if label.rotated { (h, w) } else { (w, h) };
            let left = match label.h_align {
                HAlign::Left => label.x,
                HAlign::Center => label.x - box_w / 2.0,
                HAlign::Right => label.x - box_w,
            };
            let top = match label.v_align {
                VAlign::Top => label.y,
                VAlign::Middle => label.y - box_h / 2.0,
                VAlign::Bottom => label.y - box_h,
            };

            let transform = if label.rotated {
                // Rotating by -90° maps (x, y) to (y, -x); shift back into the box
                Transform::from_rotate(-90.0).post_translate(left.round(), (top + box_h).round())
            } else {
                Transform::from_translate(left.round(), top.round())
            };

            pixmap.draw_pixmap(0, 0, glyphs.as_ref(), &PixmapPaint::default(), transform, None);
        }
    }

    /// Convert pixmap to the BGRA byte order GDI expects for 32-bit DIBs
    ///
    /// The plot background is opaque, so premultiplied and straight alpha
    /// agree and only the channel order needs swapping.
    pub fn pixmap_to_bgra(&self, pixmap: &Pixmap) -> Vec<u8> {
        let mut bytes = pixmap.data().to_vec();
        for pixel in bytes.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
        bytes
    }

    /// Get pixmap dimensions
    pub fn get_pixmap_size(&self, pixmap: &Pixmap) -> (u32, u32) {
        (pixmap.width(), pixmap.height())
    }
}

fn to_skia_rect(bounds: Bounds) -> Option<SkiaRect> {
    SkiaRect::from_ltrb(bounds.left, bounds.top, bounds.right, bounds.bottom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intensity::IntensityDomain;
    use crate::domain::model::{evaluate, EnergyModel};
    use tiny_skia::Color;

    fn reference_layout(width: u32, height: u32) -> PlotLayout {
        let domain = IntensityDomain::default();
        let curves = evaluate(&EnergyModel::new(1.0, 10.0, 200.0, 10.0), &domain);
        PlotLayout::from_curves(&curves, &domain, width, height, 1.0)
    }

    fn pixel_at(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let p = pixmap.pixel(x, y).unwrap();
        (p.red(), p.green(), p.blue(), p.alpha())
    }

    #[test]
    fn plot_renderer_creation() {
        let renderer = PlotRenderer::new(None);
        assert!(renderer.text.is_none());
    }

    #[test]
    fn render_simple_layout() {
        let mut renderer = PlotRenderer::new(None);
        let layout = reference_layout(600, 400);

        let pixmap = renderer.render_layout(&layout).unwrap();
        assert_eq!(renderer.get_pixmap_size(&pixmap), (600, 400));
        // Margins stay background white
        assert_eq!(pixel_at(&pixmap, 2, 2), (255, 255, 255, 255));
    }

    #[test]
    fn render_draws_curve_pixels() {
        let mut renderer = PlotRenderer::new(None);
        let layout = reference_layout(600, 400);
        let pixmap = renderer.render_layout(&layout).unwrap();

        // The flat roofline ceiling runs along the last samples
        let &(x, y) = layout.series[1].segments[0].iter().rev().nth(20).unwrap();
        let (r, g, b, _) = pixel_at(&pixmap, x as u32, y.round() as u32);
        assert!(r > g && g > b, "expected orange ceiling pixel, got ({r}, {g}, {b})");
    }

    #[test]
    fn render_is_deterministic() {
        let mut renderer = PlotRenderer::new(None);
        let layout = reference_layout(320, 240);
        let first = renderer.render_layout(&layout).unwrap();
        let second = renderer.render_layout(&layout).unwrap();
        assert_eq!(first.data(), second.data());
    }

    #[test]
    fn render_rejects_empty_canvas() {
        let mut renderer = PlotRenderer::new(None);
        let mut layout = reference_layout(320, 240);
        layout.canvas_width = 0.0;
        assert!(matches!(
            renderer.render_layout(&layout),
            Err(RendererError::InvalidCanvasDimensions { .. })
        ));
    }

    #[test]
    fn render_with_system_font_adds_ink() {
        let mut with_text = PlotRenderer::with_system_font();
        if with_text.text.is_none() {
            println!("Test skipped - no system font available");
            return;
        }
        let layout = reference_layout(600, 400);
        let labeled = with_text.render_layout(&layout).unwrap();
        let plain = PlotRenderer::new(None).render_layout(&layout).unwrap();
        assert_ne!(labeled.data(), plain.data());
    }

    #[test]
    fn pixmap_to_bgra_conversion() {
        let renderer = PlotRenderer::new(None);
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.fill(Color::from_rgba8(10, 20, 30, 255));

        let bgra = renderer.pixmap_to_bgra(&pixmap);
        assert_eq!(bgra.len(), 2 * 4);
        assert_eq!(&bgra[..4], &[30, 20, 10, 255]);
    }
}
