//! Plot layout for the roofline chart
//!
//! Turns evaluated curves into pure geometry: axis ranges, ticks, gridlines,
//! polylines, legend and text placements. Nothing here touches a pixmap, so
//! layout decisions can be tested without a font or a window.

use tiny_skia::Color;

use crate::domain::intensity::IntensityDomain;
use crate::domain::model::Curves;

pub const X_AXIS_LABEL: &str = "Operational Intensity (flop/byte)";
pub const Y_AXIS_LABEL: &str = "Energy Efficiency (flop/joule)";
pub const EFFICIENCY_LABEL: &str = "Energy efficiency";
pub const ROOFLINE_LABEL: &str = "E_senv";

/// Fraction of the data span added on each side of an axis
const AXIS_MARGIN: f64 = 0.05;
/// Number of ticks the tick picker aims for
const TARGET_TICKS: f64 = 6.0;

/// Candidate legend positions as (horizontal, vertical) fractions of the free
/// space in the plot area, in preference order
const LEGEND_ANCHORS: [(f32, f32); 9] = [
    (1.0, 0.0),
    (0.0, 0.0),
    (0.0, 1.0),
    (1.0, 1.0),
    (0.0, 0.5),
    (1.0, 0.5),
    (0.5, 1.0),
    (0.5, 0.0),
    (0.5, 0.5),
];

pub fn efficiency_color() -> Color {
    Color::from_rgba8(0x1f, 0x77, 0xb4, 0xff)
}

pub fn roofline_color() -> Color {
    Color::from_rgba8(0xff, 0x7f, 0x0e, 0xff)
}

fn grid_color() -> Color {
    Color::from_rgba8(0xb0, 0xb0, 0xb0, 0xff)
}

fn ink_color() -> Color {
    Color::BLACK
}

/// A single stroked segment
#[derive(Debug, Clone)]
pub struct Line {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// Text anchored at `(x, y)`
///
/// When `rotated` is set the text runs bottom-to-top and the alignment refers
/// to the rotated box.
#[derive(Debug, Clone)]
pub struct TextLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: Color,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub rotated: bool,
}

/// Axis-aligned box in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// One plotted curve, split into polylines wherever values are not finite
#[derive(Debug, Clone)]
pub struct Series {
    pub label: &'static str,
    pub color: Color,
    pub width: f32,
    pub segments: Vec<Vec<(f32, f32)>>,
}

#[derive(Debug, Clone)]
pub struct LegendEntry {
    pub swatch: Line,
    pub text: TextLabel,
}

#[derive(Debug, Clone)]
pub struct Legend {
    pub frame: Bounds,
    pub border: Color,
    pub fill: Color,
    pub entries: Vec<LegendEntry>,
}

/// Data range shown along one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    /// Fits the range to `[lo, hi]` with a margin on both sides
    ///
    /// A degenerate span is widened around its value so the axis never
    /// collapses to zero length.
    pub fn autoscale(lo: f64, hi: f64) -> Self {
        let span = hi - lo;
        if !span.is_finite() || span <= f64::EPSILON * lo.abs().max(1.0) {
            let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
            return Self {
                min: lo - pad,
                max: lo + pad,
            };
        }
        Self {
            min: lo - span * AXIS_MARGIN,
            max: hi + span * AXIS_MARGIN,
        }
    }

    /// Autoscales to the finite values of all `series`
    pub fn from_values<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> Self {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for values in series {
            for value in values.iter().copied().filter(|v| v.is_finite()) {
                lo = lo.min(value);
                hi = hi.max(value);
            }
        }
        if lo > hi {
            return Self { min: 0.0, max: 1.0 };
        }
        Self::autoscale(lo, hi)
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Evenly spaced tick values on "nice" steps of 1, 2, 2.5 or 5 × 10ᵏ
    pub fn ticks(&self) -> Vec<f64> {
        let step = nice_step(self.span() / TARGET_TICKS);
        let first = (self.min / step).ceil() * step;
        let tolerance = step * 1e-9;
        let mut ticks = Vec::new();
        let mut index = 0;
        loop {
            let value = first + step * index as f64;
            if value > self.max + tolerance || index > 100 {
                break;
            }
            ticks.push(if value.abs() < tolerance { 0.0 } else { value });
            index += 1;
        }
        ticks
    }

    /// Step between consecutive ticks
    pub fn tick_step(&self) -> f64 {
        nice_step(self.span() / TARGET_TICKS)
    }
}

fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|candidate| *candidate >= normalized - 1e-9)
        .unwrap_or(10.0);
    nice * magnitude
}

/// Formats a tick value with just enough decimals to distinguish steps
pub fn format_tick(value: f64, step: f64) -> String {
    let decimals = (0..=8)
        .find(|d| {
            let scaled = step * 10f64.powi(*d);
            (scaled - scaled.round()).abs() < 1e-6 * scaled.abs().max(1.0)
        })
        .unwrap_or(8) as usize;
    format!("{:.*}", decimals, value)
}

/// Rough width of a label before a font is available
fn estimated_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.55
}

/// Pre-calculated plot geometry
///
/// Separates layout from rasterization: the renderer only strokes, fills and
/// places text exactly where this says.
#[derive(Debug, Clone)]
pub struct PlotLayout {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub background: Color,
    pub plot_area: Bounds,
    pub x_range: AxisRange,
    pub y_range: AxisRange,
    pub gridlines: Vec<Line>,
    pub axes: Vec<Line>,
    pub tick_marks: Vec<Line>,
    pub labels: Vec<TextLabel>,
    pub series: Vec<Series>,
    pub legend: Legend,
}

impl PlotLayout {
    /// Lays out both curves over `domain` on a `width` × `height` canvas
    pub fn from_curves(
        curves: &Curves,
        domain: &IntensityDomain,
        width: u32,
        height: u32,
        dpi_scale: f32,
    ) -> Self {
        let scale = dpi_scale.max(0.5);
        let canvas_width = width as f32;
        let canvas_height = height as f32;

        let plot_area = Bounds {
            left: (72.0 * scale).min(canvas_width * 0.5),
            top: (14.0 * scale).min(canvas_height * 0.25),
            right: (canvas_width - 18.0 * scale).max(canvas_width * 0.5),
            bottom: (canvas_height - 52.0 * scale).max(canvas_height * 0.75),
        };

        let x_range = AxisRange::autoscale(domain.start(), domain.end());
        let y_range = AxisRange::from_values([curves.efficiency.as_slice(), curves.roofline.as_slice()]);

        let mut layout = Self {
            canvas_width,
            canvas_height,
            background: Color::WHITE,
            plot_area,
            x_range,
            y_range,
            gridlines: Vec::new(),
            axes: Vec::new(),
            tick_marks: Vec::new(),
            labels: Vec::new(),
            series: Vec::new(),
            legend: Legend {
                frame: plot_area,
                border: Color::from_rgba8(0xcc, 0xcc, 0xcc, 0xff),
                fill: Color::from_rgba8(0xff, 0xff, 0xff, 0xcc),
                entries: Vec::new(),
            },
        };

        layout.calculate_axes(scale);
        layout.calculate_ticks(scale);
        layout.calculate_axis_labels(scale);
        layout.push_series(EFFICIENCY_LABEL, efficiency_color(), domain.samples(), &curves.efficiency, scale);
        layout.push_series(ROOFLINE_LABEL, roofline_color(), domain.samples(), &curves.roofline, scale);
        layout.calculate_legend(scale);

        layout
    }

    /// Canvas x coordinate of data value `x`
    pub fn map_x(&self, x: f64) -> f32 {
        let t = (x - self.x_range.min) / self.x_range.span();
        self.plot_area.left + (t as f32) * self.plot_area.width()
    }

    /// Canvas y coordinate of data value `y`
    pub fn map_y(&self, y: f64) -> f32 {
        let t = (y - self.y_range.min) / self.y_range.span();
        self.plot_area.bottom - (t as f32) * self.plot_area.height()
    }

    fn calculate_axes(&mut self, scale: f32) {
        let width = (0.8 * scale).max(1.0);
        let area = self.plot_area;
        let edge = |x1, y1, x2, y2| Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color: ink_color(),
        };
        self.axes = vec![
            edge(area.left, area.top, area.right, area.top),
            edge(area.right, area.top, area.right, area.bottom),
            edge(area.left, area.bottom, area.right, area.bottom),
            edge(area.left, area.top, area.left, area.bottom),
        ];
    }

    fn calculate_ticks(&mut self, scale: f32) {
        let grid_width = (0.8 * scale).max(1.0);
        let tick_length = 3.5 * scale;
        let font_size = 10.0 * scale;
        let area = self.plot_area;

        let x_step = self.x_range.tick_step();
        for value in self.x_range.ticks() {
            let x = self.map_x(value);
            if x < area.left - 0.5 || x > area.right + 0.5 {
                continue;
            }
            self.gridlines.push(Line {
                x1: x,
                y1: area.top,
                x2: x,
                y2: area.bottom,
                width: grid_width,
                color: grid_color(),
            });
            self.tick_marks.push(Line {
                x1: x,
                y1: area.bottom,
                x2: x,
                y2: area.bottom + tick_length,
                width: grid_width,
                color: ink_color(),
            });
            self.labels.push(TextLabel {
                text: format_tick(value, x_step),
                x,
                y: area.bottom + tick_length + 2.0 * scale,
                size: font_size,
                color: ink_color(),
                h_align: HAlign::Center,
                v_align: VAlign::Top,
                rotated: false,
            });
        }

        let y_step = self.y_range.tick_step();
        for value in self.y_range.ticks() {
            let y = self.map_y(value);
            if y < area.top - 0.5 || y > area.bottom + 0.5 {
                continue;
            }
            self.gridlines.push(Line {
                x1: area.left,
                y1: y,
                x2: area.right,
                y2: y,
                width: grid_width,
                color: grid_color(),
            });
            self.tick_marks.push(Line {
                x1: area.left - tick_length,
                y1: y,
                x2: area.left,
                y2: y,
                width: grid_width,
                color: ink_color(),
            });
            self.labels.push(TextLabel {
                text: format_tick(value, y_step),
                x: area.left - tick_length - 2.0 * scale,
                y,
                size: font_size,
                color: ink_color(),
                h_align: HAlign::Right,
                v_align: VAlign::Middle,
                rotated: false,
            });
        }
    }

    fn calculate_axis_labels(&mut self, scale: f32) {
        let area = self.plot_area;
        let font_size = 11.0 * scale;

        self.labels.push(TextLabel {
            text: X_AXIS_LABEL.to_string(),
            x: (area.left + area.right) / 2.0,
            y: self.canvas_height - 6.0 * scale,
            size: font_size,
            color: ink_color(),
            h_align: HAlign::Center,
            v_align: VAlign::Bottom,
            rotated: false,
        });
        self.labels.push(TextLabel {
            text: Y_AXIS_LABEL.to_string(),
            x: 6.0 * scale,
            y: (area.top + area.bottom) / 2.0,
            size: font_size,
            color: ink_color(),
            h_align: HAlign::Left,
            v_align: VAlign::Middle,
            rotated: true,
        });
    }

    fn push_series(
        &mut self,
        label: &'static str,
        color: Color,
        xs: &[f64],
        ys: &[f64],
        scale: f32,
    ) {
        let mut segments = Vec::new();
        let mut current: Vec<(f32, f32)> = Vec::new();

        for (&x, &y) in xs.iter().zip(ys) {
            let px = self.map_x(x);
            let py = self.map_y(y);
            if y.is_finite() && px.is_finite() && py.is_finite() {
                current.push((px, py));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments.retain(|segment| segment.len() >= 2);

        self.series.push(Series {
            label,
            color,
            width: 1.5 * scale,
            segments,
        });
    }

    fn calculate_legend(&mut self, scale: f32) {
        let font_size = 10.0 * scale;
        let padding = 6.0 * scale;
        let swatch_length = 24.0 * scale;
        let gap = 6.0 * scale;
        let row_height = font_size * 1.6;
        let inset = 8.0 * scale;

        let text_width = self
            .series
            .iter()
            .map(|series| estimated_text_width(series.label, font_size))
            .fold(0.0f32, f32::max);

        let width = padding * 2.0 + swatch_length + gap + text_width;
        let height = padding * 2.0 + row_height * self.series.len() as f32;
        let frame = self.least_occupied_frame(width, height, inset);

        let entries = self
            .series
            .iter()
            .enumerate()
            .map(|(row, series)| {
                let center_y = frame.top + padding + row_height * (row as f32 + 0.5);
                let swatch_left = frame.left + padding;
                LegendEntry {
                    swatch: Line {
                        x1: swatch_left,
                        y1: center_y,
                        x2: swatch_left + swatch_length,
                        y2: center_y,
                        width: series.width,
                        color: series.color,
                    },
                    text: TextLabel {
                        text: series.label.to_string(),
                        x: swatch_left + swatch_length + gap,
                        y: center_y,
                        size: font_size,
                        color: ink_color(),
                        h_align: HAlign::Left,
                        v_align: VAlign::Middle,
                        rotated: false,
                    },
                }
            })
            .collect();

        self.legend.frame = frame;
        self.legend.entries = entries;
    }

    /// Legend frame at the anchor covering the fewest curve points
    ///
    /// Ties go to the earlier anchor in `LEGEND_ANCHORS`.
    fn least_occupied_frame(&self, width: f32, height: f32, inset: f32) -> Bounds {
        let area = self.plot_area;
        let frame_at = |(h, v): (f32, f32)| {
            let left = area.left + inset + (area.width() - 2.0 * inset - width).max(0.0) * h;
            let top = area.top + inset + (area.height() - 2.0 * inset - height).max(0.0) * v;
            Bounds {
                left,
                top,
                right: (left + width).min(area.right),
                bottom: (top + height).min(area.bottom),
            }
        };
        let covered = |frame: &Bounds| {
            self.series
                .iter()
                .flat_map(|series| series.segments.iter().flatten())
                .filter(|&&(x, y)| frame.contains(x, y))
                .count()
        };

        LEGEND_ANCHORS
            .iter()
            .map(|&anchor| frame_at(anchor))
            .min_by_key(covered)
            .unwrap_or(area)
    }
}
