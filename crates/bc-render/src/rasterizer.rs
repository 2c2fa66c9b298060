use bc_core::config::RenderConfig;
use bc_core::frame::GrayCanvas;
use rayon::prelude::*;

use crate::error::RenderError;

/// Paramètres géométriques du tracé, dérivés de [`RenderConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotStyle {
    /// Canvas width in pixels.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
    /// Plot area left edge, fraction of the width.
    pub plot_left: f32,
    /// Plot area right edge, fraction of the width.
    pub plot_right: f32,
    /// Plot area bottom edge, fraction of the height (from the bottom).
    pub plot_bottom: f32,
    /// Plot area top edge, fraction of the height (from the bottom).
    pub plot_top: f32,
    /// Fraction of the data span added on each side of both axes.
    pub data_margin: f32,
    /// Stroke width in pixels.
    pub line_width: f32,
    /// Stroke luminance.
    pub line_luminance: u8,
    /// Background luminance.
    pub background: u8,
}

impl From<&RenderConfig> for PlotStyle {
    fn from(c: &RenderConfig) -> Self {
        Self {
            canvas_width: c.canvas_width,
            canvas_height: c.canvas_height,
            plot_left: c.plot_left,
            plot_right: c.plot_right,
            plot_bottom: c.plot_bottom,
            plot_top: c.plot_top,
            data_margin: c.data_margin,
            line_width: c.line_width,
            line_luminance: c.line_luminance,
            background: c.background,
        }
    }
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

/// Segment projeté en coordonnées pixel, avec sa boîte englobante.
#[derive(Clone, Copy, Debug)]
struct Segment {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    xmin: f32,
    xmax: f32,
    ymin: f32,
    ymax: f32,
}

impl Segment {
    fn new((x0, y0): (f32, f32), (x1, y1): (f32, f32)) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            xmin: x0.min(x1),
            xmax: x0.max(x1),
            ymin: y0.min(y1),
            ymax: y0.max(y1),
        }
    }

    /// Distance euclidienne du point (px, py) au segment.
    #[inline]
    fn distance(&self, px: f32, py: f32) -> f32 {
        let (dx, dy) = (self.x1 - self.x0, self.y1 - self.y0);
        let len2 = dx * dx + dy * dy;
        let t = if len2 > f32::EPSILON {
            (((px - self.x0) * dx + (py - self.y0) * dy) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (cx, cy) = (self.x0 + t * dx, self.y0 + t * dy);
        ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
    }
}

/// Trace une série d'amplitudes en ligne anti-aliasée sur fond uni, sans axes.
///
/// Les x sont les indices d'échantillons, les y les amplitudes ; les deux axes
/// sont mis à l'échelle sur la zone de tracé avec une marge relative.
pub struct LineRasterizer {
    style: PlotStyle,
}

impl LineRasterizer {
    /// Crée un rasterizer.
    ///
    /// # Errors
    /// Returns [`RenderError::InvalidDimensions`] if the canvas or plot area is degenerate.
    pub fn new(style: PlotStyle) -> Result<Self, RenderError> {
        let area_ok = style.plot_left < style.plot_right && style.plot_bottom < style.plot_top;
        if style.canvas_width < 2 || style.canvas_height < 2 || !area_ok {
            return Err(RenderError::InvalidDimensions {
                width: style.canvas_width,
                height: style.canvas_height,
            });
        }
        Ok(Self { style })
    }

    /// Style courant.
    #[must_use]
    pub fn style(&self) -> &PlotStyle {
        &self.style
    }

    /// Trace `samples` et renvoie le canvas pleine résolution.
    ///
    /// Non-finite samples break the line. An empty slice yields a blank canvas.
    ///
    /// # Example
    /// ```
    /// use bc_render::rasterizer::{LineRasterizer, PlotStyle};
    /// let r = LineRasterizer::new(PlotStyle::default()).unwrap();
    /// let canvas = r.plot(&[0.0, 1.0, 0.0]);
    /// assert_eq!((canvas.width, canvas.height), (800, 600));
    /// assert!(canvas.data.iter().any(|&v| v < 255));
    /// ```
    #[must_use]
    pub fn plot(&self, samples: &[f32]) -> GrayCanvas {
        let s = &self.style;
        let mut canvas = GrayCanvas::new(s.canvas_width, s.canvas_height, s.background);
        let segments = self.segments(samples);
        if segments.is_empty() {
            return canvas;
        }

        let width = s.canvas_width as usize;
        let reach = s.line_width * 0.5 + 0.5;
        let bg = f32::from(s.background);
        let delta = f32::from(s.line_luminance) - bg;
        let background = i32::from(s.background);

        canvas
            .data
            .par_chunks_exact_mut(width)
            .enumerate()
            .for_each(|(py, row)| {
                let cy = py as f32 + 0.5;
                for seg in &segments {
                    if cy < seg.ymin - reach || cy > seg.ymax + reach {
                        continue;
                    }
                    let x_lo = (seg.xmin - reach).floor().max(0.0) as usize;
                    let x_hi = ((seg.xmax + reach).ceil().max(0.0) as usize).min(width);
                    for (px, pixel) in row.iter_mut().enumerate().take(x_hi).skip(x_lo) {
                        let coverage = (reach - seg.distance(px as f32 + 0.5, cy)).clamp(0.0, 1.0);
                        if coverage <= 0.0 {
                            continue;
                        }
                        let v = (bg + delta * coverage).round().clamp(0.0, 255.0) as u8;
                        // Overlapping segments: strongest contrast wins.
                        if (i32::from(v) - background).abs() > (i32::from(*pixel) - background).abs() {
                            *pixel = v;
                        }
                    }
                }
            });
        canvas
    }

    /// Projette les échantillons et relie les paires consécutives finies.
    fn segments(&self, samples: &[f32]) -> Vec<Segment> {
        let s = &self.style;
        let (w, h) = (s.canvas_width as f32, s.canvas_height as f32);
        let (left, right) = (s.plot_left * w, s.plot_right * w);
        let (top, bottom) = ((1.0 - s.plot_top) * h, (1.0 - s.plot_bottom) * h);
        let mid_y = (top + bottom) * 0.5;

        let (lo, hi) = samples
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if lo > hi {
            return Vec::new();
        }

        if samples.len() == 1 {
            return vec![Segment::new((left, mid_y), (right, mid_y))];
        }

        let span_x = (samples.len() - 1) as f32;
        let (x_lo, x_hi) = (-s.data_margin * span_x, span_x * (1.0 + s.data_margin));
        let span_y = hi - lo;
        let (y_lo, y_hi) = (lo - s.data_margin * span_y, hi + s.data_margin * span_y);

        let project = |i: usize, v: f32| -> (f32, f32) {
            let px = left + (i as f32 - x_lo) / (x_hi - x_lo) * (right - left);
            let py = if span_y > 0.0 {
                bottom - (v - y_lo) / (y_hi - y_lo) * (bottom - top)
            } else {
                mid_y
            };
            (px, py)
        };

        samples
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0].is_finite() && pair[1].is_finite())
            .map(|(i, pair)| Segment::new(project(i, pair[0]), project(i + 1, pair[1])))
            .collect()
    }
}
