//! # Time-Series Graph Renderer
//!
//! Turns a numeric sample sequence and a value range into draw calls: one
//! smoothed polyline plus two range labels. The renderer holds no state between
//! calls; everything it draws goes through the [`Canvas`] capability so the same
//! code targets the LCD framebuffer, the ASCII development view and test
//! recorders.
//!
//! ## Coordinate mapping
//! For sample `i` of `n` inside a canvas of `w × h` with padding `p`:
//! ```text
//! x = p + (i / (n - 1)) * (w - 2p)
//! y = h - p - normalized * (h - 2p)      normalized = (v - min) / (max - min)
//! ```
//! The Y axis is inverted so larger values sit higher on screen. A degenerate
//! range (`min == max`) maps every sample to `normalized = 0.5`.
//!
//! ## Edge cases
//! - **Fewer than 2 samples**: nothing is drawn (a line needs two points)
//! - **Unlaid-out canvas**: a reported size of ≤ 1 in either dimension is replaced
//!   by [`FALLBACK_WIDTH`] / [`FALLBACK_HEIGHT`] so the first draw is still visible

use crate::Series;
use embedded_graphics::pixelcolor::Rgb565;
use tracing::trace;

/// Space reserved on every side of the plot.
pub const PADDING: f32 = 10.0;

/// Width used when the canvas has not been laid out yet.
pub const FALLBACK_WIDTH: u32 = 440;

/// Height used when the canvas has not been laid out yet.
pub const FALLBACK_HEIGHT: u32 = 180;

/// Curve segments generated per control point when smoothing.
pub const SMOOTH_SEGMENTS: usize = 8;

/// A point in canvas coordinates (origin top-left, Y down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Which corner of the text box sits at the given position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    BottomLeft,
}

/// The 2-D drawing capability a chart is rendered through.
pub trait Canvas {
    /// Current size in canvas units. May be `(0, 0)` or `(1, 1)` before layout.
    fn size(&self) -> (u32, u32);

    /// Draw a connected line through `points`. With `smooth` set the line is
    /// drawn as a curve through the same points.
    fn polyline(&mut self, points: &[PointF], color: Rgb565, smooth: bool);

    /// Draw a single line of text.
    fn text(&mut self, position: PointF, text: &str, color: Rgb565, anchor: Anchor);
}

/// Stateless line-chart renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphRenderer {
    padding: f32,
    fallback: (u32, u32),
}

impl Default for GraphRenderer {
    fn default() -> Self {
        Self {
            padding: PADDING,
            fallback: (FALLBACK_WIDTH, FALLBACK_HEIGHT),
        }
    }
}

impl GraphRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas size with the fallback substituted for degenerate dimensions.
    pub fn effective_size(&self, (width, height): (u32, u32)) -> (u32, u32) {
        let width = if width <= 1 { self.fallback.0 } else { width };
        let height = if height <= 1 { self.fallback.1 } else { height };
        (width, height)
    }

    /// Map samples to canvas points. Returns an empty vector for fewer than two
    /// samples.
    pub fn plot_points(
        &self,
        samples: &[f32],
        min: f32,
        max: f32,
        canvas_size: (u32, u32),
    ) -> Vec<PointF> {
        let n = samples.len();
        if n < 2 {
            return Vec::new();
        }

        let (width, height) = self.effective_size(canvas_size);
        let plot_width = width as f32 - 2.0 * self.padding;
        let plot_height = height as f32 - 2.0 * self.padding;
        let range = max - min;

        samples
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let x = self.padding + (i as f32 / (n - 1) as f32) * plot_width;
                let normalized = if range != 0.0 {
                    (value - min) / range
                } else {
                    0.5
                };
                let y = height as f32 - self.padding - normalized * plot_height;
                PointF::new(x, y)
            })
            .collect()
    }

    /// Draw `samples` scaled to `[min, max]` onto `canvas`.
    pub fn render<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        samples: &[f32],
        color: Rgb565,
        min: f32,
        max: f32,
    ) {
        let canvas_size = canvas.size();
        let points = self.plot_points(samples, min, max, canvas_size);
        if points.is_empty() {
            trace!("Skipping chart with {} samples", samples.len());
            return;
        }

        canvas.polyline(&points, color, true);

        let (_, height) = self.effective_size(canvas_size);
        canvas.text(
            PointF::new(2.0, 2.0),
            &round_label(max),
            color,
            Anchor::TopLeft,
        );
        canvas.text(
            PointF::new(2.0, height as f32 - 2.0),
            &round_label(min),
            color,
            Anchor::BottomLeft,
        );
    }

    /// Draw a [`Series`] using its declared render range.
    pub fn render_series<C: Canvas + ?Sized>(&self, canvas: &mut C, series: &Series, color: Rgb565) {
        self.render(canvas, &series.samples, color, series.min, series.max);
    }
}

/// Value rounded to the nearest integer, as shown on the chart.
fn round_label(value: f32) -> String {
    format!("{}", value.round() as i32)
}

/// Subdivide a polyline into a quadratic B-spline.
///
/// Interior points act as control points and the curve passes through the
/// midpoints between them. The first and last points are kept exactly.
pub fn smooth_points(points: &[PointF], segments: usize) -> Vec<PointF> {
    if points.len() < 3 || segments == 0 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut out = Vec::with_capacity(1 + (last - 1) * segments);
    out.push(points[0]);

    let mut start = points[0];
    for i in 1..last {
        let control = points[i];
        let end = if i == last - 1 {
            points[last]
        } else {
            midpoint(points[i], points[i + 1])
        };
        for step in 1..=segments {
            let t = step as f32 / segments as f32;
            let u = 1.0 - t;
            out.push(PointF::new(
                u * u * start.x + 2.0 * u * t * control.x + t * t * end.x,
                u * u * start.y + 2.0 * u * t * control.y + t * t * end.y,
            ));
        }
        start = end;
    }
    out
}

fn midpoint(a: PointF, b: PointF) -> PointF {
    PointF::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use embedded_graphics::prelude::RgbColor;

    /// Draw call captured by [`RecordingCanvas`].
    #[derive(Clone, Debug, PartialEq)]
    pub enum DrawCall {
        Polyline {
            points: Vec<PointF>,
            color: Rgb565,
            smooth: bool,
        },
        Text {
            position: PointF,
            text: String,
            color: Rgb565,
            anchor: Anchor,
        },
    }

    /// Canvas that records every call for inspection.
    pub struct RecordingCanvas {
        pub size: (u32, u32),
        pub calls: Vec<DrawCall>,
    }

    impl RecordingCanvas {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                calls: Vec::new(),
            }
        }
    }

    impl Canvas for RecordingCanvas {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn polyline(&mut self, points: &[PointF], color: Rgb565, smooth: bool) {
            self.calls.push(DrawCall::Polyline {
                points: points.to_vec(),
                color,
                smooth,
            });
        }

        fn text(&mut self, position: PointF, text: &str, color: Rgb565, anchor: Anchor) {
            self.calls.push(DrawCall::Text {
                position,
                text: text.to_string(),
                color,
                anchor,
            });
        }
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_plot_points_maps_range_to_padded_area() {
        let renderer = GraphRenderer::new();
        let points = renderer.plot_points(&[0.0, 50.0, 100.0], 0.0, 100.0, (100, 100));

        assert_eq!(points.len(), 3);
        let ys: Vec<f32> = points.iter().map(|p| p.y).collect();
        let xs: Vec<f32> = points.iter().map(|p| p.x).collect();
        for (actual, expected) in ys.iter().zip([90.0, 50.0, 10.0]) {
            assert_close(*actual, expected);
        }
        for (actual, expected) in xs.iter().zip([10.0, 50.0, 90.0]) {
            assert_close(*actual, expected);
        }
    }

    #[test]
    fn test_degenerate_range_draws_mid_line() {
        let renderer = GraphRenderer::new();
        let points = renderer.plot_points(&[5.0, 5.0, 5.0], 5.0, 5.0, (100, 100));
        assert_eq!(points.len(), 3);
        for p in points {
            assert!(p.y.is_finite());
            assert_close(p.y, 50.0);
        }
    }

    #[test]
    fn test_short_series_draws_nothing() {
        let renderer = GraphRenderer::new();
        for samples in [&[][..], &[42.0][..]] {
            let mut canvas = RecordingCanvas::new(100, 100);
            renderer.render(&mut canvas, samples, Rgb565::RED, 0.0, 100.0);
            assert!(canvas.calls.is_empty());
        }
    }

    #[test]
    fn test_render_emits_polyline_and_labels() {
        let renderer = GraphRenderer::new();
        let mut canvas = RecordingCanvas::new(100, 100);
        renderer.render(&mut canvas, &[0.0, 50.0, 100.0], Rgb565::CYAN, -0.4, 99.6);

        assert_eq!(canvas.calls.len(), 3);
        match &canvas.calls[0] {
            DrawCall::Polyline { points, color, smooth } => {
                assert_eq!(points.len(), 3);
                assert_eq!(*color, Rgb565::CYAN);
                assert!(*smooth);
            }
            other => panic!("expected polyline, got {other:?}"),
        }
        match &canvas.calls[1] {
            DrawCall::Text { text, anchor, color, .. } => {
                assert_eq!(text, "100");
                assert_eq!(*anchor, Anchor::TopLeft);
                assert_eq!(*color, Rgb565::CYAN);
            }
            other => panic!("expected max label, got {other:?}"),
        }
        match &canvas.calls[2] {
            DrawCall::Text { text, anchor, position, .. } => {
                assert_eq!(text, "0");
                assert_eq!(*anchor, Anchor::BottomLeft);
                assert_close(position.y, 98.0);
            }
            other => panic!("expected min label, got {other:?}"),
        }
    }

    #[test]
    fn test_unlaid_out_canvas_uses_fallback_size() {
        let renderer = GraphRenderer::new();
        let points = renderer.plot_points(&[0.0, 1.0], 0.0, 1.0, (1, 0));
        assert_close(points[0].x, PADDING);
        assert_close(points[1].x, FALLBACK_WIDTH as f32 - PADDING);
        assert_close(points[0].y, FALLBACK_HEIGHT as f32 - PADDING);
        assert_close(points[1].y, PADDING);
    }

    #[test]
    fn test_render_series_uses_declared_range() {
        let renderer = GraphRenderer::new();
        let mut canvas = RecordingCanvas::new(100, 100);
        let series = Series::new(vec![10.0, 20.0], 0.0, 40.0);
        renderer.render_series(&mut canvas, &series, Rgb565::WHITE);

        match &canvas.calls[0] {
            DrawCall::Polyline { points, .. } => {
                assert_close(points[0].y, 70.0);
                assert_close(points[1].y, 50.0);
            }
            other => panic!("expected polyline, got {other:?}"),
        }
    }

    #[test]
    fn test_smoothing_keeps_endpoints() {
        let points = [
            PointF::new(0.0, 0.0),
            PointF::new(10.0, 10.0),
            PointF::new(20.0, 0.0),
            PointF::new(30.0, 10.0),
        ];
        let smooth = smooth_points(&points, 4);
        assert_eq!(smooth.first(), Some(&points[0]));
        let last = smooth.last().unwrap();
        assert_close(last.x, 30.0);
        assert_close(last.y, 10.0);
        assert_eq!(smooth.len(), 1 + 2 * 4);
    }

    #[test]
    fn test_smoothing_passes_two_points_through() {
        let points = [PointF::new(0.0, 0.0), PointF::new(5.0, 5.0)];
        assert_eq!(smooth_points(&points, 8), points.to_vec());
    }
}
