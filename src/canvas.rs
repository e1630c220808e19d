//! [`Canvas`] implementations used by the panel.
//!
//! - [`EgCanvas`]: a rectangular region of any `embedded-graphics` RGB565 draw
//!   target (the LCD framebuffer, or `MockDisplay` in tests)
//! - [`TextCanvas`]: a character grid for the `--stdout` development mode

use crate::graph::{smooth_points, Anchor, Canvas, PointF, SMOOTH_SEGMENTS};
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Polyline, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

/// Stroke width of chart lines on the LCD.
const LINE_WIDTH: u32 = 2;

/// A chart area carved out of an `embedded-graphics` draw target.
///
/// Coordinates passed to the canvas are relative to the top-left of `area`
/// and drawing is clipped to it.
pub struct EgCanvas<'a, D> {
    target: &'a mut D,
    area: Rectangle,
}

impl<'a, D> EgCanvas<'a, D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: &'a mut D, area: Rectangle) -> Self {
        Self { target, area }
    }
}

impl<D> Canvas for EgCanvas<'_, D>
where
    D: DrawTarget<Color = Rgb565>,
{
    fn size(&self) -> (u32, u32) {
        (self.area.size.width, self.area.size.height)
    }

    fn polyline(&mut self, points: &[PointF], color: Rgb565, smooth: bool) {
        let curve = if smooth {
            smooth_points(points, SMOOTH_SEGMENTS)
        } else {
            points.to_vec()
        };
        let vertices: Vec<Point> = curve
            .iter()
            .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
            .collect();

        let mut cropped = self.target.cropped(&self.area);
        Polyline::new(&vertices)
            .into_styled(PrimitiveStyle::with_stroke(color, LINE_WIDTH))
            .draw(&mut cropped)
            .ok();
    }

    fn text(&mut self, position: PointF, text: &str, color: Rgb565, anchor: Anchor) {
        let baseline = match anchor {
            Anchor::TopLeft => Baseline::Top,
            Anchor::BottomLeft => Baseline::Bottom,
        };
        let style = MonoTextStyle::new(&FONT_6X10, color);
        let origin = Point::new(position.x.round() as i32, position.y.round() as i32);

        let mut cropped = self.target.cropped(&self.area);
        Text::with_baseline(text, origin, style, baseline)
            .draw(&mut cropped)
            .ok();
    }
}

/// Character-grid canvas for terminal output.
///
/// Each cell stands for `cell_width × cell_height` canvas units so the chart
/// keeps the proportions it has on the LCD.
pub struct TextCanvas {
    cols: usize,
    rows: usize,
    cell_width: f32,
    cell_height: f32,
    grid: Vec<Vec<char>>,
}

impl TextCanvas {
    pub fn new(cols: usize, rows: usize, cell_width: f32, cell_height: f32) -> Self {
        Self {
            cols,
            rows,
            cell_width,
            cell_height,
            grid: vec![vec![' '; cols]; rows],
        }
    }

    fn cell(&self, p: PointF) -> Option<(usize, usize)> {
        let col = (p.x / self.cell_width).floor();
        let row = (p.y / self.cell_height).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        (col < self.cols && row < self.rows).then_some((col, row))
    }

    fn plot(&mut self, p: PointF, ch: char) {
        if let Some((col, row)) = self.cell(p) {
            self.grid[row][col] = ch;
        }
    }

    /// The grid as newline-separated rows with trailing spaces trimmed.
    pub fn render(&self) -> String {
        self.grid
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Canvas for TextCanvas {
    fn size(&self) -> (u32, u32) {
        (
            (self.cols as f32 * self.cell_width) as u32,
            (self.rows as f32 * self.cell_height) as u32,
        )
    }

    fn polyline(&mut self, points: &[PointF], _color: Rgb565, smooth: bool) {
        let curve = if smooth {
            smooth_points(points, SMOOTH_SEGMENTS)
        } else {
            points.to_vec()
        };

        for segment in curve.windows(2) {
            let (a, b) = (segment[0], segment[1]);
            // Sample at half-cell steps so no cell along the segment is skipped
            let dx = (b.x - a.x) / self.cell_width;
            let dy = (b.y - a.y) / self.cell_height;
            let steps = (dx.abs().max(dy.abs()) * 2.0).ceil().max(1.0) as usize;
            for step in 0..=steps {
                let t = step as f32 / steps as f32;
                self.plot(PointF::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t), '•');
            }
        }
    }

    fn text(&mut self, position: PointF, text: &str, _color: Rgb565, anchor: Anchor) {
        let y = match anchor {
            Anchor::TopLeft => position.y,
            // Text sits in the cell just above the anchor point
            Anchor::BottomLeft => position.y - 1.0,
        };
        for (i, ch) in text.chars().enumerate() {
            let x = position.x + i as f32 * self.cell_width;
            self.plot(PointF::new(x, y.max(0.0)), ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphRenderer;
    use embedded_graphics::mock_display::MockDisplay;

    #[test]
    fn test_eg_canvas_reports_area_size() {
        let mut display = MockDisplay::<Rgb565>::new();
        let canvas = EgCanvas::new(&mut display, Rectangle::new(Point::new(4, 4), Size::new(50, 40)));
        assert_eq!(canvas.size(), (50, 40));
    }

    #[test]
    fn test_eg_canvas_draws_chart_inside_area() {
        let mut display = MockDisplay::<Rgb565>::new();
        display.set_allow_overdraw(true);
        let area = Rectangle::new(Point::new(0, 0), Size::new(64, 64));
        {
            let mut canvas = EgCanvas::new(&mut display, area);
            GraphRenderer::new().render(&mut canvas, &[1.0, 3.0, 2.0, 5.0], Rgb565::GREEN, 1.0, 5.0);
        }

        let bbox = display.affected_area();
        assert!(bbox.size.width > 0, "chart should draw pixels");
        assert!(area.contains(bbox.top_left));
        assert!(area.contains(bbox.bottom_right().unwrap()));
    }

    #[test]
    fn test_text_canvas_draws_line_and_labels() {
        let mut canvas = TextCanvas::new(40, 12, 6.0, 10.0);
        GraphRenderer::new().render(&mut canvas, &[0.0, 10.0, 20.0], Rgb565::WHITE, 0.0, 20.0);
        let out = canvas.render();

        assert!(out.lines().next().unwrap().starts_with("20"));
        assert!(out.lines().last().unwrap().starts_with('0'));
        assert!(out.contains('•'));
    }

    #[test]
    fn test_text_canvas_ignores_points_outside_grid() {
        let mut canvas = TextCanvas::new(4, 2, 1.0, 1.0);
        canvas.polyline(
            &[PointF::new(-5.0, -5.0), PointF::new(50.0, 50.0)],
            Rgb565::WHITE,
            false,
        );
        assert_eq!(canvas.render().lines().count(), 2);
    }
}
