//! # Page Rendering
//!
//! This module lays out the panel's pages on the 480×320 LCD and provides an
//! ASCII report for development on a desktop.
//!
//! ## Layout
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Location                  date and clock │  header (0..40)
//! ├──────────────────────────────────────────┤
//! │                                          │
//! │           page body (40..296)            │
//! │                                          │
//! ├──────────────────────────────────────────┤
//! │                 ● ○ ○ ○                  │  page indicators
//! └──────────────────────────────────────────┘
//! ```
//!
//! The clock is redrawn every second on its own ([`draw_clock`]); the rest of
//! the page is redrawn only when the dashboard asks for it.

use crate::canvas::{EgCanvas, TextCanvas};
use crate::dashboard::{DataStatus, Dashboard};
use crate::graph::GraphRenderer;
use crate::pages::{ChartKind, PageKind};
use crate::wmo::{self, Icon};
use crate::{Series, WeatherSnapshot};
use chrono::{DateTime, Local};
use embedded_graphics::{
    mono_font::{
        iso_8859_1::{FONT_10X20, FONT_6X10, FONT_7X13_BOLD},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Circle, Line, Polyline, PrimitiveStyle, Rectangle, RoundedRectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use std::fmt::Write as _;

const BACKGROUND: Rgb565 = Rgb565::BLACK;
const FOREGROUND: Rgb565 = Rgb565::WHITE;
const DIM: Rgb565 = Rgb565::new(12, 24, 12);
const SUN: Rgb565 = Rgb565::YELLOW;
const CLOUD: Rgb565 = Rgb565::new(22, 44, 22);
const RAIN: Rgb565 = Rgb565::new(8, 40, 31);
const STALE: Rgb565 = Rgb565::RED;
const TEMPERATURE_LINE: Rgb565 = Rgb565::new(31, 40, 0);
const HUMIDITY_LINE: Rgb565 = Rgb565::CYAN;

const HEADER_HEIGHT: u32 = 40;
const FOOTER_HEIGHT: u32 = 24;

/// Format a temperature the way the pages show it ("21°C").
pub fn format_temp(celsius: f32) -> String {
    format!("{}°C", celsius.round() as i32)
}

/// Short high/low pair for forecast columns ("24°/13°").
pub fn format_high_low(high: f32, low: f32) -> String {
    format!("{}°/{}°", high.round() as i32, low.round() as i32)
}

/// Clock line shown in the header.
pub fn format_clock(now: &DateTime<Local>) -> String {
    now.format("%A, %B %d  %H:%M:%S").to_string()
}

/// Line color and title for a chart page.
fn chart_style(kind: ChartKind) -> (Rgb565, &'static str) {
    match kind {
        ChartKind::Temperature => (TEMPERATURE_LINE, "Temperature, next 24 h (°C)"),
        ChartKind::Humidity => (HUMIDITY_LINE, "Humidity, next 24 h (%)"),
    }
}

fn chart_series(snapshot: &WeatherSnapshot, kind: ChartKind) -> &Series {
    match kind {
        ChartKind::Temperature => &snapshot.hourly_temperature,
        ChartKind::Humidity => &snapshot.hourly_humidity,
    }
}

fn text<D>(target: &mut D, s: &str, position: Point, font: &MonoFont<'_>, color: Rgb565, alignment: Alignment)
where
    D: DrawTarget<Color = Rgb565>,
{
    let style = MonoTextStyle::new(font, color);
    let layout = TextStyleBuilder::new()
        .alignment(alignment)
        .baseline(Baseline::Top)
        .build();
    Text::with_text_style(s, position, style, layout)
        .draw(target)
        .ok();
}

fn body_area<D: OriginDimensions>(target: &D) -> Rectangle {
    let size = target.size();
    Rectangle::new(
        Point::new(0, HEADER_HEIGHT as i32),
        Size::new(
            size.width,
            size.height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT),
        ),
    )
}

/// Draw the visible page completely.
pub fn draw_page<D>(target: &mut D, dashboard: &Dashboard, now: &DateTime<Local>)
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    target.clear(BACKGROUND).ok();

    let location = dashboard
        .snapshot()
        .map(|s| s.location.name.as_str())
        .unwrap_or("Weather");
    text(target, location, Point::new(8, 2), &FONT_10X20, FOREGROUND, Alignment::Left);
    draw_clock(target, now);

    if *dashboard.status() == DataStatus::Stale {
        let right = target.size().width as i32 - 8;
        text(target, "No connection", Point::new(right, 4), &FONT_6X10, STALE, Alignment::Right);
    }

    let body = body_area(target);
    match dashboard.snapshot() {
        Some(snapshot) => match dashboard.controller().current_page().kind() {
            PageKind::Current => draw_current(target, snapshot, body),
            PageKind::Forecast => draw_forecast(target, snapshot, body),
            PageKind::Chart(kind) => draw_chart(target, snapshot, kind, body),
        },
        None => {
            let message = match dashboard.status() {
                DataStatus::Stale => "No connection",
                _ => "Loading...",
            };
            text(
                target,
                message,
                body.center(),
                &FONT_10X20,
                FOREGROUND,
                Alignment::Center,
            );
        }
    }

    draw_indicators(target, dashboard.controller().indicators());
}

/// Redraw only the clock line in the header.
pub fn draw_clock<D>(target: &mut D, now: &DateTime<Local>)
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    let width = target.size().width;
    Rectangle::new(Point::new(0, 24), Size::new(width, HEADER_HEIGHT - 24))
        .into_styled(PrimitiveStyle::with_fill(BACKGROUND))
        .draw(target)
        .ok();
    text(target, &format_clock(now), Point::new(8, 26), &FONT_6X10, DIM, Alignment::Left);
}

fn draw_current<D>(target: &mut D, snapshot: &WeatherSnapshot, body: Rectangle)
where
    D: DrawTarget<Color = Rgb565>,
{
    let current = &snapshot.current;
    let top = body.top_left.y;
    let center_x = body.center().x;

    draw_icon(target, current.weather_code, Point::new(center_x - 90, top + 50), 64);
    text(
        target,
        &format_temp(current.temperature),
        Point::new(center_x - 30, top + 28),
        &FONT_10X20,
        FOREGROUND,
        Alignment::Left,
    );
    text(
        target,
        wmo::describe(current.weather_code),
        Point::new(center_x - 30, top + 54),
        &FONT_7X13_BOLD,
        FOREGROUND,
        Alignment::Left,
    );

    let details = [
        (format!("Humidity {}%", current.relative_humidity), HUMIDITY_LINE),
        (format!("Wind {:.1} km/h", current.wind_speed), RAIN),
        (format!("Pressure {} hPa", current.surface_pressure.round() as i32), SUN),
        (format!("Feels {}", format_temp(current.apparent_temperature)), TEMPERATURE_LINE),
    ];
    for (i, (label, color)) in details.iter().enumerate() {
        let column = (i % 2) as i32;
        let row = (i / 2) as i32;
        let x = body.top_left.x + 40 + column * 220;
        let y = top + 120 + row * 30;
        text(target, label, Point::new(x, y), &FONT_7X13_BOLD, *color, Alignment::Left);
    }
    text(
        target,
        &format!("Precipitation {:.1} mm", current.precipitation),
        Point::new(center_x, top + 190),
        &FONT_6X10,
        DIM,
        Alignment::Center,
    );
}

fn draw_forecast<D>(target: &mut D, snapshot: &WeatherSnapshot, body: Rectangle)
where
    D: DrawTarget<Color = Rgb565>,
{
    let columns = snapshot.forecast.len() as i32;
    let column_width = body.size.width as i32 / columns;
    let top = body.top_left.y;

    for (i, day) in snapshot.forecast.iter().enumerate() {
        let center_x = body.top_left.x + column_width * i as i32 + column_width / 2;
        text(target, &day.label, Point::new(center_x, top + 20), &FONT_7X13_BOLD, FOREGROUND, Alignment::Center);
        draw_icon(target, day.icon_code, Point::new(center_x, top + 80), 48);
        text(
            target,
            &format_high_low(day.high_temp, day.low_temp),
            Point::new(center_x, top + 130),
            &FONT_7X13_BOLD,
            FOREGROUND,
            Alignment::Center,
        );
        text(
            target,
            &format!("{}%", day.precipitation_probability),
            Point::new(center_x, top + 156),
            &FONT_6X10,
            RAIN,
            Alignment::Center,
        );
    }
}

fn draw_chart<D>(target: &mut D, snapshot: &WeatherSnapshot, kind: ChartKind, body: Rectangle)
where
    D: DrawTarget<Color = Rgb565>,
{
    let (color, title) = chart_style(kind);
    text(
        target,
        title,
        Point::new(body.center().x, body.top_left.y + 4),
        &FONT_7X13_BOLD,
        FOREGROUND,
        Alignment::Center,
    );

    let area = Rectangle::new(
        body.top_left + Point::new(10, 24),
        Size::new(body.size.width.saturating_sub(20), body.size.height.saturating_sub(30)),
    );
    area.into_styled(PrimitiveStyle::with_stroke(DIM, 1))
        .draw(target)
        .ok();

    let mut canvas = EgCanvas::new(target, area);
    GraphRenderer::new().render_series(&mut canvas, chart_series(snapshot, kind), color);
}

fn draw_indicators<D>(target: &mut D, indicators: &[bool])
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    const DOT: u32 = 8;
    const SPACING: i32 = 16;

    let size = target.size();
    let total = SPACING * indicators.len() as i32;
    let left = (size.width as i32 - total) / 2 + (SPACING - DOT as i32) / 2;
    let top = size.height as i32 - (FOOTER_HEIGHT as i32 + DOT as i32) / 2;

    for (i, &active) in indicators.iter().enumerate() {
        let style = if active {
            PrimitiveStyle::with_fill(FOREGROUND)
        } else {
            PrimitiveStyle::with_stroke(DIM, 1)
        };
        Circle::new(Point::new(left + SPACING * i as i32, top), DOT)
            .into_styled(style)
            .draw(target)
            .ok();
    }
}

fn draw_cloud<D>(target: &mut D, center: Point, size: u32)
where
    D: DrawTarget<Color = Rgb565>,
{
    let s = size as i32;
    let fill = PrimitiveStyle::with_fill(CLOUD);
    Circle::with_center(center + Point::new(-s / 6, -s / 8), size / 2)
        .into_styled(fill)
        .draw(target)
        .ok();
    Circle::with_center(center + Point::new(s / 6, -s / 16), size * 2 / 5)
        .into_styled(fill)
        .draw(target)
        .ok();
    RoundedRectangle::with_equal_corners(
        Rectangle::with_center(center + Point::new(0, s / 8), Size::new(size * 4 / 5, size / 3)),
        Size::new(size / 8, size / 8),
    )
    .into_styled(fill)
    .draw(target)
    .ok();
}

/// Draw a weather icon centered on `center`, fitting a `size` square.
fn draw_icon<D>(target: &mut D, code: u8, center: Point, size: u32)
where
    D: DrawTarget<Color = Rgb565>,
{
    let s = size as i32;
    let below = center + Point::new(0, s / 3);

    match wmo::icon(code) {
        Icon::Clear => {
            Circle::with_center(center, size * 3 / 5)
                .into_styled(PrimitiveStyle::with_fill(SUN))
                .draw(target)
                .ok();
        }
        Icon::PartlyCloudy => {
            Circle::with_center(center + Point::new(s / 6, -s / 5), size / 2)
                .into_styled(PrimitiveStyle::with_fill(SUN))
                .draw(target)
                .ok();
            draw_cloud(target, center + Point::new(-s / 10, s / 10), size * 4 / 5);
        }
        Icon::Cloudy => draw_cloud(target, center, size),
        Icon::Fog => {
            for row in -1..=1 {
                let y = center.y + row * s / 5;
                Line::new(Point::new(center.x - s / 3, y), Point::new(center.x + s / 3, y))
                    .into_styled(PrimitiveStyle::with_stroke(CLOUD, 3))
                    .draw(target)
                    .ok();
            }
        }
        Icon::Drizzle | Icon::Rain => {
            draw_cloud(target, center - Point::new(0, s / 8), size);
            let drops = if wmo::icon(code) == Icon::Rain { 3 } else { 2 };
            for i in 0..drops {
                let x = center.x - s / 4 + i * s / 4;
                Line::new(Point::new(x, below.y - s / 16), Point::new(x - s / 12, below.y + s / 8))
                    .into_styled(PrimitiveStyle::with_stroke(RAIN, 2))
                    .draw(target)
                    .ok();
            }
        }
        Icon::Snow => {
            draw_cloud(target, center - Point::new(0, s / 8), size);
            for i in -1..=1 {
                Circle::with_center(Point::new(center.x + i * s / 4, below.y + s / 16), 4)
                    .into_styled(PrimitiveStyle::with_fill(FOREGROUND))
                    .draw(target)
                    .ok();
            }
        }
        Icon::Thunderstorm => {
            draw_cloud(target, center - Point::new(0, s / 8), size);
            let bolt = [
                Point::new(center.x + s / 12, below.y - s / 10),
                Point::new(center.x - s / 12, below.y + s / 20),
                Point::new(center.x + s / 16, below.y + s / 20),
                Point::new(center.x - s / 10, below.y + s / 5),
            ];
            Polyline::new(&bolt)
                .into_styled(PrimitiveStyle::with_stroke(SUN, 2))
                .draw(target)
                .ok();
        }
        Icon::Unknown => {
            text(target, "?", center - Point::new(0, 10), &FONT_10X20, FOREGROUND, Alignment::Center);
        }
    }
}

/// Plain-text rendition of a snapshot for `--stdout` development mode.
pub fn ascii_report(snapshot: &WeatherSnapshot, now: &DateTime<Local>) -> String {
    const COLUMN: usize = 11;
    let mut out = String::new();

    let current = &snapshot.current;
    let _ = writeln!(out, "{}", snapshot.location.name);
    let _ = writeln!(out, "{}", format_clock(now));
    let _ = writeln!(
        out,
        "{}  {}",
        format_temp(current.temperature),
        wmo::describe(current.weather_code)
    );
    let _ = writeln!(
        out,
        "Humidity {}%  Wind {:.1} km/h  Pressure {} hPa  Feels {}  Precipitation {:.1} mm",
        current.relative_humidity,
        current.wind_speed,
        current.surface_pressure.round() as i32,
        format_temp(current.apparent_temperature),
        current.precipitation
    );
    out.push('\n');

    for day in &snapshot.forecast {
        let _ = write!(out, "{:<width$}", day.label, width = COLUMN);
    }
    out.push('\n');
    for day in &snapshot.forecast {
        let _ = write!(out, "{:<width$}", format_high_low(day.high_temp, day.low_temp), width = COLUMN);
    }
    out.push('\n');
    for day in &snapshot.forecast {
        let _ = write!(out, "{:<width$}", format!("{}%", day.precipitation_probability), width = COLUMN);
    }
    out.push_str("\n\n");

    for kind in [ChartKind::Temperature, ChartKind::Humidity] {
        let (color, title) = chart_style(kind);
        let mut canvas = TextCanvas::new(60, 12, 6.0, 10.0);
        GraphRenderer::new().render_series(&mut canvas, chart_series(snapshot, kind), color);
        let _ = writeln!(out, "{title}");
        out.push_str(&canvas.render());
        out.push_str("\n\n");
    }

    out
}
