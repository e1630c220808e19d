//! RGB565 frame buffer for Linux framebuffer LCDs.
//!
//! Small SPI LCDs on the Pi (fbtft / fb_ili9486 and friends) show up as
//! `/dev/fbN` taking raw little-endian RGB565 rows. Pages are drawn into this
//! in-memory buffer through `embedded-graphics` and written to the device in one
//! go, so a half-drawn page is never visible.

use embedded_graphics::{
    pixelcolor::{
        raw::{RawData, RawU16},
        Rgb565,
    },
    prelude::*,
};
use std::convert::Infallible;
use std::fs::OpenOptions;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FramebufferError {
    #[error("framebuffer IO: {0}")]
    Io(#[from] io::Error),
}

/// In-memory RGB565 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height) as usize], // Black by default
        }
    }

    pub fn fill(&mut self, color: Rgb565) {
        self.pixels.fill(RawU16::from(color).into_inner());
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb565) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.pixels[(y * self.width + x) as usize] = RawU16::from(color).into_inner();
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(Rgb565::from(RawU16::new(
            self.pixels[(y * self.width + x) as usize],
        )))
    }

    /// Frame as little-endian bytes, row major.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }
}

/// Write a frame from [`Framebuffer::as_bytes`] to a framebuffer device (or
/// any file) from offset 0. Blocking; async callers run it through
/// `spawn_blocking`.
pub fn write_frame<P: AsRef<Path>>(bytes: &[u8], device: P) -> Result<(), FramebufferError> {
    let mut file = OpenOptions::new().write(true).create(false).open(device)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(())
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}
