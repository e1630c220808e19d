//! Touchscreen and keyboard input.
//!
//! Two sources feed the same [`InputEvent`] channel:
//! - **Touchscreen**: raw evdev records from `/dev/input/eventN`, decoded per
//!   `SYN_REPORT` frame into drag start / move / end
//! - **Stdin**: one command per line (`n`, `p`, `1`..`9`, `r`, `q`), handy over SSH
//!
//! Only the horizontal position matters; swipes are turned into page changes by
//! [`crate::gesture::GestureRouter`].

use crate::pages::NavIntent;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::thread;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// Linux input-event-codes.h
const EV_SYN: u16 = 0x00;
const EV_KEY: u16 = 0x01;
const EV_ABS: u16 = 0x03;
const SYN_REPORT: u16 = 0x00;
const BTN_TOUCH: u16 = 0x14a;
const ABS_X: u16 = 0x00;
const ABS_MT_POSITION_X: u16 = 0x35;

/// Size of `struct input_event`: a `timeval` of two native longs, then
/// `u16 type`, `u16 code`, `i32 value`.
pub const RAW_EVENT_SIZE: usize = 2 * std::mem::size_of::<usize>() + 8;

/// Something the user did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    DragStart(i32),
    DragMove(i32),
    DragEnd,
    /// Button or key navigation
    Nav(NavIntent),
    /// Pause or resume auto-rotation
    ToggleRotation,
    Quit,
}

/// Parse one stdin command line.
pub fn parse_command(line: &str) -> Option<InputEvent> {
    match line.trim().to_ascii_lowercase().as_str() {
        "n" | "next" => Some(InputEvent::Nav(NavIntent::Next)),
        "p" | "prev" | "previous" => Some(InputEvent::Nav(NavIntent::Previous)),
        "r" | "rotate" => Some(InputEvent::ToggleRotation),
        "q" | "quit" | "exit" => Some(InputEvent::Quit),
        other => match other.parse::<usize>() {
            Ok(page @ 1..=9) => Some(InputEvent::Nav(NavIntent::Show(page - 1))),
            _ => None,
        },
    }
}

/// Split a raw evdev record into `(type, code, value)`.
pub fn parse_raw_event(buf: &[u8]) -> Option<(u16, u16, i32)> {
    if buf.len() < RAW_EVENT_SIZE {
        return None;
    }
    let offset = RAW_EVENT_SIZE - 8;
    let ev_type = u16::from_ne_bytes([buf[offset], buf[offset + 1]]);
    let code = u16::from_ne_bytes([buf[offset + 2], buf[offset + 3]]);
    let value = i32::from_ne_bytes([
        buf[offset + 4],
        buf[offset + 5],
        buf[offset + 6],
        buf[offset + 7],
    ]);
    Some((ev_type, code, value))
}

/// Folds evdev records into drag events, one decision per `SYN_REPORT`.
///
/// Drivers disagree on whether `BTN_TOUCH` or the position comes first within a
/// frame, so nothing is emitted until the frame is complete.
#[derive(Debug, Default)]
pub struct TouchDecoder {
    touching: bool,
    /// A `DragStart` went out for the current touch
    started: bool,
    last_x: Option<i32>,
    pending_x: Option<i32>,
    pending_touch: Option<bool>,
}

impl TouchDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, ev_type: u16, code: u16, value: i32) -> Option<InputEvent> {
        match (ev_type, code) {
            (EV_ABS, ABS_X | ABS_MT_POSITION_X) => {
                self.pending_x = Some(value);
                None
            }
            (EV_KEY, BTN_TOUCH) => {
                self.pending_touch = Some(value != 0);
                None
            }
            (EV_SYN, SYN_REPORT) => self.end_frame(),
            _ => None,
        }
    }

    fn end_frame(&mut self) -> Option<InputEvent> {
        let x = self.pending_x.take();
        let touch = self.pending_touch.take();
        if x.is_some() {
            self.last_x = x;
        }

        match touch {
            Some(true) if !self.touching => {
                self.touching = true;
                self.started = self.last_x.is_some();
                self.last_x.map(InputEvent::DragStart)
            }
            Some(false) if self.touching => {
                self.touching = false;
                self.started = false;
                Some(InputEvent::DragEnd)
            }
            // Touch-down arrived without a position; start on the first one
            _ if self.touching && !self.started => {
                self.started = x.is_some();
                x.map(InputEvent::DragStart)
            }
            _ if self.touching => x.map(InputEvent::DragMove),
            _ => None,
        }
    }
}

/// Read touch events from an evdev device on a dedicated thread.
///
/// The thread ends when the device disappears or the receiver is dropped.
pub fn spawn_touch_reader<P: AsRef<Path>>(
    device: P,
    events: mpsc::Sender<InputEvent>,
) -> io::Result<thread::JoinHandle<()>> {
    let path = device.as_ref().to_path_buf();
    let mut file = File::open(&path)?;
    info!("Reading touch input from {}", path.display());

    thread::Builder::new()
        .name("touch-input".to_string())
        .spawn(move || {
            let mut decoder = TouchDecoder::new();
            let mut buf = vec![0u8; RAW_EVENT_SIZE];
            loop {
                if let Err(e) = file.read_exact(&mut buf) {
                    warn!("Touch device {} closed: {}", path.display(), e);
                    break;
                }
                let Some((ev_type, code, value)) = parse_raw_event(&buf) else {
                    continue;
                };
                if let Some(event) = decoder.feed(ev_type, code, value) {
                    if events.blocking_send(event).is_err() {
                        break;
                    }
                }
            }
        })
}

/// Read line commands from stdin on the tokio runtime.
pub fn spawn_stdin_reader(events: mpsc::Sender<InputEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_command(&line) {
                    Some(event) => {
                        if events.send(event).await.is_err() {
                            break;
                        }
                    }
                    None => debug!("Ignoring unknown command {:?}", line),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            }
        }
    })
}
