//! # Weather Panel Application Entry Point
//!
//! This binary crate runs the interactive loop: it wires the refresh worker,
//! touch and keyboard input, the periodic timers and the framebuffer together
//! around a [`Dashboard`]. It supports both production mode (LCD framebuffer)
//! and development mode (ASCII output).

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use chrono::Local;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use weather_panel_lib::{
    config::Config,
    dashboard::Dashboard,
    framebuffer::{write_frame, Framebuffer},
    input::{self, InputEvent},
    pages::default_pages,
    provider::{spawn_refresh_worker, OpenMeteoSource, WeatherSource},
    renderer::{ascii_report, draw_clock, draw_page},
    scheduler::PeriodicTask,
};

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct Args {
    /// Development mode: print one ASCII report and exit
    stdout: bool,
    /// Override the configured location with a geocoded city
    city: Option<String>,
    /// Config file to load instead of ./weather-config.toml
    config: Option<PathBuf>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--stdout" => parsed.stdout = true,
            "--city" => parsed.city = Some(args.next().context("--city needs a name")?),
            "--config" => {
                parsed.config = Some(args.next().context("--config needs a path")?.into())
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(parsed)
}

/// The LCD: an in-memory frame plus the device it is flushed to.
struct Display {
    frame: Framebuffer,
    device: PathBuf,
    failing: bool,
}

impl Display {
    fn new(config: &Config) -> Self {
        Self {
            frame: Framebuffer::new(config.display.width, config.display.height),
            device: PathBuf::from(&config.display.framebuffer),
            failing: false,
        }
    }

    /// Push the frame to the device, logging only the first of a run of failures.
    ///
    /// The write runs on the blocking pool so a slow device never stalls the
    /// runtime. The loop still waits for it, which keeps frames in order.
    async fn present(&mut self) {
        let bytes = self.frame.as_bytes();
        let device = self.device.clone();
        let result = tokio::task::spawn_blocking(move || write_frame(&bytes, &device)).await;

        match result {
            Ok(Ok(())) => {
                if self.failing {
                    info!("Framebuffer {} is writable again", self.device.display());
                }
                self.failing = false;
            }
            Ok(Err(e)) => {
                if !self.failing {
                    warn!("Cannot write framebuffer {}: {}", self.device.display(), e);
                }
                self.failing = true;
            }
            Err(e) => {
                error!("Framebuffer write task failed: {}", e);
                self.failing = true;
            }
        }
    }
}

/// Fetch once and print the ASCII report.
async fn run_stdout(config: Config) -> anyhow::Result<()> {
    let source = OpenMeteoSource::new(config).context("building HTTP client")?;
    let snapshot = source.snapshot().await.context("weather fetch failed")?;
    print!("{}", ascii_report(&snapshot, &Local::now()));
    Ok(())
}

/// Run the interactive panel until a quit command arrives.
async fn run_panel(config: Config) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut dashboard =
        Dashboard::new(default_pages(), &config.schedule).context("building page list")?;
    dashboard.start(Duration::ZERO);
    let mut display = Display::new(&config);

    // Network work lives on its own task; the loop only sees finished results
    let source = OpenMeteoSource::new(config.clone()).context("building HTTP client")?;
    let (refresh, mut updates, _worker) = spawn_refresh_worker(source);

    let (input_tx, mut inputs) = mpsc::channel::<InputEvent>(32);
    if let Some(device) = &config.display.touch_device {
        if let Err(e) = input::spawn_touch_reader(device, input_tx.clone()) {
            warn!("Touch input disabled, cannot open {}: {}", device, e);
        }
    }
    input::spawn_stdin_reader(input_tx);

    let mut clock = PeriodicTask::new(config.schedule.clock_interval());
    let mut refresh_timer = PeriodicTask::new(config.schedule.refresh_interval());
    clock.start(Duration::ZERO);
    refresh_timer.start(Duration::ZERO);

    refresh.request();
    draw_page(&mut display.frame, &dashboard, &Local::now());
    display.present().await;

    info!(
        "Panel running: {} pages, rotate every {:?}, refresh every {:?}",
        dashboard.controller().len(),
        config.schedule.rotation_interval(),
        config.schedule.refresh_interval()
    );

    loop {
        let now = start.elapsed();
        let wake = [clock.deadline(), refresh_timer.deadline(), dashboard.next_rotation()]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(now + Duration::from_secs(1));

        let redraw = tokio::select! {
            _ = tokio::time::sleep_until(start + wake) => {
                let now = start.elapsed();
                if refresh_timer.poll_all(now) > 0 {
                    refresh.request();
                }
                let redraw = dashboard.tick(now);
                if clock.poll_all(now) > 0 && !redraw.needed() {
                    draw_clock(&mut display.frame, &Local::now());
                    display.present().await;
                }
                redraw
            }
            Some(update) = updates.recv() => dashboard.apply_update(update),
            Some(event) = inputs.recv() => {
                if event == InputEvent::Quit {
                    info!("Quit requested");
                    break;
                }
                dashboard.handle_input(event, start.elapsed())
            }
        };

        if redraw.needed() {
            draw_page(&mut display.frame, &dashboard, &Local::now());
            display.present().await;
        }
    }

    Ok(())
}

/// Main application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr (visible in the systemd journal)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(env::args().skip(1))?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    if let Some(city) = args.city {
        config.location.city = Some(city);
    }

    // Development mode: ASCII output for testing without hardware
    if args.stdout {
        return run_stdout(config).await;
    }

    if let Err(e) = run_panel(config).await {
        error!("Panel stopped: {:#}", e);
        return Err(e);
    }
    Ok(())
}
