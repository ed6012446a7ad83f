#![cfg_attr(not(windows), allow(dead_code))]

mod app;
mod config;
mod domain;
#[cfg(windows)]
mod platform;
mod ui;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialize logging; `RUST_LOG` overrides the default `info` filter
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,roofline_explorer=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(windows)]
fn main() -> Result<()> {
    use anyhow::Context;
    use tracing::info;

    use crate::app::controller::{PlotController, PlotSurface};
    use crate::app::state::ModelState;
    use crate::config::parameters::ParameterSet;
    use crate::domain::core::Rect;
    use crate::domain::intensity::{IntensityDomain, DEFAULT_END, DEFAULT_SAMPLES, DEFAULT_START};
    use crate::platform::windows::{enable_per_monitor_dpi_awareness, system_dpi_scale};
    use crate::platform::MainWindow;
    use crate::ui::layout::{WindowLayout, INITIAL_CLIENT_HEIGHT, INITIAL_CLIENT_WIDTH};
    use crate::ui::renderer::PlotRenderer;

    init_tracing();
    enable_per_monitor_dpi_awareness();

    let dpi_scale = system_dpi_scale();
    let client = Rect::new(
        0,
        0,
        (INITIAL_CLIENT_WIDTH as f32 * dpi_scale).round() as i32,
        (INITIAL_CLIENT_HEIGHT as f32 * dpi_scale).round() as i32,
    );
    let canvas = WindowLayout::compute(client, dpi_scale).canvas;

    let domain = IntensityDomain::linspace(DEFAULT_START, DEFAULT_END, DEFAULT_SAMPLES)
        .context("invalid operational intensity range")?;
    let controller = PlotController::new(
        ModelState::new(ParameterSet::default(), domain),
        PlotRenderer::with_system_font(),
        PlotSurface::new(canvas.w.max(0) as u32, canvas.h.max(0) as u32, dpi_scale),
    )
    .context("failed to render the initial plot")?;

    let window = MainWindow::create(controller, dpi_scale).context("failed to create the main window")?;
    window.show();
    info!(dpi_scale, "roofline explorer started");

    let exit_code = window.run().context("message loop failed")?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

#[cfg(not(windows))]
fn main() -> Result<()> {
    init_tracing();
    anyhow::bail!("roofline-explorer requires Windows")
}
