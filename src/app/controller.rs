//! Application controller and coordination layer
//!
//! The controller is the sole owner of the model state and the plot surface.
//! Widgets push [`InputEvent`]s in; accepted [`ParameterChange`]s are
//! published to subscribers so every widget bound to a parameter stays in
//! sync. Every change triggers a full, synchronous redraw.

use tiny_skia::Pixmap;
use tracing::{debug, warn};

use crate::app::state::{InputError, InputEvent, ModelState, ParameterChange};
use crate::config::parameters::ParameterId;
use crate::ui::plot::PlotLayout;
use crate::ui::renderer::{PlotRenderer, RendererError};

/// Application errors that can occur during controller operations
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("Plot rendering failed: {0}")]
    Rendering(#[from] RendererError),
}

/// Callback invoked with every accepted (or restored) parameter value
pub type ChangeListener = Box<dyn FnMut(&ParameterChange)>;

/// Rendering target for the plot
///
/// Holds the last rendered frame and a dirty flag the platform layer polls to
/// decide when to repaint.
#[derive(Debug)]
pub struct PlotSurface {
    width: u32,
    height: u32,
    dpi_scale: f32,
    frame: Option<Pixmap>,
    dirty: bool,
}

impl PlotSurface {
    pub fn new(width: u32, height: u32, dpi_scale: f32) -> Self {
        Self {
            width,
            height,
            dpi_scale,
            frame: None,
            dirty: false,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn dpi_scale(&self) -> f32 {
        self.dpi_scale
    }

    /// A surface with no area keeps its old frame and skips drawing
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn frame(&self) -> Option<&Pixmap> {
        self.frame.as_ref()
    }

    /// Returns whether a repaint is pending and clears the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    fn replace_frame(&mut self, frame: Pixmap) {
        self.frame = Some(frame);
        self.dirty = true;
    }

    /// Updates the geometry, returning true when it actually changed
    fn resize(&mut self, width: u32, height: u32, dpi_scale: f32) -> bool {
        let changed = self.width != width || self.height != height || self.dpi_scale != dpi_scale;
        self.width = width;
        self.height = height;
        self.dpi_scale = dpi_scale;
        changed
    }
}

/// Main application controller
pub struct PlotController {
    state: ModelState,
    surface: PlotSurface,
    renderer: PlotRenderer,
    listeners: Vec<ChangeListener>,
}

impl PlotController {
    /// Creates the controller and renders the initial plot
    pub fn new(
        state: ModelState,
        renderer: PlotRenderer,
        surface: PlotSurface,
    ) -> Result<Self, ControllerError> {
        let mut controller = Self {
            state,
            surface,
            renderer,
            listeners: Vec::new(),
        };
        controller.redraw()?;
        Ok(controller)
    }

    pub fn surface(&self) -> &PlotSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut PlotSurface {
        &mut self.surface
    }

    pub fn renderer(&self) -> &PlotRenderer {
        &self.renderer
    }

    pub fn value(&self, id: ParameterId) -> f64 {
        self.state.value(id)
    }

    /// Registers a listener for parameter changes
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&ParameterChange) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Updates one parameter, notifies listeners and redraws
    ///
    /// Rejected values leave the state untouched; listeners are still told
    /// the current value so widgets showing the rejected text can restore it.
    pub fn set_parameter(
        &mut self,
        id: ParameterId,
        value: f64,
    ) -> Result<ParameterChange, ControllerError> {
        let change = match self.state.apply(id, value) {
            Ok(change) => change,
            Err(err) => {
                warn!(parameter = id.name(), value, %err, "parameter rejected");
                self.restore(id);
                return Err(InputError::from(err).into());
            }
        };

        debug!(
            parameter = id.name(),
            previous = change.previous,
            value = change.value,
            "parameter updated"
        );
        self.notify(&change);
        self.redraw()?;
        Ok(change)
    }

    /// Resolves widget input and applies it
    ///
    /// Returns `Ok(None)` when the resolved value equals the current one.
    pub fn handle_input(
        &mut self,
        event: InputEvent,
    ) -> Result<Option<ParameterChange>, ControllerError> {
        let id = event.parameter();
        let value = match event.resolve() {
            Ok(value) => value,
            Err(err) => {
                warn!(parameter = id.name(), %err, "input ignored");
                self.restore(id);
                return Err(err.into());
            }
        };

        if value == self.state.value(id) {
            return Ok(None);
        }
        self.set_parameter(id, value).map(Some)
    }

    /// Recomputes both curves and replaces the surface frame
    pub fn redraw(&mut self) -> Result<(), ControllerError> {
        if !self.surface.is_drawable() {
            debug!("plot surface has no area; redraw skipped");
            return Ok(());
        }

        let (width, height) = self.surface.size();
        let (curves, domain) = self.state.recompute();
        let layout = PlotLayout::from_curves(curves, domain, width, height, self.surface.dpi_scale());
        let frame = self.renderer.render_layout(&layout)?;
        self.surface.replace_frame(frame);
        Ok(())
    }

    /// Adapts the surface to a new canvas size and redraws if it changed
    pub fn resize(&mut self, width: u32, height: u32, dpi_scale: f32) -> Result<(), ControllerError> {
        if self.surface.resize(width, height, dpi_scale) {
            debug!(width, height, dpi_scale, "plot surface resized");
            self.redraw()?;
        }
        Ok(())
    }

    fn restore(&mut self, id: ParameterId) {
        let current = self.state.value(id);
        self.notify(&ParameterChange {
            id,
            previous: current,
            value: current,
        });
    }

    fn notify(&mut self, change: &ParameterChange) {
        for listener in &mut self.listeners {
            listener(change);
        }
    }
}
