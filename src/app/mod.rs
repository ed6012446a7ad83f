//! Application orchestration layer
//!
//! Owns the model state and coordinates evaluation, layout and rendering
//! whenever a parameter changes.

pub mod controller;
pub mod state;

pub use controller::{ControllerError, PlotController, PlotSurface};
pub use state::{InputError, InputEvent, ModelState, ParameterChange};
