//! Domain logic and core data structures
//!
//! Pure computation with no knowledge of Win32 or rendering: the energy
//! roofline model, the operational intensity samples it is evaluated on, and
//! the pixel geometry used by the window layout.

pub mod core;
pub mod intensity;
pub mod model;

pub use intensity::{DomainError, IntensityDomain};
pub use model::{evaluate, Curves, EnergyModel};
