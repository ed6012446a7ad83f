pub mod layout;
pub mod plot;
pub mod renderer;
pub mod text;

pub use layout::WindowLayout;
pub use plot::PlotLayout;
pub use renderer::{PlotRenderer, RendererError};
