//! Configuration module
//!
//! Compile-time description of the four model parameters: labels, defaults,
//! slider ranges, and the value sanitizing shared by the controller and the
//! window controls. Nothing is read from disk.

pub mod parameters;

pub use parameters::{ParameterError, ParameterId, ParameterSet, ParameterSpec, PARAMETER_SPECS};
