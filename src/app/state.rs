//! Application state management
//!
//! The model state is the single owner of the four parameters, the
//! intensity domain and the curves last evaluated from them. Widget
//! notifications arrive as [`InputEvent`]s and are resolved to parameter
//! values here before anything is mutated.

use thiserror::Error;
use tracing::debug;

use crate::config::parameters::{ParameterError, ParameterId, ParameterSet};
use crate::domain::intensity::IntensityDomain;
use crate::domain::model::{evaluate, Curves};

/// Input coming from one of the parameter widgets
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Trackbar moved to an integer position
    SliderMoved { id: ParameterId, position: i32 },
    /// Entry text committed with Enter or on focus loss
    TextCommitted { id: ParameterId, text: String },
}

impl InputEvent {
    pub fn parameter(&self) -> ParameterId {
        match self {
            InputEvent::SliderMoved { id, .. } | InputEvent::TextCommitted { id, .. } => *id,
        }
    }

    /// Converts the raw widget payload into a parameter value
    pub fn resolve(&self) -> Result<f64, InputError> {
        match self {
            InputEvent::SliderMoved { id, position } => Ok(id.spec().from_slider_position(*position)),
            InputEvent::TextCommitted { id, text } => {
                let trimmed = text.trim();
                trimmed.parse::<f64>().map_err(|_| InputError::NotANumber {
                    name: id.name(),
                    text: trimmed.to_string(),
                })
            }
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{name}: '{text}' is not a number")]
    NotANumber { name: &'static str, text: String },
    #[error(transparent)]
    Rejected(#[from] ParameterError),
}

/// An accepted parameter update, published to subscribers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterChange {
    pub id: ParameterId,
    pub previous: f64,
    pub value: f64,
}

/// Parameters, sampling domain and the most recent curves
#[derive(Debug, Clone)]
pub struct ModelState {
    parameters: ParameterSet,
    domain: IntensityDomain,
    curves: Option<Curves>,
}

impl ModelState {
    pub fn new(parameters: ParameterSet, domain: IntensityDomain) -> Self {
        Self {
            parameters,
            domain,
            curves: None,
        }
    }

    /// Curves from the last [`ModelState::recompute`], if any
    #[cfg(test)]
    pub fn curves(&self) -> Option<&Curves> {
        self.curves.as_ref()
    }

    pub fn value(&self, id: ParameterId) -> f64 {
        self.parameters.get(id)
    }

    /// Stores a validated value; the previous curves become stale
    pub fn apply(&mut self, id: ParameterId, value: f64) -> Result<ParameterChange, ParameterError> {
        let previous = self.parameters.set(id, value)?;
        Ok(ParameterChange {
            id,
            previous,
            value,
        })
    }

    /// Replaces both curves with a fresh evaluation of the current parameters
    ///
    /// Returns the new curves together with the domain they are aligned to.
    pub fn recompute(&mut self) -> (&Curves, &IntensityDomain) {
        let model = self.parameters.model();
        debug!(
            knee = model.knee(),
            ceiling = model.compute_ceiling(),
            background = model.background_energy(),
            "evaluating curves"
        );
        let curves = evaluate(&model, &self.domain);
        (self.curves.insert(curves), &self.domain)
    }
}

#[cfg(test)]
impl Default for ModelState {
    fn default() -> Self {
        Self::new(ParameterSet::default(), IntensityDomain::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_has_no_curves() {
        let state = ModelState::default();
        assert!(state.curves().is_none());
        assert_eq!(state.value(ParameterId::BackgroundPower), 200.0);
    }

    #[test]
    fn slider_event_resolves_to_range_floor() {
        let event = InputEvent::SliderMoved {
            id: ParameterId::EnergyPerByte,
            position: 0,
        };
        assert_eq!(event.parameter(), ParameterId::EnergyPerByte);
        assert_eq!(event.resolve(), Ok(1.0));
    }

    #[test]
    fn text_event_parses_trimmed_number() {
        let event = InputEvent::TextCommitted {
            id: ParameterId::PeakThroughput,
            text: "  12.5 ".to_string(),
        };
        assert_eq!(event.resolve(), Ok(12.5));
    }

    #[test]
    fn text_event_rejects_garbage() {
        let event = InputEvent::TextCommitted {
            id: ParameterId::PeakThroughput,
            text: "fast".to_string(),
        };
        assert_eq!(
            event.resolve(),
            Err(InputError::NotANumber {
                name: "t_s",
                text: "fast".to_string()
            })
        );
    }

    #[test]
    fn apply_reports_previous_value() {
        let mut state = ModelState::default();
        let change = state.apply(ParameterId::EnergyPerOp, 2.0).unwrap();
        assert_eq!(
            change,
            ParameterChange {
                id: ParameterId::EnergyPerOp,
                previous: 1.0,
                value: 2.0
            }
        );
    }

    #[test]
    fn apply_rejects_zero_without_mutation() {
        let mut state = ModelState::default();
        assert!(state.apply(ParameterId::PeakThroughput, 0.0).is_err());
        assert_eq!(state.value(ParameterId::PeakThroughput), 10.0);
    }

    #[test]
    fn recompute_replaces_curves_wholesale() {
        let mut state = ModelState::default();
        let before = state.recompute().0.clone();
        assert_eq!(before.efficiency.len(), state.domain.samples().len());

        state.apply(ParameterId::EnergyPerOp, 5.0).unwrap();
        let after = state.recompute().0.clone();
        assert_eq!(after.roofline.len(), before.roofline.len());
        assert!(after.efficiency.iter().zip(&before.efficiency).all(|(a, b)| a < b));
        assert_eq!(state.curves(), Some(&after));
    }
}
