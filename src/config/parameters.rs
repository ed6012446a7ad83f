use crate::domain::model::EnergyModel;
use thiserror::Error;

/// Identity of one of the four model parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    EnergyPerOp,
    EnergyPerByte,
    BackgroundPower,
    PeakThroughput,
}

impl ParameterId {
    /// Display order of the control rows
    pub const ALL: [ParameterId; 4] = [
        ParameterId::EnergyPerOp,
        ParameterId::EnergyPerByte,
        ParameterId::BackgroundPower,
        ParameterId::PeakThroughput,
    ];

    pub fn index(self) -> usize {
        match self {
            ParameterId::EnergyPerOp => 0,
            ParameterId::EnergyPerByte => 1,
            ParameterId::BackgroundPower => 2,
            ParameterId::PeakThroughput => 3,
        }
    }

    /// Short symbolic name used in logs
    pub fn name(self) -> &'static str {
        match self {
            ParameterId::EnergyPerOp => "e_p",
            ParameterId::EnergyPerByte => "e_m",
            ParameterId::BackgroundPower => "p_0",
            ParameterId::PeakThroughput => "t_s",
        }
    }

    pub fn spec(self) -> &'static ParameterSpec {
        &PARAMETER_SPECS[self.index()]
    }
}

/// Static description of a parameter: label, default and slider range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub id: ParameterId,
    pub label: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

pub const PARAMETER_SPECS: [ParameterSpec; 4] = [
    ParameterSpec {
        id: ParameterId::EnergyPerOp,
        label: "εₚ  (pJ / flop)",
        default: 1.0,
        min: 1.0,
        max: 50.0,
    },
    ParameterSpec {
        id: ParameterId::EnergyPerByte,
        label: "εₘ  (pJ / byte)",
        default: 10.0,
        min: 1.0,
        max: 200.0,
    },
    ParameterSpec {
        id: ParameterId::BackgroundPower,
        label: "P₀   (pW)",
        default: 200.0,
        min: 10.0,
        max: 1000.0,
    },
    ParameterSpec {
        id: ParameterId::PeakThroughput,
        label: "Tₛ   (GFLOP/s)",
        default: 10.0,
        min: 1.0,
        max: 1000.0,
    },
];

impl ParameterSpec {
    /// Number of discrete trackbar positions spanning `[min, max]`
    pub const SLIDER_STEPS: i32 = 1000;

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Maps a value onto the trackbar, pinning out-of-range values to the ends
    pub fn to_slider_position(&self, value: f64) -> i32 {
        if !value.is_finite() {
            return 0;
        }
        let fraction = (self.clamp(value) - self.min) / (self.max - self.min);
        (fraction * Self::SLIDER_STEPS as f64).round() as i32
    }

    /// Maps a trackbar position back onto `[min, max]`
    ///
    /// The bounds are whole numbers, so the numerator stays exact and the
    /// result is the closest `f64` to the decimal step value.
    pub fn from_slider_position(&self, position: i32) -> f64 {
        let position = position.clamp(0, Self::SLIDER_STEPS) as f64;
        let steps = Self::SLIDER_STEPS as f64;
        (self.min * steps + (self.max - self.min) * position) / steps
    }

    /// Formats a value for the entry field
    ///
    /// Uses the shortest representation that parses back to exactly `value`,
    /// so committing unedited text never changes the parameter.
    pub fn format_value(value: f64) -> String {
        let text = value.to_string();
        if value.is_finite() && !text.contains('.') {
            format!("{text}.0")
        } else {
            text
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },
    #[error("{name} must be strictly positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
}

/// Current values of all four parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    values: [f64; 4],
}

impl ParameterSet {
    pub fn get(&self, id: ParameterId) -> f64 {
        self.values[id.index()]
    }

    /// Stores `value` for `id` and returns the previous value
    ///
    /// Values outside the slider range are accepted as long as they are finite
    /// and strictly positive; anything else would make the model divide by
    /// zero or flip sign.
    pub fn set(&mut self, id: ParameterId, value: f64) -> Result<f64, ParameterError> {
        Self::validate(id, value)?;
        let previous = self.values[id.index()];
        self.values[id.index()] = value;
        Ok(previous)
    }

    pub fn validate(id: ParameterId, value: f64) -> Result<(), ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::NotFinite {
                name: id.name(),
                value,
            });
        }
        if value <= 0.0 {
            return Err(ParameterError::NotPositive {
                name: id.name(),
                value,
            });
        }
        Ok(())
    }

    pub fn model(&self) -> EnergyModel {
        EnergyModel::new(
            self.get(ParameterId::EnergyPerOp),
            self.get(ParameterId::EnergyPerByte),
            self.get(ParameterId::BackgroundPower),
            self.get(ParameterId::PeakThroughput),
        )
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            values: PARAMETER_SPECS.map(|spec| spec.default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specs_are_indexed_by_id() {
        for id in ParameterId::ALL {
            assert_eq!(id.spec().id, id);
        }
    }

    #[test]
    fn slider_floors_exclude_zero() {
        for spec in PARAMETER_SPECS {
            assert!(spec.min > 0.0, "{} floor must be positive", spec.id.name());
            assert!(spec.max > spec.min);
            assert!(spec.default >= spec.min && spec.default <= spec.max);
        }
    }

    #[test]
    fn defaults_build_reference_model() {
        let model = ParameterSet::default().model();
        assert_eq!(model, EnergyModel::new(1.0, 10.0, 200.0, 10.0));
    }

    #[test]
    fn slider_position_endpoints() {
        let spec = ParameterId::BackgroundPower.spec();
        assert_eq!(spec.to_slider_position(spec.min), 0);
        assert_eq!(spec.to_slider_position(spec.max), ParameterSpec::SLIDER_STEPS);
        assert_eq!(spec.from_slider_position(0), spec.min);
        assert_eq!(spec.from_slider_position(ParameterSpec::SLIDER_STEPS), spec.max);
    }

    #[test]
    fn slider_position_clamps_out_of_range() {
        let spec = ParameterId::EnergyPerOp.spec();
        assert_eq!(spec.to_slider_position(500.0), ParameterSpec::SLIDER_STEPS);
        assert_eq!(spec.to_slider_position(0.2), 0);
        assert_eq!(spec.to_slider_position(f64::NAN), 0);
        assert_eq!(spec.from_slider_position(-20), spec.min);
        assert_eq!(spec.from_slider_position(5000), spec.max);
    }

    #[test]
    fn slider_round_trip_within_one_step() {
        for spec in PARAMETER_SPECS {
            let mut value = spec.min;
            while value <= spec.max {
                let back = spec.from_slider_position(spec.to_slider_position(value));
                let resolution = (spec.max - spec.min) / ParameterSpec::SLIDER_STEPS as f64;
                assert!((back - value).abs() <= resolution);
                value += (spec.max - spec.min) / 37.0;
            }
        }
    }

    #[test]
    fn format_keeps_a_decimal_point() {
        assert_eq!(ParameterSpec::format_value(10.0), "10.0");
        assert_eq!(ParameterSpec::format_value(200.0), "200.0");
        assert_eq!(ParameterSpec::format_value(12.5), "12.5");
    }

    #[test]
    fn format_parses_back_exactly() {
        for value in [1.23456, 0.0004, 1e-9, 123456.789, 1.0 / 3.0] {
            let text = ParameterSpec::format_value(value);
            assert_eq!(text.parse::<f64>().unwrap(), value, "{text}");
        }
    }

    #[test]
    fn slider_values_format_as_short_decimals() {
        let spec = ParameterId::EnergyPerOp.spec();
        assert_eq!(ParameterSpec::format_value(spec.from_slider_position(123)), "7.027");
        let spec = ParameterId::BackgroundPower.spec();
        assert_eq!(ParameterSpec::format_value(spec.from_slider_position(1)), "10.99");
    }

    #[test]
    fn set_returns_previous_value() {
        let mut params = ParameterSet::default();
        assert_eq!(params.set(ParameterId::PeakThroughput, 42.0), Ok(10.0));
        assert_eq!(params.get(ParameterId::PeakThroughput), 42.0);
    }

    #[test]
    fn set_accepts_values_outside_slider_range() {
        let mut params = ParameterSet::default();
        assert!(params.set(ParameterId::EnergyPerOp, 0.5).is_ok());
        assert!(params.set(ParameterId::BackgroundPower, 5000.0).is_ok());
    }

    #[test]
    fn set_rejects_zero_negative_and_non_finite() {
        let mut params = ParameterSet::default();
        assert!(matches!(
            params.set(ParameterId::EnergyPerOp, 0.0),
            Err(ParameterError::NotPositive { name: "e_p", .. })
        ));
        assert!(matches!(
            params.set(ParameterId::EnergyPerByte, -3.0),
            Err(ParameterError::NotPositive { .. })
        ));
        assert!(matches!(
            params.set(ParameterId::PeakThroughput, f64::INFINITY),
            Err(ParameterError::NotFinite { .. })
        ));
        assert_eq!(params, ParameterSet::default());
    }
}
