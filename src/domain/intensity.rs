//! Operational intensity sampling
//!
//! The x-axis of the roofline plot. Samples are generated once at startup and
//! never change afterwards, so every derived curve lines up index-for-index
//! with the same domain.

use thiserror::Error;

/// Lower bound of the default domain. Zero is excluded because intensity
/// appears as a divisor in the efficiency model.
pub const DEFAULT_START: f64 = 1e-6;

/// Upper bound of the default domain (flop / byte)
pub const DEFAULT_END: f64 = 50.0;

/// Number of samples in the default domain
pub const DEFAULT_SAMPLES: usize = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("Intensity domain needs at least 2 samples, got {0}")]
    TooFewSamples(usize),
    #[error("Intensity domain bounds must be finite and strictly positive: ({start}, {end}]")]
    InvalidBounds { start: f64, end: f64 },
    #[error("Intensity domain end {end} must be greater than start {start}")]
    EmptyRange { start: f64, end: f64 },
}

/// Fixed, strictly increasing sequence of operational intensity samples
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityDomain {
    samples: Vec<f64>,
}

impl IntensityDomain {
    /// Creates `count` evenly spaced samples from `start` to `end` inclusive
    pub fn linspace(start: f64, end: f64, count: usize) -> Result<Self, DomainError> {
        if count < 2 {
            return Err(DomainError::TooFewSamples(count));
        }
        if !start.is_finite() || !end.is_finite() || start <= 0.0 {
            return Err(DomainError::InvalidBounds { start, end });
        }
        if end <= start {
            return Err(DomainError::EmptyRange { start, end });
        }

        Ok(Self::evenly_spaced(start, end, count))
    }

    /// Unchecked sampling shared by [`IntensityDomain::linspace`] and `Default`
    fn evenly_spaced(start: f64, end: f64, count: usize) -> Self {
        let step = (end - start) / (count - 1) as f64;
        let mut samples: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
        // Pin the last sample so rounding never drifts past the requested bound
        if let Some(last) = samples.last_mut() {
            *last = end;
        }
        Self { samples }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn start(&self) -> f64 {
        self.samples[0]
    }

    pub fn end(&self) -> f64 {
        self.samples[self.samples.len() - 1]
    }
}

#[cfg(test)]
impl Default for IntensityDomain {
    fn default() -> Self {
        Self::evenly_spaced(DEFAULT_START, DEFAULT_END, DEFAULT_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_domain_shape() {
        let domain = IntensityDomain::default();
        assert_eq!(domain.samples().len(), DEFAULT_SAMPLES);
        assert_eq!(domain.start(), DEFAULT_START);
        assert_eq!(domain.end(), DEFAULT_END);
        assert!(domain.samples().iter().all(|x| *x > 0.0 && x.is_finite()));
    }

    #[test]
    fn default_matches_linspace() {
        let built = IntensityDomain::linspace(DEFAULT_START, DEFAULT_END, DEFAULT_SAMPLES).unwrap();
        assert_eq!(built, IntensityDomain::default());
    }

    #[test]
    fn samples_strictly_increasing() {
        let domain = IntensityDomain::default();
        assert!(domain.samples().windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn rejects_too_few_samples() {
        assert_eq!(
            IntensityDomain::linspace(1.0, 2.0, 1),
            Err(DomainError::TooFewSamples(1))
        );
    }

    #[test]
    fn rejects_zero_start() {
        assert!(matches!(
            IntensityDomain::linspace(0.0, 50.0, 10),
            Err(DomainError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_bounds() {
        assert!(matches!(
            IntensityDomain::linspace(1.0, f64::INFINITY, 10),
            Err(DomainError::InvalidBounds { .. })
        ));
        assert!(matches!(
            IntensityDomain::linspace(f64::NAN, 5.0, 10),
            Err(DomainError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn rejects_reversed_range() {
        assert!(matches!(
            IntensityDomain::linspace(5.0, 1.0, 10),
            Err(DomainError::EmptyRange { .. })
        ));
    }

    #[test]
    fn two_sample_domain() {
        let domain = IntensityDomain::linspace(1.0, 3.0, 2).unwrap();
        assert_eq!(domain.samples(), &[1.0, 3.0]);
    }
}
