//! Feet/tons conversion under a configured ratio.
//!
//! Both directions are pure and total once the ratio has been validated at
//! construction; a non-positive or non-finite ratio is a configuration error
//! and never reaches the arithmetic as a silent NaN/Infinity.

use crate::error::{BuildError, Result};

/// Validated feet <-> tons converter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Converter {
    tons_per_foot: f64,
}

impl Converter {
    /// Build a converter, rejecting ratios that would poison the math.
    pub fn try_new(tons_per_foot: f64) -> Result<Self> {
        if !tons_per_foot.is_finite() || tons_per_foot <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "tons_per_foot must be finite and > 0",
            )));
        }
        Ok(Self { tons_per_foot })
    }

    #[inline]
    pub fn tons_per_foot(&self) -> f64 {
        self.tons_per_foot
    }

    #[inline]
    pub fn feet_to_tons(&self, feet: f64) -> f64 {
        feet * self.tons_per_foot
    }

    #[inline]
    pub fn tons_to_feet(&self, tons: f64) -> f64 {
        tons / self.tons_per_foot
    }
}

#[cfg(test)]
mod tests {
    use super::Converter;

    #[test]
    fn converts_both_ways() {
        let c = Converter::try_new(25.0).expect("valid ratio");
        assert_eq!(c.feet_to_tons(2.0), 50.0);
        assert_eq!(c.tons_to_feet(50.0), 2.0);
    }

    #[test]
    fn rejects_bad_ratios() {
        assert!(Converter::try_new(0.0).is_err());
        assert!(Converter::try_new(-1.0).is_err());
        assert!(Converter::try_new(f64::NAN).is_err());
        assert!(Converter::try_new(f64::INFINITY).is_err());
    }
}
