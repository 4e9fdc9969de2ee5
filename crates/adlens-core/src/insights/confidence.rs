//! Confidence scoring
//!
//! ```text
//! score(x) = 0                      if x is NaN or x <= 0
//!          = 1                      if x is +inf, or reference is not a positive finite number
//!          = min(1, x / reference)  otherwise
//! ```
//!
//! Pure and monotonically non-decreasing in `x`. The reference scales come
//! from the `[confidence]` config section.

use crate::config::ConfidenceConfig;

/// Linear, capped confidence scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceScale {
    pub reference: f64,
}

impl ConfidenceScale {
    pub fn new(reference: f64) -> Self {
        Self { reference }
    }

    /// Scale for spend-backed claims
    pub fn spend(config: &ConfidenceConfig) -> Self {
        Self::new(config.reference_spend)
    }

    /// Scale for search-volume-backed claims
    pub fn volume(config: &ConfidenceConfig) -> Self {
        Self::new(config.reference_volume)
    }

    pub fn score(&self, evidence: f64) -> f64 {
        if evidence.is_nan() || evidence <= 0.0 {
            return 0.0;
        }
        if evidence.is_infinite() || !self.reference.is_finite() || self.reference <= 0.0 {
            return 1.0;
        }
        (evidence / self.reference).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds() {
        let scale = ConfidenceScale::new(50_000.0);
        for x in [
            0.0,
            -1.0,
            1e-300,
            f64::MIN_POSITIVE,
            1.0,
            49_999.0,
            50_000.0,
            1e300,
            f64::MAX,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NAN,
        ] {
            let s = scale.score(x);
            assert!((0.0..=1.0).contains(&s), "score({}) = {}", x, s);
        }
    }

    #[test]
    fn test_score_values() {
        let scale = ConfidenceScale::new(50_000.0);
        assert_eq!(scale.score(0.0), 0.0);
        assert_eq!(scale.score(f64::NAN), 0.0);
        assert_eq!(scale.score(f64::INFINITY), 1.0);
        assert_eq!(scale.score(25_000.0), 0.5);
        assert_eq!(scale.score(50_000.0), 1.0);
        assert_eq!(scale.score(1e12), 1.0);
    }

    #[test]
    fn test_invalid_reference() {
        assert_eq!(ConfidenceScale::new(0.0).score(10.0), 1.0);
        assert_eq!(ConfidenceScale::new(f64::NAN).score(10.0), 1.0);
        assert_eq!(ConfidenceScale::new(-5.0).score(0.0), 0.0);
    }

    #[test]
    fn test_monotonic() {
        let scale = ConfidenceScale::new(1000.0);
        let mut last = 0.0;
        for i in 0..2000 {
            let s = scale.score(i as f64);
            assert!(s >= last);
            last = s;
        }
    }
}
