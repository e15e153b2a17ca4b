//! Linear shoreline erosion projection.

use std::ops::RangeInclusive;
use thiserror::Error;

/// Projection horizons accepted, in years.
pub const YEARS: RangeInclusive<u32> = 1..=100;

pub const DEFAULT_YEARS: u32 = 10;
pub const DEFAULT_RATE_M_PER_YEAR: f64 = 0.5;

#[derive(Error, Debug, PartialEq)]
pub enum ShorelineError {
    #[error("projection horizon must be 1-100 years, got {0}")]
    YearsOutOfRange(u32),

    #[error("erosion rate must be a finite number, got {0}")]
    InvalidRate(f64),
}

/// Shoreline retreat in meters after `years` at a constant erosion rate.
///
/// ```
/// use coastal_lib::shoreline::project_retreat;
///
/// assert_eq!(project_retreat(0.5, 10).unwrap(), 5.0);
/// ```
pub fn project_retreat(rate_m_per_year: f64, years: u32) -> Result<f64, ShorelineError> {
    if !YEARS.contains(&years) {
        return Err(ShorelineError::YearsOutOfRange(years));
    }
    if !rate_m_per_year.is_finite() {
        return Err(ShorelineError::InvalidRate(rate_m_per_year));
    }
    Ok(rate_m_per_year * f64::from(years))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_projection() {
        let retreat = project_retreat(DEFAULT_RATE_M_PER_YEAR, DEFAULT_YEARS).unwrap();
        assert_eq!(retreat, 5.0);
    }

    #[test]
    fn test_accretion_is_negative_retreat() {
        assert_eq!(project_retreat(-0.25, 4).unwrap(), -1.0);
    }

    #[test]
    fn test_year_bounds() {
        assert!(project_retreat(1.0, 1).is_ok());
        assert!(project_retreat(1.0, 100).is_ok());
        assert_eq!(
            project_retreat(1.0, 0),
            Err(ShorelineError::YearsOutOfRange(0))
        );
        assert_eq!(
            project_retreat(1.0, 101),
            Err(ShorelineError::YearsOutOfRange(101))
        );
    }

    #[test]
    fn test_invalid_rate() {
        assert!(matches!(
            project_retreat(f64::INFINITY, 10),
            Err(ShorelineError::InvalidRate(_))
        ));
    }
}
