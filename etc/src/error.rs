use thiserror::Error;

use crate::hardware::bands::Band;

/// Errors produced by the exposure-time calculator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EtcError {
    /// A parameter is non-physical (negative time, non-positive seeing, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The band has no twilight sky brightness or seeing calibration.
    #[error("band {band} has no twilight calibration (only r, i and z are observed in twilight)")]
    NoTwilightCalibration {
        /// Band that was requested.
        band: Band,
    },

    /// The band is missing from the calibration table in use.
    #[error("band {0} is not present in the calibration table")]
    MissingBand(Band),

    /// A band name could not be parsed.
    #[error("unknown band '{0}' (expected one of u, g, r, i, z, y)")]
    UnknownBand(String),

    /// An asteroid taxonomy name could not be parsed.
    #[error("unknown taxonomy '{0}'")]
    UnknownTaxonomy(String),

    /// The exposure-time iteration ran out of steps before meeting tolerance.
    #[error("exposure time did not converge after {iterations} iterations (residual {residual:.4} mag)")]
    NonConvergence {
        /// Iterations performed.
        iterations: usize,
        /// Target minus achieved magnitude at the last step.
        residual: f64,
    },

    /// Trailing losses cap the depth below the requested magnitude.
    #[error(
        "target magnitude {target:.2} is unreachable: depth saturates at {ceiling:.2} mag \
         even with a {max_exposure_s:.0} s exposure"
    )]
    Infeasible {
        /// Requested limiting magnitude.
        target: f64,
        /// Deepest magnitude reached at the exposure limit.
        ceiling: f64,
        /// Exposure limit in seconds.
        max_exposure_s: f64,
    },
}

pub type Result<T> = std::result::Result<T, EtcError>;

/// Reject a value that is not finite.
pub(crate) fn require_finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EtcError::InvalidInput(format!("{name} must be finite, got {value}")))
    }
}

/// Reject a value that is not finite and strictly positive.
pub(crate) fn require_positive(name: &str, value: f64) -> Result<f64> {
    require_finite(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(EtcError::InvalidInput(format!("{name} must be positive, got {value}")))
    }
}
