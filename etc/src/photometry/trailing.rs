//! Trailing losses for moving targets.
//!
//! A target moving across the sky during an exposure spreads its photons
//! along a trail instead of a seeing disk. Two losses follow:
//!
//! - **SNR trailing loss**: the trail covers more pixels, so more sky
//!   background enters the measurement aperture and the SNR drops relative
//!   to a stationary source of equal brightness.
//! - **Detection trailing loss**: source detection runs a stellar-PSF
//!   matched filter, which matches a trail worse still, so the detection
//!   threshold is reached later than the SNR loss alone suggests.
//!
//! Both are fits (L. Jones, Rubin moving-object simulations) in the trail
//! length measured in seeing FWHM, `x = v·t / FWHM`:
//!
//! `Δm = 1.25 log10(1 + a x² / (1 + b x))`
//!
//! The argument of the logarithm is the factor by which the effective PSF
//! area grows, which is how the depth models consume it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared::units::{AngularVelocity, AngularVelocityExt};

/// Coefficients of the trailing-loss fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingCoefficients {
    pub a: f64,
    pub b: f64,
}

/// SNR trailing loss coefficients
pub const SNR_TRAILING: TrailingCoefficients = TrailingCoefficients { a: 0.761, b: 1.162 };

/// Detection trailing loss coefficients
pub const DETECTION_TRAILING: TrailingCoefficients = TrailingCoefficients { a: 0.420, b: 0.003 };

impl TrailingCoefficients {
    /// Growth of the effective PSF area for a trail `x` seeing FWHM long
    pub fn area_scale(&self, trail_in_seeing: f64) -> f64 {
        let x = trail_in_seeing.max(0.0);
        1.0 + self.a * x * x / (1.0 + self.b * x)
    }

    /// Magnitude loss for a trail `x` seeing FWHM long
    pub fn magnitude_loss(&self, trail_in_seeing: f64) -> f64 {
        1.25 * self.area_scale(trail_in_seeing).log10()
    }
}

/// Which trailing loss degrades the limiting magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingLossModel {
    /// Area-based PSF inflation (SNR loss)
    #[default]
    Snr,
    /// Matched-filter detection loss
    Detection,
}

impl TrailingLossModel {
    pub fn coefficients(&self) -> TrailingCoefficients {
        match self {
            TrailingLossModel::Snr => SNR_TRAILING,
            TrailingLossModel::Detection => DETECTION_TRAILING,
        }
    }
}

/// Trail length in units of the seeing FWHM
pub fn trail_length_in_seeing(rate: AngularVelocity, exposure: Duration, seeing_arcsec: f64) -> f64 {
    rate.as_arcsec_per_second() * exposure.as_secs_f64() / seeing_arcsec
}

/// Both trailing losses for one exposure, in magnitudes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingLosses {
    /// SNR trailing loss
    pub snr: f64,
    /// Detection trailing loss
    pub detection: f64,
}

impl TrailingLosses {
    pub fn for_model(&self, model: TrailingLossModel) -> f64 {
        match model {
            TrailingLossModel::Snr => self.snr,
            TrailingLossModel::Detection => self.detection,
        }
    }
}

/// Calculate the SNR and detection trailing losses of a moving target.
///
/// # Arguments
/// * `rate` - On-sky rate of motion
/// * `seeing_arcsec` - Seeing FWHM of the exposure
/// * `exposure` - Exposure time
pub fn trailing_losses(rate: AngularVelocity, seeing_arcsec: f64, exposure: Duration) -> TrailingLosses {
    let x = trail_length_in_seeing(rate, exposure, seeing_arcsec);
    TrailingLosses {
        snr: SNR_TRAILING.magnitude_loss(x),
        detection: DETECTION_TRAILING.magnitude_loss(x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stationary_target_has_no_loss() {
        let losses = trailing_losses(AngularVelocity::stationary(), 0.8, Duration::from_secs(30));
        assert_eq!(losses.snr, 0.0);
        assert_eq!(losses.detection, 0.0);
    }

    #[test]
    fn test_reference_losses() {
        // 2 deg/day for 30 s in 0.8" seeing: x = 2 * 30 / 0.8 / 24 = 3.125
        let losses = trailing_losses(
            AngularVelocity::from_degrees_per_day(2.0),
            0.8,
            Duration::from_secs(30),
        );
        let x: f64 = 3.125;
        let expected_snr = 1.25 * (1.0 + 0.761 * x * x / (1.0 + 1.162 * x)).log10();
        let expected_det = 1.25 * (1.0 + 0.420 * x * x / (1.0 + 0.003 * x)).log10();
        assert_relative_eq!(losses.snr, expected_snr, epsilon = 1e-9);
        assert_relative_eq!(losses.detection, expected_det, epsilon = 1e-9);
        assert_relative_eq!(losses.snr, 0.5197, epsilon = 1e-3);
    }

    #[test]
    fn test_detection_loss_exceeds_snr_loss_for_long_trails() {
        let losses = trailing_losses(
            AngularVelocity::from_degrees_per_day(10.0),
            0.7,
            Duration::from_secs(30),
        );
        assert!(losses.detection > losses.snr);
        assert_eq!(losses.for_model(TrailingLossModel::Detection), losses.detection);
    }

    #[test]
    fn test_losses_grow_with_rate() {
        let mut previous = 0.0;
        for rate in [0.1, 0.5, 1.0, 5.0, 20.0, 100.0] {
            let loss = trailing_losses(
                AngularVelocity::from_degrees_per_day(rate),
                0.8,
                Duration::from_secs(30),
            );
            assert!(loss.snr > previous);
            previous = loss.snr;
        }
    }

    #[test]
    fn test_trail_length() {
        let x = trail_length_in_seeing(
            AngularVelocity::from_arcsec_per_second(0.1),
            Duration::from_secs(20),
            0.5,
        );
        assert_relative_eq!(x, 4.0, epsilon = 1e-12);
    }
}
