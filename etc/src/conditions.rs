//! Observing conditions for a single exposure.
//!
//! Conditions collect everything about the moment of observation that
//! the depth relations need: the sky surface brightness (elevated in
//! twilight), the airmass of the pointing, the delivered seeing and the
//! on-sky rate of motion of the target.

use serde::{Deserialize, Serialize};
use shared::units::{AngularVelocity, AngularVelocityExt};

use crate::error::{require_finite, require_positive, EtcError, Result};
use crate::hardware::bands::BandParameters;

/// Plausible range of sky surface brightness (mag/arcsec²).
///
/// Twilight-to-dark regimes sit within 17-22; the window is wider so that
/// bright-Moon and near-infrared skies are still accepted.
pub const SKY_BRIGHTNESS_RANGE: (f64, f64) = (10.0, 30.0);

/// Sky background regime of an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkyCondition {
    /// Astronomical night
    #[default]
    Dark,
    /// Near-Sun twilight pointings
    Twilight,
}

/// Conditions under which a single exposure is taken
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservingConditions {
    /// Sky surface brightness (mag/arcsec²); smaller is brighter
    pub sky_brightness: f64,
    /// Airmass of the pointing (≥ 1)
    pub airmass: f64,
    /// Delivered seeing FWHM (arcsec)
    pub seeing_arcsec: f64,
    /// On-sky rate of motion of the target
    pub angular_velocity: AngularVelocity,
}

impl ObservingConditions {
    /// Conditions for a stationary target
    pub fn new(sky_brightness: f64, airmass: f64, seeing_arcsec: f64) -> Self {
        Self {
            sky_brightness,
            airmass,
            seeing_arcsec,
            angular_velocity: AngularVelocity::stationary(),
        }
    }

    /// Nominal conditions of a band: its calibrated sky and seeing for the
    /// given regime at the given airmass.
    pub fn for_band(params: &BandParameters, sky: SkyCondition, airmass: f64) -> Result<Self> {
        let conditions = match sky {
            SkyCondition::Dark => Self::new(params.dark_sky_brightness, airmass, params.fwhm_arcsec),
            SkyCondition::Twilight => {
                match (params.twilight_sky_brightness, params.fwhm_twilight_arcsec) {
                    (Some(sky_brightness), Some(seeing)) => Self::new(sky_brightness, airmass, seeing),
                    _ => return Err(EtcError::NoTwilightCalibration { band: params.band }),
                }
            }
        };
        conditions.validate()?;
        Ok(conditions)
    }

    /// Same conditions for a target moving at `rate`
    pub fn with_angular_velocity(self, rate: AngularVelocity) -> Self {
        Self {
            angular_velocity: rate,
            ..self
        }
    }

    pub fn with_seeing(self, seeing_arcsec: f64) -> Self {
        Self {
            seeing_arcsec,
            ..self
        }
    }

    pub fn with_sky_brightness(self, sky_brightness: f64) -> Self {
        Self {
            sky_brightness,
            ..self
        }
    }

    /// Rate of motion in arcsec/s
    pub fn rate_arcsec_per_second(&self) -> f64 {
        self.angular_velocity.as_arcsec_per_second()
    }

    /// Reject non-physical conditions before any photometry is attempted.
    pub fn validate(&self) -> Result<()> {
        let sky = require_finite("sky brightness", self.sky_brightness)?;
        let (lo, hi) = SKY_BRIGHTNESS_RANGE;
        if !(lo..=hi).contains(&sky) {
            return Err(EtcError::InvalidInput(format!(
                "sky brightness {sky} mag/arcsec² is outside [{lo}, {hi}]"
            )));
        }

        let airmass = require_finite("airmass", self.airmass)?;
        if airmass < 1.0 {
            return Err(EtcError::InvalidInput(format!(
                "airmass must be at least 1, got {airmass}"
            )));
        }

        require_positive("seeing", self.seeing_arcsec)?;

        let rate = require_finite("angular velocity", self.rate_arcsec_per_second())?;
        if rate < 0.0 {
            return Err(EtcError::InvalidInput(format!(
                "angular velocity cannot be negative, got {rate} arcsec/s"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::bands::{models::RUBIN_LSST, Band};
    use approx::assert_relative_eq;

    #[test]
    fn test_dark_conditions_use_band_calibration() {
        let r = RUBIN_LSST.get(Band::R).unwrap();
        let conditions = ObservingConditions::for_band(r, SkyCondition::Dark, 1.2).unwrap();
        assert_eq!(conditions.sky_brightness, 21.2);
        assert_eq!(conditions.seeing_arcsec, 0.83);
        assert_eq!(conditions.airmass, 1.2);
        assert_eq!(conditions.rate_arcsec_per_second(), 0.0);
    }

    #[test]
    fn test_twilight_conditions() {
        let z = RUBIN_LSST.get(Band::Z).unwrap();
        let conditions = ObservingConditions::for_band(z, SkyCondition::Twilight, 2.0).unwrap();
        assert_eq!(conditions.sky_brightness, 17.92);
        assert_eq!(conditions.seeing_arcsec, 1.42);
    }

    #[test]
    fn test_twilight_unavailable_for_u_g_y() {
        for band in [Band::U, Band::G, Band::Y] {
            let params = RUBIN_LSST.get(band).unwrap();
            assert_eq!(
                ObservingConditions::for_band(params, SkyCondition::Twilight, 1.0),
                Err(EtcError::NoTwilightCalibration { band })
            );
        }
    }

    #[test]
    fn test_rate_conversion() {
        let conditions = ObservingConditions::new(21.0, 1.0, 0.7)
            .with_angular_velocity(AngularVelocity::from_degrees_per_day(12.0));
        assert_relative_eq!(conditions.rate_arcsec_per_second(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_rejects_non_physical() {
        let good = ObservingConditions::new(21.0, 1.2, 0.7);
        assert!(good.validate().is_ok());

        assert!(good.with_seeing(-0.7).validate().is_err());
        assert!(good.with_seeing(0.0).validate().is_err());
        assert!(ObservingConditions::new(21.0, 0.9, 0.7).validate().is_err());
        assert!(good.with_sky_brightness(f64::NAN).validate().is_err());
        assert!(good.with_sky_brightness(45.0).validate().is_err());
        assert!(good
            .with_angular_velocity(AngularVelocity::from_arcsec_per_second(-1.0))
            .validate()
            .is_err());
    }
}
