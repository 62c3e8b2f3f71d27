//! Type-safe angular rates for moving-target calculations
//!
//! Exposure-time work quotes sky-plane rates in arcsec/s while ephemeris
//! services report them in deg/day. Both are carried as a `uom`
//! [`AngularVelocity`] so the two conventions cannot be mixed at call sites.

use std::f64::consts::PI;

use uom::si::angular_velocity::radian_per_second;

/// Angular velocity of a target across the sky
pub type AngularVelocity = uom::si::f64::AngularVelocity;

/// Arcseconds in one radian
pub const ARCSEC_PER_RADIAN: f64 = 180.0 * 3600.0 / PI;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Extension trait for the rate units used in survey planning
pub trait AngularVelocityExt {
    /// Create a rate from arcseconds per second
    fn from_arcsec_per_second(rate: f64) -> Self;

    /// Get the rate in arcseconds per second
    fn as_arcsec_per_second(&self) -> f64;

    /// Create a rate from degrees per day (ephemeris convention)
    fn from_degrees_per_day(rate: f64) -> Self;

    /// Get the rate in degrees per day
    fn as_degrees_per_day(&self) -> f64;

    /// A stationary target
    fn stationary() -> Self;
}

impl AngularVelocityExt for AngularVelocity {
    fn from_arcsec_per_second(rate: f64) -> Self {
        AngularVelocity::new::<radian_per_second>(rate / ARCSEC_PER_RADIAN)
    }

    fn as_arcsec_per_second(&self) -> f64 {
        self.get::<radian_per_second>() * ARCSEC_PER_RADIAN
    }

    fn from_degrees_per_day(rate: f64) -> Self {
        Self::from_arcsec_per_second(rate * 3600.0 / SECONDS_PER_DAY)
    }

    fn as_degrees_per_day(&self) -> f64 {
        self.as_arcsec_per_second() * SECONDS_PER_DAY / 3600.0
    }

    fn stationary() -> Self {
        AngularVelocity::new::<radian_per_second>(0.0)
    }
}
