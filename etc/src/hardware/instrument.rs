//! Detector constants for the photon-noise depth model

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{EtcError, Result};

/// Camera characteristics entering the per-pixel noise budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Angular size of a pixel on the sky (arcsec)
    pub pixel_scale_arcsec: f64,
    /// Read noise per pixel (e⁻ RMS)
    pub read_noise_e: f64,
    /// Conversion gain (e⁻ per ADU)
    pub gain_e_per_adu: f64,
}

impl InstrumentConfig {
    pub fn new(pixel_scale_arcsec: f64, read_noise_e: f64, gain_e_per_adu: f64) -> Result<Self> {
        let config = Self {
            pixel_scale_arcsec,
            read_noise_e,
            gain_e_per_adu,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.pixel_scale_arcsec > 0.0 && self.pixel_scale_arcsec.is_finite()) {
            return Err(EtcError::InvalidInput(format!(
                "pixel scale must be positive, got {}",
                self.pixel_scale_arcsec
            )));
        }
        if !(self.read_noise_e >= 0.0 && self.read_noise_e.is_finite()) {
            return Err(EtcError::InvalidInput(format!(
                "read noise cannot be negative, got {}",
                self.read_noise_e
            )));
        }
        if !(self.gain_e_per_adu > 0.0 && self.gain_e_per_adu.is_finite()) {
            return Err(EtcError::InvalidInput(format!(
                "gain must be positive, got {}",
                self.gain_e_per_adu
            )));
        }
        Ok(())
    }

    /// Instrumental noise variance per pixel in e⁻².
    ///
    /// Read noise plus the uniform digitisation noise of one ADU step,
    /// `gain² / 12`.
    pub fn noise_variance_per_pixel(&self) -> f64 {
        self.read_noise_e.powi(2) + self.gain_e_per_adu.powi(2) / 12.0
    }

    /// Solid angle of one pixel (arcsec²)
    pub fn pixel_area_arcsec2(&self) -> f64 {
        self.pixel_scale_arcsec.powi(2)
    }
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        models::LSST_CAMERA.clone()
    }
}

/// Reference detectors
pub mod models {
    use super::*;

    /// LSSTCam: 0.2"/px, 8.8 e⁻ read noise, unity gain
    pub static LSST_CAMERA: Lazy<InstrumentConfig> = Lazy::new(|| InstrumentConfig {
        pixel_scale_arcsec: 0.2,
        read_noise_e: 8.8,
        gain_e_per_adu: 1.0,
    });
}
