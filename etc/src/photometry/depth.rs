//! Limiting-magnitude models.
//!
//! A [`DepthModel`] gives the faintest magnitude detected at a given
//! significance for one exposure. Trailing enters every model the same
//! way, as a growth factor of the effective PSF area.
//!
//! Two models are provided:
//!
//! - [`ParametricDepth`]: the SMTN-002 relation calibrated against the
//!   survey's own throughput simulations. Reproduces the survey's
//!   published five-sigma depths and is the default.
//! - [`PhotonNoiseDepth`]: the CCD equation solved for the source counts
//!   at the requested significance, from the zero point, sky flux,
//!   effective PSF area and detector noise.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conditions::ObservingConditions;
use crate::error::{require_positive, Result};
use crate::hardware::bands::BandParameters;
use crate::hardware::instrument::InstrumentConfig;

/// Significance at which the survey quotes its depths
pub const DEFAULT_SIGNIFICANCE: f64 = 5.0;

/// Reference exposure of the SMTN-002 calibration (s)
pub const REFERENCE_EXPOSURE_S: f64 = 30.0;

/// Noise-equivalent area of a Gaussian PSF in units of FWHM²
pub const GAUSSIAN_NEFF_FACTOR: f64 = 2.266;

/// A model of the limiting magnitude reached by a single exposure
pub trait DepthModel: fmt::Debug + Send + Sync {
    /// Limiting magnitude of an exposure of `exposure_s` seconds.
    ///
    /// `psf_area_scale` multiplies the effective PSF area (1 for a
    /// stationary source). Inputs are assumed validated by the caller.
    fn depth(
        &self,
        exposure_s: f64,
        conditions: &ObservingConditions,
        band: &BandParameters,
        psf_area_scale: f64,
    ) -> f64;

    /// Detection significance in sigma
    fn significance(&self) -> f64;

    fn name(&self) -> &'static str;

    /// Reject model parameters that would make the depth non-finite.
    fn validate(&self) -> Result<()> {
        require_positive("significance", self.significance())?;
        Ok(())
    }
}

/// SMTN-002 parametric depth relation
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricDepth {
    significance: f64,
}

impl ParametricDepth {
    pub fn new(significance: f64) -> Self {
        Self { significance }
    }

    /// Change of Cm for exposures longer or shorter than the reference,
    /// accounting for read noise becoming relatively more important in
    /// short exposures and dark skies.
    pub fn delta_cm(exposure_s: f64, sky_brightness: f64, band: &BandParameters) -> f64 {
        let t_scale = exposure_s / REFERENCE_EXPOSURE_S
            * 10f64.powf(-0.4 * (sky_brightness - band.dark_sky_brightness));
        band.dcm_inf - 1.25 * (1.0 + (10f64.powf(0.8 * band.dcm_inf) - 1.0) / t_scale).log10()
    }
}

impl Default for ParametricDepth {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNIFICANCE)
    }
}

/// Exposure-independent part of the SMTN-002 relation: sky, seeing and
/// extinction terms relative to the reference conditions.
fn conditions_offset(conditions: &ObservingConditions, band: &BandParameters) -> f64 {
    0.5 * (conditions.sky_brightness - 21.0) + 2.5 * (0.7 / conditions.seeing_arcsec).log10()
        - band.extinction * (conditions.airmass - 1.0)
}

impl DepthModel for ParametricDepth {
    fn depth(
        &self,
        exposure_s: f64,
        conditions: &ObservingConditions,
        band: &BandParameters,
        psf_area_scale: f64,
    ) -> f64 {
        let dcm = Self::delta_cm(exposure_s, conditions.sky_brightness, band);
        let m5 = band.cm
            + dcm
            + conditions_offset(conditions, band)
            + 1.25 * (exposure_s / REFERENCE_EXPOSURE_S).log10();

        // Background-limited scaling: the area term and the threshold both
        // enter through the noise, the threshold linearly in flux.
        m5 - 1.25 * psf_area_scale.log10()
            - 2.5 * (self.significance / DEFAULT_SIGNIFICANCE).log10()
    }

    fn significance(&self) -> f64 {
        self.significance
    }

    fn name(&self) -> &'static str {
        "parametric"
    }
}

/// CCD-equation depth from photon and detector noise
#[derive(Debug, Clone, PartialEq)]
pub struct PhotonNoiseDepth {
    instrument: InstrumentConfig,
    significance: f64,
}

impl PhotonNoiseDepth {
    pub fn new(instrument: InstrumentConfig, significance: f64) -> Self {
        Self {
            instrument,
            significance,
        }
    }

    pub fn instrument(&self) -> &InstrumentConfig {
        &self.instrument
    }

    /// Noise-equivalent number of pixels of the (possibly trailed) PSF
    pub fn effective_pixels(&self, seeing_arcsec: f64, psf_area_scale: f64) -> f64 {
        GAUSSIAN_NEFF_FACTOR * (seeing_arcsec / self.instrument.pixel_scale_arcsec).powi(2)
            * psf_area_scale
    }

    /// Sky electrons collected per pixel during the exposure
    pub fn sky_electrons_per_pixel(
        &self,
        exposure_s: f64,
        sky_brightness: f64,
        band: &BandParameters,
    ) -> f64 {
        10f64.powf(-0.4 * (sky_brightness - band.zero_point))
            * self.instrument.pixel_area_arcsec2()
            * exposure_s
    }

    /// Source electrons needed to reach the significance threshold.
    ///
    /// Solves `ν = C / sqrt(C + N)` for `C`, where `N` is the background
    /// and detector variance summed over the effective PSF area.
    pub fn threshold_electrons(&self, background_variance: f64) -> f64 {
        let nu2 = self.significance.powi(2);
        (nu2 + (nu2 * nu2 + 4.0 * nu2 * background_variance).sqrt()) / 2.0
    }
}

impl Default for PhotonNoiseDepth {
    fn default() -> Self {
        Self::new(InstrumentConfig::default(), DEFAULT_SIGNIFICANCE)
    }
}

impl DepthModel for PhotonNoiseDepth {
    fn depth(
        &self,
        exposure_s: f64,
        conditions: &ObservingConditions,
        band: &BandParameters,
        psf_area_scale: f64,
    ) -> f64 {
        let n_eff = self.effective_pixels(conditions.seeing_arcsec, psf_area_scale);
        let sky = self.sky_electrons_per_pixel(exposure_s, conditions.sky_brightness, band);
        let variance = n_eff * (sky + self.instrument.noise_variance_per_pixel());
        let counts = self.threshold_electrons(variance);

        band.zero_point
            - 2.5 * (counts / exposure_s).log10()
            - band.extinction * (conditions.airmass - 1.0)
    }

    fn significance(&self) -> f64 {
        self.significance
    }

    fn name(&self) -> &'static str {
        "photon-noise"
    }

    fn validate(&self) -> Result<()> {
        require_positive("significance", self.significance)?;
        self.instrument.validate()
    }
}

/// Selects a depth model from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DepthModelKind {
    #[default]
    Parametric,
    PhotonNoise,
}

impl DepthModelKind {
    pub fn build(&self, instrument: &InstrumentConfig, significance: f64) -> Box<dyn DepthModel> {
        match self {
            DepthModelKind::Parametric => Box::new(ParametricDepth::new(significance)),
            DepthModelKind::PhotonNoise => {
                Box::new(PhotonNoiseDepth::new(instrument.clone(), significance))
            }
        }
    }
}

/// Closed-form exposure time for a stationary source, taking dCm = 0.
///
/// This is the quick inversion of the SMTN-002 relation used for
/// planning tables. It is exact at the 30 s reference exposure in dark
/// sky and within a fraction of a second for exposures near 30 s; use
/// the calculator's solver when the exact inverse is needed.
pub fn approximate_exposure_time(
    m5: f64,
    conditions: &ObservingConditions,
    band: &BandParameters,
) -> f64 {
    REFERENCE_EXPOSURE_S
        * 10f64.powf((m5 - band.cm - conditions_offset(conditions, band)) / 1.25)
}
