//! Survey filter bands and their depth calibration.
//!
//! Each band carries the constants of the SMTN-002 five-sigma depth
//! relation: the normalisation `Cm`, its infinite-exposure correction
//! `dCm∞`, the photometric zero point, nominal delivered seeing, dark-sky
//! brightness and atmospheric extinction. The r, i and z bands are also
//! calibrated for the near-Sun twilight survey, where the sky is brighter
//! and the seeing degraded by the low altitude of the pointings.
//!
//! # Examples
//!
//! ```rust
//! use etc::hardware::bands::{models::RUBIN_LSST, Band};
//!
//! let r = RUBIN_LSST.get(Band::R).unwrap();
//! assert_eq!(r.dark_sky_brightness, 21.2);
//! assert!(r.twilight_sky_brightness.is_some());
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{EtcError, Result};

/// Broad-band survey filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    U,
    G,
    R,
    I,
    Z,
    Y,
}

impl Band {
    /// All bands in wavelength order
    pub const ALL: [Band; 6] = [Band::U, Band::G, Band::R, Band::I, Band::Z, Band::Y];

    pub fn as_char(&self) -> char {
        match self {
            Band::U => 'u',
            Band::G => 'g',
            Band::R => 'r',
            Band::I => 'i',
            Band::Z => 'z',
            Band::Y => 'y',
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Band {
    type Err = EtcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u" => Ok(Band::U),
            "g" => Ok(Band::G),
            "r" => Ok(Band::R),
            "i" => Ok(Band::I),
            "z" => Ok(Band::Z),
            "y" => Ok(Band::Y),
            _ => Err(EtcError::UnknownBand(s.to_string())),
        }
    }
}

/// Depth calibration constants for a single band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandParameters {
    pub band: Band,
    /// SMTN-002 depth normalisation Cm (mag)
    pub cm: f64,
    /// Correction to Cm in the infinite-exposure limit (mag)
    pub dcm_inf: f64,
    /// Magnitude producing 1 e⁻/s on the detector
    pub zero_point: f64,
    /// Nominal delivered seeing FWHM (arcsec)
    pub fwhm_arcsec: f64,
    /// Delivered seeing during twilight pointings (arcsec)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fwhm_twilight_arcsec: Option<f64>,
    /// Zenith dark-sky surface brightness (mag/arcsec²)
    pub dark_sky_brightness: f64,
    /// Median twilight sky surface brightness (mag/arcsec²)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twilight_sky_brightness: Option<f64>,
    /// Atmospheric extinction coefficient (mag/airmass)
    pub extinction: f64,
}

impl BandParameters {
    /// Check that the constants are usable by the depth relations.
    pub fn validate(&self) -> Result<()> {
        let invalid = |what: &str| {
            Err(EtcError::InvalidInput(format!(
                "band {}: {what}",
                self.band
            )))
        };

        for (name, value) in [
            ("cm", self.cm),
            ("dcm_inf", self.dcm_inf),
            ("zero_point", self.zero_point),
            ("dark_sky_brightness", self.dark_sky_brightness),
            ("extinction", self.extinction),
        ] {
            if !value.is_finite() {
                return invalid(&format!("{name} must be finite"));
            }
        }
        if self.fwhm_arcsec.is_nan() || self.fwhm_arcsec <= 0.0 {
            return invalid("fwhm_arcsec must be positive");
        }
        if matches!(self.fwhm_twilight_arcsec, Some(f) if f.is_nan() || f <= 0.0) {
            return invalid("fwhm_twilight_arcsec must be positive");
        }
        if self.extinction < 0.0 {
            return invalid("extinction cannot be negative");
        }
        Ok(())
    }

    /// Whether the band has a twilight sky and seeing calibration
    pub fn has_twilight(&self) -> bool {
        self.fwhm_twilight_arcsec.is_some() && self.twilight_sky_brightness.is_some()
    }
}

/// Calibration constants for a set of bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandTable {
    bands: Vec<BandParameters>,
}

impl BandTable {
    pub fn new(bands: Vec<BandParameters>) -> Result<Self> {
        let table = Self { bands };
        table.validate()?;
        Ok(table)
    }

    /// Validate every band and reject duplicate entries.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for params in &self.bands {
            params.validate()?;
            if !seen.insert(params.band) {
                return Err(EtcError::InvalidInput(format!(
                    "band {} appears more than once",
                    params.band
                )));
            }
        }
        Ok(())
    }

    /// Look up the constants of a band
    pub fn get(&self, band: Band) -> Result<&BandParameters> {
        self.bands
            .iter()
            .find(|p| p.band == band)
            .ok_or(EtcError::MissingBand(band))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BandParameters> {
        self.bands.iter()
    }
}

/// Reference calibrations
pub mod models {
    use super::*;

    fn band(
        band: Band,
        cm: f64,
        dcm_inf: f64,
        zero_point: f64,
        fwhm_arcsec: f64,
        dark_sky_brightness: f64,
        extinction: f64,
    ) -> BandParameters {
        BandParameters {
            band,
            cm,
            dcm_inf,
            zero_point,
            fwhm_arcsec,
            fwhm_twilight_arcsec: None,
            dark_sky_brightness,
            twilight_sky_brightness: None,
            extinction,
        }
    }

    /// Rubin Observatory LSST survey values (SMTN-002, OpSim v4 era) with
    /// median twilight sky brightness and seeing for r, i and z.
    pub static RUBIN_LSST: Lazy<BandTable> = Lazy::new(|| BandTable {
        bands: vec![
            band(Band::U, 22.97, 0.54, 26.52, 0.92, 23.05, 0.47),
            band(Band::G, 24.58, 0.09, 28.51, 0.87, 22.25, 0.21),
            BandParameters {
                fwhm_twilight_arcsec: Some(1.43),
                twilight_sky_brightness: Some(19.47),
                ..band(Band::R, 24.60, 0.04, 28.36, 0.83, 21.20, 0.13)
            },
            BandParameters {
                fwhm_twilight_arcsec: Some(1.49),
                twilight_sky_brightness: Some(18.68),
                ..band(Band::I, 24.54, 0.03, 28.17, 0.80, 20.46, 0.10)
            },
            BandParameters {
                fwhm_twilight_arcsec: Some(1.42),
                twilight_sky_brightness: Some(17.92),
                ..band(Band::Z, 24.37, 0.02, 27.78, 0.78, 19.61, 0.07)
            },
            band(Band::Y, 23.84, 0.02, 26.82, 0.76, 18.60, 0.17),
        ],
    });
}
