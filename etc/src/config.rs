//! Calculator configuration persisted as JSON.
//!
//! Every field has a default, so a configuration file only needs to list
//! what it changes:
//!
//! ```json
//! { "depth_model": "photon-noise", "significance": 10.0 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::budget::{Overheads, DEFAULT_U_BAND_FRACTION};
use crate::calculator::SolverConfig;
use crate::error::{require_positive, EtcError};
use crate::hardware::bands::{models::RUBIN_LSST, BandTable};
use crate::hardware::instrument::InstrumentConfig;
use crate::photometry::depth::{DepthModelKind, DEFAULT_SIGNIFICANCE};
use crate::photometry::trailing::TrailingLossModel;

/// Errors raised while loading or saving a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] EtcError),
}

/// Complete calculator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtcConfig {
    /// Depth model used for limiting magnitudes
    pub depth_model: DepthModelKind,
    /// Detection significance in sigma
    pub significance: f64,
    /// Trailing-loss convention applied to moving targets
    pub trailing: TrailingLossModel,
    pub instrument: InstrumentConfig,
    pub solver: SolverConfig,
    pub overheads: Overheads,
    /// Fraction of nights with u mounted instead of y
    pub u_band_fraction: f64,
    /// Replacement calibration table; the Rubin table is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bands: Option<BandTable>,
}

impl Default for EtcConfig {
    fn default() -> Self {
        Self {
            depth_model: DepthModelKind::default(),
            significance: DEFAULT_SIGNIFICANCE,
            trailing: TrailingLossModel::default(),
            instrument: InstrumentConfig::default(),
            solver: SolverConfig::default(),
            overheads: Overheads::default(),
            u_band_fraction: DEFAULT_U_BAND_FRACTION,
            bands: None,
        }
    }
}

impl EtcConfig {
    /// Load and validate a configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), EtcError> {
        require_positive("significance", self.significance)?;
        if !(0.0..=1.0).contains(&self.u_band_fraction) {
            return Err(EtcError::InvalidInput(format!(
                "u band fraction must lie in [0, 1], got {}",
                self.u_band_fraction
            )));
        }
        self.instrument.validate()?;
        self.solver.validate()?;
        self.overheads.validate()?;
        if let Some(bands) = &self.bands {
            bands.validate()?;
        }
        Ok(())
    }

    /// Calibration table in effect
    pub fn band_table(&self) -> &BandTable {
        self.bands.as_ref().unwrap_or(&*RUBIN_LSST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::bands::{Band, BandParameters};
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_valid() {
        let config = EtcConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.depth_model, DepthModelKind::Parametric);
        assert_eq!(config.significance, 5.0);
        assert!(config.band_table().get(Band::R).is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("etc.json");

        let config = EtcConfig {
            depth_model: DepthModelKind::PhotonNoise,
            significance: 10.0,
            trailing: TrailingLossModel::Detection,
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = EtcConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "depth_model": "photon-noise", "solver": { "max_iterations": 50 } }"#).unwrap();

        let loaded = EtcConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.depth_model, DepthModelKind::PhotonNoise);
        assert_eq!(loaded.solver.max_iterations, 50);
        assert_eq!(loaded.solver.max_exposure_s, SolverConfig::default().max_exposure_s);
        assert_eq!(loaded.overheads, Overheads::default());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");

        std::fs::write(&path, r#"{ "significance": -1.0 }"#).unwrap();
        assert!(matches!(
            EtcConfig::load_from_file(&path),
            Err(ConfigError::Invalid(EtcError::InvalidInput(_)))
        ));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(EtcConfig::load_from_file(&path), Err(ConfigError::Parse(_))));

        assert!(matches!(
            EtcConfig::load_from_file(&dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_band_table_override() {
        let bands = RUBIN_LSST
            .iter()
            .map(|params| match params.band {
                Band::R => BandParameters {
                    cm: params.cm + 0.1,
                    ..params.clone()
                },
                _ => params.clone(),
            })
            .collect();
        let config = EtcConfig {
            bands: Some(BandTable::new(bands).unwrap()),
            ..Default::default()
        };

        let default_cm = RUBIN_LSST.get(Band::R).unwrap().cm;
        assert_relative_eq!(config.band_table().get(Band::R).unwrap().cm, default_cm + 0.1);
        assert!(config.validate().is_ok());
    }
}
