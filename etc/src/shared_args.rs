use std::path::PathBuf;

use clap::Parser;
use shared::units::{AngularVelocity, AngularVelocityExt};

use crate::conditions::{ObservingConditions, SkyCondition};
use crate::config::{ConfigError, EtcConfig};
use crate::error::Result;
use crate::hardware::bands::{Band, BandTable};

/// Observation arguments shared by the calculator subcommands
#[derive(Parser, Debug, Clone)]
pub struct ObservationArgs {
    /// Filter band
    #[arg(long, value_enum, default_value_t = Band::R)]
    pub band: Band,

    /// Airmass of the observation
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub airmass: f64,

    /// Observe in twilight (r, i and z only)
    #[arg(long, default_value_t = false)]
    pub twilight: bool,

    /// Sky brightness in mag/arcsec², overriding the band calibration
    #[arg(long, allow_negative_numbers = true)]
    pub sky: Option<f64>,

    /// Seeing FWHM in arcsec, overriding the band calibration
    #[arg(long, allow_negative_numbers = true)]
    pub seeing: Option<f64>,

    /// Rate of motion of the target in deg/day
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub rate: f64,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ObservationArgs {
    pub fn sky_condition(&self) -> SkyCondition {
        if self.twilight {
            SkyCondition::Twilight
        } else {
            SkyCondition::Dark
        }
    }

    /// Configuration from `--config`, or the defaults
    pub fn load_config(&self) -> std::result::Result<EtcConfig, ConfigError> {
        match &self.config {
            Some(path) => EtcConfig::load_from_file(path),
            None => Ok(EtcConfig::default()),
        }
    }

    /// Observing conditions for the selected band with any overrides applied
    pub fn conditions(&self, bands: &BandTable) -> Result<ObservingConditions> {
        let params = bands.get(self.band)?;
        let mut conditions = ObservingConditions::for_band(params, self.sky_condition(), self.airmass)?
            .with_angular_velocity(AngularVelocity::from_degrees_per_day(self.rate));
        if let Some(sky) = self.sky {
            conditions = conditions.with_sky_brightness(sky);
        }
        if let Some(seeing) = self.seeing {
            conditions = conditions.with_seeing(seeing);
        }
        conditions.validate()?;
        Ok(conditions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtcError;
    use crate::hardware::bands::models::RUBIN_LSST;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        observation: ObservationArgs,
    }

    fn parse(args: &[&str]) -> ObservationArgs {
        let argv = std::iter::once("etc").chain(args.iter().copied());
        TestCli::try_parse_from(argv).unwrap().observation
    }

    #[test]
    fn test_defaults_use_dark_r_band() {
        let args = parse(&[]);
        let conditions = args.conditions(&RUBIN_LSST).unwrap();
        let r = RUBIN_LSST.get(Band::R).unwrap();
        assert_eq!(conditions.sky_brightness, r.dark_sky_brightness);
        assert_eq!(conditions.seeing_arcsec, r.fwhm_arcsec);
        assert_eq!(conditions.airmass, 1.0);
        assert_eq!(conditions.rate_arcsec_per_second(), 0.0);
    }

    #[test]
    fn test_overrides_and_rate() {
        let args = parse(&["--band", "i", "--sky", "19.5", "--seeing", "1.1", "--rate", "24"]);
        let conditions = args.conditions(&RUBIN_LSST).unwrap();
        assert_eq!(conditions.sky_brightness, 19.5);
        assert_eq!(conditions.seeing_arcsec, 1.1);
        assert!((conditions.rate_arcsec_per_second() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_twilight_requires_calibration() {
        assert!(parse(&["--band", "z", "--twilight"]).conditions(&RUBIN_LSST).is_ok());
        assert!(parse(&["--band", "g", "--twilight"]).conditions(&RUBIN_LSST).is_err());
    }

    #[test]
    fn test_rejects_bad_override() {
        let args = parse(&["--seeing", "-0.5"]);
        assert_eq!(args.seeing, Some(-0.5));
        assert!(matches!(args.conditions(&RUBIN_LSST), Err(EtcError::InvalidInput(_))));

        let args = parse(&["--rate", "-3"]);
        assert!(matches!(args.conditions(&RUBIN_LSST), Err(EtcError::InvalidInput(_))));
    }
}
