//! V-band to survey-band colour terms for asteroids.
//!
//! Ephemeris services predict asteroid brightness in Johnson V. To compare
//! against a survey depth the prediction is moved into the survey band
//! with the mean colours of the target's taxonomic class (Veres et al.
//! 2015, Pan-STARRS AB magnitudes). When the class is not known, use
//! [`Taxonomy::Mean`], the average of the S and C complexes and the
//! default; unrecognised class names are rejected when parsed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EtcError;
use crate::hardware::bands::Band;

/// Asteroid taxonomic class, or an averaged colour set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Taxonomy {
    /// Solar colours
    Solar,
    /// Average of the S and C complexes
    #[default]
    Mean,
    S,
    C,
    Q,
    X,
    D,
    /// Weighted by the occurrence of each class among NEOs
    Neo,
}

impl Taxonomy {
    /// `V - band` colour, when the band has a transformation
    pub fn v_minus(&self, band: Band) -> Option<f64> {
        // g, r, i, z, y
        let colours: [f64; 5] = match self {
            Taxonomy::Solar => [-0.217, 0.183, 0.293, 0.311, 0.311],
            Taxonomy::Mean => [-0.28, 0.230, 0.390, 0.37, 0.36],
            Taxonomy::S => [-0.325, 0.275, 0.470, 0.416, 0.411],
            Taxonomy::C => [-0.238, 0.194, 0.308, 0.320, 0.316],
            Taxonomy::Q => [-0.312, 0.252, 0.379, 0.238, 0.158],
            Taxonomy::X => [-0.247, 0.207, 0.367, 0.419, 0.450],
            Taxonomy::D => [-0.281, 0.246, 0.460, 0.551, 0.627],
            Taxonomy::Neo => [-0.254, 0.213, 0.356, 0.322, 0.314],
        };
        let index = match band {
            Band::U => return None,
            Band::G => 0,
            Band::R => 1,
            Band::I => 2,
            Band::Z => 3,
            Band::Y => 4,
        };
        Some(colours[index])
    }
}

impl FromStr for Taxonomy {
    type Err = EtcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SOLAR" | "SUN" => Ok(Taxonomy::Solar),
            "MEAN" => Ok(Taxonomy::Mean),
            "S" => Ok(Taxonomy::S),
            "C" => Ok(Taxonomy::C),
            "Q" => Ok(Taxonomy::Q),
            "X" => Ok(Taxonomy::X),
            "D" => Ok(Taxonomy::D),
            "NEO" => Ok(Taxonomy::Neo),
            _ => Err(EtcError::UnknownTaxonomy(s.to_string())),
        }
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Taxonomy::Solar => "solar",
            Taxonomy::Mean => "mean",
            Taxonomy::S => "S",
            Taxonomy::C => "C",
            Taxonomy::Q => "Q",
            Taxonomy::X => "X",
            Taxonomy::D => "D",
            Taxonomy::Neo => "NEO",
        };
        f.write_str(name)
    }
}

/// Convert a V magnitude to `band` for an asteroid of the given class.
///
/// Returns `None` for bands without a colour transformation (u).
pub fn v_to_band(mag_v: f64, band: Band, taxonomy: Taxonomy) -> Option<f64> {
    taxonomy.v_minus(band).map(|colour| mag_v - colour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_colours() {
        assert_relative_eq!(v_to_band(20.0, Band::G, Taxonomy::Mean).unwrap(), 20.28, epsilon = 1e-12);
        assert_relative_eq!(v_to_band(20.0, Band::R, Taxonomy::Mean).unwrap(), 19.77, epsilon = 1e-12);
    }

    #[test]
    fn test_class_specific_colours() {
        assert_relative_eq!(v_to_band(18.5, Band::Z, Taxonomy::D).unwrap(), 18.5 - 0.551, epsilon = 1e-12);
        assert_relative_eq!(v_to_band(18.5, Band::Y, Taxonomy::Q).unwrap(), 18.5 - 0.158, epsilon = 1e-12);
    }

    #[test]
    fn test_u_band_has_no_transformation() {
        assert_eq!(v_to_band(20.0, Band::U, Taxonomy::S), None);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("neo".parse::<Taxonomy>().unwrap(), Taxonomy::Neo);
        assert_eq!("Solar".parse::<Taxonomy>().unwrap(), Taxonomy::Solar);
        assert_eq!("s".parse::<Taxonomy>().unwrap(), Taxonomy::S);
        assert!(matches!(
            "V".parse::<Taxonomy>(),
            Err(EtcError::UnknownTaxonomy(_))
        ));
    }

    #[test]
    fn test_unknown_class_is_rejected_not_defaulted() {
        assert_eq!(Taxonomy::default(), Taxonomy::Mean);
        assert_eq!(
            "B".parse::<Taxonomy>(),
            Err(EtcError::UnknownTaxonomy("B".to_string()))
        );
    }
}
