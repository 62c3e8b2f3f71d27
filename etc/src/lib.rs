//! Exposure-time calculator for Rubin Observatory Target-of-Opportunity
//! follow-up.
//!
//! This crate converts between exposure time and 5σ limiting magnitude for
//! the six LSST filters under dark or twilight skies, including the loss
//! in depth suffered by targets that trail during the exposure. It also
//! estimates the telescope time needed to tile and image an event, and
//! converts V magnitudes of asteroids into survey bands.

pub mod budget;
pub mod calculator;
pub mod conditions;
pub mod config;
pub mod error;
pub mod hardware;
pub mod photometry;
pub mod shared_args;

// Re-exports for easier access
pub use budget::{campaign_time_budget, event_time_budget, EventPlan, EventTimeBudget, Overheads};
pub use calculator::{
    exposure_from_secs, exposure_time_for_magnitude, limiting_magnitude, ExposureSolution,
    ExposureTimeCalculator, SolverConfig,
};
pub use conditions::{ObservingConditions, SkyCondition};
pub use config::{ConfigError, EtcConfig};
pub use error::{EtcError, Result};
pub use hardware::{Band, BandParameters, BandTable, InstrumentConfig};
pub use photometry::{DepthModel, DepthModelKind, Taxonomy, TrailingLossModel};
