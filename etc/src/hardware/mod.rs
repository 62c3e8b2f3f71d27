//! Survey filter calibration and detector constants

pub mod bands;
pub mod instrument;

pub use bands::{Band, BandParameters, BandTable};
pub use instrument::InstrumentConfig;
