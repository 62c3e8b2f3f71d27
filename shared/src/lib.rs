//! Shared components for the exposure-time tools.
//!
//! Unit conversions for on-sky rates of motion and the `start:stop:step`
//! range argument used by the command-line parameter sweeps.

pub mod range_arg;
pub mod units;

pub use range_arg::RangeArg;
pub use units::{AngularVelocity, AngularVelocityExt};
