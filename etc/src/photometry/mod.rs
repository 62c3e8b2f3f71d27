//! Photometry models: limiting depth, trailing losses and asteroid colours

pub mod depth;
pub mod taxonomy;
pub mod trailing;

pub use depth::{
    approximate_exposure_time, DepthModel, DepthModelKind, ParametricDepth, PhotonNoiseDepth,
};
pub use taxonomy::{v_to_band, Taxonomy};
pub use trailing::{trailing_losses, TrailingLossModel, TrailingLosses};
