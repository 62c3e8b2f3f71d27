//! Exposure-time calculator.
//!
//! Converts between exposure time and limiting magnitude in both
//! directions. The forward direction is a direct evaluation of the depth
//! model with the trailing inflation of the PSF for the given exposure.
//!
//! The inverse has a circular dependency for moving targets: the trailing
//! loss depends on the trail length, which depends on the exposure time
//! being solved for. It is solved by a secant iteration in log exposure,
//!
//! `log t ← log t + (m_target − m(t)) / s`
//!
//! where the slope `s` starts at the background-limited 1.25 mag/dex and
//! is then measured from the last two iterates. Fast movers flatten the
//! slope and can make the depth saturate (SNR trailing) or turn over
//! (detection trailing). When the slope stops being positive or a step
//! leaves the allowed exposure range, the solver hands over to a
//! log-spaced scan and bisection. A target deeper than anything reachable
//! within `max_exposure_s` is reported as [`EtcError::Infeasible`]; running
//! out of iterations is [`EtcError::NonConvergence`].

use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::conditions::ObservingConditions;
use crate::config::EtcConfig;
use crate::error::{require_finite, require_positive, EtcError, Result};
use crate::hardware::bands::BandParameters;
use crate::photometry::depth::{approximate_exposure_time, DepthModel, ParametricDepth};
use crate::photometry::trailing::TrailingLossModel;

/// Shortest exposure the solver will consider (s)
pub const MIN_EXPOSURE_S: f64 = 1.0e-3;

/// Longest exposure limit a solver may be configured with: one year (s)
pub const MAX_EXPOSURE_LIMIT_S: f64 = 365.25 * 86_400.0;

/// Points in the fallback scan of the exposure range
const SCAN_POINTS: usize = 96;

/// Depth gained per decade of exposure in the background limit (mag/dex)
const BACKGROUND_LIMITED_SLOPE: f64 = 1.25;

/// Convergence and range limits of the exposure-time inversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Iteration cap applied to each solver stage
    pub max_iterations: usize,
    /// Accepted |target − achieved| in magnitudes
    pub magnitude_tolerance: f64,
    /// Accepted relative change of the exposure over the last step
    pub exposure_tolerance: f64,
    /// Longest exposure considered before declaring a target infeasible (s)
    pub max_exposure_s: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            magnitude_tolerance: 1.0e-3,
            exposure_tolerance: 1.0e-3,
            max_exposure_s: 86_400.0,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(EtcError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        require_positive("magnitude tolerance", self.magnitude_tolerance)?;
        require_positive("exposure tolerance", self.exposure_tolerance)?;
        if !(self.max_exposure_s > MIN_EXPOSURE_S && self.max_exposure_s <= MAX_EXPOSURE_LIMIT_S) {
            return Err(EtcError::InvalidInput(format!(
                "max exposure must lie in ({MIN_EXPOSURE_S}, {MAX_EXPOSURE_LIMIT_S}] s, got {}",
                self.max_exposure_s
            )));
        }
        Ok(())
    }

    /// Largest converged step in log10 exposure
    fn log_exposure_tolerance(&self) -> f64 {
        self.exposure_tolerance.ln_1p() / std::f64::consts::LN_10
    }
}

/// Result of an exposure-time inversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureSolution {
    pub exposure: Duration,
    /// Limiting magnitude reached by `exposure`
    pub achieved_magnitude: f64,
    /// Solver steps taken
    pub iterations: usize,
}

/// Exposure-time calculator for one depth model and trailing convention
#[derive(Debug)]
pub struct ExposureTimeCalculator {
    model: Box<dyn DepthModel>,
    trailing: TrailingLossModel,
    solver: SolverConfig,
}

impl Default for ExposureTimeCalculator {
    fn default() -> Self {
        Self::new(
            Box::new(ParametricDepth::default()),
            TrailingLossModel::default(),
            SolverConfig::default(),
        )
    }
}

impl ExposureTimeCalculator {
    pub fn new(model: Box<dyn DepthModel>, trailing: TrailingLossModel, solver: SolverConfig) -> Self {
        Self {
            model,
            trailing,
            solver,
        }
    }

    pub fn from_config(config: &EtcConfig) -> Self {
        Self::new(
            config
                .depth_model
                .build(&config.instrument, config.significance),
            config.trailing,
            config.solver.clone(),
        )
    }

    pub fn model(&self) -> &dyn DepthModel {
        self.model.as_ref()
    }

    pub fn trailing(&self) -> TrailingLossModel {
        self.trailing
    }

    pub fn solver(&self) -> &SolverConfig {
        &self.solver
    }

    /// PSF area inflation from trailing during an exposure of `exposure_s`
    fn psf_area_scale(&self, exposure_s: f64, conditions: &ObservingConditions) -> f64 {
        let trail = conditions.rate_arcsec_per_second() * exposure_s / conditions.seeing_arcsec;
        self.trailing.coefficients().area_scale(trail)
    }

    fn depth_at(&self, exposure_s: f64, conditions: &ObservingConditions, band: &BandParameters) -> f64 {
        let scale = self.psf_area_scale(exposure_s, conditions);
        self.model.depth(exposure_s, conditions, band, scale)
    }

    /// Trailing loss in magnitudes for the configured convention
    pub fn trailing_loss(&self, exposure: Duration, conditions: &ObservingConditions) -> f64 {
        1.25 * self
            .psf_area_scale(exposure.as_secs_f64(), conditions)
            .log10()
    }

    /// Limiting magnitude reached by one exposure.
    ///
    /// # Errors
    /// [`EtcError::InvalidInput`] for a zero exposure or non-physical
    /// conditions or band constants.
    pub fn limiting_magnitude(
        &self,
        exposure: Duration,
        conditions: &ObservingConditions,
        band: &BandParameters,
    ) -> Result<f64> {
        let exposure_s = exposure.as_secs_f64();
        if exposure_s <= 0.0 {
            return Err(EtcError::InvalidInput(
                "exposure time must be positive".to_string(),
            ));
        }
        conditions.validate()?;
        band.validate()?;
        self.model.validate()?;

        Ok(self.depth_at(exposure_s, conditions, band))
    }

    /// Exposure time needed to reach `target` magnitude.
    pub fn exposure_time_for_magnitude(
        &self,
        target: f64,
        conditions: &ObservingConditions,
        band: &BandParameters,
    ) -> Result<Duration> {
        self.solve_exposure_time(target, conditions, band)
            .map(|solution| solution.exposure)
    }

    /// Solve for the exposure reaching `target` magnitude.
    ///
    /// # Errors
    /// - [`EtcError::InvalidInput`] for non-physical inputs
    /// - [`EtcError::Infeasible`] when no exposure up to `max_exposure_s`
    ///   reaches the target
    /// - [`EtcError::NonConvergence`] when the iteration cap is hit first
    pub fn solve_exposure_time(
        &self,
        target: f64,
        conditions: &ObservingConditions,
        band: &BandParameters,
    ) -> Result<ExposureSolution> {
        require_finite("target magnitude", target)?;
        conditions.validate()?;
        band.validate()?;
        self.model.validate()?;
        self.solver.validate()?;

        let tolerance = self.solver.magnitude_tolerance;
        let step_tolerance = self.solver.log_exposure_tolerance();
        let log_min = MIN_EXPOSURE_S.log10();
        let log_max = self.solver.max_exposure_s.log10();

        let seed = approximate_exposure_time(target, conditions, band);
        let mut log_t = seed.log10().clamp(log_min, log_max);
        let mut slope = BACKGROUND_LIMITED_SLOPE;
        let mut step = f64::INFINITY;
        let mut previous: Option<(f64, f64)> = None;

        for iteration in 1..=self.solver.max_iterations {
            let exposure_s = 10f64.powf(log_t);
            let achieved = self.depth_at(exposure_s, conditions, band);
            let residual = target - achieved;
            if let Some((prev_log_t, prev_achieved)) = previous {
                if log_t != prev_log_t {
                    slope = (achieved - prev_achieved) / (log_t - prev_log_t);
                }
            }
            debug!(
                "secant {iteration}: t = {exposure_s:.4} s, m = {achieved:.5}, \
                 residual = {residual:+.2e}, slope = {slope:.4} mag/dex"
            );

            if residual.abs() <= tolerance && step.abs() <= step_tolerance {
                return Ok(ExposureSolution {
                    exposure: Duration::from_secs_f64(exposure_s),
                    achieved_magnitude: achieved,
                    iterations: iteration,
                });
            }

            // Saturated or turned-over depth curve
            if slope.is_nan() || slope <= 0.0 {
                warn!("depth no longer grows with exposure at {exposure_s:.3} s, scanning the exposure range");
                return self.bracket_and_bisect(target, conditions, band, iteration);
            }

            step = residual / slope;
            let next = log_t + step;
            if !(log_min..=log_max).contains(&next) {
                warn!(
                    "secant step to {:.3e} s left [{MIN_EXPOSURE_S}, {}] s, scanning the exposure range",
                    10f64.powf(next),
                    self.solver.max_exposure_s
                );
                return self.bracket_and_bisect(target, conditions, band, iteration);
            }
            previous = Some((log_t, achieved));
            log_t = next;
        }

        warn!(
            "secant iteration did not settle after {} steps, scanning the exposure range",
            self.solver.max_iterations
        );
        self.bracket_and_bisect(target, conditions, band, self.solver.max_iterations)
    }

    /// Fallback inversion: scan log exposure for the first point deep
    /// enough, then bisect between it and its predecessor.
    ///
    /// The first crossing is the shortest exposure reaching `target`, which
    /// puts the solution on the rising branch when the depth turns over.
    fn bracket_and_bisect(
        &self,
        target: f64,
        conditions: &ObservingConditions,
        band: &BandParameters,
        iterations_used: usize,
    ) -> Result<ExposureSolution> {
        let tolerance = self.solver.magnitude_tolerance;
        let width_tolerance = self.solver.log_exposure_tolerance();
        let log_min = MIN_EXPOSURE_S.log10();
        let log_max = self.solver.max_exposure_s.log10();
        let log_t = |i: usize| log_min + (log_max - log_min) * i as f64 / (SCAN_POINTS - 1) as f64;

        let mut ceiling = f64::NEG_INFINITY;
        let mut bracket = None;
        for i in 0..SCAN_POINTS {
            let depth = self.depth_at(10f64.powf(log_t(i)), conditions, band);
            ceiling = ceiling.max(depth);
            if depth >= target {
                bracket = Some(i);
                break;
            }
        }

        let Some(upper_index) = bracket else {
            return Err(EtcError::Infeasible {
                target,
                ceiling,
                max_exposure_s: self.solver.max_exposure_s,
            });
        };

        let mut hi = log_t(upper_index);
        let mut lo = if upper_index == 0 { hi } else { log_t(upper_index - 1) };
        let mut iterations = iterations_used;
        let mut residual = f64::INFINITY;

        for _ in 0..self.solver.max_iterations {
            iterations += 1;
            let mid = 0.5 * (lo + hi);
            let achieved = self.depth_at(10f64.powf(mid), conditions, band);
            residual = target - achieved;
            debug!("bisection {iterations}: t = {:.4} s, residual = {residual:+.2e}", 10f64.powf(mid));

            // Already deep enough at the shortest exposure considered
            let at_floor = upper_index == 0;
            if at_floor || (residual.abs() <= tolerance && hi - lo <= width_tolerance) {
                return Ok(ExposureSolution {
                    exposure: Duration::from_secs_f64(10f64.powf(mid)),
                    achieved_magnitude: achieved,
                    iterations,
                });
            }
            if residual > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        Err(EtcError::NonConvergence {
            iterations,
            residual,
        })
    }
}

/// Convert seconds into an exposure duration, rejecting zero, negative
/// and non-finite values.
pub fn exposure_from_secs(seconds: f64) -> Result<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(EtcError::InvalidInput(format!(
            "exposure time must be a positive number of seconds, got {seconds}"
        )));
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        EtcError::InvalidInput(format!("exposure time of {seconds} s is too long"))
    })
}

/// Limiting magnitude with the default calculator (SMTN-002 depth, SNR
/// trailing loss, five sigma).
pub fn limiting_magnitude(
    exposure: Duration,
    conditions: &ObservingConditions,
    band: &BandParameters,
) -> Result<f64> {
    ExposureTimeCalculator::default().limiting_magnitude(exposure, conditions, band)
}

/// Exposure time to reach `target` with the default calculator.
pub fn exposure_time_for_magnitude(
    target: f64,
    conditions: &ObservingConditions,
    band: &BandParameters,
) -> Result<Duration> {
    ExposureTimeCalculator::default().exposure_time_for_magnitude(target, conditions, band)
}
