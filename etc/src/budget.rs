//! Time budgets for Target-of-Opportunity follow-up.
//!
//! A ToO event is followed by tiling `n_fields` pointings and taking one
//! visit per pointing: a sequence of exposures through different filters.
//! The budget adds the shutter-open time and three overheads:
//!
//! - readout between exposures, paid for every exposure of every field;
//! - the first slew to the event, paid once;
//! - filter changes, paid once per filter because the tiling is completed
//!   in one filter before changing to the next.
//!
//! The camera holds five of the six filters at a time. A plan asking for
//! both u and y therefore cannot be executed as-is on a single night: the
//! u exposure is taken on a fraction of nights and y on the rest, so the
//! two are weighted by that fraction and occupy a single filter slot.

use std::iter::Sum;
use std::ops::Add;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{EtcError, Result};
use crate::hardware::bands::Band;

/// Fraction of nights in a lunation with the u filter mounted
pub const DEFAULT_U_BAND_FRACTION: f64 = 14.0 / 30.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Telescope and camera overheads in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overheads {
    /// Readout between consecutive exposures
    pub between_exposures_s: f64,
    /// Initial slew to the event, which may be far from the previous pointing
    pub first_slew_s: f64,
    /// Filter change
    pub filter_change_s: f64,
}

impl Default for Overheads {
    fn default() -> Self {
        Self {
            between_exposures_s: 7.0,
            first_slew_s: 30.0,
            filter_change_s: 120.0,
        }
    }
}

impl Overheads {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("between_exposures_s", self.between_exposures_s),
            ("first_slew_s", self.first_slew_s),
            ("filter_change_s", self.filter_change_s),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(EtcError::InvalidInput(format!(
                    "overhead {name} must be a non-negative number of seconds, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// One exposure of a visit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisitExposure {
    pub band: Band,
    pub exposure_s: f64,
}

impl VisitExposure {
    pub fn new(band: Band, exposure_s: f64) -> Self {
        Self { band, exposure_s }
    }
}

/// Follow-up plan for a single event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPlan {
    /// Pointings needed to tile the event localisation
    pub n_fields: u32,
    /// Exposures taken at every pointing
    pub visits: Vec<VisitExposure>,
}

impl EventPlan {
    pub fn new(n_fields: u32, visits: Vec<VisitExposure>) -> Self {
        Self { n_fields, visits }
    }

    /// The same exposure time in every listed band
    pub fn uniform(n_fields: u32, bands: &[Band], exposure_s: f64) -> Self {
        Self::new(
            n_fields,
            bands
                .iter()
                .map(|&band| VisitExposure::new(band, exposure_s))
                .collect(),
        )
    }

    fn validate(&self) -> Result<()> {
        if self.n_fields == 0 {
            return Err(EtcError::InvalidInput(
                "an event needs at least one field".to_string(),
            ));
        }
        if self.visits.is_empty() {
            return Err(EtcError::InvalidInput(
                "an event needs at least one exposure".to_string(),
            ));
        }
        if let Some(bad) = self
            .visits
            .iter()
            .find(|v| !(v.exposure_s > 0.0 && v.exposure_s.is_finite()))
        {
            return Err(EtcError::InvalidInput(format!(
                "exposure in {} must be positive, got {} s",
                bad.band, bad.exposure_s
            )));
        }
        Ok(())
    }

    /// Whether the plan needs both of the filters that share a slot
    pub fn swaps_u_and_y(&self) -> bool {
        let has = |band| self.visits.iter().any(|v| v.band == band);
        has(Band::U) && has(Band::Y)
    }
}

/// Time spent on an event or campaign, in hours
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EventTimeBudget {
    pub exposure_hours: f64,
    pub overhead_hours: f64,
}

impl EventTimeBudget {
    pub fn total_hours(&self) -> f64 {
        self.exposure_hours + self.overhead_hours
    }

    /// Share of the budget lost to overheads
    pub fn overhead_fraction(&self) -> f64 {
        let total = self.total_hours();
        if total > 0.0 {
            self.overhead_hours / total
        } else {
            0.0
        }
    }
}

impl Add for EventTimeBudget {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            exposure_hours: self.exposure_hours + rhs.exposure_hours,
            overhead_hours: self.overhead_hours + rhs.overhead_hours,
        }
    }
}

impl Sum for EventTimeBudget {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Time needed to follow one event with a single visit per field.
///
/// # Arguments
/// * `plan` - Fields and per-field exposures
/// * `overheads` - Readout, slew and filter-change overheads
/// * `u_band_fraction` - Fraction of nights with u mounted, used when the
///   plan lists both u and y
pub fn event_time_budget(
    plan: &EventPlan,
    overheads: &Overheads,
    u_band_fraction: f64,
) -> Result<EventTimeBudget> {
    plan.validate()?;
    overheads.validate()?;
    if !(0.0..=1.0).contains(&u_band_fraction) {
        return Err(EtcError::InvalidInput(format!(
            "u band fraction must lie in [0, 1], got {u_band_fraction}"
        )));
    }

    let (visit_exposure_s, slots) = if plan.swaps_u_and_y() {
        let exposure = plan
            .visits
            .iter()
            .map(|v| match v.band {
                Band::U => v.exposure_s * u_band_fraction,
                Band::Y => v.exposure_s * (1.0 - u_band_fraction),
                _ => v.exposure_s,
            })
            .sum::<f64>();
        (exposure, plan.visits.len() - 1)
    } else {
        (plan.visits.iter().map(|v| v.exposure_s).sum::<f64>(), plan.visits.len())
    };

    let readout_s = overheads.between_exposures_s * slots as f64;
    let filter_change_s = overheads.filter_change_s * slots as f64;
    info!(
        "visit: exposure {visit_exposure_s:.0} s, filter changes {filter_change_s:.0} s, readout {readout_s:.0} s"
    );

    // Readout is paid at every field; slew and filter changes are shared
    // by all fields of the tiling.
    let n_fields = plan.n_fields as f64;
    let overhead_s =
        readout_s * n_fields + (overheads.first_slew_s + filter_change_s) / n_fields;

    let budget = EventTimeBudget {
        exposure_hours: visit_exposure_s * n_fields / SECONDS_PER_HOUR,
        overhead_hours: overhead_s / SECONDS_PER_HOUR,
    };
    info!(
        "{} field(s): {:.3} h exposure, {:.3} h total ({:.0}% overhead)",
        plan.n_fields,
        budget.exposure_hours,
        budget.total_hours(),
        100.0 * budget.overhead_fraction()
    );

    Ok(budget)
}

/// Time needed to follow every event of a campaign.
pub fn campaign_time_budget(
    events: &[EventPlan],
    overheads: &Overheads,
    u_band_fraction: f64,
) -> Result<EventTimeBudget> {
    events
        .iter()
        .map(|plan| event_time_budget(plan, overheads, u_band_fraction))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const GRIZ: [Band; 4] = [Band::G, Band::R, Band::I, Band::Z];

    #[test]
    fn test_single_field_griz() {
        let plan = EventPlan::uniform(1, &GRIZ, 30.0);
        let budget = event_time_budget(&plan, &Overheads::default(), DEFAULT_U_BAND_FRACTION).unwrap();

        assert_relative_eq!(budget.exposure_hours, 120.0 / 3600.0, epsilon = 1e-12);
        // 4 readouts + first slew + 4 filter changes
        assert_relative_eq!(budget.overhead_hours, (28.0 + 30.0 + 480.0) / 3600.0, epsilon = 1e-12);
        assert_relative_eq!(budget.total_hours(), 0.182778, epsilon = 1e-6);
    }

    #[test]
    fn test_tiling_shares_slew_and_filter_changes() {
        let plan = EventPlan::uniform(4, &GRIZ, 30.0);
        let budget = event_time_budget(&plan, &Overheads::default(), DEFAULT_U_BAND_FRACTION).unwrap();

        assert_relative_eq!(budget.exposure_hours, 480.0 / 3600.0, epsilon = 1e-12);
        assert_relative_eq!(
            budget.overhead_hours,
            (28.0 * 4.0 + 30.0 / 4.0 + 480.0 / 4.0) / 3600.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_all_six_filters_swap_u_and_y() {
        let plan = EventPlan::uniform(1, &Band::ALL, 30.0);
        assert!(plan.swaps_u_and_y());

        let budget = event_time_budget(&plan, &Overheads::default(), DEFAULT_U_BAND_FRACTION).unwrap();
        // u for 14 nights, y for 16, griz every night: 14 + 16 + 120 s
        assert_relative_eq!(budget.exposure_hours, 150.0 / 3600.0, epsilon = 1e-12);
        // five filter slots
        assert_relative_eq!(budget.overhead_hours, (35.0 + 30.0 + 600.0) / 3600.0, epsilon = 1e-12);
    }

    #[test]
    fn test_u_without_y_is_not_weighted() {
        let plan = EventPlan::uniform(1, &[Band::U, Band::G], 60.0);
        assert!(!plan.swaps_u_and_y());
        let budget = event_time_budget(&plan, &Overheads::default(), DEFAULT_U_BAND_FRACTION).unwrap();
        assert_relative_eq!(budget.exposure_hours, 120.0 / 3600.0, epsilon = 1e-12);
    }

    #[test]
    fn test_campaign_sums_events() {
        let events = vec![
            EventPlan::uniform(1, &GRIZ, 30.0),
            EventPlan::uniform(4, &GRIZ, 30.0),
        ];
        let overheads = Overheads::default();
        let campaign = campaign_time_budget(&events, &overheads, DEFAULT_U_BAND_FRACTION).unwrap();
        let separate: f64 = events
            .iter()
            .map(|e| event_time_budget(e, &overheads, DEFAULT_U_BAND_FRACTION).unwrap().total_hours())
            .sum();
        assert_relative_eq!(campaign.total_hours(), separate, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_invalid_plans() {
        let overheads = Overheads::default();
        let frac = DEFAULT_U_BAND_FRACTION;
        assert!(event_time_budget(&EventPlan::uniform(0, &GRIZ, 30.0), &overheads, frac).is_err());
        assert!(event_time_budget(&EventPlan::new(1, vec![]), &overheads, frac).is_err());
        assert!(event_time_budget(&EventPlan::uniform(1, &GRIZ, -5.0), &overheads, frac).is_err());
        assert!(event_time_budget(&EventPlan::uniform(1, &GRIZ, 30.0), &overheads, 1.5).is_err());
    }

    #[test]
    fn test_overhead_fraction() {
        let budget = EventTimeBudget {
            exposure_hours: 3.0,
            overhead_hours: 1.0,
        };
        assert_relative_eq!(budget.overhead_fraction(), 0.25, epsilon = 1e-12);
        assert_eq!(EventTimeBudget::default().overhead_fraction(), 0.0);
    }
}
