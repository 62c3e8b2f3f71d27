//! Event time budgets driven by solved exposure times

use approx::assert_relative_eq;
use etc::budget::{campaign_time_budget, event_time_budget, EventPlan, VisitExposure};
use etc::hardware::bands::models::RUBIN_LSST;
use etc::{Band, EtcConfig, ExposureTimeCalculator, ObservingConditions, SkyCondition};

fn solved_plan(n_fields: u32, bands: &[Band], target: f64) -> EventPlan {
    let calculator = ExposureTimeCalculator::default();
    let visits = bands
        .iter()
        .map(|&band| {
            let params = RUBIN_LSST.get(band).unwrap();
            let conditions = ObservingConditions::for_band(params, SkyCondition::Dark, 1.2).unwrap();
            let exposure = calculator
                .exposure_time_for_magnitude(target, &conditions, params)
                .unwrap();
            VisitExposure::new(band, exposure.as_secs_f64())
        })
        .collect();
    EventPlan::new(n_fields, visits)
}

#[test]
fn test_deeper_targets_cost_more_time() {
    let config = EtcConfig::default();
    let bands = [Band::G, Band::R, Band::I];

    let shallow = event_time_budget(&solved_plan(5, &bands, 23.5), &config.overheads, config.u_band_fraction).unwrap();
    let deep = event_time_budget(&solved_plan(5, &bands, 24.5), &config.overheads, config.u_band_fraction).unwrap();

    assert!(deep.exposure_hours > shallow.exposure_hours);
    // Overheads do not depend on exposure time
    assert_relative_eq!(deep.overhead_hours, shallow.overhead_hours, epsilon = 1e-12);
}

#[test]
fn test_more_fields_scale_exposure_linearly() {
    let config = EtcConfig::default();
    let bands = [Band::R, Band::I];
    let one = event_time_budget(&solved_plan(1, &bands, 24.0), &config.overheads, config.u_band_fraction).unwrap();
    let ten = event_time_budget(&solved_plan(10, &bands, 24.0), &config.overheads, config.u_band_fraction).unwrap();
    assert_relative_eq!(ten.exposure_hours, 10.0 * one.exposure_hours, max_relative = 1e-9);
}

#[test]
fn test_campaign_of_identical_events() {
    let config = EtcConfig::default();
    let plan = solved_plan(3, &[Band::G, Band::R, Band::I, Band::Z], 23.8);
    let single = event_time_budget(&plan, &config.overheads, config.u_band_fraction).unwrap();
    let events = vec![plan; 4];
    let campaign = campaign_time_budget(&events, &config.overheads, config.u_band_fraction).unwrap();
    assert_relative_eq!(campaign.total_hours(), 4.0 * single.total_hours(), max_relative = 1e-12);
}
