//! Exposure-time calculator command-line tool
//!
//! # Usage
//!
//! ```bash
//! # 5σ depth of a 30 s r-band exposure at airmass 1.2
//! cargo run --release --bin etc -- depth --band r --airmass 1.2 --exposure 30
//!
//! # Exposure needed to reach r = 24.0 for a target moving at 5 deg/day
//! cargo run --release --bin etc -- exptime --band r --magnitude 24.0 --rate 5
//!
//! # Twilight depth table from 5 s to 60 s
//! cargo run --release --bin etc -- sweep --band i --twilight --exposures 5:60:5
//!
//! # Time to tile 10 fields in griz to 23.5 mag
//! cargo run --release --bin etc -- budget --fields 10 --bands g,r,i,z --magnitude 23.5
//! ```
//!
//! Every command accepts `--config <file.json>` to change the depth model,
//! detection significance, trailing convention, solver limits and
//! overheads. Set `RUST_LOG=debug` to follow the solver iterations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use shared::range_arg::RangeArg;
use shared::units::{AngularVelocity, AngularVelocityExt};

use etc::budget::{event_time_budget, EventPlan, VisitExposure};
use etc::calculator::exposure_from_secs;
use etc::photometry::taxonomy::v_to_band;
use etc::photometry::trailing::{trail_length_in_seeing, trailing_losses};
use etc::shared_args::ObservationArgs;
use etc::{Band, EtcConfig, ExposureTimeCalculator, ObservingConditions, SkyCondition, Taxonomy};

#[derive(Parser)]
#[command(
    name = "etc",
    about = "Exposure times and limiting magnitudes for Target-of-Opportunity follow-up",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Limiting magnitude reached by one exposure
    Depth {
        /// Exposure time in seconds
        #[arg(long, default_value_t = 30.0)]
        exposure: f64,

        #[command(flatten)]
        observation: ObservationArgs,
    },

    /// Exposure time needed to reach a limiting magnitude
    Exptime {
        /// Target limiting magnitude
        #[arg(long)]
        magnitude: f64,

        #[command(flatten)]
        observation: ObservationArgs,
    },

    /// Trailing losses of a moving target under both conventions
    Trailing {
        /// Exposure time in seconds
        #[arg(long, default_value_t = 30.0)]
        exposure: f64,

        #[command(flatten)]
        observation: ObservationArgs,
    },

    /// Depth and trailing loss over a range of exposure times
    Sweep {
        /// Exposure range in seconds as start:stop:step
        #[arg(long, default_value = "5:60:5")]
        exposures: RangeArg,

        #[command(flatten)]
        observation: ObservationArgs,
    },

    /// Telescope time to tile and image one event
    Budget {
        /// Number of pointings tiling the localisation region
        #[arg(long, default_value_t = 1)]
        fields: u32,

        /// Filters of each visit
        #[arg(long, value_enum, value_delimiter = ',', default_values_t = [Band::G, Band::R, Band::I, Band::Z])]
        bands: Vec<Band>,

        /// Exposure time per filter in seconds
        #[arg(long, conflicts_with = "magnitude", required_unless_present = "magnitude")]
        exposure: Option<f64>,

        /// Depth to reach in every filter; exposures are solved per band
        #[arg(long)]
        magnitude: Option<f64>,

        /// Airmass used when solving exposures
        #[arg(long, default_value_t = 1.0)]
        airmass: f64,

        /// Rate of motion of the target in deg/day
        #[arg(long, default_value_t = 0.0)]
        rate: f64,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Convert a V magnitude into survey bands for an asteroid taxonomy
    Color {
        /// Apparent V magnitude
        #[arg(long)]
        v_mag: f64,

        /// Taxonomic class (solar, mean, S, C, Q, X, D, NEO)
        #[arg(long, default_value = "mean")]
        taxonomy: Taxonomy,
    },
}

fn print_conditions(observation: &ObservationArgs, conditions: &ObservingConditions) {
    println!(
        "Band {} ({:?} sky): sky {:.2} mag/arcsec², seeing {:.2}\", airmass {:.2}, rate {:.3} deg/day",
        observation.band,
        observation.sky_condition(),
        conditions.sky_brightness,
        conditions.seeing_arcsec,
        conditions.airmass,
        conditions.angular_velocity.as_degrees_per_day()
    );
}

/// Load the configuration and resolve the observing conditions of a command
fn prepare(observation: &ObservationArgs) -> Result<(EtcConfig, ObservingConditions)> {
    let config = observation
        .load_config()
        .context("failed to load configuration")?;
    let conditions = observation.conditions(config.band_table())?;
    print_conditions(observation, &conditions);
    Ok((config, conditions))
}

fn run_depth(exposure: f64, observation: &ObservationArgs) -> Result<()> {
    let (config, conditions) = prepare(observation)?;
    let calculator = ExposureTimeCalculator::from_config(&config);
    let band = config.band_table().get(observation.band)?;
    let exposure = exposure_from_secs(exposure)?;

    let depth = calculator.limiting_magnitude(exposure, &conditions, band)?;
    let loss = calculator.trailing_loss(exposure, &conditions);
    println!(
        "{:.1} s exposure: {:.0}σ limiting magnitude {:.3} ({} model, trailing loss {:.3} mag)",
        exposure.as_secs_f64(),
        calculator.model().significance(),
        depth,
        calculator.model().name(),
        loss
    );
    Ok(())
}

fn run_exptime(magnitude: f64, observation: &ObservationArgs) -> Result<()> {
    let (config, conditions) = prepare(observation)?;
    let calculator = ExposureTimeCalculator::from_config(&config);
    let band = config.band_table().get(observation.band)?;

    let solution = calculator.solve_exposure_time(magnitude, &conditions, band)?;
    println!(
        "Magnitude {:.2} needs {:.2} s (reaches {:.3} after {} iterations, trailing loss {:.3} mag)",
        magnitude,
        solution.exposure.as_secs_f64(),
        solution.achieved_magnitude,
        solution.iterations,
        calculator.trailing_loss(solution.exposure, &conditions)
    );
    Ok(())
}

fn run_trailing(exposure: f64, observation: &ObservationArgs) -> Result<()> {
    let (_, conditions) = prepare(observation)?;
    let exposure = exposure_from_secs(exposure)?;

    let trail = trail_length_in_seeing(conditions.angular_velocity, exposure, conditions.seeing_arcsec);
    let losses = trailing_losses(conditions.angular_velocity, conditions.seeing_arcsec, exposure);
    println!("Trail length: {trail:.3} × FWHM");
    println!("  SNR loss:       {:.4} mag", losses.snr);
    println!("  Detection loss: {:.4} mag", losses.detection);
    Ok(())
}

fn run_sweep(exposures: &RangeArg, observation: &ObservationArgs) -> Result<()> {
    let (config, conditions) = prepare(observation)?;
    let calculator = ExposureTimeCalculator::from_config(&config);
    let band = config.band_table().get(observation.band)?;

    println!("{:>10}  {:>8}  {:>8}", "t (s)", "m_lim", "dm_trail");
    for seconds in exposures.values() {
        let exposure = exposure_from_secs(seconds)?;
        let depth = calculator.limiting_magnitude(exposure, &conditions, band)?;
        let loss = calculator.trailing_loss(exposure, &conditions);
        println!("{seconds:>10.2}  {depth:>8.3}  {loss:>8.3}");
    }
    Ok(())
}

fn run_budget(
    fields: u32,
    bands: &[Band],
    exposure: Option<f64>,
    magnitude: Option<f64>,
    airmass: f64,
    rate: f64,
    config_path: Option<&PathBuf>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => EtcConfig::load_from_file(path).context("failed to load configuration")?,
        None => EtcConfig::default(),
    };
    let calculator = ExposureTimeCalculator::from_config(&config);
    let velocity = AngularVelocity::from_degrees_per_day(rate);

    let mut visits = Vec::with_capacity(bands.len());
    for &band in bands {
        let exposure_s = match (exposure, magnitude) {
            (Some(seconds), _) => seconds,
            (None, Some(target)) => {
                let params = config.band_table().get(band)?;
                let conditions = ObservingConditions::for_band(params, SkyCondition::Dark, airmass)?
                    .with_angular_velocity(velocity);
                let seconds = calculator
                    .exposure_time_for_magnitude(target, &conditions, params)
                    .with_context(|| format!("cannot reach {target:.2} mag in {band}"))?
                    .as_secs_f64();
                info!("{band}: {target:.2} mag needs {seconds:.1} s");
                seconds
            }
            (None, None) => anyhow::bail!("either --exposure or --magnitude is required"),
        };
        visits.push(VisitExposure::new(band, exposure_s));
    }

    for visit in &visits {
        println!("  {}: {:.1} s", visit.band, visit.exposure_s);
    }
    let plan = EventPlan::new(fields, visits);
    let budget = event_time_budget(&plan, &config.overheads, config.u_band_fraction)?;
    println!(
        "{} field(s): exposure {:.3} h + overhead {:.3} h = {:.3} h ({:.0}% overhead)",
        fields,
        budget.exposure_hours,
        budget.overhead_hours,
        budget.total_hours(),
        100.0 * budget.overhead_fraction()
    );
    Ok(())
}

fn run_color(v_mag: f64, taxonomy: Taxonomy) {
    println!("V = {v_mag:.2}, {taxonomy} colours:");
    for band in Band::ALL {
        match v_to_band(v_mag, band, taxonomy) {
            Some(mag) => println!("  {band}: {mag:.3}"),
            None => println!("  {band}: no colour available"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Depth {
            exposure,
            observation,
        } => run_depth(*exposure, observation),
        Commands::Exptime {
            magnitude,
            observation,
        } => run_exptime(*magnitude, observation),
        Commands::Trailing {
            exposure,
            observation,
        } => run_trailing(*exposure, observation),
        Commands::Sweep {
            exposures,
            observation,
        } => run_sweep(exposures, observation),
        Commands::Budget {
            fields,
            bands,
            exposure,
            magnitude,
            airmass,
            rate,
            config,
        } => run_budget(
            *fields,
            bands,
            *exposure,
            *magnitude,
            *airmass,
            *rate,
            config.as_ref(),
        ),
        Commands::Color { v_mag, taxonomy } => {
            run_color(*v_mag, *taxonomy);
            Ok(())
        }
    }
}
