//! Study parameters and the scenario pipeline.
//!
//! A study loads the availability profiles once, annualises technology costs once and then, for
//! each fuel price scenario in turn, builds a network and solves it.
use crate::chart::ChartSettings;
use crate::error::StudyResult;
use crate::finance::CostAssumptions;
use crate::network::{Network, NetworkConfig, build_network};
use crate::scenario::{
    Scenario, ScenarioMap, create_scenario_map, default_scenarios, total_probability,
};
use crate::solver::{Solution, Solver};
use crate::technology::{
    TechnologyID, TechnologyMap, TechnologyParameters, create_technology_map,
    default_technologies,
};
use crate::time_series::TimeSeries;
use crate::units::{Hours, Power};
use anyhow::{Context, Result, ensure};
use chrono::TimeDelta;
use log::{error, info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Hourly solar, wind and load profiles for 2015
pub const DEFAULT_TIME_SERIES_URL: &str =
    "https://tubcloud.tu-berlin.de/s/pKttFadrbTKSJKF/download/time-series-lecture-2.csv";

/// Demand at the bus, in MW
pub const DEFAULT_LOAD: Power = Power(1.0);

define_param_default!(default_time_series, String, DEFAULT_TIME_SERIES_URL.to_string());
define_param_default!(default_time_step_hours, u32, 3);
define_param_default!(default_bus, String, "electricity".to_string());
define_param_default!(default_load, Power, DEFAULT_LOAD);
define_param_default!(
    default_weather_technologies,
    Vec<TechnologyID>,
    vec!["solar".into(), "wind".into()]
);
define_param_default!(
    default_dispatchable_technologies,
    Vec<TechnologyID>,
    vec!["gas".into(), "lignite".into()]
);

/// Represents the contents of a study file.
///
/// Every field is optional; the defaults reproduce the reference study.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StudyParameters {
    /// URL or path of the time series CSV file
    #[serde(default = "default_time_series")]
    pub time_series: String,
    /// Length of each snapshot after resampling
    #[serde(default = "default_time_step_hours")]
    pub time_step_hours: u32,
    /// Name of the bus
    #[serde(default = "default_bus")]
    pub bus: String,
    /// Constant demand at the bus
    #[serde(default = "default_load")]
    pub load: Power,
    /// Parameters for annualising investment costs
    #[serde(default)]
    pub cost_assumptions: CostAssumptions,
    /// The technology table
    #[serde(default = "default_technologies")]
    pub technologies: Vec<TechnologyParameters>,
    /// Weather-dependent technologies to attach to the bus
    #[serde(default = "default_weather_technologies")]
    pub weather_technologies: Vec<TechnologyID>,
    /// Dispatchable technologies to attach to the bus
    #[serde(default = "default_dispatchable_technologies")]
    pub dispatchable_technologies: Vec<TechnologyID>,
    /// Fuel price scenarios
    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<Scenario>,
    /// Options for the output charts
    #[serde(default)]
    pub charts: ChartSettings,
}

impl Default for StudyParameters {
    fn default() -> Self {
        Self {
            time_series: default_time_series(),
            time_step_hours: default_time_step_hours(),
            bus: default_bus(),
            load: default_load(),
            cost_assumptions: CostAssumptions::default(),
            technologies: default_technologies(),
            weather_technologies: default_weather_technologies(),
            dispatchable_technologies: default_dispatchable_technologies(),
            scenarios: default_scenarios(),
            charts: ChartSettings::default(),
        }
    }
}

impl StudyParameters {
    /// Read a study file.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to the study TOML file
    ///
    /// # Returns
    ///
    /// The file contents as a [`StudyParameters`] struct or an error if the file is invalid
    pub fn from_path(file_path: &Path) -> Result<StudyParameters> {
        let contents = fs::read_to_string(file_path)
            .with_context(|| format!("Could not read {}", file_path.display()))?;
        let parameters: StudyParameters = toml::from_str(&contents)
            .with_context(|| format!("Could not parse {}", file_path.display()))?;
        parameters
            .validate()
            .with_context(|| format!("Invalid study file {}", file_path.display()))?;

        Ok(parameters)
    }

    /// Check parameters which are not checked when building technologies and scenarios
    pub fn validate(&self) -> Result<()> {
        ensure!(self.time_step_hours > 0, "time_step_hours cannot be zero");
        ensure!(
            self.load.is_finite() && self.load > Power(0.0),
            "load must be a finite number greater than zero"
        );
        ensure!(
            !self.weather_technologies.is_empty() || !self.dispatchable_technologies.is_empty(),
            "At least one technology must be attached to the bus"
        );

        Ok(())
    }

    /// The resampling step and snapshot weighting
    fn time_step(&self) -> Result<(TimeDelta, Hours)> {
        let step = TimeDelta::try_hours(i64::from(self.time_step_hours))
            .context("time_step_hours is too large")?;
        Ok((step, Hours(f64::from(self.time_step_hours))))
    }
}

/// Everything needed to build a network for any scenario
#[derive(Debug)]
pub struct Study {
    /// Technologies with annualised costs
    pub technologies: TechnologyMap,
    /// Fuel price scenarios
    pub scenarios: ScenarioMap,
    /// Availability profiles at the snapshot frequency
    pub profiles: TimeSeries,
    /// Bus, load and technologies attached to each network
    pub network_config: NetworkConfig,
}

impl Study {
    /// Prepare a study from parameters and the raw (not yet resampled) time series
    pub fn new(parameters: &StudyParameters, time_series: &TimeSeries) -> Result<Self> {
        parameters.validate()?;
        let technologies =
            create_technology_map(parameters.technologies.clone(), &parameters.cost_assumptions)
                .context("Invalid technology table")?;
        let scenarios =
            create_scenario_map(parameters.scenarios.clone()).context("Invalid scenarios")?;
        info!(
            "{} technologies and {} scenarios (total probability {})",
            technologies.len(),
            scenarios.len(),
            total_probability(&scenarios)
        );

        let (step, snapshot_weighting) = parameters.time_step()?;
        let profiles = time_series.resample(step)?;
        info!(
            "Resampled time series from {} to {} snapshots of {} hours",
            time_series.len(),
            profiles.len(),
            parameters.time_step_hours
        );
        warn_missing_values(&profiles, &technologies);

        Ok(Self {
            technologies,
            scenarios,
            profiles,
            network_config: NetworkConfig {
                bus: parameters.bus.clone(),
                load: parameters.load,
                weather_technologies: parameters.weather_technologies.clone(),
                dispatchable_technologies: parameters.dispatchable_technologies.clone(),
                snapshot_weighting,
            },
        })
    }

    /// Load the time series named in the parameters and prepare a study
    pub fn load(parameters: &StudyParameters) -> Result<Self> {
        let time_series = TimeSeries::load(&parameters.time_series)?;
        Self::new(parameters, &time_series)
    }

    /// Build the network for a scenario
    pub fn build_network(&self, scenario: &Scenario) -> StudyResult<Network> {
        build_network(
            scenario.fuel_price,
            &self.technologies,
            &self.profiles,
            &self.network_config,
        )
    }
}

/// Warn about snapshots without availability data, which are treated as unavailable
fn warn_missing_values(profiles: &TimeSeries, technologies: &TechnologyMap) {
    for technology in technologies.values() {
        let Some(profile) = technology.profile().and_then(|name| profiles.profile(name)) else {
            continue;
        };

        let missing = profile.iter().filter(|value| value.is_none()).count();
        if missing > 0 {
            warn!(
                "{missing} snapshots have no availability data for {}; these will be treated as \
                unavailable",
                technology.id
            );
        }
    }
}

/// The outcome of running a single scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    /// The scenario which was run
    pub scenario: Scenario,
    /// The solution, or why there isn't one
    pub outcome: StudyResult<Solution>,
}

/// Results for every scenario in a study, in scenario order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StudyResults(Vec<ScenarioResult>);

impl StudyResults {
    /// Create a new [`StudyResults`]
    pub fn new(results: Vec<ScenarioResult>) -> Self {
        Self(results)
    }

    /// Iterate over all scenario results
    pub fn iter(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.0.iter()
    }

    /// Iterate over scenarios which were solved successfully
    pub fn iter_solved(&self) -> impl Iterator<Item = (&Scenario, &Solution)> {
        self.0
            .iter()
            .filter_map(|result| Some((&result.scenario, result.outcome.as_ref().ok()?)))
    }

    /// The number of scenarios which failed
    pub fn num_failed(&self) -> usize {
        self.0.iter().filter(|result| result.outcome.is_err()).count()
    }

    /// The number of scenarios
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no scenario results
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Run every scenario in turn.
///
/// A failure to build or solve one scenario's network is logged and recorded in the results; the
/// remaining scenarios still run.
pub fn run_study<S: Solver + ?Sized>(study: &Study, solver: &S) -> StudyResults {
    let results = study
        .scenarios
        .values()
        .map(|scenario| {
            info!(
                "Scenario {}: fuel price {}",
                scenario.id, scenario.fuel_price
            );
            let outcome = study
                .build_network(scenario)
                .and_then(|network| solver.solve(&network));

            match &outcome {
                Ok(solution) => info!(
                    "Scenario {}: total cost {:.2}",
                    scenario.id, solution.total_cost.value()
                ),
                Err(err) => error!("Scenario {} failed: {err}", scenario.id),
            }

            ScenarioResult {
                scenario: scenario.clone(),
                outcome,
            }
        })
        .collect();

    StudyResults::new(results)
}
