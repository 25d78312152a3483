//! Fuel price scenarios.
use crate::id::{collect_unique_by_id, define_id_getter, define_id_type};
use crate::units::{Dimensionless, MoneyPerEnergy};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

define_id_type! {ScenarioID}

/// A map of [`Scenario`]s, keyed by scenario ID
pub type ScenarioMap = IndexMap<ScenarioID, Scenario>;

/// Tolerance when checking that scenario probabilities sum to one
const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// One instantiation of the uncertain fuel price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// A unique identifier for the scenario (e.g. "low")
    pub id: ScenarioID,
    /// Fuel price per MWh of fuel
    pub fuel_price: MoneyPerEnergy,
    /// Probability of the scenario occurring
    pub probability: Dimensionless,
}
define_id_getter! {Scenario, ScenarioID}

/// The scenarios used when the study file doesn't provide any
pub fn default_scenarios() -> Vec<Scenario> {
    [("low", 40.0, 0.4), ("med", 70.0, 0.3), ("high", 100.0, 0.3)]
        .into_iter()
        .map(|(id, fuel_price, probability)| Scenario {
            id: id.into(),
            fuel_price: MoneyPerEnergy(fuel_price),
            probability: Dimensionless(probability),
        })
        .collect()
}

/// Sum of the probabilities of all scenarios
pub fn total_probability(scenarios: &ScenarioMap) -> Dimensionless {
    Dimensionless(scenarios.values().map(|s| s.probability.value()).sum())
}

/// Create a scenario map, checking IDs are unique and that probabilities form a distribution.
///
/// Fuel prices are checked later, when the network for each scenario is built, so that a bad
/// scenario only affects its own run.
pub fn create_scenario_map<I>(scenarios: I) -> Result<ScenarioMap>
where
    I: IntoIterator<Item = Scenario>,
{
    let scenarios = collect_unique_by_id(scenarios)?;
    ensure!(!scenarios.is_empty(), "At least one scenario is required");

    for scenario in scenarios.values() {
        ensure!(
            (0.0..=1.0).contains(&scenario.probability.value()),
            "Probability for scenario {} must be between 0 and 1",
            scenario.id
        );
    }

    let total = total_probability(&scenarios);
    ensure!(
        (total.value() - 1.0).abs() <= PROBABILITY_TOLERANCE,
        "Scenario probabilities must sum to 1 (got {total})"
    );

    Ok(scenarios)
}
