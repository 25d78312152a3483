//! Generator technologies and their cost parameters.
//!
//! A technology is either weather dependent (its output is limited by an availability profile)
//! or dispatchable. Dispatchable technologies may burn a fuel whose price is set per scenario.
use crate::error::{StudyError, StudyResult};
use crate::finance::{CostAssumptions, annualised_fixed_cost};
use crate::id::{collect_unique_by_id, define_id_getter, define_id_type};
use crate::units::{Dimensionless, MoneyPerCapacity, MoneyPerEnergy};
use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

define_id_type! {TechnologyID}

/// A map of [`Technology`]s, keyed by technology ID
pub type TechnologyMap = IndexMap<TechnologyID, Rc<Technology>>;

/// A row of the technology table, as given in the study file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyParameters {
    /// A unique identifier for the technology (e.g. "solar")
    pub id: TechnologyID,
    /// Name of the availability profile in the time series (weather-dependent technologies only)
    #[serde(default)]
    pub profile: Option<String>,
    /// Overnight investment cost per MW
    pub investment_cost: MoneyPerCapacity,
    /// Fuel to electricity conversion efficiency
    #[serde(default)]
    pub efficiency: Option<Dimensionless>,
    /// Fixed cost per MWh produced. If absent for a dispatchable technology, the marginal cost is
    /// derived from the scenario fuel price and efficiency.
    #[serde(default)]
    pub marginal_cost: Option<MoneyPerEnergy>,
}
define_id_getter! {TechnologyParameters, TechnologyID}

/// How the marginal cost of a dispatchable technology is determined
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginalCost {
    /// The same in every scenario
    Fixed(MoneyPerEnergy),
    /// Scenario fuel price divided by efficiency
    FuelPrice {
        /// Fuel to electricity conversion efficiency
        efficiency: Dimensionless,
    },
}

/// The kind of a [`Technology`]
#[derive(Debug, Clone, PartialEq)]
pub enum TechnologyKind {
    /// Output limited by a time series of per-unit availability
    WeatherDependent {
        /// Time series column holding the availability profile
        profile: String,
        /// Cost per MWh produced
        marginal_cost: MoneyPerEnergy,
    },
    /// Output limited only by installed capacity
    Dispatchable {
        /// How the marginal cost is found
        marginal_cost: MarginalCost,
    },
}

/// A generator technology with its annualised costs
#[derive(Debug, Clone, PartialEq)]
pub struct Technology {
    /// A unique identifier for the technology
    pub id: TechnologyID,
    /// Whether the technology is weather dependent or dispatchable
    pub kind: TechnologyKind,
    /// Overnight investment cost per MW
    pub investment_cost: MoneyPerCapacity,
    /// Fuel to electricity conversion efficiency, for fuel-burning technologies
    pub efficiency: Option<Dimensionless>,
    /// Investment and fixed O&M costs per MW per year
    pub annualised_fixed_cost: MoneyPerCapacity,
}
define_id_getter! {Technology, TechnologyID}

impl Technology {
    /// Create a technology from a row of the technology table.
    ///
    /// The annualised fixed cost is calculated here and never changes afterwards.
    pub fn new(
        parameters: TechnologyParameters,
        assumptions: &CostAssumptions,
    ) -> StudyResult<Self> {
        let TechnologyParameters {
            id,
            profile,
            investment_cost,
            efficiency,
            marginal_cost,
        } = parameters;

        let invalid = |message: &str| StudyError::InvalidParameter(format!("{id}: {message}"));

        if !investment_cost.is_finite() || investment_cost < MoneyPerCapacity(0.0) {
            return Err(invalid("investment cost must be a non-negative number"));
        }
        if let Some(efficiency) = efficiency {
            if !(efficiency > Dimensionless(0.0) && efficiency <= Dimensionless(1.0)) {
                return Err(invalid("efficiency must be greater than 0 and at most 1"));
            }
        }
        if let Some(marginal_cost) = marginal_cost {
            if !marginal_cost.is_finite() || marginal_cost < MoneyPerEnergy(0.0) {
                return Err(invalid("marginal cost must be a non-negative number"));
            }
        }

        let kind = match profile {
            Some(profile) => {
                if efficiency.is_some() {
                    return Err(invalid(
                        "weather-dependent technologies cannot have an efficiency",
                    ));
                }
                TechnologyKind::WeatherDependent {
                    profile,
                    marginal_cost: marginal_cost.unwrap_or(MoneyPerEnergy(0.0)),
                }
            }
            None => {
                let marginal_cost = match (marginal_cost, efficiency) {
                    (Some(cost), _) => MarginalCost::Fixed(cost),
                    (None, Some(efficiency)) => MarginalCost::FuelPrice { efficiency },
                    (None, None) => {
                        return Err(invalid(
                            "dispatchable technologies need a marginal cost or an efficiency",
                        ));
                    }
                };
                TechnologyKind::Dispatchable { marginal_cost }
            }
        };

        let annualised_fixed_cost = annualised_fixed_cost(investment_cost, assumptions)?;

        Ok(Self {
            id,
            kind,
            investment_cost,
            efficiency,
            annualised_fixed_cost,
        })
    }

    /// Whether the technology's output follows an availability profile
    pub fn is_weather_dependent(&self) -> bool {
        matches!(self.kind, TechnologyKind::WeatherDependent { .. })
    }

    /// Whether the technology's marginal cost depends on the scenario fuel price
    pub fn is_fuel_priced(&self) -> bool {
        matches!(
            self.kind,
            TechnologyKind::Dispatchable {
                marginal_cost: MarginalCost::FuelPrice { .. }
            }
        )
    }

    /// The name of the technology's availability profile, if it has one
    pub fn profile(&self) -> Option<&str> {
        match &self.kind {
            TechnologyKind::WeatherDependent { profile, .. } => Some(profile),
            TechnologyKind::Dispatchable { .. } => None,
        }
    }

    /// The cost per MWh produced, given the scenario fuel price
    pub fn marginal_cost(&self, fuel_price: MoneyPerEnergy) -> MoneyPerEnergy {
        match self.kind {
            TechnologyKind::WeatherDependent { marginal_cost, .. }
            | TechnologyKind::Dispatchable {
                marginal_cost: MarginalCost::Fixed(marginal_cost),
            } => marginal_cost,
            TechnologyKind::Dispatchable {
                marginal_cost: MarginalCost::FuelPrice { efficiency },
            } => fuel_price / efficiency,
        }
    }
}

/// Create technologies from the technology table, checking that IDs are unique
pub fn create_technology_map<I>(
    parameters: I,
    assumptions: &CostAssumptions,
) -> Result<TechnologyMap>
where
    I: IntoIterator<Item = TechnologyParameters>,
{
    let technologies = parameters
        .into_iter()
        .map(|parameters| Technology::new(parameters, assumptions))
        .collect::<StudyResult<Vec<_>>>()?;

    let map = collect_unique_by_id(technologies)?;
    Ok(map
        .into_iter()
        .map(|(id, technology)| (id, Rc::new(technology)))
        .collect())
}

/// The technology table used when the study file doesn't provide one
pub fn default_technologies() -> Vec<TechnologyParameters> {
    vec![
        TechnologyParameters {
            id: "solar".into(),
            profile: Some("solar".into()),
            investment_cost: MoneyPerCapacity(1e6),
            efficiency: None,
            marginal_cost: Some(MoneyPerEnergy(0.01)),
        },
        TechnologyParameters {
            id: "wind".into(),
            profile: Some("onwind".into()),
            investment_cost: MoneyPerCapacity(2e6),
            efficiency: None,
            marginal_cost: Some(MoneyPerEnergy(0.02)),
        },
        TechnologyParameters {
            id: "gas".into(),
            profile: None,
            investment_cost: MoneyPerCapacity(7e5),
            efficiency: Some(Dimensionless(0.6)),
            marginal_cost: None,
        },
        TechnologyParameters {
            id: "lignite".into(),
            profile: None,
            investment_cost: MoneyPerCapacity(1.3e6),
            efficiency: Some(Dimensionless(0.4)),
            marginal_cost: Some(MoneyPerEnergy(130.0)),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, technologies};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_default_technologies(technologies: TechnologyMap) {
        assert_eq!(
            technologies.keys().map(TechnologyID::as_str).collect::<Vec<_>>(),
            ["solar", "wind", "gas", "lignite"]
        );
        assert!(technologies["solar"].is_weather_dependent());
        assert_eq!(technologies["wind"].profile(), Some("onwind"));
        assert!(technologies["gas"].is_fuel_priced());
        assert!(!technologies["lignite"].is_fuel_priced());
        assert_approx_eq!(
            MoneyPerCapacity,
            technologies["gas"].annualised_fixed_cost,
            MoneyPerCapacity(61_199.509_727_389_44),
            epsilon = 1e-6
        );
    }

    #[rstest]
    #[case(40.0, 66.666_666_666_666_67)]
    #[case(70.0, 116.666_666_666_666_67)]
    #[case(100.0, 166.666_666_666_666_67)]
    fn test_gas_marginal_cost(
        technologies: TechnologyMap,
        #[case] fuel_price: f64,
        #[case] expected: f64,
    ) {
        let cost = technologies["gas"].marginal_cost(MoneyPerEnergy(fuel_price));
        assert_approx_eq!(MoneyPerEnergy, cost, MoneyPerEnergy(expected), epsilon = 1e-9);
    }

    #[rstest]
    fn test_fuel_priced_kind_holds_efficiency(technologies: TechnologyMap) {
        assert_eq!(
            technologies["gas"].kind,
            TechnologyKind::Dispatchable {
                marginal_cost: MarginalCost::FuelPrice {
                    efficiency: Dimensionless(0.6)
                }
            }
        );
        assert_eq!(
            technologies["lignite"].kind,
            TechnologyKind::Dispatchable {
                marginal_cost: MarginalCost::Fixed(MoneyPerEnergy(130.0))
            }
        );
    }

    #[rstest]
    fn test_fixed_marginal_cost(
        technologies: TechnologyMap,
        #[values(1.0, 40.0, 1000.0)] fuel_price: f64,
    ) {
        let fuel_price = MoneyPerEnergy(fuel_price);
        assert_eq!(
            technologies["lignite"].marginal_cost(fuel_price),
            MoneyPerEnergy(130.0)
        );
        assert_eq!(
            technologies["solar"].marginal_cost(fuel_price),
            MoneyPerEnergy(0.01)
        );
    }

    fn parameters() -> TechnologyParameters {
        TechnologyParameters {
            id: "coal".into(),
            profile: None,
            investment_cost: MoneyPerCapacity(1000.0),
            efficiency: Some(Dimensionless(0.5)),
            marginal_cost: None,
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(-0.5)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn test_new_bad_efficiency(#[case] efficiency: f64) {
        let parameters = TechnologyParameters {
            efficiency: Some(Dimensionless(efficiency)),
            ..parameters()
        };
        assert_error!(
            Technology::new(parameters, &CostAssumptions::default()),
            "Invalid parameter: coal: efficiency must be greater than 0 and at most 1"
        );
    }

    #[test]
    fn test_new_no_marginal_cost_or_efficiency() {
        let parameters = TechnologyParameters {
            efficiency: None,
            ..parameters()
        };
        assert!(matches!(
            Technology::new(parameters, &CostAssumptions::default()),
            Err(StudyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_new_weather_dependent_with_efficiency() {
        let parameters = TechnologyParameters {
            profile: Some("solar".into()),
            ..parameters()
        };
        assert!(Technology::new(parameters, &CostAssumptions::default()).is_err());
    }

    #[test]
    fn test_new_zero_lifetime() {
        let assumptions = CostAssumptions {
            lifetime: 0,
            ..CostAssumptions::default()
        };
        assert_error!(
            Technology::new(parameters(), &assumptions),
            "Invalid parameter: lifetime must be at least one year"
        );
    }

    #[test]
    fn test_create_technology_map_duplicate() {
        let result = create_technology_map(
            [parameters(), parameters()],
            &CostAssumptions::default(),
        );
        assert_eq!(result.unwrap_err().to_string(), "Duplicate ID found: coal");
    }
}
