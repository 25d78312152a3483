//! Network descriptions for the optimiser.
//!
//! A network has a single bus with one fixed load and a set of generators whose capacities are
//! to be optimised. A fresh network is built for every scenario fuel price; all networks share the
//! same technology table and availability profiles.
use crate::error::{StudyError, StudyResult};
use crate::technology::{Technology, TechnologyID, TechnologyMap};
use crate::time_series::{Profile, TimeSeries};
use crate::units::{Capacity, Dimensionless, Hours, MoneyPerCapacity, MoneyPerEnergy, Power};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use std::rc::Rc;

/// The parts of a network which are the same in every scenario
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    /// Name of the bus
    pub bus: String,
    /// Constant demand at the bus
    pub load: Power,
    /// Weather-dependent technologies to attach, in order
    pub weather_technologies: Vec<TechnologyID>,
    /// Dispatchable technologies to attach, in order
    pub dispatchable_technologies: Vec<TechnologyID>,
    /// Duration represented by each snapshot
    pub snapshot_weighting: Hours,
}

/// A fixed demand at a bus
#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    /// The bus the load is attached to
    pub bus: String,
    /// Demand in every snapshot
    pub power: Power,
}

/// A generator attached to the bus
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    /// The technology this generator is built from
    pub technology: Rc<Technology>,
    /// The bus the generator is attached to
    pub bus: String,
    /// Whether the optimiser may choose the generator's capacity
    pub extendable: bool,
    /// Installed capacity before optimisation
    pub capacity: Capacity,
    /// Annualised cost per MW of capacity
    pub capital_cost: MoneyPerCapacity,
    /// Cost per MWh produced
    pub marginal_cost: MoneyPerEnergy,
    /// Fuel to electricity conversion efficiency, for fuel-burning generators
    pub efficiency: Option<Dimensionless>,
    /// Maximum output per MW of capacity in each snapshot. `None` means always fully available.
    pub availability: Option<Profile>,
}

impl Generator {
    /// Maximum output per MW of capacity in the given snapshot.
    ///
    /// Snapshots with no availability data are treated as having no output.
    pub fn availability_at(&self, snapshot: usize) -> Dimensionless {
        match &self.availability {
            None => Dimensionless(1.0),
            Some(profile) => Dimensionless(profile.get(snapshot).copied().flatten().unwrap_or(0.0)),
        }
    }
}

/// A complete network, ready to be handed to a solver
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    /// Name of the single bus
    pub bus: String,
    /// Times at which the network is optimised
    pub snapshots: Vec<NaiveDateTime>,
    /// Duration represented by each snapshot
    pub snapshot_weighting: Hours,
    /// The single load
    pub load: Load,
    /// Generators, keyed by technology ID
    pub generators: IndexMap<TechnologyID, Generator>,
}

/// Look up a technology, checking that it is of the expected kind
fn get_technology(
    technologies: &TechnologyMap,
    id: &TechnologyID,
    weather_dependent: bool,
) -> StudyResult<Rc<Technology>> {
    let technology = technologies
        .get(id)
        .ok_or_else(|| {
            StudyError::InvalidTechnology(format!("{id} is not in the technology table"))
        })?;

    if technology.is_weather_dependent() != weather_dependent {
        let expected = if weather_dependent {
            "weather dependent"
        } else {
            "dispatchable"
        };
        return Err(StudyError::InvalidTechnology(format!(
            "{id} is not {expected}"
        )));
    }

    Ok(Rc::clone(technology))
}

/// Get the availability profile for a weather-dependent technology, checking its values
fn get_profile(technology: &Technology, profiles: &TimeSeries) -> StudyResult<Profile> {
    // Only called for weather-dependent technologies, which always have a profile name
    let name = technology.profile().unwrap_or_default();
    let profile = profiles
        .profile(name)
        .ok_or_else(|| StudyError::MissingProfile {
            technology: technology.id.to_string(),
            profile: name.to_string(),
        })?;

    if let Some(value) = profile
        .iter()
        .flatten()
        .find(|value| !(0.0..=1.0).contains(*value))
    {
        return Err(StudyError::InvalidParameter(format!(
            "availability profile {name} contains {value}, which is not between 0 and 1"
        )));
    }

    Ok(Rc::clone(profile))
}

/// Build the network for a single fuel price.
///
/// Weather-dependent generators take their availability from `profiles`. Fuel-priced generators
/// get a marginal cost of `fuel_price / efficiency`; all other costs come from the technology
/// table. The network is not solved.
///
/// # Arguments
///
/// * `fuel_price` - The scenario's fuel price
/// * `technologies` - Technologies with annualised costs
/// * `profiles` - Availability profiles, already resampled to the snapshot frequency
/// * `config` - Bus, load and technology lists
pub fn build_network(
    fuel_price: MoneyPerEnergy,
    technologies: &TechnologyMap,
    profiles: &TimeSeries,
    config: &NetworkConfig,
) -> StudyResult<Network> {
    if !(fuel_price.is_finite() && fuel_price > MoneyPerEnergy(0.0)) {
        return Err(StudyError::InvalidScenario(fuel_price.value()));
    }

    let mut generators = IndexMap::new();
    let mut add_generator = |technology: Rc<Technology>, availability: Option<Profile>| {
        let generator = Generator {
            bus: config.bus.clone(),
            extendable: true,
            capacity: Capacity(0.0),
            capital_cost: technology.annualised_fixed_cost,
            marginal_cost: technology.marginal_cost(fuel_price),
            efficiency: technology.efficiency,
            availability,
            technology,
        };
        let id = generator.technology.id.clone();
        if generators.insert(id.clone(), generator).is_some() {
            return Err(StudyError::InvalidTechnology(format!(
                "{id} is listed more than once"
            )));
        }
        Ok(())
    };

    for id in &config.weather_technologies {
        let technology = get_technology(technologies, id, true)?;
        let profile = get_profile(&technology, profiles)?;
        add_generator(technology, Some(profile))?;
    }

    for id in &config.dispatchable_technologies {
        let technology = get_technology(technologies, id, false)?;
        add_generator(technology, None)?;
    }

    Ok(Network {
        bus: config.bus.clone(),
        snapshots: profiles.index().to_vec(),
        snapshot_weighting: config.snapshot_weighting,
        load: Load {
            bus: config.bus.clone(),
            power: config.load,
        },
        generators,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{
        assert_error, network_config, resampled_time_series, technologies,
    };
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_build_network(
        technologies: TechnologyMap,
        resampled_time_series: TimeSeries,
        network_config: NetworkConfig,
        #[values(0.5, 40.0, 70.0, 100.0, 1e4)] fuel_price: f64,
    ) {
        let network = build_network(
            MoneyPerEnergy(fuel_price),
            &technologies,
            &resampled_time_series,
            &network_config,
        )
        .unwrap();

        assert_eq!(network.bus, "electricity");
        assert_eq!(network.load.bus, "electricity");
        assert_eq!(network.load.power, Power(1.0));
        assert_eq!(network.snapshots.len(), 8);
        assert_eq!(network.snapshot_weighting, Hours(3.0));
        assert_eq!(
            network
                .generators
                .keys()
                .map(TechnologyID::as_str)
                .collect::<Vec<_>>(),
            ["solar", "wind", "gas", "lignite"]
        );
        assert!(network.generators.values().all(|g| g.extendable));
        assert!(network.generators.values().all(|g| g.bus == network.bus));
    }

    #[rstest]
    #[case(40.0, 66.666_666_666_666_67)]
    #[case(100.0, 166.666_666_666_666_67)]
    fn test_build_network_marginal_costs(
        technologies: TechnologyMap,
        resampled_time_series: TimeSeries,
        network_config: NetworkConfig,
        #[case] fuel_price: f64,
        #[case] gas_cost: f64,
    ) {
        let network = build_network(
            MoneyPerEnergy(fuel_price),
            &technologies,
            &resampled_time_series,
            &network_config,
        )
        .unwrap();

        assert_approx_eq!(
            MoneyPerEnergy,
            network.generators["gas"].marginal_cost,
            MoneyPerEnergy(gas_cost),
            epsilon = 1e-9
        );
        assert_eq!(
            network.generators["lignite"].marginal_cost,
            MoneyPerEnergy(130.0)
        );
        assert_eq!(
            network.generators["gas"].efficiency,
            Some(Dimensionless(0.6))
        );
    }

    #[rstest]
    fn test_only_gas_depends_on_fuel_price(
        technologies: TechnologyMap,
        resampled_time_series: TimeSeries,
        network_config: NetworkConfig,
    ) {
        let build = |price| {
            build_network(
                MoneyPerEnergy(price),
                &technologies,
                &resampled_time_series,
                &network_config,
            )
            .unwrap()
        };
        let low = build(40.0);
        let high = build(100.0);

        for (id, generator) in &low.generators {
            let other = &high.generators[id];
            assert_eq!(generator.capital_cost, other.capital_cost);
            if id.as_str() == "gas" {
                assert!(generator.marginal_cost < other.marginal_cost);
            } else {
                assert_eq!(generator.marginal_cost, other.marginal_cost);
            }
        }
    }

    #[rstest]
    fn test_build_network_shares_profiles(
        technologies: TechnologyMap,
        resampled_time_series: TimeSeries,
        network_config: NetworkConfig,
    ) {
        let network = build_network(
            MoneyPerEnergy(40.0),
            &technologies,
            &resampled_time_series,
            &network_config,
        )
        .unwrap();

        let availability = network.generators["wind"].availability.as_ref().unwrap();
        assert!(Rc::ptr_eq(
            availability,
            resampled_time_series.profile("onwind").unwrap()
        ));
        assert!(network.generators["gas"].availability.is_none());
        assert_eq!(
            network.generators["gas"].availability_at(3),
            Dimensionless(1.0)
        );
    }

    #[rstest]
    #[case(0.0)]
    #[case(-40.0)]
    #[case(f64::INFINITY)]
    fn test_build_network_bad_fuel_price(
        technologies: TechnologyMap,
        resampled_time_series: TimeSeries,
        network_config: NetworkConfig,
        #[case] fuel_price: f64,
    ) {
        let result = build_network(
            MoneyPerEnergy(fuel_price),
            &technologies,
            &resampled_time_series,
            &network_config,
        );
        assert!(matches!(result, Err(StudyError::InvalidScenario(_))));
    }

    #[rstest]
    fn test_build_network_unknown_technology(
        technologies: TechnologyMap,
        resampled_time_series: TimeSeries,
        mut network_config: NetworkConfig,
    ) {
        network_config.dispatchable_technologies.push("nuclear".into());
        assert_error!(
            build_network(
                MoneyPerEnergy(40.0),
                &technologies,
                &resampled_time_series,
                &network_config,
            ),
            "Invalid technology: nuclear is not in the technology table"
        );
    }

    #[rstest]
    fn test_build_network_wrong_kind(
        technologies: TechnologyMap,
        resampled_time_series: TimeSeries,
        mut network_config: NetworkConfig,
    ) {
        network_config.weather_technologies.push("gas".into());
        assert_error!(
            build_network(
                MoneyPerEnergy(40.0),
                &technologies,
                &resampled_time_series,
                &network_config,
            ),
            "Invalid technology: gas is not weather dependent"
        );
    }

    #[rstest]
    fn test_build_network_duplicate_technology(
        technologies: TechnologyMap,
        resampled_time_series: TimeSeries,
        mut network_config: NetworkConfig,
    ) {
        network_config.dispatchable_technologies.push("gas".into());
        assert_error!(
            build_network(
                MoneyPerEnergy(40.0),
                &technologies,
                &resampled_time_series,
                &network_config,
            ),
            "Invalid technology: gas is listed more than once"
        );
    }

    #[rstest]
    fn test_build_network_missing_profile(
        technologies: TechnologyMap,
        network_config: NetworkConfig,
    ) {
        let profiles = TimeSeries::new(
            vec![
                NaiveDateTime::parse_from_str("2015-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            ],
            indexmap::indexmap! {"solar".to_string() => vec![Some(0.5)]},
        )
        .unwrap();

        assert_error!(
            build_network(
                MoneyPerEnergy(40.0),
                &technologies,
                &profiles,
                &network_config,
            ),
            "No availability profile \"onwind\" for technology wind"
        );
    }

    #[rstest]
    fn test_build_network_bad_availability(
        technologies: TechnologyMap,
        network_config: NetworkConfig,
    ) {
        let profiles = TimeSeries::new(
            vec![
                NaiveDateTime::parse_from_str("2015-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            ],
            indexmap::indexmap! {
                "solar".to_string() => vec![Some(1.5)],
                "onwind".to_string() => vec![Some(0.5)],
            },
        )
        .unwrap();

        assert!(matches!(
            build_network(
                MoneyPerEnergy(40.0),
                &technologies,
                &profiles,
                &network_config,
            ),
            Err(StudyError::InvalidParameter(_))
        ));
    }

    #[rstest]
    fn test_availability_at_missing_value(technologies: TechnologyMap) {
        let generator = Generator {
            technology: Rc::clone(&technologies["solar"]),
            bus: "electricity".into(),
            extendable: true,
            capacity: Capacity(0.0),
            capital_cost: MoneyPerCapacity(1.0),
            marginal_cost: MoneyPerEnergy(0.0),
            efficiency: None,
            availability: Some(vec![Some(0.5), None].into()),
        };
        assert_eq!(generator.availability_at(0), Dimensionless(0.5));
        assert_eq!(generator.availability_at(1), Dimensionless(0.0));
    }
}
