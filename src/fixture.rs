//! Fixtures for tests
use crate::finance::CostAssumptions;
use crate::network::NetworkConfig;
use crate::scenario::{ScenarioMap, create_scenario_map, default_scenarios};
use crate::technology::{TechnologyMap, create_technology_map, default_technologies};
use crate::time_series::TimeSeries;
use crate::units::{Hours, Power};
use chrono::{NaiveDate, TimeDelta};
use indexmap::indexmap;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!($result.unwrap_err().to_string(), $msg);
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn technologies() -> TechnologyMap {
    create_technology_map(default_technologies(), &CostAssumptions::default()).unwrap()
}

#[fixture]
pub fn scenarios() -> ScenarioMap {
    create_scenario_map(default_scenarios()).unwrap()
}

/// One day of hourly profiles
#[fixture]
pub fn time_series() -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let index = (0..24).map(|hour| start + TimeDelta::hours(hour)).collect();
    let solar = (0..24)
        .map(|hour| match hour {
            8..=16 => Some(1.0 - f64::from((hour - 12_i32).abs()) / 5.0),
            _ => Some(0.0),
        })
        .collect();
    let onwind = (0..24)
        .map(|hour| Some(0.2 + 0.5 * f64::from(hour % 6) / 6.0))
        .collect();
    let load = vec![Some(1.0); 24];

    TimeSeries::new(
        index,
        indexmap! {
            "load".to_string() => load,
            "onwind".to_string() => onwind,
            "solar".to_string() => solar,
        },
    )
    .unwrap()
}

/// The hourly profiles resampled to three-hourly snapshots
#[fixture]
pub fn resampled_time_series(time_series: TimeSeries) -> TimeSeries {
    time_series.resample(TimeDelta::hours(3)).unwrap()
}

#[fixture]
pub fn network_config() -> NetworkConfig {
    NetworkConfig {
        bus: "electricity".into(),
        load: Power(1.0),
        weather_technologies: vec!["solar".into(), "wind".into()],
        dispatchable_technologies: vec!["gas".into(), "lignite".into()],
        snapshot_weighting: Hours(3.0),
    }
}
