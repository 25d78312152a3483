//! Integration tests running the default study on a local time series.
use float_cmp::assert_approx_eq;
use fuelstudy::output::{write_charts, write_results};
use fuelstudy::solver::HighsSolver;
use fuelstudy::study::{Study, StudyParameters, run_study};
use fuelstudy::units::{Capacity, MoneyPerEnergy};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

/// Parameters for the default study, but with the time series read from disk
fn get_parameters() -> StudyParameters {
    StudyParameters {
        time_series: PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/data/time_series.csv")
            .to_string_lossy()
            .into_owned(),
        ..StudyParameters::default()
    }
}

#[test]
fn test_default_study() {
    let study = Study::load(&get_parameters()).unwrap();
    assert_eq!(study.profiles.len(), 8);
    assert_eq!(study.scenarios.len(), 3);

    let results = run_study(&study, &HighsSolver::default());
    assert_eq!(results.len(), 3);
    assert_eq!(results.num_failed(), 0);

    let solved: Vec<_> = results.iter_solved().collect();
    let ids: Vec<_> = solved.iter().map(|(scenario, _)| scenario.id.as_str()).collect();
    assert_eq!(ids, ["low", "med", "high"]);

    for (scenario, solution) in &solved {
        assert_eq!(
            solution.capacities.keys().map(|id| id.as_str()).collect::<Vec<_>>(),
            ["solar", "wind", "gas", "lignite"]
        );
        assert!(scenario.fuel_price > MoneyPerEnergy(0.0));

        // Dispatchable capacity alone can always meet the load, so there is never more than 1 MW
        let dispatchable = solution.capacities["gas"] + solution.capacities["lignite"];
        assert!(dispatchable <= Capacity(1.0 + 1e-6));
    }

    // Raising the fuel price can only make the system more expensive
    for pair in solved.windows(2) {
        assert!(pair[1].1.total_cost.value() >= pair[0].1.total_cost.value() - 1e-6);
    }

    assert_approx_eq!(
        f64,
        study.scenarios.values().map(|s| s.probability.value()).sum::<f64>(),
        1.0
    );

    let dir = tempdir().unwrap();
    write_results(dir.path(), &results).unwrap();
    write_charts(dir.path(), &results, &get_parameters().charts).unwrap();

    let capacities = fs::read_to_string(dir.path().join("capacities.csv")).unwrap();
    assert_eq!(capacities.lines().count(), 1 + 3 * 4);
    assert!(capacities.starts_with("scenario_id,technology_id,capacity\nlow,solar,"));
}

#[test]
fn test_study_missing_time_series() {
    let parameters = StudyParameters {
        time_series: "does/not/exist.csv".into(),
        ..StudyParameters::default()
    };
    assert!(Study::load(&parameters).is_err());
}
