//! The module responsible for writing output data to disk.
use crate::chart::{BarChart, ChartSettings, capacity_chart, cost_chart};
use crate::scenario::ScenarioID;
use crate::study::StudyResults;
use crate::technology::TechnologyID;
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which study-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "fuelstudy_results";

/// The output file name for optimal capacities
const CAPACITIES_FILE_NAME: &str = "capacities.csv";

/// The output file name for total system costs
const COSTS_FILE_NAME: &str = "costs.csv";

/// The output file name for the capacity chart
const CAPACITY_CHART_FILE_NAME: &str = "capacity_chart.toml";

/// The output file name for the cost chart
const COST_CHART_FILE_NAME: &str = "cost_chart.toml";

/// Get the default output directory for a study
///
/// # Arguments
///
/// * `study_file` - The study file, or `None` if the default study is being run
pub fn get_output_dir(study_file: Option<&Path>) -> Result<PathBuf> {
    let study_name = match study_file {
        None => "default",
        Some(path) => path
            .file_stem()
            .context("Study file path has no file name")?
            .to_str()
            .context("Invalid chars in study file name")?,
    };

    Ok([OUTPUT_DIRECTORY_ROOT, study_name].iter().collect())
}

/// Create a new output directory.
///
/// If the directory already exists and is not empty, it will only be reused if `allow_overwrite`
/// is true.
///
/// # Returns
///
/// True if an existing directory with files in it will be written over
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        let is_empty = fs::read_dir(output_dir)?.next().is_none();
        if is_empty {
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use the --overwrite option to \
            overwrite it."
        );
        return Ok(true);
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// Represents a row in the capacities CSV file
#[derive(Serialize, Debug, PartialEq)]
struct CapacityRow<'a> {
    scenario_id: &'a ScenarioID,
    technology_id: &'a TechnologyID,
    capacity: f64,
}

/// Represents a row in the costs CSV file
#[derive(Serialize, Debug, PartialEq)]
struct CostRow<'a> {
    scenario_id: &'a ScenarioID,
    fuel_price: f64,
    probability: f64,
    total_cost: f64,
}

/// Write capacities and costs of all solved scenarios to CSV files
pub fn write_results(output_path: &Path, results: &StudyResults) -> Result<()> {
    let new_writer = |file_name| {
        let file_path = output_path.join(file_name);
        csv::Writer::from_path(&file_path)
            .with_context(|| format!("Could not create {}", file_path.display()))
    };
    let mut capacities_writer = new_writer(CAPACITIES_FILE_NAME)?;
    let mut costs_writer = new_writer(COSTS_FILE_NAME)?;

    for (scenario, solution) in results.iter_solved() {
        for (technology_id, capacity) in &solution.capacities {
            capacities_writer.serialize(CapacityRow {
                scenario_id: &scenario.id,
                technology_id,
                capacity: capacity.value(),
            })?;
        }

        costs_writer.serialize(CostRow {
            scenario_id: &scenario.id,
            fuel_price: scenario.fuel_price.value(),
            probability: scenario.probability.value(),
            total_cost: solution.total_cost.value(),
        })?;
    }

    capacities_writer.flush()?;
    costs_writer.flush()?;

    Ok(())
}

/// Write a chart to a TOML file
fn write_chart(file_path: &Path, chart: &BarChart) -> Result<()> {
    let contents = toml::to_string(chart).context("Could not convert chart to TOML")?;
    fs::write(file_path, contents)
        .with_context(|| format!("Could not write {}", file_path.display()))
}

/// Write the capacity and cost charts for all solved scenarios
pub fn write_charts(
    output_path: &Path,
    results: &StudyResults,
    settings: &ChartSettings,
) -> Result<()> {
    write_chart(
        &output_path.join(CAPACITY_CHART_FILE_NAME),
        &capacity_chart(results, &settings.capacity),
    )?;
    write_chart(
        &output_path.join(COST_CHART_FILE_NAME),
        &cost_chart(results, &settings.cost),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudyError;
    use crate::scenario::Scenario;
    use crate::solver::Solution;
    use crate::study::ScenarioResult;
    use crate::units::{Capacity, Dimensionless, Money, MoneyPerEnergy};
    use indexmap::indexmap;
    use std::fs::File;
    use tempfile::tempdir;

    fn results() -> StudyResults {
        let scenario = |id: &str, fuel_price| Scenario {
            id: id.into(),
            fuel_price: MoneyPerEnergy(fuel_price),
            probability: Dimensionless(0.5),
        };

        StudyResults::new(vec![
            ScenarioResult {
                scenario: scenario("low", 40.0),
                outcome: Ok(Solution {
                    capacities: indexmap! {
                        "solar".into() => Capacity(0.5),
                        "gas".into() => Capacity(1.0),
                    },
                    total_cost: Money(1000.0),
                }),
            },
            ScenarioResult {
                scenario: scenario("high", 100.0),
                outcome: Err(StudyError::Solver("Could not solve: Infeasible".into())),
            },
        ])
    }

    #[test]
    fn test_get_output_dir() {
        assert_eq!(
            get_output_dir(None).unwrap(),
            PathBuf::from("fuelstudy_results/default")
        );
        assert_eq!(
            get_output_dir(Some(Path::new("studies/gas.toml"))).unwrap(),
            PathBuf::from("fuelstudy_results/gas")
        );
    }

    #[test]
    fn test_create_output_directory_new_directory() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("output");
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());
    }

    #[test]
    fn test_create_output_directory_existing_empty_directory() {
        let temp_dir = tempdir().unwrap();
        assert!(!create_output_directory(temp_dir.path(), false).unwrap());
    }

    #[test]
    fn test_create_output_directory_existing_with_files() {
        let temp_dir = tempdir().unwrap();
        File::create(temp_dir.path().join("file.txt")).unwrap();

        assert!(create_output_directory(temp_dir.path(), false).is_err());
        assert!(create_output_directory(temp_dir.path(), true).unwrap());
    }

    #[test]
    fn test_write_results() {
        let dir = tempdir().unwrap();
        write_results(dir.path(), &results()).unwrap();

        let capacities = fs::read_to_string(dir.path().join(CAPACITIES_FILE_NAME)).unwrap();
        assert_eq!(
            capacities,
            "scenario_id,technology_id,capacity\nlow,solar,0.5\nlow,gas,1.0\n"
        );

        let costs = fs::read_to_string(dir.path().join(COSTS_FILE_NAME)).unwrap();
        assert_eq!(
            costs,
            "scenario_id,fuel_price,probability,total_cost\nlow,40.0,0.5,1000.0\n"
        );
    }

    #[test]
    fn test_write_charts() {
        let dir = tempdir().unwrap();
        write_charts(dir.path(), &results(), &ChartSettings::default()).unwrap();

        let contents = fs::read_to_string(dir.path().join(CAPACITY_CHART_FILE_NAME)).unwrap();
        let chart: toml::Table = toml::from_str(&contents).unwrap();
        assert_eq!(chart["title"].as_str(), Some("Installed capacity"));
        assert_eq!(chart["series"].as_array().unwrap().len(), 2);
        assert!(dir.path().join(COST_CHART_FILE_NAME).is_file());
    }
}
