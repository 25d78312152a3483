//! The command line interface for running fuel price studies.
use crate::log;
use crate::output::{create_output_directory, get_output_dir, write_charts, write_results};
use crate::settings::Settings;
use crate::solver::HighsSolver;
use crate::study::{Study, StudyParameters, StudyResults, run_study};
use ::log::{info, warn};
use anyhow::{Context, Result, ensure};
use clap::{Args, CommandFactory, Parser, Subcommand};
use itertools::Itertools;
use std::path::{Path, PathBuf};

/// The command line interface for fuel price studies.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// URL or path of the time series CSV file, overriding the study file
    #[arg(long)]
    pub time_series: Option<String>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a study.
    Run {
        /// Path to the study file. The default study is run if omitted.
        study_file: Option<PathBuf>,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Check a study can be loaded and a network built for every scenario.
    Validate {
        /// Path to the study file. The default study is checked if omitted.
        study_file: Option<PathBuf>,
        /// URL or path of the time series CSV file, overriding the study file
        #[arg(long)]
        time_series: Option<String>,
    },
    /// Show where the settings file is read from.
    SettingsPath,
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { study_file, opts } => {
                handle_run_command(study_file.as_deref(), &opts, None)
            }
            Self::Validate {
                study_file,
                time_series,
            } => handle_validate_command(study_file.as_deref(), time_series, None),
            Self::SettingsPath => {
                println!("{}", crate::settings::get_settings_file_path().display());
                Ok(())
            }
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load settings from the config file, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Read study parameters from a file, or use the default study
fn load_parameters(
    study_file: Option<&Path>,
    time_series: Option<String>,
) -> Result<StudyParameters> {
    let mut parameters = match study_file {
        Some(path) => StudyParameters::from_path(path)?,
        None => StudyParameters::default(),
    };
    if let Some(time_series) = time_series {
        parameters.time_series = time_series;
    }

    Ok(parameters)
}

/// Log capacities and costs for each scenario
fn log_summary(results: &StudyResults) {
    for (scenario, solution) in results.iter_solved() {
        let capacities = solution
            .capacities
            .iter()
            .map(|(id, capacity)| format!("{id} {:.3} MW", capacity.value()))
            .join(", ");
        info!(
            "{}: {capacities}; total cost {:.2}",
            scenario.id,
            solution.total_cost.value()
        );
    }
}

/// Handle the `run` command.
pub fn handle_run_command(
    study_file: Option<&Path>,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(study_file)?;
        &pathbuf
    };

    let overwrite = create_output_directory(output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    if !log::is_logger_initialised() {
        log::init(settings.log_level.as_deref(), Some(output_path))
            .context("Failed to initialise logging.")?;
    }

    let parameters = load_parameters(study_file, opts.time_series.clone())?;
    info!("Loading time series from {}", parameters.time_series);
    let study = Study::load(&parameters).context("Failed to load study.")?;
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let results = run_study(&study, &HighsSolver::new(settings.log_solver));
    ensure!(
        results.num_failed() < results.len(),
        "All {} scenarios failed",
        results.len()
    );
    if results.num_failed() > 0 {
        warn!(
            "{} of {} scenarios failed and are left out of the results",
            results.num_failed(),
            results.len()
        );
    }

    log_summary(&results);
    write_results(output_path, &results)?;
    write_charts(output_path, &results, &parameters.charts)?;
    info!("Study complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(
    study_file: Option<&Path>,
    time_series: Option<String>,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;

    // We won't save log files when running the validate command
    if !log::is_logger_initialised() {
        log::init(settings.log_level.as_deref(), None).context("Failed to initialise logging.")?;
    }

    let parameters = load_parameters(study_file, time_series)?;
    let study = Study::load(&parameters).context("Failed to validate study.")?;
    for scenario in study.scenarios.values() {
        study
            .build_network(scenario)
            .with_context(|| format!("Invalid network for scenario {}", scenario.id))?;
    }
    info!("Study validation successful!");

    Ok(())
}
