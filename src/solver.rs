//! Code for solving the capacity expansion problem for a network.
//!
//! The study only needs optimal capacities and the total system cost from a solve, so the
//! optimiser is hidden behind the [`Solver`] trait. [`HighsSolver`] is the default implementation.
use crate::error::{StudyError, StudyResult};
use crate::network::Network;
use crate::technology::TechnologyID;
use crate::units::{Capacity, Money};
use highs::{HighsModelStatus, RowProblem as Problem, Sense};
use indexmap::IndexMap;
use log::debug;

/// A decision variable in the optimisation
type Variable = highs::Col;

/// The results of optimising a network
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Optimal installed capacity per generator
    pub capacities: IndexMap<TechnologyID, Capacity>,
    /// Annualised capital costs plus weighted operating costs
    pub total_cost: Money,
}

/// Something which can optimise a network
pub trait Solver {
    /// Optimise the network, returning optimal capacities and total cost
    fn solve(&self, network: &Network) -> StudyResult<Solution>;
}

/// Variables for a single generator
struct GeneratorVariables {
    capacity: Variable,
    dispatch: Vec<Variable>,
}

/// Solves the single-bus capacity expansion LP with HiGHS
#[derive(Debug, Clone, Default)]
pub struct HighsSolver {
    /// Whether to print HiGHS's own log to the console
    pub log_to_console: bool,
}

impl HighsSolver {
    /// Create a new [`HighsSolver`]
    pub fn new(log_to_console: bool) -> Self {
        Self { log_to_console }
    }
}

/// Add capacity and dispatch variables for every generator.
///
/// Capacity is costed at the annualised capital cost. Dispatch in each snapshot is costed at the
/// marginal cost multiplied by the snapshot weighting.
fn add_variables(
    problem: &mut Problem,
    network: &Network,
) -> IndexMap<TechnologyID, GeneratorVariables> {
    let weighting = network.snapshot_weighting.value();

    network
        .generators
        .iter()
        .map(|(id, generator)| {
            let capacity = if generator.extendable {
                problem.add_column(generator.capital_cost.value(), generator.capacity.value()..)
            } else {
                let capacity = generator.capacity.value();
                problem.add_column(generator.capital_cost.value(), capacity..=capacity)
            };

            let cost = generator.marginal_cost.value() * weighting;
            let dispatch = network
                .snapshots
                .iter()
                .map(|_| problem.add_column(cost, 0.0..))
                .collect();

            (id.clone(), GeneratorVariables { capacity, dispatch })
        })
        .collect()
}

/// Add constraints limiting dispatch to available capacity and balancing supply and demand
fn add_constraints(
    problem: &mut Problem,
    network: &Network,
    variables: &IndexMap<TechnologyID, GeneratorVariables>,
) {
    for (id, generator) in &network.generators {
        let vars = &variables[id];
        for (snapshot, dispatch) in vars.dispatch.iter().enumerate() {
            let availability = generator.availability_at(snapshot).value();
            problem.add_row(..=0.0, [(*dispatch, 1.0), (vars.capacity, -availability)]);
        }
    }

    let load = network.load.power.value();
    for snapshot in 0..network.snapshots.len() {
        let terms = variables.values().map(|vars| (vars.dispatch[snapshot], 1.0));
        problem.add_row(load..=load, terms);
    }
}

/// Read optimal capacities and the objective value from the solution's column values.
///
/// Columns were added per generator as one capacity column followed by one dispatch column per
/// snapshot.
fn read_solution(network: &Network, columns: &[f64]) -> Solution {
    let weighting = network.snapshot_weighting.value();
    let mut capacities = IndexMap::new();
    let mut total_cost = 0.0;
    for ((id, generator), columns) in network
        .generators
        .iter()
        .zip(columns.chunks(1 + network.snapshots.len()))
    {
        let Some((capacity, dispatch)) = columns.split_first() else {
            continue;
        };
        let dispatched: f64 = dispatch.iter().sum();
        total_cost += generator.capital_cost.value() * capacity
            + generator.marginal_cost.value() * weighting * dispatched;
        capacities.insert(id.clone(), Capacity(*capacity));
    }

    Solution {
        capacities,
        total_cost: Money(total_cost),
    }
}

impl Solver for HighsSolver {
    fn solve(&self, network: &Network) -> StudyResult<Solution> {
        let mut problem = Problem::default();
        let variables = add_variables(&mut problem, network);
        add_constraints(&mut problem, network, &variables);
        debug!(
            "Solving network with {} generators and {} snapshots",
            network.generators.len(),
            network.snapshots.len()
        );

        let mut model = problem.optimise(Sense::Minimise);
        model.set_option("output_flag", self.log_to_console);
        model.set_option("log_to_console", self.log_to_console);

        let solved = model.solve();
        match solved.status() {
            HighsModelStatus::Optimal => {
                Ok(read_solution(network, solved.get_solution().columns()))
            }
            status => Err(StudyError::Solver(format!("Could not solve: {status:?}"))),
        }
    }
}
