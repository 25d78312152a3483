//! Bar charts of study results.
//!
//! Charts are assembled from solved scenarios and written out as data for an external renderer.
//! Each field of [`ChartOptions`] maps directly onto one property of the rendered chart.
use crate::study::StudyResults;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Colour for categories without an entry in [`ChartOptions::colors`]
const DEFAULT_FALLBACK_COLOR: &str = "gray";

/// Options for a bar chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    /// Chart title. Each chart has its own default.
    pub title: Option<String>,
    /// X axis label
    pub xlabel: String,
    /// Y axis label. Each chart has its own default.
    pub ylabel: Option<String>,
    /// Figure width and height in inches
    pub figsize: [f64; 2],
    /// Colour for each category (technology or scenario)
    pub colors: IndexMap<String, String>,
    /// Rotation of the x tick labels in degrees
    pub rotation: f64,
    /// Colour for categories missing from `colors`
    pub fallback_color: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: None,
            xlabel: "Scenario".into(),
            ylabel: None,
            figsize: [8.0, 5.0],
            colors: IndexMap::new(),
            rotation: 0.0,
            fallback_color: DEFAULT_FALLBACK_COLOR.into(),
        }
    }
}

impl ChartOptions {
    /// The colour for a category, falling back on `fallback_color`
    pub fn color_for(&self, category: &str) -> &str {
        self.colors
            .get(category)
            .unwrap_or(&self.fallback_color)
    }
}

/// Options for all charts produced by a study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    /// Installed capacity chart
    pub capacity: ChartOptions,
    /// Total cost chart
    pub cost: ChartOptions,
}

impl Default for ChartSettings {
    fn default() -> Self {
        let technology_colors = [
            ("solar", "gold"),
            ("wind", "steelblue"),
            ("gas", "firebrick"),
            ("lignite", "saddlebrown"),
        ];
        Self {
            capacity: ChartOptions {
                colors: technology_colors
                    .into_iter()
                    .map(|(tech, colour)| (tech.to_string(), colour.to_string()))
                    .collect(),
                ..ChartOptions::default()
            },
            cost: ChartOptions::default(),
        }
    }
}

/// One set of bars in a [`BarChart`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    /// Legend label
    pub label: String,
    /// Height of each bar, one per chart category
    pub values: Vec<f64>,
    /// Colour of each bar
    pub colors: Vec<String>,
}

/// A bar chart, ready to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    /// Chart title
    pub title: String,
    /// X axis label
    pub xlabel: String,
    /// Y axis label
    pub ylabel: String,
    /// Figure width and height in inches
    pub figsize: [f64; 2],
    /// Rotation of the x tick labels in degrees
    pub rotation: f64,
    /// Whether series are stacked on top of each other
    pub stacked: bool,
    /// Labels along the x axis
    pub categories: Vec<String>,
    /// The bars
    pub series: Vec<BarSeries>,
}

impl BarChart {
    /// Create an empty chart from options and default labels
    fn new(options: &ChartOptions, title: &str, ylabel: &str, stacked: bool) -> Self {
        Self {
            title: options.title.clone().unwrap_or_else(|| title.into()),
            xlabel: options.xlabel.clone(),
            ylabel: options.ylabel.clone().unwrap_or_else(|| ylabel.into()),
            figsize: options.figsize,
            rotation: options.rotation,
            stacked,
            categories: Vec::new(),
            series: Vec::new(),
        }
    }
}

/// Stacked bars of installed capacity per technology, one bar per solved scenario
pub fn capacity_chart(results: &StudyResults, options: &ChartOptions) -> BarChart {
    let mut chart = BarChart::new(options, "Installed capacity", "Capacity (MW)", true);
    let solved: Vec<_> = results.iter_solved().collect();
    chart.categories = solved
        .iter()
        .map(|(scenario, _)| scenario.id.to_string())
        .collect();

    let technologies: IndexSet<_> = solved
        .iter()
        .flat_map(|(_, solution)| solution.capacities.keys())
        .collect();
    chart.series = technologies
        .into_iter()
        .map(|technology| {
            let color = options.color_for(technology.as_str()).to_string();
            BarSeries {
                label: technology.to_string(),
                values: solved
                    .iter()
                    .map(|(_, solution)| {
                        solution
                            .capacities
                            .get(technology)
                            .map_or(0.0, |capacity| capacity.value())
                    })
                    .collect(),
                colors: vec![color; solved.len()],
            }
        })
        .collect();

    chart
}

/// Bars of total system cost, one per solved scenario and coloured by scenario
pub fn cost_chart(results: &StudyResults, options: &ChartOptions) -> BarChart {
    let mut chart = BarChart::new(options, "Total system cost", "Cost per year", false);
    let solved: Vec<_> = results.iter_solved().collect();
    chart.categories = solved
        .iter()
        .map(|(scenario, _)| scenario.id.to_string())
        .collect();
    chart.series = vec![BarSeries {
        label: "Total cost".into(),
        values: solved
            .iter()
            .map(|(_, solution)| solution.total_cost.value())
            .collect(),
        colors: solved
            .iter()
            .map(|(scenario, _)| options.color_for(scenario.id.as_str()).to_string())
            .collect(),
    }];

    chart
}
