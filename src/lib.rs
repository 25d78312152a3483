//! Capacity expansion for a single-bus electricity system under fuel price uncertainty.
#![warn(missing_docs)]

/// Define a function returning the default value of a parameter, for use with `#[serde(default)]`
macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

pub mod chart;
pub mod cli;
pub mod error;
pub mod finance;
pub mod id;
pub mod log;
pub mod network;
pub mod output;
pub mod scenario;
pub mod settings;
pub mod solver;
pub mod study;
pub mod technology;
pub mod time_series;
pub mod units;

#[cfg(test)]
mod fixture;
