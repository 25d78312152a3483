//! General functions related to finance.
use crate::error::{StudyError, StudyResult};
use crate::units::{Dimensionless, MoneyPerCapacity};
use serde::{Deserialize, Serialize};

define_param_default!(default_fixed_om_percent, f64, 3.0);
define_param_default!(default_discount_rate, Dimensionless, Dimensionless(0.03));
define_param_default!(default_lifetime, u32, 25);

/// Assumptions shared by every technology when annualising investment costs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostAssumptions {
    /// Fixed operation and maintenance cost, as a percentage of investment cost per year
    #[serde(default = "default_fixed_om_percent")]
    pub fixed_om_percent: f64,
    /// Discount rate used for the capital recovery factor
    #[serde(default = "default_discount_rate")]
    pub discount_rate: Dimensionless,
    /// Economic lifetime in years
    #[serde(default = "default_lifetime")]
    pub lifetime: u32,
}

impl Default for CostAssumptions {
    fn default() -> Self {
        Self {
            fixed_om_percent: default_fixed_om_percent(),
            discount_rate: default_discount_rate(),
            lifetime: default_lifetime(),
        }
    }
}

/// Calculates the annuity (capital recovery factor) for a given lifetime and discount rate.
///
/// The annuity is used to annualise capital costs over the lifetime of an asset. A zero discount
/// rate spreads the cost evenly over the lifetime.
pub fn annuity(lifetime: u32, discount_rate: Dimensionless) -> StudyResult<Dimensionless> {
    if lifetime == 0 {
        return Err(StudyError::InvalidParameter(
            "lifetime must be at least one year".into(),
        ));
    }
    if !discount_rate.value().is_finite() || discount_rate < Dimensionless(0.0) {
        return Err(StudyError::InvalidParameter(format!(
            "discount rate must be a non-negative number (got {discount_rate})"
        )));
    }

    let lifetime = f64::from(lifetime);
    if discount_rate == Dimensionless(0.0) {
        return Ok(Dimensionless(1.0 / lifetime));
    }

    // 1 - (1 + rate)^-lifetime, without cancellation for rates close to zero
    let denominator = -(-lifetime * discount_rate.value().ln_1p()).exp_m1();
    Ok(discount_rate / Dimensionless(denominator))
}

/// Calculates the annualised fixed cost per unit of capacity.
///
/// This is the annualised investment cost plus fixed operation and maintenance costs.
pub fn annualised_fixed_cost(
    investment_cost: MoneyPerCapacity,
    assumptions: &CostAssumptions,
) -> StudyResult<MoneyPerCapacity> {
    if !assumptions.fixed_om_percent.is_finite() || assumptions.fixed_om_percent < 0.0 {
        return Err(StudyError::InvalidParameter(format!(
            "fixed O&M percentage must be a non-negative number (got {})",
            assumptions.fixed_om_percent
        )));
    }

    let annuity = annuity(assumptions.lifetime, assumptions.discount_rate)?;
    let fixed_om = Dimensionless(assumptions.fixed_om_percent / 100.0);
    Ok((annuity + fixed_om) * investment_cost)
}
