//! Linear cost terms contributed by retail energy prices to a dispatch optimisation.
//!
//! The terms are built from fixed prices and linear expressions over the optimiser's decision
//! variables. Nothing is solved here: the caller inserts the returned expressions into its own
//! objective.
use crate::units::{Dimensionless, Hours, MoneyPerEnergy};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use std::hash::Hash;

/// The name under which the energy cost term is returned
pub const ENERGY_COST_NAME: &str = "retailETS";

/// A linear expression: a weighted sum of variables plus a constant.
///
/// `V` identifies a decision variable of the wider optimisation problem. A purely numeric input
/// is represented by an expression with only a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearExpr<V: Eq + Hash> {
    terms: IndexMap<V, f64>,
    constant: f64,
}

impl<V: Eq + Hash> Default for LinearExpr<V> {
    fn default() -> Self {
        Self {
            terms: IndexMap::new(),
            constant: 0.0,
        }
    }
}

impl<V: Eq + Hash + Clone> LinearExpr<V> {
    /// An expression with no variables and a value of zero
    pub fn zero() -> Self {
        Self::default()
    }

    /// An expression with a constant value
    pub fn constant(value: f64) -> Self {
        Self {
            terms: IndexMap::new(),
            constant: value,
        }
    }

    /// An expression consisting of a single variable with a coefficient of one
    pub fn variable(var: V) -> Self {
        Self::term(var, 1.0)
    }

    /// An expression consisting of a single weighted variable
    pub fn term(var: V, coefficient: f64) -> Self {
        let mut expr = Self::zero();
        expr.add_term(var, coefficient);
        expr
    }

    /// Add a weighted variable to the expression
    pub fn add_term(&mut self, var: V, coefficient: f64) {
        *self.terms.entry(var).or_insert(0.0) += coefficient;
    }

    /// Add `scale` times `other` to the expression
    pub fn add_scaled(&mut self, other: &Self, scale: f64) {
        for (var, coefficient) in &other.terms {
            self.add_term(var.clone(), coefficient * scale);
        }
        self.constant += other.constant * scale;
    }

    /// The coefficient of `var`, which is zero if the variable doesn't appear
    pub fn coefficient(&self, var: &V) -> f64 {
        self.terms.get(var).copied().unwrap_or(0.0)
    }

    /// The constant part of the expression
    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    /// Iterate over the variables and their coefficients, in insertion order
    pub fn iter_terms(&self) -> impl Iterator<Item = (&V, f64)> {
        self.terms.iter().map(|(var, coefficient)| (var, *coefficient))
    }

    /// Evaluate the expression given a value for each variable
    pub fn evaluate<F>(&self, value_of: F) -> f64
    where
        F: Fn(&V) -> f64,
    {
        self.iter_terms()
            .map(|(var, coefficient)| coefficient * value_of(var))
            .sum::<f64>()
            + self.constant
    }
}

impl<V: Eq + Hash + Clone> From<f64> for LinearExpr<V> {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

/// Named cost expressions to be added to an optimisation objective
pub type CostTerms<V> = IndexMap<String, LinearExpr<V>>;

/// The power flows of the system at each selected timestep.
///
/// Each vector has one expression per timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerFlowTerms<V: Eq + Hash> {
    /// Total site load
    pub load: Vec<LinearExpr<V>>,
    /// Total output of variable (intermittent) generation
    pub variable_generation: Vec<LinearExpr<V>>,
    /// Total output of conventional generation
    pub conventional_generation: Vec<LinearExpr<V>>,
    /// Net power of all storage (charge minus discharge)
    pub net_storage_power: Vec<LinearExpr<V>>,
}

impl<V: Eq + Hash + Clone> PowerFlowTerms<V> {
    /// Power flow terms where every flow is zero
    pub fn zeros(len: usize) -> Self {
        Self {
            load: vec![LinearExpr::zero(); len],
            variable_generation: vec![LinearExpr::zero(); len],
            conventional_generation: vec![LinearExpr::zero(); len],
            net_storage_power: vec![LinearExpr::zero(); len],
        }
    }

    /// Check every flow has `len` timesteps
    fn check_len(&self, len: usize) -> Result<()> {
        for (name, flow) in [
            ("load", &self.load),
            ("variable generation", &self.variable_generation),
            ("conventional generation", &self.conventional_generation),
            ("net storage power", &self.net_storage_power),
        ] {
            ensure!(
                flow.len() == len,
                "Expected {len} timesteps of {name} to match energy prices, found {}",
                flow.len()
            );
        }

        Ok(())
    }
}

/// Build the energy cost term for a set of timesteps.
///
/// The cost is the sum over timesteps of
/// `price * (load + net storage power - variable generation - conventional generation)`,
/// multiplied by the timestep duration and the annuity scalar. Load and storage charging are costs
/// and generation is a credit.
///
/// # Arguments
///
/// * `prices` - Energy price at each selected timestep
/// * `flows` - Power flows at the same timesteps
/// * `timestep_duration` - Length of each timestep
/// * `annuity_scalar` - Multiplier projecting one year's cost over a project lifetime (use one
///   unless sizing)
///
/// # Returns
///
/// A map containing a single expression named [`ENERGY_COST_NAME`].
pub fn energy_cost_terms<V: Eq + Hash + Clone>(
    prices: &[MoneyPerEnergy],
    flows: &PowerFlowTerms<V>,
    timestep_duration: Hours,
    annuity_scalar: Dimensionless,
) -> Result<CostTerms<V>> {
    flows.check_len(prices.len())?;

    let mut cost = LinearExpr::zero();
    for (t, &price) in prices.iter().enumerate() {
        let coefficient = (price * timestep_duration * annuity_scalar).value();
        cost.add_scaled(&flows.load[t], coefficient);
        cost.add_scaled(&flows.net_storage_power[t], coefficient);
        cost.add_scaled(&flows.variable_generation[t], -coefficient);
        cost.add_scaled(&flows.conventional_generation[t], -coefficient);
    }

    Ok(CostTerms::from([(ENERGY_COST_NAME.to_string(), cost)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;

    fn constants(values: &[f64]) -> Vec<LinearExpr<usize>> {
        values.iter().map(|&value| LinearExpr::constant(value)).collect()
    }

    #[test]
    fn test_linear_expr() {
        let mut expr = LinearExpr::variable("a");
        expr.add_term("b", 2.0);
        expr.add_term("a", 0.5);
        let mut other = LinearExpr::term("b", 1.0);
        other.add_scaled(&LinearExpr::constant(3.0), 1.0);
        expr.add_scaled(&other, -2.0);

        assert_eq!(expr.coefficient(&"a"), 1.5);
        assert_eq!(expr.coefficient(&"b"), 0.0);
        assert_eq!(expr.coefficient(&"c"), 0.0);
        assert_eq!(expr.constant_value(), -6.0);
        assert_eq!(expr.iter_terms().map(|(var, _)| *var).collect_vec(), ["a", "b"]);
        assert_eq!(expr.evaluate(|_| 2.0), -3.0);
    }

    #[test]
    fn test_energy_cost_constant_load() {
        let prices = vec![MoneyPerEnergy(0.2); 4];
        let flows = PowerFlowTerms {
            load: constants(&[1.0; 4]),
            ..PowerFlowTerms::zeros(4)
        };
        let terms =
            energy_cost_terms(&prices, &flows, Hours(0.25), Dimensionless(1.0)).unwrap();

        assert_eq!(terms.keys().collect_vec(), [ENERGY_COST_NAME]);
        let cost = &terms[ENERGY_COST_NAME];
        assert_approx_eq!(f64, cost.constant_value(), 0.2);
        assert_eq!(cost.iter_terms().count(), 0);
    }

    #[test]
    fn test_energy_cost_signs_and_scaling() {
        let prices = [MoneyPerEnergy(0.1), MoneyPerEnergy(0.3)];
        // Variables 0 and 1 are storage power, 2 and 3 are PV output
        let flows = PowerFlowTerms {
            load: constants(&[5.0, 5.0]),
            net_storage_power: vec![LinearExpr::variable(0), LinearExpr::variable(1)],
            variable_generation: vec![LinearExpr::variable(2), LinearExpr::variable(3)],
            conventional_generation: constants(&[1.0, 0.0]),
        };
        let terms = energy_cost_terms(&prices, &flows, Hours(1.0), Dimensionless(10.0)).unwrap();
        let cost = &terms[ENERGY_COST_NAME];

        assert_approx_eq!(f64, cost.coefficient(&0), 1.0);
        assert_approx_eq!(f64, cost.coefficient(&1), 3.0);
        assert_approx_eq!(f64, cost.coefficient(&2), -1.0);
        assert_approx_eq!(f64, cost.coefficient(&3), -3.0);
        // (0.1 * (5 - 1) + 0.3 * 5) * 10
        assert_approx_eq!(f64, cost.constant_value(), 19.0);

        // Charging when cheap and discharging when expensive lowers the cost
        let values = [2.0, -2.0, 0.0, 0.0];
        assert_approx_eq!(f64, cost.evaluate(|&var| values[var]), 19.0 + 2.0 - 6.0);
    }

    #[test]
    fn test_energy_cost_length_mismatch() {
        let prices = vec![MoneyPerEnergy(0.2); 3];
        let flows = PowerFlowTerms::<usize> {
            net_storage_power: constants(&[0.0; 2]),
            ..PowerFlowTerms::zeros(3)
        };
        assert_error!(
            energy_cost_terms(&prices, &flows, Hours(1.0), Dimensionless(1.0)),
            "Expected 3 timesteps of net storage power to match energy prices, found 2"
        );
    }
}
