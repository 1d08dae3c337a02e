//! Module containing initialization routines for the parameters of a model.

use crate::conditional::{Conditional, Signature};
use crate::factor::Factor;
use crate::util::{DiscreteError, Result};
use crate::variable::Variable;

use ndarray::prelude as nd;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use tracing::debug;

/// Defines possible ways to initialize a `Variable`s CPD.
pub enum Initialization<'a> {
    /// A uniform distribution over all possibilities
    Uniform,

    /// Randomly initialize the weights of the CPD.
    Random,

    /// Initialize the CPD as a Binomial distribution with parameter ```p```.
    /// Note that this `Initialization` is valid only to a `Variable` with no parents.
    Binomial(f64),

    /// Initialize the CPD as a Multinomial distribution with parameters ```p_0, p_1...```.
    /// Note that this `Initialization` is valid only to a `Variable` with no parents.
    Multinomial(&'a [f64]),

    /// Unnormalized weights, one row per parent configuration (see `Signature`)
    Weights(Vec<Vec<f64>>),

    /// User defined CPD
    Table(Factor)
}


impl<'a> Initialization<'a> {

    /// Construct the `Conditional` ```P(var | parents)```, initialized based on ```self```
    ///
    /// # Args
    /// * `var`: the frontal `Variable`
    /// * `parents`: the parents of `var`, in the order they should appear in the `Conditional`
    ///
    /// # Errors
    /// * `DiscreteError::InvalidInitialization` if ```self``` cannot describe a CPD of `var`
    ///   given `parents`
    /// * `DiscreteError::InvalidScope` if a user defined table is not over `var` and `parents`
    pub fn build_conditional(self, var: Variable, parents: Vec<Variable>) -> Result<Conditional> {
        let mut shape: Vec<usize> = parents.iter().map(|v| v.cardinality()).collect();
        shape.push(var.cardinality());
        let ax = nd::Axis(shape.len() - 1);

        let tbl = match self {

            ///////////////////////////////////////////////////////////////////////////////
            // Trivial cases
            Initialization::Weights(rows) => {
                return Conditional::from_signature(&Signature::new(var, parents, rows));
            },

            // a user defined table just needs to be reordered and verified
            Initialization::Table(f) => {
                return table_conditional(&f, var, parents);
            },

            ///////////////////////////////////////////////////////////////////////////////
            // Generated tables
            Initialization::Uniform => {
                // normalizing constant is just the cardinality of var
                let val = 1. / (var.cardinality() as f64);
                nd::Array::from_elem(shape, val)
            },

            Initialization::Random => {
                let mut tbl = nd::Array::random(shape, Uniform::new(1.0, 100.0));
                for mut row in tbl.lanes_mut(ax) {
                    let z = row.sum();
                    row.mapv_inplace(|x| x / z);
                }
                tbl
            },

            ///////////////////////////////////////////////////////////////////////////////
            // Parameterized distributions, valid only on a binary/matching variable with no parents
            Initialization::Binomial(p) => {
                if ! parents.is_empty() || var.cardinality() != 2 {
                    return Err(DiscreteError::InvalidInitialization);
                }
                nd::arr1(&[p, 1.0 - p]).into_dyn()
            },

            Initialization::Multinomial(ps) => {
                if ! parents.is_empty() || ps.len() != var.cardinality() {
                    return Err(DiscreteError::InvalidInitialization);
                }
                nd::Array::from(ps.to_vec()).into_dyn()
            }
        };

        debug!(variable = %var, parents = parents.len(), "initialized CPD");
        Conditional::from_cpd(var, parents, tbl).map_err(|e| match e {
            DiscreteError::General(_) => DiscreteError::InvalidInitialization,
            e => e
        })
    }

}


/// Build ```P(var | parents)``` from a user defined table over `var` and `parents`, in any order.
fn table_conditional(f: &Factor, var: Variable, parents: Vec<Variable>) -> Result<Conditional> {
    let s = f.scope();
    if s.len() != parents.len() + 1 || ! s.contains(&var) || ! parents.iter().all(|v| s.contains(v)) {
        return Err(DiscreteError::InvalidScope);
    }

    let mut order = parents.clone();
    order.push(var);
    let tbl = f.permute(&order)?.table().clone();

    Conditional::from_cpd(var, parents, tbl).map_err(|_| DiscreteError::InvalidInitialization)
}
