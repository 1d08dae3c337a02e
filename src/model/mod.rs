//! Defines a `Model`, a factorization of a probability distribution P into `Conditional`s: a
//! Bayesian network (`directed`) or a Bayes tree of cliques (`bayes_tree`).

use crate::conditional::Conditional;
use crate::util::Result;
use crate::variable::{Assignment, Variable};

use std::collections::HashSet;

/// The `Model` trait represents a Probabilistic Graphical Model that factors as a product of
/// `Conditional`s.
pub trait Model {

    /// Get all `Variable`s in the model.
    fn variables(&self) -> HashSet<Variable>;


    /// Get the number of `Variable`s in the `Model`
    fn num_variables(&self) -> usize;


    /// Determine the probability of a full `Assignment` to the `Variable`s in the `Model`.
    ///
    /// Specifically, this computes ```P(zeta)```, where ```zeta``` is a full assignment.
    ///
    /// # Args
    /// * `assignment`: a full `Assignment` to the `Model`
    ///
    /// # Returns
    /// the probability of the `Assignment` given the `Model`
    fn evaluate(&self, assignment: &Assignment) -> Result<f64>;


    /// The `Conditional`s of the `Model`, ordered so that every `Conditional` comes after the
    /// `Conditional`s whose frontal variables are its parents.
    fn ancestral_order(&self) -> Vec<&Conditional>;


    /// Greedy most probable assignment: solve each `Conditional` for its frontal variables in
    /// ancestral order, given the values already chosen for its parents.
    ///
    /// This is the exact MPE when every clique is solved given the MPE of its ancestors, as in
    /// a Bayes tree produced by max-product elimination.
    fn optimize(&self) -> Result<Assignment> {
        let mut values = Assignment::new();
        for conditional in self.ancestral_order() {
            conditional.solve_in_place(&mut values)?;
        }
        Ok(values)
    }

}

pub mod bayes_tree;
pub mod directed;

pub use self::bayes_tree::{BayesTree, Clique, CliqueId};
pub use self::directed::{BayesNet, BayesNetBuilder};
