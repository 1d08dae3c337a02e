//! Defines a `Conditional`: a normalized conditional probability table
//! ```P(frontals | parents)``` and the queries answered by one - restriction on evidence, most
//! probable explanation (MPE), and sampling.

use crate::factor::{Factor, Table};
use crate::samplers;
use crate::util::{DiscreteError, Result};
use crate::variable::{all_assignments, Assignment, Variable};

use itertools::Itertools;
use ndarray::prelude as nd;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use tracing::{debug, trace, warn};

use std::fmt;


/// Anything that is backed by a `Factor` table and can therefore be compared against a
/// `Conditional`. Types that are not table-backed keep the default and compare unequal.
pub trait AsFactor {

    fn as_factor(&self) -> Option<&Factor> {
        None
    }

    /// The frontal `Variable`s, for objects that split their scope into frontals and parents
    fn frontal_keys(&self) -> Option<&[Variable]> {
        None
    }

}

impl AsFactor for Factor {

    fn as_factor(&self) -> Option<&Factor> {
        Some(self)
    }

}


/// A direct description of the CPT ```P(frontal | parents)```.
///
/// Each row of `rows` holds non-negative weights for the values of `frontal` given one
/// combination of parent values. Rows enumerate the parent combinations with the *last* parent
/// varying fastest, i.e. row-major over the parents' domains. Rows are normalized when the table
/// is built, so `[99., 1.]` and `[0.99, 0.01]` describe the same distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    frontal: Variable,
    parents: Vec<Variable>,
    rows: Vec<Vec<f64>>
}

impl Signature {

    pub fn new(frontal: Variable, parents: Vec<Variable>, rows: Vec<Vec<f64>>) -> Self {
        Signature { frontal, parents, rows }
    }

    pub fn frontal(&self) -> Variable {
        self.frontal
    }

    pub fn parents(&self) -> &[Variable] {
        &self.parents
    }

    /// Build the normalized table, parents on the leading axes and `frontal` on the last.
    ///
    /// # Errors
    /// * `DiscreteError::InvalidScope` if the number or width of the rows does not match the
    ///   domains of the parents and the frontal variable
    /// * `DiscreteError::NonPositiveProbability` if a weight is negative or a row has no mass
    pub fn table(&self) -> Result<Table> {
        let expected_rows: usize = self.parents.iter().map(|v| v.cardinality()).product();
        if self.rows.len() != expected_rows {
            return Err(DiscreteError::InvalidScope);
        }

        let width = self.frontal.cardinality();
        let mut values = Vec::with_capacity(expected_rows * width);
        for row in self.rows.iter() {
            if row.len() != width {
                return Err(DiscreteError::InvalidScope);
            }

            if row.iter().any(|&w| !(w >= 0.0)) {
                return Err(DiscreteError::NonPositiveProbability);
            }

            let z: f64 = row.iter().sum();
            if z <= 0.0 {
                return Err(DiscreteError::NonPositiveProbability);
            }

            values.extend(row.iter().map(|w| w / z));
        }

        let mut shape: Vec<usize> = self.parents.iter().map(|v| v.cardinality()).collect();
        shape.push(width);

        Table::from_shape_vec(nd::IxDyn(&shape), values).map_err(|_| DiscreteError::InvalidScope)
    }

}


/// A conditional probability distribution ```P(frontals | parents)```.
///
/// # Representation
/// The distribution is held as a single `Factor` whose scope is the frontal variables followed by
/// the parent variables. For every complete assignment to the parents, the entries over all
/// frontal values sum to one. This is established when the `Conditional` is constructed and is
/// not rechecked afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Conditional {
    /// Number of leading `Variable`s of `factor.scope()` that are frontal
    nr_frontals: usize,

    /// The normalized table
    factor: Factor
}


impl Conditional {

    /// Internal constructor. `factor` must already be normalized over its first `nr_frontals`
    /// `Variable`s.
    fn from_parts(nr_frontals: usize, factor: Factor) -> Result<Self> {
        if nr_frontals == 0 || nr_frontals > factor.scope().len() {
            return Err(DiscreteError::InvalidScope);
        }

        let conditional = Conditional { nr_frontals, factor };
        debug!(
            frontals = conditional.nr_frontals(),
            parents = conditional.nr_parents(),
            "constructed conditional {}", conditional.describe()
        );

        Ok(conditional)
    }


    /// Construct ```P(first k variables | remaining variables)``` from a joint `Factor` by
    /// dividing it by its marginal over the remaining variables.
    ///
    /// # Errors
    /// * `DiscreteError::InvalidScope` if `nr_frontals` is zero or exceeds the joint's scope
    /// * `DiscreteError::DivideByZero` if a zero marginal meets a non-zero joint entry
    pub fn from_joint(joint: &Factor, nr_frontals: usize) -> Result<Self> {
        if nr_frontals == 0 || nr_frontals > joint.scope().len() {
            return Err(DiscreteError::InvalidScope);
        }

        let marginal = joint.sum_first(nr_frontals);
        Conditional::from_parts(nr_frontals, joint.divide(&marginal)?)
    }


    /// Construct ```P(J \ M | M)``` as `joint / marginal`, where `marginal` is the marginal of
    /// `joint` over the parent variables. The frontal variables are those of `joint` that are
    /// not in `marginal`; both groups keep their order in `joint`.
    ///
    /// # Errors
    /// * `DiscreteError::InvalidScope` if `marginal`'s scope is not a strict subset of `joint`'s
    /// * `DiscreteError::DivideByZero` if a zero marginal meets a non-zero joint entry
    pub fn from_joint_marginal(joint: &Factor, marginal: &Factor) -> Result<Self> {
        let quotient = joint.divide(marginal)?;

        let (frontals, parents): (Vec<Variable>, Vec<Variable>) = joint.scope()
                                                                       .iter()
                                                                       .partition(|v| ! marginal.scope().contains(v));

        let nr_frontals = frontals.len();
        let order: Vec<Variable> = frontals.into_iter().chain(parents).collect();

        Conditional::from_parts(nr_frontals, quotient.permute(&order)?)
    }


    /// As `from_joint_marginal`, but the variables are reported in `ordered_keys`: the frontal
    /// variables in the order of the first ```|J| - |M|``` keys and the parents in the order of
    /// the rest.
    ///
    /// # Errors
    /// Any error of `from_joint_marginal`, plus
    /// * `DiscreteError::InvalidScope` if `ordered_keys` is not a permutation of the joint's
    ///   scope with the frontal variables first
    pub fn from_joint_marginal_ordered(
        joint: &Factor,
        marginal: &Factor,
        ordered_keys: &[Variable]
    ) -> Result<Self> {
        let conditional = Conditional::from_joint_marginal(joint, marginal)?;
        let k = conditional.nr_frontals;

        if ordered_keys.len() != conditional.factor.scope().len()
            || ! ordered_keys[..k].iter().all(|v| conditional.frontals().contains(v)) {
            return Err(DiscreteError::InvalidScope);
        }

        Conditional::from_parts(k, conditional.factor.permute(ordered_keys)?)
    }


    /// Construct a single-frontal `Conditional` directly from a `Signature`.
    pub fn from_signature(signature: &Signature) -> Result<Self> {
        Conditional::from_cpd(signature.frontal(), signature.parents().to_vec(), signature.table()?)
    }


    /// Construct ```P(var | parents)``` from a table laid out as for `Factor::cpd`: parents on
    /// the leading axes, `var` on the last.
    pub fn from_cpd(var: Variable, parents: Vec<Variable>, table: Table) -> Result<Self> {
        let cpd = Factor::cpd(var, parents, table)?;

        let mut order = vec![var];
        order.extend(cpd.scope().iter().filter(|&&v| v != var));

        Conditional::from_parts(1, cpd.permute(&order)?)
    }


    /// The frontal `Variable`s, in order
    pub fn frontals(&self) -> &[Variable] {
        &self.factor.scope()[..self.nr_frontals]
    }


    /// The parent `Variable`s, in order
    pub fn parents(&self) -> &[Variable] {
        &self.factor.scope()[self.nr_frontals..]
    }


    /// All `Variable`s: the frontals followed by the parents
    pub fn keys(&self) -> &[Variable] {
        self.factor.scope()
    }


    pub fn nr_frontals(&self) -> usize {
        self.nr_frontals
    }


    pub fn nr_parents(&self) -> usize {
        self.factor.scope().len() - self.nr_frontals
    }


    /// The first frontal `Variable`. Every `Conditional` has at least one.
    pub fn first_frontal(&self) -> Variable {
        self.factor.scope()[0]
    }


    /// The normalized table backing this `Conditional`
    pub fn factor(&self) -> &Factor {
        &self.factor
    }


    /// The cardinality of `var`, if `var` is a frontal or parent of this `Conditional`
    pub fn cardinality(&self, var: &Variable) -> Option<usize> {
        self.factor.cardinality(var)
    }


    /// The value ```P(frontals = x | parents = y)``` at a complete assignment.
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        self.factor.value(assignment)
    }


    /// The frontal `Variable`, if this `Conditional` has exactly one
    fn single_frontal(&self) -> Result<Variable> {
        if self.nr_frontals != 1 {
            return Err(DiscreteError::UnsupportedArity { expected: 1, actual: self.nr_frontals });
        }

        Ok(self.first_frontal())
    }


    /// Restrict the table on the values of the parents in `evidence`, giving
    /// ```P(frontals | parents = evidence)``` as a `Factor` over the frontal variables.
    ///
    /// Parents are restricted one at a time, in parent order.
    ///
    /// # Errors
    /// * `DiscreteError::MissingEvidence` naming the first parent without a value in `evidence`
    pub fn choose(&self, evidence: &Assignment) -> Result<Factor> {
        let mut p_fs = self.factor.clone();

        for j in self.parents() {
            match evidence.get(j) {
                Some(&value) => p_fs = p_fs.restrict(j, value)?,
                None => {
                    warn!(parent = %j, "parent value missing in {}", self.describe());
                    return Err(DiscreteError::MissingEvidence(*j));
                }
            }
        }

        Ok(p_fs)
    }


    /// As `choose`, for a `Conditional` with a single frontal variable. The result is a
    /// standalone `Factor` over that variable.
    ///
    /// # Errors
    /// * `DiscreteError::MissingEvidence` as for `choose`
    /// * `DiscreteError::UnsupportedArity` if there is more than one frontal variable
    pub fn choose_as_factor(&self, evidence: &Assignment) -> Result<Factor> {
        let p_fs = self.choose(evidence)?;
        let frontal = self.single_frontal()?;

        Factor::new(vec![frontal], p_fs.table().clone())
    }


    /// Find the most probable assignment to the frontal variables given the parents.
    ///
    /// Candidates are enumerated with `all_assignments` over the frontal variables (the first
    /// frontal varies fastest) and a candidate replaces the best so far only if it is strictly
    /// more probable, so ties go to the first candidate enumerated.
    fn mpe(&self, evidence: &Assignment) -> Result<Assignment> {
        let p_fs = self.choose(evidence)?;

        let mut best: Option<(Assignment, f64)> = None;
        for candidate in all_assignments(self.frontals()) {
            let p = p_fs.value(&candidate)?;
            let better = match best {
                Some((_, max)) => p > max,
                None => true
            };

            if better {
                best = Some((candidate, p));
            }
        }

        match best {
            Some((mpe, p)) => {
                trace!(probability = p, "mpe {} for {}", mpe, self.describe());
                Ok(mpe)
            },
            None => Err(DiscreteError::General(String::from("Frontal variable has an empty domain")))
        }
    }


    /// Solve for the most probable value of the frontal variables given the parent values in
    /// `values`, and write them into `values`. Entries for all other `Variable`s are left
    /// untouched.
    ///
    /// # Errors
    /// * `DiscreteError::MissingEvidence` if a parent has no value in `values`
    pub fn solve_in_place(&self, values: &mut Assignment) -> Result<()> {
        let mpe = self.mpe(values)?;
        values.extend(mpe.iter());
        Ok(())
    }


    /// Solve for the most probable value of the single frontal variable given the parent values.
    ///
    /// # Errors
    /// * `DiscreteError::UnsupportedArity` if there is more than one frontal variable
    /// * `DiscreteError::MissingEvidence` if a parent has no value in `parents_values`
    pub fn solve(&self, parents_values: &Assignment) -> Result<usize> {
        let frontal = self.single_frontal()?;
        let mpe = self.mpe(parents_values)?;

        mpe.get(&frontal).cloned().ok_or(DiscreteError::MissingEvidence(frontal))
    }


    /// Draw a value of the single frontal variable from ```P(frontal | parents_values)``` using
    /// `rng`.
    ///
    /// If some value has probability exactly one it is returned without consulting `rng`.
    ///
    /// # Errors
    /// * `DiscreteError::UnsupportedArity` if there is more than one frontal variable
    /// * `DiscreteError::MissingEvidence` if a parent has no value in `parents_values`
    /// * `DiscreteError::NonPositiveProbability` if the restricted distribution has no mass
    pub fn sample_with<R>(&self, parents_values: &Assignment, rng: &mut R) -> Result<usize>
        where R: Rng + ?Sized
    {
        let key = self.single_frontal()?;
        let p_fs = self.choose(parents_values)?;

        let nj = key.cardinality();
        let mut p = Vec::with_capacity(nj);
        let mut frontals = Assignment::new();
        for value in 0..nj {
            frontals.set(&key, value);
            let p_value = p_fs.value(&frontals)?;
            if p_value == 1.0 {
                trace!(variable = %key, value, "deterministic sample");
                return Ok(value);
            }
            p.push(p_value);
        }

        let distribution = WeightedIndex::new(&p).map_err(|_| DiscreteError::NonPositiveProbability)?;
        Ok(distribution.sample(rng))
    }


    /// As `sample_with`, drawing from the shared generator (see `samplers::with_shared_rng`).
    pub fn sample(&self, parents_values: &Assignment) -> Result<usize> {
        samplers::with_shared_rng(|rng| self.sample_with(parents_values, rng))
    }


    /// Sample the single frontal variable given the parent values in `values` using `rng`, and
    /// write the result into `values`.
    pub fn sample_in_place_with<R>(&self, values: &mut Assignment, rng: &mut R) -> Result<()>
        where R: Rng + ?Sized
    {
        let sampled = self.sample_with(values, rng)?;
        values.set(&self.first_frontal(), sampled);
        Ok(())
    }


    /// As `sample_in_place_with`, drawing from the shared generator.
    pub fn sample_in_place(&self, values: &mut Assignment) -> Result<()> {
        samplers::with_shared_rng(|rng| self.sample_in_place_with(values, rng))
    }


    /// Compare the table of this `Conditional` with any table-backed object. Objects that are not
    /// table-backed are never equal. When `other` also has frontal `Variable`s, they must be the
    /// same set as the frontals of `self`.
    pub fn equals<T>(&self, other: &T, tol: f64) -> bool
        where T: AsFactor + ?Sized
    {
        if let Some(keys) = other.frontal_keys() {
            let frontals = self.frontals();
            if keys.len() != frontals.len() || ! keys.iter().all(|v| frontals.contains(v)) {
                return false;
            }
        }

        match other.as_factor() {
            Some(f) => self.factor.equals(f, tol),
            None => false
        }
    }


    /// A one line description, ```P( frontals | parents )```
    pub fn describe(&self) -> String {
        if self.nr_parents() == 0 {
            format!("P( {} )", self.frontals().iter().join(" "))
        } else {
            format!("P( {} | {} )", self.frontals().iter().join(" "), self.parents().iter().join(" "))
        }
    }

}

impl AsFactor for Conditional {

    fn as_factor(&self) -> Option<&Factor> {
        Some(&self.factor)
    }

    fn frontal_keys(&self) -> Option<&[Variable]> {
        Some(&self.factor.scope()[..self.nr_frontals])
    }

}

impl fmt::Display for Conditional {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.describe())?;
        write!(f, "{}", self.factor)
    }

}
