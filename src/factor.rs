//! Definition of the factor module
//!
//! A `Factor` represents a relationship between some set of `Variable`s: a dense table mapping
//! every complete assignment of its scope to a non-negative real.

use crate::util::{DiscreteError, Result, CPD_TOLERANCE};
use crate::variable::{all_assignments, Assignment, Variable};

use itertools::Itertools;
use ndarray::prelude as nd;

use std::fmt;

/// Alias f64 ndarray::Array as Table
pub type Table = nd::ArrayD<f64>;


/// The operation used to eliminate a `Variable` from a `Factor`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Elimination {
    /// Sum over the values of the eliminated `Variable`s (marginalization)
    Sum,

    /// Take the maximum over the values of the eliminated `Variable`s
    Max
}


/// A `Factor` over some scope of variables. Represented as a table as described in Koller &
/// Friedman; axis `i` of the table corresponds to `scope[i]`.
///
/// A `Factor` with an empty scope is a scalar. The scalar `1.0` is the multiplicative identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Factor {
    /// The scope of the `Factor`
    scope: Vec<Variable>,

    /// The values of the `Factor` table.
    table: Table
}


impl Factor {

    /// Create a new `Factor`
    ///
    /// # Errors
    /// * `DiscreteError::InvalidScope` if the table's shape does not match the scope
    /// * `DiscreteError::DuplicateVariable` if a `Variable` appears twice in the scope
    /// * `DiscreteError::NonPositiveProbability` if the table has a negative (or NaN) entry
    pub fn new(scope: Vec<Variable>, table: Table) -> Result<Self> {
        if scope.len() != table.ndim() {
            return Err(DiscreteError::InvalidScope);
        }

        if scope.iter().unique().count() != scope.len() {
            return Err(DiscreteError::DuplicateVariable);
        }

        if scope.iter().map(|v| v.cardinality()).ne(table.shape().iter().cloned()) {
            return Err(DiscreteError::InvalidScope);
        }

        // factors may not have negative values
        if table.iter().any(|&v| !(v >= 0.0)) {
            return Err(DiscreteError::NonPositiveProbability);
        }

        Ok(Factor { scope, table })
    }


    /// Create a `Factor` with an empty scope and the given value
    pub fn scalar(value: f64) -> Self {
        Factor { scope: vec![], table: nd::arr0(value).into_dyn() }
    }


    /// Get the identity factor
    pub fn identity() -> Self {
        Factor::scalar(1.0)
    }


    /// Create a `Factor` that represents the conditional probability distribution
    /// ```P(var | parents)```.
    ///
    /// The table is laid out with the parents on the leading axes (in the given order) and `var`
    /// on the last axis, so that every row (a fixed assignment to the parents) sums to one.
    ///
    /// # Errors
    /// Any error from `Factor::new`, plus
    /// * `DiscreteError::DuplicateVariable` if `var` is one of its own parents
    /// * `DiscreteError::General` if some row does not sum to one
    pub fn cpd(var: Variable, parents: Vec<Variable>, table: Table) -> Result<Self> {
        if parents.contains(&var) {
            return Err(DiscreteError::DuplicateVariable);
        }

        let mut scope = parents;
        scope.push(var);

        let factor = Factor::new(scope, table)?;

        let last = nd::Axis(factor.table.ndim() - 1);
        if factor.table.sum_axis(last).iter().any(|s| (s - 1.0).abs() > CPD_TOLERANCE) {
            return Err(
                DiscreteError::General(
                    String::from("Invalid arguments. Requested a CPD, but the values do not represent a CPD")
                )
            );
        }

        Ok(factor)
    }


    /// Check if the `Factor` has an empty scope
    pub fn is_scalar(&self) -> bool {
        self.scope.is_empty()
    }


    /// Retrieve the scope of the `Factor`.
    pub fn scope(&self) -> &[Variable] {
        &self.scope
    }


    /// Retrieve the underlying table. Axis `i` corresponds to `self.scope()[i]`.
    pub fn table(&self) -> &Table {
        &self.table
    }


    /// The cardinality of `var`, if `var` is in the scope of this `Factor`
    pub fn cardinality(&self, var: &Variable) -> Option<usize> {
        self.scope.iter().find(|&v| v == var).map(|v| v.cardinality())
    }


    /// Translate an assignment into an index into the table
    fn index_of(&self, assignment: &Assignment) -> Result<Vec<usize>> {
        self.scope.iter().map(|v| {
            match assignment.get(v) {
                None => Err(DiscreteError::MissingEvidence(*v)),
                Some(&val) if ! v.contains(val) => {
                    Err(DiscreteError::InvalidValue { variable: *v, value: val })
                },
                Some(&val) => Ok(val)
            }
        }).collect()
    }


    /// Retrieve the value for a complete assignment over the scope of this `Factor`
    ///
    /// # Args
    /// assignment: a full assignment to the scope of a `Factor`. The assignment's scope may be a
    ///             superset of the `Factor`s scope.
    ///
    /// # Errors
    /// * `DiscreteError::MissingEvidence` if a `Variable` in the scope is not assigned
    /// * `DiscreteError::InvalidValue` if an assigned value is outside its `Variable`'s domain
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        let idx = self.index_of(assignment)?;
        Ok(self.table[nd::IxDyn(&idx)])
    }


    /// Restrict the `Factor` by fixing `var` to `value`. The result has `var` removed from its
    /// scope. If `var` is not in the scope, the `Factor` is returned unchanged.
    ///
    /// Defined in Koller & Friedman 4.2.3
    pub fn restrict(&self, var: &Variable, value: usize) -> Result<Self> {
        match self.scope.iter().position(|v| v == var) {
            None => Ok(self.clone()),
            Some(idx) => {
                if ! var.contains(value) {
                    return Err(DiscreteError::InvalidValue { variable: *var, value });
                }

                let table = self.table.index_axis(nd::Axis(idx), value).to_owned();
                let mut scope = self.scope.clone();
                scope.remove(idx);

                Ok(Factor { scope, table })
            }
        }
    }


    /// Reduce the `Factor` over the given partial assignment: every `Variable` of the scope
    /// present in `assignment` is restricted to its assigned value.
    ///
    /// Defined in Koller & Friedman 4.2.3
    pub fn reduce(&self, assignment: &Assignment) -> Result<Self> {
        let mut reduced = self.clone();
        for v in self.scope.iter() {
            if let Some(&val) = assignment.get(v) {
                reduced = reduced.restrict(v, val)?;
            }
        }

        Ok(reduced)
    }


    /// Product of this `Factor` and another `Factor`.
    ///
    /// Defined in Koller & Friedman Section 4.2.1
    ///
    /// # Returns
    /// A new `Factor` of scope union(self.scope(), other.scope()), ordered as `self.scope()`
    /// followed by the `Variable`s only found in `other.scope()`.
    pub fn product(&self, other: &Self) -> Result<Self> {
        // We are computing a new factor Psi(X, Y, Z) = phi1(X, Y) * phi2(Y, Z).
        // See Koller & Friedman Definition 4.2
        let new_scope: Vec<Variable> = self.scope.iter()
                                                 .chain(other.scope.iter())
                                                 .unique()
                                                 .cloned()
                                                 .collect();

        let new_shape: Vec<usize> = new_scope.iter().map(|v| v.cardinality()).collect();
        let mut tbl = Table::zeros(nd::IxDyn(&new_shape));

        for assn in all_assignments(&new_scope) {
            let phi1_val = self.value(&assn)?;
            let phi2_val = other.value(&assn)?;

            let idx = self.index_in(&new_scope, &assn);
            tbl[nd::IxDyn(&idx)] = phi1_val * phi2_val;
        }

        Factor::new(new_scope, tbl)
    }


    /// `Factor` division. Calculates Psi(X, Y) = Phi1(X, Y) / Phi2(Y) where Phi1 = self and Phi2 =
    /// other.
    ///
    /// Defined in Koller & Friedman Section 10.3.1
    ///
    /// # Notes
    /// In the context of this operation, 0/0 is defined as 0. However, X/0, where X != 0, is still
    /// undefined.
    ///
    /// # Errors
    /// * `DiscreteError::InvalidScope` if other.scope() is not a subset of self.scope()
    /// * `DiscreteError::DivideByZero` if a divide by zero error is found
    pub fn divide(&self, other: &Self) -> Result<Self> {
        if ! other.scope.iter().all(|v| self.scope.contains(v)) {
            return Err(DiscreteError::InvalidScope);
        }

        let mut tbl = Table::zeros(self.table.raw_dim());

        for assn in all_assignments(&self.scope) {
            let phi1_val = self.value(&assn)?;
            let phi2_val = other.value(&assn)?;

            let idx = self.index_in(&self.scope, &assn);
            if phi2_val == 0. {
                if phi1_val != 0. {
                    return Err(DiscreteError::DivideByZero);
                }
            } else {
                tbl[nd::IxDyn(&idx)] = phi1_val / phi2_val;
            }
        }

        Factor::new(self.scope.clone(), tbl)
    }


    /// Index of a complete assignment to `scope`. Only used on assignments produced by
    /// `all_assignments(scope)`, which always cover `scope`.
    fn index_in(&self, scope: &[Variable], assn: &Assignment) -> Vec<usize> {
        scope.iter().map(|v| assn.get(v).cloned().unwrap_or(0)).collect()
    }


    /// Eliminate every `Variable` in `vars` from the `Factor` using `op`. `Variable`s outside the
    /// scope are ignored.
    ///
    /// Defined in Koller & Friedman 9.3.1 (sum) and 13.2.1 (max)
    pub fn eliminate(&self, vars: &[Variable], op: Elimination) -> Self {
        let mut scope = self.scope.clone();
        let mut table = self.table.clone();

        for var in vars {
            if let Some(idx) = scope.iter().position(|v| v == var) {
                let ax = nd::Axis(idx);
                table = match op {
                    Elimination::Sum => table.sum_axis(ax),
                    Elimination::Max => table.fold_axis(ax, std::f64::NEG_INFINITY, |&acc, &x| acc.max(x))
                };
                scope.remove(idx);
            }
        }

        Factor { scope, table }
    }


    /// Marginalize the `Factor` over the given `Variable`
    pub fn sum_out(&self, var: &Variable) -> Self {
        self.eliminate(&[*var], Elimination::Sum)
    }


    /// Max-marginalize the `Factor` over the given `Variable`
    pub fn max_out(&self, var: &Variable) -> Self {
        self.eliminate(&[*var], Elimination::Max)
    }


    /// Sum out the first `k` `Variable`s of the scope. The result is the marginal over the
    /// remaining `Variable`s.
    pub fn sum_first(&self, k: usize) -> Self {
        let first: Vec<Variable> = self.scope.iter().take(k).cloned().collect();
        self.eliminate(&first, Elimination::Sum)
    }


    /// Reorder the scope (and the axes of the table) to `order`.
    ///
    /// # Errors
    /// * `DiscreteError::InvalidScope` if `order` is not a permutation of the scope
    pub fn permute(&self, order: &[Variable]) -> Result<Self> {
        if order.len() != self.scope.len() {
            return Err(DiscreteError::InvalidScope);
        }

        let axes = order.iter()
                        .map(|o| self.scope.iter().position(|v| v == o).ok_or(DiscreteError::InvalidScope))
                        .collect::<Result<Vec<usize>>>()?;

        if axes.iter().unique().count() != axes.len() {
            return Err(DiscreteError::DuplicateVariable);
        }

        let table = self.table.clone().permuted_axes(axes);
        Ok(Factor { scope: order.to_vec(), table: table.as_standard_layout().to_owned() })
    }


    /// Scale the `Factor` so that its entries sum to one
    ///
    /// # Errors
    /// * `DiscreteError::DivideByZero` if every entry is zero
    pub fn normalize(&self) -> Result<Self> {
        let z = self.table.sum();
        if z == 0. {
            return Err(DiscreteError::DivideByZero);
        }

        Ok(Factor { scope: self.scope.clone(), table: &self.table / z })
    }


    /// Check whether two `Factor`s agree on their scope (as a set) and on every entry, within
    /// `tol`.
    pub fn equals(&self, other: &Factor, tol: f64) -> bool {
        if self.scope.len() != other.scope.len() || ! self.scope.iter().all(|v| other.scope.contains(v)) {
            return false;
        }

        all_assignments(&self.scope).all(|assn| {
            match (self.value(&assn), other.value(&assn)) {
                (Ok(x), Ok(y)) => (x - y).abs() <= tol,
                _ => false
            }
        })
    }

}


impl fmt::Display for Factor {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Factor [{}]", self.scope.iter().join(", "))?;
        for assn in all_assignments(&self.scope) {
            let idx = self.index_in(&self.scope, &assn);
            writeln!(f, "  {} -> {}", assn, self.table[nd::IxDyn(&idx)])?;
        }
        Ok(())
    }

}
