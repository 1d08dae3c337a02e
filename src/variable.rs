//! Definition of the variable module
//!
//! A `Variable` represents a discrete random variable in a Probabilistic Graphical Model. An
//! `Assignment` maps `Variable`s to values in their domains.

use indexmap::IndexMap;
use indexmap::map::Iter;

use std::fmt;
use std::iter::FromIterator;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of ids for anonymous `Variable`s. Ids handed out here start high enough that they do
/// not collide with small user-chosen keys passed to `Variable::with_id`.
static NEXT_ID: AtomicUsize = AtomicUsize::new(1 << 20);


/// A discrete random variable: an opaque key and the size of its domain. The domain of a
/// `Variable` with cardinality `n` is `0..n`.
///
/// `Variable`s are lightweight and `Copy`; two `Variable`s are equal when both key and
/// cardinality are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    /// The key of the `Variable`
    id: usize,

    /// The number of values in the domain
    cardinality: usize
}

impl Variable {

    /// Construct a new anonymous binary `Variable`
    pub fn binary() -> Variable {
        Variable::discrete(2)
    }

    /// Construct a new anonymous `Variable` with `cardinality` values
    pub fn discrete(cardinality: usize) -> Variable {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Variable { id, cardinality }
    }

    /// Construct a `Variable` with an explicit key. The caller is responsible for not reusing a
    /// key for two different random variables.
    pub fn with_id(id: usize, cardinality: usize) -> Variable {
        Variable { id, cardinality }
    }

    /// Get the key of the `Variable`
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get the number of values the `Variable` may take
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Check that `value` lies in the domain of this `Variable`
    pub fn contains(&self, value: usize) -> bool {
        value < self.cardinality
    }
}

impl fmt::Display for Variable {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "X{}", self.id)
    }

}


/// A (possibly partial) assignment of values to `Variable`s.
///
/// Entries keep their insertion order, which only matters for printing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    values: IndexMap<Variable, usize>
}

impl Assignment {

    /// Construct an empty `Assignment`
    pub fn new() -> Self {
        Assignment { values: IndexMap::new() }
    }

    /// Get the value assigned to `var`, if there is one
    pub fn get(&self, var: &Variable) -> Option<&usize> {
        self.values.get(var)
    }

    /// Assign `value` to `var`, replacing any previous value
    pub fn set(&mut self, var: &Variable, value: usize) {
        self.values.insert(*var, value);
    }

    /// Remove `var` from the `Assignment`, returning its value if it was assigned
    pub fn unset(&mut self, var: &Variable) -> Option<usize> {
        self.values.swap_remove(var)
    }

    /// Check if `var` has a value in this `Assignment`
    pub fn contains(&self, var: &Variable) -> bool {
        self.values.contains_key(var)
    }

    /// The number of assigned `Variable`s
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(Variable, value)` pairs in insertion order
    pub fn iter(&self) -> Iter<'_, Variable, usize> {
        self.values.iter()
    }

    /// Check that every variable in `scope` is assigned
    pub fn is_complete(&self, scope: &[Variable]) -> bool {
        scope.iter().all(|v| self.contains(v))
    }

}

impl Extend<(Variable, usize)> for Assignment {

    fn extend<I: IntoIterator<Item = (Variable, usize)>>(&mut self, iter: I) {
        self.values.extend(iter)
    }

}

impl<'a> Extend<(&'a Variable, &'a usize)> for Assignment {

    fn extend<I: IntoIterator<Item = (&'a Variable, &'a usize)>>(&mut self, iter: I) {
        self.values.extend(iter.into_iter().map(|(&v, &x)| (v, x)))
    }

}

impl FromIterator<(Variable, usize)> for Assignment {

    fn from_iter<I: IntoIterator<Item = (Variable, usize)>>(iter: I) -> Self {
        Assignment { values: iter.into_iter().collect() }
    }

}

impl fmt::Display for Assignment {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, val)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", var, val)?;
        }
        write!(f, "}}")
    }

}


/// Iterator over every complete `Assignment` to a scope. See `all_assignments`.
pub struct AllAssignments<'a> {
    scope: &'a [Variable],
    current: Option<Vec<usize>>
}

impl<'a> Iterator for AllAssignments<'a> {
    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        let values = self.current.take()?;
        let assn = self.scope.iter().cloned().zip(values.iter().cloned()).collect();

        // advance the mixed-radix counter, first digit fastest
        let mut next = values;
        for (j, v) in self.scope.iter().enumerate() {
            next[j] += 1;
            if next[j] < v.cardinality() {
                self.current = Some(next);
                return Some(assn);
            }
            next[j] = 0;
        }

        // every digit wrapped, this was the last assignment
        Some(assn)
    }
}

/// Enumerate every complete `Assignment` to `scope`.
///
/// The enumeration is a mixed-radix count in which the first `Variable` of `scope` varies
/// fastest and the last varies slowest. The order is fixed; callers rely on it for
/// deterministic tie-breaking. An empty scope yields exactly one, empty, `Assignment`. A scope
/// containing a `Variable` with an empty domain yields nothing.
pub fn all_assignments(scope: &[Variable]) -> AllAssignments<'_> {
    let current = if scope.iter().any(|v| v.cardinality() == 0) {
        None
    } else {
        Some(vec![0; scope.len()])
    };

    AllAssignments { scope, current }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn binary() {
        let var = Variable::binary();
        assert_eq!(var.cardinality(), 2);
        assert!(var.contains(1));
        assert!(! var.contains(2));
    }

    #[test]
    fn anonymous_ids_are_unique() {
        let a = Variable::discrete(3);
        let b = Variable::discrete(3);
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn explicit_ids() {
        let a = Variable::with_id(7, 4);
        assert_eq!(a, Variable::with_id(7, 4));
        assert_eq!(a.id(), 7);
        assert_eq!(format!("{}", a), "X7");
    }

    #[test]
    fn assignment() {
        let a = Variable::binary();
        let b = Variable::discrete(5);

        let mut assn = Assignment::new();
        assert!(assn.is_empty());
        assert_eq!(assn.get(&a), None);

        assn.set(&a, 1);
        assn.set(&b, 4);
        assert_eq!(assn.get(&a), Some(&1));
        assert_eq!(assn.get(&b), Some(&4));
        assert!(assn.is_complete(&[a, b]));

        assn.set(&b, 2);
        assert_eq!(assn.get(&b), Some(&2));
        assert_eq!(assn.len(), 2);

        assert_eq!(assn.unset(&a), Some(1));
        assert!(! assn.contains(&a));
        assert!(! assn.is_complete(&[a, b]));
    }

    #[test]
    fn enumeration_order() {
        let a = Variable::binary();
        let b = Variable::discrete(3);

        let order: Vec<(usize, usize)> = all_assignments(&[a, b])
            .map(|assn| (*assn.get(&a).unwrap(), *assn.get(&b).unwrap()))
            .collect();

        assert_eq!(order, vec![(0, 0), (1, 0), (0, 1), (1, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn enumeration_empty_scope() {
        let all: Vec<Assignment> = all_assignments(&[]).collect();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_empty());
    }

    #[test]
    fn enumeration_empty_domain() {
        let a = Variable::binary();
        let z = Variable::discrete(0);
        assert_eq!(all_assignments(&[a, z]).count(), 0);
    }

}
