//! Defines a `BayesTree`, a forest of cliques in which every clique holds a `Conditional`
//! ```P(frontals | separator)``` whose separator variables are frontal in the clique's ancestors.
//! The joint distribution is the product of the conditionals of all cliques.

use crate::conditional::Conditional;
use crate::tree::{Forest, NodeId};
use crate::util::{DiscreteError, Result};
use crate::variable::{Assignment, Variable};
use super::Model;

use tracing::debug;

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Handle to a clique of a `BayesTree`
pub type CliqueId = NodeId;


/// A forest of cliques, each holding a `Conditional`.
///
/// # Representation
/// The cliques are held in a `Forest`. In addition, the tree keeps track of which clique each
/// frontal `Variable` belongs to. A `Variable` is frontal in exactly one clique.
#[derive(Clone, Debug, Default)]
pub struct BayesTree {
    /// The cliques
    forest: Forest<Conditional>,

    /// The clique in which each `Variable` is frontal
    owners: HashMap<Variable, CliqueId>
}


/// A view of one clique of a `BayesTree`
#[derive(Clone, Copy, Debug)]
pub struct Clique<'a> {
    tree: &'a BayesTree,
    id: CliqueId
}


impl BayesTree {

    /// Construct an empty `BayesTree`
    pub fn new() -> Self {
        BayesTree { forest: Forest::new(), owners: HashMap::new() }
    }


    /// Check that `conditional` can be attached below `parent` (or as a root if `parent` is
    /// `None`): its frontal variables must be new to the tree and each of its parents must be
    /// frontal in `parent` or one of its ancestors.
    fn check(&self, conditional: &Conditional, parent: Option<CliqueId>) -> Result<()> {
        if conditional.frontals().iter().any(|v| self.owners.contains_key(v)) {
            return Err(DiscreteError::DuplicateVariable);
        }

        let mut ancestors = HashSet::new();
        let mut current = parent;
        while let Some(id) = current {
            ancestors.insert(id);
            current = self.forest.parent(id);
        }

        let separator_ok = conditional.parents()
                                      .iter()
                                      .all(|v| self.owners.get(v).map_or(false, |c| ancestors.contains(c)));
        if ! separator_ok {
            return Err(DiscreteError::MissingParent);
        }

        Ok(())
    }


    fn register(&mut self, id: CliqueId) {
        if let Some(conditional) = self.forest.get(id) {
            for v in conditional.frontals() {
                self.owners.insert(*v, id);
            }
        }
    }


    /// Add a new root clique holding `conditional`.
    ///
    /// # Errors
    /// * `DiscreteError::DuplicateVariable` if a frontal variable is already in the tree
    /// * `DiscreteError::MissingParent` if `conditional` has parents
    pub fn add_root(&mut self, conditional: Conditional) -> Result<CliqueId> {
        self.check(&conditional, None)?;

        debug!("adding root clique {}", conditional.describe());
        let id = self.forest.add_root(conditional);
        self.register(id);
        Ok(id)
    }


    /// Add a clique holding `conditional` as the last child of `parent`.
    ///
    /// # Errors
    /// * `DiscreteError::DuplicateVariable` if a frontal variable is already in the tree
    /// * `DiscreteError::MissingParent` if `parent` is not a clique of this tree, or a parent
    ///   variable of `conditional` is not frontal in `parent` or one of its ancestors
    pub fn add_child(&mut self, parent: CliqueId, conditional: Conditional) -> Result<CliqueId> {
        if ! self.forest.contains(parent) {
            return Err(DiscreteError::MissingParent);
        }

        self.check(&conditional, Some(parent))?;

        debug!(parent = %parent, "adding clique {}", conditional.describe());
        let id = self.forest.add_child(parent, conditional).ok_or(DiscreteError::MissingParent)?;
        self.register(id);
        Ok(id)
    }


    /// The clique with the given id
    pub fn clique(&self, id: CliqueId) -> Option<Clique<'_>> {
        if self.forest.contains(id) {
            Some(Clique { tree: self, id })
        } else {
            None
        }
    }


    /// The root cliques, in the order they were added
    pub fn roots(&self) -> impl Iterator<Item = Clique<'_>> + '_ {
        self.forest.roots().iter().map(move |&id| Clique { tree: self, id })
    }


    /// The clique in which `var` is frontal
    pub fn clique_of(&self, var: &Variable) -> Option<Clique<'_>> {
        self.owners.get(var).map(|&id| Clique { tree: self, id })
    }


    /// Number of cliques
    pub fn len(&self) -> usize {
        self.forest.len()
    }


    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }


    /// Evaluate the joint probability of a complete assignment: the product of
    /// `Clique::evaluate` over the roots. An empty tree evaluates to one.
    ///
    /// # Errors
    /// * `DiscreteError::MissingEvidence` if a `Variable` of some clique is not assigned
    pub fn evaluate(&self, values: &Assignment) -> Result<f64> {
        self.roots().map(|root| root.evaluate(values)).product()
    }


    /// Check whether two trees have the same shape, with equal (within `tol`) conditionals at
    /// corresponding cliques. Children are compared in order.
    pub fn equals(&self, other: &BayesTree, tol: f64) -> bool {
        self.forest.equals_by(&other.forest, |a, b| a.equals(b, tol))
    }

}


impl<'a> Clique<'a> {

    pub fn id(&self) -> CliqueId {
        self.id
    }


    /// The `Conditional` held by this clique
    pub fn conditional(&self) -> &'a Conditional {
        let tree = self.tree;
        &tree.forest[self.id]
    }


    pub fn parent(&self) -> Option<Clique<'a>> {
        let tree = self.tree;
        self.tree.forest.parent(self.id).map(|id| Clique { tree, id })
    }


    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }


    /// The children of this clique, in insertion order
    pub fn children(&self) -> impl Iterator<Item = Clique<'a>> + 'a {
        let tree = self.tree;
        tree.forest.children(self.id).iter().map(move |&id| Clique { tree, id })
    }


    /// Evaluate the probability of the subtree rooted at this clique: the value of this
    /// clique's `Conditional` at `values` times the evaluations of its children.
    pub fn evaluate(&self, values: &Assignment) -> Result<f64> {
        let mut result = self.conditional().value(values)?;
        for child in self.children() {
            result *= child.evaluate(values)?;
        }
        Ok(result)
    }

}


impl Model for BayesTree {

    fn variables(&self) -> HashSet<Variable> {
        self.owners.keys().cloned().collect()
    }

    fn num_variables(&self) -> usize {
        self.owners.len()
    }

    fn evaluate(&self, assignment: &Assignment) -> Result<f64> {
        BayesTree::evaluate(self, assignment)
    }

    /// Every clique before its children
    fn ancestral_order(&self) -> Vec<&Conditional> {
        self.forest.pre_order().map(|(_, c)| c).collect()
    }

}


impl fmt::Display for BayesTree {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "BayesTree ({} cliques)", self.len())?;
        self.forest.fmt_with(f, "  ", |c, f| write!(f, "{}", c.describe()))
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::conditional::Signature;
    use crate::factor::Factor;
    use crate::util::DEFAULT_TOLERANCE;

    use ndarray::array;

    fn assn(pairs: &[(Variable, usize)]) -> Assignment {
        pairs.iter().cloned().collect()
    }

    fn conditional(frontal: Variable, parents: Vec<Variable>, rows: Vec<Vec<f64>>) -> Conditional {
        Conditional::from_signature(&Signature::new(frontal, parents, rows)).unwrap()
    }

    /// P(A) = [0.3, 0.7] at the root, P(B | A) below it
    fn chain() -> (Variable, Variable, BayesTree) {
        let a = Variable::binary();
        let b = Variable::binary();

        let mut tree = BayesTree::new();
        let root = tree.add_root(conditional(a, vec![], vec![vec![0.3, 0.7]])).unwrap();
        tree.add_child(root, conditional(b, vec![a], vec![vec![0.8, 0.2], vec![0.1, 0.9]])).unwrap();

        (a, b, tree)
    }

    #[test]
    fn evaluate() {
        let (a, b, tree) = chain();

        assert!((tree.evaluate(&assn(&[(a, 0), (b, 0)])).unwrap() - 0.24).abs() < DEFAULT_TOLERANCE);
        assert!((tree.evaluate(&assn(&[(a, 1), (b, 1)])).unwrap() - 0.63).abs() < DEFAULT_TOLERANCE);

        // the joint sums to one
        let total: f64 = crate::variable::all_assignments(&[a, b])
            .map(|values| tree.evaluate(&values).unwrap())
            .sum();
        assert!((total - 1.0).abs() < DEFAULT_TOLERANCE);

        // extra variables are ignored
        let c = Variable::binary();
        assert!((tree.evaluate(&assn(&[(c, 1), (a, 1), (b, 0)])).unwrap() - 0.07).abs() < DEFAULT_TOLERANCE);
    }

    #[test]
    fn evaluate_forest() {
        let (a, b, mut tree) = chain();
        let c = Variable::discrete(3);
        tree.add_root(conditional(c, vec![], vec![vec![1., 2., 1.]])).unwrap();

        let p = tree.evaluate(&assn(&[(a, 0), (b, 1), (c, 1)])).unwrap();
        assert!((p - 0.3 * 0.2 * 0.5).abs() < DEFAULT_TOLERANCE);

        let clique = tree.roots().nth(1).unwrap();
        assert!((clique.evaluate(&assn(&[(c, 2)])).unwrap() - 0.25).abs() < DEFAULT_TOLERANCE);
    }

    #[test]
    fn evaluate_empty() {
        let tree = BayesTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.evaluate(&Assignment::new()).unwrap(), 1.0);
    }

    #[test]
    fn evaluate_missing_evidence() {
        let (a, b, tree) = chain();
        assert_eq!(tree.evaluate(&assn(&[(a, 0)])).unwrap_err(), DiscreteError::MissingEvidence(b));
        assert_eq!(tree.evaluate(&assn(&[(b, 0)])).unwrap_err(), DiscreteError::MissingEvidence(a));
    }

    #[test]
    fn evaluate_visits_every_clique() {
        // a zero at the root does not stop the children from being checked
        let a = Variable::binary();
        let b = Variable::binary();

        let mut tree = BayesTree::new();
        let root = tree.add_root(conditional(a, vec![], vec![vec![0., 1.]])).unwrap();
        tree.add_child(root, conditional(b, vec![a], vec![vec![0.5, 0.5], vec![0.5, 0.5]])).unwrap();

        assert_eq!(tree.evaluate(&assn(&[(a, 0)])).unwrap_err(), DiscreteError::MissingEvidence(b));
        assert_eq!(tree.evaluate(&assn(&[(a, 0), (b, 0)])).unwrap(), 0.0);
    }

    #[test]
    fn multiple_frontals() {
        let a = Variable::binary();
        let b = Variable::binary();
        let c = Variable::binary();

        let joint = Factor::new(vec![a, b], array![[0.1, 0.2], [0.3, 0.4]].into_dyn()).unwrap();
        let root = Conditional::from_joint(&joint, 2).unwrap();

        let mut tree = BayesTree::new();
        let id = tree.add_root(root).unwrap();
        tree.add_child(id, conditional(c, vec![b, a], vec![vec![1., 0.], vec![0.5, 0.5], vec![0.5, 0.5], vec![0., 1.]])).unwrap();

        assert_eq!(tree.num_variables(), 3);
        assert_eq!(tree.clique_of(&b).unwrap().id(), id);

        let p = tree.evaluate(&assn(&[(a, 1), (b, 1), (c, 1)])).unwrap();
        assert!((p - 0.4).abs() < DEFAULT_TOLERANCE);
        let p = tree.evaluate(&assn(&[(a, 1), (b, 0), (c, 0)])).unwrap();
        assert!((p - 0.3 * 0.5).abs() < DEFAULT_TOLERANCE);
    }

    #[test]
    fn add_errs() {
        let (a, b, mut tree) = chain();
        let root = tree.roots().next().unwrap().id();
        let c = Variable::binary();

        // a variable may only be frontal once
        let res = tree.add_root(conditional(b, vec![], vec![vec![0.5, 0.5]]));
        assert_eq!(res.unwrap_err(), DiscreteError::DuplicateVariable);
        let res = tree.add_child(root, conditional(a, vec![], vec![vec![0.5, 0.5]]));
        assert_eq!(res.unwrap_err(), DiscreteError::DuplicateVariable);

        // a root may not have parents
        let res = tree.add_root(conditional(c, vec![a], vec![vec![0.5, 0.5], vec![0.5, 0.5]]));
        assert_eq!(res.unwrap_err(), DiscreteError::MissingParent);

        // parents must be frontal in an ancestor, not in a sibling
        let res = tree.add_child(root, conditional(c, vec![b], vec![vec![0.5, 0.5], vec![0.5, 0.5]]));
        assert_eq!(res.unwrap_err(), DiscreteError::MissingParent);

        // a clique of another tree
        let mut other = BayesTree::new();
        let d = Variable::binary();
        other.add_root(conditional(d, vec![], vec![vec![0.5, 0.5]])).unwrap();
        let leaf = tree.clique_of(&b).unwrap().id();
        let res = other.add_child(leaf, conditional(c, vec![], vec![vec![0.5, 0.5]]));
        assert_eq!(res.unwrap_err(), DiscreteError::MissingParent);

        // a foreign root whose index is also in range here
        let foreign_root = tree.roots().next().unwrap().id();
        assert_eq!(foreign_root.index(), 0);
        let res = other.add_child(foreign_root, conditional(c, vec![], vec![vec![0.5, 0.5]]));
        assert_eq!(res.unwrap_err(), DiscreteError::MissingParent);
        assert!(other.clique(foreign_root).is_none());

        // failed additions leave the trees unchanged
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.num_variables(), 2);
        assert_eq!(other.len(), 1);
        assert!(tree.clique_of(&c).is_none());

        // a grandchild may use any ancestor's variables
        let res = tree.add_child(leaf, conditional(c, vec![a, b], vec![vec![0.5, 0.5]; 4]));
        assert!(res.is_ok());
    }

    #[test]
    fn navigation() {
        let (a, b, tree) = chain();

        let root = tree.clique_of(&a).unwrap();
        assert!(root.is_root());
        assert_eq!(root.conditional().frontals(), &[a]);

        let children: Vec<Clique> = root.children().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].conditional().frontals(), &[b]);
        assert_eq!(children[0].parent().unwrap().id(), root.id());
        assert!(tree.clique(children[0].id()).is_some());
    }

    #[test]
    fn equals() {
        let (_, _, tree) = chain();
        assert!(tree.equals(&tree, 0.0));
        assert!(tree.equals(&tree.clone(), 0.0));

        // same shape, different variables
        let (_, _, other) = chain();
        assert!(! tree.equals(&other, 1.0));

        // different shape
        let (a, b, _) = chain();
        let mut flat = BayesTree::new();
        flat.add_root(conditional(a, vec![], vec![vec![0.3, 0.7]])).unwrap();
        flat.add_root(conditional(b, vec![], vec![vec![0.5, 0.5]])).unwrap();
        assert!(! tree.equals(&flat, 1.0));
        assert!(! tree.equals(&BayesTree::new(), 1.0));
    }

    #[test]
    fn equals_with_tolerance() {
        let a = Variable::binary();
        let b = Variable::binary();

        let build = |p: f64| {
            let mut tree = BayesTree::new();
            let root = tree.add_root(conditional(a, vec![], vec![vec![p, 1.0 - p]])).unwrap();
            tree.add_child(root, conditional(b, vec![a], vec![vec![0.8, 0.2], vec![0.1, 0.9]])).unwrap();
            tree
        };

        let tree = build(0.3);
        assert!(tree.equals(&build(0.3001), 1e-3));
        assert!(! tree.equals(&build(0.3001), 1e-6));
    }

    #[test]
    fn optimize() {
        let (a, b, tree) = chain();
        assert_eq!(tree.optimize().unwrap(), assn(&[(a, 1), (b, 1)]));
        assert_eq!(tree.ancestral_order().len(), 2);
    }

    #[test]
    fn display() {
        let (a, b, tree) = chain();
        let printed = format!("{}", tree);
        let lines: Vec<&str> = printed.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], format!("P( {} )", a));
        assert_eq!(lines[2], format!("  P( {} | {} )", b, a));
    }

}
