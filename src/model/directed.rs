//! Defines a `BayesNet`, which is a Bayesian model that represents the factorization of
//! a probability distribution P as a product of `Conditional`s

use crate::conditional::Conditional;
use crate::init::Initialization;
use crate::util::{Result, DiscreteError};
use crate::variable::{Assignment, Variable};
use super::Model;

use bidir_map::BidirMap;
use indexmap::IndexMap;
use tracing::{debug, warn};

use std::collections::HashSet;
use std::fmt;


/// Represents a Bayesian Network - a Directed Probabilistic Graphical Model.
///
/// # Representation
/// The network is represented as a Directed Acyclic Graph (DAG). A traditional graph data
/// structure is not used for the simple representation of a `BayesNet`; instead, the
/// `Conditional` of each `Variable` implicitly defines the edges of the graph. The `Variable`s
/// are held in their topological order to faciliate efficient computations over the graph.
pub struct BayesNet {

    /// The `Variable`s comprising the scope of the `BayesNet` and their associated CPDs. The
    /// `Conditional` associated with a `Variable` ```X``` is ```P(X | Pa(X))```, where
    /// ```Pa(X)``` are the parents of ```X```. Therefore, in the DAG represented by this map,
    /// there are edges ```P -> X forall P in Pa(X)```
    graph: IndexMap<Variable, Conditional>,

    /// The user-defined names of each `Variable`. This is a two way lookup ```(`Variable`->Name)```
    /// and ```(Name->`Variable`)```
    names: BidirMap<Variable, String>

}

impl BayesNet {

    /// Get the `Conditional` for the given variable in this model.
    pub fn conditional(&self, v: &Variable) -> Option<&Conditional> {
        self.graph.get(v)
    }

    /// Get a topological order of the `BayesNet`
    pub fn topological_order(&self) -> Vec<Variable> {
        self.graph.keys().cloned().collect()
    }

    /// Lookup a `Variable` in the `BayesNet` based on the name
    pub fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.names.get_by_second(&String::from(name))
    }

    /// Lookup a `Variable`'s name in the `BayesNet`.
    pub fn lookup_name(&self, var: &Variable) -> Option<&String> {
        self.names.get_by_first(var)
    }

    /// Check whether two networks hold equal (within `tol`) `Conditional`s for the same
    /// `Variable`s. Names and insertion order are ignored.
    pub fn equals(&self, other: &BayesNet, tol: f64) -> bool {
        self.graph.len() == other.graph.len()
            && self.graph.iter().all(|(v, c)| other.graph.get(v).map_or(false, |o| c.equals(o, tol)))
    }
}

impl Model for BayesNet {

    /// Get all `Variable`s in the model.
    fn variables(&self) -> HashSet<Variable> {
        self.graph.keys().cloned().collect()
    }

    /// Get the number of `Variable`s in the `BayesNet`
    fn num_variables(&self) -> usize {
        self.graph.len()
    }

    /// Determine the probability of a full `Assignment` to the `Variable`s in the `BayesNet`.
    fn evaluate(&self, assignment: &Assignment) -> Result<f64> {
        // for every variable in the graph
        self.graph.values()
                  // get the probability of the assignment
                  .map(|cpt| cpt.value(assignment))
                  // and multiply those probability by the chain rule
                  // but if there are any errors, just return the error
                  .fold(Ok(1.0), |acc, val| acc.and_then(|p| val.map(|v| p * v)))
    }

    fn ancestral_order(&self) -> Vec<&Conditional> {
        self.graph.values().collect()
    }
}

impl fmt::Display for BayesNet {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "BayesNet ({} variables)", self.graph.len())?;
        for (var, cpt) in self.graph.iter() {
            match self.lookup_name(var) {
                Some(name) => writeln!(f, "{}: {}", name, cpt.describe())?,
                None => writeln!(f, "{}", cpt.describe())?
            }
        }
        Ok(())
    }

}


/// An implementation of the [builder pattern] for creating a `BayesNet`.
///
/// At the moment, models must be assembled in topological order.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
pub struct BayesNetBuilder {

    /// The `Variable`s and their associated CPDs
    conditionals: IndexMap<Variable, Conditional>,

    /// The names of each `Variable`
    names: BidirMap<Variable, String>,

    /// The error state of the builder
    err: Option<DiscreteError>

}


impl Default for BayesNetBuilder {

    fn default() -> Self {
        BayesNetBuilder::new()
    }

}


impl BayesNetBuilder {

    /// Construct a new `BayesNetBuilder` representing an empty `BayesNet`
    pub fn new() -> Self {
        BayesNetBuilder {
            conditionals: IndexMap::new(),
            names: BidirMap::new(),
            err: None
        }
    }


    /// Add an anonymous `Variable` to the `BayesNet`.
    ///
    /// # Args
    /// * `var`: the variable to add to the model
    /// * `parents`: the parent variables. The parents must already be in the model.
    /// * `init`: the initialization mechanism for the CPD of `var` in the model.
    pub fn with_variable(
        self,
        var: &Variable,
        parents: Vec<Variable>,
        init: Initialization,
    ) -> Self {
        self.add_variable(var, var.to_string(), parents, init)
    }


    /// Add a named `Variable` to the `BayesNet`.
    ///
    /// # Args
    /// * `var`: the variable to add to the model
    /// * `name`: the name for the variable.
    /// * `parents`: the parent variables. The parents must already be in the model.
    /// * `init`: the initialization mechanism for the CPD of `var` in the model.
    pub fn with_named_variable(
        self,
        var: &Variable,
        name: &str,
        parents: Vec<Variable>,
        init: Initialization,
    ) -> Self {
        self.add_variable(var, String::from(name), parents, init)
    }


    /// Add a prebuilt `Conditional` with a single frontal variable to the `BayesNet`.
    ///
    /// The parents of the `Conditional` must already be in the model.
    pub fn with_conditional(mut self, conditional: Conditional) -> Self {
        if self.err.is_some() {
            return self;
        }

        if conditional.nr_frontals() != 1 {
            self.err = Some(DiscreteError::UnsupportedArity { expected: 1, actual: conditional.nr_frontals() });
            return self;
        }

        let var = conditional.first_frontal();
        if let Some(e) = self.check(&var, conditional.parents()) {
            self.err = Some(e);
            return self;
        }

        self.insert(var, var.to_string(), conditional)
    }


    /// Complete building the model.
    ///
    /// # Returns
    /// the `BayesNet`, or an error if one was generated during the building process
    ///
    /// # Postcondition
    /// This call consumes the `BayesNetBuilder`
    pub fn build(self) -> Result<BayesNet> {
        if let Some(e) = self.err {
            warn!(error = %e, "failed to build BayesNet");
            Err(e)
        } else {
            Ok(self.into_model())
        }
    }

    /// Internal function that constructs the model
    fn into_model(self) -> BayesNet {
        BayesNet { graph: self.conditionals, names: self.names }
    }

    /// Internal function that checks a new `Variable` against the current model
    fn check(&self, var: &Variable, parents: &[Variable]) -> Option<DiscreteError> {
        if parents.iter().any(|v| ! self.conditionals.contains_key(v)) {
            return Some(DiscreteError::MissingParent);
        }

        if self.conditionals.contains_key(var) {
            return Some(DiscreteError::DuplicateVariable);
        }

        None
    }

    /// Internal function that records a checked `Conditional`
    fn insert(mut self, var: Variable, name: String, conditional: Conditional) -> Self {
        debug!(name = name.as_str(), "adding {}", conditional.describe());
        self.conditionals.insert(var, conditional);
        self.names.insert(var, name);
        self
    }

    /// Internal function that acutally does the variable addition to the model
    fn add_variable(
        mut self,
        var: &Variable,
        name: String,
        parents: Vec<Variable>,
        init: Initialization,
    ) -> Self {
        ///////////////////////////////////////////////////////////////////////
        // 1) if we are in an error state, do nothing
        if self.err.is_some() {
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 2) Check for error conditions
        if let Some(e) = self.check(var, &parents) {
            self.err = Some(e);
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 3) Build the conditional based on the initialization
        let conditional = match init.build_conditional(*var, parents) {
            Ok(c) => c,
            Err(e) => {
                self.err = Some(e);
                return self;
            }
        };

        ///////////////////////////////////////////////////////////////////////
        // 4) Add to current model
        self.insert(*var, name, conditional)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::conditional::Signature;
    use crate::factor::Factor;
    use crate::samplers::ForwardSampler;
    use crate::samplers::Sampler;
    use crate::util::DEFAULT_TOLERANCE;

    use ndarray::array;

    #[test]
    fn build_empty() {
        let b = BayesNetBuilder::new();
        let model = b.build();

        assert!(! model.is_err());

        let model = model.unwrap();
        assert_eq!(model.num_variables(), 0);
        assert!(model.variables().is_empty());
        assert_eq!(model.evaluate(&Assignment::new()).unwrap(), 1.0);
    }


    #[test]
    /// Tests building a model with a single binary variable
    fn build_simple() {
        let v = Variable::binary();
        let b = BayesNetBuilder::new();
        let model = b.with_variable(&v, vec![], Initialization::Uniform).build().unwrap();

        let vars = model.variables();
        assert_eq!(1, vars.len());
        assert!(vars.contains(&v));
        let name = model.lookup_name(&v).unwrap();
        let v2 = model.lookup_variable(name.as_str()).unwrap();
        assert_eq!(&v, v2);

        let c = model.conditional(&v).unwrap();
        assert_eq!(c.keys(), &[v]);
        let mut a = Assignment::new();
        a.set(&v, 0);
        assert_eq!(0.5, c.value(&a).unwrap());
        let mut a = Assignment::new();
        a.set(&v, 1);
        assert_eq!(0.5, c.value(&a).unwrap());
    }


    #[test]
    /// Tests building a model with a single, named binary variable
    fn build_named_simple() {
        let v = Variable::binary();
        let b = BayesNetBuilder::new();
        let model = b.with_named_variable(&v, "foo", vec![], Initialization::Uniform)
                     .build()
                     .unwrap();

        let name = model.lookup_name(&v).unwrap();
        assert_eq!(name, "foo");
        let v2 = model.lookup_variable("foo").unwrap();
        assert_eq!(&v, v2);
        assert!(model.lookup_variable("bar").is_none());
    }


    #[test]
    fn build_errs() {
        let a = Variable::binary();
        let b = Variable::binary();

        // parents must already be in the model
        let res = BayesNetBuilder::new().with_variable(&b, vec![a], Initialization::Uniform).build();
        assert_eq!(res.err(), Some(DiscreteError::MissingParent));

        // a variable may only be added once
        let res = BayesNetBuilder::new()
            .with_variable(&a, vec![], Initialization::Uniform)
            .with_variable(&a, vec![], Initialization::Uniform)
            .build();
        assert_eq!(res.err(), Some(DiscreteError::DuplicateVariable));

        // the first error is kept
        let res = BayesNetBuilder::new()
            .with_variable(&a, vec![], Initialization::Binomial(0.2))
            .with_variable(&b, vec![a], Initialization::Binomial(0.2))
            .with_variable(&b, vec![Variable::binary()], Initialization::Uniform)
            .build();
        assert_eq!(res.err(), Some(DiscreteError::InvalidInitialization));

        // only single frontal conditionals
        let joint = Factor::new(vec![a, b], array![[0.25, 0.25], [0.25, 0.25]].into_dyn()).unwrap();
        let res = BayesNetBuilder::new().with_conditional(Conditional::from_joint(&joint, 2).unwrap()).build();
        assert_eq!(res.err(), Some(DiscreteError::UnsupportedArity { expected: 1, actual: 2 }));
    }


    /// Example taken from Koller & Friedman Section 3.1.2
    fn intelligence() -> (Variable, Variable, BayesNet) {
        let intelligence = Variable::binary();
        let sat = Variable::binary();

        let sfactor = Factor::cpd(sat, vec![intelligence], array![[0.95, 0.05], [0.2, 0.8]].into_dyn()).unwrap();

        let model = BayesNetBuilder::new()
            .with_named_variable(&intelligence, "I", vec![], Initialization::Multinomial(&[0.7, 0.3]))
            .with_named_variable(&sat, "S", vec![intelligence], Initialization::Table(sfactor))
            .build()
            .unwrap();

        (intelligence, sat, model)
    }


    #[test]
    fn evaluate() {
        let (intelligence, sat, model) = intelligence();

        assert_eq!("I", model.lookup_name(&intelligence).unwrap());
        assert_eq!(&sat, model.lookup_variable("S").unwrap());
        assert_eq!(model.topological_order(), vec![intelligence, sat]);

        for (i, s, expected) in vec![(0, 0, 0.7 * 0.95), (0, 1, 0.7 * 0.05), (1, 0, 0.3 * 0.2), (1, 1, 0.3 * 0.8)] {
            let mut a = Assignment::new();
            a.set(&intelligence, i);
            a.set(&sat, s);
            assert!((model.evaluate(&a).unwrap() - expected).abs() < DEFAULT_TOLERANCE);
        }

        // test partial assignment
        let mut a = Assignment::new();
        a.set(&intelligence, 1);
        assert_eq!(model.evaluate(&a).unwrap_err(), DiscreteError::MissingEvidence(sat));
    }


    #[test]
    fn optimize() {
        let (intelligence, sat, model) = intelligence();

        let mpe = model.optimize().unwrap();
        assert_eq!(mpe.get(&intelligence), Some(&0));
        assert_eq!(mpe.get(&sat), Some(&0));
    }


    #[test]
    fn with_conditional() {
        let (intelligence, sat, model) = intelligence();

        let grade = Variable::discrete(3);
        let cond = Conditional::from_signature(
            &Signature::new(grade, vec![sat], vec![vec![3., 2., 5.], vec![6., 3., 1.]])
        ).unwrap();

        let rebuilt = BayesNetBuilder::new()
            .with_conditional(model.conditional(&intelligence).unwrap().clone())
            .with_conditional(model.conditional(&sat).unwrap().clone())
            .with_conditional(cond)
            .build()
            .unwrap();

        assert_eq!(rebuilt.num_variables(), 3);
        assert_eq!(rebuilt.lookup_name(&grade).unwrap(), &grade.to_string());

        let mut a = Assignment::new();
        a.set(&intelligence, 1);
        a.set(&sat, 1);
        a.set(&grade, 0);
        assert!((rebuilt.evaluate(&a).unwrap() - 0.3 * 0.8 * 0.6).abs() < DEFAULT_TOLERANCE);
    }


    #[test]
    fn equals() {
        let (intelligence, sat, model) = intelligence();
        assert!(model.equals(&model, 0.0));

        let shifted = BayesNetBuilder::new()
            .with_variable(&intelligence, vec![], Initialization::Multinomial(&[0.7001, 0.2999]))
            .with_conditional(model.conditional(&sat).unwrap().clone())
            .build()
            .unwrap();
        assert!(model.equals(&shifted, 1e-3));
        assert!(! model.equals(&shifted, 1e-6));

        let partial = BayesNetBuilder::new()
            .with_variable(&intelligence, vec![], Initialization::Multinomial(&[0.7, 0.3]))
            .build()
            .unwrap();
        assert!(! model.equals(&partial, 1.0));
    }


    #[test]
    fn display() {
        let (_, _, model) = intelligence();
        let printed = format!("{}", model);
        let lines: Vec<&str> = printed.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("I: P( "));
        assert!(lines[2].starts_with("S: P( "));
    }


    #[test]
    fn forward_sample() {
        let (intelligence, sat, model) = intelligence();

        let mut sampler = ForwardSampler::new(&model);
        for _ in 0..100 {
            let sample = sampler.sample().unwrap();
            assert_eq!(sample.len(), 2);
            assert!(sample.get(&intelligence).unwrap() < &2);
            assert!(sample.get(&sat).unwrap() < &2);
        }
    }
}
