//! Defines the `Error` type for the discrete-bayes library, along with the numeric tolerances
//! shared across modules.

use crate::variable::Variable;

use thiserror::Error;

use std::result;

pub type Result<T> = result::Result<T, DiscreteError>;

/// Default tolerance used when comparing tables and checking normalization.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Tolerance used when validating that a user supplied table is a CPD.
pub const CPD_TOLERANCE: f64 = 1e-3;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DiscreteError {

    /// An operation required a value for a `Variable` that was absent from the supplied
    /// `Assignment`. The value in the tuple is the missing `Variable`.
    #[error("Missing a value for {0} in the supplied assignment")]
    MissingEvidence(Variable),

    /// An operation that requires a specific number of frontal variables was invoked on a
    /// `Conditional` with a different number.
    #[error("Expected {expected} frontal variable(s), found {actual}")]
    UnsupportedArity { expected: usize, actual: usize },

    /// A value outside of the domain of a `Variable`
    #[error("Value {value} is outside the domain of {variable}")]
    InvalidValue { variable: Variable, value: usize },

    /// Represents an error where a certain constraint on a scope was not satisfied
    #[error("Provided scope did not satisfy constraints")]
    InvalidScope,

    /// Exactly what it sounds like
    #[error("Encountered division by zero")]
    DivideByZero,

    /// Represents an error where there was a parent expected, but not found
    #[error("Missing a parent from the model")]
    MissingParent,

    /// Represents a variable that was present multiple times in a situation where it should only
    /// have been present once
    #[error("A variable was encountered twice")]
    DuplicateVariable,

    /// Represents a negative table entry, or a distribution with no positive mass
    #[error("Encountered a non-positive probability")]
    NonPositiveProbability,

    /// Represents an attempt to initialize a variable with an incompatible Initialization
    #[error("An invalid initialization was provided")]
    InvalidInitialization,

    /// A general error with the given description
    #[error("{0}")]
    General(String)

}
