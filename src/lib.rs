//! Exact inference on discrete probabilistic graphical models: `Conditional` distributions, the
//! `BayesNet`s built from them and `BayesTree`s of cliques.

pub mod util;
pub mod variable;
pub mod factor;
pub mod conditional;
pub mod init;
pub mod tree;
pub mod model;
pub mod samplers;

pub use crate::util::{Result, DiscreteError};
