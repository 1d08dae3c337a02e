//! Defines a simple forward sampler for `Model`s
//!
//! Implementation of Koller & Friedman Algorithm 12.1 (pp 489)

use crate::model::Model;
use crate::util::Result;
use crate::variable::Assignment;
use super::{seeded_rng, with_shared_rng, IndependentSampler, Sampler};

use rand::rngs::StdRng;
use rand::Rng;
use tracing::trace;

/// A simple `Sampler` for `Model`s whose `Conditional`s each have a single frontal `Variable`
pub struct ForwardSampler<'a, M, R = StdRng> {

    /// The `Model` to sample
    model: &'a M,

    /// The generator driving `Sampler::sample`
    rng: R
}


impl<'a, M: Model> ForwardSampler<'a, M, StdRng> {

    /// Construct a `ForwardSampler` with a fresh generator seeded with `DEFAULT_SEED`
    pub fn new(model: &'a M) -> Self {
        ForwardSampler::with_rng(model, seeded_rng())
    }

}


impl<'a, M: Model, R: Rng> ForwardSampler<'a, M, R> {

    pub fn with_rng(model: &'a M, rng: R) -> Self {
        ForwardSampler { model, rng }
    }

}


/// Sample every `Conditional` of `model` in ancestral order, so that each one sees values for all
/// of its parents.
fn forward_sample<M, R>(model: &M, rng: &mut R) -> Result<Assignment>
    where M: Model, R: Rng + ?Sized
{
    let mut a = Assignment::new();

    for cpd in model.ancestral_order() {
        cpd.sample_in_place_with(&mut a, rng)?;
    }

    trace!(sample = %a, "forward sample");
    Ok(a)
}


impl<'a, M: Model, R: Rng> Sampler for ForwardSampler<'a, M, R> {

    fn sample(&mut self) -> Result<Assignment> {
        forward_sample(self.model, &mut self.rng)
    }

}


impl<'a, M: Model, R: Rng> IndependentSampler for ForwardSampler<'a, M, R> {

    fn ind_sample(&self) -> Result<Assignment> {
        with_shared_rng(|rng| forward_sample(self.model, rng))
    }

}
