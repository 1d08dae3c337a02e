//! Defines the `Sampler` trait - an object that can randomly sample from a `Model` - and the
//! random number generators used for sampling.
//!
//! Every sampling routine accepts an explicit generator. For callers that do not want to thread
//! one through, a single process-wide generator seeded with `DEFAULT_SEED` is available through
//! `with_shared_rng`; it advances on every draw and is never reseeded, so a single-threaded
//! program sees the same sequence of samples on every run.

use crate::util::Result;
use crate::variable::Assignment;

use rand::rngs::StdRng;
use rand::SeedableRng;

use std::sync::{Mutex, OnceLock};

pub mod forward;

pub use self::forward::ForwardSampler;

/// Seed of the shared generator and of `seeded_rng`
pub const DEFAULT_SEED: u64 = 2;

static SHARED_RNG: OnceLock<Mutex<StdRng>> = OnceLock::new();


/// Construct a fresh generator seeded with `DEFAULT_SEED`
pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(DEFAULT_SEED)
}


/// Run `f` with exclusive access to the process-wide generator.
///
/// Access is serialized by a lock. Draws from several threads interleave in scheduling order,
/// so the sequence is only reproducible when a single thread samples.
pub fn with_shared_rng<T, F>(f: F) -> T
    where F: FnOnce(&mut StdRng) -> T
{
    let shared = SHARED_RNG.get_or_init(|| Mutex::new(seeded_rng()));

    let mut rng = shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut *rng)
}


pub trait Sampler {

    /// Sample from the associated `Model`.
    fn sample(&mut self) -> Result<Assignment>;

}


/// A `Sampler` whose samples do not depend on each other. Independent samples are drawn from the
/// shared generator, so they need no mutable access to the `Sampler`.
pub trait IndependentSampler {

    fn ind_sample(&self) -> Result<Assignment>;

}
