//! Caller supplied motion and likelihood models.
//!
//! The filter never hardcodes a kinematic or observation model. Instead
//! [`crate::ParticleFilter::predict`] and [`crate::ParticleFilter::weight`]
//! accept anything implementing the traits below. Both traits are implemented
//! for closures with the matching signature, so simple models can be written
//! inline:
//!
//! ```rust
//! use sirpf::{Particle, ParticleFilter};
//!
//! let mut pf = ParticleFilter::with_seed(100, 1, vec![50], vec![0], vec![2], 7).unwrap();
//! pf.resample();
//! pf.predict(&mut |i: usize, particles: &[Particle], noise: &[i64]| {
//!     let mut next = particles[i].clone();
//!     next.state[0] += 1 + noise[0];
//!     next
//! })
//! .unwrap();
//! pf.weight(&mut |i: usize, particles: &[Particle]| {
//!     let mut next = particles[i].clone();
//!     next.weight = if next.state[0] > 25 { 1.0 } else { 0.1 };
//!     next
//! })
//! .unwrap();
//! let estimate = pf.measure();
//! assert_eq!(estimate.state.len(), 1);
//! ```
use crate::particle::Particle;

/// State transition applied to each particle during prediction.
pub trait MotionModel {
    /// Propagate particle `index` one step.
    ///
    /// `particles` is the filter's current collection; entries before `index`
    /// have already been propagated this step. `noise` holds one freshly drawn
    /// process-noise sample per state dimension. The returned particle replaces
    /// particle `index` and must have the filter's dimension.
    fn propagate(&mut self, index: usize, particles: &[Particle], noise: &[i64]) -> Particle;
}

/// Observation likelihood applied to each particle during weighting.
pub trait LikelihoodModel {
    /// Return particle `index` carrying its unnormalized likelihood as weight.
    fn likelihood(&mut self, index: usize, particles: &[Particle]) -> Particle;
}

impl<F> MotionModel for F
where
    F: FnMut(usize, &[Particle], &[i64]) -> Particle,
{
    fn propagate(&mut self, index: usize, particles: &[Particle], noise: &[i64]) -> Particle {
        self(index, particles, noise)
    }
}

impl<F> LikelihoodModel for F
where
    F: FnMut(usize, &[Particle]) -> Particle,
{
    fn likelihood(&mut self, index: usize, particles: &[Particle]) -> Particle {
        self(index, particles)
    }
}

/// Uniform linear motion over interleaved position/velocity pairs.
///
/// For a state `[p_0, .., p_{k-1}, v_0, .., v_{k-1}]` each position is advanced
/// by its velocity and both receive the drawn noise. Any odd trailing entry is
/// treated as a position with zero velocity.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstantVelocity;

impl MotionModel for ConstantVelocity {
    fn propagate(&mut self, index: usize, particles: &[Particle], noise: &[i64]) -> Particle {
        let mut next = particles[index].clone();
        let axes = next.state.len() / 2;
        for k in 0..axes {
            next.state[k] += next.state[axes + k] + noise[k];
            next.state[axes + k] += noise[axes + k];
        }
        if next.state.len() % 2 == 1 {
            let last = next.state.len() - 1;
            next.state[last] += noise[last];
        }
        next
    }
}

/// Random walk: the state moves by the drawn noise only.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomWalk;

impl MotionModel for RandomWalk {
    fn propagate(&mut self, index: usize, particles: &[Particle], noise: &[i64]) -> Particle {
        let mut next = particles[index].clone();
        for (x, n) in next.state.iter_mut().zip(noise) {
            *x += n;
        }
        next
    }
}

/// Binary in-region likelihood.
///
/// `contains` decides whether a state lies inside the observed region. Inside
/// states get `hit` as weight, everything else gets `miss`.
pub struct RegionLikelihood<C> {
    contains: C,
    hit: f64,
    miss: f64,
}

impl<C> RegionLikelihood<C>
where
    C: FnMut(&[i64]) -> bool,
{
    pub fn new(contains: C, hit: f64, miss: f64) -> Self {
        RegionLikelihood {
            contains,
            hit,
            miss,
        }
    }
}

impl<C> LikelihoodModel for RegionLikelihood<C>
where
    C: FnMut(&[i64]) -> bool,
{
    fn likelihood(&mut self, index: usize, particles: &[Particle]) -> Particle {
        let mut next = particles[index].clone();
        next.weight = if (self.contains)(&next.state) {
            self.hit
        } else {
            self.miss
        };
        next
    }
}
