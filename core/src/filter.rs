//! Sequential importance resampling particle filter.
//!
//! The filter owns a fixed number of integer-state [`Particle`]s inside a
//! bounded box `[lower, upper)` and exposes the SIR cycle as four phases that
//! the caller drives once per time step:
//!
//! 1. [`ParticleFilter::resample`]: roulette-wheel selection on the current
//!    weights. All weights are reset to zero.
//! 2. [`ParticleFilter::predict`]: draw per-dimension uniform process noise,
//!    hand it to a [`MotionModel`], and clamp the result into the bounds.
//! 3. [`ParticleFilter::weight`]: query a [`LikelihoodModel`] for every
//!    particle and normalize the weights to sum to one.
//! 4. [`ParticleFilter::measure`]: weighted mean of the particle states,
//!    truncated to integers.
//!
//! [`ParticleFilter::step`] runs the four phases in that order.
//!
//! # Resampling rule
//!
//! For a draw `r` in `[0, 1)` the selected ancestor is the first index `j`
//! whose cumulative weight satisfies `w[j] >= r`. A draw that lands exactly
//! on a boundary therefore selects the lower particle. If rounding leaves the
//! total weight short of `r`, the last particle is selected. See
//! [`roulette_select`].
//!
//! # Degenerate weights
//!
//! When every likelihood comes back zero the weights cannot be normalized.
//! The filter resets them to the uniform `1 / number`, logs a warning, and
//! reports [`Normalization::UniformReset`].
//!
//! # Example
//!
//! ```rust
//! use sirpf::{ParticleFilter, models::{ConstantVelocity, RegionLikelihood}};
//!
//! let mut pf = ParticleFilter::with_seed(
//!     500,
//!     4,
//!     vec![100, 100, 5, 5],
//!     vec![0, 0, -5, -5],
//!     vec![5, 5, 1, 1],
//!     42,
//! )
//! .unwrap();
//! let mut target = RegionLikelihood::new(
//!     |s: &[i64]| (40..60).contains(&s[0]) && (40..60).contains(&s[1]),
//!     1.0,
//!     1e-4,
//! );
//! for _ in 0..10 {
//!     let (estimate, _) = pf.step(&mut ConstantVelocity, &mut target).unwrap();
//!     assert_eq!(estimate.state.len(), 4);
//! }
//! ```
use std::fmt::{self, Debug};

use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};

use crate::config::{FilterConfig, validate_parameters};
use crate::error::{FilterError, Result};
use crate::models::{LikelihoodModel, MotionModel};
use crate::particle::Particle;

/// Outcome of the normalization at the end of [`ParticleFilter::weight`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Normalization {
    /// Weights were divided by their positive sum.
    Normalized { sum: f64 },
    /// Every weight was zero (or one was not finite) and all weights were reset
    /// to `1 / number`.
    UniformReset,
}
impl Normalization {
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Normalization::UniformReset)
    }
}

/// Roulette-wheel selection over a cumulative weight array.
///
/// Returns the first index `j` with `cumulative[j] >= r`, or the last index
/// when no entry reaches `r`. `cumulative` must not be empty.
pub fn roulette_select(cumulative: &[f64], r: f64) -> usize {
    cumulative
        .iter()
        .position(|&w| w >= r)
        .unwrap_or(cumulative.len().saturating_sub(1))
}

#[derive(Clone)]
pub struct ParticleFilter<R: Rng = StdRng> {
    number: usize,
    dimension: usize,
    upper: Vec<i64>,
    lower: Vec<i64>,
    noise: Vec<i64>,
    particles: Vec<Particle>,
    state_distributions: Vec<Uniform<i64>>,
    /// `None` where the noise half-width is zero
    noise_distributions: Vec<Option<Uniform<i64>>>,
    // Scratch buffers sized once at construction.
    cumulative: Vec<f64>,
    ancestors: Vec<Vec<i64>>,
    noise_sample: Vec<i64>,
    /// Weighted particles held back until the whole population validates
    staged: Vec<Particle>,
    rng: R,
}
impl<R: Rng> Debug for ParticleFilter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min_weight = self
            .particles
            .iter()
            .map(|p| p.weight)
            .fold(f64::INFINITY, f64::min);
        let max_weight = self.particles.iter().map(|p| p.weight).fold(0.0, f64::max);
        f.debug_struct("ParticleFilter")
            .field("num_particles", &self.number)
            .field("dimension", &self.dimension)
            .field("effective_particles", &self.effective_sample_size())
            .field(
                "weight_range",
                &format_args!("[{:.4e}, {:.4e}]", min_weight, max_weight),
            )
            .field("estimate", &self.measure().state)
            .finish()
    }
}

impl ParticleFilter<StdRng> {
    /// Build a filter seeded from a fresh random seed and draw the uniform prior.
    pub fn new(
        number: usize,
        dimension: usize,
        upper: Vec<i64>,
        lower: Vec<i64>,
        noise: Vec<i64>,
    ) -> Result<Self> {
        Self::with_seed(number, dimension, upper, lower, noise, rand::random())
    }

    /// Build a filter with a deterministic seed.
    ///
    /// Two filters built with the same arguments and seed produce identical
    /// particle sets when driven by the same models.
    pub fn with_seed(
        number: usize,
        dimension: usize,
        upper: Vec<i64>,
        lower: Vec<i64>,
        noise: Vec<i64>,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(
            number,
            dimension,
            upper,
            lower,
            noise,
            StdRng::seed_from_u64(seed),
        )
    }

    /// Build a filter from a validated [`FilterConfig`].
    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        let FilterConfig {
            number,
            dimension,
            upper,
            lower,
            noise,
            seed,
        } = config.clone();
        match seed {
            Some(seed) => Self::with_seed(number, dimension, upper, lower, noise, seed),
            None => Self::new(number, dimension, upper, lower, noise),
        }
    }
}

impl<R: Rng> ParticleFilter<R> {
    /// Build a filter around an injected random number generator.
    ///
    /// Fails with [`FilterError::InvalidConfiguration`] when `number` or
    /// `dimension` is zero, a bound or noise vector does not have `dimension`
    /// entries, `upper[j] <= lower[j]`, or `noise[j] < 0`.
    pub fn with_rng(
        number: usize,
        dimension: usize,
        upper: Vec<i64>,
        lower: Vec<i64>,
        noise: Vec<i64>,
        rng: R,
    ) -> Result<Self> {
        validate_parameters(number, dimension, &upper, &lower, &noise)?;
        let state_distributions = lower
            .iter()
            .zip(&upper)
            .map(|(&lo, &hi)| {
                Uniform::new(lo, hi).map_err(|e| FilterError::config(format!("state range: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        let noise_distributions = noise
            .iter()
            .map(|&half_width| {
                if half_width == 0 {
                    Ok(None)
                } else {
                    Uniform::new(-half_width, half_width)
                        .map(Some)
                        .map_err(|e| FilterError::config(format!("noise range: {e}")))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let mut filter = ParticleFilter {
            number,
            dimension,
            upper,
            lower,
            noise,
            particles: vec![Particle::new(dimension); number],
            state_distributions,
            noise_distributions,
            cumulative: vec![0.0; number],
            ancestors: vec![vec![0; dimension]; number],
            noise_sample: vec![0; dimension],
            staged: vec![Particle::new(dimension); number],
            rng,
        };
        filter.initial_particles();
        Ok(filter)
    }

    /// Redraw every particle uniformly in `[lower, upper)` with weight `1 / number`.
    pub fn initial_particles(&mut self) {
        let uniform = 1.0 / self.number as f64;
        for particle in &mut self.particles {
            for (x, dist) in particle.state.iter_mut().zip(&self.state_distributions) {
                *x = dist.sample(&mut self.rng);
            }
            particle.weight = uniform;
        }
        debug!(
            "Initialized {} particles of dimension {}",
            self.number, self.dimension
        );
    }

    /// Roulette-wheel resampling on the current weights.
    ///
    /// Every output particle is a copy of a particle from the pre-resample
    /// generation, selected with probability proportional to its weight. All
    /// weights are zero afterwards.
    pub fn resample(&mut self) {
        debug!(
            "Resampling {} particles, effective sample size {:.2}",
            self.number,
            self.effective_sample_size()
        );
        let mut total = 0.0;
        for (c, particle) in self.cumulative.iter_mut().zip(&self.particles) {
            total += particle.weight;
            *c = total;
        }
        for (snapshot, particle) in self.ancestors.iter_mut().zip(&self.particles) {
            snapshot.clone_from(&particle.state);
        }
        for i in 0..self.number {
            let r: f64 = self.rng.random();
            let m = roulette_select(&self.cumulative, r);
            self.particles[i].state.clone_from(&self.ancestors[m]);
            self.particles[i].weight = 0.0;
        }
    }

    /// Propagate every particle through `model` and clamp into the bounds.
    ///
    /// Each component `j` of the noise vector is uniform in
    /// `[-noise[j], noise[j])`, or zero when `noise[j]` is zero. After the
    /// model returns, component `j` is clamped to `[lower[j], upper[j] - 1]`.
    ///
    /// A returned particle of the wrong dimension aborts the phase with
    /// [`FilterError::DimensionMismatch`]; it is not installed, particles
    /// before it keep their new state and particles after it are untouched.
    pub fn predict<M: MotionModel + ?Sized>(&mut self, model: &mut M) -> Result<()> {
        for i in 0..self.number {
            for (n, dist) in self.noise_sample.iter_mut().zip(&self.noise_distributions) {
                *n = match dist {
                    Some(dist) => dist.sample(&mut self.rng),
                    None => 0,
                };
            }
            let mut next = model.propagate(i, &self.particles, &self.noise_sample);
            self.check_dimension(i, &next)?;
            for ((x, &lo), &hi) in next.state.iter_mut().zip(&self.lower).zip(&self.upper) {
                *x = (*x).clamp(lo, hi - 1);
            }
            self.particles[i] = next;
        }
        debug!("Predicted {} particles", self.number);
        Ok(())
    }

    /// Weight every particle with `model` and normalize.
    ///
    /// Returns how the normalization went. Weights that are negative or not
    /// finite are rejected with [`FilterError::InvalidWeight`]; a wrong
    /// dimension with [`FilterError::DimensionMismatch`]. The returned
    /// particles are only installed once every one of them is valid, so an
    /// error leaves the particles and their weights as they were before the
    /// call.
    pub fn weight<L: LikelihoodModel + ?Sized>(&mut self, model: &mut L) -> Result<Normalization> {
        for i in 0..self.number {
            let next = model.likelihood(i, &self.particles);
            self.check_dimension(i, &next)?;
            if !next.weight.is_finite() || next.weight < 0.0 {
                return Err(FilterError::InvalidWeight {
                    index: i,
                    weight: next.weight,
                });
            }
            self.staged[i] = next;
        }
        std::mem::swap(&mut self.particles, &mut self.staged);
        Ok(self.normalize_weights())
    }

    /// Weighted mean state, each component truncated toward zero.
    ///
    /// The returned particle carries weight 0. Does not modify the filter.
    pub fn measure(&self) -> Particle {
        let mut mean = vec![0.0_f64; self.dimension];
        for particle in &self.particles {
            for (m, &x) in mean.iter_mut().zip(&particle.state) {
                *m += x as f64 * particle.weight;
            }
        }
        Particle::with_state(mean.into_iter().map(|m| m as i64).collect(), 0.0)
    }

    /// Run one full cycle: resample, predict, weight, measure.
    pub fn step<M, L>(
        &mut self,
        motion: &mut M,
        likelihood: &mut L,
    ) -> Result<(Particle, Normalization)>
    where
        M: MotionModel + ?Sized,
        L: LikelihoodModel + ?Sized,
    {
        self.resample();
        self.predict(motion)?;
        let normalization = self.weight(likelihood)?;
        Ok((self.measure(), normalization))
    }

    /// Divide the weights by their sum, or reset them to uniform when every
    /// weight is zero.
    ///
    /// Weights are scaled by the largest weight before summing, so large but
    /// finite likelihoods whose plain sum would overflow still normalize. The
    /// reported `sum` is the unscaled total and may be infinite in that case.
    /// A NaN or infinite weight also triggers the uniform reset.
    pub fn normalize_weights(&mut self) -> Normalization {
        let max_weight = self.particles.iter().map(|p| p.weight).fold(0.0, f64::max);
        let all_finite = self.particles.iter().all(|p| p.weight.is_finite());
        if max_weight > 0.0 && all_finite {
            let scaled_sum: f64 = self.particles.iter().map(|p| p.weight / max_weight).sum();
            for particle in &mut self.particles {
                particle.weight = (particle.weight / max_weight) / scaled_sum;
            }
            let sum = scaled_sum * max_weight;
            debug!("Normalized weights, likelihood sum {:.6e}", sum);
            Normalization::Normalized { sum }
        } else {
            let sum: f64 = self.particles.iter().map(|p| p.weight).sum();
            warn!(
                "Weight sum {} cannot be normalized, resetting {} particles to uniform",
                sum, self.number
            );
            let uniform = 1.0 / self.number as f64;
            for particle in &mut self.particles {
                particle.weight = uniform;
            }
            Normalization::UniformReset
        }
    }

    /// `1 / sum(w_i^2)`, or 0 when every weight is zero.
    pub fn effective_sample_size(&self) -> f64 {
        let sum_of_squares: f64 = self.particles.iter().map(|p| p.weight * p.weight).sum();
        if sum_of_squares > 0.0 {
            1.0 / sum_of_squares
        } else {
            0.0
        }
    }

    /// Particle states as a `dimension x number` matrix, one column per particle.
    pub fn particles_to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.dimension, self.number, |row, col| {
            self.particles[col].state[row] as f64
        })
    }

    /// Weighted sample covariance of the particle states about their weighted mean.
    pub fn covariance(&self) -> DMatrix<f64> {
        let states = self.particles_to_matrix();
        let weights = DVector::from_iterator(self.number, self.particles.iter().map(|p| p.weight));
        let mean = &states * &weights;
        let mut cov = DMatrix::<f64>::zeros(self.dimension, self.dimension);
        for (col, &w) in states.column_iter().zip(weights.iter()) {
            let diff = col - &mean;
            cov += w * &diff * &diff.transpose();
        }
        cov
    }

    fn check_dimension(&self, index: usize, particle: &Particle) -> Result<()> {
        if particle.state.len() != self.dimension {
            return Err(FilterError::DimensionMismatch {
                index,
                expected: self.dimension,
                actual: particle.state.len(),
            });
        }
        Ok(())
    }

    pub fn number(&self) -> usize {
        self.number
    }
    pub fn dimension(&self) -> usize {
        self.dimension
    }
    pub fn upper(&self) -> &[i64] {
        &self.upper
    }
    pub fn lower(&self) -> &[i64] {
        &self.lower
    }
    pub fn noise(&self) -> &[i64] {
        &self.noise
    }
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
    /// Mutable access to the particles. The collection itself cannot be
    /// resized; callers must keep every state at `dimension` entries.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
    pub fn weights(&self) -> Vec<f64> {
        self.particles.iter().map(|p| p.weight).collect()
    }
}
