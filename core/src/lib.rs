//! Sequential importance resampling (SIR) particle filter
//!
//! This crate estimates the hidden state of a moving object from noisy, binary
//! (in-region / out-of-region) observations. The state lives on a bounded
//! integer grid, for example `[x, y, vx, vy]` on a pixel field, and each
//! hypothesis of that state is a [`Particle`] carrying an importance weight.
//!
//! A [`ParticleFilter`] owns a fixed number of particles and runs the SIR cycle
//! as four caller-driven phases, once per time step and always in this order:
//!
//! ```text
//! Initialized -> { resample -> predict -> weight -> measure }*
//! ```
//!
//! - **Resample**: roulette-wheel (fitness-proportionate) selection. Each new
//!   particle copies the state of an ancestor drawn with probability equal to
//!   its weight; all weights become zero.
//! - **Predict**: every particle is propagated by a caller supplied
//!   [`MotionModel`] given a freshly drawn uniform integer noise vector, then
//!   clamped into `[lower, upper)`.
//! - **Weight**: a caller supplied [`LikelihoodModel`] scores every particle
//!   against the current observation and the weights are normalized. A
//!   population whose likelihoods are all zero falls back to uniform weights.
//! - **Measure**: the weighted mean state, truncated to integers.
//!
//! Calling `predict` or `weight` before the first `resample` is allowed; the
//! initial uniform prior is a valid weight distribution.
//!
//! The random number generator is injected at construction. Use
//! [`ParticleFilter::with_seed`] or [`ParticleFilter::with_rng`] for
//! reproducible runs and [`ParticleFilter::new`] for a fresh random seed.
//!
//! ```rust
//! use sirpf::{ParticleFilter, Particle};
//!
//! let mut pf = ParticleFilter::with_seed(4, 1, vec![10], vec![0], vec![0], 1).unwrap();
//! for (p, (x, w)) in pf
//!     .particles_mut()
//!     .iter_mut()
//!     .zip([(1, 0.1), (2, 0.2), (3, 0.3), (4, 0.4)])
//! {
//!     p.state[0] = x;
//!     p.weight = w;
//! }
//! assert_eq!(pf.measure(), Particle::with_state(vec![3], 0.0));
//! ```
//!
//! The filter is single threaded and mutates its particles in place without
//! synchronization.
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod particle;

pub use config::FilterConfig;
pub use error::{FilterError, Result};
pub use filter::{Normalization, ParticleFilter, roulette_select};
pub use models::{LikelihoodModel, MotionModel};
pub use particle::Particle;
