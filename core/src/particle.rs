//! A single hypothesis of the hidden state.
use std::fmt::{self, Display};

/// One particle: an integer state vector and an importance weight.
///
/// The state length is fixed by the owning filter's dimension. The weight is
/// unnormalized while a likelihood model is running and normalized afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Particle {
    pub state: Vec<i64>,
    pub weight: f64,
}
impl Display for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Particle")
            .field("state", &self.state)
            .field("weight", &format_args!("{:.6}", self.weight))
            .finish()
    }
}
impl Particle {
    /// Zeroed particle of the given dimension with weight 0.
    pub fn new(dimension: usize) -> Particle {
        Particle {
            state: vec![0; dimension],
            weight: 0.0,
        }
    }
    pub fn with_state(state: Vec<i64>, weight: f64) -> Particle {
        Particle { state, weight }
    }
    pub fn dimension(&self) -> usize {
        self.state.len()
    }
}
impl From<(Vec<i64>, f64)> for Particle {
    fn from(tuple: (Vec<i64>, f64)) -> Self {
        let (state, weight) = tuple;
        Particle::with_state(state, weight)
    }
}
