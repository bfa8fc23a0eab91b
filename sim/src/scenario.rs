//! Moving square target on a bounded grid.
//!
//! A square target of side `size` starts in the corner of a `width x height`
//! field and moves one cell right and one cell down per step. Each step the
//! filter receives only a binary observation: whether a hypothesised position
//! lies on the target. Particles use the state `[x, y, vx, vy]`.
use std::path::Path;

use anyhow::{Result, bail};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use sirpf::models::{ConstantVelocity, RegionLikelihood};
use sirpf::{FilterConfig, ParticleFilter};

/// Length of the `[x, y, vx, vy]` state
pub const STATE_DIMENSION: usize = 4;
/// Likelihood of a particle that lands on the target
pub const HIT_LIKELIHOOD: f64 = 1.0;
/// Likelihood of a particle anywhere else on the field
pub const MISS_LIKELIHOOD: f64 = 0.0001;

/// Field and target geometry for one run.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub width: i64,
    pub height: i64,
    pub target_size: i64,
    pub steps: usize,
}
impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            width: 400,
            height: 400,
            target_size: 10,
            steps: 380,
        }
    }
}
impl Scenario {
    /// Filter configuration matching the field: positions bounded by the field,
    /// velocities by +/-10 cells per step.
    pub fn filter_config(&self, number: usize, seed: Option<u64>) -> FilterConfig {
        FilterConfig {
            number,
            dimension: STATE_DIMENSION,
            upper: vec![self.width, self.height, 10, 10],
            lower: vec![0, 0, -10, -10],
            noise: vec![30, 30, 10, 10],
            seed,
        }
    }
}

/// Square target with its top-left corner at `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    pub x: i64,
    pub y: i64,
    pub size: i64,
}
impl Target {
    /// The target is observable only while it lies entirely on the field.
    pub fn visible(&self, width: i64, height: i64) -> bool {
        self.x >= 0 && self.y >= 0 && self.x + self.size <= width && self.y + self.size <= height
    }
    /// Whether a state's position lies on the target (edges inclusive).
    pub fn contains(&self, state: &[i64]) -> bool {
        (self.x..=self.x + self.size).contains(&state[0])
            && (self.y..=self.y + self.size).contains(&state[1])
    }
    pub fn center(&self) -> (i64, i64) {
        (self.x + self.size / 2, self.y + self.size / 2)
    }
    pub fn advance(&mut self) {
        self.x += 1;
        self.y += 1;
    }
}

/// One row of the output track.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StepRecord {
    pub step: usize,
    pub target_x: i64,
    pub target_y: i64,
    pub estimate_x: i64,
    pub estimate_y: i64,
    pub estimate_vx: i64,
    pub estimate_vy: i64,
    pub effective_sample_size: f64,
    pub degenerate: bool,
}
impl StepRecord {
    /// Euclidean distance between the estimate and the target center.
    pub fn error(&self) -> f64 {
        let dx = (self.estimate_x - self.target_x) as f64;
        let dy = (self.estimate_y - self.target_y) as f64;
        dx.hypot(dy)
    }

    pub fn to_csv<P: AsRef<Path>>(records: &[Self], path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Self>> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let record: Self = result?;
            records.push(record);
        }
        Ok(records)
    }
}

/// Run the tracking scenario and return one record per step.
pub fn simulate(config: &FilterConfig, scenario: &Scenario) -> Result<Vec<StepRecord>> {
    config.validate()?;
    if config.dimension != STATE_DIMENSION {
        bail!(
            "Scenario tracks the state [x, y, vx, vy] and needs dimension {}, got {}",
            STATE_DIMENSION,
            config.dimension
        );
    }
    let mut pf = ParticleFilter::from_config(config)?;
    info!(
        "Tracking a {}x{} target on a {}x{} field with {} particles for {} steps",
        scenario.target_size,
        scenario.target_size,
        scenario.width,
        scenario.height,
        config.number,
        scenario.steps
    );

    let mut target = Target {
        x: 0,
        y: 0,
        size: scenario.target_size,
    };
    let mut records = Vec::with_capacity(scenario.steps);
    for step in 0..scenario.steps {
        let observed = target;
        let visible = observed.visible(scenario.width, scenario.height);
        let mut likelihood = RegionLikelihood::new(
            |state: &[i64]| visible && observed.contains(state),
            HIT_LIKELIHOOD,
            MISS_LIKELIHOOD,
        );
        let (estimate, normalization) = pf.step(&mut ConstantVelocity, &mut likelihood)?;
        if normalization.is_degenerate() {
            warn!("Step {}: all particles lost the target", step);
        }

        let (target_x, target_y) = observed.center();
        let record = StepRecord {
            step,
            target_x,
            target_y,
            estimate_x: estimate.state[0],
            estimate_y: estimate.state[1],
            estimate_vx: estimate.state[2],
            estimate_vy: estimate.state[3],
            effective_sample_size: pf.effective_sample_size(),
            degenerate: normalization.is_degenerate(),
        };
        debug!(
            "Step {}: target ({}, {}) estimate ({}, {}) error {:.1}",
            step,
            record.target_x,
            record.target_y,
            record.estimate_x,
            record.estimate_y,
            record.error()
        );
        records.push(record);
        target.advance();
    }

    if let Some(last) = records.last() {
        info!("Final tracking error {:.1} cells", last.error());
    }
    Ok(records)
}
