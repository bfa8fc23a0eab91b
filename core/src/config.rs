//! Static filter configuration and its file formats.
//!
//! A [`FilterConfig`] carries everything needed to construct a
//! [`crate::ParticleFilter`]: particle count, state dimension, per-dimension
//! bounds and process-noise half-widths, and an optional RNG seed. It can be
//! stored as JSON, YAML or TOML; [`FilterConfig::from_file`] and
//! [`FilterConfig::to_file`] pick the format from the file extension.
//!
//! ```rust
//! use sirpf::FilterConfig;
//!
//! let config = FilterConfig {
//!     number: 800,
//!     dimension: 4,
//!     upper: vec![400, 400, 10, 10],
//!     lower: vec![0, 0, -10, -10],
//!     noise: vec![30, 30, 10, 10],
//!     seed: Some(42),
//! };
//! assert!(config.validate().is_ok());
//! ```
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Number of particles
    pub number: usize,
    /// Length of every state vector
    pub dimension: usize,
    /// Exclusive upper bound per dimension
    pub upper: Vec<i64>,
    /// Inclusive lower bound per dimension
    pub lower: Vec<i64>,
    /// Half-width of the symmetric process noise per dimension
    pub noise: Vec<i64>,
    /// RNG seed for reproducible runs. Entropy seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            number: 800,
            dimension: 4,
            upper: vec![400, 400, 10, 10],
            lower: vec![0, 0, -10, -10],
            noise: vec![30, 30, 10, 10],
            seed: None,
        }
    }
}

impl FilterConfig {
    /// Check that the parameters describe a valid bounded state space.
    pub fn validate(&self) -> Result<()> {
        validate_parameters(
            self.number,
            self.dimension,
            &self.upper,
            &self.lower,
            &self.noise,
        )
    }

    /// Write the configuration to a JSON file (pretty-printed).
    pub fn to_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(|e| FilterError::Format(e.to_string()))
    }

    /// Read the configuration from a JSON file.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        serde_json::from_reader(file).map_err(|e| FilterError::Format(e.to_string()))
    }
    /// Write the configuration as YAML.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        let s = serde_yaml::to_string(self).map_err(|e| FilterError::Format(e.to_string()))?;
        file.write_all(s.as_bytes())?;
        Ok(())
    }
    /// Read the configuration from YAML.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        serde_yaml::from_reader(file).map_err(|e| FilterError::Format(e.to_string()))
    }
    /// Write the configuration as TOML.
    pub fn to_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        let s = toml::to_string(self).map_err(|e| FilterError::Format(e.to_string()))?;
        file.write_all(s.as_bytes())?;
        Ok(())
    }
    /// Read the configuration from TOML.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut s = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut s)?;
        toml::from_str(&s).map_err(|e| FilterError::Format(e.to_string()))
    }
    /// Generic write: choose format by file extension (.json/.yaml/.yml/.toml)
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        match ConfigFormat::from_path(p)? {
            ConfigFormat::Json => self.to_json(p),
            ConfigFormat::Yaml => self.to_yaml(p),
            ConfigFormat::Toml => self.to_toml(p),
        }
    }
    /// Generic read: choose format by file extension (.json/.yaml/.yml/.toml)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        match ConfigFormat::from_path(p)? {
            ConfigFormat::Json => Self::from_json(p),
            ConfigFormat::Yaml => Self::from_yaml(p),
            ConfigFormat::Toml => Self::from_toml(p),
        }
    }
}

/// Configuration file format, chosen by extension.
#[derive(Clone, Copy, Debug, PartialEq)]
enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}
impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(ConfigFormat::Json),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(FilterError::Format(format!(
                "unsupported file extension for '{}'",
                path.display()
            ))),
        }
    }
}

/// Shared construction checks for [`FilterConfig`] and `ParticleFilter::with_rng`.
pub(crate) fn validate_parameters(
    number: usize,
    dimension: usize,
    upper: &[i64],
    lower: &[i64],
    noise: &[i64],
) -> Result<()> {
    if number == 0 {
        return Err(FilterError::config("particle count must be positive"));
    }
    if dimension == 0 {
        return Err(FilterError::config("state dimension must be positive"));
    }
    for (name, len) in [
        ("upper", upper.len()),
        ("lower", lower.len()),
        ("noise", noise.len()),
    ] {
        if len != dimension {
            return Err(FilterError::config(format!(
                "{name} has {len} entries, expected {dimension}"
            )));
        }
    }
    for j in 0..dimension {
        if upper[j] <= lower[j] {
            return Err(FilterError::config(format!(
                "upper[{j}] = {} must exceed lower[{j}] = {}",
                upper[j], lower[j]
            )));
        }
        if noise[j] < 0 {
            return Err(FilterError::config(format!(
                "noise[{j}] = {} must be non-negative",
                noise[j]
            )));
        }
    }
    Ok(())
}
