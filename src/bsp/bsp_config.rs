// src/bsp/bsp_config.rs
//! Tunables for a node build.
//!
//! Every field has a default, so a partial JSON/TOML object handed over by a
//! front end deserializes into a complete set of options.

use serde::{Deserialize, Serialize};

use crate::bsp::bsp_util::Fixed;
use crate::error::BuildError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Divides a set's seg count to get the initial splitter search step.
    pub max_segs: usize,
    /// Close every subsector with minisegs (GL nodes).
    pub gl_nodes: bool,
    /// Score bonus for every seg a candidate leaves unsplit.
    pub split_cost: i32,
    /// Divisor for the axis-aligned splitter bonus; smaller favours them more.
    pub aa_preference: i32,
    /// Two vertices closer than this on both axes are the same vertex (fixed units).
    pub vertex_epsilon: Fixed,
    /// Points closer than this to a line are on it (fixed units).
    pub side_epsilon: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            max_segs: 64,
            gl_nodes: false,
            split_cost: 8,
            aa_preference: 16,
            vertex_epsilon: 6,
            side_epsilon: 6.5536,
        }
    }
}

impl BuildOptions {
    /// Default options with GL nodes switched on.
    pub fn gl() -> Self {
        BuildOptions {
            gl_nodes: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.max_segs == 0 {
            return Err(BuildError::InvalidOptions(
                "max_segs must be at least 1".to_string(),
            ));
        }
        if self.aa_preference <= 0 {
            return Err(BuildError::InvalidOptions(format!(
                "aa_preference must be positive, got {}",
                self.aa_preference
            )));
        }
        if self.split_cost < 0 {
            return Err(BuildError::InvalidOptions(format!(
                "split_cost must not be negative, got {}",
                self.split_cost
            )));
        }
        if self.vertex_epsilon < 0 {
            return Err(BuildError::InvalidOptions(format!(
                "vertex_epsilon must not be negative, got {}",
                self.vertex_epsilon
            )));
        }
        if !self.side_epsilon.is_finite() || self.side_epsilon < 0.0 {
            return Err(BuildError::InvalidOptions(format!(
                "side_epsilon must be a finite non-negative number, got {}",
                self.side_epsilon
            )));
        }
        Ok(())
    }
}
