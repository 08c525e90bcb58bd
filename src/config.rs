//! Simulation configuration - one immutable struct per run
//!
//! License: MIT
//! Author: Moroya Sakamoto

use alloc::sync::Arc;

#[cfg(feature = "config")]
use alloc::string::{String, ToString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::blend::{BlendConfig, BlendSpace, BlendSpaceState};
use crate::error::Result;
#[cfg(feature = "config")]
use crate::error::LocomotionError;
use crate::predictor::{PredictorConfig, TrajectoryPredictor};
use crate::regime::{RegimeScheduler, ScheduleConfig};

/// Everything a driver needs to set up the simulation components
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SimulationConfig {
    pub predictor: PredictorConfig,
    pub schedule: ScheduleConfig,
    pub blend: BlendConfig,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        self.predictor.validate()?;
        self.schedule.validate()?;
        self.blend.validate()
    }

    pub fn build_predictor(&self) -> Result<TrajectoryPredictor> {
        let scheduler = RegimeScheduler::new(self.schedule.clone())?;
        TrajectoryPredictor::new(self.predictor, scheduler)
    }

    pub fn build_blend_state(&self, space: Arc<BlendSpace>) -> Result<BlendSpaceState> {
        BlendSpaceState::with_config(space, &self.blend)
    }

    /// Parses a TOML document; omitted fields keep their defaults
    #[cfg(feature = "config")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| LocomotionError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LocomotionError::Parse(e.to_string()))
    }
}
