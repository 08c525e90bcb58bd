//! Blend space - clip weights from a continuous 2D parameter
//!
//! A [`BlendSpace`] is an immutable library of clips placed in a 2D space
//! and shared between any number of [`BlendSpaceState`]s. Each state owns a
//! query position and its weight vector; moving the position (directly or
//! through smoothing) re-solves the weights with inverse-distance weighting.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{LocomotionError, Result};
use crate::idw::{self, WeightVector, DEFAULT_POWER};
use crate::predictor::SNAPSHOT_VERSION;
use crate::smoothing::decay_alpha;
use crate::vector::Vec2k;

/// Squared distance under which a new position counts as unchanged
const POSITION_TOLERANCE_SQ: f32 = 1e-4;
/// Same, for single-axis setters
const AXIS_TOLERANCE: f32 = 1e-4;
/// A smoothing step smaller than this (squared) skips the re-solve
const MOVE_TOLERANCE_SQ: f32 = 1e-5;

/// A clip placed in the blend space
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlendSample {
    pub position: Vec2k,
    /// Opaque to the solver
    pub clip_id: u32,
}

impl BlendSample {
    pub const fn new(position: Vec2k, clip_id: u32) -> Self {
        Self { position, clip_id }
    }
}

/// Shared, read-only clip library
#[derive(Debug, Clone, PartialEq)]
pub struct BlendSpace {
    samples: Vec<BlendSample>,
    positions: Vec<Vec2k>,
    power: f32,
    /// Rates used by the `Unique*` smoothing modes
    smoothing: Vec2k,
}

impl BlendSpace {
    /// Builds a library; the sample nearest the origin becomes index 0 and
    /// the rest keep their relative order
    pub fn new(mut samples: Vec<BlendSample>, power: f32) -> Result<Self> {
        if samples.is_empty() {
            return Err(LocomotionError::config("blend space has no samples"));
        }
        if !power.is_finite() || power < 0.0 {
            return Err(LocomotionError::config(format!(
                "falloff power must be finite and non-negative, got {power}"
            )));
        }
        if let Some(bad) = samples.iter().find(|s| !s.position.is_finite()) {
            return Err(LocomotionError::config(format!(
                "clip {} has a non-finite position",
                bad.clip_id
            )));
        }

        let mut neutral = 0;
        for (i, s) in samples.iter().enumerate() {
            if s.position.length_sq() < samples[neutral].position.length_sq() {
                neutral = i;
            }
        }
        // rotate keeps the others in order
        samples[..=neutral].rotate_right(1);

        let positions = samples.iter().map(|s| s.position).collect();
        tracing::debug!(samples = samples.len(), power, neutral_clip = samples[0].clip_id, "blend space built");
        Ok(Self { samples, positions, power, smoothing: Vec2k::splat(5.0) })
    }

    /// Uses the default falloff power
    pub fn with_default_power(samples: Vec<BlendSample>) -> Result<Self> {
        Self::new(samples, DEFAULT_POWER)
    }

    /// Library with the falloff power of `config`
    pub fn from_config(samples: Vec<BlendSample>, config: &BlendConfig) -> Result<Self> {
        Self::new(samples, config.power)
    }

    /// Rates for the `Unique` smoothing modes
    pub fn with_smoothing(mut self, rates: Vec2k) -> Self {
        self.smoothing = rates;
        self
    }

    pub fn samples(&self) -> &[BlendSample] {
        &self.samples
    }

    pub fn positions(&self) -> &[Vec2k] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn smoothing(&self) -> Vec2k {
        self.smoothing
    }

    pub fn weights_at(&self, position: Vec2k) -> Result<WeightVector> {
        idw::compute_weights(&position, &self.positions, self.power)
    }

    #[cfg(feature = "parallel")]
    pub fn weights_at_par(&self, position: Vec2k) -> Result<WeightVector> {
        idw::compute_weights_par(&position, &self.positions, self.power)
    }
}

/// How the query position chases the desired position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum BlendSmoothing {
    /// Snap on every set
    #[default]
    None,
    /// State rate `x` on both axes
    Uniform,
    /// State rates per axis
    PerAxis,
    /// Blend-space rate `x` on both axes
    Unique,
    /// Blend-space rates per axis
    UniquePerAxis,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BlendConfig {
    pub smoothing: BlendSmoothing,
    pub smooth_rate: Vec2k,
    /// IDW falloff for libraries built from this config
    pub power: f32,
    pub play_rate: f32,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            smoothing: BlendSmoothing::None,
            smooth_rate: Vec2k::splat(5.0),
            power: DEFAULT_POWER,
            play_rate: 1.0,
        }
    }
}

impl BlendConfig {
    pub fn validate(&self) -> Result<()> {
        let rate_ok = |r: f32| !r.is_nan() && r >= 0.0;
        if !rate_ok(self.smooth_rate.x) || !rate_ok(self.smooth_rate.y) {
            return Err(LocomotionError::config("smooth rates must be non-negative"));
        }
        if !self.power.is_finite() || self.power < 0.0 {
            return Err(LocomotionError::config("falloff power must be finite and non-negative"));
        }
        if !self.play_rate.is_finite() || self.play_rate < 0.0 {
            return Err(LocomotionError::config("play rate must be finite and non-negative"));
        }
        Ok(())
    }
}

/// External mixer that consumes clip weights
pub trait WeightSink {
    fn input_count(&self) -> usize;
    fn set_input_weight(&mut self, index: usize, weight: f32);
}

impl WeightSink for [f32] {
    fn input_count(&self) -> usize {
        self.len()
    }

    fn set_input_weight(&mut self, index: usize, weight: f32) {
        self[index] = weight;
    }
}

impl WeightSink for Vec<f32> {
    fn input_count(&self) -> usize {
        self.len()
    }

    fn set_input_weight(&mut self, index: usize, weight: f32) {
        self[index] = weight;
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlendSnapshot {
    pub version: u32,
    pub position: Vec2k,
    pub desired: Vec2k,
    pub smoothing: BlendSmoothing,
    pub weights: Vec<f32>,
}

/// Per-instance query position and weights over a shared [`BlendSpace`]
#[derive(Debug, Clone)]
pub struct BlendSpaceState {
    space: Arc<BlendSpace>,
    position: Vec2k,
    desired: Vec2k,
    weights: WeightVector,
    /// Position the weights were last solved at
    solved_at: Vec2k,
    smoothing: BlendSmoothing,
    smooth_rate: Vec2k,
    play_rate: f32,
}

impl BlendSpaceState {
    /// Starts at the origin with weights already solved
    pub fn new(space: Arc<BlendSpace>) -> Result<Self> {
        Self::with_config(space, &BlendConfig::default())
    }

    pub fn with_config(space: Arc<BlendSpace>, config: &BlendConfig) -> Result<Self> {
        config.validate()?;
        let weights = space.weights_at(Vec2k::ZERO)?;
        Ok(Self {
            space,
            position: Vec2k::ZERO,
            desired: Vec2k::ZERO,
            weights,
            solved_at: Vec2k::ZERO,
            smoothing: config.smoothing,
            smooth_rate: config.smooth_rate,
            play_rate: config.play_rate,
        })
    }

    pub fn space(&self) -> &Arc<BlendSpace> {
        &self.space
    }

    pub fn position(&self) -> Vec2k {
        self.position
    }

    pub fn desired_position(&self) -> Vec2k {
        self.desired
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    /// `(clip_id, weight)` in library order
    pub fn clip_weights(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.space
            .samples()
            .iter()
            .zip(self.weights.as_slice())
            .map(|(s, &w)| (s.clip_id, w))
    }

    pub fn smoothing(&self) -> BlendSmoothing {
        self.smoothing
    }

    pub fn set_smoothing(&mut self, smoothing: BlendSmoothing) {
        self.smoothing = smoothing;
    }

    pub fn set_smooth_rate(&mut self, rate: Vec2k) {
        self.smooth_rate = rate;
    }

    pub fn set_play_rate(&mut self, play_rate: f32) {
        self.play_rate = play_rate;
    }

    /// New target; snaps and re-solves at once when smoothing is off
    ///
    /// Returns whether the weights changed.
    pub fn set_desired_position(&mut self, target: Vec2k) -> Result<bool> {
        if !target.is_finite() {
            return Err(LocomotionError::InvalidInput("blend position is not finite"));
        }
        if self.smoothing == BlendSmoothing::None {
            return self.set_position(target);
        }
        self.desired = target;
        Ok(false)
    }

    /// Snaps both the position and the target
    pub fn set_position(&mut self, position: Vec2k) -> Result<bool> {
        if !position.is_finite() {
            return Err(LocomotionError::InvalidInput("blend position is not finite"));
        }
        self.desired = position;
        if (position - self.position).length_sq() < POSITION_TOLERANCE_SQ {
            return Ok(false);
        }
        self.position = position;
        self.recompute()?;
        Ok(true)
    }

    pub fn set_position_x(&mut self, x: f32) -> Result<bool> {
        self.set_axis(x, self.position.y, libm::fabsf(x - self.position.x))
    }

    pub fn set_position_y(&mut self, y: f32) -> Result<bool> {
        self.set_axis(self.position.x, y, libm::fabsf(y - self.position.y))
    }

    fn set_axis(&mut self, x: f32, y: f32, change: f32) -> Result<bool> {
        let position = Vec2k::new(x, y);
        if !position.is_finite() {
            return Err(LocomotionError::InvalidInput("blend position is not finite"));
        }
        if change < AXIS_TOLERANCE {
            return Ok(false);
        }
        self.position = position;
        self.desired = position;
        self.recompute()?;
        Ok(true)
    }

    /// Moves the position toward the target; returns whether weights changed
    pub fn tick(&mut self, dt: f32) -> Result<bool> {
        if self.smoothing == BlendSmoothing::None
            || (self.position - self.desired).length_sq() < POSITION_TOLERANCE_SQ
        {
            return Ok(false);
        }
        let scaled = dt * self.play_rate;
        if !(scaled > 0.0) {
            return Ok(false);
        }

        let rates = match self.smoothing {
            BlendSmoothing::None => return Ok(false),
            BlendSmoothing::Uniform => Vec2k::splat(self.smooth_rate.x),
            BlendSmoothing::PerAxis => self.smooth_rate,
            BlendSmoothing::Unique => Vec2k::splat(self.space.smoothing().x),
            BlendSmoothing::UniquePerAxis => self.space.smoothing(),
        };
        let last = self.position;
        let ax = decay_alpha(rates.x, scaled);
        let ay = decay_alpha(rates.y, scaled);
        self.position = Vec2k::new(
            last.x + (self.desired.x - last.x) * ax,
            last.y + (self.desired.y - last.y) * ay,
        );

        // Small steps accumulate until they add up to a visible move
        if (self.position - self.solved_at).length_sq() < MOVE_TOLERANCE_SQ {
            return Ok(false);
        }
        self.recompute()?;
        Ok(true)
    }

    fn recompute(&mut self) -> Result<()> {
        idw::compute_weights_into(
            &self.position,
            self.space.positions(),
            self.space.power(),
            self.weights.as_mut_slice(),
        )?;
        self.solved_at = self.position;
        tracing::trace!(x = self.position.x, y = self.position.y, "blend weights recomputed");
        Ok(())
    }

    /// Pushes the weights into `sink`; extra inputs on either side are left alone
    pub fn apply_weights<S: WeightSink + ?Sized>(&self, sink: &mut S) {
        let count = sink.input_count().min(self.weights.len());
        for (i, &w) in self.weights.as_slice()[..count].iter().enumerate() {
            sink.set_input_weight(i, w);
        }
    }

    pub fn snapshot(&self) -> BlendSnapshot {
        BlendSnapshot {
            version: SNAPSHOT_VERSION,
            position: self.position,
            desired: self.desired,
            smoothing: self.smoothing,
            weights: self.weights.as_slice().to_vec(),
        }
    }
}
