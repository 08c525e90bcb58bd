//! Predictor - future trajectory synthesis (per-tick)
//!
//! Keeps a fixed-length sequence of future samples relative to the agent.
//! Every tick the ideal path is evaluated at increasing lookahead times and
//! the previous samples are pulled toward it with exponential decay:
//!
//! ```text
//! pct     = i / N
//! alpha   = 1 - e^(-position_bias · pct · dt)
//! new[i]  = new[i-1] + lerp(old[i] - old[i-1], ideal[i] - new[i-1], alpha)
//! ```
//!
//! The decay rate is scaled by how far along the buffer a sample sits.
//! Facing angles follow the direction of the smoothed path with the same
//! scheme at `direction_bias`.
//! Sample 0 is the anchor: always at the local origin, facing 0.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{LocomotionError, Result};
use crate::regime::{AgentPose, RegimeEvent, RegimeScheduler, SchedulerState};
use crate::smoothing::{decay_alpha, lerp_angle, wrap_degrees};
use crate::vector::Vec3k;

/// Bumped whenever a snapshot struct changes shape
pub const SNAPSHOT_VERSION: u32 = 1;

/// One predicted point, relative to the agent
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrajectorySample {
    pub position: Vec3k,
    /// Yaw in degrees; accumulates while ticking, wrapped into (-180, 180] in snapshots
    pub facing: f32,
}

/// Where the agent ideally is `lookahead` seconds from now (world space)
pub trait TrajectorySource {
    fn ideal_position(&self, lookahead: f32) -> Vec3k;
}

impl<F: Fn(f32) -> Vec3k> TrajectorySource for F {
    fn ideal_position(&self, lookahead: f32) -> Vec3k {
        self(lookahead)
    }
}

impl TrajectorySource for RegimeScheduler {
    fn ideal_position(&self, lookahead: f32) -> Vec3k {
        self.ideal_pose(lookahead).position
    }
}

/// Spacing of lookahead times along the trajectory
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum LookaheadStep {
    /// Sample i looks `dt * i` ahead
    FrameDelta,
    /// Sample i looks `interval * i` ahead
    Fixed(f32),
}

impl LookaheadStep {
    #[inline]
    pub fn time_at(self, index: usize, dt: f32) -> f32 {
        match self {
            Self::FrameDelta => dt * index as f32,
            Self::Fixed(interval) => interval * index as f32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PredictorConfig {
    /// N, including the anchor
    pub sample_count: usize,
    /// Positional responsiveness; `f32::INFINITY` snaps
    pub position_bias: f32,
    /// Rotational responsiveness
    pub direction_bias: f32,
    pub lookahead: LookaheadStep,
    /// A sample whose outgoing segment is shorter than this (squared) keeps its facing
    pub min_facing_motion_sq: f32,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            sample_count: 12,
            position_bias: 15.0,
            direction_bias: 10.0,
            lookahead: LookaheadStep::FrameDelta,
            min_facing_motion_sq: 1e-4,
        }
    }
}

impl PredictorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_count < 2 {
            return Err(LocomotionError::config(format!(
                "trajectory needs at least 2 samples, got {}",
                self.sample_count
            )));
        }
        // Infinity is allowed and means "snap"
        if self.position_bias.is_nan() || self.position_bias < 0.0 {
            return Err(LocomotionError::config("position bias must be non-negative"));
        }
        if self.direction_bias.is_nan() || self.direction_bias < 0.0 {
            return Err(LocomotionError::config("direction bias must be non-negative"));
        }
        if let LookaheadStep::Fixed(interval) = self.lookahead {
            if !(interval.is_finite() && interval > 0.0) {
                return Err(LocomotionError::config("fixed lookahead interval must be positive"));
            }
        }
        if !(self.min_facing_motion_sq >= 0.0) {
            return Err(LocomotionError::config("minimum facing motion must be non-negative"));
        }
        Ok(())
    }
}

/// Fixed-length sample buffer, independent of where the ideal path comes from
#[derive(Debug, Clone)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
    /// Positions of the tick being built
    scratch: Vec<Vec3k>,
}

impl Trajectory {
    pub fn new(sample_count: usize) -> Self {
        Self {
            samples: vec![TrajectorySample::default(); sample_count],
            scratch: vec![Vec3k::ZERO; sample_count],
        }
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Every sample back onto the anchor
    pub fn collapse(&mut self) {
        self.samples.fill(TrajectorySample::default());
    }

    /// Pulls the samples toward `source`, expressed relative to `anchor`
    ///
    /// A non-positive `dt` leaves the buffer untouched.
    pub fn blend_toward<S: TrajectorySource + ?Sized>(
        &mut self,
        dt: f32,
        anchor: Vec3k,
        source: &S,
        config: &PredictorConfig,
    ) {
        if !(dt > 0.0) || self.samples.is_empty() {
            return;
        }
        let n = self.samples.len();
        let count = n as f32;

        self.scratch[0] = Vec3k::ZERO;
        for i in 1..n {
            let pct = i as f32 / count;
            let ideal = source.ideal_position(config.lookahead.time_at(i, dt)) - anchor;
            let prev_new = self.scratch[i - 1];
            let old_step = self.samples[i].position - self.samples[i - 1].position;
            let ideal_step = ideal - prev_new;
            let alpha = decay_alpha(config.position_bias * pct, dt);
            self.scratch[i] = prev_new + old_step.lerp(ideal_step, alpha);
        }

        self.samples[0] = TrajectorySample::default();
        for i in 1..n {
            let pct = i as f32 / count;
            let to = self.scratch[i];
            // Outgoing segment; the last sample reuses its incoming one
            let heading = if i + 1 < n {
                self.scratch[i + 1] - to
            } else {
                to - self.scratch[i - 1]
            };

            let sample = &mut self.samples[i];
            sample.position = to;
            if heading.flat().length_sq() > config.min_facing_motion_sq {
                let desired = heading.yaw_degrees();
                let alpha = decay_alpha(config.direction_bias * pct, dt);
                sample.facing = lerp_angle(sample.facing, desired, alpha);
            }
        }
    }
}

/// Read-only view of predictor state, for debug dumps
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PredictorSnapshot {
    pub version: u32,
    pub state: SchedulerState,
    pub active_index: usize,
    pub elapsed_in_regime: f32,
    pub total_elapsed: f32,
    pub switch_count: u32,
    pub settled: bool,
    pub ticks: u64,
    pub samples: Vec<TrajectorySample>,
}

/// Per-regime entry of a [`RunSummary`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegimeSummary {
    pub radius: f32,
    pub linear_speed: f32,
    /// Degrees per second, signed like the arc parameter
    pub angular_speed_deg: f32,
}

/// What a finished (or abandoned) run did
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    pub total_active_time: f32,
    pub switch_count: u32,
    pub completed: bool,
    pub ticks: u64,
    pub regimes: Vec<RegimeSummary>,
}

/// Scheduler-driven trajectory predictor
///
/// ```text
/// let mut p = TrajectoryPredictor::new(config, scheduler)?;
/// loop {
///     if p.tick(dt, agent_pose) == Some(RegimeEvent::Completed) { break; }
///     search(p.samples());
/// }
/// let summary = p.shutdown();
/// ```
#[derive(Debug, Clone)]
pub struct TrajectoryPredictor {
    config: PredictorConfig,
    scheduler: RegimeScheduler,
    trajectory: Trajectory,
    ticks: u64,
    completed: bool,
}

impl TrajectoryPredictor {
    pub fn new(config: PredictorConfig, scheduler: RegimeScheduler) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            samples = config.sample_count,
            position_bias = config.position_bias,
            direction_bias = config.direction_bias,
            "trajectory predictor ready"
        );
        Ok(Self {
            trajectory: Trajectory::new(config.sample_count),
            config,
            scheduler,
            ticks: 0,
            completed: false,
        })
    }

    /// Advances the scheduler and re-predicts; `pose` is the agent now
    ///
    /// Returns the scheduler transition of this tick. `dt <= 0` is a no-op.
    pub fn tick(&mut self, dt: f32, pose: AgentPose) -> Option<RegimeEvent> {
        if !(dt > 0.0) {
            tracing::debug!(dt, "ignoring degenerate tick");
            return None;
        }
        let event = self.scheduler.advance(dt, pose);
        if event == Some(RegimeEvent::Completed) {
            self.completed = true;
        }
        self.trajectory
            .blend_toward(dt, pose.position, &self.scheduler, &self.config);
        self.ticks += 1;
        event
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        self.trajectory.samples()
    }

    pub fn scheduler(&self) -> &RegimeScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn is_done(&self) -> bool {
        self.scheduler.is_done()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Fresh run with the same configuration
    pub fn reset(&mut self) {
        self.scheduler.reset();
        self.trajectory.collapse();
        self.ticks = 0;
        self.completed = false;
    }

    pub fn snapshot(&self) -> PredictorSnapshot {
        PredictorSnapshot {
            version: SNAPSHOT_VERSION,
            state: self.scheduler.state(),
            active_index: self.scheduler.active_index(),
            elapsed_in_regime: self.scheduler.elapsed_in_regime(),
            total_elapsed: self.scheduler.total_elapsed(),
            switch_count: self.scheduler.switch_count(),
            settled: self.scheduler.is_settled(),
            ticks: self.ticks,
            samples: self
                .trajectory
                .samples()
                .iter()
                .map(|s| TrajectorySample { position: s.position, facing: wrap_degrees(s.facing) })
                .collect(),
        }
    }

    pub fn shutdown(self) -> RunSummary {
        let regimes = self
            .scheduler
            .config()
            .regimes
            .iter()
            .map(|r| RegimeSummary {
                radius: r.radius,
                linear_speed: r.linear_speed,
                angular_speed_deg: r.angular_speed().to_degrees(),
            })
            .collect();
        let summary = RunSummary {
            total_active_time: self.scheduler.total_elapsed(),
            switch_count: self.scheduler.switch_count(),
            completed: self.completed,
            ticks: self.ticks,
            regimes,
        };
        tracing::info!(
            active = summary.total_active_time,
            switches = summary.switch_count,
            completed = summary.completed,
            "trajectory predictor shut down"
        );
        summary
    }
}
