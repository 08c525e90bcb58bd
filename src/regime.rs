//! Regime scheduling - which motion primitive is driving the agent
//!
//! A regime is a `(radius, linear speed, turn orientation)` tuple. The
//! scheduler walks through three states:
//!
//! ```text
//! Inertia ──(agent crosses start boundary)──▶ Active(0)
//! Active(i) ──(dual mode, timer > switch_limit)──▶ Active(1 - i)
//! Active(_) ──(active time > completion_time)──▶ Done   (terminal)
//! ```
//!
//! Each time a regime takes over, its path is anchored at the agent's pose
//! so the new line or arc is tangent-continuous with the motion so far.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use alloc::format;
use alloc::vec::Vec;
use core::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{LocomotionError, Result};
use crate::vector::Vec3k;

/// Turn direction of a regime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum TurnOrientation {
    Left,
    Right,
    Straight,
}

impl TurnOrientation {
    /// Sign of the arc parameter rate: Left +1, Right -1, Straight 0
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
            Self::Straight => 0.0,
        }
    }

    pub fn is_turning(self) -> bool {
        self != Self::Straight
    }
}

/// One segment of a synthetic locomotion path
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Regime {
    /// Arc radius in meters; ignored when straight
    pub radius: f32,
    /// Speed along the path (m/s)
    pub linear_speed: f32,
    pub turn: TurnOrientation,
}

impl Regime {
    pub const fn straight(linear_speed: f32) -> Self {
        Self { radius: 0.0, linear_speed, turn: TurnOrientation::Straight }
    }

    pub const fn left(radius: f32, linear_speed: f32) -> Self {
        Self { radius, linear_speed, turn: TurnOrientation::Left }
    }

    pub const fn right(radius: f32, linear_speed: f32) -> Self {
        Self { radius, linear_speed, turn: TurnOrientation::Right }
    }

    /// Signed angular speed in rad/s (positive turns left)
    pub fn angular_speed(&self) -> f32 {
        if !self.turn.is_turning() {
            return 0.0;
        }
        self.turn.sign() * self.linear_speed / self.radius
    }

    /// Seconds for one full circle, `None` when straight or stationary
    pub fn turn_period(&self) -> Option<f32> {
        let w = libm::fabsf(self.angular_speed());
        if w > 0.0 { Some(TAU / w) } else { None }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.linear_speed.is_finite() || self.linear_speed < 0.0 {
            return Err(LocomotionError::config(format!(
                "linear speed must be finite and non-negative, got {}",
                self.linear_speed
            )));
        }
        if self.turn.is_turning() && !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(LocomotionError::config(format!(
                "turning regime needs a positive radius, got {}",
                self.radius
            )));
        }
        Ok(())
    }
}

/// Where the simulated agent is and which way it faces
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentPose {
    pub position: Vec3k,
    /// Yaw in degrees (0 = +z)
    pub heading: f32,
}

impl AgentPose {
    pub const fn new(position: Vec3k, heading: f32) -> Self {
        Self { position, heading }
    }
}

/// Ideal path for one regime, parameterized by seconds since its anchor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RegimePath {
    Line {
        origin: Vec3k,
        /// Unit ground-plane direction
        direction: Vec3k,
        speed: f32,
    },
    Arc {
        pivot: Vec3k,
        radius: f32,
        /// Arc parameter at t = 0, radians
        phase: f32,
        /// Signed rad/s; positive turns left
        angular_speed: f32,
    },
}

impl RegimePath {
    /// Path for `regime` that starts at `pose` heading the way it faces
    ///
    /// Left arcs put the pivot on the heading's left normal, right arcs on
    /// its right normal, so the arc leaves the pose along the heading.
    pub fn tangent_to(regime: &Regime, pose: AgentPose) -> Self {
        let heading = Vec3k::from_yaw(pose.heading);
        if !regime.turn.is_turning() {
            return Self::Line {
                origin: pose.position,
                direction: heading,
                speed: regime.linear_speed,
            };
        }
        let pivot = pose.position + heading.left_normal().scale(regime.turn.sign() * regime.radius);
        let offset = pose.position - pivot;
        Self::Arc {
            pivot,
            radius: regime.radius,
            phase: libm::atan2f(offset.z, offset.x),
            angular_speed: regime.angular_speed(),
        }
    }

    pub fn position_at(&self, t: f32) -> Vec3k {
        match *self {
            Self::Line { origin, direction, speed } => origin + direction.scale(speed * t),
            Self::Arc { pivot, radius, phase, angular_speed } => {
                let theta = phase + angular_speed * t;
                pivot + Vec3k::new(radius * libm::cosf(theta), 0.0, radius * libm::sinf(theta))
            }
        }
    }

    /// Direction of travel at `t`, yaw in degrees
    pub fn heading_at(&self, t: f32) -> f32 {
        match *self {
            Self::Line { direction, .. } => direction.yaw_degrees(),
            Self::Arc { phase, angular_speed, .. } => {
                let theta = phase + angular_speed * t;
                let tangent = Vec3k::new(-libm::sinf(theta), 0.0, libm::cosf(theta));
                tangent.scale(angular_speed).yaw_degrees()
            }
        }
    }

    pub fn pivot(&self) -> Option<Vec3k> {
        match *self {
            Self::Arc { pivot, .. } => Some(pivot),
            Self::Line { .. } => None,
        }
    }
}

/// Plane the agent has to cross before the synthetic path begins
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StartBoundary {
    pub point: Vec3k,
    /// Points into the region where the path runs; also the run-up direction
    pub normal: Vec3k,
}

impl StartBoundary {
    pub fn crossed_by(&self, position: Vec3k) -> bool {
        (position - self.point).dot(self.normal) >= 0.0
    }
}

impl Default for StartBoundary {
    fn default() -> Self {
        Self { point: Vec3k::ZERO, normal: Vec3k::FORWARD }
    }
}

/// Timing thresholds derived from the primary regime
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompletionTiming {
    /// Active time after which the motion counts as settled
    pub settling_time: f32,
    /// Active time after which the run is done
    pub completion_time: f32,
}

impl CompletionTiming {
    /// Straight regimes use a fixed completion time and settle at once.
    /// Turning regimes run `turns` full circles, padded by `tolerance`.
    pub fn for_regime(regime: &Regime, turns: f32, tolerance: f32, straight_completion: f32) -> Self {
        match regime.turn_period() {
            Some(period) => Self {
                settling_time: period * tolerance,
                completion_time: period * turns * tolerance,
            },
            None => Self { settling_time: 0.0, completion_time: straight_completion },
        }
    }
}

/// Immutable schedule configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ScheduleConfig {
    /// One regime, or two in dual mode
    pub regimes: Vec<Regime>,
    pub dual: bool,
    /// Seconds between regime swaps in dual mode
    pub switch_limit: f32,
    /// Full circles a turning regime runs before completion
    pub turns: f32,
    /// Safety multiplier on turning durations
    pub settle_tolerance: f32,
    pub straight_completion_time: f32,
    pub start_boundary: StartBoundary,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            regimes: alloc::vec![Regime::straight(1.5)],
            dual: false,
            switch_limit: 5.0,
            turns: 1.0,
            settle_tolerance: 1.2,
            straight_completion_time: 5.0,
            start_boundary: StartBoundary::default(),
        }
    }
}

impl ScheduleConfig {
    pub fn single(regime: Regime) -> Self {
        Self { regimes: alloc::vec![regime], ..Self::default() }
    }

    pub fn dual(first: Regime, second: Regime, switch_limit: f32) -> Self {
        Self {
            regimes: alloc::vec![first, second],
            dual: true,
            switch_limit,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.regimes.is_empty() {
            return Err(LocomotionError::config("schedule has no regime"));
        }
        if self.dual && self.regimes.len() < 2 {
            return Err(LocomotionError::config("dual mode needs a second regime"));
        }
        for regime in &self.regimes {
            regime.validate()?;
        }
        if self.dual && !(self.switch_limit.is_finite() && self.switch_limit > 0.0) {
            return Err(LocomotionError::config(format!(
                "switch limit must be positive in dual mode, got {}",
                self.switch_limit
            )));
        }
        if !(self.turns.is_finite() && self.turns > 0.0) {
            return Err(LocomotionError::config("turns must be positive"));
        }
        if !(self.settle_tolerance.is_finite() && self.settle_tolerance > 0.0) {
            return Err(LocomotionError::config("settle tolerance must be positive"));
        }
        if !(self.straight_completion_time.is_finite() && self.straight_completion_time > 0.0) {
            return Err(LocomotionError::config("straight completion time must be positive"));
        }
        if self.start_boundary.normal.length_sq() < 1e-12 {
            return Err(LocomotionError::config("start boundary normal is zero"));
        }
        Ok(())
    }

    /// Thresholds of the primary regime; an empty schedule times like a straight one
    pub fn timing(&self) -> CompletionTiming {
        let primary = self.regimes.first().copied().unwrap_or(Regime::straight(0.0));
        CompletionTiming::for_regime(&primary, self.turns, self.settle_tolerance, self.straight_completion_time)
    }
}

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SchedulerState {
    /// Run-up before the start boundary
    Inertia,
    /// Following the regime at this index
    Active(usize),
    /// Terminal
    Done,
}

/// Discrete transition reported by [`RegimeScheduler::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegimeEvent {
    Started,
    Switched { from: usize, to: usize },
    /// Fired exactly once per run
    Completed,
}

/// Regime state machine
#[derive(Debug, Clone)]
pub struct RegimeScheduler {
    config: ScheduleConfig,
    timing: CompletionTiming,
    state: SchedulerState,
    /// Switch timer; carries the remainder past the limit
    elapsed_in_regime: f32,
    /// Time spent Active
    total_elapsed: f32,
    path: RegimePath,
    /// Seconds since `path` was anchored
    path_time: f32,
    agent: AgentPose,
    switch_count: u32,
}

impl RegimeScheduler {
    pub fn new(config: ScheduleConfig) -> Result<Self> {
        config.validate()?;
        let timing = config.timing();
        let agent = AgentPose::default();
        let path = Self::run_up_path(&config, agent);
        tracing::debug!(
            regimes = config.regimes.len(),
            dual = config.dual,
            completion = timing.completion_time,
            "regime scheduler ready"
        );
        Ok(Self {
            config,
            timing,
            state: SchedulerState::Inertia,
            elapsed_in_regime: 0.0,
            total_elapsed: 0.0,
            path,
            path_time: 0.0,
            agent,
            switch_count: 0,
        })
    }

    fn run_up_path(config: &ScheduleConfig, agent: AgentPose) -> RegimePath {
        RegimePath::Line {
            origin: agent.position,
            direction: config.start_boundary.normal.flat().normalize(),
            speed: config.regimes[0].linear_speed,
        }
    }

    /// Back to Inertia, as if freshly built
    pub fn reset(&mut self) {
        self.state = SchedulerState::Inertia;
        self.elapsed_in_regime = 0.0;
        self.total_elapsed = 0.0;
        self.path_time = 0.0;
        self.switch_count = 0;
        self.agent = AgentPose::default();
        self.path = Self::run_up_path(&self.config, self.agent);
    }

    /// Advance by `dt` seconds with the agent at `pose`
    ///
    /// Returns the transition that happened this tick, if any. Completion
    /// wins over a switch due in the same tick. Non-positive `dt` and ticks
    /// after Done change nothing.
    pub fn advance(&mut self, dt: f32, pose: AgentPose) -> Option<RegimeEvent> {
        if !(dt > 0.0) || self.state == SchedulerState::Done {
            return None;
        }
        self.agent = pose;

        match self.state {
            SchedulerState::Inertia => {
                if !self.config.start_boundary.crossed_by(pose.position) {
                    self.path = Self::run_up_path(&self.config, pose);
                    return None;
                }
                self.state = SchedulerState::Active(0);
                self.elapsed_in_regime = 0.0;
                self.total_elapsed = 0.0;
                self.anchor_path(0, pose);
                tracing::info!(x = pose.position.x, z = pose.position.z, "trajectory started");
                Some(RegimeEvent::Started)
            }
            SchedulerState::Active(index) => {
                self.total_elapsed += dt;
                self.elapsed_in_regime += dt;
                self.path_time += dt;

                if self.total_elapsed > self.timing.completion_time {
                    self.state = SchedulerState::Done;
                    tracing::info!(elapsed = self.total_elapsed, switches = self.switch_count, "trajectory complete");
                    return Some(RegimeEvent::Completed);
                }

                if self.config.dual && self.elapsed_in_regime > self.config.switch_limit {
                    self.elapsed_in_regime -= self.config.switch_limit;
                    let next = 1 - index;
                    self.state = SchedulerState::Active(next);
                    self.switch_count += 1;
                    self.anchor_path(next, pose);
                    tracing::info!(from = index, to = next, at = self.total_elapsed, "regime switched");
                    return Some(RegimeEvent::Switched { from: index, to: next });
                }
                None
            }
            SchedulerState::Done => None,
        }
    }

    fn anchor_path(&mut self, index: usize, pose: AgentPose) {
        self.path = RegimePath::tangent_to(&self.config.regimes[index], pose);
        self.path_time = 0.0;
    }

    /// World-space pose the agent should have `lookahead` seconds from now
    pub fn ideal_pose(&self, lookahead: f32) -> AgentPose {
        match self.state {
            SchedulerState::Done => self.agent,
            SchedulerState::Inertia => {
                let t = lookahead;
                AgentPose::new(self.path.position_at(t), self.path.heading_at(t))
            }
            SchedulerState::Active(_) => {
                let t = self.path_time + lookahead;
                AgentPose::new(self.path.position_at(t), self.path.heading_at(t))
            }
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == SchedulerState::Done
    }

    /// Index of the regime in charge (0 before the run starts)
    pub fn active_index(&self) -> usize {
        match self.state {
            SchedulerState::Active(i) => i,
            _ => 0,
        }
    }

    pub fn active_regime(&self) -> &Regime {
        &self.config.regimes[self.active_index()]
    }

    pub fn has_inertia(&self) -> bool {
        self.state == SchedulerState::Inertia
    }

    pub fn elapsed_in_regime(&self) -> f32 {
        self.elapsed_in_regime
    }

    pub fn total_elapsed(&self) -> f32 {
        self.total_elapsed
    }

    pub fn switch_count(&self) -> u32 {
        self.switch_count
    }

    pub fn timing(&self) -> CompletionTiming {
        self.timing
    }

    /// Active long enough for measurements to be meaningful
    pub fn is_settled(&self) -> bool {
        !self.has_inertia() && self.total_elapsed > self.timing.settling_time
    }

    pub fn path(&self) -> &RegimePath {
        &self.path
    }

    pub fn pivot(&self) -> Option<Vec3k> {
        self.path.pivot()
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Recommended spawn pose: on the first regime's circle, `run_up`
    /// meters behind the start boundary, facing along it
    pub fn spawn_pose(&self, run_up: f32) -> AgentPose {
        let boundary = self.config.start_boundary;
        let normal = boundary.normal.flat().normalize();
        let regime = &self.config.regimes[0];
        // A left arc around the boundary point starts on its right side
        let lateral = normal.left_normal().scale(-regime.turn.sign() * regime.radius);
        AgentPose::new(boundary.point + lateral - normal.scale(run_up), normal.yaw_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.25;

    fn started(config: ScheduleConfig) -> RegimeScheduler {
        let mut s = RegimeScheduler::new(config).unwrap();
        let pose = s.spawn_pose(0.0);
        assert_eq!(s.advance(DT, pose), Some(RegimeEvent::Started));
        s
    }

    /// Ticks with the agent following the ideal path exactly
    fn follow(s: &mut RegimeScheduler, dt: f32) -> Option<RegimeEvent> {
        let pose = s.ideal_pose(dt);
        s.advance(dt, pose)
    }

    #[test]
    fn test_angular_speed_sign() {
        assert!((Regime::left(3.0, 1.5).angular_speed() - 0.5).abs() < 1e-6);
        assert!((Regime::right(3.0, 1.5).angular_speed() + 0.5).abs() < 1e-6);
        assert_eq!(Regime::straight(2.0).angular_speed(), 0.0);
        assert!(Regime::straight(2.0).turn_period().is_none());
    }

    #[test]
    fn test_zero_radius_turn_rejected() {
        let err = RegimeScheduler::new(ScheduleConfig::single(Regime::left(0.0, 1.0))).unwrap_err();
        assert!(matches!(err, LocomotionError::InvalidConfiguration(_)));
        assert!(RegimeScheduler::new(ScheduleConfig::single(Regime::right(-2.0, 1.0))).is_err());
        // Radius is irrelevant for a straight regime
        assert!(RegimeScheduler::new(ScheduleConfig::single(Regime::straight(1.0))).is_ok());
    }

    #[test]
    fn test_dual_without_second_regime_rejected() {
        let mut config = ScheduleConfig::single(Regime::left(3.0, 1.5));
        config.dual = true;
        assert!(RegimeScheduler::new(config).is_err());
    }

    #[test]
    fn test_left_arc_leaves_along_heading() {
        let pose = AgentPose::new(Vec3k::new(3.0, 0.0, 0.0), 0.0);
        let path = RegimePath::tangent_to(&Regime::left(3.0, 1.5), pose);
        let pivot = path.pivot().unwrap();
        assert!(pivot.length() < 1e-5, "pivot {pivot:?}");
        let ahead = path.position_at(0.1);
        assert!(ahead.z > 0.0);
        assert!(ahead.x < 3.0);
        assert!(path.heading_at(0.0).abs() < 1e-3);
        // Turning left from +z swings the heading toward -x
        assert!(path.heading_at(1.0) < 0.0);
    }

    #[test]
    fn test_right_arc_leaves_along_heading() {
        let pose = AgentPose::new(Vec3k::new(-3.0, 0.0, 0.0), 0.0);
        let path = RegimePath::tangent_to(&Regime::right(3.0, 1.5), pose);
        assert!(path.pivot().unwrap().length() < 1e-5);
        assert!(path.position_at(0.1).z > 0.0);
        assert!(path.heading_at(1.0) > 0.0);
    }

    #[test]
    fn test_arc_keeps_radius_and_speed() {
        let pose = AgentPose::new(Vec3k::new(1.0, 0.0, 2.0), 40.0);
        let path = RegimePath::tangent_to(&Regime::left(2.0, 1.0), pose);
        let pivot = path.pivot().unwrap();
        for k in 0..10 {
            let p = path.position_at(k as f32 * 0.7);
            assert!((p.distance(pivot) - 2.0).abs() < 1e-4);
        }
        let step = path.position_at(0.01).distance(path.position_at(0.0));
        assert!((step - 0.01).abs() < 1e-4);
    }

    #[test]
    fn test_inertia_until_boundary() {
        let mut s = RegimeScheduler::new(ScheduleConfig::single(Regime::straight(2.0))).unwrap();
        let behind = AgentPose::new(Vec3k::new(0.0, 0.0, -10.0), 0.0);
        assert_eq!(s.advance(DT, behind), None);
        assert!(s.has_inertia());
        let ahead = s.ideal_pose(1.0);
        assert!((ahead.position.z - (-8.0)).abs() < 1e-5);

        let crossed = AgentPose::new(Vec3k::new(0.0, 0.0, 0.01), 0.0);
        assert_eq!(s.advance(DT, crossed), Some(RegimeEvent::Started));
        assert_eq!(s.state(), SchedulerState::Active(0));
        assert_eq!(s.total_elapsed(), 0.0);
        // Not re-enterable
        assert_eq!(s.advance(DT, behind), None);
        assert_eq!(s.state(), SchedulerState::Active(0));
    }

    #[test]
    fn test_dual_toggles_twice_after_two_limits() {
        let config = ScheduleConfig::dual(Regime::left(3.0, 1.5), Regime::left(5.0, 1.5), 1.0);
        let mut s = started(config);
        let mut toggles = 0;
        // 2L + one tick
        for _ in 0..9 {
            if let Some(RegimeEvent::Switched { .. }) = follow(&mut s, DT) {
                toggles += 1;
            }
        }
        assert_eq!(toggles, 2);
        assert_eq!(s.switch_count(), 2);
        assert_eq!(s.active_index(), 0);
    }

    #[test]
    fn test_single_mode_never_switches() {
        let mut config = ScheduleConfig::single(Regime::left(3.0, 1.5));
        config.switch_limit = 0.5;
        let mut s = started(config);
        for _ in 0..20 {
            assert!(!matches!(follow(&mut s, DT), Some(RegimeEvent::Switched { .. })));
        }
        assert_eq!(s.active_index(), 0);
    }

    #[test]
    fn test_switch_recenters_pivot_on_agent() {
        let config = ScheduleConfig::dual(Regime::left(3.0, 1.5), Regime::left(6.0, 1.5), 1.0);
        let mut s = started(config);
        let mut switched_at = None;
        for _ in 0..6 {
            let pose = s.ideal_pose(DT);
            if let Some(RegimeEvent::Switched { .. }) = s.advance(DT, pose) {
                switched_at = Some(pose);
                break;
            }
        }
        let pose = switched_at.expect("switch within six ticks");
        let pivot = s.pivot().unwrap();
        assert!((pose.position.distance(pivot) - 6.0).abs() < 1e-3);
        // Path continues from the agent, heading unchanged
        assert!(s.ideal_pose(0.0).position.distance(pose.position) < 1e-4);
        let dh = crate::smoothing::delta_angle(pose.heading, s.ideal_pose(0.0).heading);
        assert!(dh.abs() < 1e-2);
    }

    #[test]
    fn test_left_turn_completes_once() {
        let config = ScheduleConfig::single(Regime::left(3.0, 1.5));
        let expected = TAU / 0.5 * 1.2;
        let mut s = started(config);
        assert!((s.timing().completion_time - expected).abs() < 1e-3);

        let mut completions = 0;
        for _ in 0..200 {
            if follow(&mut s, 0.1) == Some(RegimeEvent::Completed) {
                completions += 1;
                assert!(s.total_elapsed() > expected);
            }
        }
        assert_eq!(completions, 1);
        assert!(s.is_done());
    }

    #[test]
    fn test_straight_timing() {
        let timing = ScheduleConfig::single(Regime::straight(2.0)).timing();
        assert_eq!(timing.settling_time, 0.0);
        assert_eq!(timing.completion_time, 5.0);
    }

    #[test]
    fn test_settled_after_threshold() {
        let mut s = started(ScheduleConfig::single(Regime::left(1.0, 1.0)));
        let settle = s.timing().settling_time;
        assert!(!s.is_settled());
        while s.total_elapsed() <= settle {
            follow(&mut s, 0.1);
        }
        assert!(s.is_settled());
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut s = started(ScheduleConfig::single(Regime::left(3.0, 1.5)));
        let before = s.total_elapsed();
        assert_eq!(s.advance(0.0, s.ideal_pose(0.0)), None);
        assert_eq!(s.total_elapsed(), before);
    }

    #[test]
    fn test_reset_returns_to_inertia() {
        let mut s = started(ScheduleConfig::single(Regime::straight(1.0)));
        follow(&mut s, DT);
        s.reset();
        assert!(s.has_inertia());
        assert_eq!(s.total_elapsed(), 0.0);
        assert_eq!(s.switch_count(), 0);
    }

    #[test]
    fn test_spawn_pose_sits_on_first_circle() {
        let s = RegimeScheduler::new(ScheduleConfig::single(Regime::left(3.0, 1.5))).unwrap();
        let pose = s.spawn_pose(10.0);
        assert!((pose.position.x - 3.0).abs() < 1e-5);
        assert!((pose.position.z + 10.0).abs() < 1e-5);
        assert!(pose.heading.abs() < 1e-4);
        let r = RegimeScheduler::new(ScheduleConfig::single(Regime::right(3.0, 1.5))).unwrap();
        assert!((r.spawn_pose(10.0).position.x + 3.0).abs() < 1e-5);
    }
}
