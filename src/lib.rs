//! ALICE-Locomotion - Procedural trajectories and blend weights for motion matching
//!
//! Synthesizes the future trajectory a motion-matching search compares
//! against (straight lines, arcs and regime-switching combinations, smoothed
//! toward the ideal path every tick), and turns continuous blend-space
//! positions into normalized clip weights with inverse-distance weighting.
//!
//! Everything is tick-driven: the driver calls `tick(dt, ..)` once per frame
//! and reads samples and weights back.
//!
//! Author: Moroya Sakamoto

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod error;
pub mod vector;
pub mod smoothing;
pub mod idw;
pub mod regime;
pub mod predictor;
pub mod blend;
pub mod flow_field;
pub mod config;

pub use error::{LocomotionError, Result};
pub use vector::{Vec2k, Vec3k};
pub use idw::{compute_weights, compute_weights_into, interpolate, SamplePoint, WeightVector};
#[cfg(feature = "parallel")]
pub use idw::compute_weights_par;
pub use regime::{
    AgentPose, CompletionTiming, Regime, RegimeEvent, RegimePath, RegimeScheduler,
    ScheduleConfig, SchedulerState, StartBoundary, TurnOrientation,
};
pub use predictor::{
    LookaheadStep, PredictorConfig, PredictorSnapshot, RunSummary, Trajectory,
    TrajectoryPredictor, TrajectorySample, TrajectorySource,
};
pub use blend::{
    BlendConfig, BlendSample, BlendSmoothing, BlendSnapshot, BlendSpace, BlendSpaceState,
    WeightSink,
};
pub use flow_field::{velocity_samples, FieldGrid, FlowCell, FlowField, FlowSample};
pub use config::SimulationConfig;
