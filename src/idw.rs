//! Inverse-distance weighting
//!
//! Converts a query point into a normalized weight vector over a fixed set
//! of sample points:
//!
//! ```text
//! w_i = d(q, s_i)^-k / Σ_j d(q, s_j)^-k
//! ```
//!
//! A query within [`COINCIDENT_EPSILON`] of a sample passes through exactly:
//! that sample gets weight 1 and every other sample 0. The same routine
//! drives blend-space clip weights and flow-field velocity interpolation.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Add, Index, Mul};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{LocomotionError, Result};
use crate::vector::{Vec2k, Vec3k};

/// Distance below which a query counts as sitting on a sample
pub const COINCIDENT_EPSILON: f32 = 1e-5;

/// Default falloff power for blend spaces
pub const DEFAULT_POWER: f32 = 2.0;

/// Point in a weighting space
pub trait SamplePoint {
    fn distance_to(&self, other: &Self) -> f32;
}

impl SamplePoint for f32 {
    fn distance_to(&self, other: &Self) -> f32 {
        libm::fabsf(self - other)
    }
}

impl SamplePoint for Vec2k {
    fn distance_to(&self, other: &Self) -> f32 {
        self.distance(*other)
    }
}

impl SamplePoint for Vec3k {
    fn distance_to(&self, other: &Self) -> f32 {
        self.distance(*other)
    }
}

impl<const N: usize> SamplePoint for [f32; N] {
    fn distance_to(&self, other: &Self) -> f32 {
        let mut sum = 0.0;
        for (a, b) in self.iter().zip(other.iter()) {
            let d = a - b;
            sum += d * d;
        }
        libm::sqrtf(sum)
    }
}

/// Normalized, non-negative weights; one entry per sample
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightVector {
    weights: Vec<f32>,
}

impl WeightVector {
    /// All weight on `index`
    pub fn one_hot(len: usize, index: usize) -> Self {
        let mut weights = vec![0.0; len];
        if index < len {
            weights[index] = 1.0;
        }
        Self { weights }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.weights
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.weights.get(index).copied()
    }

    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Heaviest entry; the lowest index wins ties
    pub fn dominant(&self) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &w) in self.weights.iter().enumerate() {
            match best {
                Some((_, bw)) if bw >= w => {}
                _ => best = Some((i, w)),
            }
        }
        best
    }

    /// Sparse `(index, weight)` pairs strictly above `epsilon`
    pub fn active(&self, epsilon: f32) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.weights
            .iter()
            .copied()
            .enumerate()
            .filter(move |&(_, w)| w > epsilon)
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.weights
    }
}

impl Index<usize> for WeightVector {
    type Output = f32;
    fn index(&self, index: usize) -> &f32 {
        &self.weights[index]
    }
}

/// Weights for `query` against `samples` with falloff power `power`
pub fn compute_weights<P: SamplePoint>(
    query: &P,
    samples: &[P],
    power: f32,
) -> Result<WeightVector> {
    let mut weights = vec![0.0; samples.len()];
    compute_weights_into(query, samples, power, &mut weights)?;
    Ok(WeightVector { weights })
}

/// Non-allocating variant; `out` must hold exactly one slot per sample
pub fn compute_weights_into<P: SamplePoint>(
    query: &P,
    samples: &[P],
    power: f32,
    out: &mut [f32],
) -> Result<()> {
    check_inputs(samples.len(), power, out.len())?;
    for (slot, sample) in out.iter_mut().zip(samples) {
        *slot = query.distance_to(sample);
    }
    weights_from_distances(out, power)
}

/// Data-parallel variant; per-sample distances run on the rayon pool and
/// the normalization pass joins on the calling thread
#[cfg(feature = "parallel")]
pub fn compute_weights_par<P: SamplePoint + Sync>(
    query: &P,
    samples: &[P],
    power: f32,
) -> Result<WeightVector> {
    use rayon::prelude::*;

    check_inputs(samples.len(), power, samples.len())?;
    let mut weights: Vec<f32> = samples.par_iter().map(|s| query.distance_to(s)).collect();
    weights_from_distances(&mut weights, power)?;
    Ok(WeightVector { weights })
}

/// Weighted average of per-sample payload values
pub fn interpolate<P, V>(query: &P, samples: &[P], values: &[V], power: f32) -> Result<V>
where
    P: SamplePoint,
    V: Copy + Add<Output = V> + Mul<f32, Output = V>,
{
    if values.len() != samples.len() {
        return Err(LocomotionError::InvalidInput("payload count differs from sample count"));
    }
    let weights = compute_weights(query, samples, power)?;
    let mut acc = values[0] * weights[0];
    for (value, &w) in values.iter().zip(weights.as_slice()).skip(1) {
        acc = acc + *value * w;
    }
    Ok(acc)
}

fn check_inputs(sample_count: usize, power: f32, out_len: usize) -> Result<()> {
    if sample_count == 0 {
        return Err(LocomotionError::InvalidInput("no samples to weight"));
    }
    if !power.is_finite() || power < 0.0 {
        return Err(LocomotionError::InvalidInput("power must be finite and non-negative"));
    }
    if out_len != sample_count {
        return Err(LocomotionError::InvalidInput("weight buffer length differs from sample count"));
    }
    Ok(())
}

/// Turns a buffer of distances into normalized weights in place
fn weights_from_distances(buf: &mut [f32], power: f32) -> Result<()> {
    let mut nearest = 0;
    for (i, &d) in buf.iter().enumerate() {
        if d.is_nan() {
            return Err(LocomotionError::InvalidInput("query or sample is not a number"));
        }
        if d < buf[nearest] {
            nearest = i;
        }
    }

    if let Some(hit) = buf.iter().position(|&d| d < COINCIDENT_EPSILON) {
        set_one_hot(buf, hit);
        return Ok(());
    }

    let mut total = 0.0f32;
    for slot in buf.iter_mut() {
        *slot = 1.0 / libm::powf(*slot, power);
        total += *slot;
    }

    // Every weight underflowed, or one blew up: fall back to the nearest
    if !(total.is_finite() && total > 0.0) {
        set_one_hot(buf, nearest);
        return Ok(());
    }

    let inv = 1.0 / total;
    for slot in buf.iter_mut() {
        *slot *= inv;
    }
    Ok(())
}

fn set_one_hot(buf: &mut [f32], index: usize) {
    buf.fill(0.0);
    buf[index] = 1.0;
}
