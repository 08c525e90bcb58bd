//! Smoothing - frame-rate independent exponential decay
//!
//! Every filter here is stateless: the caller owns the current value and
//! passes the elapsed time. A decay of `rate` over `dt` moves a value
//! `1 - e^(-rate·dt)` of the way toward its target, so two ticks of `dt/2`
//! land exactly where one tick of `dt` does.
//!
//! Angles are yaw in degrees and interpolate along the shortest arc.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use crate::vector::{Vec2k, Vec3k};

/// Fraction of the remaining distance covered by a decay of `rate` over `dt`
///
/// Returns a value in [0, 1]. An infinite rate snaps (1.0); a zero rate or a
/// non-positive `dt` holds (0.0).
#[inline]
pub fn decay_alpha(rate: f32, dt: f32) -> f32 {
    if !(dt > 0.0) || !(rate > 0.0) {
        return 0.0;
    }
    clamp01(1.0 - libm::expf(-rate * dt))
}

#[inline]
pub fn clamp01(t: f32) -> f32 {
    if t < 0.0 { 0.0 } else if t > 1.0 { 1.0 } else { t }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Exponential approach of a scalar toward `target`
pub fn damp(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    lerp(current, target, decay_alpha(rate, dt))
}

pub fn damp_vec3(current: Vec3k, target: Vec3k, rate: f32, dt: f32) -> Vec3k {
    current.lerp(target, decay_alpha(rate, dt))
}

pub fn damp_vec2(current: Vec2k, target: Vec2k, rate: f32, dt: f32) -> Vec2k {
    current.lerp(target, decay_alpha(rate, dt))
}

/// Loops `t` into [0, length)
pub fn repeat(t: f32, length: f32) -> f32 {
    let r = t - libm::floorf(t / length) * length;
    if r >= length { 0.0 } else { r }
}

/// Wraps an angle into (-180, 180]
pub fn wrap_degrees(angle: f32) -> f32 {
    let a = repeat(angle, 360.0);
    if a > 180.0 { a - 360.0 } else { a }
}

/// Shortest signed difference `to - from`, in (-180, 180]
pub fn delta_angle(from: f32, to: f32) -> f32 {
    wrap_degrees(to - from)
}

/// Interpolates between two yaws along the shortest arc
///
/// `t` is clamped to [0, 1]. The result is not re-wrapped, so repeated
/// interpolation from an unwrapped angle stays continuous.
pub fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    a + delta_angle(a, b) * clamp01(t)
}

/// Exponential approach of a yaw toward `target` along the shortest arc
pub fn damp_angle(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    lerp_angle(current, target, decay_alpha(rate, dt))
}
