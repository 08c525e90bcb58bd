//! Flow field - velocity interpolated over a regular ground grid
//!
//! Recorded tracks become `(position, velocity)` samples by finite
//! differences. Every grid cell then takes the inverse-distance weighted
//! average of the sample velocities, giving a dense direction/speed field
//! for visualizing or steering along the recorded motion.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{LocomotionError, Result};
use crate::idw;
use crate::vector::{Vec2k, Vec3k};

/// Default falloff for flow fields; a bit softer than blend spaces
pub const FLOW_FIELD_POWER: f32 = 1.9;

/// One velocity measurement along a track
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlowSample {
    pub position: Vec3k,
    pub velocity: Vec3k,
}

/// Finite-difference velocities of a timestamped polyline
///
/// Each sample sits at the later point of its segment. Segments with a
/// non-increasing timestamp are skipped.
pub fn velocity_samples(track: &[(f32, Vec3k)]) -> Result<Vec<FlowSample>> {
    if track.iter().any(|(t, p)| !t.is_finite() || !p.is_finite()) {
        return Err(LocomotionError::InvalidInput("track point is not finite"));
    }
    let mut out = Vec::with_capacity(track.len().saturating_sub(1));
    for pair in track.windows(2) {
        let (t0, p0) = pair[0];
        let (t1, p1) = pair[1];
        let dt = t1 - t0;
        if !(dt > 0.0) {
            tracing::debug!(t0, t1, "skipping track segment without forward time");
            continue;
        }
        out.push(FlowSample { position: p1, velocity: (p1 - p0).scale(1.0 / dt) });
    }
    Ok(out)
}

/// Layout of the cell grid on the ground plane
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct FieldGrid {
    /// Extent along x
    pub length: f32,
    /// Extent along z
    pub width: f32,
    /// Added to both x and z of every cell
    pub offset: f32,
    pub step: f32,
    /// Cell y
    pub height: f32,
}

impl Default for FieldGrid {
    fn default() -> Self {
        Self { length: 10.0, width: 10.0, offset: -5.0, step: 0.5, height: 0.25 }
    }
}

impl FieldGrid {
    pub fn validate(&self) -> Result<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(LocomotionError::config(format!("grid step must be positive, got {}", self.step)));
        }
        if !(self.length.is_finite() && self.length > 0.0 && self.width.is_finite() && self.width > 0.0) {
            return Err(LocomotionError::config("grid extents must be positive"));
        }
        if !self.offset.is_finite() || !self.height.is_finite() {
            return Err(LocomotionError::config("grid offset and height must be finite"));
        }
        Ok(())
    }

    /// Interior cells along one axis: `step * k` for k >= 1 while below `extent`
    fn axis_count(&self, extent: f32) -> usize {
        let mut k = 1usize;
        while (k as f32) * self.step < extent {
            k += 1;
        }
        k - 1
    }

    /// Cell positions, x-major
    pub fn cell_positions(&self) -> Vec<Vec3k> {
        let nx = self.axis_count(self.length);
        let nz = self.axis_count(self.width);
        let mut cells = Vec::with_capacity(nx * nz);
        for i in 1..=nx {
            for j in 1..=nz {
                cells.push(Vec3k::new(
                    self.offset + self.step * i as f32,
                    self.height,
                    self.offset + self.step * j as f32,
                ));
            }
        }
        cells
    }
}

/// Propagated state of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlowCell {
    pub position: Vec3k,
    /// Weighted average of sample velocities
    pub velocity: Vec3k,
    pub speed: f32,
    /// Yaw of `velocity`, degrees
    pub heading: f32,
    /// `speed` mapped onto [min, max] sample speed, clamped to [0, 1]
    pub speed_fraction: f32,
}

#[derive(Debug, Clone)]
pub struct FlowField {
    grid: FieldGrid,
    power: f32,
    cells: Vec<FlowCell>,
    speed_range: Option<(f32, f32)>,
}

impl FlowField {
    pub fn new(grid: FieldGrid, power: f32) -> Result<Self> {
        grid.validate()?;
        if !power.is_finite() || power < 0.0 {
            return Err(LocomotionError::config("falloff power must be finite and non-negative"));
        }
        let cells: Vec<FlowCell> = grid
            .cell_positions()
            .into_iter()
            .map(|position| FlowCell { position, ..FlowCell::default() })
            .collect();
        tracing::debug!(cells = cells.len(), power, "flow field laid out");
        Ok(Self { grid, power, cells, speed_range: None })
    }

    pub fn grid(&self) -> &FieldGrid {
        &self.grid
    }

    pub fn cells(&self) -> &[FlowCell] {
        &self.cells
    }

    /// Min and max sample speed of the last propagation
    pub fn speed_range(&self) -> Option<(f32, f32)> {
        self.speed_range
    }

    /// Recomputes every cell from `samples`
    pub fn propagate(&mut self, samples: &[FlowSample]) -> Result<()> {
        let (points, range) = prepare(samples)?;
        let mut weights = vec![0.0; points.len()];
        for cell in &mut self.cells {
            idw::compute_weights_into(&ground(cell.position), &points, self.power, &mut weights)?;
            let mut velocity = Vec3k::ZERO;
            for (s, &w) in samples.iter().zip(&weights) {
                velocity += s.velocity.scale(w);
            }
            fill_cell(cell, velocity, range);
        }
        self.speed_range = Some(range);
        Ok(())
    }

    /// Same as [`propagate`](Self::propagate), one rayon task per cell
    #[cfg(feature = "parallel")]
    pub fn propagate_par(&mut self, samples: &[FlowSample]) -> Result<()> {
        use rayon::prelude::*;

        let (points, range) = prepare(samples)?;
        let velocities: Vec<Vec3k> = samples.iter().map(|s| s.velocity).collect();
        let power = self.power;
        self.cells.par_iter_mut().try_for_each(|cell| -> Result<()> {
            let velocity = idw::interpolate(&ground(cell.position), &points, &velocities, power)?;
            fill_cell(cell, velocity, range);
            Ok(())
        })?;
        self.speed_range = Some(range);
        Ok(())
    }

    /// Index of the cell closest to `position` on the ground plane
    pub fn nearest_cell(&self, position: Vec3k) -> Option<usize> {
        let target = ground(position);
        let mut best: Option<(usize, f32)> = None;
        for (i, cell) in self.cells.iter().enumerate() {
            let d = ground(cell.position).distance(target);
            match best {
                Some((_, bd)) if bd <= d => {}
                _ => best = Some((i, d)),
            }
        }
        best.map(|(i, _)| i)
    }
}

fn ground(p: Vec3k) -> Vec2k {
    Vec2k::new(p.x, p.z)
}

fn prepare(samples: &[FlowSample]) -> Result<(Vec<Vec2k>, (f32, f32))> {
    if samples.is_empty() {
        return Err(LocomotionError::InvalidInput("no flow samples to propagate"));
    }
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for s in samples {
        let speed = s.velocity.length();
        min = min.min(speed);
        max = max.max(speed);
    }
    let points = samples.iter().map(|s| ground(s.position)).collect();
    Ok((points, (min, max)))
}

fn fill_cell(cell: &mut FlowCell, velocity: Vec3k, (min, max): (f32, f32)) {
    let speed = velocity.length();
    let span = max - min;
    cell.velocity = velocity;
    cell.speed = speed;
    cell.heading = velocity.yaw_degrees();
    cell.speed_fraction = if span > f32::EPSILON {
        crate::smoothing::clamp01((speed - min) / span)
    } else {
        0.0
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_track() -> Vec<(f32, Vec3k)> {
        (0..5)
            .map(|k| (k as f32 * 0.5, Vec3k::new(0.0, 0.0, k as f32)))
            .collect()
    }

    #[test]
    fn test_velocity_samples_finite_difference() {
        let samples = velocity_samples(&straight_track()).unwrap();
        assert_eq!(samples.len(), 4);
        for s in &samples {
            assert!((s.velocity.z - 2.0).abs() < 1e-5);
            assert!(s.velocity.x.abs() < 1e-6);
        }
        assert_eq!(samples[0].position, Vec3k::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_velocity_samples_skip_stalled_time() {
        let track = [
            (0.0, Vec3k::ZERO),
            (0.0, Vec3k::new(1.0, 0.0, 0.0)),
            (1.0, Vec3k::new(2.0, 0.0, 0.0)),
        ];
        let samples = velocity_samples(&track).unwrap();
        assert_eq!(samples.len(), 1);
        assert!((samples[0].velocity.x - 1.0).abs() < 1e-6);
        assert!(velocity_samples(&[(f32::NAN, Vec3k::ZERO)]).is_err());
    }

    #[test]
    fn test_default_grid_layout() {
        let cells = FieldGrid::default().cell_positions();
        assert_eq!(cells.len(), 19 * 19);
        assert!((cells[0].x + 4.5).abs() < 1e-5);
        assert!((cells[0].z + 4.5).abs() < 1e-5);
        assert!((cells[0].y - 0.25).abs() < 1e-6);
        let last = cells[cells.len() - 1];
        assert!((last.x - 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_bad_grid_rejected() {
        let grid = FieldGrid { step: 0.0, ..FieldGrid::default() };
        assert!(FlowField::new(grid, FLOW_FIELD_POWER).is_err());
    }

    #[test]
    fn test_uniform_flow_propagates_everywhere() {
        let mut field = FlowField::new(FieldGrid::default(), FLOW_FIELD_POWER).unwrap();
        let samples = velocity_samples(&straight_track()).unwrap();
        field.propagate(&samples).unwrap();
        for cell in field.cells() {
            assert!((cell.velocity.z - 2.0).abs() < 1e-4);
            assert!(cell.heading.abs() < 1e-2);
            assert_eq!(cell.speed_fraction, 0.0);
        }
        assert_eq!(field.speed_range(), Some((2.0, 2.0)));
    }

    #[test]
    fn test_cells_follow_nearest_flow() {
        let mut field = FlowField::new(FieldGrid::default(), FLOW_FIELD_POWER).unwrap();
        let samples = [
            FlowSample { position: Vec3k::new(-4.0, 0.0, 0.0), velocity: Vec3k::new(1.0, 0.0, 0.0) },
            FlowSample { position: Vec3k::new(4.0, 0.0, 0.0), velocity: Vec3k::new(0.0, 0.0, 3.0) },
        ];
        field.propagate(&samples).unwrap();
        let west = field.nearest_cell(Vec3k::new(-4.0, 0.0, 0.0)).unwrap();
        let east = field.nearest_cell(Vec3k::new(4.0, 0.0, 0.0)).unwrap();
        let (w, e) = (field.cells()[west], field.cells()[east]);
        assert!((w.heading - 90.0).abs() < 1e-2);
        assert!(e.heading.abs() < 1e-2);
        assert!(e.speed_fraction > 0.99);
        assert!(w.speed_fraction < 0.01);
    }

    #[test]
    fn test_empty_samples_rejected() {
        let mut field = FlowField::new(FieldGrid::default(), FLOW_FIELD_POWER).unwrap();
        assert!(field.propagate(&[]).is_err());
        assert_eq!(field.speed_range(), None);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_serial() {
        let track: Vec<(f32, Vec3k)> = (0..20)
            .map(|k| {
                let t = k as f32 * 0.1;
                (t, Vec3k::new(libm::sinf(t) * 3.0, 0.0, t * 2.0 - 2.0))
            })
            .collect();
        let samples = velocity_samples(&track).unwrap();
        let mut a = FlowField::new(FieldGrid::default(), FLOW_FIELD_POWER).unwrap();
        let mut b = a.clone();
        a.propagate(&samples).unwrap();
        b.propagate_par(&samples).unwrap();
        for (x, y) in a.cells().iter().zip(b.cells()) {
            assert!(x.velocity.distance(y.velocity) < 1e-4);
        }
    }
}
