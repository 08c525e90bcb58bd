//! End-to-end runs through the public API

use std::sync::Arc;

use alice_locomotion::{
    compute_weights, AgentPose, BlendSample, BlendSmoothing, BlendSpace, PredictorConfig,
    Regime, RegimeEvent, RegimeScheduler, ScheduleConfig, SimulationConfig, TrajectoryPredictor,
    Vec2k, Vec3k,
};

/// Drives the predictor with an agent that tracks the ideal path exactly
fn run(predictor: &mut TrajectoryPredictor, dt: f32, ticks: usize) -> Vec<RegimeEvent> {
    let mut pose = predictor.scheduler().spawn_pose(0.0);
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(predictor.tick(dt, pose));
        pose = predictor.scheduler().ideal_pose(dt);
    }
    events
}

fn predictor(config: PredictorConfig, schedule: ScheduleConfig) -> TrajectoryPredictor {
    TrajectoryPredictor::new(config, RegimeScheduler::new(schedule).unwrap()).unwrap()
}

#[test]
fn weights_always_sum_to_one() {
    let samples: Vec<Vec2k> = (0..7)
        .map(|k| {
            let a = k as f32 * 0.9;
            Vec2k::new(a.cos() * (1.0 + k as f32 * 0.3), a.sin())
        })
        .collect();
    for qx in -6..=6 {
        for qy in -6..=6 {
            let q = Vec2k::new(qx as f32 * 0.37, qy as f32 * 0.41);
            for power in [0.5, 1.0, 1.9, 2.0, 4.0] {
                let w = compute_weights(&q, &samples, power).unwrap();
                assert!((w.sum() - 1.0).abs() < 1e-5, "q = {q:?}, k = {power}");
                assert!(w.as_slice().iter().all(|&x| x >= 0.0));
            }
        }
    }
}

#[test]
fn weight_shrinks_as_sample_moves_away() {
    let mut last = f32::INFINITY;
    for step in 1..20 {
        let samples = [
            Vec2k::new(step as f32 * 0.25, 0.0),
            Vec2k::new(0.0, 1.0),
            Vec2k::new(-1.0, -1.0),
        ];
        let w = compute_weights(&Vec2k::ZERO, &samples, 2.0).unwrap()[0];
        assert!(w <= last);
        last = w;
    }
}

#[test]
fn query_on_sample_passes_through() {
    let samples = [Vec3k::new(1.0, 0.0, 0.0), Vec3k::new(0.0, 0.0, 2.0), Vec3k::new(3.0, 1.0, 3.0)];
    for (j, s) in samples.iter().enumerate() {
        let w = compute_weights(s, &samples, 2.0).unwrap();
        for (i, &x) in w.as_slice().iter().enumerate() {
            assert_eq!(x, if i == j { 1.0 } else { 0.0 });
        }
    }
    assert!(compute_weights::<Vec3k>(&Vec3k::ZERO, &[], 2.0).is_err());
}

#[test]
fn straight_run_converges_to_lookahead_line() {
    let config = PredictorConfig {
        sample_count: 5,
        position_bias: f32::INFINITY,
        direction_bias: f32::INFINITY,
        ..PredictorConfig::default()
    };
    let mut p = predictor(config, ScheduleConfig::single(Regime::straight(2.0)));
    run(&mut p, 0.1, 10);
    let s = p.samples()[4].position;
    assert!((s.z - 2.0 * 0.4).abs() < 1e-4);
    assert!(s.x.abs() < 1e-5);
}

#[test]
fn left_turn_finishes_exactly_once() {
    let mut p = predictor(PredictorConfig::default(), ScheduleConfig::single(Regime::left(3.0, 1.5)));
    assert!((p.scheduler().active_regime().angular_speed() - 0.5).abs() < 1e-6);
    let completion = p.scheduler().timing().completion_time;
    let ticks = (completion / 0.02) as usize + 50;
    let events = run(&mut p, 0.02, ticks);
    assert_eq!(events.iter().filter(|e| **e == RegimeEvent::Completed).count(), 1);

    // Done is terminal
    let before = p.scheduler().total_elapsed();
    assert_eq!(p.tick(0.02, AgentPose::default()), None);
    assert_eq!(p.scheduler().total_elapsed(), before);

    let summary = p.shutdown();
    assert!(summary.completed);
    assert!(summary.total_active_time > completion);
}

#[test]
fn dual_mode_toggles_twice_in_two_limits() {
    let schedule = ScheduleConfig::dual(Regime::left(3.0, 1.5), Regime::left(6.0, 2.0), 0.5);
    let mut p = predictor(PredictorConfig::default(), schedule);
    // Start tick, then 2L + one tick of active time
    let events = run(&mut p, 0.125, 1 + 9);
    let switches: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            RegimeEvent::Switched { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(switches, vec![(0, 1), (1, 0)]);
    assert_eq!(p.scheduler().active_index(), 0);
}

#[test]
fn dual_mode_path_stays_continuous() {
    let schedule = ScheduleConfig::dual(Regime::left(2.0, 1.5), Regime::right(4.0, 1.5), 0.7);
    let mut s = RegimeScheduler::new(schedule).unwrap();
    let dt = 0.05;
    let mut pose = s.spawn_pose(0.0);
    for _ in 0..200 {
        s.advance(dt, pose);
        let next = s.ideal_pose(dt);
        // Agent speed stays at the regime speed across switches
        assert!((next.position.distance(pose.position) - 1.5 * dt).abs() < 1e-3);
        pose = next;
    }
}

#[test]
fn triangle_blend_space_midpoint() {
    let space = Arc::new(
        BlendSpace::new(
            vec![
                BlendSample::new(Vec2k::new(0.0, 0.0), 0),
                BlendSample::new(Vec2k::new(1.0, 0.0), 1),
                BlendSample::new(Vec2k::new(0.0, 1.0), 2),
            ],
            2.0,
        )
        .unwrap(),
    );
    let config = SimulationConfig::default();
    let mut state = config.build_blend_state(space).unwrap();
    state.set_desired_position(Vec2k::new(0.5, 0.0)).unwrap();
    let w = state.weights();
    assert!((w[0] - w[1]).abs() < 1e-6);
    assert!(w[1] > w[2]);
    assert!((w.sum() - 1.0).abs() < 1e-5);
}

#[test]
fn smoothed_blend_reaches_target() {
    let space = Arc::new(
        BlendSpace::new(
            vec![
                BlendSample::new(Vec2k::new(0.0, 0.0), 0),
                BlendSample::new(Vec2k::new(0.0, 2.0), 1),
            ],
            2.0,
        )
        .unwrap(),
    );
    let mut config = SimulationConfig::default();
    config.blend.smoothing = BlendSmoothing::Uniform;
    let mut state = config.build_blend_state(space).unwrap();
    state.set_desired_position(Vec2k::new(0.0, 2.0)).unwrap();
    let mut recomputes = 0;
    for _ in 0..600 {
        if state.tick(1.0 / 60.0).unwrap() {
            recomputes += 1;
        }
    }
    assert!(recomputes > 0);
    assert!((state.position().y - 2.0).abs() < 1e-2);
    assert_eq!(state.weights().dominant().map(|(i, _)| i), Some(1));
}
