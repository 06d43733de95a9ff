//! End-to-end behaviour of the simulation core through the public API.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use pendulum::config::ClockMode;
use pendulum::dynamics::{rhs, DoublePendulum};
use pendulum::integrator::{rk4_step, Rk4};
use pendulum::simulation::{run_headless, FrameClock, Phase, SimulationLoop};
use pendulum::state::{at_rest, PhysicalParams, State, INITIAL_THETA1, INITIAL_THETA2};
use std::f64::consts::PI;

fn reference_state() -> State {
    at_rest(INITIAL_THETA1, INITIAL_THETA2)
}

#[test]
fn reference_initial_state() {
    assert_relative_eq!(INITIAL_THETA1, 2.0 * PI / 3.0);
    assert_relative_eq!(INITIAL_THETA2, 5.0 * PI / 6.0);
    assert_eq!(reference_state()[2], 0.0);
    assert_eq!(reference_state()[3], 0.0);
}

#[test]
fn equilibrium_stays_at_rest() {
    let sys = DoublePendulum::new(PhysicalParams::default());
    let mut solver = Rk4::new();
    let mut y = [0.0; 4];
    for step in 0..10_000 {
        y = solver.step(&sys, step as f64 * 0.001, &y, 0.001);
    }
    for component in y {
        assert_abs_diff_eq!(component, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn one_step_from_reference_release() {
    let y0 = reference_state();
    let accel = rhs(&y0, 5.0, 5.0, 9.8);
    let y1 = rk4_step(&y0, 0.025, |s| rhs(s, 5.0, 5.0, 9.8));

    let d_theta1 = y1[0] - y0[0];
    let d_theta2 = y1[1] - y0[1];
    assert!(d_theta1 != 0.0 && d_theta1.abs() < 1e-2);
    assert!(d_theta2 != 0.0 && d_theta2.abs() < 1e-2);

    assert!(y1[2] != 0.0 && y1[3] != 0.0);
    assert_eq!(y1[2].signum(), accel[2].signum());
    assert_eq!(y1[3].signum(), accel[3].signum());
    // Velocities after one frame are close to a·dt.
    assert_relative_eq!(y1[2], accel[2] * 0.025, max_relative = 0.05);
    assert_relative_eq!(y1[3], accel[3] * 0.025, max_relative = 0.05);
}

#[test]
fn runs_are_deterministic() {
    let run = || {
        let mut sim = SimulationLoop::new(PhysicalParams::default(), reference_state());
        let mut clock = FrameClock::new(ClockMode::Scheduled, 40.0);
        (0..400)
            .map(|_| sim.tick(clock.next_frame_time()))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn headless_output_is_reproducible() {
    let mut first = Vec::new();
    let mut second = Vec::new();
    run_headless(PhysicalParams::default(), reference_state(), 40.0, 200, &mut first).unwrap();
    run_headless(PhysicalParams::default(), reference_state(), 40.0, 200, &mut second).unwrap();
    assert_eq!(first, second);
    assert_eq!(String::from_utf8(first).unwrap().lines().count(), 201);
}

#[test]
fn energy_is_nearly_conserved_with_small_steps() {
    let sys = DoublePendulum::new(PhysicalParams::default());
    let y0 = at_rest(0.3, 0.1);
    let (_, yf) = Rk4::new().integrate(&sys, 0.0, &y0, 5.0, 1e-3).unwrap();
    let e0 = sys.energy(&y0);
    assert_relative_eq!(sys.energy(&yf), e0, max_relative = 1e-8);
}

#[test]
fn simulation_time_tracks_frame_schedule() {
    let mut sim = SimulationLoop::new(PhysicalParams::default(), reference_state());
    let mut clock = FrameClock::new(ClockMode::Scheduled, 40.0);
    assert_eq!(sim.phase(), Phase::Idle);
    for _ in 0..80 {
        sim.tick(clock.next_frame_time());
    }
    assert_eq!(sim.phase(), Phase::Running);
    assert_relative_eq!(sim.time(), 2.0, epsilon = 1e-12);
    assert_eq!(sim.stats().steps, 80);
    assert_eq!(sim.stats().fn_evals, 320);
}

#[test]
fn angles_are_not_wrapped() {
    // A fast spin carries the upper link past π without normalisation.
    let mut sim = SimulationLoop::new(PhysicalParams::default(), [3.0, 3.0, 10.0, 10.0]);
    let (theta1, _) = sim.tick(0.05);
    assert!(theta1 > PI);
}
