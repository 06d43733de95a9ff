//! Equations of motion for a double pendulum with equal point masses.
//!
//! Both links are massless rods carrying unit masses at their ends. Angles
//! are measured from the downward vertical, so the stable equilibrium is
//! `[0, 0, 0, 0]`.

use crate::integrator::OdeSystem;
use crate::state::{PhysicalParams, State, STATE_DIM};

/// Right-hand side of the double pendulum ODE
///
/// Returns `[omega1, omega2, domega1/dt, domega2/dt]` for `state`. The state
/// may be a perturbed probe point off the true trajectory. The shared
/// denominator `3 - cos(2θ1 - 2θ2)` stays within `[2, 4]`, so no guard is
/// needed for finite inputs.
pub fn rhs(state: &State, l1: f64, l2: f64, g: f64) -> State {
    let [theta1, theta2, omega1, omega2] = *state;
    let delta = theta1 - theta2;
    let (sin_delta, cos_delta) = delta.sin_cos();
    let denominator = 3.0 - (2.0 * delta).cos();

    let alpha1 = (-3.0 * g * theta1.sin()
        - g * (theta1 - 2.0 * theta2).sin()
        - 2.0 * sin_delta * (omega2 * omega2 * l2 + omega1 * omega1 * l1 * cos_delta))
        / (l1 * denominator);
    let alpha2 = 2.0
        * sin_delta
        * (2.0 * omega1 * omega1 * l1 + 2.0 * g * theta1.cos() + omega2 * omega2 * l2 * cos_delta)
        / (l2 * denominator);

    [omega1, omega2, alpha1, alpha2]
}

/// A double pendulum bound to fixed physical parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoublePendulum {
    /// Gravity and link lengths
    pub params: PhysicalParams,
}

impl DoublePendulum {
    /// Creates a pendulum with the given parameters
    pub fn new(params: PhysicalParams) -> Self {
        Self { params }
    }

    /// Total mechanical energy per unit mass
    ///
    /// Potential energy is zero at the pivot height and negative below it.
    pub fn energy(&self, state: &State) -> f64 {
        let PhysicalParams { g, l1, l2 } = self.params;
        let [theta1, theta2, omega1, omega2] = *state;
        let v1_sq = l1 * l1 * omega1 * omega1;
        let v2_sq = v1_sq
            + l2 * l2 * omega2 * omega2
            + 2.0 * l1 * l2 * omega1 * omega2 * (theta1 - theta2).cos();
        let kinetic = 0.5 * (v1_sq + v2_sq);
        let potential = -g * (2.0 * l1 * theta1.cos() + l2 * theta2.cos());
        kinetic + potential
    }
}

impl OdeSystem<STATE_DIM> for DoublePendulum {
    fn rhs(&self, _t: f64, y: &State) -> State {
        rhs(y, self.params.l1, self.params.l2, self.params.g)
    }
}
