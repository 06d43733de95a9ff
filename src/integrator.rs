//! Classical fixed-step 4th-order Runge-Kutta integrator.
//!
//! ```text
//! k1 = f(y)
//! k2 = f(y + h/2 k1)
//! k3 = f(y + h/2 k2)
//! k4 = f(y + h k3)
//! y' = y + h/6 (k1 + 2 k2 + 2 k3 + k4)
//! ```
//!
//! There is no error estimate and no step-size control: every step uses
//! exactly the `h` it is given.

use crate::error::{PendulumError, Result};
use crate::math::{add_n, multiply_n};

/// System of ordinary differential equations: dy/dt = f(t, y)
pub trait OdeSystem<const N: usize> {
    /// Evaluate the right-hand side of the ODE system
    ///
    /// # Arguments
    /// * `t` - Current time
    /// * `y` - State to evaluate at, possibly an intermediate probe point
    fn rhs(&self, t: f64, y: &[f64; N]) -> [f64; N];
}

/// Advances `y` by one RK4 step of size `h`
///
/// `f` is evaluated exactly four times. The caller's state is not touched;
/// a new state is returned. With `h == 0` the result equals `y`.
pub fn rk4_step<const N: usize, F>(y: &[f64; N], h: f64, mut f: F) -> [f64; N]
where
    F: FnMut(&[f64; N]) -> [f64; N],
{
    let k1 = f(y);
    let k2 = f(&add_n(y, &multiply_n(h / 2.0, &k1)));
    let k3 = f(&add_n(y, &multiply_n(h / 2.0, &k2)));
    let k4 = f(&add_n(y, &multiply_n(h, &k3)));

    let k = add_n(
        &add_n(&add_n(&k1, &multiply_n(2.0, &k2)), &multiply_n(2.0, &k3)),
        &k4,
    );
    add_n(y, &multiply_n(h / 6.0, &k))
}

/// Integration statistics for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    /// Total number of right-hand side evaluations
    pub fn_evals: u64,
    /// Number of steps taken
    pub steps: u64,
}

/// Fixed-step RK4 stepper that keeps evaluation counts
#[derive(Debug, Clone, Default)]
pub struct Rk4 {
    /// Integration statistics
    pub stats: Stats,
}

impl Rk4 {
    /// Create a new stepper with zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Perform a single step of size `h` starting at time `t`
    ///
    /// Intermediate stages are evaluated at `t`, `t + h/2` and `t + h`.
    pub fn step<const N: usize, S: OdeSystem<N>>(
        &mut self,
        sys: &S,
        t: f64,
        y: &[f64; N],
        h: f64,
    ) -> [f64; N] {
        let mut stage = 0;
        let next = rk4_step(y, h, |probe| {
            let offset = match stage {
                0 => 0.0,
                1 | 2 => h / 2.0,
                _ => h,
            };
            stage += 1;
            sys.rhs(t + offset, probe)
        });
        self.stats.fn_evals += 4;
        self.stats.steps += 1;
        next
    }

    /// Integrate from `t0` to `tf` with fixed steps of size `h`
    ///
    /// The final step is shortened so the integration lands on `tf` exactly.
    ///
    /// # Returns
    /// `(t_final, y_final)`
    pub fn integrate<const N: usize, S: OdeSystem<N>>(
        &mut self,
        sys: &S,
        t0: f64,
        y0: &[f64; N],
        tf: f64,
        h: f64,
    ) -> Result<(f64, [f64; N])> {
        if !h.is_finite() || h <= 0.0 {
            return Err(PendulumError::InvalidStep(h));
        }

        let mut t = t0;
        let mut y = *y0;
        while t < tf {
            let step = h.min(tf - t);
            y = self.step(sys, t, &y, step);
            // Snap to tf to avoid a trailing sliver step from rounding.
            t = if tf - (t + step) < h * 1e-12 { tf } else { t + step };
        }
        Ok((t, y))
    }
}
