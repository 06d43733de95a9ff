use std::f64::consts::PI;

/// Number of components in the pendulum state vector
pub const STATE_DIM: usize = 4;

/// Pendulum state `[theta1, theta2, omega1, omega2]`
///
/// Angles are measured from the downward vertical in radians and are never
/// wrapped, so they may grow past ±π.
pub type State = [f64; STATE_DIM];

/// Reference release angle of the upper link
pub const INITIAL_THETA1: f64 = PI / 2.0 + PI / 6.0;
/// Reference release angle of the lower link
pub const INITIAL_THETA2: f64 = PI / 2.0 + PI / 3.0;

/// Builds a state released from rest at the given angles
pub fn at_rest(theta1: f64, theta2: f64) -> State {
    [theta1, theta2, 0.0, 0.0]
}

/// Physical constants of the pendulum, in SI units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalParams {
    /// Gravitational acceleration (m/s²)
    pub g: f64,
    /// Length of the upper link (m)
    pub l1: f64,
    /// Length of the lower link (m)
    pub l2: f64,
}

impl Default for PhysicalParams {
    fn default() -> Self {
        Self {
            g: 9.8,
            l1: 5.0,
            l2: 5.0,
        }
    }
}

/// Pixel-space drawing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    /// Upper link length in pixels
    pub l1: f64,
    /// Lower link length in pixels
    pub l2: f64,
    /// Diameter of the circle drawn at each bob
    pub r: f64,
    /// Pivot position (x, y); y grows downward
    pub anchor: [f64; 2],
}

/// Screen positions of the two bobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bobs {
    /// Joint between the links
    pub first: [f64; 2],
    /// Free end of the lower link
    pub second: [f64; 2],
}

impl RenderParams {
    /// Derives pixel lengths from physical lengths using a fixed scale
    pub fn from_physical(
        physics: &PhysicalParams,
        pixels_per_meter: f64,
        r: f64,
        anchor: [f64; 2],
    ) -> Self {
        Self {
            l1: physics.l1 * pixels_per_meter,
            l2: physics.l2 * pixels_per_meter,
            r,
            anchor,
        }
    }

    /// Computes where the bobs sit for the given link angles
    ///
    /// The lower bob is offset from the upper one, not from the anchor.
    pub fn bobs(&self, theta1: f64, theta2: f64) -> Bobs {
        let (sin1, cos1) = theta1.sin_cos();
        let (sin2, cos2) = theta2.sin_cos();
        let first = [
            self.anchor[0] + self.l1 * sin1,
            self.anchor[1] + self.l1 * cos1,
        ];
        let second = [first[0] + self.l2 * sin2, first[1] + self.l2 * cos2];
        Bobs { first, second }
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            l1: 100.0,
            l2: 100.0,
            r: 20.0,
            anchor: [250.0, 250.0],
        }
    }
}
