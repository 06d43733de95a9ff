use clap::{Parser, ValueEnum};

use crate::error::{PendulumError, Result};
use crate::state::{at_rest, PhysicalParams, RenderParams, State, INITIAL_THETA1, INITIAL_THETA2};

/// Frame rate bounds (Hz); outside them the frame interval is not a usable
/// `Duration`
pub const MIN_FPS: f64 = 0.01;
pub const MAX_FPS: f64 = 1000.0;
/// Largest side of the drawing area (pixels)
pub const MAX_SIZE: usize = 10_000;
/// Largest link length or bob diameter in pixels
pub const MAX_PIXEL_EXTENT: f64 = 1e6;

/// Source of the frame times that drive the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClockMode {
    /// Frame number divided by the target frame rate
    Scheduled,
    /// Measured time since the first frame
    #[value(name = "wall")]
    WallClock,
}

/// Command line options
#[derive(Debug, Parser)]
#[command(name = "pendulum")]
#[command(about = "Animate a double pendulum in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Gravitational acceleration (m/s²)
    #[arg(long, default_value_t = 9.8)]
    pub gravity: f64,

    /// Target frame rate (Hz)
    #[arg(long, default_value_t = 40.0)]
    pub fps: f64,

    /// Initial angle of the upper link from vertical (radians)
    #[arg(long, default_value_t = INITIAL_THETA1, allow_negative_numbers = true)]
    pub theta1: f64,

    /// Initial angle of the lower link from vertical (radians)
    #[arg(long, default_value_t = INITIAL_THETA2, allow_negative_numbers = true)]
    pub theta2: f64,

    /// Length of the upper link (m)
    #[arg(long, default_value_t = 5.0)]
    pub length1: f64,

    /// Length of the lower link (m)
    #[arg(long, default_value_t = 5.0)]
    pub length2: f64,

    /// Pixels per meter
    #[arg(long, default_value_t = 20.0)]
    pub scale: f64,

    /// Side of the square drawing area (pixels)
    #[arg(long, default_value_t = 500)]
    pub size: usize,

    /// Diameter of the bob circles (pixels)
    #[arg(long, default_value_t = 20.0)]
    pub bob_radius: f64,

    /// Time source for each frame
    #[arg(long, value_enum, default_value_t = ClockMode::Scheduled)]
    pub clock: ClockMode,

    /// Run this many frames without a terminal and print CSV
    #[arg(long)]
    pub frames: Option<u64>,
}

/// Validated startup configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Gravity and link lengths
    pub physics: PhysicalParams,
    /// Pixel-space geometry
    pub render: RenderParams,
    /// Side of the square drawing area
    pub size: usize,
    /// Target frame rate (Hz)
    pub fps: f64,
    /// State at `t = 0`
    pub initial_state: State,
    /// Time source
    pub clock: ClockMode,
    /// Headless frame count, if any
    pub frames: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            physics: PhysicalParams::default(),
            render: RenderParams::default(),
            size: 500,
            fps: 40.0,
            initial_state: at_rest(INITIAL_THETA1, INITIAL_THETA2),
            clock: ClockMode::Scheduled,
            frames: None,
        }
    }
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PendulumError::DegenerateParameters(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn require_at_most(name: &str, value: f64, max: f64) -> Result<()> {
    if value <= max {
        Ok(())
    } else {
        Err(PendulumError::DegenerateParameters(format!(
            "{name} must be at most {max}, got {value}"
        )))
    }
}

fn require_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PendulumError::DegenerateParameters(format!(
            "{name} must be finite, got {value}"
        )))
    }
}

impl Cli {
    /// Validates the options and builds the simulation configuration
    ///
    /// Zero or non-finite lengths, gravity, frame rate or scale would make
    /// the equations of motion produce NaN, so they are rejected here.
    pub fn into_config(self) -> Result<SimulationConfig> {
        require_positive("gravity", self.gravity)?;
        require_positive("fps", self.fps)?;
        require_positive("length1", self.length1)?;
        require_positive("length2", self.length2)?;
        require_positive("scale", self.scale)?;
        require_positive("bob-radius", self.bob_radius)?;
        require_finite("theta1", self.theta1)?;
        require_finite("theta2", self.theta2)?;
        if !(MIN_FPS..=MAX_FPS).contains(&self.fps) {
            return Err(PendulumError::DegenerateParameters(format!(
                "fps must be between {MIN_FPS} and {MAX_FPS}, got {}",
                self.fps
            )));
        }
        if self.size == 0 || self.size > MAX_SIZE {
            return Err(PendulumError::DegenerateParameters(format!(
                "size must be between 1 and {MAX_SIZE} pixels, got {}",
                self.size
            )));
        }
        require_at_most("length1 * scale", self.length1 * self.scale, MAX_PIXEL_EXTENT)?;
        require_at_most("length2 * scale", self.length2 * self.scale, MAX_PIXEL_EXTENT)?;
        require_at_most("bob-radius", self.bob_radius, MAX_PIXEL_EXTENT)?;

        let physics = PhysicalParams {
            g: self.gravity,
            l1: self.length1,
            l2: self.length2,
        };
        let center = self.size as f64 / 2.0;
        let render =
            RenderParams::from_physical(&physics, self.scale, self.bob_radius, [center, center]);

        Ok(SimulationConfig {
            physics,
            render,
            size: self.size,
            fps: self.fps,
            initial_state: at_rest(self.theta1, self.theta2),
            clock: self.clock,
            frames: self.frames,
        })
    }
}
