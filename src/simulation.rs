//! Per-frame simulation driver.
//!
//! [`SimulationLoop`] owns the pendulum state and simulation time and is
//! advanced once per displayed frame. [`FrameClock`] turns frames into the
//! frame times the loop consumes.

use std::io::Write;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::config::ClockMode;
use crate::dynamics::DoublePendulum;
use crate::error::Result;
use crate::integrator::{Rk4, Stats};
use crate::state::{PhysicalParams, State};

/// Lifecycle of a [`SimulationLoop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No tick has happened yet
    Idle,
    /// At least one tick has happened
    Running,
}

/// Owns the state vector and simulation time
#[derive(Debug, Clone)]
pub struct SimulationLoop {
    system: DoublePendulum,
    initial: State,
    state: State,
    t: f64,
    phase: Phase,
    integrator: Rk4,
}

impl SimulationLoop {
    /// Creates an idle loop at `t = 0`
    pub fn new(params: PhysicalParams, initial: State) -> Self {
        Self {
            system: DoublePendulum::new(params),
            initial,
            state: initial,
            t: 0.0,
            phase: Phase::Idle,
            integrator: Rk4::new(),
        }
    }

    /// Advances the simulation to `current_frame_time` and returns `(θ1, θ2)`
    ///
    /// The step size is `current_frame_time - t`. A frame time behind the
    /// simulation clock, or one that is not finite, is clamped to a zero
    /// step so `t` never decreases and the state never turns NaN.
    pub fn tick(&mut self, current_frame_time: f64) -> (f64, f64) {
        if self.phase == Phase::Idle {
            debug!("simulation started at t = {current_frame_time:.4}");
            self.phase = Phase::Running;
        }

        let dt = if !current_frame_time.is_finite() {
            warn!("non-finite frame time {current_frame_time}, skipping step");
            0.0
        } else if current_frame_time < self.t {
            warn!(
                "frame time {current_frame_time} is behind simulation time {}, skipping step",
                self.t
            );
            0.0
        } else {
            current_frame_time - self.t
        };

        let next = self.integrator.step(&self.system, self.t, &self.state, dt);
        self.t += dt;
        self.state = next;

        (next[0], next[1])
    }

    /// Returns to the initial state at `t = 0`
    pub fn reset(&mut self) {
        self.state = self.initial;
        self.t = 0.0;
        self.phase = Phase::Idle;
    }

    /// Current state vector
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Current simulation time (s)
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Total mechanical energy of the current state
    pub fn energy(&self) -> f64 {
        self.system.energy(&self.state)
    }

    /// Integrator statistics since construction
    pub fn stats(&self) -> &Stats {
        &self.integrator.stats
    }
}

/// Produces the frame time handed to [`SimulationLoop::tick`]
#[derive(Debug, Clone)]
pub struct FrameClock {
    mode: ClockMode,
    fps: f64,
    frame_count: u64,
    started: Option<Instant>,
    paused_at: Option<Instant>,
}

impl FrameClock {
    /// Creates a clock targeting `fps` frames per second
    pub fn new(mode: ClockMode, fps: f64) -> Self {
        Self {
            mode,
            fps,
            frame_count: 0,
            started: None,
            paused_at: None,
        }
    }

    /// Counts a new frame and returns its time in seconds
    ///
    /// In scheduled mode this is `frame_count / fps`, the time the frame
    /// should have been shown at. Dropped frames therefore slow playback
    /// instead of producing a large step. In wall-clock mode the first
    /// frame is at `1 / fps` and later frames add the measured elapsed time.
    pub fn next_frame_time(&mut self) -> f64 {
        self.frame_count += 1;
        match self.mode {
            ClockMode::Scheduled => self.frame_count as f64 / self.fps,
            ClockMode::WallClock => {
                let started = *self.started.get_or_insert_with(Instant::now);
                1.0 / self.fps + started.elapsed().as_secs_f64()
            }
        }
    }

    /// Number of frames counted so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Stops or resumes the clock
    ///
    /// Time spent paused is excluded from wall-clock frame times. Scheduled
    /// time needs no adjustment since paused frames are never counted.
    pub fn set_paused(&mut self, paused: bool) {
        match (paused, self.paused_at) {
            (true, None) => self.paused_at = Some(Instant::now()),
            (false, Some(since)) => {
                self.paused_at = None;
                self.skip(since.elapsed());
            }
            _ => {}
        }
    }

    /// Shifts the wall-clock origin forward by `gap`
    fn skip(&mut self, gap: Duration) {
        if let Some(started) = self.started.as_mut() {
            *started += gap;
        }
    }

    /// Restarts counting from frame zero
    pub fn reset(&mut self) {
        self.frame_count = 0;
        self.started = None;
        if self.paused_at.is_some() {
            self.paused_at = Some(Instant::now());
        }
    }
}

/// Runs `frames` scheduled ticks and writes `t,theta1,theta2` rows as CSV
pub fn run_headless<W: Write>(
    params: PhysicalParams,
    initial: State,
    fps: f64,
    frames: u64,
    out: &mut W,
) -> Result<()> {
    let mut sim = SimulationLoop::new(params, initial);
    let mut clock = FrameClock::new(ClockMode::Scheduled, fps);

    writeln!(out, "t,theta1,theta2")?;
    for _ in 0..frames {
        let (theta1, theta2) = sim.tick(clock.next_frame_time());
        writeln!(out, "{},{},{}", sim.time(), theta1, theta2)?;
    }
    out.flush()?;
    Ok(())
}
