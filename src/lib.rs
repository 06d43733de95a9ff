//! Double pendulum animation driven by a fixed-step RK4 integrator.
//!
//! The simulation core ([`dynamics`], [`integrator`], [`simulation`]) is pure
//! and has no terminal coupling. Drawing goes through the [`graphics::Surface`]
//! trait, and [`widget`] hosts the animation in a terminal.
//!
//! ```rust
//! use pendulum::simulation::SimulationLoop;
//! use pendulum::state::{at_rest, PhysicalParams};
//!
//! let mut sim = SimulationLoop::new(PhysicalParams::default(), at_rest(0.5, 0.0));
//! let (theta1, theta2) = sim.tick(1.0 / 40.0);
//! assert!(theta1 < 0.5);
//! assert!(theta2 != 0.0);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod dynamics;
pub mod error;
pub mod graphics;
pub mod integrator;
pub mod math;
pub mod simulation;
pub mod state;
pub mod widget;

pub use error::{PendulumError, Result};
