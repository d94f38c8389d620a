//! Transient simulation of a jacketed continuously stirred tank reactor.
//!
//! The reactor runs a single exothermic first-order reaction `A -> B` and is
//! cooled by a jacket with its own coolant flow. [`ReactorJacket`] is the
//! vector field, [`ReactorProblem`] adapts it to the adaptive Dormand–Prince
//! solver, and [`Simulation`] ties both to an output grid and a
//! [`DisturbanceSchedule`].
//!
//! # Example
//!
//! ```no_run
//! use cstr_reactor::Simulation;
//!
//! let simulation = Simulation::reference();
//! let trajectory = simulation.run(simulation.initial_state())?;
//! let summary = simulation.summarize(&trajectory)?;
//!
//! println!("{summary}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod analysis;
mod config;
mod disturbance;
mod error;
mod parameters;
mod problem;
mod reactor;
mod simulation;
mod state;
mod trajectory;

pub use analysis::{Conversion, InvalidInput, Summary, conversion};
pub use config::{DisturbanceConfig, IntegrationConfig, RunConfig};
pub use disturbance::{DisturbanceSchedule, ExogenousInputs};
pub use error::{ConfigurationError, SimulationError};
pub use parameters::{ModelParameters, ParameterConfig};
pub use problem::ReactorProblem;
pub use reactor::{DomainError, ReactorInput, ReactorJacket, ReactorOutput};
pub use simulation::{IntegrationSettings, MAX_OUTPUT_STEPS, Simulation};
pub use state::{ReactorDerivative, ReactorState};
pub use trajectory::{Sample, Trajectory};
