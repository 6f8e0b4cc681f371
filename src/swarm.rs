pub mod config;
pub mod fixed_math;
pub mod morton;
pub mod quadtree;
pub mod stepper;
pub mod worker;

pub use config::SimConfig;
pub use stepper::SwarmState;
pub use worker::{Command, SwarmError, SwarmHandle, TickFrame};
