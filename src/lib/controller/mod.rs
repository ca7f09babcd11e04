pub mod inputs;
pub mod motor;
pub mod pid;
pub mod pid_params;
pub mod rover;
pub mod velocity;

pub use inputs::DriveInputs;
pub use rover::{DisableCause, DriveState, Rover, RoverEvent, TickReport};
