pub mod controller;
pub mod input;

pub use controller::{ControllerError, GameController, Transcript};
pub use input::{Command, InputError, parse_command};
