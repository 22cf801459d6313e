//! Highway Simulation Library
//!
//! An endless arcade highway driving simulation that can run independently
//! or with a Bevy UI.

pub mod simulation;

#[cfg(feature = "ui")]
pub mod ui;
