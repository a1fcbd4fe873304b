//! Domain models for the skintrack system.

mod appointment;
mod asset;
mod patient;

pub use appointment::*;
pub use asset::*;
pub use patient::*;
