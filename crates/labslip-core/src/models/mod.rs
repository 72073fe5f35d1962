//! Domain models for the lab slip tracker.

mod lab;
mod lab_slip;
mod procedure;

pub use lab::*;
pub use lab_slip::*;
pub use procedure::*;
