//! Control algorithms: filtering, policies and the speed ramp.

pub mod filter;
pub mod line;
pub mod magnet;
pub mod ramp;
