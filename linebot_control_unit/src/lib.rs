//! # Linebot Control Unit Library
//!
//! Control core of a small autonomous line-following vehicle. Provides a
//! fixed-rate loop that reads two analog sensors through the board trait,
//! smooths each reading with a truncating exponential moving average,
//! derives target actuator speeds from thresholded decisions, and drives
//! two independent drive channels toward those targets with an
//! exponential step-size ramp saturating at per-channel bounds.
//!
//! ## Cycle Phases
//!
//! Within one iteration the order is an invariant of correctness:
//!
//! 1. Sample and filter both sensor channels.
//! 2. Magnet proximity policy (may block for a signal sequence, may
//!    override both targets to stop).
//! 3. Line-following policy (unconditionally sets both targets).
//! 4. Ramp advance and actuator emission, right then left.
//!
//! All loop state is owned by the [`cycle::CycleRunner`]; nothing is
//! shared across threads and the cycle body performs no allocation.

#![deny(clippy::disallowed_types)]

pub mod config;
pub mod control;
pub mod cycle;
