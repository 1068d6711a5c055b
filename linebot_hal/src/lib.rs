//! Linebot HAL
//!
//! Board implementations for the linebot control unit. Currently a single
//! software-emulated board for development and testing without physical
//! hardware; a real board wires the same trait to ADC, GPIO and PWM
//! peripherals.

pub mod sim;

pub use sim::{BoardEvent, SimulatedBoard};
