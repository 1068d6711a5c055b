//! Board trait and HAL error types.
//!
//! The control unit talks to hardware exclusively through the [`Board`]
//! trait: analog sampling, indicator drive, timed delay and actuator
//! output are all primitive services supplied by a board implementation.
//! This is the seam that lets the control loop run against the simulated
//! board in tests and development.

use thiserror::Error;

/// Error types for board operations.
///
/// Sensor reads and actuator writes are infallible at this layer; a board
/// that loses its hardware surfaces that as a fault outside the control
/// core. Only initialization and the start gate can fail.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Board initialization failed.
    #[error("initialization failed: {0}")]
    InitFailed(String),

    /// Waiting for the start signal failed or was abandoned.
    #[error("start signal: {0}")]
    StartSignal(String),
}

/// Identifies one of the two analog sensor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorChannel {
    /// Hall-effect magnetic field sensor.
    Magnetic,
    /// Differential infrared line sensor.
    IrDifferential,
}

/// Identifies one of the two actuator channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorChannel {
    Right,
    Left,
}

/// Interface to the vehicle hardware.
///
/// # Lifecycle
///
/// 1. `init()` — one-time hardware setup, before anything else.
/// 2. `wait_for_start()` — blocks until the external start condition.
/// 3. The remaining methods are called repeatedly from the control loop.
///
/// `read_raw_sample` and `delay` block the caller; there is no
/// cancellation. `delay` waits in units of 1/8 s
/// (see [`crate::consts::DELAY_UNITS_PER_SEC`]).
pub trait Board {
    /// One-time hardware initialization.
    fn init(&mut self) -> Result<(), HalError>;

    /// Block until the external start condition is observed.
    fn wait_for_start(&mut self) -> Result<(), HalError>;

    /// Blocking analog read; always yields a valid 8-bit sample.
    fn read_raw_sample(&mut self, channel: SensorChannel) -> u8;

    /// Drive the visual indicator output.
    fn set_indicator(&mut self, on: bool);

    /// Blocking wait for `units` delay units.
    fn delay(&mut self, units: u16);

    /// Command one actuator channel.
    fn set_actuator(&mut self, channel: ActuatorChannel, speed: u16);
}
