//! Simulated board implementation.
//!
//! `SimulatedBoard` implements the [`Board`] trait with scripted sensor
//! samples and a recorded event log instead of real peripherals. Delays
//! are accounted, not slept, so scripted scenarios run at full speed and
//! tests can assert on the exact sequence of indicator toggles, delays
//! and actuator commands the control loop produced.

use std::collections::VecDeque;

use linebot_common::hal::{ActuatorChannel, Board, HalError, SensorChannel};
use tracing::debug;

/// Fallback sample when a channel's script is exhausted (mid-scale).
const DEFAULT_SAMPLE: u8 = 128;

/// One recorded side effect of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    /// Indicator driven on or off.
    Indicator(bool),
    /// Blocking delay requested [delay units].
    Delay(u16),
    /// Actuator channel commanded to a speed.
    Actuator(ActuatorChannel, u16),
}

/// Software-emulated board.
pub struct SimulatedBoard {
    /// Queued samples for the magnetic channel.
    magnetic: VecDeque<u8>,
    /// Queued samples for the infrared channel.
    infrared: VecDeque<u8>,
    /// Constant fallback per channel once the script runs out.
    magnetic_fallback: u8,
    infrared_fallback: u8,
    /// Everything the control loop did, in order.
    events: Vec<BoardEvent>,
    /// Current indicator state.
    indicator: bool,
    /// Last commanded speed per channel.
    right_speed: Option<u16>,
    left_speed: Option<u16>,
    /// Total delay time requested [delay units].
    elapsed_delay_units: u64,
    initialized: bool,
    started: bool,
}

impl SimulatedBoard {
    /// Create a board with empty scripts; every read yields mid-scale.
    pub fn new() -> Self {
        Self {
            magnetic: VecDeque::new(),
            infrared: VecDeque::new(),
            magnetic_fallback: DEFAULT_SAMPLE,
            infrared_fallback: DEFAULT_SAMPLE,
            events: Vec::new(),
            indicator: false,
            right_speed: None,
            left_speed: None,
            elapsed_delay_units: 0,
            initialized: false,
            started: false,
        }
    }

    /// Queue samples for a channel; reads consume them in order.
    pub fn push_samples(&mut self, channel: SensorChannel, samples: &[u8]) {
        self.queue_mut(channel).extend(samples.iter().copied());
    }

    /// Set the constant a channel yields once its script is exhausted.
    pub fn set_fallback(&mut self, channel: SensorChannel, sample: u8) {
        match channel {
            SensorChannel::Magnetic => self.magnetic_fallback = sample,
            SensorChannel::IrDifferential => self.infrared_fallback = sample,
        }
    }

    /// Recorded events so far, in order.
    pub fn events(&self) -> &[BoardEvent] {
        &self.events
    }

    /// Drain the recorded events, leaving the log empty.
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Current indicator state.
    pub fn indicator(&self) -> bool {
        self.indicator
    }

    /// Last commanded speed on a channel, if any command was issued.
    pub fn actuator_speed(&self, channel: ActuatorChannel) -> Option<u16> {
        match channel {
            ActuatorChannel::Right => self.right_speed,
            ActuatorChannel::Left => self.left_speed,
        }
    }

    /// Total delay time the loop has requested [delay units].
    pub fn elapsed_delay_units(&self) -> u64 {
        self.elapsed_delay_units
    }

    fn queue_mut(&mut self, channel: SensorChannel) -> &mut VecDeque<u8> {
        match channel {
            SensorChannel::Magnetic => &mut self.magnetic,
            SensorChannel::IrDifferential => &mut self.infrared,
        }
    }
}

impl Default for SimulatedBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Board for SimulatedBoard {
    fn init(&mut self) -> Result<(), HalError> {
        debug!("simulated board initialized");
        self.initialized = true;
        Ok(())
    }

    fn wait_for_start(&mut self) -> Result<(), HalError> {
        if !self.initialized {
            return Err(HalError::StartSignal(
                "board not initialized".to_string(),
            ));
        }
        // The simulated start button is always pressed.
        self.started = true;
        Ok(())
    }

    fn read_raw_sample(&mut self, channel: SensorChannel) -> u8 {
        let fallback = match channel {
            SensorChannel::Magnetic => self.magnetic_fallback,
            SensorChannel::IrDifferential => self.infrared_fallback,
        };
        self.queue_mut(channel).pop_front().unwrap_or(fallback)
    }

    fn set_indicator(&mut self, on: bool) {
        self.indicator = on;
        self.events.push(BoardEvent::Indicator(on));
    }

    fn delay(&mut self, units: u16) {
        self.elapsed_delay_units += u64::from(units);
        self.events.push(BoardEvent::Delay(units));
    }

    fn set_actuator(&mut self, channel: ActuatorChannel, speed: u16) {
        match channel {
            ActuatorChannel::Right => self.right_speed = Some(speed),
            ActuatorChannel::Left => self.left_speed = Some(speed),
        }
        self.events.push(BoardEvent::Actuator(channel, speed));
    }
}
