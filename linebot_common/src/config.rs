//! Calibration configuration types.
//!
//! `CalibrationConfig` captures everything that varies per vehicle:
//! filter decay, threshold voltages, drive endpoints, signal timing and
//! cycle period. Defaults reproduce the constants in [`crate::consts`];
//! the TOML loader lives in the control unit crate.

use serde::Deserialize;

use crate::consts::{
    ADC_RAIL_MV, DEFAULT_BLINK_FREQUENCY_HZ, DEFAULT_CYCLE_TIME_US, DEFAULT_FILTER_INV_ALPHA,
    DEFAULT_LEFT_FULL, DEFAULT_LEFT_STOP, DEFAULT_MAGNET_BLINK_MV, DEFAULT_MAGNET_SOLID_ON_MV,
    DEFAULT_RIGHT_FULL, DEFAULT_RIGHT_STOP, DEFAULT_SIGNAL_DURATION_S, DEFAULT_TURN_LEFT_MV,
    DEFAULT_TURN_RIGHT_MV, millivolts_to_level,
};

/// Cycle time sanity bounds [µs].
pub const CYCLE_TIME_MIN_US: u32 = 100;
pub const CYCLE_TIME_MAX_US: u32 = 100_000;

// ─── Sections ───────────────────────────────────────────────────────

/// Per-channel smoothing filter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Inverse weight on the new magnetic sample (1/N).
    pub hall_inv_alpha: u8,
    /// Inverse weight on the new infrared sample (1/N).
    pub ir_inv_alpha: u8,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            hall_inv_alpha: DEFAULT_FILTER_INV_ALPHA,
            ir_inv_alpha: DEFAULT_FILTER_INV_ALPHA,
        }
    }
}

/// Line-following thresholds [mV].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Below this reading the vehicle turns right.
    pub turn_right_mv: u32,
    /// Above this reading the vehicle turns left.
    pub turn_left_mv: u32,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            turn_right_mv: DEFAULT_TURN_RIGHT_MV,
            turn_left_mv: DEFAULT_TURN_LEFT_MV,
        }
    }
}

/// Magnet proximity thresholds and signal timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MagnetConfig {
    /// Below this reading the field is in the low (blink) zone [mV].
    pub blink_mv: u32,
    /// Above this reading the field is in the high (solid-on) zone [mV].
    pub solid_on_mv: u32,
    /// Indicator blink frequency [Hz].
    pub blink_frequency_hz: u16,
    /// Total duration of either signal sequence [s].
    pub signal_duration_s: u16,
}

impl Default for MagnetConfig {
    fn default() -> Self {
        Self {
            blink_mv: DEFAULT_MAGNET_BLINK_MV,
            solid_on_mv: DEFAULT_MAGNET_SOLID_ON_MV,
            blink_frequency_hz: DEFAULT_BLINK_FREQUENCY_HZ,
            signal_duration_s: DEFAULT_SIGNAL_DURATION_S,
        }
    }
}

/// One actuator channel's physical endpoints [PWM counts].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DriveChannelConfig {
    /// Commanded count at standstill.
    pub stop: u16,
    /// Commanded count at full speed.
    pub full: u16,
}

// ─── Top-level config ───────────────────────────────────────────────

/// Complete vehicle calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Control cycle time [µs].
    pub cycle_time_us: u32,
    pub filter: FilterConfig,
    pub line: LineConfig,
    pub magnet: MagnetConfig,
    /// Right drive endpoints.
    pub right: DriveChannelConfig,
    /// Left drive endpoints.
    pub left: DriveChannelConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: DEFAULT_CYCLE_TIME_US,
            filter: FilterConfig::default(),
            line: LineConfig::default(),
            magnet: MagnetConfig::default(),
            right: DriveChannelConfig {
                stop: DEFAULT_RIGHT_STOP,
                full: DEFAULT_RIGHT_FULL,
            },
            left: DriveChannelConfig {
                stop: DEFAULT_LEFT_STOP,
                full: DEFAULT_LEFT_FULL,
            },
        }
    }
}

impl CalibrationConfig {
    /// Validate parameter bounds and ordering relationships.
    pub fn validate(&self) -> Result<(), String> {
        if self.cycle_time_us < CYCLE_TIME_MIN_US || self.cycle_time_us > CYCLE_TIME_MAX_US {
            return Err(format!(
                "cycle_time_us {} out of range [{CYCLE_TIME_MIN_US}, {CYCLE_TIME_MAX_US}]",
                self.cycle_time_us
            ));
        }
        if self.filter.hall_inv_alpha == 0 || self.filter.ir_inv_alpha == 0 {
            return Err("filter inv_alpha must be >= 1".to_string());
        }
        for (name, mv) in [
            ("line turn_right_mv", self.line.turn_right_mv),
            ("line turn_left_mv", self.line.turn_left_mv),
            ("magnet blink_mv", self.magnet.blink_mv),
            ("magnet solid_on_mv", self.magnet.solid_on_mv),
        ] {
            if mv > ADC_RAIL_MV {
                return Err(format!("{name} {mv} exceeds the {ADC_RAIL_MV} mV rail"));
            }
        }
        let turn_right = millivolts_to_level(self.line.turn_right_mv);
        let turn_left = millivolts_to_level(self.line.turn_left_mv);
        if turn_right >= turn_left {
            return Err(format!(
                "line thresholds out of order: turn_right {} >= turn_left {} (levels {turn_right} >= {turn_left})",
                self.line.turn_right_mv, self.line.turn_left_mv
            ));
        }
        let blink = millivolts_to_level(self.magnet.blink_mv);
        let solid = millivolts_to_level(self.magnet.solid_on_mv);
        if blink > solid {
            return Err(format!(
                "magnet thresholds out of order: blink {} > solid_on {} (levels {blink} > {solid})",
                self.magnet.blink_mv, self.magnet.solid_on_mv
            ));
        }
        if self.magnet.blink_frequency_hz == 0 {
            return Err("magnet blink_frequency_hz must be >= 1".to_string());
        }
        if self.magnet.signal_duration_s == 0 {
            return Err("magnet signal_duration_s must be >= 1".to_string());
        }
        for (name, ch) in [("right", &self.right), ("left", &self.left)] {
            if ch.stop >= ch.full {
                return Err(format!(
                    "{name} drive endpoints out of order: stop {} >= full {}",
                    ch.stop, ch.full
                ));
            }
        }
        Ok(())
    }
}
