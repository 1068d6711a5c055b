//! Calibration constants and domain conversions.
//!
//! Single source of truth for the default calibration. All thresholds are
//! configured in millivolts and mapped into the 8-bit reading domain with
//! [`millivolts_to_level`]; drive endpoints are PWM timer counts measured
//! per drivetrain. Imported by all crates — no duplication permitted.

/// Analog reference rail [mV].
pub const ADC_RAIL_MV: u32 = 5000;

/// Granularity of the board delay primitive [units per second].
pub const DELAY_UNITS_PER_SEC: u16 = 8;

/// Map a voltage [mV] into the 8-bit reading domain.
///
/// 10-bit conversion over the 5 V rail, keeping the top 8 bits:
/// `(mv × 1024 / 5000) >> 2`. Integer division truncates. The product is
/// widened to 64 bits so no input can overflow, and voltages above the
/// rail saturate at 255.
pub const fn millivolts_to_level(mv: u32) -> u8 {
    let level = (mv as u64 * 1024 / ADC_RAIL_MV as u64) >> 2;
    if level > 255 { 255 } else { level as u8 }
}

/// Convert whole seconds into board delay units. Saturates instead of
/// wrapping for absurd durations.
pub const fn secs_to_delay_units(secs: u16) -> u16 {
    secs.saturating_mul(DELAY_UNITS_PER_SEC)
}

// ─── Default calibration ────────────────────────────────────────────

/// Default control cycle time [µs].
pub const DEFAULT_CYCLE_TIME_US: u32 = 1000;

/// Default inverse filter weight (1/N on the new sample) for both
/// sensor channels.
pub const DEFAULT_FILTER_INV_ALPHA: u8 = 16;

/// Line sensor: below this the vehicle turns right [mV].
pub const DEFAULT_TURN_RIGHT_MV: u32 = 2000;

/// Line sensor: above this the vehicle turns left [mV].
pub const DEFAULT_TURN_LEFT_MV: u32 = 3000;

/// Magnetic sensor: below this the field is in the low (blink) zone [mV].
pub const DEFAULT_MAGNET_BLINK_MV: u32 = 2000;

/// Magnetic sensor: above this the field is in the high (solid-on) zone [mV].
pub const DEFAULT_MAGNET_SOLID_ON_MV: u32 = 3000;

/// Indicator blink frequency in the low-field zone [Hz].
pub const DEFAULT_BLINK_FREQUENCY_HZ: u16 = 8;

/// Total duration of either indicator signal sequence [s].
pub const DEFAULT_SIGNAL_DURATION_S: u16 = 7;

// Drive endpoints in PWM timer counts (8 µs ticks). Measured on the
// drivetrain; the two sides are not symmetric.

/// Right drive: commanded count at standstill.
pub const DEFAULT_RIGHT_STOP: u16 = 187;

/// Right drive: commanded count at full speed.
pub const DEFAULT_RIGHT_FULL: u16 = 250;

/// Left drive: commanded count at standstill.
pub const DEFAULT_LEFT_STOP: u16 = 94;

/// Left drive: commanded count at full speed.
pub const DEFAULT_LEFT_FULL: u16 = 125;

// The defaults must satisfy the same ordering the runtime validation
// enforces on loaded configs.
use static_assertions::const_assert;

const_assert!(
    millivolts_to_level(DEFAULT_TURN_RIGHT_MV) < millivolts_to_level(DEFAULT_TURN_LEFT_MV)
);
const_assert!(
    millivolts_to_level(DEFAULT_MAGNET_BLINK_MV) <= millivolts_to_level(DEFAULT_MAGNET_SOLID_ON_MV)
);
const_assert!(DEFAULT_RIGHT_STOP < DEFAULT_RIGHT_FULL);
const_assert!(DEFAULT_LEFT_STOP < DEFAULT_LEFT_FULL);
const_assert!(DEFAULT_FILTER_INV_ALPHA >= 1);
