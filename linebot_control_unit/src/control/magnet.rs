//! Magnet proximity policy.
//!
//! Classifies the smoothed magnetic reading into three zones. In the low
//! zone (reading below the blink threshold) a stopped vehicle blinks the
//! indicator for the configured duration; in the high zone (above the
//! solid-on threshold) it holds the indicator on for the same duration.
//! In either zone a moving vehicle instead has both drive targets
//! overridden to stop. Between the thresholds nothing happens.
//!
//! The signal sequences block the whole control loop; there is no
//! cancellation once one starts.

use linebot_common::consts::secs_to_delay_units;
use linebot_common::hal::Board;

use super::ramp::RampChannel;

/// Magnet thresholds and signal timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagnetParams {
    /// Below this: low-field (blink) zone.
    pub blink_threshold: u8,
    /// Above this: high-field (solid-on) zone.
    pub solid_threshold: u8,
    /// Blink frequency [Hz].
    pub blink_frequency_hz: u16,
    /// Total signal duration [s].
    pub signal_duration_s: u16,
}

/// Field zone for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnetZone {
    /// Reading below the blink threshold.
    Low,
    /// Between the thresholds (inclusive): no action.
    Neutral,
    /// Reading above the solid-on threshold.
    High,
}

/// Classify the smoothed magnetic reading. Equality with either
/// threshold is neutral.
#[inline]
pub fn classify(reading: u8, params: &MagnetParams) -> MagnetZone {
    if reading < params.blink_threshold {
        MagnetZone::Low
    } else if reading > params.solid_threshold {
        MagnetZone::High
    } else {
        MagnetZone::Neutral
    }
}

/// Half of one blink period in board delay units.
///
/// `1 / (2·f)` is computed in whole seconds, which truncates to zero for
/// every f >= 1: the toggles run back-to-back with no real wait. The
/// zero-length delays are still issued through the board, so a recording
/// board observes the full toggle cadence. The doubling is widened to 32
/// bits so no frequency in the u16 domain can overflow it.
#[inline]
pub fn blink_half_period_units(frequency_hz: u16) -> u16 {
    let half_period_s = 1 / (2 * u32::from(frequency_hz));
    secs_to_delay_units(half_period_s as u16)
}

/// Run the magnet policy for one iteration.
///
/// May block for the whole signal duration, or overwrite both channels'
/// targets with their stop values. The signal branches are taken only
/// when both channels are already commanded to standstill.
pub fn apply<B: Board>(
    board: &mut B,
    params: &MagnetParams,
    reading: u8,
    right: &mut RampChannel,
    left: &mut RampChannel,
) {
    match classify(reading, params) {
        MagnetZone::Low => {
            if right.is_stopped() && left.is_stopped() {
                blink_sequence(board, params);
            } else {
                right.set_target(right.bounds().stop);
                left.set_target(left.bounds().stop);
            }
        }
        MagnetZone::High => {
            if right.is_stopped() && left.is_stopped() {
                solid_sequence(board, params);
            } else {
                right.set_target(right.bounds().stop);
                left.set_target(left.bounds().stop);
            }
        }
        MagnetZone::Neutral => {}
    }
}

/// Blocking blink: `duration × frequency` on/off pairs, each edge
/// followed by a half-period delay.
fn blink_sequence<B: Board>(board: &mut B, params: &MagnetParams) {
    let half_period = blink_half_period_units(params.blink_frequency_hz);
    let cycles = u32::from(params.signal_duration_s) * u32::from(params.blink_frequency_hz);
    for _ in 0..cycles {
        board.set_indicator(true);
        board.delay(half_period);
        board.set_indicator(false);
        board.delay(half_period);
    }
}

/// Blocking solid signal: on, full-duration delay, off.
fn solid_sequence<B: Board>(board: &mut B, params: &MagnetParams) {
    board.set_indicator(true);
    board.delay(secs_to_delay_units(params.signal_duration_s));
    board.set_indicator(false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ramp::ChannelBounds;
    use linebot_hal::{BoardEvent, SimulatedBoard};

    const PARAMS: MagnetParams = MagnetParams {
        blink_threshold: 102,
        solid_threshold: 153,
        blink_frequency_hz: 8,
        signal_duration_s: 7,
    };

    fn channels() -> (RampChannel, RampChannel) {
        (
            RampChannel::new(ChannelBounds {
                stop: 187,
                full: 250,
            }),
            RampChannel::new(ChannelBounds { stop: 94, full: 125 }),
        )
    }

    fn moving_channels() -> (RampChannel, RampChannel) {
        let (mut right, mut left) = channels();
        right.set_target(250);
        left.set_target(125);
        right.advance();
        left.advance();
        (right, left)
    }

    #[test]
    fn zone_classification_with_boundaries() {
        assert_eq!(classify(0, &PARAMS), MagnetZone::Low);
        assert_eq!(classify(101, &PARAMS), MagnetZone::Low);
        assert_eq!(classify(102, &PARAMS), MagnetZone::Neutral);
        assert_eq!(classify(128, &PARAMS), MagnetZone::Neutral);
        assert_eq!(classify(153, &PARAMS), MagnetZone::Neutral);
        assert_eq!(classify(154, &PARAMS), MagnetZone::High);
        assert_eq!(classify(255, &PARAMS), MagnetZone::High);
    }

    #[test]
    fn blink_half_period_truncates_to_zero() {
        assert_eq!(blink_half_period_units(8), 0);
        assert_eq!(blink_half_period_units(1), 0);
    }

    #[test]
    fn blink_half_period_handles_extreme_frequencies() {
        // 2·f leaves the u16 domain above 32767 Hz; the widened
        // arithmetic still yields the truncated zero.
        assert_eq!(blink_half_period_units(32_768), 0);
        assert_eq!(blink_half_period_units(40_000), 0);
        assert_eq!(blink_half_period_units(u16::MAX), 0);
    }

    #[test]
    fn neutral_zone_does_nothing() {
        let mut board = SimulatedBoard::new();
        let (mut right, mut left) = moving_channels();
        let target_before = (right.target(), left.target());
        apply(&mut board, &PARAMS, 128, &mut right, &mut left);
        assert!(board.events().is_empty());
        assert_eq!((right.target(), left.target()), target_before);
    }

    #[test]
    fn low_zone_while_moving_overrides_targets() {
        let mut board = SimulatedBoard::new();
        let (mut right, mut left) = moving_channels();
        apply(&mut board, &PARAMS, 50, &mut right, &mut left);
        assert!(board.events().is_empty(), "no signal while moving");
        assert_eq!(right.target(), 187);
        assert_eq!(left.target(), 94);
    }

    #[test]
    fn high_zone_while_moving_overrides_targets() {
        let mut board = SimulatedBoard::new();
        let (mut right, mut left) = moving_channels();
        apply(&mut board, &PARAMS, 200, &mut right, &mut left);
        assert!(board.events().is_empty(), "no signal while moving");
        assert_eq!(right.target(), 187);
        assert_eq!(left.target(), 94);
    }

    #[test]
    fn one_stopped_channel_is_not_enough_for_a_signal() {
        let mut board = SimulatedBoard::new();
        let (mut right, mut left) = channels();
        left.set_target(125);
        left.advance();
        apply(&mut board, &PARAMS, 200, &mut right, &mut left);
        assert!(board.events().is_empty());
        assert_eq!(left.target(), 94);
    }

    #[test]
    fn high_zone_while_stopped_runs_solid_sequence() {
        let mut board = SimulatedBoard::new();
        let (mut right, mut left) = channels();
        apply(&mut board, &PARAMS, 200, &mut right, &mut left);
        assert_eq!(
            board.events(),
            &[
                BoardEvent::Indicator(true),
                BoardEvent::Delay(56),
                BoardEvent::Indicator(false),
            ]
        );
        // Targets were not touched.
        assert_eq!(right.target(), 187);
        assert_eq!(left.target(), 94);
    }

    #[test]
    fn low_zone_while_stopped_runs_blink_sequence() {
        let mut board = SimulatedBoard::new();
        let (mut right, mut left) = channels();
        apply(&mut board, &PARAMS, 10, &mut right, &mut left);
        // 7 s × 8 Hz = 56 on/off pairs, four events each.
        let events = board.events();
        assert_eq!(events.len(), 56 * 4);
        assert_eq!(events[0], BoardEvent::Indicator(true));
        assert_eq!(events[1], BoardEvent::Delay(0));
        assert_eq!(events[2], BoardEvent::Indicator(false));
        assert_eq!(events[3], BoardEvent::Delay(0));
        // Every delay collapsed to zero.
        assert_eq!(board.elapsed_delay_units(), 0);
        assert!(!board.indicator());
    }
}
