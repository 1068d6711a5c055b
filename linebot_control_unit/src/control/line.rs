//! Line-following policy.
//!
//! Three-way decision on the smoothed infrared differential reading:
//! below the turn-right threshold the right drive stops and the left runs
//! full (pivot right), above the turn-left threshold the mirror image,
//! otherwise both run full. Comparisons are strict — a reading equal to
//! either threshold falls in the straight band.
//!
//! This policy runs after the magnet policy every iteration and
//! unconditionally sets both targets, superseding any stop request the
//! magnet policy issued in the same iteration. The ordering is part of
//! the control contract; magnet stops only become visible in iterations
//! where the vehicle is already at standstill.

use super::ramp::RampChannel;

/// Line thresholds in the 8-bit reading domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineThresholds {
    /// Below this: pivot right.
    pub turn_right: u8,
    /// Above this: pivot left.
    pub turn_left: u8,
}

/// Steering decision for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    TurnRight,
    TurnLeft,
    Straight,
}

/// Classify the smoothed infrared reading.
#[inline]
pub fn decide(reading: u8, thresholds: &LineThresholds) -> Steer {
    if reading < thresholds.turn_right {
        Steer::TurnRight
    } else if reading > thresholds.turn_left {
        Steer::TurnLeft
    } else {
        Steer::Straight
    }
}

/// Set both drive targets for the decision.
pub fn apply(steer: Steer, right: &mut RampChannel, left: &mut RampChannel) {
    match steer {
        Steer::TurnRight => {
            right.set_target(right.bounds().stop);
            left.set_target(left.bounds().full);
        }
        Steer::TurnLeft => {
            right.set_target(right.bounds().full);
            left.set_target(left.bounds().stop);
        }
        Steer::Straight => {
            right.set_target(right.bounds().full);
            left.set_target(left.bounds().full);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ramp::ChannelBounds;

    const THRESHOLDS: LineThresholds = LineThresholds {
        turn_right: 102,
        turn_left: 153,
    };

    #[test]
    fn three_way_branches() {
        assert_eq!(decide(0, &THRESHOLDS), Steer::TurnRight);
        assert_eq!(decide(101, &THRESHOLDS), Steer::TurnRight);
        assert_eq!(decide(128, &THRESHOLDS), Steer::Straight);
        assert_eq!(decide(154, &THRESHOLDS), Steer::TurnLeft);
        assert_eq!(decide(255, &THRESHOLDS), Steer::TurnLeft);
    }

    #[test]
    fn threshold_equality_is_straight() {
        assert_eq!(decide(102, &THRESHOLDS), Steer::Straight);
        assert_eq!(decide(153, &THRESHOLDS), Steer::Straight);
    }

    #[test]
    fn apply_sets_both_targets() {
        let mut right = RampChannel::new(ChannelBounds {
            stop: 187,
            full: 250,
        });
        let mut left = RampChannel::new(ChannelBounds { stop: 94, full: 125 });

        apply(Steer::TurnRight, &mut right, &mut left);
        assert_eq!(right.target(), 187);
        assert_eq!(left.target(), 125);

        apply(Steer::TurnLeft, &mut right, &mut left);
        assert_eq!(right.target(), 250);
        assert_eq!(left.target(), 94);

        apply(Steer::Straight, &mut right, &mut left);
        assert_eq!(right.target(), 250);
        assert_eq!(left.target(), 125);
    }

    #[test]
    fn apply_overwrites_previous_request() {
        // A stop request written earlier in the iteration is superseded.
        let mut right = RampChannel::new(ChannelBounds {
            stop: 187,
            full: 250,
        });
        let mut left = RampChannel::new(ChannelBounds { stop: 94, full: 125 });
        right.set_target(187);
        left.set_target(94);
        apply(Steer::Straight, &mut right, &mut left);
        assert_eq!(right.target(), 250);
        assert_eq!(left.target(), 125);
    }
}
