//! Speed ramp controller.
//!
//! Each drive channel moves its commanded speed toward the target with a
//! step that resets to 1 whenever the target changes and doubles on every
//! iteration the target is not yet reached. The step is never capped
//! directly; saturation at the channel's physical endpoints bounds it in
//! effect, so acceleration starts gentle and grows coarse.

/// Physical command endpoints for one drive channel.
///
/// The two channels of a vehicle carry distinct, independently measured
/// endpoints; they are not symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelBounds {
    /// Commanded value at standstill (channel minimum).
    pub stop: u16,
    /// Commanded value at full speed (channel maximum).
    pub full: u16,
}

/// Per-channel ramp state.
///
/// Initialized at the stop value; mutated once per loop iteration for the
/// lifetime of the process.
#[derive(Debug, Clone, Copy)]
pub struct RampChannel {
    bounds: ChannelBounds,
    current: u16,
    target: u16,
    prev_target: u16,
    step: u16,
}

impl RampChannel {
    /// Create a channel at standstill.
    pub fn new(bounds: ChannelBounds) -> Self {
        Self {
            bounds,
            current: bounds.stop,
            target: bounds.stop,
            prev_target: bounds.stop,
            step: 1,
        }
    }

    /// Request a target speed, clamped into the channel's bounds.
    ///
    /// The step reset happens in [`advance`](Self::advance), keyed off the
    /// previous iteration's target, so a target written several times
    /// within one iteration counts as a single change.
    #[inline]
    pub fn set_target(&mut self, target: u16) {
        self.target = target.clamp(self.bounds.stop, self.bounds.full);
    }

    /// Channel endpoints.
    #[inline]
    pub fn bounds(&self) -> ChannelBounds {
        self.bounds
    }

    /// Currently commanded speed.
    #[inline]
    pub fn current(&self) -> u16 {
        self.current
    }

    /// Current target speed.
    #[inline]
    pub fn target(&self) -> u16 {
        self.target
    }

    /// Current step increment.
    #[inline]
    pub fn step(&self) -> u16 {
        self.step
    }

    /// Whether the channel is commanded to standstill.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.current == self.bounds.stop
    }

    /// Advance one iteration toward the target and return the speed to
    /// emit.
    ///
    /// Sums and differences are widened to 32 bits before comparison and
    /// the doubling saturates, so the 16-bit state never wraps. The clamp
    /// check and the applied step use the same increment — this channel's
    /// own — which is what keeps `current` inside the bounds for every
    /// target sequence.
    pub fn advance(&mut self) -> u16 {
        if self.target != self.prev_target {
            self.step = 1;
            self.prev_target = self.target;
        }

        if self.current < self.target {
            let tentative = u32::from(self.current) + u32::from(self.step);
            if tentative > u32::from(self.bounds.full) {
                self.current = self.bounds.full;
            } else {
                self.current = tentative as u16;
                self.step = self.step.saturating_mul(2);
            }
        } else if self.current > self.target {
            let tentative = i32::from(self.current) - i32::from(self.step);
            if tentative < i32::from(self.bounds.stop) {
                self.current = self.bounds.stop;
            } else {
                self.current = tentative as u16;
                self.step = self.step.saturating_mul(2);
            }
        }

        self.current
    }
}
