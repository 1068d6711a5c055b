//! Sensor smoothing filter.
//!
//! Exponentially weighted moving average over 8-bit samples: the new
//! sample is weighted 1/N, the retained average (N-1)/N. The recursive
//! form uses truncating integer division on purpose:
//!
//! ```text
//! average -= average / N;
//! average += sample / N;
//! ```
//!
//! The truncation biases the average toward the lower value; the
//! thresholds downstream are calibrated against exactly this behavior,
//! so the filter must not be replaced by a rounding EMA.

/// Running smoothed estimate for one sensor channel.
///
/// Seeded once from a raw read at startup and never reset afterwards.
#[derive(Debug, Clone, Copy)]
pub struct EwmaFilter {
    average: u8,
    inv_alpha: u8,
}

impl EwmaFilter {
    /// Create a filter seeded with an initial sample.
    ///
    /// `inv_alpha` is the inverse weight N; must be >= 1. Config
    /// validation enforces this on the loaded path; the debug assertion
    /// covers direct construction.
    pub fn seeded(sample: u8, inv_alpha: u8) -> Self {
        debug_assert!(inv_alpha >= 1, "inv_alpha must be >= 1");
        Self {
            average: sample,
            inv_alpha,
        }
    }

    /// Re-seed the average from a fresh raw sample.
    pub fn reseed(&mut self, sample: u8) {
        self.average = sample;
    }

    /// Fold one raw sample into the running average and return it.
    ///
    /// Cannot overflow: `average - average/N + sample/N` stays within
    /// [0, 255] for every N >= 1.
    #[inline]
    pub fn update(&mut self, sample: u8) -> u8 {
        self.average -= self.average / self.inv_alpha;
        self.average += sample / self.inv_alpha;
        self.average
    }

    /// Current smoothed value.
    #[inline]
    pub fn average(&self) -> u8 {
        self.average
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncating_trajectory_toward_zero() {
        // 128 with N=16 and zero samples: 128-8=120, 120-7=113, 113-7=106.
        let mut filter = EwmaFilter::seeded(128, 16);
        assert_eq!(filter.update(0), 120);
        assert_eq!(filter.update(0), 113);
        assert_eq!(filter.update(0), 106);
    }

    #[test]
    fn constant_input_is_a_fixed_point_at_extremes() {
        let mut filter = EwmaFilter::seeded(255, 16);
        for _ in 0..100 {
            assert_eq!(filter.update(255), 255);
        }
        let mut filter = EwmaFilter::seeded(0, 16);
        for _ in 0..100 {
            assert_eq!(filter.update(0), 0);
        }
    }

    #[test]
    fn converges_upward_but_truncation_stalls_short() {
        // Rising toward 255 the sample contributes 255/16 = 15 per step
        // while the decay removes average/16; the truncating recurrence
        // settles where average/16 == 15, i.e. at 240, not 255.
        let mut filter = EwmaFilter::seeded(0, 16);
        let mut last = 0;
        for _ in 0..200 {
            let next = filter.update(255);
            assert!(next >= last, "must be monotone rising");
            last = next;
        }
        assert_eq!(last, 240);
    }

    #[test]
    fn always_within_domain() {
        let mut filter = EwmaFilter::seeded(200, 16);
        let samples = [0u8, 255, 3, 254, 1, 255, 0, 128, 255, 0];
        for sample in samples.iter().cycle().take(1000).copied() {
            let avg = filter.update(sample);
            assert_eq!(avg, filter.average());
            // u8 guarantees the domain; the assert documents the invariant.
            let _: u8 = avg;
        }
    }

    #[test]
    fn inv_alpha_one_tracks_input() {
        let mut filter = EwmaFilter::seeded(77, 1);
        assert_eq!(filter.update(10), 10);
        assert_eq!(filter.update(250), 250);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "inv_alpha")]
    fn zero_inverse_weight_is_rejected() {
        let _ = EwmaFilter::seeded(128, 0);
    }

    #[test]
    fn reseed_overwrites_average() {
        let mut filter = EwmaFilter::seeded(0, 16);
        filter.reseed(200);
        assert_eq!(filter.average(), 200);
    }
}
