//! Fixed-rate control cycle: sample → filter → policies → ramp → emit.
//!
//! Implements the main control loop with cycle time measurement and
//! overrun accounting. The simulation build paces with `std::thread::sleep`;
//! the `rt` feature switches to `clock_nanosleep(TIMER_ABSTIME)` on
//! `CLOCK_MONOTONIC` for drift-free pacing after the RT setup sequence.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)` — lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` — pin to an isolated CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO)` — RT priority.
//!
//! ## Overruns
//! Overruns are counted and logged, never fatal: the magnet policy's
//! blocking signal sequences legitimately exceed the cycle budget by
//! seconds, and the vehicle must keep running afterwards.

use linebot_common::config::CalibrationConfig;
use linebot_common::consts::millivolts_to_level;
use linebot_common::hal::{ActuatorChannel, Board, HalError, SensorChannel};
use tracing::warn;

use crate::control::filter::EwmaFilter;
use crate::control::line::{self, LineThresholds};
use crate::control::magnet::{self, MagnetParams};
use crate::control::ramp::{ChannelBounds, RampChannel};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
///
/// Updated every cycle with no allocation.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Number of overruns detected.
    pub overruns: u64,
}

impl CycleStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        if duration_ns < self.min_cycle_ns {
            self.min_cycle_ns = duration_ns;
        }
        if duration_ns > self.max_cycle_ns {
            self.max_cycle_ns = duration_ns;
        }
        self.sum_cycle_ns += duration_ns;
    }

    /// Average cycle time [ns] (returns 0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors during RT setup or loop startup.
#[derive(Debug)]
pub enum CycleError {
    /// RT system call failed.
    RtSetup(String),
    /// Board initialization or start gate failed.
    Hal(HalError),
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RtSetup(msg) => write!(f, "RT setup error: {msg}"),
            Self::Hal(e) => write!(f, "board error: {e}"),
        }
    }
}

impl std::error::Error for CycleError {}

impl From<HalError> for CycleError {
    fn from(e: HalError) -> Self {
        Self::Hal(e)
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Lock all current and future memory pages (prevent page faults in the
/// loop). No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(()) // No-op in simulation mode
}

/// Prefault stack pages to prevent page faults during execution.
fn prefault_stack() {
    let mut buf = [0u8; 64 * 1024];
    for byte in buf.iter_mut() {
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

/// Pin the current thread to a specific CPU core.
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(()) // No-op in simulation mode
}

/// Set SCHED_FIFO with the given RT priority.
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(()) // No-op in simulation mode
}

/// Perform the full RT setup sequence.
///
/// Must be called before entering the cycle loop. In simulation mode
/// (no `rt` feature), all RT calls are no-ops.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// The main control loop runner.
///
/// Owns the board, both sensor filters, both ramp channels and the
/// derived policy parameters. `run()` enters the infinite loop.
pub struct CycleRunner<B: Board> {
    board: B,
    hall_filter: EwmaFilter,
    ir_filter: EwmaFilter,
    right: RampChannel,
    left: RampChannel,
    line: LineThresholds,
    magnet: MagnetParams,
    cycle_time_ns: i64,
    /// Cycle timing statistics.
    pub stats: CycleStats,
}

impl<B: Board> CycleRunner<B> {
    /// Create a runner from a validated calibration.
    ///
    /// Filters start at mid-scale until [`start`](Self::start) seeds them
    /// from real reads; both channels start at standstill.
    pub fn new(board: B, config: &CalibrationConfig) -> Self {
        Self {
            board,
            hall_filter: EwmaFilter::seeded(128, config.filter.hall_inv_alpha),
            ir_filter: EwmaFilter::seeded(128, config.filter.ir_inv_alpha),
            right: RampChannel::new(ChannelBounds {
                stop: config.right.stop,
                full: config.right.full,
            }),
            left: RampChannel::new(ChannelBounds {
                stop: config.left.stop,
                full: config.left.full,
            }),
            line: LineThresholds {
                turn_right: millivolts_to_level(config.line.turn_right_mv),
                turn_left: millivolts_to_level(config.line.turn_left_mv),
            },
            magnet: MagnetParams {
                blink_threshold: millivolts_to_level(config.magnet.blink_mv),
                solid_threshold: millivolts_to_level(config.magnet.solid_on_mv),
                blink_frequency_hz: config.magnet.blink_frequency_hz,
                signal_duration_s: config.magnet.signal_duration_s,
            },
            cycle_time_ns: i64::from(config.cycle_time_us) * 1000,
            stats: CycleStats::new(),
        }
    }

    /// Initialize the board, wait for the start signal and seed both
    /// filters from one raw read each.
    pub fn start(&mut self) -> Result<(), CycleError> {
        self.board.init()?;
        self.board.wait_for_start()?;
        let hall = self.board.read_raw_sample(SensorChannel::Magnetic);
        self.hall_filter.reseed(hall);
        let ir = self.board.read_raw_sample(SensorChannel::IrDifferential);
        self.ir_filter.reseed(ir);
        Ok(())
    }

    /// Execute one loop iteration.
    ///
    /// Phase order is an invariant: sample+filter both channels, magnet
    /// policy, line policy, ramp advance and emission (right then left).
    /// The magnet policy may block for a whole signal sequence; the line
    /// policy then still runs in the same iteration and supersedes any
    /// stop targets the magnet policy requested.
    pub fn step(&mut self) {
        // ═══ SAMPLE + FILTER ═══
        let hall_raw = self.board.read_raw_sample(SensorChannel::Magnetic);
        let hall_avg = self.hall_filter.update(hall_raw);
        let ir_raw = self.board.read_raw_sample(SensorChannel::IrDifferential);
        let ir_avg = self.ir_filter.update(ir_raw);

        // ═══ POLICIES ═══
        magnet::apply(
            &mut self.board,
            &self.magnet,
            hall_avg,
            &mut self.right,
            &mut self.left,
        );
        let steer = line::decide(ir_avg, &self.line);
        line::apply(steer, &mut self.right, &mut self.left);

        // ═══ RAMP + EMIT ═══
        let right_speed = self.right.advance();
        self.board.set_actuator(ActuatorChannel::Right, right_speed);
        let left_speed = self.left.advance();
        self.board.set_actuator(ActuatorChannel::Left, left_speed);
    }

    /// Enter the infinite fixed-rate loop.
    ///
    /// Never returns under normal operation. Overruns are counted and
    /// logged but never terminate the loop.
    pub fn run(&mut self) -> Result<(), CycleError> {
        #[cfg(feature = "rt")]
        {
            self.run_rt_loop()
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_sim_loop()
        }
    }

    /// RT cycle loop using `clock_nanosleep(TIMER_ABSTIME)`.
    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let mut next_wake = clock_gettime(clock)
            .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

        loop {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

            self.step();

            let cycle_end = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);

            self.stats.record(duration_ns);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                warn!(
                    duration_ns,
                    budget_ns = self.cycle_time_ns,
                    "cycle overrun"
                );
                // Re-anchor the schedule so one long cycle (a signal
                // sequence) does not cause a burst of catch-up cycles.
                next_wake = cycle_end;
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
    }

    /// Simulation cycle loop using `std::thread::sleep`.
    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self) -> Result<(), CycleError> {
        use std::time::Instant;

        let cycle_duration = std::time::Duration::from_nanos(self.cycle_time_ns as u64);

        loop {
            let cycle_start = Instant::now();

            self.step();

            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;

            self.stats.record(duration_ns);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                warn!(
                    duration_ns,
                    budget_ns = self.cycle_time_ns,
                    "cycle overrun"
                );
            }

            if let Some(remaining) = cycle_duration.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
    }

    /// Access the board (for tests and diagnostics).
    pub fn board(&self) -> &B {
        &self.board
    }

    /// Mutable access to the board (for tests and diagnostics).
    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

/// Add nanoseconds to a TimeSpec.
#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// Compute the difference (a - b) in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
