//! Cycle/second conversion at the fixed 250 MHz sequencer clock.
//!
//! Every duration inside the core is an integer cycle count. Physical-unit
//! times are converted exactly once, at the API boundary, and rounded to
//! the nearest cycle.

/// Sequencer clock rate [Hz].
pub const CLOCK_HZ: u64 = 250_000_000;

/// Sequencer clock rate [MHz].
pub const CLOCK_MHZ: f64 = 250.0;

/// Duration of one clock cycle [ns].
pub const CYCLE_NS: f64 = 4.0;

/// Convert seconds to clock cycles (rounded to nearest).
#[inline]
pub fn cycles_from_secs(secs: f64) -> u64 {
    (secs * CLOCK_HZ as f64).round() as u64
}

/// Convert microseconds to clock cycles (rounded to nearest).
#[inline]
pub fn cycles_from_us(us: f64) -> u64 {
    (us * CLOCK_MHZ).round() as u64
}

/// Convert clock cycles to seconds.
#[inline]
pub fn secs_from_cycles(cycles: u64) -> f64 {
    cycles as f64 / CLOCK_HZ as f64
}

/// Convert clock cycles to microseconds.
#[inline]
pub fn us_from_cycles(cycles: u64) -> f64 {
    cycles as f64 / CLOCK_MHZ
}
