//! Waveform parameter records.
//!
//! An RWG load pre-stages one polynomial segment per SBG: Taylor
//! coefficients for frequency and amplitude, plus an initial phase. The
//! per-order change flags say which hardware registers the load actually
//! writes; the load's physical cost is proportional to that count.

use crate::consts::{MAX_ORDERS, MAX_SBG};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which parameter registers a load writes for one SBG.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct OrderFlags: u16 {
        /// Frequency, order 0 (value).
        const FREQ0 = 0x0001;
        /// Frequency, order 1 (slope).
        const FREQ1 = 0x0002;
        /// Frequency, order 2.
        const FREQ2 = 0x0004;
        /// Frequency, order 3.
        const FREQ3 = 0x0008;
        /// Amplitude, order 0 (value).
        const AMP0  = 0x0010;
        /// Amplitude, order 1 (slope).
        const AMP1  = 0x0020;
        /// Amplitude, order 2.
        const AMP2  = 0x0040;
        /// Amplitude, order 3.
        const AMP3  = 0x0080;
        /// Initial phase register.
        const PHASE = 0x0100;
    }
}

impl OrderFlags {
    /// Flags written by a static retune (value + phase, no slopes).
    pub const SET: Self = Self::from_bits_truncate(
        Self::FREQ0.bits() | Self::AMP0.bits() | Self::PHASE.bits(),
    );

    /// Flags written by a first-order sweep.
    pub const RAMP: Self = Self::from_bits_truncate(
        Self::FREQ0.bits() | Self::FREQ1.bits() | Self::AMP0.bits() | Self::AMP1.bits(),
    );

    /// Frequency flag for a polynomial order.
    #[inline]
    pub fn freq(order: usize) -> Self {
        Self::from_bits_truncate(Self::FREQ0.bits() << order)
    }

    /// Amplitude flag for a polynomial order.
    #[inline]
    pub fn amp(order: usize) -> Self {
        Self::from_bits_truncate(Self::AMP0.bits() << order)
    }
}

impl Default for OrderFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// One SBG entry of a load bundle, in physical units.
///
/// `freq[i]` is the i-th time derivative of the tone frequency in MHz/µsⁱ;
/// `amp[i]` likewise as a full-scale fraction per µsⁱ. Only orders whose
/// flag is set are written to hardware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SbgParams {
    /// Sideband generator index.
    pub sbg: u8,
    /// Frequency polynomial coefficients [MHz/µsⁱ].
    pub freq: [f64; MAX_ORDERS],
    /// Amplitude polynomial coefficients [full-scale/µsⁱ].
    pub amp: [f64; MAX_ORDERS],
    /// Initial phase [turns].
    pub phase: f64,
    /// Registers this entry writes.
    pub flags: OrderFlags,
}

impl SbgParams {
    /// Number of parameter registers written for this SBG.
    #[inline]
    pub fn param_count(&self) -> u32 {
        self.flags.bits().count_ones()
    }
}

/// Factory-level tone target for one SBG.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SbgTarget {
    /// Sideband generator index, `0..MAX_SBG`.
    pub sbg: u8,
    /// Target tone frequency [MHz].
    pub freq_mhz: f64,
    /// Target amplitude, full-scale fraction in `[-1, 1]`.
    pub amp: f64,
    /// Phase to latch [turns]; `None` keeps the accumulated phase.
    pub phase: Option<f64>,
}

impl SbgTarget {
    /// Target without a phase reset.
    pub fn new(sbg: u8, freq_mhz: f64, amp: f64) -> Self {
        Self {
            sbg,
            freq_mhz,
            amp,
            phase: None,
        }
    }

    /// Returns true when the index addresses real hardware.
    #[inline]
    pub fn sbg_in_range(&self) -> bool {
        self.sbg < MAX_SBG
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_flag_shortcuts() {
        assert_eq!(OrderFlags::freq(0), OrderFlags::FREQ0);
        assert_eq!(OrderFlags::freq(3), OrderFlags::FREQ3);
        assert_eq!(OrderFlags::amp(1), OrderFlags::AMP1);
        assert_eq!(OrderFlags::SET.bits().count_ones(), 3);
        assert_eq!(OrderFlags::RAMP.bits().count_ones(), 4);
    }

    #[test]
    fn param_count_follows_flags() {
        let mut p = SbgParams {
            sbg: 0,
            freq: [10.0, 0.0, 0.0, 0.0],
            amp: [0.5, 0.0, 0.0, 0.0],
            phase: 0.0,
            flags: OrderFlags::SET,
        };
        assert_eq!(p.param_count(), 3);
        p.flags = OrderFlags::RAMP;
        assert_eq!(p.param_count(), 4);
        p.flags = OrderFlags::all();
        assert_eq!(p.param_count(), 9);
    }

    #[test]
    fn target_range_check() {
        assert!(SbgTarget::new(0, 1.0, 0.5).sbg_in_range());
        assert!(SbgTarget::new(MAX_SBG - 1, 1.0, 0.5).sbg_in_range());
        assert!(!SbgTarget::new(MAX_SBG, 1.0, 0.5).sbg_in_range());
    }
}
