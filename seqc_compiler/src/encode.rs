//! Machine-unit encoding of waveform segments.
//!
//! The hardware consumes Taylor segments: per order `i`,
//! `F_i = round(f_i · (2³²/250) · (2^(2S+5)/250)^i)` with `f_i` in MHz/µsⁱ,
//! and `A_i` identically with the amplitude full scale in place of the
//! frequency LSB. Order 0 is scale-independent; the per-segment scale `S`
//! stretches the higher-order words for precision and is chosen as the
//! largest value that still fits every word in a signed 32-bit register.

use seqc_common::waveform::{OrderFlags, SbgParams};
use serde::{Deserialize, Serialize};

/// Frequency LSB: phase-accumulator increments per MHz.
const FREQ_LSB: f64 = 4294967296.0 / 250.0; // 2^32 / 250

/// Amplitude full scale.
const AMP_FULL_SCALE: f64 = 32767.0; // 2^15 - 1

/// Highest selectable scale exponent.
const MAX_SCALE: u8 = 15;

/// One SBG's pre-staged segment in machine units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformInstr {
    /// Sideband generator index.
    pub sbg: u8,
    /// Frequency words per order; order 0 is the phase increment.
    pub freq_words: [i64; 4],
    /// Amplitude words per order.
    pub amp_words: [i64; 4],
    /// Initial phase as a 32-bit turn fraction.
    pub phase_word: u32,
    /// Scale exponent `S` shared by the higher-order words.
    pub scale: u8,
    /// Registers this segment writes.
    pub flags: OrderFlags,
}

/// Time stretch factor for one order at scale `s`.
#[inline]
fn order_factor(order: u32, s: u8) -> f64 {
    let r = f64::powi(2.0, 2 * s as i32 + 5) / 250.0;
    r.powi(order as i32)
}

fn words_at(p: &SbgParams, s: u8) -> ([i64; 4], [i64; 4]) {
    let mut freq = [0i64; 4];
    let mut amp = [0i64; 4];
    for i in 0..4 {
        let r = order_factor(i as u32, s);
        freq[i] = (p.freq[i] * FREQ_LSB * r).round() as i64;
        amp[i] = (p.amp[i] * AMP_FULL_SCALE * r).round() as i64;
    }
    (freq, amp)
}

/// Higher-order words must fit a signed 32-bit register; the order-0
/// frequency word is a raw phase increment and may use the full u32 range.
fn fits(freq: &[i64; 4], amp: &[i64; 4]) -> bool {
    const I32: i64 = i32::MAX as i64;
    freq[0] <= u32::MAX as i64
        && freq[0] >= 0
        && freq[1..].iter().all(|w| w.abs() <= I32)
        && amp.iter().all(|w| w.abs() <= I32)
}

/// Encode one physical-unit record into machine units.
///
/// Scale selection walks down from the largest exponent; the caller's
/// range validation guarantees the order-0 words always fit, so scale 0 is
/// a valid fallback.
pub fn encode_sbg(p: &SbgParams) -> WaveformInstr {
    let mut scale = 0u8;
    let mut chosen = words_at(p, 0);
    for s in (0..=MAX_SCALE).rev() {
        let w = words_at(p, s);
        if fits(&w.0, &w.1) {
            scale = s;
            chosen = w;
            break;
        }
    }
    let (freq_words, amp_words) = chosen;

    WaveformInstr {
        sbg: p.sbg,
        freq_words,
        amp_words,
        phase_word: phase_word(p.phase),
        scale,
        flags: p.flags,
    }
}

/// Phase in turns to a 32-bit turn fraction, wrapped into `[0, 1)`.
#[inline]
fn phase_word(turns: f64) -> u32 {
    let wrapped = turns.rem_euclid(1.0);
    ((wrapped * 4294967296.0).round() as u64 & 0xFFFF_FFFF) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_params(freq_mhz: f64, amp: f64) -> SbgParams {
        SbgParams {
            sbg: 0,
            freq: [freq_mhz, 0.0, 0.0, 0.0],
            amp: [amp, 0.0, 0.0, 0.0],
            phase: 0.0,
            flags: OrderFlags::FREQ0 | OrderFlags::AMP0,
        }
    }

    #[test]
    fn order0_follows_documented_formula() {
        let instr = encode_sbg(&static_params(125.0, 1.0));
        // 125 MHz is half the clock: half the u32 phase-accumulator range.
        assert_eq!(instr.freq_words[0], 1 << 31);
        assert_eq!(instr.amp_words[0], 32767);
    }

    #[test]
    fn zero_slopes_take_the_largest_scale() {
        let instr = encode_sbg(&static_params(10.0, 0.5));
        assert_eq!(instr.scale, MAX_SCALE);
        assert_eq!(instr.freq_words[1], 0);
    }

    #[test]
    fn ramp_scale_maximizes_precision_within_i32() {
        // 1 MHz/us slope: at S the word is 1 * 2^32/250 * 2^(2S+5)/250.
        let p = SbgParams {
            sbg: 1,
            freq: [0.0, 1.0, 0.0, 0.0],
            amp: [0.0, 0.0, 0.0, 0.0],
            phase: 0.0,
            flags: OrderFlags::RAMP,
        };
        let instr = encode_sbg(&p);
        assert_eq!(instr.scale, 4);
        assert!(instr.freq_words[1].abs() <= i32::MAX as i64);
        // One scale step up would overflow.
        let expected = (FREQ_LSB * f64::powi(2.0, 13) / 250.0).round() as i64;
        assert_eq!(instr.freq_words[1], expected);
    }

    #[test]
    fn negative_slopes_encode_signed() {
        let p = SbgParams {
            sbg: 2,
            freq: [5.0, -0.5, 0.0, 0.0],
            amp: [0.5, -0.05, 0.0, 0.0],
            phase: 0.0,
            flags: OrderFlags::RAMP,
        };
        let instr = encode_sbg(&p);
        assert!(instr.freq_words[1] < 0);
        assert!(instr.amp_words[1] < 0);
        assert!(instr.freq_words[0] > 0);
    }

    #[test]
    fn phase_word_wraps_turns() {
        assert_eq!(phase_word(0.0), 0);
        assert_eq!(phase_word(0.5), 1 << 31);
        assert_eq!(phase_word(1.25), 1 << 30);
        assert_eq!(phase_word(-0.75), 1 << 30);
    }
}
