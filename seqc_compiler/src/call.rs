//! Symbolic assembler calls.
//!
//! A `Call` is a tagged opcode record; the compiler's output is an ordered
//! list of them per board. Final machine-code emission and transport live
//! behind the assembler handle and are not part of this crate.

use crate::encode::WaveformInstr;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel wait argument of a master trigger, back-filled once the first
/// sync frame's length is known.
pub const WAIT_TIME_PLACEHOLDER: u64 = u64::MAX;

/// One symbolic assembler call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "opcode", rename_all = "snake_case")]
pub enum Call {
    /// Masked TTL write: bits in `set_mask` take the level from `value_mask`.
    TtlConfig {
        /// Level bits, indexed by line.
        value_mask: u32,
        /// Lines the write applies to.
        set_mask: u32,
    },
    /// Idle for an exact cycle count.
    WaitMu {
        /// Cycles to wait.
        cycles: u64,
    },
    /// Idle for a microsecond duration (boundary convenience).
    WaitUs {
        /// Microseconds to wait.
        us: f64,
    },
    /// Configure an RF port's carrier.
    RwgInitializePort {
        /// Port index on the board.
        rf_port: u8,
        /// Carrier frequency [MHz].
        carrier_mhz: f64,
    },
    /// Toggle RF output enables.
    RwgRfSwitch {
        /// Ports the toggle applies to.
        rf_mask: u32,
        /// Requested output state.
        on: bool,
    },
    /// Pre-stage one SBG's waveform segment (machine units).
    RwgLoadWaveform {
        /// Encoded segment.
        params: WaveformInstr,
    },
    /// Latch pre-staged parameters and play.
    RwgPlay {
        /// Play window [µs].
        duration_us: f64,
        /// Parameter-update strobe mask.
        pud_mask: u32,
        /// I/O-update strobe mask.
        iou_mask: u32,
    },
    /// Master-side sync: release the slaves after `wait_cycles`.
    TriggerSlave {
        /// Cycles the slaves are held; placeholder until back-filled.
        wait_cycles: u64,
        /// Frame code matched by the slaves.
        sync_code: u16,
    },
    /// Slave-side sync: block until the master's trigger.
    WaitMaster {
        /// Frame code to match.
        sync_code: u16,
    },
}

impl Call {
    /// Stable opcode name for diagnostics and serialization.
    pub fn opcode_name(&self) -> &'static str {
        match self {
            Self::TtlConfig { .. } => "ttl_config",
            Self::WaitMu { .. } => "wait_mu",
            Self::WaitUs { .. } => "wait_us",
            Self::RwgInitializePort { .. } => "rwg_initialize_port",
            Self::RwgRfSwitch { .. } => "rwg_rf_switch",
            Self::RwgLoadWaveform { .. } => "rwg_load_waveform",
            Self::RwgPlay { .. } => "rwg_play",
            Self::TriggerSlave { .. } => "trigger_slave",
            Self::WaitMaster { .. } => "wait_master",
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TtlConfig {
                value_mask,
                set_mask,
            } => write!(f, "ttl_config value={value_mask:#x} set={set_mask:#x}"),
            Self::WaitMu { cycles } => write!(f, "wait_mu {cycles}"),
            Self::WaitUs { us } => write!(f, "wait_us {us}"),
            Self::RwgInitializePort {
                rf_port,
                carrier_mhz,
            } => write!(f, "rwg_initialize_port port={rf_port} carrier={carrier_mhz} MHz"),
            Self::RwgRfSwitch { rf_mask, on } => {
                write!(f, "rwg_rf_switch mask={rf_mask:#x} on={on}")
            }
            Self::RwgLoadWaveform { params } => write!(
                f,
                "rwg_load_waveform sbg={} scale={} regs={}",
                params.sbg,
                params.scale,
                params.flags.bits().count_ones()
            ),
            Self::RwgPlay {
                duration_us,
                pud_mask,
                iou_mask,
            } => write!(
                f,
                "rwg_play {duration_us} us pud={pud_mask:#x} iou={iou_mask:#x}"
            ),
            Self::TriggerSlave {
                wait_cycles,
                sync_code,
            } => {
                if *wait_cycles == WAIT_TIME_PLACEHOLDER {
                    write!(f, "trigger_slave wait=<pending> code={sync_code}")
                } else {
                    write!(f, "trigger_slave wait={wait_cycles} code={sync_code}")
                }
            }
            Self::WaitMaster { sync_code } => write!(f, "wait_master code={sync_code}"),
        }
    }
}
