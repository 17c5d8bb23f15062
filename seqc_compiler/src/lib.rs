//! SEQC Compiler Library
//!
//! Lowers a timing [`Morphism`] to board-scoped, cycle-accurate assembler
//! calls for the 250 MHz control SoC. The pipeline is a pure function:
//! identical inputs produce byte-identical outputs, user-observable
//! operations are never reordered, and user durations are never adjusted.
//! The only scheduling freedom the compiler takes is hiding coefficient
//! loads inside otherwise-idle windows, under a strict per-board serial
//! loader.
//!
//! # Module Structure
//!
//! - [`call`] - Symbolic assembler calls
//! - [`encode`] - Machine-unit waveform encoding
//! - [`assembler`] - The opaque emission sink
//! - `passes` - The six pipeline passes (internal)
//! - [`options`] - Tunable behavior, loadable from TOML
//! - [`error`] - `CompileError`
//! - text and JSON renderings live on [`CompileReport`]
//!
//! # Usage
//!
//! ```rust
//! use seqc_common::board::Channel;
//! use seqc_core::factory::{hold_us, ttl_init, ttl_off, ttl_on};
//! use seqc_compiler::{compile, CompileOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ch = Channel::ttl("RWG_0", 0);
//! let pulse = ttl_init(&ch)?
//!     .then(&ttl_on(&ch)?)?
//!     .then(&hold_us(&ch, 10.0)?)?
//!     .then(&ttl_off(&ch)?)?;
//! let programs = compile(&pulse, &CompileOptions::default())?;
//! assert_eq!(programs.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod call;
pub mod encode;
pub mod error;
mod event;
pub mod options;
mod passes;
mod report;

use seqc_common::board::BoardId;
use seqc_core::Morphism;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

pub use assembler::{AssemblerHandle, NullAssembler, RecordingAssembler};
pub use call::{Call, WAIT_TIME_PLACEHOLDER};
pub use encode::WaveformInstr;
pub use error::{CompileError, ScheduleCause};
pub use event::ScheduledLoadRecord;
pub use options::{CompileOptions, OptionsError};

/// Ordered call lists keyed by board.
pub type BoardPrograms = BTreeMap<BoardId, Vec<Call>>;

/// Full pipeline output, including the schedule's bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    /// Per-board call lists.
    pub programs: BoardPrograms,
    /// Committed load placements, in scheduling order.
    pub loads: Vec<ScheduledLoadRecord>,
    /// Sync-frame boundary cycles, ascending.
    pub epoch_boundaries: Vec<u64>,
}

/// Compile a morphism to per-board call lists.
pub fn compile(m: &Morphism, opts: &CompileOptions) -> Result<BoardPrograms, CompileError> {
    compile_detailed(m, opts).map(|report| report.programs)
}

/// Compile and keep the schedule report for inspection.
pub fn compile_detailed(
    m: &Morphism,
    opts: &CompileOptions,
) -> Result<CompileReport, CompileError> {
    debug!(
        channels = m.channel_count(),
        duration_cyc = m.total_duration(),
        "compile start"
    );
    let mut events = passes::extract::run(m)?;
    passes::translate::run(&mut events)?;
    let epoch_boundaries = passes::cost::run(&mut events);
    let loads = passes::schedule::run(&mut events, &epoch_boundaries, opts)?;
    passes::validate::run(&events, &loads, &epoch_boundaries, opts)?;
    let programs = passes::emit::run(&events, opts);

    Ok(CompileReport {
        programs,
        loads,
        epoch_boundaries,
    })
}

/// Compile and stream the result into an assembler handle.
///
/// The handle sees each board once, in board order, with every call in its
/// final back-filled form.
pub fn compile_into(
    m: &Morphism,
    asm: &mut dyn AssemblerHandle,
    opts: &CompileOptions,
) -> Result<BoardPrograms, CompileError> {
    let programs = compile(m, opts)?;
    for (board, calls) in &programs {
        asm.begin_board(board);
        for call in calls {
            asm.emit(board, call);
        }
    }
    Ok(programs)
}
