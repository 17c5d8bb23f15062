//! Compiler error type.
//!
//! Every failure aborts the compile; no partial output is returned. Each
//! variant carries the context a caller needs for an actionable message:
//! the offending board, channel, and cycle where the failure has one, the
//! offending field for options errors. Silent repair is never attempted: a
//! program that cannot be scheduled exactly as written is an error.

use crate::options::OptionsError;
use seqc_common::board::{BoardId, Channel};
use thiserror::Error;

/// Why a scheduled program failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleCause {
    /// Two load windows overlap on one board's serial loader.
    #[error(
        "load windows overlap: {first} [{first_start_cyc}..{first_end_cyc}) and \
         {second} [{second_start_cyc}..{second_end_cyc})"
    )]
    OverlappingLoads {
        /// Channel of the earlier window.
        first: Channel,
        /// Earlier window start [cycles].
        first_start_cyc: u64,
        /// Earlier window end [cycles].
        first_end_cyc: u64,
        /// Channel of the later window.
        second: Channel,
        /// Later window start [cycles].
        second_start_cyc: u64,
        /// Later window end [cycles].
        second_end_cyc: u64,
    },

    /// A load's committed window ends after its play's cycle.
    #[error("load on {channel} ends at {end_cyc} after its play deadline {deadline_cyc}")]
    DeadlineMissed {
        /// Channel whose load is late.
        channel: Channel,
        /// Committed window end [cycles].
        end_cyc: u64,
        /// Paired play cycle.
        deadline_cyc: u64,
    },

    /// A load's issue burst runs past the next event's cycle.
    #[error("load issue burst on {channel} ({calls} calls) overruns the next event at {next_ts_cyc}")]
    IssueOverrun {
        /// Channel issuing the burst.
        channel: Channel,
        /// Calls in the burst.
        calls: usize,
        /// Cycle of the event being overrun.
        next_ts_cyc: u64,
    },

    /// Port initialization outside the first sync frame.
    #[error("rwg-init on {channel} in sync frame {epoch}; ports must initialize in frame 0")]
    InitOutsideFirstFrame {
        /// Channel being initialized.
        channel: Channel,
        /// Sync frame the init landed in.
        epoch: u32,
    },

    /// A load was pulled earlier than the sync-frame rules allow.
    #[error("load on {channel} pulled before its permitted sync-frame floor {floor_cyc}")]
    PulledPastFloor {
        /// Channel whose load was pulled.
        channel: Channel,
        /// Earliest cycle the pull rules allow.
        floor_cyc: u64,
    },

    /// A load was staged before the preceding play latched the registers.
    #[error("load on {channel} staged before the preceding play at {latch_cyc} latched")]
    StagedBeforeLatch {
        /// Channel whose staging raced the latch.
        channel: Channel,
        /// Cycle of the preceding play.
        latch_cyc: u64,
    },
}

/// Fatal compilation failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The morphism still contains unresolved states or coefficients.
    #[error(
        "channel {channel}: op {index} at cycle {ts_cyc} has unresolved state; \
         chain the program from its init factories before compiling"
    )]
    UnresolvedState {
        /// Channel (and thereby board) with the unresolved op.
        channel: Channel,
        /// Op index within the lane.
        index: usize,
        /// Lane cursor at the op [cycles].
        ts_cyc: u64,
    },

    /// A load cannot finish before its play deadline under the serial
    /// loader constraint.
    #[error(
        "board {board}, channel {channel}: load needs {cost_cyc} cycles but must \
         finish by cycle {deadline_cyc} (earliest start {earliest_cyc})"
    )]
    TimingViolation {
        /// Board owning the loader.
        board: BoardId,
        /// Channel whose load failed to place.
        channel: Channel,
        /// Latest-finish deadline [cycles].
        deadline_cyc: u64,
        /// Load window length [cycles].
        cost_cyc: u64,
        /// Earliest start the serial loader and epoch rules allow.
        earliest_cyc: u64,
    },

    /// A scheduled-program invariant does not hold.
    #[error("schedule invariant violated on board {board} at cycle {ts_cyc}: {cause}")]
    Schedule {
        /// Board the violation was found on.
        board: BoardId,
        /// Timestamp of the offending event [cycles].
        ts_cyc: u64,
        /// Which invariant failed.
        cause: ScheduleCause,
    },

    /// Compiler options failed to load or validate.
    #[error("compiler options: {0}")]
    Options(#[from] OptionsError),

    /// Unreachable condition; a compiler bug.
    #[error("internal assertion in {pass} on board {board} at cycle {ts_cyc}: {cause}")]
    Internal {
        /// Pass that tripped.
        pass: &'static str,
        /// Board being processed.
        board: BoardId,
        /// Timestamp of the event being processed [cycles].
        ts_cyc: u64,
        /// Description.
        cause: String,
    },
}
