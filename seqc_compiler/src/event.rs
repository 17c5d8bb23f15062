//! Compiler-internal event model.
//!
//! Pass 0 flattens the morphism into per-board event lists; later passes
//! enrich them with calls, costs, and epochs, and may move load events
//! earlier. Events are owned by the pipeline and never exposed to callers;
//! the schedule report carries value copies instead.

use crate::call::Call;
use seqc_common::board::{BoardId, Channel};
use seqc_core::op::AtomicOp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One hardware-reaching operation at a logical timestamp.
#[derive(Debug, Clone)]
pub(crate) struct LogicalEvent {
    /// Channel the event drives.
    pub channel: Channel,
    /// Logical timestamp [cycles]; rewritten for rescheduled loads.
    pub ts_cyc: u64,
    /// The atomic operation behind the event.
    pub op: AtomicOp,
    /// Pre-translated calls (filled in pass 1).
    pub calls: Vec<Call>,
    /// Physical window [cycles] (filled in pass 2).
    pub cost_cyc: u64,
    /// Sync-frame index (filled in pass 2).
    pub epoch: u32,
}

impl LogicalEvent {
    /// Cycles the sequencer spends issuing this event's calls.
    #[inline]
    pub fn issue_cyc(&self) -> u64 {
        self.calls.len() as u64
    }

    /// Deterministic per-board ordering key.
    #[inline]
    pub fn sort_key(&self) -> (u64, u8, u8) {
        (self.ts_cyc, self.op.kind.stage(), self.channel.local_id)
    }
}

/// Per-board event lists, in deterministic board order.
pub(crate) type BoardEvents = BTreeMap<BoardId, Vec<LogicalEvent>>;

/// Committed placement of one load on a board's serial loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledLoadRecord {
    /// Board owning the loader.
    pub board: BoardId,
    /// Channel the load pre-stages.
    pub channel: Channel,
    /// Scheduled start [cycles].
    pub start_cyc: u64,
    /// Scheduled end [cycles]; `end = start + cost`.
    pub end_cyc: u64,
    /// Paired play timestamp, when the load has one.
    pub deadline_cyc: Option<u64>,
}

/// Start cycle of an epoch given the sync boundaries.
#[inline]
pub(crate) fn epoch_start(boundaries: &[u64], epoch: u32) -> u64 {
    if epoch == 0 {
        0
    } else {
        boundaries[(epoch - 1) as usize]
    }
}
