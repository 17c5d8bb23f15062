//! Pass 5: emission and sync back-fill.
//!
//! Walks each board's final events in timestamp order, inserting waits for
//! the gaps. The physical cursor absorbs instruction-issue costs into the
//! following wait, so the emitted timeline's length equals the logical
//! total. The master wait is the longest first-frame cursor across all
//! boards plus the safety margin; it replaces every placeholder.

use super::cost::SYNC_STAGE;
use crate::call::{Call, WAIT_TIME_PLACEHOLDER};
use crate::event::BoardEvents;
use crate::options::CompileOptions;
use seqc_common::board::BoardId;
use std::collections::BTreeMap;
use tracing::debug;

pub(crate) fn run(
    boards: &BoardEvents,
    opts: &CompileOptions,
) -> BTreeMap<BoardId, Vec<Call>> {
    let mut programs = BTreeMap::new();
    let mut epoch0_cursors = Vec::with_capacity(boards.len());

    for (board, events) in boards {
        let mut calls = Vec::new();
        let mut cursor = 0u64;
        let mut epoch0_end: Option<u64> = None;

        for e in events {
            if e.ts_cyc > cursor {
                calls.push(Call::WaitMu {
                    cycles: e.ts_cyc - cursor,
                });
                cursor = e.ts_cyc;
            }
            // The board leaves its first frame at the first sync event of
            // frame 1; the cursor reached by then is what the master must
            // wait out.
            if epoch0_end.is_none() && e.epoch >= 1 && e.op.kind.stage() == SYNC_STAGE {
                epoch0_end = Some(cursor);
            }
            calls.extend(e.calls.iter().cloned());
            cursor += e.issue_cyc();
        }

        epoch0_cursors.push(epoch0_end.unwrap_or(cursor));
        programs.insert(board.clone(), calls);
    }

    let master_wait =
        epoch0_cursors.iter().copied().max().unwrap_or(0) + opts.sync_safety_margin_cyc;
    for calls in programs.values_mut() {
        for call in calls.iter_mut() {
            if let Call::TriggerSlave { wait_cycles, .. } = call {
                if *wait_cycles == WAIT_TIME_PLACEHOLDER {
                    *wait_cycles = master_wait;
                }
            }
        }
    }

    debug!(
        boards = programs.len(),
        master_wait, "emitted programs"
    );
    programs
}
