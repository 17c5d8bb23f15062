//! Pass 0: event extraction.
//!
//! Flattens every lane with a running cursor; each hardware-reaching op
//! becomes a `LogicalEvent` at the cursor's cycle. State-transparent ops
//! (holds, syncs) may stay unresolved, everything else must have concrete
//! endpoints and derived parameters by now.

use crate::error::CompileError;
use crate::event::{BoardEvents, LogicalEvent};
use seqc_core::op::OpKind;
use seqc_core::Morphism;
use std::collections::BTreeMap;
use tracing::debug;

fn state_transparent(kind: OpKind) -> bool {
    matches!(kind, OpKind::Hold | OpKind::SyncMaster | OpKind::SyncSlave)
}

pub(crate) fn run(m: &Morphism) -> Result<BoardEvents, CompileError> {
    let mut boards: BoardEvents = BTreeMap::new();

    for (ch, lane) in m.lanes() {
        let mut cursor = 0u64;
        for (index, op) in lane.ops().iter().enumerate() {
            if !state_transparent(op.kind) && !op.is_resolved() {
                return Err(CompileError::UnresolvedState {
                    channel: ch.clone(),
                    index,
                    ts_cyc: cursor,
                });
            }
            if op.kind.is_event() {
                boards
                    .entry(ch.board.clone())
                    .or_default()
                    .push(LogicalEvent {
                        channel: ch.clone(),
                        ts_cyc: cursor,
                        op: op.clone(),
                        calls: Vec::new(),
                        cost_cyc: 0,
                        epoch: 0,
                    });
            }
            cursor += op.duration_cyc;
        }
    }

    // Stable sort keeps lane order for same-key events.
    for events in boards.values_mut() {
        events.sort_by_key(LogicalEvent::sort_key);
    }

    debug!(
        boards = boards.len(),
        events = boards.values().map(Vec::len).sum::<usize>(),
        "extracted events"
    );
    Ok(boards)
}
