//! Pass 1: translation.
//!
//! Synthesizes the call list that would realize each event in isolation.
//! TTL events of the same stage at the same cycle on one board fuse into a
//! single masked write; consecutive slave waits with the same code collapse
//! into one.

use crate::call::{Call, WAIT_TIME_PLACEHOLDER};
use crate::encode::encode_sbg;
use crate::error::CompileError;
use crate::event::{BoardEvents, LogicalEvent};
use seqc_common::board::BoardId;
use seqc_common::time::us_from_cycles;
use seqc_core::op::{OpKind, OpParams};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

fn is_ttl(kind: OpKind) -> bool {
    matches!(kind, OpKind::TtlInit | OpKind::TtlOn | OpKind::TtlOff)
}

pub(crate) fn run(boards: &mut BoardEvents) -> Result<(), CompileError> {
    for (board, events) in boards.iter_mut() {
        *events = translate_board(board, events)?;
    }
    debug!(
        calls = boards
            .values()
            .flat_map(|es| es.iter().map(|e| e.calls.len()))
            .sum::<usize>(),
        "translated events"
    );
    Ok(())
}

fn translate_board(
    board: &BoardId,
    events: &[LogicalEvent],
) -> Result<Vec<LogicalEvent>, CompileError> {
    // Masked-write fusion groups TTL events by (cycle, stage) regardless of
    // their position in the sorted list.
    let mut ttl_masks: BTreeMap<(u64, u8), (u32, u32)> = BTreeMap::new();
    for e in events {
        if !is_ttl(e.op.kind) {
            continue;
        }
        let entry = ttl_masks
            .entry((e.ts_cyc, e.op.kind.stage()))
            .or_insert((0, 0));
        entry.1 |= e.channel.bit();
        if e.op.kind == OpKind::TtlOn {
            entry.0 |= e.channel.bit();
        }
    }

    let mut emitted_ttl: BTreeSet<(u64, u8)> = BTreeSet::new();
    let mut out: Vec<LogicalEvent> = Vec::with_capacity(events.len());

    for e in events {
        if is_ttl(e.op.kind) {
            let key = (e.ts_cyc, e.op.kind.stage());
            if !emitted_ttl.insert(key) {
                continue; // already carried by the fused write
            }
            let (value_mask, set_mask) = ttl_masks[&key];
            let mut fused = e.clone();
            fused.calls = vec![Call::TtlConfig {
                value_mask,
                set_mask,
            }];
            out.push(fused);
            continue;
        }

        let calls = translate_event(board, e)?;

        // Adjacent slave waits with the same code collapse into one.
        if e.op.kind == OpKind::SyncSlave {
            if let Some(prev) = out.last() {
                if prev.op.kind == OpKind::SyncSlave && prev.calls == calls {
                    continue;
                }
            }
        }

        let mut translated = e.clone();
        translated.calls = calls;
        out.push(translated);
    }

    Ok(out)
}

fn translate_event(board: &BoardId, e: &LogicalEvent) -> Result<Vec<Call>, CompileError> {
    let malformed = || CompileError::Internal {
        pass: "translate",
        board: board.clone(),
        ts_cyc: e.ts_cyc,
        cause: format!(
            "malformed parameter bundle for {} on {}",
            e.op.kind.tag(),
            e.channel
        ),
    };

    let calls = match (&e.op.kind, &e.op.params) {
        (OpKind::RwgInit | OpKind::RwgSetCarrier, OpParams::Carrier { mhz }) => {
            vec![Call::RwgInitializePort {
                rf_port: e.channel.local_id,
                carrier_mhz: *mhz,
            }]
        }
        (
            OpKind::RwgLoadCoeffs,
            OpParams::Load {
                coeffs: Some(coeffs),
                ..
            },
        ) => coeffs
            .iter()
            .map(|p| Call::RwgLoadWaveform {
                params: encode_sbg(p),
            })
            .collect(),
        (OpKind::RwgUpdateParams, OpParams::Play { .. }) => {
            vec![Call::RwgPlay {
                duration_us: us_from_cycles(e.op.duration_cyc),
                pud_mask: e.channel.bit(),
                iou_mask: e.channel.bit(),
            }]
        }
        (OpKind::RwgRfSwitch, OpParams::Rf { on }) => {
            vec![Call::RwgRfSwitch {
                rf_mask: e.channel.bit(),
                on: *on,
            }]
        }
        (OpKind::SyncMaster, OpParams::Sync { code }) => {
            vec![Call::TriggerSlave {
                wait_cycles: WAIT_TIME_PLACEHOLDER,
                sync_code: *code,
            }]
        }
        (OpKind::SyncSlave, OpParams::Sync { code }) => {
            vec![Call::WaitMaster { sync_code: *code }]
        }
        _ => return Err(malformed()),
    };

    Ok(calls)
}
