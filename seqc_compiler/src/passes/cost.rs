//! Pass 2: cost and epoch analysis.
//!
//! Physical windows: a simple CSR write costs one cycle, so most events
//! cost their call count; a load's window is 14 cycles per parameter
//! register it stages. Every master trigger starts a new sync frame
//! (epoch); the trigger itself belongs to the frame it starts, while
//! earlier-stage events at the same cycle stay in the previous frame.

use crate::event::BoardEvents;
use seqc_core::op::{OpKind, OpParams};
use tracing::debug;

/// Loader cycles per staged parameter register.
pub(crate) const LOAD_CYCLES_PER_PARAM: u64 = 14;

/// Stage value of sync ops; the epoch boundary test keys on it.
pub(crate) const SYNC_STAGE: u8 = 3;

pub(crate) fn run(boards: &mut BoardEvents) -> Vec<u64> {
    // Physical windows.
    for events in boards.values_mut() {
        for e in events.iter_mut() {
            e.cost_cyc = match (&e.op.kind, &e.op.params) {
                (
                    OpKind::RwgLoadCoeffs,
                    OpParams::Load {
                        coeffs: Some(coeffs),
                        ..
                    },
                ) => {
                    LOAD_CYCLES_PER_PARAM
                        * coeffs.iter().map(|p| p.param_count() as u64).sum::<u64>()
                }
                _ => e.calls.len() as u64,
            };
        }
    }

    // Sync frames are global: a master trigger anywhere cuts every board's
    // timeline at its cycle.
    let mut boundaries: Vec<u64> = boards
        .values()
        .flatten()
        .filter(|e| e.op.kind == OpKind::SyncMaster)
        .map(|e| e.ts_cyc)
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    for events in boards.values_mut() {
        for e in events.iter_mut() {
            let (ts, stage) = (e.ts_cyc, e.op.kind.stage());
            e.epoch = boundaries
                .partition_point(|b| *b < ts || (*b == ts && stage >= SYNC_STAGE))
                as u32;
        }
    }

    debug!(epochs = boundaries.len() + 1, "cost and epoch analysis");
    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{extract, translate};
    use seqc_common::board::{BoardId, Channel};
    use seqc_common::waveform::SbgTarget;
    use seqc_core::factory::{hold, rwg_init, set_state, sync_master, ttl_init, ttl_on};

    fn analyzed(m: &seqc_core::Morphism) -> (crate::event::BoardEvents, Vec<u64>) {
        let mut boards = extract::run(m).unwrap();
        translate::run(&mut boards).unwrap();
        let boundaries = run(&mut boards);
        (boards, boundaries)
    }

    #[test]
    fn load_cost_is_fourteen_per_register() {
        let ch = Channel::rwg("B0", 0);
        let targets = [SbgTarget::new(0, 1.0, 0.1), SbgTarget::new(1, 2.0, 0.2)];
        let m = rwg_init(&ch, 100.0)
            .unwrap()
            .then(&hold(&ch, 500).unwrap())
            .unwrap()
            .then(&set_state(&ch, &targets).unwrap())
            .unwrap();
        let (boards, boundaries) = analyzed(&m);
        assert!(boundaries.is_empty());

        let events = &boards[&BoardId::new("B0")];
        let load = events
            .iter()
            .find(|e| e.op.kind == OpKind::RwgLoadCoeffs)
            .unwrap();
        // 2 targets x 2 registers (freq0, amp0) x 14 cycles.
        assert_eq!(load.cost_cyc, 56);

        // Everything else costs its call count.
        let init = events.iter().find(|e| e.op.kind == OpKind::RwgInit).unwrap();
        assert_eq!(init.cost_cyc, 1);
    }

    #[test]
    fn sync_cuts_the_timeline_into_frames() {
        let ch = Channel::ttl("B0", 0);
        let m = ttl_init(&ch)
            .unwrap()
            .then(&hold(&ch, 1000).unwrap())
            .unwrap()
            .then(&sync_master(&ch, 1).unwrap())
            .unwrap()
            .then(&hold(&ch, 100).unwrap())
            .unwrap()
            .then(&ttl_on(&ch).unwrap())
            .unwrap();
        let (boards, boundaries) = analyzed(&m);
        assert_eq!(boundaries, vec![1000]);

        let events = &boards[&BoardId::new("B0")];
        let by_kind: Vec<(OpKind, u32)> =
            events.iter().map(|e| (e.op.kind, e.epoch)).collect();
        assert_eq!(
            by_kind,
            vec![
                (OpKind::TtlInit, 0),
                (OpKind::SyncMaster, 1),
                (OpKind::TtlOn, 1),
            ]
        );
    }

    #[test]
    fn earlier_stages_at_the_cut_stay_in_the_old_frame() {
        let ch = Channel::ttl("B0", 0);
        // The rising edge lands exactly on the sync cycle.
        let m = ttl_init(&ch)
            .unwrap()
            .then(&hold(&ch, 1000).unwrap())
            .unwrap()
            .then(&ttl_on(&ch).unwrap())
            .unwrap()
            .then(&sync_master(&ch, 1).unwrap())
            .unwrap();
        let (boards, _) = analyzed(&m);
        let events = &boards[&BoardId::new("B0")];
        let edge = events.iter().find(|e| e.op.kind == OpKind::TtlOn).unwrap();
        let sync = events
            .iter()
            .find(|e| e.op.kind == OpKind::SyncMaster)
            .unwrap();
        assert_eq!(edge.ts_cyc, sync.ts_cyc);
        assert_eq!(edge.epoch, 0);
        assert_eq!(sync.epoch, 1);
    }
}
