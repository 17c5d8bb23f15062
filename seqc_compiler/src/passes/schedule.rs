//! Pass 3: load scheduling.
//!
//! On any one board all loads share a single writer: no two load windows
//! may overlap, whatever the channel. Each load pairs with the next play
//! on its channel; the play's cycle is the load's latest-finish deadline.
//!
//! Placement is deadline-first. A load stays at its natural position when
//! the deadline allows; otherwise it is pulled earlier, bounded below by
//! the serial writer, by the preceding play on the same channel (the
//! staging registers must not be rewritten before that play has latched),
//! and by the sync-frame floor. Pulling into the preceding frame is
//! allowed unless disabled in the options. A load that cannot finish by
//! its deadline is a hard error; durations are never adjusted.

use crate::error::CompileError;
use crate::event::{epoch_start, BoardEvents, LogicalEvent, ScheduledLoadRecord};
use crate::options::CompileOptions;
use seqc_core::op::OpKind;
use tracing::debug;

struct LoadSlot {
    /// Index into the board's event list.
    idx: usize,
    /// Paired play cycle, when one exists.
    deadline: Option<u64>,
    /// Earliest start the pull rules allow.
    floor: u64,
}

pub(crate) fn run(
    boards: &mut BoardEvents,
    boundaries: &[u64],
    opts: &CompileOptions,
) -> Result<Vec<ScheduledLoadRecord>, CompileError> {
    let mut records = Vec::new();

    for (board, events) in boards.iter_mut() {
        let mut slots = collect_slots(events, boundaries, opts);
        slots.sort_by_key(|s| (s.deadline.unwrap_or(u64::MAX), events[s.idx].ts_cyc, s.idx));

        let mut loader_free = 0u64;
        for slot in &slots {
            let (orig_ts, cost) = (events[slot.idx].ts_cyc, events[slot.idx].cost_cyc);
            let preferred = orig_ts.max(loader_free);

            let start = match slot.deadline {
                Some(deadline) if preferred + cost > deadline => {
                    let earliest = loader_free.max(slot.floor);
                    if earliest + cost > deadline {
                        return Err(CompileError::TimingViolation {
                            board: board.clone(),
                            channel: events[slot.idx].channel.clone(),
                            deadline_cyc: deadline,
                            cost_cyc: cost,
                            earliest_cyc: earliest,
                        });
                    }
                    earliest
                }
                _ => preferred,
            };

            records.push(ScheduledLoadRecord {
                board: board.clone(),
                channel: events[slot.idx].channel.clone(),
                start_cyc: start,
                end_cyc: start + cost,
                deadline_cyc: slot.deadline,
            });
            loader_free = start + cost;
            events[slot.idx].ts_cyc = start;
        }

        // Rescheduled loads moved; restore timestamp order for the later
        // passes. The sort is stable, so same-cycle order is preserved.
        events.sort_by_key(LogicalEvent::sort_key);
    }

    debug!(loads = records.len(), "scheduled loads");
    Ok(records)
}

fn collect_slots(
    events: &[LogicalEvent],
    boundaries: &[u64],
    opts: &CompileOptions,
) -> Vec<LoadSlot> {
    let mut slots = Vec::new();
    for (idx, e) in events.iter().enumerate() {
        if e.op.kind != OpKind::RwgLoadCoeffs {
            continue;
        }
        let deadline = events[idx + 1..]
            .iter()
            .find(|f| f.op.kind == OpKind::RwgUpdateParams && f.channel == e.channel)
            .map(|f| f.ts_cyc);
        // Strictly after the preceding play's cycle: a load placed at the
        // latch cycle itself would issue first and be latched by it.
        let prev_play = events[..idx]
            .iter()
            .rev()
            .find(|f| f.op.kind == OpKind::RwgUpdateParams && f.channel == e.channel)
            .map(|f| f.ts_cyc + 1)
            .unwrap_or(0);
        let pull_epoch = if opts.allow_cross_epoch_pull {
            e.epoch.saturating_sub(1)
        } else {
            e.epoch
        };
        let floor = epoch_start(boundaries, pull_epoch).max(prev_play);
        slots.push(LoadSlot {
            idx,
            deadline,
            floor,
        });
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{cost, extract, translate};
    use seqc_common::board::{BoardId, Channel};
    use seqc_common::waveform::SbgTarget;
    use seqc_core::factory::{hold, linear_ramp, rwg_init};

    fn schedule(
        m: &seqc_core::Morphism,
        opts: &CompileOptions,
    ) -> Result<(BoardEvents, Vec<ScheduledLoadRecord>), CompileError> {
        let mut boards = extract::run(m).unwrap();
        translate::run(&mut boards).unwrap();
        let boundaries = cost::run(&mut boards);
        let records = run(&mut boards, &boundaries, opts)?;
        Ok((boards, records))
    }

    fn ramp_after(ch: &Channel, slack_cyc: u64, sbg: u8) -> seqc_core::Morphism {
        rwg_init(ch, 100.0)
            .unwrap()
            .then(&hold(ch, slack_cyc).unwrap())
            .unwrap()
            .then(&linear_ramp(ch, &[SbgTarget::new(sbg, 5.0, 0.5)], 2500).unwrap())
            .unwrap()
    }

    #[test]
    fn a_load_is_pulled_to_the_earliest_free_cycle() {
        let ch = Channel::rwg("B0", 0);
        // One target, 4 registers: 56 loader cycles against 500 of slack.
        let (boards, records) = schedule(&ramp_after(&ch, 500, 0), &CompileOptions::default())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].start_cyc, 0);
        assert_eq!(records[0].end_cyc, 56);
        assert_eq!(records[0].deadline_cyc, Some(500));

        // The event's timestamp is rewritten and the list re-sorted.
        let events = &boards[&BoardId::new("B0")];
        let load = events
            .iter()
            .find(|e| e.op.kind == OpKind::RwgLoadCoeffs)
            .unwrap();
        assert_eq!(load.ts_cyc, 0);
    }

    #[test]
    fn second_load_queues_behind_the_first() {
        let c0 = Channel::rwg("B0", 0);
        let c1 = Channel::rwg("B0", 1);
        let m = ramp_after(&c0, 500, 0).par(&ramp_after(&c1, 700, 1)).unwrap();
        let (_, records) = schedule(&m, &CompileOptions::default()).unwrap();
        assert_eq!(records.len(), 2);
        // Deadline order: c0 (500) first, then c1 starting where c0 ended.
        assert_eq!(records[0].channel, c0);
        assert_eq!(records[1].channel, c1);
        assert_eq!(records[1].start_cyc, records[0].end_cyc);
        assert!(records[1].end_cyc <= 700);
    }

    #[test]
    fn impossible_deadline_is_a_timing_violation() {
        let ch = Channel::rwg("B0", 0);
        // 30 cycles of slack for a 56-cycle load.
        let err = schedule(&ramp_after(&ch, 30, 0), &CompileOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::TimingViolation {
                deadline_cyc: 30,
                cost_cyc: 56,
                ..
            }
        ));
    }

    #[test]
    fn chained_ramps_respect_the_latch_floor() {
        let ch = Channel::rwg("B0", 0);
        let m = ramp_after(&ch, 500, 0)
            .then(&linear_ramp(&ch, &[SbgTarget::new(0, 8.0, 0.2)], 2500).unwrap())
            .unwrap();
        let (_, records) = schedule(&m, &CompileOptions::default()).unwrap();
        assert_eq!(records.len(), 2);
        // The second segment may stage only after the first play latched.
        assert_eq!(records[1].deadline_cyc, Some(3000));
        assert!(records[1].start_cyc > 500);
        assert!(records[1].end_cyc <= 3000);
    }
}
