//! Pass 4: constraint validation.
//!
//! Re-checks every invariant the schedule must satisfy, independently of
//! how pass 3 arrived at it: the serial-loader windows, the load/play
//! deadlines, the issue-burst gaps, init placement, and the sync-frame
//! pull rule. Any failure aborts the compile.

use crate::error::{CompileError, ScheduleCause};
use crate::event::{epoch_start, BoardEvents, ScheduledLoadRecord};
use crate::options::CompileOptions;
use seqc_core::op::OpKind;
use tracing::debug;

pub(crate) fn run(
    boards: &BoardEvents,
    records: &[ScheduledLoadRecord],
    boundaries: &[u64],
    opts: &CompileOptions,
) -> Result<(), CompileError> {
    check_serial_loader(records)?;
    check_deadlines(records)?;
    check_issue_gaps(boards)?;
    check_init_placement(boards)?;
    check_pull_floors(boards, records, boundaries, opts)?;
    debug!("schedule validated");
    Ok(())
}

/// No two load windows overlap on one board.
fn check_serial_loader(records: &[ScheduledLoadRecord]) -> Result<(), CompileError> {
    let mut by_board: Vec<&ScheduledLoadRecord> = records.iter().collect();
    by_board.sort_by(|a, b| (&a.board, a.start_cyc).cmp(&(&b.board, b.start_cyc)));
    for pair in by_board.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.board == b.board && a.end_cyc > b.start_cyc {
            return Err(CompileError::Schedule {
                board: b.board.clone(),
                ts_cyc: b.start_cyc,
                cause: ScheduleCause::OverlappingLoads {
                    first: a.channel.clone(),
                    first_start_cyc: a.start_cyc,
                    first_end_cyc: a.end_cyc,
                    second: b.channel.clone(),
                    second_start_cyc: b.start_cyc,
                    second_end_cyc: b.end_cyc,
                },
            });
        }
    }
    Ok(())
}

/// Every paired load finishes by its play's cycle.
fn check_deadlines(records: &[ScheduledLoadRecord]) -> Result<(), CompileError> {
    for r in records {
        if let Some(deadline) = r.deadline_cyc {
            if r.end_cyc > deadline {
                return Err(CompileError::Schedule {
                    board: r.board.clone(),
                    ts_cyc: r.start_cyc,
                    cause: ScheduleCause::DeadlineMissed {
                        channel: r.channel.clone(),
                        end_cyc: r.end_cyc,
                        deadline_cyc: deadline,
                    },
                });
            }
        }
    }
    Ok(())
}

/// A load's issue burst must not push past the next event's cycle.
fn check_issue_gaps(boards: &BoardEvents) -> Result<(), CompileError> {
    for (board, events) in boards {
        for pair in events.windows(2) {
            let (e, f) = (&pair[0], &pair[1]);
            if e.op.kind != OpKind::RwgLoadCoeffs || f.ts_cyc <= e.ts_cyc {
                continue;
            }
            if e.ts_cyc + e.issue_cyc() > f.ts_cyc {
                return Err(CompileError::Schedule {
                    board: board.clone(),
                    ts_cyc: e.ts_cyc,
                    cause: ScheduleCause::IssueOverrun {
                        channel: e.channel.clone(),
                        calls: e.calls.len(),
                        next_ts_cyc: f.ts_cyc,
                    },
                });
            }
        }
    }
    Ok(())
}

/// Port initialization only in the first sync frame.
fn check_init_placement(boards: &BoardEvents) -> Result<(), CompileError> {
    for (board, events) in boards {
        for e in events {
            if e.op.kind == OpKind::RwgInit && e.epoch != 0 {
                return Err(CompileError::Schedule {
                    board: board.clone(),
                    ts_cyc: e.ts_cyc,
                    cause: ScheduleCause::InitOutsideFirstFrame {
                        channel: e.channel.clone(),
                        epoch: e.epoch,
                    },
                });
            }
        }
    }
    Ok(())
}

/// A pulled load may reach back at most one sync frame, and only when the
/// pull is enabled.
fn check_pull_floors(
    boards: &BoardEvents,
    records: &[ScheduledLoadRecord],
    boundaries: &[u64],
    opts: &CompileOptions,
) -> Result<(), CompileError> {
    for (board, events) in boards {
        for e in events {
            if e.op.kind != OpKind::RwgLoadCoeffs {
                continue;
            }
            let pull_epoch = if opts.allow_cross_epoch_pull {
                e.epoch.saturating_sub(1)
            } else {
                e.epoch
            };
            let floor = epoch_start(boundaries, pull_epoch);
            if e.ts_cyc < floor {
                return Err(CompileError::Schedule {
                    board: board.clone(),
                    ts_cyc: e.ts_cyc,
                    cause: ScheduleCause::PulledPastFloor {
                        channel: e.channel.clone(),
                        floor_cyc: floor,
                    },
                });
            }

            // The staging registers must survive until the preceding play
            // on the channel has latched them.
            let prev_latch = records
                .iter()
                .filter(|r| {
                    r.board == *board && r.channel == e.channel && r.start_cyc == e.ts_cyc
                })
                .filter_map(|r| r.deadline_cyc)
                .next()
                .and_then(|deadline| {
                    events
                        .iter()
                        .filter(|f| {
                            f.op.kind == OpKind::RwgUpdateParams
                                && f.channel == e.channel
                                && f.ts_cyc < deadline
                        })
                        .map(|f| f.ts_cyc)
                        .max()
                });
            if let Some(latch) = prev_latch {
                if e.ts_cyc <= latch {
                    return Err(CompileError::Schedule {
                        board: board.clone(),
                        ts_cyc: e.ts_cyc,
                        cause: ScheduleCause::StagedBeforeLatch {
                            channel: e.channel.clone(),
                            latch_cyc: latch,
                        },
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqc_common::board::{BoardId, Channel};

    fn record(board: &str, line: u8, start: u64, end: u64, deadline: Option<u64>) -> ScheduledLoadRecord {
        ScheduledLoadRecord {
            board: BoardId::new(board),
            channel: Channel::rwg(board, line),
            start_cyc: start,
            end_cyc: end,
            deadline_cyc: deadline,
        }
    }

    #[test]
    fn overlapping_windows_on_one_board_are_rejected() {
        let records = vec![
            record("B0", 0, 0, 1400, Some(2500)),
            record("B0", 1, 1000, 2400, Some(3750)),
        ];
        let err = check_serial_loader(&records).unwrap_err();
        assert!(matches!(err, CompileError::Schedule { .. }));

        // The same windows on different boards are independent.
        let records = vec![
            record("B0", 0, 0, 1400, Some(2500)),
            record("B1", 0, 1000, 2400, Some(3750)),
        ];
        assert!(check_serial_loader(&records).is_ok());
    }

    #[test]
    fn touching_windows_are_allowed() {
        let records = vec![
            record("B0", 0, 0, 1400, None),
            record("B0", 1, 1400, 2800, None),
        ];
        assert!(check_serial_loader(&records).is_ok());
    }

    #[test]
    fn late_load_is_rejected() {
        let records = vec![record("B0", 0, 2000, 3400, Some(2500))];
        let err = check_deadlines(&records).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Schedule {
                cause: ScheduleCause::DeadlineMissed {
                    end_cyc: 3400,
                    deadline_cyc: 2500,
                    ..
                },
                ..
            }
        ));
        assert!(check_deadlines(&[record("B0", 0, 1100, 2500, Some(2500))]).is_ok());
    }
}
