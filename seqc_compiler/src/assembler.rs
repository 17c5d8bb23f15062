//! Assembler handle: the opaque sink compiled calls are streamed into.
//!
//! The compiler writes the handle exactly once, per board, in final order,
//! after every placeholder has been back-filled. Implementations map the
//! symbolic calls onto whatever machine-code emitter or transport sits
//! behind them.

use crate::call::Call;
use seqc_common::board::BoardId;
use std::collections::BTreeMap;

/// Sink with per-board emission contexts.
pub trait AssemblerHandle {
    /// Announce that the following emits target `board`.
    fn begin_board(&mut self, board: &BoardId);

    /// Emit one call into the board's context.
    fn emit(&mut self, board: &BoardId, call: &Call);
}

/// Handle that records everything it receives, for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingAssembler {
    programs: BTreeMap<BoardId, Vec<Call>>,
}

impl RecordingAssembler {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received for one board.
    pub fn board(&self, board: &BoardId) -> Option<&[Call]> {
        self.programs.get(board).map(Vec::as_slice)
    }

    /// Everything received, keyed by board.
    pub fn programs(&self) -> &BTreeMap<BoardId, Vec<Call>> {
        &self.programs
    }
}

impl AssemblerHandle for RecordingAssembler {
    fn begin_board(&mut self, board: &BoardId) {
        self.programs.entry(board.clone()).or_default();
    }

    fn emit(&mut self, board: &BoardId, call: &Call) {
        self.programs
            .entry(board.clone())
            .or_default()
            .push(call.clone());
    }
}

/// Handle that discards everything.
#[derive(Debug, Default)]
pub struct NullAssembler;

impl AssemblerHandle for NullAssembler {
    fn begin_board(&mut self, _board: &BoardId) {}

    fn emit(&mut self, _board: &BoardId, _call: &Call) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_per_board_order() {
        let b0 = BoardId::new("B0");
        let b1 = BoardId::new("B1");
        let mut rec = RecordingAssembler::new();
        rec.begin_board(&b0);
        rec.emit(&b0, &Call::WaitMu { cycles: 1 });
        rec.emit(&b0, &Call::WaitMu { cycles: 2 });
        rec.begin_board(&b1);
        rec.emit(&b1, &Call::WaitMu { cycles: 3 });

        assert_eq!(rec.board(&b0).unwrap().len(), 2);
        assert_eq!(rec.board(&b1).unwrap().len(), 1);
        assert_eq!(
            rec.board(&b0).unwrap()[1],
            Call::WaitMu { cycles: 2 }
        );
    }
}
