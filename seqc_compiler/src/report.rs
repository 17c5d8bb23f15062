//! Text and JSON views of a compiled program.
//!
//! Derived, read-only renderings of a [`CompileReport`]: a per-board call
//! listing with the physical cursor in the margin, and a table of the
//! committed load placements. Useful for golden files, log output, and
//! eyeballing a schedule; nothing here affects compilation.

use crate::call::Call;
use crate::CompileReport;
use std::fmt::Write;

impl CompileReport {
    /// Per-board call listing with a running physical-cycle column.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (board, calls) in &self.programs {
            let _ = writeln!(out, "board {board} ({} calls)", calls.len());
            let mut cursor = 0u64;
            for call in calls {
                let _ = writeln!(out, "  {cursor:>10}  {call}");
                cursor += match call {
                    Call::WaitMu { cycles } => *cycles,
                    _ => 1,
                };
            }
            let _ = writeln!(out, "  {cursor:>10}  (end of stream)");
        }
        out
    }

    /// Table of committed load placements with the remaining slack.
    pub fn schedule_table(&self) -> String {
        let mut out = String::new();
        if self.loads.is_empty() {
            let _ = writeln!(out, "no loads scheduled");
            return out;
        }
        let _ = writeln!(out, "{:<10} {:<14} {:>10} {:>10} {:>10} {:>8}",
            "board", "channel", "start", "end", "deadline", "slack");
        for rec in &self.loads {
            let (deadline, slack) = match rec.deadline_cyc {
                Some(d) => (d.to_string(), (d - rec.end_cyc).to_string()),
                None => ("-".to_string(), "-".to_string()),
            };
            let _ = writeln!(
                out,
                "{:<10} {:<14} {:>10} {:>10} {:>10} {:>8}",
                rec.board.to_string(),
                rec.channel.to_string(),
                rec.start_cyc,
                rec.end_cyc,
                deadline,
                slack
            );
        }
        if !self.epoch_boundaries.is_empty() {
            let cuts: Vec<String> = self
                .epoch_boundaries
                .iter()
                .map(|b| b.to_string())
                .collect();
            let _ = writeln!(out, "sync frames cut at: {}", cuts.join(", "));
        }
        out
    }

    /// Machine-readable dump of the whole report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
