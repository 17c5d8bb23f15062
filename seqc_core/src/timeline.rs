//! Text views of a morphism for debugging.
//!
//! Derived, read-only renderings; nothing here affects compilation.

use crate::morphism::Morphism;
use crate::op::AtomicOp;
use seqc_common::board::Channel;
use std::fmt::Write;

fn op_glyph(op: &AtomicOp) -> String {
    if op.duration_cyc > 0 {
        format!("{}({})", op.kind.tag(), op.duration_cyc)
    } else {
        op.kind.tag().to_string()
    }
}

/// One line per channel: op glyphs in order plus the lane duration.
pub fn timeline(m: &Morphism) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "total: {} cyc, {} channel(s)", m.total_duration(), m.channel_count());
    for (ch, lane) in m.lanes() {
        let glyphs: Vec<String> = lane.ops().iter().map(op_glyph).collect();
        let _ = writeln!(out, "{:<16} {}", ch.to_string(), glyphs.join(" | "));
    }
    out
}

/// Detailed view of one lane: per-op boundary states and running cursor.
pub fn lane_summary(m: &Morphism, ch: &Channel) -> Option<String> {
    let lane = m.lane(ch)?;
    let mut out = String::new();
    let _ = writeln!(out, "{ch}: {} cyc", lane.total_duration());
    let mut cursor = 0u64;
    for op in lane.ops() {
        let start = op.start.as_ref().map_or("?".to_string(), |s| s.to_string());
        let end = op.end.as_ref().map_or("?".to_string(), |s| s.to_string());
        let _ = writeln!(
            out,
            "  @{cursor:<10} {:<12} {start} -> {end}",
            op_glyph(op)
        );
        cursor += op.duration_cyc;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{hold, ttl_init, ttl_on};
    use seqc_common::board::Channel;

    #[test]
    fn timeline_lists_every_channel() {
        let c0 = Channel::ttl("B0", 0);
        let c1 = Channel::ttl("B0", 1);
        let m = ttl_init(&c0)
            .unwrap()
            .then(&hold(&c0, 100).unwrap())
            .unwrap()
            .par(&ttl_init(&c1).unwrap())
            .unwrap();
        let view = timeline(&m);
        assert!(view.contains("B0/TTL0"));
        assert!(view.contains("B0/TTL1"));
        assert!(view.contains("hold(100)"));
    }

    #[test]
    fn lane_summary_shows_states() {
        let c0 = Channel::ttl("B0", 0);
        let m = ttl_init(&c0).unwrap().then(&ttl_on(&c0).unwrap()).unwrap();
        let view = lane_summary(&m, &c0).unwrap();
        assert!(view.contains("ttl-uninit -> ttl-off"));
        assert!(view.contains("ttl-off -> ttl-on"));
        assert!(lane_summary(&m, &Channel::ttl("B9", 0)).is_none());
    }
}
