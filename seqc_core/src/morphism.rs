//! Morphisms: immutable multi-channel timing programs.
//!
//! A morphism maps channels to lanes, with every lane padded to the same
//! total duration. The three composition operators return new values:
//!
//! - [`Morphism::compose`] - strict serial; boundary states must be
//!   concrete and equal.
//! - [`Morphism::then`] - auto serial; the left end state is propagated
//!   into the right operand's unresolved ops (state inference).
//! - [`Morphism::par`] - parallel; channel sets must be disjoint.
//!
//! Serial composition works lane-by-lane, so the distributive rewrite of
//! `(A ∥ B) ∘ (C ∥ D)` into `(A ∘ C) ∥ (B ∘ D)` holds by construction and
//! both spellings produce the same event stream.

use crate::error::ComposeError;
use crate::lane::Lane;
use seqc_common::board::{BoardId, Channel, ChannelKind};
use std::collections::BTreeMap;
use tracing::trace;

/// Immutable mapping from channel to lane, all lanes time-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Morphism {
    lanes: BTreeMap<Channel, Lane>,
    duration_cyc: u64,
}

impl Morphism {
    /// Morphism with a single lane.
    pub(crate) fn from_lane(lane: Lane) -> Self {
        let duration_cyc = lane.total_duration();
        let mut lanes = BTreeMap::new();
        lanes.insert(lane.channel.clone(), lane);
        Self { lanes, duration_cyc }
    }

    pub(crate) fn from_lanes(lanes: BTreeMap<Channel, Lane>) -> Self {
        let duration_cyc = lanes
            .values()
            .map(Lane::total_duration)
            .max()
            .unwrap_or(0);
        Self { lanes, duration_cyc }
    }

    /// Total duration [cycles]; every lane matches it.
    #[inline]
    pub fn total_duration(&self) -> u64 {
        self.duration_cyc
    }

    /// Lane for a channel, if present.
    pub fn lane(&self, channel: &Channel) -> Option<&Lane> {
        self.lanes.get(channel)
    }

    /// All channels, in deterministic order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.lanes.keys()
    }

    /// All `(channel, lane)` pairs, in deterministic order.
    pub fn lanes(&self) -> impl Iterator<Item = (&Channel, &Lane)> {
        self.lanes.iter()
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.lanes.len()
    }

    /// True when every lane is fully resolved.
    pub fn is_resolved(&self) -> bool {
        self.lanes.values().all(Lane::is_resolved)
    }

    // ─── Serial composition ─────────────────────────────────────────

    /// Strict serial composition `self ∘ other`.
    ///
    /// Boundary states on shared channels must be concrete and equal.
    /// One-sided channels are identity-padded so all lanes keep equal
    /// durations.
    pub fn compose(&self, other: &Self) -> Result<Self, ComposeError> {
        self.serial(other, false)
    }

    /// Auto serial composition `self → other`.
    ///
    /// Like [`compose`](Self::compose), but the concrete left end state is
    /// propagated into the right lane's unresolved ops, and a concrete
    /// right start state back-fills trailing unresolved holds on the left.
    /// Propagation never overrides an existing concrete state.
    pub fn then(&self, other: &Self) -> Result<Self, ComposeError> {
        self.serial(other, true)
    }

    fn serial(&self, other: &Self, infer: bool) -> Result<Self, ComposeError> {
        let (da, db) = (self.duration_cyc, other.duration_cyc);
        let mut lanes = BTreeMap::new();

        for (ch, a) in &self.lanes {
            let joined = match other.lanes.get(ch) {
                Some(b) => Self::join(a, b, infer)?,
                None => a.pad_end(db)?,
            };
            lanes.insert(ch.clone(), joined);
        }
        for (ch, b) in &other.lanes {
            if self.lanes.contains_key(ch) {
                continue;
            }
            let pad = Lane::hold(ch.clone(), da, b.start_state().cloned());
            lanes.insert(ch.clone(), pad.concat(b)?);
        }

        trace!(
            channels = lanes.len(),
            duration_cyc = da + db,
            infer,
            "serial composition"
        );
        Ok(Self {
            lanes,
            duration_cyc: da + db,
        })
    }

    /// Join two lanes of a shared channel across the serial boundary.
    fn join(a: &Lane, b: &Lane, infer: bool) -> Result<Lane, ComposeError> {
        match (a.end_state(), b.start_state()) {
            (Some(e), _) if infer => {
                let resolved = b.resolve_forward(e)?;
                a.concat(&resolved)
            }
            (Some(e), Some(s)) => {
                if e != s {
                    return Err(ComposeError::StateMismatch {
                        channel: a.channel.clone(),
                        expected: e.to_string(),
                        found: s.to_string(),
                    });
                }
                a.concat(b)
            }
            (None, Some(s)) if infer => {
                let filled = a.fill_backward(s)?;
                filled.concat(b)
            }
            (None, None) if infer => a.concat(b),
            _ => Err(ComposeError::UnresolvedBoundary {
                channel: a.channel.clone(),
            }),
        }
    }

    // ─── Parallel composition ───────────────────────────────────────

    /// Parallel composition `self ∥ other`.
    ///
    /// Channel sets must be disjoint, and same-board RWG lanes must not
    /// drive overlapping SBG sets. The shorter side is identity-padded to
    /// the longer side's duration.
    pub fn par(&self, other: &Self) -> Result<Self, ComposeError> {
        for ch in other.lanes.keys() {
            if self.lanes.contains_key(ch) {
                return Err(ComposeError::ChannelConflict {
                    channel: ch.clone(),
                });
            }
        }
        self.check_sbg_collisions(other)?;

        let t = self.duration_cyc.max(other.duration_cyc);
        let mut lanes = BTreeMap::new();
        for (ch, lane) in self.lanes.iter().chain(other.lanes.iter()) {
            lanes.insert(ch.clone(), lane.pad_end(t - lane.total_duration())?);
        }

        trace!(channels = lanes.len(), duration_cyc = t, "parallel composition");
        Ok(Self {
            lanes,
            duration_cyc: t,
        })
    }

    /// Same-board RWG lanes must reference disjoint SBG sets.
    fn check_sbg_collisions(&self, other: &Self) -> Result<(), ComposeError> {
        let mut claimed: BTreeMap<(BoardId, u8), Channel> = BTreeMap::new();
        for (ch, lane) in &self.lanes {
            if ch.kind != ChannelKind::Rwg {
                continue;
            }
            for sbg in lane.referenced_sbgs() {
                claimed.insert((ch.board.clone(), sbg), ch.clone());
            }
        }
        for (ch, lane) in &other.lanes {
            if ch.kind != ChannelKind::Rwg {
                continue;
            }
            for sbg in lane.referenced_sbgs() {
                if let Some(first) = claimed.get(&(ch.board.clone(), sbg)) {
                    return Err(ComposeError::SbgCollision {
                        board: ch.board.clone(),
                        sbg,
                        first: first.clone(),
                        second: ch.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
