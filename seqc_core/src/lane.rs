//! Lanes: per-channel operation sequences with state continuity.
//!
//! A lane owns an ordered run of atomic operations on one channel. The
//! continuity invariant says adjacent concrete boundary states must agree;
//! unresolved (`None`) endpoints act as wildcards until composition
//! resolves them. Lanes are immutable; every transformation returns a new
//! lane sharing the untouched operation storage where possible.

use crate::error::ComposeError;
use crate::op::{AtomicOp, OpKind, OpParams};
use seqc_common::board::Channel;
use seqc_common::state::ChannelState;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Ordered, per-channel sequence of atomic operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    /// Channel every op in this lane drives.
    pub channel: Channel,
    ops: Arc<[AtomicOp]>,
}

impl Lane {
    /// Build a lane, checking the continuity invariant.
    pub(crate) fn new(channel: Channel, ops: Vec<AtomicOp>) -> Result<Self, ComposeError> {
        let lane = Self {
            channel,
            ops: ops.into(),
        };
        lane.check_continuity()?;
        Ok(lane)
    }

    /// Lane from factory-built ops; continuity holds by construction.
    pub(crate) fn from_factory_ops(channel: Channel, ops: Vec<AtomicOp>) -> Self {
        Self {
            channel,
            ops: ops.into(),
        }
    }

    /// Single-hold lane used for identity padding.
    pub(crate) fn hold(channel: Channel, duration_cyc: u64, state: Option<ChannelState>) -> Self {
        let op = AtomicOp::new(
            channel.clone(),
            OpKind::Hold,
            state.clone(),
            state,
            duration_cyc,
            OpParams::None,
        );
        Self {
            channel,
            ops: vec![op].into(),
        }
    }

    /// The operations in order.
    #[inline]
    pub fn ops(&self) -> &[AtomicOp] {
        &self.ops
    }

    /// Sum of logical durations [cycles].
    pub fn total_duration(&self) -> u64 {
        self.ops.iter().map(|op| op.duration_cyc).sum()
    }

    /// State before the first op, when concrete.
    pub fn start_state(&self) -> Option<&ChannelState> {
        self.ops.first().and_then(|op| op.start.as_ref())
    }

    /// State after the last op, when concrete.
    pub fn end_state(&self) -> Option<&ChannelState> {
        self.ops.last().and_then(|op| op.end.as_ref())
    }

    /// True when every op has concrete endpoints and derived parameters.
    pub fn is_resolved(&self) -> bool {
        self.ops.iter().all(|op| op.is_resolved())
    }

    /// Adjacent concrete boundary states must agree.
    fn check_continuity(&self) -> Result<(), ComposeError> {
        for (i, pair) in self.ops.windows(2).enumerate() {
            if let (Some(end), Some(start)) = (&pair[0].end, &pair[1].start) {
                if end != start {
                    return Err(ComposeError::ContinuityBroken {
                        channel: self.channel.clone(),
                        index: i + 1,
                    });
                }
            }
        }
        Ok(())
    }

    /// Propagate a concrete incoming state through the whole lane.
    ///
    /// Unresolved endpoints are filled by each op's state inference; already
    /// concrete ops are checked against the propagated state. Returns the
    /// resolved lane and leaves `self` unchanged.
    pub fn resolve_forward(&self, incoming: &ChannelState) -> Result<Lane, ComposeError> {
        if self.is_resolved() && self.start_state() == Some(incoming) {
            return Ok(self.clone());
        }
        let mut cursor = incoming.clone();
        let mut resolved = Vec::with_capacity(self.ops.len());
        for op in self.ops.iter() {
            let r = op.resolve_against(&cursor)?;
            if let Some(end) = &r.end {
                cursor = end.clone();
            }
            resolved.push(r);
        }
        Ok(Self {
            channel: self.channel.clone(),
            ops: resolved.into(),
        })
    }

    /// Fill trailing state-transparent ops backwards from a concrete
    /// outgoing state.
    ///
    /// Used when the left operand of a serial composition ends in
    /// unresolved holds and the right operand pins the boundary. Stops at
    /// the first op with a concrete end, which must already match.
    pub fn fill_backward(&self, outgoing: &ChannelState) -> Result<Lane, ComposeError> {
        let mut ops: Vec<AtomicOp> = self.ops.to_vec();
        for op in ops.iter_mut().rev() {
            if let Some(end) = op.end.clone() {
                if end == *outgoing {
                    break;
                }
                return Err(ComposeError::StateMismatch {
                    channel: self.channel.clone(),
                    expected: end.to_string(),
                    found: outgoing.to_string(),
                });
            }
            if !matches!(op.kind, OpKind::Hold | OpKind::SyncMaster | OpKind::SyncSlave) {
                return Err(ComposeError::UnresolvedBoundary {
                    channel: self.channel.clone(),
                });
            }
            op.end = Some(outgoing.clone());
            op.start = Some(outgoing.clone());
        }
        Self::new(self.channel.clone(), ops)
    }

    /// Concatenate two lanes on the same channel. Boundary compatibility is
    /// the caller's responsibility; continuity is re-checked.
    pub(crate) fn concat(&self, other: &Lane) -> Result<Lane, ComposeError> {
        let mut ops = Vec::with_capacity(self.ops.len() + other.ops.len());
        ops.extend_from_slice(&self.ops);
        ops.extend_from_slice(&other.ops);
        Self::new(self.channel.clone(), ops)
    }

    /// Append a trailing hold of the given length (identity padding).
    pub(crate) fn pad_end(&self, pad_cyc: u64) -> Result<Lane, ComposeError> {
        if pad_cyc == 0 {
            return Ok(self.clone());
        }
        let state = self.end_state().cloned();
        self.concat(&Lane::hold(self.channel.clone(), pad_cyc, state))
    }

    /// SBG ids referenced anywhere in the lane.
    pub fn referenced_sbgs(&self) -> BTreeSet<u8> {
        self.ops
            .iter()
            .flat_map(|op| op.referenced_sbgs())
            .collect()
    }
}
