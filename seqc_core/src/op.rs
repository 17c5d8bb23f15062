//! Atomic operations.
//!
//! An `AtomicOp` is the smallest unit of a timing program: one typed state
//! change on one channel, with an integer logical duration and an opaque
//! parameter bundle. Ops are immutable; factories construct them, and
//! composition produces resolved copies when boundary states become known.
//!
//! Endpoint states may be `None` at construction ("inherited from
//! context"); [`AtomicOp::resolve_against`] replaces them with concrete
//! states and, for ramp loads, derives the polynomial coefficients that
//! depend on the incoming tone values.

use crate::error::ComposeError;
use seqc_common::board::Channel;
use seqc_common::state::{ChannelState, RwgProfile, SbgSnapshot, transition_legal};
use seqc_common::time::us_from_cycles;
use seqc_common::waveform::{OrderFlags, SbgParams, SbgTarget};
use std::sync::Arc;

/// Closed set of operation kinds understood by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// TTL line initialization (uninit -> off).
    TtlInit,
    /// TTL rising edge.
    TtlOn,
    /// TTL falling edge.
    TtlOff,
    /// Maintain the current state for the logical duration.
    Hold,
    /// RWG port initialization (uninit -> ready, sets the carrier).
    RwgInit,
    /// Carrier retune on an initialized port.
    RwgSetCarrier,
    /// Pre-stage waveform coefficients (hidden physical cost).
    RwgLoadCoeffs,
    /// Latch pre-staged parameters and play (user-visible duration).
    RwgUpdateParams,
    /// RF output enable toggle.
    RwgRfSwitch,
    /// Global-sync trigger on the master board.
    SyncMaster,
    /// Global-sync wait on a slave board.
    SyncSlave,
}

impl OpKind {
    /// Emission stage at equal timestamps: init < load < play < sync.
    #[inline]
    pub fn stage(&self) -> u8 {
        match self {
            Self::TtlInit | Self::RwgInit => 0,
            Self::RwgLoadCoeffs | Self::RwgSetCarrier => 1,
            Self::TtlOn | Self::TtlOff | Self::Hold | Self::RwgUpdateParams | Self::RwgRfSwitch => 2,
            Self::SyncMaster | Self::SyncSlave => 3,
        }
    }

    /// Holds are pure time; everything else reaches the hardware.
    #[inline]
    pub fn is_event(&self) -> bool {
        !matches!(self, Self::Hold)
    }

    /// Short tag for diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::TtlInit => "ttl-init",
            Self::TtlOn => "ttl-on",
            Self::TtlOff => "ttl-off",
            Self::Hold => "hold",
            Self::RwgInit => "rwg-init",
            Self::RwgSetCarrier => "set-carrier",
            Self::RwgLoadCoeffs => "load",
            Self::RwgUpdateParams => "play",
            Self::RwgRfSwitch => "rf-switch",
            Self::SyncMaster => "sync-master",
            Self::SyncSlave => "sync-slave",
        }
    }
}

/// Kind-specific parameter bundle. Opaque to composition except for state
/// inference and ramp-coefficient derivation.
#[derive(Debug, Clone, PartialEq)]
pub enum OpParams {
    /// No parameters.
    None,
    /// Carrier frequency for init / retune.
    Carrier {
        /// Carrier [MHz].
        mhz: f64,
    },
    /// Coefficient pre-stage bundle.
    Load {
        /// Tone targets, one per SBG.
        targets: Arc<[SbgTarget]>,
        /// Sweep length of the paired play; 0 for a static retune.
        ramp_dur_cyc: u64,
        /// Derived physical-unit records. `None` until a ramp has seen its
        /// incoming state (static retunes are derived at construction).
        coeffs: Option<Arc<[SbgParams]>>,
    },
    /// Parameter-latch (play) targets.
    Play {
        /// Tone targets the latch applies.
        targets: Arc<[SbgTarget]>,
    },
    /// RF switch setting.
    Rf {
        /// Requested output state.
        on: bool,
    },
    /// Sync frame code.
    Sync {
        /// Code matched between trigger and wait.
        code: u16,
    },
}

/// Smallest unit of a timing program. Fields are final.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicOp {
    /// Channel the op drives.
    pub channel: Channel,
    /// Operation kind.
    pub kind: OpKind,
    /// State before the op; `None` = inherited from context.
    pub start: Option<ChannelState>,
    /// State after the op; `None` = inferred during resolution.
    pub end: Option<ChannelState>,
    /// Logical duration [cycles]. Non-zero only for holds and plays.
    pub duration_cyc: u64,
    /// Kind-specific parameters.
    pub params: OpParams,
}

impl AtomicOp {
    pub(crate) fn new(
        channel: Channel,
        kind: OpKind,
        start: Option<ChannelState>,
        end: Option<ChannelState>,
        duration_cyc: u64,
        params: OpParams,
    ) -> Self {
        Self {
            channel,
            kind,
            start,
            end,
            duration_cyc,
            params,
        }
    }

    /// Both endpoints concrete and all derived parameters present.
    pub fn is_resolved(&self) -> bool {
        let params_ready = match &self.params {
            OpParams::Load { coeffs, .. } => coeffs.is_some(),
            _ => true,
        };
        self.start.is_some() && self.end.is_some() && params_ready
    }

    /// Resolve this op against a concrete incoming state.
    ///
    /// Checks a concrete start for equality, infers a missing end from the
    /// op's semantics, derives ramp coefficients, and verifies the
    /// resulting transition is legal. Returns a new op; `self` is unchanged.
    pub fn resolve_against(&self, incoming: &ChannelState) -> Result<AtomicOp, ComposeError> {
        if let Some(start) = &self.start {
            if start != incoming {
                return Err(ComposeError::StateMismatch {
                    channel: self.channel.clone(),
                    expected: incoming.to_string(),
                    found: start.to_string(),
                });
            }
            if self.is_resolved() {
                return Ok(self.clone());
            }
        }

        let end = match &self.end {
            Some(e) => e.clone(),
            None => self.infer_end(incoming)?,
        };
        if !transition_legal(incoming, &end) {
            return Err(ComposeError::IllegalTransition {
                channel: self.channel.clone(),
                from: incoming.to_string(),
                to: end.to_string(),
            });
        }
        let params = self.derive_params(incoming)?;

        Ok(AtomicOp {
            channel: self.channel.clone(),
            kind: self.kind,
            start: Some(incoming.clone()),
            end: Some(end),
            duration_cyc: self.duration_cyc,
            params,
        })
    }

    /// End state implied by applying this op to `incoming`.
    fn infer_end(&self, incoming: &ChannelState) -> Result<ChannelState, ComposeError> {
        let invalid = |cause: &'static str| ComposeError::InvalidResolution {
            channel: self.channel.clone(),
            op: self.kind.tag(),
            state: incoming.to_string(),
            cause,
        };

        match (&self.kind, &self.params) {
            (OpKind::Hold | OpKind::SyncMaster | OpKind::SyncSlave, _) => Ok(incoming.clone()),
            (OpKind::TtlInit, _) => Ok(ChannelState::TtlOff),
            (OpKind::TtlOn, _) => Ok(ChannelState::TtlOn),
            (OpKind::TtlOff, _) => Ok(ChannelState::TtlOff),
            (OpKind::RwgInit, OpParams::Carrier { mhz }) => {
                Ok(ChannelState::RwgReady(RwgProfile::with_carrier(*mhz)))
            }
            (OpKind::RwgSetCarrier, OpParams::Carrier { mhz }) => {
                let profile = incoming.rwg_profile().ok_or(invalid("carrier not set"))?;
                let retuned = RwgProfile {
                    carrier_mhz: *mhz,
                    sbgs: profile.sbgs.clone(),
                };
                incoming.with_profile(retuned).ok_or(invalid("carrier not set"))
            }
            (OpKind::RwgLoadCoeffs, _) => {
                if incoming.is_rwg_configured() {
                    Ok(incoming.clone())
                } else {
                    Err(invalid("carrier not set"))
                }
            }
            (OpKind::RwgUpdateParams, OpParams::Play { targets }) => {
                let profile = incoming.rwg_profile().ok_or(invalid("carrier not set"))?;
                let mut updated = profile.clone();
                for t in targets.iter() {
                    let phase = match (t.phase, updated.sbg(t.sbg)) {
                        (Some(p), _) => p,
                        (None, Some(existing)) => existing.phase,
                        (None, None) => 0.0,
                    };
                    updated.upsert(SbgSnapshot {
                        sbg: t.sbg,
                        freq_mhz: t.freq_mhz,
                        amp: t.amp,
                        phase,
                    });
                }
                incoming.with_profile(updated).ok_or(invalid("carrier not set"))
            }
            (OpKind::RwgRfSwitch, OpParams::Rf { on }) => match (incoming, on) {
                (ChannelState::RwgReady(p), true) => Ok(ChannelState::RwgActive(p.clone())),
                (ChannelState::RwgActive(p), false) => Ok(ChannelState::RwgReady(p.clone())),
                (ChannelState::RwgActive(_), true) => Err(invalid("rf output already enabled")),
                (ChannelState::RwgReady(_), false) => Err(invalid("rf output already disabled")),
                _ => Err(invalid("carrier not set")),
            },
            _ => Err(invalid("malformed parameter bundle")),
        }
    }

    /// Derive context-dependent parameters (ramp slopes).
    fn derive_params(&self, incoming: &ChannelState) -> Result<OpParams, ComposeError> {
        let OpParams::Load {
            targets,
            ramp_dur_cyc,
            coeffs: None,
        } = &self.params
        else {
            return Ok(self.params.clone());
        };

        let profile = incoming
            .rwg_profile()
            .ok_or(ComposeError::InvalidResolution {
                channel: self.channel.clone(),
                op: self.kind.tag(),
                state: incoming.to_string(),
                cause: "carrier not set",
            })?;

        let dur_us = us_from_cycles(*ramp_dur_cyc);
        let slope = |target: f64, current: f64| {
            if dur_us > 0.0 {
                (target - current) / dur_us
            } else {
                0.0
            }
        };
        let derived: Vec<SbgParams> = targets
            .iter()
            .map(|t| {
                let (f0, a0) = profile
                    .sbg(t.sbg)
                    .map(|s| (s.freq_mhz, s.amp))
                    .unwrap_or((0.0, 0.0));
                let mut flags = OrderFlags::RAMP;
                if t.phase.is_some() {
                    flags |= OrderFlags::PHASE;
                }
                SbgParams {
                    sbg: t.sbg,
                    freq: [f0, slope(t.freq_mhz, f0), 0.0, 0.0],
                    amp: [a0, slope(t.amp, a0), 0.0, 0.0],
                    phase: t.phase.unwrap_or(0.0),
                    flags,
                }
            })
            .collect();

        Ok(OpParams::Load {
            targets: targets.clone(),
            ramp_dur_cyc: *ramp_dur_cyc,
            coeffs: Some(derived.into()),
        })
    }

    /// SBG ids this op references, if any.
    pub fn referenced_sbgs(&self) -> impl Iterator<Item = u8> + '_ {
        let targets: &[SbgTarget] = match &self.params {
            OpParams::Load { targets, .. } | OpParams::Play { targets } => &**targets,
            _ => &[],
        };
        targets.iter().map(|t| t.sbg)
    }
}
