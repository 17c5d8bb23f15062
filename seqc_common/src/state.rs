//! Per-channel state model and transition legality.
//!
//! States are a closed tagged sum; transition rules are a single pattern
//! match over `(from, to)`. RWG states carry the configured carrier and the
//! per-SBG tone snapshot so composition can check boundary compatibility
//! exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── RWG payload ────────────────────────────────────────────────────

/// Current tone parameters of one sideband generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SbgSnapshot {
    /// Sideband generator index on the channel.
    pub sbg: u8,
    /// Tone frequency offset from the carrier [MHz].
    pub freq_mhz: f64,
    /// Amplitude as a full-scale fraction, in `[-1, 1]`.
    pub amp: f64,
    /// Accumulated phase [turns].
    pub phase: f64,
}

/// Configuration of an RWG channel once its carrier has been set.
///
/// The SBG list is kept sorted by index so two profiles reached through
/// different op orders compare equal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RwgProfile {
    /// Carrier frequency [MHz].
    pub carrier_mhz: f64,
    /// Per-SBG tone snapshots, sorted by `sbg`.
    pub sbgs: Vec<SbgSnapshot>,
}

impl RwgProfile {
    /// Profile with a carrier and no tones configured.
    pub fn with_carrier(carrier_mhz: f64) -> Self {
        Self {
            carrier_mhz,
            sbgs: Vec::new(),
        }
    }

    /// Snapshot for one SBG, if configured.
    pub fn sbg(&self, sbg: u8) -> Option<&SbgSnapshot> {
        self.sbgs.iter().find(|s| s.sbg == sbg)
    }

    /// Insert or replace a snapshot, keeping the list sorted.
    pub fn upsert(&mut self, snap: SbgSnapshot) {
        match self.sbgs.binary_search_by_key(&snap.sbg, |s| s.sbg) {
            Ok(i) => self.sbgs[i] = snap,
            Err(i) => self.sbgs.insert(i, snap),
        }
    }

    /// Ids of all configured SBGs.
    pub fn sbg_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.sbgs.iter().map(|s| s.sbg)
    }
}

// ─── Channel state ──────────────────────────────────────────────────

/// State of one hardware line at a lane boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelState {
    /// TTL line before initialization.
    TtlUninit,
    /// TTL line driven low.
    TtlOff,
    /// TTL line driven high.
    TtlOn,
    /// RWG port before initialization.
    RwgUninit,
    /// Carrier configured, RF output disabled.
    RwgReady(RwgProfile),
    /// Carrier configured, RF output enabled.
    RwgActive(RwgProfile),
}

impl ChannelState {
    /// Returns true for either RWG state that carries a profile.
    #[inline]
    pub fn is_rwg_configured(&self) -> bool {
        matches!(self, Self::RwgReady(_) | Self::RwgActive(_))
    }

    /// The RWG profile, if this state carries one.
    pub fn rwg_profile(&self) -> Option<&RwgProfile> {
        match self {
            Self::RwgReady(p) | Self::RwgActive(p) => Some(p),
            _ => None,
        }
    }

    /// Rebuild this state around a new profile, preserving the RF flag.
    ///
    /// Returns `None` when the state carries no profile.
    pub fn with_profile(&self, profile: RwgProfile) -> Option<Self> {
        match self {
            Self::RwgReady(_) => Some(Self::RwgReady(profile)),
            Self::RwgActive(_) => Some(Self::RwgActive(profile)),
            _ => None,
        }
    }

    /// Short tag for diagnostics and error messages.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::TtlUninit => "ttl-uninit",
            Self::TtlOff => "ttl-off",
            Self::TtlOn => "ttl-on",
            Self::RwgUninit => "rwg-uninit",
            Self::RwgReady(_) => "rwg-ready",
            Self::RwgActive(_) => "rwg-active",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RwgReady(p) => write!(f, "rwg-ready({} MHz)", p.carrier_mhz),
            Self::RwgActive(p) => write!(f, "rwg-active({} MHz)", p.carrier_mhz),
            other => f.write_str(other.tag()),
        }
    }
}

/// Whether `from -> to` is a legal hardware transition.
///
/// TTL lines allow init, level changes, and level holds. RWG ports allow
/// init, reconfiguration at the same RF setting, and RF toggles. Everything
/// else is rejected at construction or composition time.
pub fn transition_legal(from: &ChannelState, to: &ChannelState) -> bool {
    use ChannelState::*;
    matches!(
        (from, to),
        (TtlUninit, TtlOff)
            | (TtlOff, TtlOn)
            | (TtlOn, TtlOff)
            | (TtlOff, TtlOff)
            | (TtlOn, TtlOn)
            | (RwgUninit, RwgReady(_))
            | (RwgReady(_), RwgReady(_))
            | (RwgActive(_), RwgActive(_))
            | (RwgReady(_), RwgActive(_))
            | (RwgActive(_), RwgReady(_))
    )
}
