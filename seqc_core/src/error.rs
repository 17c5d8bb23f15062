//! Error types for the algebra layer.
//!
//! Two enums, matching the two failure surfaces: `BuildError` for factory
//! validation and `ComposeError` for composition. Both carry the offending
//! channel so callers can point at the exact line in the user's program.

use seqc_common::board::{BoardId, Channel, ChannelKind};
use thiserror::Error;

/// Construction-time validation failure from the factory layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// Factory applied to a channel of the wrong kind.
    #[error("channel {channel} is not a {expected} line")]
    WrongChannelKind {
        /// Offending channel.
        channel: Channel,
        /// Kind the factory requires.
        expected: ChannelKind,
    },

    /// Local index does not address real hardware.
    #[error("channel {channel}: local index exceeds the hardware limit of {max}")]
    ChannelIndexOutOfRange {
        /// Offending channel.
        channel: Channel,
        /// Exclusive upper bound for this kind.
        max: u8,
    },

    /// Carrier frequency outside the synthesizable range.
    #[error("channel {channel}: carrier {carrier_mhz} MHz outside (0, 250]")]
    CarrierOutOfRange {
        /// Offending channel.
        channel: Channel,
        /// Requested carrier [MHz].
        carrier_mhz: f64,
    },

    /// Amplitude target outside full scale.
    #[error("channel {channel}, SBG {sbg}: amplitude {amp} outside [-1, 1]")]
    AmplitudeOutOfRange {
        /// Offending channel.
        channel: Channel,
        /// Target SBG.
        sbg: u8,
        /// Requested amplitude.
        amp: f64,
    },

    /// Frequency target outside the synthesizable range.
    #[error("channel {channel}, SBG {sbg}: frequency {freq_mhz} MHz outside [0, 250]")]
    FrequencyOutOfRange {
        /// Offending channel.
        channel: Channel,
        /// Target SBG.
        sbg: u8,
        /// Requested frequency [MHz].
        freq_mhz: f64,
    },

    /// SBG index beyond the per-channel hardware limit.
    #[error("channel {channel}: unknown SBG {sbg} (limit {max})")]
    UnknownSbg {
        /// Offending channel.
        channel: Channel,
        /// Requested SBG index.
        sbg: u8,
        /// Exclusive upper bound.
        max: u8,
    },

    /// Same SBG listed twice in one target set.
    #[error("channel {channel}: SBG {sbg} targeted twice")]
    DuplicateSbg {
        /// Offending channel.
        channel: Channel,
        /// Duplicated SBG index.
        sbg: u8,
    },

    /// Waveform factory called with no targets.
    #[error("channel {channel}: empty target list")]
    EmptyTargets {
        /// Offending channel.
        channel: Channel,
    },

    /// Ramp over zero cycles cannot define a slope.
    #[error("channel {channel}: ramp duration must be non-zero")]
    ZeroDurationRamp {
        /// Offending channel.
        channel: Channel,
    },

    /// Sync group lists a channel more than once.
    #[error("sync group lists channel {channel} more than once")]
    SyncChannelOverlap {
        /// Repeated channel.
        channel: Channel,
    },
}

/// Composition-time failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComposeError {
    /// Strict serial boundary states differ.
    #[error("state mismatch on {channel}: left ends in {expected}, right starts in {found}")]
    StateMismatch {
        /// Channel at the boundary.
        channel: Channel,
        /// End state of the left operand.
        expected: String,
        /// Start state of the right operand.
        found: String,
    },

    /// Strict serial requires concrete boundary states.
    #[error("unresolved boundary state on {channel}; chain with auto-serial or start from an init")]
    UnresolvedBoundary {
        /// Channel at the boundary.
        channel: Channel,
    },

    /// State inference could not apply an operation to the incoming state.
    #[error("cannot apply {op} on {channel} to state {state}: {cause}")]
    InvalidResolution {
        /// Channel being resolved.
        channel: Channel,
        /// Operation kind tag.
        op: &'static str,
        /// Incoming state tag.
        state: String,
        /// Human-readable cause.
        cause: &'static str,
    },

    /// Inference produced a transition the hardware cannot perform.
    #[error("illegal transition on {channel}: {from} -> {to}")]
    IllegalTransition {
        /// Channel being resolved.
        channel: Channel,
        /// Source state.
        from: String,
        /// Destination state.
        to: String,
    },

    /// Parallel operands share a channel.
    #[error("channel {channel} appears on both sides of a parallel composition")]
    ChannelConflict {
        /// Shared channel.
        channel: Channel,
    },

    /// Two same-board RWG lanes drive the same SBG.
    #[error("board {board}: SBG {sbg} driven by both {first} and {second}")]
    SbgCollision {
        /// Board owning the colliding engines.
        board: BoardId,
        /// Colliding SBG index.
        sbg: u8,
        /// First claimant.
        first: Channel,
        /// Second claimant.
        second: Channel,
    },

    /// Adjacent lane operations disagree on the intermediate state.
    #[error("lane continuity broken on {channel} at op {index}")]
    ContinuityBroken {
        /// Lane channel.
        channel: Channel,
        /// Index of the successor op.
        index: usize,
    },
}
