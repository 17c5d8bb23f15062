//! Common re-exports for convenience.
//!
//! ```rust
//! use seqc_common::prelude::*;
//!
//! let ch = Channel::ttl("B0", 0);
//! assert_eq!(ch.kind, ChannelKind::Ttl);
//! assert_eq!(cycles_from_us(10.0), 2500);
//! ```

pub use crate::board::{BoardId, Channel, ChannelKind};
pub use crate::consts::{MAX_RWG_PORTS, MAX_SBG, MAX_TTL_LINES};
pub use crate::state::{ChannelState, RwgProfile, SbgSnapshot};
pub use crate::time::{cycles_from_secs, cycles_from_us, secs_from_cycles, us_from_cycles, CLOCK_HZ};
pub use crate::waveform::{OrderFlags, SbgParams, SbgTarget};
