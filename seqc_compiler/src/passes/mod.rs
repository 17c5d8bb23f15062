//! The compiler pipeline, one module per pass.
//!
//! Passes run in order and each consumes the previous pass's enrichment:
//!
//! 0. [`extract`] - flatten the morphism into per-board event lists
//! 1. [`translate`] - synthesize each event's call list (with TTL fusion)
//! 2. [`cost`] - physical windows and sync-frame (epoch) tagging
//! 3. [`schedule`] - place loads on the per-board serial loader
//! 4. [`validate`] - re-check every scheduling invariant
//! 5. [`emit`] - waits, call streams, and master-wait back-fill

pub(crate) mod cost;
pub(crate) mod emit;
pub(crate) mod extract;
pub(crate) mod schedule;
pub(crate) mod translate;
pub(crate) mod validate;
