//! SEQC Core Library
//!
//! The immutable timing algebra: atomic operations, per-channel lanes,
//! multi-channel morphisms, and the factory layer that constructs them.
//!
//! # Module Structure
//!
//! - [`op`] - Atomic operations and state inference
//! - [`lane`] - Per-channel operation sequences with continuity checking
//! - [`morphism`] - The three composition operators
//! - [`factory`] - Validated constructors for atomic morphisms
//! - [`template`] - Channel-less step sequences for the API edge
//! - [`timeline`] - Text views for debugging
//! - [`error`] - `BuildError` and `ComposeError`
//!
//! # Usage
//!
//! ```rust
//! use seqc_common::board::Channel;
//! use seqc_core::factory::{hold_us, ttl_init, ttl_off, ttl_on};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ch = Channel::ttl("RWG_0", 0);
//! let pulse = ttl_init(&ch)?
//!     .then(&ttl_on(&ch)?)?
//!     .then(&hold_us(&ch, 10.0)?)?
//!     .then(&ttl_off(&ch)?)?;
//! assert_eq!(pulse.total_duration(), 2500);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod factory;
pub mod lane;
pub mod morphism;
pub mod op;
pub mod template;
pub mod timeline;

pub use error::{BuildError, ComposeError};
pub use lane::Lane;
pub use morphism::Morphism;
pub use op::{AtomicOp, OpKind, OpParams};
pub use template::{Template, TemplateError};
