//! Minimal end-to-end demo: a 10 µs TTL pulse on one board.
//!
//! ```text
//! cargo run --example ttl_pulse
//! ```

use seqc_common::board::Channel;
use seqc_compiler::{compile_detailed, CompileOptions};
use seqc_core::factory::{hold_us, ttl_init, ttl_off, ttl_on};
use seqc_core::timeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let ch = Channel::ttl("RWG_0", 0);
    let pulse = ttl_init(&ch)?
        .then(&ttl_on(&ch)?)?
        .then(&hold_us(&ch, 10.0)?)?
        .then(&ttl_off(&ch)?)?;

    println!("{}", timeline::timeline(&pulse));

    let report = compile_detailed(&pulse, &CompileOptions::default())?;
    println!("{}", report.render());

    Ok(())
}
