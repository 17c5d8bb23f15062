//! Load-pipelining demo: two RWG sweeps on one board whose coefficient
//! loads share the serial loader and hide inside idle windows.
//!
//! ```text
//! cargo run --example rwg_pipelining
//! ```

use seqc_common::board::Channel;
use seqc_common::waveform::SbgTarget;
use seqc_compiler::{compile_detailed, CompileOptions};
use seqc_core::factory::{hold_us, linear_ramp, rwg_init};

fn sweep_targets(first_sbg: u8) -> Vec<SbgTarget> {
    (0..25)
        .map(|i| SbgTarget::new(first_sbg + i, 1.0 + i as f64 * 0.25, 0.5))
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let c0 = Channel::rwg("B0", 0);
    let c1 = Channel::rwg("B0", 1);

    // 25 targets x 4 registers = 1400 loader cycles per channel.
    let a = rwg_init(&c0, 100.0)?
        .then(&hold_us(&c0, 10.0)?)?
        .then(&linear_ramp(&c0, &sweep_targets(0), 2500)?)?;
    let b = rwg_init(&c1, 100.0)?
        .then(&hold_us(&c1, 15.0)?)?
        .then(&linear_ramp(&c1, &sweep_targets(32), 2500)?)?;
    let shot = a.par(&b)?;

    let report = compile_detailed(&shot, &CompileOptions::default())?;
    println!("{}", report.schedule_table());
    println!("{}", report.render());

    Ok(())
}
