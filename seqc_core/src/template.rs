//! Channel-less program templates.
//!
//! A `Template` is a reusable recipe: the same step sequence applied to
//! different channels yields independent morphisms. Steps are recorded
//! without validation; [`Template::apply`] runs the ordinary factories, so
//! every construction check fires at application time against the real
//! channel. The core compiler never sees templates, only the morphisms
//! they produce.
//!
//! ```rust
//! use seqc_common::board::Channel;
//! use seqc_core::template::Template;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pulse = Template::new().ttl_init().ttl_on().hold_us(10.0).ttl_off();
//! let a = pulse.apply(&Channel::ttl("B0", 0))?;
//! let b = pulse.apply(&Channel::ttl("B0", 1))?;
//! let both = a.par(&b)?;
//! assert_eq!(both.total_duration(), 2500);
//! # Ok(())
//! # }
//! ```

use crate::error::{BuildError, ComposeError};
use crate::factory;
use crate::morphism::Morphism;
use seqc_common::board::Channel;
use seqc_common::time::{cycles_from_secs, cycles_from_us};
use seqc_common::waveform::SbgTarget;
use thiserror::Error;

/// Failure while applying a template to a channel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// A step's factory rejected the channel or parameters.
    #[error("template step {index} ({step}): {source}")]
    Build {
        /// Zero-based step index.
        index: usize,
        /// Step tag.
        step: &'static str,
        /// Factory error.
        source: BuildError,
    },

    /// Two adjacent steps cannot be chained.
    #[error("template step {index} ({step}): {source}")]
    Chain {
        /// Zero-based step index.
        index: usize,
        /// Step tag.
        step: &'static str,
        /// Composition error.
        source: ComposeError,
    },

    /// A template with no steps has no morphism.
    #[error("template has no steps")]
    Empty,
}

/// One recorded step of a template.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    TtlInit,
    TtlOn,
    TtlOff,
    Hold { cycles: u64 },
    RwgInit { carrier_mhz: f64 },
    SetCarrier { carrier_mhz: f64 },
    SetState { targets: Vec<SbgTarget> },
    LinearRamp { targets: Vec<SbgTarget>, cycles: u64 },
    RfSwitch { on: bool },
}

impl Step {
    fn tag(&self) -> &'static str {
        match self {
            Self::TtlInit => "ttl-init",
            Self::TtlOn => "ttl-on",
            Self::TtlOff => "ttl-off",
            Self::Hold { .. } => "hold",
            Self::RwgInit { .. } => "rwg-init",
            Self::SetCarrier { .. } => "set-carrier",
            Self::SetState { .. } => "set-state",
            Self::LinearRamp { .. } => "linear-ramp",
            Self::RfSwitch { .. } => "rf-switch",
        }
    }
}

/// Reusable, channel-less step sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    steps: Vec<Step>,
}

impl Template {
    /// Empty template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when no steps are recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a TTL initialization.
    pub fn ttl_init(self) -> Self {
        self.push(Step::TtlInit)
    }

    /// Append a rising edge.
    pub fn ttl_on(self) -> Self {
        self.push(Step::TtlOn)
    }

    /// Append a falling edge.
    pub fn ttl_off(self) -> Self {
        self.push(Step::TtlOff)
    }

    /// Append a hold in cycles.
    pub fn hold(self, cycles: u64) -> Self {
        self.push(Step::Hold { cycles })
    }

    /// Append a hold in microseconds.
    pub fn hold_us(self, us: f64) -> Self {
        self.hold(cycles_from_us(us))
    }

    /// Append a hold in seconds.
    pub fn hold_s(self, secs: f64) -> Self {
        self.hold(cycles_from_secs(secs))
    }

    /// Append an RWG port initialization.
    pub fn rwg_init(self, carrier_mhz: f64) -> Self {
        self.push(Step::RwgInit { carrier_mhz })
    }

    /// Append a carrier retune.
    pub fn set_carrier(self, carrier_mhz: f64) -> Self {
        self.push(Step::SetCarrier { carrier_mhz })
    }

    /// Append an instantaneous tone retune.
    pub fn set_state(self, targets: &[SbgTarget]) -> Self {
        self.push(Step::SetState {
            targets: targets.to_vec(),
        })
    }

    /// Append a linear sweep over `cycles`.
    pub fn linear_ramp(self, targets: &[SbgTarget], cycles: u64) -> Self {
        self.push(Step::LinearRamp {
            targets: targets.to_vec(),
            cycles,
        })
    }

    /// Append an RF output toggle.
    pub fn rf_switch(self, on: bool) -> Self {
        self.push(Step::RfSwitch { on })
    }

    /// Apply the recorded steps to a concrete channel.
    ///
    /// Steps are built through the ordinary factories and chained with
    /// auto-serial composition, so validation and state inference behave
    /// exactly as in hand-written programs.
    pub fn apply(&self, ch: &Channel) -> Result<Morphism, TemplateError> {
        let mut acc: Option<Morphism> = None;
        for (index, step) in self.steps.iter().enumerate() {
            let built = self.build_step(ch, step).map_err(|source| {
                TemplateError::Build {
                    index,
                    step: step.tag(),
                    source,
                }
            })?;
            acc = Some(match acc {
                None => built,
                Some(m) => m.then(&built).map_err(|source| TemplateError::Chain {
                    index,
                    step: step.tag(),
                    source,
                })?,
            });
        }
        acc.ok_or(TemplateError::Empty)
    }

    fn build_step(&self, ch: &Channel, step: &Step) -> Result<Morphism, BuildError> {
        match step {
            Step::TtlInit => factory::ttl_init(ch),
            Step::TtlOn => factory::ttl_on(ch),
            Step::TtlOff => factory::ttl_off(ch),
            Step::Hold { cycles } => factory::hold(ch, *cycles),
            Step::RwgInit { carrier_mhz } => factory::rwg_init(ch, *carrier_mhz),
            Step::SetCarrier { carrier_mhz } => factory::set_carrier(ch, *carrier_mhz),
            Step::SetState { targets } => factory::set_state(ch, targets),
            Step::LinearRamp { targets, cycles } => factory::linear_ramp(ch, targets, *cycles),
            Step::RfSwitch { on } => factory::rf_switch(ch, *on),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{hold_us, ttl_init, ttl_off, ttl_on};

    #[test]
    fn template_matches_hand_built_program() {
        let ch = Channel::ttl("B0", 0);
        let templated = Template::new()
            .ttl_init()
            .ttl_on()
            .hold_us(10.0)
            .ttl_off()
            .apply(&ch)
            .unwrap();
        let hand_built = ttl_init(&ch)
            .unwrap()
            .then(&ttl_on(&ch).unwrap())
            .unwrap()
            .then(&hold_us(&ch, 10.0).unwrap())
            .unwrap()
            .then(&ttl_off(&ch).unwrap())
            .unwrap();
        assert_eq!(templated, hand_built);
    }

    #[test]
    fn template_reuse_across_channels() {
        let pulse = Template::new().ttl_init().ttl_on().hold(500).ttl_off();
        assert_eq!(pulse.len(), 4);
        let a = pulse.apply(&Channel::ttl("B0", 0)).unwrap();
        let b = pulse.apply(&Channel::ttl("B0", 1)).unwrap();
        let both = a.par(&b).unwrap();
        assert_eq!(both.channel_count(), 2);
        assert_eq!(both.total_duration(), 500);
    }

    #[test]
    fn build_errors_carry_the_step_index() {
        let err = Template::new()
            .ttl_init()
            .rwg_init(100.0)
            .apply(&Channel::ttl("B0", 0))
            .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::Build {
                index: 1,
                step: "rwg-init",
                ..
            }
        ));
    }

    #[test]
    fn chain_errors_carry_the_step_index() {
        let err = Template::new()
            .ttl_init()
            .ttl_off()
            .apply(&Channel::ttl("B0", 0))
            .unwrap_err();
        assert!(matches!(err, TemplateError::Chain { index: 1, .. }));
    }

    #[test]
    fn empty_template_is_rejected() {
        assert_eq!(
            Template::new().apply(&Channel::ttl("B0", 0)).unwrap_err(),
            TemplateError::Empty
        );
    }

    #[test]
    fn rwg_template_chains_ramps() {
        let ch = Channel::rwg("B0", 0);
        let m = Template::new()
            .rwg_init(100.0)
            .hold_us(10.0)
            .linear_ramp(&[SbgTarget::new(0, 10.0, 0.5)], 2500)
            .rf_switch(true)
            .apply(&ch)
            .unwrap();
        assert!(m.is_resolved());
        assert_eq!(m.total_duration(), 5000);
    }
}
