//! Factory layer: constructors for atomic morphisms.
//!
//! Every factory validates the hardware transition and parameter ranges at
//! construction time and returns a one-channel [`Morphism`]. Context-free
//! factories (holds, RWG retunes, ramps) leave their endpoint states
//! unresolved; chaining with [`Morphism::then`] fills them in.

use crate::error::BuildError;
use crate::lane::Lane;
use crate::morphism::Morphism;
use crate::op::{AtomicOp, OpKind, OpParams};
use seqc_common::board::{Channel, ChannelKind};
use seqc_common::consts::{MAX_RWG_PORTS, MAX_SBG, MAX_TTL_LINES};
use seqc_common::state::{ChannelState, RwgProfile};
use seqc_common::time::{cycles_from_secs, cycles_from_us};
use seqc_common::waveform::{OrderFlags, SbgParams, SbgTarget};
use std::collections::BTreeMap;

// ─── Validation helpers ─────────────────────────────────────────────

fn require_kind(ch: &Channel, expected: ChannelKind) -> Result<(), BuildError> {
    if ch.kind != expected {
        return Err(BuildError::WrongChannelKind {
            channel: ch.clone(),
            expected,
        });
    }
    require_index(ch)
}

fn require_index(ch: &Channel) -> Result<(), BuildError> {
    let max = match ch.kind {
        ChannelKind::Ttl => MAX_TTL_LINES,
        ChannelKind::Rwg => MAX_RWG_PORTS,
    };
    if ch.local_id >= max {
        return Err(BuildError::ChannelIndexOutOfRange {
            channel: ch.clone(),
            max,
        });
    }
    Ok(())
}

fn require_carrier(ch: &Channel, carrier_mhz: f64) -> Result<(), BuildError> {
    if !(carrier_mhz > 0.0 && carrier_mhz <= 250.0) {
        return Err(BuildError::CarrierOutOfRange {
            channel: ch.clone(),
            carrier_mhz,
        });
    }
    Ok(())
}

fn require_targets(ch: &Channel, targets: &[SbgTarget]) -> Result<(), BuildError> {
    if targets.is_empty() {
        return Err(BuildError::EmptyTargets {
            channel: ch.clone(),
        });
    }
    let mut seen = [false; MAX_SBG as usize];
    for t in targets {
        if !t.sbg_in_range() {
            return Err(BuildError::UnknownSbg {
                channel: ch.clone(),
                sbg: t.sbg,
                max: MAX_SBG,
            });
        }
        if seen[t.sbg as usize] {
            return Err(BuildError::DuplicateSbg {
                channel: ch.clone(),
                sbg: t.sbg,
            });
        }
        seen[t.sbg as usize] = true;
        if !(-1.0..=1.0).contains(&t.amp) {
            return Err(BuildError::AmplitudeOutOfRange {
                channel: ch.clone(),
                sbg: t.sbg,
                amp: t.amp,
            });
        }
        if !(0.0..=250.0).contains(&t.freq_mhz) {
            return Err(BuildError::FrequencyOutOfRange {
                channel: ch.clone(),
                sbg: t.sbg,
                freq_mhz: t.freq_mhz,
            });
        }
    }
    Ok(())
}

fn single_op(
    ch: &Channel,
    kind: OpKind,
    start: Option<ChannelState>,
    end: Option<ChannelState>,
    duration_cyc: u64,
    params: OpParams,
) -> Morphism {
    let op = AtomicOp::new(ch.clone(), kind, start, end, duration_cyc, params);
    Morphism::from_lane(Lane::from_factory_ops(ch.clone(), vec![op]))
}

// ─── TTL factories ──────────────────────────────────────────────────

/// Initialize a TTL line: uninitialized → off, duration 0.
pub fn ttl_init(ch: &Channel) -> Result<Morphism, BuildError> {
    require_kind(ch, ChannelKind::Ttl)?;
    Ok(single_op(
        ch,
        OpKind::TtlInit,
        Some(ChannelState::TtlUninit),
        Some(ChannelState::TtlOff),
        0,
        OpParams::None,
    ))
}

/// Drive a TTL line high: off → on, duration 0.
pub fn ttl_on(ch: &Channel) -> Result<Morphism, BuildError> {
    require_kind(ch, ChannelKind::Ttl)?;
    Ok(single_op(
        ch,
        OpKind::TtlOn,
        Some(ChannelState::TtlOff),
        Some(ChannelState::TtlOn),
        0,
        OpParams::None,
    ))
}

/// Drive a TTL line low: on → off, duration 0.
pub fn ttl_off(ch: &Channel) -> Result<Morphism, BuildError> {
    require_kind(ch, ChannelKind::Ttl)?;
    Ok(single_op(
        ch,
        OpKind::TtlOff,
        Some(ChannelState::TtlOn),
        Some(ChannelState::TtlOff),
        0,
        OpParams::None,
    ))
}

// ─── Identity factories ─────────────────────────────────────────────

/// Maintain the channel's current state for `cycles`.
pub fn hold(ch: &Channel, cycles: u64) -> Result<Morphism, BuildError> {
    require_index(ch)?;
    Ok(single_op(ch, OpKind::Hold, None, None, cycles, OpParams::None))
}

/// Alias for [`hold`]; the algebraic identity on one channel.
pub fn identity(ch: &Channel, cycles: u64) -> Result<Morphism, BuildError> {
    hold(ch, cycles)
}

/// [`hold`] with a microsecond duration.
pub fn hold_us(ch: &Channel, us: f64) -> Result<Morphism, BuildError> {
    hold(ch, cycles_from_us(us))
}

/// [`hold`] with a second duration.
pub fn hold_s(ch: &Channel, secs: f64) -> Result<Morphism, BuildError> {
    hold(ch, cycles_from_secs(secs))
}

// ─── RWG factories ──────────────────────────────────────────────────

/// Initialize an RWG port: uninitialized → ready with the given carrier.
pub fn rwg_init(ch: &Channel, carrier_mhz: f64) -> Result<Morphism, BuildError> {
    require_kind(ch, ChannelKind::Rwg)?;
    require_carrier(ch, carrier_mhz)?;
    Ok(single_op(
        ch,
        OpKind::RwgInit,
        Some(ChannelState::RwgUninit),
        Some(ChannelState::RwgReady(RwgProfile::with_carrier(carrier_mhz))),
        0,
        OpParams::Carrier { mhz: carrier_mhz },
    ))
}

/// Retune the carrier of an initialized port, keeping its tones.
pub fn set_carrier(ch: &Channel, carrier_mhz: f64) -> Result<Morphism, BuildError> {
    require_kind(ch, ChannelKind::Rwg)?;
    require_carrier(ch, carrier_mhz)?;
    Ok(single_op(
        ch,
        OpKind::RwgSetCarrier,
        None,
        None,
        0,
        OpParams::Carrier { mhz: carrier_mhz },
    ))
}

/// Retune SBG tones instantaneously.
///
/// Pre-stages the coefficients (hidden physical cost) and latches them with
/// a zero-duration play; the new tones sound during the next logical
/// interval.
pub fn set_state(ch: &Channel, targets: &[SbgTarget]) -> Result<Morphism, BuildError> {
    require_kind(ch, ChannelKind::Rwg)?;
    require_targets(ch, targets)?;

    let coeffs: Vec<SbgParams> = targets
        .iter()
        .map(|t| {
            let mut flags = OrderFlags::FREQ0 | OrderFlags::AMP0;
            if t.phase.is_some() {
                flags |= OrderFlags::PHASE;
            }
            SbgParams {
                sbg: t.sbg,
                freq: [t.freq_mhz, 0.0, 0.0, 0.0],
                amp: [t.amp, 0.0, 0.0, 0.0],
                phase: t.phase.unwrap_or(0.0),
                flags,
            }
        })
        .collect();

    waveform_pair(ch, targets, 0, Some(coeffs))
}

/// Sweep SBG tones linearly from their current values over `cycles`.
///
/// The slope coefficients depend on the tones at the boundary, so they are
/// derived when the morphism is chained after a concrete predecessor.
pub fn linear_ramp(ch: &Channel, targets: &[SbgTarget], cycles: u64) -> Result<Morphism, BuildError> {
    require_kind(ch, ChannelKind::Rwg)?;
    require_targets(ch, targets)?;
    if cycles == 0 {
        return Err(BuildError::ZeroDurationRamp {
            channel: ch.clone(),
        });
    }
    waveform_pair(ch, targets, cycles, None)
}

/// Build the load + play pair shared by [`set_state`] and [`linear_ramp`].
fn waveform_pair(
    ch: &Channel,
    targets: &[SbgTarget],
    play_cyc: u64,
    coeffs: Option<Vec<SbgParams>>,
) -> Result<Morphism, BuildError> {
    let targets: std::sync::Arc<[SbgTarget]> = targets.to_vec().into();
    let load = AtomicOp::new(
        ch.clone(),
        OpKind::RwgLoadCoeffs,
        None,
        None,
        0,
        OpParams::Load {
            targets: targets.clone(),
            ramp_dur_cyc: play_cyc,
            coeffs: coeffs.map(Into::into),
        },
    );
    let play = AtomicOp::new(
        ch.clone(),
        OpKind::RwgUpdateParams,
        None,
        None,
        play_cyc,
        OpParams::Play { targets },
    );
    Ok(Morphism::from_lane(Lane::from_factory_ops(
        ch.clone(),
        vec![load, play],
    )))
}

/// Toggle the RF output enable: ready ↔ active.
pub fn rf_switch(ch: &Channel, on: bool) -> Result<Morphism, BuildError> {
    require_kind(ch, ChannelKind::Rwg)?;
    Ok(single_op(
        ch,
        OpKind::RwgRfSwitch,
        None,
        None,
        0,
        OpParams::Rf { on },
    ))
}

// ─── Global-sync factories ──────────────────────────────────────────

/// Trigger all slave boards from the master board's sequencer.
///
/// The wait argument of the emitted trigger call is back-filled by the
/// compiler once the first sync frame's length is known.
pub fn sync_master(ch: &Channel, code: u16) -> Result<Morphism, BuildError> {
    require_index(ch)?;
    Ok(single_op(
        ch,
        OpKind::SyncMaster,
        None,
        None,
        0,
        OpParams::Sync { code },
    ))
}

/// Block a slave board until the master's trigger arrives.
pub fn sync_slave(ch: &Channel, code: u16) -> Result<Morphism, BuildError> {
    require_index(ch)?;
    Ok(single_op(
        ch,
        OpKind::SyncSlave,
        None,
        None,
        0,
        OpParams::Sync { code },
    ))
}

/// One master trigger in parallel with a wait on every slave channel.
pub fn global_sync(master: &Channel, slaves: &[Channel], code: u16) -> Result<Morphism, BuildError> {
    require_index(master)?;
    let mut lanes = BTreeMap::new();
    let master_m = sync_master(master, code)?;
    if let Some(lane) = master_m.lane(master) {
        lanes.insert(master.clone(), lane.clone());
    }
    for slave in slaves {
        if lanes.contains_key(slave) {
            return Err(BuildError::SyncChannelOverlap {
                channel: slave.clone(),
            });
        }
        let slave_m = sync_slave(slave, code)?;
        if let Some(lane) = slave_m.lane(slave) {
            lanes.insert(slave.clone(), lane.clone());
        }
    }
    Ok(Morphism::from_lanes(lanes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ttl(i: u8) -> Channel {
        Channel::ttl("B0", i)
    }

    fn rwg(i: u8) -> Channel {
        Channel::rwg("B0", i)
    }

    #[test]
    fn ttl_factories_validate_kind_and_index() {
        assert!(ttl_init(&ttl(0)).is_ok());
        assert!(matches!(
            ttl_init(&rwg(0)).unwrap_err(),
            BuildError::WrongChannelKind { .. }
        ));
        assert!(matches!(
            ttl_on(&Channel::ttl("B0", MAX_TTL_LINES)).unwrap_err(),
            BuildError::ChannelIndexOutOfRange { .. }
        ));
    }

    #[test]
    fn rwg_init_validates_carrier() {
        assert!(rwg_init(&rwg(0), 100.0).is_ok());
        assert!(matches!(
            rwg_init(&rwg(0), 0.0).unwrap_err(),
            BuildError::CarrierOutOfRange { .. }
        ));
        assert!(matches!(
            rwg_init(&rwg(0), 300.0).unwrap_err(),
            BuildError::CarrierOutOfRange { .. }
        ));
    }

    #[test]
    fn target_validation() {
        let ch = rwg(0);
        assert!(matches!(
            set_state(&ch, &[]).unwrap_err(),
            BuildError::EmptyTargets { .. }
        ));
        assert!(matches!(
            set_state(&ch, &[SbgTarget::new(MAX_SBG, 1.0, 0.1)]).unwrap_err(),
            BuildError::UnknownSbg { .. }
        ));
        assert!(matches!(
            set_state(&ch, &[SbgTarget::new(0, 1.0, 1.5)]).unwrap_err(),
            BuildError::AmplitudeOutOfRange { .. }
        ));
        assert!(matches!(
            set_state(&ch, &[SbgTarget::new(0, -3.0, 0.5)]).unwrap_err(),
            BuildError::FrequencyOutOfRange { .. }
        ));
        assert!(matches!(
            set_state(
                &ch,
                &[SbgTarget::new(1, 1.0, 0.5), SbgTarget::new(1, 2.0, 0.5)]
            )
            .unwrap_err(),
            BuildError::DuplicateSbg { .. }
        ));
    }

    #[test]
    fn set_state_derives_coefficients_eagerly() {
        let m = set_state(&rwg(0), &[SbgTarget::new(0, 10.0, 0.5)]).unwrap();
        let lane = m.lane(&rwg(0)).unwrap();
        assert_eq!(lane.ops().len(), 2);
        let OpParams::Load {
            coeffs: Some(coeffs),
            ..
        } = &lane.ops()[0].params
        else {
            panic!("static retune must carry coefficients");
        };
        assert_eq!(coeffs[0].freq[0], 10.0);
        assert_eq!(coeffs[0].param_count(), 2);
        assert_eq!(m.total_duration(), 0);
    }

    #[test]
    fn linear_ramp_defers_coefficients() {
        let m = linear_ramp(&rwg(0), &[SbgTarget::new(0, 10.0, 0.5)], 2500).unwrap();
        let lane = m.lane(&rwg(0)).unwrap();
        let OpParams::Load { coeffs, .. } = &lane.ops()[0].params else {
            panic!("ramp lane must start with a load");
        };
        assert!(coeffs.is_none());
        assert_eq!(m.total_duration(), 2500);

        assert!(matches!(
            linear_ramp(&rwg(0), &[SbgTarget::new(0, 10.0, 0.5)], 0).unwrap_err(),
            BuildError::ZeroDurationRamp { .. }
        ));
    }

    #[test]
    fn ramp_resolves_after_init() {
        let m = rwg_init(&rwg(0), 100.0)
            .unwrap()
            .then(&linear_ramp(&rwg(0), &[SbgTarget::new(0, 10.0, 0.5)], 2500).unwrap())
            .unwrap();
        assert!(m.is_resolved());
        let lane = m.lane(&rwg(0)).unwrap();
        let OpParams::Load {
            coeffs: Some(coeffs),
            ..
        } = &lane.ops()[1].params
        else {
            panic!("ramp coefficients must be derived after chaining");
        };
        assert_eq!(coeffs[0].freq[1], 1.0); // 10 MHz over 10 us
    }

    #[test]
    fn global_sync_rejects_duplicates() {
        let m = global_sync(&ttl(0), &[ttl(1), Channel::ttl("B1", 0)], 7).unwrap();
        assert_eq!(m.channel_count(), 3);
        assert!(matches!(
            global_sync(&ttl(0), &[ttl(1), ttl(1)], 7).unwrap_err(),
            BuildError::SyncChannelOverlap { .. }
        ));
        assert!(matches!(
            global_sync(&ttl(0), &[ttl(0)], 7).unwrap_err(),
            BuildError::SyncChannelOverlap { .. }
        ));
    }
}
