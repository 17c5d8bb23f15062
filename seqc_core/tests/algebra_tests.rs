//! Algebra invariants: duration alignment, continuity, associativity,
//! commutativity, and the composition failure modes.

use proptest::prelude::*;
use seqc_common::board::Channel;
use seqc_common::waveform::SbgTarget;
use seqc_core::error::ComposeError;
use seqc_core::factory::{
    global_sync, hold, linear_ramp, rf_switch, rwg_init, set_state, ttl_init, ttl_off, ttl_on,
};
use seqc_core::Morphism;

fn ttl(board: &str, i: u8) -> Channel {
    Channel::ttl(board, i)
}

fn rwg(board: &str, i: u8) -> Channel {
    Channel::rwg(board, i)
}

/// `ttl_init → ttl_on → hold(d) → ttl_off` on one channel.
fn pulse(ch: &Channel, d: u64) -> Morphism {
    ttl_init(ch)
        .unwrap()
        .then(&ttl_on(ch).unwrap())
        .unwrap()
        .then(&hold(ch, d).unwrap())
        .unwrap()
        .then(&ttl_off(ch).unwrap())
        .unwrap()
}

#[test]
fn every_lane_matches_total_duration() {
    let m = pulse(&ttl("B0", 0), 2500)
        .par(&pulse(&ttl("B0", 1), 700))
        .unwrap()
        .par(&pulse(&ttl("B1", 0), 1200))
        .unwrap();
    assert_eq!(m.total_duration(), 2500);
    for (_, lane) in m.lanes() {
        assert_eq!(lane.total_duration(), m.total_duration());
    }
}

#[test]
fn lanes_are_state_continuous() {
    let m = pulse(&ttl("B0", 0), 100)
        .then(&ttl_on(&ttl("B0", 0)).unwrap())
        .unwrap();
    for (_, lane) in m.lanes() {
        for pair in lane.ops().windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}

#[test]
fn strict_serial_is_associative() {
    let ch = ttl("B0", 0);
    let a = ttl_init(&ch).unwrap();
    let b = ttl_on(&ch).unwrap();
    let c = ttl_off(&ch).unwrap();

    let left = a.compose(&b).unwrap().compose(&c).unwrap();
    let right = a.compose(&b.compose(&c).unwrap()).unwrap();
    assert_eq!(left, right);
}

#[test]
fn parallel_is_commutative() {
    let a = pulse(&ttl("B0", 0), 500);
    let b = pulse(&ttl("B0", 1), 900);
    assert_eq!(a.par(&b).unwrap(), b.par(&a).unwrap());
}

#[test]
fn strict_serial_rejects_double_on() {
    let ch = ttl("B0", 0);
    let on = ttl_on(&ch).unwrap();
    let err = on.compose(&on).unwrap_err();
    assert!(matches!(err, ComposeError::StateMismatch { .. }));
}

#[test]
fn parallel_rejects_shared_channel() {
    let ch = ttl("B0", 0);
    let err = ttl_init(&ch).unwrap().par(&ttl_on(&ch).unwrap()).unwrap_err();
    assert!(matches!(err, ComposeError::ChannelConflict { .. }));
}

#[test]
fn parallel_rejects_same_board_sbg_overlap() {
    let c0 = rwg("B0", 0);
    let c1 = rwg("B0", 1);
    let a = rwg_init(&c0, 100.0)
        .unwrap()
        .then(&set_state(&c0, &[SbgTarget::new(3, 5.0, 0.2)]).unwrap())
        .unwrap();
    let b = rwg_init(&c1, 100.0)
        .unwrap()
        .then(&set_state(&c1, &[SbgTarget::new(3, 7.0, 0.2)]).unwrap())
        .unwrap();
    let err = a.par(&b).unwrap_err();
    assert!(matches!(err, ComposeError::SbgCollision { sbg: 3, .. }));

    // Disjoint SBG sets on the same board are fine.
    let b_ok = rwg_init(&c1, 100.0)
        .unwrap()
        .then(&set_state(&c1, &[SbgTarget::new(4, 7.0, 0.2)]).unwrap())
        .unwrap();
    assert!(a.par(&b_ok).is_ok());

    // Same SBG on a different board is fine.
    let c2 = rwg("B1", 0);
    let c = rwg_init(&c2, 100.0)
        .unwrap()
        .then(&set_state(&c2, &[SbgTarget::new(3, 7.0, 0.2)]).unwrap())
        .unwrap();
    assert!(a.par(&c).is_ok());
}

#[test]
fn rwg_chain_resolves_and_tracks_profile() {
    let ch = rwg("B0", 0);
    let m = rwg_init(&ch, 120.0)
        .unwrap()
        .then(&set_state(&ch, &[SbgTarget::new(0, 10.0, 0.5)]).unwrap())
        .unwrap()
        .then(&hold(&ch, 2500).unwrap())
        .unwrap()
        .then(&linear_ramp(&ch, &[SbgTarget::new(0, 20.0, 0.5)], 2500).unwrap())
        .unwrap()
        .then(&rf_switch(&ch, true).unwrap())
        .unwrap();
    assert!(m.is_resolved());

    let lane = m.lane(&ch).unwrap();
    let end = lane.end_state().unwrap();
    let profile = end.rwg_profile().unwrap();
    assert_eq!(profile.carrier_mhz, 120.0);
    assert_eq!(profile.sbg(0).unwrap().freq_mhz, 20.0);
}

#[test]
fn double_rf_enable_fails() {
    let ch = rwg("B0", 0);
    // Enabling RF twice in a row is an illegal resolution.
    let m = rwg_init(&ch, 100.0)
        .unwrap()
        .then(&rf_switch(&ch, true).unwrap())
        .unwrap();
    let err = m.then(&rf_switch(&ch, true).unwrap()).unwrap_err();
    assert!(matches!(err, ComposeError::InvalidResolution { .. }));
}

#[test]
fn global_sync_spans_boards() {
    let m = global_sync(&ttl("B0", 0), &[ttl("B1", 0), ttl("B2", 0)], 1).unwrap();
    assert_eq!(m.channel_count(), 3);
    assert_eq!(m.total_duration(), 0);
}

// ─── Property tests ─────────────────────────────────────────────────

proptest! {
    /// Three pulses chained with auto-serial associate.
    #[test]
    fn auto_serial_associates(d1 in 1u64..5000, d2 in 1u64..5000, d3 in 1u64..5000) {
        let ch = ttl("B0", 0);
        let a = ttl_init(&ch).unwrap().then(&hold(&ch, d1).unwrap()).unwrap();
        let b = ttl_on(&ch).unwrap().then(&hold(&ch, d2).unwrap()).unwrap();
        let c = ttl_off(&ch).unwrap().then(&hold(&ch, d3).unwrap()).unwrap();

        let left = a.then(&b).unwrap().then(&c).unwrap();
        let right = a.then(&b.then(&c).unwrap()).unwrap();
        prop_assert_eq!(left, right);
    }

    /// Parallel composition always aligns lane durations.
    #[test]
    fn parallel_aligns_durations(d1 in 0u64..5000, d2 in 0u64..5000) {
        let a = pulse(&ttl("B0", 0), d1);
        let b = pulse(&ttl("B0", 1), d2);
        let m = a.par(&b).unwrap();
        prop_assert_eq!(m.total_duration(), d1.max(d2));
        for (_, lane) in m.lanes() {
            prop_assert_eq!(lane.total_duration(), m.total_duration());
        }
    }

    /// Parallel is commutative for arbitrary durations.
    #[test]
    fn parallel_commutes(d1 in 0u64..5000, d2 in 0u64..5000) {
        let a = pulse(&ttl("B0", 0), d1);
        let b = pulse(&ttl("B1", 0), d2);
        prop_assert_eq!(a.par(&b).unwrap(), b.par(&a).unwrap());
    }
}
