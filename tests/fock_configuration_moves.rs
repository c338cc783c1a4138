use bcsvmc::{FockConfiguration, Lattice, PendingMove, SquareLattice, VmcError};

const SEED: u64 = 1434;

#[test]
fn hops_along_bonds_keep_counts() {
    let lattice = SquareLattice::new(4, 4).unwrap();
    let mut conf = FockConfiguration::new(lattice.num_sites(), false, SEED);
    conf.init_spins(4, 4).unwrap();
    for round in 0..50 {
        for bond in lattice.bonds() {
            let up = round % 2 == 0;
            let moved = if up { conf.op_hop_up(bond.src, bond.tgt) } else { conf.op_hop_down(bond.src, bond.tgt) };
            // Measurement hops may land on a doubly occupied site, only
            // commit the allowed ones.
            if moved && conf.delta_nd() == 0 {
                conf.commit();
            } else {
                conf.undo();
            }
            assert_eq!(conf.pending_move(), &PendingMove::None);
        }
        assert_eq!(conf.num_upspins(), 4);
        assert_eq!(conf.num_dnspins(), 4);
        assert_eq!(conf.num_dblocc_sites(), 0);
        assert_eq!(conf.count_double_occupancy(), 0);
        assert_eq!(conf.state().iter().filter(|&&b| b).count(), 8);
    }
}

#[test]
fn double_occupancy_is_tracked() {
    let mut conf = FockConfiguration::new(6, true, SEED);
    conf.init_spins(3, 3).unwrap();
    for _ in 0..2000 {
        if conf.propose_up_hop() {
            conf.commit();
        }
        if conf.propose_down_hop() {
            conf.commit();
        }
        assert_eq!(conf.num_dblocc_sites(), conf.count_double_occupancy());
    }
}

#[test]
fn policy_forbids_doubly_occupied_targets() {
    let mut conf = FockConfiguration::new(8, false, SEED);
    conf.init_spins(4, 4).unwrap();
    // Half filling without double occupancy: every up hole holds a down spin.
    for _ in 0..200 {
        assert!(!conf.propose_up_hop());
        assert!(!conf.propose_down_hop());
    }
    assert!(conf.propose_exchange());
    assert_eq!(conf.delta_nd(), 0);
    conf.commit();
    assert_eq!(conf.num_dblocc_sites(), 0);
}

#[test]
fn exchange_needs_opposite_spins() {
    let mut conf = FockConfiguration::new(4, true, SEED);
    conf.set_occupations(&[0, 1], &[1, 2]).unwrap();
    assert_eq!(conf.num_dblocc_sites(), 1);
    // Site 1 is doubly occupied, site 3 is empty.
    assert_eq!(conf.op_exchange_ud(1, 3), 0);
    assert_eq!(conf.op_exchange_ud(0, 1), 0);
    // After the flip, the up spin on 1 and the down spins on 0 and 1 lie
    // in [0, 2).
    assert_eq!(conf.op_exchange_ud(0, 2), -1);
    conf.commit();
    assert_eq!(conf.op_occupation_up(2), 1);
    assert_eq!(conf.op_occupation_down(0), 1);
    assert_eq!(conf.num_dblocc_sites(), 1);
}

#[test]
fn configuration_errors() {
    let mut conf = FockConfiguration::new(4, false, SEED);
    assert_eq!(
        conf.init_spins(3, 2),
        Err(VmcError::SpinCapacity { num_upspins: 3, num_dnspins: 2, num_sites: 4, double_occupancy: false })
    );
    assert!(matches!(conf.set_occupations(&[0], &[0]), Err(VmcError::InvalidOccupation { .. })));
    assert!(matches!(conf.set_occupations(&[7], &[]), Err(VmcError::InvalidOccupation { .. })));
}

#[test]
fn same_seed_same_configuration() {
    let mut first = FockConfiguration::new(16, true, SEED);
    let mut second = FockConfiguration::new(16, true, SEED);
    first.init_spins(5, 5).unwrap();
    second.init_spins(5, 5).unwrap();
    assert_eq!(first.state(), second.state());
    second.reseed(SEED + 1);
    second.set_random();
    first.reseed(SEED + 1);
    first.set_random();
    assert_eq!(format!("{}", first), format!("{}", second));
}
