use proptest::prelude::*;
use rule110_turbo::bitserial::BitSerial;
use rule110_turbo::rule110::{KernelBackend, PackedLattice, Rule110, Rule110Config};

fn scalar_engine(bits: &[bool], threads: usize) -> Rule110 {
    Rule110::with_config(
        PackedLattice::build(bits.len(), bits.iter().copied()),
        Rule110Config::default()
            .thread_count(threads)
            .kernel(KernelBackend::Scalar),
    )
    .expect("build engine")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn zero_steps_preserves_population(bits in prop::collection::vec(any::<bool>(), 0..700)) {
        let expected = bits.iter().filter(|&&b| b).count() as u64;
        let mut engine = scalar_engine(&bits, 1);
        prop_assert_eq!(engine.run(0), expected);
    }

    #[test]
    fn every_step_matches_bit_serial(
        bits in prop::collection::vec(any::<bool>(), 1..700),
        steps in 1u64..24,
    ) {
        let mut serial = BitSerial::new(bits.len(), bits.iter().copied());
        let mut engine = scalar_engine(&bits, 1);
        for _ in 0..steps {
            serial.step(1);
            engine.step();
            prop_assert!(engine.lattice().outside_is_dead());
            for (i, &alive) in serial.cells().iter().enumerate() {
                prop_assert_eq!(engine.get_cell(i), alive, "cell {}", i);
            }
        }
    }

    #[test]
    fn population_independent_of_threads(
        bits in prop::collection::vec(any::<bool>(), 0..2000),
        steps in 0u64..16,
    ) {
        let single = scalar_engine(&bits, 1).run(steps);
        let multi = scalar_engine(&bits, 4).run(steps);
        prop_assert_eq!(single, multi);
    }
}
