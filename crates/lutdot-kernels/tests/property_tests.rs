//! Property-based tests for the bit-sliced kernels

use lutdot_kernels::cpu::{vec_dot_i2_i8_ref, PortableKernel};
use lutdot_kernels::packing::{pack_weights, unpack_weights};
use lutdot_kernels::{DotKernel, QK_I2, WEIGHT_BYTES_PER_BLOCK};
use proptest::collection::vec;
use proptest::prelude::*;

proptest! {
    #[test]
    fn bitsliced_agrees_with_reference(
        blocks in 1usize..4,
        seed in any::<u64>(),
    ) {
        // Derive buffers from the seed so lengths stay coupled to `blocks`.
        let mut state = seed | 1;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        let weights: Vec<u8> =
            (0..blocks * WEIGHT_BYTES_PER_BLOCK).map(|_| next() as u8).collect();
        let activations: Vec<i8> =
            (0..blocks * QK_I2).map(|_| next() as u8 as i8).collect();

        let expected = vec_dot_i2_i8_ref(&weights, &activations).unwrap();
        let got = PortableKernel.vec_dot_i2_i8(&weights, &activations).unwrap();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn zero_weights_annihilate(activations in vec(any::<i8>(), QK_I2)) {
        let weights = vec![0u8; WEIGHT_BYTES_PER_BLOCK];
        let got = PortableKernel.vec_dot_i2_i8(&weights, &activations).unwrap();
        prop_assert_eq!(got, 0.0);
    }

    #[test]
    fn zero_activations_annihilate(weights in vec(any::<u8>(), WEIGHT_BYTES_PER_BLOCK)) {
        let activations = vec![0i8; QK_I2];
        let got = PortableKernel.vec_dot_i2_i8(&weights, &activations).unwrap();
        prop_assert_eq!(got, 0.0);
    }

    #[test]
    fn pack_round_trips(values in vec(0u8..4, 2 * QK_I2)) {
        let packed = pack_weights(&values).unwrap();
        prop_assert_eq!(packed.len(), values.len() / 4);
        let unpacked = unpack_weights(&packed).unwrap();
        prop_assert_eq!(unpacked, values);
    }

    #[test]
    fn result_is_bounded_by_value_ranges(
        weights in vec(any::<u8>(), WEIGHT_BYTES_PER_BLOCK),
        activations in vec(any::<i8>(), QK_I2),
    ) {
        // |sum| <= 3 * 128 * 128 for one block.
        let bound = (3 * 128 * QK_I2) as f32;
        let got = PortableKernel.vec_dot_i2_i8(&weights, &activations).unwrap();
        prop_assert!(got.abs() <= bound);
    }
}
