//! Pack and unpack 2-bit weights in the interleaved block layout
//!
//! Weights are packed four to a byte, block by block. Within a 128-element
//! block, byte `j` holds the logical elements `j`, `j + 32`, `j + 64` and
//! `j + 96` at bit fields `[7:6]`, `[5:4]`, `[3:2]` and `[1:0]`. This keeps
//! one 2-bit field per lane when a kernel loads 32 packed bytes and pairs
//! them with four consecutive 32-element activation chunks.

use lutdot_common::{KernelError, Result, QK_I2, WEIGHTS_PER_BYTE, WEIGHT_BYTES_PER_BLOCK};

/// Pack logical 2-bit weight values (each in `0..=3`) into the interleaved
/// block layout. `values.len()` must be a positive multiple of [`QK_I2`].
pub fn pack_weights(values: &[u8]) -> Result<Vec<u8>> {
    if values.is_empty() || values.len() % QK_I2 != 0 {
        return Err(KernelError::InvalidArguments {
            reason: format!(
                "weight count must be a positive multiple of {QK_I2}, got {}",
                values.len()
            ),
        }
        .into());
    }
    if let Some(pos) = values.iter().position(|&v| v > 3) {
        return Err(KernelError::InvalidArguments {
            reason: format!("weight {} at index {pos} exceeds 2-bit range", values[pos]),
        }
        .into());
    }

    let mut packed = vec![0u8; values.len() / WEIGHTS_PER_BYTE];
    for (block, vals) in values.chunks_exact(QK_I2).enumerate() {
        let out = &mut packed[block * WEIGHT_BYTES_PER_BLOCK..(block + 1) * WEIGHT_BYTES_PER_BLOCK];
        for c in 0..4 {
            let shift = 6 - 2 * c;
            for (j, byte) in out.iter_mut().enumerate() {
                *byte |= vals[32 * c + j] << shift;
            }
        }
    }
    Ok(packed)
}

/// Unpack interleaved packed bytes back into logical weight values.
/// `packed.len()` must be a positive multiple of [`WEIGHT_BYTES_PER_BLOCK`].
pub fn unpack_weights(packed: &[u8]) -> Result<Vec<u8>> {
    if packed.is_empty() || packed.len() % WEIGHT_BYTES_PER_BLOCK != 0 {
        return Err(KernelError::InvalidArguments {
            reason: format!(
                "packed length must be a positive multiple of {WEIGHT_BYTES_PER_BLOCK}, got {}",
                packed.len()
            ),
        }
        .into());
    }

    let mut values = vec![0u8; packed.len() * WEIGHTS_PER_BYTE];
    for (block, bytes) in packed.chunks_exact(WEIGHT_BYTES_PER_BLOCK).enumerate() {
        let out = &mut values[block * QK_I2..(block + 1) * QK_I2];
        for c in 0..4 {
            let shift = 6 - 2 * c;
            for (j, &byte) in bytes.iter().enumerate() {
                out[32 * c + j] = (byte >> shift) & 0x3;
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trip() {
        let values: Vec<u8> = (0..256).map(|i| (i % 4) as u8).collect();
        let packed = pack_weights(&values).unwrap();
        assert_eq!(packed.len(), 64);
        let unpacked = unpack_weights(&packed).unwrap();
        assert_eq!(values, unpacked);
    }

    #[test]
    fn layout_places_element_per_chunk_field() {
        // Element 34 of block 0 is chunk 1 (offset 32), lane 2, so it lands
        // in byte 2 at bits [5:4].
        let mut values = vec![0u8; QK_I2];
        values[34] = 3;
        let packed = pack_weights(&values).unwrap();
        assert_eq!(packed[2], 0b0011_0000);

        // Element 2 is chunk 0, lane 2: byte 2, bits [7:6].
        let mut values = vec![0u8; QK_I2];
        values[2] = 2;
        let packed = pack_weights(&values).unwrap();
        assert_eq!(packed[2], 0b1000_0000);

        // Element 98 is chunk 3, lane 2: byte 2, bits [1:0].
        let mut values = vec![0u8; QK_I2];
        values[98] = 1;
        let packed = pack_weights(&values).unwrap();
        assert_eq!(packed[2], 0b0000_0001);
    }

    #[test]
    fn rejects_out_of_range_weights() {
        let mut values = vec![0u8; QK_I2];
        values[7] = 4;
        let err = pack_weights(&values).unwrap_err();
        assert!(err.to_string().contains("exceeds 2-bit range"));
    }

    #[test]
    fn rejects_partial_blocks() {
        assert!(pack_weights(&vec![0u8; 100]).is_err());
        assert!(pack_weights(&[]).is_err());
        assert!(unpack_weights(&vec![0u8; 33]).is_err());
    }
}
