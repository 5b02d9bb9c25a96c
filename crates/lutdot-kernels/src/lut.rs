//! Product look-up table for 2-bit × 2-bit multiplication
//!
//! Both operands of the inner multiply are at most 2 bits wide, so all 16
//! possible products fit in a table indexed by `(weight << 2) | activation`.
//! The table is replicated into the high half of a 32-entry buffer so a
//! 32-lane vector gather can address it without masking the index.

/// Products of two 2-bit unsigned values: `PRODUCT_LUT[w * 4 + a] == w * a`
pub const PRODUCT_LUT: [i8; 16] = [0, 0, 0, 0, 0, 1, 2, 3, 0, 2, 4, 6, 0, 3, 6, 9];

/// [`PRODUCT_LUT`] mirrored into indices 16..32 for 32-lane gathers
pub const REPLICATED_LUT: [i8; 32] = {
    let mut table = [0i8; 32];
    let mut i = 0;
    while i < 32 {
        table[i] = PRODUCT_LUT[i % 16];
        i += 1;
    }
    table
};
