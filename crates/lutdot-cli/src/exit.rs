//! Exit codes for precise CI triage
//!
//! The original benchmark apps returned the first mismatching element index
//! directly, mixing 0- and 1-based conventions and using a -1 sentinel for
//! index 0. Normalized here: printed indices are 0-based, and the process
//! exit code is `index + 1` clamped to [`EXIT_INDEX_CAP`], keeping 0 for
//! success.

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERIC_FAIL: i32 = 1;

/// Highest exit code used to encode a failing case index
pub const EXIT_INDEX_CAP: i32 = 200;

/// Map the 0-based index of the first failing case to an exit code
pub fn exit_code_for_index(index: usize) -> i32 {
    (index + 1).min(EXIT_INDEX_CAP as usize) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_zero_is_distinguishable_from_success() {
        assert_eq!(exit_code_for_index(0), 1);
        assert_ne!(exit_code_for_index(0), EXIT_SUCCESS);
    }

    #[test]
    fn large_indices_clamp_to_cap() {
        assert_eq!(exit_code_for_index(10_000), EXIT_INDEX_CAP);
        assert_eq!(exit_code_for_index(198), 199);
        assert_eq!(exit_code_for_index(199), 200);
        assert_eq!(exit_code_for_index(200), 200);
    }
}
