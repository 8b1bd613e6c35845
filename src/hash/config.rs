// Tuning constants for the block hash and the scanning engine.
//
// The block size and the probe/match caps bound the work done per target
// position; they are fixed at compile time so that the hot loops see
// constants.

/// Size of the non-overlapping blocks indexed by a `BlockHash`.
pub const BLOCK_SIZE: usize = 16;

/// Maximum non-matching blocks skipped in one chain traversal.
pub const MAX_PROBES: usize = 16;

/// Base cap on candidate blocks examined per `find_best_match` call.
pub const MAX_MATCHES_BASE: usize = 32;

/// Modulus of the rolling hash.  A power of two so reduction is a mask.
pub const HASH_BASE: u32 = 1 << 22;

/// Mask equivalent to `% HASH_BASE`.
pub const HASH_MASK: u32 = HASH_BASE - 1;

/// Polynomial multiplier of the rolling hash.
pub const HASH_MULTIPLIER: u32 = 257;

/// Largest bucket count the table sizing search may reach.
pub const MAX_TABLE_SIZE: usize = 1 << 30;

/// Shortest match the engine reports.
pub const DEFAULT_MIN_MATCH_SIZE: usize = 32;

/// Candidate cap for a given block size.
///
/// Smaller blocks produce more (and shorter) candidates, so the cap grows
/// as the block shrinks: `32` for blocks of 32 bytes or more, otherwise
/// `32 * (32 / block_size)`.
pub const fn max_matches_to_check(block_size: usize) -> usize {
    if block_size >= 32 {
        MAX_MATCHES_BASE
    } else {
        MAX_MATCHES_BASE * (32 / block_size)
    }
}

/// Candidate cap for [`BLOCK_SIZE`].
pub const MAX_MATCHES_TO_CHECK: usize = max_matches_to_check(BLOCK_SIZE);

/// Runtime options for [`crate::engine::MatchEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Matches shorter than this are not reported.
    pub min_match_size: usize,
    /// Also search earlier parts of the target itself.
    pub look_for_target_matches: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_match_size: DEFAULT_MIN_MATCH_SIZE,
            look_for_target_matches: true,
        }
    }
}

impl MatchOptions {
    /// Dictionary-only matching.
    pub fn dictionary_only() -> Self {
        Self {
            look_for_target_matches: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_is_power_of_two() {
        assert!(BLOCK_SIZE.is_power_of_two());
        assert!(HASH_BASE.is_power_of_two());
    }

    #[test]
    fn match_cap_by_block_size() {
        assert_eq!(max_matches_to_check(4), 256);
        assert_eq!(max_matches_to_check(16), 64);
        assert_eq!(max_matches_to_check(32), 32);
        assert_eq!(max_matches_to_check(64), 32);
        assert_eq!(MAX_MATCHES_TO_CHECK, 64);
    }

    #[test]
    fn default_options() {
        let o = MatchOptions::default();
        assert_eq!(o.min_match_size, 32);
        assert!(o.look_for_target_matches);
        assert!(!MatchOptions::dictionary_only().look_for_target_matches);
    }
}
