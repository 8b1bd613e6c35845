// Hashing and block matching.
//
// This module provides:
// - The polynomial rolling hash and byte-run comparison kernels
// - The chained block table and its sizing rule
// - `BlockHash`: eager (dictionary) and lazy (target) block indexes
// - `Match`: the longest-match record filled in by lookups

pub mod block;
pub mod config;
pub mod matching;
pub mod rolling;
pub mod table;

pub use block::BlockHash;
pub use matching::Match;
pub use rolling::RollingHash;
