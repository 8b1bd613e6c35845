//! Blockmatch: the match-finding core of a VCDIFF-style delta encoder.
//!
//! The crate provides:
//! - A polynomial rolling hash with O(1) window slides (`hash::rolling`)
//! - Chained block hash tables over a dictionary or a target (`hash::block`)
//! - A scanning engine producing non-overlapping copy matches (`engine`)
//!
//! Turning matches into COPY/ADD instructions and serializing them is left
//! to the caller.
//!
//! # Quick Start
//!
//! ```
//! use blockmatch::engine::MatchEngine;
//! use blockmatch::hash::config::MatchOptions;
//!
//! let dictionary = b"0123456789ABCDEF0123456789abcdef-the-shared-tail-of-both";
//! let target = b"XY0123456789ABCDEF0123456789abcdef-the-shared-tail-of-both";
//!
//! let engine = MatchEngine::new(dictionary, MatchOptions::default()).unwrap();
//! let matches = engine.find_matches(target).unwrap();
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].source_offset(), Some(0));
//! assert_eq!(matches[0].target_offset(), Some(2));
//! assert_eq!(matches[0].size(), dictionary.len());
//! ```
//!
//! Lower-level use drives a [`BlockHash`] directly:
//!
//! ```
//! use blockmatch::{BlockHash, Match, RollingHash, Span};
//!
//! let dictionary = b"ABCDEFGHIJKLMNOP";
//! let target = b"ABCDEFGHIJKLMNOPQRSTUVWX";
//!
//! let hash = BlockHash::new_dictionary(dictionary).unwrap();
//! let hasher = RollingHash::for_blocks();
//! let mut best = Match::default();
//! hash.find_best_match(
//!     hasher.hash(target),
//!     Span::start(target),
//!     Span::start(target),
//!     &mut best,
//! );
//! assert_eq!(best.size(), 16);
//! assert_eq!(best.source_offset(), Some(0));
//! ```

pub mod engine;
pub mod error;
pub mod hash;
pub mod span;

pub use engine::MatchEngine;
pub use error::{MatchError, Result};
pub use hash::{BlockHash, Match, RollingHash};
pub use span::Span;
