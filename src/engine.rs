// Match engine: drives the block hashes across a target.
//
// The dictionary is indexed once, eagerly.  Each scan builds a lazy hash
// over its own target and walks it one byte at a time:
//   - query the dictionary hash, then the target hash, for the block at the
//     candidate position, anchoring left extension at the first byte not
//     yet covered by a match
//   - a long enough match is recorded, the cursor jumps past it, the
//     target blocks it covered are indexed, and the hash is recomputed
//   - otherwise the candidate's block is offered to the target hash and the
//     rolling hash slides by one byte
//
// The output is the ordered list of non-overlapping matches an instruction
// emitter turns into COPY/ADD operations.

use log::{debug, trace};

use crate::error::Result;
use crate::hash::config::{BLOCK_SIZE, MatchOptions};
use crate::hash::{BlockHash, Match, RollingHash};
use crate::span::Span;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Finds copy sources for targets against one dictionary.
///
/// The dictionary hash is read-only once built, so one engine can scan any
/// number of targets, from several threads at once.
///
/// # Example
/// ```
/// use blockmatch::engine::MatchEngine;
/// use blockmatch::hash::config::MatchOptions;
///
/// let dictionary = b"The quick brown fox jumps over the lazy dog, again and again.";
/// let target = b"A quick brown fox jumps over the lazy dog, again and again!";
/// let engine = MatchEngine::new(dictionary, MatchOptions::default()).unwrap();
/// let matches = engine.find_matches(target).unwrap();
/// assert_eq!(matches.len(), 1);
/// assert_eq!(matches[0].size(), 57);
/// assert_eq!(matches[0].source_offset(), Some(3));
/// assert_eq!(matches[0].target_offset(), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct MatchEngine<'d> {
    dictionary: BlockHash<'d>,
    options: MatchOptions,
}

impl<'d> MatchEngine<'d> {
    /// Index `dictionary` and prepare to scan targets against it.
    pub fn new(dictionary: &'d [u8], options: MatchOptions) -> Result<Self> {
        Ok(Self::from_dictionary_hash(
            BlockHash::new_dictionary(dictionary)?,
            options,
        ))
    }

    /// Use an already built dictionary hash.
    pub fn from_dictionary_hash(dictionary: BlockHash<'d>, options: MatchOptions) -> Self {
        Self {
            dictionary,
            options,
        }
    }

    /// The dictionary hash.
    pub fn dictionary(&self) -> &BlockHash<'d> {
        &self.dictionary
    }

    /// Dictionary length; source offsets at or past it point into the target.
    pub fn dictionary_size(&self) -> usize {
        self.dictionary.source_size()
    }

    /// Options every scan uses.
    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Find the non-overlapping matches covering as much of `target` as the
    /// dictionary and the target's own earlier bytes allow.
    ///
    /// Matches are ordered by target offset.  Source offsets below
    /// [`dictionary_size`](Self::dictionary_size) are dictionary offsets;
    /// larger ones are target offsets shifted by the dictionary size.
    pub fn find_matches(&self, target: &[u8]) -> Result<Vec<Match>> {
        self.scan(target, self.dictionary_size())
    }

    /// Like [`find_matches`](Self::find_matches), with the target split into
    /// `shard_size`-byte shards scanned in parallel.
    ///
    /// Each shard matches against the dictionary and its own earlier bytes
    /// only.  Offsets are reported in the address space of the whole
    /// target.
    #[cfg(feature = "parallel")]
    pub fn find_matches_parallel(&self, target: &[u8], shard_size: usize) -> Result<Vec<Match>> {
        let shard_size = shard_size.max(BLOCK_SIZE);
        let dictionary_size = self.dictionary_size();

        let shards = target
            .par_chunks(shard_size)
            .enumerate()
            .map(|(i, shard)| {
                let shard_start = i * shard_size;
                self.scan(shard, dictionary_size + shard_start).map(|found| {
                    found
                        .into_iter()
                        .map(|m| m.shift_target(shard_start))
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(shards.into_iter().flatten().collect())
    }

    /// Scan one target whose first byte sits at `target_base` in the
    /// combined source address space.
    fn scan(&self, target: &[u8], target_base: usize) -> Result<Vec<Match>> {
        let mut matches = Vec::new();
        if target.len() < BLOCK_SIZE {
            return Ok(matches);
        }

        let hasher = RollingHash::for_blocks();
        let mut target_hash = if self.options.look_for_target_matches {
            Some(BlockHash::new_target(target, target_base)?)
        } else {
            None
        };

        let last_block_start = target.len() - BLOCK_SIZE;
        let mut next_encode = 0usize;
        let mut candidate = 0usize;
        let mut hash_value = hasher.hash(target);

        loop {
            let encoded = self.record_best_match(
                hash_value,
                target,
                candidate,
                next_encode,
                target_hash.as_ref(),
                &mut matches,
            );

            if encoded > 0 {
                next_encode += encoded;
                candidate = next_encode;
                if candidate > last_block_start {
                    break;
                }
                if let Some(th) = target_hash.as_mut() {
                    th.add_all_blocks_through_index(next_encode)?;
                }
                hash_value = hasher.hash(&target[candidate..]);
            } else {
                if candidate + 1 > last_block_start {
                    break;
                }
                if let Some(th) = target_hash.as_mut() {
                    th.add_one_index_hash(candidate, hash_value)?;
                }
                hash_value =
                    hasher.update_hash(hash_value, target[candidate], target[candidate + BLOCK_SIZE]);
                candidate += 1;
            }
        }

        debug!(
            "scanned {} target bytes: {} matches covering {} bytes",
            target.len(),
            matches.len(),
            matches.iter().map(Match::size).sum::<usize>()
        );
        Ok(matches)
    }

    /// Look up the block at `candidate` and record the best match if it is
    /// long enough.  Returns how many bytes past `next_encode` the match
    /// covers, or 0 when nothing was recorded.
    fn record_best_match(
        &self,
        hash_value: u32,
        target: &[u8],
        candidate: usize,
        next_encode: usize,
        target_hash: Option<&BlockHash<'_>>,
        matches: &mut Vec<Match>,
    ) -> usize {
        let probe = Span::new(target, candidate);
        let unencoded = Span::new(target, next_encode);

        let mut best = Match::new();
        self.dictionary
            .find_best_match(hash_value, probe, unencoded, &mut best);
        if let Some(th) = target_hash {
            th.find_best_match(hash_value, probe, unencoded, &mut best);
        }

        if best.is_empty() || best.size() < self.options.min_match_size {
            return 0;
        }
        let Some(relative) = best.target_offset() else {
            return 0;
        };

        let found = best.shift_target(next_encode);
        trace!(
            "match: target {}+{} <- source {:?}",
            next_encode + relative,
            found.size(),
            found.source_offset()
        );
        matches.push(found);
        relative + found.size()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Bytes at unified source offset `offset`: dictionary, then target.
    fn unified<'a>(dict: &'a [u8], target: &'a [u8], offset: usize) -> &'a [u8] {
        if offset < dict.len() {
            &dict[offset..]
        } else {
            &target[offset - dict.len()..]
        }
    }

    fn assert_valid(dict: &[u8], target: &[u8], matches: &[Match], min: usize) {
        let mut covered = 0;
        for m in matches {
            let t = m.target_offset().unwrap();
            let s = m.source_offset().unwrap();
            assert!(t >= covered, "overlapping match {m:?}");
            assert!(m.size() >= min, "short match {m:?}");
            let src = unified(dict, target, s);
            assert_eq!(&src[..m.size()], &target[t..t + m.size()], "{m:?}");
            if s >= dict.len() {
                assert!(s - dict.len() < t, "target copy from the future {m:?}");
            }
            covered = t + m.size();
        }
    }

    fn pseudo_random(len: usize, seed: u64) -> Vec<u8> {
        let mut s = seed;
        (0..len)
            .map(|_| {
                s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (s >> 33) as u8
            })
            .collect()
    }

    #[test]
    fn identical_target_is_one_match() {
        let dict = pseudo_random(4096, 1);
        let engine = MatchEngine::new(&dict, MatchOptions::default()).unwrap();
        let matches = engine.find_matches(&dict).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].size(), 4096);
        assert_eq!(matches[0].source_offset(), Some(0));
        assert_eq!(matches[0].target_offset(), Some(0));
    }

    #[test]
    fn engine_keeps_dictionary_and_options() {
        let dict = pseudo_random(100, 5);
        let engine = MatchEngine::new(&dict, MatchOptions::dictionary_only()).unwrap();
        assert_eq!(engine.dictionary_size(), 100);
        assert_eq!(engine.dictionary().blocks_added(), 6);
        assert_eq!(*engine.options(), MatchOptions::dictionary_only());
    }

    #[test]
    fn short_target_has_no_matches() {
        let engine = MatchEngine::new(b"0123456789ABCDEF", MatchOptions::default()).unwrap();
        assert!(engine.find_matches(b"0123456789").unwrap().is_empty());
        assert!(engine.find_matches(b"").unwrap().is_empty());
    }

    #[test]
    fn unrelated_target_has_no_matches() {
        let dict = pseudo_random(2048, 7);
        let target = pseudo_random(2048, 8);
        let engine = MatchEngine::new(&dict, MatchOptions::default()).unwrap();
        assert!(engine.find_matches(&target).unwrap().is_empty());
    }

    #[test]
    fn edited_target_matches_around_edits() {
        let dict = pseudo_random(8192, 3);
        let mut target = dict.clone();
        for i in (500..target.len()).step_by(1000) {
            target[i] ^= 0xFF;
        }
        let engine = MatchEngine::new(&dict, MatchOptions::default()).unwrap();
        let matches = engine.find_matches(&target).unwrap();
        assert_valid(&dict, &target, &matches, 32);

        let covered: usize = matches.iter().map(Match::size).sum();
        // Eight single-byte edits; everything else should be found.
        assert_eq!(matches.len(), 9);
        assert_eq!(covered, target.len() - 8);
    }

    #[test]
    fn target_self_matches_use_unified_offsets() {
        let dict = pseudo_random(256, 11);
        let chunk = pseudo_random(300, 12);
        let mut target = chunk.clone();
        target.extend_from_slice(&pseudo_random(50, 13));
        target.extend_from_slice(&chunk);

        let engine = MatchEngine::new(&dict, MatchOptions::default()).unwrap();
        let matches = engine.find_matches(&target).unwrap();
        assert_valid(&dict, &target, &matches, 32);

        let self_match = matches
            .iter()
            .find(|m| m.source_offset().unwrap() >= dict.len())
            .expect("repeated chunk should be found in the target");
        assert_eq!(self_match.size(), 300);
        assert_eq!(self_match.source_offset(), Some(dict.len()));
        assert_eq!(self_match.target_offset(), Some(350));

        let dict_only = MatchEngine::new(&dict, MatchOptions::dictionary_only()).unwrap();
        assert!(dict_only.find_matches(&target).unwrap().is_empty());
    }

    #[test]
    fn min_match_size_filters() {
        let dict = pseudo_random(64, 21);
        // 20 equal bytes, then noise.
        let mut target = dict[16..36].to_vec();
        target.extend_from_slice(&pseudo_random(40, 22));

        let strict = MatchEngine::new(&dict, MatchOptions::default()).unwrap();
        assert!(strict.find_matches(&target).unwrap().is_empty());

        let loose = MatchEngine::new(
            &dict,
            MatchOptions {
                min_match_size: 16,
                ..MatchOptions::default()
            },
        )
        .unwrap();
        let matches = loose.find_matches(&target).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].size(), 20);
        assert_eq!(matches[0].source_offset(), Some(16));
        assert_eq!(matches[0].target_offset(), Some(0));
    }

    #[test]
    fn run_of_one_byte_matches_itself() {
        let target = vec![0xAAu8; 1000];
        let engine = MatchEngine::new(b"", MatchOptions::default()).unwrap();
        let matches = engine.find_matches(&target).unwrap();
        assert_valid(b"", &target, &matches, 32);
        // Only the first byte has nothing earlier to copy from.
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].size(), 999);
        assert_eq!(matches[0].source_offset(), Some(0));
        assert_eq!(matches[0].target_offset(), Some(1));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_scan_matches_valid() {
        let dict = pseudo_random(16 * 1024, 31);
        let mut target = dict.clone();
        for i in (100..target.len()).step_by(777) {
            target[i] = target[i].wrapping_add(1);
        }
        let engine = MatchEngine::new(&dict, MatchOptions::default()).unwrap();
        let matches = engine.find_matches_parallel(&target, 4096).unwrap();
        assert_valid(&dict, &target, &matches, 32);
        assert!(!matches.is_empty());
    }
}
