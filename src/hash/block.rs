// Block hash over one source buffer.
//
// The source is cut into non-overlapping `BLOCK_SIZE`-byte blocks; each
// block's rolling hash selects a bucket in a `ChainTable`.  Two ways to
// fill it:
//   - eagerly, every complete block at construction (the dictionary)
//   - lazily, one block each time the scan cursor reaches the next block
//     boundary (the target), so the table never indexes bytes the scan
//     has not reached yet
//
// `find_best_match` walks a bucket's chain, drops hash collisions by
// comparing block contents, and extends each surviving candidate both ways
// to the longest equal run.

use log::debug;

use super::config::{BLOCK_SIZE, MAX_MATCHES_TO_CHECK, MAX_PROBES};
use super::matching::Match;
use super::rolling::{self, RollingHash};
use super::table::{self, Chain, ChainTable};
use crate::error::{MatchError, Result};
use crate::span::Span;

/// Hash table of the `BLOCK_SIZE`-byte blocks of one buffer.
///
/// Source offsets returned by [`BlockHash::find_best_match`] are biased by
/// `starting_offset`, so a target hash built with the dictionary size as its
/// starting offset reports offsets in the combined dictionary+target space.
#[derive(Debug, Clone)]
pub struct BlockHash<'a> {
    source: &'a [u8],
    table: ChainTable,
    starting_offset: usize,
    /// Highest block inserted so far, `None` before the first insertion.
    last_block_added: Option<usize>,
}

impl<'a> BlockHash<'a> {
    /// Build a hash over `source`, optionally indexing every block now.
    pub fn with_starting_offset(
        source: &'a [u8],
        starting_offset: usize,
        populate: bool,
    ) -> Result<Self> {
        let table_size = table::table_size_for(source.len())?;
        let mut hash = Self {
            source,
            table: ChainTable::new(table_size, source.len() / BLOCK_SIZE),
            starting_offset,
            last_block_added: None,
        };
        if populate {
            hash.add_all_blocks()?;
        }
        debug!(
            "block hash: {} bytes, {}/{} blocks indexed, {} buckets, offset {}",
            source.len(),
            hash.blocks_added(),
            hash.block_count(),
            table_size,
            starting_offset
        );
        Ok(hash)
    }

    /// Eagerly indexed hash over a dictionary.
    pub fn new_dictionary(dictionary: &'a [u8]) -> Result<Self> {
        Self::with_starting_offset(dictionary, 0, true)
    }

    /// Empty hash over a target, filled as the scan advances.
    ///
    /// Source offsets it reports start at `dictionary_size`.
    pub fn new_target(target: &'a [u8], dictionary_size: usize) -> Result<Self> {
        Self::with_starting_offset(target, dictionary_size, false)
    }

    /// Bytes in the hashed buffer.
    #[inline]
    pub fn source_size(&self) -> usize {
        self.source.len()
    }

    /// The hashed buffer.
    #[inline]
    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    /// Number of complete blocks in the buffer.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.table.block_capacity()
    }

    /// Number of blocks inserted so far.
    #[inline]
    pub fn blocks_added(&self) -> usize {
        self.last_block_added.map_or(0, |b| b + 1)
    }

    /// Offset added to every reported source offset.
    #[inline]
    pub fn starting_offset(&self) -> usize {
        self.starting_offset
    }

    /// Bucket count.
    #[inline]
    pub fn table_size(&self) -> usize {
        self.table.size()
    }

    /// Block number the next insertion must use.
    #[inline]
    pub fn next_block_to_add(&self) -> usize {
        self.blocks_added()
    }

    /// Buffer offset of the next block boundary to be indexed.
    #[inline]
    pub fn next_index_to_add(&self) -> usize {
        self.next_block_to_add() * BLOCK_SIZE
    }

    /// Blocks in the chain for `hash_value`, head first.
    pub fn chain(&self, hash_value: u32) -> Chain<'_> {
        self.table.chain(hash_value)
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    /// Insert `block_number` under `hash_value`.
    ///
    /// Blocks must arrive in order, starting at 0, and only complete blocks
    /// can be inserted.  On error nothing is modified.
    pub fn add_block(&mut self, block_number: usize, hash_value: u32) -> Result<()> {
        let expected = self.next_block_to_add();
        if block_number != expected {
            return Err(MatchError::OutOfSequence {
                block: block_number,
                expected,
            });
        }
        if block_number >= self.block_count() {
            return Err(MatchError::BlockOutOfRange {
                block: block_number,
                total: self.block_count(),
            });
        }
        self.table.append(hash_value, block_number)?;
        self.last_block_added = Some(block_number);
        Ok(())
    }

    /// Insert the next block in sequence under `hash_value`.
    #[inline]
    pub fn add_next_block(&mut self, hash_value: u32) -> Result<()> {
        self.add_block(self.next_block_to_add(), hash_value)
    }

    /// Offer the rolling hash at buffer position `index`.
    ///
    /// The block is inserted only when `index` is the next unfilled block
    /// boundary; every other position is ignored.
    #[inline]
    pub fn add_one_index_hash(&mut self, index: usize, hash_value: u32) -> Result<()> {
        if index == self.next_index_to_add() {
            self.add_next_block(hash_value)?;
        }
        Ok(())
    }

    /// Hash and insert every block that starts before `end_index`.
    pub fn add_all_blocks_through_index(&mut self, end_index: usize) -> Result<()> {
        if end_index > self.source.len() {
            return Err(MatchError::IndexOutOfRange {
                index: end_index,
                size: self.source.len(),
            });
        }
        if let Some(last) = self.last_block_added {
            let last_index = last * BLOCK_SIZE;
            if end_index <= last_index {
                return Err(MatchError::IndexNotAdvancing {
                    index: end_index,
                    last: last_index,
                });
            }
        }

        // Never hash a block that would run past the end of the source.
        let end_limit = match self.source.len().checked_sub(BLOCK_SIZE) {
            Some(last_legal) => end_index.min(last_legal + 1),
            None => return Ok(()),
        };

        let hasher = RollingHash::for_blocks();
        let mut begin = self.next_index_to_add();
        while begin < end_limit {
            let hash_value = hasher.hash(&self.source[begin..begin + BLOCK_SIZE]);
            self.add_next_block(hash_value)?;
            begin += BLOCK_SIZE;
        }
        Ok(())
    }

    /// Hash and insert every complete block.
    pub fn add_all_blocks(&mut self) -> Result<()> {
        self.add_all_blocks_through_index(self.source.len())
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    #[inline]
    fn block_contents_match(&self, block_number: usize, candidate: &[u8]) -> bool {
        let start = block_number * BLOCK_SIZE;
        self.source[start..start + BLOCK_SIZE] == *candidate
    }

    /// Follow the chain from `block` to the first block whose bytes equal
    /// `candidate`, giving up after `MAX_PROBES` mismatches.
    fn skip_non_matching_blocks(&self, mut block: Option<usize>, candidate: &[u8]) -> Option<usize> {
        let mut probes = 0;
        while let Some(b) = block {
            if self.block_contents_match(b, candidate) {
                return Some(b);
            }
            probes += 1;
            if probes > MAX_PROBES {
                return None;
            }
            block = self.table.next(b);
        }
        None
    }

    #[inline]
    fn first_matching_block(&self, hash_value: u32, candidate: &[u8]) -> Option<usize> {
        self.skip_non_matching_blocks(self.table.head(hash_value), candidate)
    }

    #[inline]
    fn next_matching_block(&self, block: usize, candidate: &[u8]) -> Option<usize> {
        self.skip_non_matching_blocks(self.table.next(block), candidate)
    }

    /// Look for the longest match for the block at `candidate`.
    ///
    /// `hash_value` is the rolling hash of the `BLOCK_SIZE` bytes at
    /// `candidate`.  `target` marks the first byte of target data that is
    /// not yet covered and ends where the target ends: matches extend
    /// backwards no further than its start and forwards no further than its
    /// end, and the target offset stored in `best` is relative to it.
    ///
    /// `candidate` must view the same buffer as `target` (both starting at
    /// the same address; `target` may be a prefix view) and its block must
    /// lie inside `target`.  Otherwise nothing is found.
    ///
    /// `best` is only replaced by strictly longer matches, so the same
    /// `Match` can be passed to several hashes in turn.
    pub fn find_best_match(
        &self,
        hash_value: u32,
        candidate: Span<'_>,
        target: Span<'_>,
        best: &mut Match,
    ) {
        let Some(target_match_offset) = candidate.distance_from(&target) else {
            return;
        };
        let target_size = target.len();
        let target_match_end = target_match_offset + BLOCK_SIZE;
        if target_match_end > target_size {
            return;
        }
        let Some(candidate_block) = candidate.window(BLOCK_SIZE) else {
            return;
        };
        let candidate_tail = &candidate.as_slice()[BLOCK_SIZE..];

        let mut checked = 0;
        let mut block = self.first_matching_block(hash_value, candidate_block);
        while let Some(block_number) = block {
            checked += 1;
            if checked >= MAX_MATCHES_TO_CHECK {
                break;
            }

            let source_match_offset = block_number * BLOCK_SIZE;
            let source_match_end = source_match_offset + BLOCK_SIZE;

            // Extend towards the start of both buffers, but never into
            // target data that is already covered.
            let limit_left = source_match_offset.min(target_match_offset);
            let left = rolling::backward_match(
                &self.source[source_match_offset - limit_left..source_match_offset],
                candidate.before(limit_left),
                limit_left,
            );

            // Extend towards the end of both buffers.
            let limit_right =
                (self.source.len() - source_match_end).min(target_size - target_match_end);
            let right = rolling::forward_match(
                &self.source[source_match_end..],
                candidate_tail,
                limit_right,
            );

            best.replace_if_better(
                BLOCK_SIZE + left + right,
                source_match_offset - left + self.starting_offset,
                target_match_offset - left,
            );

            block = self.next_matching_block(block_number, candidate_block);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
