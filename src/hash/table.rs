// Open-chained hash table keyed by block number.
//
// Three parallel arrays, all indexed by integers rather than pointers:
//   - `heads[bucket]`  first block of the chain hashing to `bucket`
//   - `next[block]`    block that follows `block` in its chain
//   - `last[head]`     current tail of the chain whose first block is `head`
//
// Chains are append-only.  Slots store `block + SLOT_OFFSET` so that 0
// means "empty"; callers only ever see `Option<usize>`.

use super::config::MAX_TABLE_SIZE;
use crate::error::{MatchError, Result};

/// Offset added to stored block numbers so 0 means "empty slot".
const SLOT_OFFSET: u32 = 1;

#[inline(always)]
fn encode_slot(block: usize) -> u32 {
    block as u32 + SLOT_OFFSET
}

#[inline(always)]
fn decode_slot(slot: u32) -> Option<usize> {
    slot.checked_sub(SLOT_OFFSET).map(|b| b as usize)
}

/// Bucket count for a source of `source_size` bytes.
///
/// The table holds as many `u32` slots as the source has 4-byte words, plus
/// one, rounded up to a power of two so the bucket index is a mask.
pub fn table_size_for(source_size: usize) -> Result<usize> {
    let min_size = source_size / std::mem::size_of::<u32>() + 1;
    let mut size = 1usize;
    while size < min_size {
        size <<= 1;
        if size > MAX_TABLE_SIZE {
            return Err(MatchError::SourceTooLarge { size: source_size });
        }
    }
    Ok(size)
}

/// Bucket heads plus per-block chain links.
#[derive(Debug, Clone)]
pub struct ChainTable {
    heads: Vec<u32>,
    next: Vec<u32>,
    last: Vec<u32>,
    mask: u32,
}

impl ChainTable {
    /// Empty table with `table_size` buckets for `block_count` blocks.
    ///
    /// `table_size` must come from [`table_size_for`].
    pub fn new(table_size: usize, block_count: usize) -> Self {
        debug_assert!(table_size.is_power_of_two() && table_size <= MAX_TABLE_SIZE);
        debug_assert!(block_count < u32::MAX as usize);
        Self {
            heads: vec![0; table_size],
            next: vec![0; block_count],
            last: vec![0; block_count],
            mask: (table_size - 1) as u32,
        }
    }

    /// Bucket count.
    #[inline]
    pub fn size(&self) -> usize {
        self.heads.len()
    }

    /// Number of block slots.
    #[inline]
    pub fn block_capacity(&self) -> usize {
        self.next.len()
    }

    /// Bucket index for a hash value.
    #[inline(always)]
    pub fn bucket(&self, hash_value: u32) -> usize {
        (hash_value & self.mask) as usize
    }

    /// First block in the chain for `hash_value`.
    #[inline(always)]
    pub fn head(&self, hash_value: u32) -> Option<usize> {
        decode_slot(self.heads[self.bucket(hash_value)])
    }

    /// Block following `block` in its chain.
    #[inline(always)]
    pub fn next(&self, block: usize) -> Option<usize> {
        decode_slot(self.next[block])
    }

    /// Tail of the chain headed by `head`.
    #[inline]
    pub fn tail(&self, head: usize) -> Option<usize> {
        decode_slot(self.last[head])
    }

    /// Append `block` to the chain for `hash_value`.
    ///
    /// Every link touched is validated before anything is written, so an
    /// error leaves the table exactly as it was.
    pub fn append(&mut self, hash_value: u32, block: usize) -> Result<()> {
        if block >= self.next.len() {
            return Err(MatchError::BlockOutOfRange {
                block,
                total: self.next.len(),
            });
        }
        if self.next[block] != 0 {
            return Err(MatchError::ChainCorrupted { block });
        }

        let bucket = self.bucket(hash_value);
        match decode_slot(self.heads[bucket]) {
            None => {
                self.heads[bucket] = encode_slot(block);
                self.last[block] = encode_slot(block);
            }
            Some(head) => {
                let tail = self
                    .tail(head)
                    .ok_or(MatchError::ChainCorrupted { block: head })?;
                if self.next[tail] != 0 {
                    return Err(MatchError::ChainCorrupted { block: tail });
                }
                self.next[tail] = encode_slot(block);
                self.last[head] = encode_slot(block);
            }
        }
        Ok(())
    }

    /// Iterate the chain for `hash_value` from head to tail.
    pub fn chain(&self, hash_value: u32) -> Chain<'_> {
        Chain {
            table: self,
            cursor: self.head(hash_value),
        }
    }
}

/// Iterator over the block numbers of one chain.
pub struct Chain<'t> {
    table: &'t ChainTable,
    cursor: Option<usize>,
}

impl Iterator for Chain<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let block = self.cursor?;
        self.cursor = self.table.next(block);
        Some(block)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_size_power_of_two_and_large_enough() {
        for source_size in [0usize, 1, 3, 4, 15, 16, 63, 64, 65, 1000, 4096, 1 << 20] {
            let size = table_size_for(source_size).unwrap();
            assert!(size.is_power_of_two(), "{source_size}");
            assert!(size >= source_size / 4 + 1, "{source_size}");
            // Smallest such power of two.
            assert!(size == 1 || size / 2 < source_size / 4 + 1, "{source_size}");
        }
    }

    #[test]
    fn table_size_overflow() {
        let err = table_size_for(usize::MAX).unwrap_err();
        assert_eq!(err, MatchError::SourceTooLarge { size: usize::MAX });
        assert!(err.is_capacity());
        // Exactly at the cap is fine; one word more is not.
        assert_eq!(
            table_size_for((MAX_TABLE_SIZE - 1) * 4).unwrap(),
            MAX_TABLE_SIZE
        );
        assert!(table_size_for(MAX_TABLE_SIZE * 4).is_err());
    }

    #[test]
    fn empty_table_has_no_chains() {
        let t = ChainTable::new(8, 4);
        for h in 0..16 {
            assert!(t.head(h).is_none());
            assert_eq!(t.chain(h).count(), 0);
        }
        assert!(t.next(0).is_none());
        assert!(t.tail(0).is_none());
    }

    #[test]
    fn append_builds_chain_in_order() {
        let mut t = ChainTable::new(8, 4);
        t.append(3, 0).unwrap();
        t.append(11, 1).unwrap(); // same bucket as 3 with mask 7
        t.append(5, 2).unwrap();
        t.append(3, 3).unwrap();

        assert_eq!(t.chain(3).collect::<Vec<_>>(), vec![0, 1, 3]);
        assert_eq!(t.chain(5).collect::<Vec<_>>(), vec![2]);
        assert_eq!(t.tail(0), Some(3));
        assert_eq!(t.tail(2), Some(2));
        assert!(t.next(3).is_none());
    }

    #[test]
    fn append_out_of_range_is_rejected() {
        let mut t = ChainTable::new(4, 2);
        assert_eq!(
            t.append(0, 2),
            Err(MatchError::BlockOutOfRange { block: 2, total: 2 })
        );
    }

    #[test]
    fn append_twice_is_corruption() {
        let mut t = ChainTable::new(4, 4);
        t.append(1, 0).unwrap();
        t.append(1, 1).unwrap();
        // Block 0 already links to 1.
        assert_eq!(t.append(2, 0), Err(MatchError::ChainCorrupted { block: 0 }));
        assert_eq!(t.chain(1).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn slot_encoding() {
        assert_eq!(decode_slot(0), None);
        assert_eq!(decode_slot(encode_slot(0)), Some(0));
        assert_eq!(decode_slot(encode_slot(12345)), Some(12345));
    }
}
