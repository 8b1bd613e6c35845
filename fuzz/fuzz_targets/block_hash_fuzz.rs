#![no_main]
use blockmatch::hash::config::BLOCK_SIZE;
use blockmatch::{BlockHash, Match, RollingHash, Span};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    // Drive a lazy hash with arbitrary insertion requests; sequencing errors
    // must leave it usable.
    let (ops, source) = data.split_at(data.len() / 4);
    let mut hash = BlockHash::new_target(source, 0).unwrap();
    let hasher = RollingHash::for_blocks();
    for &op in ops {
        let block = op as usize % (source.len() / BLOCK_SIZE + 2);
        let before = hash.blocks_added();
        let value = source
            .get(block * BLOCK_SIZE..)
            .filter(|rest| rest.len() >= BLOCK_SIZE)
            .map_or(0, |rest| hasher.hash(rest));
        match hash.add_block(block, value) {
            Ok(()) => assert_eq!(hash.blocks_added(), before + 1),
            Err(_) => assert_eq!(hash.blocks_added(), before),
        }
    }

    // Every match found must compare equal.
    for pos in 0..source.len().saturating_sub(BLOCK_SIZE - 1) {
        let mut best = Match::default();
        hash.find_best_match(
            hasher.hash(&source[pos..]),
            Span::new(source, pos),
            Span::start(source),
            &mut best,
        );
        if let (Some(s), Some(t)) = (best.source_offset(), best.target_offset()) {
            assert_eq!(&source[s..s + best.size()], &source[t..t + best.size()]);
        }
    }
});
