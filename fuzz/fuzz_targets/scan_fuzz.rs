#![no_main]
use blockmatch::engine::MatchEngine;
use blockmatch::hash::config::MatchOptions;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First byte: options and split point.
    let flags = data[0];
    let payload = &data[1..];
    let split = payload.len() * (flags as usize & 0x0F) / 16;
    let (dictionary, target) = payload.split_at(split);

    let options = MatchOptions {
        min_match_size: 16 + (flags as usize >> 5) * 8,
        look_for_target_matches: flags & 0x10 != 0,
    };
    let engine = MatchEngine::new(dictionary, options).unwrap();
    let matches = engine.find_matches(target).unwrap();

    let mut covered = 0;
    for m in &matches {
        let t = m.target_offset().unwrap();
        let s = m.source_offset().unwrap();
        assert!(t >= covered);
        assert!(m.size() >= options.min_match_size);
        let src = if s < dictionary.len() {
            &dictionary[s..]
        } else {
            assert!(options.look_for_target_matches);
            assert!(s - dictionary.len() < t);
            &target[s - dictionary.len()..]
        };
        assert_eq!(&src[..m.size()], &target[t..t + m.size()]);
        covered = t + m.size();
    }
});
