#![no_main]

use libfuzzer_sys::fuzz_target;
use docseal::{parse_block, parse_block_with_limit, DECODE_ERROR_KEY};

fuzz_target!(|data: Vec<u8>| {
    let fields = parse_block(&data);

    // Verify: determinism - same bytes produce the same fields
    assert_eq!(fields, parse_block(&data));

    // Verify: keys are trimmed and unique
    let mut keys: Vec<_> = fields.iter().map(|(k, _)| k).collect();
    for key in &keys {
        assert_eq!(key.trim(), *key);
    }
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), fields.len());

    // Verify: oversized blocks degrade to the diagnostic field
    if !data.is_empty() {
        let limited = parse_block_with_limit(&data, data.len() - 1);
        assert_eq!(limited.len(), 1);
        assert!(limited.contains_key(DECODE_ERROR_KEY));
    }
});
