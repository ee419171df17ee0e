#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use docseal::{END_MARKER, START_MARKER, extract_block, find_marker};

fuzz_target!(|data: Vec<u8>| {
    let input = Bytes::from(data.clone());
    let extraction = extract_block(&input);

    if !extraction.found {
        // Verify: no block means the input passes through untouched
        assert_eq!(&extraction.cleaned[..], &data[..]);
        assert!(extraction.block.is_none());
        return;
    }

    let range = extraction.block_range.clone().unwrap();
    let block = extraction.block.clone().unwrap();

    // Verify: block is framed by the markers and starts at the first start marker
    assert!(block.starts_with(START_MARKER));
    assert!(block.ends_with(END_MARKER));
    assert_eq!(find_marker(&data, START_MARKER, 0), Some(range.start));
    assert_eq!(&data[range.clone()], &block[..]);

    // Verify: cleaned buffer is the input minus the block
    assert_eq!(extraction.cleaned.len(), data.len() - block.len());
    assert_eq!(&extraction.cleaned[..range.start], &data[..range.start]);
    assert_eq!(&extraction.cleaned[range.start..], &data[range.end..]);
});
