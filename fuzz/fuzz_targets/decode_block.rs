#![no_main]

use arbitrary::Arbitrary;
use chnative_protocol::Block;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    revision: u16,
    data: Vec<u8>,
}

fuzz_target!(|input: Input| {
    // Spread the revision over the range where block layouts change.
    let revision = 50_000 + u64::from(input.revision) % 5_000;
    let mut src = &input.data[..];
    if let Ok(block) = Block::decode(&mut src, revision) {
        // Whatever decodes must survive an encode/decode cycle.
        let mut out = Vec::new();
        block.encode(&mut out, revision);
        let mut src = &out[..];
        let again = Block::decode(&mut src, revision).unwrap();
        assert!(src.is_empty());
        assert_eq!(again.rows(), block.rows());
    }
});
