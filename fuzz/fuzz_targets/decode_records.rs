#![no_main]

use bytes::Bytes;
use chnative_protocol::{Block, ProfileEvent, ServerLog, revision::DEFAULT_REVISION};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut src = Bytes::copy_from_slice(data);
    if let Ok(block) = Block::decode(&mut src, DEFAULT_REVISION) {
        let _ = ServerLog::from_block(&block);
        let _ = ProfileEvent::from_block(&block);
    }
});
