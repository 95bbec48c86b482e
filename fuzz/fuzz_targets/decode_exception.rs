#![no_main]

use chnative_protocol::ServerException;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut src = data;
    if let Ok(exception) = ServerException::decode(&mut src) {
        // Walking the chain must terminate.
        let _ = exception.chain().count();
        let _ = exception.to_string();
    }
});
