#![no_main]

use chnative_protocol::{ProfileInfo, Progress, TableColumns, revision::DEFAULT_REVISION};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut src = data;
    let _ = Progress::decode(&mut src, DEFAULT_REVISION);

    let mut src = data;
    let _ = ProfileInfo::decode(&mut src, DEFAULT_REVISION);

    let mut src = data;
    let _ = TableColumns::decode(&mut src);
});
