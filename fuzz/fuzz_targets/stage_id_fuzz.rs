//! Fuzz test for StageId string parsing
//!
//! Parsing must never panic, and anything that parses must print back to a
//! string that parses to the same id.
//!
//! Run with: cargo +nightly fuzz run stage_id_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use stagecache_core::StageId;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(id) = StageId::from_string(input) {
            let printed = id.to_string();
            assert_eq!(StageId::from_string(&printed), Ok(id));
            assert_eq!(StageId::from_long_int(id.to_long_int()), id);
            assert_eq!(id.is_valid(), id != StageId::INVALID);
        }
    }
});
