#![no_main]

use libfuzzer_sys::fuzz_target;
use perfgate::threshold::{parse_response_time_map, ThresholdConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Every accepted line has exactly one separator
        for (key, value) in parse_response_time_map(input) {
            assert!(!key.contains(':') && !value.contains(':'));
        }
        let _ = ThresholdConfig::new().with_response_time_thresholds(input);
    }
});
