#![no_main]

use libfuzzer_sys::fuzz_target;
use perfgate::stats::Report;

fuzz_target!(|data: &[u8]| {
    // Deserializing validates labels; aggregation must not panic
    if let Ok(report) = serde_json::from_slice::<Report>(data) {
        assert!(report.overall_error_percent().is_finite());
        let _ = report.overall_average();
        let _ = report.total_samples();
    }
});
