#![no_main]

use libfuzzer_sys::fuzz_target;
use rdbench_types::{ResultsDocument, TestRun};

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = serde_json::from_slice::<ResultsDocument>(data) {
        let run = TestRun::from(doc);
        let _ = run.results.quality_keys();
        let _ = run.results.layer_ids();
    }
});
