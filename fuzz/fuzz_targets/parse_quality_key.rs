#![no_main]

use libfuzzer_sys::fuzz_target;
use rdbench_types::QualityValue;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(value) = QualityValue::parse(s) {
        // Display output of a finite literal parses back to an equal value.
        let shown = value.to_string();
        if let Ok(reparsed) = QualityValue::parse(&shown) {
            assert_eq!(reparsed, value, "{s:?} -> {shown:?}");
        }
    }
});
