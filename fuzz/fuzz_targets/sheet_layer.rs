#![no_main]

use libfuzzer_sys::fuzz_target;
use rdbench_types::{make_sheet_layer, parse_sheet_layer, validate_test_name};

fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };
    let (test, layer) = parse_sheet_layer(name);
    assert_eq!(parse_sheet_layer(&make_sheet_layer(&test, layer)), (test.clone(), layer));

    if validate_test_name(name).is_ok() {
        assert!(layer.is_total());
    }
});
