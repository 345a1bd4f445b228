#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parse as TOML suite config - only attempt if valid UTF-8
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(config) = toml::from_str::<rdbench_types::SuiteConfig>(s)
    {
        for def in &config.summaries {
            let _ = def.sheet_name();
            let _ = def.referenced_layers();
        }
    }
});
