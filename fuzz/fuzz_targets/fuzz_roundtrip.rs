#![no_main]
use libfuzzer_sys::fuzz_target;
use relaxml::parse_str;
use relaxml::serial::to_markup;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // parse -> generate -> parse should never panic, and generated
        // markup from a clean parse regenerates unchanged
        let doc = parse_str(s);
        let output = to_markup(&doc);
        let again = parse_str(&output);
        if doc.warnings.is_empty() && again.warnings.is_empty() {
            assert_eq!(to_markup(&again), output);
        }
    }
});
