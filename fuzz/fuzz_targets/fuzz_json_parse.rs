#![no_main]
use libfuzzer_sys::fuzz_target;
use relaxml::parse_json;
use relaxml::serial::{json_size, to_json, WriteOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let doc = parse_json(s);
        assert!(doc.check_invariants().is_ok());
        let json = to_json(&doc);
        assert_eq!(json.len(), json_size(&doc, &WriteOptions::default()));
    }
});
