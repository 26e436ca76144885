#![no_main]
use libfuzzer_sys::fuzz_target;
use relaxml::parser::{parse_str_with_options, ParseOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Malformed markup must only ever produce warnings
        let doc = parse_str_with_options(s, &ParseOptions::default());
        assert!(doc.check_invariants().is_ok());
        let opts = ParseOptions::default()
            .element_case_sensitive(false)
            .html_void_elements()
            .keep_blank_text(true);
        let doc = parse_str_with_options(s, &opts);
        assert!(doc.check_invariants().is_ok());
    }
});
