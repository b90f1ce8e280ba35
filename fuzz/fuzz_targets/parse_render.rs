#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlbind::{parse_bytes, render};

fuzz_target!(|data: &[u8]| {
    // anything that parses must render to markup with a stable rendering
    if let Ok(document) = parse_bytes(data) {
        let rendered = render(&document.root);
        match parse_bytes(rendered.as_bytes()) {
            Ok(reparsed) => assert_eq!(render(&reparsed.root), rendered),
            Err(err) => panic!("rendered output failed to parse: {err}\n{rendered}"),
        }
    }
});
