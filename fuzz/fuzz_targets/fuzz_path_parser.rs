#![no_main]

use cadbridge::path::{generate_path, parse_path};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Whatever parses must regenerate to text that parses to the same commands
    if let Ok(commands) = parse_path(text) {
        let regenerated = generate_path(&commands);
        let reparsed = parse_path(&regenerated).expect("generated path data must parse");
        assert_eq!(reparsed.len(), commands.len());
    }
});
