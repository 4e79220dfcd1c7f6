#![no_main]

use cadbridge::{FcstdBridge, FormatBridge, TranslationConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(document) = std::str::from_utf8(data) else {
        return;
    };
    let bridge = FcstdBridge::new(TranslationConfig::new().best_effort());
    // Anything that imports must export again
    if let Ok(imported) = bridge.import(document) {
        let _ = bridge.export(&imported.output);
    }
});
