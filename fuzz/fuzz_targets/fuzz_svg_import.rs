#![no_main]

use cadbridge::{FormatBridge, SvgBridge, TranslationConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(document) = std::str::from_utf8(data) else {
        return;
    };
    // Errors are fine, panics are not
    let _ = SvgBridge::default().import(document);
    let _ = SvgBridge::new(TranslationConfig::new().best_effort()).import(document);
});
