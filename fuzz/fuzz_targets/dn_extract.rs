#![no_main]

use certrule_lib::dn;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };
    // Every value extract() yields must also be yielded by parse().
    if let Ok(pairs) = dn::parse(name) {
        for (key, value) in &pairs {
            let values = dn::extract(name, key).unwrap_or_default();
            assert!(values.contains(value), "{key}={value} lost by extract");
        }
    }
});
