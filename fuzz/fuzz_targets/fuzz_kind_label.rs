#![no_main]

use errs::{Kind, UNKNOWN_KIND_LABEL};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for &raw in data {
        let label = Kind::label_of(raw);
        match Kind::from_repr(raw) {
            Some(kind) => assert_eq!(label, kind.label()),
            None => assert_eq!(label, UNKNOWN_KIND_LABEL),
        }
    }
});
