#![no_main]

use errs::{e, Kind, MAX_FIELD_OUTPUT_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data).into_owned();
    let err = e!(
        op("fuzz/Log"),
        kind(Kind::Database),
        code(text.clone()),
        param(text.clone()),
        user(text.clone()),
        msg(text),
    );

    let mut line = String::new();
    err.log().write_to(&mut line).unwrap();
    assert!(line.len() <= 3 * MAX_FIELD_OUTPUT_LEN + 128);
});
