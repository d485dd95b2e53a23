#![no_main]

use errs::{respond, Error, ErrorBody, Kind, ResponseConfig, DEFAULT_REDACTED_MESSAGE};
use libfuzzer_sys::fuzz_target;

// Layout: [kind, depth, text...]. The text is split into realm, code, param
// and message on NUL bytes.
fuzz_target!(|data: &[u8]| {
    let Some((&[raw_kind, depth], rest)) = data.split_first_chunk::<2>() else {
        return;
    };
    let Some(kind) = Kind::from_repr(raw_kind) else {
        return;
    };
    let text = String::from_utf8_lossy(rest);
    let mut parts = text.split('\0');
    let realm = parts.next().unwrap_or_default().to_owned();
    let code = parts.next().unwrap_or_default().to_owned();
    let param = parts.next().unwrap_or_default().to_owned();
    let message = parts.next().unwrap_or_default().to_owned();

    let mut err = Error::builder()
        .kind(kind)
        .realm(realm)
        .code(code)
        .param(param)
        .msg(message.clone())
        .build();
    for _ in 0..(depth % 16) {
        err = Error::builder().op("fuzz/Layer").wrap(err).build();
    }

    let response = respond(&ResponseConfig::default(), Some(&err));
    assert_eq!(response.status(), kind.http_status());
    match response.body() {
        Some(body) => {
            let parsed: ErrorBody = serde_json::from_str(body).unwrap();
            if kind.http_status().is_server_error() {
                assert_eq!(parsed.error.message, DEFAULT_REDACTED_MESSAGE);
            } else {
                assert_eq!(parsed.error.message, message);
            }
        }
        None => assert!(matches!(kind, Kind::Unauthenticated | Kind::Unauthorized)),
    }
});

