//! Fuzz target: `StationCredentials::new`
//!
//! Splits the input into an SSID and a passphrase and checks that
//! validation never panics and that anything accepted is within limits.
//!
//! cargo fuzz run fuzz_credentials

#![no_main]

use libfuzzer_sys::fuzz_target;
use wxnode::app::events::{MAX_PASSPHRASE_LEN, MAX_SSID_LEN, StationCredentials};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let (ssid, pass) = text.split_once('\n').unwrap_or((text, ""));

    if let Ok(creds) = StationCredentials::new(ssid, pass) {
        assert!(!creds.ssid().is_empty());
        assert!(creds.ssid().len() <= MAX_SSID_LEN);
        assert!(creds.passphrase().len() <= MAX_PASSPHRASE_LEN);
        assert_eq!(creds.ssid(), ssid);
        assert_eq!(creds.passphrase(), pass);
    }
});
