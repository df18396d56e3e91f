//! Fuzz target: `handle_connect`
//!
//! Arbitrary request bodies must be rejected or queued, never panic, and
//! a rejected body must leave the mailbox untouched.
//!
//! cargo fuzz run fuzz_connect_body

#![no_main]

use libfuzzer_sys::fuzz_target;
use wxnode::adapters::http_service::{SharedStatus, handle_connect};
use wxnode::mailbox::Mailbox;

fuzz_target!(|data: &[u8]| {
    let mailbox = Mailbox::new();
    let status = SharedStatus::default();

    match handle_connect(data, &mailbox.sender(), &status) {
        Ok(()) => assert_eq!(mailbox.len(), 1),
        Err(_) => assert!(mailbox.is_empty()),
    }
});
