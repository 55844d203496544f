//! Fuzz target: `Message::decode`
//!
//! Feeds arbitrary bytes to the wire decoder and asserts that it never
//! panics, and that anything it accepts encodes back to a frame that
//! decodes to the same message.
//!
//! cargo fuzz run fuzz_message_decode

#![no_main]

use dishduty::protocol::{MAX_FRAME_LEN, Message};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(msg) = Message::decode(data) {
        let frame = msg.encode();
        assert!(frame.len() <= MAX_FRAME_LEN);
        assert_eq!(Message::decode(&frame), Ok(msg), "accepted frame must re-encode");
    }
});
