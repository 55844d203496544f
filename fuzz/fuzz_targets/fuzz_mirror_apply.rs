//! Fuzz target: notifier mirror
//!
//! Splits the input into frames on `\n` and folds each one into a
//! `PresentationMirror` the way the notifier does, advancing the buzzer
//! clock between frames. Rejected frames must leave the mirror as it was.
//!
//! cargo fuzz run fuzz_mirror_apply

#![no_main]

use dishduty::config::SystemConfig;
use dishduty::mirror::PresentationMirror;
use dishduty::protocol::Message;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut mirror = PresentationMirror::new(&SystemConfig::default());
    for (i, frame) in data.split(|&b| b == b'\n').enumerate() {
        let before = mirror.summary();
        match Message::decode(frame) {
            Ok(msg) => {
                mirror.apply(&msg);
            }
            Err(_) => assert_eq!(before, mirror.summary()),
        }
        mirror.update_buzzer(i as u64 * 137);
        let _ = mirror.frame();
    }
});
