//! Fuzz target for the decode chain.
//!
//! Any byte string must decode without panicking, and the result must
//! partition the input: headers plus payload cover every byte exactly once.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktdecode_core::Decoder;

fuzz_target!(|data: &[u8]| {
    let decoder = Decoder::default();

    let Ok(packet) = decoder.decode_uncached(data) else {
        assert!(data.is_empty());
        return;
    };

    let headers: usize = packet.layers().iter().map(|l| l.header_len()).sum();
    assert_eq!(headers + packet.payload().len(), data.len());
    assert!(packet.validate().is_empty());
});
