#![no_main]

use libfuzzer_sys::fuzz_target;
use tagsmith::config::ParsingMode;

fuzz_target!(|data: &[u8]| {
	let _ = tagsmith::picture::Picture::from_flac_bytes(data, true, ParsingMode::Relaxed);
	let _ = tagsmith::picture::Picture::from_flac_bytes(data, false, ParsingMode::Relaxed);
});
