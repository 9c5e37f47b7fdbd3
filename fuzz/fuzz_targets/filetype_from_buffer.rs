#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
	let _ = tagsmith::file::FileType::from_buffer(data);
});
