#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use tagsmith::codec::TagCodec;
use tagsmith::config::{ParseOptions, ParsingMode};
use tagsmith::file::FileType;
use tagsmith::probe;
use tagsmith::mp4::Mp4Codec;

fuzz_target!(|data: Vec<u8>| {
	let mut reader = Cursor::new(data);
	let Ok(container) = probe::forced(&mut reader, FileType::Mp4) else {
		return;
	};

	let _ = Mp4Codec.decode(
		&mut reader,
		&container,
		ParseOptions::new().parsing_mode(ParsingMode::Relaxed),
	);
});
