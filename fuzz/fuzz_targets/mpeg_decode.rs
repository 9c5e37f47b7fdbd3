#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use tagsmith::codec::TagCodec;
use tagsmith::config::{ParseOptions, ParsingMode};
use tagsmith::file::FileType;
use tagsmith::probe;
use tagsmith::id3::v2::Id3v2Codec;

fuzz_target!(|data: Vec<u8>| {
	let mut reader = Cursor::new(data);
	let Ok(container) = probe::forced(&mut reader, FileType::Mpeg) else {
		return;
	};

	let _ = Id3v2Codec.decode(
		&mut reader,
		&container,
		ParseOptions::new().parsing_mode(ParsingMode::Relaxed),
	);
});
