#![no_main]

use libfuzzer_sys::fuzz_target;
use tagsmith::codec::CodecRegistry;
use tagsmith::config::{ParseOptions, ParsingMode};
use tagsmith::engine::TagEngine;

fuzz_target!(|data: &[u8]| {
	let engine = TagEngine::new(CodecRegistry::with_defaults())
		.parse_options(ParseOptions::new().parsing_mode(ParsingMode::Relaxed));
	let _ = engine.read_tag_from(data);
});
