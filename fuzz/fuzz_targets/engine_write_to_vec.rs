#![no_main]

use libfuzzer_sys::fuzz_target;
use tagsmith::codec::CodecRegistry;
use tagsmith::engine::TagEngine;
use tagsmith::tag::{Accessor, Tag};

fuzz_target!(|data: Vec<u8>| {
	let engine = TagEngine::new(CodecRegistry::with_defaults());

	let mut tag = Tag::new();
	tag.set_title(String::from("Title"));
	tag.set_track(1);

	let mut file = data;
	let _ = engine.write_tag_to_vec(&mut file, &tag);
});
