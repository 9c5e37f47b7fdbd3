#![allow(missing_docs)]

use tagsmith::codec::CodecRegistry;
use tagsmith::engine::TagEngine;

use std::io::Write;

fn main() {
	let path = std::env::args().nth(1).expect("ERROR: No path specified!");

	let engine = TagEngine::new(CodecRegistry::with_defaults());

	let outcome = engine
		.read_tag(&path)
		.expect("ERROR: Failed to read file!");

	let Some(tag) = outcome.tag() else {
		eprintln!("ERROR: No tags found, exiting.");
		std::process::exit(0);
	};

	let file_type = outcome.container().file_type();
	println!("Found a tag with {} items", tag.len());
	println!("The following formats will be removed:");
	for codec in engine.registry().codecs_for(file_type) {
		println!("  {}", codec.tag_type());
	}

	let mut input = String::new();
	print!("\nContinue? [y/N] ");
	std::io::stdout().flush().unwrap();
	std::io::stdin().read_line(&mut input).unwrap();

	if !input.trim().eq_ignore_ascii_case("y") {
		println!("INFO: Nothing was removed");
		return;
	}

	if engine.remove_tag(&path).is_ok() {
		println!("INFO: Removed all tags");
	} else {
		eprintln!("ERROR: Failed to remove the tags")
	}
}
