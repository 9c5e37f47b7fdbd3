#![allow(missing_docs)]

use tagsmith::codec::CodecRegistry;
use tagsmith::engine::{ReadOutcome, TagEngine};
use tagsmith::tag::Accessor;

use std::path::Path;

fn main() {
	let path_str = std::env::args().nth(1).expect("ERROR: No path specified!");
	let path = Path::new(&path_str);

	if !path.is_file() {
		panic!("ERROR: Path is not a file!");
	}

	let engine = TagEngine::new(CodecRegistry::with_defaults());

	let (container, tag_type, tag) = match engine.read_tag(path).expect("ERROR: Failed to read file!") {
		ReadOutcome::Tagged {
			container,
			tag_type,
			tag,
		} => (container, tag_type, tag),
		ReadOutcome::NotTagged { container } => {
			println!("No tags found in {:?} file", container.file_type());
			return;
		},
	};

	println!("--- Container ---");
	println!("Type: {:?}", container.file_type());
	if let Some(version) = container.version() {
		println!("Version: {version:?}");
	}

	println!("--- Tag Information ({tag_type}) ---");
	println!("Title: {}", tag.title().as_deref().unwrap_or("None"));
	println!("Artist: {}", tag.artist().as_deref().unwrap_or("None"));
	println!("Album: {}", tag.album().as_deref().unwrap_or("None"));
	println!("Genre: {}", tag.genre().as_deref().unwrap_or("None"));

	if let Some(track) = tag.track() {
		match tag.track_total() {
			Some(total) => println!("Track: {track}/{total}"),
			None => println!("Track: {track}"),
		}
	}

	println!("Pictures: {}", tag.pictures().count());
	println!("Items: {}", tag.len());
}
