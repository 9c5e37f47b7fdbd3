use crate::util::{PAYLOAD, common_tag, engine, mpeg, temp_file, verify_common};

use tagsmith::codec::CodecRegistry;
use tagsmith::config::WriteOptions;
use tagsmith::engine::{ReadOutcome, TagEngine};
use tagsmith::tag::{Accessor, Tag, TagType};

fn id3v1(title: &str) -> [u8; 128] {
	let mut tag = [0; 128];
	tag[..3].copy_from_slice(b"TAG");
	tag[3..3 + title.len()].copy_from_slice(title.as_bytes());
	// Genre: Blues
	tag[127] = 0;
	tag
}

#[test_log::test]
fn write_then_read() {
	let dir = tempfile::tempdir().unwrap();
	let path = temp_file(dir.path(), "song.mp3", &mpeg());

	let engine = engine();
	assert!(matches!(
		engine.read_tag(&path).unwrap(),
		ReadOutcome::NotTagged { .. }
	));

	engine.write_tag(&path, &common_tag()).unwrap();

	let ReadOutcome::Tagged { tag_type, tag, .. } = engine.read_tag(&path).unwrap() else {
		panic!("Expected a tag");
	};
	assert_eq!(tag_type, TagType::Id3v2);
	verify_common(&tag);

	let file = std::fs::read(&path).unwrap();
	assert!(file.starts_with(b"ID3\x04"));
	assert!(file.ends_with(&mpeg()));
}

#[test_log::test]
fn repeated_writes_are_stable() {
	let dir = tempfile::tempdir().unwrap();
	let path = temp_file(dir.path(), "song.mp3", &mpeg());

	let engine = engine();
	engine.write_tag(&path, &common_tag()).unwrap();
	let first = std::fs::read(&path).unwrap();

	engine.write_tag(&path, &common_tag()).unwrap();
	assert_eq!(std::fs::read(&path).unwrap(), first);

	// A smaller tag is absorbed by the padding
	let mut tag = Tag::new();
	tag.set_title(String::from("Short"));
	engine.write_tag(&path, &tag).unwrap();
	assert_eq!(std::fs::read(&path).unwrap().len(), first.len());
}

#[test_log::test]
fn track_totals() {
	let mut file = mpeg();
	let engine = engine();

	let mut tag = Tag::new();
	tag.set_track(3);
	tag.set_track_total(12);
	engine.write_tag_to_vec(&mut file, &tag).unwrap();

	let tag = engine.read_tag_from(&file).unwrap().into_tag().unwrap();
	assert_eq!(tag.track(), Some(3));
	assert_eq!(tag.track_total(), Some(12));
}

#[test_log::test]
fn id3v23() {
	let mut file = mpeg();
	let engine = engine().write_options(WriteOptions::new().use_id3v23(true));

	engine.write_tag_to_vec(&mut file, &common_tag()).unwrap();
	assert!(file.starts_with(b"ID3\x03"));

	verify_common(&engine.read_tag_from(&file).unwrap().into_tag().unwrap());
}

#[test_log::test]
fn id3v1_fallback_and_refresh() {
	let mut file = mpeg();
	file.extend(id3v1("Old title"));

	let engine = engine();
	let ReadOutcome::Tagged { tag_type, tag, .. } = engine.read_tag_from(&file).unwrap() else {
		panic!("Expected a tag");
	};
	assert_eq!(tag_type, TagType::Id3v1);
	assert_eq!(tag.title().as_deref(), Some("Old title"));

	let mut tag = Tag::new();
	tag.set_title(String::from("New title"));
	engine.write_tag_to_vec(&mut file, &tag).unwrap();

	// ID3v2 now takes precedence
	let outcome = engine.read_tag_from(&file).unwrap();
	assert!(matches!(
		outcome,
		ReadOutcome::Tagged {
			tag_type: TagType::Id3v2,
			..
		}
	));

	// And the existing ID3v1 tag was refreshed
	let id3v1 = &file[file.len() - 128..];
	assert!(id3v1.starts_with(b"TAG"));
	assert_eq!(&id3v1[3..12], b"New title");
}

#[test_log::test]
fn id3v1_untouched_when_disabled() {
	let mut file = mpeg();
	file.extend(id3v1("Old title"));

	let engine = engine().write_options(WriteOptions::new().update_id3v1(false));
	engine.write_tag_to_vec(&mut file, &common_tag()).unwrap();

	assert!(file.ends_with(&id3v1("Old title")));
}

#[test_log::test]
fn remove_strips_every_tag() {
	let dir = tempfile::tempdir().unwrap();

	let mut original = mpeg();
	original.extend(id3v1("Title"));
	let path = temp_file(dir.path(), "song.mp3", &original);

	let engine = engine();
	engine.write_tag(&path, &common_tag()).unwrap();
	engine.remove_tag(&path).unwrap();

	assert_eq!(std::fs::read(&path).unwrap(), mpeg());
	assert!(std::fs::read(&path).unwrap().ends_with(PAYLOAD));
}

#[test_log::test]
fn id3v1_only_registry() {
	let mut registry = CodecRegistry::new();
	registry.register(
		tagsmith::file::FileType::Mpeg,
		std::sync::Arc::new(tagsmith::id3::v1::Id3v1Codec),
	);
	let engine = TagEngine::new(registry);

	let mut file = mpeg();
	engine.write_tag_to_vec(&mut file, &common_tag()).unwrap();

	assert_eq!(file.len(), mpeg().len() + 128);
	let tag = engine.read_tag_from(&file).unwrap().into_tag().unwrap();
	assert_eq!(tag.title().as_deref(), Some("Foo title"));
	assert_eq!(tag.track(), Some(3));
}
