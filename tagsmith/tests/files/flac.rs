use crate::util::{PAYLOAD, common_tag, engine, flac, temp_file, verify_common};

use tagsmith::config::{ParseOptions, ParsingMode};
use tagsmith::engine::ReadOutcome;
use tagsmith::tag::{Accessor, ItemKey, ItemValue, Tag, TagItem, TagType};

#[test_log::test]
fn write_then_read() {
	let dir = tempfile::tempdir().unwrap();
	let path = temp_file(dir.path(), "song.flac", &flac());

	let engine = engine();
	engine.write_tag(&path, &common_tag()).unwrap();

	let ReadOutcome::Tagged { tag_type, tag, .. } = engine.read_tag(&path).unwrap() else {
		panic!("Expected a tag");
	};
	assert_eq!(tag_type, TagType::VorbisComments);
	verify_common(&tag);

	let file = std::fs::read(&path).unwrap();
	assert!(file.starts_with(b"fLaC"));
	assert!(file.ends_with(PAYLOAD));
}

#[test_log::test]
fn padding_absorbs_changes() {
	let engine = engine();

	let mut file = flac();
	engine.write_tag_to_vec(&mut file, &common_tag()).unwrap();
	let len = file.len();

	let mut tag = common_tag();
	tag.set_title(String::from("T"));
	engine.write_tag_to_vec(&mut file, &tag).unwrap();
	assert_eq!(file.len(), len);

	engine.write_tag_to_vec(&mut file, &common_tag()).unwrap();
	assert_eq!(file.len(), len);
	verify_common(&engine.read_tag_from(&file).unwrap().into_tag().unwrap());
}

#[test_log::test]
fn multiple_values() {
	let engine = engine();

	let mut tag = Tag::new();
	tag.push(TagItem::new(
		ItemKey::TrackArtist,
		ItemValue::Text(String::from("One")),
	));
	tag.push(TagItem::new(
		ItemKey::TrackArtist,
		ItemValue::Text(String::from("Two")),
	));

	let mut file = flac();
	engine.write_tag_to_vec(&mut file, &tag).unwrap();

	let tag = engine.read_tag_from(&file).unwrap().into_tag().unwrap();
	assert_eq!(
		tag.get_strings(&ItemKey::TrackArtist).collect::<Vec<_>>(),
		["One", "Two"]
	);
}

#[test_log::test]
fn remove() {
	let dir = tempfile::tempdir().unwrap();
	let path = temp_file(dir.path(), "song.flac", &flac());

	let engine = engine();
	engine.write_tag(&path, &common_tag()).unwrap();
	engine.remove_tag(&path).unwrap();

	assert!(matches!(
		engine.read_tag(&path).unwrap(),
		ReadOutcome::NotTagged { .. }
	));
	assert!(std::fs::read(&path).unwrap().ends_with(PAYLOAD));
}

#[test_log::test]
fn missing_streaminfo() {
	let mut file = b"fLaC".to_vec();
	// A last PADDING block
	file.extend([0x81, 0, 0, 4, 0, 0, 0, 0]);
	file.extend(PAYLOAD);

	let engine = engine().parse_options(ParseOptions::new().parsing_mode(ParsingMode::Relaxed));
	let err = engine.read_tag_from(&file).unwrap_err();
	assert!(err.is_malformed());
}
