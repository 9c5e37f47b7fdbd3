use crate::util::{PAYLOAD, common_tag, engine, mp4, mp4_chunk_offset, temp_file, verify_common};

use tagsmith::engine::ReadOutcome;
use tagsmith::tag::{Accessor, ItemKey, ItemValue, NativeKey, Tag, TagItem, TagType};

fn payload_offset(file: &[u8]) -> u32 {
	file.windows(PAYLOAD.len())
		.position(|w| w == PAYLOAD)
		.unwrap() as u32
}

#[test_log::test]
fn write_then_read() {
	let dir = tempfile::tempdir().unwrap();
	let path = temp_file(dir.path(), "song.m4a", &mp4());

	let engine = engine();
	assert!(matches!(
		engine.read_tag(&path).unwrap(),
		ReadOutcome::NotTagged { .. }
	));

	engine.write_tag(&path, &common_tag()).unwrap();

	let ReadOutcome::Tagged { tag_type, tag, .. } = engine.read_tag(&path).unwrap() else {
		panic!("Expected a tag");
	};
	assert_eq!(tag_type, TagType::Mp4Ilst);
	verify_common(&tag);

	// The chunk offset follows the audio
	let file = std::fs::read(&path).unwrap();
	assert_eq!(mp4_chunk_offset(&file), payload_offset(&file));
}

#[test_log::test]
fn remove_restores_the_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = temp_file(dir.path(), "song.m4a", &mp4());

	let engine = engine();
	engine.write_tag(&path, &common_tag()).unwrap();
	assert_ne!(std::fs::read(&path).unwrap(), mp4());

	engine.remove_tag(&path).unwrap();
	assert_eq!(std::fs::read(&path).unwrap(), mp4());
}

#[test_log::test]
fn numbers_and_freeform() {
	let engine = engine();

	let mut tag = Tag::new();
	tag.set_track(1);
	tag.set_track_total(10);
	tag.set_disk(2);
	tag.set_disk_total(3);
	tag.push(TagItem::new(
		ItemKey::Isrc,
		ItemValue::Text(String::from("USRC17607839")),
	));
	tag.push(TagItem::new(
		ItemKey::Native(NativeKey::new(TagType::Mp4Ilst, "----:com.example:Mood")),
		ItemValue::Text(String::from("Calm")),
	));

	let mut file = mp4();
	engine.write_tag_to_vec(&mut file, &tag).unwrap();

	let read = engine.read_tag_from(&file).unwrap().into_tag().unwrap();
	assert_eq!(read.track(), Some(1));
	assert_eq!(read.track_total(), Some(10));
	assert_eq!(read.disk(), Some(2));
	assert_eq!(read.disk_total(), Some(3));
	assert_eq!(read.get_string(&ItemKey::Isrc), Some("USRC17607839"));
	assert_eq!(
		read.get_string(&ItemKey::Native(NativeKey::new(
			TagType::Mp4Ilst,
			"----:com.example:Mood"
		))),
		Some("Calm")
	);
}

#[test_log::test]
fn repeated_writes_are_stable() {
	let engine = engine();

	let mut file = mp4();
	engine.write_tag_to_vec(&mut file, &common_tag()).unwrap();
	let first = file.clone();

	let read = engine.read_tag_from(&file).unwrap().into_tag().unwrap();
	engine.write_tag_to_vec(&mut file, &read).unwrap();
	assert_eq!(file, first);
}

#[test_log::test]
fn missing_moov() {
	let mut file = 16_u32.to_be_bytes().to_vec();
	file.extend(b"ftypM4A \0\0\0\0");

	let err = engine().read_tag_from(&file).unwrap_err();
	assert!(err.is_malformed());
}
