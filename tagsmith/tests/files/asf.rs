use crate::util::{PAYLOAD, asf, asf_stored_size, common_tag, engine, temp_file, verify_common};

use tagsmith::config::WriteOptions;
use tagsmith::engine::ReadOutcome;
use tagsmith::tag::{Accessor, TagType};

#[test_log::test]
fn write_then_read() {
	let dir = tempfile::tempdir().unwrap();
	let path = temp_file(dir.path(), "song.wma", &asf());

	let engine = engine();
	assert!(matches!(
		engine.read_tag(&path).unwrap(),
		ReadOutcome::NotTagged { .. }
	));

	engine.write_tag(&path, &common_tag()).unwrap();

	let ReadOutcome::Tagged { tag_type, tag, .. } = engine.read_tag(&path).unwrap() else {
		panic!("Expected a tag");
	};
	assert_eq!(tag_type, TagType::Asf);
	verify_common(&tag);

	let file = std::fs::read(&path).unwrap();
	assert!(file.ends_with(PAYLOAD));
	assert_eq!(asf_stored_size(&file), file.len() as u64);
}

#[test_log::test]
fn part_of_set() {
	let engine = engine();

	let mut tag = common_tag();
	tag.set_disk(1);
	tag.set_disk_total(2);

	let mut file = asf();
	engine.write_tag_to_vec(&mut file, &tag).unwrap();

	let read = engine.read_tag_from(&file).unwrap().into_tag().unwrap();
	assert_eq!(read.disk(), Some(1));
	assert_eq!(read.disk_total(), Some(2));
}

#[test_log::test]
fn padding_keeps_the_size() {
	let engine = engine().write_options(WriteOptions::new().preferred_padding(4096));

	let mut file = asf();
	engine.write_tag_to_vec(&mut file, &common_tag()).unwrap();
	let len = file.len();

	let mut tag = common_tag();
	tag.set_title(String::from("A longer title than before"));
	engine.write_tag_to_vec(&mut file, &tag).unwrap();

	assert_eq!(file.len(), len);
	assert_eq!(asf_stored_size(&file), len as u64);
	assert_eq!(
		engine.read_tag_from(&file).unwrap().into_tag().unwrap().title().as_deref(),
		Some("A longer title than before")
	);
}

#[test_log::test]
fn remove() {
	let dir = tempfile::tempdir().unwrap();
	let path = temp_file(dir.path(), "song.wma", &asf());

	let engine = engine();
	engine.write_tag(&path, &common_tag()).unwrap();
	engine.remove_tag(&path).unwrap();

	assert!(matches!(
		engine.read_tag(&path).unwrap(),
		ReadOutcome::NotTagged { .. }
	));
	let file = std::fs::read(&path).unwrap();
	assert_eq!(asf_stored_size(&file), file.len() as u64);
}
