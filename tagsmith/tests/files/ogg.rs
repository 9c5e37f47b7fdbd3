use crate::util::{PAYLOAD, common_tag, engine, ogg_crc, temp_file, verify_common, vorbis};

use tagsmith::engine::ReadOutcome;
use tagsmith::tag::{Accessor, ItemKey, TagType};

/// Check every page's sequence number and CRC, returning the content of the last page
fn verify_pages(mut file: &[u8]) -> Vec<u8> {
	let mut seq = 0;
	let mut last = Vec::new();

	while !file.is_empty() {
		assert_eq!(&file[..4], b"OggS");
		let segment_count = file[26] as usize;
		let content_len = file[27..27 + segment_count]
			.iter()
			.map(|s| *s as usize)
			.sum::<usize>();
		let len = 27 + segment_count + content_len;

		assert_eq!(u32::from_le_bytes(file[18..22].try_into().unwrap()), seq);

		let mut zeroed = file[..len].to_vec();
		zeroed[22..26].copy_from_slice(&[0; 4]);
		assert_eq!(
			ogg_crc(&zeroed),
			u32::from_le_bytes(file[22..26].try_into().unwrap())
		);

		last = file[27 + segment_count..len].to_vec();
		file = &file[len..];
		seq += 1;
	}

	last
}

#[test_log::test]
fn read_existing() {
	let file = vorbis(&["TITLE=Title", "ARTIST=One", "ARTIST=Two", "MY_FIELD=kept"]);

	let ReadOutcome::Tagged { tag_type, tag, .. } = engine().read_tag_from(&file).unwrap() else {
		panic!("Expected a tag");
	};
	assert_eq!(tag_type, TagType::VorbisComments);
	assert_eq!(tag.title().as_deref(), Some("Title"));
	assert_eq!(
		tag.get_strings(&ItemKey::TrackArtist).collect::<Vec<_>>(),
		["One", "Two"]
	);
	assert_eq!(tag.len(), 4);
}

#[test_log::test]
fn write_then_read() {
	let dir = tempfile::tempdir().unwrap();
	let path = temp_file(dir.path(), "song.ogg", &vorbis(&[]));

	let engine = engine();
	engine.write_tag(&path, &common_tag()).unwrap();

	let tag = engine.read_tag(&path).unwrap().into_tag().unwrap();
	verify_common(&tag);

	// The picture needs more pages, which renumbers the audio
	let file = std::fs::read(&path).unwrap();
	assert_eq!(verify_pages(&file), PAYLOAD);
}

#[test_log::test]
fn remove() {
	let engine = engine();

	let mut file = vorbis(&["TITLE=Title"]);
	engine.write_tag_to_vec(&mut file, &tagsmith::tag::Tag::new()).unwrap();

	// The comment header is required, so it is left empty
	let outcome = engine.read_tag_from(&file).unwrap();
	assert!(outcome.tag().is_none_or(|tag| tag.is_empty()));
	assert_eq!(verify_pages(&file), PAYLOAD);
}
