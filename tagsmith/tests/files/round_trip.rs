//! Writing a tag and reading it back gives the same tag, for every writable format

use crate::util::{PAYLOAD, asf, cover, engine, flac, mp4, mpeg, normalized, vorbis};

use tagsmith::picture::PictureType;
use tagsmith::tag::{Accessor, ItemKey, ItemValue, Tag, TagItem};

fn full_tag(without: &[ItemKey]) -> Tag {
	let items = [
		(ItemKey::TrackTitle, "Foo title"),
		(ItemKey::TrackArtist, "Bar artist"),
		(ItemKey::AlbumTitle, "Baz album"),
		(ItemKey::AlbumArtist, "Qux artist"),
		(ItemKey::Genre, "Classical"),
		(ItemKey::Comment, "A comment"),
		(ItemKey::Composer, "Some composer"),
		(ItemKey::Year, "2024"),
		(ItemKey::TrackNumber, "3"),
		(ItemKey::TrackTotal, "12"),
		(ItemKey::DiscNumber, "1"),
		(ItemKey::DiscTotal, "2"),
	];

	let mut tag = Tag::new();
	for (key, value) in items {
		if !without.contains(&key) {
			tag.insert_text(key, String::from(value));
		}
	}

	tag.push_picture(cover());
	tag
}

fn assert_round_trip(mut file: Vec<u8>, tag: &Tag) {
	let engine = engine();
	engine.write_tag_to_vec(&mut file, tag).unwrap();
	assert!(file.ends_with(PAYLOAD));

	let read = engine.read_tag_from(&file).unwrap().into_tag().unwrap();
	assert_eq!(normalized(&read), normalized(tag));

	// Writing what was read changes nothing
	let before = file.clone();
	engine.write_tag_to_vec(&mut file, &read).unwrap();
	assert_eq!(file, before);
}

#[test_log::test]
fn id3v2() {
	assert_round_trip(mpeg(), &full_tag(&[]));
}

#[test_log::test]
fn flac_comments() {
	assert_round_trip(flac(), &full_tag(&[]));
}

#[test_log::test]
fn vorbis_comments() {
	assert_round_trip(vorbis(&[]), &full_tag(&[]));
}

#[test_log::test]
fn mp4_ilst() {
	let mut tag = full_tag(&[]);

	// `covr` has no picture type
	tag.remove_key(&ItemKey::Artwork);
	let mut picture = cover();
	picture.set_pic_type(PictureType::Other);
	tag.push_picture(picture);

	assert_round_trip(mp4(), &tag);
}

#[test_log::test]
fn asf_attributes() {
	assert_round_trip(asf(), &full_tag(&[ItemKey::TrackTotal]));
}

#[test_log::test]
fn values_keep_their_meaning() {
	let tag = full_tag(&[]);
	assert_eq!(tag.track(), Some(3));
	assert_eq!(tag.year(), Some(2024));
	assert_eq!(
		tag.get(&ItemKey::TrackTitle).map(TagItem::value),
		Some(&ItemValue::Text(String::from("Foo title")))
	);
}
