//! Conversion of frames into tag items

use super::{ENCRYPTED_FRAME_SUFFIX, RawFrame};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::{Id3v2Error, Id3v2ErrorKind, Result};
use crate::id3::v1::constants::GENRES;
use crate::id3::v2::Id3v2Version;
use crate::macros::err;
use crate::picture::{MimeType, Picture, PictureType};
use crate::tag::{ItemKey, ItemValue, NativeKey, Tag, TagItem, TagType};
use crate::util::cursor::ByteCursor;
use crate::util::text::{TextEncoding, decode_text};

/// Convert a frame into tag items, appending them to `tag`
///
/// Anything that cannot be represented by a generic item is kept as an [`ItemKey::Native`]
/// item holding the frame payload.
pub(crate) fn decode_frame(
	frame: RawFrame,
	version: Id3v2Version,
	options: ParseOptions,
	tag: &mut Tag,
) -> Result<()> {
	let decoded = match frame.id.as_str() {
		"TXXX" => return push_native(frame, tag),
		id if id.ends_with(ENCRYPTED_FRAME_SUFFIX) => return push_native(frame, tag),
		"COMM" => decode_language_frame(&frame, version, ItemKey::Comment),
		"USLT" => decode_language_frame(&frame, version, ItemKey::Lyrics),
		"APIC" if version == Id3v2Version::V2 && !options.read_cover_art => {
			let frame = RawFrame {
				id: frame.id,
				content: upgrade_v2_picture(&frame.content)?,
			};
			return push_native(frame, tag);
		},
		"APIC" if options.read_cover_art => decode_picture(&frame, version)
			.map(|pic| Some(vec![TagItem::new(ItemKey::Artwork, ItemValue::Picture(pic))])),
		id if id.starts_with('T') => match ItemKey::from_key(TagType::Id3v2, id) {
			ItemKey::Native(_) => return push_native(frame, tag),
			key => decode_text_frame(&frame.content, version)
				.map(|values| Some(text_items(key, values, options))),
		},
		_ => return push_native(frame, tag),
	};

	match decoded {
		Ok(Some(items)) => {
			for item in items {
				tag.push_unchecked(item);
			}
		},
		Ok(None) => push_native(frame, tag)?,
		Err(e) => {
			if options.parsing_mode == ParsingMode::Strict {
				return Err(e);
			}

			log::warn!("Failed to decode frame {:?}, keeping it as is: {}", frame.id, e);
			push_native(frame, tag)?;
		},
	}

	Ok(())
}

fn push_native(frame: RawFrame, tag: &mut Tag) -> Result<()> {
	log::trace!("Keeping frame {:?} as a native item", frame.id);

	tag.push_unchecked(TagItem::new(
		ItemKey::Native(NativeKey::new(TagType::Id3v2, frame.id)),
		ItemValue::Binary(frame.content),
	));
	Ok(())
}

fn read_encoding(cursor: &mut ByteCursor<'_>, version: Id3v2Version) -> Result<TextEncoding> {
	let encoding = cursor.read_u8()?;
	let Some(encoding) = TextEncoding::from_u8(encoding) else {
		err!(TextDecode("Found invalid encoding"));
	};

	if version == Id3v2Version::V2
		&& !matches!(encoding, TextEncoding::Latin1 | TextEncoding::UTF16)
	{
		return Err(Id3v2Error::new(Id3v2ErrorKind::V2InvalidTextEncoding).into());
	}

	Ok(encoding)
}

/// Decode the (possibly null separated) values of a text information frame
pub(crate) fn decode_text_frame(content: &[u8], version: Id3v2Version) -> Result<Vec<String>> {
	let mut cursor = ByteCursor::new(content);
	let encoding = read_encoding(&mut cursor, version)?;

	let mut values = Vec::new();
	while !cursor.is_empty() {
		values.push(cursor.read_terminated_string(encoding)?);
	}

	if values.is_empty() {
		values.push(String::new());
	}

	Ok(values)
}

fn text_items(key: ItemKey, values: Vec<String>, options: ParseOptions) -> Vec<TagItem> {
	let mut items = Vec::with_capacity(values.len());

	let total_key = match key {
		ItemKey::TrackNumber => Some(ItemKey::TrackTotal),
		ItemKey::DiscNumber => Some(ItemKey::DiscTotal),
		_ => None,
	};

	for value in values {
		if !options.implicit_conversions {
			items.push(TagItem::from_text(key.clone(), value));
			continue;
		}

		match (&key, &total_key) {
			(_, Some(total_key)) if value.contains('/') => {
				let (number, total) = value.split_once('/').unwrap_or((value.as_str(), ""));
				let (number, total) = (number.trim(), total.trim());

				if !number.is_empty() {
					items.push(TagItem::from_text(key.clone(), number.to_owned()));
				}

				if !total.is_empty() {
					items.push(TagItem::from_text(total_key.clone(), total.to_owned()));
				}
			},
			(ItemKey::Genre, _) => {
				for genre in resolve_genres(&value) {
					items.push(TagItem::new(ItemKey::Genre, ItemValue::Text(genre)));
				}
			},
			_ => items.push(TagItem::from_text(key.clone(), value)),
		}
	}

	items
}

/// Resolve ID3v1 style genre references
///
/// * `"17"` -> `["Rock"]`
/// * `"(17)(6)"` -> `["Rock", "Grunge"]`
/// * `"(4)Eurodisco"` -> `["Eurodisco"]` (the refinement replaces the references)
/// * `"((Not a reference)"` -> `["(Not a reference)"]`
pub(crate) fn resolve_genres(value: &str) -> Vec<String> {
	if let Ok(idx) = value.parse::<usize>() {
		if let Some(genre) = GENRES.get(idx) {
			return vec![(*genre).to_owned()];
		}
	}

	let mut genres = Vec::new();
	let mut rest = value;
	while let Some(reference) = rest.strip_prefix('(') {
		if reference.starts_with('(') {
			rest = reference;
			break;
		}

		let Some(end) = reference.find(')') else {
			break;
		};

		let genre = match &reference[..end] {
			"RX" => "Remix",
			"CR" => "Cover",
			idx => match idx.parse::<usize>().ok().and_then(|idx| GENRES.get(idx)) {
				Some(genre) => genre,
				None => break,
			},
		};

		genres.push(genre.to_owned());
		rest = &reference[end + 1..];
	}

	if !rest.is_empty() {
		return vec![rest.to_owned()];
	}

	genres
}

// COMM and USLT, only frames with an empty description have a generic equivalent
fn decode_language_frame(
	frame: &RawFrame,
	version: Id3v2Version,
	key: ItemKey,
) -> Result<Option<Vec<TagItem>>> {
	let mut cursor = ByteCursor::new(&frame.content);
	let encoding = read_encoding(&mut cursor, version)?;

	let _language = cursor.read_array::<3>()?;
	let description = cursor.read_terminated_string(encoding)?;
	let text = decode_text(cursor.read_rest(), encoding)?;

	if !description.is_empty() {
		return Ok(None);
	}

	Ok(Some(vec![TagItem::new(key, ItemValue::Text(text))]))
}

fn decode_picture(frame: &RawFrame, version: Id3v2Version) -> Result<Picture> {
	let mut cursor = ByteCursor::new(&frame.content);
	let encoding = read_encoding(&mut cursor, version)?;

	let mime_type = if version == Id3v2Version::V2 {
		let format = cursor.read_array::<3>()?;
		match MimeType::from_id3v22_format(&format) {
			Some(mime_type) => Some(mime_type),
			None => {
				return Err(Id3v2Error::new(Id3v2ErrorKind::BadPictureFormat(
					String::from_utf8_lossy(&format).into_owned(),
				))
				.into());
			},
		}
	} else {
		let mime_type = cursor.read_terminated_string(TextEncoding::Latin1)?;
		(!mime_type.is_empty()).then(|| MimeType::from_str(&mime_type))
	};

	let pic_type = PictureType::from_u8(cursor.read_u8()?);
	let description = cursor.read_terminated_string(encoding)?;
	let data = cursor.read_rest();

	if data.is_empty() {
		err!(NotAPicture);
	}

	let mut builder = Picture::unchecked(data.to_vec()).pic_type(pic_type);
	if let Some(mime_type) = mime_type {
		builder = builder.mime_type(mime_type);
	}

	if !description.is_empty() {
		builder = builder.description(description);
	}

	Ok(builder.build())
}

// ID3v2.2 PIC frames store a 3 character image format rather than a MIME type
fn upgrade_v2_picture(content: &[u8]) -> Result<Vec<u8>> {
	let mut cursor = ByteCursor::new(content);
	let encoding = cursor.read_u8()?;
	let format = cursor.read_array::<3>()?;

	let mime_type = match MimeType::from_id3v22_format(&format) {
		Some(mime_type) => mime_type.as_str().to_owned(),
		None => format!(
			"image/{}",
			String::from_utf8_lossy(&format).to_ascii_lowercase()
		),
	};

	let mut upgraded = Vec::with_capacity(content.len() + mime_type.len());
	upgraded.push(encoding);
	upgraded.extend(mime_type.as_bytes());
	upgraded.push(0);
	upgraded.extend(cursor.read_rest());

	Ok(upgraded)
}

#[cfg(test)]
mod tests {
	use super::{decode_frame, resolve_genres};
	use crate::config::{ParseOptions, ParsingMode};
	use crate::id3::v2::Id3v2Version;
	use crate::id3::v2::frame::RawFrame;
	use crate::picture::{MimeType, PictureType};
	use crate::tag::{Accessor, ItemKey, ItemValue, NativeKey, Tag, TagType};

	fn frame(id: &str, content: &[u8]) -> RawFrame {
		RawFrame {
			id: id.to_owned(),
			content: content.to_vec(),
		}
	}

	fn decode(frames: Vec<RawFrame>, version: Id3v2Version, options: ParseOptions) -> Tag {
		let mut tag = Tag::new();
		for frame in frames {
			decode_frame(frame, version, options, &mut tag).unwrap();
		}

		tag
	}

	#[test_log::test]
	fn genres() {
		assert_eq!(resolve_genres("17"), ["Rock"]);
		assert_eq!(resolve_genres("(17)(6)"), ["Rock", "Grunge"]);
		assert_eq!(resolve_genres("(4)Eurodisco"), ["Eurodisco"]);
		assert_eq!(resolve_genres("(RX)"), ["Remix"]);
		assert_eq!(resolve_genres("((Not a reference)"), ["(Not a reference)"]);
		assert_eq!(resolve_genres("Shoegaze"), ["Shoegaze"]);
		assert_eq!(resolve_genres("(999)"), ["(999)"]);
	}

	#[test_log::test]
	fn multi_value_text() {
		let tag = decode(
			vec![frame("TPE1", b"\x03Foo\0Bar\0")],
			Id3v2Version::V4,
			ParseOptions::new(),
		);
		assert_eq!(
			tag.get_strings(&ItemKey::TrackArtist).collect::<Vec<_>>(),
			["Foo", "Bar"]
		);
	}

	#[test_log::test]
	fn track_and_total() {
		let tag = decode(
			vec![frame("TRCK", b"\x005/12"), frame("TPOS", b"\x001")],
			Id3v2Version::V4,
			ParseOptions::new(),
		);
		assert_eq!(tag.track(), Some(5));
		assert_eq!(tag.track_total(), Some(12));
		assert_eq!(tag.disk(), Some(1));

		let tag = decode(
			vec![frame("TRCK", b"\x005/12")],
			Id3v2Version::V4,
			ParseOptions::new().implicit_conversions(false),
		);
		assert_eq!(tag.get_string(&ItemKey::TrackNumber), Some("5/12"));
		assert_eq!(tag.track_total(), None);
	}

	#[test_log::test]
	fn comments_with_descriptions_are_native() {
		let tag = decode(
			vec![
				frame("COMM", b"\x00eng\0Plain comment"),
				frame("COMM", b"\x00engiTunNORM\0 000001"),
			],
			Id3v2Version::V3,
			ParseOptions::new(),
		);

		assert_eq!(tag.comment().as_deref(), Some("Plain comment"));
		assert_eq!(
			tag.get(&ItemKey::Native(NativeKey::new(TagType::Id3v2, "COMM")))
				.unwrap()
				.value(),
			&ItemValue::Binary(b"\x00engiTunNORM\0 000001".to_vec())
		);
	}

	#[test_log::test]
	fn unknown_frames_are_native() {
		let tag = decode(
			vec![
				frame("PRIV", b"owner\0\x01\x02"),
				frame("TXXX", b"\x00KEY\0value"),
				frame("TZZZ", b"\x00unknown text frame"),
			],
			Id3v2Version::V4,
			ParseOptions::new(),
		);

		let keys = tag
			.items()
			.map(|i| i.key().native().unwrap().key().to_owned())
			.collect::<Vec<_>>();
		assert_eq!(keys, ["PRIV", "TXXX", "TZZZ"]);
	}

	#[test_log::test]
	fn undecodable_text_by_mode() {
		let bad = || vec![frame("TIT2", b"\x01\x00\x41")];

		let mut tag = Tag::new();
		let strict = ParseOptions::new().parsing_mode(ParsingMode::Strict);
		assert!(decode_frame(bad().remove(0), Id3v2Version::V4, strict, &mut tag).is_err());

		let tag = decode(bad(), Id3v2Version::V4, ParseOptions::new());
		assert!(tag.title().is_none());
		assert!(tag.has_native_items());
	}

	#[test_log::test]
	fn pictures() {
		let mut apic = b"\x00image/png\0\x03Front\0".to_vec();
		apic.extend([0x89, b'P', b'N', b'G']);

		let tag = decode(
			vec![frame("APIC", &apic)],
			Id3v2Version::V4,
			ParseOptions::new(),
		);
		let front = tag.get_picture_type(PictureType::CoverFront).unwrap();
		assert_eq!(front.mime_type(), Some(&MimeType::Png));
		assert_eq!(front.description(), Some("Front"));
		assert_eq!(front.data(), [0x89, b'P', b'N', b'G']);

		// ID3v2.2, kept undecoded
		let mut pic = b"\x00JPG\x04".to_vec();
		pic.push(0);
		pic.extend([0xFF, 0xD8, 0xFF]);

		let tag = decode(
			vec![frame("APIC", &pic)],
			Id3v2Version::V2,
			ParseOptions::new().read_cover_art(false),
		);
		assert_eq!(tag.pictures().count(), 0);
		assert_eq!(
			tag.items().next().unwrap().value(),
			&ItemValue::Binary(b"\x00image/jpeg\0\x04\0\xFF\xD8\xFF".to_vec())
		);
	}
}
