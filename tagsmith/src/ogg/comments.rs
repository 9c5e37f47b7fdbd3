//! Vorbis comments, shared by Ogg streams and FLAC's `VORBIS_COMMENT` block

use crate::config::{ParseOptions, ParsingMode};
use crate::error::{ErrorKind, Result, TagError};
use crate::macros::{decode_err, err, parse_mode_choice};
use crate::picture::{Picture, PictureInformation, PictureType};
use crate::tag::{ItemKey, ItemValue, NativeKey, Tag, TagItem, TagType};
use crate::util::cursor::ByteCursor;
use crate::util::text::utf8_decode;

use std::borrow::Cow;

use byteorder::LittleEndian;
use data_encoding::BASE64;

pub(crate) const DEFAULT_VENDOR: &str = concat!("tagsmith ", env!("CARGO_PKG_VERSION"));

pub(crate) const PICTURE_KEY: &str = "METADATA_BLOCK_PICTURE";
const LEGACY_PICTURE_KEY: &str = "COVERART";

/// The valid range is 0x20..=0x7D, not including 0x3D (`=`)
pub(crate) fn valid_key(key: &[u8]) -> bool {
	!key.is_empty() && key.iter().all(|c| (b' '..=b'}').contains(c) && *c != b'=')
}

/// Read only the vendor string from a comment header
pub(crate) fn read_vendor(data: &[u8]) -> Option<String> {
	let mut reader = ByteCursor::new(data);
	let vendor_len = reader.read_u32::<LittleEndian>().ok()? as usize;
	let vendor = reader.read_bytes(vendor_len).ok()?;
	String::from_utf8(vendor.to_vec()).ok()
}

/// Decode a comment header (without any packet signature)
pub(crate) fn read_comments(data: &[u8], parse_options: ParseOptions) -> Result<Tag> {
	let parse_mode = parse_options.parsing_mode;
	let mut reader = ByteCursor::new(data);

	let vendor_len = reader.read_u32::<LittleEndian>()? as usize;
	if vendor_len > reader.remaining() {
		err!(SizeMismatch);
	}

	let vendor = match utf8_decode(reader.read_bytes(vendor_len)?.to_vec()) {
		Ok(vendor) => vendor,
		Err(e) => {
			if parse_mode == ParsingMode::Strict {
				return Err(e);
			}

			log::warn!("Vendor string is not valid UTF-8, discarding it");
			String::new()
		},
	};

	let number_of_items = reader.read_u32::<LittleEndian>()? as usize;
	// Every field needs at least its length
	if number_of_items > reader.remaining() / 4 {
		err!(SizeMismatch);
	}

	log::trace!("Reading {number_of_items} Vorbis comments, vendor: {vendor:?}");

	let mut tag = Tag::new();
	for _ in 0..number_of_items {
		let comment_len = reader.read_u32::<LittleEndian>()? as usize;
		if comment_len > reader.remaining() {
			parse_mode_choice!(
				parse_mode,
				STRICT: err!(SizeMismatch),
				DEFAULT: {
					log::warn!("Vorbis comment field exceeds the header, stopping");
					break;
				}
			);
		}

		let field = reader.read_bytes(comment_len)?;

		let mut split = field.splitn(2, |b| *b == b'=');
		let (Some(key), Some(value)) = (split.next(), split.next()) else {
			parse_mode_choice!(
				parse_mode,
				STRICT: decode_err!(@BAIL "Vorbis comment field has no separator"),
				DEFAULT: {
					log::warn!("No separator found in field, discarding");
					continue;
				}
			);
		};

		if !valid_key(key) {
			parse_mode_choice!(
				parse_mode,
				STRICT: decode_err!(@BAIL "Vorbis comments contain an invalid key"),
				DEFAULT: {
					log::warn!("Vorbis comment key is invalid, discarding field");
					continue;
				}
			);
		}

		// Valid keys are a subset of ASCII
		let key = String::from_utf8_lossy(key).into_owned();

		let value = match utf8_decode(value.to_vec()) {
			Ok(value) => value,
			Err(e) => {
				if parse_mode == ParsingMode::Strict {
					return Err(e);
				}

				log::warn!("Non UTF-8 value found, keeping field {key:?} as is");
				tag.push(TagItem::new(
					ItemKey::Native(NativeKey::new(TagType::VorbisComments, key)),
					ItemValue::Binary(value.to_vec()),
				));
				continue;
			},
		};

		read_field(&mut tag, key, value, parse_options)?;
	}

	Ok(tag)
}

fn read_field(tag: &mut Tag, key: String, value: String, parse_options: ParseOptions) -> Result<()> {
	let parse_mode = parse_options.parsing_mode;

	if key.eq_ignore_ascii_case(PICTURE_KEY) || key.eq_ignore_ascii_case(LEGACY_PICTURE_KEY) {
		if !parse_options.read_cover_art {
			push_native(tag, key, value);
			return Ok(());
		}

		let picture = if key.eq_ignore_ascii_case(PICTURE_KEY) {
			Picture::from_flac_bytes(value.as_bytes(), true, parse_mode).map(|(picture, _)| picture)
		} else {
			// An older format, only the base64 encoded image
			log::warn!("Found deprecated `COVERART` field, converting it");
			legacy_picture(&value)
		};

		match picture {
			Ok(picture) => tag.push_picture(picture),
			Err(e) => {
				if parse_mode == ParsingMode::Strict {
					return Err(e);
				}

				log::warn!("Failed to decode picture field {key:?}, keeping it as is");
				push_native(tag, key, value);
			},
		}

		return Ok(());
	}

	let item_key = ItemKey::from_key(TagType::VorbisComments, &key);
	match item_key {
		ItemKey::TrackNumber | ItemKey::DiscNumber if parse_options.implicit_conversions => {
			let total_key = if item_key == ItemKey::TrackNumber {
				ItemKey::TrackTotal
			} else {
				ItemKey::DiscTotal
			};

			// Support "current/total"
			match value.split_once('/') {
				Some((current, total))
					if current.trim().parse::<u32>().is_ok() && total.trim().parse::<u32>().is_ok() =>
				{
					tag.push(TagItem::from_text(item_key, current.trim().to_owned()));
					tag.push(TagItem::from_text(total_key, total.trim().to_owned()));
				},
				_ => {
					tag.push(TagItem::from_text(item_key, value));
				},
			}
		},
		// Unknown keys keep their original case
		ItemKey::Native(_) => push_native(tag, key, value),
		_ => {
			tag.push(TagItem::from_text(item_key, value));
		},
	}

	Ok(())
}

fn push_native(tag: &mut Tag, key: String, value: String) {
	tag.push(TagItem::new(
		ItemKey::Native(NativeKey::new(TagType::VorbisComments, key)),
		ItemValue::Text(value),
	));
}

fn legacy_picture(value: &str) -> Result<Picture> {
	let data = BASE64
		.decode(value.as_bytes())
		.map_err(|_| TagError::new(ErrorKind::NotAPicture))?;

	let mime_type = Picture::mimetype_from_bin(&data).ok();

	let mut builder = Picture::unchecked(data).pic_type(PictureType::Other);
	if let Some(mime_type) = mime_type {
		builder = builder.mime_type(mime_type);
	}

	Ok(builder.build())
}

/// Encode `tag` as a comment header (without any packet signature)
///
/// With `include_pictures`, pictures are stored as `METADATA_BLOCK_PICTURE` fields. FLAC stores
/// them in their own blocks instead.
pub(crate) fn create_comments(vendor: &str, tag: &Tag, include_pictures: bool) -> Result<Vec<u8>> {
	let mut fields = Vec::new();

	for item in tag.items() {
		if let ItemValue::Picture(picture) = item.value() {
			if include_pictures {
				let info = PictureInformation::from_picture(picture).unwrap_or_default();
				let mut field = format!("{PICTURE_KEY}=").into_bytes();
				field.extend(picture.as_flac_bytes(info, true));
				fields.push(field);
			}

			continue;
		}

		let Some(key) = item.key().map_key(TagType::VorbisComments) else {
			log::warn!("Skipping {:?}, it has no Vorbis comments equivalent", item.key());
			continue;
		};

		if !include_pictures && key.eq_ignore_ascii_case(PICTURE_KEY) {
			continue;
		}

		if !valid_key(key.as_bytes()) {
			log::warn!("Skipping field with an invalid key: {key:?}");
			continue;
		}

		let value = match item.value() {
			// Fields that were not valid UTF-8
			ItemValue::Binary(bytes) if item.key().native().is_some() => Cow::Borrowed(bytes.as_slice()),
			value => match value.text() {
				Some(text) => Cow::Owned(text.into_owned().into_bytes()),
				None => {
					log::warn!("Skipping field {key:?}, expected a text value");
					continue;
				},
			},
		};

		let mut field = Vec::with_capacity(key.len() + 1 + value.len());
		field.extend(key.as_bytes());
		field.push(b'=');
		field.extend_from_slice(&value);
		fields.push(field);
	}

	let mut out = Vec::new();
	push_sized(&mut out, vendor.as_bytes())?;

	let Ok(count) = u32::try_from(fields.len()) else {
		err!(TooMuchData);
	};
	out.extend(count.to_le_bytes());

	for field in fields {
		push_sized(&mut out, &field)?;
	}

	Ok(out)
}

fn push_sized(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
	let Ok(len) = u32::try_from(bytes.len()) else {
		err!(TooMuchData);
	};

	out.extend(len.to_le_bytes());
	out.extend(bytes);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::{create_comments, read_comments, read_vendor};
	use crate::config::{ParseOptions, ParsingMode};
	use crate::picture::{MimeType, Picture, PictureType};
	use crate::tag::{Accessor, ItemKey, ItemValue, NativeKey, Tag, TagItem, TagType};

	fn comments(vendor: &str, fields: &[&[u8]]) -> Vec<u8> {
		let mut out = (vendor.len() as u32).to_le_bytes().to_vec();
		out.extend(vendor.as_bytes());
		out.extend((fields.len() as u32).to_le_bytes());
		for field in fields {
			out.extend((field.len() as u32).to_le_bytes());
			out.extend(*field);
		}
		out
	}

	#[test_log::test]
	fn multiple_values_keep_their_order() {
		let data = comments(
			"vendor",
			&[b"ARTIST=One", b"title=Title", b"artist=Two", b"MyKey=Value"],
		);

		let tag = read_comments(&data, ParseOptions::new()).unwrap();
		assert_eq!(read_vendor(&data).as_deref(), Some("vendor"));
		assert_eq!(
			tag.get_strings(&ItemKey::TrackArtist).collect::<Vec<_>>(),
			["One", "Two"]
		);
		assert_eq!(tag.title().as_deref(), Some("Title"));
		assert_eq!(
			tag.get_string(&ItemKey::Native(NativeKey::new(
				TagType::VorbisComments,
				"MyKey"
			))),
			Some("Value")
		);
	}

	#[test_log::test]
	fn track_numbers() {
		let data = comments("", &[b"TRACKNUMBER=3/12", b"DISCNUMBER=A1"]);

		let tag = read_comments(&data, ParseOptions::new()).unwrap();
		assert_eq!(tag.track(), Some(3));
		assert_eq!(tag.track_total(), Some(12));
		assert_eq!(tag.get_string(&ItemKey::DiscNumber), Some("A1"));

		let options = ParseOptions::new().implicit_conversions(false);
		let tag = read_comments(&data, options).unwrap();
		assert_eq!(tag.get_string(&ItemKey::TrackNumber), Some("3/12"));
	}

	#[test_log::test]
	fn invalid_fields_by_mode() {
		let data = comments("", &[b"NOSEPARATOR", b"BAD\x7FKEY=x", b"TITLE=ok"]);

		let strict = ParseOptions::new().parsing_mode(ParsingMode::Strict);
		assert!(read_comments(&data, strict).is_err());

		let tag = read_comments(&data, ParseOptions::new()).unwrap();
		assert_eq!(tag.len(), 1);
		assert_eq!(tag.title().as_deref(), Some("ok"));
	}

	#[test_log::test]
	fn bad_counts() {
		let mut data = comments("", &[b"TITLE=ok"]);
		data[4..8].copy_from_slice(&1000_u32.to_le_bytes());
		assert!(read_comments(&data, ParseOptions::new()).is_err());
	}

	#[test_log::test]
	fn write_then_read() {
		let mut tag = Tag::new();
		tag.set_title(String::from("Title"));
		tag.push(TagItem::new(
			ItemKey::TrackArtist,
			ItemValue::Text(String::from("One")),
		));
		tag.push(TagItem::new(
			ItemKey::TrackArtist,
			ItemValue::Text(String::from("Two")),
		));
		tag.set_track(7);
		tag.push(TagItem::new(
			ItemKey::Native(NativeKey::new(TagType::Mp4Ilst, "\u{a9}xyz")),
			ItemValue::Text(String::from("dropped")),
		));
		tag.push_picture(
			Picture::unchecked(b"\x89PNG\r\n\x1a\nrest".to_vec())
				.pic_type(PictureType::CoverFront)
				.mime_type(MimeType::Png)
				.build(),
		);

		let data = create_comments("vendor", &tag, true).unwrap();
		assert_eq!(read_vendor(&data).as_deref(), Some("vendor"));

		let read = read_comments(&data, ParseOptions::new()).unwrap();
		assert_eq!(read.len(), 5);
		assert_eq!(read.title().as_deref(), Some("Title"));
		assert_eq!(
			read.get_strings(&ItemKey::TrackArtist).collect::<Vec<_>>(),
			["One", "Two"]
		);
		assert_eq!(read.track(), Some(7));
		assert_eq!(read.pictures().next().unwrap().pic_type(), PictureType::CoverFront);

		// FLAC stores pictures separately
		let data = create_comments("vendor", &tag, false).unwrap();
		assert_eq!(read_comments(&data, ParseOptions::new()).unwrap().len(), 4);
	}

	#[test_log::test]
	fn pictures_kept_raw() {
		let picture = Picture::unchecked(b"\xFF\xD8\xFF\xE0data".to_vec())
			.mime_type(MimeType::Jpeg)
			.build();
		let encoded = picture.as_flac_bytes(Default::default(), true);

		let mut field = b"METADATA_BLOCK_PICTURE=".to_vec();
		field.extend(&encoded);
		let data = comments("", &[&field]);

		let tag = read_comments(&data, ParseOptions::new().read_cover_art(false)).unwrap();
		assert_eq!(tag.pictures().count(), 0);
		assert_eq!(
			tag.get_string(&ItemKey::Native(NativeKey::new(
				TagType::VorbisComments,
				"METADATA_BLOCK_PICTURE"
			)))
			.map(str::as_bytes),
			Some(&encoded[..])
		);

		let tag = read_comments(&data, ParseOptions::new()).unwrap();
		assert_eq!(tag.pictures().next(), Some(&picture));
	}

	#[test_log::test]
	fn undecodable_fields_are_kept() {
		let data = comments(
			"",
			&[
				b"TITLE=Title",
				b"COMMENT=caf\xE9",
				b"METADATA_BLOCK_PICTURE=bm90IGEgcGljdHVyZQ==",
			],
		);

		let strict = ParseOptions::new().parsing_mode(ParsingMode::Strict);
		assert!(read_comments(&data, strict).is_err());

		let tag = read_comments(&data, ParseOptions::new()).unwrap();
		assert_eq!(tag.len(), 3);
		assert_eq!(
			tag.get(&ItemKey::Native(NativeKey::new(TagType::VorbisComments, "COMMENT")))
				.map(TagItem::value),
			Some(&ItemValue::Binary(b"caf\xE9".to_vec()))
		);
		assert_eq!(tag.pictures().count(), 0);

		// Both are written back byte for byte
		let rewritten = create_comments("", &tag, true).unwrap();
		assert_eq!(rewritten, data);
	}

	#[test_log::test]
	fn removing_one_of_several_values() {
		let data = comments("", &[b"ARTIST=One", b"TITLE=Title", b"ARTIST=Two", b"ARTIST=Three"]);

		let mut tag = read_comments(&data, ParseOptions::new()).unwrap();
		let removed = tag.remove_value(&ItemKey::TrackArtist, 1).unwrap();
		assert_eq!(removed.value().text().as_deref(), Some("Two"));

		let rewritten = create_comments("", &tag, true).unwrap();
		assert_eq!(
			rewritten,
			comments("", &[b"ARTIST=One", b"TITLE=Title", b"ARTIST=Three"])
		);
	}
}
