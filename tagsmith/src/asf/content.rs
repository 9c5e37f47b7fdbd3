//! The Content Description and Extended Content Description objects

use crate::config::{ParseOptions, ParsingMode};
use crate::error::{ErrorKind, Result, TagError};
use crate::macros::{decode_err, err, parse_mode_choice};
use crate::picture::{MimeType, Picture, PictureType};
use crate::tag::{ItemKey, ItemValue, NativeKey, Tag, TagItem, TagType};
use crate::util::cursor::ByteCursor;
use crate::util::text::{TextEncoding, utf16le_decode, utf16le_encode};

use byteorder::{ByteOrder, LittleEndian};

pub(super) const PICTURE_KEY: &str = "WM/Picture";
const TRACK_NUMBER_KEY: &str = "WM/TrackNumber";

/// The Content Description strings, in the order they are stored
const CONTENT_DESCRIPTION_FIELDS: [&str; 5] =
	["Title", "Author", "Copyright", "Description", "Rating"];

/// A descriptor value from the Extended Content Description
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum DescriptorValue {
	Unicode(String),
	Bytes(Vec<u8>),
	Bool(bool),
	Dword(u32),
	Qword(u64),
	Word(u16),
}

impl DescriptorValue {
	fn value_type(&self) -> u16 {
		match self {
			Self::Unicode(_) => 0,
			Self::Bytes(_) => 1,
			Self::Bool(_) => 2,
			Self::Dword(_) => 3,
			Self::Qword(_) => 4,
			Self::Word(_) => 5,
		}
	}

	fn parse(value_type: u16, data: &[u8]) -> Result<Self> {
		let value = match (value_type, data.len()) {
			(0, _) => Self::Unicode(utf16le_decode(data)?),
			(1, _) => Self::Bytes(data.to_vec()),
			// BOOLs are 32 bits in this object, and 16 everywhere else
			(2, 4) => Self::Bool(LittleEndian::read_u32(data) != 0),
			(3, 4) => Self::Dword(LittleEndian::read_u32(data)),
			(4, 8) => Self::Qword(LittleEndian::read_u64(data)),
			(5, 2) => Self::Word(LittleEndian::read_u16(data)),
			(2..=5, _) => decode_err!(@BAIL Asf, "Descriptor value has an invalid length"),
			_ => decode_err!(@BAIL Asf, "Descriptor has an unknown value type"),
		};

		Ok(value)
	}

	fn as_bytes(&self) -> Vec<u8> {
		match self {
			Self::Unicode(text) => utf16le_encode(text, true),
			Self::Bytes(bytes) => bytes.clone(),
			Self::Bool(b) => u32::from(*b).to_le_bytes().to_vec(),
			Self::Dword(n) => n.to_le_bytes().to_vec(),
			Self::Qword(n) => n.to_le_bytes().to_vec(),
			Self::Word(n) => n.to_le_bytes().to_vec(),
		}
	}

	/// Native binary items hold the value type followed by the value
	fn to_native(&self) -> Vec<u8> {
		let mut out = self.value_type().to_le_bytes().to_vec();
		out.extend(self.as_bytes());
		out
	}

	fn from_native(bytes: &[u8]) -> Result<Self> {
		if bytes.len() < 2 {
			decode_err!(@BAIL Asf, "Native descriptor is missing its value type");
		}

		Self::parse(LittleEndian::read_u16(bytes), &bytes[2..])
	}

	fn number(&self) -> Option<u64> {
		match self {
			Self::Bool(b) => Some(u64::from(*b)),
			Self::Dword(n) => Some(u64::from(*n)),
			Self::Qword(n) => Some(*n),
			Self::Word(n) => Some(u64::from(*n)),
			Self::Unicode(_) | Self::Bytes(_) => None,
		}
	}
}

pub(super) fn read_content_description(
	content: &[u8],
	tag: &mut Tag,
	parse_options: ParseOptions,
) -> Result<()> {
	let mut reader = ByteCursor::new(content);

	let mut lengths = [0; 5];
	for len in &mut lengths {
		*len = reader.read_u16::<LittleEndian>()? as usize;
	}

	for (name, len) in CONTENT_DESCRIPTION_FIELDS.into_iter().zip(lengths) {
		let bytes = reader.read_bytes(len)?;
		if bytes.is_empty() {
			continue;
		}

		match utf16le_decode(bytes) {
			Ok(text) if text.is_empty() => {},
			Ok(text) => push_field(tag, name, DescriptorValue::Unicode(text), parse_options)?,
			Err(e) => {
				if parse_options.parsing_mode == ParsingMode::Strict {
					return Err(e);
				}

				log::warn!("Content Description field {name:?} is not valid UTF-16, discarding");
			},
		}
	}

	Ok(())
}

pub(super) fn read_extended_content_description(
	content: &[u8],
	tag: &mut Tag,
	parse_options: ParseOptions,
) -> Result<()> {
	let parse_mode = parse_options.parsing_mode;
	let mut reader = ByteCursor::new(content);

	let count = reader.read_u16::<LittleEndian>()?;
	log::trace!("Reading {count} content descriptors");

	for _ in 0..count {
		let name_len = reader.read_u16::<LittleEndian>()? as usize;
		let name = reader.read_bytes(name_len)?;
		let value_type = reader.read_u16::<LittleEndian>()?;
		let value_len = reader.read_u16::<LittleEndian>()? as usize;
		let value = reader.read_bytes(value_len)?;

		let name = match utf16le_decode(name) {
			Ok(name) if !name.is_empty() => name,
			_ => {
				parse_mode_choice!(
					parse_mode,
					STRICT: decode_err!(@BAIL Asf, "Descriptor has an invalid name"),
					DEFAULT: {
						log::warn!("Descriptor has an invalid name, discarding");
						continue;
					}
				);
			},
		};

		let value = match DescriptorValue::parse(value_type, value) {
			Ok(value) => value,
			Err(e) => {
				if parse_mode == ParsingMode::Strict {
					return Err(e);
				}

				log::warn!("Failed to read descriptor {name:?}, discarding");
				continue;
			},
		};

		push_field(tag, &name, value, parse_options)?;
	}

	Ok(())
}

fn push_field(
	tag: &mut Tag,
	name: &str,
	value: DescriptorValue,
	parse_options: ParseOptions,
) -> Result<()> {
	let native_key = || ItemKey::Native(NativeKey::new(TagType::Asf, name));

	if name.eq_ignore_ascii_case(PICTURE_KEY) {
		if let (true, DescriptorValue::Bytes(bytes)) = (parse_options.read_cover_art, &value) {
			match read_picture(bytes) {
				Ok(picture) => tag.push_picture(picture),
				Err(e) => {
					if parse_options.parsing_mode == ParsingMode::Strict {
						return Err(e);
					}

					log::warn!("Failed to read \"{PICTURE_KEY}\", discarding");
				},
			}

			return Ok(());
		}

		tag.push(TagItem::new(native_key(), ItemValue::Binary(value.to_native())));
		return Ok(());
	}

	let item_key = ItemKey::from_key(TagType::Asf, name);
	match (item_key, value) {
		(ItemKey::Native(key), DescriptorValue::Unicode(text)) => {
			tag.push(TagItem::new(ItemKey::Native(key), ItemValue::Text(text)));
		},
		(ItemKey::Native(key), value) => {
			tag.push(TagItem::new(
				ItemKey::Native(key),
				ItemValue::Binary(value.to_native()),
			));
		},
		// WM/PartOfSet is usually "current/total"
		(ItemKey::DiscNumber, DescriptorValue::Unicode(text))
			if parse_options.implicit_conversions =>
		{
			match text.split_once('/') {
				Some((current, total))
					if current.trim().parse::<u32>().is_ok() && total.trim().parse::<u32>().is_ok() =>
				{
					tag.push(TagItem::from_text(ItemKey::DiscNumber, current.trim().to_owned()));
					tag.push(TagItem::from_text(ItemKey::DiscTotal, total.trim().to_owned()));
				},
				_ => {
					tag.push(TagItem::from_text(ItemKey::DiscNumber, text));
				},
			}
		},
		(item_key, DescriptorValue::Unicode(text)) => {
			tag.push(TagItem::from_text(item_key, text));
		},
		(item_key, value) => match value.number() {
			Some(number) => {
				tag.push(TagItem::from_text(item_key, number.to_string()));
			},
			// A byte array under a known name, keep it as is
			None => {
				tag.push(TagItem::new(native_key(), ItemValue::Binary(value.to_native())));
			},
		},
	}

	Ok(())
}

/// Read a `WM/Picture` value
///
/// The layout is: picture type (1), data length (4), MIME type and description (both null
/// terminated UTF-16LE), then the picture data.
fn read_picture(bytes: &[u8]) -> Result<Picture> {
	let mut reader = ByteCursor::new(bytes);

	let pic_type = PictureType::from_u8(reader.read_u8()?);
	let data_len = reader.read_u32::<LittleEndian>()? as usize;
	// Only used to find aligned terminators, the text is decoded as UTF-16LE
	let mime_type = utf16le_decode(reader.read_terminated_bytes(TextEncoding::UTF16BE))?;
	let description = utf16le_decode(reader.read_terminated_bytes(TextEncoding::UTF16BE))?;

	let Ok(data) = reader.read_bytes(data_len) else {
		err!(NotAPicture);
	};

	let mut builder = Picture::unchecked(data.to_vec()).pic_type(pic_type);
	if !mime_type.is_empty() {
		builder = builder.mime_type(MimeType::from_str(&mime_type));
	}
	if !description.is_empty() {
		builder = builder.description(description);
	}

	Ok(builder.build())
}

fn picture_bytes(picture: &Picture) -> Result<Vec<u8>> {
	let Ok(data_len) = u32::try_from(picture.data().len()) else {
		err!(TooMuchData);
	};

	let mut out = vec![picture.pic_type().as_u8()];
	out.extend(data_len.to_le_bytes());
	out.extend(utf16le_encode(picture.mime_str(), true));
	out.extend(utf16le_encode(picture.description().unwrap_or_default(), true));
	out.extend(picture.data());
	Ok(out)
}

/// The encoded bodies of the two description objects, `None` when there is nothing to store
#[derive(Debug, Default)]
pub(super) struct DescriptionObjects {
	pub(super) content_description: Option<Vec<u8>>,
	pub(super) extended_content_description: Option<Vec<u8>>,
}

pub(super) fn create_objects(tag: &Tag) -> Result<DescriptionObjects> {
	let mut fields: [Option<String>; 5] = Default::default();
	let mut descriptors: Vec<(String, DescriptorValue)> = Vec::new();

	let disc_total = tag.get_integer(&ItemKey::DiscTotal);

	for item in tag.items() {
		let value = item.value();

		if let ItemValue::Picture(picture) = value {
			descriptors.push((
				PICTURE_KEY.to_owned(),
				DescriptorValue::Bytes(picture_bytes(picture)?),
			));
			continue;
		}

		if let ItemKey::Native(native) = item.key() {
			if native.tag_type() != TagType::Asf {
				log::warn!("Skipping {native:?}, it belongs to another format");
				continue;
			}

			let value = match value {
				ItemValue::Text(text) => DescriptorValue::Unicode(text.clone()),
				ItemValue::Integer(n) => DescriptorValue::Dword(*n),
				ItemValue::Binary(bytes) => match DescriptorValue::from_native(bytes) {
					Ok(value) => value,
					Err(_) => {
						log::warn!("Skipping {:?}, its value is malformed", native.key());
						continue;
					},
				},
				ItemValue::Picture(_) => continue,
			};

			descriptors.push((native.key().to_owned(), value));
			continue;
		}

		match item.key() {
			// Folded into WM/PartOfSet
			ItemKey::DiscTotal => continue,
			ItemKey::DiscNumber => {
				let Some(current) = value.text() else {
					continue;
				};

				let text = match disc_total {
					Some(total) => format!("{current}/{total}"),
					None => current.into_owned(),
				};

				if let Some(name) = item.key().map_key(TagType::Asf) {
					descriptors.push((name.to_owned(), DescriptorValue::Unicode(text)));
				}
				continue;
			},
			_ => {},
		}

		let Some(name) = item.key().map_key(TagType::Asf) else {
			log::warn!("Skipping {:?}, it has no ASF equivalent", item.key());
			continue;
		};

		if let Some(idx) = CONTENT_DESCRIPTION_FIELDS.iter().position(|f| *f == name) {
			let Some(text) = value.text() else {
				continue;
			};

			if fields[idx].is_some() {
				log::warn!("Content Description field {name:?} holds a single value, skipping");
				continue;
			}

			fields[idx] = Some(text.into_owned());
			continue;
		}

		let value = match value {
			ItemValue::Integer(n) if name == TRACK_NUMBER_KEY => DescriptorValue::Dword(*n),
			_ => match value.text() {
				Some(text) => DescriptorValue::Unicode(text.into_owned()),
				None => {
					log::warn!("Skipping {name:?}, expected a text value");
					continue;
				},
			},
		};

		descriptors.push((name.to_owned(), value));
	}

	let mut objects = DescriptionObjects::default();

	if fields.iter().any(Option::is_some) {
		let strings = fields
			.iter()
			.map(|field| match field.as_deref() {
				Some(text) if !text.is_empty() => utf16le_encode(text, true),
				_ => Vec::new(),
			})
			.collect::<Vec<_>>();

		let mut content = Vec::new();
		for string in &strings {
			content.extend(u16_len(string.len())?.to_le_bytes());
		}
		for string in strings {
			content.extend(string);
		}

		objects.content_description = Some(content);
	}

	if !descriptors.is_empty() {
		let mut content = Vec::new();
		let mut count = 0_u16;

		for (name, value) in descriptors {
			let name_bytes = utf16le_encode(&name, true);
			let value_bytes = value.as_bytes();

			let (Ok(name_len), Ok(value_len)) = (
				u16::try_from(name_bytes.len()),
				u16::try_from(value_bytes.len()),
			) else {
				log::warn!("Descriptor {name:?} is too large to store, skipping");
				continue;
			};

			let Some(next) = count.checked_add(1) else {
				err!(TooMuchData);
			};
			count = next;

			content.extend(name_len.to_le_bytes());
			content.extend(name_bytes);
			content.extend(value.value_type().to_le_bytes());
			content.extend(value_len.to_le_bytes());
			content.extend(value_bytes);
		}

		if count > 0 {
			let mut object = count.to_le_bytes().to_vec();
			object.extend(content);
			objects.extended_content_description = Some(object);
		}
	}

	Ok(objects)
}

fn u16_len(len: usize) -> Result<u16> {
	u16::try_from(len).map_err(|_| TagError::new(ErrorKind::TooMuchData))
}

#[cfg(test)]
mod tests {
	use super::{
		DescriptorValue, create_objects, read_content_description, read_extended_content_description,
	};
	use crate::config::{ParseOptions, ParsingMode};
	use crate::picture::{MimeType, Picture, PictureType};
	use crate::tag::{Accessor, ItemKey, ItemValue, NativeKey, Tag, TagItem, TagType};
	use crate::util::text::utf16le_encode;

	fn descriptor(name: &str, value_type: u16, value: &[u8]) -> Vec<u8> {
		let name = utf16le_encode(name, true);

		let mut out = (name.len() as u16).to_le_bytes().to_vec();
		out.extend(name);
		out.extend(value_type.to_le_bytes());
		out.extend((value.len() as u16).to_le_bytes());
		out.extend(value);
		out
	}

	fn read_both(objects: &super::DescriptionObjects, options: ParseOptions) -> Tag {
		let mut tag = Tag::new();
		if let Some(content) = &objects.content_description {
			read_content_description(content, &mut tag, options).unwrap();
		}
		if let Some(content) = &objects.extended_content_description {
			read_extended_content_description(content, &mut tag, options).unwrap();
		}
		tag
	}

	#[test_log::test]
	fn content_description() {
		let title = utf16le_encode("Title", true);
		let author = utf16le_encode("Artist", true);

		let mut content = Vec::new();
		for len in [title.len(), author.len(), 0, 0, 0] {
			content.extend((len as u16).to_le_bytes());
		}
		content.extend(title);
		content.extend(author);

		let mut tag = Tag::new();
		read_content_description(&content, &mut tag, ParseOptions::new()).unwrap();

		assert_eq!(tag.title().as_deref(), Some("Title"));
		assert_eq!(tag.artist().as_deref(), Some("Artist"));
		assert_eq!(tag.len(), 2);
	}

	#[test_log::test]
	fn descriptor_types() {
		let mut content = 4_u16.to_le_bytes().to_vec();
		content.extend(descriptor("WM/AlbumTitle", 0, &utf16le_encode("Album", true)));
		content.extend(descriptor("WM/TrackNumber", 3, &7_u32.to_le_bytes()));
		content.extend(descriptor("WM/PartOfSet", 0, &utf16le_encode("1/2", true)));
		content.extend(descriptor("WM/IsVBR", 2, &1_u32.to_le_bytes()));

		let mut tag = Tag::new();
		read_extended_content_description(&content, &mut tag, ParseOptions::new()).unwrap();

		assert_eq!(tag.album().as_deref(), Some("Album"));
		assert_eq!(tag.track(), Some(7));
		assert_eq!(tag.disk(), Some(1));
		assert_eq!(tag.disk_total(), Some(2));

		let native = ItemKey::Native(NativeKey::new(TagType::Asf, "WM/IsVBR"));
		assert_eq!(
			tag.get(&native).unwrap().value(),
			&ItemValue::Binary(vec![2, 0, 1, 0, 0, 0])
		);
	}

	#[test_log::test]
	fn bad_descriptors() {
		let mut content = 2_u16.to_le_bytes().to_vec();
		// A DWORD can't be 3 bytes
		content.extend(descriptor("WM/TrackNumber", 3, &[1, 2, 3]));
		content.extend(descriptor("WM/Genre", 0, &utf16le_encode("Rock", true)));

		let mut tag = Tag::new();
		assert!(
			read_extended_content_description(
				&content,
				&mut tag,
				ParseOptions::new().parsing_mode(ParsingMode::Strict)
			)
			.is_err()
		);

		let mut tag = Tag::new();
		read_extended_content_description(&content, &mut tag, ParseOptions::new()).unwrap();
		assert_eq!(tag.genre().as_deref(), Some("Rock"));
		assert_eq!(tag.track(), None);

		// Truncated
		let mut tag = Tag::new();
		assert!(
			read_extended_content_description(&content[..10], &mut tag, ParseOptions::new())
				.is_err()
		);
	}

	#[test_log::test]
	fn write_then_read() {
		let picture = Picture::unchecked(vec![0x89, b'P', b'N', b'G', 1, 2, 3])
			.pic_type(PictureType::CoverFront)
			.mime_type(MimeType::Png)
			.description("Front")
			.build();

		let mut tag = Tag::new();
		tag.set_title(String::from("Title"));
		tag.set_artist(String::from("Artist"));
		tag.set_album(String::from("Album"));
		tag.set_track(3);
		tag.set_disk(1);
		tag.set_disk_total(2);
		tag.push_picture(picture.clone());
		tag.push(TagItem::new(
			ItemKey::Native(NativeKey::new(TagType::Asf, "WM/EncodingTime")),
			ItemValue::Binary(DescriptorValue::Qword(42).to_native()),
		));

		let objects = create_objects(&tag).unwrap();
		assert!(objects.content_description.is_some());

		let read = read_both(&objects, ParseOptions::new());
		assert_eq!(read.title().as_deref(), Some("Title"));
		assert_eq!(read.artist().as_deref(), Some("Artist"));
		assert_eq!(read.album().as_deref(), Some("Album"));
		assert_eq!(read.track(), Some(3));
		assert_eq!(read.disk(), Some(1));
		assert_eq!(read.disk_total(), Some(2));
		assert_eq!(read.pictures().next(), Some(&picture));

		let native = ItemKey::Native(NativeKey::new(TagType::Asf, "WM/EncodingTime"));
		assert_eq!(
			read.get(&native).unwrap().value(),
			&ItemValue::Binary(DescriptorValue::Qword(42).to_native())
		);
	}

	#[test_log::test]
	fn empty_tag_has_no_objects() {
		let objects = create_objects(&Tag::new()).unwrap();
		assert!(objects.content_description.is_none());
		assert!(objects.extended_content_description.is_none());

		// Natives of other formats are dropped
		let mut tag = Tag::new();
		tag.push(TagItem::new(
			ItemKey::Native(NativeKey::new(TagType::Id3v2, "PRIV")),
			ItemValue::Binary(vec![1, 2, 3]),
		));
		let objects = create_objects(&tag).unwrap();
		assert!(objects.extended_content_description.is_none());
	}

	#[test_log::test]
	fn pictures_kept_raw() {
		let mut tag = Tag::new();
		tag.push_picture(Picture::unchecked(vec![1, 2, 3]).build());

		let objects = create_objects(&tag).unwrap();
		let read = read_both(&objects, ParseOptions::new().read_cover_art(false));

		assert_eq!(read.pictures().count(), 0);
		let native = ItemKey::Native(NativeKey::new(TagType::Asf, "WM/Picture"));
		assert!(matches!(read.get(&native).unwrap().value(), ItemValue::Binary(_)));

		// And written back as it was
		assert_eq!(
			create_objects(&read).unwrap().extended_content_description,
			objects.extended_content_description
		);
	}
}
