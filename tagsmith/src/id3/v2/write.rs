use super::frame::{ENCRYPTED_FRAME_SUFFIX, EncryptedFrame, FrameFlags, is_valid_frame_id};
use super::header::{Id3v2TagFlags, Id3v2Version};
use super::util::synchsafe::{SynchsafeInteger, unsynchronise};
use super::util::upgrade::is_v4_only;
use crate::config::WriteOptions;
use crate::error::Result;
use crate::macros::err;
use crate::picture::Picture;
use crate::tag::{ItemKey, ItemValue, Tag, TagType};
use crate::util::text::TextEncoding;

use std::collections::HashMap;

// Used for COMM and USLT frames, the language is unknown
const UNKNOWN_LANGUAGE: &[u8; 3] = b"XXX";

enum PendingFrame {
	Text(Vec<String>),
	Numbering {
		number: Option<String>,
		total: Option<String>,
	},
	Language(String),
	Raw(Vec<u8>),
	Encrypted(Vec<u8>),
}

// A frame payload ready to be written
enum FrameContent {
	Plain(Vec<u8>),
	// In the `EncryptedFrame` layout
	Encrypted(Vec<u8>),
}

/// Create a complete ID3v2 tag from `tag`
///
/// `old_len` is the full size of the tag being replaced (0 if there is none). If the new tag
/// fits, it is padded to exactly that size.
///
/// Returns `None` if nothing in `tag` can be stored in ID3v2.
pub(crate) fn create_tag(tag: &Tag, options: WriteOptions, old_len: u64) -> Result<Option<Vec<u8>>> {
	let version = if options.use_id3v23 {
		Id3v2Version::V3
	} else {
		Id3v2Version::V4
	};

	let frames = collect_frames(tag, version)?;
	if frames.is_empty() {
		log::debug!("Nothing to write to the ID3v2 tag");
		return Ok(None);
	}

	let unsynchronise_frames = options.id3v2_unsynchronisation && version == Id3v2Version::V4;

	let mut body = Vec::new();
	for (id, content) in frames {
		match content {
			FrameContent::Plain(content) => {
				write_frame(&mut body, &id, content, version, unsynchronise_frames)?
			},
			FrameContent::Encrypted(stored) => write_encrypted_frame(&mut body, &id, &stored, version)?,
		}
	}

	if options.id3v2_unsynchronisation && version == Id3v2Version::V3 {
		body = unsynchronise(&body);
	}

	let old_capacity = old_len.saturating_sub(10);
	let padding = if old_len > 0 && body.len() as u64 <= old_capacity {
		log::debug!("Reusing the space of the existing {old_len} byte ID3v2 tag");
		(old_capacity - body.len() as u64) as usize
	} else {
		options.preferred_padding.unwrap_or(0) as usize
	};

	body.resize(body.len() + padding, 0);

	let Ok(size) = u32::try_from(body.len()) else {
		err!(TooMuchData);
	};

	let flags = Id3v2TagFlags {
		unsynchronisation: options.id3v2_unsynchronisation,
		..Id3v2TagFlags::default()
	};

	let mut tag_bytes = Vec::with_capacity(body.len() + 10);
	tag_bytes.extend(b"ID3");
	tag_bytes.extend([version.major(), 0, flags.as_byte()]);
	tag_bytes.extend(size.synch()?.to_be_bytes());
	tag_bytes.extend(body);

	Ok(Some(tag_bytes))
}

// Group the tag items into frames, in the order each frame ID first appears
fn collect_frames(tag: &Tag, version: Id3v2Version) -> Result<Vec<(String, FrameContent)>> {
	let mut pending: Vec<(String, PendingFrame)> = Vec::new();
	let mut grouped: HashMap<String, usize> = HashMap::new();

	for item in tag.items() {
		let key = item.key();

		if let ItemValue::Picture(picture) = item.value() {
			pending.push((
				String::from("APIC"),
				PendingFrame::Raw(encode_picture(picture, version)?),
			));
			continue;
		}

		if let ItemKey::Native(native) = key {
			if native.tag_type() != TagType::Id3v2 {
				log::warn!(
					"Skipping {} item {:?}, it has no ID3v2 equivalent",
					native.tag_type(),
					native.key()
				);
				continue;
			}

			let (key, encrypted) = match native.key().strip_suffix(ENCRYPTED_FRAME_SUFFIX) {
				Some(id) => (id, true),
				None => (native.key(), false),
			};

			let id = downgrade_id(key, version);
			if id.len() == 3 && is_valid_frame_id(id.as_bytes()) {
				log::warn!("Skipping ID3v2.2 frame {:?}, it has no ID3v2.4 equivalent", id);
				continue;
			}

			if id.len() != 4 || !is_valid_frame_id(id.as_bytes()) {
				log::warn!("Skipping item with an invalid frame ID: {:?}", id);
				continue;
			}

			if version == Id3v2Version::V3 && is_v4_only(&id) {
				log::warn!("Skipping frame {:?}, it does not exist in ID3v2.3", id);
				continue;
			}

			match item.value() {
				ItemValue::Binary(content) if encrypted => {
					pending.push((id, PendingFrame::Encrypted(content.clone())))
				},
				ItemValue::Binary(content) => pending.push((id, PendingFrame::Raw(content.clone()))),
				ItemValue::Text(text) if !encrypted && id.starts_with('T') && id != "TXXX" => {
					push_text(&mut pending, &mut grouped, id, text.clone())
				},
				_ => log::warn!("Skipping frame {:?}, expected binary content", id),
			}

			continue;
		}

		let frame_id = match key {
			ItemKey::TrackNumber | ItemKey::TrackTotal => "TRCK",
			ItemKey::DiscNumber | ItemKey::DiscTotal => "TPOS",
			_ => match key.map_key(TagType::Id3v2) {
				Some(id) => id,
				None => {
					log::warn!("Skipping {:?}, it has no ID3v2 equivalent", key);
					continue;
				},
			},
		};

		let frame_id = downgrade_id(frame_id, version);
		if version == Id3v2Version::V3 && is_v4_only(&frame_id) {
			log::warn!("Skipping frame {:?}, it does not exist in ID3v2.3", frame_id);
			continue;
		}

		let Some(text) = item.value().text() else {
			log::warn!("Skipping {:?}, expected a text value", key);
			continue;
		};

		match key {
			ItemKey::TrackNumber | ItemKey::TrackTotal | ItemKey::DiscNumber | ItemKey::DiscTotal => {
				let pos = *grouped.entry(frame_id.clone()).or_insert_with(|| {
					pending.push((
						frame_id,
						PendingFrame::Numbering {
							number: None,
							total: None,
						},
					));
					pending.len() - 1
				});

				if let PendingFrame::Numbering { number, total } = &mut pending[pos].1 {
					let slot = if matches!(key, ItemKey::TrackNumber | ItemKey::DiscNumber) {
						number
					} else {
						total
					};

					if slot.is_some() {
						log::warn!("Multiple values for {:?}, only the first is written", key);
					} else {
						*slot = Some(text.into_owned());
					}
				}
			},
			ItemKey::Comment | ItemKey::Lyrics => {
				if grouped.contains_key(&frame_id) {
					log::warn!("Multiple values for {:?}, only the first is written", key);
					continue;
				}

				grouped.insert(frame_id.clone(), pending.len());
				pending.push((frame_id, PendingFrame::Language(text.into_owned())));
			},
			// TYER only holds the year
			_ if frame_id == "TYER" => {
				let year = text.chars().take(4).collect();
				push_text(&mut pending, &mut grouped, frame_id, year)
			},
			_ => push_text(&mut pending, &mut grouped, frame_id, text.into_owned()),
		}
	}

	pending
		.into_iter()
		.map(|(id, frame)| {
			let content = match frame {
				PendingFrame::Text(values) => encode_text(&values, version)?,
				PendingFrame::Numbering { number, total } => {
					let value = match (number, total) {
						(Some(number), Some(total)) => format!("{number}/{total}"),
						(Some(number), None) => number,
						(None, Some(total)) => format!("0/{total}"),
						(None, None) => String::new(),
					};

					encode_text(&[value], version)?
				},
				PendingFrame::Language(text) => encode_language_frame(&text, version)?,
				PendingFrame::Raw(content) => content,
				PendingFrame::Encrypted(stored) => return Ok((id, FrameContent::Encrypted(stored))),
			};

			Ok((id, FrameContent::Plain(content)))
		})
		.collect()
}

fn push_text(
	pending: &mut Vec<(String, PendingFrame)>,
	grouped: &mut HashMap<String, usize>,
	id: String,
	text: String,
) {
	match grouped.get(&id) {
		Some(&pos) => {
			if let PendingFrame::Text(values) = &mut pending[pos].1 {
				values.push(text);
			}
		},
		None => {
			grouped.insert(id.clone(), pending.len());
			pending.push((id, PendingFrame::Text(vec![text])));
		},
	}
}

// ID3v2.3 predates the timestamp frames
fn downgrade_id(id: &str, version: Id3v2Version) -> String {
	match (id, version) {
		("TDRC", Id3v2Version::V3) => String::from("TYER"),
		("TDOR", Id3v2Version::V3) => String::from("TORY"),
		("TIPL", Id3v2Version::V3) => String::from("IPLS"),
		_ => id.to_owned(),
	}
}

fn pick_encoding<'a>(texts: impl IntoIterator<Item = &'a str>, version: Id3v2Version) -> TextEncoding {
	if texts.into_iter().all(TextEncoding::verify_latin1) {
		return TextEncoding::Latin1;
	}

	match version {
		Id3v2Version::V4 => TextEncoding::UTF8,
		_ => TextEncoding::UTF16,
	}
}

fn encode_text(values: &[String], version: Id3v2Version) -> Result<Vec<u8>> {
	// ID3v2.4 separates multiple values with a null, older versions have no concept of it
	let text = match version {
		Id3v2Version::V4 => values.join("\0"),
		_ => values.join("/"),
	};

	let encoding = pick_encoding([text.as_str()], version);

	let mut content = vec![encoding as u8];
	content.extend(encoding.encode(&text, false, false)?);
	Ok(content)
}

fn encode_language_frame(text: &str, version: Id3v2Version) -> Result<Vec<u8>> {
	let encoding = pick_encoding([text], version);

	let mut content = vec![encoding as u8];
	content.extend(UNKNOWN_LANGUAGE);
	// Empty description
	content.extend(encoding.encode("", true, false)?);
	content.extend(encoding.encode(text, false, false)?);
	Ok(content)
}

fn encode_picture(picture: &Picture, version: Id3v2Version) -> Result<Vec<u8>> {
	let description = picture.description().unwrap_or_default();
	let encoding = pick_encoding([description], version);

	let mut content = vec![encoding as u8];
	content.extend(TextEncoding::Latin1.encode(picture.mime_str(), true, true)?);
	content.push(picture.pic_type().as_u8());
	content.extend(encoding.encode(description, true, false)?);
	content.extend(picture.data());
	Ok(content)
}

fn write_frame(
	out: &mut Vec<u8>,
	id: &str,
	content: Vec<u8>,
	version: Id3v2Version,
	unsynchronise_frame: bool,
) -> Result<()> {
	log::trace!("Writing frame {:?}, {} bytes", id, content.len());

	let mut flags = FrameFlags::default();
	let content = if unsynchronise_frame {
		flags.unsynchronisation = true;
		flags.data_length_indicator = true;

		let Ok(data_length) = u32::try_from(content.len()) else {
			err!(TooMuchData);
		};

		let mut unsynchronised = data_length.synch()?.to_be_bytes().to_vec();
		unsynchronised.extend(unsynchronise(&content));
		unsynchronised
	} else {
		content
	};

	write_header(out, id, content.len(), flags, version)?;
	out.extend(content);
	Ok(())
}

// Encrypted payloads are written untouched, with their flag data rebuilt for `version`
fn write_encrypted_frame(
	out: &mut Vec<u8>,
	id: &str,
	stored: &[u8],
	version: Id3v2Version,
) -> Result<()> {
	let Some(frame) = EncryptedFrame::parse(stored) else {
		log::warn!("Skipping encrypted frame {:?}, its stored content is malformed", id);
		return Ok(());
	};

	log::trace!("Writing encrypted frame {:?}, {} bytes", id, frame.payload.len());

	let mut flags = FrameFlags {
		encryption: true,
		compression: frame.compressed,
		..FrameFlags::default()
	};

	let mut flag_data = Vec::with_capacity(5);
	match version {
		Id3v2Version::V4 => {
			flag_data.push(frame.method);
			if let Some(length) = frame.data_length {
				flags.data_length_indicator = true;
				flag_data.extend(length.synch()?.to_be_bytes());
			}
		},
		_ => {
			// The decompressed size comes first in ID3v2.3, and is required
			if frame.compressed {
				let Some(length) = frame.data_length else {
					log::warn!(
						"Skipping encrypted frame {:?}, ID3v2.3 needs its decompressed size",
						id
					);
					return Ok(());
				};
				flag_data.extend(length.to_be_bytes());
			}
			flag_data.push(frame.method);
		},
	}

	write_header(out, id, flag_data.len() + frame.payload.len(), flags, version)?;
	out.extend(flag_data);
	out.extend(frame.payload);
	Ok(())
}

fn write_header(
	out: &mut Vec<u8>,
	id: &str,
	content_len: usize,
	flags: FrameFlags,
	version: Id3v2Version,
) -> Result<()> {
	let Ok(size) = u32::try_from(content_len) else {
		err!(TooMuchData);
	};

	out.extend(id.as_bytes());
	match version {
		Id3v2Version::V4 => {
			out.extend(size.synch()?.to_be_bytes());
			out.extend(flags.as_id3v24_bytes().to_be_bytes());
		},
		_ => {
			out.extend(size.to_be_bytes());
			out.extend(flags.as_id3v23_bytes().to_be_bytes());
		},
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::create_tag;
	use crate::config::{ParseOptions, WriteOptions};
	use crate::id3::v2::header::Id3v2Header;
	use crate::id3::v2::read::parse_id3v2;
	use crate::id3::v2::util::synchsafe::SynchsafeInteger;
	use crate::tag::{Accessor, ItemKey, ItemValue, NativeKey, Tag, TagItem, TagType};

	fn text(key: ItemKey, value: &str) -> TagItem {
		TagItem::new(key, ItemValue::Text(value.to_owned()))
	}

	fn reparse(bytes: &[u8]) -> Tag {
		let header = Id3v2Header::parse(bytes[..10].try_into().unwrap())
			.unwrap()
			.unwrap();
		parse_id3v2(&bytes[10..], header, ParseOptions::new()).unwrap()
	}

	fn body_without_padding(bytes: &[u8]) -> &[u8] {
		let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |pos| pos + 1);
		&bytes[10..end]
	}

	#[test_log::test]
	fn v4_frames() {
		let mut tag = Tag::new();
		tag.push(text(ItemKey::TrackTitle, "Title"));
		tag.push(text(ItemKey::TrackArtist, "Foo"));
		tag.set_track(3);
		tag.push(text(ItemKey::TrackArtist, "Bär"));
		tag.set_track_total(12);
		tag.set_year(2024);

		let bytes = create_tag(&tag, WriteOptions::new().preferred_padding(0), 0)
			.unwrap()
			.unwrap();

		let mut expected = b"TIT2\x00\x00\x00\x06\x00\x00\x00Title".to_vec();
		expected.extend(b"TPE1\x00\x00\x00\x08\x00\x00\x00Foo\0B\xE4r");
		expected.extend(b"TRCK\x00\x00\x00\x05\x00\x00\x003/12");
		expected.extend(b"TDRC\x00\x00\x00\x05\x00\x00\x002024");
		assert_eq!(&bytes[..10], b"ID3\x04\x00\x00\x00\x00\x00\x40");
		assert_eq!(&bytes[10..], expected);

		let reread = reparse(&bytes);
		assert_eq!(
			reread.get_strings(&ItemKey::TrackArtist).collect::<Vec<_>>(),
			["Foo", "Bär"]
		);
		assert_eq!(reread.track(), Some(3));
		assert_eq!(reread.track_total(), Some(12));
		assert_eq!(reread.year(), Some(2024));
	}

	#[test_log::test]
	fn v3_frames() {
		let mut tag = Tag::new();
		tag.push(text(ItemKey::TrackTitle, "Ωmega"));
		tag.set_year(1999);
		tag.push(text(ItemKey::Mood, "Calm"));

		let options = WriteOptions::new().use_id3v23(true).preferred_padding(0);
		let bytes = create_tag(&tag, options, 0).unwrap().unwrap();

		assert_eq!(bytes[3], 3);
		let body = body_without_padding(&bytes);
		// UTF-16 with a BOM, no UTF-8 in ID3v2.3
		assert!(body.starts_with(b"TIT2\x00\x00\x00\x0D\x00\x00\x01\xFF\xFE\xA9\x03"));
		assert!(body.windows(4).any(|w| w == b"TYER"));
		assert!(!body.windows(4).any(|w| w == b"TMOO"));

		let reread = reparse(&bytes);
		assert_eq!(reread.title().as_deref(), Some("Ωmega"));
		assert_eq!(reread.year(), Some(1999));
	}

	#[test_log::test]
	fn padding() {
		let mut tag = Tag::new();
		tag.set_title(String::from("Title"));

		// No old tag, preferred padding
		let bytes = create_tag(&tag, WriteOptions::new(), 0).unwrap().unwrap();
		assert_eq!(bytes.len(), 10 + 16 + 1024);

		// The old tag has room
		let bytes = create_tag(&tag, WriteOptions::new(), 500).unwrap().unwrap();
		assert_eq!(bytes.len(), 500);

		// The old tag is too small
		let bytes = create_tag(&tag, WriteOptions::new().preferred_padding(0), 12)
			.unwrap()
			.unwrap();
		assert_eq!(bytes.len(), 26);
	}

	#[test_log::test]
	fn unsynchronised_frames() {
		let mut tag = Tag::new();
		tag.set_title(String::from("\u{ff}\u{ff}"));

		let options = WriteOptions::new()
			.id3v2_unsynchronisation(true)
			.preferred_padding(0);
		let bytes = create_tag(&tag, options, 0).unwrap().unwrap();

		// Header flag, frame flags, data length indicator
		assert_eq!(bytes[5], 0x80);
		assert_eq!(&bytes[18..20], [0x00, 0x03]);
		assert_eq!(&bytes[20..24], [0x00, 0x00, 0x00, 0x03]);
		assert_eq!(&bytes[24..], [0x00, 0xFF, 0x00, 0xFF, 0x00]);

		assert_eq!(reparse(&bytes).title().as_deref(), Some("\u{ff}\u{ff}"));

		// ID3v2.3, the whole body is unsynchronised
		let bytes = create_tag(&tag, options.use_id3v23(true), 0)
			.unwrap()
			.unwrap();
		assert_eq!(bytes[5], 0x80);
		assert_eq!(reparse(&bytes).title().as_deref(), Some("\u{ff}\u{ff}"));
	}

	#[test_log::test]
	fn natives_and_skips() {
		let mut tag = Tag::new();
		tag.push(TagItem::new(
			ItemKey::Native(NativeKey::new(TagType::Id3v2, "PRIV")),
			ItemValue::Binary(b"owner\0data".to_vec()),
		));
		tag.push(TagItem::new(
			ItemKey::Native(NativeKey::new(TagType::VorbisComments, "CUSTOM")),
			ItemValue::Text(String::from("not ID3v2")),
		));
		tag.push(text(ItemKey::Comment, "First"));
		tag.push(text(ItemKey::Comment, "Second"));

		let bytes = create_tag(&tag, WriteOptions::new().preferred_padding(0), 0)
			.unwrap()
			.unwrap();

		let mut expected = b"PRIV\x00\x00\x00\x0A\x00\x00owner\0data".to_vec();
		expected.extend(b"COMM\x00\x00\x00\x0A\x00\x00\x00XXX\0First");
		assert_eq!(&bytes[10..], expected);
	}

	fn tag_bytes(major: u8, body: &[u8]) -> Vec<u8> {
		let mut bytes = vec![b'I', b'D', b'3', major, 0, 0];
		bytes.extend((body.len() as u32).synch().unwrap().to_be_bytes());
		bytes.extend(body);
		bytes
	}

	#[test_log::test]
	fn encrypted_frames_are_rewritten() {
		// Encryption flag, method byte
		let mut body = b"TIT2\x00\x00\x00\x06\x00\x00\x00Title".to_vec();
		body.extend(b"XENC\x00\x00\x00\x05\x00\x04\x80ABCD");
		let tag = reparse(&tag_bytes(4, &body));

		let key = ItemKey::Native(NativeKey::new(TagType::Id3v2, "XENC:encrypted"));
		assert_eq!(
			tag.get(&key).map(TagItem::value),
			Some(&ItemValue::Binary(b"\x80\x00ABCD".to_vec()))
		);

		let bytes = create_tag(&tag, WriteOptions::new().preferred_padding(0), 0)
			.unwrap()
			.unwrap();
		assert_eq!(&bytes[10..], body);

		// ID3v2.3 flag layout
		let options = WriteOptions::new().use_id3v23(true).preferred_padding(0);
		let bytes = create_tag(&tag, options, 0).unwrap().unwrap();
		assert!(
			body_without_padding(&bytes)
				.ends_with(b"XENC\x00\x00\x00\x05\x00\x40\x80ABCD")
		);
		assert_eq!(reparse(&bytes).get(&key), tag.get(&key));
	}

	#[test_log::test]
	fn existing_tag_is_rewritten_unchanged() {
		let mut body = b"TIT2\x00\x00\x00\x06\x00\x00\x00Title".to_vec();
		body.extend(b"PRIV\x00\x00\x00\x0A\x00\x00owner\0data");
		body.extend(b"WOAR\x00\x00\x00\x13\x00\x00http://example.com/");
		body.extend(b"XENC\x00\x00\x00\x05\x00\x04\x80ABCD");
		body.extend([0; 16]);

		let original = tag_bytes(4, &body);
		let tag = reparse(&original);

		let bytes = create_tag(&tag, WriteOptions::new(), original.len() as u64)
			.unwrap()
			.unwrap();
		assert_eq!(bytes, original);
	}

	#[test_log::test]
	fn v2_url_frames_are_upgraded() {
		let mut body = b"TT2\x00\x00\x06\x00Title".to_vec();
		body.extend(b"WAR\x00\x00\x13http://example.com/");
		// No ID3v2.4 equivalent
		body.extend(b"CRM\x00\x00\x02ab");
		let tag = reparse(&tag_bytes(2, &body));

		let bytes = create_tag(&tag, WriteOptions::new().preferred_padding(0), 0)
			.unwrap()
			.unwrap();

		let mut expected = b"TIT2\x00\x00\x00\x06\x00\x00\x00Title".to_vec();
		expected.extend(b"WOAR\x00\x00\x00\x13\x00\x00http://example.com/");
		assert_eq!(&bytes[10..], expected);
	}

	#[test_log::test]
	fn nothing_to_write() {
		let mut tag = Tag::new();
		tag.push(TagItem::new(
			ItemKey::Native(NativeKey::new(TagType::Mp4Ilst, "----:com.foo:BAR")),
			ItemValue::Text(String::from("value")),
		));

		assert!(create_tag(&tag, WriteOptions::new(), 100).unwrap().is_none());
	}
}
