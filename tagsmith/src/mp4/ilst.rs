//! Conversion between `ilst` atoms and [`Tag`]s
//!
//! Every child of `ilst` is an item, holding one or more `data` atoms:
//!
//! ```text
//! size (4) | "data" | type set (1) | type code (3) | locale (4) | payload
//! ```
//!
//! Freeform items (`----`) are identified by a `mean` and `name` atom instead of their fourcc,
//! and are keyed as `----:mean:name`.

use super::atom::{ATOM_HEADER_LEN, AtomInfo, ident_str};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::id3::v1::constants::GENRES;
use crate::macros::err;
use crate::picture::{MimeType, Picture, PictureType};
use crate::tag::{ItemKey, ItemValue, NativeKey, Tag, TagItem, TagType};
use crate::util::cursor::ByteCursor;
use crate::util::text::{utf8_decode, utf16_decode_bytes};

use byteorder::{BigEndian, WriteBytesExt};

const FREEFORM: [u8; 4] = *b"----";

// Well known data types
const RESERVED: u32 = 0;
const UTF8: u32 = 1;
const UTF16: u32 = 2;
const GIF: u32 = 12;
const JPEG: u32 = 13;
const PNG: u32 = 14;
const BE_SIGNED_INTEGER: u32 = 21;
const BE_UNSIGNED_INTEGER: u32 = 22;
const BMP: u32 = 27;

/// The payload of a `data` atom
struct DataAtom<'a> {
	code: u32,
	payload: &'a [u8],
}

fn native_key(key: &str) -> ItemKey {
	ItemKey::Native(NativeKey::new(TagType::Mp4Ilst, key))
}

/// Decode the content of an `ilst` atom
pub(super) fn parse_ilst(content: &[u8], parse_options: ParseOptions) -> Result<Tag> {
	let parse_mode = parse_options.parsing_mode;

	let mut tag = Tag::new();
	let mut upgraded_genres = Vec::new();

	let mut cursor = ByteCursor::new(content);
	while cursor.remaining() as u64 >= ATOM_HEADER_LEN {
		let start = cursor.position() as u64;
		let remaining = cursor.remaining() as u64;
		let Some(info) = AtomInfo::read(&mut cursor, start, remaining, parse_mode)? else {
			break;
		};

		let body = cursor.read_bytes((info.len - info.header_len()) as usize)?;

		match &info.ident {
			b"free" | b"skip" => {},
			// Numeric genres, replaced by `©gen` when possible
			b"gnre" if parse_options.implicit_conversions => {
				log::warn!("Encountered outdated \"gnre\" atom, attempting to upgrade to \"\u{a9}gen\"");

				let Some(data) = data_atoms(body, parse_mode)? else {
					continue;
				};

				for atom in data {
					let index = atom
						.payload
						.get(..2)
						.map_or(0, |b| usize::from(u16::from_be_bytes([b[0], b[1]])));

					if index > 0 && index <= GENRES.len() {
						upgraded_genres.push(GENRES[index - 1]);
					}
				}
			},
			_ => parse_item(&info.ident, body, parse_options, &mut tag)?,
		}
	}

	if !upgraded_genres.is_empty() {
		if tag.get(&ItemKey::Genre).is_some() {
			log::warn!("Encountered \"\u{a9}gen\" atom, discarding upgraded \"gnre\" atom(s)");
		} else {
			for genre in upgraded_genres {
				tag.push(TagItem::new(ItemKey::Genre, ItemValue::Text(genre.to_owned())));
			}
		}
	}

	Ok(tag)
}

fn parse_item(ident: &[u8; 4], body: &[u8], parse_options: ParseOptions, tag: &mut Tag) -> Result<()> {
	let parse_mode = parse_options.parsing_mode;

	let (key, data_start) = if ident == &FREEFORM {
		let mut cursor = ByteCursor::new(body);
		let mean = freeform_chunk(&mut cursor, b"mean", parse_mode)?;
		let name = freeform_chunk(&mut cursor, b"name", parse_mode)?;

		match (mean, name) {
			(Some(mean), Some(name)) => (format!("----:{mean}:{name}"), cursor.position()),
			_ => {
				log::warn!("Keeping a freeform atom with a bad identifier as raw data");
				push_raw(tag, String::from("----"), body);
				return Ok(());
			},
		}
	} else {
		(ident_str(ident), 0)
	};

	let Some(data) = data_atoms(&body[data_start..], parse_mode)? else {
		push_raw(tag, key, body);
		return Ok(());
	};

	let decoded = match ident {
		b"covr" if parse_options.read_cover_art => pictures(&data, parse_mode)?,
		b"covr" => None,
		b"trkn" => numbering(&data, ItemKey::TrackNumber, ItemKey::TrackTotal),
		b"disk" => numbering(&data, ItemKey::DiscNumber, ItemKey::DiscTotal),
		b"tmpo" => integer(&data, ItemKey::Bpm),
		b"cpil" => integer(&data, ItemKey::Compilation),
		_ => text(&data, ItemKey::from_key(TagType::Mp4Ilst, &key), parse_mode)?,
	};

	match decoded {
		Some(items) => {
			for item in items {
				tag.push_unchecked(item);
			}
		},
		None => {
			log::debug!("Keeping atom \"{key}\" as raw data");
			push_raw(tag, key, body);
		},
	}

	Ok(())
}

fn push_raw(tag: &mut Tag, key: String, body: &[u8]) {
	tag.push_unchecked(TagItem::new(
		native_key(&key),
		ItemValue::Binary(body.to_vec()),
	));
}

// Freeform identifiers are made of two full atoms, `mean` and `name`
fn freeform_chunk(
	cursor: &mut ByteCursor<'_>,
	expected: &[u8; 4],
	parse_mode: ParsingMode,
) -> Result<Option<String>> {
	if (cursor.remaining() as u64) < ATOM_HEADER_LEN + 4 {
		if parse_mode == ParsingMode::Strict {
			err!(BadAtom("Found an incomplete freeform identifier"));
		}

		return Ok(None);
	}

	let start = cursor.position() as u64;
	let remaining = cursor.remaining() as u64;
	let Some(info) = AtomInfo::read(cursor, start, remaining, parse_mode)? else {
		return Ok(None);
	};

	if &info.ident != expected || info.len < ATOM_HEADER_LEN + 4 {
		if parse_mode == ParsingMode::Strict {
			err!(BadAtom(
				"Found freeform identifier \"----\" with no trailing \"mean\" or \"name\" atoms"
			));
		}

		return Ok(None);
	}

	let content = cursor.read_bytes((info.len - info.header_len()) as usize)?;

	// Version (1) and flags (3)
	match utf8_decode(content.get(4..).unwrap_or_default().to_vec()) {
		Ok(text) => Ok(Some(text)),
		Err(_) if parse_mode != ParsingMode::Strict => Ok(None),
		Err(_) => err!(BadAtom(
			"Found a non UTF-8 string while reading freeform identifier"
		)),
	}
}

/// Split an item's body into its `data` atoms
///
/// Returns `None` if the body holds no usable data atoms.
fn data_atoms(body: &[u8], parse_mode: ParsingMode) -> Result<Option<Vec<DataAtom<'_>>>> {
	let mut ret = Vec::new();

	let mut cursor = ByteCursor::new(body);
	while !cursor.is_empty() {
		let start = cursor.position() as u64;
		if (cursor.remaining() as u64) < ATOM_HEADER_LEN {
			if parse_mode == ParsingMode::Strict {
				err!(BadAtom("Found trailing bytes after the last data atom"));
			}

			return Ok(None);
		}

		let remaining = cursor.remaining() as u64;
		let Some(info) = AtomInfo::read(&mut cursor, start, remaining, parse_mode)? else {
			return Ok(None);
		};

		let content = cursor.read_bytes((info.len - info.header_len()) as usize)?;

		if &info.ident != b"data" {
			if parse_mode == ParsingMode::Strict {
				err!(BadAtom("Expected atom \"data\" to follow name"));
			}

			log::warn!(
				"Found unexpected atom \"{}\", expected \"data\"",
				ident_str(&info.ident)
			);
			return Ok(None);
		}

		if content.len() < 8 {
			if parse_mode == ParsingMode::Strict {
				err!(BadAtom("Data atom is too small"));
			}

			log::warn!("Expected data atom to be at least 16 bytes, got {}", info.len);
			return Ok(None);
		}

		let mut content = ByteCursor::new(content);
		let type_indicator = content.read_u32::<BigEndian>()?;

		// The first byte is the type set, only the well known set is supported
		if type_indicator >> 24 != 0 {
			if parse_mode == ParsingMode::Strict {
				err!(BadAtom("Unknown type set in data atom"));
			}

			return Ok(None);
		}

		// We don't care about the locale
		content.skip(4)?;

		ret.push(DataAtom {
			code: type_indicator & 0x00FF_FFFF,
			payload: content.read_rest(),
		});
	}

	if ret.is_empty() {
		return Ok(None);
	}

	Ok(Some(ret))
}

fn text(data: &[DataAtom<'_>], key: ItemKey, parse_mode: ParsingMode) -> Result<Option<Vec<TagItem>>> {
	let mut items = Vec::with_capacity(data.len());

	for atom in data {
		let decoded = match atom.code {
			UTF8 => utf8_decode(atom.payload.to_vec()),
			UTF16 => utf16_decode_bytes::<BigEndian>(atom.payload),
			_ => return Ok(None),
		};

		match decoded {
			Ok(text) => items.push(TagItem::from_text(key.clone(), text)),
			Err(e) => {
				if parse_mode == ParsingMode::Strict {
					return Err(e);
				}

				log::warn!("Unable to decode text atom: {e}");
				return Ok(None);
			},
		}
	}

	Ok(Some(items))
}

fn parse_uint(bytes: &[u8]) -> Option<u32> {
	Some(match bytes.len() {
		1 => u32::from(bytes[0]),
		2 => u32::from(u16::from_be_bytes([bytes[0], bytes[1]])),
		3 => u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
		4 => u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
		_ => return None,
	})
}

fn integer(data: &[DataAtom<'_>], key: ItemKey) -> Option<Vec<TagItem>> {
	let [atom] = data else {
		return None;
	};

	match atom.code {
		RESERVED | BE_SIGNED_INTEGER | BE_UNSIGNED_INTEGER => {
			let value = parse_uint(atom.payload)?;
			Some(vec![TagItem::new(key, ItemValue::Integer(value))])
		},
		_ => None,
	}
}

// `trkn` and `disk`: 2 reserved bytes, the number, and the total, each a BE u16
fn numbering(data: &[DataAtom<'_>], number_key: ItemKey, total_key: ItemKey) -> Option<Vec<TagItem>> {
	let [atom] = data else {
		return None;
	};

	if atom.code != RESERVED || atom.payload.len() < 6 {
		return None;
	}

	let number = u16::from_be_bytes([atom.payload[2], atom.payload[3]]);
	let total = u16::from_be_bytes([atom.payload[4], atom.payload[5]]);

	let mut items = Vec::new();
	if number > 0 {
		items.push(TagItem::new(number_key, ItemValue::Integer(u32::from(number))));
	}

	if total > 0 {
		items.push(TagItem::new(total_key, ItemValue::Integer(u32::from(total))));
	}

	Some(items)
}

fn pictures(data: &[DataAtom<'_>], parse_mode: ParsingMode) -> Result<Option<Vec<TagItem>>> {
	let mut items = Vec::with_capacity(data.len());

	for atom in data {
		let mime_type = match atom.code {
			// Type 0 is implicit
			RESERVED => Picture::mimetype_from_bin(atom.payload).ok(),
			GIF => Some(MimeType::Gif),
			JPEG => Some(MimeType::Jpeg),
			PNG => Some(MimeType::Png),
			BMP => Some(MimeType::Bmp),
			code => {
				if parse_mode == ParsingMode::Strict {
					err!(BadAtom("\"covr\" atom has an unknown type"));
				}

				log::warn!("Encountered \"covr\" atom with an unknown type of `{code}`");
				return Ok(None);
			},
		};

		let mut picture = Picture::unchecked(atom.payload.to_vec()).pic_type(PictureType::Other);
		if let Some(mime_type) = mime_type {
			picture = picture.mime_type(mime_type);
		}

		items.push(TagItem::new(
			ItemKey::Artwork,
			ItemValue::Picture(picture.build()),
		));
	}

	Ok(Some(items))
}

/// The identifier of an item atom
#[derive(Clone, Debug, PartialEq, Eq)]
enum Ident {
	Fourcc([u8; 4]),
	Freeform { mean: String, name: String },
}

impl Ident {
	fn from_key(key: &str) -> Option<Self> {
		if let Some(freeform) = key.strip_prefix("----:") {
			let (mean, name) = freeform.split_once(':')?;
			return Some(Ident::Freeform {
				mean: mean.to_owned(),
				name: name.to_owned(),
			});
		}

		let mut fourcc = [0; 4];
		let mut chars = key.chars();
		for b in &mut fourcc {
			let c = u32::from(chars.next()?);
			*b = u8::try_from(c).ok()?;
		}

		if chars.next().is_some() {
			return None;
		}

		Some(Ident::Fourcc(fourcc))
	}
}

enum Entry {
	Data { ident: Ident, values: Vec<(u32, Vec<u8>)> },
	Raw { ident: [u8; 4], body: Vec<u8> },
}

#[derive(Default)]
struct IlstBuilder {
	entries: Vec<Entry>,
}

impl IlstBuilder {
	fn push_data(&mut self, ident: Ident, code: u32, payload: Vec<u8>) {
		for entry in &mut self.entries {
			if let Entry::Data { ident: existing, values } = entry {
				if *existing == ident {
					values.push((code, payload));
					return;
				}
			}
		}

		self.entries.push(Entry::Data {
			ident,
			values: vec![(code, payload)],
		});
	}

	fn contains(&self, fourcc: &[u8; 4]) -> bool {
		self.entries.iter().any(|e| match e {
			Entry::Data {
				ident: Ident::Fourcc(ident),
				..
			} => ident == fourcc,
			_ => false,
		})
	}

	fn build(self) -> Result<Vec<u8>> {
		let mut ilst = Vec::new();

		for entry in self.entries {
			let (ident, body) = match entry {
				Entry::Raw { ident, body } => (ident, body),
				Entry::Data { ident, values } => {
					let mut body = Vec::new();

					let ident = match ident {
						Ident::Fourcc(fourcc) => fourcc,
						Ident::Freeform { mean, name } => {
							write_full_atom(&mut body, b"mean", mean.as_bytes())?;
							write_full_atom(&mut body, b"name", name.as_bytes())?;
							FREEFORM
						},
					};

					for (code, payload) in values {
						body.write_u32::<BigEndian>((payload.len() as u64 + ATOM_HEADER_LEN + 8) as u32)?;
						body.extend_from_slice(b"data");
						body.write_u32::<BigEndian>(code)?;
						// Locale
						body.write_u32::<BigEndian>(0)?;
						body.extend_from_slice(&payload);
					}

					(ident, body)
				},
			};

			let Ok(len) = u32::try_from(body.len() as u64 + ATOM_HEADER_LEN) else {
				err!(TooMuchData);
			};

			ilst.write_u32::<BigEndian>(len)?;
			ilst.extend_from_slice(&ident);
			ilst.extend_from_slice(&body);
		}

		Ok(ilst)
	}
}

fn write_full_atom(out: &mut Vec<u8>, ident: &[u8; 4], content: &[u8]) -> Result<()> {
	out.write_u32::<BigEndian>((content.len() as u64 + ATOM_HEADER_LEN + 4) as u32)?;
	out.extend_from_slice(ident);
	// Version and flags
	out.write_u32::<BigEndian>(0)?;
	out.extend_from_slice(content);
	Ok(())
}

fn picture_code(picture: &Picture) -> Option<u32> {
	match picture.mime_type() {
		None => Some(RESERVED),
		Some(MimeType::Jpeg) => Some(JPEG),
		Some(MimeType::Png) => Some(PNG),
		Some(MimeType::Bmp) => Some(BMP),
		Some(MimeType::Gif) => Some(GIF),
		Some(_) => None,
	}
}

// Integers are stored in the smallest of 1, 2, or 4 bytes
fn integer_bytes(value: u32, min_len: usize) -> Vec<u8> {
	let bytes = value.to_be_bytes();
	let len = match value {
		0..=0xFF => 1,
		0x100..=0xFFFF => 2,
		_ => 4,
	}
	.max(min_len);

	bytes[4 - len..].to_vec()
}

// `trkn` has 2 trailing reserved bytes, `disk` does not
fn numbering_bytes(number: Option<u32>, total: Option<u32>, trailing: bool) -> Vec<u8> {
	let clamp = |n: Option<u32>| n.map_or(0, |n| u16::try_from(n).unwrap_or(u16::MAX));

	let mut payload = vec![0, 0];
	payload.extend(clamp(number).to_be_bytes());
	payload.extend(clamp(total).to_be_bytes());
	if trailing {
		payload.extend([0, 0]);
	}

	payload
}

/// Encode the content of an `ilst` atom
///
/// Items sharing an identifier are grouped into one atom, in order of first appearance.
/// Returns an empty buffer if nothing can be written.
pub(super) fn create_ilst(tag: &Tag) -> Result<Vec<u8>> {
	let mut builder = IlstBuilder::default();

	for item in tag.items() {
		match item.key() {
			ItemKey::Artwork => {
				let Some(picture) = item.value().picture() else {
					continue;
				};

				let Some(code) = picture_code(picture) else {
					log::warn!(
						"MP4 can't store pictures of type \"{}\", skipping",
						picture.mime_str()
					);
					continue;
				};

				builder.push_data(Ident::Fourcc(*b"covr"), code, picture.data().to_vec());
			},
			ItemKey::TrackNumber | ItemKey::TrackTotal => {
				if !builder.contains(b"trkn") {
					let payload = numbering_bytes(
						tag.get_integer(&ItemKey::TrackNumber),
						tag.get_integer(&ItemKey::TrackTotal),
						true,
					);
					builder.push_data(Ident::Fourcc(*b"trkn"), RESERVED, payload);
				}
			},
			ItemKey::DiscNumber | ItemKey::DiscTotal => {
				if !builder.contains(b"disk") {
					let payload = numbering_bytes(
						tag.get_integer(&ItemKey::DiscNumber),
						tag.get_integer(&ItemKey::DiscTotal),
						false,
					);
					builder.push_data(Ident::Fourcc(*b"disk"), RESERVED, payload);
				}
			},
			key @ (ItemKey::Bpm | ItemKey::Compilation) => {
				let fourcc = if key == &ItemKey::Bpm { *b"tmpo" } else { *b"cpil" };
				if builder.contains(&fourcc) {
					log::warn!("MP4 only stores one \"{}\" value, skipping", ident_str(&fourcc));
					continue;
				}

				let Some(value) = item.value().integer() else {
					log::warn!("Skipping non-numeric \"{}\" value", ident_str(&fourcc));
					continue;
				};

				let payload = if key == &ItemKey::Bpm {
					integer_bytes(value, 2)
				} else {
					vec![u8::from(value != 0)]
				};

				builder.push_data(Ident::Fourcc(fourcc), BE_SIGNED_INTEGER, payload);
			},
			key => {
				let Some(mapped) = key.map_key(TagType::Mp4Ilst) else {
					log::warn!("Item {key:?} can't be stored in an MP4 ilst, skipping");
					continue;
				};

				let Some(ident) = Ident::from_key(mapped) else {
					log::warn!("Invalid MP4 atom identifier \"{mapped}\", skipping");
					continue;
				};

				match (item.value(), &ident) {
					(ItemValue::Binary(body), Ident::Fourcc(fourcc)) if key.native().is_some() => {
						builder.entries.push(Entry::Raw {
							ident: *fourcc,
							body: body.clone(),
						});
					},
					// Freeform atoms kept whole, including their `mean` and `name`
					(ItemValue::Binary(body), Ident::Freeform { .. }) if key.native().is_some() => {
						builder.entries.push(Entry::Raw {
							ident: FREEFORM,
							body: body.clone(),
						});
					},
					(value, _) => {
						let Some(text) = value.text() else {
							log::warn!("Item {key:?} has a value MP4 can't store, skipping");
							continue;
						};

						builder.push_data(ident, UTF8, text.into_owned().into_bytes());
					},
				}
			},
		}
	}

	builder.build()
}
