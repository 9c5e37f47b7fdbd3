use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::{decode_err, err, parse_mode_choice};
use crate::rewrite::MetadataRegion;
use crate::util::alloc::read_to_vec;
use crate::util::cursor::ByteCursor;
use crate::util::io::SeekStreamLen;

use std::fmt::{Debug, Display, Formatter};
use std::io::{Read, Seek, SeekFrom};

use byteorder::LittleEndian;

/// GUID and object size
pub(crate) const OBJECT_HEADER_LEN: u64 = 24;
/// Object header, child count and the two reserved bytes
pub(crate) const HEADER_OBJECT_LEN: u64 = 30;

/// An ASF object identifier, stored as it appears on disk
///
/// The first three fields of the textual form are little endian.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Guid(pub [u8; 16]);

impl Guid {
	const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
		let d1 = data1.to_le_bytes();
		let d2 = data2.to_le_bytes();
		let d3 = data3.to_le_bytes();

		Self([
			d1[0], d1[1], d1[2], d1[3], d2[0], d2[1], d3[0], d3[1], data4[0], data4[1], data4[2],
			data4[3], data4[4], data4[5], data4[6], data4[7],
		])
	}
}

impl Debug for Guid {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let b = &self.0;
		write!(
			f,
			"{:02X}{:02X}{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
			b[3], b[2], b[1], b[0], b[5], b[4], b[7], b[6], b[8], b[9], b[10], b[11], b[12], b[13],
			b[14], b[15]
		)
	}
}

impl Display for Guid {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Debug::fmt(self, f)
	}
}

pub(crate) const HEADER_OBJECT: Guid = Guid::from_fields(
	0x75B2_2630,
	0x668E,
	0x11CF,
	[0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C],
);

pub(crate) const CONTENT_DESCRIPTION: Guid = Guid::from_fields(
	0x75B2_2633,
	0x668E,
	0x11CF,
	[0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C],
);

pub(crate) const EXTENDED_CONTENT_DESCRIPTION: Guid = Guid::from_fields(
	0xD2D0_A440,
	0xE307,
	0x11D2,
	[0x97, 0xF0, 0x00, 0xA0, 0xC9, 0x5E, 0xA8, 0x50],
);

pub(crate) const FILE_PROPERTIES: Guid = Guid::from_fields(
	0x8CAB_DCA1,
	0xA947,
	0x11CF,
	[0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65],
);

pub(crate) const PADDING: Guid = Guid::from_fields(
	0x1806_D474,
	0xCADF,
	0x4509,
	[0xA4, 0xBA, 0x9A, 0xAB, 0xCB, 0x96, 0xAA, 0xE8],
);

/// A child of the Header Object
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Object {
	pub(crate) guid: Guid,
	/// Where the object was read from, empty for new objects
	pub(crate) region: MetadataRegion,
	/// Everything after the object header
	pub(crate) content: Vec<u8>,
}

impl Object {
	pub(crate) fn new(guid: Guid, content: Vec<u8>) -> Self {
		Self {
			guid,
			region: MetadataRegion::default(),
			content,
		}
	}

	pub(crate) fn padding(len: u64) -> Result<Self> {
		let Ok(content_len) = usize::try_from(len.saturating_sub(OBJECT_HEADER_LEN)) else {
			err!(TooMuchData);
		};

		Ok(Self::new(PADDING, vec![0; content_len]))
	}

	pub(crate) fn len(&self) -> u64 {
		OBJECT_HEADER_LEN + self.content.len() as u64
	}

	pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
		out.extend(self.guid.0);
		out.extend(self.len().to_le_bytes());
		out.extend(&self.content);
	}
}

/// The Header Object, the only place ASF keeps metadata
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct HeaderObject {
	pub(crate) region: MetadataRegion,
	pub(crate) reserved: [u8; 2],
	pub(crate) children: Vec<Object>,
	/// Bytes after the last child that couldn't be parsed
	pub(crate) trailer: Vec<u8>,
}

impl HeaderObject {
	pub(crate) fn read<R>(reader: &mut R, parse_mode: ParsingMode) -> Result<Self>
	where
		R: Read + Seek + ?Sized,
	{
		let stream_len = reader.stream_len_hack()?;
		if stream_len < HEADER_OBJECT_LEN {
			decode_err!(@BAIL Asf, "File too small to contain a Header Object");
		}

		reader.seek(SeekFrom::Start(0))?;

		let mut header = [0; HEADER_OBJECT_LEN as usize];
		reader.read_exact(&mut header)?;

		let mut cursor = ByteCursor::new(&header);
		if cursor.read_array::<16>()? != HEADER_OBJECT.0 {
			decode_err!(@BAIL Asf, "File missing Header Object");
		}

		let size = cursor.read_u64::<LittleEndian>()?;
		let child_count = cursor.read_u32::<LittleEndian>()?;
		let reserved = cursor.read_array::<2>()?;

		if size < HEADER_OBJECT_LEN {
			decode_err!(@BAIL Asf, "Header Object has an invalid size");
		}

		if size > stream_len {
			err!(SizeMismatch);
		}

		log::debug!("Found Header Object, {size} bytes, {child_count} children");

		let content = read_to_vec(reader, size - HEADER_OBJECT_LEN)?;
		let mut cursor = ByteCursor::new(&content);

		let mut children = Vec::with_capacity(child_count.min(64) as usize);
		for _ in 0..child_count {
			let start = HEADER_OBJECT_LEN + cursor.position() as u64;

			if (cursor.remaining() as u64) < OBJECT_HEADER_LEN {
				parse_mode_choice!(
					parse_mode,
					STRICT: decode_err!(@BAIL Asf, "Header Object has fewer children than expected"),
					DEFAULT: {
						log::warn!("Header Object has fewer children than expected, stopping");
						break;
					}
				);
			}

			let guid = Guid(cursor.read_array::<16>()?);
			let len = cursor.read_u64::<LittleEndian>()?;

			if len < OBJECT_HEADER_LEN || len - OBJECT_HEADER_LEN > cursor.remaining() as u64 {
				parse_mode_choice!(
					parse_mode,
					STRICT: err!(SizeMismatch),
					DEFAULT: {
						log::warn!("Object {guid} has an invalid size, stopping");
						cursor.seek(cursor.position() - OBJECT_HEADER_LEN as usize)?;
						break;
					}
				);
			}

			log::trace!("Found object {guid} at {start}, {len} bytes");

			children.push(Object {
				guid,
				region: MetadataRegion::new(start, len),
				content: cursor.read_bytes((len - OBJECT_HEADER_LEN) as usize)?.to_vec(),
			});
		}

		let trailer = cursor.read_rest().to_vec();
		if !trailer.is_empty() {
			log::warn!("Found {} unparsed bytes in the Header Object", trailer.len());
		}

		Ok(Self {
			region: MetadataRegion::new(0, size),
			reserved,
			children,
			trailer,
		})
	}

	#[cfg(test)]
	pub(crate) fn child(&self, guid: Guid) -> Option<&Object> {
		self.children.iter().find(|o| o.guid == guid)
	}

	pub(crate) fn len(&self) -> u64 {
		HEADER_OBJECT_LEN
			+ self.children.iter().map(Object::len).sum::<u64>()
			+ self.trailer.len() as u64
	}

	pub(crate) fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
		let Ok(child_count) = u32::try_from(self.children.len()) else {
			err!(TooMuchData);
		};

		out.extend(HEADER_OBJECT.0);
		out.extend(self.len().to_le_bytes());
		out.extend(child_count.to_le_bytes());
		out.extend(self.reserved);

		for child in &self.children {
			child.write_to(out);
		}

		out.extend(&self.trailer);
		Ok(())
	}
}
