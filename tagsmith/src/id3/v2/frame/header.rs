use super::{FrameFlags, is_valid_frame_id};
use crate::error::Result;
use crate::id3::v2::Id3v2Version;
use crate::id3::v2::util::upgrade::{upgrade_v2, upgrade_v3};
use crate::util::cursor::ByteCursor;

use byteorder::BigEndian;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FrameHeader {
	/// The upgraded frame ID, as bytes since it may be invalid
	pub id: Vec<u8>,
	pub size: u32,
	pub flags: FrameFlags,
}

impl FrameHeader {
	/// The ID as a string, only meaningful if [`FrameHeader::has_valid_id`]
	pub fn id_str(&self) -> String {
		String::from_utf8_lossy(&self.id).into_owned()
	}

	pub fn has_valid_id(&self) -> bool {
		is_valid_frame_id(&self.id)
	}
}

pub(crate) fn header_len(version: Id3v2Version) -> usize {
	match version {
		Id3v2Version::V2 => 6,
		Id3v2Version::V3 | Id3v2Version::V4 => 10,
	}
}

/// Parse the next frame header
///
/// Returns `None` once padding (or the end of the tag) is reached.
pub(crate) fn parse_header(
	cursor: &mut ByteCursor<'_>,
	version: Id3v2Version,
) -> Result<Option<FrameHeader>> {
	if cursor.remaining() < header_len(version) {
		return Ok(None);
	}

	// Padding, nothing else can follow
	if cursor.peek_u8()? == 0 {
		return Ok(None);
	}

	let header = match version {
		Id3v2Version::V2 => {
			let id = cursor.read_array::<3>()?;
			let size = cursor.read_u24::<BigEndian>()?;

			let id = match std::str::from_utf8(&id).ok().and_then(upgrade_v2) {
				Some(upgraded) => upgraded.as_bytes().to_vec(),
				None => id.to_vec(),
			};

			FrameHeader {
				id,
				size,
				flags: FrameFlags::default(),
			}
		},
		Id3v2Version::V3 => {
			let id = cursor.read_array::<4>()?;
			let size = cursor.read_u32::<BigEndian>()?;
			let flags = cursor.read_u16::<BigEndian>()?;

			let id = match std::str::from_utf8(&id).ok().and_then(upgrade_v3) {
				Some(upgraded) => upgraded.as_bytes().to_vec(),
				None => id.to_vec(),
			};

			FrameHeader {
				id,
				size,
				flags: FrameFlags::parse_id3v23(flags),
			}
		},
		Id3v2Version::V4 => {
			let id = cursor.read_array::<4>()?.to_vec();
			let size = cursor.read_synchsafe_u32()?;
			let flags = cursor.read_u16::<BigEndian>()?;

			FrameHeader {
				id,
				size,
				flags: FrameFlags::parse_id3v24(flags),
			}
		},
	};

	log::trace!(
		"Frame header: {:?}, {} bytes",
		String::from_utf8_lossy(&header.id),
		header.size
	);

	Ok(Some(header))
}

#[cfg(test)]
mod tests {
	use super::parse_header;
	use crate::id3::v2::Id3v2Version;
	use crate::util::cursor::ByteCursor;

	#[test_log::test]
	fn v2_ids_are_upgraded() {
		let data = b"TT2\x00\x00\x05";
		let header = parse_header(&mut ByteCursor::new(data), Id3v2Version::V2)
			.unwrap()
			.unwrap();
		assert_eq!(header.id, b"TIT2");
		assert_eq!(header.size, 5);
	}

	#[test_log::test]
	fn v3_sizes_are_plain() {
		let data = b"TYER\x00\x00\x01\x00\x00\x00";
		let header = parse_header(&mut ByteCursor::new(data), Id3v2Version::V3)
			.unwrap()
			.unwrap();
		assert_eq!(header.id, b"TDRC");
		assert_eq!(header.size, 256);
	}

	#[test_log::test]
	fn v4_sizes_are_synchsafe() {
		let data = b"TIT2\x00\x00\x02\x00\x00\x03";
		let header = parse_header(&mut ByteCursor::new(data), Id3v2Version::V4)
			.unwrap()
			.unwrap();
		assert_eq!(header.size, 256);
		assert!(header.flags.unsynchronisation);
		assert!(header.flags.data_length_indicator);
	}

	#[test_log::test]
	fn padding_ends_frames() {
		let data = [0; 20];
		assert!(
			parse_header(&mut ByteCursor::new(&data), Id3v2Version::V4)
				.unwrap()
				.is_none()
		);
		assert!(
			parse_header(&mut ByteCursor::new(b"TIT2"), Id3v2Version::V4)
				.unwrap()
				.is_none()
		);
	}
}
