use crate::error::{Id3v2Error, Id3v2ErrorKind, Result, TagError};
use crate::id3::v2::util::synchsafe::SynchsafeInteger;
use crate::util::cursor::ByteCursor;

use byteorder::{BigEndian, ByteOrder};

const FLAG_UNSYNCHRONISATION: u8 = 0x80;
// Compression in ID3v2.2
const FLAG_EXTENDED_HEADER: u8 = 0x40;
const FLAG_EXPERIMENTAL: u8 = 0x20;
const FLAG_FOOTER: u8 = 0x10;

const HEADER_LEN: u64 = 10;

/// An ID3v2 major version
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum Id3v2Version {
	/// ID3v2.2, read only
	V2,
	/// ID3v2.3
	V3,
	/// ID3v2.4
	V4,
}

impl Id3v2Version {
	/// The major version byte of the header
	pub fn major(self) -> u8 {
		match self {
			Self::V2 => 2,
			Self::V3 => 3,
			Self::V4 => 4,
		}
	}

	fn from_major(major: u8) -> Option<Self> {
		[Self::V2, Self::V3, Self::V4]
			.into_iter()
			.find(|version| version.major() == major)
	}
}

/// The flags byte of an ID3v2 header
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Id3v2TagFlags {
	/// The whole tag is unsynchronised (ID3v2.2/3), or its frames may be (ID3v2.4)
	pub unsynchronisation: bool,
	/// The tag is marked experimental
	pub experimental: bool,
	/// A 10 byte footer follows the frames (ID3v2.4 only)
	pub footer: bool,
	/// An extended header precedes the frames
	pub extended_header: bool,
}

impl Id3v2TagFlags {
	/// The flags byte as written
	///
	/// Only unsynchronisation is ever written, tagsmith produces no extended headers,
	/// experimental tags or footers.
	pub fn as_byte(&self) -> u8 {
		if self.unsynchronisation { FLAG_UNSYNCHRONISATION } else { 0 }
	}
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Id3v2Header {
	pub version: Id3v2Version,
	pub flags: Id3v2TagFlags,
	/// Length of everything between the header and the footer
	pub size: u32,
}

impl Id3v2Header {
	/// `Ok(None)` when `header` doesn't start with `ID3`
	pub(crate) fn parse(header: [u8; 10]) -> Result<Option<Self>> {
		let [b'I', b'D', b'3', major, minor, flags, ..] = header else {
			return Ok(None);
		};

		let Some(version) = Id3v2Version::from_major(major) else {
			return Err(Id3v2Error::new(Id3v2ErrorKind::BadId3v2Version(major, minor)).into());
		};

		let is_set = |flag: u8| flags & flag == flag;
		let flags = match version {
			// ID3v2.2 compression never got a defined scheme, so these tags can't be read
			Id3v2Version::V2 if is_set(FLAG_EXTENDED_HEADER) => {
				return Err(Id3v2Error::new(Id3v2ErrorKind::V2Compression).into());
			},
			Id3v2Version::V2 => Id3v2TagFlags {
				unsynchronisation: is_set(FLAG_UNSYNCHRONISATION),
				..Id3v2TagFlags::default()
			},
			Id3v2Version::V3 | Id3v2Version::V4 => Id3v2TagFlags {
				unsynchronisation: is_set(FLAG_UNSYNCHRONISATION),
				experimental: is_set(FLAG_EXPERIMENTAL),
				footer: version == Id3v2Version::V4 && is_set(FLAG_FOOTER),
				extended_header: is_set(FLAG_EXTENDED_HEADER),
			},
		};

		Ok(Some(Id3v2Header {
			version,
			flags,
			size: BigEndian::read_u32(&header[6..]).unsynch(),
		}))
	}

	/// Header, body and footer together
	pub(crate) fn full_tag_size(&self) -> u64 {
		let footer = if self.flags.footer { HEADER_LEN } else { 0 };
		HEADER_LEN + u64::from(self.size) + footer
	}

	/// Move `body` past the extended header, if there is one
	///
	/// Its contents (CRC, restrictions) are not used.
	pub(crate) fn skip_extended_header(&self, body: &mut ByteCursor<'_>) -> Result<()> {
		if !self.flags.extended_header {
			return Ok(());
		}

		let bad_size = || TagError::from(Id3v2Error::new(Id3v2ErrorKind::BadExtendedHeaderSize));

		let remaining_len = match self.version {
			// Excludes its own size field
			Id3v2Version::V3 => body.read_u32::<BigEndian>()? as usize,
			// Includes its own size field, and is at least 6 bytes
			_ => match body.read_synchsafe_u32()? as usize {
				size @ 6.. => size - 4,
				_ => return Err(bad_size()),
			},
		};

		if remaining_len >= body.remaining() {
			return Err(bad_size());
		}

		log::trace!("Skipping a {remaining_len} byte extended header");
		body.skip(remaining_len)?;
		Ok(())
	}
}
