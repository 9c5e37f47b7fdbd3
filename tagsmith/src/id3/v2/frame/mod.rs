//! ID3v2 frames
//!
//! Frames are first read into a [`RawFrame`] (an ID and its decoded payload, with all
//! unsynchronisation, compression, and flag data removed), and then converted into
//! [`TagItem`](crate::tag::TagItem)s by [`content`].
//!
//! Encrypted frames can't be decoded. They are kept as an [`EncryptedFrame`] under the frame ID
//! with [`ENCRYPTED_FRAME_SUFFIX`] appended.

pub(crate) mod content;
pub(crate) mod header;
pub(crate) mod read;

/// The frame format flags that change how a payload is stored
///
/// Status flags (tag/file alter preservation, read only) are dropped on read.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct FrameFlags {
	/// A group ID byte precedes the payload
	pub grouping_identity: bool,
	/// zlib compressed payload
	pub compression: bool,
	/// An encryption method byte precedes the payload
	pub encryption: bool,
	/// Unsynchronised payload (ID3v2.4)
	pub unsynchronisation: bool,
	/// A synchsafe decoded length precedes the payload (ID3v2.4)
	pub data_length_indicator: bool,
}

// (grouping, compression, encryption, unsynchronisation, data length indicator)
const V4_BITS: [u16; 5] = [0x0040, 0x0008, 0x0004, 0x0002, 0x0001];
// ID3v2.3 has no frame level unsynchronisation or data length indicator
const V3_BITS: [u16; 5] = [0x0020, 0x0080, 0x0040, 0, 0];

impl FrameFlags {
	fn from_bits(flags: u16, bits: [u16; 5]) -> Self {
		let set = |index: usize| bits[index] != 0 && flags & bits[index] == bits[index];
		FrameFlags {
			grouping_identity: set(0),
			compression: set(1),
			encryption: set(2),
			unsynchronisation: set(3),
			data_length_indicator: set(4),
		}
	}

	/// Read the second flags byte pair of an ID3v2.4 frame header
	pub fn parse_id3v24(flags: u16) -> Self {
		Self::from_bits(flags, V4_BITS)
	}

	/// Read the flags of an ID3v2.3 frame header
	pub fn parse_id3v23(flags: u16) -> Self {
		Self::from_bits(flags, V3_BITS)
	}

	/// The ID3v2.4 flags field
	pub fn as_id3v24_bytes(&self) -> u16 {
		self.to_bits(V4_BITS)
	}

	/// The ID3v2.3 flags field
	pub fn as_id3v23_bytes(&self) -> u16 {
		self.to_bits(V3_BITS)
	}

	fn to_bits(self, bits: [u16; 5]) -> u16 {
		[
			self.grouping_identity,
			self.compression,
			self.encryption,
			self.unsynchronisation,
			self.data_length_indicator,
		]
		.into_iter()
		.zip(bits)
		.filter(|(set, _)| *set)
		.fold(0, |flags, (_, bit)| flags | bit)
	}
}

/// A frame with its payload fully decoded
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RawFrame {
	/// The ID3v2.4 frame ID, or the original ID if it has no ID3v2.4 equivalent
	pub id: String,
	pub content: Vec<u8>,
}

/// Suffix of the native key a frame is kept under while still encrypted
pub(crate) const ENCRYPTED_FRAME_SUFFIX: &str = ":encrypted";

const ENCRYPTED_COMPRESSED: u8 = 0x01;
const ENCRYPTED_DATA_LENGTH: u8 = 0x02;

/// A frame that could not be decrypted, kept with enough of its flag data to be written back
///
/// Stored as the method byte, a layout byte (`0x01` compressed, `0x02` data length present),
/// the big endian data length if present, and the encrypted payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EncryptedFrame<'a> {
	pub method: u8,
	pub compressed: bool,
	pub data_length: Option<u32>,
	pub payload: &'a [u8],
}

impl<'a> EncryptedFrame<'a> {
	pub fn parse(stored: &'a [u8]) -> Option<Self> {
		let [method, layout, rest @ ..] = stored else {
			return None;
		};

		let (data_length, payload) = if layout & ENCRYPTED_DATA_LENGTH == 0 {
			(None, rest)
		} else {
			let (length, payload) = rest.split_first_chunk::<4>()?;
			(Some(u32::from_be_bytes(*length)), payload)
		};

		Some(Self {
			method: *method,
			compressed: layout & ENCRYPTED_COMPRESSED != 0,
			data_length,
			payload,
		})
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut layout = 0;
		if self.compressed {
			layout |= ENCRYPTED_COMPRESSED;
		}
		if self.data_length.is_some() {
			layout |= ENCRYPTED_DATA_LENGTH;
		}

		let mut stored = vec![self.method, layout];
		if let Some(length) = self.data_length {
			stored.extend(length.to_be_bytes());
		}
		stored.extend(self.payload);
		stored
	}
}

/// Whether `id` is made up of valid frame ID characters (`A-Z`, `0-9`)
pub(crate) fn is_valid_frame_id(id: &[u8]) -> bool {
	!id.is_empty() && id.iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
