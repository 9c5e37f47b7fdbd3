use crate::error::{ErrorKind, Result, TagError};
use crate::macros::err;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Text that can't be represented in the requested [`TextEncoding`]
#[derive(Copy, Clone, Debug)]
pub struct TextEncodingError {
	encoding: TextEncoding,
	valid_up_to: usize,
}

impl TextEncodingError {
	/// The encoding that was requested
	pub fn encoding(&self) -> TextEncoding {
		self.encoding
	}

	/// The number of characters that encoded successfully before the failure
	pub fn valid_up_to(&self) -> usize {
		self.valid_up_to
	}
}

impl core::fmt::Display for TextEncodingError {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		write!(
			f,
			"character {} has no {} representation",
			self.valid_up_to,
			self.encoding.name()
		)
	}
}

impl core::error::Error for TextEncodingError {}

/// A text encoding
///
/// The discriminants are the ID3v2 encoding bytes.
#[derive(Debug, Clone, Eq, PartialEq, Copy, Hash)]
#[repr(u8)]
pub enum TextEncoding {
	/// ISO-8859-1
	Latin1 = 0,
	/// UTF-16, starting with a byte order mark
	UTF16 = 1,
	/// UTF-16 big endian, without a byte order mark
	UTF16BE = 2,
	/// UTF-8
	UTF8 = 3,
}

impl TextEncoding {
	/// The encoding for an ID3v2 encoding byte
	pub fn from_u8(byte: u8) -> Option<Self> {
		[Self::Latin1, Self::UTF16, Self::UTF16BE, Self::UTF8]
			.into_iter()
			.find(|encoding| *encoding as u8 == byte)
	}

	fn name(self) -> &'static str {
		match self {
			Self::Latin1 => "Latin-1",
			Self::UTF16 => "UTF-16",
			Self::UTF16BE => "UTF-16 BE",
			Self::UTF8 => "UTF-8",
		}
	}

	pub(crate) fn verify_latin1(text: &str) -> bool {
		text.chars().all(|c| u8::try_from(c).is_ok())
	}

	/// Width of a null terminator
	pub(crate) fn terminator_len(self) -> usize {
		match self {
			Self::UTF16 | Self::UTF16BE => 2,
			Self::Latin1 | Self::UTF8 => 1,
		}
	}

	pub(crate) fn encode(
		self,
		text: &str,
		terminated: bool,
		lossy: bool,
	) -> std::result::Result<Vec<u8>, TextEncodingError> {
		let mut out = match self {
			Self::Latin1 => latin1_encode(text, lossy).collect::<std::result::Result<Vec<u8>, _>>()?,
			Self::UTF16 => utf16_encode::<LittleEndian>(text, true),
			Self::UTF16BE => utf16_encode::<BigEndian>(text, false),
			Self::UTF8 => text.as_bytes().to_vec(),
		};

		if terminated {
			out.resize(out.len() + self.terminator_len(), 0);
		}

		Ok(out)
	}
}

/// Decode `bytes`, dropping any trailing nulls
///
/// [`TextEncoding::UTF16`] text must start with a byte order mark.
pub(crate) fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Result<String> {
	match encoding {
		_ if bytes.is_empty() => Ok(String::new()),
		TextEncoding::Latin1 => Ok(latin1_decode(bytes)),
		TextEncoding::UTF8 => utf8_decode(bytes.to_vec())
			.map_err(|_| TagError::new(ErrorKind::TextDecode("Expected a UTF-8 string"))),
		TextEncoding::UTF16BE => utf16_decode_bytes::<BigEndian>(bytes),
		TextEncoding::UTF16 => match bytes {
			[0xFE, 0xFF, rest @ ..] => utf16_decode_bytes::<BigEndian>(rest),
			[0xFF, 0xFE, rest @ ..] => utf16_decode_bytes::<LittleEndian>(rest),
			[_] => err!(TextDecode("UTF-16 string is a single byte")),
			_ => err!(TextDecode("UTF-16 string has no byte order mark")),
		},
	}
}

/// Offset of the first null terminator in `bytes`
///
/// UTF-16 terminators must sit on a code unit boundary.
pub(crate) fn find_terminator(bytes: &[u8], encoding: TextEncoding) -> Option<usize> {
	match encoding.terminator_len() {
		1 => bytes.iter().position(|b| *b == 0),
		width => bytes
			.chunks_exact(width)
			.position(|unit| unit.iter().all(|b| *b == 0))
			.map(|pos| pos * width),
	}
}

pub(crate) fn latin1_decode(bytes: &[u8]) -> String {
	let mut text = bytes.iter().copied().map(char::from).collect::<String>();
	trim_end_nulls(&mut text);
	text
}

pub(crate) fn latin1_encode(
	s: &str,
	lossy: bool,
) -> impl Iterator<Item = std::result::Result<u8, TextEncodingError>> {
	s.chars()
		.enumerate()
		.map(move |(index, c)| match u8::try_from(c) {
			Ok(byte) => Ok(byte),
			Err(_) if lossy => Ok(b'?'),
			Err(_) => Err(TextEncodingError {
				encoding: TextEncoding::Latin1,
				valid_up_to: index,
			}),
		})
}

pub(crate) fn utf8_decode(bytes: Vec<u8>) -> Result<String> {
	let mut text = String::from_utf8(bytes)?;
	trim_end_nulls(&mut text);
	Ok(text)
}

/// Decode UTF-16 code units stored in the byte order `B`, without a byte order mark
pub(crate) fn utf16_decode_bytes<B: ByteOrder>(bytes: &[u8]) -> Result<String> {
	if bytes.len() % 2 != 0 {
		err!(TextDecode("UTF-16 string has an odd length"));
	}

	let units = bytes.chunks_exact(2).map(B::read_u16);
	let mut text = char::decode_utf16(units)
		.collect::<std::result::Result<String, _>>()
		.map_err(|_| TagError::new(ErrorKind::TextDecode("Given an invalid UTF-16 string")))?;

	trim_end_nulls(&mut text);
	Ok(text)
}

/// Encode `text` as UTF-16 in the byte order `B`, optionally preceded by a byte order mark
pub(crate) fn utf16_encode<B: ByteOrder>(text: &str, bom: bool) -> Vec<u8> {
	let bom = bom.then_some(0xFEFF);
	let mut encoded = Vec::with_capacity((text.len() + 1) * 2);

	for unit in bom.into_iter().chain(text.encode_utf16()) {
		let mut buf = [0; 2];
		B::write_u16(&mut buf, unit);
		encoded.extend_from_slice(&buf);
	}

	encoded
}

/// ASF strings are little endian UTF-16, with no byte order mark
pub(crate) fn utf16le_decode(bytes: &[u8]) -> Result<String> {
	utf16_decode_bytes::<LittleEndian>(bytes)
}

pub(crate) fn utf16le_encode(text: &str, terminated: bool) -> Vec<u8> {
	let mut encoded = utf16_encode::<LittleEndian>(text, false);
	if terminated {
		encoded.extend_from_slice(&[0, 0]);
	}

	encoded
}

pub(crate) fn trim_end_nulls(text: &mut String) {
	let len = text.trim_end_matches('\0').len();
	text.truncate(len);
}
