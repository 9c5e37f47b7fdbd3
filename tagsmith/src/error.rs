//! Errors produced while reading and writing tags
//!
//! Every fallible operation returns a [`TagError`], whose [`ErrorKind`] says what went wrong.
//! Most callers only care about the broad class of an error:
//!
//! * [`TagError::is_unsupported_format`]: the container could not be classified
//! * [`TagError::is_malformed`]: a recognized container holds an inconsistent tag
//! * [`TagError::is_io`]: the underlying storage failed
//!
//! A file with no tag at all is not an error, see
//! [`ReadOutcome::NotTagged`](crate::engine::ReadOutcome::NotTagged).

use crate::file::FileType;
pub use crate::util::cursor::OutOfBounds;
pub use crate::util::text::TextEncodingError;

use std::collections::TryReserveError;
use std::fmt::{Debug, Display, Formatter};

/// Alias for `Result<T, TagError>`
pub type Result<T> = std::result::Result<T, TagError>;

/// Everything that can go wrong in tagsmith
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
	/// The container couldn't be identified, or no codec handles it
	UnsupportedFormat,
	/// A codec was handed a container its tag format can't live in
	UnsupportedTag,

	/// A size field asks for more data than is sensible, or a value is too large to store
	TooMuchData,
	/// A size field disagrees with the data around it
	///
	/// Also used for splices that overlap or fall outside of the file.
	SizeMismatch,
	/// A container's metadata is inconsistent
	FileDecoding(FileDecodingError),
	/// A tag couldn't be laid out in its container
	FileEncoding(FileEncodingError),

	/// Picture data that isn't an image, or a picture block that is cut short
	NotAPicture,

	/// Text that doesn't decode in its declared encoding
	TextDecode(&'static str),
	/// Text that can't be represented in the target encoding
	TextEncode(TextEncodingError),
	/// A defect specific to ID3v2
	Id3v2(Id3v2Error),
	/// An MP4 atom holding data that doesn't match its type
	BadAtom(&'static str),

	/// A [`ModificationListener`](crate::engine::ModificationListener) refused a write, with its
	/// reason
	Vetoed(String),

	/// An Ogg page couldn't be read or written
	OggPage(ogg_pager::PageError),
	/// Bytes that should be UTF-8, but aren't
	StringFromUtf8(std::string::FromUtf8Error),
	/// The underlying reader, writer, or file system failed
	Io(std::io::Error),
	/// Memory for a buffer couldn't be reserved
	Alloc(TryReserveError),
}

/// Defects specific to ID3v2 tags
#[derive(Debug)]
#[non_exhaustive]
pub enum Id3v2ErrorKind {
	/// The header names a major version other than 2, 3 or 4 (major, revision)
	BadId3v2Version(u8, u8),
	/// An ID3v2.2 tag with its compression flag set
	///
	/// ID3v2.2 never defined a compression scheme, so these tags can't be read.
	V2Compression,
	/// The extended header is shorter than 6 bytes, or longer than the tag
	BadExtendedHeaderSize,

	/// A frame ID with characters outside of `A-Z` and `0-9`, or of the wrong length
	BadFrameId(Vec<u8>),
	/// A frame too short for its own fields
	BadFrameLength,
	/// A compressed or encrypted frame that doesn't declare its decoded size
	MissingDataLengthIndicator,
	/// An ID3v2.2 frame using an encoding other than Latin-1 or UTF-16
	V2InvalidTextEncoding,
	/// An ID3v2.2 `PIC` frame with an unknown 3 character image format
	BadPictureFormat(String),

	/// zlib failed to inflate a compressed frame
	#[cfg(feature = "id3v2_compression_support")]
	Decompression(std::io::Error),
	/// A compressed frame was found, but `id3v2_compression_support` is disabled
	#[cfg(not(feature = "id3v2_compression_support"))]
	CompressedFrameEncountered,
}

impl Display for Id3v2ErrorKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::BadId3v2Version(major, minor) => {
				write!(f, "unknown version 2.{major}.{minor}, only 2.2, 2.3 and 2.4 exist")
			},
			Self::V2Compression => f.write_str("ID3v2.2 tag is compressed"),
			Self::BadExtendedHeaderSize => f.write_str("extended header size is out of range"),
			Self::BadFrameId(id) => write!(f, "invalid frame ID {id:02X?}"),
			Self::BadFrameLength => f.write_str("frame is too short for its contents"),
			Self::MissingDataLengthIndicator => {
				f.write_str("compressed or encrypted frame has no data length indicator")
			},
			Self::V2InvalidTextEncoding => {
				f.write_str("ID3v2.2 frames can only use Latin-1 or UTF-16")
			},
			Self::BadPictureFormat(format) => write!(f, "unknown picture format {format:?}"),
			#[cfg(feature = "id3v2_compression_support")]
			Self::Decompression(err) => write!(f, "frame failed to decompress: {err}"),
			#[cfg(not(feature = "id3v2_compression_support"))]
			Self::CompressedFrameEncountered => {
				f.write_str("found a compressed frame, but compression support is disabled")
			},
		}
	}
}

/// A defect in an ID3v2 tag, see [`Id3v2ErrorKind`]
pub struct Id3v2Error {
	kind: Id3v2ErrorKind,
}

impl Id3v2Error {
	/// Wrap an [`Id3v2ErrorKind`]
	#[must_use]
	pub const fn new(kind: Id3v2ErrorKind) -> Self {
		Self { kind }
	}

	/// What went wrong
	pub fn kind(&self) -> &Id3v2ErrorKind {
		&self.kind
	}
}

impl Debug for Id3v2Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "ID3v2: {:?}", self.kind)
	}
}

impl Display for Id3v2Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "ID3v2: {}", self.kind)
	}
}

// "Flac: message", or just "message" for errors not tied to a container
fn write_scoped(
	f: &mut Formatter<'_>,
	format: Option<FileType>,
	description: &dyn Display,
) -> std::fmt::Result {
	match format {
		Some(format) => write!(f, "{format:?}: {description}"),
		None => write!(f, "{description}"),
	}
}

/// The metadata of a recognized container is inconsistent
///
/// In [`ParsingMode::BestAttempt`](crate::config::ParsingMode::BestAttempt), codecs only
/// return this when nothing at all could be salvaged.
pub struct FileDecodingError {
	format: Option<FileType>,
	description: &'static str,
	overrun: Option<OutOfBounds>,
}

impl FileDecodingError {
	/// An error in a container of type `format`
	#[must_use]
	pub const fn new(format: FileType, description: &'static str) -> Self {
		Self {
			format: Some(format),
			description,
			overrun: None,
		}
	}

	/// An error not tied to a single container, such as one in a shared tag format
	pub fn from_description(description: &'static str) -> Self {
		Self {
			format: None,
			description,
			overrun: None,
		}
	}

	/// The container the error was found in, if known
	pub fn format(&self) -> Option<FileType> {
		self.format
	}

	/// A short description of the defect
	pub fn description(&self) -> &str {
		self.description
	}

	/// The read that ran past its region, when that was the cause
	pub fn overrun(&self) -> Option<OutOfBounds> {
		self.overrun
	}
}

impl Debug for FileDecodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write_scoped(f, self.format, &format_args!("{:?}", self.description))?;
		match self.overrun {
			Some(overrun) => write!(f, " ({overrun:?})"),
			None => Ok(()),
		}
	}
}

impl Display for FileDecodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write_scoped(f, self.format, &self.description)?;
		match self.overrun {
			Some(overrun) => write!(f, " ({overrun})"),
			None => Ok(()),
		}
	}
}

/// A tag couldn't be laid out in its container
pub struct FileEncodingError {
	format: Option<FileType>,
	description: &'static str,
}

impl FileEncodingError {
	/// An error while writing to a container of type `format`
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::error::FileEncodingError;
	/// use tagsmith::file::FileType;
	///
	/// let err = FileEncodingError::new(FileType::Flac, "Picture block is too large");
	/// assert_eq!(err.to_string(), "Flac: Picture block is too large");
	/// ```
	#[must_use]
	pub const fn new(format: FileType, description: &'static str) -> Self {
		Self {
			format: Some(format),
			description,
		}
	}

	/// An error not tied to a single container
	pub fn from_description(description: &'static str) -> Self {
		Self {
			format: None,
			description,
		}
	}

	/// The container being written, if known
	pub fn format(&self) -> Option<FileType> {
		self.format
	}

	/// A short description of the problem
	pub fn description(&self) -> &str {
		self.description
	}
}

impl Debug for FileEncodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write_scoped(f, self.format, &format_args!("{:?}", self.description))
	}
}

impl Display for FileEncodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write_scoped(f, self.format, &self.description)
	}
}

/// The error type of every fallible operation in tagsmith
pub struct TagError {
	pub(crate) kind: ErrorKind,
}

impl TagError {
	/// Wrap an [`ErrorKind`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::error::{ErrorKind, TagError};
	///
	/// let unsupported = TagError::new(ErrorKind::UnsupportedFormat);
	/// assert!(unsupported.is_unsupported_format());
	/// ```
	#[must_use]
	pub const fn new(kind: ErrorKind) -> Self {
		Self { kind }
	}

	/// What went wrong
	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}

	/// Whether the container could not be classified
	pub fn is_unsupported_format(&self) -> bool {
		matches!(
			self.kind,
			ErrorKind::UnsupportedFormat | ErrorKind::UnsupportedTag
		)
	}

	/// Whether this error describes a recognized container with an inconsistent tag
	///
	/// Callers can treat such files as untagged.
	pub fn is_malformed(&self) -> bool {
		matches!(
			self.kind,
			ErrorKind::FileDecoding(_)
				| ErrorKind::Id3v2(_)
				| ErrorKind::TextDecode(_)
				| ErrorKind::BadAtom(_)
				| ErrorKind::OggPage(_)
				| ErrorKind::NotAPicture
				| ErrorKind::SizeMismatch
				| ErrorKind::StringFromUtf8(_)
		)
	}

	/// Whether the underlying storage failed
	pub fn is_io(&self) -> bool {
		matches!(self.kind, ErrorKind::Io(_))
	}
}

impl std::error::Error for TagError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match &self.kind {
			ErrorKind::Io(err) => Some(err),
			ErrorKind::OggPage(err) => Some(err),
			ErrorKind::StringFromUtf8(err) => Some(err),
			ErrorKind::Alloc(err) => Some(err),
			_ => None,
		}
	}
}

impl Debug for TagError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Debug::fmt(&self.kind, f)
	}
}

impl Display for TagError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match &self.kind {
			ErrorKind::UnsupportedFormat => f.write_str("unrecognized or unsupported container"),
			ErrorKind::UnsupportedTag => {
				f.write_str("the container can't hold this codec's tag format")
			},
			ErrorKind::TooMuchData => f.write_str("data is too large to read or store"),
			ErrorKind::SizeMismatch => f.write_str("a size field disagrees with the data"),
			ErrorKind::FileDecoding(err) => Display::fmt(err, f),
			ErrorKind::FileEncoding(err) => Display::fmt(err, f),
			ErrorKind::NotAPicture => f.write_str("picture data is invalid"),
			ErrorKind::TextDecode(message) => write!(f, "text decoding failed: {message}"),
			ErrorKind::TextEncode(err) => write!(f, "text encoding failed: {err}"),
			ErrorKind::Id3v2(err) => Display::fmt(err, f),
			ErrorKind::BadAtom(message) => write!(f, "MP4 atom: {message}"),
			ErrorKind::Vetoed(reason) => write!(f, "write vetoed: {reason}"),
			ErrorKind::OggPage(err) => Display::fmt(err, f),
			ErrorKind::StringFromUtf8(err) => Display::fmt(err, f),
			ErrorKind::Io(err) => Display::fmt(err, f),
			ErrorKind::Alloc(err) => Display::fmt(err, f),
		}
	}
}

impl From<OutOfBounds> for TagError {
	fn from(input: OutOfBounds) -> Self {
		let mut err = FileDecodingError::from_description("Tag data ended unexpectedly");
		err.overrun = Some(input);
		Self::new(ErrorKind::FileDecoding(err))
	}
}

macro_rules! impl_from {
	($($source:ty => $variant:ident),+ $(,)?) => {
		$(
			impl From<$source> for TagError {
				fn from(input: $source) -> Self {
					Self::new(ErrorKind::$variant(input))
				}
			}
		)+
	};
}

impl_from!(
	Id3v2Error                  => Id3v2,
	FileDecodingError           => FileDecoding,
	FileEncodingError           => FileEncoding,
	TextEncodingError           => TextEncode,
	ogg_pager::PageError        => OggPage,
	std::io::Error              => Io,
	std::string::FromUtf8Error  => StringFromUtf8,
	TryReserveError             => Alloc,
);

#[cfg(test)]
mod tests {
	use super::{ErrorKind, FileDecodingError, TagError};
	use crate::file::FileType;
	use crate::util::cursor::ByteCursor;

	#[test_log::test]
	fn classes() {
		let overrun: TagError = ByteCursor::new(&[1, 2]).read_bytes(4).unwrap_err().into();
		assert!(overrun.is_malformed());
		assert!(matches!(overrun.kind(), ErrorKind::FileDecoding(e) if e.overrun().is_some()));

		let io: TagError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
		assert!(io.is_io());
		assert!(!io.is_malformed());

		assert!(TagError::new(ErrorKind::UnsupportedTag).is_unsupported_format());
		assert!(!TagError::new(ErrorKind::Vetoed(String::new())).is_malformed());
	}

	#[test_log::test]
	fn display() {
		let err: TagError = FileDecodingError::new(FileType::Mp4, "No \"moov\" atom found").into();
		assert_eq!(err.to_string(), "Mp4: No \"moov\" atom found");

		let err = TagError::new(ErrorKind::Vetoed(String::from("read only")));
		assert_eq!(err.to_string(), "write vetoed: read only");
	}
}
