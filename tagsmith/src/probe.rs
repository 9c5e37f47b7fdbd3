//! Format sniffing
//!
//! Before any codec runs, a file's container is classified into a [`Container`]. Sniffing looks
//! at a small header window, skipping a leading ID3v2 tag when one is present, and falls back to
//! an extension hint only when the content is inconclusive.

use crate::config::ParseOptions;
use crate::error::{ErrorKind, Result, TagError};
use crate::file::{FileType, FileTypeGuessResult, verify_frame_sync};
use crate::id3::v2::Id3v2Version;

use std::io::{Read, Seek, SeekFrom};

// 36 is enough to see an Ogg identification packet, an MP4 `ftyp` brand, or an ASF GUID
const HEADER_WINDOW: u64 = 36;

/// The version of the format, where the container exposes one up front
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatVersion {
	/// The version of a leading ID3v2 tag
	Id3v2(Id3v2Version),
	/// The major brand of an MP4 `ftyp` atom
	Mp4Brand([u8; 4]),
}

/// A classified container
///
/// This is produced once per operation and never changes afterwards.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Container {
	file_type: FileType,
	version: Option<FormatVersion>,
	leading_tag_len: u64,
}

impl Container {
	pub(crate) fn new(file_type: FileType) -> Self {
		Self {
			file_type,
			version: None,
			leading_tag_len: 0,
		}
	}

	/// The container's [`FileType`]
	pub fn file_type(&self) -> FileType {
		self.file_type
	}

	/// The container's [`FormatVersion`], if known
	pub fn version(&self) -> Option<FormatVersion> {
		self.version
	}

	/// The version of the ID3v2 tag at the start of the file, if any
	pub fn id3v2_version(&self) -> Option<Id3v2Version> {
		match self.version {
			Some(FormatVersion::Id3v2(version)) => Some(version),
			_ => None,
		}
	}

	/// The number of bytes occupied by a leading ID3v2 tag
	///
	/// The container's own data starts at this offset.
	pub fn leading_tag_len(&self) -> u64 {
		self.leading_tag_len
	}
}

/// Classify a container from its content only
///
/// This ignores any extension, and returns `None` if the content is not recognized.
/// The reader is restored to its original position.
///
/// # Errors
///
/// * `reader` fails to read or seek
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
/// use tagsmith::config::ParseOptions;
/// use tagsmith::file::FileType;
/// use tagsmith::probe::sniff_content;
///
/// # fn main() -> tagsmith::error::Result<()> {
/// let mut reader = Cursor::new(b"fLaC\x80\0\0\x22".to_vec());
/// let container = sniff_content(&mut reader, ParseOptions::new())?.unwrap();
///
/// assert_eq!(container.file_type(), FileType::Flac);
/// # Ok(()) }
/// ```
pub fn sniff_content<R>(reader: &mut R, options: ParseOptions) -> Result<Option<Container>>
where
	R: Read + Seek,
{
	let starting_position = reader.stream_position()?;
	let ret = sniff_inner(reader, options.max_junk_bytes);
	reader.seek(SeekFrom::Start(starting_position))?;

	let ret = ret?;
	log::debug!("Probe: Guessed container: {:?}", ret);
	Ok(ret)
}

/// Classify a container, falling back to `hint` when the content is inconclusive
///
/// # Errors
///
/// * `reader` fails to read or seek
/// * [`ErrorKind::UnsupportedFormat`](crate::error::ErrorKind::UnsupportedFormat): neither the
///   content nor `hint` identify a supported container
pub fn sniff<R>(reader: &mut R, hint: Option<FileType>, options: ParseOptions) -> Result<Container>
where
	R: Read + Seek,
{
	let starting_position = reader.stream_position()?;
	let ret = sniff_inner(reader, options.max_junk_bytes);
	let ret = match ret {
		Ok(Some(container)) => Ok(container),
		Ok(None) => match hint {
			Some(file_type) => {
				log::debug!("Probe: Content inconclusive, using hint {:?}", file_type);
				forced_inner(reader, file_type)
			},
			None => Err(TagError::new(ErrorKind::UnsupportedFormat)),
		},
		Err(e) => Err(e),
	};

	reader.seek(SeekFrom::Start(starting_position))?;
	ret
}

/// Describe the container as `file_type` without classifying it
///
/// A leading ID3v2 tag is still measured, so codecs know where the container begins.
///
/// # Errors
///
/// * `reader` fails to read or seek
pub fn forced<R>(reader: &mut R, file_type: FileType) -> Result<Container>
where
	R: Read + Seek,
{
	let starting_position = reader.stream_position()?;
	let ret = forced_inner(reader, file_type);
	reader.seek(SeekFrom::Start(starting_position))?;
	ret
}

fn forced_inner<R>(reader: &mut R, file_type: FileType) -> Result<Container>
where
	R: Read + Seek,
{
	let window = read_window(reader, 0)?;
	let mut container = Container::new(file_type);

	if let Some(FileTypeGuessResult::MaybePrecededById3 {
		major_version,
		tag_len,
	}) = FileType::from_buffer_inner(&window)
	{
		container.version = id3v2_version(major_version).map(FormatVersion::Id3v2);
		container.leading_tag_len = tag_len;
	}

	Ok(container)
}

fn sniff_inner<R>(reader: &mut R, max_junk_bytes: usize) -> Result<Option<Container>>
where
	R: Read + Seek,
{
	let window = read_window(reader, 0)?;

	let Some(guess) = FileType::from_buffer_inner(&window) else {
		return Ok(None);
	};

	match guess {
		FileTypeGuessResult::Determined(file_type) => {
			let mut container = Container::new(file_type);
			if file_type == FileType::Mp4 && window.len() >= 12 {
				container.version = Some(FormatVersion::Mp4Brand([
					window[8], window[9], window[10], window[11],
				]));
			}

			Ok(Some(container))
		},
		// The file starts with an ID3v2 tag, the real container follows it
		FileTypeGuessResult::MaybePrecededById3 {
			major_version,
			tag_len,
		} => {
			log::debug!("Probe: ID3v2 tag detected, skipping {} bytes", tag_len);

			let Some(version) = id3v2_version(major_version) else {
				log::warn!("Probe: Leading ID3v2 tag has an unknown version ({major_version})");
				return Ok(None);
			};

			let after_tag = read_window(reader, tag_len)?;
			let file_type = match after_tag.get(..4) {
				Some(b"fLaC") => Some(FileType::Flac),
				_ => search_for_frame_sync(reader, tag_len, max_junk_bytes)?.map(|_| FileType::Mpeg),
			};

			Ok(file_type.map(|file_type| Container {
				file_type,
				version: Some(FormatVersion::Id3v2(version)),
				leading_tag_len: tag_len,
			}))
		},
		FileTypeGuessResult::MaybePrecededByJunk => {
			log::debug!(
				"Probe: Possible junk bytes detected, searching up to {} bytes",
				max_junk_bytes
			);

			Ok(search_for_frame_sync(reader, 0, max_junk_bytes)?
				.map(|_| Container::new(FileType::Mpeg)))
		},
	}
}

fn id3v2_version(major_version: u8) -> Option<Id3v2Version> {
	match major_version {
		2 => Some(Id3v2Version::V2),
		3 => Some(Id3v2Version::V3),
		4 => Some(Id3v2Version::V4),
		_ => None,
	}
}

fn read_window<R>(reader: &mut R, offset: u64) -> Result<Vec<u8>>
where
	R: Read + Seek,
{
	reader.seek(SeekFrom::Start(offset))?;

	let mut window = Vec::with_capacity(HEADER_WINDOW as usize);
	reader.by_ref().take(HEADER_WINDOW).read_to_end(&mut window)?;

	Ok(window)
}

// Searches for an MPEG frame sync in the `max_junk_bytes` following `offset`
fn search_for_frame_sync<R>(reader: &mut R, offset: u64, max_junk_bytes: usize) -> Result<Option<u64>>
where
	R: Read + Seek,
{
	reader.seek(SeekFrom::Start(offset))?;

	// One extra byte, so a sync word starting at the last junk byte is still complete
	let mut junk = Vec::new();
	reader
		.by_ref()
		.take(max_junk_bytes as u64 + 1)
		.read_to_end(&mut junk)?;

	Ok(junk
		.windows(2)
		.position(|w| verify_frame_sync([w[0], w[1]]))
		.map(|pos| offset + pos as u64))
}

#[cfg(test)]
mod tests {
	use super::{FormatVersion, forced, sniff, sniff_content};
	use crate::config::ParseOptions;
	use crate::file::FileType;
	use crate::id3::v2::Id3v2Version;

	use std::io::Cursor;

	fn id3v2_header(version: u8, size: u32) -> Vec<u8> {
		let mut header = vec![b'I', b'D', b'3', version, 0, 0];
		header.extend([
			((size >> 21) & 0x7F) as u8,
			((size >> 14) & 0x7F) as u8,
			((size >> 7) & 0x7F) as u8,
			(size & 0x7F) as u8,
		]);
		header
	}

	#[test_log::test]
	fn skip_leading_id3v2() {
		let mut file = id3v2_header(3, 300);
		file.extend(std::iter::repeat_n(0, 300));
		file.extend([0xFF, 0xFB, 0x90, 0x64]);
		file.extend(std::iter::repeat_n(0, 100));

		let container = sniff_content(&mut Cursor::new(file), ParseOptions::new())
			.unwrap()
			.unwrap();

		assert_eq!(container.file_type(), FileType::Mpeg);
		assert_eq!(container.id3v2_version(), Some(Id3v2Version::V3));
		assert_eq!(container.leading_tag_len(), 310);
	}

	#[test_log::test]
	fn flac_after_id3v2() {
		let mut file = id3v2_header(4, 20);
		file.extend(std::iter::repeat_n(0, 20));
		file.extend(b"fLaC");
		file.extend(std::iter::repeat_n(0, 40));

		let container = sniff_content(&mut Cursor::new(file), ParseOptions::new())
			.unwrap()
			.unwrap();
		assert_eq!(container.file_type(), FileType::Flac);
		assert_eq!(container.leading_tag_len(), 30);
	}

	#[test_log::test]
	fn junk_before_frame_sync() {
		let mut file = vec![0x00; 200];
		file.extend([0xFF, 0xFB, 0x90, 0x64]);

		let container = sniff_content(&mut Cursor::new(&file), ParseOptions::new())
			.unwrap()
			.unwrap();
		assert_eq!(container.file_type(), FileType::Mpeg);

		// Not enough junk allowed
		let options = ParseOptions::new().max_junk_bytes(100);
		assert!(
			sniff_content(&mut Cursor::new(&file), options)
				.unwrap()
				.is_none()
		);
	}

	#[test_log::test]
	fn mp4_brand() {
		let mut file = vec![0, 0, 0, 20];
		file.extend(b"ftypM4A \0\0\0\0isom");

		let container = sniff(&mut Cursor::new(file), None, ParseOptions::new()).unwrap();
		assert_eq!(container.file_type(), FileType::Mp4);
		assert_eq!(container.version(), Some(FormatVersion::Mp4Brand(*b"M4A ")));
	}

	#[test_log::test]
	fn unknown_content_uses_hint() {
		let file = b"definitely not audio".to_vec();

		let err = sniff(&mut Cursor::new(&file), None, ParseOptions::new()).unwrap_err();
		assert!(err.is_unsupported_format());

		let container = sniff(
			&mut Cursor::new(&file),
			Some(FileType::Asf),
			ParseOptions::new(),
		)
		.unwrap();
		assert_eq!(container.file_type(), FileType::Asf);
	}

	#[test_log::test]
	fn content_wins_over_hint() {
		let mut file = b"fLaC".to_vec();
		file.extend([0; 40]);

		let container = sniff(
			&mut Cursor::new(file),
			Some(FileType::Mpeg),
			ParseOptions::new(),
		)
		.unwrap();
		assert_eq!(container.file_type(), FileType::Flac);
	}

	#[test_log::test]
	fn forced_measures_leading_tag() {
		let mut file = id3v2_header(4, 5);
		file.extend([0; 5]);

		let mut reader = Cursor::new(file);
		let container = forced(&mut reader, FileType::Mpeg).unwrap();
		assert_eq!(container.leading_tag_len(), 15);
		assert_eq!(reader.position(), 0);
	}
}
