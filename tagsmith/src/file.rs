//! Container types

use crate::tag::TagType;

use std::ffi::OsStr;
use std::path::Path;

/// Every extension [`FileType::from_ext`] recognizes
pub const EXTENSIONS: &[&str] = &[
	"mp3", "mp2", "mp1", "flac", "mp4", "m4a", "m4b", "m4p", "m4r", "m4v", "ogg", "oga", "opus",
	"wma", "asf",
];

// Same order as `EXTENSIONS`
const EXTENSION_TYPES: [FileType; 15] = [
	FileType::Mpeg,
	FileType::Mpeg,
	FileType::Mpeg,
	FileType::Flac,
	FileType::Mp4,
	FileType::Mp4,
	FileType::Mp4,
	FileType::Mp4,
	FileType::Mp4,
	FileType::Mp4,
	FileType::Vorbis,
	FileType::Vorbis,
	FileType::Opus,
	FileType::Asf,
	FileType::Asf,
];

/// A container tagsmith can sniff and tag
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum FileType {
	/// WMA and other ASF files
	Asf,
	/// Native FLAC
	Flac,
	/// MP4 and its M4A/M4B relatives
	Mp4,
	/// MPEG audio, layers I through III
	Mpeg,
	/// Ogg Opus
	Opus,
	/// Ogg Vorbis
	Vorbis,
}

impl FileType {
	/// The tag type a write to this container produces
	///
	/// This is the first of [`FileType::tag_types`].
	///
	/// ```rust
	/// use tagsmith::file::FileType;
	/// use tagsmith::tag::TagType;
	///
	/// assert_eq!(FileType::Opus.primary_tag_type(), TagType::VorbisComments);
	/// ```
	pub fn primary_tag_type(&self) -> TagType {
		self.tag_types()[0]
	}

	/// Every tag type the container can hold, primary first
	///
	/// ```rust
	/// use tagsmith::file::FileType;
	/// use tagsmith::tag::TagType;
	///
	/// assert_eq!(FileType::Mpeg.tag_types(), &[TagType::Id3v2, TagType::Id3v1]);
	/// ```
	pub fn tag_types(&self) -> &'static [TagType] {
		match self {
			FileType::Mpeg => &[TagType::Id3v2, TagType::Id3v1],
			FileType::Flac | FileType::Opus | FileType::Vorbis => &[TagType::VorbisComments],
			FileType::Mp4 => &[TagType::Mp4Ilst],
			FileType::Asf => &[TagType::Asf],
		}
	}

	/// Whether the container can hold `tag_type` at all
	pub fn supports_tag_type(&self, tag_type: TagType) -> bool {
		self.tag_types().contains(&tag_type)
	}

	/// The container usually found behind a file extension
	///
	/// Matching ignores case. An extension is only a hint, see [`probe`](crate::probe).
	///
	/// ```rust
	/// use tagsmith::file::FileType;
	///
	/// assert_eq!(FileType::from_ext("M4B"), Some(FileType::Mp4));
	/// assert_eq!(FileType::from_ext("wav"), None);
	/// ```
	pub fn from_ext<E>(ext: E) -> Option<Self>
	where
		E: AsRef<OsStr>,
	{
		let ext = ext.as_ref().to_str()?;
		EXTENSIONS
			.iter()
			.position(|known| known.eq_ignore_ascii_case(ext))
			.map(|index| EXTENSION_TYPES[index])
	}

	/// [`FileType::from_ext`] for the extension of `path`
	pub fn from_path<P>(path: P) -> Option<Self>
	where
		P: AsRef<Path>,
	{
		path.as_ref().extension().and_then(Self::from_ext)
	}

	/// The container whose signature starts `buf`
	///
	/// Only the very start of `buf` is checked. MPEG streams behind an ID3v2 tag or junk are
	/// found by [`probe::sniff_content`](crate::probe::sniff_content) instead.
	///
	/// ```rust
	/// use tagsmith::file::FileType;
	///
	/// assert_eq!(FileType::from_buffer(b"fLaC\0\0\0\x22"), Some(FileType::Flac));
	/// assert_eq!(FileType::from_buffer(b"not audio"), None);
	/// ```
	pub fn from_buffer(buf: &[u8]) -> Option<Self> {
		match Self::from_buffer_inner(buf) {
			Some(FileTypeGuessResult::Determined(file_ty)) => Some(file_ty),
			_ => None,
		}
	}

	pub(crate) fn from_buffer_inner(buf: &[u8]) -> Option<FileTypeGuessResult> {
		use crate::id3::v2::util::synchsafe::SynchsafeInteger;

		if buf.is_empty() {
			return None;
		}

		match Self::quick_type_guess(buf) {
			Some(f_ty) => Some(FileTypeGuessResult::Determined(f_ty)),
			None if buf.len() >= 10 && &buf[..3] == b"ID3" => {
				let size = u32::from_be_bytes([buf[6], buf[7], buf[8], buf[9]]).unsynch();
				let has_footer = buf[3] == 4 && buf[5] & 0x10 == 0x10;

				Some(FileTypeGuessResult::MaybePrecededById3 {
					major_version: buf[3],
					tag_len: 10 + u64::from(size) + if has_footer { 10 } else { 0 },
				})
			},
			None => Some(FileTypeGuessResult::MaybePrecededByJunk),
		}
	}

	pub(crate) fn quick_type_guess(buf: &[u8]) -> Option<Self> {
		use crate::asf::object::HEADER_OBJECT;

		match *buf.first()? {
			0xFF if buf.len() >= 2 && verify_frame_sync([buf[0], buf[1]]) => Some(Self::Mpeg),
			b'O' if buf.len() >= 36 && &buf[..4] == b"OggS" => {
				if &buf[28..35] == b"\x01vorbis" {
					return Some(Self::Vorbis);
				} else if &buf[28..36] == b"OpusHead" {
					return Some(Self::Opus);
				}

				None
			},
			b'f' if buf.starts_with(b"fLaC") => Some(Self::Flac),
			_ if buf.len() >= 16 && buf[..16] == HEADER_OBJECT.0 => Some(Self::Asf),
			_ if buf.len() >= 8 && &buf[4..8] == b"ftyp" => Some(Self::Mp4),
			_ => None,
		}
	}
}

pub(crate) enum FileTypeGuessResult {
	Determined(FileType),
	MaybePrecededById3 { major_version: u8, tag_len: u64 },
	MaybePrecededByJunk,
}

/// Whether two bytes are a plausible MPEG audio frame header start
///
/// 11 sync bits, a valid version, and a layer other than the reserved `00`. The reserved layer
/// rules out ADTS streams, which share the same sync word.
pub(crate) fn verify_frame_sync(frame_sync: [u8; 2]) -> bool {
	let version = (frame_sync[1] >> 3) & 0b11;
	let layer = (frame_sync[1] >> 1) & 0b11;

	frame_sync[0] == 0xFF && frame_sync[1] >> 5 == 0b111 && version != 0b01 && layer != 0b00
}

#[cfg(test)]
mod tests {
	use super::{FileType, verify_frame_sync};

	#[test_log::test]
	fn extensions_are_case_insensitive() {
		assert_eq!(FileType::from_ext("M4A"), Some(FileType::Mp4));
		assert_eq!(FileType::from_ext("Opus"), Some(FileType::Opus));
		assert_eq!(FileType::from_path("/music/track.WMA"), Some(FileType::Asf));
		assert_eq!(FileType::from_path("/music/track"), None);
		assert_eq!(FileType::from_ext("txt"), None);
	}

	#[test_log::test]
	fn every_extension_maps() {
		for ext in super::EXTENSIONS {
			assert!(FileType::from_ext(ext).is_some(), "{ext}");
		}
		assert_eq!(FileType::from_ext("oga"), Some(FileType::Vorbis));
		assert_eq!(FileType::from_ext("mp2"), Some(FileType::Mpeg));
	}

	#[test_log::test]
	fn frame_sync() {
		// MPEG-1 Layer III
		assert!(verify_frame_sync([0xFF, 0xFB]));
		// MPEG-2 Layer III
		assert!(verify_frame_sync([0xFF, 0xF3]));
		// ADTS (layer 00)
		assert!(!verify_frame_sync([0xFF, 0xF1]));
		// Reserved version
		assert!(!verify_frame_sync([0xFF, 0xEB]));
		assert!(!verify_frame_sync([0xFE, 0xFB]));
	}
}
