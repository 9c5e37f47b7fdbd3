//! Reader abstractions used by the codecs

use std::io::{Read, Seek, SeekFrom};

/// A reader that can also seek
///
/// Codecs are stored as trait objects, so they take a `&mut dyn SeekRead` rather than a
/// generic reader.
pub trait SeekRead: Read + Seek {}
impl<T: Read + Seek> SeekRead for T {}

/// Provides a method to get the length of a seekable stream without changing its position
pub(crate) trait SeekStreamLen: Seek {
	fn stream_len_hack(&mut self) -> std::io::Result<u64> {
		let current_pos = self.stream_position()?;
		let len = self.seek(SeekFrom::End(0))?;

		self.seek(SeekFrom::Start(current_pos))?;

		Ok(len)
	}
}

impl<T> SeekStreamLen for T where T: Seek + ?Sized {}
