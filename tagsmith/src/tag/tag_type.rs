use std::fmt::{Display, Formatter};

/// A tag format
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TagType {
	/// The fixed 128 byte trailer of MPEG files
	Id3v1,
	/// ID3v2.2 through ID3v2.4, read as ID3v2.4
	Id3v2,
	/// The `moov.udta.meta.ilst` atom of MP4 files
	Mp4Ilst,
	/// `KEY=value` comments, found in FLAC, Ogg Vorbis and Ogg Opus
	VorbisComments,
	/// The two ASF description objects
	Asf,
}

impl TagType {
	fn name(self) -> &'static str {
		match self {
			TagType::Id3v1 => "ID3v1",
			TagType::Id3v2 => "ID3v2",
			TagType::Mp4Ilst => "MP4 ilst",
			TagType::VorbisComments => "Vorbis Comments",
			TagType::Asf => "ASF",
		}
	}
}

impl Display for TagType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}
