//! Items for Ogg Vorbis and Ogg Opus
//!
//! ## File notes
//!
//! The only supported tag format is [`TagType::VorbisComments`], stored in the stream's comment
//! header packet. Pictures are stored as `METADATA_BLOCK_PICTURE` fields.

pub(crate) mod comments;
mod read;
mod write;

use crate::codec::{Decoded, TagCodec};
use crate::config::{ParseOptions, WriteOptions};
use crate::error::Result;
use crate::file::FileType;
use crate::macros::err;
use crate::probe::Container;
use crate::rewrite::{MetadataRegion, Splice};
use crate::tag::{Tag, TagType};
use crate::util::io::SeekRead;

// https://xiph.org/vorbis/doc/Vorbis_I_spec.html#x1-620004.2.1
const VORBIS_IDENT_HEAD: &[u8] = &[1, 118, 111, 114, 98, 105, 115];
const VORBIS_COMMENT_HEAD: &[u8] = &[3, 118, 111, 114, 98, 105, 115];

// https://datatracker.ietf.org/doc/pdf/rfc7845.pdf#section-5.1
const OPUSHEAD: &[u8] = &[79, 112, 117, 115, 72, 101, 97, 100];
const OPUSTAGS: &[u8] = &[79, 112, 117, 115, 84, 97, 103, 115];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum OggFormat {
	Vorbis,
	Opus,
}

impl OggFormat {
	fn from_file_type(file_type: FileType) -> Option<Self> {
		match file_type {
			FileType::Vorbis => Some(Self::Vorbis),
			FileType::Opus => Some(Self::Opus),
			_ => None,
		}
	}

	fn ident_signature(self) -> &'static [u8] {
		match self {
			Self::Vorbis => VORBIS_IDENT_HEAD,
			Self::Opus => OPUSHEAD,
		}
	}

	fn comment_signature(self) -> &'static [u8] {
		match self {
			Self::Vorbis => VORBIS_COMMENT_HEAD,
			Self::Opus => OPUSTAGS,
		}
	}

	// Vorbis has a third "setup" header
	fn header_packet_count(self) -> isize {
		match self {
			Self::Vorbis => 3,
			Self::Opus => 2,
		}
	}
}

/// The codec for Vorbis comments in Ogg Vorbis and Ogg Opus streams
#[derive(Copy, Clone, Debug, Default)]
pub struct OggCodec;

impl OggCodec {
	fn format(container: &Container) -> Result<OggFormat> {
		match OggFormat::from_file_type(container.file_type()) {
			Some(format) => Ok(format),
			None => err!(UnsupportedTag),
		}
	}
}

impl TagCodec for OggCodec {
	fn tag_type(&self) -> TagType {
		TagType::VorbisComments
	}

	fn decode(
		&self,
		mut reader: &mut dyn SeekRead,
		container: &Container,
		options: ParseOptions,
	) -> Result<Decoded> {
		let format = Self::format(container)?;
		let headers = read::read_headers(&mut reader, format)?;
		let tag = read::read_tag(&headers, format, options)?;

		// The comment header is mandatory, an empty one is no tag
		let region = MetadataRegion::new(0, headers.end);
		if tag.is_empty() {
			return Ok(Decoded::untagged(region));
		}

		Ok(Decoded::tagged(tag, region))
	}

	fn encode(
		&self,
		mut reader: &mut dyn SeekRead,
		container: &Container,
		tag: &Tag,
		_options: WriteOptions,
	) -> Result<Vec<Splice>> {
		let format = Self::format(container)?;
		let headers = read::read_headers(&mut reader, format)?;

		let comment_packet = write::create_comment_packet(&headers, format, tag)?;
		if headers.packets.get(1) == Some(&comment_packet[..]) {
			log::debug!("Comment header is unchanged");
			return Ok(Vec::new());
		}

		write::write_headers(&mut reader, headers, comment_packet)
	}
}
