//! Items for FLAC
//!
//! ## File notes
//!
//! * The only supported tag format is [`TagType::VorbisComments`], pictures are stored in
//!   their own `PICTURE` blocks.
//! * A leading ID3v2 tag is tolerated, but it is never written. It can be removed through the
//!   [`Id3v2Codec`](crate::id3::v2::Id3v2Codec).

mod block;
mod read;
mod write;

use crate::codec::{Decoded, TagCodec};
use crate::config::{ParseOptions, WriteOptions};
use crate::error::Result;
use crate::probe::Container;
use crate::rewrite::{MetadataRegion, Splice};
use crate::tag::{Tag, TagType};
use crate::util::io::SeekRead;

/// The codec for FLAC's Vorbis comments and pictures
#[derive(Copy, Clone, Debug, Default)]
pub struct FlacCodec;

impl TagCodec for FlacCodec {
	fn tag_type(&self) -> TagType {
		TagType::VorbisComments
	}

	fn decode(
		&self,
		reader: &mut dyn SeekRead,
		container: &Container,
		options: ParseOptions,
	) -> Result<Decoded> {
		let metadata = read::read_metadata(reader, container)?;

		match read::read_tag(&metadata, options)? {
			Some(tag) => Ok(Decoded::tagged(tag, metadata.region)),
			None => Ok(Decoded::untagged(MetadataRegion::empty_at(
				metadata.region.end(),
			))),
		}
	}

	fn encode(
		&self,
		reader: &mut dyn SeekRead,
		container: &Container,
		tag: &Tag,
		options: WriteOptions,
	) -> Result<Vec<Splice>> {
		let metadata = read::read_metadata(reader, container)?;

		match write::create_metadata(&metadata, tag, options)? {
			Some(blocks) => Ok(vec![Splice::new(metadata.region, blocks)]),
			None => Ok(Vec::new()),
		}
	}
}
