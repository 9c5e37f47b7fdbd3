//! ID3v2 items and utilities
//!
//! ## Reading
//!
//! ID3v2.2, ID3v2.3, and ID3v2.4 tags are all read, with ID3v2.2 and ID3v2.3 frame IDs
//! upgraded to their ID3v2.4 equivalents.
//!
//! ## Writing
//!
//! Tags are written as ID3v2.4, or ID3v2.3 with [`WriteOptions::use_id3v23`]. Frames
//! that only exist in ID3v2.4 are dropped when writing ID3v2.3.
//!
//! [`WriteOptions::use_id3v23`]: crate::config::WriteOptions::use_id3v23

pub(crate) mod frame;
pub(crate) mod header;
mod read;
pub mod util;
mod write;

pub use header::{Id3v2TagFlags, Id3v2Version};

use super::{ID3FindResults, find_id3v2};
use crate::codec::{Decoded, TagCodec};
use crate::config::{ParseOptions, WriteOptions};
use crate::error::Result;
use crate::probe::Container;
use crate::rewrite::{MetadataRegion, Splice};
use crate::tag::{Tag, TagType};
use crate::util::io::SeekRead;

/// The codec for ID3v2 tags at the start of a stream
///
/// This is used for MPEG files, and for FLAC files that carry a (non-standard) leading ID3v2 tag.
#[derive(Copy, Clone, Debug, Default)]
pub struct Id3v2Codec;

impl TagCodec for Id3v2Codec {
	fn tag_type(&self) -> TagType {
		TagType::Id3v2
	}

	fn decode(
		&self,
		reader: &mut dyn SeekRead,
		_container: &Container,
		options: ParseOptions,
	) -> Result<Decoded> {
		let ID3FindResults(header, (region, body)) = find_id3v2(reader, true)?;

		match (header, body) {
			(Some(header), Some(body)) => {
				let tag = read::parse_id3v2(&body, header, options)?;
				Ok(Decoded::tagged(tag, region))
			},
			_ => Ok(Decoded::untagged(MetadataRegion::empty_at(0))),
		}
	}

	fn encode(
		&self,
		reader: &mut dyn SeekRead,
		_container: &Container,
		tag: &Tag,
		options: WriteOptions,
	) -> Result<Vec<Splice>> {
		let ID3FindResults(_, (region, _)) = find_id3v2(reader, false)?;

		match write::create_tag(tag, options, region.len())? {
			Some(tag_bytes) => Ok(vec![Splice::new(region, tag_bytes)]),
			None if region.is_empty() => Ok(Vec::new()),
			None => {
				log::debug!("Removing the {} byte ID3v2 tag", region.len());
				Ok(vec![Splice::remove(region)])
			},
		}
	}
}
