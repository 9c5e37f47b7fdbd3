//! ID3v1 items
//!
//! ID3v1 is a fixed 128 byte tag at the very end of a file. It can only hold a title, artist,
//! album, year, comment, track number (ID3v1.1), and a genre from [`constants::GENRES`].
//! Everything else in a [`Tag`] is silently left out when writing.

pub mod constants;
mod read;
mod write;

use super::{ID3FindResults, find_id3v1};
use crate::codec::{Decoded, TagCodec};
use crate::config::{ParseOptions, WriteOptions};
use crate::error::Result;
use crate::probe::Container;
use crate::rewrite::Splice;
use crate::tag::{Tag, TagType};
use crate::util::io::SeekRead;

/// The codec for ID3v1 tags at the end of a stream
///
/// As a companion, an existing ID3v1 tag is refreshed whenever the authoritative tag is written,
/// see [`WriteOptions::update_id3v1`].
#[derive(Copy, Clone, Debug, Default)]
pub struct Id3v1Codec;

impl TagCodec for Id3v1Codec {
	fn tag_type(&self) -> TagType {
		TagType::Id3v1
	}

	fn decode(
		&self,
		reader: &mut dyn SeekRead,
		_container: &Container,
		options: ParseOptions,
	) -> Result<Decoded> {
		let ID3FindResults(header, region) = find_id3v1(reader)?;

		match header {
			Some(bytes) => Ok(Decoded::tagged(
				read::parse_id3v1(bytes, options.parsing_mode)?,
				region,
			)),
			None => Ok(Decoded::untagged(region)),
		}
	}

	fn encode(
		&self,
		reader: &mut dyn SeekRead,
		_container: &Container,
		tag: &Tag,
		options: WriteOptions,
	) -> Result<Vec<Splice>> {
		let ID3FindResults(_, region) = find_id3v1(reader)?;

		if write::has_id3v1_fields(tag) {
			return Ok(vec![Splice::new(
				region,
				write::encode(tag, options)?.to_vec(),
			)]);
		}

		if region.is_empty() {
			return Ok(Vec::new());
		}

		log::debug!("Removing the ID3v1 tag");
		Ok(vec![Splice::remove(region)])
	}

	fn encode_companion(
		&self,
		reader: &mut dyn SeekRead,
		container: &Container,
		tag: &Tag,
		options: WriteOptions,
	) -> Result<Vec<Splice>> {
		if !options.update_id3v1 {
			return Ok(Vec::new());
		}

		let ID3FindResults(header, _) = find_id3v1(reader)?;
		if header.is_none() {
			return Ok(Vec::new());
		}

		log::debug!("Refreshing the existing ID3v1 tag");
		self.encode(reader, container, tag, options)
	}
}
