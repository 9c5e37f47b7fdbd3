//! MP4 specific items
//!
//! ## File notes
//!
//! Tags live in an `ilst` atom inside a `meta` atom, usually `moov.udta.meta.ilst`. Some files
//! use `moov.meta.ilst` or keep the tag with a track, in `moov.trak.udta.meta.ilst`. Writing a
//! tag rebuilds `moov`, creating `udta`, `meta` and `ilst` only when the file has no `ilst` at
//! all, and updates the chunk offsets of every track (and the base data offsets of any
//! fragments) when the audio moves.
//!
//! Multiple `ilst` atoms are merged on read. A write keeps the first one and removes the others.

mod atom;
mod ilst;
mod read;
mod write;

use crate::codec::{Decoded, TagCodec};
use crate::config::{ParseOptions, WriteOptions};
use crate::error::Result;
use crate::probe::Container;
use crate::rewrite::{MetadataRegion, Splice};
use crate::tag::{Tag, TagType};
use crate::util::io::SeekRead;
use atom::AtomBody;

/// The codec for MP4 `ilst` atoms
#[derive(Copy, Clone, Debug, Default)]
pub struct Mp4Codec;

impl TagCodec for Mp4Codec {
	fn tag_type(&self) -> TagType {
		TagType::Mp4Ilst
	}

	fn decode(
		&self,
		reader: &mut dyn SeekRead,
		_container: &Container,
		options: ParseOptions,
	) -> Result<Decoded> {
		let layout = read::read_layout(reader, options.parsing_mode)?;

		let mut found: Option<(Tag, MetadataRegion)> = None;
		for ilst in layout.ilst_atoms() {
			let AtomBody::Raw(content) = &ilst.body else {
				continue;
			};

			let parsed = ilst::parse_ilst(content, options)?;
			match &mut found {
				None => found = Some((parsed, ilst.region)),
				Some((tag, _)) => {
					log::warn!("Multiple \"ilst\" atoms found, combining them");
					for item in parsed {
						tag.push_unchecked(item);
					}
				},
			}
		}

		if let Some((tag, region)) = found {
			return Ok(Decoded::tagged(tag, region));
		}

		Ok(Decoded::untagged(MetadataRegion::empty_at(layout.new_ilst_position())))
	}

	fn encode(
		&self,
		reader: &mut dyn SeekRead,
		_container: &Container,
		tag: &Tag,
		_options: WriteOptions,
	) -> Result<Vec<Splice>> {
		let parse_mode = ParseOptions::DEFAULT_PARSING_MODE;
		let layout = read::read_layout(reader, parse_mode)?;

		let ilst = ilst::create_ilst(tag)?;
		let ilst = (!ilst.is_empty()).then_some(ilst);

		write::write_ilst(reader, &layout, ilst, parse_mode)
	}
}
