use super::block::{BLOCK_ID_PICTURE, BLOCK_ID_STREAMINFO, BLOCK_ID_VORBIS_COMMENTS, Block};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::decode_err;
use crate::ogg::comments::{PICTURE_KEY, read_comments};
use crate::picture::Picture;
use crate::probe::Container;
use crate::rewrite::MetadataRegion;
use crate::tag::{ItemKey, ItemValue, NativeKey, Tag, TagItem, TagType};
use crate::util::io::SeekStreamLen;

use std::io::{Read, Seek, SeekFrom};

use data_encoding::BASE64;

/// Every metadata block of a stream, and the region they occupy
pub(super) struct FlacMetadata {
	pub(super) blocks: Vec<Block>,
	pub(super) region: MetadataRegion,
}

impl FlacMetadata {
	pub(super) fn has_tag_blocks(&self) -> bool {
		self.blocks
			.iter()
			.any(|b| b.ty == BLOCK_ID_VORBIS_COMMENTS || b.ty == BLOCK_ID_PICTURE)
	}
}

pub(super) fn read_metadata<R>(data: &mut R, container: &Container) -> Result<FlacMetadata>
where
	R: Read + Seek + ?Sized,
{
	let stream_len = data.stream_len_hack()?;

	// Skips an ID3v2 tag some encoders put in front of the stream
	let stream_start = container.leading_tag_len();
	data.seek(SeekFrom::Start(stream_start))?;

	let mut marker = [0; 4];
	data.read_exact(&mut marker)?;
	if marker != *b"fLaC" {
		decode_err!(@BAIL Flac, "Expected the \"fLaC\" marker");
	}

	let metadata_start = stream_start + 4;
	let mut position = metadata_start;

	let mut blocks: Vec<Block> = Vec::new();
	while blocks.last().is_none_or(|block| !block.last) {
		let block = Block::read(data, stream_len - position)?;

		if blocks.is_empty() {
			if block.ty != BLOCK_ID_STREAMINFO {
				decode_err!(@BAIL Flac, "The first block must be STREAMINFO");
			}

			if block.content.len() < 18 {
				decode_err!(@BAIL Flac, "STREAMINFO is shorter than 18 bytes");
			}
		}

		position += block.len();
		blocks.push(block);
	}

	log::debug!("Read {} FLAC metadata blocks", blocks.len());

	Ok(FlacMetadata {
		blocks,
		region: MetadataRegion::new(metadata_start, position - metadata_start),
	})
}

/// Collect the Vorbis comments and pictures of a stream
///
/// Returns `None` if the stream has neither.
pub(super) fn read_tag(metadata: &FlacMetadata, parse_options: ParseOptions) -> Result<Option<Tag>> {
	let parse_mode = parse_options.parsing_mode;

	let mut comments: Option<Tag> = None;
	let mut pictures = Vec::new();

	for block in &metadata.blocks {
		match block.ty {
			BLOCK_ID_VORBIS_COMMENTS => {
				// At most one is allowed, otherwise the last one wins
				if comments.is_some() {
					if parse_mode == ParsingMode::Strict {
						decode_err!(@BAIL Flac, "Found a second VORBIS_COMMENT block");
					}

					log::warn!("Found a second VORBIS_COMMENT block, replacing the first");
				}

				comments = Some(read_comments(&block.content, parse_options)?);
			},
			BLOCK_ID_PICTURE if parse_options.read_cover_art => {
				match Picture::from_flac_bytes(&block.content, false, parse_mode) {
					Ok((picture, _)) => pictures.push(TagItem::new(
						ItemKey::Artwork,
						ItemValue::Picture(picture),
					)),
					Err(e) if parse_mode == ParsingMode::Strict => return Err(e),
					Err(e) => {
						log::warn!("Keeping an unreadable PICTURE block as is: {e}");
						pictures.push(undecoded_picture(&block.content));
					},
				}
			},
			BLOCK_ID_PICTURE => pictures.push(undecoded_picture(&block.content)),
			_ => {},
		}
	}

	if comments.is_none() && pictures.is_empty() {
		return Ok(None);
	}

	let mut tag = comments.unwrap_or_default();
	tag.extend(pictures);
	Ok(Some(tag))
}

// Kept as the Vorbis comment field of the same name, so it survives a write
fn undecoded_picture(content: &[u8]) -> TagItem {
	TagItem::new(
		ItemKey::Native(NativeKey::new(TagType::VorbisComments, PICTURE_KEY)),
		ItemValue::Text(BASE64.encode(content)),
	)
}
