use super::block::{BLOCK_ID_PADDING, BLOCK_ID_PICTURE, BLOCK_ID_VORBIS_COMMENTS, Block};
use super::read::FlacMetadata;
use crate::config::WriteOptions;
use crate::error::Result;
use crate::ogg::comments::{DEFAULT_VENDOR, PICTURE_KEY, create_comments, read_vendor};
use crate::picture::PictureInformation;
use crate::tag::{ItemValue, Tag, TagType};

use data_encoding::BASE64;

// A PADDING block's content is limited by the 24 bit size field
const MAX_PADDING: u64 = 0xFF_FFFF;

/// Rebuild the metadata blocks of a stream to hold `tag`
///
/// Returns `None` if nothing needs to change.
pub(super) fn create_metadata(
	metadata: &FlacMetadata,
	tag: &Tag,
	write_options: WriteOptions,
) -> Result<Option<Vec<u8>>> {
	if tag.is_empty() && !metadata.has_tag_blocks() {
		log::debug!("Nothing to do");
		return Ok(None);
	}

	// Retain the original vendor string
	let vendor = metadata
		.blocks
		.iter()
		.find(|b| b.ty == BLOCK_ID_VORBIS_COMMENTS)
		.and_then(|b| read_vendor(&b.content))
		.unwrap_or_else(|| String::from(DEFAULT_VENDOR));

	let mut blocks = metadata
		.blocks
		.iter()
		.filter(|b| !matches!(b.ty, BLOCK_ID_VORBIS_COMMENTS | BLOCK_ID_PICTURE | BLOCK_ID_PADDING))
		.cloned()
		.collect::<Vec<_>>();

	if !tag.is_empty() {
		blocks.push(Block::new(
			BLOCK_ID_VORBIS_COMMENTS,
			create_comments(&vendor, tag, false)?,
		));
	}

	blocks.extend(picture_blocks(tag));

	let new_size = blocks.iter().map(Block::len).sum::<u64>();
	let old_size = metadata.region.len();

	// The new blocks fit in the old space, fill the rest with padding
	let padding = if new_size + 4 <= old_size && old_size - new_size - 4 <= MAX_PADDING {
		log::debug!("Reusing {} bytes of metadata space", old_size);
		Some(old_size - new_size - 4)
	} else {
		write_options
			.preferred_padding
			.map(|padding| u64::from(padding).min(MAX_PADDING))
	};

	if let Some(padding) = padding {
		blocks.push(Block::new_padding(padding as usize));
	}

	for block in &mut blocks {
		block.last = false;
	}

	if let Some(block) = blocks.last_mut() {
		block.last = true;
	}

	let mut encoded_metadata = Vec::new();
	for block in blocks {
		block.write_to(&mut encoded_metadata)?;
	}

	Ok(Some(encoded_metadata))
}

fn picture_blocks(tag: &Tag) -> impl Iterator<Item = Block> + '_ {
	tag.items().filter_map(|item| match item.value() {
		ItemValue::Picture(picture) => {
			let info = PictureInformation::from_picture(picture).unwrap_or_default();
			Some(Block::new(
				BLOCK_ID_PICTURE,
				picture.as_flac_bytes(info, false),
			))
		},
		// A picture that was never decoded
		ItemValue::Text(encoded)
			if item
				.key()
				.native()
				.is_some_and(|key| {
					key.tag_type() == TagType::VorbisComments
						&& key.key().eq_ignore_ascii_case(PICTURE_KEY)
				}) =>
		{
			match BASE64.decode(encoded.as_bytes()) {
				Ok(content) => Some(Block::new(BLOCK_ID_PICTURE, content)),
				Err(_) => {
					log::warn!("Skipping a picture field with invalid base64");
					None
				},
			}
		},
		_ => None,
	})
}
