//! ASF (WMA) specific items
//!
//! ## File notes
//!
//! Metadata lives in two children of the Header Object: the Content Description object, which
//! holds five fixed strings, and the Extended Content Description object, which holds any number
//! of named descriptors. Writing a tag rebuilds the Header Object in place, leaving every other
//! child untouched, and updates the file size in the File Properties object.
//!
//! Descriptor values that aren't text are kept as [`ItemValue::Binary`](crate::tag::ItemValue)
//! under a native key, prefixed with their 16-bit little endian value type.

mod content;
pub(crate) mod object;

use crate::codec::{Decoded, TagCodec};
use crate::config::{ParseOptions, ParsingMode, WriteOptions};
use crate::error::Result;
use crate::macros::encode_err;
use crate::probe::Container;
use crate::rewrite::{MetadataRegion, Splice};
use crate::tag::{Tag, TagType};
use crate::util::io::{SeekRead, SeekStreamLen};
use object::{
	CONTENT_DESCRIPTION, EXTENDED_CONTENT_DESCRIPTION, FILE_PROPERTIES, Guid, HeaderObject,
	OBJECT_HEADER_LEN, Object, PADDING,
};

use byteorder::{ByteOrder, LittleEndian};

// File ID (16), then the file size
const FILE_SIZE_OFFSET: usize = 16;

/// The codec for ASF content descriptions
#[derive(Copy, Clone, Debug, Default)]
pub struct AsfCodec;

impl TagCodec for AsfCodec {
	fn tag_type(&self) -> TagType {
		TagType::Asf
	}

	fn decode(
		&self,
		reader: &mut dyn SeekRead,
		_container: &Container,
		options: ParseOptions,
	) -> Result<Decoded> {
		let header = HeaderObject::read(reader, options.parsing_mode)?;

		let mut tag = Tag::new();
		let mut region = None;

		for child in &header.children {
			let read = match child.guid {
				CONTENT_DESCRIPTION => {
					content::read_content_description(&child.content, &mut tag, options)
				},
				EXTENDED_CONTENT_DESCRIPTION => {
					content::read_extended_content_description(&child.content, &mut tag, options)
				},
				_ => continue,
			};

			if let Err(e) = read {
				if options.parsing_mode == ParsingMode::Strict {
					return Err(e);
				}

				log::warn!("Failed to read object {}, discarding it: {e}", child.guid);
			}

			region.get_or_insert(child.region);
		}

		match region {
			Some(region) => Ok(Decoded::tagged(tag, region)),
			None => Ok(Decoded::untagged(MetadataRegion::empty_at(
				header.region.end(),
			))),
		}
	}

	fn encode(
		&self,
		reader: &mut dyn SeekRead,
		_container: &Container,
		tag: &Tag,
		options: WriteOptions,
	) -> Result<Vec<Splice>> {
		let header = HeaderObject::read(reader, ParseOptions::DEFAULT_PARSING_MODE)?;
		let objects = content::create_objects(tag)?;

		let mut new_header = header.clone();
		replace_object(
			&mut new_header.children,
			CONTENT_DESCRIPTION,
			objects.content_description,
		);
		replace_object(
			&mut new_header.children,
			EXTENDED_CONTENT_DESCRIPTION,
			objects.extended_content_description,
		);

		if new_header.children == header.children {
			log::debug!("Content descriptions are unchanged");
			return Ok(Vec::new());
		}

		let old_len = header.region.len();
		new_header.children.retain(|o| o.guid != PADDING);

		// Keep the header size if the new objects fit, to avoid moving the audio
		let new_len = new_header.len();
		let padding = if new_len == old_len {
			None
		} else if new_len + OBJECT_HEADER_LEN <= old_len {
			Some(old_len - new_len)
		} else {
			options
				.preferred_padding
				.map(|padding| OBJECT_HEADER_LEN + u64::from(padding))
		};

		if let Some(padding) = padding {
			log::trace!("Adding {padding} bytes of padding");
			new_header.children.push(Object::padding(padding)?);
		}

		let delta = new_header.len() as i64 - old_len as i64;
		if delta != 0 {
			let file_len = reader.stream_len_hack()?;
			update_file_size(&mut new_header, file_len, delta)?;
		}

		log::debug!("Header Object changes by {delta} bytes");

		let mut content = Vec::new();
		new_header.write_to(&mut content)?;
		Ok(vec![Splice::new(header.region, content)])
	}
}

/// Replace the first object of a type, removing the others, or append it if missing
fn replace_object(children: &mut Vec<Object>, guid: Guid, content: Option<Vec<u8>>) {
	let mut content = content;
	children.retain_mut(|object| {
		if object.guid != guid {
			return true;
		}

		match content.take() {
			Some(new_content) => {
				object.content = new_content;
				true
			},
			None => false,
		}
	});

	if let Some(content) = content {
		// Before any padding, so it can still be reused
		let pos = children
			.iter()
			.position(|o| o.guid == PADDING)
			.unwrap_or(children.len());
		children.insert(pos, Object::new(guid, content));
	}
}

fn update_file_size(header: &mut HeaderObject, file_len: u64, delta: i64) -> Result<()> {
	let Some(properties) = header
		.children
		.iter_mut()
		.find(|o| o.guid == FILE_PROPERTIES)
	else {
		log::warn!("No File Properties object found, unable to update the file size");
		return Ok(());
	};

	let Some(field) = properties
		.content
		.get_mut(FILE_SIZE_OFFSET..FILE_SIZE_OFFSET + 8)
	else {
		encode_err!(@BAIL Asf, "File Properties object is too short");
	};

	// Zero when the file is a broadcast
	if LittleEndian::read_u64(field) == 0 {
		return Ok(());
	}

	let Some(new_size) = file_len.checked_add_signed(delta) else {
		encode_err!(@BAIL Asf, "File size out of range after rewrite");
	};

	LittleEndian::write_u64(field, new_size);
	Ok(())
}
