use super::OggFormat;
use super::comments::{DEFAULT_VENDOR, create_comments, read_vendor};
use super::read::OggHeaders;
use crate::error::Result;
use crate::macros::encode_err;
use crate::rewrite::{MetadataRegion, Splice};
use crate::tag::Tag;
use crate::util::io::SeekStreamLen;

use std::io::{Read, Seek, SeekFrom};

use ogg_pager::{CONTAINS_FIRST_PAGE_OF_BITSTREAM, Page};

// The sequence number and CRC of a page header, 4 bytes each
const SEQUENCE_OFFSET: usize = 18;

pub(super) fn create_comment_packet(
	headers: &OggHeaders,
	format: OggFormat,
	tag: &Tag,
) -> Result<Vec<u8>> {
	// Retain the stream's vendor string
	let vendor = headers
		.comment_packet(format)
		.ok()
		.and_then(read_vendor)
		.unwrap_or_else(|| String::from(DEFAULT_VENDOR));

	let mut packet = format.comment_signature().to_vec();
	packet.extend(create_comments(&vendor, tag, true)?);

	if format == OggFormat::Vorbis {
		// Vorbis separates the header packets with a "framing bit"
		packet.push(1);
	}

	Ok(packet)
}

/// Replace the comment packet, renumbering the pages that follow if the header page count changes
///
/// Renumbering reads one page at a time and only patches the sequence number and CRC of each
/// page header, the page content is left to the rewriter to copy.
pub(super) fn write_headers<R>(
	data: &mut R,
	mut headers: OggHeaders,
	comment_packet: Vec<u8>,
) -> Result<Vec<Splice>>
where
	R: Read + Seek,
{
	headers.packets.set(1, comment_packet);

	let mut new_headers = Vec::new();
	let pages_written = headers.packets.write_to(
		&mut new_headers,
		headers.stream_serial,
		0,
		CONTAINS_FIRST_PAGE_OF_BITSTREAM,
	)? as u32;

	let stream_len = data.stream_len_hack()?;
	data.seek(SeekFrom::Start(headers.end))?;

	let first_following = match Page::read(data) {
		Ok(page) => Some(page),
		Err(_) if headers.end >= stream_len => None,
		// The last header packet ended mid-page
		Err(_) => encode_err!(@BAIL "OGG: Header packets share a page with audio data"),
	};

	let renumber_by = match first_following {
		Some(page) if page.header().stream_serial == headers.stream_serial => {
			i64::from(pages_written) - i64::from(page.header().sequence_number)
		},
		_ => 0,
	};

	let mut splices = vec![Splice::new(
		MetadataRegion::new(0, headers.end),
		new_headers,
	)];

	if renumber_by == 0 {
		return Ok(splices);
	}

	log::debug!("Header page count changed, renumbering the following pages by {renumber_by}");

	data.seek(SeekFrom::Start(headers.end))?;
	loop {
		let position = data.stream_position()?;
		if position >= stream_len {
			break;
		}

		let mut page = match Page::read(data) {
			Ok(page) => page,
			Err(_) => {
				log::warn!("Unable to read an Ogg page, keeping the rest of the stream as is");
				break;
			},
		};

		// Other logical bitstreams keep their numbering
		if page.header().stream_serial != headers.stream_serial {
			continue;
		}

		let header = page.header_mut();
		header.sequence_number = (i64::from(header.sequence_number) + renumber_by) as u32;
		page.gen_crc();

		let bytes = page.as_bytes();
		splices.push(Splice::new(
			MetadataRegion::new(position + SEQUENCE_OFFSET as u64, 8),
			bytes[SEQUENCE_OFFSET..SEQUENCE_OFFSET + 8].to_vec(),
		));
	}

	Ok(splices)
}
