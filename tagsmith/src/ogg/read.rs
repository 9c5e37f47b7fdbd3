use super::OggFormat;
use super::comments::read_comments;
use crate::config::ParseOptions;
use crate::error::Result;
use crate::macros::decode_err;
use crate::tag::Tag;

use std::io::{Read, Seek, SeekFrom};

use ogg_pager::{Packets, PageHeader};

/// The header packets of a logical bitstream
pub(super) struct OggHeaders {
	pub(super) stream_serial: u32,
	pub(super) packets: Packets,
	/// Where the first page after the header packets starts
	pub(super) end: u64,
}

impl OggHeaders {
	pub(super) fn comment_packet(&self, format: OggFormat) -> Result<&[u8]> {
		let comment_packet = self
			.packets
			.get(1)
			.ok_or_else(|| decode_err!("OGG: Expected comment packet"))?;
		verify_signature(comment_packet, format.comment_signature())?;

		Ok(&comment_packet[format.comment_signature().len()..])
	}
}

pub(super) fn verify_signature(content: &[u8], sig: &[u8]) -> Result<()> {
	if !content.starts_with(sig) {
		decode_err!(@BAIL "OGG: Expected a header packet signature");
	}

	Ok(())
}

pub(super) fn read_headers<R>(data: &mut R, format: OggFormat) -> Result<OggHeaders>
where
	R: Read + Seek,
{
	data.seek(SeekFrom::Start(0))?;
	let first_page_header = PageHeader::read(data)?;
	log::trace!(
		"First page of stream {}, sequence number {}",
		first_page_header.stream_serial,
		first_page_header.sequence_number
	);

	data.seek(SeekFrom::Start(0))?;
	let packets = Packets::read_count(data, format.header_packet_count())?;

	let identification_packet = packets
		.get(0)
		.ok_or_else(|| decode_err!("OGG: Expected identification packet"))?;
	verify_signature(identification_packet, format.ident_signature())?;

	Ok(OggHeaders {
		stream_serial: first_page_header.stream_serial,
		packets,
		end: data.stream_position()?,
	})
}

pub(super) fn read_tag(
	headers: &OggHeaders,
	format: OggFormat,
	parse_options: ParseOptions,
) -> Result<Tag> {
	log::debug!("Reading {:?} comment header", format);
	read_comments(headers.comment_packet(format)?, parse_options)
}
