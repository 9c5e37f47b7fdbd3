//! ID3 specific items
//!
//! MPEG files can hold two tags at once: an ID3v2 tag at the start of the file, and an ID3v1
//! tag in its final 128 bytes. ID3v2 is the tag that gets written, ID3v1 is only read when no
//! ID3v2 tag exists. See [`WriteOptions::update_id3v1`](crate::config::WriteOptions::update_id3v1).

pub mod v1;
pub mod v2;

use crate::error::Result;
use crate::macros::decode_err;
use crate::rewrite::MetadataRegion;
use crate::util::io::SeekStreamLen;
use v1::constants::ID3V1_TAG_MARKER;
use v2::header::Id3v2Header;

use std::io::{Read, Seek, SeekFrom};

pub(crate) struct ID3FindResults<Header, Content>(pub Option<Header>, pub Content);

/// Look for an ID3v1 tag in the last 128 bytes of `data`
///
/// The region is empty, at the end of the stream, when no tag exists.
pub(crate) fn find_id3v1<R>(data: &mut R) -> Result<ID3FindResults<[u8; 128], MetadataRegion>>
where
	R: Read + Seek + ?Sized,
{
	log::debug!("Searching for an ID3v1 tag");

	let stream_len = data.stream_len_hack()?;

	// Reader is too small to contain an ID3v1 tag
	if stream_len < 128 {
		return Ok(ID3FindResults(None, MetadataRegion::empty_at(stream_len)));
	}

	data.seek(SeekFrom::End(-128))?;

	let mut id3v1_tag = [0; 128];
	data.read_exact(&mut id3v1_tag)?;

	// No ID3v1 tag found
	if id3v1_tag[..3] != ID3V1_TAG_MARKER {
		return Ok(ID3FindResults(None, MetadataRegion::empty_at(stream_len)));
	}

	log::debug!("Found an ID3v1 tag");

	Ok(ID3FindResults(
		Some(id3v1_tag),
		MetadataRegion::new(stream_len - 128, 128),
	))
}

/// Look for an ID3v2 tag at the start of `data`
///
/// The returned content is the tag body, everything between the header and the footer.
pub(crate) fn find_id3v2<R>(
	data: &mut R,
	read: bool,
) -> Result<ID3FindResults<Id3v2Header, (MetadataRegion, Option<Vec<u8>>)>>
where
	R: Read + Seek + ?Sized,
{
	log::debug!("Searching for an ID3v2 tag");

	data.seek(SeekFrom::Start(0))?;

	let mut header_bytes = [0; 10];
	let mut filled = 0;
	while filled < header_bytes.len() {
		match data.read(&mut header_bytes[filled..])? {
			0 => break,
			n => filled += n,
		}
	}

	let no_tag = ID3FindResults(None, (MetadataRegion::empty_at(0), None));
	if filled < header_bytes.len() {
		return Ok(no_tag);
	}

	let Some(header) = Id3v2Header::parse(header_bytes)? else {
		return Ok(no_tag);
	};

	log::debug!(
		"Found an ID3v2.{} tag, {} bytes",
		header.version.major(),
		header.full_tag_size()
	);

	if header.full_tag_size() > data.stream_len_hack()? {
		decode_err!(@BAIL Mpeg, "ID3v2 tag size exceeds the stream length");
	}

	let body = if read {
		Some(crate::util::alloc::read_to_vec(data, u64::from(header.size))?)
	} else {
		None
	};

	let region = MetadataRegion::new(0, header.full_tag_size());
	Ok(ID3FindResults(Some(header), (region, body)))
}
