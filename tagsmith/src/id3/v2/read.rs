use super::frame::content::decode_frame;
use super::frame::read::ParsedFrame;
use super::header::{Id3v2Header, Id3v2Version};
use super::util::synchsafe::resynchronise;
use crate::config::ParseOptions;
use crate::error::Result;
use crate::tag::Tag;
use crate::util::cursor::ByteCursor;

use std::borrow::Cow;

/// Decode the body of an ID3v2 tag (everything after the 10 byte header)
pub(crate) fn parse_id3v2(body: &[u8], header: Id3v2Header, options: ParseOptions) -> Result<Tag> {
	log::debug!(
		"Parsing ID3v2.{} tag, size: {}",
		header.version.major(),
		header.size
	);

	// ID3v2.4 unsynchronises per frame, older versions unsynchronise the entire body
	let whole_body_unsynchronised =
		header.flags.unsynchronisation && header.version != Id3v2Version::V4;

	let body = if whole_body_unsynchronised {
		log::trace!("Resynchronising tag body");
		Cow::Owned(resynchronise(body))
	} else {
		Cow::Borrowed(body)
	};

	let mut cursor = ByteCursor::new(&body);
	header.skip_extended_header(&mut cursor)?;

	let mut tag = Tag::new();
	loop {
		match ParsedFrame::read(
			&mut cursor,
			header.version,
			header.flags.unsynchronisation,
			options,
		)? {
			ParsedFrame::Next(frame) => decode_frame(frame, header.version, options, &mut tag)?,
			// No frame content found or ignored due to errors, but we can expect more frames
			ParsedFrame::Skip => {},
			// No frame content found, and we can expect there are no more frames
			ParsedFrame::Eof => break,
		}
	}

	Ok(tag)
}

#[cfg(test)]
mod tests {
	use super::parse_id3v2;
	use crate::config::ParseOptions;
	use crate::id3::v2::header::Id3v2Header;
	use crate::tag::Accessor;

	#[test_log::test]
	fn whole_tag_unsynchronisation() {
		// ID3v2.3, unsynchronised, "\xFF" title becomes "\xFF\x00" on disk
		let body = b"TIT2\x00\x00\x00\x03\x00\x00\x00\xFF\x00!";
		let header = Id3v2Header::parse(*b"ID3\x03\x00\x80\x00\x00\x00\x0E")
			.unwrap()
			.unwrap();

		let tag = parse_id3v2(body, header, ParseOptions::new()).unwrap();
		assert_eq!(tag.title().as_deref(), Some("\u{ff}!"));
	}

	#[test_log::test]
	fn v2_tag() {
		let body = b"TT2\x00\x00\x06\x00TitleTP1\x00\x00\x07\x00Artist";
		let header = Id3v2Header::parse(*b"ID3\x02\x00\x00\x00\x00\x00\x1A")
			.unwrap()
			.unwrap();

		let tag = parse_id3v2(body, header, ParseOptions::new()).unwrap();
		assert_eq!(tag.title().as_deref(), Some("Title"));
		assert_eq!(tag.artist().as_deref(), Some("Artist"));
	}
}
