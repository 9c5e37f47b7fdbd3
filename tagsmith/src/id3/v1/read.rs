use super::constants::{GENRES, ID3V1_TAG_MARKER};
use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::{decode_err, err};
use crate::tag::{Accessor, Tag};
use crate::util::text::latin1_decode;

/// Decode a 128 byte ID3v1 tag
///
/// An ID3v1.1 track number is read when the comment field's 29th byte is null and the 30th
/// is not.
pub(crate) fn parse_id3v1(bytes: [u8; 128], parse_mode: ParsingMode) -> Result<Tag> {
	let mut tag = Tag::new();

	if bytes[..3] != ID3V1_TAG_MARKER {
		decode_err!(@BAIL Mpeg, "ID3v1 tag is missing its marker");
	}

	let fields = &bytes[3..];

	if let Some(title) = decode_text(&fields[..30]) {
		tag.set_title(title);
	}

	if let Some(artist) = decode_text(&fields[30..60]) {
		tag.set_artist(artist);
	}

	if let Some(album) = decode_text(&fields[60..90]) {
		tag.set_album(album);
	}

	if let Some(year) = parse_year(&fields[90..94], parse_mode)? {
		tag.set_year(year);
	}

	let comment_range = if fields[122] == 0 && fields[123] != 0 {
		tag.set_track(u32::from(fields[123]));
		94..122
	} else {
		94..124
	};

	if let Some(comment) = decode_text(&fields[comment_range]) {
		tag.set_comment(comment);
	}

	match GENRES.get(usize::from(fields[124])) {
		Some(genre) => tag.set_genre((*genre).to_owned()),
		// 255 is the usual "no genre" marker
		None if fields[124] == 255 => {},
		None => log::warn!("ID3v1 tag has an unknown genre index ({})", fields[124]),
	}

	Ok(tag)
}

// Fields are null or space padded
fn decode_text(data: &[u8]) -> Option<String> {
	let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
	if data[end..].iter().any(|&b| b != 0) {
		log::warn!("ID3v1 text field contains trailing junk, ignoring it");
	}

	let text = latin1_decode(&data[..end]);
	let text = text.trim_end_matches(' ');
	if text.is_empty() {
		return None;
	}

	Some(text.to_owned())
}

fn parse_year(field: &[u8], parse_mode: ParsingMode) -> Result<Option<u32>> {
	// Most writers leave an empty year as nulls rather than "0000"
	if field.iter().all(|&b| b == 0 || b == b' ') {
		return Ok(None);
	}

	if !field.iter().all(u8::is_ascii_digit) {
		if parse_mode == ParsingMode::Strict {
			err!(TextDecode("ID3v1 year field contains non-digit characters"));
		}

		log::warn!("ID3v1 year field contains non-digit characters, ignoring it");
		return Ok(None);
	}

	Ok(Some(
		field
			.iter()
			.fold(0, |year, digit| year * 10 + u32::from(digit - b'0')),
	))
}

#[cfg(test)]
mod tests {
	use super::parse_id3v1;
	use crate::config::ParsingMode;
	use crate::tag::Accessor;

	fn raw_tag(comment: &[u8; 30], year: &[u8; 4], genre: u8) -> [u8; 128] {
		let mut tag = [0; 128];
		tag[..3].copy_from_slice(b"TAG");
		tag[3..8].copy_from_slice(b"Title");
		tag[33..39].copy_from_slice(b"Artist");
		tag[63..68].copy_from_slice(b"Album");
		tag[93..97].copy_from_slice(year);
		tag[97..127].copy_from_slice(comment);
		tag[127] = genre;
		tag
	}

	#[test_log::test]
	fn id3v1_1() {
		let mut comment = [0; 30];
		comment[..7].copy_from_slice(b"Comment");
		comment[29] = 7;

		let tag = parse_id3v1(raw_tag(&comment, b"1999", 17), ParsingMode::Strict).unwrap();
		assert_eq!(tag.title().as_deref(), Some("Title"));
		assert_eq!(tag.artist().as_deref(), Some("Artist"));
		assert_eq!(tag.album().as_deref(), Some("Album"));
		assert_eq!(tag.year(), Some(1999));
		assert_eq!(tag.comment().as_deref(), Some("Comment"));
		assert_eq!(tag.track(), Some(7));
		assert_eq!(tag.genre().as_deref(), Some("Rock"));
	}

	#[test_log::test]
	fn id3v1_0() {
		let mut comment = [b' '; 30];
		comment[..4].copy_from_slice(b"Long");
		comment[29] = b'!';

		let tag = parse_id3v1(raw_tag(&comment, b"\0\0\0\0", 255), ParsingMode::Strict).unwrap();
		assert_eq!(
			tag.comment().as_deref(),
			Some("Long                         !")
		);
		assert_eq!(tag.track(), None);
		assert_eq!(tag.year(), None);
		assert_eq!(tag.genre(), None);
	}

	#[test_log::test]
	fn bad_year() {
		let tag = raw_tag(&[0; 30], b"19x9", 0);

		assert!(parse_id3v1(tag, ParsingMode::Strict).is_err());

		let tag = parse_id3v1(tag, ParsingMode::BestAttempt).unwrap();
		assert_eq!(tag.year(), None);
		assert_eq!(tag.genre().as_deref(), Some("Blues"));
	}
}
