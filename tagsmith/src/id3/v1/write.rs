use super::constants::{ID3V1_TAG_MARKER, genre_index};
use crate::config::WriteOptions;
use crate::error::Result;
use crate::tag::{Accessor, Tag};
use crate::util::text::latin1_encode;

/// Whether `tag` holds anything ID3v1 can store
pub(crate) fn has_id3v1_fields(tag: &Tag) -> bool {
	tag.title().is_some()
		|| tag.artist().is_some()
		|| tag.album().is_some()
		|| tag.year().is_some()
		|| tag.comment().is_some()
		|| tag.track().is_some()
		|| tag.genre().is_some()
}

/// Create a 128 byte ID3v1.1 tag from `tag`
///
/// Text is truncated to fit its field. Values that don't fit at all (track numbers above 255,
/// genres outside of the genre list) are left out.
pub(crate) fn encode(tag: &Tag, write_options: WriteOptions) -> Result<[u8; 128]> {
	fn write_field(out: &mut [u8], value: Option<&str>, lossy: bool) -> Result<()> {
		let Some(value) = value else {
			return Ok(());
		};

		for (slot, byte) in out.iter_mut().zip(latin1_encode(value, lossy)) {
			*slot = byte?;
		}

		Ok(())
	}

	let lossy = write_options.lossy_text_encoding;
	let mut out = [0; 128];

	out[..3].copy_from_slice(&ID3V1_TAG_MARKER);
	write_field(&mut out[3..33], tag.title().as_deref(), lossy)?;
	write_field(&mut out[33..63], tag.artist().as_deref(), lossy)?;
	write_field(&mut out[63..93], tag.album().as_deref(), lossy)?;

	if let Some(year) = tag.year() {
		let year = format!("{:04}", year.min(9999));
		out[93..97].copy_from_slice(year.as_bytes());
	}

	// 28 bytes, leaving room for the ID3v1.1 track number
	write_field(&mut out[97..125], tag.comment().as_deref(), lossy)?;

	match tag.track().map(u8::try_from) {
		Some(Ok(track)) => out[126] = track,
		Some(Err(_)) => log::warn!("Track number does not fit in ID3v1, skipping"),
		None => {},
	}

	out[127] = match tag.genre() {
		Some(genre) => genre_index(&genre).unwrap_or_else(|| {
			log::warn!("Genre {:?} is not in the ID3v1 genre list, skipping", genre);
			255
		}),
		None => 255,
	};

	Ok(out)
}
