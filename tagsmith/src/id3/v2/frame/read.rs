use super::{ENCRYPTED_FRAME_SUFFIX, EncryptedFrame, RawFrame};
use super::header::{FrameHeader, parse_header};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::{Id3v2Error, Id3v2ErrorKind, Result};
use crate::id3::v2::Id3v2Version;
use crate::id3::v2::util::synchsafe::resynchronise;
use crate::macros::parse_mode_choice;
use crate::util::cursor::ByteCursor;

pub(crate) enum ParsedFrame {
	Next(RawFrame),
	Skip,
	Eof,
}

impl ParsedFrame {
	/// Read the next frame from `cursor`
	///
	/// `tag_unsynchronised` is the tag header flag. For ID3v2.4 it applies to every frame, for
	/// the older versions the whole body has already been resynchronised.
	pub(crate) fn read(
		cursor: &mut ByteCursor<'_>,
		version: Id3v2Version,
		tag_unsynchronised: bool,
		parse_options: ParseOptions,
	) -> Result<Self> {
		let parse_mode = parse_options.parsing_mode;

		let Some(header) = parse_header(cursor, version)? else {
			// Stop reading
			return Ok(Self::Eof);
		};

		let mut size = header.size as usize;
		if size > cursor.remaining() {
			parse_mode_choice!(
				parse_mode,
				STRICT: return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into()),
				BESTATTEMPT: {
					log::warn!(
						"Frame {:?} claims {} bytes, only {} remain, stopping",
						header.id_str(),
						size,
						cursor.remaining()
					);
					return Ok(Self::Eof);
				},
				RELAXED: {
					log::warn!(
						"Frame {:?} claims {} bytes, only {} remain, clamping",
						header.id_str(),
						size,
						cursor.remaining()
					);
					size = cursor.remaining();
				},
			);
		}

		let content = cursor.read_bytes(size)?;

		if !header.has_valid_id() {
			parse_mode_choice!(
				parse_mode,
				STRICT: return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameId(header.id)).into()),
				BESTATTEMPT: {
					log::warn!("Found an invalid frame ID {:?}, skipping", header.id_str());
					return Ok(Self::Skip);
				},
				RELAXED: log::warn!("Found an invalid frame ID {:?}, keeping it", header.id_str()),
			);
		}

		if content.is_empty() {
			if parse_mode == ParsingMode::Strict {
				return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into());
			}

			log::debug!("Encountered a zero length frame, skipping");
			return Ok(Self::Skip);
		}

		let unsynchronised =
			version == Id3v2Version::V4 && (header.flags.unsynchronisation || tag_unsynchronised);

		let id = if header.flags.encryption {
			format!("{}{ENCRYPTED_FRAME_SUFFIX}", header.id_str())
		} else {
			header.id_str()
		};

		match decode_content(&header, content, version, unsynchronised, parse_mode)? {
			Some(content) => Ok(Self::Next(RawFrame { id, content })),
			None => Ok(Self::Skip),
		}
	}
}

// Strips the flag data, unsynchronisation, and compression from a frame's content
//
// Encrypted frames are returned in their `EncryptedFrame` layout instead
fn decode_content(
	header: &FrameHeader,
	content: &[u8],
	version: Id3v2Version,
	unsynchronised: bool,
	parse_mode: ParsingMode,
) -> Result<Option<Vec<u8>>> {
	let flags = header.flags;
	let mut content = ByteCursor::new(content);
	let bad_length = || Id3v2Error::new(Id3v2ErrorKind::BadFrameLength);

	let mut data_length = None;
	let mut method = None;
	match version {
		Id3v2Version::V4 => {
			if flags.grouping_identity {
				log::trace!("Skipping group identifier");
				content.skip(1).map_err(|_| bad_length())?;
			}

			if flags.encryption {
				method = Some(content.read_u8().map_err(|_| bad_length())?);
			}

			if flags.data_length_indicator {
				log::trace!("Reading data length indicator");
				data_length = Some(content.read_synchsafe_u32().map_err(|_| bad_length())?);
			}
		},
		Id3v2Version::V3 => {
			if flags.compression {
				data_length = Some(
					content
						.read_u32::<byteorder::BigEndian>()
						.map_err(|_| bad_length())?,
				);
			}

			if flags.encryption {
				method = Some(content.read_u8().map_err(|_| bad_length())?);
			}

			if flags.grouping_identity {
				content.skip(1).map_err(|_| bad_length())?;
			}
		},
		Id3v2Version::V2 => {},
	}

	let rest = content.read_rest();
	let content = if unsynchronised {
		resynchronise(rest)
	} else {
		rest.to_vec()
	};

	if let Some(method) = method {
		log::warn!(
			"Keeping encrypted frame {:?} as is, its decryption method is unknown",
			header.id_str()
		);

		let encrypted = EncryptedFrame {
			method,
			compressed: flags.compression,
			data_length,
			payload: &content,
		};
		return Ok(Some(encrypted.to_bytes()));
	}

	if !flags.compression {
		return Ok(Some(content));
	}

	if data_length.is_none() && version == Id3v2Version::V4 {
		if parse_mode == ParsingMode::Strict {
			return Err(Id3v2Error::new(Id3v2ErrorKind::MissingDataLengthIndicator).into());
		}

		log::warn!("Compressed frame {:?} has no data length indicator", header.id_str());
	}

	decompress(header, &content, data_length, parse_mode)
}

#[cfg(feature = "id3v2_compression_support")]
fn decompress(
	header: &FrameHeader,
	content: &[u8],
	data_length: Option<u32>,
	_parse_mode: ParsingMode,
) -> Result<Option<Vec<u8>>> {
	use crate::util::alloc::ALLOCATION_LIMIT;

	use std::io::Read;

	log::trace!("Decompressing frame {:?}", header.id_str());

	let capacity = data_length.map_or(content.len(), |len| len as usize);

	let mut decompressed = Vec::new();
	decompressed.try_reserve(capacity.min(ALLOCATION_LIMIT))?;

	flate2::read::ZlibDecoder::new(content)
		.take(ALLOCATION_LIMIT as u64 + 1)
		.read_to_end(&mut decompressed)
		.map_err(|e| Id3v2Error::new(Id3v2ErrorKind::Decompression(e)))?;

	if decompressed.len() > ALLOCATION_LIMIT {
		crate::macros::err!(TooMuchData);
	}

	Ok(Some(decompressed))
}

#[cfg(not(feature = "id3v2_compression_support"))]
fn decompress(
	header: &FrameHeader,
	_content: &[u8],
	_data_length: Option<u32>,
	parse_mode: ParsingMode,
) -> Result<Option<Vec<u8>>> {
	if parse_mode == ParsingMode::Strict {
		return Err(Id3v2Error::new(Id3v2ErrorKind::CompressedFrameEncountered).into());
	}

	log::warn!(
		"Skipping compressed frame {:?}, support is disabled",
		header.id_str()
	);
	Ok(None)
}
