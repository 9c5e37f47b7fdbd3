//! Embedded artwork
//!
//! A [`Picture`] is stored in a [`Tag`](crate::tag::Tag) under
//! [`ItemKey::Artwork`](crate::tag::ItemKey::Artwork). [`PictureInformation`] holds the image
//! properties FLAC picture blocks carry alongside the data.

use crate::config::ParsingMode;
use crate::error::{ErrorKind, Result, TagError};
use crate::macros::err;
use crate::util::cursor::ByteCursor;
use crate::util::text::utf8_decode;

use std::fmt::{Debug, Display, Formatter};
use std::io::Read;

use byteorder::{BigEndian, LittleEndian};
use data_encoding::BASE64;

/// The image format of a [`Picture`]
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum MimeType {
	/// `image/png`
	Png,
	/// `image/jpeg`
	Jpeg,
	/// `image/tiff`
	Tiff,
	/// `image/bmp`
	Bmp,
	/// `image/gif`
	Gif,
	/// Any other MIME type, as written in the tag
	Unknown(String),
}

// MIME type, file extension, ID3v2.2 `PIC` format
type FormatNames = (&'static str, &'static str, &'static str);

impl MimeType {
	const KNOWN: [MimeType; 5] = [
		MimeType::Png,
		MimeType::Jpeg,
		MimeType::Tiff,
		MimeType::Bmp,
		MimeType::Gif,
	];

	fn names(&self) -> Option<FormatNames> {
		Some(match self {
			MimeType::Png => ("image/png", "png", "PNG"),
			MimeType::Jpeg => ("image/jpeg", "jpg", "JPG"),
			MimeType::Tiff => ("image/tiff", "tif", "TIF"),
			MimeType::Bmp => ("image/bmp", "bmp", "BMP"),
			MimeType::Gif => ("image/gif", "gif", "GIF"),
			MimeType::Unknown(_) => return None,
		})
	}

	/// Parse a MIME type, case insensitively
	///
	/// `image/jpg` is accepted as an alias of `image/jpeg`.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::picture::MimeType;
	///
	/// assert_eq!(MimeType::from_str("IMAGE/JPG"), MimeType::Jpeg);
	/// assert_eq!(
	/// 	MimeType::from_str("image/webp"),
	/// 	MimeType::Unknown(String::from("image/webp"))
	/// );
	/// ```
	#[must_use]
	#[allow(clippy::should_implement_trait)] // Infallible in contrast to FromStr
	pub fn from_str(mime_type: &str) -> Self {
		let lower = mime_type.to_ascii_lowercase();
		if lower == "image/jpg" {
			return MimeType::Jpeg;
		}

		Self::KNOWN
			.into_iter()
			.find(|known| known.names().is_some_and(|(mime, ..)| mime == lower))
			.unwrap_or_else(|| MimeType::Unknown(mime_type.to_owned()))
	}

	/// The MIME type as written in tags
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::picture::MimeType;
	///
	/// assert_eq!(MimeType::Png.as_str(), "image/png");
	/// ```
	#[must_use]
	pub fn as_str(&self) -> &str {
		match (self, self.names()) {
			(_, Some((mime, ..))) => mime,
			(MimeType::Unknown(unknown), None) => unknown,
			_ => "",
		}
	}

	/// The usual file extension, if the format is known
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::picture::MimeType;
	///
	/// assert_eq!(MimeType::Jpeg.ext(), Some("jpg"));
	/// ```
	pub fn ext(&self) -> Option<&str> {
		self.names().map(|(_, ext, _)| ext)
	}

	/// The known format behind the 3 character format of an ID3v2.2 `PIC` frame
	pub(crate) fn from_id3v22_format(format: &[u8; 3]) -> Option<Self> {
		Self::KNOWN
			.into_iter()
			.find(|known| known.names().is_some_and(|(.., f)| f.as_bytes() == format))
	}
}

impl Display for MimeType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// What a picture shows, as numbered by ID3v2 `APIC` frames and FLAC picture blocks
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum PictureType {
	Other,
	Icon,
	OtherIcon,
	CoverFront,
	CoverBack,
	Leaflet,
	Media,
	LeadArtist,
	Artist,
	Conductor,
	Band,
	Composer,
	Lyricist,
	RecordingLocation,
	DuringRecording,
	DuringPerformance,
	ScreenCapture,
	BrightFish,
	Illustration,
	BandLogo,
	PublisherLogo,
	/// A number outside of the defined range
	Undefined(u8),
}

impl PictureType {
	// Indexed by the numeric value
	const DEFINED: [PictureType; 21] = [
		Self::Other,
		Self::Icon,
		Self::OtherIcon,
		Self::CoverFront,
		Self::CoverBack,
		Self::Leaflet,
		Self::Media,
		Self::LeadArtist,
		Self::Artist,
		Self::Conductor,
		Self::Band,
		Self::Composer,
		Self::Lyricist,
		Self::RecordingLocation,
		Self::DuringRecording,
		Self::DuringPerformance,
		Self::ScreenCapture,
		Self::BrightFish,
		Self::Illustration,
		Self::BandLogo,
		Self::PublisherLogo,
	];

	/// The numeric value of the picture type
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::picture::PictureType;
	///
	/// assert_eq!(PictureType::CoverFront.as_u8(), 3);
	/// assert_eq!(PictureType::Undefined(99).as_u8(), 99);
	/// ```
	pub fn as_u8(&self) -> u8 {
		if let Self::Undefined(value) = self {
			return *value;
		}

		Self::DEFINED
			.iter()
			.position(|ty| ty == self)
			.map_or(0, |pos| pos as u8)
	}

	/// The picture type for a numeric value
	pub fn from_u8(byte: u8) -> Self {
		Self::DEFINED
			.get(usize::from(byte))
			.copied()
			.unwrap_or(Self::Undefined(byte))
	}
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Image properties stored alongside a FLAC `PICTURE` block
///
/// Unknown values are `0`. See [`Picture::as_flac_bytes`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct PictureInformation {
	/// Width in pixels
	pub width: u32,
	/// Height in pixels
	pub height: u32,
	/// Bits per pixel
	pub color_depth: u32,
	/// Palette size, `0` for images without a palette
	pub num_colors: u32,
}

impl PictureInformation {
	/// Read the properties of a PNG, JPEG, GIF or BMP picture
	///
	/// Any other format, or a damaged image header, gives zeroed out information.
	///
	/// # Errors
	///
	/// * `picture.data` is shorter than 8 bytes
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::picture::{Picture, PictureInformation};
	///
	/// # fn main() -> tagsmith::error::Result<()> {
	/// // 3x2, with an 8 color global table
	/// let gif = b"GIF89a\x03\x00\x02\x00\xA2\x00\x00".to_vec();
	/// let picture = Picture::from_reader(&mut &gif[..])?;
	///
	/// let info = PictureInformation::from_picture(&picture)?;
	/// assert_eq!((info.width, info.height, info.num_colors), (3, 2, 8));
	/// # Ok(()) }
	/// ```
	pub fn from_picture(picture: &Picture) -> Result<Self> {
		let data = picture.data();
		if data.len() < 8 {
			err!(NotAPicture);
		}

		let parse: fn(&[u8]) -> Result<Self> = match data {
			[0x89, b'P', b'N', b'G', ..] => Self::from_png,
			[0xFF, 0xD8, 0xFF, ..] => Self::from_jpeg,
			[b'G', b'I', b'F', b'8', ..] => Self::from_gif,
			[b'B', b'M', ..] => Self::from_bmp,
			_ => return Ok(Self::default()),
		};

		Ok(parse(data).unwrap_or_default())
	}

	/// Read the `IHDR` chunk of a PNG, and the `PLTE` chunk of indexed images
	///
	/// # Errors
	///
	/// * `data` doesn't start with a PNG signature and an `IHDR` chunk
	pub fn from_png(data: &[u8]) -> Result<Self> {
		let mut reader = ByteCursor::new(data);

		if reader.read_array::<8>()? != PNG_SIGNATURE {
			err!(NotAPicture);
		}

		let ihdr_len = reader.read_u32::<BigEndian>()?;
		if reader.read_array::<4>()? != *b"IHDR" || ihdr_len < 13 {
			err!(NotAPicture);
		}

		let width = reader.read_u32::<BigEndian>()?;
		let height = reader.read_u32::<BigEndian>()?;
		let bit_depth = u32::from(reader.read_u8()?);
		let color_type = reader.read_u8()?;

		let channels = match color_type {
			// Truecolor
			2 => 3,
			// Grayscale with alpha, truecolor with alpha
			4 | 6 => 4,
			_ => 1,
		};

		let mut info = Self {
			width,
			height,
			color_depth: bit_depth * channels,
			num_colors: 0,
		};

		if color_type == 3 {
			// Rest of IHDR, then its CRC
			reader.skip(ihdr_len as usize - 10 + 4)?;
			info.num_colors = find_png_palette(&mut reader).map_or(0, |len| len / 3);
		}

		Ok(info)
	}

	/// Read the start of frame segment of a baseline or progressive JPEG
	///
	/// # Errors
	///
	/// * `data` doesn't start with an SOI marker
	/// * The image data starts before any `SOF0`/`SOF2` segment
	pub fn from_jpeg(data: &[u8]) -> Result<Self> {
		const START_OF_SCAN: u8 = 0xDA;
		const BASELINE: u8 = 0xC0;
		const PROGRESSIVE: u8 = 0xC2;

		let mut reader = ByteCursor::new(data);

		if reader.read_array::<2>()? != [0xFF, 0xD8] {
			err!(NotAPicture);
		}

		loop {
			let [0xFF, marker] = reader.read_array::<2>()? else {
				err!(NotAPicture);
			};

			// Segment lengths count themselves
			let Some(segment_len) = reader.read_u16::<BigEndian>()?.checked_sub(2) else {
				err!(NotAPicture);
			};

			match marker {
				START_OF_SCAN => err!(NotAPicture),
				BASELINE | PROGRESSIVE => {
					let precision = u32::from(reader.read_u8()?);
					let height = u32::from(reader.read_u16::<BigEndian>()?);
					let width = u32::from(reader.read_u16::<BigEndian>()?);
					let components = u32::from(reader.read_u8()?);

					return Ok(Self {
						width,
						height,
						color_depth: precision * components,
						num_colors: 0,
					});
				},
				_ => reader.skip(usize::from(segment_len))?,
			}
		}
	}

	/// Attempt to extract [`PictureInformation`] from a GIF
	///
	/// # Errors
	///
	/// * `data` is not a GIF87a/GIF89a image, or its logical screen descriptor is truncated
	pub fn from_gif(data: &[u8]) -> Result<Self> {
		let mut reader = ByteCursor::new(data);

		let sig = reader.read_array::<6>()?;
		if !matches!(&sig, b"GIF87a" | b"GIF89a") {
			err!(NotAPicture);
		}

		let width = u32::from(reader.read_u16::<LittleEndian>()?);
		let height = u32::from(reader.read_u16::<LittleEndian>()?);
		let packed = reader.read_u8()?;

		let color_depth = u32::from((packed >> 4) & 0b111) + 1;
		let num_colors = if packed & 0x80 == 0x80 {
			1 << (u32::from(packed & 0b111) + 1)
		} else {
			0
		};

		Ok(Self {
			width,
			height,
			color_depth,
			num_colors,
		})
	}

	/// Attempt to extract [`PictureInformation`] from a BMP
	///
	/// Both the OS/2 `BITMAPCOREHEADER` and the Windows `BITMAPINFOHEADER` (and its
	/// extensions) are understood.
	///
	/// # Errors
	///
	/// * `data` is not a BMP, or its DIB header is truncated
	pub fn from_bmp(data: &[u8]) -> Result<Self> {
		let mut reader = ByteCursor::new(data);

		if reader.read_array::<2>()? != *b"BM" {
			err!(NotAPicture);
		}

		// File size (4), reserved (4), pixel array offset (4)
		reader.skip(12)?;

		let header_size = reader.read_u32::<LittleEndian>()?;
		match header_size {
			12 => {
				let width = u32::from(reader.read_u16::<LittleEndian>()?);
				let height = u32::from(reader.read_u16::<LittleEndian>()?);
				let _planes = reader.read_u16::<LittleEndian>()?;
				let color_depth = u32::from(reader.read_u16::<LittleEndian>()?);

				Ok(Self {
					width,
					height,
					color_depth,
					num_colors: 0,
				})
			},
			40.. => {
				let width = reader.read_u32::<LittleEndian>()? as i32;
				// Negative heights describe top-down bitmaps
				let height = reader.read_u32::<LittleEndian>()? as i32;
				let _planes = reader.read_u16::<LittleEndian>()?;
				let color_depth = u32::from(reader.read_u16::<LittleEndian>()?);

				// Compression (4), image size (4), horizontal and vertical resolution (8)
				reader.skip(16)?;
				let num_colors = reader.read_u32::<LittleEndian>()?;

				Ok(Self {
					width: width.unsigned_abs(),
					height: height.unsigned_abs(),
					color_depth,
					num_colors,
				})
			},
			_ => err!(NotAPicture),
		}
	}
}

/// Assembles a [`Picture`] from [`Picture::unchecked`]
#[derive(Debug)]
pub struct PictureBuilder {
	pic_type: PictureType,
	mime_type: Option<MimeType>,
	description: Option<String>,
	data: Vec<u8>,
}

impl PictureBuilder {
	fn new(data: Vec<u8>) -> Self {
		Self {
			pic_type: PictureType::Other,
			mime_type: None,
			description: None,
			data,
		}
	}

	/// Defaults to [`PictureType::Other`]
	pub fn pic_type(mut self, pic_type: PictureType) -> Self {
		self.pic_type = pic_type;
		self
	}

	/// Defaults to none
	pub fn mime_type(mut self, mime_type: MimeType) -> Self {
		self.mime_type = Some(mime_type);
		self
	}

	/// Defaults to none
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Finish the picture
	pub fn build(self) -> Picture {
		Picture {
			pic_type: self.pic_type,
			mime_type: self.mime_type,
			description: self.description,
			data: self.data,
		}
	}
}

/// Embedded artwork
///
/// A [`Tag`](crate::tag::Tag) keeps pictures under
/// [`ItemKey::Artwork`](crate::tag::ItemKey::Artwork).
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Picture {
	pub(crate) pic_type: PictureType,
	pub(crate) mime_type: Option<MimeType>,
	pub(crate) description: Option<String>,
	pub(crate) data: Vec<u8>,
}

impl Debug for Picture {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		// The data itself is rarely useful in debug output
		write!(
			f,
			"Picture {{ {:?}, {:?}, {:?}, {} bytes }}",
			self.pic_type,
			self.mime_type,
			self.description,
			self.data.len()
		)
	}
}

impl Picture {
	/// Read an image file, detecting its [`MimeType`] from its signature
	///
	/// The type is [`PictureType::Other`], set another with [`Picture::set_pic_type`].
	///
	/// # Errors
	///
	/// * Fewer than 8 bytes could be read
	/// * The signature isn't one of PNG, JPEG, GIF, BMP or TIFF
	pub fn from_reader<R>(reader: &mut R) -> Result<Self>
	where
		R: Read,
	{
		let mut data = Vec::new();
		reader.read_to_end(&mut data)?;

		let mime_type = Self::mimetype_from_bin(&data)?;
		Ok(Self::unchecked(data).mime_type(mime_type).build())
	}

	/// Start a picture from `data`, trusting the caller on its format
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::picture::{MimeType, Picture, PictureType};
	///
	/// let picture = Picture::unchecked(vec![0xFF, 0xD8, 0xFF, 0xE0])
	/// 	.pic_type(PictureType::Band)
	/// 	.mime_type(MimeType::Jpeg)
	/// 	.description("The band on stage")
	/// 	.build();
	///
	/// assert_eq!(picture.pic_type(), PictureType::Band);
	/// ```
	pub fn unchecked(data: Vec<u8>) -> PictureBuilder {
		PictureBuilder::new(data)
	}

	/// What the picture shows
	pub fn pic_type(&self) -> PictureType {
		self.pic_type
	}

	/// Change what the picture shows
	pub fn set_pic_type(&mut self, pic_type: PictureType) {
		self.pic_type = pic_type
	}

	/// The image format, fixed when the picture is created
	pub fn mime_type(&self) -> Option<&MimeType> {
		self.mime_type.as_ref()
	}

	/// The MIME type as a string, empty if unknown
	pub fn mime_str(&self) -> &str {
		self.mime_type.as_ref().map_or("", MimeType::as_str)
	}

	/// A free form caption
	pub fn description(&self) -> Option<&str> {
		self.description.as_deref()
	}

	/// Change or clear the caption
	pub fn set_description(&mut self, description: Option<String>) {
		self.description = description;
	}

	/// The encoded image
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Take the encoded image
	pub fn into_data(self) -> Vec<u8> {
		self.data
	}

	/// Encode the picture as the body of a FLAC `PICTURE` block
	///
	/// With `encode`, the body is base64 encoded for use in a `METADATA_BLOCK_PICTURE` Vorbis
	/// comment. The block header is not included.
	pub fn as_flac_bytes(&self, picture_information: PictureInformation, encode: bool) -> Vec<u8> {
		fn push_sized(out: &mut Vec<u8>, bytes: &[u8]) {
			out.extend((bytes.len() as u32).to_be_bytes());
			out.extend(bytes);
		}

		let mime = self.mime_str().as_bytes();
		let description = self.description.as_deref().unwrap_or_default().as_bytes();

		let mut body = Vec::with_capacity(32 + mime.len() + description.len() + self.data.len());
		body.extend(u32::from(self.pic_type.as_u8()).to_be_bytes());
		push_sized(&mut body, mime);
		push_sized(&mut body, description);

		let PictureInformation {
			width,
			height,
			color_depth,
			num_colors,
		} = picture_information;
		for field in [width, height, color_depth, num_colors] {
			body.extend(field.to_be_bytes());
		}

		push_sized(&mut body, &self.data);

		if encode {
			return BASE64.encode(&body).into_bytes();
		}

		body
	}

	/// Decode the body of a FLAC `PICTURE` block
	///
	/// With `encoded`, `bytes` is first base64 decoded, as found in `METADATA_BLOCK_PICTURE`
	/// Vorbis comments.
	///
	/// # Errors
	///
	/// * Invalid base64
	/// * A length field reaches past the end of the block
	/// * In [`ParsingMode::Strict`], a picture type that does not fit in a byte
	pub fn from_flac_bytes(
		bytes: &[u8],
		encoded: bool,
		parse_mode: ParsingMode,
	) -> Result<(Self, PictureInformation)> {
		if !encoded {
			return Self::parse_flac_body(bytes, parse_mode);
		}

		match BASE64.decode(bytes) {
			Ok(body) => Self::parse_flac_body(&body, parse_mode),
			Err(_) => Err(TagError::new(ErrorKind::NotAPicture)),
		}
	}

	fn parse_flac_body(body: &[u8], parse_mode: ParsingMode) -> Result<(Self, PictureInformation)> {
		// Type, MIME and description lengths, 4 image properties, data length
		if body.len() < 32 {
			err!(NotAPicture);
		}

		let mut reader = ByteCursor::new(body);

		let raw_type = reader.read_u32::<BigEndian>()?;
		let pic_type = match u8::try_from(raw_type) {
			Ok(byte) => PictureType::from_u8(byte),
			Err(_) if parse_mode == ParsingMode::Strict => err!(NotAPicture),
			Err(_) => {
				log::warn!("Picture type {raw_type} is out of range, using \"Other\"");
				PictureType::Other
			},
		};

		let mime = utf8_decode(read_sized(&mut reader)?.to_vec())?;
		let mime_type = (!mime.is_empty()).then(|| MimeType::from_str(&mime));

		let description = read_sized(&mut reader)?;
		let description = if description.is_empty() {
			None
		} else {
			utf8_decode(description.to_vec()).ok()
		};

		let information = PictureInformation {
			width: reader.read_u32::<BigEndian>()?,
			height: reader.read_u32::<BigEndian>()?,
			color_depth: reader.read_u32::<BigEndian>()?,
			num_colors: reader.read_u32::<BigEndian>()?,
		};

		let data = read_sized(&mut reader)?.to_vec();

		Ok((
			Self {
				pic_type,
				mime_type,
				description,
				data,
			},
			information,
		))
	}

	pub(crate) fn mimetype_from_bin(bytes: &[u8]) -> Result<MimeType> {
		if bytes.len() < 8 {
			err!(NotAPicture);
		}

		match bytes[..8] {
			[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A] => Ok(MimeType::Png),
			[0xFF, 0xD8, ..] => Ok(MimeType::Jpeg),
			[b'G', b'I', b'F', 0x38, 0x37 | 0x39, b'a', ..] => Ok(MimeType::Gif),
			[b'B', b'M', ..] => Ok(MimeType::Bmp),
			[b'I', b'I', b'*', 0x00, ..] | [b'M', b'M', 0x00, b'*', ..] => Ok(MimeType::Tiff),
			_ => err!(NotAPicture),
		}
	}
}

// Length of the first `PLTE` chunk, the reader is positioned on a chunk boundary
fn find_png_palette(reader: &mut ByteCursor<'_>) -> Option<u32> {
	loop {
		let len = reader.read_u32::<BigEndian>().ok()?;
		if reader.read_array::<4>().ok()? == *b"PLTE" {
			return Some(len);
		}

		// Chunk data and CRC
		reader.skip(usize::try_from(len).ok()?.checked_add(4)?).ok()?;
	}
}

// A u32 BE length, then that many bytes
fn read_sized<'a>(reader: &mut ByteCursor<'a>) -> Result<&'a [u8]> {
	let len = reader.read_u32::<BigEndian>()? as usize;
	if len > reader.remaining() {
		err!(SizeMismatch);
	}

	Ok(reader.read_bytes(len)?)
}
