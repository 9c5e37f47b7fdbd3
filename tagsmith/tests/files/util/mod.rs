//! Synthetic files, built in memory
//!
//! Every file ends in a known audio payload, so tests can check that writes never touch it.

use tagsmith::codec::CodecRegistry;
use tagsmith::engine::TagEngine;
use tagsmith::picture::{MimeType, Picture, PictureType};
use tagsmith::tag::{Accessor, ItemValue, Tag};

use std::path::{Path, PathBuf};

pub const PAYLOAD: &[u8] = b"<<< audio payload, never touched >>>";

pub fn engine() -> TagEngine {
	TagEngine::new(CodecRegistry::with_defaults())
}

/// Write `content` to `name` in `dir`
pub fn temp_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
	let path = dir.join(name);
	std::fs::write(&path, content).unwrap();
	path
}

pub fn cover() -> Picture {
	let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
	png.extend([0, 0, 0, 13]);
	png.extend(b"IHDR");
	png.extend(16_u32.to_be_bytes());
	png.extend(16_u32.to_be_bytes());
	png.extend([8, 2, 0, 0, 0]);

	Picture::unchecked(png)
		.pic_type(PictureType::CoverFront)
		.mime_type(MimeType::Png)
		.build()
}

/// A tag using fields every format can store
pub fn common_tag() -> Tag {
	let mut tag = Tag::new();
	tag.set_title(String::from("Foo title"));
	tag.set_artist(String::from("Bar artist"));
	tag.set_album(String::from("Baz album"));
	tag.set_genre(String::from("Classical"));
	tag.set_track(3);
	tag.push_picture(cover());
	tag
}

pub fn verify_common(tag: &Tag) {
	assert_eq!(tag.title().as_deref(), Some("Foo title"));
	assert_eq!(tag.artist().as_deref(), Some("Bar artist"));
	assert_eq!(tag.album().as_deref(), Some("Baz album"));
	assert_eq!(tag.genre().as_deref(), Some("Classical"));
	assert_eq!(tag.track(), Some(3));

	let pictures = tag.pictures().collect::<Vec<_>>();
	assert_eq!(pictures.len(), 1);
	assert_eq!(pictures[0].data(), cover().data());
}

/// Every item of `tag` as `(key, value)` strings, sorted
///
/// Formats store values in their own order and representation, this compares what they mean.
pub fn normalized(tag: &Tag) -> Vec<(String, String)> {
	let mut items = tag
		.items()
		.map(|item| {
			let value = match item.value() {
				ItemValue::Picture(picture) => format!(
					"{:?} {} {:?}",
					picture.pic_type(),
					picture.mime_str(),
					picture.data()
				),
				value => value
					.text()
					.map_or_else(|| format!("{value:?}"), |text| text.into_owned()),
			};
			(format!("{:?}", item.key()), value)
		})
		.collect::<Vec<_>>();
	items.sort();
	items
}

/// Three MPEG-1 Layer III frames
pub fn mpeg() -> Vec<u8> {
	let mut file = Vec::new();
	for _ in 0..3 {
		file.extend([0xFF, 0xFB, 0x90, 0x64]);
		file.extend([0; 413]);
	}
	file.extend(PAYLOAD);
	file
}

/// A bare STREAMINFO block
pub fn flac() -> Vec<u8> {
	let mut file = b"fLaC".to_vec();
	file.extend([0x80, 0, 0, 34]);
	file.extend([0x10; 34]);
	file.extend(PAYLOAD);
	file
}

fn mp4_atom(ident: &[u8; 4], content: &[u8]) -> Vec<u8> {
	let mut atom = ((content.len() + 8) as u32).to_be_bytes().to_vec();
	atom.extend(ident);
	atom.extend(content);
	atom
}

/// `ftyp`, `moov` with one track, then `mdat`
///
/// The track's single chunk offset points at the payload.
pub fn mp4() -> Vec<u8> {
	let ftyp = mp4_atom(b"ftyp", b"M4A \0\0\0\0M4A mp42isom");

	let moov = |chunk_offset: u32| {
		let mut stco = vec![0, 0, 0, 0, 0, 0, 0, 1];
		stco.extend(chunk_offset.to_be_bytes());

		let stbl = mp4_atom(b"stbl", &mp4_atom(b"stco", &stco));
		let trak = mp4_atom(b"trak", &mp4_atom(b"mdia", &mp4_atom(b"minf", &stbl)));

		let mut content = mp4_atom(b"mvhd", &[0; 100]);
		content.extend(trak);
		mp4_atom(b"moov", &content)
	};

	let moov_len = moov(0).len();
	let chunk_offset = (ftyp.len() + moov_len + 8) as u32;

	let mut file = ftyp;
	file.extend(moov(chunk_offset));
	file.extend(mp4_atom(b"mdat", PAYLOAD));
	file
}

/// The chunk offset of the first track of a file built by [`mp4()`]
pub fn mp4_chunk_offset(file: &[u8]) -> u32 {
	let pos = file.windows(4).position(|w| w == b"stco").unwrap();
	u32::from_be_bytes(file[pos + 12..pos + 16].try_into().unwrap())
}

pub fn ogg_crc(data: &[u8]) -> u32 {
	let mut crc = 0_u32;
	for byte in data {
		crc ^= u32::from(*byte) << 24;
		for _ in 0..8 {
			crc = if crc & 0x8000_0000 != 0 {
				(crc << 1) ^ 0x04C1_1DB7
			} else {
				crc << 1
			};
		}
	}
	crc
}

pub fn ogg_page(flags: u8, granule: u64, seq: u32, packets: &[&[u8]]) -> Vec<u8> {
	let mut segments = Vec::new();
	let mut content: Vec<u8> = Vec::new();
	for packet in packets {
		let mut len = packet.len();
		while len >= 255 {
			segments.push(255);
			len -= 255;
		}
		segments.push(len as u8);
		content.extend(*packet);
	}

	let mut page = b"OggS\x00".to_vec();
	page.push(flags);
	page.extend(granule.to_le_bytes());
	page.extend(0xCAFE_u32.to_le_bytes());
	page.extend(seq.to_le_bytes());
	page.extend([0; 4]);
	page.push(segments.len() as u8);
	page.extend(segments);
	page.extend(content);

	let crc = ogg_crc(&page);
	page[22..26].copy_from_slice(&crc.to_le_bytes());
	page
}

/// Identification, comment and setup headers, then one audio page
pub fn vorbis(fields: &[&str]) -> Vec<u8> {
	let mut ident = b"\x01vorbis".to_vec();
	ident.extend([0; 23]);

	let mut comment = b"\x03vorbis".to_vec();
	comment.extend(6_u32.to_le_bytes());
	comment.extend(b"vendor");
	comment.extend((fields.len() as u32).to_le_bytes());
	for field in fields {
		comment.extend((field.len() as u32).to_le_bytes());
		comment.extend(field.as_bytes());
	}
	comment.push(1);

	let setup = b"\x05vorbis-setup".to_vec();

	let mut file = ogg_page(0x02, 0, 0, &[&ident]);
	file.extend(ogg_page(0x00, 0, 1, &[&comment, &setup]));
	file.extend(ogg_page(0x04, 4096, 2, &[PAYLOAD]));
	file
}

fn asf_object(guid: [u8; 16], content: &[u8]) -> Vec<u8> {
	let mut object = guid.to_vec();
	object.extend((24 + content.len() as u64).to_le_bytes());
	object.extend(content);
	object
}

pub const ASF_HEADER: [u8; 16] = [
	0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
const ASF_FILE_PROPERTIES: [u8; 16] = [
	0xA1, 0xDC, 0xAB, 0x8C, 0x47, 0xA9, 0xCF, 0x11, 0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];
const ASF_DATA: [u8; 16] = [
	0x36, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];

/// A Header Object holding only File Properties, then a Data Object
pub fn asf() -> Vec<u8> {
	let data = asf_object(ASF_DATA, PAYLOAD);

	let header_len = 30 + 24 + 80;
	let mut properties = [0; 80];
	properties[16..24].copy_from_slice(&((header_len + data.len()) as u64).to_le_bytes());

	let mut file = ASF_HEADER.to_vec();
	file.extend((header_len as u64).to_le_bytes());
	file.extend(1_u32.to_le_bytes());
	file.extend([1, 2]);
	file.extend(asf_object(ASF_FILE_PROPERTIES, &properties));
	file.extend(data);
	file
}

/// The file size stored in the File Properties object of a file built by [`asf()`]
pub fn asf_stored_size(file: &[u8]) -> u64 {
	let pos = file
		.windows(16)
		.position(|w| w == ASF_FILE_PROPERTIES)
		.unwrap();
	u64::from_le_bytes(file[pos + 40..pos + 48].try_into().unwrap())
}
