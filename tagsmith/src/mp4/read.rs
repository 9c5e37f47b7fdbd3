use super::atom::{ATOM_HEADER_LEN, Atom, AtomInfo, ident_str};
use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::decode_err;
use crate::rewrite::MetadataRegion;
use crate::util::alloc::read_to_vec;
use crate::util::cursor::ByteCursor;
use crate::util::io::SeekStreamLen;

use std::io::{Read, Seek, SeekFrom};

/// The parts of an MP4 file that metadata writes touch
pub(super) struct Mp4Layout {
	/// The parsed `moov` atom
	pub(super) moov: Atom,
	/// Fragment atoms, which may hold absolute offsets
	pub(super) moofs: Vec<MetadataRegion>,
}

impl Mp4Layout {
	/// Every `ilst` atom held by a `meta` atom anywhere in `moov`, in file order
	///
	/// Most files use `moov.udta.meta`, others `moov.meta` or `moov.trak.udta.meta`.
	pub(super) fn ilst_atoms(&self) -> Vec<&Atom> {
		let mut found = Vec::new();
		collect_ilst(&self.moov, &mut found);
		found
	}

	/// Where a new `ilst` atom ends up when the file has none, see `write::insert_ilst`
	pub(super) fn new_ilst_position(&self) -> u64 {
		let udta = self.moov.child(b"udta");
		let meta = udta
			.and_then(|udta| udta.child(b"meta"))
			.or_else(|| self.moov.child(b"meta"));

		meta.or(udta).unwrap_or(&self.moov).content_end()
	}
}

fn collect_ilst<'a>(atom: &'a Atom, found: &mut Vec<&'a Atom>) {
	for child in atom.children() {
		if &atom.ident == b"meta" && &child.ident == b"ilst" {
			found.push(child);
		} else {
			collect_ilst(child, found);
		}
	}
}

/// Read the header of the top level atom at `pos`
fn next_atom<R>(
	reader: &mut R,
	pos: u64,
	stream_len: u64,
	parse_mode: ParsingMode,
) -> Result<Option<AtomInfo>>
where
	R: Read + Seek + ?Sized,
{
	let remaining = stream_len - pos;
	if remaining < ATOM_HEADER_LEN {
		if remaining > 0 {
			log::warn!("Found {remaining} trailing bytes after the last atom");
		}

		return Ok(None);
	}

	reader.seek(SeekFrom::Start(pos))?;

	let mut header = [0; 16];
	let available = remaining.min(16) as usize;
	reader.read_exact(&mut header[..available])?;

	AtomInfo::read(
		&mut ByteCursor::new(&header[..available]),
		pos,
		remaining,
		parse_mode,
	)
}

/// Walk the top level atoms, parsing `moov`
pub(super) fn read_layout<R>(reader: &mut R, parse_mode: ParsingMode) -> Result<Mp4Layout>
where
	R: Read + Seek + ?Sized,
{
	let stream_len = reader.stream_len_hack()?;

	let Some(ftyp) = next_atom(reader, 0, stream_len, parse_mode)? else {
		decode_err!(@BAIL Mp4, "File missing \"ftyp\" atom");
	};

	if &ftyp.ident != b"ftyp" {
		decode_err!(@BAIL Mp4, "File missing \"ftyp\" atom");
	}

	log::debug!("File verified to be MP4");

	let mut moov = None;
	let mut moofs = Vec::new();

	let mut pos = ftyp.len;
	while let Some(atom) = next_atom(reader, pos, stream_len, parse_mode)? {
		match &atom.ident {
			b"moov" if moov.is_some() => {
				if parse_mode == ParsingMode::Strict {
					decode_err!(@BAIL Mp4, "File contains multiple \"moov\" atoms");
				}

				log::warn!("File contains multiple \"moov\" atoms, using the first");
			},
			b"moov" => {
				log::debug!("Found \"moov\" atom at {}, {} bytes", atom.start, atom.len);

				let content_start = atom.start + atom.header_len();
				reader.seek(SeekFrom::Start(content_start))?;
				let content = read_to_vec(reader, atom.len - atom.header_len())?;

				moov = Some(Atom::parse(atom, &content, content_start, parse_mode)?);
			},
			b"moof" => moofs.push(atom.region()),
			_ => log::trace!("Skipping top level atom \"{}\"", ident_str(&atom.ident)),
		}

		pos += atom.len;
	}

	match moov {
		Some(moov) => Ok(Mp4Layout { moov, moofs }),
		None => Err(decode_err!(Mp4, "No \"moov\" atom found")),
	}
}

/// Read and parse a top level atom at a known position
pub(super) fn read_atom_at<R>(
	reader: &mut R,
	region: MetadataRegion,
	parse_mode: ParsingMode,
) -> Result<Atom>
where
	R: Read + Seek + ?Sized,
{
	let stream_len = reader.stream_len_hack()?;
	let Some(info) = next_atom(reader, region.start(), stream_len, parse_mode)? else {
		decode_err!(@BAIL Mp4, "Atom disappeared while rewriting");
	};

	let content_start = info.start + info.header_len();
	reader.seek(SeekFrom::Start(content_start))?;
	let content = read_to_vec(reader, info.len - info.header_len())?;

	Atom::parse(info, &content, content_start, parse_mode)
}
