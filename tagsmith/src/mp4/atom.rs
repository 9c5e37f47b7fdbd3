use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::err;
use crate::rewrite::MetadataRegion;
use crate::util::cursor::ByteCursor;

use byteorder::{BigEndian, WriteBytesExt};

pub(super) const ATOM_HEADER_LEN: u64 = 8;
const EXTENDED_ATOM_HEADER_LEN: u64 = 16;

// Containers on the way to `ilst` or to the chunk offset tables
#[rustfmt::skip]
const CONTAINERS: &[[u8; 4]] = &[
	*b"moov",
		*b"udta",
			*b"meta",
		*b"trak",
			*b"mdia",
				*b"minf",
					*b"stbl",
	*b"moof",
		*b"traf",
];

/// The header of an atom
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) struct AtomInfo {
	pub(super) start: u64,
	pub(super) len: u64,
	pub(super) extended: bool,
	pub(super) ident: [u8; 4],
}

impl AtomInfo {
	/// Read an atom header
	///
	/// `start` is the absolute offset of the header, and `remaining` is the number of bytes left
	/// in the parent (or the file), including the header. Returns `None` if the identifier is
	/// not valid, which usually means the parent ends in padding.
	pub(super) fn read(
		cursor: &mut ByteCursor<'_>,
		start: u64,
		remaining: u64,
		parse_mode: ParsingMode,
	) -> Result<Option<Self>> {
		let len_raw = cursor.read_u32::<BigEndian>()?;
		let ident = cursor.read_array::<4>()?;

		// Identifiers are printable ASCII, or the copyright symbol of the iTunes keys
		if !ident.iter().all(|&b| (b' '..=b'~').contains(&b) || b == 0xA9) {
			if parse_mode == ParsingMode::Strict {
				err!(BadAtom("Encountered an atom with an invalid identifier"));
			}

			log::warn!("Encountered an atom with an invalid identifier, stopping");
			return Ok(None);
		}

		let (mut len, extended) = match len_raw {
			// The atom extends to the end of its parent
			0 => (remaining, false),
			1 => (cursor.read_u64::<BigEndian>()?, true),
			_ => (u64::from(len_raw), false),
		};

		let header_len = if extended {
			EXTENDED_ATOM_HEADER_LEN
		} else {
			ATOM_HEADER_LEN
		};

		if len < header_len {
			err!(BadAtom("Found an atom with an invalid length"));
		}

		if len > remaining {
			if parse_mode != ParsingMode::Relaxed {
				log::error!(
					"Atom \"{}\" is {len} bytes, but only {remaining} bytes remain",
					ident_str(&ident)
				);
				err!(SizeMismatch);
			}

			log::warn!(
				"Atom \"{}\" is larger than its parent, clamping to {remaining} bytes",
				ident_str(&ident)
			);
			len = remaining;
		}

		log::trace!("Found atom \"{}\" at {start}, {len} bytes", ident_str(&ident));

		Ok(Some(Self {
			start,
			len,
			extended,
			ident,
		}))
	}

	pub(super) fn header_len(&self) -> u64 {
		if self.extended {
			EXTENDED_ATOM_HEADER_LEN
		} else {
			ATOM_HEADER_LEN
		}
	}

	pub(super) fn region(&self) -> MetadataRegion {
		MetadataRegion::new(self.start, self.len)
	}
}

/// The display form of an identifier, each byte is a Latin-1 character
pub(super) fn ident_str(ident: &[u8; 4]) -> String {
	ident.iter().map(|&b| char::from(b)).collect()
}

/// The contents of an atom
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum AtomBody {
	/// An atom we never look into
	Raw(Vec<u8>),
	/// A container of other atoms
	Container {
		/// The version and flags of full atoms
		prefix: Vec<u8>,
		children: Vec<Atom>,
		/// Leftover bytes too short to be an atom, such as the null terminator of some `udta` atoms
		trailer: Vec<u8>,
	},
}

/// An atom, with the children of the containers we care about parsed
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Atom {
	pub(super) ident: [u8; 4],
	pub(super) extended: bool,
	/// Where the atom was read from, empty for new atoms
	pub(super) region: MetadataRegion,
	pub(super) body: AtomBody,
}

impl Atom {
	pub(super) fn new(ident: [u8; 4], body: AtomBody) -> Self {
		Self {
			ident,
			extended: false,
			region: MetadataRegion::default(),
			body,
		}
	}

	pub(super) fn container(ident: [u8; 4], prefix: Vec<u8>, children: Vec<Atom>) -> Self {
		Self::new(
			ident,
			AtomBody::Container {
				prefix,
				children,
				trailer: Vec::new(),
			},
		)
	}

	/// Parse an atom from its header and content
	///
	/// `content` is everything after the header, and starts at `content_start` in the file.
	pub(super) fn parse(
		info: AtomInfo,
		content: &[u8],
		content_start: u64,
		parse_mode: ParsingMode,
	) -> Result<Self> {
		let body = if CONTAINERS.contains(&info.ident) {
			let prefix_len = if &info.ident == b"meta" && meta_is_full(content) {
				4
			} else {
				0
			};

			let prefix = content.get(..prefix_len).unwrap_or_default().to_vec();
			let (children, trailer) = parse_children(
				&content[prefix.len()..],
				content_start + prefix.len() as u64,
				parse_mode,
			)?;

			AtomBody::Container {
				prefix,
				children,
				trailer,
			}
		} else {
			AtomBody::Raw(content.to_vec())
		};

		Ok(Self {
			ident: info.ident,
			extended: info.extended,
			region: info.region(),
			body,
		})
	}

	pub(super) fn children(&self) -> &[Atom] {
		match &self.body {
			AtomBody::Container { children, .. } => children,
			AtomBody::Raw(_) => &[],
		}
	}

	pub(super) fn children_mut(&mut self) -> Option<&mut Vec<Atom>> {
		match &mut self.body {
			AtomBody::Container { children, .. } => Some(children),
			AtomBody::Raw(_) => None,
		}
	}

	pub(super) fn child(&self, ident: &[u8; 4]) -> Option<&Atom> {
		self.children().iter().find(|c| &c.ident == ident)
	}

	/// Where a child appended to this atom would start in the original file
	pub(super) fn content_end(&self) -> u64 {
		match &self.body {
			AtomBody::Container { trailer, .. } => self.region.end() - trailer.len() as u64,
			AtomBody::Raw(_) => self.region.end(),
		}
	}

	/// Call `f` on this atom and all of its descendants
	pub(super) fn visit_mut(&mut self, f: &mut dyn FnMut(&mut Atom) -> Result<()>) -> Result<()> {
		f(self)?;

		if let Some(children) = self.children_mut() {
			for child in children {
				child.visit_mut(f)?;
			}
		}

		Ok(())
	}

	fn body_len(&self) -> u64 {
		match &self.body {
			AtomBody::Raw(content) => content.len() as u64,
			AtomBody::Container {
				prefix,
				children,
				trailer,
			} => {
				(prefix.len() + trailer.len()) as u64 + children.iter().map(Atom::len).sum::<u64>()
			},
		}
	}

	fn needs_extended_header(&self, body_len: u64) -> bool {
		self.extended || body_len + ATOM_HEADER_LEN > u64::from(u32::MAX)
	}

	/// The size of the atom once written, header included
	pub(super) fn len(&self) -> u64 {
		let body_len = self.body_len();
		if self.needs_extended_header(body_len) {
			return body_len + EXTENDED_ATOM_HEADER_LEN;
		}

		body_len + ATOM_HEADER_LEN
	}

	pub(super) fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
		let body_len = self.body_len();
		if self.needs_extended_header(body_len) {
			out.write_u32::<BigEndian>(1)?;
			out.extend_from_slice(&self.ident);
			out.write_u64::<BigEndian>(body_len + EXTENDED_ATOM_HEADER_LEN)?;
		} else {
			out.write_u32::<BigEndian>((body_len + ATOM_HEADER_LEN) as u32)?;
			out.extend_from_slice(&self.ident);
		}

		match &self.body {
			AtomBody::Raw(content) => out.extend_from_slice(content),
			AtomBody::Container {
				prefix,
				children,
				trailer,
			} => {
				out.extend_from_slice(prefix);
				for child in children {
					child.write_to(out)?;
				}
				out.extend_from_slice(trailer);
			},
		}

		Ok(())
	}
}

// A `meta` atom should be a full atom, but some writers store it as a plain container
fn meta_is_full(content: &[u8]) -> bool {
	match content.get(4..8) {
		Some(b"hdlr" | b"ilst" | b"mhdr" | b"ctry" | b"lang") => {
			log::warn!("File contains a non-full \"meta\" atom");
			false
		},
		_ => true,
	}
}

fn parse_children(
	content: &[u8],
	content_start: u64,
	parse_mode: ParsingMode,
) -> Result<(Vec<Atom>, Vec<u8>)> {
	let mut cursor = ByteCursor::new(content);
	let mut children = Vec::new();

	while cursor.remaining() as u64 >= ATOM_HEADER_LEN {
		let child_start = cursor.position();
		let remaining = cursor.remaining() as u64;

		let Some(info) = AtomInfo::read(
			&mut cursor,
			content_start + child_start as u64,
			remaining,
			parse_mode,
		)?
		else {
			cursor.seek(child_start)?;
			break;
		};

		let child_content = cursor.read_bytes((info.len - info.header_len()) as usize)?;
		children.push(Atom::parse(
			info,
			child_content,
			info.start + info.header_len(),
			parse_mode,
		)?);
	}

	Ok((children, cursor.read_rest().to_vec()))
}
