use super::atom::{Atom, AtomBody, ident_str};
use super::read::{Mp4Layout, read_atom_at};
use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::encode_err;
use crate::rewrite::Splice;

use std::io::{Read, Seek};

use byteorder::{BigEndian, ByteOrder};

// Version/flags, pre-defined, handler type, manufacturer, and reserved bytes
const HDLR: [u8; 25] = [
	0, 0, 0, 0, 0, 0, 0, 0, b'm', b'd', b'i', b'r', b'a', b'p', b'p', b'l', 0, 0, 0, 0, 0, 0, 0, 0,
	0,
];

fn new_meta(ilst: Vec<u8>) -> Atom {
	Atom::container(
		*b"meta",
		vec![0; 4],
		vec![
			Atom::new(*b"hdlr", AtomBody::Raw(HDLR.to_vec())),
			Atom::new(*b"ilst", AtomBody::Raw(ilst)),
		],
	)
}

// Fill the first `ilst` atom with `ilst`, removing any later ones. `ilst` is left in place
// when there are none.
fn replace_ilst(atom: &mut Atom, ilst: &mut Option<Vec<u8>>) {
	let is_meta = &atom.ident == b"meta";
	let Some(children) = atom.children_mut() else {
		return;
	};

	children.retain_mut(|child| {
		if !is_meta || &child.ident != b"ilst" {
			replace_ilst(child, ilst);
			return true;
		}

		match ilst.take() {
			Some(content) => {
				child.body = AtomBody::Raw(content);
				true
			},
			None => {
				log::warn!("Removing an extra \"ilst\" atom");
				false
			},
		}
	});
}

/// Store `ilst` in the first existing `ilst` atom, wherever it is
///
/// Files without one get it in `moov.udta.meta`, or an existing `moov.meta`, creating `udta`
/// and `meta` as needed.
fn insert_ilst(moov: &mut Atom, ilst: Vec<u8>) -> Result<()> {
	let mut ilst = Some(ilst);
	replace_ilst(moov, &mut ilst);
	let Some(ilst) = ilst else {
		return Ok(());
	};

	let Some(moov_children) = moov.children_mut() else {
		encode_err!(@BAIL Mp4, "\"moov\" atom could not be parsed");
	};

	let udta = moov_children.iter().position(|a| &a.ident == b"udta");
	let udta_meta = udta.filter(|&udta| moov_children[udta].child(b"meta").is_some());
	let moov_meta = moov_children.iter().position(|a| &a.ident == b"meta");

	let meta = match (udta_meta, moov_meta, udta) {
		(Some(udta), ..) => moov_children[udta]
			.children_mut()
			.and_then(|children| children.iter_mut().find(|a| &a.ident == b"meta")),
		(None, Some(meta), _) => Some(&mut moov_children[meta]),
		(None, None, Some(udta)) => {
			log::debug!("Creating \"meta\" atom");
			if let Some(udta_children) = moov_children[udta].children_mut() {
				udta_children.push(new_meta(ilst));
			}
			return Ok(());
		},
		(None, None, None) => {
			log::debug!("Creating \"udta\" atom");
			moov_children.push(Atom::container(*b"udta", Vec::new(), vec![new_meta(ilst)]));
			return Ok(());
		},
	};

	let Some(meta_children) = meta.and_then(|meta| meta.children_mut()) else {
		encode_err!(@BAIL Mp4, "\"meta\" atom could not be parsed");
	};

	meta_children.push(Atom::new(*b"ilst", AtomBody::Raw(ilst)));
	Ok(())
}

// `meta` with nothing but a handler or padding, or an empty `udta`
fn is_leftover(atom: &Atom) -> bool {
	match (&atom.ident, &atom.body) {
		(b"meta", _) => atom
			.children()
			.iter()
			.all(|a| matches!(&a.ident, b"hdlr" | b"free" | b"skip")),
		(b"udta", AtomBody::Container { children, trailer, .. }) => {
			children.is_empty() && trailer.iter().all(|&b| b == 0)
		},
		_ => false,
	}
}

/// Remove every `ilst`, along with any `meta` and `udta` atoms left with nothing else in them
///
/// Returns whether anything was removed below `atom`.
fn remove_ilst(atom: &mut Atom) -> bool {
	let is_meta = &atom.ident == b"meta";
	let Some(children) = atom.children_mut() else {
		return false;
	};

	let mut removed = false;
	children.retain_mut(|child| {
		if is_meta && &child.ident == b"ilst" {
			removed = true;
			return false;
		}

		if !remove_ilst(child) {
			return true;
		}

		removed = true;
		!is_leftover(child)
	});

	removed
}

fn shift(offset: u64, boundary: u64, delta: i64) -> Option<u64> {
	if offset < boundary {
		return Some(offset);
	}

	offset.checked_add_signed(delta)
}

/// Move every absolute file offset at or past `boundary` by `delta`
///
/// This covers the chunk offset tables (`stco`, `co64`) and the base data offsets of
/// fragments (`tfhd`).
fn shift_offsets(atom: &mut Atom, boundary: u64, delta: i64) -> Result<()> {
	atom.visit_mut(&mut |atom: &mut Atom| {
		let ident = atom.ident;
		let AtomBody::Raw(content) = &mut atom.body else {
			return Ok(());
		};

		match &ident {
			b"stco" | b"co64" => {
				let entry_len = if &ident == b"stco" { 4 } else { 8 };

				// Version (1), flags (3), entry count (4)
				let Some(count) = content.get(4..8).map(BigEndian::read_u32) else {
					encode_err!(@BAIL Mp4, "Chunk offset table is too short");
				};

				let needed = 8 + count as usize * entry_len;
				if content.len() < needed {
					encode_err!(@BAIL Mp4, "Chunk offset table is smaller than its entry count");
				}

				log::trace!("Shifting {count} chunk offsets in \"{}\"", ident_str(&ident));

				for entry in content[8..needed].chunks_exact_mut(entry_len) {
					if entry_len == 4 {
						let shifted = shift(u64::from(BigEndian::read_u32(entry)), boundary, delta)
							.and_then(|o| u32::try_from(o).ok());
						let Some(shifted) = shifted else {
							encode_err!(@BAIL Mp4, "Chunk offset out of range after rewrite");
						};
						BigEndian::write_u32(entry, shifted);
					} else {
						let Some(shifted) = shift(BigEndian::read_u64(entry), boundary, delta) else {
							encode_err!(@BAIL Mp4, "Chunk offset out of range after rewrite");
						};
						BigEndian::write_u64(entry, shifted);
					}
				}
			},
			b"tfhd" => {
				// Version (1), flags (3), track ID (4), then the base data offset if flagged
				let Some(flags) = content.get(..4).map(BigEndian::read_u32) else {
					return Ok(());
				};

				if flags & 1 == 0 || content.len() < 16 {
					return Ok(());
				}

				let Some(shifted) = shift(BigEndian::read_u64(&content[8..16]), boundary, delta) else {
					encode_err!(@BAIL Mp4, "Base data offset out of range after rewrite");
				};
				BigEndian::write_u64(&mut content[8..16], shifted);
			},
			_ => {},
		}

		Ok(())
	})
}

/// Describe the splices needed to store `ilst`, or remove it if `None`
pub(super) fn write_ilst<R>(
	reader: &mut R,
	layout: &Mp4Layout,
	ilst: Option<Vec<u8>>,
	parse_mode: ParsingMode,
) -> Result<Vec<Splice>>
where
	R: Read + Seek + ?Sized,
{
	let mut moov = layout.moov.clone();
	let moov_region = moov.region;

	match ilst {
		Some(ilst) => insert_ilst(&mut moov, ilst)?,
		None if layout.ilst_atoms().is_empty() => return Ok(Vec::new()),
		None => {
			remove_ilst(&mut moov);
		},
	}

	if moov == layout.moov {
		log::debug!("\"ilst\" atom is unchanged");
		return Ok(Vec::new());
	}

	let delta = moov.len() as i64 - moov_region.len() as i64;
	log::debug!("\"moov\" atom changes by {delta} bytes");

	let mut splices = Vec::new();
	if delta != 0 {
		shift_offsets(&mut moov, moov_region.end(), delta)?;

		for &moof_region in &layout.moofs {
			let mut moof = read_atom_at(reader, moof_region, parse_mode)?;
			let original = moof.clone();

			shift_offsets(&mut moof, moov_region.end(), delta)?;
			if moof != original {
				let mut content = Vec::new();
				moof.write_to(&mut content)?;
				splices.push(Splice::new(moof_region, content));
			}
		}
	}

	let mut content = Vec::new();
	moov.write_to(&mut content)?;
	splices.push(Splice::new(moov_region, content));

	splices.sort_by_key(|s| s.region().start());
	Ok(splices)
}
